pub mod compositor;
pub mod skeleton;
pub mod surface;

pub use compositor::{SkeletonCompositor, Viewport};
pub use skeleton::LIMB_BONES;
pub use surface::Surface;
