pub mod assignment;
pub mod smoother;

pub use assignment::TrackerAssignment;
pub use smoother::{FeatureSmoother, PoseSmoother, ADMIT_CONFIDENCE, MATCH_CONFIDENCE};
