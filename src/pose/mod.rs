pub mod adapt;
pub mod estimator;
pub mod keypoint;

pub use adapt::{adapt_keypoints, adapt_pose, RawKeypoint, RawPose};
pub use estimator::{DetectionMode, PoseEstimator};
pub use keypoint::{dist_between, Keypoint, KeypointName, Pose};
