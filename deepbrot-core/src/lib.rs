pub mod bigfloat;
pub mod camera;
pub mod error;
pub mod escape;
pub mod fixed;
pub mod messages;
pub mod precision;
pub mod strip;

pub use bigfloat::BigFloat;
pub use camera::{Camera, CameraApprox, FixedFrame, Regime};
pub use error::CoreError;
pub use escape::EscapeData;
pub use messages::{OrbitPublish, RenderMode, RenderRequest, StripResult, WorkerJob};
pub use precision::{auto_precision_bits, max_iterations};
pub use strip::{partition_rows, strip_height, Strip};
