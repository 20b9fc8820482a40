pub mod colorize;
pub mod debounce;
pub mod dispatcher;
pub mod fixed_kernel;
pub mod perturbation;
pub mod worker;

pub use colorize::colorize;
pub use debounce::RenderDebouncer;
pub use dispatcher::{
    default_worker_count, DispatchError, Dispatcher, Frame, FrameAssembler, RenderToken,
};
pub use fixed_kernel::escape_time_fixed;
pub use perturbation::{escape_time_perturbation, ReferenceOrbit};
pub use worker::{run_worker, OrbitStore};

// Re-export core types for convenience
pub use deepbrot_core::*;
