pub mod acquisition;
pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod pipeline;
pub mod tracking;

pub use config::Configuration;
pub use coordinator::{ControlCommand, Coordinator, CoordinatorBuilder};
pub use error::{AcquisitionError, AppError, PipelineError};
