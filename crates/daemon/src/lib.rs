//! The supervisor: the service's outer loop and shutdown handling.

pub mod error;
pub mod supervisor;

pub use error::SupervisorError;
pub use supervisor::Supervisor;
