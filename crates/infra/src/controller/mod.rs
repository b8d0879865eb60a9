//! Push controller and its options

pub mod error;
pub mod options;
pub mod push;

pub use error::{ControllerError, ControllerResult};
pub use options::PushControllerOptions;
pub use push::PushController;
