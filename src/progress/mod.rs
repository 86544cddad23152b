pub mod commands;
mod controller;
mod error;

pub use controller::{ProgressController, ProgressState};
pub use error::ProgressError;
