pub mod commands;
mod controller;
mod error;
mod loading;
mod selection;
mod state;

pub use controller::{CameraAccess, IdentifyController, WorkflowConfig, WorkflowEvent};
pub use error::WorkflowError;
pub use loading::{LoadingMessages, LOADING_MESSAGES};
pub use selection::{ReviewSet, Selection};
pub use state::{WorkflowAction, WorkflowState, WorkflowStatus};
