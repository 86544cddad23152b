pub mod commands;
mod session;
mod token_store;

pub use session::{AuthSession, SessionStatus};
pub use token_store::{TokenStore, TOKEN_KEY};
