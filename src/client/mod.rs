//! Typed client for the MockMate REST API.
//!
//! [`MockMateClient`] wraps every endpoint, [`TokenStore`] keeps the bearer
//! token between runs and [`InterviewRunner`] walks one interview session
//! through its states on top of the client.

pub mod api;
pub mod error;
pub mod forms;
pub mod runner;
pub mod token_store;

pub use api::MockMateClient;
pub use error::ClientError;
pub use forms::validate_credentials;
pub use runner::InterviewRunner;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
