pub mod api;
pub mod config;
pub mod credential;
pub mod error;
pub mod format;
pub mod logging;
pub mod search;
pub mod store;

pub use api::{HttpBackend, SearchBackend};
pub use config::ClientConfig;
pub use credential::CredentialStore;
pub use error::AppError;
pub use search::{ResultSet, SearchOutcome, SearchSession};
