//! Session persistence and credential storage.
//!
//! The session record is the only login state kept on disk; saved
//! passwords live in the OS keychain via `CredentialStore`.

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData};
