//! REST clients for the platform's hosted backends.
//!
//! - `StoreClient`: the row store's generic CRUD surface plus typed
//!   per-collection wrappers
//! - `EmailClient`: the transactional notification service
//! - `ApiError`: the shared HTTP error taxonomy

pub mod client;
pub mod email;
pub mod error;

pub use client::StoreClient;
pub use email::{EmailClient, EmailRequest};
pub use error::ApiError;
