//! Core library for crewcache.
//!
//! Everything the terminal front end needs to talk to the workforce
//! platform lives here:
//!
//! - `api`: REST store client, email client, and the error taxonomy
//! - `auth`: session persistence and keychain credential storage
//! - `cache`: the listing cache (search/filter/paginate over snapshots)
//!   and the on-disk snapshot store
//! - `models`: domain types with wire adapters per collection
//! - `config`: configuration file and environment overrides

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod text;
