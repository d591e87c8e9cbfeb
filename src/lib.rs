//! # ExporterHub
//!
//! Backend for an exporter catalog: GitHub login, stars, buckets (forks) and
//! admin management reconciled against a GitHub organization.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use exporterhub::auth::SessionCodec;
//! use exporterhub::github::GithubClient;
//! use exporterhub::server::{AppState, create_router};
//! use exporterhub::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/exporterhub.db").unwrap();
//! store.initialize().unwrap();
//!
//! let remote = GithubClient::new("https://api.github.com", "my-org").unwrap();
//! let sessions = SessionCodec::new(b"secret", None).unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), Arc::new(remote), sessions));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): builds the `exporterhub` binary.
//! - `test_utils`: exposes `github::fake::FakeGithub`, an in-memory provider for tests.

pub mod auth;
pub mod collections;
pub mod config;
pub mod error;
pub mod github;
pub mod roles;
pub mod server;
pub mod store;
pub mod types;
