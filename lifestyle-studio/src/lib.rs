//! Product lifestyle shot studio: HTTP endpoints, upstream clients and session orchestration.

pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod gallery;
pub mod lifestyle;
pub mod server;
pub mod session;
pub mod storage;
pub mod vision;

#[cfg(test)]
mod test_support;

pub use lifestyle_studio_types as types;

pub use app::{RemoteBackend, Studio, StudioBackend};
pub use client::HttpOptions;
pub use config::Settings;
pub use error::{Error, Result};
pub use server::{router, ServerState};
