//! Shared wire types for Lifestyle Studio.

mod base64_serde;

pub mod content;
pub mod http;
pub mod lifestyle;
pub mod scene;
