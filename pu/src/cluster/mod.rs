//! Cluster client module
//!
//! The rest of the crate only sees the [`ClusterClient`] trait; the HTTP
//! implementation is created once per run from the resolved settings.

pub mod client;
mod error;
mod http;
mod request;

pub use client::ClusterClient;
pub use error::ClusterError;
pub use http::{ClusterVersion, HttpClusterClient};
pub use request::CreatePipelineRequest;
