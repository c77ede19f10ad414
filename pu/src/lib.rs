//! pipeupdater - roll a freshly built image out to Pachyderm pipelines
//!
//! Given a set of pipeline spec files, pipeupdater points every pipeline's
//! `transform.image` at `<repository>:<revision>`, works out which pipelines
//! read from which, and creates-or-updates them on the cluster so that every
//! pipeline is applied after the pipelines producing its inputs.
//!
//! # Flow
//!
//! ```text
//! collect -> rewrite -> edges -> order -> apply
//! ```
//!
//! Everything before `apply` is pure and runs before the cluster is
//! contacted; a malformed spec or a dependency cycle stops the run with the
//! cluster untouched.
//!
//! # Modules
//!
//! - [`spec`] - Pipeline specs, their inputs, and loading them from disk
//! - [`rewrite`] - Image rewriting
//! - [`graph`] - Dependency edges, the dependency graph and apply order
//! - [`cluster`] - Cluster client trait and HTTP implementation
//! - [`apply`] - Sequential, fail-fast apply driver
//! - [`updater`] - One full run
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod apply;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod graph;
pub mod rewrite;
pub mod spec;
pub mod updater;

// Re-export commonly used types
pub use apply::{ApplyError, ApplyReport, apply_pipelines};
pub use cluster::{ClusterClient, ClusterError, CreatePipelineRequest, HttpClusterClient};
pub use config::{Config, ConfigError, Endpoint, ResolvedConfig};
pub use error::UpdateError;
pub use graph::{ApplyOrder, DependencyEdge, DependencyGraph, GraphError, apply_order, dependency_edges};
pub use rewrite::{ImageRef, rewrite_images};
pub use spec::{Input, PipelineCollection, PipelineSpec, SourceRef, SpecError, collect};
pub use updater::{Plan, Updater, plan};
