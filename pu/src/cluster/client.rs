//! ClusterClient trait definition

use async_trait::async_trait;

use super::{ClusterError, CreatePipelineRequest};

/// Connected session against a processing cluster
///
/// Each call is independent; the caller decides ordering. Applying a
/// pipeline that already exists updates it in place when the request's
/// update flag is set.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Create or update a single pipeline
    async fn create_pipeline(&self, request: &CreatePipelineRequest) -> Result<(), ClusterError>;

    /// Human-readable address of the cluster, for logging
    fn endpoint(&self) -> String;
}
