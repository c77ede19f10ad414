//! Apply pipelines to the cluster in order
//!
//! Pipelines are submitted one at a time because a downstream pipeline's
//! input repo must exist before it can be created. The first rejection
//! stops the run; pipelines already applied stay applied.

use thiserror::Error;
use tracing::{debug, info};

use crate::cluster::{ClusterClient, ClusterError, CreatePipelineRequest};
use crate::graph::ApplyOrder;
use crate::spec::PipelineCollection;

/// Pipelines successfully applied, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: Vec<String>,
}

/// A pipeline failed to apply; earlier pipelines were not rolled back
#[derive(Debug, Error)]
#[error("Failed to apply pipeline '{pipeline}' ({} applied before the failure): {source}", .applied.len())]
pub struct ApplyError {
    pub pipeline: String,
    pub applied: Vec<String>,
    #[source]
    pub source: ClusterError,
}

/// Submit every pipeline in `order` with update semantics
pub async fn apply_pipelines(
    client: &dyn ClusterClient,
    order: &ApplyOrder,
    collection: &PipelineCollection,
) -> Result<ApplyReport, ApplyError> {
    debug!(pipeline_count = order.len(), endpoint = %client.endpoint(), "apply_pipelines: called");
    let mut applied: Vec<String> = Vec::with_capacity(order.len());

    for name in order.iter() {
        let Some(spec) = collection.get(name) else {
            return Err(ApplyError {
                pipeline: name.to_string(),
                applied,
                source: ClusterError::InvalidRequest {
                    pipeline: name.to_string(),
                    message: "no spec loaded under this name".to_string(),
                },
            });
        };

        let request = CreatePipelineRequest::from_spec(spec, true);
        info!(pipeline = %name, step = applied.len() + 1, total = order.len(), "Applying pipeline");

        if let Err(source) = client.create_pipeline(&request).await {
            debug!(pipeline = %name, error = %source, "apply_pipelines: stopping at failure");
            return Err(ApplyError {
                pipeline: name.to_string(),
                applied,
                source,
            });
        }
        applied.push(name.to_string());
    }

    info!(applied = applied.len(), "All pipelines applied");
    Ok(ApplyReport { applied })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::client::mock::MockClusterClient;
    use crate::graph::apply_order;
    use crate::spec::PipelineSpec;
    use serde_json::json;

    fn collection() -> PipelineCollection {
        vec![
            json!({"pipeline": {"name": "A"}, "transform": {"image": "repo:sha"}}),
            json!({"pipeline": {"name": "B"}, "input": {"pfs": {"repo": "A"}}}),
            json!({"pipeline": {"name": "C"}, "input": {"pfs": {"repo": "B"}}}),
        ]
        .into_iter()
        .map(|doc| PipelineSpec::from_document(doc, "test.json").unwrap())
        .collect()
    }

    #[tokio::test]
    async fn test_applies_in_order_with_update() {
        let collection = collection();
        let order = apply_order(&collection).unwrap();
        let client = MockClusterClient::new();

        let report = apply_pipelines(&client, &order, &collection).await.unwrap();

        assert_eq!(report.applied, vec!["A", "B", "C"]);
        assert_eq!(client.received_names(), vec!["A", "B", "C"]);
        assert!(client.received().iter().all(CreatePipelineRequest::update));
        assert_eq!(client.received()[0].body()["transform"]["image"], json!("repo:sha"));
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let collection = collection();
        let order = apply_order(&collection).unwrap();
        let client = MockClusterClient::rejecting(&["B"]);

        let err = apply_pipelines(&client, &order, &collection).await.unwrap_err();

        assert_eq!(err.pipeline, "B");
        assert_eq!(err.applied, vec!["A"]);
        assert_eq!(client.received_names(), vec!["A", "B"]);
        assert!(err.to_string().contains("1 applied before the failure"));
    }

    #[tokio::test]
    async fn test_unknown_pipeline_in_order() {
        let collection = collection();
        let order: ApplyOrder = vec!["A".to_string(), "ghost".to_string()].into_iter().collect();
        let client = MockClusterClient::new();

        let err = apply_pipelines(&client, &order, &collection).await.unwrap_err();

        assert_eq!(err.pipeline, "ghost");
        assert!(matches!(err.source, ClusterError::InvalidRequest { .. }));
        assert_eq!(client.received_names(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_empty_order() {
        let client = MockClusterClient::new();
        let report = apply_pipelines(&client, &ApplyOrder::default(), &PipelineCollection::new())
            .await
            .unwrap();
        assert!(report.applied.is_empty());
    }
}
