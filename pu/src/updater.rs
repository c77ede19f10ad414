//! One update run: collect, rewrite, order, apply
//!
//! Everything up to the apply order is computed before the cluster is
//! contacted, so a bad spec or a dependency cycle never leaves the cluster
//! half-updated.

use tracing::{debug, info, warn};

use crate::apply::{ApplyReport, apply_pipelines};
use crate::cluster::{ClusterClient, HttpClusterClient};
use crate::config::ResolvedConfig;
use crate::error::UpdateError;
use crate::graph::{ApplyOrder, DependencyEdge, dependency_edges, order_edges};
use crate::rewrite::{ImageRef, rewrite_images};
use crate::spec::{PipelineCollection, collect};

/// Everything computed before touching the cluster
#[derive(Debug, Clone)]
pub struct Plan {
    pub collection: PipelineCollection,
    pub edges: Vec<DependencyEdge>,
    pub order: ApplyOrder,
    pub image: Option<ImageRef>,
}

/// Collect specs, rewrite their image (when given) and compute the order
pub fn plan(paths: &[String], image: Option<&ImageRef>) -> Result<Plan, UpdateError> {
    debug!(?paths, ?image, "plan: called");
    let collection = collect(paths)?;
    if collection.is_empty() {
        warn!(?paths, "No pipeline specs found");
    }

    let collection = match image {
        Some(image) => rewrite_images(collection, image),
        None => collection,
    };

    let edges = dependency_edges(&collection);
    let order = order_edges(&collection, &edges)?;

    Ok(Plan {
        collection,
        edges,
        order,
        image: image.cloned(),
    })
}

/// Drives a full run from a resolved configuration
pub struct Updater {
    config: ResolvedConfig,
}

impl Updater {
    pub fn new(config: ResolvedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn plan(&self) -> Result<Plan, UpdateError> {
        plan(&self.config.pipelines, Some(&self.config.image))
    }

    /// Plan, connect, then apply
    pub async fn run(&self) -> Result<ApplyReport, UpdateError> {
        let plan = self.plan()?;

        let client = HttpClusterClient::connect(&self.config.cluster)
            .await
            .map_err(UpdateError::Connect)?;

        self.apply(&plan, &client).await
    }

    /// Apply a computed plan through an already-connected client
    pub async fn apply(&self, plan: &Plan, client: &dyn ClusterClient) -> Result<ApplyReport, UpdateError> {
        info!(
            pipelines = plan.order.len(),
            endpoint = %client.endpoint(),
            image = %self.config.image,
            "Applying pipelines"
        );
        let report = apply_pipelines(client, &plan.order, &plan.collection).await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::client::mock::MockClusterClient;
    use crate::config::{ClusterSettings, Endpoint};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    fn resolved(dir: &TempDir) -> ResolvedConfig {
        ResolvedConfig {
            pipelines: vec![dir.path().to_string_lossy().to_string()],
            image: ImageRef::new("repo", "sha123"),
            cluster: ClusterSettings {
                endpoint: Endpoint::parse("http://localhost:1650").unwrap(),
                token: None,
                timeout: Duration::from_secs(1),
            },
        }
    }

    fn pipeline_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "a.json",
            r#"{"pipeline": {"name": "montage"}, "transform": {"image": "old:1"},
                "input": {"cross": [{"pfs": {"repo": "images"}}, {"pfs": {"repo": "edges"}}]}}"#,
        );
        write(
            &dir,
            "b.json",
            r#"{"pipeline": {"name": "edges"}, "transform": {"image": "old:1"},
                "input": {"pfs": {"repo": "images", "glob": "/*"}}}"#,
        );
        dir
    }

    #[test]
    fn test_plan_orders_and_rewrites() {
        let dir = pipeline_dir();
        let updater = Updater::new(resolved(&dir));

        let plan = updater.plan().unwrap();

        assert_eq!(plan.order.as_slice(), &["edges", "montage"]);
        assert_eq!(plan.edges.len(), 3);
        assert!(
            plan.collection
                .iter()
                .all(|spec| spec.image() == Some("repo:sha123"))
        );
    }

    #[test]
    fn test_plan_without_image_keeps_documents() {
        let dir = pipeline_dir();
        let paths = vec![dir.path().to_string_lossy().to_string()];

        let plan = plan(&paths, None).unwrap();

        assert!(plan.image.is_none());
        assert!(plan.collection.iter().all(|spec| spec.image() == Some("old:1")));
    }

    #[test]
    fn test_cycle_fails_before_apply() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.json", r#"{"pipeline": {"name": "A"}, "input": {"pfs": {"repo": "B"}}}"#);
        write(&dir, "b.json", r#"{"pipeline": {"name": "B"}, "input": {"pfs": {"repo": "A"}}}"#);
        let updater = Updater::new(resolved(&dir));

        let err = updater.plan().unwrap_err();

        assert_eq!(err.stage(), "order");
    }

    #[tokio::test]
    async fn test_apply_plan_through_client() {
        let dir = pipeline_dir();
        let updater = Updater::new(resolved(&dir));
        let plan = updater.plan().unwrap();
        let client = MockClusterClient::new();

        let report = updater.apply(&plan, &client).await.unwrap();

        assert_eq!(report.applied, vec!["edges", "montage"]);
        assert!(
            client
                .received()
                .iter()
                .all(|r| r.body()["transform"]["image"] == "repo:sha123")
        );
    }

    #[tokio::test]
    async fn test_apply_failure_surfaces_stage() {
        let dir = pipeline_dir();
        let updater = Updater::new(resolved(&dir));
        let plan = updater.plan().unwrap();
        let client = MockClusterClient::rejecting(&["montage"]);

        let err = updater.apply(&plan, &client).await.unwrap_err();

        assert_eq!(err.stage(), "apply");
        assert_eq!(err.applied(), &["edges".to_string()]);
    }
}
