//! Translate pipeline specs into create-pipeline requests

use serde_json::{Map, Value};
use tracing::debug;

use crate::spec::PipelineSpec;

/// Body of a create-pipeline call
///
/// The request carries every field of the spec document, plus the `update`
/// flag that makes the call create-or-update.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePipelineRequest {
    pipeline: String,
    body: Map<String, Value>,
}

impl CreatePipelineRequest {
    pub fn from_spec(spec: &PipelineSpec, update: bool) -> Self {
        debug!(pipeline = %spec.name(), update, "CreatePipelineRequest::from_spec: called");
        let mut body = spec.document().clone();
        body.insert("update".to_string(), Value::Bool(update));
        Self {
            pipeline: spec.name().to_string(),
            body,
        }
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn update(&self) -> bool {
        self.body.get("update").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_carries_document_and_update_flag() {
        let spec = PipelineSpec::from_document(
            json!({
                "pipeline": {"name": "edges"},
                "description": "edge detection",
                "transform": {"image": "repo:sha", "cmd": ["python3", "/edges.py"]},
                "input": {"pfs": {"repo": "images", "glob": "/*"}},
                "update": false
            }),
            "edges.json",
        )
        .unwrap();

        let request = CreatePipelineRequest::from_spec(&spec, true);

        assert_eq!(request.pipeline(), "edges");
        assert!(request.update());
        assert_eq!(request.body()["description"], json!("edge detection"));
        assert_eq!(request.body()["transform"]["image"], json!("repo:sha"));
        assert_eq!(request.body()["update"], json!(true));
    }
}
