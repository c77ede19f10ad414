//! Point pipeline transforms at a freshly built image

use std::fmt;

use tracing::{debug, info};

use crate::spec::PipelineCollection;

/// Container image reference written into `transform.image`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub repository: String,
    pub revision: String,
}

impl ImageRef {
    pub fn new(repository: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            revision: revision.into(),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.revision)
    }
}

/// Rewrite `transform.image` on every spec that declares one
///
/// Specs without an image field pass through unchanged. Every entry is kept
/// and the collection order is preserved.
pub fn rewrite_images(mut collection: PipelineCollection, image: &ImageRef) -> PipelineCollection {
    let image = image.to_string();
    debug!(%image, pipeline_count = collection.len(), "rewrite_images: called");

    let mut rewritten = 0usize;
    for spec in collection.iter_mut() {
        if spec.set_image(&image) {
            debug!(pipeline = %spec.name(), %image, "rewrite_images: image replaced");
            rewritten += 1;
        }
    }

    info!(%image, rewritten, "Rewrote pipeline images");
    collection
}
