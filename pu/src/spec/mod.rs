//! Pipeline specs and how they are loaded

mod collection;
pub mod collector;
mod error;
mod input;
mod pipeline;

pub use collection::PipelineCollection;
pub use collector::{SpecFormat, collect, load_spec};
pub use error::SpecError;
pub use input::{CompositeKind, Input, InputError, SourceRef};
pub use pipeline::PipelineSpec;
