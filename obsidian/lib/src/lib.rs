pub mod config;
pub mod error;
pub mod extract;
pub mod frontend;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod shared;

pub use config::{FailurePolicy, GeneratorConfig, InputSource};
pub use error::ObsidianError;
pub use frontend::{ParseOptions, TranslationUnit};
pub use pipeline::{RunSummary, discover_headers, dump_metadata, run};
pub use render::{Document, OutputLayout, RenderOptions, render};
pub use shared::*;
