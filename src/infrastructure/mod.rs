// Infrastructure implementations for LegacyGraph.

pub mod concurrency;
pub mod cpp_extractor;
pub mod exporters;
pub mod source_loader;

pub use cpp_extractor::TreeSitterCppExtractor;
pub use exporters::{DotExporter, JsonExporter, TextExporter};
pub use source_loader::SourceLoader;
