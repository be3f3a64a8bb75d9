//! Engine configuration shared by the CLI, the exporters and the server.

use std::path::Path;

/// Default ceiling on enumerated simple cycles.
pub const DEFAULT_MAX_CYCLES: usize = 100_000;

/// Directory names never descended into when scanning for sources.
pub const SKIPPED_DIRS: &[&str] = &[".git", "build", "target", "node_modules", ".cache"];

/// C and C++ source and header extensions. Both dialects go through the C++ grammar.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "c", "h", "cc", "cpp", "cxx", "c++", "hh", "hpp", "hxx", "h++", "inl", "ipp",
];

/// Whether `path` names a C/C++ file, judged by extension (case-insensitive).
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            SOURCE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Stop cycle enumeration with an error past this many cycles.
    /// `None` enumerates without bound.
    pub max_cycles: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cycles: Some(DEFAULT_MAX_CYCLES),
        }
    }
}

impl EngineConfig {
    /// `0` on the command line means unbounded.
    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = (max_cycles > 0).then_some(max_cycles);
        self
    }
}
