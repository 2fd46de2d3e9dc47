//! CLI types shared with the build script and the docs generator.

pub use rdtdash_cli::*;
