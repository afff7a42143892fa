//! Kana-to-kanji conversion engine.
//!
//! The conversion core lives in `kkc-core`; this crate bundles it with a
//! shared, learnable `Engine`, settings loading and trace output.

mod engine;
mod error;
mod trace_init;


use std::path::Path;

pub use engine::Engine;
pub use error::EngineError;
pub use kkc_core::converter::{Candidate, ConvertOptions, Segment};
pub use trace_init::init_tracing;

pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Replace the built-in settings with the TOML file at `path`. Must run
/// before the first conversion.
pub fn load_settings(path: &Path) -> Result<(), EngineError> {
    let content = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.display().to_string(),
        source,
    })?;
    kkc_core::settings::init_custom(content)?;
    Ok(())
}

pub fn default_settings() -> &'static str {
    kkc_core::settings::default_toml()
}
