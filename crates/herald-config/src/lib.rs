// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for Herald: processor tunables, storage, the webhook server,
//! the per-channel cascade policy, provider credentials and owner identities.
//!
//! Every loader returns either a validated [`HeraldConfig`] or all of the
//! problems found, as [`ConfigError`] diagnostics ready for
//! [`render_errors`].
//!
//! ```no_run
//! let config = match herald_config::load_and_validate() {
//!     Ok(config) => config,
//!     Err(errors) => {
//!         herald_config::render_errors(&errors);
//!         std::process::exit(1);
//!     }
//! };
//! println!("batch size: {}", config.processor.batch_size);
//! ```

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::HeraldConfig;

/// Load from the standard file hierarchy plus `HERALD_*` overrides.
pub fn load_and_validate() -> Result<HeraldConfig, Vec<ConfigError>> {
    finish(loader::load_config(), || {
        read_sources(&loader::search_paths())
    })
}

/// Load from one explicit file plus `HERALD_*` overrides.
pub fn load_and_validate_path(path: &Path) -> Result<HeraldConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_sources(&[path.to_path_buf()])
    })
}

/// Load from a TOML string, without files or env overrides.
pub fn load_and_validate_str(toml_content: &str) -> Result<HeraldConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Sources are only read when parsing failed, for error spans.
fn finish(
    loaded: Result<HeraldConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<HeraldConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::from_figment(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Existing files among `paths`, keyed the way figment reports file sources.
fn read_sources(paths: &[PathBuf]) -> Vec<(String, String)> {
    paths
        .iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(path).ok()?;
            let shown = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            Some((shown.display().to_string(), content))
        })
        .collect()
}
