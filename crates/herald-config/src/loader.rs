// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./herald.toml` > `~/.config/herald/herald.toml` > `/etc/herald/herald.toml`
//! with environment variable overrides via `HERALD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HeraldConfig;

/// Env key prefixes (after `HERALD_` is stripped and lowercased) and the
/// dotted section path each maps to. Longest prefixes first.
const ENV_SECTIONS: &[(&str, &str)] = &[
    ("providers_rich_message_", "providers.rich_message."),
    ("providers_voice_call_", "providers.voice_call."),
    ("providers_text_message_", "providers.text_message."),
    ("cascade_rich_message_", "cascade.rich_message."),
    ("cascade_voice_call_", "cascade.voice_call."),
    ("cascade_text_message_", "cascade.text_message."),
    ("processor_", "processor."),
    ("storage_", "storage."),
    ("server_", "server."),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/herald/herald.toml` (system-wide)
/// 3. `~/.config/herald/herald.toml` (user XDG config)
/// 4. `./herald.toml` (local directory)
/// 5. `HERALD_*` environment variables
pub fn load_config() -> Result<HeraldConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<HeraldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HeraldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Config files in merge order: system, user, then the working directory.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/herald/herald.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("herald").join("herald.toml"));
    }
    paths.push(PathBuf::from("herald.toml"));
    paths
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    search_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(HeraldConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env key onto its dotted config path.
///
/// Uses an explicit table rather than `Env::split("_")` because key names
/// contain underscores: `HERALD_PROCESSOR_BATCH_SIZE` must become
/// `processor.batch_size`, not `processor.batch.size`.
pub fn map_env_key(key: &str) -> String {
    ENV_SECTIONS
        .iter()
        .find_map(|(prefix, section)| {
            key.strip_prefix(prefix)
                .map(|rest| format!("{section}{rest}"))
        })
        .unwrap_or_else(|| key.to_string())
}

fn env_provider() -> Env {
    Env::prefixed("HERALD_").map(|key| map_env_key(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("processor_batch_size"), "processor.batch_size");
        assert_eq!(
            map_env_key("providers_rich_message_api_key"),
            "providers.rich_message.api_key"
        );
        assert_eq!(
            map_env_key("cascade_voice_call_max_attempts"),
            "cascade.voice_call.max_attempts"
        );
        assert_eq!(map_env_key("log_level"), "log_level");
    }

    #[test]
    fn local_file_is_searched_last() {
        let paths = search_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("/etc/herald/herald.toml")));
        assert_eq!(paths.last(), Some(&PathBuf::from("herald.toml")));
    }
}
