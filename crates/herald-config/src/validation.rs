// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-zero batch sizes, non-empty retry schedules, and unique
//! sender identities.

use std::collections::HashSet;

use herald_core::Channel;

use crate::diagnostic::ConfigError;
use crate::model::HeraldConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &HeraldConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let processor = &config.processor;
    for (key, value) in [
        ("processor.batch_size", processor.batch_size as u64),
        ("processor.concurrency", processor.concurrency as u64),
        ("processor.send_timeout_secs", processor.send_timeout_secs),
        ("processor.poll_interval_secs", processor.poll_interval_secs),
    ] {
        if value == 0 {
            errors.push(ConfigError::invalid(key, "must be at least 1"));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid("storage.database_path", "must not be empty"));
    }

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        errors.push(ConfigError::invalid("server.bind_address", "must not be empty"));
    } else if addr.parse::<std::net::IpAddr>().is_err()
        && !addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::invalid(
            "server.bind_address",
            format!("`{addr}` is not a valid IP address or hostname"),
        ));
    }

    for channel in Channel::ALL {
        let policy = config.cascade.for_channel(channel);
        let key = |field: &str| format!("cascade.{channel}.{field}");
        if policy.max_attempts == 0 {
            errors.push(ConfigError::invalid(key("max_attempts"), "must be at least 1"));
        }
        if policy.escalation_delay_secs == 0 {
            errors.push(ConfigError::invalid(
                key("escalation_delay_secs"),
                "must be at least 1",
            ));
        }
        if policy.retry_delays_secs.is_empty() {
            errors.push(ConfigError::invalid(key("retry_delays_secs"), "must not be empty"));
        } else if policy.retry_delays_secs.contains(&0) {
            errors.push(ConfigError::invalid(
                key("retry_delays_secs"),
                "entries must be positive",
            ));
        }

        if let Some(provider) = config.providers.for_channel(channel) {
            if provider.active && provider.base_url.trim().is_empty() {
                errors.push(ConfigError::invalid(
                    format!("providers.{channel}.base_url"),
                    "must not be empty while the provider is active",
                ));
            }
        }
    }

    let mut seen = HashSet::new();
    for (i, identity) in config.identities.iter().enumerate() {
        if identity.sender_id.trim().is_empty() {
            errors.push(ConfigError::invalid(
                format!("identities[{i}].sender_id"),
                "must not be empty",
            ));
        }
        if !seen.insert((identity.owner_id.as_str(), identity.channel)) {
            errors.push(ConfigError::invalid(
                format!("identities[{i}]"),
                format!(
                    "duplicates the {} identity of owner `{}`",
                    identity.channel, identity.owner_id
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
