// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Herald.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use herald_core::Channel;
use serde::{Deserialize, Serialize};

/// Top-level Herald configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeraldConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dispatch processor batch settings.
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Callback webhook server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-channel retry and escalation policy.
    #[serde(default)]
    pub cascade: CascadeConfig,

    /// Shared per-channel provider credentials.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Per-campaign-owner channel identities.
    #[serde(default)]
    pub identities: Vec<IdentityConfig>,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            processor: ProcessorConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            cascade: CascadeConfig::default(),
            providers: ProvidersConfig::default(),
            identities: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Dispatch processor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessorConfig {
    /// Maximum number of due records examined per processing pass.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Upper bound on a single provider send, in seconds.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,

    /// Number of records processed in parallel within one pass.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Interval between processing passes in `herald serve`, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// How long a record skipped for missing configuration, or one whose
    /// evaluation errored, stays out of the due queue, in seconds.
    #[serde(default = "default_skip_backoff_secs")]
    pub skip_backoff_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            send_timeout_secs: default_send_timeout_secs(),
            concurrency: default_concurrency(),
            poll_interval_secs: default_poll_interval_secs(),
            skip_backoff_secs: default_skip_backoff_secs(),
        }
    }
}

fn default_batch_size() -> usize {
    100
}

fn default_send_timeout_secs() -> u64 {
    30
}

fn default_concurrency() -> usize {
    8
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_skip_backoff_secs() -> u64 {
    300
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("herald").join("herald.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("herald.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Provider callback webhook configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the webhook server to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port for the webhook server.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8088
}

/// Retry and escalation parameters for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelPolicyConfig {
    /// Sends allowed on this channel before it is given up.
    pub max_attempts: u32,

    /// Minimum time after the last send, while failing, before moving to the
    /// next channel.
    pub escalation_delay_secs: u64,

    /// Waits between same-channel retries. The last entry repeats.
    pub retry_delays_secs: Vec<u64>,
}

/// Per-channel cascade policy table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CascadeConfig {
    #[serde(default = "default_rich_message_policy")]
    pub rich_message: ChannelPolicyConfig,

    #[serde(default = "default_voice_call_policy")]
    pub voice_call: ChannelPolicyConfig,

    #[serde(default = "default_text_message_policy")]
    pub text_message: ChannelPolicyConfig,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            rich_message: default_rich_message_policy(),
            voice_call: default_voice_call_policy(),
            text_message: default_text_message_policy(),
        }
    }
}

impl CascadeConfig {
    pub fn for_channel(&self, channel: Channel) -> &ChannelPolicyConfig {
        match channel {
            Channel::RichMessage => &self.rich_message,
            Channel::VoiceCall => &self.voice_call,
            Channel::TextMessage => &self.text_message,
        }
    }
}

fn default_rich_message_policy() -> ChannelPolicyConfig {
    ChannelPolicyConfig {
        max_attempts: 3,
        escalation_delay_secs: 3600,
        retry_delays_secs: vec![300, 900, 1800],
    }
}

fn default_voice_call_policy() -> ChannelPolicyConfig {
    ChannelPolicyConfig {
        max_attempts: 2,
        escalation_delay_secs: 1800,
        retry_delays_secs: vec![600, 1800],
    }
}

fn default_text_message_policy() -> ChannelPolicyConfig {
    ChannelPolicyConfig {
        max_attempts: 2,
        escalation_delay_secs: 3600,
        retry_delays_secs: vec![900, 1800],
    }
}

/// Shared credentials for one channel provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API key. `None` requires an environment variable override.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the provider API.
    #[serde(default)]
    pub base_url: String,

    /// Inactive providers are never used for sends.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Provider credentials, one optional table per channel.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub rich_message: Option<ProviderConfig>,

    #[serde(default)]
    pub voice_call: Option<ProviderConfig>,

    #[serde(default)]
    pub text_message: Option<ProviderConfig>,
}

impl ProvidersConfig {
    pub fn for_channel(&self, channel: Channel) -> Option<&ProviderConfig> {
        match channel {
            Channel::RichMessage => self.rich_message.as_ref(),
            Channel::VoiceCall => self.voice_call.as_ref(),
            Channel::TextMessage => self.text_message.as_ref(),
        }
    }
}

/// A campaign owner's sender identity on one channel.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Campaign owner this identity belongs to.
    pub owner_id: String,

    /// Channel the identity is used on.
    pub channel: Channel,

    /// Sender number or provider-side sender ID.
    pub sender_id: String,

    /// Where the provider should post status callbacks.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Inactive identities are never used for sends.
    #[serde(default = "default_active")]
    pub active: bool,
}
