// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider credential and sender identity lookup.

use std::collections::HashMap;

use herald_config::HeraldConfig;
use herald_core::{Channel, ChannelIdentity, ProviderContext, ProviderCredentials};
use tracing::warn;

use crate::summary::SkipReason;

/// Shared credentials per channel plus per-owner sender identities.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    credentials: HashMap<Channel, ProviderCredentials>,
    identities: HashMap<(String, Channel), ChannelIdentity>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from `[providers.*]` and `[[identities]]`.
    ///
    /// A provider table without an API key is not registered.
    pub fn from_config(config: &HeraldConfig) -> Self {
        let mut registry = Self::new();
        for channel in Channel::ALL {
            let Some(provider) = config.providers.for_channel(channel) else {
                continue;
            };
            let Some(api_key) = provider.api_key.clone() else {
                warn!(%channel, "provider configured without api_key; channel unusable");
                continue;
            };
            registry = registry.with_credentials(
                channel,
                ProviderCredentials {
                    api_key,
                    base_url: provider.base_url.clone(),
                    active: provider.active,
                },
            );
        }
        for identity in &config.identities {
            registry = registry.with_identity(ChannelIdentity {
                owner_id: identity.owner_id.clone(),
                channel: identity.channel,
                sender_id: identity.sender_id.clone(),
                webhook_url: identity.webhook_url.clone(),
                active: identity.active,
            });
        }
        registry
    }

    pub fn with_credentials(mut self, channel: Channel, credentials: ProviderCredentials) -> Self {
        self.credentials.insert(channel, credentials);
        self
    }

    pub fn with_identity(mut self, identity: ChannelIdentity) -> Self {
        self.identities
            .insert((identity.owner_id.clone(), identity.channel), identity);
        self
    }

    /// Everything needed to send on `channel` for campaigns owned by `owner_id`.
    ///
    /// Both the credentials and the identity must exist and be active.
    pub fn resolve(&self, owner_id: &str, channel: Channel) -> Result<ProviderContext, SkipReason> {
        let credentials = self
            .credentials
            .get(&channel)
            .ok_or(SkipReason::ProviderMissing)?;
        if !credentials.active {
            return Err(SkipReason::ProviderInactive);
        }
        let identity = self
            .identities
            .get(&(owner_id.to_string(), channel))
            .ok_or(SkipReason::IdentityMissing)?;
        if !identity.active {
            return Err(SkipReason::IdentityInactive);
        }
        Ok(ProviderContext {
            credentials: credentials.clone(),
            identity: identity.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use herald_config::model::{IdentityConfig, ProviderConfig};

    use super::*;

    fn identity(active: bool) -> ChannelIdentity {
        ChannelIdentity {
            owner_id: "org-1".into(),
            channel: Channel::TextMessage,
            sender_id: "+15550100".into(),
            webhook_url: None,
            active,
        }
    }

    fn credentials(active: bool) -> ProviderCredentials {
        ProviderCredentials {
            api_key: "key".into(),
            base_url: "https://sms.example.test".into(),
            active,
        }
    }

    #[test]
    fn resolves_active_pair() {
        let registry = ProviderRegistry::new()
            .with_credentials(Channel::TextMessage, credentials(true))
            .with_identity(identity(true));
        let ctx = registry.resolve("org-1", Channel::TextMessage).unwrap();
        assert_eq!(ctx.identity.sender_id, "+15550100");
        assert_eq!(ctx.credentials.base_url, "https://sms.example.test");
    }

    #[test]
    fn missing_or_inactive_pieces_are_skip_reasons() {
        let none = ProviderRegistry::new();
        assert_eq!(
            none.resolve("org-1", Channel::TextMessage).unwrap_err(),
            SkipReason::ProviderMissing
        );

        let inactive = ProviderRegistry::new()
            .with_credentials(Channel::TextMessage, credentials(false))
            .with_identity(identity(true));
        assert_eq!(
            inactive.resolve("org-1", Channel::TextMessage).unwrap_err(),
            SkipReason::ProviderInactive
        );

        let no_identity =
            ProviderRegistry::new().with_credentials(Channel::TextMessage, credentials(true));
        assert_eq!(
            no_identity.resolve("org-1", Channel::TextMessage).unwrap_err(),
            SkipReason::IdentityMissing
        );

        let idle_identity = ProviderRegistry::new()
            .with_credentials(Channel::TextMessage, credentials(true))
            .with_identity(identity(false));
        assert_eq!(
            idle_identity.resolve("org-1", Channel::TextMessage).unwrap_err(),
            SkipReason::IdentityInactive
        );
    }

    #[test]
    fn identities_are_per_owner() {
        let registry = ProviderRegistry::new()
            .with_credentials(Channel::TextMessage, credentials(true))
            .with_identity(identity(true));
        assert_eq!(
            registry.resolve("org-2", Channel::TextMessage).unwrap_err(),
            SkipReason::IdentityMissing
        );
    }

    #[test]
    fn from_config_skips_keyless_providers() {
        let mut config = HeraldConfig::default();
        config.providers.voice_call = Some(ProviderConfig {
            api_key: None,
            base_url: "https://voice.example.test".into(),
            active: true,
        });
        config.providers.text_message = Some(ProviderConfig {
            api_key: Some("k".into()),
            base_url: "https://sms.example.test".into(),
            active: true,
        });
        config.identities = vec![
            IdentityConfig {
                owner_id: "org-1".into(),
                channel: Channel::VoiceCall,
                sender_id: "+15550101".into(),
                webhook_url: None,
                active: true,
            },
            IdentityConfig {
                owner_id: "org-1".into(),
                channel: Channel::TextMessage,
                sender_id: "+15550100".into(),
                webhook_url: None,
                active: true,
            },
        ];
        let registry = ProviderRegistry::from_config(&config);
        assert_eq!(
            registry.resolve("org-1", Channel::VoiceCall).unwrap_err(),
            SkipReason::ProviderMissing
        );
        assert!(registry.resolve("org-1", Channel::TextMessage).is_ok());
    }
}
