// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound voice calls over `POST {base_url}/calls`.

use async_trait::async_trait;
use herald_core::{
    AdapterType, HealthStatus, HeraldError, MessageId, PluginAdapter, ProviderContext, VoiceCallRequest,
    VoiceCaller,
};

use crate::client::HttpClient;
use crate::types::VoiceCallBody;

/// Places a call that plays recorded audio or speaks a script.
///
/// The returned id is the provider call id; ringing, answered and no-answer
/// statuses arrive later as callbacks against it.
pub struct HttpVoiceChannel {
    http: HttpClient,
}

impl HttpVoiceChannel {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PluginAdapter for HttpVoiceChannel {
    fn name(&self) -> &str {
        "http-voice-call"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HeraldError> {
        Ok(())
    }
}

#[async_trait]
impl VoiceCaller for HttpVoiceChannel {
    async fn place_call(
        &self,
        provider: &ProviderContext,
        request: VoiceCallRequest,
    ) -> Result<MessageId, HeraldError> {
        let body = VoiceCallBody {
            from: &provider.identity.sender_id,
            to: &request.to,
            campaign_id: &request.campaign_id.0,
            prompt: &request.prompt,
            status_callback: provider.identity.webhook_url.as_deref(),
        };
        self.http.post_send(provider, "/calls", &body).await
    }
}
