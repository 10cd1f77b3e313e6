// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain text messages over `POST {base_url}/sms`.

use async_trait::async_trait;
use herald_core::{
    AdapterType, HealthStatus, HeraldError, MessageId, PluginAdapter, ProviderContext, TextMessageRequest,
    TextMessageSender,
};

use crate::client::HttpClient;
use crate::types::TextMessageBody;

pub struct HttpTextChannel {
    http: HttpClient,
}

impl HttpTextChannel {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PluginAdapter for HttpTextChannel {
    fn name(&self) -> &str {
        "http-text-message"
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
impl TextMessageSender for HttpTextChannel {
    async fn send_text(
        &self,
        provider: &ProviderContext,
        request: TextMessageRequest,
    ) -> Result<MessageId, HeraldError> {
        let body = TextMessageBody {
            from: &provider.identity.sender_id,
            to: &request.to,
            text: &request.text,
            status_callback: provider.identity.webhook_url.as_deref(),
        };
        self.http.post_send(provider, "/sms", &body).await
    }
}
