// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rich (template) messages over `POST {base_url}/messages`.

use async_trait::async_trait;
use herald_core::{
    AdapterType, HealthStatus, HeraldError, MessageId, PluginAdapter, ProviderContext, RichMessageRequest,
    RichMessageSender,
};

use crate::client::HttpClient;
use crate::types::RichMessageBody;

/// Sends approved templates with their bindings; the provider renders them.
pub struct HttpRichMessageChannel {
    http: HttpClient,
}

impl HttpRichMessageChannel {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PluginAdapter for HttpRichMessageChannel {
    fn name(&self) -> &str {
        "http-rich-message"
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
impl RichMessageSender for HttpRichMessageChannel {
    async fn send_rich(
        &self,
        provider: &ProviderContext,
        request: RichMessageRequest,
    ) -> Result<MessageId, HeraldError> {
        let body = RichMessageBody {
            from: &provider.identity.sender_id,
            to: &request.to,
            template: &request.template_name,
            bindings: &request.bindings,
            media_url: request.media_url.as_deref(),
            status_callback: provider.identity.webhook_url.as_deref(),
        };
        self.http.post_send(provider, "/messages", &body).await
    }
}
