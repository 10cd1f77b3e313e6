// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The set of channel adapters available to the processor.

use std::sync::Arc;

use herald_core::{
    Channel, HealthStatus, HeraldError, MessageId, OutboundDispatch, PluginAdapter,
    ProviderContext, RichMessageSender, TextMessageSender, VoiceCaller,
};
use tracing::warn;

/// One optional adapter per channel kind, selected by [`Channel`].
#[derive(Clone, Default)]
pub struct ChannelSet {
    rich_message: Option<Arc<dyn RichMessageSender>>,
    voice_call: Option<Arc<dyn VoiceCaller>>,
    text_message: Option<Arc<dyn TextMessageSender>>,
}

impl ChannelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rich_message(mut self, adapter: Arc<dyn RichMessageSender>) -> Self {
        self.rich_message = Some(adapter);
        self
    }

    pub fn with_voice_call(mut self, adapter: Arc<dyn VoiceCaller>) -> Self {
        self.voice_call = Some(adapter);
        self
    }

    pub fn with_text_message(mut self, adapter: Arc<dyn TextMessageSender>) -> Self {
        self.text_message = Some(adapter);
        self
    }

    pub fn supports(&self, channel: Channel) -> bool {
        match channel {
            Channel::RichMessage => self.rich_message.is_some(),
            Channel::VoiceCall => self.voice_call.is_some(),
            Channel::TextMessage => self.text_message.is_some(),
        }
    }

    /// Hand `request` to the adapter for its channel.
    pub async fn dispatch(
        &self,
        provider: &ProviderContext,
        request: OutboundDispatch,
    ) -> Result<MessageId, HeraldError> {
        let channel = request.channel();
        match request {
            OutboundDispatch::RichMessage(req) => match &self.rich_message {
                Some(adapter) => adapter.send_rich(provider, req).await,
                None => Err(missing(channel)),
            },
            OutboundDispatch::VoiceCall(req) => match &self.voice_call {
                Some(adapter) => adapter.place_call(provider, req).await,
                None => Err(missing(channel)),
            },
            OutboundDispatch::TextMessage(req) => match &self.text_message {
                Some(adapter) => adapter.send_text(provider, req).await,
                None => Err(missing(channel)),
            },
        }
    }

    /// Health of every configured adapter. A failing check reports unhealthy.
    pub async fn health(&self) -> Vec<(Channel, HealthStatus)> {
        let mut out = Vec::new();
        if let Some(a) = &self.rich_message {
            out.push((Channel::RichMessage, check(a.as_ref()).await));
        }
        if let Some(a) = &self.voice_call {
            out.push((Channel::VoiceCall, check(a.as_ref()).await));
        }
        if let Some(a) = &self.text_message {
            out.push((Channel::TextMessage, check(a.as_ref()).await));
        }
        out
    }

    /// Shut every adapter down, logging failures.
    pub async fn shutdown(&self) {
        if let Some(a) = &self.rich_message {
            stop(Channel::RichMessage, a.as_ref()).await;
        }
        if let Some(a) = &self.voice_call {
            stop(Channel::VoiceCall, a.as_ref()).await;
        }
        if let Some(a) = &self.text_message {
            stop(Channel::TextMessage, a.as_ref()).await;
        }
    }
}

async fn check<A: PluginAdapter + ?Sized>(adapter: &A) -> HealthStatus {
    adapter
        .health_check()
        .await
        .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()))
}

async fn stop<A: PluginAdapter + ?Sized>(channel: Channel, adapter: &A) {
    if let Err(e) = adapter.shutdown().await {
        warn!(%channel, adapter = adapter.name(), error = %e, "adapter shutdown failed");
    }
}

fn missing(channel: Channel) -> HeraldError {
    HeraldError::Config(format!("no adapter registered for channel {channel}"))
}
