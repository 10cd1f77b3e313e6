// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements all three channel capabilities. Each send pops the
//! next [`Script`] step (accepting when the script is empty) and is captured
//! for assertions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use herald_core::{
    AdapterType, HealthStatus, HeraldError, MessageId, OutboundDispatch, PluginAdapter,
    ProviderContext, RichMessageRequest, RichMessageSender, TextMessageRequest, TextMessageSender,
    VoiceCallRequest, VoiceCaller,
};

use crate::clock::ManualClock;

/// Outcome of one scripted send.
#[derive(Debug, Clone)]
pub enum Script {
    /// Accept and return a fresh message id.
    Accept,
    /// Reject with a channel error.
    Fail(String),
    /// Sleep before accepting; longer than the send timeout means a timeout.
    Hang(Duration),
    /// Move `clock` forward by `elapsed`, then accept: a slow round trip as
    /// seen by the processor's clock.
    AcceptAfter {
        clock: Arc<ManualClock>,
        elapsed: chrono::Duration,
    },
}

/// A captured send.
#[derive(Debug, Clone)]
pub struct SentDispatch {
    pub sender_id: String,
    pub request: OutboundDispatch,
    pub message_id: Option<MessageId>,
}

/// A scripted channel adapter.
pub struct MockChannel {
    name: String,
    script: Arc<Mutex<VecDeque<Script>>>,
    sent: Arc<Mutex<Vec<SentDispatch>>>,
}

impl MockChannel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A channel that runs `steps` in order, then accepts.
    pub fn scripted(name: &str, steps: Vec<Script>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
            ..Self::new(name)
        }
    }

    /// Queue `n` rejections.
    pub async fn fail_next(&self, n: usize, error: &str) {
        let mut script = self.script.lock().await;
        for _ in 0..n {
            script.push_back(Script::Fail(error.to_string()));
        }
    }

    pub async fn push(&self, step: Script) {
        self.script.lock().await.push_back(step);
    }

    /// Every send attempted so far, accepted or not.
    pub async fn sent(&self) -> Vec<SentDispatch> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    async fn run(
        &self,
        provider: &ProviderContext,
        request: OutboundDispatch,
    ) -> Result<MessageId, HeraldError> {
        let step = self.script.lock().await.pop_front().unwrap_or(Script::Accept);
        let result = match step {
            Script::Accept => Ok(self.fresh_id()),
            Script::Fail(message) => Err(HeraldError::channel(message)),
            Script::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.fresh_id())
            }
            Script::AcceptAfter { clock, elapsed } => {
                clock.advance(elapsed);
                Ok(self.fresh_id())
            }
        };
        self.sent.lock().await.push(SentDispatch {
            sender_id: provider.identity.sender_id.clone(),
            request,
            message_id: result.as_ref().ok().cloned(),
        });
        result
    }

    fn fresh_id(&self) -> MessageId {
        MessageId(format!("{}-{}", self.name, uuid::Uuid::new_v4()))
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        &self.name
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
impl RichMessageSender for MockChannel {
    async fn send_rich(
        &self,
        provider: &ProviderContext,
        request: RichMessageRequest,
    ) -> Result<MessageId, HeraldError> {
        self.run(provider, OutboundDispatch::RichMessage(request)).await
    }
}

#[async_trait]
impl TextMessageSender for MockChannel {
    async fn send_text(
        &self,
        provider: &ProviderContext,
        request: TextMessageRequest,
    ) -> Result<MessageId, HeraldError> {
        self.run(provider, OutboundDispatch::TextMessage(request)).await
    }
}

#[async_trait]
impl VoiceCaller for MockChannel {
    async fn place_call(
        &self,
        provider: &ProviderContext,
        request: VoiceCallRequest,
    ) -> Result<MessageId, HeraldError> {
        self.run(provider, OutboundDispatch::VoiceCall(request)).await
    }
}
