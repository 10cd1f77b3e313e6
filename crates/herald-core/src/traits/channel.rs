// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound channel capabilities, one trait per channel kind.
//!
//! Every capability returns the provider-assigned [`MessageId`] on success and
//! a [`HeraldError`] on failure, so the processor can treat the three kinds
//! uniformly once it has selected one by [`Channel`](crate::types::Channel).

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    MessageId, ProviderContext, RichMessageRequest, TextMessageRequest, VoiceCallRequest,
};

/// Sends template-based rich messages.
#[async_trait]
pub trait RichMessageSender: PluginAdapter {
    async fn send_rich(
        &self,
        provider: &ProviderContext,
        request: RichMessageRequest,
    ) -> Result<MessageId, HeraldError>;
}

/// Sends plain text messages.
#[async_trait]
pub trait TextMessageSender: PluginAdapter {
    async fn send_text(
        &self,
        provider: &ProviderContext,
        request: TextMessageRequest,
    ) -> Result<MessageId, HeraldError>;
}

/// Places outbound voice calls.
#[async_trait]
pub trait VoiceCaller: PluginAdapter {
    async fn place_call(
        &self,
        provider: &ProviderContext,
        request: VoiceCallRequest,
    ) -> Result<MessageId, HeraldError>;
}
