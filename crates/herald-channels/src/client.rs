// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP client for the channel adapters.
//!
//! The client does not retry: retries belong to the cascade policy, which
//! counts every attempt against the channel's budget.

use std::time::Duration;

use herald_core::{HeraldError, MessageId, ProviderContext};
use serde::Serialize;
use tracing::debug;

use crate::types::SendResponse;

/// Upper bound on one HTTP exchange. The processor's send timeout is usually tighter.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Thin JSON-over-HTTP client with bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, HeraldError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HeraldError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client })
    }

    /// POST `body` to `{base_url}{path}` and return the provider message id.
    pub async fn post_send<B: Serialize + ?Sized>(
        &self,
        provider: &ProviderContext,
        path: &str,
        body: &B,
    ) -> Result<MessageId, HeraldError> {
        let url = format!(
            "{}{path}",
            provider.credentials.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&provider.credentials.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| HeraldError::Channel {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(%url, %status, "provider response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HeraldError::channel(format!(
                "provider returned {status}: {body}"
            )));
        }

        let parsed: SendResponse = response.json().await.map_err(|e| HeraldError::Channel {
            message: format!("failed to parse provider response: {e}"),
            source: Some(Box::new(e)),
        })?;

        match parsed.id {
            Some(id) if !id.is_empty() => Ok(MessageId(id)),
            _ => Err(HeraldError::channel("provider response has no message id")),
        }
    }
}
