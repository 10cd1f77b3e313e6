// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response bodies.

use std::collections::BTreeMap;

use herald_core::VoicePrompt;
use serde::{Deserialize, Serialize};

/// `POST {base_url}/messages`
#[derive(Debug, Serialize)]
pub struct RichMessageBody<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub template: &'a str,
    pub bindings: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_callback: Option<&'a str>,
}

/// `POST {base_url}/sms`
#[derive(Debug, Serialize)]
pub struct TextMessageBody<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_callback: Option<&'a str>,
}

/// `POST {base_url}/calls`
#[derive(Debug, Serialize)]
pub struct VoiceCallBody<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub campaign_id: &'a str,
    pub prompt: &'a VoicePrompt,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_callback: Option<&'a str>,
}

/// Provider acknowledgement. Only the id is read.
#[derive(Debug, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub id: Option<String>,
}
