// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template interpolation and outbound request construction.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use herald_core::{
    AudienceMember, Campaign, Channel, OutboundDispatch, RichMessageRequest, Template,
    TextMessageRequest, VoiceCallRequest, VoicePrompt,
};
use regex::{Captures, Regex};
use tracing::debug;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([a-zA-Z0-9_]+)\s*\}\}").unwrap());

/// Placeholder values for one member of one campaign.
///
/// Campaign variables come first; member fields and `campaign_name` are
/// bound last and win on a name clash. Absent member labels bind to "".
pub fn bindings(campaign: &Campaign, member: &AudienceMember) -> BTreeMap<String, String> {
    let mut vars = campaign.variables.clone();
    vars.insert("campaign_name".into(), campaign.name.clone());
    vars.insert("member_id".into(), member.id.to_string());
    vars.insert("name".into(), member.name.clone().unwrap_or_default());
    vars.insert("phone".into(), member.phone.clone());
    vars.insert("ward".into(), member.ward.clone().unwrap_or_default());
    vars.insert("booth".into(), member.booth.clone().unwrap_or_default());
    vars
}

/// Replace `{{ key }}` markers in `body`. Unknown keys are left as written.
pub fn interpolate(body: &str, bindings: &BTreeMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(body, |caps: &Captures<'_>| match bindings.get(&caps[1]) {
            Some(value) => value.clone(),
            None => {
                debug!(placeholder = &caps[1], "no binding for template placeholder");
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Build the channel-specific send request for `member`.
pub fn outbound(template: &Template, campaign: &Campaign, member: &AudienceMember) -> OutboundDispatch {
    let vars = bindings(campaign, member);
    let to = member.phone.clone();
    match template.channel {
        Channel::RichMessage => OutboundDispatch::RichMessage(RichMessageRequest {
            to,
            template_name: template.name.clone(),
            bindings: vars,
            media_url: template.media_url.clone(),
        }),
        Channel::TextMessage => OutboundDispatch::TextMessage(TextMessageRequest {
            to,
            text: interpolate(&template.body, &vars),
        }),
        Channel::VoiceCall => {
            let prompt = match &template.audio_url {
                Some(url) => VoicePrompt::Audio { url: url.clone() },
                None => VoicePrompt::Speech {
                    script: interpolate(&template.body, &vars),
                },
            };
            OutboundDispatch::VoiceCall(VoiceCallRequest {
                to,
                campaign_id: campaign.id.clone(),
                prompt,
            })
        }
    }
}
