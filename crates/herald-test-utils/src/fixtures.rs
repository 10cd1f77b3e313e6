// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for common test data.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeZone, Utc};
use herald_core::{
    AudienceMember, Campaign, Channel, ChannelIdentity, ProviderCredentials, SegmentFilter,
    Template,
};

pub const OWNER: &str = "org-1";

/// The cascade used by most scenarios: rich message, then voice, then text.
pub const FULL_CASCADE: [Channel; 3] = [Channel::RichMessage, Channel::VoiceCall, Channel::TextMessage];

/// 2026-03-01T09:00:00Z.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A reachable member with no labels or tags.
pub fn member(id: &str) -> AudienceMember {
    AudienceMember {
        id: id.into(),
        name: Some(format!("Member {id}")),
        phone: format!("+1555{id:0>4}"),
        ward: None,
        booth: None,
        tags: BTreeSet::new(),
        whatsapp_capable: true,
        opted_out: false,
    }
}

pub fn opted_out_member(id: &str) -> AudienceMember {
    AudienceMember {
        opted_out: true,
        ..member(id)
    }
}

/// Template id used by [`template`] for `channel`.
pub fn template_id(channel: Channel) -> String {
    format!("tpl-{channel}")
}

/// An approved template for `channel`.
pub fn template(channel: Channel) -> Template {
    Template {
        id: template_id(channel).as_str().into(),
        channel,
        name: format!("{channel}_v1"),
        body: "Hello {{name}}, polls open {{polling_day}}.".into(),
        media_url: None,
        audio_url: None,
        approved: true,
    }
}

/// A campaign over `channels` referencing one [`template`] per channel.
pub fn campaign(id: &str, channels: &[Channel]) -> Campaign {
    Campaign {
        id: id.into(),
        owner_id: OWNER.into(),
        name: format!("Campaign {id}"),
        channels: channels.to_vec(),
        filter: SegmentFilter {
            exclude_opted_out: true,
            ..SegmentFilter::default()
        },
        template_ids: channels
            .iter()
            .map(|c| template_id(*c).as_str().into())
            .collect(),
        variables: BTreeMap::from([("polling_day".to_string(), "Sunday".to_string())]),
    }
}

pub fn credentials(channel: Channel) -> ProviderCredentials {
    ProviderCredentials {
        api_key: format!("{channel}-key"),
        base_url: format!("https://{channel}.example.test"),
        active: true,
    }
}

pub fn identity(owner_id: &str, channel: Channel) -> ChannelIdentity {
    ChannelIdentity {
        owner_id: owner_id.into(),
        channel,
        sender_id: "+15550100".into(),
        webhook_url: Some("https://hooks.example.test/herald".into()),
        active: true,
    }
}
