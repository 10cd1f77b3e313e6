// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Herald cascade.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::HeraldError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Unique identifier for a campaign.
    CampaignId
);
string_id!(
    /// Unique identifier for an audience member.
    MemberId
);
string_id!(
    /// Unique identifier for a message template.
    TemplateId
);
string_id!(
    /// Provider-assigned identifier for a sent message or placed call.
    MessageId
);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

/// One outbound communication modality.
///
/// The set is closed: every place that selects an adapter or a policy matches
/// on this enum, so an unknown channel cannot reach the processor.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    /// Rich chat messaging (template-based, media capable).
    RichMessage,
    /// Outbound voice call (pre-recorded audio or text-to-speech).
    VoiceCall,
    /// Plain text message.
    TextMessage,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::RichMessage, Channel::VoiceCall, Channel::TextMessage];
}

/// Lifecycle status of a dispatch record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryStatus {
    Queued,
    Sent,
    Ringing,
    Answered,
    Delivered,
    Read,
    Failed,
    NoAnswer,
    OptedOut,
}

impl DeliveryStatus {
    /// `failed` and `no_answer`: the statuses the cascade policy retries or escalates.
    pub fn is_failure_like(self) -> bool {
        matches!(self, Self::Failed | Self::NoAnswer)
    }

    /// The outreach reached the member.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Answered | Self::Delivered | Self::Read)
    }

    /// Handed to the provider, outcome not yet known.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Sent | Self::Ringing)
    }

    /// Statuses from which the processor may issue a send.
    pub fn is_sendable(self) -> bool {
        matches!(self, Self::Queued | Self::Failed | Self::NoAnswer)
    }
}

/// Status reported asynchronously by a channel provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CallbackStatus {
    Delivered,
    Read,
    Failed,
    NoAnswer,
    Ringing,
    Answered,
}

impl From<CallbackStatus> for DeliveryStatus {
    fn from(status: CallbackStatus) -> Self {
        match status {
            CallbackStatus::Delivered => DeliveryStatus::Delivered,
            CallbackStatus::Read => DeliveryStatus::Read,
            CallbackStatus::Failed => DeliveryStatus::Failed,
            CallbackStatus::NoAnswer => DeliveryStatus::NoAnswer,
            CallbackStatus::Ringing => DeliveryStatus::Ringing,
            CallbackStatus::Answered => DeliveryStatus::Answered,
        }
    }
}

/// A filter value given either as a single scalar or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(v) => std::slice::from_ref(v),
            Self::Many(vs) => vs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl<T: PartialEq> OneOrMany<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.as_slice().contains(value)
    }
}

/// Campaign targeting filter.
///
/// Every clause is optional; the clauses that are present are combined with
/// logical AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentFilter {
    /// Exclude members who opted out.
    #[serde(default)]
    pub exclude_opted_out: bool,

    /// Allowed ward labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward: Option<OneOrMany<String>>,

    /// Allowed booth labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booth: Option<OneOrMany<String>>,

    /// At least one of these tags must be present on the member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Required rich-messaging capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_capable: Option<bool>,
}

/// A person who may be contacted by a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceMember {
    pub id: MemberId,
    #[serde(default)]
    pub name: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub booth: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Supports rich messaging.
    #[serde(default)]
    pub whatsapp_capable: bool,
    #[serde(default)]
    pub opted_out: bool,
}

/// An outreach campaign: the cascade order, targeting and templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    /// Owner whose channel identities (sender numbers) are used for sends.
    pub owner_id: String,
    pub name: String,
    /// Cascade order. Non-empty, no repeats.
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub filter: SegmentFilter,
    /// Templates the campaign may use, one per channel it needs.
    #[serde(default)]
    pub template_ids: Vec<TemplateId>,
    /// Extra placeholder bindings shared by every message of the campaign.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl Campaign {
    /// First channel of the cascade.
    pub fn first_channel(&self) -> Option<Channel> {
        self.channels.first().copied()
    }

    /// Checks the structural invariants of the campaign definition.
    pub fn validate(&self) -> Result<(), HeraldError> {
        if self.channels.is_empty() {
            return Err(HeraldError::Config(format!(
                "campaign {} has an empty channel list",
                self.id
            )));
        }
        let mut seen = BTreeSet::new();
        for channel in &self.channels {
            if !seen.insert(*channel) {
                return Err(HeraldError::Config(format!(
                    "campaign {} lists channel {channel} more than once",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

/// An approved (or pending approval) message body for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub channel: Channel,
    /// Provider-side template name for rich messages.
    pub name: String,
    /// Body with `{{ placeholder }}` markers.
    pub body: String,
    #[serde(default)]
    pub media_url: Option<String>,
    /// Pre-recorded audio for voice calls. Without it the body is spoken.
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub approved: bool,
}

/// Identity of a dispatch record: one per (campaign, member) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DispatchKey {
    pub campaign_id: CampaignId,
    pub member_id: MemberId,
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.campaign_id, self.member_id)
    }
}

/// Delivery-attempt state for one (campaign, member) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub campaign_id: CampaignId,
    pub member_id: MemberId,
    /// Current cascade channel.
    pub channel: Channel,
    pub status: DeliveryStatus,
    /// Attempts made on the current channel.
    pub attempts: u32,
    pub provider_message_id: Option<MessageId>,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Every channel was tried without success.
    pub cascade_exhausted: bool,
    /// Bumped on every transition; the optimistic concurrency token.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Earliest time the processor looks at the record again. `None` means
    /// on the next pass. Written without a revision bump by
    /// [`DispatchStore::reschedule`](crate::DispatchStore::reschedule).
    #[serde(default)]
    pub next_due_at: Option<DateTime<Utc>>,
}

impl DispatchRecord {
    /// A fresh `queued` record on the given channel.
    pub fn new(
        campaign_id: CampaignId,
        member_id: MemberId,
        channel: Channel,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            campaign_id,
            member_id,
            channel,
            status: DeliveryStatus::Queued,
            attempts: 0,
            provider_message_id: None,
            last_sent_at: None,
            last_error: None,
            cascade_exhausted: false,
            revision: 0,
            created_at: now,
            updated_at: now,
            next_due_at: None,
        }
    }

    pub fn key(&self) -> DispatchKey {
        DispatchKey {
            campaign_id: self.campaign_id.clone(),
            member_id: self.member_id.clone(),
        }
    }

    /// Sort position among due records: the scheduled time, or the last
    /// update when nothing is scheduled.
    pub fn due_order(&self) -> DateTime<Utc> {
        self.next_due_at.unwrap_or(self.updated_at)
    }

    /// No further transitions except a forced opt-out.
    pub fn is_terminal(&self) -> bool {
        self.status.is_success() || self.status == DeliveryStatus::OptedOut || self.cascade_exhausted
    }
}

/// Inbound delivery-status update from a channel provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCallback {
    pub channel: Channel,
    pub message_id: MessageId,
    pub status: CallbackStatus,
    pub timestamp: DateTime<Utc>,
}

/// Shared, per-channel provider credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub api_key: String,
    pub base_url: String,
    pub active: bool,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("active", &self.active)
            .finish()
    }
}

/// A campaign owner's identity on one channel (sender number or ID).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelIdentity {
    pub owner_id: String,
    pub channel: Channel,
    pub sender_id: String,
    pub webhook_url: Option<String>,
    pub active: bool,
}

/// Everything an adapter needs to authenticate and address a send.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    pub credentials: ProviderCredentials,
    pub identity: ChannelIdentity,
}

/// A template-based rich message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichMessageRequest {
    pub to: String,
    pub template_name: String,
    pub bindings: BTreeMap<String, String>,
    pub media_url: Option<String>,
}

/// A plain text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextMessageRequest {
    pub to: String,
    pub text: String,
}

/// What is played when a voice call is answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoicePrompt {
    Audio { url: String },
    Speech { script: String },
}

/// An outbound voice call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceCallRequest {
    pub to: String,
    pub campaign_id: CampaignId,
    pub prompt: VoicePrompt,
}

/// A send request for exactly one channel kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundDispatch {
    RichMessage(RichMessageRequest),
    TextMessage(TextMessageRequest),
    VoiceCall(VoiceCallRequest),
}

impl OutboundDispatch {
    pub fn channel(&self) -> Channel {
        match self {
            Self::RichMessage(_) => Channel::RichMessage,
            Self::TextMessage(_) => Channel::TextMessage,
            Self::VoiceCall(_) => Channel::VoiceCall,
        }
    }
}
