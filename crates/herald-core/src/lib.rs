// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Herald outreach cascade.
//!
//! This crate provides the domain types shared by every other Herald crate
//! (channels, statuses, audience members, campaigns, templates and dispatch
//! records), the [`HeraldError`] type, and the adapter traits that concrete
//! channel integrations and persistence backends implement.

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, SystemClock};
pub use error::HeraldError;
pub use types::{
    AdapterType, AudienceMember, CallbackStatus, Campaign, CampaignId, Channel, ChannelIdentity,
    DeliveryStatus, DispatchKey, DispatchRecord, HealthStatus, MemberId, MessageId, OneOrMany,
    OutboundDispatch, ProviderContext, ProviderCredentials, RichMessageRequest, SegmentFilter,
    StatusCallback, Template, TemplateId, TextMessageRequest, VoiceCallRequest, VoicePrompt,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    CampaignCatalog, DispatchStore, PluginAdapter, RichMessageSender, TextMessageSender,
    VoiceCaller,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn herald_error_has_all_variants() {
        let _config = HeraldError::Config("test".into());
        let _storage = HeraldError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _channel = HeraldError::Channel {
            message: "test".into(),
            source: None,
        };
        let _timeout = HeraldError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _not_found = HeraldError::NotFound {
            kind: "campaign",
            id: "c-1".into(),
        };
        let _transition = HeraldError::InvalidTransition {
            from: DeliveryStatus::Queued,
            event: "provider:read".into(),
        };
        let _serialization = HeraldError::Serialization {
            source: Box::new(std::io::Error::other("test")),
        };
        let _internal = HeraldError::Internal("test".into());
    }

    #[test]
    fn channel_display_and_from_str_round_trip() {
        use std::str::FromStr;

        for channel in Channel::ALL {
            let s = channel.to_string();
            let parsed = Channel::from_str(&s).expect("should parse back");
            assert_eq!(channel, parsed);
        }
        assert_eq!(Channel::RichMessage.to_string(), "rich_message");
    }

    #[test]
    fn channel_serializes_as_snake_case() {
        let json = serde_json::to_string(&Channel::VoiceCall).expect("should serialize");
        assert_eq!(json, "\"voice_call\"");
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_rich<T: RichMessageSender>() {}
        fn _assert_text<T: TextMessageSender>() {}
        fn _assert_voice<T: VoiceCaller>() {}
        fn _assert_store<T: DispatchStore>() {}
        fn _assert_catalog<T: CampaignCatalog>() {}
    }
}
