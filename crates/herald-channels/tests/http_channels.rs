// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP adapters against a mock provider.

use std::collections::BTreeMap;

use herald_channels::{HttpClient, HttpRichMessageChannel, HttpTextChannel, HttpVoiceChannel};
use herald_core::{
    Channel, ChannelIdentity, HeraldError, ProviderContext, ProviderCredentials,
    RichMessageRequest, RichMessageSender, TextMessageRequest, TextMessageSender,
    VoiceCallRequest, VoiceCaller, VoicePrompt,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(base_url: &str, channel: Channel) -> ProviderContext {
    ProviderContext {
        credentials: ProviderCredentials {
            api_key: "test-key".into(),
            // Trailing slash is tolerated.
            base_url: format!("{base_url}/"),
            active: true,
        },
        identity: ChannelIdentity {
            owner_id: "org-1".into(),
            channel,
            sender_id: "+15550100".into(),
            webhook_url: Some("https://hooks.example.test/herald".into()),
            active: true,
        },
    }
}

fn text_request() -> TextMessageRequest {
    TextMessageRequest {
        to: "+15550111".into(),
        text: "Polls open Sunday".into(),
    }
}

#[tokio::test]
async fn rich_message_posts_template_and_returns_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "from": "+15550100",
            "to": "+15550111",
            "template": "turnout_v1",
            "bindings": {"name": "Asha"},
            "status_callback": "https://hooks.example.test/herald"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "wamid-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let channel = HttpRichMessageChannel::new(HttpClient::new().unwrap());
    let id = channel
        .send_rich(
            &provider(&server.uri(), Channel::RichMessage),
            RichMessageRequest {
                to: "+15550111".into(),
                template_name: "turnout_v1".into(),
                bindings: BTreeMap::from([("name".to_string(), "Asha".to_string())]),
                media_url: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(id.0, "wamid-1");
}

#[tokio::test]
async fn voice_call_posts_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calls"))
        .and(body_partial_json(serde_json::json!({
            "campaign_id": "c-1",
            "prompt": {"kind": "audio", "url": "https://cdn.example.test/a.mp3"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "call-9"})))
        .mount(&server)
        .await;

    let channel = HttpVoiceChannel::new(HttpClient::new().unwrap());
    let id = channel
        .place_call(
            &provider(&server.uri(), Channel::VoiceCall),
            VoiceCallRequest {
                to: "+15550111".into(),
                campaign_id: "c-1".into(),
                prompt: VoicePrompt::Audio {
                    url: "https://cdn.example.test/a.mp3".into(),
                },
            },
        )
        .await
        .unwrap();
    assert_eq!(id.0, "call-9");
}

#[tokio::test]
async fn non_success_status_is_a_channel_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sms"))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid number"))
        .mount(&server)
        .await;

    let channel = HttpTextChannel::new(HttpClient::new().unwrap());
    let err = channel
        .send_text(&provider(&server.uri(), Channel::TextMessage), text_request())
        .await
        .unwrap_err();
    match err {
        HeraldError::Channel { message, .. } => {
            assert!(message.contains("422"), "{message}");
            assert!(message.contains("invalid number"), "{message}");
        }
        other => panic!("expected channel error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_id_is_a_channel_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "queued"})))
        .mount(&server)
        .await;

    let channel = HttpTextChannel::new(HttpClient::new().unwrap());
    let err = channel
        .send_text(&provider(&server.uri(), Channel::TextMessage), text_request())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no message id"));
}

#[tokio::test]
async fn unreachable_provider_is_a_channel_error() {
    let channel = HttpTextChannel::new(HttpClient::new().unwrap());
    // Port 9 (discard) on loopback is closed in test environments.
    let err = channel
        .send_text(&provider("http://127.0.0.1:9", Channel::TextMessage), text_request())
        .await
        .unwrap_err();
    assert!(matches!(err, HeraldError::Channel { source: Some(_), .. }));
}
