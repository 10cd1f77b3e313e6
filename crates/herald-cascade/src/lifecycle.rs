// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch record state machine.
//!
//! [`apply`] is the only way a record changes state after creation. It never
//! mutates its input; the caller persists the returned record with a
//! compare-and-swap against the input's revision.

use std::fmt;

use chrono::{DateTime, Utc};
use herald_core::{CallbackStatus, Channel, DeliveryStatus, DispatchRecord, HeraldError, MessageId};

/// Something that happened to a dispatch record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// The provider accepted a send on the current channel. `sent_at` is
    /// when the send started.
    SendAccepted {
        message_id: MessageId,
        sent_at: DateTime<Utc>,
    },
    /// A send on the current channel failed synchronously or timed out.
    SendFailed {
        error: String,
        sent_at: DateTime<Utc>,
    },
    /// The provider reported a status asynchronously.
    Provider(CallbackStatus),
    /// Move to `channel` with a fresh attempt counter.
    Escalate { channel: Channel },
    /// No channel is left.
    Exhaust,
    /// The member opted out.
    OptOut,
}

impl fmt::Display for DispatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendAccepted { .. } => f.write_str("send_accepted"),
            Self::SendFailed { .. } => f.write_str("send_failed"),
            Self::Provider(status) => write!(f, "provider:{status}"),
            Self::Escalate { channel } => write!(f, "escalate:{channel}"),
            Self::Exhaust => f.write_str("exhaust"),
            Self::OptOut => f.write_str("opt_out"),
        }
    }
}

/// Apply `event` to `record`, returning the next version of the record.
///
/// Every successful transition bumps `revision`, sets `updated_at` and clears
/// `next_due_at`. Illegal events yield [`HeraldError::InvalidTransition`].
pub fn apply(
    record: &DispatchRecord,
    event: DispatchEvent,
    now: DateTime<Utc>,
) -> Result<DispatchRecord, HeraldError> {
    if !is_legal(record, &event) {
        return Err(HeraldError::InvalidTransition {
            from: record.status,
            event: event.to_string(),
        });
    }

    let mut next = record.clone();
    match event {
        DispatchEvent::SendAccepted {
            message_id,
            sent_at,
        } => {
            next.status = DeliveryStatus::Sent;
            next.attempts += 1;
            next.provider_message_id = Some(message_id);
            next.last_sent_at = Some(sent_at);
            next.last_error = None;
        }
        DispatchEvent::SendFailed { error, sent_at } => {
            next.status = DeliveryStatus::Failed;
            next.attempts += 1;
            next.provider_message_id = None;
            next.last_sent_at = Some(sent_at);
            next.last_error = Some(error);
        }
        DispatchEvent::Provider(status) => {
            next.status = status.into();
            if next.status.is_failure_like() {
                next.last_error = Some(format!("provider reported {status}"));
            }
        }
        DispatchEvent::Escalate { channel } => {
            next.channel = channel;
            next.status = DeliveryStatus::Queued;
            next.attempts = 0;
            next.provider_message_id = None;
            next.last_sent_at = None;
            next.last_error = None;
        }
        DispatchEvent::Exhaust => {
            next.status = DeliveryStatus::Failed;
            next.cascade_exhausted = true;
        }
        DispatchEvent::OptOut => {
            next.status = DeliveryStatus::OptedOut;
        }
    }
    next.revision = record.revision + 1;
    next.updated_at = now;
    next.next_due_at = None;
    Ok(next)
}

/// Reserve a sendable record for one send, until `lease_until`.
///
/// Only `revision` and `next_due_at` change. Persisted with a
/// compare-and-swap, the claim makes any other pass holding the old revision
/// lose its own claim, so a record is sent by one pass at a time.
pub fn claim(
    record: &DispatchRecord,
    lease_until: DateTime<Utc>,
) -> Result<DispatchRecord, HeraldError> {
    if record.is_terminal() || !record.status.is_sendable() {
        return Err(HeraldError::InvalidTransition {
            from: record.status,
            event: "claim".to_string(),
        });
    }
    let mut next = record.clone();
    next.revision = record.revision + 1;
    next.next_due_at = Some(lease_until);
    Ok(next)
}

fn is_legal(record: &DispatchRecord, event: &DispatchEvent) -> bool {
    let status = record.status;

    if matches!(event, DispatchEvent::OptOut) {
        return status != DeliveryStatus::OptedOut;
    }
    // Read receipts may still land on a delivered message.
    if matches!(event, DispatchEvent::Provider(CallbackStatus::Read))
        && status == DeliveryStatus::Delivered
    {
        return true;
    }
    if record.is_terminal() {
        return false;
    }

    match event {
        DispatchEvent::SendAccepted { .. } | DispatchEvent::SendFailed { .. } => status.is_sendable(),
        DispatchEvent::Provider(_) => status.is_in_flight(),
        DispatchEvent::Escalate { .. } | DispatchEvent::Exhaust => status.is_failure_like(),
        DispatchEvent::OptOut => true,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn queued() -> DispatchRecord {
        DispatchRecord::new("c-1".into(), "m-1".into(), Channel::RichMessage, t0())
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn step(record: &DispatchRecord, event: DispatchEvent, mins: i64) -> DispatchRecord {
        apply(record, event, t0() + Duration::minutes(mins)).unwrap()
    }

    fn accepted(id: &str) -> DispatchEvent {
        accepted_at(id, t0() + Duration::minutes(1))
    }

    fn accepted_at(id: &str, sent_at: DateTime<Utc>) -> DispatchEvent {
        DispatchEvent::SendAccepted {
            message_id: id.into(),
            sent_at,
        }
    }

    fn failed() -> DispatchEvent {
        DispatchEvent::SendFailed {
            error: "provider unavailable".into(),
            sent_at: t0(),
        }
    }

    #[test]
    fn accepted_send_moves_to_sent() {
        let sent = step(&queued(), accepted("msg-1"), 1);
        assert_eq!(sent.status, DeliveryStatus::Sent);
        assert_eq!(sent.attempts, 1);
        assert_eq!(sent.provider_message_id, Some("msg-1".into()));
        assert_eq!(sent.last_sent_at, Some(t0() + Duration::minutes(1)));
        assert_eq!(sent.revision, 1);
        assert_eq!(sent.updated_at, t0() + Duration::minutes(1));
    }

    #[test]
    fn failed_send_records_error_and_counts_attempt() {
        let f = step(&queued(), failed(), 1);
        assert_eq!(f.status, DeliveryStatus::Failed);
        assert_eq!(f.attempts, 1);
        assert_eq!(f.last_error.as_deref(), Some("provider unavailable"));
        assert!(f.provider_message_id.is_none());
        assert!(!f.cascade_exhausted);

        let again = step(&f, failed(), 6);
        assert_eq!(again.attempts, 2);
        assert_eq!(again.revision, 2);
    }

    #[test]
    fn provider_statuses_follow_a_send() {
        let sent = step(&queued(), accepted("msg-1"), 1);
        let ringing = step(&sent, DispatchEvent::Provider(CallbackStatus::Ringing), 2);
        assert_eq!(ringing.status, DeliveryStatus::Ringing);
        let answered = step(&ringing, DispatchEvent::Provider(CallbackStatus::Answered), 3);
        assert_eq!(answered.status, DeliveryStatus::Answered);
        assert!(answered.is_terminal());

        let no_answer = step(&sent, DispatchEvent::Provider(CallbackStatus::NoAnswer), 2);
        assert_eq!(no_answer.status, DeliveryStatus::NoAnswer);
        assert_eq!(no_answer.last_error.as_deref(), Some("provider reported no_answer"));
    }

    #[test]
    fn read_may_follow_delivered() {
        let sent = step(&queued(), accepted("msg-1"), 1);
        let delivered = step(&sent, DispatchEvent::Provider(CallbackStatus::Delivered), 2);
        let read = step(&delivered, DispatchEvent::Provider(CallbackStatus::Read), 3);
        assert_eq!(read.status, DeliveryStatus::Read);

        let err = apply(&read, DispatchEvent::Provider(CallbackStatus::Read), t0()).unwrap_err();
        assert!(matches!(err, HeraldError::InvalidTransition { .. }));
    }

    #[test]
    fn delivered_cannot_regress_to_failed() {
        let sent = step(&queued(), accepted("msg-1"), 1);
        let delivered = step(&sent, DispatchEvent::Provider(CallbackStatus::Delivered), 2);
        let err = apply(&delivered, DispatchEvent::Provider(CallbackStatus::Failed), t0())
            .unwrap_err();
        assert!(matches!(
            err,
            HeraldError::InvalidTransition { from: DeliveryStatus::Delivered, ref event }
                if event == "provider:failed"
        ));
    }

    #[test]
    fn provider_status_on_queued_record_is_illegal() {
        let err = apply(&queued(), DispatchEvent::Provider(CallbackStatus::Delivered), t0())
            .unwrap_err();
        assert!(matches!(err, HeraldError::InvalidTransition { .. }));
    }

    #[test]
    fn cannot_send_while_in_flight() {
        let sent = step(&queued(), accepted("msg-1"), 1);
        assert!(apply(&sent, accepted("msg-2"), t0()).is_err());
    }

    #[test]
    fn escalation_resets_channel_state() {
        let f = step(&queued(), failed(), 1);
        let escalated = step(
            &f,
            DispatchEvent::Escalate {
                channel: Channel::VoiceCall,
            },
            90,
        );
        assert_eq!(escalated.channel, Channel::VoiceCall);
        assert_eq!(escalated.status, DeliveryStatus::Queued);
        assert_eq!(escalated.attempts, 0);
        assert!(escalated.provider_message_id.is_none());
        assert!(escalated.last_sent_at.is_none());
        assert!(escalated.last_error.is_none());
        assert_eq!(escalated.created_at, t0());
    }

    #[test]
    fn escalation_requires_failure() {
        let sent = step(&queued(), accepted("msg-1"), 1);
        let event = DispatchEvent::Escalate {
            channel: Channel::VoiceCall,
        };
        assert!(apply(&sent, event.clone(), t0()).is_err());
        assert!(apply(&queued(), event, t0()).is_err());
    }

    #[test]
    fn exhaustion_is_terminal() {
        let f = step(&queued(), failed(), 1);
        let exhausted = step(&f, DispatchEvent::Exhaust, 90);
        assert_eq!(exhausted.status, DeliveryStatus::Failed);
        assert!(exhausted.cascade_exhausted);
        assert!(exhausted.is_terminal());
        assert!(apply(&exhausted, failed(), t0()).is_err());
        assert!(apply(&exhausted, DispatchEvent::Exhaust, t0()).is_err());
    }

    #[test]
    fn opt_out_is_allowed_from_any_other_state() {
        let sent = step(&queued(), accepted("msg-1"), 1);
        let delivered = step(&sent, DispatchEvent::Provider(CallbackStatus::Delivered), 2);
        for record in [queued(), sent, delivered] {
            let out = apply(&record, DispatchEvent::OptOut, t0()).unwrap();
            assert_eq!(out.status, DeliveryStatus::OptedOut);
            assert!(apply(&out, DispatchEvent::OptOut, t0()).is_err());
            assert!(apply(&out, failed(), t0()).is_err());
        }
    }

    #[test]
    fn apply_does_not_mutate_input() {
        let record = queued();
        let _ = step(&record, accepted("msg-1"), 1);
        assert_eq!(record, queued());
    }
    #[test]
    fn send_time_is_when_the_send_started() {
        let started = t0() + Duration::seconds(30);
        let sent = step(&queued(), accepted_at("msg-1", started), 1);
        assert_eq!(sent.last_sent_at, Some(started));
        assert_eq!(sent.updated_at, t0() + Duration::minutes(1));
    }

    #[test]
    fn claim_bumps_revision_and_sets_lease() {
        let lease = t0() + Duration::minutes(1);
        let claimed = claim(&queued(), lease).unwrap();
        assert_eq!(claimed.revision, 1);
        assert_eq!(claimed.next_due_at, Some(lease));
        assert_eq!(claimed.status, DeliveryStatus::Queued);
        assert_eq!(claimed.updated_at, t0());

        let sent = step(&claimed, accepted("msg-1"), 1);
        assert_eq!(sent.revision, 2);
        assert_eq!(sent.next_due_at, None);
    }

    #[test]
    fn claim_requires_a_sendable_record() {
        let sent = step(&queued(), accepted("msg-1"), 1);
        let err = claim(&sent, t0()).unwrap_err();
        assert!(matches!(
            err,
            HeraldError::InvalidTransition { from: DeliveryStatus::Sent, ref event }
                if event == "claim"
        ));

        let exhausted = step(&step(&queued(), failed(), 1), DispatchEvent::Exhaust, 90);
        assert!(claim(&exhausted, t0()).is_err());
    }
}
