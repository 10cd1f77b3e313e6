// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel cascade policy: the per-channel retry and escalation decision table.
//!
//! The policy is pure. Given a record's channel, status, attempt count and the
//! time since its last send, [`CascadePolicy::next_action`] says what the
//! processor should do next. Escalation always moves to the next channel in
//! the campaign's own order.

use std::time::Duration;

use herald_config::model::{CascadeConfig, ChannelPolicyConfig};
use herald_core::{Channel, DeliveryStatus};

/// Retry and escalation parameters for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPolicy {
    /// Sends allowed on the channel before it is given up.
    pub max_attempts: u32,
    /// Minimum time since the last send, while failing, before escalating.
    pub escalation_delay: Duration,
    /// Same-channel retry waits. Saturates at the last entry.
    pub retry_delays: Vec<Duration>,
}

impl From<&ChannelPolicyConfig> for ChannelPolicy {
    fn from(config: &ChannelPolicyConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            escalation_delay: Duration::from_secs(config.escalation_delay_secs),
            retry_delays: config
                .retry_delays_secs
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
        }
    }
}

/// What the processor should do with a record right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    /// First send on the current channel.
    SendNow,
    /// Retry on the same channel now.
    RetryNow,
    /// Retry on the same channel once the remaining wait has passed.
    RetryAfter(Duration),
    /// Attempts are used up; escalate once the remaining wait has passed.
    AwaitEscalation(Duration),
    /// Move to the given channel.
    Escalate(Channel),
    /// No channel is left; the record fails terminally.
    Exhausted,
    /// In flight or concluded.
    NoAction,
}

impl NextAction {
    /// Whether the processor has work to do for this record in this pass.
    pub fn is_due(self) -> bool {
        matches!(
            self,
            Self::SendNow | Self::RetryNow | Self::Escalate(_) | Self::Exhausted
        )
    }
}

/// Per-channel policy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePolicy {
    rich_message: ChannelPolicy,
    voice_call: ChannelPolicy,
    text_message: ChannelPolicy,
}

impl CascadePolicy {
    pub fn new(
        rich_message: ChannelPolicy,
        voice_call: ChannelPolicy,
        text_message: ChannelPolicy,
    ) -> Self {
        Self {
            rich_message,
            voice_call,
            text_message,
        }
    }

    pub fn from_config(config: &CascadeConfig) -> Self {
        Self::new(
            (&config.rich_message).into(),
            (&config.voice_call).into(),
            (&config.text_message).into(),
        )
    }

    pub fn for_channel(&self, channel: Channel) -> &ChannelPolicy {
        match channel {
            Channel::RichMessage => &self.rich_message,
            Channel::VoiceCall => &self.voice_call,
            Channel::TextMessage => &self.text_message,
        }
    }

    /// Wait before the same-channel retry numbered `attempt` (zero-based).
    ///
    /// Returns `None` once `attempt` reaches the channel's attempt ceiling:
    /// callers must not schedule a retry in that case. Beyond the end of the
    /// schedule the last delay is reused.
    pub fn retry_delay(&self, channel: Channel, attempt: u32) -> Option<Duration> {
        let policy = self.for_channel(channel);
        if attempt >= policy.max_attempts {
            return None;
        }
        let idx = attempt as usize;
        policy
            .retry_delays
            .get(idx)
            .or_else(|| policy.retry_delays.last())
            .copied()
    }

    /// Decide the next action for a record.
    ///
    /// `attempts` counts sends already made on `channel`; `since_last_send` is
    /// the time since the most recent of them. `cascade` is the campaign's
    /// channel order.
    pub fn next_action(
        &self,
        channel: Channel,
        status: DeliveryStatus,
        attempts: u32,
        since_last_send: Duration,
        cascade: &[Channel],
    ) -> NextAction {
        if status == DeliveryStatus::Queued {
            return NextAction::SendNow;
        }
        if !status.is_failure_like() {
            return NextAction::NoAction;
        }

        let policy = self.for_channel(channel);
        let escalation_due = since_last_send >= policy.escalation_delay;

        if attempts >= policy.max_attempts {
            return if escalation_due {
                escalate(cascade, channel)
            } else {
                NextAction::AwaitEscalation(policy.escalation_delay - since_last_send)
            };
        }

        if escalation_due {
            return escalate(cascade, channel);
        }

        // attempts < max_attempts here, so the schedule lookup cannot be exhausted.
        match self.retry_delay(channel, attempts.saturating_sub(1)) {
            Some(wait) if since_last_send >= wait => NextAction::RetryNow,
            Some(wait) => NextAction::RetryAfter(wait - since_last_send),
            None => NextAction::AwaitEscalation(policy.escalation_delay - since_last_send),
        }
    }
}

impl Default for CascadePolicy {
    fn default() -> Self {
        Self::from_config(&CascadeConfig::default())
    }
}

/// The channel after `current` in `cascade`, if any.
pub fn next_channel(cascade: &[Channel], current: Channel) -> Option<Channel> {
    let pos = cascade.iter().position(|c| *c == current)?;
    cascade.get(pos + 1).copied()
}

fn escalate(cascade: &[Channel], current: Channel) -> NextAction {
    match next_channel(cascade, current) {
        Some(next) => NextAction::Escalate(next),
        None => NextAction::Exhausted,
    }
}
