// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-record outcomes and batch summaries reported by the processor.

use herald_core::{CampaignId, Channel, DeliveryStatus, MemberId, MessageId};
use serde::Serialize;
use strum::Display;

/// Why a record was left untouched for a later pass.
///
/// Every variant is a configuration gap, never a delivery failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    CampaignMissing,
    MemberMissing,
    TemplateMissing,
    TemplateNotApproved,
    ProviderMissing,
    ProviderInactive,
    IdentityMissing,
    IdentityInactive,
    AdapterMissing,
}

/// What happened to one record during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    Sent { message_id: MessageId },
    SendFailed { error: String },
    Escalated { from: Channel, to: Channel },
    Exhausted,
    OptedOut,
    /// Waiting on a retry or escalation window; `wait_secs` is the remainder.
    NotDue { wait_secs: Option<u64> },
    Skipped { reason: SkipReason },
    /// The record changed underneath the pass; it is left for the next one.
    Conflict,
    Error { message: String },
}

/// One record's outcome in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordResult {
    pub campaign_id: CampaignId,
    pub member_id: MemberId,
    pub channel: Channel,
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

/// Aggregate result of one `process_due` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Records in the snapshot.
    pub processed: usize,
    /// Sends accepted by a provider.
    pub success_count: usize,
    /// Failed or timed-out sends plus records that hit an internal error.
    pub failure_count: usize,
    pub results: Vec<RecordResult>,
}

impl BatchSummary {
    pub fn from_results(results: Vec<RecordResult>) -> Self {
        let success_count = results
            .iter()
            .filter(|r| matches!(r.outcome, RecordOutcome::Sent { .. }))
            .count();
        let failure_count = results
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    RecordOutcome::SendFailed { .. } | RecordOutcome::Error { .. }
                )
            })
            .count();
        Self {
            processed: results.len(),
            success_count,
            failure_count,
            results,
        }
    }

    /// Number of results matching `pred`.
    pub fn count(&self, pred: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Result of launching a campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LaunchSummary {
    /// Members selected by the campaign's filter.
    pub matched: usize,
    /// New dispatch records.
    pub created: usize,
    /// Members that already had a record for this campaign.
    pub already_present: usize,
    /// Matched members dropped because they opted out.
    pub excluded_opted_out: usize,
}

/// Why a provider callback did not change a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IgnoreReason {
    /// Timestamped before the record's latest send.
    Stale,
    /// The record is already terminal.
    Terminal,
    /// Not a legal transition from the record's status.
    InvalidTransition,
}

/// Result of applying a provider callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CallbackOutcome {
    Applied {
        campaign_id: CampaignId,
        member_id: MemberId,
        status: DeliveryStatus,
    },
    Ignored { reason: IgnoreReason },
    /// No record carries the message id.
    Unmatched,
    /// The record kept changing underneath the callback.
    Conflict,
}

impl CallbackOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::Ignored { .. } => "ignored",
            Self::Unmatched => "unmatched",
            Self::Conflict => "conflict",
        }
    }
}
