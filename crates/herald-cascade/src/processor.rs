// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch processor: turns cascade decisions into sends and record updates.
//!
//! A pass takes a bounded snapshot of due records and handles each one at
//! most once. Records are independent, so they are processed concurrently;
//! writes to a single record are serialized by the store's compare-and-swap.
//! A failure on one record is reported in its result and never aborts the
//! pass.
//!
//! Records that need nothing yet, or cannot be sent for lack of
//! configuration, are rescheduled so they leave the front of the due queue.
//! A send is preceded by a claim that bumps the revision, so two overlapping
//! passes never send the same record.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use herald_config::model::ProcessorConfig;
use herald_core::{
    AudienceMember, Campaign, CampaignCatalog, Clock, DispatchRecord, DispatchStore, HeraldError,
    Template,
};
use tracing::{debug, info, warn};

use crate::channels::ChannelSet;
use crate::lifecycle::{self, DispatchEvent};
use crate::metrics;
use crate::policy::{CascadePolicy, NextAction};
use crate::providers::ProviderRegistry;
use crate::render;
use crate::summary::{BatchSummary, RecordOutcome, RecordResult, SkipReason};

/// Tunables for a processing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorSettings {
    /// Default snapshot size.
    pub batch_size: usize,
    /// Upper bound on one provider send.
    pub send_timeout: Duration,
    /// Records handled in parallel.
    pub concurrency: usize,
    /// How long a skipped or errored record leaves the due queue.
    pub skip_backoff: Duration,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self::from_config(&ProcessorConfig::default())
    }
}

impl ProcessorSettings {
    pub fn from_config(config: &ProcessorConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            send_timeout: Duration::from_secs(config.send_timeout_secs),
            concurrency: config.concurrency,
            skip_backoff: Duration::from_secs(config.skip_backoff_secs),
        }
    }
}

/// Drives dispatch records through the channel cascade.
pub struct DispatchProcessor {
    pub(crate) store: Arc<dyn DispatchStore>,
    pub(crate) catalog: Arc<dyn CampaignCatalog>,
    channels: ChannelSet,
    providers: ProviderRegistry,
    policy: CascadePolicy,
    settings: ProcessorSettings,
    pub(crate) clock: Arc<dyn Clock>,
}

impl DispatchProcessor {
    pub fn new(
        store: Arc<dyn DispatchStore>,
        catalog: Arc<dyn CampaignCatalog>,
        channels: ChannelSet,
        providers: ProviderRegistry,
        policy: CascadePolicy,
        settings: ProcessorSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            catalog,
            channels,
            providers,
            policy,
            settings,
            clock,
        }
    }

    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// Run one pass over at most `batch_size` due records.
    ///
    /// Only a failure to read the snapshot is an error; everything after that
    /// is reported per record.
    pub async fn process_due(&self, batch_size: usize) -> Result<BatchSummary, HeraldError> {
        let snapshot = self.store.pending(self.clock.now(), batch_size).await?;
        let concurrency = self.settings.concurrency.max(1);

        let results: Vec<RecordResult> = stream::iter(snapshot)
            .map(|record| self.process_record(record))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let summary = BatchSummary::from_results(results);
        info!(
            processed = summary.processed,
            success = summary.success_count,
            failure = summary.failure_count,
            "dispatch pass complete"
        );
        Ok(summary)
    }

    async fn process_record(&self, record: DispatchRecord) -> RecordResult {
        let outcome = match self.evaluate(&record).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    campaign_id = %record.campaign_id,
                    member_id = %record.member_id,
                    error = %e,
                    "dispatch record processing failed"
                );
                self.reschedule(&record, self.settings.skip_backoff).await;
                RecordOutcome::Error {
                    message: e.to_string(),
                }
            }
        };
        RecordResult {
            campaign_id: record.campaign_id,
            member_id: record.member_id,
            channel: record.channel,
            outcome,
        }
    }

    async fn evaluate(&self, record: &DispatchRecord) -> Result<RecordOutcome, HeraldError> {
        let Some(campaign) = self.catalog.campaign(&record.campaign_id).await? else {
            return Ok(self.skip(record, SkipReason::CampaignMissing).await);
        };
        let Some(member) = self.catalog.member(&record.member_id).await? else {
            return Ok(self.skip(record, SkipReason::MemberMissing).await);
        };

        if member.opted_out {
            return self.transition(record, DispatchEvent::OptOut).await.map(|written| {
                if written {
                    info!(
                        campaign_id = %record.campaign_id,
                        member_id = %record.member_id,
                        "member opted out; record frozen"
                    );
                    RecordOutcome::OptedOut
                } else {
                    RecordOutcome::Conflict
                }
            });
        }

        let now = self.clock.now();
        let since = record.last_sent_at.unwrap_or(record.updated_at);
        let elapsed = (now - since).to_std().unwrap_or(Duration::ZERO);
        let action = self.policy.next_action(
            record.channel,
            record.status,
            record.attempts,
            elapsed,
            &campaign.channels,
        );

        match action {
            NextAction::SendNow | NextAction::RetryNow => {
                self.send(record, &campaign, &member).await
            }
            NextAction::RetryAfter(wait) | NextAction::AwaitEscalation(wait) => {
                debug!(
                    campaign_id = %record.campaign_id,
                    member_id = %record.member_id,
                    channel = %record.channel,
                    attempts = record.attempts,
                    wait_secs = wait.as_secs(),
                    "dispatch record not yet due"
                );
                self.reschedule(record, wait).await;
                Ok(RecordOutcome::NotDue {
                    wait_secs: Some(wait.as_secs()),
                })
            }
            NextAction::NoAction => Ok(RecordOutcome::NotDue { wait_secs: None }),
            NextAction::Escalate(to) => {
                let from = record.channel;
                if !self
                    .transition(record, DispatchEvent::Escalate { channel: to })
                    .await?
                {
                    return Ok(RecordOutcome::Conflict);
                }
                info!(
                    campaign_id = %record.campaign_id,
                    member_id = %record.member_id,
                    %from,
                    %to,
                    "escalated to next channel"
                );
                metrics::record_escalated(from, to);
                Ok(RecordOutcome::Escalated { from, to })
            }
            NextAction::Exhausted => {
                if !self.transition(record, DispatchEvent::Exhaust).await? {
                    return Ok(RecordOutcome::Conflict);
                }
                info!(
                    campaign_id = %record.campaign_id,
                    member_id = %record.member_id,
                    channel = %record.channel,
                    "cascade exhausted"
                );
                metrics::record_exhausted();
                Ok(RecordOutcome::Exhausted)
            }
        }
    }

    async fn send(
        &self,
        record: &DispatchRecord,
        campaign: &Campaign,
        member: &AudienceMember,
    ) -> Result<RecordOutcome, HeraldError> {
        let channel = record.channel;
        if !self.channels.supports(channel) {
            return Ok(self.skip(record, SkipReason::AdapterMissing).await);
        }
        let template = match self.resolve_template(campaign, record).await? {
            Ok(template) => template,
            Err(reason) => return Ok(self.skip(record, reason).await),
        };
        let provider = match self.providers.resolve(&campaign.owner_id, channel) {
            Ok(provider) => provider,
            Err(reason) => return Ok(self.skip(record, reason).await),
        };

        let timeout = self.settings.send_timeout;
        let started = self.clock.now();
        // The lease must outlast the send and the write of its result.
        let Some(claimed) = self.claim(record, after(started, timeout * 2)).await? else {
            return Ok(RecordOutcome::Conflict);
        };

        let request = render::outbound(&template, campaign, member);
        let sent = tokio::time::timeout(timeout, self.channels.dispatch(&provider, request)).await;
        let error = match sent {
            Ok(Ok(message_id)) => {
                let event = DispatchEvent::SendAccepted {
                    message_id: message_id.clone(),
                    sent_at: started,
                };
                return self
                    .record_send(&claimed, event, RecordOutcome::Sent { message_id })
                    .await;
            }
            Ok(Err(e)) => e.to_string(),
            Err(_elapsed) => HeraldError::Timeout { duration: timeout }.to_string(),
        };
        let event = DispatchEvent::SendFailed {
            error: error.clone(),
            sent_at: started,
        };
        self.record_send(&claimed, event, RecordOutcome::SendFailed { error })
            .await
    }

    /// Claim `record` for one send. `None` means another pass got there first.
    async fn claim(
        &self,
        record: &DispatchRecord,
        lease_until: DateTime<Utc>,
    ) -> Result<Option<DispatchRecord>, HeraldError> {
        let claimed = lifecycle::claim(record, lease_until)?;
        if self.store.compare_and_swap(record.revision, &claimed).await? {
            return Ok(Some(claimed));
        }
        warn!(
            campaign_id = %record.campaign_id,
            member_id = %record.member_id,
            revision = record.revision,
            "dispatch record already claimed; send abandoned"
        );
        Ok(None)
    }

    async fn record_send(
        &self,
        record: &DispatchRecord,
        event: DispatchEvent,
        outcome: RecordOutcome,
    ) -> Result<RecordOutcome, HeraldError> {
        let channel = record.channel;
        if !self.transition(record, event).await? {
            // The provider already has the message; only the bookkeeping is lost.
            warn!(
                campaign_id = %record.campaign_id,
                member_id = %record.member_id,
                %channel,
                "record changed during send; result not recorded"
            );
            return Ok(RecordOutcome::Conflict);
        }

        match &outcome {
            RecordOutcome::Sent { message_id } => {
                info!(
                    campaign_id = %record.campaign_id,
                    member_id = %record.member_id,
                    %channel,
                    attempts = record.attempts + 1,
                    %message_id,
                    "dispatch sent"
                );
                metrics::record_sent(channel);
            }
            RecordOutcome::SendFailed { error } => {
                warn!(
                    campaign_id = %record.campaign_id,
                    member_id = %record.member_id,
                    %channel,
                    attempts = record.attempts + 1,
                    %error,
                    "dispatch send failed"
                );
                metrics::record_failed(channel);
            }
            _ => {}
        }
        Ok(outcome)
    }

    /// First approved template of the campaign for the record's channel.
    async fn resolve_template(
        &self,
        campaign: &Campaign,
        record: &DispatchRecord,
    ) -> Result<Result<Template, SkipReason>, HeraldError> {
        let mut unapproved = false;
        for id in &campaign.template_ids {
            let Some(template) = self.catalog.template(id).await? else {
                continue;
            };
            if template.channel != record.channel {
                continue;
            }
            if template.approved {
                return Ok(Ok(template));
            }
            unapproved = true;
        }
        Ok(Err(if unapproved {
            SkipReason::TemplateNotApproved
        } else {
            SkipReason::TemplateMissing
        }))
    }

    /// Apply `event` and persist it against the record's revision.
    ///
    /// Returns `false` when the record changed since it was read.
    pub(crate) async fn transition(
        &self,
        record: &DispatchRecord,
        event: DispatchEvent,
    ) -> Result<bool, HeraldError> {
        let next = lifecycle::apply(record, event, self.clock.now())?;
        let written = self.store.compare_and_swap(record.revision, &next).await?;
        if !written {
            warn!(
                campaign_id = %record.campaign_id,
                member_id = %record.member_id,
                revision = record.revision,
                "dispatch record revision conflict"
            );
        }
        Ok(written)
    }

    async fn skip(&self, record: &DispatchRecord, reason: SkipReason) -> RecordOutcome {
        warn!(
            campaign_id = %record.campaign_id,
            member_id = %record.member_id,
            channel = %record.channel,
            %reason,
            "dispatch skipped; configuration incomplete"
        );
        metrics::record_skipped(reason);
        self.reschedule(record, self.settings.skip_backoff).await;
        RecordOutcome::Skipped { reason }
    }

    /// Keep `record` out of the due queue for `wait`. Failures only cost the
    /// record its place, so they are logged and dropped.
    async fn reschedule(&self, record: &DispatchRecord, wait: Duration) {
        let due_at = after(self.clock.now(), wait);
        match self
            .store
            .reschedule(&record.key(), record.revision, due_at)
            .await
        {
            Ok(true) => {}
            Ok(false) => debug!(
                campaign_id = %record.campaign_id,
                member_id = %record.member_id,
                "record changed before it could be rescheduled"
            ),
            Err(e) => warn!(
                campaign_id = %record.campaign_id,
                member_id = %record.member_id,
                error = %e,
                "dispatch record reschedule failed"
            ),
        }
    }
}

fn after(at: DateTime<Utc>, wait: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(wait)
        .ok()
        .and_then(|wait| at.checked_add_signed(wait))
        .unwrap_or(at)
}
