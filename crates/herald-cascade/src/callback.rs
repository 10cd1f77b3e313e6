// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider status callbacks.
//!
//! A callback is matched to a record by channel and provider message id. It
//! can race with a processor pass on the same record, so the write is a
//! compare-and-swap retried from a fresh read.

use herald_core::{HeraldError, StatusCallback};
use tracing::{debug, info, warn};

use crate::lifecycle::{self, DispatchEvent};
use crate::metrics;
use crate::processor::DispatchProcessor;
use crate::summary::{CallbackOutcome, IgnoreReason};

const MAX_CAS_RETRIES: usize = 3;

impl DispatchProcessor {
    /// Apply a provider status callback to the record it refers to.
    ///
    /// Unknown, stale and illegal callbacks are logged and reported in the
    /// outcome; they are never errors.
    pub async fn apply_callback(
        &self,
        callback: &StatusCallback,
    ) -> Result<CallbackOutcome, HeraldError> {
        let outcome = self.apply_callback_inner(callback).await?;
        metrics::record_callback(outcome.label());
        Ok(outcome)
    }

    async fn apply_callback_inner(
        &self,
        callback: &StatusCallback,
    ) -> Result<CallbackOutcome, HeraldError> {
        for attempt in 0..=MAX_CAS_RETRIES {
            let Some(record) = self
                .store
                .find_by_message_id(callback.channel, &callback.message_id)
                .await?
            else {
                warn!(
                    channel = %callback.channel,
                    message_id = %callback.message_id,
                    status = %callback.status,
                    "callback for unknown message id discarded"
                );
                return Ok(CallbackOutcome::Unmatched);
            };

            if record.last_sent_at.is_some_and(|sent| callback.timestamp < sent) {
                warn!(
                    campaign_id = %record.campaign_id,
                    member_id = %record.member_id,
                    status = %callback.status,
                    "stale callback ignored"
                );
                return Ok(CallbackOutcome::Ignored {
                    reason: IgnoreReason::Stale,
                });
            }

            let next = match lifecycle::apply(
                &record,
                DispatchEvent::Provider(callback.status),
                self.clock.now(),
            ) {
                Ok(next) => next,
                Err(HeraldError::InvalidTransition { from, event }) => {
                    let reason = if record.is_terminal() {
                        IgnoreReason::Terminal
                    } else {
                        IgnoreReason::InvalidTransition
                    };
                    warn!(
                        campaign_id = %record.campaign_id,
                        member_id = %record.member_id,
                        %from,
                        %event,
                        %reason,
                        "callback ignored"
                    );
                    return Ok(CallbackOutcome::Ignored { reason });
                }
                Err(e) => return Err(e),
            };

            if self.store.compare_and_swap(record.revision, &next).await? {
                info!(
                    campaign_id = %record.campaign_id,
                    member_id = %record.member_id,
                    channel = %record.channel,
                    status = %next.status,
                    "callback applied"
                );
                return Ok(CallbackOutcome::Applied {
                    campaign_id: next.campaign_id,
                    member_id: next.member_id,
                    status: next.status,
                });
            }
            debug!(
                campaign_id = %record.campaign_id,
                member_id = %record.member_id,
                attempt,
                "callback lost revision race; re-reading"
            );
        }

        warn!(
            channel = %callback.channel,
            message_id = %callback.message_id,
            "callback abandoned after repeated revision conflicts"
        );
        Ok(CallbackOutcome::Conflict)
    }
}
