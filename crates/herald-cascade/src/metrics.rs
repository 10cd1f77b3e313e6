// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is a
//! no-op.

use herald_core::Channel;
use metrics::describe_counter;

use crate::summary::SkipReason;

/// Register all Herald metric descriptions.
pub fn register_metrics() {
    describe_counter!("herald_dispatch_sent_total", "Sends accepted by a provider");
    describe_counter!("herald_dispatch_failed_total", "Sends that failed or timed out");
    describe_counter!(
        "herald_dispatch_escalated_total",
        "Records moved to the next cascade channel"
    );
    describe_counter!(
        "herald_dispatch_exhausted_total",
        "Records that ran out of channels"
    );
    describe_counter!(
        "herald_dispatch_skipped_total",
        "Records skipped for a configuration gap"
    );
    describe_counter!("herald_callbacks_total", "Provider status callbacks by outcome");
}

pub fn record_sent(channel: Channel) {
    metrics::counter!("herald_dispatch_sent_total", "channel" => channel.to_string()).increment(1);
}

pub fn record_failed(channel: Channel) {
    metrics::counter!("herald_dispatch_failed_total", "channel" => channel.to_string())
        .increment(1);
}

pub fn record_escalated(from: Channel, to: Channel) {
    metrics::counter!(
        "herald_dispatch_escalated_total",
        "from" => from.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

pub fn record_exhausted() {
    metrics::counter!("herald_dispatch_exhausted_total").increment(1);
}

pub fn record_skipped(reason: SkipReason) {
    metrics::counter!("herald_dispatch_skipped_total", "reason" => reason.to_string())
        .increment(1);
}

pub fn record_callback(outcome: &'static str) {
    metrics::counter!("herald_callbacks_total", "outcome" => outcome).increment(1);
}
