// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Herald outreach cascade.
//!
//! Drives each (campaign, audience member) pair through bounded delivery
//! attempts across an ordered list of channels:
//!
//! - [`segment`] selects the audience of a campaign;
//! - [`policy`] decides between retrying, escalating and giving up;
//! - [`lifecycle`] is the dispatch record state machine;
//! - [`DispatchProcessor`] launches campaigns, runs processing passes and
//!   applies provider callbacks.

pub mod callback;
pub mod channels;
pub mod launch;
pub mod lifecycle;
pub mod metrics;
pub mod policy;
pub mod processor;
pub mod providers;
pub mod render;
pub mod segment;
pub mod summary;

pub use channels::ChannelSet;
pub use lifecycle::DispatchEvent;
pub use policy::{CascadePolicy, ChannelPolicy, NextAction};
pub use processor::{DispatchProcessor, ProcessorSettings};
pub use providers::ProviderRegistry;
pub use summary::{
    BatchSummary, CallbackOutcome, IgnoreReason, LaunchSummary, RecordOutcome, RecordResult,
    SkipReason,
};
