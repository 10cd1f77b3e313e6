// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Channel senders extend the [`PluginAdapter`] base trait. All traits use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod storage;

pub use adapter::PluginAdapter;
pub use channel::{RichMessageSender, TextMessageSender, VoiceCaller};
pub use storage::{CampaignCatalog, DispatchStore};
