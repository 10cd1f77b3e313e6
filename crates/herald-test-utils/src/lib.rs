// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Herald integration tests.
//!
//! Provides in-memory collaborators for fast, deterministic tests without a
//! database or network.
//!
//! # Components
//!
//! - [`MemoryStore`] - In-memory dispatch store and campaign catalog
//! - [`MockChannel`] - Scripted channel adapter with send capture
//! - [`ManualClock`] - Clock advanced explicitly by the test
//! - [`fixtures`] - Campaign, member, template and provider builders

pub mod clock;
pub mod fixtures;
pub mod memory_store;
pub mod mock_channel;

pub use clock::ManualClock;
pub use memory_store::MemoryStore;
pub use mock_channel::{MockChannel, Script, SentDispatch};
