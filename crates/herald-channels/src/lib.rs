// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/JSON channel adapters.
//!
//! Each adapter POSTs one JSON document per send to the provider's base URL
//! and reads the provider message id from the `id` field of the response.
//! Credentials and sender identity arrive with every send, so one adapter
//! instance serves every campaign owner.

pub mod client;
pub mod rich;
pub mod text;
pub mod types;
pub mod voice;

pub use client::HttpClient;
pub use rich::HttpRichMessageChannel;
pub use text::HttpTextChannel;
pub use voice::HttpVoiceChannel;
