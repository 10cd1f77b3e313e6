// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring from configuration to a ready [`DispatchProcessor`].

use std::sync::Arc;

use herald_cascade::{CascadePolicy, ChannelSet, DispatchProcessor, ProcessorSettings, ProviderRegistry};
use herald_channels::{HttpClient, HttpRichMessageChannel, HttpTextChannel, HttpVoiceChannel};
use herald_config::HeraldConfig;
use herald_core::{HeraldError, PluginAdapter, SystemClock};
use herald_storage::SqliteStore;
use tracing::{info, warn};

pub async fn open_store(config: &HeraldConfig) -> Result<SqliteStore, HeraldError> {
    SqliteStore::open(&config.storage).await
}

/// The SQLite store plus a processor that reads and writes through it.
pub struct App {
    pub store: Arc<SqliteStore>,
    pub processor: Arc<DispatchProcessor>,
}

impl App {
    pub async fn build(config: &HeraldConfig) -> Result<Self, HeraldError> {
        let store = Arc::new(open_store(config).await?);

        let http = HttpClient::new()?;
        let channels = ChannelSet::new()
            .with_rich_message(Arc::new(HttpRichMessageChannel::new(http.clone())))
            .with_voice_call(Arc::new(HttpVoiceChannel::new(http.clone())))
            .with_text_message(Arc::new(HttpTextChannel::new(http)));

        let processor = DispatchProcessor::new(
            store.clone(),
            store.clone(),
            channels,
            ProviderRegistry::from_config(config),
            CascadePolicy::from_config(&config.cascade),
            ProcessorSettings::from_config(&config.processor),
            Arc::new(SystemClock),
        );
        info!(
            batch_size = config.processor.batch_size,
            concurrency = config.processor.concurrency,
            "dispatch processor ready"
        );

        Ok(Self {
            store,
            processor: Arc::new(processor),
        })
    }

    /// Shut adapters down and checkpoint the database.
    pub async fn shutdown(&self) {
        self.processor.channels().shutdown().await;
        if let Err(e) = self.store.shutdown().await {
            warn!(error = %e, "storage shutdown failed");
        }
    }
}
