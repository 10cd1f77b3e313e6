// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the dispatch store and campaign catalog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use herald_config::model::StorageConfig;
use herald_core::{
    AdapterType, AudienceMember, Campaign, CampaignCatalog, CampaignId, Channel, DispatchKey,
    DispatchRecord, DispatchStore, HealthStatus, HeraldError, MemberId, MessageId, PluginAdapter,
    Template, TemplateId,
};

use crate::database::Database;
use crate::queries::{catalog, dispatch};

/// SQLite-backed store.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open the database described by `config`.
    pub async fn open(config: &StorageConfig) -> Result<Self, HeraldError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite store initialized");
        Ok(Self { db })
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    pub async fn put_campaign(&self, campaign: &Campaign) -> Result<(), HeraldError> {
        catalog::put_campaign(&self.db, campaign).await
    }

    pub async fn put_member(&self, member: &AudienceMember) -> Result<(), HeraldError> {
        catalog::put_member(&self.db, member).await
    }

    pub async fn put_template(&self, template: &Template) -> Result<(), HeraldError> {
        catalog::put_template(&self.db, template).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HeraldError> {
        self.db.checkpoint().await
    }
}

#[async_trait]
impl DispatchStore for SqliteStore {
    async fn get(&self, key: &DispatchKey) -> Result<Option<DispatchRecord>, HeraldError> {
        dispatch::get(&self.db, key).await
    }

    async fn upsert(&self, record: &DispatchRecord) -> Result<(), HeraldError> {
        dispatch::upsert(&self.db, record).await
    }

    async fn insert_if_absent(&self, record: &DispatchRecord) -> Result<bool, HeraldError> {
        dispatch::insert_if_absent(&self.db, record).await
    }

    async fn compare_and_swap(
        &self,
        expected_revision: u64,
        next: &DispatchRecord,
    ) -> Result<bool, HeraldError> {
        dispatch::compare_and_swap(&self.db, expected_revision, next).await
    }

    async fn reschedule(
        &self,
        key: &DispatchKey,
        expected_revision: u64,
        due_at: DateTime<Utc>,
    ) -> Result<bool, HeraldError> {
        dispatch::reschedule(&self.db, key, expected_revision, due_at).await
    }

    async fn pending(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DispatchRecord>, HeraldError> {
        dispatch::pending(&self.db, now, limit).await
    }

    async fn find_by_message_id(
        &self,
        channel: Channel,
        message_id: &MessageId,
    ) -> Result<Option<DispatchRecord>, HeraldError> {
        dispatch::find_by_message_id(&self.db, channel, message_id).await
    }
}

#[async_trait]
impl CampaignCatalog for SqliteStore {
    async fn campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, HeraldError> {
        catalog::get_campaign(&self.db, id).await
    }

    async fn member(&self, id: &MemberId) -> Result<Option<AudienceMember>, HeraldError> {
        catalog::get_member(&self.db, id).await
    }

    async fn template(&self, id: &TemplateId) -> Result<Option<Template>, HeraldError> {
        catalog::get_template(&self.db, id).await
    }

    async fn members(&self) -> Result<Vec<AudienceMember>, HeraldError> {
        catalog::list_members(&self.db).await
    }
}
