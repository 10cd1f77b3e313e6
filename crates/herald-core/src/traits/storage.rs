// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence collaborator traits.
//!
//! The dispatch store is the system of record for dispatch records and the
//! place where per-record serialization is enforced: every state change after
//! creation goes through [`DispatchStore::compare_and_swap`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::HeraldError;
use crate::types::{
    AudienceMember, Campaign, CampaignId, Channel, DispatchKey, DispatchRecord, MemberId,
    MessageId, Template, TemplateId,
};

/// Storage for dispatch records.
#[async_trait]
pub trait DispatchStore: Send + Sync {
    /// Fetch one record by its (campaign, member) key.
    async fn get(&self, key: &DispatchKey) -> Result<Option<DispatchRecord>, HeraldError>;

    /// Unconditionally write a record.
    async fn upsert(&self, record: &DispatchRecord) -> Result<(), HeraldError>;

    /// Insert a record unless one already exists for its key.
    ///
    /// Returns `true` if the record was inserted.
    async fn insert_if_absent(&self, record: &DispatchRecord) -> Result<bool, HeraldError>;

    /// Write `next` only if the stored record's revision equals `expected_revision`.
    ///
    /// Returns `false` (and writes nothing) when the record changed underneath
    /// the caller or no longer exists.
    async fn compare_and_swap(
        &self,
        expected_revision: u64,
        next: &DispatchRecord,
    ) -> Result<bool, HeraldError>;

    /// Set `next_due_at` on the record if its revision equals
    /// `expected_revision`. Nothing else changes and `revision` is not bumped.
    ///
    /// Returns `false` when the record changed underneath the caller.
    async fn reschedule(
        &self,
        key: &DispatchKey,
        expected_revision: u64,
        due_at: DateTime<Utc>,
    ) -> Result<bool, HeraldError>;

    /// Non-terminal records in a sendable status (`queued`, `failed`,
    /// `no_answer`) whose `next_due_at` is unset or not after `now`, ordered
    /// by [`DispatchRecord::due_order`].
    async fn pending(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DispatchRecord>, HeraldError>;

    /// The record whose current provider message id matches.
    async fn find_by_message_id(
        &self,
        channel: Channel,
        message_id: &MessageId,
    ) -> Result<Option<DispatchRecord>, HeraldError>;
}

/// Read access to the campaigns, audience and templates owned by the
/// surrounding application.
#[async_trait]
pub trait CampaignCatalog: Send + Sync {
    async fn campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, HeraldError>;

    async fn member(&self, id: &MemberId) -> Result<Option<AudienceMember>, HeraldError>;

    async fn template(&self, id: &TemplateId) -> Result<Option<Template>, HeraldError>;

    /// The full audience collection, in a stable order.
    async fn members(&self) -> Result<Vec<AudienceMember>, HeraldError>;
}
