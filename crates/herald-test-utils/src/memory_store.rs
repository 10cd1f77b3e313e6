// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory dispatch store and campaign catalog.
//!
//! Mirrors the SQLite store's semantics (revision-checked swaps, `pending`
//! ordering) and adds fault injection for conflict and error paths.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use herald_core::{
    AudienceMember, Campaign, CampaignCatalog, CampaignId, Channel, DispatchKey, DispatchRecord,
    DispatchStore, HeraldError, MemberId, MessageId, Template, TemplateId,
};

#[derive(Default)]
struct State {
    records: HashMap<DispatchKey, DispatchRecord>,
    campaigns: HashMap<CampaignId, Campaign>,
    members: Vec<AudienceMember>,
    templates: HashMap<TemplateId, Template>,
    /// Swaps that will report a conflict without writing.
    forced_conflicts: usize,
    /// Members whose lookup fails with a storage error.
    broken_members: HashSet<MemberId>,
}

/// Shared in-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_campaign(&self, campaign: Campaign) {
        self.state
            .lock()
            .await
            .campaigns
            .insert(campaign.id.clone(), campaign);
    }

    /// Add or replace a member, keeping insertion order.
    pub async fn put_member(&self, member: AudienceMember) {
        let mut state = self.state.lock().await;
        match state.members.iter_mut().find(|m| m.id == member.id) {
            Some(existing) => *existing = member,
            None => state.members.push(member),
        }
    }

    pub async fn put_template(&self, template: Template) {
        self.state
            .lock()
            .await
            .templates
            .insert(template.id.clone(), template);
    }

    pub async fn remove_template(&self, id: &TemplateId) {
        self.state.lock().await.templates.remove(id);
    }

    /// Flip a member's opt-out flag.
    pub async fn set_opted_out(&self, id: &MemberId, opted_out: bool) {
        let mut state = self.state.lock().await;
        if let Some(m) = state.members.iter_mut().find(|m| &m.id == id) {
            m.opted_out = opted_out;
        }
    }

    /// Make the next `n` compare-and-swap calls report a conflict.
    pub async fn force_conflicts(&self, n: usize) {
        self.state.lock().await.forced_conflicts = n;
    }

    /// Make lookups of `id` fail with a storage error.
    pub async fn break_member(&self, id: &MemberId) {
        self.state.lock().await.broken_members.insert(id.clone());
    }

    pub async fn record(&self, campaign_id: &str, member_id: &str) -> Option<DispatchRecord> {
        let key = DispatchKey {
            campaign_id: campaign_id.into(),
            member_id: member_id.into(),
        };
        self.state.lock().await.records.get(&key).cloned()
    }

    pub async fn records(&self) -> Vec<DispatchRecord> {
        let mut all: Vec<_> = self.state.lock().await.records.values().cloned().collect();
        all.sort_by(|a, b| a.key().cmp(&b.key()));
        all
    }
}

#[async_trait]
impl DispatchStore for MemoryStore {
    async fn get(&self, key: &DispatchKey) -> Result<Option<DispatchRecord>, HeraldError> {
        Ok(self.state.lock().await.records.get(key).cloned())
    }

    async fn upsert(&self, record: &DispatchRecord) -> Result<(), HeraldError> {
        self.state
            .lock()
            .await
            .records
            .insert(record.key(), record.clone());
        Ok(())
    }

    async fn insert_if_absent(&self, record: &DispatchRecord) -> Result<bool, HeraldError> {
        let mut state = self.state.lock().await;
        let key = record.key();
        if state.records.contains_key(&key) {
            return Ok(false);
        }
        state.records.insert(key, record.clone());
        Ok(true)
    }

    async fn compare_and_swap(
        &self,
        expected_revision: u64,
        next: &DispatchRecord,
    ) -> Result<bool, HeraldError> {
        let mut state = self.state.lock().await;
        if state.forced_conflicts > 0 {
            state.forced_conflicts -= 1;
            return Ok(false);
        }
        match state.records.get_mut(&next.key()) {
            Some(current) if current.revision == expected_revision => {
                *current = next.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reschedule(
        &self,
        key: &DispatchKey,
        expected_revision: u64,
        due_at: DateTime<Utc>,
    ) -> Result<bool, HeraldError> {
        let mut state = self.state.lock().await;
        match state.records.get_mut(key) {
            Some(current) if current.revision == expected_revision => {
                current.next_due_at = Some(due_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn pending(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DispatchRecord>, HeraldError> {
        let state = self.state.lock().await;
        let mut due: Vec<_> = state
            .records
            .values()
            .filter(|r| r.status.is_sendable() && !r.cascade_exhausted)
            .filter(|r| r.next_due_at.is_none_or(|at| at <= now))
            .cloned()
            .collect();
        due.sort_by(|a, b| {
            a.due_order()
                .cmp(&b.due_order())
                .then_with(|| a.key().cmp(&b.key()))
        });
        due.truncate(limit);
        Ok(due)
    }

    async fn find_by_message_id(
        &self,
        channel: Channel,
        message_id: &MessageId,
    ) -> Result<Option<DispatchRecord>, HeraldError> {
        Ok(self
            .state
            .lock()
            .await
            .records
            .values()
            .find(|r| r.channel == channel && r.provider_message_id.as_ref() == Some(message_id))
            .cloned())
    }
}

#[async_trait]
impl CampaignCatalog for MemoryStore {
    async fn campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, HeraldError> {
        Ok(self.state.lock().await.campaigns.get(id).cloned())
    }

    async fn member(&self, id: &MemberId) -> Result<Option<AudienceMember>, HeraldError> {
        let state = self.state.lock().await;
        if state.broken_members.contains(id) {
            return Err(HeraldError::Storage {
                source: format!("member {id} unreadable").into(),
            });
        }
        Ok(state.members.iter().find(|m| &m.id == id).cloned())
    }

    async fn template(&self, id: &TemplateId) -> Result<Option<Template>, HeraldError> {
        Ok(self.state.lock().await.templates.get(id).cloned())
    }

    async fn members(&self) -> Result<Vec<AudienceMember>, HeraldError> {
        Ok(self.state.lock().await.members.clone())
    }
}
