// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign catalog documents.
//!
//! Campaigns, audience members and templates are owned by the surrounding
//! application and stored here as JSON documents keyed by id. Members keep
//! their first-insert order so segmentation sees a stable audience.

use herald_core::{
    AudienceMember, Campaign, CampaignId, HeraldError, MemberId, Template, TemplateId,
};
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;

use crate::database::Database;

fn decode<T: DeserializeOwned>(raw: Option<String>) -> Result<Option<T>, HeraldError> {
    raw.map(|doc| serde_json::from_str(&doc))
        .transpose()
        .map_err(HeraldError::from)
}

async fn put_document(
    db: &Database,
    sql: &'static str,
    id: String,
    document: String,
) -> Result<(), HeraldError> {
    db.connection()
        .call(move |conn| {
            conn.execute(sql, params![id, document])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

async fn get_document(
    db: &Database,
    sql: &'static str,
    id: String,
) -> Result<Option<String>, HeraldError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(sql, params![id], |row| row.get(0))
                .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert or replace a campaign.
pub async fn put_campaign(db: &Database, campaign: &Campaign) -> Result<(), HeraldError> {
    put_document(
        db,
        "INSERT INTO campaigns (id, document) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET document = excluded.document,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        campaign.id.0.clone(),
        serde_json::to_string(campaign)?,
    )
    .await
}

/// Insert or replace a member. A replaced member keeps its audience position.
pub async fn put_member(db: &Database, member: &AudienceMember) -> Result<(), HeraldError> {
    put_document(
        db,
        "INSERT INTO audience_members (id, document) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET document = excluded.document,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        member.id.0.clone(),
        serde_json::to_string(member)?,
    )
    .await
}

/// Insert or replace a template.
pub async fn put_template(db: &Database, template: &Template) -> Result<(), HeraldError> {
    let id = template.id.0.clone();
    let channel = template.channel.to_string();
    let document = serde_json::to_string(template)?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO templates (id, channel, document) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET channel = excluded.channel,
                    document = excluded.document,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![id, channel, document],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_campaign(db: &Database, id: &CampaignId) -> Result<Option<Campaign>, HeraldError> {
    let raw = get_document(db, "SELECT document FROM campaigns WHERE id = ?1", id.0.clone()).await?;
    decode(raw)
}

pub async fn get_member(db: &Database, id: &MemberId) -> Result<Option<AudienceMember>, HeraldError> {
    let raw = get_document(
        db,
        "SELECT document FROM audience_members WHERE id = ?1",
        id.0.clone(),
    )
    .await?;
    decode(raw)
}

pub async fn get_template(db: &Database, id: &TemplateId) -> Result<Option<Template>, HeraldError> {
    let raw = get_document(db, "SELECT document FROM templates WHERE id = ?1", id.0.clone()).await?;
    decode(raw)
}

/// Every audience member in insertion order.
pub async fn list_members(db: &Database) -> Result<Vec<AudienceMember>, HeraldError> {
    let docs: Vec<String> = db
        .connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT document FROM audience_members ORDER BY rowid ASC")?;
            let rows = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    docs.iter()
        .map(|doc| serde_json::from_str(doc).map_err(HeraldError::from))
        .collect()
}
