// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch record operations.
//!
//! Every state change after creation goes through [`compare_and_swap`], which
//! writes only when the stored revision still matches.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use herald_core::{Channel, DeliveryStatus, DispatchKey, DispatchRecord, HeraldError, MessageId};
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{format_ts, parse_ts, Database};

const COLUMNS: &str = "campaign_id, member_id, channel, status, attempts, provider_message_id,
     last_sent_at, last_error, cascade_exhausted, revision, created_at, updated_at, next_due_at";

fn parse_enum<T>(idx: usize, raw: &str) -> Result<T, rusqlite::Error>
where
    T: FromStr<Err = strum::ParseError>,
{
    T::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn from_row(row: &Row<'_>) -> Result<DispatchRecord, rusqlite::Error> {
    let channel: String = row.get(2)?;
    let status: String = row.get(3)?;
    let last_sent_at: Option<String> = row.get(6)?;
    let created_at: String = row.get(10)?;
    let updated_at: String = row.get(11)?;
    let next_due_at: Option<String> = row.get(12)?;
    Ok(DispatchRecord {
        campaign_id: herald_core::CampaignId(row.get(0)?),
        member_id: herald_core::MemberId(row.get(1)?),
        channel: parse_enum::<Channel>(2, &channel)?,
        status: parse_enum::<DeliveryStatus>(3, &status)?,
        attempts: row.get(4)?,
        provider_message_id: row.get::<_, Option<String>>(5)?.map(MessageId),
        last_sent_at: last_sent_at.map(|ts| parse_ts(6, &ts)).transpose()?,
        last_error: row.get(7)?,
        cascade_exhausted: row.get(8)?,
        revision: row.get::<_, i64>(9)? as u64,
        created_at: parse_ts(10, &created_at)?,
        updated_at: parse_ts(11, &updated_at)?,
        next_due_at: next_due_at.map(|ts| parse_ts(12, &ts)).transpose()?,
    })
}

/// Column values in `COLUMNS` order.
struct Values {
    campaign_id: String,
    member_id: String,
    channel: String,
    status: String,
    attempts: u32,
    provider_message_id: Option<String>,
    last_sent_at: Option<String>,
    last_error: Option<String>,
    cascade_exhausted: bool,
    revision: i64,
    created_at: String,
    updated_at: String,
    next_due_at: Option<String>,
}

impl From<&DispatchRecord> for Values {
    fn from(r: &DispatchRecord) -> Self {
        Self {
            campaign_id: r.campaign_id.0.clone(),
            member_id: r.member_id.0.clone(),
            channel: r.channel.to_string(),
            status: r.status.to_string(),
            attempts: r.attempts,
            provider_message_id: r.provider_message_id.as_ref().map(|id| id.0.clone()),
            last_sent_at: r.last_sent_at.as_ref().map(format_ts),
            last_error: r.last_error.clone(),
            cascade_exhausted: r.cascade_exhausted,
            revision: r.revision as i64,
            created_at: format_ts(&r.created_at),
            updated_at: format_ts(&r.updated_at),
            next_due_at: r.next_due_at.as_ref().map(format_ts),
        }
    }
}

/// Fetch one record by key.
pub async fn get(db: &Database, key: &DispatchKey) -> Result<Option<DispatchRecord>, HeraldError> {
    let campaign_id = key.campaign_id.0.clone();
    let member_id = key.member_id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM dispatch_records WHERE campaign_id = ?1 AND member_id = ?2"
                ),
                params![campaign_id, member_id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert or overwrite a record.
pub async fn upsert(db: &Database, record: &DispatchRecord) -> Result<(), HeraldError> {
    let v = Values::from(record);
    db.connection()
        .call(move |conn| {
            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO dispatch_records ({COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                params![
                    v.campaign_id,
                    v.member_id,
                    v.channel,
                    v.status,
                    v.attempts,
                    v.provider_message_id,
                    v.last_sent_at,
                    v.last_error,
                    v.cascade_exhausted,
                    v.revision,
                    v.created_at,
                    v.updated_at,
                    v.next_due_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a record unless one exists for its key. Returns whether it was inserted.
pub async fn insert_if_absent(db: &Database, record: &DispatchRecord) -> Result<bool, HeraldError> {
    let v = Values::from(record);
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO dispatch_records ({COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                params![
                    v.campaign_id,
                    v.member_id,
                    v.channel,
                    v.status,
                    v.attempts,
                    v.provider_message_id,
                    v.last_sent_at,
                    v.last_error,
                    v.cascade_exhausted,
                    v.revision,
                    v.created_at,
                    v.updated_at,
                    v.next_due_at,
                ],
            )?;
            Ok(inserted == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Write `next` if the stored revision equals `expected_revision`.
pub async fn compare_and_swap(
    db: &Database,
    expected_revision: u64,
    next: &DispatchRecord,
) -> Result<bool, HeraldError> {
    let v = Values::from(next);
    let expected = expected_revision as i64;
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE dispatch_records SET
                    channel = ?3, status = ?4, attempts = ?5, provider_message_id = ?6,
                    last_sent_at = ?7, last_error = ?8, cascade_exhausted = ?9,
                    revision = ?10, updated_at = ?11, next_due_at = ?12
                 WHERE campaign_id = ?1 AND member_id = ?2 AND revision = ?13",
                params![
                    v.campaign_id,
                    v.member_id,
                    v.channel,
                    v.status,
                    v.attempts,
                    v.provider_message_id,
                    v.last_sent_at,
                    v.last_error,
                    v.cascade_exhausted,
                    v.revision,
                    v.updated_at,
                    v.next_due_at,
                    expected,
                ],
            )?;
            Ok(updated == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set `next_due_at` if the stored revision equals `expected_revision`.
pub async fn reschedule(
    db: &Database,
    key: &DispatchKey,
    expected_revision: u64,
    due_at: DateTime<Utc>,
) -> Result<bool, HeraldError> {
    let campaign_id = key.campaign_id.0.clone();
    let member_id = key.member_id.0.clone();
    let expected = expected_revision as i64;
    let due_at = format_ts(&due_at);
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE dispatch_records SET next_due_at = ?3
                 WHERE campaign_id = ?1 AND member_id = ?2 AND revision = ?4",
                params![campaign_id, member_id, due_at, expected],
            )?;
            Ok(updated == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Sendable, non-exhausted records due at `now`, earliest first.
///
/// A record sorts by its `next_due_at`, or by `updated_at` when nothing is
/// scheduled, so rescheduled records queue behind ones that were waiting.
pub async fn pending(
    db: &Database,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<DispatchRecord>, HeraldError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let now = format_ts(&now);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM dispatch_records
                 WHERE status IN ('queued', 'failed', 'no_answer') AND cascade_exhausted = 0
                   AND (next_due_at IS NULL OR next_due_at <= ?1)
                 ORDER BY COALESCE(next_due_at, updated_at) ASC, campaign_id ASC, member_id ASC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![now, limit], from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The record whose current provider message id on `channel` matches.
pub async fn find_by_message_id(
    db: &Database,
    channel: Channel,
    message_id: &MessageId,
) -> Result<Option<DispatchRecord>, HeraldError> {
    let channel = channel.to_string();
    let message_id = message_id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM dispatch_records
                     WHERE channel = ?1 AND provider_message_id = ?2
                     LIMIT 1"
                ),
                params![channel, message_id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
