// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `herald import`: load catalog documents from JSON files.
//!
//! Each file holds a JSON array. Documents are upserted by id, so re-importing
//! a corrected file replaces the earlier version.

use std::path::Path;

use herald_core::{AudienceMember, Campaign, HeraldError, Template};
use herald_storage::SqliteStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub campaigns: usize,
    pub members: usize,
    pub templates: usize,
}

async fn read_documents<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, HeraldError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| HeraldError::Config(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| HeraldError::Config(format!("invalid JSON in {}: {e}", path.display())))
}

pub async fn run_import(
    store: &SqliteStore,
    campaigns: Option<&Path>,
    members: Option<&Path>,
    templates: Option<&Path>,
) -> Result<ImportSummary, HeraldError> {
    let mut summary = ImportSummary::default();

    if let Some(path) = templates {
        for template in read_documents::<Template>(path).await? {
            if !template.approved {
                warn!(template_id = %template.id, "imported template is not approved");
            }
            store.put_template(&template).await?;
            summary.templates += 1;
        }
    }

    if let Some(path) = members {
        for member in read_documents::<AudienceMember>(path).await? {
            store.put_member(&member).await?;
            summary.members += 1;
        }
    }

    if let Some(path) = campaigns {
        for campaign in read_documents::<Campaign>(path).await? {
            // Stored anyway; launch refuses it until corrected.
            if let Err(e) = campaign.validate() {
                warn!(campaign_id = %campaign.id, error = %e, "imported campaign is invalid");
            }
            store.put_campaign(&campaign).await?;
            summary.campaigns += 1;
        }
    }

    info!(
        campaigns = summary.campaigns,
        members = summary.members,
        templates = summary.templates,
        "catalog import complete"
    );
    Ok(summary)
}
