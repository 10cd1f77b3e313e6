// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign launch: materialize one dispatch record per targeted member.

use herald_core::{CampaignId, DispatchRecord, HeraldError};
use tracing::info;

use crate::processor::DispatchProcessor;
use crate::segment;
use crate::summary::LaunchSummary;

impl DispatchProcessor {
    /// Create `queued` records on the campaign's first channel for every
    /// member of its segment.
    ///
    /// Opted-out members are never given a record, whatever the filter says.
    /// Launching again only creates records for members that have none.
    pub async fn launch(&self, campaign_id: &CampaignId) -> Result<LaunchSummary, HeraldError> {
        let campaign = self
            .catalog
            .campaign(campaign_id)
            .await?
            .ok_or_else(|| HeraldError::NotFound {
                kind: "campaign",
                id: campaign_id.to_string(),
            })?;
        campaign.validate()?;
        let first = campaign.first_channel().ok_or_else(|| {
            HeraldError::Config(format!("campaign {campaign_id} has no channels"))
        })?;

        let members = self.catalog.members().await?;
        let selected = segment::segment(&members, &campaign.filter);
        let now = self.clock.now();

        let mut summary = LaunchSummary {
            matched: selected.len(),
            ..LaunchSummary::default()
        };
        for member in selected {
            if member.opted_out {
                summary.excluded_opted_out += 1;
                continue;
            }
            let record = DispatchRecord::new(campaign.id.clone(), member.id.clone(), first, now);
            if self.store.insert_if_absent(&record).await? {
                summary.created += 1;
            } else {
                summary.already_present += 1;
            }
        }

        info!(
            campaign_id = %campaign.id,
            channel = %first,
            matched = summary.matched,
            created = summary.created,
            already_present = summary.already_present,
            excluded_opted_out = summary.excluded_opted_out,
            "campaign launched"
        );
        Ok(summary)
    }
}
