//! Daily rejection log — one row per `(member, work date)` rejection.
//!
//! The row is upserted with latest-wins semantics: a later rejection of
//! the same day replaces the earlier row, so repeated delivery of the
//! same rejection is idempotent.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateId;
use domain::{AbsenceEvent, MemberId, WorkEntryEvent};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// One day's rejection record for a member.
#[derive(Debug, Clone)]
pub struct DailyRejection {
    pub member_id: MemberId,
    pub work_date: NaiveDate,
    pub rejected_by: MemberId,
    pub reason: String,
    pub rejected_at: DateTime<Utc>,
    /// Work-entry ids affected by this rejection.
    pub entry_ids: Vec<AggregateId>,
    /// Absence ids affected by this rejection.
    pub absence_ids: Vec<AggregateId>,
}

type DayKey = (MemberId, NaiveDate);

/// Read model view of daily rejections.
#[derive(Clone)]
pub struct DailyRejectionLogView {
    rows: Arc<RwLock<HashMap<DayKey, DailyRejection>>>,
    /// Maps entry/absence ids to their day, since rejection events do not
    /// carry member or date.
    locations: Arc<RwLock<HashMap<AggregateId, DayKey>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl DailyRejectionLogView {
    /// Creates a new empty rejection log view.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            locations: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Returns the rejection row for a member's day, if any.
    pub async fn rejection_for(
        &self,
        member_id: MemberId,
        work_date: NaiveDate,
    ) -> Option<DailyRejection> {
        self.rows.read().await.get(&(member_id, work_date)).cloned()
    }

    /// Returns every rejection row for a member.
    pub async fn rejections_for_member(&self, member_id: MemberId) -> Vec<DailyRejection> {
        let rows = self.rows.read().await;
        let mut found: Vec<_> = rows
            .iter()
            .filter(|((member, _), _)| *member == member_id)
            .map(|(_, row)| row.clone())
            .collect();
        found.sort_by_key(|r| r.work_date);
        found
    }

    /// Number of rejection rows across all members.
    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Upserts one rejected id into the day's row.
    ///
    /// The same rejection act (same rejector and reason) accumulates the
    /// ids it touched; a different rejection of the same day replaces the
    /// row, so the latest reason always wins.
    async fn upsert(
        &self,
        key: DayKey,
        rejected_by: MemberId,
        reason: &str,
        rejected_at: DateTime<Utc>,
        entry_id: Option<AggregateId>,
        absence_id: Option<AggregateId>,
    ) {
        let mut rows = self.rows.write().await;
        let row = rows
            .entry(key)
            .and_modify(|row| {
                if row.rejected_by != rejected_by || row.reason != reason {
                    // A different rejection act overwrites the earlier one.
                    row.rejected_by = rejected_by;
                    row.reason = reason.to_string();
                    row.rejected_at = rejected_at;
                    row.entry_ids.clear();
                    row.absence_ids.clear();
                }
            })
            .or_insert_with(|| DailyRejection {
                member_id: key.0,
                work_date: key.1,
                rejected_by,
                reason: reason.to_string(),
                rejected_at,
                entry_ids: Vec::new(),
                absence_ids: Vec::new(),
            });

        if let Some(id) = entry_id
            && !row.entry_ids.contains(&id)
        {
            row.entry_ids.push(id);
        }
        if let Some(id) = absence_id
            && !row.absence_ids.contains(&id)
        {
            row.absence_ids.push(id);
        }
    }
}

impl Default for DailyRejectionLogView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for DailyRejectionLogView {
    fn name(&self) -> &'static str {
        "DailyRejectionLogView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        match event.aggregate_type.as_str() {
            "WorkEntry" => {
                let entry_event: WorkEntryEvent = serde_json::from_value(event.payload.clone())?;
                match entry_event {
                    WorkEntryEvent::EntryRecorded(data) => {
                        self.locations
                            .write()
                            .await
                            .insert(data.entry_id, (data.member_id, data.work_date));
                    }
                    WorkEntryEvent::EntryRejected(data) => {
                        let location = self.locations.read().await.get(&event.aggregate_id).copied();
                        if let Some(key) = location {
                            self.upsert(
                                key,
                                data.rejected_by,
                                &data.reason,
                                data.rejected_at,
                                Some(event.aggregate_id),
                                None,
                            )
                            .await;
                        }
                    }
                    _ => {}
                }
            }
            "Absence" => {
                let absence_event: AbsenceEvent = serde_json::from_value(event.payload.clone())?;
                match absence_event {
                    AbsenceEvent::AbsenceRecorded(data) => {
                        self.locations
                            .write()
                            .await
                            .insert(data.absence_id, (data.member_id, data.absence_date));
                    }
                    AbsenceEvent::AbsenceRejected(data) => {
                        let location = self.locations.read().await.get(&event.aggregate_id).copied();
                        if let Some(key) = location {
                            self.upsert(
                                key,
                                data.rejected_by,
                                &data.reason,
                                data.rejected_at,
                                None,
                                Some(event.aggregate_id),
                            )
                            .await;
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.rows.write().await.clear();
        self.locations.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for DailyRejectionLogView {
    fn name(&self) -> &'static str {
        "DailyRejectionLogView"
    }

    fn count(&self) -> usize {
        self.rows.try_read().map(|r| r.len()).unwrap_or(0)
    }
}
