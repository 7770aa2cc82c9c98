//! Member calendar read model — per member/day entry and absence summaries.
//!
//! Backs the workflow orchestrator's window lookups (which draft entries
//! exist for a member on a day or in a fiscal month) and the daily
//! 24-hour total used by the cross-aggregate limit check.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::AggregateId;
use domain::{
    AbsenceEvent, AbsenceStatus, AbsenceType, EntryStatus, Hours, MemberId, ProjectId,
    WorkEntryEvent,
};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Summary of one work entry on a member's day.
#[derive(Debug, Clone)]
pub struct EntrySummary {
    pub entry_id: AggregateId,
    pub project_id: ProjectId,
    pub hours: Hours,
    pub status: EntryStatus,
}

/// Summary of one absence on a member's day.
#[derive(Debug, Clone)]
pub struct AbsenceSummary {
    pub absence_id: AggregateId,
    pub absence_type: AbsenceType,
    pub status: AbsenceStatus,
}

/// Everything booked on one member's day.
#[derive(Debug, Clone, Default)]
struct DaySheet {
    entries: HashMap<AggregateId, EntrySummary>,
    absences: HashMap<AggregateId, AbsenceSummary>,
}

type DayKey = (MemberId, NaiveDate);

/// Read model view of every member's calendar.
#[derive(Clone)]
pub struct MemberCalendarView {
    days: Arc<RwLock<HashMap<DayKey, DaySheet>>>,
    /// Maps entry/absence ids back to their day, since lifecycle events
    /// after the recording one do not carry member or date.
    locations: Arc<RwLock<HashMap<AggregateId, DayKey>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl MemberCalendarView {
    /// Creates a new empty calendar view.
    pub fn new() -> Self {
        Self {
            days: Arc::new(RwLock::new(HashMap::new())),
            locations: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Total hours booked by a member on a date, across all projects and
    /// statuses.
    pub async fn total_hours(&self, member_id: MemberId, date: NaiveDate) -> Hours {
        self.total_hours_excluding(member_id, date, None).await
    }

    /// Total hours on a date, leaving out one entry (the one currently
    /// being updated).
    pub async fn total_hours_excluding(
        &self,
        member_id: MemberId,
        date: NaiveDate,
        excluded: Option<AggregateId>,
    ) -> Hours {
        let days = self.days.read().await;
        match days.get(&(member_id, date)) {
            Some(sheet) => sheet
                .entries
                .values()
                .filter(|e| Some(e.entry_id) != excluded)
                .map(|e| e.hours)
                .sum(),
            None => Hours::zero(),
        }
    }

    /// Returns true if the member already has an entry for the project on
    /// the date.
    pub async fn has_entry_for(
        &self,
        member_id: MemberId,
        project_id: ProjectId,
        date: NaiveDate,
    ) -> bool {
        let days = self.days.read().await;
        days.get(&(member_id, date))
            .map(|sheet| sheet.entries.values().any(|e| e.project_id == project_id))
            .unwrap_or(false)
    }

    /// Entry summaries for a member's day.
    pub async fn entries_for_day(&self, member_id: MemberId, date: NaiveDate) -> Vec<EntrySummary> {
        let days = self.days.read().await;
        days.get(&(member_id, date))
            .map(|sheet| sheet.entries.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Absence summaries for a member's day.
    pub async fn absences_for_day(
        &self,
        member_id: MemberId,
        date: NaiveDate,
    ) -> Vec<AbsenceSummary> {
        let days = self.days.read().await;
        days.get(&(member_id, date))
            .map(|sheet| sheet.absences.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Entry ids with the given status for a member in `[start, end)`.
    pub async fn entry_ids_with_status(
        &self,
        member_id: MemberId,
        start: NaiveDate,
        end: NaiveDate,
        status: EntryStatus,
    ) -> Vec<AggregateId> {
        let days = self.days.read().await;
        let mut ids: Vec<_> = days
            .iter()
            .filter(|((member, date), _)| *member == member_id && *date >= start && *date < end)
            .flat_map(|(_, sheet)| {
                sheet
                    .entries
                    .values()
                    .filter(|e| e.status == status)
                    .map(|e| e.entry_id)
            })
            .collect();
        ids.sort();
        ids
    }

    /// Absence ids with the given status for a member in `[start, end)`.
    pub async fn absence_ids_with_status(
        &self,
        member_id: MemberId,
        start: NaiveDate,
        end: NaiveDate,
        status: AbsenceStatus,
    ) -> Vec<AggregateId> {
        let days = self.days.read().await;
        let mut ids: Vec<_> = days
            .iter()
            .filter(|((member, date), _)| *member == member_id && *date >= start && *date < end)
            .flat_map(|(_, sheet)| {
                sheet
                    .absences
                    .values()
                    .filter(|a| a.status == status)
                    .map(|a| a.absence_id)
            })
            .collect();
        ids.sort();
        ids
    }

    async fn handle_entry_event(&self, entry_id: AggregateId, event: WorkEntryEvent) {
        match event {
            WorkEntryEvent::EntryRecorded(data) => {
                let key = (data.member_id, data.work_date);
                let mut days = self.days.write().await;
                days.entry(key).or_default().entries.insert(
                    data.entry_id,
                    EntrySummary {
                        entry_id: data.entry_id,
                        project_id: data.project_id,
                        hours: data.hours,
                        status: EntryStatus::Draft,
                    },
                );
                self.locations.write().await.insert(data.entry_id, key);
            }
            WorkEntryEvent::EntryUpdated(data) => {
                if let Some(entry) = self.location_of(entry_id).await {
                    let mut days = self.days.write().await;
                    if let Some(summary) = days
                        .get_mut(&entry)
                        .and_then(|sheet| sheet.entries.get_mut(&entry_id))
                    {
                        summary.hours = data.hours;
                    }
                }
            }
            WorkEntryEvent::EntrySubmitted(_) => {
                self.set_entry_status(entry_id, EntryStatus::Submitted).await;
            }
            WorkEntryEvent::EntryApproved(_) => {
                self.set_entry_status(entry_id, EntryStatus::Approved).await;
            }
            WorkEntryEvent::EntryRejected(_) | WorkEntryEvent::EntryRecalled(_) => {
                self.set_entry_status(entry_id, EntryStatus::Draft).await;
            }
            WorkEntryEvent::EntryDeleted(_) => {
                if let Some(key) = self.locations.write().await.remove(&entry_id) {
                    let mut days = self.days.write().await;
                    if let Some(sheet) = days.get_mut(&key) {
                        sheet.entries.remove(&entry_id);
                    }
                }
            }
        }
    }

    async fn handle_absence_event(&self, absence_id: AggregateId, event: AbsenceEvent) {
        match event {
            AbsenceEvent::AbsenceRecorded(data) => {
                let key = (data.member_id, data.absence_date);
                let mut days = self.days.write().await;
                days.entry(key).or_default().absences.insert(
                    data.absence_id,
                    AbsenceSummary {
                        absence_id: data.absence_id,
                        absence_type: data.absence_type,
                        status: AbsenceStatus::Draft,
                    },
                );
                self.locations.write().await.insert(data.absence_id, key);
            }
            AbsenceEvent::AbsenceUpdated(data) => {
                if let Some(key) = self.location_of(absence_id).await {
                    let mut days = self.days.write().await;
                    if let Some(summary) = days
                        .get_mut(&key)
                        .and_then(|sheet| sheet.absences.get_mut(&absence_id))
                    {
                        summary.absence_type = data.absence_type;
                        // Editing a rejected absence returns it to draft.
                        summary.status = AbsenceStatus::Draft;
                    }
                }
            }
            AbsenceEvent::AbsenceSubmitted(_) => {
                self.set_absence_status(absence_id, AbsenceStatus::Submitted)
                    .await;
            }
            AbsenceEvent::AbsenceApproved(_) => {
                self.set_absence_status(absence_id, AbsenceStatus::Approved)
                    .await;
            }
            AbsenceEvent::AbsenceRejected(_) => {
                self.set_absence_status(absence_id, AbsenceStatus::Rejected)
                    .await;
            }
            AbsenceEvent::AbsenceRecalled(_) => {
                self.set_absence_status(absence_id, AbsenceStatus::Draft)
                    .await;
            }
            AbsenceEvent::AbsenceDeleted(_) => {
                if let Some(key) = self.locations.write().await.remove(&absence_id) {
                    let mut days = self.days.write().await;
                    if let Some(sheet) = days.get_mut(&key) {
                        sheet.absences.remove(&absence_id);
                    }
                }
            }
        }
    }

    async fn location_of(&self, id: AggregateId) -> Option<DayKey> {
        self.locations.read().await.get(&id).copied()
    }

    async fn set_entry_status(&self, entry_id: AggregateId, status: EntryStatus) {
        if let Some(key) = self.location_of(entry_id).await {
            let mut days = self.days.write().await;
            if let Some(summary) = days
                .get_mut(&key)
                .and_then(|sheet| sheet.entries.get_mut(&entry_id))
            {
                summary.status = status;
            }
        }
    }

    async fn set_absence_status(&self, absence_id: AggregateId, status: AbsenceStatus) {
        if let Some(key) = self.location_of(absence_id).await {
            let mut days = self.days.write().await;
            if let Some(summary) = days
                .get_mut(&key)
                .and_then(|sheet| sheet.absences.get_mut(&absence_id))
            {
                summary.status = status;
            }
        }
    }
}

impl Default for MemberCalendarView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for MemberCalendarView {
    fn name(&self) -> &'static str {
        "MemberCalendarView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        match event.aggregate_type.as_str() {
            "WorkEntry" => {
                let entry_event: WorkEntryEvent = serde_json::from_value(event.payload.clone())?;
                self.handle_entry_event(event.aggregate_id, entry_event).await;
            }
            "Absence" => {
                let absence_event: AbsenceEvent = serde_json::from_value(event.payload.clone())?;
                self.handle_absence_event(event.aggregate_id, absence_event)
                    .await;
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
        self.days.write().await.clear();
        self.locations.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for MemberCalendarView {
    fn name(&self) -> &'static str {
        "MemberCalendarView"
    }

    fn count(&self) -> usize {
        self.days.try_read().map(|d| d.len()).unwrap_or(0)
    }
}
