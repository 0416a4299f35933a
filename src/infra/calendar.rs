//! In-memory holiday and teacher open-time sources.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;

use crate::core::{
    AppResult, Holiday, HolidayProvider, TeacherAvailabilityWindow, TeacherOpenTime,
    TeacherOpenTimeSource,
};
use crate::util::ids::TeacherId;

/// Fixed holiday list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHolidayProvider {
    holidays: Vec<Holiday>,
}

impl InMemoryHolidayProvider {
    /// Provider returning `dates`.
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: dates.into_iter().map(|date| Holiday { date }).collect(),
        }
    }
}

#[async_trait]
impl HolidayProvider for InMemoryHolidayProvider {
    async fn fetch_holidays(&self) -> AppResult<Vec<Holiday>> {
        Ok(self.holidays.clone())
    }
}

/// Teacher windows held in memory.
#[derive(Default)]
pub struct InMemoryTeacherOpenTime {
    open: RwLock<Vec<TeacherAvailabilityWindow>>,
    busy: RwLock<Vec<TeacherAvailabilityWindow>>,
}

impl InMemoryTeacherOpenTime {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare open time.
    pub fn add_open(&self, window: TeacherAvailabilityWindow) {
        self.open.write().push(window);
    }

    /// Declare a conflicting booking.
    pub fn add_busy(&self, window: TeacherAvailabilityWindow) {
        self.busy.write().push(window);
    }
}

fn in_request(
    window: &TeacherAvailabilityWindow,
    teacher_ids: &[TeacherId],
    start: NaiveDate,
    end: NaiveDate,
) -> bool {
    let teacher_ok = window
        .teacher_id
        .as_ref()
        .is_none_or(|t| teacher_ids.contains(t));
    teacher_ok && window.start.date() <= end && window.end.date() >= start
}

#[async_trait]
impl TeacherOpenTimeSource for InMemoryTeacherOpenTime {
    async fn fetch_teacher_open_time(
        &self,
        teacher_ids: &[TeacherId],
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<TeacherOpenTime> {
        let pick = |windows: &[TeacherAvailabilityWindow]| {
            windows
                .iter()
                .filter(|w| in_request(w, teacher_ids, start, end))
                .cloned()
                .collect::<Vec<_>>()
        };
        Ok(TeacherOpenTime {
            events: pick(self.open.read().as_slice()),
            busy_events: pick(self.busy.read().as_slice()),
        })
    }
}
