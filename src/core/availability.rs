//! Teacher availability matching.
//!
//! Combines declared open time, existing bookings and excluded days into the
//! windows the arrangement layer renders and checks proposals against. This
//! module never decides whether a specific session is legal on its own.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::core::collaborators::TeacherOpenTime;
use crate::core::model::{
    Holiday, ScheduleCondition, ScheduleEvent, TeacherAvailabilityWindow, WindowKind,
};
use crate::util::ids::TeacherId;

/// Search horizon when the condition has no end date.
pub const DEFAULT_SEARCH_DAYS: u64 = 180;

/// Inclusive span of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
}

impl DateRange {
    /// Range from `start` to `end`; `None` when inverted.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Search window for a condition, defaulting the end to
    /// `start + default_days`.
    pub fn from_condition(condition: &ScheduleCondition, default_days: u64) -> Self {
        let start = condition.start_date;
        let end = condition.end_date.unwrap_or_else(|| {
            start
                .checked_add_days(Days::new(default_days))
                .unwrap_or(NaiveDate::MAX)
        });
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Whether `date` falls in the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    fn start_at(&self) -> NaiveDateTime {
        midnight(self.start)
    }

    fn end_at(&self) -> NaiveDateTime {
        self.end
            .succ_opt()
            .map_or(NaiveDateTime::MAX, midnight)
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

/// Days on which nothing may be booked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSet {
    dates: BTreeSet<NaiveDate>,
}

impl ExclusionSet {
    /// Exclusions from an explicit list.
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// Manual exclusions, plus holidays when the condition asks for them.
    pub fn from_condition(condition: &ScheduleCondition, holidays: &[Holiday]) -> Self {
        let mut dates = condition.excluded_dates.clone();
        if condition.exclude_holidays {
            dates.extend(holidays.iter().map(|h| h.date));
        }
        Self { dates }
    }

    /// Whether `date` is excluded.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Number of excluded days.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Excluded days in order.
    pub fn iter(&self) -> impl Iterator<Item = &NaiveDate> {
        self.dates.iter()
    }
}

/// Open and busy windows for a teacher selection, kept apart because they
/// render differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySnapshot {
    /// Range the snapshot covers.
    pub range: DateRange,
    /// Declared open time, clipped to the range, excluded days removed.
    pub open: Vec<TeacherAvailabilityWindow>,
    /// Existing bookings, clipped the same way.
    pub busy: Vec<TeacherAvailabilityWindow>,
}

fn applies_to(window_teacher: Option<&str>, teacher: Option<&str>) -> bool {
    window_teacher.is_none() || window_teacher == teacher
}

impl AvailabilitySnapshot {
    fn blocking<'s>(
        &'s self,
        teacher: Option<&'s str>,
    ) -> impl Iterator<Item = &'s TeacherAvailabilityWindow> + 's {
        self.busy
            .iter()
            .filter(move |b| applies_to(b.teacher_id.as_deref(), teacher))
    }

    /// Open time usable by `teacher`: their own windows plus unassigned ones,
    /// joined where they overlap or touch.
    fn open_for(&self, teacher: Option<&str>) -> Vec<TeacherAvailabilityWindow> {
        merge_windows(
            self.open
                .iter()
                .filter(|w| applies_to(w.teacher_id.as_deref(), teacher))
                .map(|w| TeacherAvailabilityWindow {
                    teacher_id: teacher.map(str::to_string),
                    ..w.clone()
                })
                .collect(),
        )
    }

    /// Whether `[start, end)` sits inside open time and clear of bookings.
    ///
    /// With no teacher given, any teacher with open time qualifies as long as
    /// they are free.
    pub fn is_bookable(&self, teacher: Option<&str>, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        if start >= end {
            return false;
        }
        let candidates: BTreeSet<Option<&str>> = match teacher {
            Some(t) => BTreeSet::from([Some(t)]),
            None => self.open.iter().map(|w| w.teacher_id.as_deref()).collect(),
        };
        candidates.into_iter().any(|candidate| {
            self.open_for(candidate).iter().any(|w| w.contains(start, end))
                && !self.blocking(candidate).any(|b| b.overlaps(start, end))
        })
    }

    /// Open time minus bookings for one teacher.
    pub fn bookable_slots(&self, teacher: &str) -> Vec<TeacherAvailabilityWindow> {
        let mut slots = Vec::new();
        for window in self.open_for(Some(teacher)) {
            let mut pieces = vec![(window.start, window.end)];
            for busy in self.blocking(Some(teacher)) {
                pieces = pieces
                    .into_iter()
                    .flat_map(|(s, e)| subtract((s, e), (busy.start, busy.end)))
                    .collect();
            }
            slots.extend(pieces.into_iter().map(|(start, end)| TeacherAvailabilityWindow {
                teacher_id: Some(teacher.to_string()),
                start,
                end,
                kind: WindowKind::Open,
            }));
        }
        slots.sort_by_key(|w| w.start);
        slots
    }
}

/// Join windows of the same teacher that overlap or touch on the same day.
fn merge_windows(mut windows: Vec<TeacherAvailabilityWindow>) -> Vec<TeacherAvailabilityWindow> {
    windows.sort_by(|a, b| a.teacher_id.cmp(&b.teacher_id).then_with(|| a.start.cmp(&b.start)));
    let mut merged: Vec<TeacherAvailabilityWindow> = Vec::with_capacity(windows.len());
    for window in windows {
        match merged.last_mut() {
            Some(last)
                if last.teacher_id == window.teacher_id
                    && window.start <= last.end
                    && window.start.date() == last.start.date() =>
            {
                last.end = last.end.max(window.end);
            }
            _ => merged.push(window),
        }
    }
    merged
}

fn subtract(
    (start, end): (NaiveDateTime, NaiveDateTime),
    (cut_start, cut_end): (NaiveDateTime, NaiveDateTime),
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    if cut_end <= start || end <= cut_start {
        return vec![(start, end)];
    }
    let mut rest = Vec::with_capacity(2);
    if start < cut_start {
        rest.push((start, cut_start));
    }
    if cut_end < end {
        rest.push((cut_end, end));
    }
    rest
}

fn is_selected(teacher: Option<&str>, selected: &[TeacherId]) -> bool {
    teacher.is_none_or(|t| selected.iter().any(|s| s == t))
}

/// Split a window at midnight, clip it to `range`, drop excluded days.
fn clip_by_day(
    window: &TeacherAvailabilityWindow,
    kind: WindowKind,
    range: &DateRange,
    exclusions: &ExclusionSet,
    out: &mut Vec<TeacherAvailabilityWindow>,
) {
    let limit = window.end.min(range.end_at());
    let mut cursor = window.start.max(range.start_at());
    while cursor < limit {
        let day = cursor.date();
        let piece_end = day.succ_opt().map_or(limit, |next| midnight(next).min(limit));
        if !exclusions.contains(day) {
            out.push(TeacherAvailabilityWindow {
                teacher_id: window.teacher_id.clone(),
                start: cursor,
                end: piece_end,
                kind,
            });
        }
        cursor = piece_end;
    }
}

/// Build the availability snapshot for a teacher selection.
///
/// Windows owned by unselected teachers are ignored; windows without a
/// teacher always stay.
pub fn match_teacher_availability(
    teacher_ids: &[TeacherId],
    range: &DateRange,
    exclusions: &ExclusionSet,
    open_time: &TeacherOpenTime,
) -> AvailabilitySnapshot {
    let mut open = Vec::new();
    let mut busy = Vec::new();
    for window in open_time
        .events
        .iter()
        .filter(|w| is_selected(w.teacher_id.as_deref(), teacher_ids))
    {
        clip_by_day(window, WindowKind::Open, range, exclusions, &mut open);
    }
    let mut open = merge_windows(open);
    for window in open_time
        .busy_events
        .iter()
        .filter(|w| is_selected(w.teacher_id.as_deref(), teacher_ids))
    {
        clip_by_day(window, WindowKind::Busy, range, exclusions, &mut busy);
    }
    open.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.teacher_id.cmp(&b.teacher_id)));
    busy.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.teacher_id.cmp(&b.teacher_id)));

    tracing::debug!(
        teachers = teacher_ids.len(),
        open = open.len(),
        busy = busy.len(),
        excluded = exclusions.len(),
        "matched teacher availability"
    );
    AvailabilitySnapshot {
        range: *range,
        open,
        busy,
    }
}

/// Calendar events to show for a teacher selection: unassigned events plus
/// those taught by a selected teacher.
pub fn filter_visible_events<'e>(
    events: &'e [ScheduleEvent],
    teacher_ids: &[TeacherId],
) -> Vec<&'e ScheduleEvent> {
    events
        .iter()
        .filter(|e| is_selected(e.teacher_id.as_deref(), teacher_ids))
        .collect()
}
