use serde::{Deserialize, Serialize};

/// Minutes since local midnight — the only time-of-day type.
/// Schedule times and "now" share the clinic's wall clock; no timezone
/// conversion happens here.
pub type Minutes = u16;

pub const MINUTES_PER_DAY: Minutes = 1440;

/// Convert a wall-clock hour/minute pair to minutes-of-day.
pub fn minutes_of_day(hours: u16, minutes: u16) -> Minutes {
    hours * 60 + minutes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// From a Sunday-based index (0 = Sunday), the form the backend stores.
    pub fn from_index(idx: u8) -> Option<Weekday> {
        match idx {
            0 => Some(Weekday::Sunday),
            1 => Some(Weekday::Monday),
            2 => Some(Weekday::Tuesday),
            3 => Some(Weekday::Wednesday),
            4 => Some(Weekday::Thursday),
            5 => Some(Weekday::Friday),
            6 => Some(Weekday::Saturday),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Working hours for one day of the week. All times are minutes-of-day;
/// the working window is half-open `[start, end)`, the break window
/// (when both bounds are present) likewise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub active: bool,
    pub start: Option<Minutes>,
    pub end: Option<Minutes>,
    pub break_start: Option<Minutes>,
    pub break_end: Option<Minutes>,
}

impl DaySchedule {
    pub fn working(start: Minutes, end: Minutes) -> Self {
        Self {
            active: true,
            start: Some(start),
            end: Some(end),
            break_start: None,
            break_end: None,
        }
    }

    pub fn with_break(mut self, break_start: Minutes, break_end: Minutes) -> Self {
        self.break_start = Some(break_start);
        self.break_end = Some(break_end);
        self
    }

    /// Whether `now` falls inside this day's working window and outside the
    /// break. Total over malformed input: an inactive day, missing bounds,
    /// or a half-specified break degrade to unavailable / no break rather
    /// than panicking.
    pub fn available_at(&self, now: Minutes) -> bool {
        if !self.active {
            return false;
        }
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return false;
        };
        if now < start || now >= end {
            return false;
        }
        if let (Some(break_start), Some(break_end)) = (self.break_start, self.break_end)
            && break_start <= now
            && now < break_end
        {
            return false;
        }
        true
    }
}

/// All seven days of a clinician's week, indexed Sunday = 0.
/// Fetched once per availability check and held immutably — a snapshot in
/// time, not live-updated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub days: [Option<DaySchedule>; 7],
}

impl WeeklySchedule {
    pub fn day(&self, weekday: Weekday) -> Option<&DaySchedule> {
        self.days[weekday.index()].as_ref()
    }

    pub fn set_day(mut self, weekday: Weekday, day: DaySchedule) -> Self {
        self.days[weekday.index()] = Some(day);
        self
    }

    /// A day with no entry contributes no available window.
    pub fn available_at(&self, weekday: Weekday, now: Minutes) -> bool {
        self.day(weekday).is_some_and(|d| d.available_at(now))
    }
}
