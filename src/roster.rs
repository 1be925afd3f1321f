use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use ulid::Ulid;

use crate::backend::Backend;
use crate::error::SyncError;
use crate::schedule::{DaySchedule, Minutes, Weekday};

/// The profile joined onto each schedule row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub id: Ulid,
    pub display_name: String,
    pub role: String,
    #[serde(default)]
    pub specialty: Option<String>,
}

/// One (clinician, weekday) working-hours row as the backend returns it.
#[derive(Debug, Clone, Deserialize)]
struct ScheduleRow {
    weekday: u8,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    start_min: Option<Minutes>,
    #[serde(default)]
    end_min: Option<Minutes>,
    #[serde(default)]
    break_start_min: Option<Minutes>,
    #[serde(default)]
    break_end_min: Option<Minutes>,
    #[serde(default)]
    profile: Option<Profile>,
}

impl ScheduleRow {
    fn day(&self) -> DaySchedule {
        DaySchedule {
            active: self.active,
            start: self.start_min,
            end: self.end_min,
            break_start: self.break_start_min,
            break_end: self.break_end_min,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableClinician {
    pub profile: Profile,
    pub day: DaySchedule,
}

/// Clinicians of `role` whose working window covers the given instant.
///
/// The backend pre-filters to the role; day matching and the availability
/// predicate run client-side. Result order inherits fetch order. Rows that
/// fail to decode or lack a joined profile are skipped, not errors.
pub async fn available_now(
    backend: &dyn Backend,
    role: &str,
    weekday: Weekday,
    now: Minutes,
) -> Result<Vec<AvailableClinician>, SyncError> {
    let rows = backend.roster(role).await?;
    let mut available = Vec::new();
    for row in rows {
        let parsed: ScheduleRow = match serde_json::from_value(Value::Object(row)) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "skipping undecodable schedule row");
                continue;
            }
        };
        let day = parsed.day();
        let Some(profile) = parsed.profile else {
            // Orphaned schedule row — no joined profile, no result.
            continue;
        };
        if usize::from(parsed.weekday) != weekday.index() {
            continue;
        }
        if day.available_at(now) {
            available.push(AvailableClinician { profile, day });
        }
    }
    Ok(available)
}
