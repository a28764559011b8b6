//! Operating window consulted by the scheduler.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Weekdays and hours during which scheduled checks run.
///
/// `start_hour` is inclusive and `end_hour` exclusive, both in local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWindow {
    #[serde(default = "default_days")]
    pub days: Vec<Weekday>,

    #[serde(default = "default_start_hour")]
    pub start_hour: u32,

    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
}

fn default_days() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ]
}

fn default_start_hour() -> u32 {
    8
}

fn default_end_hour() -> u32 {
    23
}

impl Default for ActiveWindow {
    fn default() -> Self {
        Self {
            days: default_days(),
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
        }
    }
}

impl ActiveWindow {
    /// Whether `now` falls inside the window.
    pub fn contains<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        let hour = now.hour();
        self.days.contains(&now.weekday()) && hour >= self.start_hour && hour < self.end_hour
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        // 2025-06-01 is a Sunday
        let naive = NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap();
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .from_local_datetime(&naive)
            .unwrap()
    }

    #[test]
    fn sunday_is_outside() {
        let window = ActiveWindow::default();
        assert!(!window.contains(&at(1, 12, 0)));
    }

    #[test]
    fn hour_bounds_are_half_open() {
        let window = ActiveWindow::default();
        assert!(!window.contains(&at(2, 7, 59)));
        assert!(window.contains(&at(2, 8, 0)));
        assert!(window.contains(&at(7, 22, 59)));
        assert!(!window.contains(&at(7, 23, 0)));
    }

    #[test]
    fn deserializes_weekday_names() {
        let window: ActiveWindow =
            toml::from_str("days = [\"Sun\"]\nstart_hour = 0\nend_hour = 24").unwrap();
        assert!(window.contains(&at(1, 3, 0)));
        assert!(!window.contains(&at(2, 3, 0)));
    }
}
