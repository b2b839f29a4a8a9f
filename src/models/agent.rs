use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Singleton row driving the daily generation job.
#[derive(Debug, Clone, Serialize)]
pub struct AgentConfig {
    pub is_enabled: bool,
    pub schedule_time: ScheduleTime,
    pub last_run: Option<DateTime<Utc>>,
}

/// Wall-clock time of day, written `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScheduleTime {
    pub hour: u32,
    pub minute: u32,
}

impl ScheduleTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Six-field cron expression (seconds first) firing once a day.
    pub fn cron_expression(&self) -> String {
        format!("0 {} {} * * *", self.minute, self.hour)
    }
}

impl FromStr for ScheduleTime {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::BadRequest(format!("invalid schedule time '{}', expected HH:MM", s));
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = h.trim().parse::<u32>().map_err(|_| invalid())?;
        let minute = m.trim().parse::<u32>().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ScheduleTime {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScheduleTime> for String {
    fn from(value: ScheduleTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats() {
        let t: ScheduleTime = "9:05".parse().unwrap();
        assert_eq!(t, ScheduleTime { hour: 9, minute: 5 });
        assert_eq!(t.to_string(), "09:05");
        assert_eq!(t.cron_expression(), "0 5 9 * * *");
    }

    #[test]
    fn rejects_out_of_range() {
        assert!("24:00".parse::<ScheduleTime>().is_err());
        assert!("12:60".parse::<ScheduleTime>().is_err());
        assert!("noon".parse::<ScheduleTime>().is_err());
        assert!("".parse::<ScheduleTime>().is_err());
    }
}
