use crate::{Result, TimestamperError};

/// Nominal video length the plan covers. Videos are assumed to run at most two hours;
/// offsets past the real end of a shorter video are still requested.
pub const DURATION_CEILING_MINUTES: i64 = 120;

/// Ordered offsets (`HH:MM:SS`) the model is asked to describe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampPlan {
    offsets: Vec<String>,
}

impl TimestampPlan {
    pub fn offsets(&self) -> &[String] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.offsets.iter().map(String::as_str)
    }
}

/// Build the offsets from 0 to the ceiling (inclusive) stepping by `interval_minutes`
pub fn plan(interval_minutes: i64) -> Result<TimestampPlan> {
    if interval_minutes <= 0 {
        return Err(TimestamperError::InvalidArgument(format!(
            "interval must be a positive number of minutes, got {}",
            interval_minutes
        )));
    }

    let step = usize::try_from(interval_minutes).map_err(|_| {
        TimestamperError::InvalidArgument(format!(
            "interval is out of range: {}",
            interval_minutes
        ))
    })?;

    let offsets = (0..=DURATION_CEILING_MINUTES)
        .step_by(step)
        .map(format_offset)
        .collect();

    Ok(TimestampPlan { offsets })
}

/// Format whole minutes as `HH:MM:00`
pub fn format_offset(minutes: i64) -> String {
    format!("{:02}:{:02}:00", minutes / 60, minutes % 60)
}
