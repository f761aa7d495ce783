use crate::dates::effective_instant;
use crate::models::MoodObservation;
use chrono::{DateTime, Days, FixedOffset};
use serde::{Deserialize, Serialize};

/// Relative display window for charting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeWindow {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "7days")]
    Last7,
    #[serde(rename = "30days")]
    Last30,
    #[serde(rename = "90days")]
    Last90,
}

impl TimeWindow {
    pub fn days(self) -> Option<u64> {
        match self {
            TimeWindow::All => None,
            TimeWindow::Last7 => Some(7),
            TimeWindow::Last30 => Some(30),
            TimeWindow::Last90 => Some(90),
        }
    }

    /// Earliest instant still inside the window.
    pub fn cutoff(self, now: &DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        self.days()
            .and_then(|days| now.checked_sub_days(Days::new(days)))
    }
}

/// Keeps the observations recorded at or after the window's cutoff, in input
/// order. Observations without a timestamp count as recorded `now`.
pub fn filter_by_window(
    observations: &[MoodObservation],
    window: TimeWindow,
    now: &DateTime<FixedOffset>,
) -> Vec<MoodObservation> {
    let Some(cutoff) = window.cutoff(now) else {
        return observations.to_vec();
    };

    observations
        .iter()
        .filter(|obs| effective_instant(obs.recorded_at.as_ref(), now) >= cutoff)
        .cloned()
        .collect()
}
