use crate::dates::{calendar_date, effective_instant};
use crate::models::MoodObservation;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Stats {
    pub average_mood: f64,
    pub average_energy: f64,
    pub total_entries: usize,
    pub highest: Option<MoodObservation>,
    pub lowest: Option<MoodObservation>,
    pub current_streak: u32,
}

/// Derives aggregate statistics from the full observation log.
///
/// Ties for `highest`/`lowest` go to the earliest observation in input
/// order. Values outside 1..=10 are averaged as given.
pub fn compute_stats(observations: &[MoodObservation], now: &DateTime<FixedOffset>) -> Stats {
    if observations.is_empty() {
        return Stats::default();
    }

    let mut mood_sum = 0i64;
    let mut energy_sum = 0i64;
    let mut highest = &observations[0];
    let mut lowest = &observations[0];

    for obs in observations {
        mood_sum += i64::from(obs.mood);
        energy_sum += i64::from(obs.energy);
        if obs.mood > highest.mood {
            highest = obs;
        }
        if obs.mood < lowest.mood {
            lowest = obs;
        }
    }

    let count = observations.len() as i64;

    Stats {
        average_mood: mean_one_decimal(mood_sum, count),
        average_energy: mean_one_decimal(energy_sum, count),
        total_entries: observations.len(),
        highest: Some(highest.clone()),
        lowest: Some(lowest.clone()),
        current_streak: current_streak(observations, now),
    }
}

/// Consecutive calendar days with at least one observation, counted back
/// from today, or from yesterday when nothing was logged today.
pub fn current_streak(observations: &[MoodObservation], now: &DateTime<FixedOffset>) -> u32 {
    let days: HashSet<NaiveDate> = observations
        .iter()
        .map(|obs| calendar_date(&effective_instant(obs.recorded_at.as_ref(), now), now))
        .collect();

    let today = now.date_naive();
    let anchor = if days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt().filter(|yesterday| days.contains(yesterday))
    };

    let mut streak = 0;
    let mut cursor = anchor;
    while let Some(day) = cursor.filter(|day| days.contains(day)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}

/// Mean of `sum / count` rounded half-up to one decimal, computed exactly in
/// integers so values like 7.25 round to 7.3.
fn mean_one_decimal(sum: i64, count: i64) -> f64 {
    let tenths = (20 * sum + count).div_euclid(2 * count);
    tenths as f64 / 10.0
}
