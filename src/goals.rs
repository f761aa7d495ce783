use crate::models::{Goal, GoalView};
use chrono::{DateTime, FixedOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalProgress {
    pub percent: u8,
    pub overdue: bool,
}

/// Progress of a goal against the current average mood, capped at 100%.
pub fn goal_progress(goal: &Goal, average_mood: f64, now: &DateTime<FixedOffset>) -> GoalProgress {
    let percent = match goal.target_mood {
        Some(target) if target > 0 => {
            let ratio = (average_mood / f64::from(target) * 100.0).round();
            ratio.clamp(0.0, 100.0) as u8
        }
        _ => 0,
    };

    let overdue = !goal.completed && goal.end.is_some_and(|end| *now > end);

    GoalProgress { percent, overdue }
}

pub fn goal_view(goal: &Goal, average_mood: f64, now: &DateTime<FixedOffset>) -> GoalView {
    let progress = goal_progress(goal, average_mood, now);
    GoalView {
        goal: goal.clone(),
        progress: progress.percent,
        overdue: progress.overdue,
    }
}
