use crate::errors::AppError;
use crate::goals::goal_view;
use crate::models::{
    AppData, CreateEntryRequest, CreateGoalRequest, CreateTagRequest, Goal, GoalView,
    MoodObservation, Tag,
};
use crate::state::AppState;
use crate::stats::{compute_stats, Stats};
use crate::storage::persist_data;
use crate::window::{filter_by_window, TimeWindow};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Days;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::info;
use uuid::Uuid;

const DEFAULT_GOAL_DAYS: u32 = 7;
const MAX_GOAL_DAYS: u32 = 365;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub range: TimeWindow,
}

pub async fn list_entries(
    State(state): State<AppState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<Vec<MoodObservation>>, AppError> {
    let Query(query) = query.map_err(|err| AppError::bad_request(err.body_text()))?;
    let now = state.clock.now();
    let data = state.data.lock().await;
    Ok(Json(filter_by_window(&data.entries, query.range, &now)))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Json(payload): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<MoodObservation>), AppError> {
    check_scale("mood", payload.mood)?;
    check_scale("energy", payload.energy)?;

    let now = state.clock.now();
    let recorded_at = payload.recorded_at.unwrap_or(now);
    if recorded_at > now {
        return Err(AppError::bad_request("recorded_at must not be in the future"));
    }

    let tags: BTreeSet<Uuid> = payload.tags.into_iter().collect();
    let entry = MoodObservation {
        id: Uuid::new_v4(),
        recorded_at: Some(recorded_at),
        unreadable_recorded_at: None,
        mood: payload.mood,
        energy: payload.energy,
        label: non_blank(payload.label),
        note: non_blank(payload.note),
        tags,
    };

    commit(&state, |data| {
        if let Some(unknown) = entry
            .tags
            .iter()
            .find(|id| !data.tags.iter().any(|tag| tag.id == **id))
        {
            return Err(AppError::bad_request(format!("unknown tag {unknown}")));
        }
        data.entries.push(entry.clone());
        Ok(())
    })
    .await?;

    info!(id = %entry.id, mood = entry.mood, energy = entry.energy, "recorded mood entry");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    commit(&state, |data| {
        let before = data.entries.len();
        data.entries.retain(|entry| entry.id != id);
        if data.entries.len() == before {
            return Err(AppError::not_found(format!("no entry {id}")));
        }
        Ok(())
    })
    .await?;

    info!(%id, "deleted mood entry");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_stats(State(state): State<AppState>) -> Json<Stats> {
    let now = state.clock.now();
    let data = state.data.lock().await;
    Json(compute_stats(&data.entries, &now))
}

pub async fn list_tags(State(state): State<AppState>) -> Json<Vec<Tag>> {
    let data = state.data.lock().await;
    Json(data.tags.clone())
}

pub async fn create_tag(
    State(state): State<AppState>,
    Json(payload): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    let name = non_blank(Some(payload.name))
        .ok_or_else(|| AppError::bad_request("tag name must not be empty"))?;

    let tag = Tag {
        id: Uuid::new_v4(),
        name,
        category: payload.category,
        created_at: state.clock.now(),
    };

    commit(&state, |data| {
        data.tags.push(tag.clone());
        Ok(())
    })
    .await?;

    info!(id = %tag.id, name = %tag.name, "created tag");
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    commit(&state, |data| {
        if data.remove_tag(id) {
            Ok(())
        } else {
            Err(AppError::not_found(format!("no tag {id}")))
        }
    })
    .await?;

    info!(%id, "deleted tag");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_goals(State(state): State<AppState>) -> Json<Vec<GoalView>> {
    let now = state.clock.now();
    let data = state.data.lock().await;
    let average_mood = compute_stats(&data.entries, &now).average_mood;
    Json(
        data.goals
            .iter()
            .map(|goal| goal_view(goal, average_mood, &now))
            .collect(),
    )
}

pub async fn create_goal(
    State(state): State<AppState>,
    Json(payload): Json<CreateGoalRequest>,
) -> Result<(StatusCode, Json<Goal>), AppError> {
    let title = non_blank(Some(payload.title))
        .ok_or_else(|| AppError::bad_request("goal title must not be empty"))?;
    if let Some(target) = payload.target_mood {
        check_scale("target_mood", target)?;
    }
    if let Some(target) = payload.target_energy {
        check_scale("target_energy", target)?;
    }

    let duration = payload.duration_days.unwrap_or(DEFAULT_GOAL_DAYS);
    if !(1..=MAX_GOAL_DAYS).contains(&duration) {
        return Err(AppError::bad_request(format!(
            "duration_days must be between 1 and {MAX_GOAL_DAYS}"
        )));
    }

    let start = state.clock.now();
    let end = start
        .checked_add_days(Days::new(u64::from(duration)))
        .ok_or_else(|| AppError::bad_request("goal end date out of range"))?;

    let goal = Goal {
        id: Uuid::new_v4(),
        title,
        description: non_blank(payload.description),
        target_mood: payload.target_mood,
        target_energy: payload.target_energy,
        start,
        end: Some(end),
        completed: false,
        created_at: start,
        updated_at: start,
    };

    commit(&state, |data| {
        data.goals.push(goal.clone());
        Ok(())
    })
    .await?;

    info!(id = %goal.id, title = %goal.title, "created goal");
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn complete_goal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Goal>, AppError> {
    let now = state.clock.now();
    let updated = commit(&state, |data| {
        let goal = data
            .goals
            .iter_mut()
            .find(|goal| goal.id == id)
            .ok_or_else(|| AppError::not_found(format!("no goal {id}")))?;
        goal.completed = true;
        goal.updated_at = now;
        Ok(goal.clone())
    })
    .await?;

    info!(%id, "completed goal");
    Ok(Json(updated))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    commit(&state, |data| {
        let before = data.goals.len();
        data.goals.retain(|goal| goal.id != id);
        if data.goals.len() == before {
            return Err(AppError::not_found(format!("no goal {id}")));
        }
        Ok(())
    })
    .await?;

    info!(%id, "deleted goal");
    Ok(StatusCode::NO_CONTENT)
}

/// Applies `change` to a copy of the document and swaps it in only once it
/// has been written, so a failed write leaves the served state untouched.
async fn commit<T>(
    state: &AppState,
    change: impl FnOnce(&mut AppData) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let output = change(&mut next)?;
    persist_data(&state.data_path, &next).await?;
    *data = next;
    Ok(output)
}

fn check_scale(field: &str, value: i32) -> Result<(), AppError> {
    if (1..=10).contains(&value) {
        Ok(())
    } else {
        Err(AppError::bad_request(format!("{field} must be between 1 and 10")))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
