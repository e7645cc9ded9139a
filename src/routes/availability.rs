//! # 강사 가용 시간 API
//!
//! - `GET /api/v1/teachers/{id}/availability` → `{ "windows": [...] }`
//! - `PUT /api/v1/teachers/{id}/availability` + `{ "windows": [...] }` → 전체 교체

use crate::{db, error::AppError, models::*, routes::AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

const DAY_NAMES: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

pub async fn get_teacher_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let mut conn = state.pool.acquire().await?;
    db::get_teacher(&mut conn, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Teacher", &id))?;
    let windows = db::list_availability(&mut conn, &id).await?;
    Ok(Json(json!({ "windows": windows })))
}

/// 요일 이름은 대소문자를 가리지 않고 받아서 "Monday" 형태로 저장합니다.
pub async fn replace_teacher_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReplaceAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let mut windows = req.windows;
    for window in &mut windows {
        let day = DAY_NAMES
            .iter()
            .find(|name| name.eq_ignore_ascii_case(window.day_of_week.trim()))
            .ok_or_else(|| AppError::BadRequest(format!("unknown day of week \"{}\"", window.day_of_week)))?;
        window.day_of_week = day.to_string();
        if window.start_time >= window.end_time {
            return Err(AppError::BadRequest(format!(
                "availability on {} must start before it ends ({} - {})",
                window.day_of_week, window.start_time, window.end_time
            )));
        }
    }

    let mut tx = state.pool.begin().await?;
    db::get_teacher(&mut tx, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Teacher", &id))?;
    let stored = db::replace_availability(&mut tx, &id, &windows).await?;
    tx.commit().await?;

    tracing::info!(teacher_id = %id, windows = stored.len(), "teacher availability replaced");
    Ok(Json(json!({ "windows": stored })))
}
