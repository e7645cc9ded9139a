//! # 수업 인스턴스 API 라우트 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 |
//! |--------|------|--------|
//! | POST | /api/v1/instances/activation | `toggle_activation` |
//! | PATCH | /api/v1/instances/{id} | `update_session_instance` |
//! | PUT | /api/v1/instances/{id}/absences/{student_id} | `record_absence` |
//! | POST | /api/v1/instances/{id}/reports | `submit_report` |

use crate::{
    error::AppError,
    models::*,
    routes::{today, AppState},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

pub async fn toggle_activation(
    State(state): State<AppState>,
    Json(req): Json<ToggleActivationRequest>,
) -> Result<Json<ToggleActivationResult>, AppError> {
    let result = state.scheduler.toggle_activation(req).await?;
    Ok(Json(result))
}

pub async fn update_session_instance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<InstancePatch>,
) -> Result<Json<SessionInstance>, AppError> {
    let instance = state.scheduler.update_session_instance(&id, patch, today()).await?;
    Ok(Json(instance))
}

pub async fn record_absence(
    State(state): State<AppState>,
    Path((id, student_id)): Path<(String, String)>,
    Json(req): Json<RecordAbsenceRequest>,
) -> Result<Json<Absence>, AppError> {
    let absence = state.scheduler.record_absence(&id, &student_id, req).await?;
    Ok(Json(absence))
}

pub async fn submit_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitReportRequest>,
) -> Result<(StatusCode, Json<SessionReport>), AppError> {
    let report = state.scheduler.submit_report(&id, req).await?;
    Ok((StatusCode::CREATED, Json(report)))
}
