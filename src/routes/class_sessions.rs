//! # 수업 API 라우트 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | POST | /api/v1/class-sessions | `create_class_session` | 반복 정의로 수업 생성 |
//! | GET | /api/v1/class-sessions?from&to&location_id&teacher_id&student_id | `list_calendar` | 달력 구간 조회 (장소/강사/학생 필터) |
//! | GET | /api/v1/class-sessions/{id} | `get_class_session` | 저장된 정의 + 인스턴스 |
//! | PUT | /api/v1/class-sessions/{id} | `update_class_session` | 새 정의로 전체 조정 |
//! | PUT | /api/v1/class-sessions/{id}/window | `update_class_session_window` | 기간 한정 조정 |

use crate::{
    error::AppError,
    models::*,
    routes::{today, AppState},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

/// `POST /api/v1/class-sessions` → 201 + `{ class_session_id, instance_count }`
pub async fn create_class_session(
    State(state): State<AppState>,
    Json(req): Json<CreateClassSessionRequest>,
) -> Result<(StatusCode, Json<ClassSessionCreated>), AppError> {
    let created = state.scheduler.create_class_session(req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Value>, AppError> {
    let entries = state.scheduler.list_calendar(query).await?;
    Ok(Json(json!({ "instances": entries })))
}

pub async fn get_class_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ClassSessionDetail>, AppError> {
    let detail = state.scheduler.get_class_session(&id).await?;
    Ok(Json(detail))
}

/// `PUT /api/v1/class-sessions/{id}`: 새 반복 정의 전체를 받아 기존 인스턴스와 조정합니다.
pub async fn update_class_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateClassSessionRequest>,
) -> Result<Json<ClassSessionUpdated>, AppError> {
    let updated = state.scheduler.update_class_session(&id, req, today()).await?;
    Ok(Json(updated))
}

pub async fn update_class_session_window(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateWindowRequest>,
) -> Result<Json<ClassSessionUpdated>, AppError> {
    let updated = state.scheduler.update_class_session_window(&id, req, today()).await?;
    Ok(Json(updated))
}
