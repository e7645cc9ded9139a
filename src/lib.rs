//! # Tutorly 수업 일정 엔진
//!
//! 반복 수업 정의를 날짜별 수업 인스턴스로 펼치고(materialize),
//! 정의가 바뀌면 기존 인스턴스와 조정(reconcile)합니다.
//!
//! - `scheduling`: DB를 모르는 순수 일정 계산 (반복 전개, 가용성, 겹침, 조정 계획)
//! - `db`: SQLite 쿼리 함수
//! - `services`: 트랜잭션 단위 작업(`Scheduler`), 알림, 이벤트 버스
//! - `routes`: Axum HTTP 핸들러

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod scheduling;
pub mod services;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use routes::*;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// `/api/v1` 아래에 모든 API 라우트를 붙인 라우터를 만듭니다.
/// 정적 파일 서빙은 `main`에서 따로 붙입니다.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // 수업(반복 정의)
        .route("/class-sessions", get(list_calendar).post(create_class_session))
        .route("/class-sessions/{id}", get(get_class_session).put(update_class_session))
        .route("/class-sessions/{id}/window", put(update_class_session_window))
        // 수업 인스턴스
        .route("/instances/activation", post(toggle_activation))
        .route("/instances/{id}", patch(update_session_instance))
        .route("/instances/{id}/absences/{student_id}", put(record_absence))
        .route("/instances/{id}/reports", post(submit_report))
        // 강사 가용 시간
        .route(
            "/teachers/{id}/availability",
            get(get_teacher_availability).put(replace_teacher_availability),
        )
        .route("/overlap-check", post(check_overlap))
        .route("/health", get(health_check))
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
