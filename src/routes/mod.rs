//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! 핸들러는 요청을 파싱하고 "오늘" 날짜를 정한 뒤 서비스 계층(`Scheduler`)을 호출합니다.
//!
//! 각 하위 모듈:
//! - `class_sessions`: 수업 생성/조회/수정, 달력
//! - `instances`: 인스턴스 활성화 토글, 단일 수정, 출결, 보고서
//! - `availability`: 강사 가용 시간 조회/교체
//! - `overlap`: 겹침 검사
//! - `health`: 서버 상태 확인 (헬스체크)

pub mod availability;
pub mod class_sessions;
pub mod health;
pub mod instances;
pub mod overlap;

pub use availability::*;
pub use class_sessions::*;
pub use health::*;
pub use instances::*;
pub use overlap::*;

use crate::services::Scheduler;
use chrono::NaiveDate;
use sqlx::SqlitePool;

/// 모든 핸들러가 공유하는 상태
///
/// `Scheduler`는 풀, 알림 전송기, 이벤트 버스, 검증 규칙을 함께 들고 있습니다.
/// 모두 내부적으로 Arc라서 clone 비용이 작습니다.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub scheduler: Scheduler,
}

impl AppState {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            pool: scheduler.pool().clone(),
            scheduler,
        }
    }
}

/// 요청 시점의 "오늘" (서버 로컬 날짜)
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
