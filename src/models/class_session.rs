//! # 수업(Class Session) 모델 정의
//!
//! "수업"은 반복 일정 정의(`RecurrenceDefinition`)와 그 정의로부터 만들어진
//! 인스턴스들을 묶는 단위입니다.
//!
//! ## 구조체 역할
//! - `RecurrenceDefinition`: 반복 종류 + 날짜 범위 + 요일별 시작 시각/길이
//! - `ClassSession`: DB의 `class_sessions` 테이블 한 행 (정의를 명시적으로 저장)
//! - `CreateClassSessionRequest` / `UpdateClassSessionRequest` / `UpdateWindowRequest`: 요청 본문

use crate::models::SharedAttributes;
use crate::scheduling::calendar::{DayCode, WallTime};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::collections::BTreeMap;
use std::fmt;

/// 반복 종류. JSON과 DB에는 소문자 문자열(`"once"`, `"weekly"`, `"custom"`)로 저장됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    Once,
    Weekly,
    Custom,
}

impl RecurrenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecurrenceKind::Once => "once",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Custom => "custom",
        }
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for RecurrenceKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "once" => Ok(RecurrenceKind::Once),
            "weekly" => Ok(RecurrenceKind::Weekly),
            "custom" => Ok(RecurrenceKind::Custom),
            other => Err(format!("unknown recurrence kind \"{}\"", other)),
        }
    }
}

/// 한 요일의 수업 시작 시각과 길이(분)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub start_time: WallTime,
    /// 이전 클라이언트는 `duration`이라는 이름으로 보냅니다
    #[serde(alias = "duration")]
    pub duration_minutes: u32,
}

/// 요일 코드 → 일정. `BTreeMap`이므로 항상 월요일부터 순서대로 순회됩니다.
pub type DaySchedules = BTreeMap<DayCode, DaySchedule>;

/// 반복 일정 정의
///
/// 수정은 항상 정의 전체를 교체하는 방식입니다. 조정 엔진은
/// "이전 정의 + 새 정의"를 받아 비교하며, 부분 패치(delta)를 받지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceDefinition {
    pub recurrence_kind: RecurrenceKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// 요일별 일정. `once`/`weekly`는 항목이 정확히 하나여야 합니다.
    #[serde(alias = "sessions", alias = "day_details")]
    pub schedule: DaySchedules,
}

/// `class_sessions` 테이블 한 행
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ClassSession {
    pub id: String,
    #[sqlx(try_from = "String")]
    pub recurrence_kind: RecurrenceKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub schedule: Json<DaySchedules>,
    pub topic: Option<String>,
    pub is_holiday_course: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ClassSession {
    /// 저장된 반복 일정 정의를 꺼냅니다.
    pub fn definition(&self) -> RecurrenceDefinition {
        RecurrenceDefinition {
            recurrence_kind: self.recurrence_kind,
            start_date: self.start_date,
            end_date: self.end_date,
            schedule: self.schedule.0.clone(),
        }
    }
}

/// 수업 생성 요청: `POST /api/v1/class-sessions`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClassSessionRequest {
    #[serde(flatten)]
    pub definition: RecurrenceDefinition,
    #[serde(flatten)]
    pub attributes: SharedAttributes,
    pub topic: Option<String>,
    #[serde(default)]
    pub is_holiday_course: bool,
}

/// 수업 전체 수정 요청: `PUT /api/v1/class-sessions/{id}`
///
/// 새 정의 전체를 보내야 합니다. `topic`/`is_holiday_course`는 None이면 유지합니다.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateClassSessionRequest {
    #[serde(flatten)]
    pub definition: RecurrenceDefinition,
    #[serde(flatten)]
    pub attributes: SharedAttributes,
    pub topic: Option<String>,
    pub is_holiday_course: Option<bool>,
}

/// 기간 한정 수정 요청: `PUT /api/v1/class-sessions/{id}/window`
///
/// `[from, to]` 안의 인스턴스만 조정합니다. 범위 밖 인스턴스는 건드리지 않습니다.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWindowRequest {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(alias = "day_details")]
    pub schedule: DaySchedules,
    #[serde(flatten)]
    pub attributes: SharedAttributes,
}

/// 생성 결과
#[derive(Debug, Clone, Serialize)]
pub struct ClassSessionCreated {
    pub class_session_id: String,
    pub instance_count: usize,
}

/// 수정 결과: 알림에 쓰인 변경 사항 목록
#[derive(Debug, Clone, Serialize)]
pub struct ClassSessionUpdated {
    pub class_session_id: String,
    pub changes: Vec<String>,
    pub removed: usize,
    pub updated: usize,
    pub inserted: usize,
}

/// 수업 상세: `GET /api/v1/class-sessions/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct ClassSessionDetail {
    #[serde(flatten)]
    pub class_session: ClassSession,
    pub instances: Vec<crate::models::SessionInstance>,
}
