//! # 수업 인스턴스 모델 정의
//!
//! 인스턴스는 실제로 예약 가능한 한 번의 수업입니다 (날짜 + 시작 시각 + 길이).
//! 반드시 하나의 수업(`ClassSession`)에 속합니다.

use crate::scheduling::calendar::WallTime;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// `class_session_instances` 테이블 한 행 + 참여 학생 ID 목록
///
/// `student_ids`는 `instance_students` 다대다 테이블에서 따로 채웁니다.
/// 학생은 인스턴스가 소유하지 않는 공유 참조이며 순서는 의미가 없습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionInstance {
    pub id: String,
    pub class_session_id: String,
    pub date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub start_time: WallTime,
    pub duration_minutes: u32,
    pub teacher_id: Option<String>,
    pub location_id: Option<String>,
    pub room: Option<String>,
    pub session_type_id: Option<String>,
    pub note: Option<String>,
    pub is_active: bool,
    pub reports_submitted: bool,
    #[sqlx(skip)]
    #[serde(default)]
    pub student_ids: Vec<String>,
}

impl SessionInstance {
    pub fn end_minutes(&self) -> u32 {
        self.start_time.end_minutes(self.duration_minutes)
    }

    /// 학생 구성이 같은지 (순서 무시)
    pub fn same_students(&self, other: &[String]) -> bool {
        let mut mine: Vec<&str> = self.student_ids.iter().map(String::as_str).collect();
        let mut theirs: Vec<&str> = other.iter().map(String::as_str).collect();
        mine.sort_unstable();
        mine.dedup();
        theirs.sort_unstable();
        theirs.dedup();
        mine == theirs
    }
}

fn default_active() -> bool {
    true
}

/// 한 수업의 모든 인스턴스가 공유하는 속성
///
/// 생성/수정 요청 본문에 평탄화(flatten)되어 들어옵니다.
/// 수정 시에는 "전체 교체" 의미이므로 None은 "없음"으로 적용됩니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedAttributes {
    pub teacher_id: Option<String>,
    pub location_id: Option<String>,
    pub room: Option<String>,
    pub session_type_id: Option<String>,
    pub note: Option<String>,
    #[serde(default)]
    pub student_ids: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// 단일 인스턴스 부분 수정: `PATCH /api/v1/instances/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstancePatch {
    pub date: Option<NaiveDate>,
    pub start_time: Option<WallTime>,
    #[serde(alias = "duration")]
    pub duration_minutes: Option<u32>,
    pub teacher_id: Option<String>,
    pub student_ids: Option<Vec<String>>,
    pub session_type_id: Option<String>,
    pub room: Option<String>,
    pub note: Option<String>,
    pub is_active: Option<bool>,
}

/// 활성화 토글 요청: `POST /api/v1/instances/activation`
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleActivationRequest {
    #[serde(alias = "ids")]
    pub instance_ids: Vec<String>,
    pub is_active: bool,
}

/// 보고서 작성 현황. 달력 화면의 배지에 사용됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportStatus {
    pub all_reports_completed: bool,
    pub total_students: usize,
    pub completed_reports: usize,
    pub absences: usize,
    pub pending_absences: usize,
}

/// 달력 목록의 한 항목
#[derive(Debug, Clone, Serialize)]
pub struct CalendarEntry {
    #[serde(flatten)]
    pub instance: SessionInstance,
    pub end_time: String,
    pub has_overlap: bool,
    pub report_status: ReportStatus,
}

/// 겹침 검사 요청: `POST /api/v1/overlap-check`
#[derive(Debug, Clone, Deserialize)]
pub struct OverlapCheckRequest {
    pub instance: SessionInstance,
    pub working_set: Vec<SessionInstance>,
}

/// 활성화 토글 결과. 실제로 상태가 바뀐 인스턴스 수만 셉니다.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleActivationResult {
    pub changed: usize,
    pub is_active: bool,
}

/// 달력 조회 조건: `GET /api/v1/class-sessions?from=..&to=..&location_id=..&teacher_id=..&student_id=..`
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// 쉼표로 구분한 장소 id 목록
    pub location_id: Option<String>,
    /// 강사 본인의 달력
    pub teacher_id: Option<String>,
    /// 학생 본인의 달력
    pub student_id: Option<String>,
}
