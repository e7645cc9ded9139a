//! # 결석 / 수업 보고서 모델
//!
//! - `Absence`: 학생별·인스턴스별 출결 기록. 상태는 세 가지(미확인 / 결석 / 출석)입니다.
//! - `SessionReport`: 학생별·인스턴스별 수업 보고서. 보고서가 하나라도 있으면
//!   그 인스턴스는 삭제할 수 없고, 날짜를 옮길 수도 없습니다.

use serde::{Deserialize, Serialize};

/// 출결 상태
///
/// DB에는 nullable 정수로 저장됩니다 (NULL = 미확인, 1 = 결석, 0 = 출석).
/// 엔진 안에서는 nullable bool 대신 이 열거형만 사용하여
/// "보고서 완료" 계산에서 모든 경우를 빠짐없이 처리하게 합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsenceStatus {
    Unconfirmed,
    Absent,
    Present,
}

impl From<Option<bool>> for AbsenceStatus {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => AbsenceStatus::Unconfirmed,
            Some(true) => AbsenceStatus::Absent,
            Some(false) => AbsenceStatus::Present,
        }
    }
}

impl From<AbsenceStatus> for Option<bool> {
    fn from(value: AbsenceStatus) -> Self {
        match value {
            AbsenceStatus::Unconfirmed => None,
            AbsenceStatus::Absent => Some(true),
            AbsenceStatus::Present => Some(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Absence {
    pub id: String,
    pub instance_id: String,
    pub student_id: String,
    pub status: Option<bool>,
    pub reason: Option<String>,
}

impl Absence {
    pub fn status(&self) -> AbsenceStatus {
        self.status.into()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SessionReport {
    pub id: String,
    pub instance_id: String,
    pub student_id: String,
    pub lesson_topic: Option<String>,
    pub covered_materials: Option<String>,
    pub learning_assessment: Option<String>,
    pub next_homework: Option<String>,
    pub tutor_remarks: Option<String>,
    pub created_at: String,
}

/// 출결 기록 요청: `PUT /api/v1/instances/{id}/absences/{student_id}`
#[derive(Debug, Clone, Deserialize)]
pub struct RecordAbsenceRequest {
    pub status: AbsenceStatus,
    pub reason: Option<String>,
}

/// 보고서 제출 요청: `POST /api/v1/instances/{id}/reports`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitReportRequest {
    pub student_id: String,
    pub lesson_topic: Option<String>,
    pub covered_materials: Option<String>,
    pub learning_assessment: Option<String>,
    pub next_homework: Option<String>,
    pub tutor_remarks: Option<String>,
}
