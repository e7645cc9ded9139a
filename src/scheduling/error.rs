use chrono::NaiveDate;
use thiserror::Error;

/// 일정 엔진이 거부하는 경우들.
///
/// 모두 입력이 같으면 같은 결과가 나오는 "영구적인" 거부이므로 재시도하지 않습니다.
/// HTTP 계층에서는 `AppError::Schedule`로 감싸져 상태 코드가 결정됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// 잘못된 날짜 범위, 빈 요일 일정, 허용되지 않는 수업 시간 등
    #[error("Invalid recurrence: {0}")]
    InvalidRecurrence(String),

    /// 강사 또는 학생이 해당 날짜/시간에 가용하지 않음
    #[error("{0}")]
    AvailabilityConflict(String),

    /// 같은 강사가 같은 날 겹치는 시간에 이미 다른 수업이 있음
    #[error("{0}")]
    DoubleBooking(String),

    /// 보고서가 작성된 인스턴스는 삭제할 수 없음
    #[error("Cannot remove session instance on {date} as it has associated reports")]
    ReportExists { date: NaiveDate },

    /// 이미 지난 인스턴스의 구조적 필드(시간, 강사, 날짜 등)는 바꿀 수 없음
    #[error("Cannot edit the session on {date}: it has already taken place")]
    PastEdit { date: NaiveDate },
}
