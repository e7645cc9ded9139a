use crate::scheduling::calendar::WallTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Teacher {
    pub id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Teacher {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// 강사 가용 구간. `day_of_week`는 "Monday" 같은 요일 전체 이름입니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AvailabilityWindow {
    pub id: String,
    pub teacher_id: String,
    pub day_of_week: String,
    #[sqlx(try_from = "String")]
    pub start_time: WallTime,
    #[sqlx(try_from = "String")]
    pub end_time: WallTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    /// 월요일부터 시작하는 7자리 비트맵 (예: "1111100")
    pub available_dates: Option<String>,
    pub session_balance: i64,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityWindowInput {
    pub day_of_week: String,
    pub start_time: WallTime,
    pub end_time: WallTime,
}

/// 가용 시간 전체 교체 요청: `PUT /api/v1/teachers/{id}/availability`
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceAvailabilityRequest {
    pub windows: Vec<AvailabilityWindowInput>,
}
