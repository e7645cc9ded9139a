//! # 일정 엔진
//!
//! DB나 HTTP를 모르는 순수 로직입니다. 필요한 데이터는 호출하는 쪽이 읽어서 넘기고,
//! "오늘" 날짜도 인자로 받습니다. 같은 입력이면 항상 같은 결과가 나옵니다.
//!
//! - `calendar`: 요일 코드, 벽시계 시각, 날짜 순회
//! - `availability`: 강사/학생 가용성 조회
//! - `recurrence`: 반복 정의 검증과 전개
//! - `materialize`: 전개 결과 → 인스턴스 초안 + 가용성/이중 예약 검사
//! - `reconcile`: 기존 인스턴스를 새 정의에 맞추는 계획 수립
//! - `overlap`: 강사 시간 겹침 검사
//! - `reports`: 보고서 작성 현황
//! - `changes`: 알림용 변경 설명
//! - `error`: 엔진 에러 종류

pub mod availability;
pub mod calendar;
pub mod changes;
pub mod error;
pub mod materialize;
pub mod overlap;
pub mod reconcile;
pub mod recurrence;
pub mod reports;

pub use changes::{ChangeLog, Directory};
pub use error::ScheduleError;
pub use materialize::{Participants, TeacherProfile};
pub use recurrence::ScheduleRules;
