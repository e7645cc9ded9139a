//! # 서비스 계층
//!
//! - `scheduler`: 트랜잭션 단위의 일정 작업 (생성, 조정, 토글, 출결, 보고서)
//! - `notifier`: 알림 전송 트레이트와 SQLite 구현
//! - `events`: 일정 이벤트 채널

pub mod events;
pub mod notifier;
pub mod scheduler;

pub use events::{EventBus, ScheduleEvent};
pub use notifier::{Notifier, SqliteNotifier};
pub use scheduler::Scheduler;
