//! # 일정 이벤트 채널
//!
//! 출결 변경, 보고서 제출, 수업 변경 같은 사실을 관심 있는 구독자에게 알립니다.
//! 전역 싱글톤이 아니라 `AppState`가 소유하고, 구독자는 `subscribe()`로 직접 받아 갑니다.
//! 이벤트 이름은 닫힌 열거형(`ScheduleEvent`)으로만 표현합니다.

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScheduleEvent {
    AbsenceUpdated {
        instance_id: String,
        student_id: String,
    },
    ReportSubmitted {
        instance_id: String,
        student_id: String,
        all_reports_completed: bool,
    },
    ClassSessionChanged {
        class_session_id: String,
        removed: usize,
        updated: usize,
        inserted: usize,
    },
    InstancesToggled {
        instance_ids: Vec<String>,
        is_active: bool,
    },
    InstanceUpdated {
        instance_id: String,
        date: NaiveDate,
    },
}

/// `broadcast` 채널을 감싼 이벤트 버스. 복제(clone)해도 같은 채널을 가리킵니다.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ScheduleEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 구독자가 없으면 이벤트는 그냥 버려집니다.
    pub fn publish(&self, event: ScheduleEvent) {
        let receivers = self.sender.send(event).unwrap_or(0);
        tracing::trace!(receivers, "schedule event published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScheduleEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// 받은 이벤트를 로그로 남기는 구독자. `main`에서 백그라운드 태스크로 띄웁니다.
pub async fn log_events(mut receiver: broadcast::Receiver<ScheduleEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => tracing::info!(?event, "schedule event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event logger fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
