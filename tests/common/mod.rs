//! 통합 테스트 공용 픽스처
//!
//! 테스트마다 실제 마이그레이션을 적용한 인메모리 SQLite DB를 새로 만들고
//! 아래 데이터를 넣어 둡니다:
//!
//! - 강사 `t1` (Ada Lovelace): 월~금 09:00 - 17:00
//! - 강사 `t2` (Alan Turing): 월요일만 09:00 - 12:00
//! - 학생 `s1` (Sam Park), `s2` (Mina Kim): 매일 가능, 잔여 수업 10회
//! - 학생 `s3` (Jo Weekend): 토, 일요일만
//! - 장소 `loc1`, 수업 유형 `st1`

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::{Arc, Mutex};
use tutorly::error::AppError;
use tutorly::models::{CreateClassSessionRequest, SessionInstance, UpdateClassSessionRequest, UpdateWindowRequest};
use tutorly::scheduling::ScheduleRules;
use tutorly::services::{EventBus, Notifier, Scheduler};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub user_ids: Vec<String>,
    pub title: String,
    pub message: String,
    pub event_type: String,
}

/// 보낸 알림을 메모리에 모아 두는 알림기
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user_ids: &[String], title: &str, message: &str, event_type: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentNotification {
            user_ids: user_ids.to_vec(),
            title: title.to_string(),
            message: message.to_string(),
            event_type: event_type.to_string(),
        });
        Ok(())
    }
}

/// 항상 실패하는 알림기 (푸시 서버 장애 상황)
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _: &[String], _: &str, _: &str, _: &str) -> Result<(), AppError> {
        Err(AppError::Internal("notification backend is down".to_string()))
    }
}

pub struct TestApp {
    pub pool: SqlitePool,
    pub scheduler: Scheduler,
    pub notifier: Arc<RecordingNotifier>,
    pub events: EventBus,
}

pub async fn test_pool() -> SqlitePool {
    // 연결이 하나뿐이어야 테스트 내내 같은 인메모리 DB가 유지됨
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    seed(&pool).await;
    pool
}

pub async fn test_app() -> TestApp {
    let pool = test_pool().await;
    let notifier = Arc::new(RecordingNotifier::default());
    let events = EventBus::new(64);
    let scheduler = Scheduler::new(pool.clone(), notifier.clone(), events.clone(), ScheduleRules::default());
    TestApp {
        pool,
        scheduler,
        notifier,
        events,
    }
}

pub async fn test_app_with(notifier: Arc<dyn Notifier>) -> Scheduler {
    let pool = test_pool().await;
    Scheduler::new(pool, notifier, EventBus::default(), ScheduleRules::default())
}

async fn exec(pool: &SqlitePool, sql: &str) {
    sqlx::query(sql).execute(pool).await.unwrap();
}

async fn seed(pool: &SqlitePool) {
    exec(
        pool,
        r#"
        INSERT INTO users (id, first_name, last_name) VALUES
            ('u-t1', 'Ada', 'Lovelace'),
            ('u-t2', 'Alan', 'Turing'),
            ('u-s1', 'Sam', 'Park'),
            ('u-s2', 'Mina', 'Kim'),
            ('u-s3', 'Jo', 'Weekend')
        "#,
    )
    .await;
    exec(pool, "INSERT INTO teachers (id, user_id) VALUES ('t1', 'u-t1'), ('t2', 'u-t2')").await;
    exec(
        pool,
        r#"
        INSERT INTO teacher_availabilities (id, teacher_id, day_of_week, start_time, end_time) VALUES
            ('a1', 't1', 'Monday', '09:00', '17:00'),
            ('a2', 't1', 'Tuesday', '09:00', '17:00'),
            ('a3', 't1', 'Wednesday', '09:00', '17:00'),
            ('a4', 't1', 'Thursday', '09:00', '17:00'),
            ('a5', 't1', 'Friday', '09:00', '17:00'),
            ('a6', 't2', 'Monday', '09:00', '12:00')
        "#,
    )
    .await;
    exec(
        pool,
        r#"
        INSERT INTO students (id, user_id, available_dates, session_balance) VALUES
            ('s1', 'u-s1', '1111111', 10),
            ('s2', 'u-s2', '1111111', 10),
            ('s3', 'u-s3', '0000011', 10)
        "#,
    )
    .await;
    exec(pool, "INSERT INTO locations (id, name) VALUES ('loc1', 'Main Campus')").await;
    exec(pool, "INSERT INTO session_types (id, name) VALUES ('st1', 'Private Lesson')").await;
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// 대부분의 테스트에서 쓰는 "오늘": 2024년 1월 수업보다 한참 전
pub fn early_today() -> NaiveDate {
    date("2023-12-01")
}

pub fn attributes() -> Value {
    json!({
        "teacher_id": "t1",
        "location_id": "loc1",
        "room": "A1",
        "session_type_id": "st1",
        "student_ids": ["s1"]
    })
}

fn merge(mut base: Value, extra: Value) -> Value {
    if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
        base.extend(extra);
    }
    base
}

pub fn create_request(body: Value) -> CreateClassSessionRequest {
    serde_json::from_value(merge(attributes(), body)).unwrap()
}

pub fn update_request(body: Value) -> UpdateClassSessionRequest {
    serde_json::from_value(merge(attributes(), body)).unwrap()
}

pub fn window_request(body: Value) -> UpdateWindowRequest {
    serde_json::from_value(merge(attributes(), body)).unwrap()
}

/// 2024년 1월 매주 월요일 10:00, 60분
pub fn january_mondays() -> Value {
    json!({
        "recurrence_kind": "weekly",
        "start_date": "2024-01-01",
        "end_date": "2024-01-31",
        "schedule": { "MO": { "start_time": "10:00", "duration_minutes": 60 } },
        "topic": "Algebra"
    })
}

pub async fn create_january_mondays(app: &TestApp) -> String {
    let created = app
        .scheduler
        .create_class_session(create_request(january_mondays()))
        .await
        .unwrap();
    assert_eq!(created.instance_count, 5);
    created.class_session_id
}

pub async fn instances_of(scheduler: &Scheduler, class_session_id: &str) -> Vec<SessionInstance> {
    scheduler.get_class_session(class_session_id).await.unwrap().instances
}

pub fn dates_of(instances: &[SessionInstance]) -> Vec<String> {
    instances.iter().map(|i| i.date.to_string()).collect()
}

pub fn on(instances: &[SessionInstance], day: &str) -> SessionInstance {
    instances
        .iter()
        .find(|i| i.date == date(day))
        .cloned()
        .unwrap_or_else(|| panic!("no instance on {}", day))
}

pub async fn count(pool: &SqlitePool, sql: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(sql).fetch_one(pool).await.unwrap();
    n
}

pub async fn balance(pool: &SqlitePool, student_id: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as("SELECT session_balance FROM students WHERE id = ?")
        .bind(student_id)
        .fetch_one(pool)
        .await
        .unwrap();
    n
}
