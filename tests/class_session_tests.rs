//! 수업 생성과 일정 조정 통합 테스트
//!
//! 테스트마다 별도의 인메모리 DB를 씁니다 (`common` 참고).

mod common;

use common::*;
use serde_json::json;
use tutorly::error::AppError;
use tutorly::scheduling::ScheduleError;
use tutorly::services::ScheduleEvent;

// =========================================================
// 생성
// =========================================================

#[tokio::test]
async fn test_weekly_creation_materializes_every_monday() {
    let app = test_app().await;
    let mut events = app.events.subscribe();

    let id = create_january_mondays(&app).await;

    let detail = app.scheduler.get_class_session(&id).await.unwrap();
    assert_eq!(
        dates_of(&detail.instances),
        vec!["2024-01-01", "2024-01-08", "2024-01-15", "2024-01-22", "2024-01-29"]
    );
    assert!(detail.instances.iter().all(|i| i.start_time.to_string() == "10:00"));
    assert!(detail.instances.iter().all(|i| i.student_ids == vec!["s1".to_string()]));
    assert_eq!(detail.class_session.topic.as_deref(), Some("Algebra"));
    assert_eq!(detail.class_session.definition().schedule.len(), 1);

    // 인스턴스마다가 아니라 학생마다 한 번 차감
    assert_eq!(balance(&app.pool, "s1").await, 9);

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "New Class Session: Algebra");
    assert_eq!(sent[0].message, "You have been added to the class session \"Algebra\".");
    assert_eq!(sent[0].event_type, "class-session");
    assert!(sent[0].user_ids.contains(&"u-t1".to_string()));
    assert!(sent[0].user_ids.contains(&"u-s1".to_string()));

    let event = events.recv().await.unwrap();
    assert_eq!(
        event,
        ScheduleEvent::ClassSessionChanged {
            class_session_id: id,
            removed: 0,
            updated: 0,
            inserted: 5,
        }
    );
}

#[tokio::test]
async fn test_custom_recurrence_covers_each_listed_day() {
    let app = test_app().await;
    let created = app
        .scheduler
        .create_class_session(create_request(json!({
            "recurrence_kind": "custom",
            "start_date": "2024-01-01",
            "end_date": "2024-01-14",
            "schedule": {
                "MO": { "start_time": "10:00", "duration_minutes": 60 },
                "WE": { "start_time": "14:00", "duration_minutes": 90 }
            }
        })))
        .await
        .unwrap();

    assert_eq!(created.instance_count, 4);
    let instances = instances_of(&app.scheduler, &created.class_session_id).await;
    let wednesday = on(&instances, "2024-01-03");
    assert_eq!(wednesday.start_time.to_string(), "14:00");
    assert_eq!(wednesday.duration_minutes, 90);
}

#[tokio::test]
async fn test_teacher_outside_availability_rejects_whole_batch() {
    let app = test_app().await;

    let err = app
        .scheduler
        .create_class_session(create_request(json!({
            "recurrence_kind": "weekly",
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
            "schedule": { "TU": { "start_time": "16:30", "duration_minutes": 60 } }
        })))
        .await
        .unwrap_err();

    match err {
        AppError::Schedule(ScheduleError::AvailabilityConflict(message)) => {
            assert!(message.contains("Ada Lovelace"), "{}", message);
            assert!(message.contains("Tuesday"), "{}", message);
        }
        other => panic!("expected an availability conflict, got {:?}", other),
    }

    assert_eq!(count(&app.pool, "SELECT COUNT(*) FROM class_sessions").await, 0);
    assert_eq!(count(&app.pool, "SELECT COUNT(*) FROM class_session_instances").await, 0);
    assert_eq!(balance(&app.pool, "s1").await, 10);
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_student_unavailable_weekday_is_rejected() {
    let app = test_app().await;

    let mut body = january_mondays();
    body["student_ids"] = json!(["s1", "s3"]);
    let err = app
        .scheduler
        .create_class_session(create_request(body))
        .await
        .unwrap_err();

    match err {
        AppError::Schedule(ScheduleError::AvailabilityConflict(message)) => {
            assert!(message.starts_with("The following students are not available"), "{}", message);
            assert!(message.contains("Jo Weekend"), "{}", message);
            assert!(!message.contains("Sam Park"), "{}", message);
        }
        other => panic!("expected an availability conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_double_booking_keeps_database_unchanged() {
    let app = test_app().await;
    create_january_mondays(&app).await;

    let err = app
        .scheduler
        .create_class_session(create_request(json!({
            "recurrence_kind": "weekly",
            "start_date": "2024-01-08",
            "end_date": "2024-01-31",
            "schedule": { "MO": { "start_time": "10:30", "duration_minutes": 60 } }
        })))
        .await
        .unwrap_err();

    assert!(
        matches!(err, AppError::Schedule(ScheduleError::DoubleBooking(_))),
        "{:?}",
        err
    );
    assert_eq!(count(&app.pool, "SELECT COUNT(*) FROM class_sessions").await, 1);
    assert_eq!(count(&app.pool, "SELECT COUNT(*) FROM class_session_instances").await, 5);
}

#[tokio::test]
async fn test_back_to_back_sessions_do_not_conflict() {
    let app = test_app().await;
    create_january_mondays(&app).await;

    let created = app
        .scheduler
        .create_class_session(create_request(json!({
            "recurrence_kind": "weekly",
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
            "schedule": { "MO": { "start_time": "11:00", "duration_minutes": 60 } }
        })))
        .await
        .unwrap();

    assert_eq!(created.instance_count, 5);
}

#[tokio::test]
async fn test_invalid_definitions_are_rejected_before_touching_the_database() {
    let app = test_app().await;

    let cases = [
        json!({
            "recurrence_kind": "weekly",
            "start_date": "2024-01-31",
            "end_date": "2024-01-01",
            "schedule": { "MO": { "start_time": "10:00", "duration_minutes": 60 } }
        }),
        json!({
            "recurrence_kind": "weekly",
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
            "schedule": { "MO": { "start_time": "10:00", "duration_minutes": 50 } }
        }),
        json!({
            "recurrence_kind": "custom",
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
            "schedule": {}
        }),
        json!({
            "recurrence_kind": "weekly",
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
            "schedule": {
                "MO": { "start_time": "10:00", "duration_minutes": 60 },
                "TU": { "start_time": "10:00", "duration_minutes": 60 }
            }
        }),
    ];

    for body in cases {
        let err = app
            .scheduler
            .create_class_session(create_request(body.clone()))
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::Schedule(ScheduleError::InvalidRecurrence(_))),
            "{} -> {:?}",
            body,
            err
        );
    }
    assert_eq!(count(&app.pool, "SELECT COUNT(*) FROM class_sessions").await, 0);
}

#[tokio::test]
async fn test_once_is_dated_at_start_date_even_on_another_weekday() {
    let app = test_app().await;

    // 2024-01-02는 화요일, 요일 코드는 월요일
    let created = app
        .scheduler
        .create_class_session(create_request(json!({
            "recurrence_kind": "once",
            "start_date": "2024-01-02",
            "end_date": "2024-01-02",
            "schedule": { "MO": { "start_time": "10:00", "duration_minutes": 60 } }
        })))
        .await
        .unwrap();

    assert_eq!(created.instance_count, 1);
    let instances = instances_of(&app.scheduler, &created.class_session_id).await;
    assert_eq!(dates_of(&instances), vec!["2024-01-02"]);
    assert_eq!(instances[0].start_time.to_string(), "10:00");
}

#[tokio::test]
async fn test_unknown_teacher_is_not_found() {
    let app = test_app().await;
    let mut body = january_mondays();
    body["teacher_id"] = json!("nobody");

    let err = app
        .scheduler
        .create_class_session(create_request(body))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{:?}", err);
}

// =========================================================
// 정의 전체 수정
// =========================================================

#[tokio::test]
async fn test_shrinking_range_removes_only_the_tail() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;
    app.notifier.clear();

    let mut body = january_mondays();
    body["end_date"] = json!("2024-01-15");
    let updated = app
        .scheduler
        .update_class_session(&id, update_request(body), early_today())
        .await
        .unwrap();

    assert_eq!(updated.removed, 2);
    assert_eq!(updated.updated, 0);
    assert_eq!(updated.inserted, 0);
    assert!(updated
        .changes
        .contains(&"Cancelled session(s) on 2024-01-22, 2024-01-29".to_string()));

    let detail = app.scheduler.get_class_session(&id).await.unwrap();
    assert_eq!(dates_of(&detail.instances), vec!["2024-01-01", "2024-01-08", "2024-01-15"]);
    assert_eq!(detail.class_session.end_date, date("2024-01-15"));

    // 모든 변경 사항이 알림 하나로 나감
    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Class Session Updated: Algebra");
    assert_eq!(sent[0].event_type, "class-session-update");
    assert!(sent[0]
        .message
        .starts_with("The class session has been updated. Changes are:\n- "));
    assert!(sent[0].message.contains("- Cancelled session(s) on 2024-01-22, 2024-01-29"));
}

#[tokio::test]
async fn test_report_blocks_removal_and_rolls_back() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;
    let instances = instances_of(&app.scheduler, &id).await;
    let reported = on(&instances, "2024-01-22");

    app.scheduler
        .submit_report(
            &reported.id,
            serde_json::from_value(json!({ "student_id": "s1", "lesson_topic": "Fractions" })).unwrap(),
        )
        .await
        .unwrap();

    let mut body = january_mondays();
    body["end_date"] = json!("2024-01-15");
    let err = app
        .scheduler
        .update_class_session(&id, update_request(body), early_today())
        .await
        .unwrap_err();

    match err {
        AppError::Schedule(ScheduleError::ReportExists { date: blocked }) => {
            assert_eq!(blocked, date("2024-01-22"));
        }
        other => panic!("expected report_exists, got {:?}", other),
    }

    let detail = app.scheduler.get_class_session(&id).await.unwrap();
    assert_eq!(detail.instances.len(), 5);
    assert_eq!(detail.class_session.end_date, date("2024-01-31"));
}

#[tokio::test]
async fn test_retiming_past_instances_is_refused() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;

    let mut body = january_mondays();
    body["schedule"] = json!({ "MO": { "start_time": "11:00", "duration_minutes": 60 } });
    let err = app
        .scheduler
        .update_class_session(&id, update_request(body), date("2024-01-10"))
        .await
        .unwrap_err();

    match err {
        AppError::Schedule(ScheduleError::PastEdit { date: past }) => assert_eq!(past, date("2024-01-01")),
        other => panic!("expected past_edit, got {:?}", other),
    }
    let instances = instances_of(&app.scheduler, &id).await;
    assert!(instances.iter().all(|i| i.start_time.to_string() == "10:00"));
}

#[tokio::test]
async fn test_moving_start_date_forward_drops_unreported_past_days() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;

    let mut body = january_mondays();
    body["start_date"] = json!("2024-01-15");
    let updated = app
        .scheduler
        .update_class_session(&id, update_request(body), date("2024-01-20"))
        .await
        .unwrap();

    assert_eq!(updated.removed, 2);
    assert!(updated
        .changes
        .contains(&"Cancelled session(s) on 2024-01-01, 2024-01-08".to_string()));

    let detail = app.scheduler.get_class_session(&id).await.unwrap();
    assert_eq!(dates_of(&detail.instances), vec!["2024-01-15", "2024-01-22", "2024-01-29"]);
    assert_eq!(detail.class_session.start_date, date("2024-01-15"));
    assert_eq!(
        count(&app.pool, "SELECT COUNT(*) FROM class_session_instances WHERE deleted_at IS NOT NULL").await,
        2
    );
}

#[tokio::test]
async fn test_reported_past_day_still_blocks_moving_start_date() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;
    let reported = on(&instances_of(&app.scheduler, &id).await, "2024-01-08");
    app.scheduler
        .submit_report(&reported.id, serde_json::from_value(json!({ "student_id": "s1" })).unwrap())
        .await
        .unwrap();

    let mut body = january_mondays();
    body["start_date"] = json!("2024-01-15");
    let err = app
        .scheduler
        .update_class_session(&id, update_request(body), date("2024-01-20"))
        .await
        .unwrap_err();

    match err {
        AppError::Schedule(ScheduleError::ReportExists { date: blocked }) => assert_eq!(blocked, date("2024-01-08")),
        other => panic!("expected report_exists, got {:?}", other),
    }
    assert_eq!(instances_of(&app.scheduler, &id).await.len(), 5);
}

#[tokio::test]
async fn test_note_only_change_reaches_past_instances() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;

    let mut body = january_mondays();
    body["note"] = json!("Bring the workbook");
    let updated = app
        .scheduler
        .update_class_session(&id, update_request(body), date("2024-01-10"))
        .await
        .unwrap();

    assert_eq!(updated.updated, 5);
    assert_eq!(updated.changes, vec!["Note updated".to_string()]);
    let instances = instances_of(&app.scheduler, &id).await;
    assert!(instances.iter().all(|i| i.note.as_deref() == Some("Bring the workbook")));
}

#[tokio::test]
async fn test_retiming_future_instances_records_one_change() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;

    let mut body = january_mondays();
    body["schedule"] = json!({ "MO": { "start_time": "11:00", "duration_minutes": 90 } });
    let updated = app
        .scheduler
        .update_class_session(&id, update_request(body), early_today())
        .await
        .unwrap();

    assert_eq!(updated.updated, 5);
    assert_eq!(
        updated.changes,
        vec![
            "Start time updated from 10:00 to 11:00 on Monday".to_string(),
            "Duration updated from 60m to 90m on Monday".to_string(),
        ]
    );
    let instances = instances_of(&app.scheduler, &id).await;
    assert!(instances
        .iter()
        .all(|i| i.start_time.to_string() == "11:00" && i.duration_minutes == 90));
}

#[tokio::test]
async fn test_retime_into_a_teachers_other_session_is_a_double_booking() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;
    app.scheduler
        .create_class_session(create_request(json!({
            "recurrence_kind": "once",
            "start_date": "2024-01-15",
            "end_date": "2024-01-15",
            "schedule": { "MO": { "start_time": "13:00", "duration_minutes": 60 } }
        })))
        .await
        .unwrap();

    let mut body = january_mondays();
    body["schedule"] = json!({ "MO": { "start_time": "12:30", "duration_minutes": 60 } });
    let err = app
        .scheduler
        .update_class_session(&id, update_request(body), early_today())
        .await
        .unwrap_err();

    assert!(
        matches!(err, AppError::Schedule(ScheduleError::DoubleBooking(_))),
        "{:?}",
        err
    );
}

#[tokio::test]
async fn test_changing_teacher_and_room_is_described() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;

    let mut body = january_mondays();
    body["teacher_id"] = json!("t2");
    body["room"] = json!("B2");
    let updated = app
        .scheduler
        .update_class_session(&id, update_request(body), early_today())
        .await
        .unwrap();

    assert!(updated
        .changes
        .contains(&"Teacher updated from \"Ada Lovelace\" to \"Alan Turing\"".to_string()));
    assert!(updated.changes.contains(&"Room updated from \"A1\" to \"B2\"".to_string()));
    let instances = instances_of(&app.scheduler, &id).await;
    assert!(instances.iter().all(|i| i.teacher_id.as_deref() == Some("t2")));
}

#[tokio::test]
async fn test_extending_range_inserts_new_dates() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;

    let mut body = january_mondays();
    body["end_date"] = json!("2024-02-12");
    let updated = app
        .scheduler
        .update_class_session(&id, update_request(body), early_today())
        .await
        .unwrap();

    assert_eq!(updated.inserted, 2);
    assert!(updated
        .changes
        .contains(&"Added 2 sessions between 2024-02-05 and 2024-02-12".to_string()));
    assert_eq!(instances_of(&app.scheduler, &id).await.len(), 7);
}

#[tokio::test]
async fn test_switching_to_once_keeps_one_instance() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;

    let updated = app
        .scheduler
        .update_class_session(
            &id,
            update_request(json!({
                "recurrence_kind": "once",
                "start_date": "2024-01-15",
                "end_date": "2024-01-15",
                "schedule": { "MO": { "start_time": "10:00", "duration_minutes": 60 } }
            })),
            early_today(),
        )
        .await
        .unwrap();

    assert_eq!(updated.removed, 4);
    assert!(updated
        .changes
        .contains(&"Recurrence pattern updated to \"once\"".to_string()));

    let detail = app.scheduler.get_class_session(&id).await.unwrap();
    assert_eq!(dates_of(&detail.instances), vec!["2024-01-15"]);
    assert_eq!(detail.class_session.recurrence_kind.as_str(), "once");
}

#[tokio::test]
async fn test_switching_to_once_searches_forward_for_the_day_code() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;

    // 생성과 달리, 수정으로 once가 될 때는 시작일(화요일)부터 월요일을 찾아 01-22에 남김
    let updated = app
        .scheduler
        .update_class_session(
            &id,
            update_request(json!({
                "recurrence_kind": "once",
                "start_date": "2024-01-16",
                "end_date": "2024-01-16",
                "schedule": { "MO": { "start_time": "10:00", "duration_minutes": 60 } }
            })),
            early_today(),
        )
        .await
        .unwrap();

    assert_eq!(updated.removed, 4);
    assert_eq!(updated.inserted, 0);
    let detail = app.scheduler.get_class_session(&id).await.unwrap();
    assert_eq!(dates_of(&detail.instances), vec!["2024-01-22"]);
    assert_eq!(detail.class_session.start_date, date("2024-01-16"));
}

#[tokio::test]
async fn test_report_on_another_day_blocks_switching_to_once() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;
    let reported = on(&instances_of(&app.scheduler, &id).await, "2024-01-22");
    app.scheduler
        .submit_report(&reported.id, serde_json::from_value(json!({ "student_id": "s1" })).unwrap())
        .await
        .unwrap();
    app.notifier.clear();

    let err = app
        .scheduler
        .update_class_session(
            &id,
            update_request(json!({
                "recurrence_kind": "once",
                "start_date": "2024-01-15",
                "end_date": "2024-01-15",
                "schedule": { "MO": { "start_time": "10:00", "duration_minutes": 60 } }
            })),
            date("2024-01-10"),
        )
        .await
        .unwrap_err();

    match err {
        AppError::Schedule(ScheduleError::ReportExists { date: blocked }) => assert_eq!(blocked, date("2024-01-22")),
        other => panic!("expected report_exists, got {:?}", other),
    }

    let detail = app.scheduler.get_class_session(&id).await.unwrap();
    assert_eq!(detail.instances.len(), 5);
    assert_eq!(detail.class_session.recurrence_kind.as_str(), "weekly");
    assert_eq!(detail.class_session.end_date, date("2024-01-31"));
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_topic_and_holiday_flag_changes_are_listed() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;

    let mut body = january_mondays();
    body["topic"] = json!("Geometry");
    body["is_holiday_course"] = json!(true);
    let updated = app
        .scheduler
        .update_class_session(&id, update_request(body), early_today())
        .await
        .unwrap();

    assert_eq!(
        updated.changes,
        vec![
            "Holiday course status updated to \"Yes\"".to_string(),
            "Topic updated to \"Geometry\"".to_string(),
        ]
    );
    let sent = app.notifier.sent();
    assert_eq!(sent.last().unwrap().title, "Class Session Updated: Geometry");
}

#[tokio::test]
async fn test_unchanged_definition_sends_nothing() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;
    app.notifier.clear();

    let updated = app
        .scheduler
        .update_class_session(&id, update_request(january_mondays()), early_today())
        .await
        .unwrap();

    assert!(updated.changes.is_empty());
    assert_eq!((updated.removed, updated.updated, updated.inserted), (0, 0, 0));
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_failed_notification_does_not_fail_the_update() {
    let scheduler = test_app_with(std::sync::Arc::new(FailingNotifier)).await;
    let created = scheduler
        .create_class_session(create_request(january_mondays()))
        .await
        .unwrap();

    let mut body = january_mondays();
    body["end_date"] = json!("2024-01-15");
    let updated = scheduler
        .update_class_session(&created.class_session_id, update_request(body), early_today())
        .await
        .unwrap();

    assert_eq!(updated.removed, 2);
}

// =========================================================
// 구간 수정
// =========================================================

#[tokio::test]
async fn test_window_update_moves_days_inside_the_window_only() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;

    let updated = app
        .scheduler
        .update_class_session_window(
            &id,
            window_request(json!({
                "from": "2024-01-15",
                "to": "2024-01-31",
                "schedule": { "WE": { "start_time": "10:00", "duration_minutes": 60 } }
            })),
            early_today(),
        )
        .await
        .unwrap();

    assert_eq!(updated.removed, 3);
    assert_eq!(updated.inserted, 3);
    let instances = instances_of(&app.scheduler, &id).await;
    assert_eq!(
        dates_of(&instances),
        vec!["2024-01-01", "2024-01-08", "2024-01-17", "2024-01-24", "2024-01-31"]
    );
}

#[tokio::test]
async fn test_window_past_the_end_date_extends_the_class_session() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;

    app.scheduler
        .update_class_session_window(
            &id,
            window_request(json!({
                "from": "2024-02-01",
                "to": "2024-02-14",
                "schedule": { "MO": { "start_time": "15:00", "duration_minutes": 45 } }
            })),
            early_today(),
        )
        .await
        .unwrap();

    let detail = app.scheduler.get_class_session(&id).await.unwrap();
    assert_eq!(detail.class_session.end_date, date("2024-02-14"));
    assert_eq!(detail.instances.len(), 7);
    let february = on(&detail.instances, "2024-02-05");
    assert_eq!(february.start_time.to_string(), "15:00");
    // 구간 밖은 그대로
    assert_eq!(on(&detail.instances, "2024-01-29").start_time.to_string(), "10:00");
}

#[tokio::test]
async fn test_window_range_is_validated() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;

    let err = app
        .scheduler
        .update_class_session_window(
            &id,
            window_request(json!({
                "from": "2024-01-31",
                "to": "2024-01-15",
                "schedule": { "MO": { "start_time": "10:00", "duration_minutes": 60 } }
            })),
            early_today(),
        )
        .await
        .unwrap_err();
    assert!(
        matches!(err, AppError::Schedule(ScheduleError::InvalidRecurrence(_))),
        "{:?}",
        err
    );
}

#[tokio::test]
async fn test_window_over_a_reported_day_is_rejected() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;
    let reported = on(&instances_of(&app.scheduler, &id).await, "2024-01-22");
    app.scheduler
        .submit_report(&reported.id, serde_json::from_value(json!({ "student_id": "s1" })).unwrap())
        .await
        .unwrap();

    let err = app
        .scheduler
        .update_class_session_window(
            &id,
            window_request(json!({
                "from": "2024-01-15",
                "to": "2024-01-31",
                "schedule": { "WE": { "start_time": "10:00", "duration_minutes": 60 } }
            })),
            date("2024-01-10"),
        )
        .await
        .unwrap_err();

    match err {
        AppError::Schedule(ScheduleError::ReportExists { date: blocked }) => assert_eq!(blocked, date("2024-01-22")),
        other => panic!("expected report_exists, got {:?}", other),
    }
    assert_eq!(
        dates_of(&instances_of(&app.scheduler, &id).await),
        vec!["2024-01-01", "2024-01-08", "2024-01-15", "2024-01-22", "2024-01-29"]
    );
}

#[tokio::test]
async fn test_window_retiming_a_past_day_is_refused() {
    let app = test_app().await;
    let id = create_january_mondays(&app).await;

    let err = app
        .scheduler
        .update_class_session_window(
            &id,
            window_request(json!({
                "from": "2024-01-01",
                "to": "2024-01-31",
                "schedule": { "MO": { "start_time": "11:00", "duration_minutes": 60 } }
            })),
            date("2024-01-10"),
        )
        .await
        .unwrap_err();

    match err {
        AppError::Schedule(ScheduleError::PastEdit { date: past }) => assert_eq!(past, date("2024-01-01")),
        other => panic!("expected past_edit, got {:?}", other),
    }
    let instances = instances_of(&app.scheduler, &id).await;
    assert!(instances.iter().all(|i| i.start_time.to_string() == "10:00"));
}
