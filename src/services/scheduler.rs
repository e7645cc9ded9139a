//! # 일정 서비스
//!
//! 일정 엔진(`scheduling`)과 DB 계층(`db`)을 이어 붙이는 곳입니다.
//! 모든 변경 작업은 같은 순서를 따릅니다:
//!
//! 1. 요청 검증 (DB 접근 전)
//! 2. `pool.begin()`으로 트랜잭션 시작
//! 3. 필요한 데이터 읽기 → 엔진으로 계획 수립 → 계획 적용
//! 4. 커밋. 중간에 `?`로 빠져나가면 트랜잭션이 drop 되면서 자동으로 롤백됩니다.
//! 5. 커밋 후 알림 전송(실패해도 무시)과 이벤트 발행
//!
//! "오늘" 날짜는 호출하는 쪽(핸들러)이 정해서 넘깁니다.

use crate::db;
use crate::error::AppError;
use crate::models::*;
use crate::scheduling::calendar::{format_minutes, full_day_name, MINUTES_PER_DAY};
use crate::scheduling::materialize::{check_instance, materialize};
use crate::scheduling::reconcile::{self, ReconcileInput, ReconcilePlan, Target};
use crate::scheduling::overlap::has_overlap;
use crate::scheduling::recurrence::{validate_range, validate_schedule};
use crate::scheduling::reports::report_status;
use crate::scheduling::{ChangeLog, Directory, Participants, ScheduleError, ScheduleRules};
use crate::services::events::{EventBus, ScheduleEvent};
use crate::services::notifier::{self, notify_quietly, Notifier};
use chrono::{Datelike, NaiveDate};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

#[derive(Clone)]
pub struct Scheduler {
    pool: SqlitePool,
    notifier: Arc<dyn Notifier>,
    events: EventBus,
    rules: ScheduleRules,
}

/// 인스턴스들에 등장하는 강사/학생 id (알림 수신자 계산용)
fn people_of<'a>(instances: impl IntoIterator<Item = &'a SessionInstance>) -> (Vec<String>, Vec<String>) {
    let mut teachers = BTreeSet::new();
    let mut students = BTreeSet::new();
    for instance in instances {
        teachers.extend(instance.teacher_id.iter().cloned());
        students.extend(instance.student_ids.iter().cloned());
    }
    (teachers.into_iter().collect(), students.into_iter().collect())
}

fn distinct(ids: &[String]) -> Vec<String> {
    ids.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect()
}

fn topic_label(topic: Option<&str>) -> &str {
    match topic {
        Some(topic) if !topic.trim().is_empty() => topic,
        _ => "Unknown Topic",
    }
}

/// 강사와 학생을 읽어 검사용 `Participants`를 만듭니다. 없는 id는 404입니다.
async fn load_participants(
    conn: &mut SqliteConnection,
    teacher_id: Option<&str>,
    student_ids: &[String],
) -> Result<Participants, AppError> {
    let teacher = match teacher_id {
        Some(id) => Some(
            db::teacher_profile(conn, id)
                .await?
                .ok_or_else(|| AppError::not_found("Teacher", id))?,
        ),
        None => None,
    };

    let wanted = distinct(student_ids);
    let students = db::get_students(conn, &wanted).await?;
    if let Some(missing) = wanted.iter().find(|id| !students.iter().any(|s| &s.id == *id)) {
        return Err(AppError::not_found("Student", missing));
    }

    Ok(Participants { teacher, students })
}

/// 장소/수업 종류 id가 실제로 있는지 확인합니다.
async fn ensure_references(conn: &mut SqliteConnection, attributes: &SharedAttributes) -> Result<(), AppError> {
    if let Some(id) = attributes.location_id.as_deref() {
        if !db::location_exists(conn, id).await? {
            return Err(AppError::not_found("Location", id));
        }
    }
    if let Some(id) = attributes.session_type_id.as_deref() {
        if !db::session_type_exists(conn, id).await? {
            return Err(AppError::not_found("Session type", id));
        }
    }
    Ok(())
}

async fn apply_plan(conn: &mut SqliteConnection, plan: &ReconcilePlan) -> Result<(), AppError> {
    for instance in &plan.removed {
        db::soft_remove_instance(conn, &instance.id).await?;
    }
    for instance in &plan.updated {
        db::save_instance(conn, instance).await?;
    }
    for instance in &plan.inserted {
        db::insert_instance(conn, instance).await?;
    }
    Ok(())
}

/// 활성 상태를 바꾸고 학생 잔여 횟수를 맞춥니다.
/// 비활성화하면 학생마다 1회 돌려주고, 다시 활성화하면 1회 차감합니다.
async fn apply_activation(conn: &mut SqliteConnection, instance: &SessionInstance, is_active: bool) -> Result<(), AppError> {
    db::set_instance_active(conn, &instance.id, is_active).await?;
    let delta = if is_active { -1 } else { 1 };
    for student_id in &instance.student_ids {
        db::adjust_session_balance(conn, student_id, delta).await?;
    }
    Ok(())
}

/// 인스턴스별 보고서 작성 현황
async fn report_statuses(
    conn: &mut SqliteConnection,
    instances: &[SessionInstance],
) -> Result<HashMap<String, ReportStatus>, AppError> {
    let ids: Vec<String> = instances.iter().map(|i| i.id.clone()).collect();

    let mut absences: HashMap<String, HashMap<String, AbsenceStatus>> = HashMap::new();
    for absence in db::list_absences(conn, &ids).await? {
        let status = absence.status();
        absences
            .entry(absence.instance_id)
            .or_default()
            .insert(absence.student_id, status);
    }

    let mut reported: HashMap<String, HashSet<String>> = HashMap::new();
    for (instance_id, student_id) in db::report_pairs(conn, &ids).await? {
        reported.entry(instance_id).or_default().insert(student_id);
    }

    let empty_absences = HashMap::new();
    let empty_reports = HashSet::new();
    Ok(instances
        .iter()
        .map(|instance| {
            let status = report_status(
                &instance.student_ids,
                absences.get(&instance.id).unwrap_or(&empty_absences),
                reported.get(&instance.id).unwrap_or(&empty_reports),
            );
            (instance.id.clone(), status)
        })
        .collect())
}

/// 출결/보고서가 바뀐 뒤 `reports_submitted` 플래그를 다시 계산합니다.
async fn refresh_reports_flag(conn: &mut SqliteConnection, instance: &SessionInstance) -> Result<ReportStatus, AppError> {
    let statuses = report_statuses(conn, std::slice::from_ref(instance)).await?;
    let status = statuses.get(&instance.id).cloned().unwrap_or_default();
    if status.all_reports_completed != instance.reports_submitted {
        db::set_reports_submitted(conn, &instance.id, status.all_reports_completed).await?;
    }
    Ok(status)
}

impl Scheduler {
    /// 알림기와 이벤트 채널은 `main`에서 만들어 넘깁니다. 테스트는 기록용 알림기를 끼웁니다.
    pub fn new(pool: SqlitePool, notifier: Arc<dyn Notifier>, events: EventBus, rules: ScheduleRules) -> Self {
        Self {
            pool,
            notifier,
            events,
            rules,
        }
    }

    /// 라우트의 단순 조회(가용 시간, 헬스 체크)가 같은 풀을 씁니다.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// 반복 정의로 새 수업을 만들고 모든 인스턴스를 한 번에 저장합니다.
    pub async fn create_class_session(&self, req: CreateClassSessionRequest) -> Result<ClassSessionCreated, AppError> {
        req.definition.validate(&self.rules)?;
        let definition = &req.definition;
        let attributes = &req.attributes;

        let mut tx = self.pool.begin().await?;

        ensure_references(&mut tx, attributes).await?;
        let participants = load_participants(&mut tx, attributes.teacher_id.as_deref(), &attributes.student_ids).await?;
        let busy = match attributes.teacher_id.as_deref() {
            Some(teacher_id) => {
                db::busy_for_teacher(&mut tx, teacher_id, definition.start_date, definition.end_date, None).await?
            }
            None => Vec::new(),
        };

        let class_session_id = uuid::Uuid::now_v7().to_string();
        let drafts = materialize(&class_session_id, definition, attributes, &participants, &busy).map_err(|e| {
            tracing::warn!(error = %e, "class session batch rejected");
            e
        })?;

        db::insert_class_session(
            &mut tx,
            &class_session_id,
            definition,
            req.topic.as_deref(),
            req.is_holiday_course,
        )
        .await?;
        for draft in &drafts {
            db::insert_instance(&mut tx, draft).await?;
        }

        // 잔여 횟수는 인스턴스 수와 상관없이 학생마다 한 번만 차감합니다
        let students = distinct(&attributes.student_ids);
        for student_id in &students {
            db::adjust_session_balance(&mut tx, student_id, -1).await?;
        }

        let recipients = db::user_ids_for(
            &mut tx,
            &attributes.teacher_id.iter().cloned().collect::<Vec<_>>(),
            &students,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            class_session_id = %class_session_id,
            instances = drafts.len(),
            kind = %definition.recurrence_kind,
            "class session created"
        );

        let topic = topic_label(req.topic.as_deref());
        notify_quietly(
            self.notifier.as_ref(),
            &recipients,
            &format!("New Class Session: {}", topic),
            &format!("You have been added to the class session \"{}\".", topic),
            notifier::CLASS_SESSION_CREATED,
        )
        .await;
        self.events.publish(ScheduleEvent::ClassSessionChanged {
            class_session_id: class_session_id.clone(),
            removed: 0,
            updated: 0,
            inserted: drafts.len(),
        });

        Ok(ClassSessionCreated {
            class_session_id,
            instance_count: drafts.len(),
        })
    }

    /// 저장된 반복 정의와 살아 있는 인스턴스 (날짜순).
    pub async fn get_class_session(&self, id: &str) -> Result<ClassSessionDetail, AppError> {
        let mut conn = self.pool.acquire().await?;
        let class_session = db::get_class_session(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("Class session", id))?;
        let instances = db::list_for_class_session(&mut conn, id).await?;
        Ok(ClassSessionDetail {
            class_session,
            instances,
        })
    }

    /// 수업 전체를 새 반복 정의로 교체합니다.
    pub async fn update_class_session(
        &self,
        id: &str,
        req: UpdateClassSessionRequest,
        today: NaiveDate,
    ) -> Result<ClassSessionUpdated, AppError> {
        req.definition.validate(&self.rules)?;
        let next = &req.definition;
        let attributes = &req.attributes;

        let mut tx = self.pool.begin().await?;

        let class_session = db::get_class_session(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Class session", id))?;
        let previous = class_session.definition();

        ensure_references(&mut tx, attributes).await?;
        let existing = db::list_for_class_session(&mut tx, id).await?;
        let existing_ids: Vec<String> = existing.iter().map(|i| i.id.clone()).collect();
        let reported = db::reported_instance_ids(&mut tx, &existing_ids).await?;
        let participants = load_participants(&mut tx, attributes.teacher_id.as_deref(), &attributes.student_ids).await?;
        let busy = match attributes.teacher_id.as_deref() {
            Some(teacher_id) => db::busy_for_teacher(&mut tx, teacher_id, next.start_date, next.end_date, Some(id)).await?,
            None => Vec::new(),
        };
        let directory = self.directory_for(&mut tx, &existing, attributes).await?;

        let plan = reconcile::plan(&ReconcileInput {
            class_session_id: id,
            existing: &existing,
            reported: &reported,
            target: Target::Definition {
                previous: &previous,
                next,
            },
            attributes,
            participants: &participants,
            busy: &busy,
            directory: &directory,
            today,
        })
        .map_err(|e| {
            tracing::warn!(class_session_id = id, error = %e, "class session update rejected");
            e
        })?;

        let topic = req.topic.clone().or_else(|| class_session.topic.clone());
        let is_holiday_course = req.is_holiday_course.unwrap_or(class_session.is_holiday_course);

        let mut changes = ChangeLog::new();
        if is_holiday_course != class_session.is_holiday_course {
            changes.push(format!(
                "Holiday course status updated to \"{}\"",
                if is_holiday_course { "Yes" } else { "No" }
            ));
        }
        if topic != class_session.topic {
            changes.push(format!("Topic updated to \"{}\"", topic.as_deref().unwrap_or_default()));
        }
        changes.extend(plan.changes.clone());

        apply_plan(&mut tx, &plan).await?;
        db::update_class_session(&mut tx, id, next, topic.as_deref(), is_holiday_course).await?;

        let recipients = self
            .recipients(&mut tx, existing.iter().chain(&plan.inserted).chain(&plan.updated))
            .await?;

        tx.commit().await?;

        tracing::info!(
            class_session_id = id,
            removed = plan.removed.len(),
            updated = plan.updated.len(),
            inserted = plan.inserted.len(),
            changes = changes.len(),
            "class session reconciled"
        );

        self.finish_reconcile(id, topic.as_deref(), &plan, changes, recipients).await
    }

    /// `[from, to]` 구간의 인스턴스만 새 요일 일정에 맞춥니다.
    pub async fn update_class_session_window(
        &self,
        id: &str,
        req: UpdateWindowRequest,
        today: NaiveDate,
    ) -> Result<ClassSessionUpdated, AppError> {
        validate_range(req.from, req.to, &self.rules)?;
        validate_schedule(&req.schedule, &self.rules)?;
        let attributes = &req.attributes;

        let mut tx = self.pool.begin().await?;

        let class_session = db::get_class_session(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Class session", id))?;

        ensure_references(&mut tx, attributes).await?;
        let existing = db::list_for_class_session(&mut tx, id).await?;
        let existing_ids: Vec<String> = existing.iter().map(|i| i.id.clone()).collect();
        let reported = db::reported_instance_ids(&mut tx, &existing_ids).await?;
        let participants = load_participants(&mut tx, attributes.teacher_id.as_deref(), &attributes.student_ids).await?;
        let busy = match attributes.teacher_id.as_deref() {
            Some(teacher_id) => db::busy_for_teacher(&mut tx, teacher_id, req.from, req.to, Some(id)).await?,
            None => Vec::new(),
        };
        let directory = self.directory_for(&mut tx, &existing, attributes).await?;

        let plan = reconcile::plan(&ReconcileInput {
            class_session_id: id,
            existing: &existing,
            reported: &reported,
            target: Target::Window {
                from: req.from,
                to: req.to,
                schedule: &req.schedule,
            },
            attributes,
            participants: &participants,
            busy: &busy,
            directory: &directory,
            today,
        })
        .map_err(|e| {
            tracing::warn!(class_session_id = id, error = %e, "window update rejected");
            e
        })?;

        apply_plan(&mut tx, &plan).await?;
        db::extend_end_date(&mut tx, id, req.to).await?;

        let window: Vec<&SessionInstance> = existing
            .iter()
            .filter(|i| req.from <= i.date && i.date <= req.to)
            .chain(&plan.inserted)
            .chain(&plan.updated)
            .collect();
        let recipients = self.recipients(&mut tx, window).await?;

        tx.commit().await?;

        tracing::info!(
            class_session_id = id,
            from = %req.from,
            to = %req.to,
            removed = plan.removed.len(),
            updated = plan.updated.len(),
            inserted = plan.inserted.len(),
            "class session window reconciled"
        );

        let changes = plan.changes.clone();
        self.finish_reconcile(id, class_session.topic.as_deref(), &plan, changes, recipients)
            .await
    }

    async fn directory_for(
        &self,
        conn: &mut SqliteConnection,
        existing: &[SessionInstance],
        attributes: &SharedAttributes,
    ) -> Result<Directory, AppError> {
        let mut teachers: BTreeSet<String> = existing.iter().filter_map(|i| i.teacher_id.clone()).collect();
        let mut locations: BTreeSet<String> = existing.iter().filter_map(|i| i.location_id.clone()).collect();
        let mut session_types: BTreeSet<String> = existing.iter().filter_map(|i| i.session_type_id.clone()).collect();
        teachers.extend(attributes.teacher_id.iter().cloned());
        locations.extend(attributes.location_id.iter().cloned());
        session_types.extend(attributes.session_type_id.iter().cloned());

        let to_vec = |set: BTreeSet<String>| set.into_iter().collect::<Vec<_>>();
        db::load_directory(
            conn,
            &to_vec(teachers),
            &distinct(&attributes.student_ids),
            &to_vec(locations),
            &to_vec(session_types),
        )
        .await
    }

    async fn recipients<'a>(
        &self,
        conn: &mut SqliteConnection,
        instances: impl IntoIterator<Item = &'a SessionInstance>,
    ) -> Result<Vec<String>, AppError> {
        let (teachers, students) = people_of(instances);
        db::user_ids_for(conn, &teachers, &students).await
    }

    async fn finish_reconcile(
        &self,
        id: &str,
        topic: Option<&str>,
        plan: &ReconcilePlan,
        changes: ChangeLog,
        recipients: Vec<String>,
    ) -> Result<ClassSessionUpdated, AppError> {
        if !changes.is_empty() {
            notify_quietly(
                self.notifier.as_ref(),
                &recipients,
                &format!("Class Session Updated: {}", topic_label(topic)),
                &changes.to_message(),
                notifier::CLASS_SESSION_UPDATE,
            )
            .await;
        }
        self.events.publish(ScheduleEvent::ClassSessionChanged {
            class_session_id: id.to_string(),
            removed: plan.removed.len(),
            updated: plan.updated.len(),
            inserted: plan.inserted.len(),
        });

        Ok(ClassSessionUpdated {
            class_session_id: id.to_string(),
            changes: changes.into_vec(),
            removed: plan.removed.len(),
            updated: plan.updated.len(),
            inserted: plan.inserted.len(),
        })
    }

    /// 인스턴스 활성 상태를 바꿉니다. 조정 엔진을 거치지 않습니다.
    pub async fn toggle_activation(&self, req: ToggleActivationRequest) -> Result<ToggleActivationResult, AppError> {
        let ids = distinct(&req.instance_ids);
        if ids.is_empty() {
            return Err(AppError::BadRequest("instance_ids must not be empty".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let instances = db::get_instances(&mut tx, &ids).await?;
        if let Some(missing) = ids.iter().find(|id| !instances.iter().any(|i| &i.id == *id)) {
            return Err(AppError::not_found("Session instance", missing));
        }

        let changed: Vec<&SessionInstance> = instances.iter().filter(|i| i.is_active != req.is_active).collect();
        for instance in &changed {
            apply_activation(&mut tx, instance, req.is_active).await?;
        }

        // 비활성화 알림은 수업별로 한 번씩
        let mut cancellations = Vec::new();
        if !req.is_active {
            let mut by_session: HashMap<&str, Vec<&SessionInstance>> = HashMap::new();
            for instance in &changed {
                by_session.entry(instance.class_session_id.as_str()).or_default().push(instance);
            }
            for (class_session_id, group) in by_session {
                let topic = db::get_class_session(&mut tx, class_session_id)
                    .await?
                    .and_then(|session| session.topic);
                let recipients = self.recipients(&mut tx, group.iter().copied()).await?;
                cancellations.push((topic, recipients));
            }
        }

        tx.commit().await?;

        tracing::info!(changed = changed.len(), is_active = req.is_active, "instances toggled");

        for (topic, recipients) in cancellations {
            notify_quietly(
                self.notifier.as_ref(),
                &recipients,
                "Class Session Canceled",
                &format!("The class session \"{}\" has been canceled.", topic_label(topic.as_deref())),
                notifier::CLASS_SESSION_DEACTIVATION,
            )
            .await;
        }
        self.events.publish(ScheduleEvent::InstancesToggled {
            instance_ids: changed.iter().map(|i| i.id.clone()).collect(),
            is_active: req.is_active,
        });

        Ok(ToggleActivationResult {
            changed: changed.len(),
            is_active: req.is_active,
        })
    }

    /// 달력 구간 조회. 각 항목에 겹침 경고와 보고서 현황을 붙입니다.
    ///
    /// 장소/강사/학생 조건으로 좁힐 수 있고, 겹침 경고는 조회된 항목끼리만 비교합니다.
    pub async fn list_calendar(&self, query: CalendarQuery) -> Result<Vec<CalendarEntry>, AppError> {
        if query.from > query.to {
            return Err(AppError::BadRequest(format!(
                "from ({}) must not be after to ({})",
                query.from, query.to
            )));
        }
        let non_empty = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let filter = db::CalendarFilter {
            location_ids: query
                .location_id
                .as_deref()
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            teacher_id: non_empty(query.teacher_id),
            student_id: non_empty(query.student_id),
        };

        let mut conn = self.pool.acquire().await?;
        let instances = db::list_between(&mut conn, query.from, query.to, &filter).await?;
        let mut statuses = report_statuses(&mut conn, &instances).await?;

        let entries = instances
            .iter()
            .map(|instance| CalendarEntry {
                instance: instance.clone(),
                end_time: format_minutes(instance.end_minutes()),
                has_overlap: has_overlap(instance, &instances),
                report_status: statuses.remove(&instance.id).unwrap_or_default(),
            })
            .collect();
        Ok(entries)
    }

    /// 인스턴스 하나만 고칩니다 (날짜, 시간, 강사, 학생 등).
    pub async fn update_session_instance(
        &self,
        id: &str,
        patch: InstancePatch,
        today: NaiveDate,
    ) -> Result<SessionInstance, AppError> {
        if let Some(duration) = patch.duration_minutes {
            if !self.rules.allowed_durations.contains(&duration) {
                return Err(ScheduleError::InvalidRecurrence(format!("duration {}m is not allowed", duration)).into());
            }
        }

        let mut tx = self.pool.begin().await?;

        let current = db::get_instance(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Session instance", id))?;

        let mut next = current.clone();
        if let Some(date) = patch.date {
            next.date = date;
        }
        if let Some(start_time) = patch.start_time {
            next.start_time = start_time;
        }
        if let Some(duration) = patch.duration_minutes {
            next.duration_minutes = duration;
        }
        if let Some(teacher_id) = patch.teacher_id.clone() {
            next.teacher_id = Some(teacher_id);
        }
        if let Some(student_ids) = patch.student_ids.clone() {
            next.student_ids = distinct(&student_ids);
        }
        if let Some(session_type_id) = patch.session_type_id.clone() {
            next.session_type_id = Some(session_type_id);
        }
        if let Some(room) = patch.room.clone() {
            next.room = Some(room);
        }
        if let Some(note) = patch.note.clone() {
            next.note = Some(note);
        }

        let moved = next.date != current.date;
        let retimed = moved
            || next.start_time != current.start_time
            || next.duration_minutes != current.duration_minutes
            || next.teacher_id != current.teacher_id
            || !current.same_students(&next.student_ids);
        let structural = retimed || next.session_type_id != current.session_type_id || next.room != current.room;

        if structural && current.date < today {
            return Err(ScheduleError::PastEdit { date: current.date }.into());
        }
        if moved && next.date < today {
            return Err(ScheduleError::PastEdit { date: next.date }.into());
        }
        if moved && !db::reported_instance_ids(&mut tx, &[current.id.clone()]).await?.is_empty() {
            return Err(ScheduleError::ReportExists { date: current.date }.into());
        }
        if next.end_minutes() > MINUTES_PER_DAY {
            return Err(ScheduleError::InvalidRecurrence(format!(
                "session starting at {} runs past midnight",
                next.start_time
            ))
            .into());
        }
        if let Some(session_type_id) = next.session_type_id.as_deref() {
            if !db::session_type_exists(&mut tx, session_type_id).await? {
                return Err(AppError::not_found("Session type", session_type_id));
            }
        }

        if retimed {
            let participants = load_participants(&mut tx, next.teacher_id.as_deref(), &next.student_ids).await?;
            let busy = match next.teacher_id.as_deref() {
                Some(teacher_id) => db::busy_for_teacher(&mut tx, teacher_id, next.date, next.date, None).await?,
                None => Vec::new(),
            };
            check_instance(&next, &participants, &busy).map_err(|e| {
                tracing::warn!(instance_id = id, error = %e, "instance update rejected");
                e
            })?;
        }

        let changes = self.describe_instance_edit(&mut tx, &current, &next).await?;

        db::save_instance(&mut tx, &next).await?;
        if let Some(is_active) = patch.is_active {
            if is_active != current.is_active {
                apply_activation(&mut tx, &next, is_active).await?;
                next.is_active = is_active;
            }
        }

        let recipients = self.recipients(&mut tx, [&current, &next]).await?;
        tx.commit().await?;

        tracing::info!(instance_id = id, changes = changes.len(), "session instance updated");

        if !changes.is_empty() {
            notify_quietly(
                self.notifier.as_ref(),
                &recipients,
                &format!("Session on {} Updated", current.date),
                &changes.to_message(),
                notifier::SESSION_UPDATE,
            )
            .await;
        }
        self.events.publish(ScheduleEvent::InstanceUpdated {
            instance_id: next.id.clone(),
            date: next.date,
        });

        Ok(next)
    }

    async fn describe_instance_edit(
        &self,
        conn: &mut SqliteConnection,
        current: &SessionInstance,
        next: &SessionInstance,
    ) -> Result<ChangeLog, AppError> {
        let teachers: Vec<String> = current.teacher_id.iter().chain(next.teacher_id.iter()).cloned().collect();
        let session_types: Vec<String> = current
            .session_type_id
            .iter()
            .chain(next.session_type_id.iter())
            .cloned()
            .collect();
        let directory = db::load_directory(conn, &teachers, &next.student_ids, &[], &session_types).await?;
        let day_name = full_day_name(next.date.weekday());

        let mut changes = ChangeLog::new();
        if current.date != next.date {
            changes.push(format!("Date updated from {} to {}", current.date, next.date));
        }
        if current.start_time != next.start_time {
            changes.push(format!(
                "Start time updated from {} to {} on {}",
                current.start_time, next.start_time, day_name
            ));
        }
        if current.duration_minutes != next.duration_minutes {
            changes.push(format!(
                "Duration updated from {}m to {}m on {}",
                current.duration_minutes, next.duration_minutes, day_name
            ));
        }
        if current.teacher_id != next.teacher_id {
            changes.push(format!(
                "Teacher updated from \"{}\" to \"{}\"",
                directory.label(current.teacher_id.as_deref()),
                directory.label(next.teacher_id.as_deref())
            ));
        }
        if current.session_type_id != next.session_type_id {
            changes.push(format!(
                "Session type updated from \"{}\" to \"{}\"",
                directory.label(current.session_type_id.as_deref()),
                directory.label(next.session_type_id.as_deref())
            ));
        }
        if current.room != next.room {
            changes.push(format!(
                "Room updated from \"{}\" to \"{}\"",
                current.room.as_deref().unwrap_or_default(),
                next.room.as_deref().unwrap_or_default()
            ));
        }
        if !current.same_students(&next.student_ids) {
            let names: Vec<String> = next.student_ids.iter().map(|s| directory.label(Some(s))).collect();
            changes.push(format!("Students updated to \"{}\"", names.join(", ")));
        }
        if current.note != next.note {
            changes.push("Note updated");
        }
        Ok(changes)
    }

    /// 학생 한 명의 출결 상태를 기록합니다.
    pub async fn record_absence(
        &self,
        instance_id: &str,
        student_id: &str,
        req: RecordAbsenceRequest,
    ) -> Result<Absence, AppError> {
        let mut tx = self.pool.begin().await?;

        let instance = db::get_instance(&mut tx, instance_id)
            .await?
            .ok_or_else(|| AppError::not_found("Session instance", instance_id))?;
        if !instance.student_ids.iter().any(|s| s == student_id) {
            return Err(AppError::BadRequest(format!(
                "Student {} is not part of the session on {}",
                student_id, instance.date
            )));
        }

        let absence = db::upsert_absence(&mut tx, instance_id, student_id, req.status, req.reason.as_deref()).await?;
        refresh_reports_flag(&mut tx, &instance).await?;

        tx.commit().await?;

        tracing::info!(instance_id, student_id, status = ?req.status, "absence recorded");
        self.events.publish(ScheduleEvent::AbsenceUpdated {
            instance_id: instance_id.to_string(),
            student_id: student_id.to_string(),
        });

        Ok(absence)
    }

    /// 학생 한 명의 수업 보고서를 저장합니다. 이후 이 인스턴스는 삭제할 수 없습니다.
    pub async fn submit_report(&self, instance_id: &str, req: SubmitReportRequest) -> Result<SessionReport, AppError> {
        let mut tx = self.pool.begin().await?;

        let instance = db::get_instance(&mut tx, instance_id)
            .await?
            .ok_or_else(|| AppError::not_found("Session instance", instance_id))?;
        if !instance.student_ids.iter().any(|s| s == &req.student_id) {
            return Err(AppError::BadRequest(format!(
                "Student {} is not part of the session on {}",
                req.student_id, instance.date
            )));
        }

        let report = db::insert_report(&mut tx, instance_id, &req).await?;
        let status = refresh_reports_flag(&mut tx, &instance).await?;
        let recipients = db::user_ids_for(&mut tx, &[], &[req.student_id.clone()]).await?;

        tx.commit().await?;

        tracing::info!(
            instance_id,
            student_id = %req.student_id,
            all_reports_completed = status.all_reports_completed,
            "session report submitted"
        );

        notify_quietly(
            self.notifier.as_ref(),
            &recipients,
            "New Session Report Added",
            &format!(
                "A new session report for the lesson \"{}\" has been added. Please check the details.",
                req.lesson_topic.as_deref().unwrap_or_default()
            ),
            notifier::SESSION_REPORT_ADDED,
        )
        .await;
        self.events.publish(ScheduleEvent::ReportSubmitted {
            instance_id: instance_id.to_string(),
            student_id: req.student_id.clone(),
            all_reports_completed: status.all_reports_completed,
        });

        Ok(report)
    }
}
