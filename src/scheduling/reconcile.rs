//! # 일정 조정 (Reconciliation Engine)
//!
//! 이미 만들어진 인스턴스 집합을 새 반복 정의에 맞추기 위해
//! 무엇을 지우고(removed), 고치고(updated), 새로 만들지(inserted) 계산합니다.
//! 이 모듈은 계획만 세우고 DB는 건드리지 않습니다. 계획을 한 트랜잭션으로
//! 적용하는 것은 `services::scheduler`의 몫이며, 계획 단계에서 에러가 나면
//! 아무것도 적용되지 않습니다.
//!
//! ## 세 단계
//! 1. **삭제**: 새 정의가 더 이상 가리키지 않는 인스턴스. 보고서가 있으면 거부하고,
//!    보고서 없는 지난 인스턴스는 그대로 지웁니다.
//! 2. **수정**: 계속 남는 인스턴스의 시간/강사/장소/학생 등을 새 값으로. 지난 인스턴스는
//!    메모(note) 외에는 바꿀 수 없습니다.
//! 3. **추가**: 아직 인스턴스가 없는 날짜. 오늘 이전 날짜는 조용히 건너뜁니다.
//!
//! 시간 변경은 "이전 정의 vs 새 정의"를 요일별로 비교해서, 그 요일의 항목이 바뀐 경우에만
//! 적용합니다. 그래서 한 번만 따로 옮긴 인스턴스는 관련 없는 수정에 휩쓸리지 않습니다.
//!
//! `once`로 바뀌는 경우는 별도 경로입니다: 오늘 이후 인스턴스를 모두 지우고,
//! 시작일부터 앞으로 찾아 요일이 맞는 첫 날짜에 하나만 남깁니다.

use crate::models::{DaySchedule, DaySchedules, RecurrenceDefinition, RecurrenceKind, SessionInstance, SharedAttributes};
use crate::scheduling::calendar::{full_day_name, next_matching, DayCode};
use crate::scheduling::changes::{ChangeLog, Directory};
use crate::scheduling::error::ScheduleError;
use crate::scheduling::materialize::{check_instance, draft_instance, Participants};
use crate::scheduling::recurrence::{slots_between, Slot};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeSet, HashMap, HashSet};

/// 무엇에 맞출 것인가
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// 수업 전체를 새 정의로 교체
    Definition {
        previous: &'a RecurrenceDefinition,
        next: &'a RecurrenceDefinition,
    },
    /// `[from, to]` 안의 인스턴스만 새 요일 일정으로 교체
    Window {
        from: NaiveDate,
        to: NaiveDate,
        schedule: &'a DaySchedules,
    },
}

pub struct ReconcileInput<'a> {
    pub class_session_id: &'a str,
    /// 이 수업의 살아 있는(soft delete 되지 않은) 인스턴스들, 학생 목록 포함
    pub existing: &'a [SessionInstance],
    /// 보고서가 하나 이상 달린 인스턴스 id
    pub reported: &'a HashSet<String>,
    pub target: Target<'a>,
    pub attributes: &'a SharedAttributes,
    pub participants: &'a Participants,
    /// 같은 강사의 다른 수업 인스턴스 (이중 예약 검사용)
    pub busy: &'a [SessionInstance],
    pub directory: &'a Directory,
    pub today: NaiveDate,
}

#[derive(Debug, Default)]
pub struct ReconcilePlan {
    pub removed: Vec<SessionInstance>,
    pub updated: Vec<SessionInstance>,
    pub inserted: Vec<SessionInstance>,
    pub changes: ChangeLog,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.updated.is_empty() && self.inserted.is_empty()
    }
}

/// 한 인스턴스에 공유 속성을 적용한 결과
struct Edit {
    instance: SessionInstance,
    /// 메모 외의 필드가 바뀌었는지
    structural: bool,
    /// 가용성/이중 예약 검사를 다시 해야 하는지
    recheck: bool,
}

struct Planner<'i, 'a> {
    input: &'i ReconcileInput<'a>,
    plan: ReconcilePlan,
    recheck: HashSet<String>,
}

pub fn plan(input: &ReconcileInput<'_>) -> Result<ReconcilePlan, ScheduleError> {
    let mut planner = Planner {
        input,
        plan: ReconcilePlan::default(),
        recheck: HashSet::new(),
    };

    match input.target {
        Target::Definition { previous, next } => {
            planner.describe_definition(previous, next);
            if next.recurrence_kind == RecurrenceKind::Once {
                planner.once_transition(next)?;
            } else {
                let range = (next.start_date, next.end_date);
                planner.removal_pass(range, &next.schedule, true)?;
                planner.update_pass(range, &next.schedule, Some(&previous.schedule))?;
                planner.insertion_pass(range, &next.schedule);
            }
        }
        Target::Window { from, to, schedule } => {
            planner.removal_pass((from, to), schedule, false)?;
            planner.update_pass((from, to), schedule, None)?;
            planner.insertion_pass((from, to), schedule);
        }
    }

    planner.check_touched()?;
    planner.summarize();

    tracing::debug!(
        class_session_id = input.class_session_id,
        removed = planner.plan.removed.len(),
        updated = planner.plan.updated.len(),
        inserted = planner.plan.inserted.len(),
        "reconciliation planned"
    );

    Ok(planner.plan)
}

fn in_range(date: NaiveDate, (from, to): (NaiveDate, NaiveDate)) -> bool {
    from <= date && date <= to
}

fn quoted(value: Option<&str>) -> String {
    format!("\"{}\"", value.unwrap_or_default())
}

impl<'i, 'a> Planner<'i, 'a> {
    fn sorted_existing(&self) -> Vec<&'a SessionInstance> {
        let mut existing: Vec<&'a SessionInstance> = self.input.existing.iter().collect();
        existing.sort_by(|a, b| a.date.cmp(&b.date).then(a.start_time.cmp(&b.start_time)));
        existing
    }

    fn remove(&mut self, instance: &SessionInstance) -> Result<(), ScheduleError> {
        if self.input.reported.contains(&instance.id) {
            return Err(ScheduleError::ReportExists { date: instance.date });
        }
        self.plan.removed.push(instance.clone());
        Ok(())
    }

    fn describe_definition(&mut self, previous: &RecurrenceDefinition, next: &RecurrenceDefinition) {
        if previous.recurrence_kind != next.recurrence_kind {
            self.plan
                .changes
                .push(format!("Recurrence pattern updated to \"{}\"", next.recurrence_kind));
        }
        if previous.start_date != next.start_date || previous.end_date != next.end_date {
            self.plan.changes.push(format!(
                "Session date range updated from \"{}\" to \"{}\"",
                next.start_date.format("%a %b %d %Y"),
                next.end_date.format("%a %b %d %Y")
            ));
        }
    }

    /// 범위 밖이거나 요일이 빠진 인스턴스를 지웁니다.
    /// `whole`이면 수업의 모든 인스턴스가 대상이고, 아니면 범위 안의 인스턴스만 봅니다.
    fn removal_pass(
        &mut self,
        range: (NaiveDate, NaiveDate),
        schedule: &DaySchedules,
        whole: bool,
    ) -> Result<(), ScheduleError> {
        for instance in self.sorted_existing() {
            let inside = in_range(instance.date, range);
            if !whole && !inside {
                continue;
            }
            if inside && schedule.contains_key(&DayCode::of(instance.date)) {
                continue;
            }
            self.remove(instance)?;
        }
        Ok(())
    }

    /// 남는 인스턴스를 고칩니다. `previous`가 None이면 요일 일정의 시간을 무조건 적용합니다.
    fn update_pass(
        &mut self,
        range: (NaiveDate, NaiveDate),
        schedule: &DaySchedules,
        previous: Option<&DaySchedules>,
    ) -> Result<(), ScheduleError> {
        for instance in self.sorted_existing() {
            if !in_range(instance.date, range) {
                continue;
            }
            let code = DayCode::of(instance.date);
            let Some(entry) = schedule.get(&code) else {
                continue;
            };
            let retime = match previous {
                Some(previous) => previous.get(&code) != Some(entry),
                None => true,
            };
            self.update(instance, retime.then_some(*entry))?;
        }
        Ok(())
    }

    fn update(&mut self, instance: &SessionInstance, schedule: Option<DaySchedule>) -> Result<(), ScheduleError> {
        let Some(edit) = self.edit(instance, schedule) else {
            return Ok(());
        };
        if edit.structural && instance.date < self.input.today {
            return Err(ScheduleError::PastEdit { date: instance.date });
        }
        if edit.recheck {
            self.recheck.insert(edit.instance.id.clone());
        }
        self.plan.updated.push(edit.instance);
        Ok(())
    }

    /// 공유 속성(+ 필요하면 새 시간)을 적용하고 바뀐 항목을 기록합니다. 바뀐 게 없으면 None.
    fn edit(&mut self, instance: &SessionInstance, schedule: Option<DaySchedule>) -> Option<Edit> {
        let attributes = self.input.attributes;
        let directory = self.input.directory;
        let day_name = full_day_name(instance.date.weekday());
        let changes = &mut self.plan.changes;
        let mut next = instance.clone();
        let mut structural = false;
        let mut recheck = false;

        if let Some(entry) = schedule {
            if instance.start_time != entry.start_time {
                changes.push(format!(
                    "Start time updated from {} to {} on {}",
                    instance.start_time, entry.start_time, day_name
                ));
                next.start_time = entry.start_time;
                structural = true;
                recheck = true;
            }
            if instance.duration_minutes != entry.duration_minutes {
                changes.push(format!(
                    "Duration updated from {}m to {}m on {}",
                    instance.duration_minutes, entry.duration_minutes, day_name
                ));
                next.duration_minutes = entry.duration_minutes;
                structural = true;
                recheck = true;
            }
        }

        if instance.room != attributes.room {
            changes.push(format!(
                "Room updated from {} to {}",
                quoted(instance.room.as_deref()),
                quoted(attributes.room.as_deref())
            ));
            next.room = attributes.room.clone();
            structural = true;
        }

        if instance.teacher_id != attributes.teacher_id {
            changes.push(format!(
                "Teacher updated from \"{}\" to \"{}\"",
                directory.label(instance.teacher_id.as_deref()),
                directory.label(attributes.teacher_id.as_deref())
            ));
            next.teacher_id = attributes.teacher_id.clone();
            structural = true;
            recheck = true;
        }

        if instance.location_id != attributes.location_id {
            changes.push(format!(
                "Location updated from \"{}\" to \"{}\"",
                directory.label(instance.location_id.as_deref()),
                directory.label(attributes.location_id.as_deref())
            ));
            next.location_id = attributes.location_id.clone();
            structural = true;
        }

        if instance.session_type_id != attributes.session_type_id {
            changes.push(format!(
                "Session type updated from \"{}\" to \"{}\"",
                directory.label(instance.session_type_id.as_deref()),
                directory.label(attributes.session_type_id.as_deref())
            ));
            next.session_type_id = attributes.session_type_id.clone();
            structural = true;
        }

        if !instance.same_students(&attributes.student_ids) {
            let names: Vec<String> = attributes
                .student_ids
                .iter()
                .map(|id| directory.label(Some(id)))
                .collect();
            changes.push(format!("Students updated to \"{}\"", names.join(", ")));
            next.student_ids = attributes.student_ids.clone();
            structural = true;
            recheck = true;
        }

        let note_changed = instance.note != attributes.note;
        if note_changed {
            changes.push("Note updated");
            next.note = attributes.note.clone();
        }

        (structural || note_changed).then_some(Edit {
            instance: next,
            structural,
            recheck,
        })
    }

    /// 범위 안에서 아직 인스턴스가 없는 날짜를 채웁니다. 지난 날짜는 건너뜁니다.
    fn insertion_pass(&mut self, range: (NaiveDate, NaiveDate), schedule: &DaySchedules) {
        let removed: HashSet<&str> = self.plan.removed.iter().map(|i| i.id.as_str()).collect();
        let covered: BTreeSet<NaiveDate> = self
            .input
            .existing
            .iter()
            .filter(|instance| !removed.contains(instance.id.as_str()))
            .map(|instance| instance.date)
            .collect();

        for slot in slots_between(schedule, range.0, range.1) {
            if slot.date < self.input.today || covered.contains(&slot.date) {
                continue;
            }
            self.insert(slot);
        }
    }

    fn insert(&mut self, slot: Slot) {
        let draft = draft_instance(self.input.class_session_id, slot, self.input.attributes);
        self.recheck.insert(draft.id.clone());
        self.plan.inserted.push(draft);
    }

    fn once_transition(&mut self, next: &RecurrenceDefinition) -> Result<(), ScheduleError> {
        let (code, entry) = next.single_entry().ok_or_else(|| {
            ScheduleError::InvalidRecurrence("a once recurrence needs one scheduled day".to_string())
        })?;
        let target = next_matching(next.start_date, code);
        if target < self.input.today {
            return Err(ScheduleError::PastEdit { date: target });
        }

        let mut kept: Option<&SessionInstance> = None;
        for instance in self.sorted_existing() {
            if instance.date < self.input.today {
                continue;
            }
            if kept.is_none() && instance.date == target {
                kept = Some(instance);
                continue;
            }
            self.remove(instance)?;
        }

        match kept {
            Some(instance) => self.update(instance, Some(entry))?,
            None => self.insert(Slot { date: target, schedule: entry }),
        }
        Ok(())
    }

    /// 시간/강사/학생이 바뀐 인스턴스와 새 인스턴스를 최종 상태 기준으로 검사합니다.
    fn check_touched(&self) -> Result<(), ScheduleError> {
        if self.recheck.is_empty() {
            return Ok(());
        }

        let removed: HashSet<&str> = self.plan.removed.iter().map(|i| i.id.as_str()).collect();
        let updated: HashMap<&str, &SessionInstance> =
            self.plan.updated.iter().map(|i| (i.id.as_str(), i)).collect();

        let mut booked: Vec<SessionInstance> = self.input.busy.to_vec();
        booked.extend(
            self.input
                .existing
                .iter()
                .filter(|instance| !removed.contains(instance.id.as_str()))
                .map(|instance| updated.get(instance.id.as_str()).copied().unwrap_or(instance))
                .chain(self.plan.inserted.iter())
                .filter(|instance| instance.is_active)
                .cloned(),
        );

        for instance in self.plan.updated.iter().chain(self.plan.inserted.iter()) {
            if self.recheck.contains(&instance.id) {
                check_instance(instance, self.input.participants, &booked)?;
            }
        }
        Ok(())
    }

    fn summarize(&mut self) {
        if !self.plan.removed.is_empty() {
            let dates: Vec<String> = self.plan.removed.iter().map(|i| i.date.to_string()).collect();
            self.plan
                .changes
                .push(format!("Cancelled session(s) on {}", dates.join(", ")));
        }
        if let (Some(first), Some(last)) = (self.plan.inserted.first(), self.plan.inserted.last()) {
            let count = self.plan.inserted.len();
            if count == 1 {
                self.plan.changes.push(format!("Added a session on {}", first.date));
            } else {
                self.plan.changes.push(format!(
                    "Added {} sessions between {} and {}",
                    count, first.date, last.date
                ));
            }
        }
    }
}
