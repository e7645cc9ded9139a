//! # 인스턴스 생성 (Instance Materializer)
//!
//! 전개된 칸(`Slot`)마다 공유 속성을 붙여 인스턴스 초안을 만들고,
//! 강사 가용 시간 / 학생 가용 요일 / 강사 이중 예약을 검사합니다.
//! 하나라도 실패하면 전체 묶음을 거부합니다 (all-or-nothing).
//! 저장은 호출하는 쪽이 한 트랜잭션 안에서 처리합니다.

use crate::models::{AvailabilityWindow, RecurrenceDefinition, SessionInstance, SharedAttributes, Student, Teacher};
use crate::scheduling::availability::{student_is_available, teacher_is_free};
use crate::scheduling::calendar::{format_minutes, full_day_name};
use crate::scheduling::error::ScheduleError;
use crate::scheduling::overlap::first_overlap;
use crate::scheduling::recurrence::{expand, Slot};
use chrono::Datelike;
use uuid::Uuid;

/// 강사 + 그 강사의 가용 구간
#[derive(Debug, Clone)]
pub struct TeacherProfile {
    pub teacher: Teacher,
    pub windows: Vec<AvailabilityWindow>,
}

/// 검사에 필요한 사람 정보. 호출하는 쪽이 미리 읽어 둡니다.
#[derive(Debug, Clone, Default)]
pub struct Participants {
    pub teacher: Option<TeacherProfile>,
    pub students: Vec<Student>,
}

pub fn new_instance_id() -> String {
    Uuid::now_v7().to_string()
}

/// 공유 속성으로 새 인스턴스 초안을 만듭니다.
pub fn draft_instance(class_session_id: &str, slot: Slot, attributes: &SharedAttributes) -> SessionInstance {
    SessionInstance {
        id: new_instance_id(),
        class_session_id: class_session_id.to_string(),
        date: slot.date,
        start_time: slot.schedule.start_time,
        duration_minutes: slot.schedule.duration_minutes,
        teacher_id: attributes.teacher_id.clone(),
        location_id: attributes.location_id.clone(),
        room: attributes.room.clone(),
        session_type_id: attributes.session_type_id.clone(),
        note: attributes.note.clone(),
        is_active: attributes.is_active,
        reports_submitted: false,
        student_ids: attributes.student_ids.clone(),
    }
}

/// 인스턴스 하나를 검사합니다. `booked`는 이미 잡혀 있는 강사 일정입니다.
pub fn check_instance(
    candidate: &SessionInstance,
    participants: &Participants,
    booked: &[SessionInstance],
) -> Result<(), ScheduleError> {
    let weekday = candidate.date.weekday();
    let day_name = full_day_name(weekday);
    let start = candidate.start_time;
    let end = format_minutes(candidate.end_minutes());

    if let Some(teacher_id) = candidate.teacher_id.as_deref() {
        let profile = participants
            .teacher
            .as_ref()
            .filter(|profile| profile.teacher.id == teacher_id);

        let free = profile.is_some_and(|profile| {
            teacher_is_free(&profile.windows, weekday, start, candidate.duration_minutes)
        });
        if !free {
            let name = profile
                .map(|profile| profile.teacher.display_name())
                .unwrap_or_else(|| teacher_id.to_string());
            return Err(ScheduleError::AvailabilityConflict(format!(
                "Teacher {} is not available on {} {} from {} to {}",
                name, day_name, candidate.date, start, end
            )));
        }
    }

    let unavailable: Vec<String> = participants
        .students
        .iter()
        .filter(|student| candidate.student_ids.contains(&student.id))
        .filter(|student| !student_is_available(student.available_dates.as_deref(), weekday))
        .map(Student::display_name)
        .collect();
    if !unavailable.is_empty() {
        return Err(ScheduleError::AvailabilityConflict(format!(
            "The following students are not available on {} {}: {}",
            day_name,
            candidate.date,
            unavailable.join(", ")
        )));
    }

    if let Some(other) = first_overlap(candidate, booked) {
        return Err(ScheduleError::DoubleBooking(format!(
            "Teacher already has a session on {} from {} to {} that overlaps {} to {}",
            other.date,
            other.start_time,
            format_minutes(other.end_minutes()),
            start,
            end
        )));
    }

    Ok(())
}

/// 반복 정의 전체를 인스턴스 묶음으로 만듭니다.
///
/// `busy`: 같은 강사의 다른 수업 인스턴스들. 묶음 안에서 먼저 받아들인 초안도
/// 이후 초안의 이중 예약 검사 대상이 됩니다.
pub fn materialize(
    class_session_id: &str,
    definition: &RecurrenceDefinition,
    attributes: &SharedAttributes,
    participants: &Participants,
    busy: &[SessionInstance],
) -> Result<Vec<SessionInstance>, ScheduleError> {
    let mut booked: Vec<SessionInstance> = busy.to_vec();
    let mut drafts = Vec::new();

    for slot in expand(definition) {
        let draft = draft_instance(class_session_id, slot, attributes);
        check_instance(&draft, participants, &booked)?;
        booked.push(draft.clone());
        drafts.push(draft);
    }

    Ok(drafts)
}
