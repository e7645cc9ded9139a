//! # 겹침 검사 (Overlap Detector)
//!
//! 두 인스턴스는 **같은 강사**, **같은 날짜**, 그리고 `[시작, 시작 + 길이)` 구간이
//! 실제로 겹칠 때만 겹친다고 봅니다. 끝과 시작이 맞닿는 것은 겹침이 아닙니다.
//! 자기 자신(같은 id)과는 겹치지 않습니다.
//!
//! 달력 화면의 경고 표시와, 인스턴스 생성 시의 이중 예약 차단이 이 함수 하나를 같이 씁니다.

use crate::models::SessionInstance;

/// 열린 구간 두 개가 겹치는지 (맞닿기만 하면 false)
pub fn intervals_intersect(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> bool {
    a_start < b_end && b_start < a_end
}

pub fn overlaps(a: &SessionInstance, b: &SessionInstance) -> bool {
    if a.id == b.id || a.date != b.date {
        return false;
    }
    match (&a.teacher_id, &b.teacher_id) {
        (Some(left), Some(right)) if left == right => intervals_intersect(
            a.start_time.minutes(),
            a.end_minutes(),
            b.start_time.minutes(),
            b.end_minutes(),
        ),
        _ => false,
    }
}

/// `candidate`와 겹치는 첫 번째 인스턴스
pub fn first_overlap<'a>(
    candidate: &SessionInstance,
    working_set: &'a [SessionInstance],
) -> Option<&'a SessionInstance> {
    working_set.iter().find(|other| overlaps(candidate, other))
}

pub fn has_overlap(candidate: &SessionInstance, working_set: &[SessionInstance]) -> bool {
    first_overlap(candidate, working_set).is_some()
}
