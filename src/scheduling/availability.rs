//! # 가용성 조회 (Availability Oracle)
//!
//! 강사와 학생이 특정 요일/시간에 수업할 수 있는지 답하는 순수 함수들입니다.
//! 데이터는 호출하는 쪽에서 미리 읽어 전달하며, 여기서는 아무것도 변경하지 않습니다.
//!
//! ## 강사
//! 강사는 요일별 가용 구간 목록(`AvailabilityWindow`)을 가집니다.
//! 수업 구간 `[시작, 시작 + 길이)`를 **완전히 포함하는** 구간이 하나라도 있어야 합니다.
//! 일부만 겹치는 구간은 인정하지 않습니다.
//!
//! ## 학생
//! 학생은 7자리 비트맵 문자열(`'1'` = 가능)을 가집니다. 비트맵의 0번 자리는 **월요일**입니다.
//! 일요일 기준 인덱스(0 = 일요일)를 비트맵 인덱스로 바꾸는 고정 표를 사용합니다.
//! 비트맵이 없거나 형식이 잘못되었으면 "가용하지 않음"으로 판단합니다 (에러를 던지지 않음).

use crate::models::AvailabilityWindow;
use crate::scheduling::calendar::{full_day_name, WallTime};
use chrono::Weekday;

/// 일요일 기준 요일 인덱스(0 = 일요일 .. 6 = 토요일) → 학생 비트맵 인덱스.
/// 비트맵은 월요일이 0번이므로 일요일은 마지막(6번)으로 갑니다.
const BITMAP_INDEX_FROM_SUNDAY: [usize; 7] = [6, 0, 1, 2, 3, 4, 5];

/// 강사가 `weekday`에 `start`부터 `duration_minutes`분 동안 수업할 수 있는지 확인합니다.
pub fn teacher_is_free(
    windows: &[AvailabilityWindow],
    weekday: Weekday,
    start: WallTime,
    duration_minutes: u32,
) -> bool {
    let day_name = full_day_name(weekday);
    let session_start = start.minutes();
    let session_end = start.end_minutes(duration_minutes);

    windows.iter().any(|window| {
        window.day_of_week.eq_ignore_ascii_case(day_name)
            && window.start_time.minutes() <= session_start
            && window.end_time.minutes() >= session_end
    })
}

/// 학생이 `weekday`에 일반적으로 수업 가능한지 확인합니다.
pub fn student_is_available(available_dates: Option<&str>, weekday: Weekday) -> bool {
    let Some(bitmap) = available_dates else {
        return false;
    };

    let index = BITMAP_INDEX_FROM_SUNDAY[weekday.num_days_from_sunday() as usize];
    bitmap.as_bytes().get(index).is_some_and(|flag| *flag == b'1')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(day: &str, start: &str, end: &str) -> AvailabilityWindow {
        AvailabilityWindow {
            id: "w".to_string(),
            teacher_id: "t".to_string(),
            day_of_week: day.to_string(),
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
        }
    }

    #[test]
    fn teacher_window_must_fully_contain_the_session() {
        let windows = vec![window("Tuesday", "09:00", "17:00")];
        let at = |t: &str| t.parse::<WallTime>().unwrap();

        assert!(teacher_is_free(&windows, Weekday::Tue, at("09:00"), 60));
        assert!(teacher_is_free(&windows, Weekday::Tue, at("16:00"), 60));
        // 16:30 + 60분 = 17:30 → 구간을 벗어남
        assert!(!teacher_is_free(&windows, Weekday::Tue, at("16:30"), 60));
        assert!(!teacher_is_free(&windows, Weekday::Tue, at("08:30"), 60));
        // 다른 요일
        assert!(!teacher_is_free(&windows, Weekday::Wed, at("10:00"), 60));
    }

    #[test]
    fn any_containing_window_is_enough() {
        let windows = vec![
            window("Monday", "09:00", "10:00"),
            window("Monday", "14:00", "18:00"),
        ];
        let at = |t: &str| t.parse::<WallTime>().unwrap();
        assert!(teacher_is_free(&windows, Weekday::Mon, at("15:00"), 90));
        assert!(!teacher_is_free(&windows, Weekday::Mon, at("09:30"), 60));
    }

    #[test]
    fn student_bitmap_is_monday_first() {
        // 월·수만 가능
        let bitmap = Some("1010000");
        assert!(student_is_available(bitmap, Weekday::Mon));
        assert!(!student_is_available(bitmap, Weekday::Tue));
        assert!(student_is_available(bitmap, Weekday::Wed));
        assert!(!student_is_available(bitmap, Weekday::Sun));

        // 일요일만 가능
        assert!(student_is_available(Some("0000001"), Weekday::Sun));
        assert!(!student_is_available(Some("0000001"), Weekday::Mon));
    }

    #[test]
    fn bitmap_table_matches_days_from_monday() {
        for weekday in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            assert_eq!(
                BITMAP_INDEX_FROM_SUNDAY[weekday.num_days_from_sunday() as usize],
                weekday.num_days_from_monday() as usize
            );
        }
    }

    #[test]
    fn missing_or_short_bitmap_fails_closed() {
        assert!(!student_is_available(None, Weekday::Mon));
        assert!(!student_is_available(Some(""), Weekday::Mon));
        assert!(!student_is_available(Some("111"), Weekday::Fri));
    }
}
