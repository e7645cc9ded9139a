//! # 반복 일정 전개 (Recurrence Expander)
//!
//! 반복 정의(`RecurrenceDefinition`)를 구체적인 `(날짜, 시작 시각, 길이)` 목록으로 펼칩니다.
//!
//! - `once`: `start_date` 하루에 하나. `start_date`의 요일이 항목의 요일 코드와 달라도
//!   날짜를 다시 계산하지 않습니다. (수정 시 `once`로 바뀌는 경로는 `reconcile`에서
//!   요일 코드로 다음 날짜를 찾습니다)
//! - `weekly` / `custom`: 시작일부터 종료일까지 하루씩 전진하며
//!   그날의 요일 코드가 일정에 있으면 하나씩 만듭니다.
//!
//! 결과는 게으른(lazy) 이터레이터이고 `Clone`이므로 같은 입력으로 몇 번이든 다시 돌릴 수 있습니다.

use crate::models::{DaySchedule, DaySchedules, RecurrenceDefinition, RecurrenceKind};
use crate::scheduling::calendar::{walk_dates, DayCode, MINUTES_PER_DAY};
use crate::scheduling::error::ScheduleError;
use chrono::NaiveDate;
use serde::Serialize;

/// 전개 결과 한 칸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub schedule: DaySchedule,
}

/// 요청 검증 규칙. 설정(`Config`)에서 만들어집니다.
#[derive(Debug, Clone)]
pub struct ScheduleRules {
    pub allowed_durations: Vec<u32>,
    pub max_range_days: i64,
}

impl Default for ScheduleRules {
    fn default() -> Self {
        Self {
            allowed_durations: vec![45, 60, 90, 120],
            max_range_days: 366,
        }
    }
}

/// `[from, to]` 구간에서 `schedule`에 있는 요일마다 한 칸씩
pub fn slots_between(
    schedule: &DaySchedules,
    from: NaiveDate,
    to: NaiveDate,
) -> impl Iterator<Item = Slot> + Clone + '_ {
    walk_dates(from, to).filter_map(move |date| {
        schedule
            .get(&DayCode::of(date))
            .map(|entry| Slot { date, schedule: *entry })
    })
}

/// 반복 정의 전체를 전개합니다.
pub fn expand(definition: &RecurrenceDefinition) -> impl Iterator<Item = Slot> + Clone + '_ {
    let once = definition.recurrence_kind == RecurrenceKind::Once;
    let first = definition.schedule.values().next().copied();
    let end = if once {
        definition.start_date
    } else {
        definition.end_date
    };

    walk_dates(definition.start_date, end).filter_map(move |date| {
        if once {
            first.map(|entry| Slot { date, schedule: entry })
        } else {
            definition
                .schedule
                .get(&DayCode::of(date))
                .map(|entry| Slot { date, schedule: *entry })
        }
    })
}

/// 요일별 일정 자체의 검증 (수업 시간 허용 목록, 자정 넘김 금지)
pub fn validate_schedule(schedule: &DaySchedules, rules: &ScheduleRules) -> Result<(), ScheduleError> {
    if schedule.is_empty() {
        return Err(ScheduleError::InvalidRecurrence(
            "at least one day must be scheduled".to_string(),
        ));
    }

    for (code, entry) in schedule {
        if !rules.allowed_durations.contains(&entry.duration_minutes) {
            return Err(ScheduleError::InvalidRecurrence(format!(
                "duration {}m on {} is not allowed (allowed: {:?})",
                entry.duration_minutes, code, rules.allowed_durations
            )));
        }
        if entry.start_time.end_minutes(entry.duration_minutes) > MINUTES_PER_DAY {
            return Err(ScheduleError::InvalidRecurrence(format!(
                "session on {} starting at {} runs past midnight",
                code, entry.start_time
            )));
        }
    }

    Ok(())
}

/// 날짜 범위 검증. 창(window) 수정에서도 같이 씁니다.
pub fn validate_range(from: NaiveDate, to: NaiveDate, rules: &ScheduleRules) -> Result<(), ScheduleError> {
    if from > to {
        return Err(ScheduleError::InvalidRecurrence(format!(
            "start date {} is after end date {}",
            from, to
        )));
    }
    let days = (to - from).num_days();
    if days > rules.max_range_days {
        return Err(ScheduleError::InvalidRecurrence(format!(
            "date range spans {} days, the maximum is {}",
            days, rules.max_range_days
        )));
    }
    Ok(())
}

impl RecurrenceDefinition {
    /// 영속화 전에 정의 전체를 검증합니다.
    pub fn validate(&self, rules: &ScheduleRules) -> Result<(), ScheduleError> {
        validate_range(self.start_date, self.end_date, rules)?;
        validate_schedule(&self.schedule, rules)?;

        if matches!(self.recurrence_kind, RecurrenceKind::Once | RecurrenceKind::Weekly)
            && self.schedule.len() != 1
        {
            return Err(ScheduleError::InvalidRecurrence(format!(
                "a {} recurrence needs exactly one scheduled day, got {}",
                self.recurrence_kind,
                self.schedule.len()
            )));
        }

        if expand(self).next().is_none() {
            return Err(ScheduleError::InvalidRecurrence(format!(
                "no scheduled day falls between {} and {}",
                self.start_date, self.end_date
            )));
        }

        Ok(())
    }

    /// `once`/`weekly`의 유일한 요일 항목
    pub fn single_entry(&self) -> Option<(DayCode, DaySchedule)> {
        self.schedule.iter().next().map(|(code, entry)| (*code, *entry))
    }
}
