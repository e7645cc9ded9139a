//! # 달력 기본 타입
//!
//! 엔진 전체에서 쓰는 작은 값 타입들입니다.
//! - `DayCode`: 두 글자 요일 코드 (`MO`..`SU`)
//! - `WallTime`: 하루 안의 벽시계 시각 (자정부터의 분)
//! - `walk_dates()`: 시작일부터 종료일까지 하루씩 전진하는 순회
//!
//! 날짜는 모두 `NaiveDate`(시간대 없음)로 다루고, 비교는 일 단위로만 합니다.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 두 글자 요일 코드. JSON에서는 `"MO"`, `"TU"`처럼 대문자로 표현됩니다.
///
/// `Ord`는 월요일부터 일요일 순서이므로 `BTreeMap<DayCode, _>`를 순회하면
/// 한 주의 순서대로 나옵니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayCode {
    Mo,
    Tu,
    We,
    Th,
    Fr,
    Sa,
    Su,
}

impl DayCode {
    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayCode::Mo,
            Weekday::Tue => DayCode::Tu,
            Weekday::Wed => DayCode::We,
            Weekday::Thu => DayCode::Th,
            Weekday::Fri => DayCode::Fr,
            Weekday::Sat => DayCode::Sa,
            Weekday::Sun => DayCode::Su,
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::from_weekday(date.weekday())
    }

    pub fn weekday(self) -> Weekday {
        match self {
            DayCode::Mo => Weekday::Mon,
            DayCode::Tu => Weekday::Tue,
            DayCode::We => Weekday::Wed,
            DayCode::Th => Weekday::Thu,
            DayCode::Fr => Weekday::Fri,
            DayCode::Sa => Weekday::Sat,
            DayCode::Su => Weekday::Sun,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayCode::Mo => "MO",
            DayCode::Tu => "TU",
            DayCode::We => "WE",
            DayCode::Th => "TH",
            DayCode::Fr => "FR",
            DayCode::Sa => "SA",
            DayCode::Su => "SU",
        }
    }
}

impl fmt::Display for DayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 강사 가용 시간 테이블에 저장되는 요일 전체 이름 ("Monday" 등)
pub fn full_day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// 하루 안의 시각. 내부적으로 자정부터의 분(0..1440)을 저장합니다.
///
/// 문자열 표현은 `"HH:MM"`이며, DB의 `TIME` 스타일 값(`"HH:MM:SS"`)도 읽을 수 있습니다.
/// serde와 sqlx 모두 문자열을 거쳐 변환됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WallTime(u32);

pub const MINUTES_PER_DAY: u32 = 24 * 60;

impl WallTime {
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(WallTime(minutes))
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    /// `duration` 분 뒤의 종료 시각(분). 자정을 넘으면 1440 이상이 될 수 있습니다.
    pub fn end_minutes(self, duration: u32) -> u32 {
        self.0 + duration
    }
}

impl FromStr for WallTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split(':');
        let hours = parts.next().and_then(|h| h.parse::<u32>().ok());
        let minutes = parts.next().and_then(|m| m.parse::<u32>().ok());
        // 초 단위가 붙어 있으면 무시합니다 ("10:00:00")
        match (hours, minutes) {
            (Some(h), Some(m)) if h < 24 && m < 60 => Ok(WallTime(h * 60 + m)),
            _ => Err(format!("invalid time \"{}\", expected HH:MM", s)),
        }
    }
}

impl TryFrom<String> for WallTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WallTime> for String {
    fn from(value: WallTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// 분 단위 값을 "HH:MM"으로. 자정을 넘는 종료 시각 표시에 씁니다.
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// `start`부터 `end`까지(양 끝 포함) 하루씩 전진합니다. `start > end`이면 비어 있습니다.
pub fn walk_dates(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> + Clone {
    start.iter_days().take_while(move |date| *date <= end)
}

/// `from` 이후(당일 포함) 처음으로 `code` 요일이 되는 날짜
pub fn next_matching(from: NaiveDate, code: DayCode) -> NaiveDate {
    let ahead = (7 + code.weekday().num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    from + chrono::Duration::days(i64::from(ahead))
}
