//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `HOST` / `PORT`: 서버 바인딩 주소와 포트
//! - `ALLOWED_DURATIONS`: 허용되는 수업 시간(분), 쉼표로 구분 (기본 "45,60,90,120")
//! - `MAX_RANGE_DAYS`: 반복 일정 날짜 범위의 최대 일수 (기본 366)
//! - `FRONTEND_DIST`: 빌드된 달력 UI 디렉토리 (기본 "../frontend/dist")

use crate::scheduling::ScheduleRules;
use std::env;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 경로 (예: "sqlite:data/tutorly.db?mode=rwc")
    pub database_url: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// 허용되는 수업 시간(분)
    pub allowed_durations: Vec<u32>,
    /// 반복 일정의 최대 날짜 범위(일)
    pub max_range_days: i64,
    /// 프론트엔드 정적 파일 경로
    pub frontend_dist: String,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없어도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = ScheduleRules::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            // 잘못된 항목은 무시하고, 하나도 남지 않으면 기본 목록을 씁니다
            allowed_durations: env::var("ALLOWED_DURATIONS")
                .ok()
                .map(|raw| parse_durations(&raw))
                .filter(|durations| !durations.is_empty())
                .unwrap_or(defaults.allowed_durations),
            max_range_days: env::var("MAX_RANGE_DAYS")
                .ok()
                .and_then(|raw| raw.trim().parse().ok())
                .unwrap_or(defaults.max_range_days),
            frontend_dist: env::var("FRONTEND_DIST")
                .unwrap_or_else(|_| "../frontend/dist".to_string()),
        })
    }

    /// 요청 검증 규칙
    pub fn schedule_rules(&self) -> ScheduleRules {
        ScheduleRules {
            allowed_durations: self.allowed_durations.clone(),
            max_range_days: self.max_range_days,
        }
    }
}

fn parse_durations(raw: &str) -> Vec<u32> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .filter(|minutes| *minutes > 0)
        .collect()
}
