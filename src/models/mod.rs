//! # 데이터 모델 모듈
//!
//! 요청/응답 본문과 DB 행(row)에 대응하는 구조체들을 정의합니다.
//! - `class_session`: 수업과 반복 일정 정의
//! - `instance`: 수업 인스턴스, 공유 속성, 달력 항목
//! - `people`: 강사, 강사 가용 시간, 학생
//! - `report`: 출결 기록과 수업 보고서
//!
//! `pub use X::*;`로 재공개하여 `crate::models::SessionInstance`처럼 짧게 접근합니다.

pub mod class_session;
pub mod instance;
pub mod people;
pub mod report;

pub use class_session::*;
pub use instance::*;
pub use people::*;
pub use report::*;
