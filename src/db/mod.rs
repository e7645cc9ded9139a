//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 모든 함수는 `&mut SqliteConnection`을 받습니다. 그래서 풀에서 빌린 연결이든
//! `pool.begin()`으로 연 트랜잭션이든 똑같이 넘길 수 있고, 서비스 계층은
//! 한 요청의 모든 쿼리를 트랜잭션 하나로 묶습니다.
//!
//! 각 하위 모듈:
//! - `class_sessions`: 수업과 반복 정의
//! - `instances`: 수업 인스턴스와 참여 학생
//! - `people`: 강사, 가용 시간, 학생, 이름 조회
//! - `reports`: 출결 기록과 보고서
//! - `notifications`: 알림 저장

pub mod class_sessions;
pub mod instances;
pub mod notifications;
pub mod people;
pub mod reports;

pub use class_sessions::*;
pub use instances::*;
pub use notifications::*;
pub use people::*;
pub use reports::*;

use sqlx::{QueryBuilder, Sqlite};

/// `IN (...)` 목록의 최대 바인딩 수. SQLite 변수 개수 제한보다 넉넉히 작게 잡습니다.
pub(crate) const IN_CHUNK: usize = 500;

/// `prefix` 뒤에 `(?, ?, ...)` 목록과 `suffix`를 붙인 쿼리를 만듭니다.
pub(crate) fn in_list<'a>(prefix: &str, ids: &'a [String], suffix: &str) -> QueryBuilder<'a, Sqlite> {
    let mut builder = QueryBuilder::new(prefix);
    builder.push(" (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.as_str());
    }
    separated.push_unseparated(")");
    builder.push(suffix);
    builder
}
