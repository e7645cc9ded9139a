//! 변경 사항 설명(알림 본문)을 모으는 도구들

use serde::Serialize;
use std::collections::HashMap;

/// 사람이 읽는 변경 설명 목록. 같은 문장은 한 번만 들어가고, 넣은 순서를 유지합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeLog(Vec<String>);

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: impl Into<String>) {
        let change = change.into();
        if !self.0.contains(&change) {
            self.0.push(change);
        }
    }

    pub fn extend(&mut self, other: ChangeLog) {
        for change in other.0 {
            self.push(change);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// 알림 본문. 하나면 `- 내용`, 여러 개면 머리말 + 목록입니다.
    pub fn to_message(&self) -> String {
        match self.0.as_slice() {
            [] => "The class session has been updated.".to_string(),
            [only] => format!("- {}", only),
            many => {
                let lines: Vec<String> = many.iter().map(|change| format!("- {}", change)).collect();
                format!("The class session has been updated. Changes are:\n{}", lines.join("\n"))
            }
        }
    }
}

/// id → 표시 이름. 강사/장소/수업 종류 이름을 변경 설명에 넣을 때 씁니다.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    names: HashMap<String, String>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(id.into(), name.into());
    }

    pub fn label(&self, id: Option<&str>) -> String {
        match id {
            None => "none".to_string(),
            Some(id) => self.names.get(id).cloned().unwrap_or_else(|| id.to_string()),
        }
    }
}
