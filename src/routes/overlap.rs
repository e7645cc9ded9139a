//! # 겹침 검사 API
//!
//! `POST /api/v1/overlap-check` + `{ "instance": {...}, "working_set": [...] }`
//! → `{ "has_overlap": bool }`. 읽기 전용이며 DB를 사용하지 않습니다.

use crate::{models::OverlapCheckRequest, scheduling::overlap::has_overlap};
use axum::Json;
use serde_json::{json, Value};

pub async fn check_overlap(Json(req): Json<OverlapCheckRequest>) -> Json<Value> {
    Json(json!({ "has_overlap": has_overlap(&req.instance, &req.working_set) }))
}
