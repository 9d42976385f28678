use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

/// Success envelope shared by all handlers: `{"status":"success","data":…}`.
pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": data,
    }))
}
