//! In-memory JSON backend used to exercise the dispatcher over real HTTP.
//!
//! Items are arbitrary JSON objects keyed by a server-assigned UUID that is
//! echoed back in the `id` field. `GET /me` stands in for an authenticated
//! endpoint and only checks that an `authorization` header is present.
//! `GET /large/{len}` and `GET /binary` serve oversized and non-UTF-8 bodies.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const NOT_FOUND_BODY: &str = "Not found";

pub type Db = Arc<RwLock<HashMap<Uuid, Map<String, Value>>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/me", get(me))
        .route("/large/{len}", get(large))
        .route("/binary", get(binary))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Unauthorized,
    NotAnObject,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody {
                    error: "unauthorized",
                }),
            )
                .into_response(),
            ApiError::NotAnObject => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorBody {
                    error: "expected a JSON object",
                }),
            )
                .into_response(),
        }
    }
}

fn with_id(id: Uuid, fields: &Map<String, Value>) -> Value {
    let mut item = fields.clone();
    item.insert("id".to_string(), Value::String(id.to_string()));
    Value::Object(item)
}

fn into_fields(input: Value) -> Result<Map<String, Value>, ApiError> {
    match input {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(fields)
        }
        _ => Err(ApiError::NotAnObject),
    }
}

async fn list_items(State(db): State<Db>) -> Json<Vec<Value>> {
    let items = db.read().await;
    Json(items.iter().map(|(id, fields)| with_id(*id, fields)).collect())
}

async fn create_item(
    State(db): State<Db>,
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let fields = into_fields(input)?;
    let id = Uuid::new_v4();
    let item = with_id(id, &fields);
    db.write().await.insert(id, fields);
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let items = db.read().await;
    items
        .get(&id)
        .map(|fields| Json(with_id(id, fields)))
        .ok_or(ApiError::NotFound)
}

/// Shallow merge: top-level fields in the body replace stored ones.
async fn update_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let patch = into_fields(input)?;
    let mut items = db.write().await;
    let fields = items.get_mut(&id).ok_or(ApiError::NotFound)?;
    fields.extend(patch);
    Ok(Json(with_id(id, fields)))
}

async fn delete_item(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    let mut items = db.write().await;
    items
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(ApiError::NotFound)
}

async fn me(headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(json!({ "token": token })))
}

/// A JSON string of `len` letters, so the body is `len + 2` bytes.
async fn large(Path(len): Path<usize>) -> impl IntoResponse {
    let body = format!("\"{}\"", "a".repeat(len));
    ([(CONTENT_TYPE, "application/json")], body)
}

async fn binary() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/octet-stream")], vec![0xffu8, 0xfe, 0x00])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_id_injects_id_field() {
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!("A"));
        let item = with_id(Uuid::nil(), &fields);
        assert_eq!(
            item,
            json!({"id": "00000000-0000-0000-0000-000000000000", "name": "A"})
        );
    }

    #[test]
    fn into_fields_drops_client_supplied_id() {
        let fields = into_fields(json!({"id": "mine", "name": "A"})).unwrap();
        assert!(fields.get("id").is_none());
        assert_eq!(fields["name"], "A");
    }

    #[test]
    fn into_fields_rejects_non_objects() {
        assert!(matches!(into_fields(json!([1, 2])), Err(ApiError::NotAnObject)));
        assert!(matches!(into_fields(json!("text")), Err(ApiError::NotAnObject)));
    }
}
