//! In-memory stand-in for the Intercom users/companies/conversations API.
//!
//! Records are stored as raw JSON objects so users and companies share one
//! set of handlers, parameterized by a `Kind`. `POST` upserts: an `id` must
//! already exist, otherwise the external id or natural key selects the record
//! to update or create. Conversations are read-only and come from a `Seed`.
//! Every request needs an `Authorization` header.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub type Record = Map<String, Value>;

/// Static description of one resource collection.
#[derive(Debug)]
pub struct Kind {
    pub endpoint: &'static str,
    pub item_type: &'static str,
    pub list_type: &'static str,
    pub external_key: &'static str,
    pub natural_key: &'static str,
    pub not_found: &'static str,
}

pub static USERS: Kind = Kind {
    endpoint: "users",
    item_type: "user",
    list_type: "user.list",
    external_key: "user_id",
    natural_key: "email",
    not_found: "User Not Found",
};

pub static COMPANIES: Kind = Kind {
    endpoint: "companies",
    item_type: "company",
    list_type: "company.list",
    external_key: "company_id",
    natural_key: "name",
    not_found: "Company Not Found",
};

pub type Db = Arc<RwLock<Vec<Record>>>;

#[derive(Clone)]
struct ResourceState {
    kind: &'static Kind,
    db: Db,
}

/// An `error.list` response.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn not_found(kind: &Kind) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", kind.not_found)
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "parameter_invalid", message)
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = json!({
            "type": "error.list",
            "request_id": Uuid::new_v4().simple().to_string(),
            "errors": [{"code": self.code, "message": self.message}],
        });
        (self.status, Json(body)).into_response()
    }
}

/// Records present when the server starts.
#[derive(Debug, Clone, Default)]
pub struct Seed {
    pub users: Vec<Record>,
    pub conversations: Vec<Record>,
}

pub fn app() -> Router {
    app_with(Seed::default())
}

pub fn app_with(seed: Seed) -> Router {
    let users = Db::new(RwLock::new(seed.users));
    Router::new()
        .merge(resource_router(&USERS, users.clone()))
        .merge(resource_router(&COMPANIES, Db::default()))
        .merge(conversation_router(ConversationState {
            users,
            conversations: Db::new(RwLock::new(seed.conversations)),
        }))
        .layer(middleware::from_fn(require_auth))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

fn resource_router(kind: &'static Kind, db: Db) -> Router {
    let state = ResourceState { kind, db };
    let collection = format!("/{}", kind.endpoint);
    let member = format!("/{}/{{id}}", kind.endpoint);
    Router::new()
        .route(
            &collection,
            get(list_or_find).post(upsert).delete(delete_by_query),
        )
        .route(&member, get(view).delete(delete_by_id))
        .with_state(state)
}

async fn require_auth(request: Request, next: Next) -> Response {
    if request.headers().contains_key(header::AUTHORIZATION) {
        next.run(request).await
    } else {
        Failure::new(StatusCode::UNAUTHORIZED, "unauthorized", "Access Token Invalid").into_response()
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

fn non_empty<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn position(records: &[Record], key: &str, value: &str) -> Option<usize> {
    records
        .iter()
        .position(|record| record.get(key).and_then(Value::as_str) == Some(value))
}

/// Index of the record addressed by `user_id`/`email` style query keys.
fn position_by_query(
    kind: &Kind,
    records: &[Record],
    query: &HashMap<String, String>,
) -> Option<Result<usize, Failure>> {
    [kind.external_key, kind.natural_key]
        .into_iter()
        .find_map(|key| query.get(key).map(|value| (key, value)))
        .map(|(key, value)| position(records, key, value).ok_or_else(|| Failure::not_found(kind)))
}

async fn list_or_find(
    State(state): State<ResourceState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Failure> {
    let records = state.db.read().await;
    if let Some(found) = position_by_query(state.kind, &records, &query) {
        return Ok(Json(Value::Object(records[found?].clone())));
    }
    let items: Vec<Value> = records.iter().cloned().map(Value::Object).collect();
    let mut list = Record::new();
    list.insert("type".to_string(), json!(state.kind.list_type));
    list.insert(state.kind.endpoint.to_string(), Value::Array(items));
    list.insert("total_count".to_string(), json!(records.len()));
    list.insert(
        "pages".to_string(),
        json!({"type": "pages", "page": 1, "per_page": 50, "total_pages": 1, "next": null}),
    );
    Ok(Json(Value::Object(list)))
}

async fn view(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let records = state.db.read().await;
    position(&records, "id", &id)
        .map(|index| Json(Value::Object(records[index].clone())))
        .ok_or_else(|| Failure::not_found(state.kind))
}

async fn delete_by_id(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let mut records = state.db.write().await;
    let index = position(&records, "id", &id).ok_or_else(|| Failure::not_found(state.kind))?;
    Ok(Json(Value::Object(records.remove(index))))
}

async fn delete_by_query(
    State(state): State<ResourceState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Failure> {
    let mut records = state.db.write().await;
    let index = position_by_query(state.kind, &records, &query).ok_or_else(|| {
        Failure::bad_request(format!(
            "'{}' or '{}' is required",
            state.kind.external_key, state.kind.natural_key
        ))
    })??;
    Ok(Json(Value::Object(records.remove(index))))
}

async fn upsert(
    State(state): State<ResourceState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Failure> {
    let Value::Object(input) = body else {
        return Err(Failure::bad_request("body must be a JSON object"));
    };
    let kind = state.kind;
    let mut records = state.db.write().await;

    let existing = if let Some(id) = non_empty(&input, "id") {
        Some(position(&records, "id", id).ok_or_else(|| Failure::not_found(kind))?)
    } else if let Some(value) = non_empty(&input, kind.external_key) {
        position(&records, kind.external_key, value)
    } else if let Some(value) = non_empty(&input, kind.natural_key) {
        position(&records, kind.natural_key, value)
    } else {
        return Err(Failure::bad_request(format!(
            "'{}' or '{}' is required",
            kind.external_key, kind.natural_key
        )));
    };

    let timestamp = now();
    let index = match existing {
        Some(index) => index,
        None => {
            let mut record = Record::new();
            record.insert("type".to_string(), json!(kind.item_type));
            record.insert("id".to_string(), json!(Uuid::new_v4().simple().to_string()));
            record.insert("created_at".to_string(), json!(timestamp));
            record.insert("session_count".to_string(), json!(0));
            records.push(record);
            records.len() - 1
        }
    };

    let record = &mut records[index];
    apply(record, input, timestamp);
    Ok(Json(Value::Object(record.clone())))
}

#[derive(Clone)]
struct ConversationState {
    users: Db,
    conversations: Db,
}

fn conversation_router(state: ConversationState) -> Router {
    Router::new()
        .route("/conversations", get(list_conversations))
        .route("/conversations/{id}", get(view_conversation))
        .with_state(state)
}

async fn view_conversation(
    State(state): State<ConversationState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let conversations = state.conversations.read().await;
    position(&conversations, "id", &id)
        .map(|index| Json(Value::Object(conversations[index].clone())))
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "not_found", "Conversation Not Found"))
}

/// `type=admin` matches the assignee, `type=user` the conversation's user,
/// and `open` narrows either scope.
async fn list_conversations(
    State(state): State<ConversationState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Failure> {
    let participant = match query.get("type").map(String::as_str) {
        None => None,
        Some("admin") => {
            let admin_id = query
                .get("admin_id")
                .ok_or_else(|| Failure::bad_request("'admin_id' is required"))?;
            Some(("assignee", admin_id.clone()))
        }
        Some("user") => Some(("user", conversation_user(&state.users, &query).await?)),
        Some(other) => return Err(Failure::bad_request(format!("unknown type '{other}'"))),
    };
    let open = query.get("open").map(|value| value == "true");

    let conversations = state.conversations.read().await;
    let items: Vec<Value> = conversations
        .iter()
        .filter(|conversation| {
            participant.as_ref().map_or(true, |(role, id)| {
                conversation
                    .get(*role)
                    .and_then(|who| who.get("id"))
                    .and_then(Value::as_str)
                    == Some(id.as_str())
            })
        })
        .filter(|conversation| {
            open.map_or(true, |open| conversation.get("open").and_then(Value::as_bool) == Some(open))
        })
        .cloned()
        .map(Value::Object)
        .collect();

    let total = items.len();
    Ok(Json(json!({
        "type": "conversation.list",
        "conversations": items,
        "total_count": total,
        "pages": {"type": "pages", "page": 1, "per_page": 20, "total_pages": 1, "next": null},
    })))
}

/// Primary id of the user a `type=user` query names.
async fn conversation_user(users: &Db, query: &HashMap<String, String>) -> Result<String, Failure> {
    if let Some(id) = query.get("intercom_user_id") {
        return Ok(id.clone());
    }
    let users = users.read().await;
    let index = position_by_query(&USERS, &users, query).ok_or_else(|| {
        Failure::bad_request("'intercom_user_id', 'user_id' or 'email' is required")
    })??;
    non_empty(&users[index], "id")
        .map(str::to_string)
        .ok_or_else(|| Failure::not_found(&USERS))
}

/// Merge an upsert body into `record`, honouring the special user flags.
fn apply(record: &mut Record, input: Record, timestamp: i64) {
    for (key, value) in input {
        match key.as_str() {
            "id" | "type" => {}
            "update_last_request_at" => {
                if value.as_bool() == Some(true) {
                    record.insert("last_request_at".to_string(), json!(timestamp));
                }
            }
            "new_session" => {
                if value.as_bool() == Some(true) {
                    let count = record
                        .get("session_count")
                        .and_then(Value::as_u64)
                        .unwrap_or(0);
                    record.insert("session_count".to_string(), json!(count + 1));
                }
            }
            "companies" => apply_companies(record, &value),
            _ => {
                record.insert(key, value);
            }
        }
    }
    record.insert("updated_at".to_string(), json!(timestamp));
}

fn apply_companies(record: &mut Record, changes: &Value) {
    let mut companies: Vec<Value> = record
        .get("companies")
        .and_then(|list| list.get("companies"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    for change in changes.as_array().into_iter().flatten() {
        let id = change.get("id").and_then(Value::as_str);
        let company_id = change.get("company_id").and_then(Value::as_str);
        if change.get("remove").and_then(Value::as_bool) == Some(true) {
            companies.retain(|company| {
                company.get("id").and_then(Value::as_str) != id || id.is_none()
            });
        } else if id.is_some() || company_id.is_some() {
            let mut company = change.clone();
            if let Some(object) = company.as_object_mut() {
                object.insert("type".to_string(), json!("company"));
            }
            let same = |existing: &Value| {
                (id.is_some() && existing.get("id").and_then(Value::as_str) == id)
                    || (company_id.is_some()
                        && existing.get("company_id").and_then(Value::as_str) == company_id)
            };
            match companies.iter_mut().find(|existing| same(existing)) {
                Some(existing) => *existing = company,
                None => companies.push(company),
            }
        }
    }

    record.insert(
        "companies".to_string(),
        json!({"type": "company.list", "companies": companies}),
    );
}
