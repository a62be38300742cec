//! In-memory stand-in for the Tyr service, mounted under `/v0`.
//!
//! Mirrors the shapes the real service answers with: lists for collection
//! reads, the full user object for key and authorization changes, an empty
//! 204 for deletes and a `{"status": "error", "message": ..}` wrapper for
//! unknown ids.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// End point new users and plans land on when the request names none.
pub const DEFAULT_END_POINT_ID: u64 = 1;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndPoint {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BillingPlan {
    pub id: u64,
    pub name: String,
    pub max_request_count: Option<u64>,
    pub max_object_count: Option<u64>,
    pub default: bool,
    pub end_point: EndPoint,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Key {
    pub id: u64,
    pub token: String,
    pub app_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Authorization {
    pub api_id: u64,
    pub instance_id: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub login: String,
    #[serde(rename = "type")]
    pub user_type: String,
    pub end_point: EndPoint,
    pub billing_plan: BillingPlan,
    pub keys: Vec<Key>,
    pub authorizations: Vec<Authorization>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Instance {
    pub id: u64,
    pub name: String,
    pub is_free: bool,
}

#[derive(Debug)]
pub struct Store {
    end_points: Vec<EndPoint>,
    plans: BTreeMap<u64, BillingPlan>,
    users: BTreeMap<u64, User>,
    instances: Vec<Instance>,
    next_id: u64,
}

impl Store {
    /// Two end points, a default plan on each, one extra plan on end point
    /// 1 and two instances.
    pub fn seeded() -> Self {
        let end_points = vec![
            EndPoint { id: 1, name: "navitia.io".to_string() },
            EndPoint { id: 2, name: "partners".to_string() },
        ];
        let plan = |id, name: &str, default, end_point: &EndPoint| BillingPlan {
            id,
            name: name.to_string(),
            max_request_count: Some(3000),
            max_object_count: Some(60000),
            default,
            end_point: end_point.clone(),
        };
        let plans = [
            plan(1, "nav_dev", true, &end_points[0]),
            plan(2, "nav_ent", false, &end_points[0]),
            plan(3, "partner_default", true, &end_points[1]),
        ]
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
        let instances = vec![
            Instance { id: 1, name: "fr-idf".to_string(), is_free: false },
            Instance { id: 2, name: "sandbox".to_string(), is_free: true },
        ];

        Self {
            end_points,
            plans,
            users: BTreeMap::new(),
            instances,
            next_id: 100,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn end_point(&self, id: u64) -> Result<EndPoint, ApiError> {
        self.end_points
            .iter()
            .find(|ep| ep.id == id)
            .cloned()
            .ok_or_else(|| bad_request(format!("unknown end_point_id {id}")))
    }

    fn plan(&self, id: u64) -> Result<BillingPlan, ApiError> {
        self.plans
            .get(&id)
            .cloned()
            .ok_or_else(|| bad_request(format!("unknown billing_plan_id {id}")))
    }

    fn default_plan(&self, end_point_id: u64) -> Result<BillingPlan, ApiError> {
        self.plans
            .values()
            .find(|p| p.default && p.end_point.id == end_point_id)
            .cloned()
            .ok_or_else(|| bad_request(format!("no default billing plan for end point {end_point_id}")))
    }
}

pub type Db = Arc<RwLock<Store>>;

type ApiError = (StatusCode, Json<Value>);

fn not_found(what: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"status": "error", "message": format!("{what} not found")})),
    )
}

fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({"message": message})))
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    let api = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/users/{id}/keys", get(list_keys).post(create_key))
        .route("/users/{id}/keys/{key_id}", delete(delete_key))
        .route("/users/{id}/authorizations", post(add_authorization))
        .route("/billing_plans", get(list_plans).post(create_plan))
        .route(
            "/billing_plans/{id}",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
        .route("/instances", get(list_instances))
        .with_state(db);
    Router::new().nest("/v0", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Loose field readers. Tyr accepts numbers as strings and `1`/`""` flags.
// ---------------------------------------------------------------------------

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)?.as_str().map(str::to_string)
}

fn id_field(body: &Value, key: &str) -> Result<Option<u64>, ApiError> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| bad_request(format!("{key} must be a positive integer"))),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|_| bad_request(format!("{key} must be a positive integer"))),
        Some(_) => Err(bad_request(format!("{key} must be a positive integer"))),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty() && s != "0" && s != "false",
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UserFilter {
    pub email: Option<String>,
    pub end_point_id: Option<u64>,
}

async fn list_users(State(db): State<Db>, Query(filter): Query<UserFilter>) -> Json<Vec<User>> {
    let store = db.read().await;
    let users = store
        .users
        .values()
        .filter(|u| filter.email.as_ref().map_or(true, |email| &u.email == email))
        .filter(|u| filter.end_point_id.map_or(true, |id| u.end_point.id == id))
        .cloned()
        .collect();
    Json(users)
}

async fn create_user(State(db): State<Db>, Json(body): Json<Value>) -> Result<Json<User>, ApiError> {
    let email = string_field(&body, "email").ok_or_else(|| bad_request("email is required".to_string()))?;
    let login = string_field(&body, "login").ok_or_else(|| bad_request("login is required".to_string()))?;

    let mut store = db.write().await;
    let end_point = store.end_point(id_field(&body, "end_point_id")?.unwrap_or(DEFAULT_END_POINT_ID))?;
    if store
        .users
        .values()
        .any(|u| u.end_point.id == end_point.id && (u.email == email || u.login == login))
    {
        return Err((
            StatusCode::CONFLICT,
            Json(json!({"message": "duplicate user"})),
        ));
    }
    let billing_plan = match id_field(&body, "billing_plan_id")? {
        Some(id) => store.plan(id)?,
        None => store.default_plan(end_point.id)?,
    };

    let user = User {
        id: store.next_id(),
        email,
        login,
        user_type: string_field(&body, "type").unwrap_or_else(|| "with_free_instances".to_string()),
        end_point,
        billing_plan,
        keys: Vec::new(),
        authorizations: Vec::new(),
    };
    tracing::info!(id = user.id, email = %user.email, "user created");
    store.users.insert(user.id, user.clone());
    Ok(Json(user))
}

async fn get_user(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<User>, ApiError> {
    let store = db.read().await;
    store.users.get(&id).cloned().map(Json).ok_or_else(|| not_found("user"))
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Result<Json<User>, ApiError> {
    let mut store = db.write().await;
    let billing_plan = match id_field(&body, "billing_plan_id")? {
        Some(plan_id) => Some(store.plan(plan_id)?),
        None => None,
    };
    let user = store.users.get_mut(&id).ok_or_else(|| not_found("user"))?;
    if let Some(email) = string_field(&body, "email") {
        user.email = email;
    }
    if let Some(login) = string_field(&body, "login") {
        user.login = login;
    }
    if let Some(user_type) = string_field(&body, "type") {
        user.user_type = user_type;
    }
    if let Some(plan) = billing_plan {
        user.billing_plan = plan;
    }
    Ok(Json(user.clone()))
}

async fn delete_user(State(db): State<Db>, Path(id): Path<u64>) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    store
        .users
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found("user"))
}

// ---------------------------------------------------------------------------
// Keys and authorizations
// ---------------------------------------------------------------------------

async fn list_keys(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Vec<Key>>, ApiError> {
    let store = db.read().await;
    let user = store.users.get(&id).ok_or_else(|| not_found("user"))?;
    Ok(Json(user.keys.clone()))
}

#[derive(Debug, Deserialize)]
pub struct NewKey {
    pub app_name: Option<String>,
}

async fn create_key(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<NewKey>,
) -> Result<Json<User>, ApiError> {
    let mut store = db.write().await;
    if !store.users.contains_key(&id) {
        return Err(not_found("user"));
    }
    let key = Key {
        id: store.next_id(),
        token: Uuid::new_v4().to_string(),
        app_name: input.app_name,
    };
    let user = store.users.get_mut(&id).ok_or_else(|| not_found("user"))?;
    user.keys.push(key);
    Ok(Json(user.clone()))
}

async fn delete_key(
    State(db): State<Db>,
    Path((id, key_id)): Path<(u64, u64)>,
) -> Result<Json<User>, ApiError> {
    let mut store = db.write().await;
    let user = store.users.get_mut(&id).ok_or_else(|| not_found("user"))?;
    let before = user.keys.len();
    user.keys.retain(|k| k.id != key_id);
    if user.keys.len() == before {
        return Err(not_found("key"));
    }
    Ok(Json(user.clone()))
}

#[derive(Debug, Deserialize)]
pub struct NewAuthorization {
    pub api_id: u64,
    pub instance_id: u64,
}

async fn add_authorization(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<NewAuthorization>,
) -> Result<Json<User>, ApiError> {
    let mut store = db.write().await;
    if !store.instances.iter().any(|i| i.id == input.instance_id) {
        return Err(bad_request(format!("unknown instance_id {}", input.instance_id)));
    }
    let user = store.users.get_mut(&id).ok_or_else(|| not_found("user"))?;
    user.authorizations.push(Authorization {
        api_id: input.api_id,
        instance_id: input.instance_id,
    });
    Ok(Json(user.clone()))
}

// ---------------------------------------------------------------------------
// Billing plans and instances
// ---------------------------------------------------------------------------

async fn list_plans(State(db): State<Db>) -> Json<Vec<BillingPlan>> {
    let store = db.read().await;
    Json(store.plans.values().cloned().collect())
}

async fn create_plan(State(db): State<Db>, Json(body): Json<Value>) -> Result<Json<BillingPlan>, ApiError> {
    let name = string_field(&body, "name").ok_or_else(|| bad_request("name is required".to_string()))?;
    let mut store = db.write().await;
    let end_point = store.end_point(id_field(&body, "end_point_id")?.unwrap_or(DEFAULT_END_POINT_ID))?;
    let plan = BillingPlan {
        id: store.next_id(),
        name,
        max_request_count: id_field(&body, "max_request_count")?,
        max_object_count: id_field(&body, "max_object_count")?,
        default: truthy(body.get("default")),
        end_point,
    };
    store.plans.insert(plan.id, plan.clone());
    Ok(Json(plan))
}

async fn get_plan(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<BillingPlan>, ApiError> {
    let store = db.read().await;
    store.plans.get(&id).cloned().map(Json).ok_or_else(|| not_found("billing plan"))
}

async fn update_plan(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Result<Json<BillingPlan>, ApiError> {
    let max_request_count = id_field(&body, "max_request_count")?;
    let max_object_count = id_field(&body, "max_object_count")?;
    let mut store = db.write().await;
    let plan = store.plans.get_mut(&id).ok_or_else(|| not_found("billing plan"))?;
    if let Some(name) = string_field(&body, "name") {
        plan.name = name;
    }
    if body.get("max_request_count").is_some() {
        plan.max_request_count = max_request_count;
    }
    if body.get("max_object_count").is_some() {
        plan.max_object_count = max_object_count;
    }
    if body.get("default").is_some() {
        plan.default = truthy(body.get("default"));
    }
    Ok(Json(plan.clone()))
}

async fn delete_plan(State(db): State<Db>, Path(id): Path<u64>) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    if store.users.values().any(|u| u.billing_plan.id == id) {
        return Err(bad_request(format!("billing plan {id} is in use")));
    }
    store
        .plans
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found("billing plan"))
}

async fn list_instances(State(db): State<Db>) -> Json<Vec<Instance>> {
    let store = db.read().await;
    Json(store.instances.clone())
}
