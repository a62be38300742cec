//! Request builder, response parser and executing facade for the Tyr API.
//!
//! # Design
//! Every operation is split into a `build_*` method that produces an
//! `HttpRequest` and, where the response needs more than a status check, a
//! `parse_*` method that consumes an `HttpResponse`. Both halves are pure.
//! The capability traits in `api` compose them with `TyrClient::execute`,
//! which runs the request through the transport and records the response
//! in the last-response slot.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::decode::{decode_body, decode_list_or_empty, decode_tagged, is_error_body, Decoded};
use crate::error::{Result, TyrError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::transport::UreqTransport;
use crate::types::{
    ApiKey, BillingPlan, BillingPlanInput, DefaultFlag, Instance, NewAuthorization, NewKey, User,
};

/// Free-form JSON fields sent with user creation and updates.
pub type Params = Map<String, Value>;

/// App name used for new keys when neither the call nor the config names one.
pub const DEFAULT_APP_NAME: &str = "default";

/// Extra parameter naming a billing plan to resolve before user creation.
pub const BILLING_PLAN_DEFAULT: &str = "billing_plan_default";

/// Client for the Tyr user, key and billing-plan API.
///
/// Holds the configuration, the transport and the most recent response.
/// Operations take `&mut self` because each one overwrites that response;
/// share an instance across threads only behind external synchronization.
#[derive(Debug)]
pub struct TyrClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
    last_response: Option<HttpResponse>,
}

impl TyrClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    /// Shorthand for a client with only a base URL configured.
    pub fn from_url(base_url: &str) -> Result<Self> {
        Ok(Self::new(ClientConfig::new(base_url)?))
    }
}

impl<T: Transport> TyrClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            last_response: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn end_point_id(&self) -> Option<u64> {
        self.config.end_point_id
    }

    /// Re-scope every subsequent call to `end_point_id`.
    pub fn set_end_point_id(&mut self, end_point_id: Option<u64>) -> &mut Self {
        self.config.end_point_id = end_point_id;
        self
    }

    /// The response of the most recent call, for status-code inspection.
    ///
    /// `None` before the first call and after a transport failure.
    pub fn last_response(&self) -> Option<&HttpResponse> {
        self.last_response.as_ref()
    }

    /// Send one request and record its response.
    pub fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = %request.method, path = %request.path, "tyr request");
        self.last_response = None;
        let response = self.transport.send(&request).inspect_err(|e| {
            tracing::debug!(method = %request.method, path = %request.path, error = %e, "tyr transport failed");
        })?;
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "tyr response"
        );
        self.last_response = Some(response.clone());
        Ok(response)
    }

    pub(crate) fn require_end_point_id(&self) -> Result<u64> {
        self.config.end_point_id.ok_or(TyrError::MissingEndPointId)
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, self.config.url(path))
    }

    fn json_request<S: Serialize + ?Sized>(&self, method: HttpMethod, path: &str, body: &S) -> Result<HttpRequest> {
        let body = serde_json::to_string(body).map_err(|e| TyrError::SerializationError(e.to_string()))?;
        Ok(self.request(method, path).with_json(body))
    }

    fn scoped(&self, request: HttpRequest) -> HttpRequest {
        match self.config.end_point_id {
            Some(id) => request.with_query("end_point_id", id),
            None => request,
        }
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// POST `users`. Required fields overwrite same-named keys in `params`;
    /// `type` and `end_point_id` are added from the config when set.
    pub fn build_create_user(&self, email: &str, login: &str, params: &Params) -> Result<HttpRequest> {
        if email.trim().is_empty() {
            return Err(TyrError::InvalidArgument("email must not be empty".to_string()));
        }
        if login.trim().is_empty() {
            return Err(TyrError::InvalidArgument("login must not be empty".to_string()));
        }

        let mut payload = params.clone();
        payload.insert("email".to_string(), Value::from(email));
        payload.insert("login".to_string(), Value::from(login));
        if let Some(user_type) = &self.config.user_type {
            payload.insert("type".to_string(), Value::from(user_type.as_str()));
        }
        if let Some(id) = self.config.end_point_id {
            payload.insert("end_point_id".to_string(), Value::from(id));
        }
        self.json_request(HttpMethod::Post, "users", &payload)
    }

    pub fn build_find_users_by_email(&self, email: &str) -> HttpRequest {
        self.scoped(self.request(HttpMethod::Get, "users").with_query("email", email))
    }

    pub fn build_get_user(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("users/{id}"))
    }

    /// GET `users`, filtered by `end_point_id` when given.
    pub fn build_list_users(&self, end_point_id: Option<u64>) -> HttpRequest {
        let request = self.request(HttpMethod::Get, "users");
        match end_point_id {
            Some(id) => request.with_query("end_point_id", id),
            None => request,
        }
    }

    pub fn build_update_user(&self, id: u64, params: &Params) -> Result<HttpRequest> {
        self.json_request(HttpMethod::Put, &format!("users/{id}"), params)
    }

    pub fn build_delete_user(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("users/{id}"))
    }

    /// First user of a lookup list. Tyr does not guarantee a single match.
    pub fn parse_first_user(&self, response: &HttpResponse) -> Option<User> {
        match decode_body(&response.body) {
            Some(Value::Array(mut users)) if !users.is_empty() => {
                match serde_json::from_value(users.swap_remove(0)) {
                    Ok(user) => Some(user),
                    Err(e) => {
                        tracing::warn!(status = response.status, error = %e, "malformed user in lookup");
                        None
                    }
                }
            }
            _ => None,
        }
    }

    pub fn parse_user(&self, response: &HttpResponse) -> Decoded<User> {
        decode_tagged(response)
    }

    /// Users of a list call; any non-list or empty body yields an empty list.
    pub fn parse_users(&self, response: &HttpResponse) -> Vec<User> {
        decode_list_or_empty(response)
    }

    /// True unless the body decodes to an error or status wrapper.
    pub fn parse_update_user(&self, response: &HttpResponse) -> bool {
        !decode_body(&response.body).is_some_and(|body| is_error_body(&body))
    }

    /// Deletes succeed when the body decodes to nothing.
    pub fn parse_delete(&self, response: &HttpResponse) -> bool {
        decode_body(&response.body).is_none()
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    pub fn build_create_user_key(&self, user_id: u64, app_name: &str) -> Result<HttpRequest> {
        validate_app_name(app_name)?;
        self.json_request(HttpMethod::Post, &format!("users/{user_id}/keys"), &NewKey { app_name })
    }

    pub fn build_list_user_keys(&self, user_id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("users/{user_id}/keys"))
    }

    pub fn build_delete_user_key(&self, user_id: u64, key_id: u64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("users/{user_id}/keys/{key_id}"))
    }

    /// Token of the last key in the returned user's `keys` list, which is
    /// the key just created.
    pub fn parse_created_key(&self, response: &HttpResponse) -> Option<String> {
        let body = decode_body(&response.body)?;
        body.get("keys")?
            .as_array()?
            .last()?
            .get("token")?
            .as_str()
            .map(str::to_string)
    }

    /// A list of keys, or the status wrapper Tyr sends for unknown users.
    pub fn parse_user_keys(&self, response: &HttpResponse) -> Decoded<Vec<ApiKey>> {
        decode_tagged(response)
    }

    /// The decoded body, passed through as-is.
    pub fn parse_raw(&self, response: &HttpResponse) -> Option<Value> {
        decode_body(&response.body)
    }

    // -----------------------------------------------------------------------
    // Billing plans
    // -----------------------------------------------------------------------

    /// Payload for plan create/update. `default` is sent as `1` or `""`.
    pub fn billing_plan_input(
        &self,
        name: &str,
        max_request_count: Option<u64>,
        max_object_count: Option<u64>,
        is_default: bool,
    ) -> BillingPlanInput {
        BillingPlanInput {
            name: name.to_string(),
            max_request_count,
            max_object_count,
            default: DefaultFlag(is_default),
            end_point_id: self.config.end_point_id,
        }
    }

    pub fn build_create_billing_plan(&self, input: &BillingPlanInput) -> Result<HttpRequest> {
        self.json_request(HttpMethod::Post, "billing_plans", input)
    }

    pub fn build_list_billing_plans(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "billing_plans")
    }

    pub fn build_get_billing_plan(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("billing_plans/{id}"))
    }

    pub fn build_update_billing_plan(&self, id: u64, input: &BillingPlanInput) -> Result<HttpRequest> {
        self.json_request(HttpMethod::Put, &format!("billing_plans/{id}"), input)
    }

    pub fn build_delete_billing_plan(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("billing_plans/{id}"))
    }

    pub fn parse_billing_plan(&self, response: &HttpResponse) -> Decoded<BillingPlan> {
        decode_tagged(response)
    }

    /// Plans belonging to `end_point_id`. Tyr lists plans of every end
    /// point, so the filter runs client-side.
    pub fn parse_billing_plans(&self, response: &HttpResponse, end_point_id: u64) -> Decoded<Vec<BillingPlan>> {
        decode_tagged::<Vec<BillingPlan>>(response).map(|plans| {
            plans
                .into_iter()
                .filter(|plan| on_end_point(plan, end_point_id))
                .collect()
        })
    }

    /// Plan called `name` in a listing. A list that did not decode as a
    /// whole is searched entry by entry, skipping entries that do not fit.
    pub fn select_billing_plan(
        &self,
        plans: Decoded<Vec<BillingPlan>>,
        name: &str,
        end_point_id: u64,
    ) -> Option<BillingPlan> {
        match plans {
            Decoded::Found(plans) => plans.into_iter().find(|plan| plan.name == name),
            Decoded::Ambiguous(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<BillingPlan>(item).ok())
                .find(|plan| plan.name == name && on_end_point(plan, end_point_id)),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Instances
    // -----------------------------------------------------------------------

    pub fn build_add_user_instance(&self, user_id: u64, api_id: u64, instance_id: u64) -> Result<HttpRequest> {
        self.json_request(
            HttpMethod::Post,
            &format!("users/{user_id}/authorizations"),
            &NewAuthorization { api_id, instance_id },
        )
    }

    pub fn build_list_instances(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "instances")
    }

    pub fn parse_add_user_instance(&self, response: &HttpResponse) -> bool {
        response.status == 200
    }

    pub fn parse_instances(&self, response: &HttpResponse) -> Vec<Instance> {
        decode_list_or_empty(response)
    }
}

/// Application names Tyr accepts: non-empty ASCII alphanumerics plus
/// `-`, `_` and `.`.
pub fn validate_app_name(app_name: &str) -> Result<()> {
    let valid = !app_name.is_empty()
        && app_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(TyrError::InvalidApplicationName(app_name.to_string()))
    }
}

fn on_end_point(plan: &BillingPlan, end_point_id: u64) -> bool {
    plan.end_point.as_ref().is_some_and(|ep| ep.id == end_point_id)
}

/// Name under `billing_plan_default`, when present and non-empty. Only a
/// string names a plan.
pub(crate) fn billing_plan_default_name(params: &Params) -> Result<Option<String>> {
    match params.get(BILLING_PLAN_DEFAULT) {
        Some(Value::String(name)) if !name.trim().is_empty() => Ok(Some(name.clone())),
        Some(Value::String(_)) | Some(Value::Null) | None => Ok(None),
        Some(other) => Err(TyrError::InvalidArgument(format!(
            "{BILLING_PLAN_DEFAULT} must be a plan name, got {other}"
        ))),
    }
}
