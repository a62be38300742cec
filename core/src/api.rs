//! Capability groups implemented by `TyrClient`.
//!
//! Each trait covers one resource family so code that only manages keys, say,
//! can depend on `KeyClient` alone. Every method performs one round trip
//! through the transport, except `create_user` with a `billing_plan_default`
//! which first resolves the plan by name.

use serde_json::Value;

use crate::client::{billing_plan_default_name, Params, TyrClient, BILLING_PLAN_DEFAULT, DEFAULT_APP_NAME};
use crate::decode::Decoded;
use crate::error::Result;
use crate::http::Transport;
use crate::types::{ApiKey, BillingPlan, Instance, User};

/// User CRUD and lookups.
pub trait UserClient {
    /// Create a user from `email`, `login` and any extra fields.
    ///
    /// A non-empty `billing_plan_default` in `extra` is resolved to a
    /// `billing_plan_id` by plan name before the user is posted.
    fn create_user(&mut self, email: &str, login: &str, extra: &Params) -> Result<Decoded<User>>;

    fn has_user_by_email(&mut self, email: &str) -> Result<bool>;

    /// First user matching `email`, if any.
    fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>>;

    fn get_user_by_id(&mut self, id: u64) -> Result<Decoded<User>>;

    /// All users, scoped to the configured end point when set. Never fails
    /// on an unexpected body shape; that yields an empty list.
    fn get_users(&mut self) -> Result<Vec<User>>;

    /// Users of one end point, regardless of the configured one.
    fn get_users_by_end_point_id(&mut self, end_point_id: u64) -> Result<Vec<User>>;

    fn update_user(&mut self, id: u64, params: &Params) -> Result<bool>;

    /// Delete the first user matching `email`. `false` when no such user
    /// exists or Tyr answered with a body.
    fn delete_user(&mut self, email: &str) -> Result<bool>;
}

/// API keys of a user.
pub trait KeyClient {
    /// Create a key and return its token.
    ///
    /// The app name falls back to the configured one, then to `"default"`.
    fn create_user_key(&mut self, user_id: u64, app_name: Option<&str>) -> Result<Option<String>>;

    fn get_user_keys(&mut self, user_id: u64) -> Result<Decoded<Vec<ApiKey>>>;

    fn delete_user_key(&mut self, user_id: u64, key_id: u64) -> Result<Option<Value>>;
}

/// Billing plan CRUD.
pub trait BillingPlanClient {
    fn create_billing_plan(
        &mut self,
        name: &str,
        max_request_count: Option<u64>,
        max_object_count: Option<u64>,
        is_default: bool,
    ) -> Result<Decoded<BillingPlan>>;

    /// Plans of the configured end point. Requires `end_point_id`.
    fn get_billing_plans(&mut self) -> Result<Decoded<Vec<BillingPlan>>>;

    /// First plan of the configured end point named `name`.
    fn find_billing_plan_by_name(&mut self, name: &str) -> Result<Option<BillingPlan>>;

    fn get_billing_plan(&mut self, id: u64) -> Result<Decoded<BillingPlan>>;

    fn update_billing_plan(
        &mut self,
        id: u64,
        name: &str,
        max_request_count: Option<u64>,
        max_object_count: Option<u64>,
        is_default: bool,
    ) -> Result<Decoded<BillingPlan>>;

    fn delete_billing_plan(&mut self, id: u64) -> Result<bool>;
}

/// Instance authorizations.
pub trait InstanceClient {
    /// Authorize a user on an instance. `None` short-circuits to `false`.
    fn add_user_instance(&mut self, user_id: Option<u64>, api_id: u64, instance_id: u64) -> Result<bool>;

    fn get_instances(&mut self) -> Result<Vec<Instance>>;
}

impl<T: Transport> UserClient for TyrClient<T> {
    fn create_user(&mut self, email: &str, login: &str, extra: &Params) -> Result<Decoded<User>> {
        let mut params = extra.clone();
        if let Some(name) = billing_plan_default_name(&params)? {
            match self.find_billing_plan_by_name(&name)? {
                Some(plan) => {
                    params.remove(BILLING_PLAN_DEFAULT);
                    params.insert("billing_plan_id".to_string(), Value::from(plan.id));
                }
                None => tracing::warn!(billing_plan = %name, "billing plan not found, sending name as-is"),
            }
        }

        let request = self.build_create_user(email, login, &params)?;
        let response = self.execute(request)?;
        Ok(self.parse_user(&response))
    }

    fn has_user_by_email(&mut self, email: &str) -> Result<bool> {
        Ok(self.get_user_by_email(email)?.is_some())
    }

    fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        let request = self.build_find_users_by_email(email);
        let response = self.execute(request)?;
        Ok(self.parse_first_user(&response))
    }

    fn get_user_by_id(&mut self, id: u64) -> Result<Decoded<User>> {
        let response = self.execute(self.build_get_user(id))?;
        Ok(self.parse_user(&response))
    }

    fn get_users(&mut self) -> Result<Vec<User>> {
        let request = self.build_list_users(self.end_point_id());
        let response = self.execute(request)?;
        Ok(self.parse_users(&response))
    }

    fn get_users_by_end_point_id(&mut self, end_point_id: u64) -> Result<Vec<User>> {
        let request = self.build_list_users(Some(end_point_id));
        let response = self.execute(request)?;
        Ok(self.parse_users(&response))
    }

    fn update_user(&mut self, id: u64, params: &Params) -> Result<bool> {
        let request = self.build_update_user(id, params)?;
        let response = self.execute(request)?;
        Ok(self.parse_update_user(&response))
    }

    fn delete_user(&mut self, email: &str) -> Result<bool> {
        let Some(user) = self.get_user_by_email(email)? else {
            return Ok(false);
        };
        let response = self.execute(self.build_delete_user(user.id))?;
        Ok(self.parse_delete(&response))
    }
}

impl<T: Transport> KeyClient for TyrClient<T> {
    fn create_user_key(&mut self, user_id: u64, app_name: Option<&str>) -> Result<Option<String>> {
        let app_name = app_name
            .map(str::to_string)
            .or_else(|| self.config().app_name.clone())
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());
        let request = self.build_create_user_key(user_id, &app_name)?;
        let response = self.execute(request)?;
        Ok(self.parse_created_key(&response))
    }

    fn get_user_keys(&mut self, user_id: u64) -> Result<Decoded<Vec<ApiKey>>> {
        let response = self.execute(self.build_list_user_keys(user_id))?;
        Ok(self.parse_user_keys(&response))
    }

    fn delete_user_key(&mut self, user_id: u64, key_id: u64) -> Result<Option<Value>> {
        let response = self.execute(self.build_delete_user_key(user_id, key_id))?;
        Ok(self.parse_raw(&response))
    }
}

impl<T: Transport> BillingPlanClient for TyrClient<T> {
    fn create_billing_plan(
        &mut self,
        name: &str,
        max_request_count: Option<u64>,
        max_object_count: Option<u64>,
        is_default: bool,
    ) -> Result<Decoded<BillingPlan>> {
        let input = self.billing_plan_input(name, max_request_count, max_object_count, is_default);
        let request = self.build_create_billing_plan(&input)?;
        let response = self.execute(request)?;
        Ok(self.parse_billing_plan(&response))
    }

    fn get_billing_plans(&mut self) -> Result<Decoded<Vec<BillingPlan>>> {
        let end_point_id = self.require_end_point_id()?;
        let response = self.execute(self.build_list_billing_plans())?;
        Ok(self.parse_billing_plans(&response, end_point_id))
    }

    fn find_billing_plan_by_name(&mut self, name: &str) -> Result<Option<BillingPlan>> {
        let end_point_id = self.require_end_point_id()?;
        let plans = self.get_billing_plans()?;
        Ok(self.select_billing_plan(plans, name, end_point_id))
    }

    fn get_billing_plan(&mut self, id: u64) -> Result<Decoded<BillingPlan>> {
        let response = self.execute(self.build_get_billing_plan(id))?;
        Ok(self.parse_billing_plan(&response))
    }

    fn update_billing_plan(
        &mut self,
        id: u64,
        name: &str,
        max_request_count: Option<u64>,
        max_object_count: Option<u64>,
        is_default: bool,
    ) -> Result<Decoded<BillingPlan>> {
        let input = self.billing_plan_input(name, max_request_count, max_object_count, is_default);
        let request = self.build_update_billing_plan(id, &input)?;
        let response = self.execute(request)?;
        Ok(self.parse_billing_plan(&response))
    }

    fn delete_billing_plan(&mut self, id: u64) -> Result<bool> {
        let response = self.execute(self.build_delete_billing_plan(id))?;
        Ok(self.parse_delete(&response))
    }
}

impl<T: Transport> InstanceClient for TyrClient<T> {
    fn add_user_instance(&mut self, user_id: Option<u64>, api_id: u64, instance_id: u64) -> Result<bool> {
        let Some(user_id) = user_id else {
            return Ok(false);
        };
        let request = self.build_add_user_instance(user_id, api_id, instance_id)?;
        let response = self.execute(request)?;
        Ok(self.parse_add_user_instance(&response))
    }

    fn get_instances(&mut self) -> Result<Vec<Instance>> {
        let response = self.execute(self.build_list_instances())?;
        Ok(self.parse_instances(&response))
    }
}
