//! Domain DTOs for the Tyr API.
//!
//! # Design
//! These types mirror what Tyr returns but are defined independently of the
//! mock-server crate; integration tests catch schema drift. Fields Tyr may
//! omit are `Option` or `#[serde(default)]` so a sparse object still decodes.

use serde::{Deserialize, Serialize, Serializer};

/// Reference to the deployment end point a user or plan belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndPointRef {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A named quota policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingPlan {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub max_request_count: Option<u64>,
    #[serde(default)]
    pub max_object_count: Option<u64>,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub end_point: Option<EndPointRef>,
}

/// An opaque token issued to a user for a downstream application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey {
    pub id: u64,
    pub token: String,
    #[serde(default)]
    pub app_name: Option<String>,
}

/// A Tyr user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub login: String,
    #[serde(rename = "type", default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub billing_plan: Option<BillingPlan>,
    #[serde(default)]
    pub end_point: Option<EndPointRef>,
    /// Only present in responses that embed the key list, such as key
    /// creation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<ApiKey>,
}

/// A navitia instance a user can be authorized on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instance {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub is_free: bool,
}

/// Tyr's encoding of the plan `default` flag on input: `1` when set, the
/// empty string when not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultFlag(pub bool);

impl Serialize for DefaultFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 {
            serializer.serialize_u8(1)
        } else {
            serializer.serialize_str("")
        }
    }
}

/// Request payload for creating or replacing a billing plan. Absent caps
/// are omitted rather than sent as null.
#[derive(Debug, Clone, Serialize)]
pub struct BillingPlanInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_request_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_object_count: Option<u64>,
    pub default: DefaultFlag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_point_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewKey<'a> {
    pub app_name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewAuthorization {
    pub api_id: u64,
    pub instance_id: u64,
}
