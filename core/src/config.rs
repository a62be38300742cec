//! Client configuration: base URL plus the optional scoping fields Tyr
//! accepts on most calls.

use std::env;

use url::Url;

use crate::error::{Result, TyrError};

/// Configuration for a `TyrClient`, fixed at construction.
///
/// Optional fields are only sent when set; the client never sends a null
/// or empty placeholder for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    pub end_point_id: Option<u64>,
    pub app_name: Option<String>,
    pub user_type: Option<String>,
}

impl ClientConfig {
    /// Validate `base_url` and build a config with no optional fields.
    ///
    /// The URL must be absolute http(s). A trailing slash is accepted and
    /// stripped, so `http://tyr/v0/` and `http://tyr/v0` are equivalent.
    pub fn new(base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim();
        let invalid = |reason: &str| TyrError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: reason.to_string(),
        };
        if trimmed.is_empty() {
            return Err(invalid("empty"));
        }
        let parsed = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
            return Err(invalid("not usable as a base"));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid("must not carry a query or fragment"));
        }

        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
            end_point_id: None,
            app_name: None,
            user_type: None,
        })
    }

    /// Load from `TYR_URL` (required), `TYR_END_POINT_ID`, `TYR_APP_NAME`
    /// and `TYR_USER_TYPE`. Empty optional variables count as unset.
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("TYR_URL").map_err(|_| TyrError::InvalidBaseUrl {
            url: String::new(),
            reason: "TYR_URL is not set".to_string(),
        })?;
        let mut config = Self::new(&base_url)?;

        if let Some(raw) = non_empty_var("TYR_END_POINT_ID") {
            let id = raw.parse().map_err(|_| {
                TyrError::InvalidConfig(format!("TYR_END_POINT_ID is not numeric: {raw:?}"))
            })?;
            config.end_point_id = Some(id);
        }
        config.app_name = non_empty_var("TYR_APP_NAME");
        config.user_type = non_empty_var("TYR_USER_TYPE");
        Ok(config)
    }

    pub fn with_end_point_id(mut self, id: u64) -> Self {
        self.end_point_id = Some(id);
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn with_user_type(mut self, user_type: impl Into<String>) -> Self {
        self.user_type = Some(user_type.into());
        self
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
