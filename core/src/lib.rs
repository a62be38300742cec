//! Synchronous client for the Tyr user/account-management API.
//!
//! # Overview
//! `TyrClient` creates, reads, updates and deletes Tyr users, their API keys
//! and billing plans, and normalizes Tyr's loosely shaped JSON answers.
//!
//! # Design
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (consumes an `HttpResponse`), so the I/O boundary is explicit
//!   and both halves test without a network.
//! - The transport is a narrow `Transport` trait chosen at construction;
//!   `UreqTransport` is the default.
//! - HTTP error statuses are data, not errors. The last response is kept for
//!   status-code inspection; `TyrError` covers only local failures.
//! - Shape-ambiguous endpoints return `Decoded<T>` so callers match on
//!   `Found`, `NotFound` or `Ambiguous` instead of sniffing JSON.
//! - Operations are grouped into `UserClient`, `KeyClient`,
//!   `BillingPlanClient` and `InstanceClient`.
//!
//! ```rust,no_run
//! use tyr_core::{ClientConfig, KeyClient, TyrClient, UserClient};
//!
//! # fn main() -> Result<(), tyr_core::TyrError> {
//! let config = ClientConfig::new("http://tyr.example/v0/")?.with_end_point_id(1);
//! let mut client = TyrClient::new(config);
//! if let Some(user) = client.get_user_by_email("a@b.com")? {
//!     let token = client.create_user_key(user.id, Some("portal"))?;
//!     println!("{token:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use api::{BillingPlanClient, InstanceClient, KeyClient, UserClient};
pub use client::{validate_app_name, Params, TyrClient, DEFAULT_APP_NAME};
pub use config::ClientConfig;
pub use decode::{decode_body, Decoded};
pub use error::{Result, TyrError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use transport::UreqTransport;
pub use types::{ApiKey, BillingPlan, BillingPlanInput, DefaultFlag, EndPointRef, Instance, User};
