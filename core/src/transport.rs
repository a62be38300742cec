//! Blocking transport backed by ureq.

use crate::error::TyrError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Executes `HttpRequest` values with a ureq agent.
///
/// The agent is built with `http_status_as_error(false)` so 4xx/5xx
/// responses are returned as data rather than `Err`, leaving status
/// interpretation to the client.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Wrap an agent configured by the caller (proxies, timeouts, TLS).
    ///
    /// The agent must have `http_status_as_error(false)`; otherwise error
    /// statuses surface as `TyrError::Transport`.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn decorate<B>(mut builder: ureq::RequestBuilder<B>, req: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (key, value) in &req.query {
        builder = builder.query(key.as_str(), value.as_str());
    }
    for (name, value) in &req.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn send(&self, req: &HttpRequest) -> Result<HttpResponse, TyrError> {
        let body = req.body.as_deref();
        let result = match (req.method, body) {
            (HttpMethod::Get, _) => decorate(self.agent.get(&req.path), req).call(),
            (HttpMethod::Delete, _) => decorate(self.agent.delete(&req.path), req).call(),
            (HttpMethod::Post, Some(body)) => {
                decorate(self.agent.post(&req.path), req).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => decorate(self.agent.post(&req.path), req).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                decorate(self.agent.put(&req.path), req).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => decorate(self.agent.put(&req.path), req).send_empty(),
        };
        let mut response = result.map_err(|e| TyrError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TyrError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
