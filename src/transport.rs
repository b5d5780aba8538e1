/// HTTP egress through a selected proxy
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Proxy};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::TransportError;
use crate::proxy::ProxyRecord;

/// What came back from the remote, whatever the status
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw `retry-after` header, if the server sent one
    pub retry_after: Option<String>,
    pub body: String,
}

impl HttpResponse {
    /// What a proxy that refused our credentials amounts to
    pub fn proxy_auth_required() -> Self {
        Self {
            status: 407,
            retry_after: None,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Canonical reason phrase for the status, e.g. "Too Many Requests"
    pub fn status_text(&self) -> &'static str {
        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
    }
}

/// Sends requests routed through a given proxy.
/// A non-2xx status is a successful transport call; only failing to get
/// any response is a `TransportError`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, proxy: &ProxyRecord, url: &str) -> Result<HttpResponse, TransportError>;

    async fn post_json(
        &self,
        proxy: &ProxyRecord,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError>;
}

/// Routes with `Proxy::all` so credentials in the endpoint URL are sent as
/// proxy basic auth. One client is kept per endpoint.
pub struct ReqwestTransport {
    timeout: Duration,
    clients: Mutex<HashMap<String, Client>>,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            clients: Mutex::new(HashMap::new()),
        }
    }

    async fn client_for(&self, proxy: &ProxyRecord) -> Result<Client, TransportError> {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(proxy.endpoint()) {
            return Ok(client.clone());
        }

        let invalid = |e: reqwest::Error| TransportError::InvalidProxy {
            proxy: proxy.redacted(),
            reason: e.to_string(),
        };
        let route = Proxy::all(proxy.endpoint()).map_err(invalid)?;
        let client = ClientBuilder::new()
            .proxy(route)
            .timeout(self.timeout)
            .build()
            .map_err(invalid)?;

        clients.insert(proxy.endpoint().to_string(), client.clone());
        Ok(client)
    }

    async fn send(request: reqwest::RequestBuilder) -> Result<HttpResponse, TransportError> {
        match request.send().await {
            Ok(response) => Self::read(response).await,
            // HTTPS goes through a CONNECT tunnel; a 407 there surfaces as a
            // connect error rather than a response
            Err(e) if is_tunnel_auth_rejection(&e) => Ok(HttpResponse::proxy_auth_required()),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(response: reqwest::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            retry_after,
            body,
        })
    }
}

fn is_tunnel_auth_rejection(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if e.to_string().contains("proxy authentication required") {
            return true;
        }
        source = e.source();
    }
    false
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, proxy: &ProxyRecord, url: &str) -> Result<HttpResponse, TransportError> {
        let client = self.client_for(proxy).await?;
        Self::send(client.get(url)).await
    }

    async fn post_json(
        &self,
        proxy: &ProxyRecord,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        let client = self.client_for(proxy).await?;
        Self::send(client.post(url).json(body)).await
    }
}
