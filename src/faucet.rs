/// Faucet funding requests routed through a proxy
use serde_json::{json, Value};
use std::sync::Arc;

use crate::proxy::ProxyRecord;
use crate::transport::HttpTransport;

/// What one funding request produced
#[derive(Debug, Clone, PartialEq)]
pub enum FundingOutcome {
    /// Faucet accepted the request; holds the parsed response body
    Granted(Value),
    /// 429 from the faucet. The proxy has been flagged.
    RateLimited { retry_after: Option<String> },
    /// Anything else. The proxy is not penalised.
    Denied { status: Option<u16>, reason: String },
}

pub struct FaucetClient {
    transport: Arc<dyn HttpTransport>,
    faucet_url: String,
}

impl FaucetClient {
    pub fn new(transport: Arc<dyn HttpTransport>, faucet_url: String) -> Self {
        Self {
            transport,
            faucet_url,
        }
    }

    pub fn request_body(recipient: &str) -> Value {
        json!({ "FixedAmountRequest": { "recipient": recipient } })
    }

    /// Issue exactly one funding request through `record`.
    /// Sets `rate_limited` on the record when the faucet answers 429.
    pub async fn request_funds(&self, record: &mut ProxyRecord, address: &str) -> FundingOutcome {
        log::info!("Requesting funds from faucet with proxy {}", record.redacted());

        let body = Self::request_body(address);
        let response = match self.transport.post_json(record, &self.faucet_url, &body).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Faucet error via {}: {}", record.redacted(), e);
                return FundingOutcome::Denied {
                    status: None,
                    reason: e.to_string(),
                };
            }
        };

        match response.status {
            _ if response.is_success() => match serde_json::from_str::<Value>(&response.body) {
                Ok(payload) => {
                    log::info!("Faucet request status: {}", response.status_text());
                    FundingOutcome::Granted(payload)
                }
                Err(e) => {
                    log::warn!("Faucet returned unreadable body via {}: {}", record.redacted(), e);
                    FundingOutcome::Denied {
                        status: Some(response.status),
                        reason: format!("unparseable body: {}", e),
                    }
                }
            },
            429 => {
                record.mark_rate_limited();
                log::warn!(
                    "Proxy {} rate limited, faucet asks to wait {} seconds",
                    record.redacted(),
                    response.retry_after.as_deref().unwrap_or("unknown")
                );
                FundingOutcome::RateLimited {
                    retry_after: response.retry_after,
                }
            }
            status => {
                log::warn!(
                    "Faucet error via {}: {} {}",
                    record.redacted(),
                    status,
                    response.status_text()
                );
                FundingOutcome::Denied {
                    status: Some(status),
                    reason: response.status_text().to_string(),
                }
            }
        }
    }
}
