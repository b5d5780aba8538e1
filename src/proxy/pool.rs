use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::{ProxyHealth, ProxyRecord};
use crate::transport::HttpTransport;

/// Classification of a single reachability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ok,
    AuthFailed,
    RateLimited,
    /// Any other status, transport error or timeout. The record is kept.
    Inconclusive,
}

impl ProbeOutcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => ProbeOutcome::Ok,
            407 => ProbeOutcome::AuthFailed,
            429 => ProbeOutcome::RateLimited,
            _ => ProbeOutcome::Inconclusive,
        }
    }

    /// Apply this outcome to a record, returning the updated value
    fn apply(self, mut record: ProxyRecord) -> ProxyRecord {
        match self {
            ProbeOutcome::AuthFailed => record.mark_auth_failed(),
            ProbeOutcome::RateLimited => record.mark_rate_limited(),
            ProbeOutcome::Ok | ProbeOutcome::Inconclusive => {}
        }
        record
    }
}

/// Ordered set of proxies handed to the farming loop
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    records: Vec<ProxyRecord>,
}

impl ProxyPool {
    pub fn new(records: Vec<ProxyRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ProxyRecord] {
        &self.records
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ProxyRecord> {
        self.records.get_mut(index)
    }

    pub fn has_eligible(&self) -> bool {
        self.records.iter().any(ProxyRecord::is_eligible)
    }

    pub fn eligible_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_eligible()).count()
    }

    pub fn count(&self, health: ProxyHealth) -> usize {
        self.records.iter().filter(|r| r.health() == health).count()
    }
}

/// Result of validating a parsed proxy list
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub pool: ProxyPool,
    pub total: usize,
    pub auth_failed: usize,
    pub rate_limited: usize,
}

impl ValidationReport {
    pub fn all_valid(&self) -> bool {
        self.pool.len() == self.total
    }
}

/// Probes every proxy once through an IP-echo endpoint
pub struct ProxyValidator {
    transport: Arc<dyn HttpTransport>,
    probe_url: String,
    probe_timeout: Duration,
    concurrency: usize,
}

impl ProxyValidator {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        probe_url: String,
        probe_timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            transport,
            probe_url,
            probe_timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Probe all records concurrently and keep the ones with no flag set.
    ///
    /// Each task owns a copy of its record and hands back the updated value;
    /// results are put back in input order. Cancellation stops waiting and
    /// treats unfinished probes as inconclusive.
    pub async fn validate(
        &self,
        records: Vec<ProxyRecord>,
        cancel: &CancellationToken,
    ) -> ValidationReport {
        let total = records.len();
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, record) in records.iter().cloned().enumerate() {
            let permits = permits.clone();
            let transport = self.transport.clone();
            let url = self.probe_url.clone();
            let timeout = self.probe_timeout;

            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (index, record);
                };
                let outcome = probe_once(transport.as_ref(), &record, &url, timeout).await;
                (index, outcome.apply(record))
            });
        }

        let mut checked: Vec<ProxyRecord> = records;
        loop {
            let joined = tokio::select! {
                _ = cancel.cancelled() => {
                    log::warn!("Proxy validation cancelled with {} probes outstanding", tasks.len());
                    tasks.abort_all();
                    break;
                }
                joined = tasks.join_next() => joined,
            };

            match joined {
                Some(Ok((index, record))) => checked[index] = record,
                Some(Err(e)) => log::error!("Proxy probe task failed: {}", e),
                None => break,
            }
        }

        let auth_failed = checked.iter().filter(|r| r.is_auth_failed()).count();
        let rate_limited = checked
            .iter()
            .filter(|r| r.is_rate_limited() && !r.is_auth_failed())
            .count();
        let pool = ProxyPool::new(checked.into_iter().filter(ProxyRecord::is_eligible).collect());

        ValidationReport {
            pool,
            total,
            auth_failed,
            rate_limited,
        }
    }
}

async fn probe_once(
    transport: &dyn HttpTransport,
    record: &ProxyRecord,
    url: &str,
    timeout: Duration,
) -> ProbeOutcome {
    match tokio::time::timeout(timeout, transport.get(record, url)).await {
        Ok(Ok(response)) => {
            let outcome = ProbeOutcome::from_status(response.status);
            if outcome != ProbeOutcome::Ok {
                log::warn!(
                    "Proxy {} check error: {} {}",
                    record.redacted(),
                    response.status,
                    response.status_text()
                );
            }
            outcome
        }
        Ok(Err(e)) => {
            log::warn!("Proxy {} check error: {}", record.redacted(), e);
            ProbeOutcome::Inconclusive
        }
        Err(_) => {
            log::warn!("Proxy {} check timed out after {:?}", record.redacted(), timeout);
            ProbeOutcome::Inconclusive
        }
    }
}
