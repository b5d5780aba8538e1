/// Farming statistics collection and reporting
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Farming statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmStatistics {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub run_duration: Duration,

    // Pool
    pub proxies_total: usize,
    pub proxies_validated: usize,
    pub proxies_rate_limited: usize,

    // Loop
    pub passes: u32,
    pub funding_attempts: u64,
    pub fundings_granted: u64,
    pub fundings_denied: u64,

    // Results
    pub funded_addresses: Vec<String>,
    pub mint_receipts: u64,
    pub partial_batches: u64,

    // Errors
    pub iteration_errors: u64,
    pub last_error: Option<String>,
}

impl Default for FarmStatistics {
    fn default() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            run_duration: Duration::from_secs(0),
            proxies_total: 0,
            proxies_validated: 0,
            proxies_rate_limited: 0,
            passes: 0,
            funding_attempts: 0,
            fundings_granted: 0,
            fundings_denied: 0,
            funded_addresses: Vec::new(),
            mint_receipts: 0,
            partial_batches: 0,
            iteration_errors: 0,
            last_error: None,
        }
    }
}

impl FarmStatistics {
    /// One-line summary for the end of a run
    pub fn summary(&self) -> String {
        format!(
            "Used {}/{} proxies over {} passes: {} identities funded, {} assets minted, {} partial batches, {} errors",
            self.proxies_validated,
            self.proxies_total,
            self.passes,
            self.fundings_granted,
            self.mint_receipts,
            self.partial_batches,
            self.iteration_errors,
        )
    }
}

/// Statistics collector for a farming run.
/// The loop is single-threaded, so this is plain owned state.
pub struct StatsCollector {
    stats: FarmStatistics,
    start_time: Instant,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            stats: FarmStatistics::default(),
            start_time: Instant::now(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.stats.run_id
    }

    pub fn pool_validated(&mut self, total: usize, validated: usize) {
        self.stats.proxies_total = total;
        self.stats.proxies_validated = validated;
    }

    pub fn pass_started(&mut self) {
        self.stats.passes += 1;
    }

    pub fn funding_attempted(&mut self) {
        self.stats.funding_attempts += 1;
    }

    pub fn funding_granted(&mut self, address: &str) {
        self.stats.fundings_granted += 1;
        self.stats.funded_addresses.push(address.to_string());
    }

    pub fn funding_denied(&mut self) {
        self.stats.fundings_denied += 1;
    }

    pub fn proxy_rate_limited(&mut self) {
        self.stats.proxies_rate_limited += 1;
    }

    pub fn minted(&mut self, receipts: usize, complete: bool) {
        self.stats.mint_receipts += receipts as u64;
        if !complete {
            self.stats.partial_batches += 1;
        }
    }

    pub fn record_error(&mut self, message: String) {
        self.stats.iteration_errors += 1;
        self.stats.last_error = Some(message);
    }

    /// Current statistics snapshot
    pub fn get_stats(&self) -> FarmStatistics {
        let mut stats = self.stats.clone();
        stats.run_duration = self.start_time.elapsed();
        stats
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
