//! In-memory fakes for the transport and chain seams

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::chain::{ChainClient, Identity, MintReceipt, MintTemplate};
use crate::error::TransportError;
use crate::proxy::ProxyRecord;
use crate::transport::{HttpResponse, HttpTransport};

#[derive(Debug, Clone)]
enum ProbeBehaviour {
    Status(u16),
    Fail,
    Hang,
}

#[derive(Debug, Clone)]
pub enum FaucetReply {
    Status(u16),
    Body(u16, String),
    TransportError,
}

/// Scripted responses keyed by the proxy's `ip:port`.
/// Probes default to 200; faucet calls pop the host's script and fall back
/// to `faucet_default` once it runs dry.
pub struct FakeTransport {
    probes: Mutex<HashMap<String, ProbeBehaviour>>,
    faucet: Mutex<HashMap<String, VecDeque<FaucetReply>>>,
    faucet_default: Mutex<FaucetReply>,
    probe_calls: AtomicUsize,
    faucet_calls: Mutex<Vec<(String, Value)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            probes: Mutex::new(HashMap::new()),
            faucet: Mutex::new(HashMap::new()),
            faucet_default: Mutex::new(FaucetReply::Status(500)),
            probe_calls: AtomicUsize::new(0),
            faucet_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_probe_status(&self, host: &str, status: u16) {
        self.probes
            .lock()
            .unwrap()
            .insert(host.to_string(), ProbeBehaviour::Status(status));
    }

    pub fn fail_probe(&self, host: &str) {
        self.probes.lock().unwrap().insert(host.to_string(), ProbeBehaviour::Fail);
    }

    pub fn hang_probe(&self, host: &str) {
        self.probes.lock().unwrap().insert(host.to_string(), ProbeBehaviour::Hang);
    }

    pub fn script_faucet(&self, host: &str, replies: Vec<FaucetReply>) {
        self.faucet
            .lock()
            .unwrap()
            .insert(host.to_string(), replies.into_iter().collect());
    }

    pub fn set_faucet_default(&self, reply: FaucetReply) {
        *self.faucet_default.lock().unwrap() = reply;
    }

    pub fn probe_count(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn faucet_calls(&self) -> Vec<(String, Value)> {
        self.faucet_calls.lock().unwrap().clone()
    }

    fn response(status: u16, body: String) -> HttpResponse {
        HttpResponse {
            status,
            retry_after: (status == 429).then(|| "60".to_string()),
            body,
        }
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get(&self, proxy: &ProxyRecord, _url: &str) -> Result<HttpResponse, TransportError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let behaviour = self
            .probes
            .lock()
            .unwrap()
            .get(&proxy.redacted())
            .cloned()
            .unwrap_or(ProbeBehaviour::Status(200));

        match behaviour {
            ProbeBehaviour::Status(status) => {
                Ok(Self::response(status, r#"{"ip":"203.0.113.7"}"#.to_string()))
            }
            ProbeBehaviour::Fail => Err(TransportError::Request("connection refused".to_string())),
            ProbeBehaviour::Hang => std::future::pending().await,
        }
    }

    async fn post_json(
        &self,
        proxy: &ProxyRecord,
        _url: &str,
        body: &Value,
    ) -> Result<HttpResponse, TransportError> {
        let host = proxy.redacted();
        self.faucet_calls.lock().unwrap().push((host.clone(), body.clone()));

        let scripted = self
            .faucet
            .lock()
            .unwrap()
            .get_mut(&host)
            .and_then(VecDeque::pop_front);
        let reply = match scripted {
            Some(reply) => reply,
            None => self.faucet_default.lock().unwrap().clone(),
        };

        match reply {
            FaucetReply::Status(status) => {
                let body = if (200..300).contains(&status) {
                    r#"{"transferredGasObjects":[{"amount":10000000000}]}"#.to_string()
                } else {
                    String::new()
                };
                Ok(Self::response(status, body))
            }
            FaucetReply::Body(status, body) => Ok(Self::response(status, body)),
            FaucetReply::TransportError => Err(TransportError::Timeout),
        }
    }
}

/// Deterministic chain: identities are numbered, every submission succeeds
/// unless told otherwise.
pub struct FakeChain {
    identities: AtomicUsize,
    fail_identity: AtomicBool,
    fail_at: Mutex<Option<usize>>,
    submissions: Mutex<Vec<(String, String)>>,
    /// When set, every submission records whether the identity's mnemonic
    /// was already in this file
    mnemonic_file: Mutex<Option<PathBuf>>,
    persisted_at_submit: Mutex<Vec<bool>>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self {
            identities: AtomicUsize::new(0),
            fail_identity: AtomicBool::new(false),
            fail_at: Mutex::new(None),
            submissions: Mutex::new(Vec::new()),
            mnemonic_file: Mutex::new(None),
            persisted_at_submit: Mutex::new(Vec::new()),
        }
    }

    /// Make the submission with this zero-based index fail
    pub fn fail_submission(&self, index: usize) {
        *self.fail_at.lock().unwrap() = Some(index);
    }

    pub fn fail_identity_generation(&self, fail: bool) {
        self.fail_identity.store(fail, Ordering::SeqCst);
    }

    pub fn watch_mnemonic_file(&self, path: PathBuf) {
        *self.mnemonic_file.lock().unwrap() = Some(path);
    }

    pub fn submissions(&self) -> Vec<(String, String)> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn persisted_at_submit(&self) -> Vec<bool> {
        self.persisted_at_submit.lock().unwrap().clone()
    }

    pub fn identities_generated(&self) -> usize {
        self.identities.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    fn generate_identity(&self) -> Result<Identity> {
        if self.fail_identity.load(Ordering::SeqCst) {
            return Err(anyhow!("entropy source unavailable"));
        }
        let n = self.identities.fetch_add(1, Ordering::SeqCst) + 1;
        let mnemonic = format!("phrase number {}", n);
        let address = self.derive_address(&mnemonic)?;
        Ok(Identity::new(mnemonic, address))
    }

    fn derive_address(&self, mnemonic: &str) -> Result<String> {
        let n: u64 = mnemonic
            .rsplit(' ')
            .next()
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| anyhow!("not a fake mnemonic"))?;
        Ok(format!("0x{:064x}", n))
    }

    async fn submit_mint(&self, identity: &Identity, template: &MintTemplate) -> Result<MintReceipt> {
        if let Some(path) = self.mnemonic_file.lock().unwrap().as_ref() {
            let persisted = std::fs::read_to_string(path)
                .map(|content| content.lines().any(|l| l == identity.mnemonic()))
                .unwrap_or(false);
            self.persisted_at_submit.lock().unwrap().push(persisted);
        }

        let index = {
            let mut submissions = self.submissions.lock().unwrap();
            submissions.push((identity.address.clone(), template.name.clone()));
            submissions.len() - 1
        };

        if *self.fail_at.lock().unwrap() == Some(index) {
            return Err(anyhow!("node connection reset"));
        }

        Ok(MintReceipt {
            template: template.name.clone(),
            digest: format!("digest-{}", index),
        })
    }
}
