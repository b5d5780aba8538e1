/// Sequential mint batches for a funded identity
use std::sync::Arc;

use crate::chain::{ChainClient, Identity, MintReceipt, MintTemplate};

#[derive(Debug, Clone)]
pub enum MintBatchOutcome {
    Complete(Vec<MintReceipt>),
    /// Funds were obtained but the batch stopped at `failed_template`
    Partial {
        receipts: Vec<MintReceipt>,
        failed_template: String,
        reason: String,
    },
}

impl MintBatchOutcome {
    pub fn receipts(&self) -> &[MintReceipt] {
        match self {
            MintBatchOutcome::Complete(receipts) => receipts,
            MintBatchOutcome::Partial { receipts, .. } => receipts,
        }
    }
}

pub struct IdentityMinter {
    chain: Arc<dyn ChainClient>,
}

impl IdentityMinter {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    /// Mint every template in order, one at a time. The first failure ends
    /// the batch. Calling this twice mints everything twice.
    pub async fn mint_batch(&self, identity: &Identity, templates: &[MintTemplate]) -> MintBatchOutcome {
        let mut receipts = Vec::with_capacity(templates.len());

        for template in templates {
            log::info!("Minting: {}", template.description);
            match self.chain.submit_mint(identity, template).await {
                Ok(receipt) => receipts.push(receipt),
                Err(e) => {
                    log::error!("Mint '{}' failed for {}: {:#}", template.name, identity.address, e);
                    return MintBatchOutcome::Partial {
                        receipts,
                        failed_template: template.name.clone(),
                        reason: format!("{:#}", e),
                    };
                }
            }
        }

        MintBatchOutcome::Complete(receipts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_templates;
    use crate::testing::FakeChain;

    #[tokio::test]
    async fn test_mints_every_template_in_order() {
        let chain = Arc::new(FakeChain::new());
        let minter = IdentityMinter::new(chain.clone());
        let identity = chain.generate_identity().unwrap();
        let templates = default_templates();

        let outcome = minter.mint_batch(&identity, &templates).await;
        assert!(matches!(outcome, MintBatchOutcome::Complete(_)));

        let names: Vec<String> = outcome.receipts().iter().map(|r| r.template.clone()).collect();
        let expected: Vec<String> = templates.iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_failure_aborts_batch_with_partial_result() {
        let chain = Arc::new(FakeChain::new());
        chain.fail_submission(2);
        let minter = IdentityMinter::new(chain.clone());
        let identity = chain.generate_identity().unwrap();

        let outcome = minter.mint_batch(&identity, &default_templates()).await;
        match outcome {
            MintBatchOutcome::Partial {
                receipts,
                failed_template,
                ..
            } => {
                assert_eq!(receipts.len(), 2);
                assert_eq!(failed_template, "Wizard Land");
            }
            other => panic!("expected partial batch, got {:?}", other),
        }
        // nothing after the failure is attempted
        assert_eq!(chain.submissions().len(), 3);
    }

    #[tokio::test]
    async fn test_minting_is_not_idempotent() {
        let chain = Arc::new(FakeChain::new());
        let minter = IdentityMinter::new(chain.clone());
        let identity = chain.generate_identity().unwrap();
        let templates = vec![MintTemplate::new("One", "only one", "ipfs://one")];

        let first = minter.mint_batch(&identity, &templates).await;
        let second = minter.mint_batch(&identity, &templates).await;

        // a second batch mints a second asset, it is not deduplicated
        assert_eq!(first.receipts().len(), 1);
        assert_eq!(second.receipts().len(), 1);
        assert_ne!(first.receipts()[0].digest, second.receipts()[0].digest);
        assert_eq!(chain.submissions().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_template_list() {
        let chain = Arc::new(FakeChain::new());
        let minter = IdentityMinter::new(chain.clone());
        let identity = chain.generate_identity().unwrap();

        let outcome = minter.mint_batch(&identity, &[]).await;
        assert!(outcome.receipts().is_empty());
        assert!(chain.submissions().is_empty());
    }
}
