use crate::api::contract::ContactContract;
use crate::api::models::{EncryptedInput, Handle, VerifiedDecryption};
use crate::error::{ContractError, FheError};
use async_trait::async_trait;
use std::sync::Arc;

pub type FheResult<T> = Result<T, FheError>;

/// The "submit proof" step of a decryption-verification handshake. The FHE
/// client calls it once it holds the ABI-encoded cleartexts and their proof,
/// and only returns after it resolves.
#[async_trait]
pub trait ProofSubmitter: Send + Sync {
    async fn submit(&self, encoded_clear_values: &str, proof: &str) -> Result<(), ContractError>;
}

#[async_trait]
pub trait FheClient: Send + Sync {
    /// Loads key material. Idempotent; must succeed before encrypt or decrypt.
    async fn initialize(&self) -> FheResult<()>;

    fn is_initialized(&self) -> bool;

    async fn encrypt(
        &self,
        contract_address: &str,
        caller_address: &str,
        value: u64,
    ) -> FheResult<EncryptedInput>;

    async fn verify_decryption(
        &self,
        handles: &[Handle],
        contract_address: &str,
        submitter: &dyn ProofSubmitter,
    ) -> FheResult<VerifiedDecryption>;
}

/// Submits the decryption proof for one record through a signer-bound handle
/// and waits for the write to be mined.
pub struct RecordProofSubmitter {
    contract: Arc<dyn ContactContract>,
    record_id: String,
}

impl RecordProofSubmitter {
    pub fn new(contract: Arc<dyn ContactContract>, record_id: impl Into<String>) -> Self {
        Self {
            contract,
            record_id: record_id.into(),
        }
    }
}

#[async_trait]
impl ProofSubmitter for RecordProofSubmitter {
    async fn submit(&self, encoded_clear_values: &str, proof: &str) -> Result<(), ContractError> {
        let tx = self
            .contract
            .verify_decryption(&self.record_id, encoded_clear_values, proof)
            .await?;
        log::debug!("verifyDecryption for {} sent as {}", self.record_id, tx.hash);
        let receipt = self.contract.wait_for_confirmation(&tx).await?;
        log::info!("decryption of {} verified in {}", self.record_id, receipt.hash);
        Ok(())
    }
}
