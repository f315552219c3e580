//! Boundary of the on-chain address-book contract.
//!
//! The contract is consumed, never reimplemented: these traits describe the
//! calls the orchestrator makes and the bridge adapters in [`crate::api::client`]
//! (or test doubles) fulfil them.

use crate::api::models::{CreateRecordArgs, Handle, RecordData, TxHandle, TxReceipt};
use crate::error::ContractError;
use async_trait::async_trait;
use std::sync::Arc;

pub type ContractResult<T> = Result<T, ContractError>;

/// One handle onto the contract. Read calls work on every handle; write calls
/// need a signer-bound handle and fail with [`ContractError::NoSigner`] otherwise.
#[async_trait]
pub trait ContactContract: Send + Sync {
    fn address(&self) -> &str;

    async fn get_all_record_ids(&self) -> ContractResult<Vec<String>>;

    async fn get_record(&self, id: &str) -> ContractResult<RecordData>;

    async fn get_encrypted_handle(&self, id: &str) -> ContractResult<Handle>;

    async fn is_available(&self) -> ContractResult<bool>;

    async fn create_record(&self, args: CreateRecordArgs) -> ContractResult<TxHandle>;

    async fn verify_decryption(
        &self,
        id: &str,
        encoded_clear_values: &str,
        proof: &str,
    ) -> ContractResult<TxHandle>;

    /// Resolves once the transaction is mined; timeouts are the handle's concern.
    async fn wait_for_confirmation(&self, tx: &TxHandle) -> ContractResult<TxReceipt>;
}

/// Produces contract handles for the current session.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    async fn read_only(&self) -> ContractResult<Arc<dyn ContactContract>>;

    async fn with_signer(&self) -> ContractResult<Arc<dyn ContactContract>>;
}
