#![allow(dead_code)]

use async_trait::async_trait;
use fhe_address_book::api::contract::{ContactContract, ContractGateway, ContractResult};
use fhe_address_book::api::fhe::{FheClient, FheResult, ProofSubmitter};
use fhe_address_book::api::models::{
    CreateRecordArgs, DecryptionResult, EncryptedInput, Handle, RecordData, TxHandle, TxReceipt,
    VerifiedDecryption,
};
use fhe_address_book::api::session::StaticSession;
use fhe_address_book::{AddressBook, ContractError, FheError};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const CONTRACT: &str = "0xC0FFEE";
pub const ACCOUNT: &str = "0xA11CE";

struct StoredRecord {
    data: RecordData,
    plaintext: u64,
}

/// In-memory stand-in for the address-book contract. Writes take effect when
/// sent; confirmation always succeeds.
#[derive(Default)]
pub struct MockChain {
    records: Mutex<BTreeMap<String, StoredRecord>>,
    broken_ids: Mutex<HashSet<String>>,
    pub fail_list: AtomicBool,
    pub reject_writes: AtomicBool,
    pub unavailable: AtomicBool,
    pub create_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
    pub verify_successes: AtomicUsize,
    tx_seq: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, id: &str, name: &str, plaintext: u64, verified: bool) {
        self.records.lock().insert(
            id.to_string(),
            StoredRecord {
                data: RecordData {
                    name: name.to_string(),
                    description: format!("Email: {}@x.io | seeded", name.to_lowercase()),
                    public_field1: 5,
                    public_field2: 0,
                    created_at: fhe_address_book::utils::unix_now(),
                    creator: ACCOUNT.to_string(),
                    is_verified: verified,
                    verified_value: if verified { plaintext } else { 0 },
                },
                plaintext,
            },
        );
    }

    pub fn break_record(&self, id: &str) {
        self.broken_ids.lock().insert(id.to_string());
    }

    pub fn plaintext(&self, id: &str) -> Option<u64> {
        self.records.lock().get(id).map(|r| r.plaintext)
    }

    pub fn record(&self, id: &str) -> Option<RecordData> {
        self.records.lock().get(id).map(|r| r.data.clone())
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().len()
    }

    fn next_tx(&self) -> TxHandle {
        TxHandle {
            hash: format!("0xtx{}", self.tx_seq.fetch_add(1, Ordering::SeqCst)),
        }
    }
}

pub fn handle_for(id: &str) -> Handle {
    Handle(format!("0xhandle-{}", id))
}

struct MockContract {
    chain: Arc<MockChain>,
    signer: Option<String>,
}

impl MockContract {
    fn signer(&self) -> ContractResult<&str> {
        if self.chain.reject_writes.load(Ordering::SeqCst) {
            return Err(ContractError::UserRejected);
        }
        self.signer.as_deref().ok_or(ContractError::NoSigner)
    }
}

#[async_trait]
impl ContactContract for MockContract {
    fn address(&self) -> &str {
        CONTRACT
    }

    async fn get_all_record_ids(&self) -> ContractResult<Vec<String>> {
        if self.chain.fail_list.load(Ordering::SeqCst) {
            return Err(ContractError::Transport("HTTP 503".into()));
        }
        Ok(self.chain.records.lock().keys().cloned().collect())
    }

    async fn get_record(&self, id: &str) -> ContractResult<RecordData> {
        if self.chain.broken_ids.lock().contains(id) {
            return Err(ContractError::Decode(format!("bad record {}", id)));
        }
        let data = self.chain.record(id);
        // Let other tasks run between the read and its use.
        tokio::task::yield_now().await;
        data.ok_or_else(|| ContractError::Reverted("Record does not exist".into()))
    }

    async fn get_encrypted_handle(&self, id: &str) -> ContractResult<Handle> {
        tokio::task::yield_now().await;
        match self.chain.records.lock().contains_key(id) {
            true => Ok(handle_for(id)),
            false => Err(ContractError::Reverted("Record does not exist".into())),
        }
    }

    async fn is_available(&self) -> ContractResult<bool> {
        Ok(!self.chain.unavailable.load(Ordering::SeqCst))
    }

    async fn create_record(&self, args: CreateRecordArgs) -> ContractResult<TxHandle> {
        self.chain.create_calls.fetch_add(1, Ordering::SeqCst);
        let creator = self.signer()?.to_string();
        let plaintext = args
            .encrypted_payload
            .strip_prefix("enc:")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| ContractError::Reverted("Invalid encrypted input".into()))?;
        self.chain.records.lock().insert(
            args.id.clone(),
            StoredRecord {
                data: RecordData {
                    name: args.name,
                    description: args.description,
                    public_field1: args.priority as u32,
                    public_field2: args.reserved_field,
                    created_at: fhe_address_book::utils::unix_now(),
                    creator,
                    is_verified: false,
                    verified_value: 0,
                },
                plaintext,
            },
        );
        Ok(self.chain.next_tx())
    }

    async fn verify_decryption(&self, id: &str, encoded: &str, _proof: &str) -> ContractResult<TxHandle> {
        self.chain.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.signer()?;
        let value: u64 = encoded
            .strip_prefix("abi:")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| ContractError::Reverted("Invalid decryption proof".into()))?;
        let mut records = self.chain.records.lock();
        let record = records
            .get_mut(id)
            .ok_or_else(|| ContractError::Reverted("Record does not exist".into()))?;
        if record.data.is_verified {
            return Err(ContractError::Reverted("Data already verified".into()));
        }
        record.data.is_verified = true;
        record.data.verified_value = value;
        drop(records);
        self.chain.verify_successes.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain.next_tx())
    }

    async fn wait_for_confirmation(&self, tx: &TxHandle) -> ContractResult<TxReceipt> {
        tokio::task::yield_now().await;
        Ok(TxReceipt {
            hash: tx.hash.clone(),
            block_number: Some(1),
        })
    }
}

pub struct MockGateway {
    chain: Arc<MockChain>,
    session: Arc<StaticSession>,
}

#[async_trait]
impl ContractGateway for MockGateway {
    async fn read_only(&self) -> ContractResult<Arc<dyn ContactContract>> {
        Ok(Arc::new(MockContract {
            chain: self.chain.clone(),
            signer: None,
        }))
    }

    async fn with_signer(&self) -> ContractResult<Arc<dyn ContactContract>> {
        use fhe_address_book::api::session::SessionProvider;
        let account = self.session.account().ok_or(ContractError::NoSigner)?;
        Ok(Arc::new(MockContract {
            chain: self.chain.clone(),
            signer: Some(account),
        }))
    }
}

/// Encrypts as `enc:<value>` and decrypts by reading the chain's plaintext.
pub struct MockFhe {
    chain: Arc<MockChain>,
    initialized: AtomicBool,
    pub init_calls: AtomicUsize,
    pub fail_decrypt: AtomicBool,
}

#[async_trait]
impl FheClient for MockFhe {
    async fn initialize(&self) -> FheResult<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn encrypt(&self, contract: &str, _caller: &str, value: u64) -> FheResult<EncryptedInput> {
        if !self.is_initialized() {
            return Err(FheError::NotInitialized);
        }
        assert_eq!(contract, CONTRACT);
        Ok(EncryptedInput {
            encrypted_data: format!("enc:{}", value),
            proof: "input-proof".into(),
        })
    }

    async fn verify_decryption(
        &self,
        handles: &[Handle],
        _contract: &str,
        submitter: &dyn ProofSubmitter,
    ) -> FheResult<VerifiedDecryption> {
        if self.fail_decrypt.load(Ordering::SeqCst) {
            return Err(FheError::Relayer("HTTP 500: gateway down".into()));
        }
        let mut clear_values = HashMap::new();
        for handle in handles {
            let id = handle
                .as_str()
                .strip_prefix("0xhandle-")
                .ok_or_else(|| FheError::MissingClearValue(handle.to_string()))?;
            let value = self
                .chain
                .plaintext(id)
                .ok_or_else(|| FheError::MissingClearValue(handle.to_string()))?;
            clear_values.insert(handle.clone(), value);
        }
        let encoded = handles
            .first()
            .and_then(|h| clear_values.get(h))
            .map(|v| format!("abi:{}", v))
            .unwrap_or_default();
        submitter.submit(&encoded, "decryption-proof").await?;
        Ok(VerifiedDecryption {
            decryption_result: DecryptionResult { clear_values },
        })
    }
}

pub struct Harness {
    pub chain: Arc<MockChain>,
    pub fhe: Arc<MockFhe>,
    pub session: Arc<StaticSession>,
    pub book: Arc<AddressBook>,
}

pub fn harness(account: Option<&str>) -> Harness {
    let chain = MockChain::new();
    let session = Arc::new(StaticSession::new(account.map(str::to_string)));
    let gateway = Arc::new(MockGateway {
        chain: chain.clone(),
        session: session.clone(),
    });
    let fhe = Arc::new(MockFhe {
        chain: chain.clone(),
        initialized: AtomicBool::new(false),
        init_calls: AtomicUsize::new(0),
        fail_decrypt: AtomicBool::new(false),
    });
    let book = Arc::new(AddressBook::new(
        gateway,
        fhe.clone(),
        session.clone(),
        Duration::from_secs(3),
    ));
    Harness {
        chain,
        fhe,
        session,
        book,
    }
}

pub fn connected() -> Harness {
    harness(Some(ACCOUNT))
}
