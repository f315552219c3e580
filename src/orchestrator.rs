//! Sequencing of the address-book workflows against the contract and the FHE
//! client. Every public operation catches its own failures: the outcome is
//! reported through the status banner and the operation log, never returned
//! as an error.

use crate::api::contract::ContractGateway;
use crate::api::fhe::{FheClient, RecordProofSubmitter};
use crate::api::models::CreateRecordArgs;
use crate::api::session::SessionProvider;
use crate::error::{AppError, AppResult, FheError};
use crate::oplog::{OperationKind, OperationLog, OperationRecord, Outcome};
use crate::state::{AppSnapshot, ContactStats, NewContact, Selection, StatusMessage};
use crate::storage::{Contact, ContactStore};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

const CHECK_STATUS_TTL: Duration = Duration::from_secs(2);
/// Secondary public field of a record; not used by the address book.
const RESERVED_FIELD: u32 = 0;
const MAX_PRIORITY: u8 = 10;

#[derive(Debug, Default)]
struct ViewState {
    contract_address: Option<String>,
    status: Option<StatusMessage>,
    selection: Option<Selection>,
    form_open: bool,
    draft: NewContact,
    refreshing: bool,
    creating: bool,
    /// Decrypts still running; several may overlap.
    decrypts_in_flight: usize,
}

impl ViewState {
    fn begin_decrypt(&mut self) {
        self.decrypts_in_flight += 1;
    }

    fn end_decrypt(&mut self) {
        self.decrypts_in_flight = self.decrypts_in_flight.saturating_sub(1);
    }

    fn decrypting(&self) -> bool {
        self.decrypts_in_flight > 0
    }
}

enum Decrypted {
    /// Chain state already held the verified value; nothing was written.
    Stored { name: String, value: u64 },
    /// A new verification was written and confirmed.
    Fresh { name: String, value: u64 },
}

pub struct AddressBook {
    gateway: Arc<dyn ContractGateway>,
    fhe: Arc<dyn FheClient>,
    session: Arc<dyn SessionProvider>,
    store: ContactStore,
    log: OperationLog,
    view: RwLock<ViewState>,
    status_ttl: Duration,
    notify: watch::Sender<AppSnapshot>,
}

impl AddressBook {
    pub fn new(
        gateway: Arc<dyn ContractGateway>,
        fhe: Arc<dyn FheClient>,
        session: Arc<dyn SessionProvider>,
        status_ttl: Duration,
    ) -> Self {
        let (notify, _) = watch::channel(AppSnapshot::default());
        Self {
            gateway,
            fhe,
            session,
            store: ContactStore::new(),
            log: OperationLog::new(),
            view: RwLock::new(ViewState::default()),
            status_ttl,
            notify,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AppSnapshot> {
        self.notify.subscribe()
    }

    pub fn snapshot(&self) -> AppSnapshot {
        let view = self.view.read();
        let now = Instant::now();
        AppSnapshot {
            connected: self.session.is_connected(),
            fhe_ready: self.fhe.is_initialized(),
            contract_address: view.contract_address.clone(),
            contacts: self.store.all(),
            stats: self.store.compute_stats(),
            operations: self.log.entries(),
            status: view.status.clone().filter(|s| s.is_visible_at(now)),
            selection: view.selection.clone(),
            form_open: view.form_open,
            draft: view.draft.clone(),
            refreshing: view.refreshing,
            creating: view.creating,
            decrypting: view.decrypting(),
        }
    }

    pub fn query(&self, term: &str) -> Vec<Contact> {
        self.store.query(term)
    }

    pub fn stats(&self) -> ContactStats {
        self.store.compute_stats()
    }

    pub fn contact(&self, id: &str) -> Option<Contact> {
        self.store.get(id)
    }

    pub fn operations(&self) -> Vec<OperationRecord> {
        self.log.entries()
    }

    fn publish(&self) {
        self.notify.send_replace(self.snapshot());
    }

    fn update(&self, f: impl FnOnce(&mut ViewState)) {
        f(&mut *self.view.write());
        self.publish();
    }

    fn set_status(&self, status: StatusMessage) {
        self.update(|v| v.status = Some(status));
    }

    fn record(&self, kind: OperationKind, subject: &str, outcome: Outcome) {
        self.log.append(kind, subject, outcome);
        self.publish();
    }

    fn require_account(&self) -> AppResult<String> {
        self.session
            .account()
            .filter(|_| self.session.is_connected())
            .ok_or(AppError::NotConnected)
    }

    fn report_not_connected(&self) {
        self.set_status(StatusMessage::error(
            AppError::NotConnected.creation_message(),
            self.status_ttl,
        ));
    }

    async fn ensure_fhe(&self) -> AppResult<()> {
        if !self.fhe.is_initialized() {
            self.fhe.initialize().await?;
        }
        Ok(())
    }

    /// Starts a session: loads FHE key material, then the contacts and the
    /// contract address. Whatever the previous session left behind is dropped
    /// first. Does nothing while disconnected.
    pub async fn connect(&self) {
        self.reset_session();
        if !self.session.is_connected() {
            log::info!("no wallet connected, nothing to load");
            return;
        }

        if let Err(e) = self.ensure_fhe().await {
            log::error!("FHE initialization failed: {}", e);
            self.set_status(StatusMessage::error("FHEVM initialization failed", self.status_ttl));
        }

        self.refresh().await;
        match self.gateway.read_only().await {
            Ok(contract) => {
                let address = contract.address().to_string();
                self.update(|v| v.contract_address = Some(address));
            }
            Err(e) => log::error!("contract unavailable: {}", e),
        }
    }

    /// Drops all session state; the chain remains the durable copy.
    pub fn disconnect(&self) {
        self.reset_session();
    }

    fn reset_session(&self) {
        self.store.clear();
        self.log.clear();
        self.update(|v| *v = ViewState::default());
    }

    async fn reload(&self) -> AppResult<usize> {
        self.update(|v| v.refreshing = true);
        let result = match self.gateway.read_only().await {
            Ok(contract) => self.store.refresh(contract.as_ref()).await,
            Err(e) => Err(e),
        };
        self.update(|v| v.refreshing = false);
        Ok(result?)
    }

    /// Reloads every contact from the chain. Returns whether the reload ran.
    pub async fn refresh(&self) -> bool {
        if !self.session.is_connected() {
            return false;
        }
        match self.reload().await {
            Ok(_) => true,
            Err(e) => {
                log::error!("failed to load contacts: {}", e);
                self.set_status(StatusMessage::error("Failed to load contacts", self.status_ttl));
                false
            }
        }
    }

    /// Asks the contract whether it is deployed and accepting calls.
    pub async fn check_availability(&self) -> bool {
        if self.require_account().is_err() {
            self.report_not_connected();
            return false;
        }
        let available = match self.gateway.read_only().await {
            Ok(contract) => contract.is_available().await,
            Err(e) => Err(e),
        };
        match available {
            Ok(true) => {
                self.set_status(StatusMessage::success(
                    "FHE Contract is available and ready!",
                    CHECK_STATUS_TTL,
                ));
                self.record(OperationKind::Verify, "System Check", Outcome::Success);
                true
            }
            Ok(false) => false,
            Err(e) => {
                log::error!("contract check failed: {}", e);
                self.set_status(StatusMessage::error("Contract check failed", CHECK_STATUS_TTL));
                false
            }
        }
    }

    pub fn open_form(&self) {
        self.update(|v| v.form_open = true);
    }

    pub fn close_form(&self) {
        self.update(|v| v.form_open = false);
    }

    pub fn edit_draft(&self, f: impl FnOnce(&mut NewContact)) {
        self.update(|v| f(&mut v.draft));
    }

    pub fn select_contact(&self, id: &str) -> Option<Contact> {
        let contact = self.store.get(id)?;
        self.update(|v| {
            v.selection = Some(Selection {
                contact_id: contact.id.clone(),
                decrypted_phone: None,
            })
        });
        Some(contact)
    }

    /// Closing the detail view forgets any decrypted phone number.
    pub fn close_contact(&self) {
        self.update(|v| v.selection = None);
    }

    /// Submits the current form draft.
    pub async fn submit_form(&self) -> Option<String> {
        let draft = self.view.read().draft.clone();
        self.create_contact(&draft).await
    }

    /// Encrypts the phone number, stores the contact on-chain and reloads the
    /// store. Returns the new contact id on success.
    pub async fn create_contact(&self, draft: &NewContact) -> Option<String> {
        let account = match self.require_account() {
            Ok(a) => a,
            Err(_) => {
                self.report_not_connected();
                return None;
            }
        };
        if let Err(e) = validate(draft) {
            self.set_status(StatusMessage::error(e.creation_message(), self.status_ttl));
            return None;
        }

        self.update(|v| {
            v.creating = true;
            v.status = Some(StatusMessage::pending("Encrypting contact with Zama FHE..."));
        });

        let result = self.try_create(draft, &account).await;
        let created = match result {
            Ok(id) => {
                log::info!("contact {} created", id);
                self.set_status(StatusMessage::success("Contact encrypted and stored!", self.status_ttl));
                self.record(OperationKind::Create, &draft.name, Outcome::Success);
                if let Err(e) = self.reload().await {
                    log::warn!("reload after create failed: {}", e);
                }
                self.update(|v| {
                    v.form_open = false;
                    v.draft = NewContact::default();
                });
                Some(id)
            }
            Err(e) => {
                log::error!("creating contact {:?} failed: {}", draft.name, e);
                self.set_status(StatusMessage::error(e.creation_message(), self.status_ttl));
                self.record(OperationKind::Create, &draft.name, Outcome::Error);
                None
            }
        };

        self.update(|v| v.creating = false);
        created
    }

    async fn try_create(&self, draft: &NewContact, account: &str) -> AppResult<String> {
        let contract = self.gateway.with_signer().await?;
        let value = crate::utils::parse_phone_digits(&draft.phone);
        let id = crate::utils::new_contact_id();

        self.ensure_fhe().await?;
        let encrypted = self.fhe.encrypt(contract.address(), account, value).await?;

        let tx = contract
            .create_record(CreateRecordArgs {
                id: id.clone(),
                name: draft.name.clone(),
                encrypted_payload: encrypted.encrypted_data,
                proof: encrypted.proof,
                priority: draft.priority,
                reserved_field: RESERVED_FIELD,
                description: draft.composed_description(),
            })
            .await?;

        self.set_status(StatusMessage::pending("Storing encrypted contact on-chain..."));
        contract.wait_for_confirmation(&tx).await?;
        Ok(id)
    }

    /// Reveals a contact's phone number. A record already verified on-chain
    /// returns its stored value without any write; otherwise the decryption is
    /// proven on-chain first. The value is only kept on the current selection.
    pub async fn decrypt_contact(&self, id: &str) -> Option<u64> {
        if self.require_account().is_err() {
            self.report_not_connected();
            return None;
        }

        self.update(ViewState::begin_decrypt);
        let mut subject = self.store.get(id).map(|c| c.name);

        let revealed = match self.try_decrypt(id, &mut subject).await {
            Ok(Decrypted::Stored { name, value }) => {
                self.set_status(StatusMessage::success("Phone number already verified", self.status_ttl));
                self.record(OperationKind::Verify, &name, Outcome::Success);
                Some(value)
            }
            Ok(Decrypted::Fresh { name, value }) => {
                self.set_status(StatusMessage::success(
                    "Phone number decrypted and verified!",
                    self.status_ttl,
                ));
                self.record(OperationKind::Decrypt, &name, Outcome::Success);
                Some(value)
            }
            Err(e) if e.is_already_verified() => {
                log::info!("{} was verified concurrently", id);
                self.set_status(StatusMessage::success("Phone number already verified", self.status_ttl));
                if let Err(e) = self.reload().await {
                    log::warn!("reload after concurrent verification failed: {}", e);
                }
                None
            }
            Err(e) => {
                log::error!("decrypting {} failed: {}", id, e);
                self.set_status(StatusMessage::error(e.decryption_message(), self.status_ttl));
                let name = subject.as_deref().unwrap_or("Unknown");
                self.record(OperationKind::Decrypt, name, Outcome::Error);
                None
            }
        };

        self.update(|v| {
            v.end_decrypt();
            if let (Some(value), Some(sel)) = (revealed, v.selection.as_mut()) {
                if sel.contact_id == id {
                    sel.decrypted_phone = Some(value);
                }
            }
        });
        revealed
    }

    async fn try_decrypt(&self, id: &str, subject: &mut Option<String>) -> AppResult<Decrypted> {
        let reader = self.gateway.read_only().await?;
        let record = reader.get_record(id).await?;
        *subject = Some(record.name.clone());

        if record.is_verified {
            return Ok(Decrypted::Stored {
                name: record.name,
                value: record.verified_value,
            });
        }

        let writer = self.gateway.with_signer().await?;
        let handle = reader.get_encrypted_handle(id).await?;
        self.ensure_fhe().await?;

        self.set_status(StatusMessage::pending("Verifying decryption..."));
        let submitter = RecordProofSubmitter::new(writer, id);
        let result = self
            .fhe
            .verify_decryption(std::slice::from_ref(&handle), reader.address(), &submitter)
            .await?;
        let value = result
            .clear_value(&handle)
            .ok_or_else(|| FheError::MissingClearValue(handle.to_string()))?;

        if let Err(e) = self.reload().await {
            log::warn!("reload after decryption failed: {}", e);
        }
        Ok(Decrypted::Fresh {
            name: record.name,
            value,
        })
    }
}

fn validate(draft: &NewContact) -> AppResult<()> {
    if draft.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if draft.phone.trim().is_empty() {
        return Err(AppError::Validation("Phone number is required".into()));
    }
    if !(1..=MAX_PRIORITY).contains(&draft.priority) {
        return Err(AppError::Validation(format!(
            "Priority must be between 1 and {}",
            MAX_PRIORITY
        )));
    }
    Ok(())
}
