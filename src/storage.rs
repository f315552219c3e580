use crate::api::contract::ContactContract;
use crate::api::models::{Handle, RecordData};
use crate::error::ContractError;
use crate::state::ContactStats;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

const WEEK_SECS: u64 = 60 * 60 * 24 * 7;
const HIGH_PRIORITY: u8 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub encrypted_phone_handle: Option<Handle>,
    pub public_priority: u8,
    pub reserved_field: u32,
    pub description: String,
    pub created_at: u64,
    pub creator: String,
    pub is_verified: bool,
    /// Only set once the record is verified on-chain.
    pub verified_value: Option<u64>,
}

impl Contact {
    pub fn from_record(id: String, record: RecordData, handle: Option<Handle>) -> Self {
        Self {
            id,
            name: record.name,
            encrypted_phone_handle: handle,
            public_priority: record.public_field1.min(u8::MAX as u32) as u8,
            reserved_field: record.public_field2,
            description: record.description,
            created_at: record.created_at,
            creator: record.creator,
            is_verified: record.is_verified,
            verified_value: record.is_verified.then_some(record.verified_value),
        }
    }

    /// Email stored by convention as an `Email: <addr> | ` description prefix.
    pub fn email(&self) -> Option<&str> {
        let rest = self.description.strip_prefix("Email: ")?;
        let email = rest.split(" | ").next()?.trim();
        (!email.is_empty()).then_some(email)
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
    }
}

/// Session-local cache of every contact known to the contract.
#[derive(Debug, Default)]
pub struct ContactStore {
    contacts: RwLock<Vec<Contact>>,
}

impl ContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the collection from chain reads and swaps it in whole. A record
    /// that fails to load is logged and skipped; if the id list itself cannot be
    /// read the store keeps its current contents.
    pub async fn refresh(&self, contract: &dyn ContactContract) -> Result<usize, ContractError> {
        let ids = contract.get_all_record_ids().await?;
        log::debug!("refreshing {} records", ids.len());

        let mut fresh = Vec::with_capacity(ids.len());
        for id in ids {
            let record = match contract.get_record(&id).await {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("skipping record {}: {}", id, e);
                    continue;
                }
            };
            let handle = match contract.get_encrypted_handle(&id).await {
                Ok(h) => Some(h),
                Err(e) => {
                    log::debug!("no ciphertext handle for {}: {}", id, e);
                    None
                }
            };
            fresh.push(Contact::from_record(id, record, handle));
        }

        let count = fresh.len();
        *self.contacts.write() = fresh;
        log::info!("contact store holds {} contacts", count);
        Ok(count)
    }

    pub fn all(&self) -> Vec<Contact> {
        self.contacts.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<Contact> {
        self.contacts.read().iter().find(|c| c.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.contacts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.read().is_empty()
    }

    /// Contacts whose name or description contains `term`, ignoring case.
    pub fn query(&self, term: &str) -> Vec<Contact> {
        let needle = term.to_lowercase();
        self.contacts
            .read()
            .iter()
            .filter(|c| c.matches(&needle))
            .cloned()
            .collect()
    }

    pub fn compute_stats(&self) -> ContactStats {
        self.compute_stats_at(crate::utils::unix_now())
    }

    pub fn compute_stats_at(&self, now: u64) -> ContactStats {
        self.contacts.read().iter().fold(ContactStats::default(), |mut s, c| {
            s.total += 1;
            if c.is_verified {
                s.verified += 1;
            }
            if c.public_priority >= HIGH_PRIORITY {
                s.high_priority += 1;
            }
            if now.saturating_sub(c.created_at) < WEEK_SECS {
                s.recent += 1;
            }
            s
        })
    }

    pub fn clear(&self) {
        self.contacts.write().clear();
    }

    #[cfg(test)]
    pub(crate) fn replace(&self, contacts: Vec<Contact>) {
        *self.contacts.write() = contacts;
    }
}
