//! Read-only views handed to the presentation layer.

use crate::oplog::OperationRecord;
use crate::storage::Contact;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactStats {
    pub total: usize,
    pub verified: usize,
    pub high_priority: usize,
    /// Created within the trailing seven days.
    pub recent: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Pending,
    Success,
    Error,
}

/// Transient banner. Pending messages stay until replaced, the rest expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
    expires_at: Option<Instant>,
}

impl StatusMessage {
    pub fn pending(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Pending,
            text: text.into(),
            expires_at: None,
        }
    }

    pub fn success(text: impl Into<String>, ttl: Duration) -> Self {
        Self::expiring(StatusKind::Success, text, ttl)
    }

    pub fn error(text: impl Into<String>, ttl: Duration) -> Self {
        Self::expiring(StatusKind::Error, text, ttl)
    }

    fn expiring(kind: StatusKind, text: impl Into<String>, ttl: Duration) -> Self {
        Self {
            kind,
            text: text.into(),
            expires_at: Some(Instant::now() + ttl),
        }
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|t| now < t)
    }
}

/// Input of the create-contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub description: String,
    pub priority: u8,
}

impl Default for NewContact {
    fn default() -> Self {
        Self {
            name: String::new(),
            phone: String::new(),
            email: String::new(),
            description: String::new(),
            priority: 1,
        }
    }
}

impl NewContact {
    pub fn new(name: &str, phone: &str, priority: u8) -> Self {
        Self {
            name: name.to_string(),
            phone: phone.to_string(),
            priority,
            ..Self::default()
        }
    }

    /// Description as submitted on-chain, carrying the email by convention.
    pub fn composed_description(&self) -> String {
        format!("Email: {} | {}", self.email, self.description)
    }
}

/// The contact open in the detail view, with its phone number if the user
/// decrypted it during this selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub contact_id: String,
    pub decrypted_phone: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct AppSnapshot {
    pub connected: bool,
    pub fhe_ready: bool,
    pub contract_address: Option<String>,
    pub contacts: Vec<Contact>,
    pub stats: ContactStats,
    pub operations: Vec<OperationRecord>,
    pub status: Option<StatusMessage>,
    pub selection: Option<Selection>,
    pub form_open: bool,
    pub draft: NewContact,
    pub refreshing: bool,
    pub creating: bool,
    pub decrypting: bool,
}
