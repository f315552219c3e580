use crate::oplog::{OperationRecord, Outcome};
use crate::state::{ContactStats, StatusKind, StatusMessage};
use crate::storage::Contact;

pub fn contact_line(contact: &Contact) -> String {
    let lock = if contact.is_verified { "verified" } else { "encrypted" };
    format!(
        "{:<22} {:<24} priority {:>2}/10  [{}]",
        contact.id, contact.name, contact.public_priority, lock
    )
}

pub fn contact_list(contacts: &[Contact]) -> String {
    if contacts.is_empty() {
        return "No contacts found".to_string();
    }
    contacts.iter().map(contact_line).collect::<Vec<_>>().join("\n")
}

pub fn contact_detail(contact: &Contact, decrypted_phone: Option<u64>) -> String {
    let phone = match (decrypted_phone, contact.verified_value) {
        (Some(v), _) | (None, Some(v)) => v.to_string(),
        (None, None) => "encrypted (run `decrypt`)".to_string(),
    };
    let handle = contact
        .encrypted_phone_handle
        .as_ref()
        .map(|h| h.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}\n  id:          {}\n  email:       {}\n  phone:       {}\n  handle:      {}\n  priority:    {}/10\n  description: {}\n  creator:     {}\n  created at:  {}",
        contact.name,
        contact.id,
        contact.email().unwrap_or("-"),
        phone,
        handle,
        contact.public_priority,
        contact.description,
        contact.creator,
        contact.created_at,
    )
}

pub fn stats(stats: &ContactStats) -> String {
    format!(
        "total {}  verified {}  high priority {}  this week {}",
        stats.total, stats.verified, stats.high_priority, stats.recent
    )
}

pub fn history(ops: &[OperationRecord]) -> String {
    if ops.is_empty() {
        return "No operations yet".to_string();
    }
    ops.iter()
        .map(|op| {
            let mark = match op.outcome {
                Outcome::Success => "ok ",
                Outcome::Error => "ERR",
            };
            format!("{} {:<8} {} ({})", mark, op.kind, op.subject_name, op.timestamp)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn status(status: &StatusMessage) -> String {
    let tag = match status.kind {
        StatusKind::Pending => "...",
        StatusKind::Success => "ok",
        StatusKind::Error => "error",
    };
    format!("[{}] {}", tag, status.text)
}
