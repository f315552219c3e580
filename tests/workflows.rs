mod common;

use common::{connected, harness, ACCOUNT};
use fhe_address_book::oplog::{OperationKind, Outcome};
use fhe_address_book::state::{NewContact, StatusKind};
use std::sync::atomic::Ordering;

fn status_text(h: &common::Harness) -> Option<(StatusKind, String)> {
    h.book.snapshot().status.map(|s| (s.kind, s.text))
}

#[tokio::test]
async fn create_alice_adds_one_unverified_contact() {
    let h = connected();
    h.chain.seed("contact-1", "Bob", 1, false);
    h.book.connect().await;
    let before = h.book.snapshot().contacts.len();

    let id = h
        .book
        .create_contact(&NewContact::new("Alice", "555-1234", 5))
        .await
        .expect("contact created");

    let snap = h.book.snapshot();
    assert_eq!(snap.contacts.len(), before + 1);
    let alice = h.book.contact(&id).unwrap();
    assert_eq!(alice.name, "Alice");
    assert_eq!(alice.public_priority, 5);
    assert!(!alice.is_verified);
    assert_eq!(alice.verified_value, None);
    assert_eq!(alice.creator, ACCOUNT);
    assert_eq!(h.chain.plaintext(&id), Some(5551234));

    let head = snap.operations.first().unwrap();
    assert_eq!(head.kind, OperationKind::Create);
    assert_eq!(head.subject_name, "Alice");
    assert_eq!(head.outcome, Outcome::Success);
    assert_eq!(
        status_text(&h),
        Some((StatusKind::Success, "Contact encrypted and stored!".into()))
    );
}

#[tokio::test]
async fn create_composes_description_and_resets_form() {
    let h = connected();
    h.book.connect().await;
    h.book.open_form();
    h.book.edit_draft(|d| {
        d.name = "Carol".into();
        d.phone = "(555) 987".into();
        d.email = "carol@x.io".into();
        d.description = "neighbour".into();
        d.priority = 9;
    });

    let id = h.book.submit_form().await.unwrap();

    let record = h.chain.record(&id).unwrap();
    assert_eq!(record.description, "Email: carol@x.io | neighbour");
    assert_eq!(record.public_field2, 0);
    assert_eq!(h.book.contact(&id).unwrap().email(), Some("carol@x.io"));
    let snap = h.book.snapshot();
    assert!(!snap.form_open);
    assert_eq!(snap.draft, NewContact::default());
    assert!(!snap.creating);
}

#[tokio::test]
async fn phone_without_digits_is_submitted_as_zero() {
    let h = connected();
    let id = h.book.create_contact(&NewContact::new("Dave", "abc", 3)).await.unwrap();
    assert_eq!(h.chain.plaintext(&id), Some(0));
}

#[tokio::test]
async fn create_needs_a_connected_wallet() {
    let h = harness(None);
    assert_eq!(h.book.create_contact(&NewContact::new("Alice", "555", 5)).await, None);
    assert_eq!(h.chain.create_calls.load(Ordering::SeqCst), 0);
    assert!(h.book.operations().is_empty());
    assert_eq!(
        status_text(&h),
        Some((StatusKind::Error, "Please connect wallet first".into()))
    );
}

#[tokio::test]
async fn empty_fields_are_rejected_locally() {
    let h = connected();
    assert_eq!(h.book.create_contact(&NewContact::new("", "555", 5)).await, None);
    assert_eq!(h.book.create_contact(&NewContact::new("Alice", "", 5)).await, None);
    assert_eq!(h.chain.create_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.fhe.init_calls.load(Ordering::SeqCst), 0);
    assert!(h.book.operations().is_empty());
}

#[tokio::test]
async fn declined_signature_is_reported_as_rejection() {
    let h = connected();
    h.chain.reject_writes.store(true, Ordering::SeqCst);

    assert_eq!(h.book.create_contact(&NewContact::new("Eve", "555", 2)).await, None);

    assert_eq!(status_text(&h), Some((StatusKind::Error, "Transaction rejected".into())));
    let head = h.book.operations().remove(0);
    assert_eq!((head.kind, head.outcome), (OperationKind::Create, Outcome::Error));
    assert_eq!(head.subject_name, "Eve");
    assert_eq!(h.chain.record_count(), 0);
}

#[tokio::test]
async fn decrypting_a_verified_record_never_writes() {
    let h = connected();
    h.chain.seed("contact-7", "Frank", 5551234, true);
    h.book.connect().await;

    assert_eq!(h.book.decrypt_contact("contact-7").await, Some(5551234));
    assert_eq!(h.book.decrypt_contact("contact-7").await, Some(5551234));

    assert_eq!(h.chain.verify_calls.load(Ordering::SeqCst), 0);
    let head = h.book.operations().remove(0);
    assert_eq!(head.kind, OperationKind::Verify);
    assert_eq!(head.subject_name, "Frank");
    assert_eq!(head.outcome, Outcome::Success);
}

#[tokio::test]
async fn decrypt_verifies_once_then_short_circuits() {
    let h = connected();
    h.chain.seed("contact-8", "Grace", 5550000, false);
    h.book.connect().await;
    h.book.select_contact("contact-8");

    assert_eq!(h.book.decrypt_contact("contact-8").await, Some(5550000));

    let grace = h.book.contact("contact-8").unwrap();
    assert!(grace.is_verified);
    assert_eq!(grace.verified_value, Some(5550000));
    assert_eq!(h.chain.verify_successes.load(Ordering::SeqCst), 1);
    let snap = h.book.snapshot();
    assert_eq!(snap.selection.unwrap().decrypted_phone, Some(5550000));
    assert_eq!(snap.operations[0].kind, OperationKind::Decrypt);
    assert!(!snap.decrypting);

    assert_eq!(h.book.decrypt_contact("contact-8").await, Some(5550000));
    assert_eq!(h.chain.verify_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_decrypts_write_at_most_once() {
    let h = connected();
    h.chain.seed("contact-9", "Heidi", 5559999, false);
    h.book.connect().await;

    let (a, b) = tokio::join!(
        h.book.decrypt_contact("contact-9"),
        h.book.decrypt_contact("contact-9")
    );

    assert_eq!(h.chain.verify_successes.load(Ordering::SeqCst), 1);
    assert!(a == Some(5559999) || b == Some(5559999));
    assert!(h.book.operations().iter().all(|op| op.outcome == Outcome::Success));
    assert_ne!(status_text(&h).map(|s| s.0), Some(StatusKind::Error));
    assert!(h.book.contact("contact-9").unwrap().is_verified);
    assert!(!h.book.snapshot().decrypting);
}

#[tokio::test]
async fn relayer_failure_is_a_generic_decrypt_error() {
    let h = connected();
    h.chain.seed("contact-10", "Ivan", 1, false);
    h.book.connect().await;
    h.fhe.fail_decrypt.store(true, Ordering::SeqCst);

    assert_eq!(h.book.decrypt_contact("contact-10").await, None);

    assert_eq!(status_text(&h), Some((StatusKind::Error, "Decryption failed".into())));
    let head = h.book.operations().remove(0);
    assert_eq!((head.kind, head.outcome), (OperationKind::Decrypt, Outcome::Error));
    assert_eq!(head.subject_name, "Ivan");
    assert!(!h.book.contact("contact-10").unwrap().is_verified);
}

#[tokio::test]
async fn unknown_record_fails_with_unknown_subject() {
    let h = connected();
    h.book.connect().await;
    assert_eq!(h.book.decrypt_contact("contact-404").await, None);
    assert_eq!(h.book.operations()[0].subject_name, "Unknown");
}

#[tokio::test]
async fn decrypt_needs_a_connected_wallet() {
    let h = harness(None);
    h.chain.seed("contact-11", "Judy", 1, true);
    assert_eq!(h.book.decrypt_contact("contact-11").await, None);
    assert!(h.book.operations().is_empty());
}

#[tokio::test]
async fn availability_check_is_logged() {
    let h = connected();
    assert!(h.book.check_availability().await);
    let head = h.book.operations().remove(0);
    assert_eq!(head.kind, OperationKind::Verify);
    assert_eq!(head.subject_name, "System Check");

    h.chain.unavailable.store(true, Ordering::SeqCst);
    assert!(!h.book.check_availability().await);
    assert_eq!(h.book.operations().len(), 1);
}

#[tokio::test]
async fn fhe_is_initialized_once_per_session() {
    let h = connected();
    h.book.connect().await;
    h.book.create_contact(&NewContact::new("Ken", "1", 1)).await.unwrap();
    h.book.create_contact(&NewContact::new("Lea", "2", 1)).await.unwrap();
    assert_eq!(h.fhe.init_calls.load(Ordering::SeqCst), 1);
    assert!(h.book.snapshot().fhe_ready);
    assert_eq!(h.book.snapshot().contract_address.as_deref(), Some(common::CONTRACT));
}

#[tokio::test]
async fn operation_log_keeps_the_last_ten() {
    let h = connected();
    for i in 0..11 {
        h.book
            .create_contact(&NewContact::new(&format!("c{}", i), "555", 1))
            .await
            .unwrap();
    }
    let ops = h.book.operations();
    assert_eq!(ops.len(), 10);
    assert_eq!(ops[0].subject_name, "c10");
    assert!(ops.iter().all(|op| op.subject_name != "c0"));
}

#[tokio::test]
async fn disconnect_drops_session_state() {
    let h = connected();
    h.chain.seed("contact-12", "Mia", 1, true);
    h.book.connect().await;
    h.book.decrypt_contact("contact-12").await;

    h.session.disconnect();
    h.book.disconnect();

    let snap = h.book.snapshot();
    assert!(!snap.connected);
    assert!(snap.contacts.is_empty());
    assert!(snap.operations.is_empty());
    assert!(snap.selection.is_none());
}

#[tokio::test]
async fn reconnect_starts_a_fresh_session() {
    let h = connected();
    h.chain.seed("contact-1", "Alice", 5551234, false);
    h.book.connect().await;
    h.book.create_contact(&NewContact::new("Nick", "555", 1)).await.unwrap();
    h.book.select_contact("contact-1");
    assert_eq!(h.book.decrypt_contact("contact-1").await, Some(5551234));
    assert_eq!(h.book.operations().len(), 2);

    h.session.connect("0xB0B");
    h.book.connect().await;

    let snap = h.book.snapshot();
    assert!(snap.operations.is_empty());
    assert!(snap.selection.is_none());
    assert!(snap.status.is_none());
    assert_eq!(snap.contacts.len(), 2);
    assert_eq!(snap.contract_address.as_deref(), Some(common::CONTRACT));
}
