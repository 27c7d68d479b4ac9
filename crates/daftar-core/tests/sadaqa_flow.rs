//! Cross-user sadaqa donations applied through the sync cycle.

mod support;

use pretty_assertions::assert_eq;

use daftar_core::db::{Database, LedgerStore};
use daftar_core::models::{Amount, CustomerFields, PaidVia};
use daftar_core::sync::SyncEngine;

use support::FakeServer;

const DONOR_TOKEN: &str = "token-donor";
const RECIPIENT_TOKEN: &str = "token-recipient";

fn fields(name: &str) -> CustomerFields {
    CustomerFields {
        name: name.to_string(),
        phone: None,
        notes: None,
    }
}

fn amount(s: &str) -> Amount {
    s.parse().unwrap()
}

#[tokio::test]
async fn donation_settles_recipient_debt_through_sync() {
    let server = FakeServer::new();
    server.register_user(DONOR_TOKEN);
    let recipient = server.register_user(RECIPIENT_TOKEN);

    // The recipient records a debt offline and syncs it up
    let db = Database::open_in_memory().unwrap();
    let store = db.ledger();
    let engine = SyncEngine::new(server.clone());
    let customer = store.create_customer(fields("Hassan")).unwrap();
    let debt = store
        .create_debt(&customer.id, amount("60.00"), None)
        .unwrap();
    assert!(engine.full_sync(&store, RECIPIENT_TOKEN).await);

    // The recipient opts the debt into the queue server-side
    let server_debt_id = store
        .get_debt(&debt.id)
        .unwrap()
        .unwrap()
        .server_id
        .unwrap();
    server.opt_in(&server_debt_id);

    // Another user donates more than the queue holds
    let outcome = server.donate(DONOR_TOKEN, amount("75.00"), true).unwrap();
    assert_eq!(outcome.allocations.len(), 1);
    assert_eq!(outcome.allocations[0].recipient_id, recipient);
    assert_eq!(outcome.allocations[0].amount, amount("60.00"));
    assert!(outcome.allocations[0].debt_paid_in_full);
    assert_eq!(outcome.total_donated, amount("60.00"));
    assert_eq!(outcome.leftover, amount("15.00"));

    // The next pull lands the settled debt on the recipient's device
    assert!(engine.full_sync(&store, RECIPIENT_TOKEN).await);
    let settled = store.get_debt(&debt.id).unwrap().unwrap();
    assert!(settled.is_paid);
    assert_eq!(settled.paid_amount, amount("60.00"));
    assert_eq!(settled.paid_via, Some(PaidVia::Sadaqa));
    assert!(settled.paid_at.is_some());
}

#[tokio::test]
async fn donation_walks_queue_fifo_across_users() {
    let server = FakeServer::new();
    server.register_user(DONOR_TOKEN);
    let first_user = server.register_user("token-first");
    let second_user = server.register_user("token-second");

    // Two users with one opted-in debt each; first enqueued first
    let c1 = server.seed_customer(first_user, "Hassan");
    let d1 = server.seed_debt(first_user, &c1, amount("40.00"));
    let c2 = server.seed_customer(second_user, "Amina");
    let d2 = server.seed_debt(second_user, &c2, amount("50.00"));
    server.opt_in(&d1);
    server.opt_in(&d2);

    let outcome = server.donate(DONOR_TOKEN, amount("75.00"), true).unwrap();

    assert_eq!(outcome.allocations.len(), 2);
    assert_eq!(outcome.allocations[0].recipient_id, first_user);
    assert_eq!(outcome.allocations[0].amount, amount("40.00"));
    assert!(outcome.allocations[0].debt_paid_in_full);
    assert_eq!(outcome.allocations[1].recipient_id, second_user);
    assert_eq!(outcome.allocations[1].amount, amount("35.00"));
    assert!(!outcome.allocations[1].debt_paid_in_full);
    assert_eq!(outcome.leftover, Amount::ZERO);
}

#[tokio::test]
async fn donor_never_funds_their_own_debt() {
    let server = FakeServer::new();
    let donor = server.register_user(DONOR_TOKEN);
    let other = server.register_user(RECIPIENT_TOKEN);

    // The donor has an older opted-in debt of their own
    let own_customer = server.seed_customer(donor, "Own shop");
    let own_debt = server.seed_debt(donor, &own_customer, amount("500.00"));
    server.opt_in(&own_debt);

    let their_customer = server.seed_customer(other, "Hassan");
    let their_debt = server.seed_debt(other, &their_customer, amount("30.00"));
    server.opt_in(&their_debt);

    let outcome = server.donate(DONOR_TOKEN, amount("100.00"), true).unwrap();

    assert!(outcome.allocations.iter().all(|a| a.recipient_id == other));
    assert_eq!(outcome.total_donated, amount("30.00"));
    assert_eq!(outcome.leftover, amount("70.00"));
}

#[tokio::test]
async fn opted_out_entries_receive_nothing() {
    let server = FakeServer::new();
    server.register_user(DONOR_TOKEN);
    let user = server.register_user(RECIPIENT_TOKEN);

    let customer = server.seed_customer(user, "Hassan");
    let withdrawn = server.seed_debt(user, &customer, amount("20.00"));
    let active = server.seed_debt(user, &customer, amount("45.00"));
    server.opt_in(&withdrawn);
    server.opt_in(&active);
    server.opt_out(&withdrawn);

    let outcome = server.donate(DONOR_TOKEN, amount("100.00"), true).unwrap();

    assert_eq!(outcome.allocations.len(), 1);
    assert_eq!(outcome.total_donated, amount("45.00"));
    assert_eq!(outcome.leftover, amount("55.00"));
}

#[tokio::test]
async fn anonymous_donations_never_reveal_the_donor() {
    let server = FakeServer::new();
    server.register_user(DONOR_TOKEN);
    let user = server.register_user(RECIPIENT_TOKEN);

    let customer = server.seed_customer(user, "Hassan");
    let debt = server.seed_debt(user, &customer, amount("25.00"));
    server.opt_in(&debt);

    server.donate(DONOR_TOKEN, amount("10.00"), true).unwrap();

    let records = server.donation_records();
    assert_eq!(records.len(), 1);
    assert!(records[0].anonymous);
    assert_eq!(records[0].donor_id, None);
    assert_eq!(records[0].amount, amount("10.00"));
}

#[tokio::test]
async fn repeat_donations_drain_a_queue_entry_incrementally() {
    let server = FakeServer::new();
    server.register_user(DONOR_TOKEN);
    let user = server.register_user(RECIPIENT_TOKEN);

    let customer = server.seed_customer(user, "Hassan");
    let debt = server.seed_debt(user, &customer, amount("50.00"));
    server.opt_in(&debt);

    // First donation covers part of the entry
    let first = server.donate(DONOR_TOKEN, amount("30.00"), true).unwrap();
    assert_eq!(first.total_donated, amount("30.00"));
    assert!(!first.allocations[0].debt_paid_in_full);

    // The second one walks the same entry's reduced remainder
    let second = server.donate(DONOR_TOKEN, amount("30.00"), true).unwrap();
    assert_eq!(second.total_donated, amount("20.00"));
    assert_eq!(second.leftover, amount("10.00"));
    assert!(second.allocations[0].debt_paid_in_full);
    assert_eq!(second.allocations[0].debt_paid_amount, amount("50.00"));
}
