//! End to end tests against the public ledger API

use hashledger::{
    create_transaction, verify_transaction, Blockchain, KeyPair, LedgerConfig, Transaction,
};

fn test_blockchain(difficulty: usize) -> Blockchain {
    Blockchain::with_config(LedgerConfig::with_difficulty(difficulty).unwrap())
}

fn transfer(from: &KeyPair, receiver: &str, amount: u64) -> Transaction {
    create_transaction(from.secret_key(), from.public_key(), receiver, amount)
}

#[test]
fn test_two_party_transfer() {
    let mut blockchain = test_blockchain(2);
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();

    let to_bob = transfer(&alice, &bob.public_key_hex(), 100);
    let to_alice = transfer(&bob, &alice.public_key_hex(), 50);

    assert!(blockchain.add_transaction(to_bob.clone()));
    assert!(blockchain.add_transaction(to_alice.clone()));

    assert_eq!(blockchain.mine_pending_transactions(), Some(1));
    assert_eq!(blockchain.chain().len(), 2);
    assert!(blockchain.pending_transactions().is_empty());
    assert_eq!(
        blockchain.chain()[1].transactions,
        vec![to_bob.clone(), to_alice]
    );

    let mut tampered = to_bob;
    tampered.amount = 99999;
    assert!(!blockchain.add_transaction(tampered));
    assert!(blockchain.pending_transactions().is_empty());
    assert_eq!(blockchain.chain().len(), 2);

    assert!(blockchain.is_chain_valid());
}

#[test]
fn test_each_signed_field_is_protected() {
    let alice = KeyPair::generate();
    let tx = transfer(&alice, "bob", 100);
    assert!(verify_transaction(&tx));

    let mut sender = tx.clone();
    sender.sender = KeyPair::generate().public_key_hex();
    let mut receiver = tx.clone();
    receiver.receiver = "mallory".to_string();
    let mut amount = tx.clone();
    amount.amount = 101;
    let mut signature = tx.clone();
    signature.signature = transfer(&alice, "bob", 101).signature;

    for tampered in [sender, receiver, amount, signature] {
        assert!(!verify_transaction(&tampered));
    }
}

#[test]
fn test_mined_blocks_meet_difficulty() {
    let difficulty = 3;
    let mut blockchain = test_blockchain(difficulty);
    let alice = KeyPair::generate();

    for round in 0..3u64 {
        for amount in 0..=round {
            assert!(blockchain.add_transaction(transfer(&alice, "bob", amount)));
        }
        let pending = blockchain.pending_transactions().to_vec();

        assert_eq!(blockchain.mine_pending_transactions(), Some(round + 1));
        assert_eq!(blockchain.last_block().transactions, pending);
    }

    let chain = blockchain.chain();
    assert_eq!(chain.len(), 4);
    for block in &chain[1..] {
        assert!(block.hash.starts_with(&"0".repeat(difficulty)));
        assert_eq!(block.hash, block.calculate_hash());
    }
    for pair in chain.windows(2) {
        assert_eq!(pair[1].previous_hash, pair[0].hash);
        assert_eq!(pair[1].index, pair[0].index + 1);
    }
    assert!(blockchain.is_chain_valid());
}

#[test]
fn test_empty_pool_mines_nothing() {
    let mut blockchain = test_blockchain(1);
    assert_eq!(blockchain.len(), 1);
    assert_eq!(blockchain.mine_pending_transactions(), None);
    assert_eq!(blockchain.len(), 1);
}

#[test]
fn test_len_counts_blocks() {
    let mut blockchain = test_blockchain(1);
    let alice = KeyPair::generate();

    for expected in 2..=4 {
        assert!(blockchain.add_transaction(transfer(&alice, "bob", 1)));
        blockchain.mine_pending_transactions();
        assert_eq!(blockchain.len(), expected);
        assert_eq!(blockchain.len(), blockchain.chain().len());
    }
}

#[test]
fn test_malformed_transactions_are_rejected() {
    let mut blockchain = test_blockchain(1);
    let alice = KeyPair::generate();
    assert!(blockchain.add_transaction(transfer(&alice, "bob", 10)));
    let valid = transfer(&alice, "bob", 20);

    let mut bad_sender_hex = valid.clone();
    bad_sender_hex.sender = "not hex at all".to_string();
    let mut bad_signature_hex = valid.clone();
    bad_signature_hex.signature.replace_range(..2, "xy");
    let mut empty_signature = valid.clone();
    empty_signature.signature.clear();
    let mut empty_sender = valid.clone();
    empty_sender.sender.clear();
    let mut short_signature = valid.clone();
    short_signature.signature.truncate(64);
    let mut short_sender = valid;
    short_sender.sender.truncate(40);

    for malformed in [
        bad_sender_hex,
        bad_signature_hex,
        empty_signature,
        empty_sender,
        short_signature,
        short_sender,
    ] {
        assert!(!blockchain.add_transaction(malformed));
        assert_eq!(blockchain.pending_transactions().len(), 1);
    }

    assert_eq!(blockchain.mine_pending_transactions(), Some(1));
    assert_eq!(blockchain.last_block().transactions.len(), 1);
}

#[test]
fn test_independent_ledgers() {
    let mut first = test_blockchain(1);
    let second = test_blockchain(1);
    let alice = KeyPair::generate();

    first.add_transaction(transfer(&alice, "bob", 1));
    first.mine_pending_transactions();

    assert_eq!(first.chain().len(), 2);
    assert_eq!(second.chain().len(), 1);
}
