//! Transaction integration tests
//!
//! End-to-end spends: keys to addresses to locking scripts, signing through
//! the transaction store, and verification of the results.

use btc_primitives::core::{Transaction, TxIn, TxOut};
use btc_primitives::ecc::hash160_point;
use btc_primitives::script::encode_num;
use btc_primitives::script::opcodes::*;
use btc_primitives::{
    decode_address, hash160, hash256, point_address, Cmd, Config, PrivateKey, Script, TxFetcher,
    TxStore, SIGHASH_ALL,
};
use num_bigint::BigUint;
use tempfile::tempdir;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn key(secret: u64) -> PrivateKey {
    PrivateKey::new(BigUint::from(secret)).unwrap()
}

fn script_sig_signature(key: &PrivateKey, z: &BigUint) -> Vec<u8> {
    let mut sig = key.sign(z).unwrap().der();
    sig.push(SIGHASH_ALL as u8);
    sig
}

/// A transaction paying `amount` to `script_pubkey`, stored so it can be spent
fn fund(store: &TxStore, amount: u64, script_pubkey: Script) -> [u8; 32] {
    let funding = Transaction::new(
        1,
        vec![TxIn::new([0x5a; 32], 0)],
        vec![TxOut::new(amount, script_pubkey)],
        0,
        false,
    );
    let hash = funding.hash().unwrap();
    store.insert(funding).unwrap();
    hash
}

fn spend(prev: [u8; 32], amount: u64, locktime: u32, sequence: u32) -> Transaction {
    let destination = decode_address("midSACfDe3qAxJZZXA9gkwBZgPqJJUpy1w").unwrap();
    Transaction::new(
        1,
        vec![TxIn::new(prev, 0).with_sequence(sequence)],
        vec![TxOut::new(amount, destination.script_pubkey())],
        locktime,
        false,
    )
}

fn multisig_script(keys: &[&PrivateKey]) -> Script {
    let mut cmds = vec![Cmd::Op(OP_2)];
    for key in keys {
        cmds.push(Cmd::Push(key.sec(true).unwrap()));
    }
    cmds.push(Cmd::Op(OP_3));
    cmds.push(Cmd::Op(OP_CHECKMULTISIG));
    Script::new(cmds)
}

#[test]
fn test_p2pkh_spend_through_store() {
    init_logger();
    let owner = key(8_675_309);
    let address = point_address(owner.point(), true, true).unwrap();
    let script_pubkey = decode_address(&address).unwrap().script_pubkey();
    assert!(script_pubkey.is_p2pkh_script_pubkey());

    let store = TxStore::new();
    let prev = fund(&store, 50_000, script_pubkey);
    let mut tx = spend(prev, 40_000, 0, 0xffff_ffff);

    assert!(tx.sign_input(0, &owner, &store).unwrap());
    assert_eq!(tx.fee(&store).unwrap(), 10_000);
    assert!(tx.verify(&store).unwrap());

    // The signed transaction survives a round trip through its wire format
    let reparsed = Transaction::from_bytes(&tx.serialize().unwrap(), false).unwrap();
    assert_eq!(reparsed, tx);
    assert!(reparsed.verify(&store).unwrap());
}

#[test]
fn test_corrupted_signature_fails() {
    init_logger();
    let owner = key(31_337);
    let h160 = hash160_point(owner.point(), true).unwrap();
    let store = TxStore::new();
    let prev = fund(&store, 10_000, Script::p2pkh(&h160));
    let mut tx = spend(prev, 9_000, 0, 0xffff_ffff);
    assert!(tx.sign_input(0, &owner, &store).unwrap());

    let mut cmds = tx.get_tx_ins()[0].get_script_sig().cmds().to_vec();
    if let Cmd::Push(sig) = &mut cmds[0] {
        // Flip a bit inside r
        sig[10] ^= 0x01;
    }
    tx.set_script_sig(0, Script::new(cmds)).unwrap();
    assert!(!tx.verify_input(0, &store).unwrap());
    assert!(!tx.verify(&store).unwrap());
}

#[test]
fn test_negative_fee_rejected() {
    init_logger();
    let owner = key(99);
    let h160 = hash160_point(owner.point(), true).unwrap();
    let store = TxStore::new();
    let prev = fund(&store, 1_000, Script::p2pkh(&h160));
    let mut tx = spend(prev, 1_001, 0, 0xffff_ffff);
    assert!(tx.sign_input(0, &owner, &store).unwrap());
    assert!(tx.fee(&store).unwrap() < 0);
    assert!(!tx.verify(&store).unwrap());
}

#[test]
fn test_two_of_three_multisig_order() {
    init_logger();
    let (k1, k2, k3) = (key(1_001), key(2_002), key(3_003));
    let script_pubkey = multisig_script(&[&k1, &k2, &k3]);
    let z = BigUint::from_bytes_be(&hash256(b"multisig message"));
    let sig1 = script_sig_signature(&k1, &z);
    let sig3 = script_sig_signature(&k3, &z);

    let in_order = Script::new(vec![
        Cmd::Op(OP_0),
        Cmd::Push(sig1.clone()),
        Cmd::Push(sig3.clone()),
    ]);
    assert!(in_order.concat(&script_pubkey).evaluate(&z));

    let reversed = Script::new(vec![Cmd::Op(OP_0), Cmd::Push(sig3), Cmd::Push(sig1.clone())]);
    assert!(!reversed.concat(&script_pubkey).evaluate(&z));

    let one_signature = Script::new(vec![Cmd::Op(OP_0), Cmd::Push(sig1.clone()), Cmd::Push(sig1)]);
    assert!(!one_signature.concat(&script_pubkey).evaluate(&z));

    // Missing the extra element consumed before the signatures
    let short = Script::new(vec![
        Cmd::Push(script_sig_signature(&k1, &z)),
        Cmd::Push(script_sig_signature(&k2, &z)),
    ]);
    assert!(!short.concat(&script_pubkey).evaluate(&z));
}

#[test]
fn test_p2sh_multisig_spend() {
    init_logger();
    let (k1, k2, k3) = (key(11), key(22), key(33));
    let redeem = multisig_script(&[&k1, &k2, &k3]);
    let redeem_raw = redeem.raw_serialize().unwrap();

    let store = TxStore::new();
    let prev = fund(&store, 70_000, Script::p2sh(&hash160(&redeem_raw)));
    let mut tx = spend(prev, 60_000, 0, 0xffff_ffff);

    let z = tx.sig_hash_with_redeem(0, Some(&redeem), &store).unwrap();
    let script_sig = Script::new(vec![
        Cmd::Op(OP_0),
        Cmd::Push(script_sig_signature(&k2, &z)),
        Cmd::Push(script_sig_signature(&k3, &z)),
        Cmd::Push(redeem_raw.clone()),
    ]);
    tx.set_script_sig(0, script_sig).unwrap();
    assert!(tx.verify(&store).unwrap());

    // Signatures over the P2SH script_pubkey instead of the redeem script do not count
    let wrong_z = tx.sig_hash(0, &store).unwrap();
    let wrong = Script::new(vec![
        Cmd::Op(OP_0),
        Cmd::Push(script_sig_signature(&k1, &wrong_z)),
        Cmd::Push(script_sig_signature(&k2, &wrong_z)),
        Cmd::Push(redeem_raw),
    ]);
    tx.set_script_sig(0, wrong).unwrap();
    assert!(!tx.verify(&store).unwrap());
}

#[test]
fn test_locktime_script_spend() {
    init_logger();
    let owner = key(424_242);
    let h160 = hash160_point(owner.point(), true).unwrap();
    let lock_height = 600_000i64;
    let script_pubkey = Script::new(vec![
        Cmd::Push(encode_num(lock_height)),
        Cmd::Op(OP_CHECKLOCKTIMEVERIFY),
        Cmd::Op(OP_DROP),
    ])
    .concat(&Script::p2pkh(&h160));

    let store = TxStore::new();
    let prev = fund(&store, 20_000, script_pubkey);

    let mut ready = spend(prev, 19_000, 600_001, 0xffff_fffe);
    assert!(ready.sign_input(0, &owner, &store).unwrap());
    assert!(ready.verify(&store).unwrap());

    let mut too_early = spend(prev, 19_000, 599_999, 0xffff_fffe);
    assert!(!too_early.sign_input(0, &owner, &store).unwrap());

    // A final sequence disables the locktime, so the check must fail
    let mut final_sequence = spend(prev, 19_000, 600_001, 0xffff_ffff);
    assert!(!final_sequence.sign_input(0, &owner, &store).unwrap());
}

#[test]
fn test_store_persistence_and_config() {
    init_logger();
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("tx_cache.json");
    let config_path = dir.path().join("btc.toml");
    std::fs::write(
        &config_path,
        format!("tx_cache_path = {:?}\n", cache_path.display().to_string()),
    )
    .unwrap();
    let config = Config::from_toml_file(&config_path).unwrap();
    assert_eq!(config.tx_cache_path, cache_path);

    let owner = key(777);
    let h160 = hash160_point(owner.point(), true).unwrap();
    let store = TxStore::from_config(&config).unwrap();
    assert!(store.is_empty());
    let prev = fund(&store, 5_000, Script::p2pkh(&h160));
    store.save(&config.tx_cache_path).unwrap();

    let reloaded = TxStore::from_config(&config).unwrap();
    assert_eq!(reloaded.len(), 1);
    let fetched = reloaded.fetch(&prev, true).unwrap();
    assert!(fetched.is_testnet());
    assert_eq!(fetched.hash().unwrap(), prev);

    let mut tx = spend(prev, 4_000, 0, 0xffff_ffff);
    assert!(tx.sign_input(0, &owner, &reloaded).unwrap());
    assert!(tx.verify(&reloaded).unwrap());
}

#[test]
fn test_wif_key_signs_identically() {
    init_logger();
    let owner = key(5_003);
    let wif = owner.wif(true, true).unwrap();
    let decoded = PrivateKey::from_wif(&wif).unwrap();
    assert!(decoded.compressed);
    assert!(decoded.testnet);

    let z = BigUint::from_bytes_be(&hash256(b"same message"));
    assert_eq!(owner.sign(&z).unwrap(), decoded.key.sign(&z).unwrap());
}
