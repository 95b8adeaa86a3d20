use crate::config::Config;
use crate::core::{Transaction, TxFetcher};
use crate::error::{BtcError, Result};
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::RwLock;

/// Known transactions for resolving inputs ( K -> txid_hex, V => Transaction )
///
/// On disk this is a JSON object mapping txid hex to raw transaction hex.
pub struct TxStore {
    inner: RwLock<HashMap<String, Transaction>>,
    testnet: bool,
}

impl Default for TxStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TxStore {
    pub fn new() -> TxStore {
        TxStore::with_network(false)
    }

    /// An empty store whose raw transactions are parsed as `testnet` ones
    pub fn with_network(testnet: bool) -> TxStore {
        TxStore {
            inner: RwLock::new(HashMap::new()),
            testnet,
        }
    }

    pub fn is_testnet(&self) -> bool {
        self.testnet
    }

    /// Load a mainnet store file. Entries whose raw hex does not parse are
    /// skipped with a warning; an unreadable or malformed file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<TxStore> {
        TxStore::load_for_network(path, false)
    }

    pub fn load_for_network(path: impl AsRef<Path>, testnet: bool) -> Result<TxStore> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let disk: BTreeMap<String, String> = serde_json::from_str(&contents)?;

        let mut map = HashMap::with_capacity(disk.len());
        for (tx_id, raw_hex) in disk {
            match decode_raw(&raw_hex, testnet) {
                Ok(tx) => {
                    map.insert(tx_id.to_ascii_lowercase(), tx);
                }
                Err(e) => log::warn!("Skipping cached transaction {tx_id}: {e}"),
            }
        }
        log::debug!("Loaded {} transactions from {}", map.len(), path.display());
        Ok(TxStore {
            inner: RwLock::new(map),
            testnet,
        })
    }

    /// Open the store named by the configuration on its network, starting
    /// empty when the file does not exist yet
    pub fn from_config(config: &Config) -> Result<TxStore> {
        if config.tx_cache_path.exists() {
            TxStore::load_for_network(&config.tx_cache_path, config.testnet)
        } else {
            log::debug!(
                "No transaction store at {}, starting empty",
                config.tx_cache_path.display()
            );
            Ok(TxStore::with_network(config.testnet))
        }
    }

    /// Write every transaction as `txid: raw hex`, sorted by id
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let pool = self.read_pool()?;
        let mut disk = BTreeMap::new();
        for (tx_id, tx) in pool.iter() {
            disk.insert(tx_id.clone(), HEXLOWER.encode(&tx.serialize()?));
        }
        let json = serde_json::to_string_pretty(&disk)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Add a transaction under its own id, returning that id
    pub fn insert(&self, tx: Transaction) -> Result<String> {
        let tx_id = tx.id()?;
        let mut pool = self.write_pool()?;
        pool.insert(tx_id.clone(), tx);
        Ok(tx_id)
    }

    /// Add a transaction given as raw hex, segwit serializations included
    pub fn insert_raw(&self, raw_hex: &str) -> Result<String> {
        self.insert(decode_raw(raw_hex, self.testnet)?)
    }

    pub fn get(&self, tx_id: &str) -> Option<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.get(&tx_id.to_ascii_lowercase()).cloned(),
            Err(_) => {
                log::error!("Failed to acquire read lock on transaction store");
                None
            }
        }
    }

    pub fn contains(&self, tx_id: &str) -> bool {
        self.get(tx_id).is_some()
    }

    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(pool) => pool.len(),
            Err(_) => {
                log::error!("Failed to acquire read lock on transaction store");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_pool(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Transaction>>> {
        self.inner.read().map_err(|_| {
            log::error!("Failed to acquire read lock on transaction store");
            BtcError::Io("Transaction store lock poisoned".to_string())
        })
    }

    fn write_pool(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Transaction>>> {
        self.inner.write().map_err(|_| {
            log::error!("Failed to acquire write lock on transaction store");
            BtcError::Io("Transaction store lock poisoned".to_string())
        })
    }
}

impl TxFetcher for TxStore {
    fn fetch(&self, tx_id: &[u8; 32], testnet: bool) -> Result<Transaction> {
        let wanted = HEXLOWER.encode(tx_id);
        let mut tx = {
            let pool = self
                .read_pool()
                .map_err(|e| BtcError::Fetch(e.to_string()))?;
            pool.get(&wanted)
                .cloned()
                .ok_or_else(|| BtcError::Fetch(format!("Transaction {wanted} not in store")))?
        };
        let actual = tx.id()?;
        if actual != wanted {
            return Err(BtcError::Fetch(format!(
                "not the same id: {actual} vs {wanted}"
            )));
        }
        tx.set_testnet(testnet);
        Ok(tx)
    }
}

fn decode_raw(raw_hex: &str, testnet: bool) -> Result<Transaction> {
    let raw = HEXLOWER_PERMISSIVE.decode(raw_hex.trim().as_bytes())?;
    Transaction::parse_from_network_bytes(&raw, testnet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TxIn, TxOut};
    use crate::script::Script;

    const BOOK_TX: &str = "0100000001813f79011acb80925dfe69b3def355fe914bd1d96a3f5f71bf8303c6a989c7d1000000006b483045022100ed81ff192e75a3fd2304004dcadb746fa5e24c5031ccfcf21320b0277457c98f02207a986d955c6e0cb35d446a89d3f56100f4d7f67801c31967743a9c8e10615bed01210349fc4e631e3624a545de3f89f5d8684c7b8138bd94bdd531d2e213bf016b278afeffffff02a135ef01000000001976a914bc3b654dca7e56b04dca18f2566cdaf02e8d9ada88ac99c39800000000001976a9141c4bc762dd5423e332166702cb75f40df79fea1288ac19430600";
    const BOOK_TX_ID: &str = "452c629d67e41baec3ac6f04fe744b4b9617f8f859c63b3002f8684e7a4fee03";

    fn id_bytes(hex_id: &str) -> [u8; 32] {
        HEXLOWER.decode(hex_id.as_bytes()).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_insert_raw_and_fetch() {
        let store = TxStore::new();
        assert!(store.is_empty());
        let id = store.insert_raw(BOOK_TX).unwrap();
        assert_eq!(id, BOOK_TX_ID);
        assert!(store.contains(&BOOK_TX_ID.to_uppercase()));

        let tx = store.fetch(&id_bytes(BOOK_TX_ID), true).unwrap();
        assert!(tx.is_testnet());
        assert_eq!(tx.get_locktime(), 410_393);
    }

    #[test]
    fn test_missing_transaction_is_fetch_error() {
        let store = TxStore::new();
        assert!(matches!(
            store.fetch(&[0u8; 32], false),
            Err(BtcError::Fetch(_))
        ));
    }

    #[test]
    fn test_id_mismatch_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        // A file claiming the wrong id for the raw bytes
        let wrong_id = "00".repeat(32);
        fs::write(&path, format!("{{\"{wrong_id}\": \"{BOOK_TX}\"}}")).unwrap();
        let store = TxStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
        let err = store.fetch(&[0u8; 32], false).unwrap_err();
        assert!(matches!(err, BtcError::Fetch(msg) if msg.contains("not the same id")));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let store = TxStore::new();
        store.insert_raw(BOOK_TX).unwrap();
        let other = Transaction::new(
            2,
            vec![TxIn::new([0x42; 32], 1)],
            vec![TxOut::new(5_000, Script::p2sh(&[0x07; 20]))],
            0,
            false,
        );
        let other_id = store.insert(other.clone()).unwrap();
        store.save(&path).unwrap();

        let reloaded = TxStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(&other_id), Some(other));
        assert!(reloaded.contains(BOOK_TX_ID));

        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.get(BOOK_TX_ID).map(String::as_str), Some(BOOK_TX));
    }

    #[test]
    fn test_load_skips_bad_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(
            &path,
            format!("{{\"{BOOK_TX_ID}\": \"{BOOK_TX}\", \"ab\": \"zz\", \"cd\": \"0100\"}}"),
        )
        .unwrap();
        let store = TxStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TxStore::load(dir.path().join("missing.json")),
            Err(BtcError::Io(_))
        ));
        let garbage = dir.path().join("garbage.json");
        fs::write(&garbage, "not json").unwrap();
        assert!(matches!(
            TxStore::load(&garbage),
            Err(BtcError::Serialization(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let config = Config {
            testnet: false,
            tx_cache_path: path.clone(),
        };
        assert!(TxStore::from_config(&config).unwrap().is_empty());

        let store = TxStore::new();
        store.insert_raw(BOOK_TX).unwrap();
        store.save(&path).unwrap();
        let mainnet = TxStore::from_config(&config).unwrap();
        assert_eq!(mainnet.len(), 1);
        assert!(!mainnet.is_testnet());
        assert!(!mainnet.get(BOOK_TX_ID).unwrap().is_testnet());
    }

    #[test]
    fn test_from_config_uses_configured_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let config = Config {
            testnet: true,
            tx_cache_path: path.clone(),
        };
        let fresh = TxStore::from_config(&config).unwrap();
        assert!(fresh.is_testnet());
        fresh.insert_raw(BOOK_TX).unwrap();
        assert!(fresh.get(BOOK_TX_ID).unwrap().is_testnet());
        fresh.save(&path).unwrap();

        let reloaded = TxStore::from_config(&config).unwrap();
        assert!(reloaded.is_testnet());
        assert!(reloaded.get(BOOK_TX_ID).unwrap().is_testnet());
        // An explicit fetch still answers for the network it was asked about
        assert!(!reloaded.fetch(&id_bytes(BOOK_TX_ID), false).unwrap().is_testnet());
    }
}
