use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use evidence_integrity::digest;

use crate::error::{BackendError, BackendResult};
use crate::traits::{IpfsClient, ObjectData, ObjectLock, ObjectStoreClient};

#[derive(Clone, Debug)]
struct MemoryObject {
    data: Vec<u8>,
    attributes: BTreeMap<String, String>,
    lock: Option<ObjectLock>,
}

/// In-memory object-store client.
///
/// Intended for tests and embedding. Supports a simulated outage through
/// [`set_available`](Self::set_available) and in-place corruption through
/// [`tamper`](Self::tamper).
pub struct InMemoryObjectClient {
    objects: RwLock<HashMap<String, MemoryObject>>,
    available: AtomicBool,
}

impl InMemoryObjectClient {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggle the simulated outage. While unavailable every call fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Replace the bytes under `key`, leaving attributes untouched.
    /// Returns `false` if the key does not exist.
    pub fn tamper(&self, key: &str, data: &[u8]) -> bool {
        let mut map = self.objects.write().expect("lock poisoned");
        match map.get_mut(key) {
            Some(obj) => {
                obj.data = data.to_vec();
                true
            }
            None => false,
        }
    }

    /// Retention lock recorded for `key`, if any.
    pub fn lock_for(&self, key: &str) -> Option<ObjectLock> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(key).and_then(|obj| obj.lock)
    }

    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> BackendResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable("in-memory object store offline".into()))
        }
    }
}

impl Default for InMemoryObjectClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryObjectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectClient")
            .field("object_count", &self.len())
            .finish()
    }
}

#[async_trait]
impl ObjectStoreClient for InMemoryObjectClient {
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        attributes: &BTreeMap<String, String>,
        lock: Option<ObjectLock>,
    ) -> BackendResult<()> {
        self.check_available()?;
        let mut map = self.objects.write().expect("lock poisoned");
        map.insert(
            key.to_string(),
            MemoryObject {
                data: data.to_vec(),
                attributes: attributes.clone(),
                lock,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> BackendResult<ObjectData> {
        self.check_available()?;
        let map = self.objects.read().expect("lock poisoned");
        map.get(key)
            .map(|obj| ObjectData {
                data: obj.data.clone(),
                attributes: obj.attributes.clone(),
            })
            .ok_or_else(|| BackendError::NotFound(key.to_string()))
    }

    async fn head(&self, key: &str) -> BackendResult<bool> {
        self.check_available()?;
        Ok(self.objects.read().expect("lock poisoned").contains_key(key))
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> BackendResult<String> {
        self.check_available()?;
        Ok(format!("memory://{key}?expires={}", expires_in.as_secs()))
    }
}

/// In-memory IPFS client.
///
/// Addresses are `mem-` followed by the SHA-256 hex of the content; they are
/// stable but are not real CIDs.
pub struct InMemoryIpfsClient {
    blocks: RwLock<HashMap<String, Vec<u8>>>,
    pins: RwLock<HashSet<String>>,
    available: AtomicBool,
}

impl InMemoryIpfsClient {
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
            pins: RwLock::new(HashSet::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Drop the pin on `address`, keeping the content.
    pub fn unpin(&self, address: &str) -> bool {
        self.pins
            .write()
            .expect("lock poisoned")
            .remove(address)
    }

    /// Address `add` would return for `data`.
    pub fn address_of(data: &[u8]) -> String {
        format!("mem-{}", digest(data).hex_digest())
    }

    pub fn len(&self) -> usize {
        self.blocks.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> BackendResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable("in-memory IPFS node offline".into()))
        }
    }
}

impl Default for InMemoryIpfsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryIpfsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIpfsClient")
            .field("block_count", &self.len())
            .finish()
    }
}

#[async_trait]
impl IpfsClient for InMemoryIpfsClient {
    async fn add(&self, data: &[u8], pin: bool) -> BackendResult<String> {
        self.check_available()?;
        let address = Self::address_of(data);
        self.blocks
            .write()
            .expect("lock poisoned")
            .entry(address.clone())
            .or_insert_with(|| data.to_vec());
        if pin {
            self.pins
                .write()
                .expect("lock poisoned")
                .insert(address.clone());
        }
        Ok(address)
    }

    async fn cat(&self, address: &str) -> BackendResult<Vec<u8>> {
        self.check_available()?;
        self.blocks
            .read()
            .expect("lock poisoned")
            .get(address)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(address.to_string()))
    }

    async fn pin_ls(&self, address: &str) -> BackendResult<bool> {
        self.check_available()?;
        Ok(self.pins.read().expect("lock poisoned").contains(address))
    }
}
