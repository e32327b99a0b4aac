//! Wires and the arena that owns them.
//!
//! A wire carries one 128-bit key per SIMD slot. On the garbler side the key
//! is the label encoding `0`; the label encoding `1` is that key XOR the
//! global delta. On the evaluator side the key is the single active label.
//! Keys are written exactly once, by the gate producing the wire, and read
//! by any number of consumers, which block until the keys are there.

use crate::errors::YaoError;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use yao_primitives::{promise, AbortRegistry, Block, BlockingFuture, Promise};

/// Stable handle of a wire within a [`WireArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId(usize);

impl WireId {
    /// Position of the wire in its arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Shared, immutable keys of one wire.
pub type WireKeys = Arc<Vec<Block>>;

/// A wire, replicated across `num_simd` slots.
pub struct YaoWire {
    num_simd: usize,
    promise: Mutex<Option<Promise<WireKeys>>>,
    keys: BlockingFuture<WireKeys>,
}

impl YaoWire {
    fn new(num_simd: usize) -> Self {
        let (promise, keys) = promise();
        YaoWire {
            num_simd,
            promise: Mutex::new(Some(promise)),
            keys,
        }
    }

    /// Number of SIMD slots.
    pub fn num_simd(&self) -> usize {
        self.num_simd
    }

    /// Publish the keys of this wire.
    pub fn set_keys(&self, keys: Vec<Block>) -> Result<(), YaoError> {
        if keys.len() != self.num_simd {
            return Err(YaoError::ContractViolation(format!(
                "wire expects {} keys, got {}",
                self.num_simd,
                keys.len()
            )));
        }
        let promise = self
            .promise
            .lock()
            .take()
            .ok_or_else(|| YaoError::ContractViolation("wire written twice".to_string()))?;
        Ok(promise.set(Arc::new(keys))?)
    }

    /// Block until the keys are published.
    pub fn keys(&self) -> Result<WireKeys, YaoError> {
        Ok(self.keys.get()?)
    }

    /// Whether the keys have been published.
    pub fn is_ready(&self) -> bool {
        self.keys.is_ready()
    }
}

/// Circuit-scoped storage of all wires of one party.
///
/// Wires are only ever appended, so a [`WireId`] stays valid for the
/// lifetime of the arena.
pub struct WireArena {
    wires: RwLock<Vec<Arc<YaoWire>>>,
    aborts: Arc<AbortRegistry>,
}

impl WireArena {
    /// Make an empty arena whose wires are woken by `aborts`.
    pub fn new(aborts: Arc<AbortRegistry>) -> Self {
        WireArena {
            wires: RwLock::new(Vec::new()),
            aborts,
        }
    }

    /// Allocate a wire with `num_simd` slots.
    pub fn new_wire(&self, num_simd: usize) -> WireId {
        let wire = YaoWire::new(num_simd);
        self.aborts.register(&wire.keys);
        let mut wires = self.wires.write();
        wires.push(Arc::new(wire));
        WireId(wires.len() - 1)
    }

    /// Allocate `n` wires with `num_simd` slots each.
    pub fn new_wires(&self, n: usize, num_simd: usize) -> Vec<WireId> {
        (0..n).map(|_| self.new_wire(num_simd)).collect()
    }

    /// Look up a wire.
    pub fn get(&self, id: WireId) -> Result<Arc<YaoWire>, YaoError> {
        self.wires
            .read()
            .get(id.0)
            .cloned()
            .ok_or_else(|| YaoError::ContractViolation(format!("unknown wire {}", id.0)))
    }

    /// Number of SIMD slots of a wire.
    pub fn num_simd(&self, id: WireId) -> Result<usize, YaoError> {
        Ok(self.get(id)?.num_simd())
    }

    /// Block until the keys of `id` are published.
    pub fn keys(&self, id: WireId) -> Result<WireKeys, YaoError> {
        self.get(id)?.keys()
    }

    /// Publish the keys of `id`.
    pub fn set_keys(&self, id: WireId, keys: Vec<Block>) -> Result<(), YaoError> {
        self.get(id)?.set_keys(keys)
    }

    /// Number of wires.
    pub fn len(&self) -> usize {
        self.wires.read().len()
    }

    /// Whether the arena holds no wires.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
