use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use crate::domain::{Customer, CustomerId, TaxId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("a customer with tax id {0} already exists")]
    DuplicateTaxId(TaxId),

    #[error("no customer with tax id {0}")]
    NotFound(TaxId),
}

/// Shared reference to one open customer record.
///
/// Obtained from [`CustomerRegistry::lookup`]. The record behind it carries its own lock,
/// so operations on different customers never contend with each other.
#[derive(Debug, Clone)]
pub struct CustomerHandle {
    tax_id: TaxId,
    record: Arc<Mutex<Customer>>,
}

impl CustomerHandle {
    pub fn tax_id(&self) -> TaxId {
        self.tax_id
    }
}

struct Entry {
    /// Opening order, used to list customers deterministically
    sequence: u64,
    record: Arc<Mutex<Customer>>,
}

#[derive(Default)]
struct Index {
    entries: HashMap<TaxId, Entry>,
    next_sequence: u64,
}

/// In-memory store of every open customer, keyed by tax id.
///
/// Lock order is always index first, then customer record. `open` and `close` take the
/// index write lock; everything else takes the read lock plus the one record it touches.
impl Index {
    /// True if `handle` still points at the registered record for its tax id.
    fn holds(&self, handle: &CustomerHandle) -> bool {
        self.entries
            .get(&handle.tax_id)
            .is_some_and(|entry| Arc::ptr_eq(&entry.record, &handle.record))
    }
}

#[derive(Default)]
pub struct CustomerRegistry {
    index: RwLock<Index>,
}

impl CustomerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new account. Fails if the tax id is already registered.
    pub fn open(&self, tax_id: TaxId, name: impl Into<String>) -> Result<CustomerId, RegistryError> {
        let mut index = self.write_index();
        if index.entries.contains_key(&tax_id) {
            return Err(RegistryError::DuplicateTaxId(tax_id));
        }

        let customer = Customer::new(tax_id, name);
        let id = customer.id;
        let sequence = index.next_sequence;
        index.next_sequence += 1;
        index.entries.insert(
            tax_id,
            Entry {
                sequence,
                record: Arc::new(Mutex::new(customer)),
            },
        );
        Ok(id)
    }

    /// Resolve a tax id to its open customer.
    pub fn lookup(&self, tax_id: TaxId) -> Result<CustomerHandle, RegistryError> {
        self.read_index()
            .entries
            .get(&tax_id)
            .map(|entry| CustomerHandle {
                tax_id,
                record: Arc::clone(&entry.record),
            })
            .ok_or(RegistryError::NotFound(tax_id))
    }

    /// Run `f` with exclusive access to the customer behind `handle`.
    ///
    /// Fails with `NotFound` if the account was closed after the handle was obtained.
    /// The index read lock is held for the duration, so `close` cannot interleave.
    pub fn with_customer<T>(
        &self,
        handle: &CustomerHandle,
        f: impl FnOnce(&mut Customer) -> T,
    ) -> Result<T, RegistryError> {
        let index = self.read_index();
        if !index.holds(handle) {
            return Err(RegistryError::NotFound(handle.tax_id));
        }

        let mut customer = lock_record(&handle.record);
        Ok(f(&mut *customer))
    }

    /// Remove the customer behind `handle`, statement included.
    /// Returns the customers that remain, in opening order.
    ///
    /// A stale handle fails with `NotFound` and never removes an account reopened
    /// under the same tax id.
    pub fn close(&self, handle: &CustomerHandle) -> Result<Vec<Customer>, RegistryError> {
        let mut index = self.write_index();
        if !index.holds(handle) {
            return Err(RegistryError::NotFound(handle.tax_id));
        }
        index.entries.remove(&handle.tax_id);
        Ok(snapshot_of(&index))
    }

    /// Copy of every open customer, in opening order.
    pub fn snapshot(&self) -> Vec<Customer> {
        snapshot_of(&self.read_index())
    }

    pub fn len(&self) -> usize {
        self.read_index().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_index(&self) -> RwLockReadGuard<'_, Index> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_index(&self) -> RwLockWriteGuard<'_, Index> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn snapshot_of(index: &Index) -> Vec<Customer> {
    let mut entries: Vec<&Entry> = index.entries.values().collect();
    entries.sort_by_key(|entry| entry.sequence);
    entries
        .into_iter()
        .map(|entry| lock_record(&entry.record).clone())
        .collect()
}

// A poisoned record is still consistent:
// every mutation is a single push or assignment.
fn lock_record(record: &Mutex<Customer>) -> MutexGuard<'_, Customer> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}
