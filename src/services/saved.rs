//! Shared saved/unsaved state with optimistic updates.
//!
//! [`SavedStore`] is the single source every view reads from: each supplier
//! has one `watch` channel and all views subscribe to it, so two views of the
//! same supplier can never show different values. [`SaveStateSynchronizer`]
//! is the only mutator. It flips the value immediately, drives the backend
//! mutation and rolls back on failure.
//!
//! Toggles that arrive while a mutation is in flight only move the intent.
//! The in-flight driver re-reads the intent after every response and issues
//! one more call if, and only if, the intent differs from what the backend
//! has confirmed, so the last intent always wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};

use crate::domain::supplier::Supplier;
use crate::domain::types::SupplierId;
use crate::repository::SupplierWriter;
use crate::repository::errors::RepositoryError;
use crate::services::{ServiceError, ServiceResult};

const FAILURE_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug)]
struct SavedEntry {
    /// Last value acknowledged by the backend (or seeded from it).
    confirmed: bool,
    /// Whether `confirmed` came from the backend rather than a placeholder.
    known: bool,
    in_flight: bool,
    /// Displayed value; doubles as the latest user intent.
    value: watch::Sender<bool>,
}

impl SavedEntry {
    fn new(saved: bool, known: bool) -> Self {
        let (value, _) = watch::channel(saved);
        Self {
            confirmed: saved,
            known,
            in_flight: false,
            value,
        }
    }

    fn displayed(&self) -> bool {
        *self.value.borrow()
    }

    fn display(&self, saved: bool) {
        self.value.send_if_modified(|current| {
            let changed = *current != saved;
            *current = saved;
            changed
        });
    }
}

/// A failed mutation, broadcast so a notification surface can show it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveFailure {
    pub supplier_id: SupplierId,
    /// The state the user asked for and did not get.
    pub attempted: bool,
    pub error: ServiceError,
}

/// Result of a save toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveTransition {
    /// This call drove the backend until it matched the final intent.
    Settled { saved: bool, requests: usize },
    /// A mutation was already in flight; its driver will apply this intent.
    Coalesced { saved: bool },
}

enum Begin {
    Drive,
    Coalesced,
}

/// Canonical saved flags keyed by supplier.
#[derive(Debug)]
pub struct SavedStore {
    entries: Mutex<HashMap<SupplierId, SavedEntry>>,
    failures: broadcast::Sender<SaveFailure>,
}

impl Default for SavedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SavedStore {
    pub fn new() -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        Self {
            entries: Mutex::new(HashMap::new()),
            failures,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SupplierId, SavedEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribes a view to the supplier's saved flag.
    pub fn subscribe(&self, supplier_id: SupplierId) -> watch::Receiver<bool> {
        self.lock()
            .entry(supplier_id)
            .or_insert_with(|| SavedEntry::new(false, false))
            .value
            .subscribe()
    }

    /// Currently displayed value; `false` for suppliers never seen.
    pub fn is_saved(&self, supplier_id: SupplierId) -> bool {
        self.lock()
            .get(&supplier_id)
            .is_some_and(SavedEntry::displayed)
    }

    pub fn is_pending(&self, supplier_id: SupplierId) -> bool {
        self.lock()
            .get(&supplier_id)
            .is_some_and(|entry| entry.in_flight)
    }

    /// Records the backend's value for a supplier the store has no
    /// authoritative value for yet. Known suppliers are left untouched.
    pub fn seed(&self, supplier_id: SupplierId, saved: bool) {
        let mut entries = self.lock();
        let entry = entries
            .entry(supplier_id)
            .or_insert_with(|| SavedEntry::new(saved, true));

        if entry.known || entry.in_flight {
            return;
        }
        entry.known = true;
        entry.confirmed = saved;
        entry.display(saved);
    }

    pub fn seed_from(&self, suppliers: &[Supplier]) {
        for supplier in suppliers {
            self.seed(supplier.id, supplier.is_saved);
        }
    }

    /// Failure notifications for every toggle that had to roll back.
    pub fn failures(&self) -> broadcast::Receiver<SaveFailure> {
        self.failures.subscribe()
    }

    fn begin(&self, supplier_id: SupplierId, desired: bool, assumed_confirmed: bool) -> Begin {
        let mut entries = self.lock();
        let entry = entries
            .entry(supplier_id)
            .or_insert_with(|| SavedEntry::new(assumed_confirmed, true));

        if !entry.known {
            entry.known = true;
            entry.confirmed = assumed_confirmed;
        }

        entry.display(desired);

        if entry.in_flight {
            Begin::Coalesced
        } else {
            entry.in_flight = true;
            Begin::Drive
        }
    }

    /// Next value to send, or `None` once the backend matches the intent.
    fn next_target(&self, supplier_id: SupplierId) -> Option<bool> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&supplier_id)?;

        let intent = entry.displayed();
        if intent == entry.confirmed {
            entry.in_flight = false;
            None
        } else {
            Some(intent)
        }
    }

    fn confirm(&self, supplier_id: SupplierId, saved: bool) {
        if let Some(entry) = self.lock().get_mut(&supplier_id) {
            entry.confirmed = saved;
        }
    }

    fn rollback(&self, supplier_id: SupplierId) -> bool {
        let mut entries = self.lock();
        match entries.get_mut(&supplier_id) {
            Some(entry) => {
                entry.in_flight = false;
                entry.display(entry.confirmed);
                entry.confirmed
            }
            None => false,
        }
    }

    fn notify_failure(&self, failure: SaveFailure) {
        // No subscribers is fine; the error is also returned to the caller.
        let _ = self.failures.send(failure);
    }
}

/// Releases the in-flight flag of a driver whose future was dropped before
/// the backend answered, restoring the last confirmed value.
struct InFlightGuard<'a> {
    store: &'a SavedStore,
    supplier_id: SupplierId,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let restored = self.store.rollback(self.supplier_id);
            log::warn!(
                "Save mutation for supplier {} was abandoned, restored saved={restored}",
                self.supplier_id
            );
        }
    }
}

/// Drives optimistic save/unsave mutations against the backend.
pub struct SaveStateSynchronizer<W: ?Sized> {
    store: Arc<SavedStore>,
    writer: Arc<W>,
}

impl<W> SaveStateSynchronizer<W>
where
    W: SupplierWriter + ?Sized,
{
    pub fn new(store: Arc<SavedStore>, writer: Arc<W>) -> Self {
        Self { store, writer }
    }

    /// Flips the saved flag the user saw (`currently_saved`).
    pub async fn toggle_save(
        &self,
        supplier_id: SupplierId,
        currently_saved: bool,
    ) -> ServiceResult<SaveTransition> {
        self.drive(supplier_id, !currently_saved, currently_saved)
            .await
    }

    /// Requests an explicit final state.
    pub async fn set_saved(
        &self,
        supplier_id: SupplierId,
        saved: bool,
    ) -> ServiceResult<SaveTransition> {
        self.drive(supplier_id, saved, !saved).await
    }

    async fn drive(
        &self,
        supplier_id: SupplierId,
        desired: bool,
        assumed_confirmed: bool,
    ) -> ServiceResult<SaveTransition> {
        if let Begin::Coalesced = self.store.begin(supplier_id, desired, assumed_confirmed) {
            log::debug!("Coalesced save toggle for supplier {supplier_id} into in-flight mutation");
            return Ok(SaveTransition::Coalesced { saved: desired });
        }

        let mut guard = InFlightGuard {
            store: &self.store,
            supplier_id,
            armed: true,
        };
        let mut requests = 0;
        while let Some(target) = self.store.next_target(supplier_id) {
            requests += 1;
            let result = if target {
                self.writer.save_supplier(supplier_id).await
            } else {
                self.writer.unsave_supplier(supplier_id).await
            };

            match result {
                Ok(()) => self.store.confirm(supplier_id, target),
                Err(RepositoryError::Conflict(message)) => {
                    log::debug!("Supplier {supplier_id} already in requested state: {message}");
                    self.store.confirm(supplier_id, target);
                }
                Err(err) => {
                    guard.armed = false;
                    let restored = self.store.rollback(supplier_id);
                    let error = ServiceError::from(err);
                    log::warn!(
                        "Failed to {} supplier {supplier_id}, restored saved={restored}: {error}",
                        if target { "save" } else { "unsave" },
                    );
                    self.store.notify_failure(SaveFailure {
                        supplier_id,
                        attempted: target,
                        error: error.clone(),
                    });
                    return Err(error);
                }
            }
        }

        guard.armed = false;
        Ok(SaveTransition::Settled {
            saved: self.store.is_saved(supplier_id),
            requests,
        })
    }
}
