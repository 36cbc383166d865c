// libs/appointment-cell/src/services/store.rs
use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentFilter, AppointmentStatus};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Another slot-holding appointment already owns `(doctor_id, slot)`.
    #[error("Slot '{slot}' with doctor {doctor_id} is already held")]
    SlotTaken { doctor_id: String, slot: String },

    #[error("Appointment {0} not found")]
    NotFound(Uuid),

    /// Compare-and-set lost: the stored status was not the expected one.
    #[error("Appointment {id} is {actual}, expected {expected}")]
    StatusChanged {
        id: Uuid,
        expected: AppointmentStatus,
        actual: AppointmentStatus,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store error: {0}")]
    Backend(String),
}

/// Persistence for appointments.
///
/// Implementations must make [`AppointmentStore::create_if_absent`] atomic:
/// two concurrent calls for the same doctor and slot label may not both
/// succeed while the first appointment still holds the slot.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn create_if_absent(&self, appointment: Appointment) -> Result<Appointment, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Appointment, StoreError>;

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError>;

    /// Set the status only if it is still `expected`.
    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, StoreError>;
}

#[derive(Default)]
struct StoreState {
    appointments: HashMap<Uuid, Appointment>,
    /// (doctor_id, slot label) -> id of the appointment holding it.
    held_slots: HashMap<(String, String), Uuid>,
    /// Insertion order, used as the stable listing order.
    order: Vec<Uuid>,
}

/// Process-local store. The write lock covers check-and-insert, so the slot
/// index can never hold two owners.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    state: RwLock<StoreState>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.appointments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn create_if_absent(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let mut state = self.state.write().await;
        let key = (appointment.doctor_id.clone(), appointment.slot.clone());

        if appointment.holds_slot() {
            if let Some(owner) = state.held_slots.get(&key) {
                debug!("Slot {:?} already held by {}", key, owner);
                return Err(StoreError::SlotTaken {
                    doctor_id: key.0,
                    slot: key.1,
                });
            }
            state.held_slots.insert(key, appointment.id);
        }

        state.order.push(appointment.id);
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> Result<Appointment, StoreError> {
        self.state
            .read()
            .await
            .appointments
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.appointments.get(id))
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let appointment = state
            .appointments
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;

        if appointment.status != expected {
            return Err(StoreError::StatusChanged {
                id,
                expected,
                actual: appointment.status,
            });
        }

        let key = (appointment.doctor_id.clone(), appointment.slot.clone());
        if appointment.holds_slot() && !new_status.holds_slot() {
            if state.held_slots.get(&key) == Some(&id) {
                state.held_slots.remove(&key);
            }
        } else if !appointment.holds_slot() && new_status.holds_slot() {
            if state.held_slots.contains_key(&key) {
                return Err(StoreError::SlotTaken {
                    doctor_id: key.0,
                    slot: key.1,
                });
            }
            state.held_slots.insert(key, id);
        }

        appointment.status = new_status;
        Ok(appointment.clone())
    }
}
