// libs/appointment-cell/src/services/supabase_store.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use shared_database::supabase::{SupabaseClient, SupabaseError};

use crate::models::{Appointment, AppointmentFilter, AppointmentStatus};
use crate::services::store::{AppointmentStore, StoreError};

const TABLE_PATH: &str = "/rest/v1/appointments";

/// Appointments kept in the `appointments` table behind PostgREST. The
/// partial unique index on `(doctor_id, slot)` for non-cancelled rows makes
/// inserts conflict-safe across processes.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
    service_token: String,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>, service_token: &str) -> Self {
        Self {
            supabase,
            service_token: service_token.to_string(),
        }
    }

    fn query_path(filter: &AppointmentFilter) -> String {
        let mut query_parts = vec!["select=*".to_string()];

        if let Some(doctor_id) = &filter.doctor_id {
            query_parts.push(format!("doctor_id=eq.{}", urlencoding::encode(doctor_id)));
        }
        if let Some(patient_id) = &filter.patient_id {
            query_parts.push(format!("patient_id=eq.{}", urlencoding::encode(patient_id)));
        }
        if let Some(statuses) = &filter.statuses {
            let list = statuses
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(",");
            query_parts.push(format!("status=in.({})", list));
        }
        query_parts.push("order=created_at.asc".to_string());

        format!("{}?{}", TABLE_PATH, query_parts.join("&"))
    }

    fn parse_rows(rows: Vec<Value>) -> Result<Vec<Appointment>, StoreError> {
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| StoreError::Backend(format!("Failed to parse appointment: {}", e)))
            })
            .collect()
    }

    fn map_error(e: SupabaseError) -> StoreError {
        if e.is_transient() {
            warn!("Transient appointment store failure: {}", e);
            StoreError::Unavailable(e.to_string())
        } else {
            error!("Appointment store failure: {}", e);
            StoreError::Backend(e.to_string())
        }
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn create_if_absent(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let body = serde_json::to_value(&appointment)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let result: Result<Vec<Value>, SupabaseError> = self
            .supabase
            .request_with_headers(
                Method::POST,
                TABLE_PATH,
                Some(self.service_token.as_str()),
                Some(body),
                Some(SupabaseClient::representation_headers()),
            )
            .await;

        let rows = match result {
            Ok(rows) => rows,
            Err(SupabaseError::Conflict(message)) => {
                debug!("Insert rejected by slot index: {}", message);
                return Err(StoreError::SlotTaken {
                    doctor_id: appointment.doctor_id,
                    slot: appointment.slot,
                });
            }
            Err(e) => return Err(Self::map_error(e)),
        };

        Self::parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("Insert returned no row".to_string()))
    }

    async fn get(&self, id: Uuid) -> Result<Appointment, StoreError> {
        let path = format!("{}?id=eq.{}&select=*", TABLE_PATH, id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(self.service_token.as_str()), None)
            .await
            .map_err(Self::map_error)?;

        Self::parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        let path = Self::query_path(filter);
        debug!("Listing appointments: {}", path);

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(self.service_token.as_str()), None)
            .await
            .map_err(Self::map_error)?;

        Self::parse_rows(rows)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        // Filtering on the current status turns the PATCH into a compare-and-set
        let path = format!(
            "{}?id=eq.{}&status=eq.{}",
            TABLE_PATH,
            id,
            expected.as_str()
        );

        let result: Result<Vec<Value>, SupabaseError> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(self.service_token.as_str()),
                Some(json!({ "status": new_status })),
                Some(SupabaseClient::representation_headers()),
            )
            .await;

        let rows = match result {
            Ok(rows) => rows,
            Err(SupabaseError::Conflict(_)) => {
                let current = self.get(id).await?;
                return Err(StoreError::SlotTaken {
                    doctor_id: current.doctor_id,
                    slot: current.slot,
                });
            }
            Err(e) => return Err(Self::map_error(e)),
        };

        match Self::parse_rows(rows)?.into_iter().next() {
            Some(updated) => Ok(updated),
            None => {
                let current = self.get(id).await?;
                Err(StoreError::StatusChanged {
                    id,
                    expected,
                    actual: current.status,
                })
            }
        }
    }
}
