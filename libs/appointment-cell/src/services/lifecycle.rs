// libs/appointment-cell/src/services/lifecycle.rs
use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

/// Status machine: `upcoming` moves to one of `done`, `no_show` or
/// `cancelled`, all of which are final.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Parse a requested target status. Only the terminal labels are
    /// accepted as targets.
    pub fn parse_target(&self, raw: &str) -> Result<AppointmentStatus, AppointmentError> {
        let status: AppointmentStatus = raw.parse()?;
        if !status.is_terminal() {
            return Err(AppointmentError::InvalidStatus(raw.trim().to_string()));
        }
        Ok(status)
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Upcoming => vec![
                AppointmentStatus::Done,
                AppointmentStatus::NoShow,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Done | AppointmentStatus::NoShow | AppointmentStatus::Cancelled => {
                vec![]
            }
        }
    }

    /// Validate a transition of `appointment` to `new_status` at `now`.
    pub fn validate_status_transition(
        &self,
        appointment: &Appointment,
        new_status: AppointmentStatus,
        now: NaiveDateTime,
    ) -> Result<(), AppointmentError> {
        let current_status = appointment.status;
        debug!(
            "Validating status transition from {} to {} for {}",
            current_status, new_status, appointment.id
        );

        if current_status.is_terminal() {
            warn!(
                "Transition out of terminal status attempted: {} -> {}",
                current_status, new_status
            );
            return Err(AppointmentError::TerminalStatus(current_status));
        }

        if !self.get_valid_transitions(&current_status).contains(&new_status) {
            return Err(AppointmentError::InvalidStatus(new_status.to_string()));
        }

        if new_status.requires_elapsed_slot() {
            let scheduled_at = appointment.scheduled_at(now);
            if scheduled_at > now {
                warn!(
                    "Appointment {} marked {} before its slot at {}",
                    appointment.id, new_status, scheduled_at
                );
                return Err(AppointmentError::TransitionNotYetEligible {
                    status: new_status,
                    scheduled_at,
                });
            }
        }

        info!("Status transition validated: {} -> {}", current_status, new_status);
        Ok(())
    }

    /// Statuses the doctor may apply right now: outcomes once the slot has
    /// passed, cancellation while it is still ahead.
    pub fn available_actions(&self, appointment: &Appointment, now: NaiveDateTime) -> Vec<AppointmentStatus> {
        self.get_valid_transitions(&appointment.status)
            .into_iter()
            .filter(|target| {
                let is_past = appointment.scheduled_at(now) <= now;
                if target.requires_elapsed_slot() {
                    is_past
                } else {
                    !is_past
                }
            })
            .collect()
    }
}
