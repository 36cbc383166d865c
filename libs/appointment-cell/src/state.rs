use std::sync::Arc;

use shared_config::AppConfig;

use crate::services::booking::AppointmentBookingService;

/// Shared state for the appointment routes.
#[derive(Clone)]
pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub booking: Arc<AppointmentBookingService>,
}

impl AppointmentState {
    pub fn new(config: Arc<AppConfig>, booking: AppointmentBookingService) -> Self {
        Self {
            config,
            booking: Arc::new(booking),
        }
    }
}
