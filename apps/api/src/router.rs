use std::sync::Arc;

use anyhow::{bail, Context};
use axum::{routing::get, Router};
use tracing::{info, warn};

use appointment_cell::services::{
    AppointmentBookingService, AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore,
};
use appointment_cell::{appointment_routes, AppointmentState};
use doctor_cell::router::doctor_routes;
use doctor_cell::services::{DoctorDirectory, DoctorService, StaticDoctorDirectory};
use shared_config::{AppConfig, StoreBackend};
use shared_database::supabase::SupabaseClient;
use shared_models::clock::{Clock, SystemClock};

/// Everything the routers need, wired from configuration.
pub struct AppServices {
    pub config: Arc<AppConfig>,
    pub doctors: Arc<DoctorService>,
    pub appointments: AppointmentState,
}

impl AppServices {
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::with_clock(config, clock)
    }

    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        if config.supabase_jwt_secret.is_empty() {
            warn!("SUPABASE_JWT_SECRET is not set; authenticated routes will reject every token");
        }

        let directory: Arc<dyn DoctorDirectory> = match &config.doctor_directory_path {
            Some(path) => Arc::new(
                StaticDoctorDirectory::from_json_file(path)
                    .with_context(|| format!("loading doctor directory from {}", path.display()))?,
            ),
            None => {
                info!("DOCTOR_DIRECTORY_PATH not set, using the built-in roster");
                Arc::new(StaticDoctorDirectory::quickcare_roster())
            }
        };

        let store: Arc<dyn AppointmentStore> = match config.appointment_store {
            StoreBackend::Memory => {
                info!("Appointments are kept in memory");
                Arc::new(InMemoryAppointmentStore::new())
            }
            StoreBackend::Supabase => {
                if !config.is_supabase_configured() {
                    bail!("APPOINTMENT_STORE=supabase requires SUPABASE_URL and SUPABASE_ANON_PUBLIC_KEY");
                }
                info!("Appointments are stored in Supabase at {}", config.supabase_url);
                let client = Arc::new(SupabaseClient::new(&config));
                Arc::new(SupabaseAppointmentStore::new(client, &config.supabase_anon_key))
            }
        };

        let config = Arc::new(config);
        let booking = AppointmentBookingService::new(store, Arc::clone(&directory), clock);

        Ok(Self {
            doctors: Arc::new(DoctorService::new(directory)),
            appointments: AppointmentState::new(Arc::clone(&config), booking),
            config,
        })
    }
}

pub fn create_router(services: AppServices) -> Router {
    Router::new()
        .route("/", get(|| async { "QuickCare API is running!" }))
        .nest("/doctors", doctor_routes(services.doctors))
        .nest("/appointments", appointment_routes(services.appointments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use shared_models::clock::FixedClock;
    use shared_utils::test_utils::{local_time, JwtTestUtils, TestConfig, TestUser};
    use std::io::Write;
    use tower::ServiceExt;

    fn services() -> AppServices {
        let clock = Arc::new(FixedClock::at(local_time(2024, 3, 6, 10, 0)));
        AppServices::with_clock(TestConfig::default().to_app_config(), clock).unwrap()
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn liveness() {
        let response = create_router(services())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn doctors_and_slots_are_mounted() {
        let (status, body) = get_json(create_router(services()), "/doctors").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 4);

        let (status, body) =
            get_json(create_router(services()), "/appointments/doctors/doc1/available-slots").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["doctor_id"], "doc1");
    }

    #[tokio::test]
    async fn unknown_doctor_slots_are_404() {
        let (status, body) =
            get_json(create_router(services()), "/appointments/doctors/nobody/available-slots").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nobody"));
    }

    #[tokio::test]
    async fn unknown_gender_is_a_json_bad_request() {
        let config = TestConfig::default();
        let token =
            JwtTestUtils::create_test_token(&TestUser::patient("Meera Kulkarni"), &config.jwt_secret, Some(1));
        let body = serde_json::json!({
            "doctor_id": "doc1",
            "slot": "Tomorrow, 10:00 AM",
            "patient_name": "Meera Kulkarni",
            "gender": "Unknown",
            "age": 41,
        });

        let response = create_router(services())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/appointments")
                    .header("Authorization", format!("Bearer {}", token))
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().contains("gender"));
    }

    #[test]
    fn directory_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"x1","name":"Dr. X","specialization":"ENT","availableSlots":["Tomorrow, 09:00 AM"]}}]"#
        )
        .unwrap();

        let mut config = TestConfig::default().to_app_config();
        config.doctor_directory_path = Some(file.path().to_path_buf());

        let services = AppServices::with_clock(config, Arc::new(SystemClock)).unwrap();
        assert_eq!(services.doctors.get_doctor("x1").unwrap().specialization, "ENT");
    }

    #[test]
    fn supabase_backend_requires_credentials() {
        let mut config = AppConfig::local("secret");
        config.appointment_store = StoreBackend::Supabase;
        config.supabase_url = String::new();

        assert!(AppServices::with_clock(config, Arc::new(SystemClock)).is_err());
    }
}
