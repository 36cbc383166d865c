use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::services::doctor::DoctorService;

pub fn doctor_routes(doctors: Arc<DoctorService>) -> Router {
    // Browsing the directory needs no account
    Router::new()
        .route("/", get(handlers::search_doctors))
        .route("/specializations", get(handlers::list_specializations))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .with_state(doctors)
}
