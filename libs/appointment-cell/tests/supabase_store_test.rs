use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{Appointment, AppointmentFilter, AppointmentStatus, Gender};
use appointment_cell::services::{AppointmentStore, StoreError, SupabaseAppointmentStore};
use shared_database::supabase::SupabaseClient;

const KEY: &str = "anon-test-key";

fn store(server: &MockServer) -> SupabaseAppointmentStore {
    let client = Arc::new(SupabaseClient::with_base_url(&server.uri(), KEY));
    SupabaseAppointmentStore::new(client, KEY)
}

fn appointment(status: AppointmentStatus) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        doctor_id: "doc1".to_string(),
        patient_name: "Sana Shaikh".to_string(),
        patient_id: Some("patient-7".to_string()),
        slot: "Tomorrow, 09:00 AM".to_string(),
        notes: None,
        gender: Gender::Female,
        age: 27,
        status,
        created_at: Utc::now(),
    }
}

fn row(appointment: &Appointment) -> Value {
    serde_json::to_value(appointment).unwrap()
}

#[tokio::test]
async fn insert_returns_created_row() {
    let server = MockServer::start().await;
    let appt = appointment(AppointmentStatus::Upcoming);

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("apikey", KEY))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!({ "doctor_id": "doc1", "status": "upcoming" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row(&appt)])))
        .expect(1)
        .mount(&server)
        .await;

    let created = store(&server).create_if_absent(appt.clone()).await.unwrap();
    assert_eq!(created, appt);
}

#[tokio::test]
async fn unique_index_violation_means_slot_taken() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"appointments_active_slot\""
        })))
        .mount(&server)
        .await;

    let result = store(&server)
        .create_if_absent(appointment(AppointmentStatus::Upcoming))
        .await;

    assert_matches!(
        result,
        Err(StoreError::SlotTaken { doctor_id, slot })
            if doctor_id == "doc1" && slot == "Tomorrow, 09:00 AM"
    );
}

#[tokio::test]
async fn server_errors_are_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let result = store(&server).list(&AppointmentFilter::default()).await;
    assert_matches!(result, Err(StoreError::Unavailable(_)));
}

#[tokio::test]
async fn list_sends_filters_as_postgrest_query() {
    let server = MockServer::start().await;
    let appt = appointment(AppointmentStatus::Upcoming);

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", "eq.doc1"))
        .and(query_param("status", "in.(upcoming,done,no_show)"))
        .and(query_param("order", "created_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(&appt)])))
        .expect(1)
        .mount(&server)
        .await;

    let listed = store(&server)
        .list(&AppointmentFilter::for_doctor("doc1").slot_holding())
        .await
        .unwrap();

    assert_eq!(listed, vec![appt]);
}

#[tokio::test]
async fn get_missing_row_is_not_found() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert_matches!(store(&server).get(id).await, Err(StoreError::NotFound(missing)) if missing == id);
}

#[tokio::test]
async fn status_update_is_conditional_on_current_status() {
    let server = MockServer::start().await;
    let appt = appointment(AppointmentStatus::Upcoming);
    let mut done = appt.clone();
    done.status = AppointmentStatus::Done;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appt.id)))
        .and(query_param("status", "eq.upcoming"))
        .and(body_partial_json(json!({ "status": "done" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(&done)])))
        .expect(1)
        .mount(&server)
        .await;

    let updated = store(&server)
        .update_status(appt.id, AppointmentStatus::Upcoming, AppointmentStatus::Done)
        .await
        .unwrap();
    assert_eq!(updated.status, AppointmentStatus::Done);
}

#[tokio::test]
async fn lost_status_race_reports_current_status() {
    let server = MockServer::start().await;
    let mut cancelled = appointment(AppointmentStatus::Cancelled);
    cancelled.notes = Some("patient cancelled".to_string());

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", cancelled.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(&cancelled)])))
        .mount(&server)
        .await;

    let result = store(&server)
        .update_status(cancelled.id, AppointmentStatus::Upcoming, AppointmentStatus::Done)
        .await;

    assert_matches!(
        result,
        Err(StoreError::StatusChanged { actual: AppointmentStatus::Cancelled, .. })
    );
}
