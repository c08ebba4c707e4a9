//! In-process router tests: real handlers, real store, no network.

use super::*;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const TEST_SECRET: &str = "router-test-secret-router-test-secret";

struct TestApp {
    _dir: tempfile::TempDir,
    router: Router,
}

fn app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Arc::new(
        CoreConfig::new(dir.path().to_path_buf(), TEST_SECRET.into(), false).unwrap(),
    );
    TestApp {
        _dir: dir,
        router: router(AppState::new(cfg)),
    }
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response<axum::body::Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    router.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response<axum::body::Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Extracts `clinic_token=...` from the Set-Cookie header.
fn session_cookie_of(response: &Response<axum::body::Body>) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("no Set-Cookie header")
        .to_str()
        .unwrap();
    raw.split(';').next().unwrap().to_owned()
}

async fn seed(router: &Router) {
    let response = send(router, "POST", "/seed", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

async fn login(router: &Router, email: &str, password: &str) -> String {
    let response = send(
        router,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login failed for {email}");
    session_cookie_of(&response)
}

/// Resolves the demo doctor's id and the demo patient's id via staff views.
async fn demo_ids(router: &Router, staff_cookie: &str) -> (String, String) {
    let doctors = body_json(send(router, "GET", "/doctors", Some(staff_cookie), None).await).await;
    let doctor_id = doctors["doctors"][0]["id"].as_str().unwrap().to_owned();

    let patients =
        body_json(send(router, "GET", "/patients", Some(staff_cookie), None).await).await;
    let patient_id = patients["patients"][0]["id"].as_str().unwrap().to_owned();

    (doctor_id, patient_id)
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let response = send(&app.router, "GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn test_me_without_cookie_is_null_not_401() {
    let app = app();
    let response = send(&app.router, "GET", "/auth/me", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "user": null }));
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = app();
    for (method, uri) in [
        ("GET", "/patients"),
        ("GET", "/doctors"),
        ("GET", "/appointments"),
        ("GET", "/consultations"),
    ] {
        let response = send(&app.router, method, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        let body = body_json(response).await;
        assert_eq!(body["error"], json!("Unauthorized"));
    }

    // A garbage cookie is indistinguishable from none
    let response = send(
        &app.router,
        "GET",
        "/patients",
        Some("clinic_token=not-a-token"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_sets_cookie_and_me_resolves() {
    let app = app();
    seed(&app.router).await;

    let response = send(
        &app.router,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "admin@clinic.com", "password": "admin123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let raw_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(raw_cookie.contains("HttpOnly"));
    assert!(raw_cookie.contains("SameSite=Lax"));
    assert!(raw_cookie.contains("Path=/"));

    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], json!("admin@clinic.com"));
    assert_eq!(body["user"]["role"], json!("admin"));
    assert!(body["user"].get("passwordHash").is_none());

    let cookie = raw_cookie.split(';').next().unwrap().to_owned();
    let me = body_json(send(&app.router, "GET", "/auth/me", Some(&cookie), None).await).await;
    assert_eq!(me["user"]["email"], json!("admin@clinic.com"));
}

#[tokio::test]
async fn test_login_failure_is_uniform() {
    let app = app();
    seed(&app.router).await;

    for attempt in [
        json!({ "email": "admin@clinic.com", "password": "wrong" }),
        json!({ "email": "nobody@clinic.com", "password": "admin123" }),
    ] {
        let response = send(&app.router, "POST", "/auth/login", None, Some(attempt)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], json!("Invalid email or password"));
    }
}

#[tokio::test]
async fn test_register_creates_account_and_linked_profile() {
    let app = app();
    seed(&app.router).await;

    let response = send(
        &app.router,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "name": "Asha",
            "email": "asha@x.com",
            "password": "secret1",
            "mobile": "9990001111",
            "age": 30,
            "gender": "female"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie_of(&response);
    let body = body_json(response).await;
    assert_eq!(body["user"]["role"], json!("patient"));

    // The patient-role caller sees exactly their own profile, with the
    // next sequential code after the seeded PAT-001.
    let patients =
        body_json(send(&app.router, "GET", "/patients", Some(&cookie), None).await).await;
    let rows = patients["patients"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["patientId"], json!("PAT-002"));
    assert_eq!(rows[0]["name"], json!("Asha"));
    assert_eq!(rows[0]["address"], json!("Not provided"));

    // Same email again: conflict, no leak of which field
    let response = send(
        &app.router,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "name": "Asha Again",
            "email": "ASHA@x.com",
            "password": "other",
            "mobile": "9990002222",
            "age": 31,
            "gender": "female"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_booking_flow_and_double_booking() {
    let app = app();
    seed(&app.router).await;
    let staff = login(&app.router, "reception@clinic.com", "reception123").await;
    let (doctor_id, patient_id) = demo_ids(&app.router, &staff).await;

    let book = json!({
        "patientId": patient_id,
        "doctorId": doctor_id,
        "date": "2026-03-01",
        "timeSlot": "10:00 AM"
    });

    let response = send(&app.router, "POST", "/appointments", Some(&staff), Some(book.clone())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["appointment"]["appointmentId"], json!("APT-001"));
    assert_eq!(body["appointment"]["status"], json!("waiting"));

    // The slot is gone from the availability listing
    let slots = body_json(
        send(
            &app.router,
            "GET",
            &format!("/appointments/slots?doctorId={doctor_id}&date=2026-03-01"),
            Some(&staff),
            None,
        )
        .await,
    )
    .await;
    let free = slots["slots"].as_array().unwrap();
    assert_eq!(free.len(), 13);
    assert!(!free.contains(&json!("10:00 AM")));

    // Second booking of the same slot: conflict
    let response = send(&app.router, "POST", "/appointments", Some(&staff), Some(book)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // An unknown slot label is a validation failure, not a 500
    let response = send(
        &app.router,
        "POST",
        "/appointments",
        Some(&staff),
        Some(json!({
            "patientId": patient_id,
            "doctorId": doctor_id,
            "date": "2026-03-01",
            "timeSlot": "09:00 AM"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_confidential_fields_visible_only_to_assigned_doctor() {
    let app = app();
    seed(&app.router).await;

    let patient = login(&app.router, "patient@clinic.com", "patient123").await;
    let staff = login(&app.router, "reception@clinic.com", "reception123").await;
    let doctor = login(&app.router, "doctor@clinic.com", "doctor123").await;
    let (doctor_id, _) = demo_ids(&app.router, &staff).await;

    // Patient books for themselves, attaching a record and a note
    let response = send(
        &app.router,
        "POST",
        "/appointments",
        Some(&patient),
        Some(json!({
            "doctorId": doctor_id,
            "date": "2026-03-01",
            "timeSlot": "04:00 PM",
            "uploadedFiles": [{
                "name": "report.pdf",
                "size": 8,
                "type": "application/pdf",
                "dataUrl": "data:application/pdf;base64,JVBERi0xLjQ="
            }],
            "optionalRecordData": "Allergic to penicillin"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    // Even the creation response hides the confidential fields from a
    // non-doctor caller
    assert!(created["appointment"].get("uploadedFiles").is_none());
    assert!(created["appointment"].get("optionalRecordData").is_none());

    for cookie in [&patient, &staff] {
        let listing =
            body_json(send(&app.router, "GET", "/appointments", Some(cookie), None).await).await;
        let row = &listing["appointments"][0];
        assert!(row.get("uploadedFiles").is_none());
        assert!(row.get("optionalRecordData").is_none());
    }

    // The assigned doctor sees everything
    let listing =
        body_json(send(&app.router, "GET", "/appointments", Some(&doctor), None).await).await;
    let row = &listing["appointments"][0];
    assert_eq!(row["uploadedFiles"][0]["name"], json!("report.pdf"));
    assert_eq!(row["optionalRecordData"], json!("Allergic to penicillin"));
}

#[tokio::test]
async fn test_status_lifecycle_over_http() {
    let app = app();
    seed(&app.router).await;
    let staff = login(&app.router, "reception@clinic.com", "reception123").await;
    let patient = login(&app.router, "patient@clinic.com", "patient123").await;
    let (doctor_id, patient_id) = demo_ids(&app.router, &staff).await;

    let created = body_json(
        send(
            &app.router,
            "POST",
            "/appointments",
            Some(&staff),
            Some(json!({
                "patientId": patient_id,
                "doctorId": doctor_id,
                "date": "2026-03-01",
                "timeSlot": "10:00 AM"
            })),
        )
        .await,
    )
    .await;
    let id = created["appointment"]["id"].as_str().unwrap().to_owned();

    // Patients cannot drive the lifecycle
    let response = send(
        &app.router,
        "PATCH",
        &format!("/appointments/{id}/status"),
        Some(&patient),
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Skipping straight to completed is rejected
    let response = send(
        &app.router,
        "PATCH",
        &format!("/appointments/{id}/status"),
        Some(&staff),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // An unknown label is rejected
    let response = send(
        &app.router,
        "PATCH",
        &format!("/appointments/{id}/status"),
        Some(&staff),
        Some(json!({ "status": "done" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The legal step works
    let response = send(
        &app.router,
        "PATCH",
        &format!("/appointments/{id}/status"),
        Some(&staff),
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["appointment"]["status"], json!("confirmed"));
}

#[tokio::test]
async fn test_consultation_flow() {
    let app = app();
    seed(&app.router).await;
    let staff = login(&app.router, "reception@clinic.com", "reception123").await;
    let doctor = login(&app.router, "doctor@clinic.com", "doctor123").await;
    let (doctor_id, patient_id) = demo_ids(&app.router, &staff).await;

    let created = body_json(
        send(
            &app.router,
            "POST",
            "/appointments",
            Some(&staff),
            Some(json!({
                "patientId": patient_id,
                "doctorId": doctor_id,
                "date": "2026-03-01",
                "timeSlot": "11:00 AM"
            })),
        )
        .await,
    )
    .await;
    let appointment_id = created["appointment"]["id"].as_str().unwrap().to_owned();

    send(
        &app.router,
        "PATCH",
        &format!("/appointments/{appointment_id}/status"),
        Some(&staff),
        Some(json!({ "status": "confirmed" })),
    )
    .await;

    let consultation = json!({
        "appointmentId": appointment_id,
        "patientId": patient_id,
        "symptoms": "fever, cough",
        "diagnosis": "viral infection",
        "prescription": "rest and fluids",
        "followUpDate": "2026-03-08"
    });

    // Staff cannot record consultations
    let response = send(
        &app.router,
        "POST",
        "/consultations",
        Some(&staff),
        Some(consultation.clone()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The doctor can, and the appointment completes with it
    let response = send(
        &app.router,
        "POST",
        "/consultations",
        Some(&doctor),
        Some(consultation.clone()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let listing =
        body_json(send(&app.router, "GET", "/appointments", Some(&doctor), None).await).await;
    assert_eq!(listing["appointments"][0]["status"], json!("completed"));

    // A completed appointment takes no second consultation
    let response = send(
        &app.router,
        "POST",
        "/consultations",
        Some(&doctor),
        Some(consultation),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The record shows up in the doctor's listing
    let listing =
        body_json(send(&app.router, "GET", "/consultations", Some(&doctor), None).await).await;
    assert_eq!(listing["consultations"].as_array().unwrap().len(), 1);
    assert_eq!(listing["consultations"][0]["diagnosis"], json!("viral infection"));
}

#[tokio::test]
async fn test_patient_update_policy() {
    let app = app();
    seed(&app.router).await;
    let staff = login(&app.router, "reception@clinic.com", "reception123").await;
    let patient = login(&app.router, "patient@clinic.com", "patient123").await;
    let (_, demo_patient_id) = demo_ids(&app.router, &staff).await;

    // The demo patient edits their own profile
    let response = send(
        &app.router,
        "PATCH",
        "/patients",
        Some(&patient),
        Some(json!({ "id": demo_patient_id, "address": "4 Lake View" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["patient"]["address"], json!("4 Lake View"));

    // Staff register a second patient; the demo patient cannot edit it
    let other = body_json(
        send(
            &app.router,
            "POST",
            "/patients",
            Some(&staff),
            Some(json!({
                "name": "Bina Patel",
                "age": 41,
                "gender": "female",
                "mobile": "8880002222"
            })),
        )
        .await,
    )
    .await;
    let other_id = other["patient"]["id"].as_str().unwrap();

    let response = send(
        &app.router,
        "PATCH",
        "/patients",
        Some(&patient),
        Some(json!({ "id": other_id, "address": "hijacked" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_seed_is_idempotent_over_http() {
    let app = app();
    seed(&app.router).await;

    let response = send(&app.router, "POST", "/seed", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let results = body["results"].as_array().unwrap();
    assert!(results
        .iter()
        .all(|line| line.as_str().unwrap().starts_with("Skipped")));
}
