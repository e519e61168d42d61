use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::router::appointment_routes;
use appointment_cell::AppState;
use shared_utils::test_utils::{hours_from_now, unique_id, TestConfig, TestUser};
use shared_utils::time::{format_display_time, parse_display_time};

fn create_test_app() -> Router {
    appointment_routes(AppState::shared(TestConfig::default().to_arc()))
}

fn request(method: &str, uri: &str, body: Option<Value>, user: Option<&TestUser>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        for (name, value) in user.headers() {
            builder = builder.header(name, value);
        }
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn book(app: &Router, id: &str, patient: &TestUser, doctor: &TestUser, time: i64) -> (StatusCode, Value) {
    let body = json!({
        "id": id,
        "patient_id": patient.id,
        "doctor_id": doctor.id,
        "time": time
    });
    send(app, request("POST", "/", Some(body), None)).await
}

fn listed_ids(body: &Value, key: &str) -> Vec<String> {
    body[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_book_and_get_appointment() {
    let app = create_test_app();
    let patient = TestUser::patient();
    let doctor = TestUser::doctor();
    let id = unique_id("A");
    let time = hours_from_now(3);

    let (status, body) = book(&app, &id, &patient, &doctor, time).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["success"].as_bool().unwrap());
    assert_eq!(body["appointment"]["id"], id.as_str());
    assert_eq!(body["appointment"]["status"], "pending");
    assert_eq!(body["message"], "Appointment booked successfully");

    let (status, body) = send(&app, request("GET", &format!("/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patient_id"], patient.id.as_str());
    assert_eq!(body["doctor_id"], doctor.id.as_str());
    assert_eq!(body["time"], time);
    assert_eq!(body["local_time"], format_display_time(time, 7 * 3600));

    let (_, body) = send(&app, request("GET", &format!("/{}/exists", id), None, None)).await;
    assert_eq!(body["exists"], true);
}

#[tokio::test]
async fn test_book_with_display_time_and_confirmed_status() {
    let app = create_test_app();
    let patient = TestUser::patient();
    let doctor = TestUser::doctor();
    let offset = 7 * 3600;
    let display = format_display_time(hours_from_now(48), offset);
    let expected = parse_display_time(&display, offset).unwrap();

    let body = json!({
        "id": unique_id("A"),
        "patient_id": patient.id,
        "doctor_id": doctor.id,
        "time": display,
        "status": "confirmed"
    });
    let (status, body) = send(&app, request("POST", "/", Some(body), None)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["appointment"]["time"], expected);
    assert_eq!(body["appointment"]["status"], "confirmed");
}

#[tokio::test]
async fn test_book_validation_errors() {
    let app = create_test_app();
    let patient = TestUser::patient();
    let doctor = TestUser::doctor();

    let (status, _) = book(&app, &unique_id("A"), &patient, &doctor, hours_from_now(-1)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = book(&app, "bad-id", &patient, &doctor, hours_from_now(2)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("appointment id"));

    let body = json!({
        "id": unique_id("A"),
        "patient_id": patient.id,
        "doctor_id": doctor.id,
        "time": "31-02-2030 10:00"
    });
    let (status, _) = send(&app, request("POST", "/", Some(body), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_book_rejects_ids_shadowed_by_routes() {
    let app = create_test_app();
    let patient = TestUser::patient();

    for reserved in ["search", "today", "stats", "reminders"] {
        let (status, body) =
            book(&app, reserved, &patient, &TestUser::doctor(), hours_from_now(2)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("reserved"));
    }

    // Case differs from the route segment, so it stays reachable.
    let (status, _) = book(&app, "Today", &patient, &TestUser::doctor(), hours_from_now(2)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(&app, request("GET", "/Today", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "Today");
}

#[tokio::test]
async fn test_book_conflicts() {
    let app = create_test_app();
    let doctor = TestUser::doctor();
    let id = unique_id("A");
    let time = hours_from_now(5);

    let (status, _) = book(&app, &id, &TestUser::patient(), &doctor, time).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = book(&app, &unique_id("A"), &TestUser::patient(), &doctor, time + 600).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("not available"));

    let (status, _) = book(&app, &id, &TestUser::patient(), &TestUser::doctor(), time).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = book(&app, &unique_id("A"), &TestUser::patient(), &doctor, time + 1_800).await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/conflicts/check?doctor_id={}&time={}", doctor.id, time + 900);
    let (status, body) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_conflict"], true);
    assert_eq!(body["conflicting_appointments"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_cancel_requires_matching_requester() {
    let app = create_test_app();
    let patient = TestUser::patient();
    let doctor = TestUser::doctor();
    let id = unique_id("A");
    book(&app, &id, &patient, &doctor, hours_from_now(6)).await;
    let uri = format!("/{}/cancel", id);

    let (status, _) = send(&app, request("POST", &uri, None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, request("POST", &uri, None, Some(&TestUser::patient()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, request("POST", &uri, None, Some(&patient))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["success"].as_bool().unwrap());

    let (status, _) = send(&app, request("GET", &format!("/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = send(&app, request("GET", &format!("/{}/exists", id), None, None)).await;
    assert_eq!(body["exists"], false);

    let (status, _) = send(&app, request("POST", &uri, None, Some(&patient))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_confirm_and_reject_flow() {
    let app = create_test_app();
    let patient = TestUser::patient();
    let doctor = TestUser::doctor();
    let id = unique_id("A");
    book(&app, &id, &patient, &doctor, hours_from_now(8)).await;
    let uri = format!("/{}/confirm", id);

    let (status, _) = send(&app, request("POST", &uri, Some(json!({"accept": true})), Some(&patient))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let other_doctor = TestUser::doctor();
    let (status, _) = send(&app, request("POST", &uri, Some(json!({"accept": true})), Some(&other_doctor))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, request("POST", &uri, Some(json!({"accept": true})), Some(&doctor))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");

    let (status, body) = send(&app, request("POST", &uri, Some(json!({"accept": false})), Some(&doctor))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");

    let (status, _) = send(&app, request("POST", &uri, Some(json!({"accept": true})), Some(&doctor))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, request("GET", &format!("/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reschedule_moves_to_new_doctor() {
    let app = create_test_app();
    let patient = TestUser::patient();
    let old_doctor = TestUser::doctor();
    let new_doctor = TestUser::doctor();
    let id = unique_id("A");
    book(&app, &id, &patient, &old_doctor, hours_from_now(10)).await;

    let new_time = hours_from_now(12);
    let body = json!({ "time": new_time, "doctor_id": new_doctor.id });
    let (status, body) = send(&app, request("PATCH", &format!("/{}/reschedule", id), Some(body), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["doctor_id"], new_doctor.id.as_str());
    assert_eq!(body["appointment"]["time"], new_time);

    let (_, body) = send(&app, request("GET", &format!("/doctors/{}", old_doctor.id), None, None)).await;
    assert!(listed_ids(&body, "appointments").is_empty());
    let (_, body) = send(&app, request("GET", &format!("/doctors/{}", new_doctor.id), None, None)).await;
    assert_eq!(listed_ids(&body, "appointments"), vec![id.clone()]);
    let (_, body) = send(&app, request("GET", &format!("/patients/{}", patient.id), None, None)).await;
    assert_eq!(listed_ids(&body, "appointments"), vec![id.clone()]);

    let body = json!({ "time": new_time, "doctor_id": new_doctor.id });
    let (status, _) = send(&app, request("PATCH", "/missing/reschedule", Some(body), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_by_time_range() {
    let app = create_test_app();
    let base = hours_from_now(20);
    let first = unique_id("A");
    let second = unique_id("A");
    book(&app, &second, &TestUser::patient(), &TestUser::doctor(), base + 3_600).await;
    book(&app, &first, &TestUser::patient(), &TestUser::doctor(), base).await;

    let uri = format!("/search?from={}&to={}", base, base + 3_600);
    let (status, body) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed_ids(&body, "appointments"), vec![first, second]);

    let uri = format!("/search?from={}&to={}", base + 1, base);
    let (status, _) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_today_window_covers_one_local_day() {
    let app = create_test_app();
    let (status, body) = send(&app, request("GET", "/today", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    let from = body["from"].as_i64().unwrap();
    let to = body["to"].as_i64().unwrap();
    assert_eq!(to - from, 86_399);
    // Local midnight at UTC+7 is 17:00 UTC.
    assert_eq!((from + 7 * 3600).rem_euclid(86_400), 0);
}

#[tokio::test]
async fn test_reminders() {
    let app = create_test_app();

    let (status, _) = send(&app, request("GET", "/reminders/next", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let soon = unique_id("A");
    let later = unique_id("A");
    book(&app, &later, &TestUser::patient(), &TestUser::doctor(), hours_from_now(30)).await;
    book(&app, &soon, &TestUser::patient(), &TestUser::doctor(), hours_from_now(2)).await;

    let (status, body) = send(&app, request("GET", "/reminders", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hours_ahead"], 24);
    assert_eq!(listed_ids(&body, "reminders"), vec![soon.clone()]);

    let (_, body) = send(&app, request("GET", "/reminders?hours_ahead=48", None, None)).await;
    assert_eq!(listed_ids(&body, "reminders"), vec![soon.clone(), later]);

    let (status, _) = send(&app, request("GET", "/reminders?hours_ahead=0", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, request("GET", "/reminders?hours_ahead=100000", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, request("GET", "/reminders/next", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], soon.as_str());
}

#[tokio::test]
async fn test_stats() {
    let app = create_test_app();
    let doctor = TestUser::doctor();
    let rejected = unique_id("A");
    book(&app, &unique_id("A"), &TestUser::patient(), &doctor, hours_from_now(3)).await;
    book(&app, &rejected, &TestUser::patient(), &doctor, hours_from_now(4)).await;
    send(
        &app,
        request("POST", &format!("/{}/confirm", rejected), Some(json!({"accept": false})), Some(&doctor)),
    )
    .await;

    let (status, body) = send(&app, request("GET", "/stats", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], 1);
    assert_eq!(body["pending"], 1);
    assert_eq!(body["confirmed"], 0);
    assert_eq!(body["rejected"], 1);
    assert_eq!(body["reminder_backlog"], 2);
}
