mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn other_tenants_rows_look_missing() {
    let app = TestApp::new().await;
    let alice = app.owner("alice@poolco.test", "PoolCo").await;
    let bob = app.owner("bob@spaco.test", "SpaCo").await;
    let (property, unit, service) = app.site(&alice).await;
    let template = app
        .post("/api/templates", &alice, json!({ "name": "Weekly clean" }))
        .await
        .id();
    let plant_room = app
        .post(
            &format!("/api/properties/{property}/plant-rooms"),
            &alice,
            json!({ "name": "Pump shed" }),
        )
        .await
        .id();
    let rule = app
        .post(
            &format!("/api/properties/{property}/scheduling-rules"),
            &alice,
            json!({ "unit_id": unit, "start_date": "2025-03-01" }),
        )
        .await
        .id();
    let job = app
        .post(
            "/api/jobs",
            &alice,
            json!({ "title": "Fix heater", "property_id": property }),
        )
        .await
        .id();
    let booking = app
        .post(
            "/api/bookings",
            &alice,
            json!({
                "property_id": property,
                "guest_name": "Guest",
                "check_in": "2025-04-01",
                "check_out": "2025-04-05"
            }),
        )
        .await
        .id();

    for uri in [
        format!("/api/properties/{property}"),
        format!("/api/units/{unit}"),
        format!("/api/services/{service}"),
        format!("/api/properties/{property}/units"),
        format!("/api/services/{service}/water-tests"),
        format!("/api/templates/{template}"),
        format!("/api/properties/{property}/plant-rooms"),
        format!("/api/plant-rooms/{plant_room}"),
        format!("/api/plant-rooms/{plant_room}/checks"),
        format!("/api/properties/{property}/scheduling-rules"),
        format!("/api/scheduling-rules/{rule}"),
        format!("/api/jobs/{job}"),
        format!("/api/bookings/{booking}"),
        format!("/api/properties/{property}/bookings"),
    ] {
        let res = app.get(&uri, &bob).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{uri}");
        let res = app.get(&uri, &alice).await;
        assert_eq!(res.status, StatusCode::OK, "{uri}");
    }

    let res = app
        .patch(
            &format!("/api/properties/{property}"),
            &bob,
            json!({ "name": "Hijacked" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = app.delete(&format!("/api/units/{unit}"), &bob).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.get("/api/properties", &bob).await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);
    let res = app.get("/api/services", &bob).await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);
    for list in ["/api/templates", "/api/jobs", "/api/bookings"] {
        let res = app.get(list, &bob).await;
        assert!(res.data().as_array().unwrap().is_empty(), "{list}");
    }

    let res = app
        .patch(
            &format!("/api/scheduling-rules/{rule}"),
            &bob,
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = app.delete(&format!("/api/jobs/{job}"), &bob).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = app
        .post(
            &format!("/api/plant-rooms/{plant_room}/checks"),
            &bob,
            json!({ "issues_found": false }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn foreign_body_references_are_validation_errors() {
    let app = TestApp::new().await;
    let alice = app.owner("alice@poolco.test", "PoolCo").await;
    let bob = app.owner("bob@spaco.test", "SpaCo").await;
    let (property, unit, _) = app.site(&alice).await;
    let customer = app
        .post("/api/customers", &alice, json!({ "name": "Jo Smith" }))
        .await
        .id();

    let res = app
        .post(
            "/api/services",
            &bob,
            json!({ "unit_id": unit, "service_date": "2025-03-10" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.message().contains("unit_id"));

    let res = app
        .post(
            "/api/properties",
            &bob,
            json!({ "name": "Bob's", "customer_id": customer }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/bookings",
            &bob,
            json!({
                "property_id": property,
                "guest_name": "Guest",
                "check_in": "2025-04-01",
                "check_out": "2025-04-05"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/equipment",
            &bob,
            json!({ "unit_id": unit, "name": "Pump" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/services",
            &alice,
            json!({ "unit_id": unit, "service_date": "2025-03-10", "technician_id": bob.id }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.message().contains("technician_id"));
}

#[tokio::test]
async fn customer_crud() {
    let app = TestApp::new().await;
    let owner = app.owner("owner@poolco.test", "PoolCo").await;

    let res = app
        .post(
            "/api/customers",
            &owner,
            json!({ "name": "  Jo Smith ", "email": "jo@example.test" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["name"], "Jo Smith");
    let id = res.id();

    let res = app
        .post("/api/customers", &owner, json!({ "name": "X", "email": "nope" }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .patch(
            &format!("/api/customers/{id}"),
            &owner,
            json!({ "phone": "0400" }),
        )
        .await;
    assert_eq!(res.data()["email"], "jo@example.test");
    assert_eq!(res.data()["phone"], "0400");

    let res = app.delete(&format!("/api/customers/{id}"), &owner).await;
    assert_eq!(res.status, StatusCode::OK);
    let res = app.get(&format!("/api/customers/{id}"), &owner).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
