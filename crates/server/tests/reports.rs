mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn dashboard_counts_only_the_callers_company() {
    let app = TestApp::new().await;
    let owner = app.owner("owner@poolco.test", "PoolCo").await;
    let rival = app.owner("owner@spaco.test", "SpaCo").await;
    let (_, unit, service) = app.site(&owner).await;
    app.site(&rival).await;
    app.post("/api/customers", &owner, json!({ "name": "Jo Smith" }))
        .await;

    let equipment = app
        .post(
            "/api/equipment",
            &owner,
            json!({ "unit_id": unit, "name": "Main pump", "equipment_type": "pump" }),
        )
        .await
        .id();
    let today = chrono::Utc::now().date_naive().to_string();
    let failure = app
        .post(
            &format!("/api/equipment/{equipment}/failures"),
            &owner,
            json!({ "failed_on": today, "description": "Seal leaking" }),
        )
        .await;
    assert_eq!(failure.status, StatusCode::OK, "{}", failure.body);

    let res = app.get("/api/dashboard", &owner).await;
    assert_eq!(res.status, StatusCode::OK);
    let summary = res.data();
    assert_eq!(summary["properties"], 1);
    assert_eq!(summary["units"], 1);
    assert_eq!(summary["customers"], 1);
    assert_eq!(summary["services_today"], 1);
    assert_eq!(summary["completed_today"], 0);
    assert_eq!(summary["open_failures"], 1);

    app.post(&format!("/api/services/{service}/complete"), &owner, json!({}))
        .await;
    app.patch(
        &format!("/api/equipment-failures/{}", failure.id()),
        &owner,
        json!({ "resolved_on": today, "resolution": "Replaced seal" }),
    )
    .await;

    let res = app.get("/api/dashboard", &owner).await;
    assert_eq!(res.data()["completed_today"], 1);
    assert_eq!(res.data()["open_failures"], 0);

    let res = app.get("/api/dashboard", &rival).await;
    assert_eq!(res.data()["customers"], 0);
    assert_eq!(res.data()["open_failures"], 0);
}

#[tokio::test]
async fn equipment_failure_report() {
    let app = TestApp::new().await;
    let owner = app.owner("owner@poolco.test", "PoolCo").await;
    let (_, unit, _) = app.site(&owner).await;
    let equipment = app
        .post(
            "/api/equipment",
            &owner,
            json!({ "unit_id": unit, "name": "Chlorinator" }),
        )
        .await
        .id();
    for day in ["2025-01-10", "2025-02-14"] {
        app.post(
            &format!("/api/equipment/{equipment}/failures"),
            &owner,
            json!({ "failed_on": day, "description": "Cell fault" }),
        )
        .await;
    }

    let res = app.get("/api/reports/equipment-failures", &owner).await;
    let rows = res.data().as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["equipment_name"], "Chlorinator");
    assert_eq!(rows[0]["total_failures"], 2);
    assert_eq!(rows[0]["last_failure_on"], "2025-02-14");

    let res = app
        .get("/api/reports/equipment-failures?since=2025-02-01", &owner)
        .await;
    assert_eq!(res.data()[0]["total_failures"], 1);
}

#[tokio::test]
async fn service_report_range() {
    let app = TestApp::new().await;
    let owner = app.owner("owner@poolco.test", "PoolCo").await;
    let (_, _, service) = app.site(&owner).await;
    app.post(
        &format!("/api/services/{service}/chemicals"),
        &owner,
        json!({ "chemical": "Liquid chlorine", "quantity": 500.0, "unit_of_measure": "mL" }),
    )
    .await;
    app.post(&format!("/api/services/{service}/complete"), &owner, json!({}))
        .await;

    let today = chrono::Utc::now().date_naive();
    let res = app
        .get(
            &format!("/api/reports/services?from={today}&to={today}"),
            &owner,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["totals"]["total"], 1);
    assert_eq!(res.data()["totals"]["completed"], 1);
    assert_eq!(res.data()["chemicals"][0]["quantity"], 500.0);

    let res = app
        .get("/api/reports/services?from=2025-03-10&to=2025-03-01", &owner)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.get("/api/reports/services", &owner).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}
