mod common;

use axum::http::StatusCode;
use common::{TestApp, user};
use serde_json::json;

#[tokio::test]
async fn invitation_lifecycle() {
    let app = TestApp::new().await;
    let owner = app.owner("owner@poolco.test", "PoolCo").await;

    let res = app
        .post(
            "/api/team/invitations",
            &owner,
            json!({ "email": " Tech@PoolCo.test ", "role": "admin" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let timing = res.headers["server-timing"].to_str().unwrap();
    assert!(timing.contains("mail;dur="), "{timing}");
    assert_eq!(res.data()["email"], "tech@poolco.test");
    assert_eq!(res.data()["status"], "pending");
    assert!(res.data().get("token_hash").is_none());

    let token = app.mailer.last_token_for("tech@poolco.test");
    let tech = user("tech@poolco.test");

    let res = app.get("/api/customers", &tech).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post("/api/invitations/accept", &tech, json!({ "token": token }))
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["role"], "admin");

    let res = app.get("/api/customers", &tech).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.get("/api/team", &owner).await;
    assert_eq!(res.data().as_array().unwrap().len(), 2);

    let res = app.get("/api/team/invitations", &owner).await;
    assert_eq!(res.data()[0]["status"], "accepted");

    let res = app
        .post("/api/invitations/accept", &tech, json!({ "token": token }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invitation_is_bound_to_its_email() {
    let app = TestApp::new().await;
    let owner = app.owner("owner@poolco.test", "PoolCo").await;
    app.post(
        "/api/team/invitations",
        &owner,
        json!({ "email": "tech@poolco.test" }),
    )
    .await;
    let token = app.mailer.last_token_for("tech@poolco.test");

    let stranger = user("stranger@elsewhere.test");
    let res = app
        .post("/api/invitations/accept", &stranger, json!({ "token": token }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.message(),
        "invitation was sent to a different email address"
    );

    let res = app
        .post(
            "/api/invitations/accept",
            &stranger,
            json!({ "token": "not-a-real-token" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn technicians_cannot_manage_the_team() {
    let app = TestApp::new().await;
    let owner = app.owner("owner@poolco.test", "PoolCo").await;
    app.post(
        "/api/team/invitations",
        &owner,
        json!({ "email": "tech@poolco.test" }),
    )
    .await;
    let tech = user("tech@poolco.test");
    let token = app.mailer.last_token_for("tech@poolco.test");
    let res = app
        .post("/api/invitations/accept", &tech, json!({ "token": token }))
        .await;
    assert_eq!(res.data()["role"], "technician");

    let res = app
        .post(
            "/api/team/invitations",
            &tech,
            json!({ "email": "friend@poolco.test" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = app.get("/api/team/invitations", &tech).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = app
        .patch("/api/company", &tech, json!({ "name": "Mine now" }))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = app.delete(&format!("/api/team/{}", owner.id), &tech).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn managing_members() {
    let app = TestApp::new().await;
    let owner = app.owner("owner@poolco.test", "PoolCo").await;
    app.post(
        "/api/team/invitations",
        &owner,
        json!({ "email": "tech@poolco.test" }),
    )
    .await;
    let tech = user("tech@poolco.test");
    let token = app.mailer.last_token_for("tech@poolco.test");
    app.post("/api/invitations/accept", &tech, json!({ "token": token }))
        .await;

    let member = format!("/api/team/{}", tech.id);
    let res = app.patch(&member, &owner, json!({ "role": "owner" })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = app.patch(&member, &owner, json!({ "role": "admin" })).await;
    assert_eq!(res.data()["role"], "admin");

    let res = app
        .patch(&format!("/api/team/{}", owner.id), &tech, json!({ "role": "technician" }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.delete(&member, &owner).await;
    assert_eq!(res.status, StatusCode::OK);
    let res = app.get("/api/profile", &tech).await;
    assert!(res.data()["company_id"].is_null());
    let res = app.get("/api/customers", &tech).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn revoked_invitations_cannot_be_accepted() {
    let app = TestApp::new().await;
    let owner = app.owner("owner@poolco.test", "PoolCo").await;
    let id = app
        .post(
            "/api/team/invitations",
            &owner,
            json!({ "email": "tech@poolco.test" }),
        )
        .await
        .id();
    let token = app.mailer.last_token_for("tech@poolco.test");

    let res = app
        .delete(&format!("/api/team/invitations/{id}"), &owner)
        .await;
    assert_eq!(res.data()["status"], "revoked");
    let res = app
        .delete(&format!("/api/team/invitations/{id}"), &owner)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let tech = user("tech@poolco.test");
    let res = app
        .post("/api/invitations/accept", &tech, json!({ "token": token }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invitation_creation_is_rate_limited() {
    let app = TestApp::new().await;
    let owner = app.owner("owner@poolco.test", "PoolCo").await;

    for n in 0..20 {
        let res = app
            .post(
                "/api/team/invitations",
                &owner,
                json!({ "email": format!("tech{n}@poolco.test") }),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "invite {n}: {}", res.body);
    }
    let res = app
        .post(
            "/api/team/invitations",
            &owner,
            json!({ "email": "one-too-many@poolco.test" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
}
