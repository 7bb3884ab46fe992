#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use db::DBService;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use local_deployment::LocalDeployment;
use serde_json::{Value, json};
use server::routes;
use services::services::{
    auth::{AUDIENCE, Claims},
    config::Config,
    mailer::{Email, Mailer, MailerError},
};
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "integration-test-secret";

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Email>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

impl RecordingMailer {
    /// Token from the most recent invitation sent to `to`.
    pub fn last_token_for(&self, to: &str) -> String {
        let sent = self.sent.lock().unwrap();
        let email = sent.iter().rev().find(|e| e.to == to).expect("no email sent");
        email
            .text
            .split("token=")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .expect("no token in email")
            .to_string()
    }
}

pub struct User {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

pub fn user(email: &str) -> User {
    let id = Uuid::new_v4();
    User {
        id,
        email: email.to_string(),
        token: mint_token(id, email, 3600, SECRET),
    }
}

pub fn mint_token(id: Uuid, email: &str, expires_in: i64, secret: &str) -> String {
    let claims = Claims {
        sub: id.to_string(),
        email: Some(email.to_string()),
        exp: (chrono::Utc::now().timestamp() + expires_in) as usize,
        aud: AUDIENCE.to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    pub fn id(&self) -> String {
        self.data()["id"].as_str().expect("response has no id").to_string()
    }
}

pub struct TestApp {
    pub router: Router,
    pub deployment: LocalDeployment,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = Config::with_secret(SECRET).unwrap();
        let db = DBService::new_in_memory().await.unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let deployment = LocalDeployment::from_parts(config, db, mailer.clone());
        Self {
            router: routes::router(deployment.clone()),
            deployment,
            mailer,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, user: &User) -> TestResponse {
        self.request(Method::GET, uri, Some(&user.token), None).await
    }

    pub async fn post(&self, uri: &str, user: &User, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(&user.token), Some(body))
            .await
    }

    pub async fn patch(&self, uri: &str, user: &User, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(&user.token), Some(body))
            .await
    }

    pub async fn delete(&self, uri: &str, user: &User) -> TestResponse {
        self.request(Method::DELETE, uri, Some(&user.token), None).await
    }

    /// A user who owns a freshly created company.
    pub async fn owner(&self, email: &str, company: &str) -> User {
        let owner = user(email);
        let res = self
            .post("/api/companies", &owner, json!({ "name": company }))
            .await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
        owner
    }

    /// Property, pool unit and a service scheduled today. Returns their ids.
    pub async fn site(&self, owner: &User) -> (String, String, String) {
        let property = self
            .post("/api/properties", owner, json!({ "name": "Harbour View" }))
            .await
            .id();
        let unit = self
            .post(
                &format!("/api/properties/{property}/units"),
                owner,
                json!({ "name": "Main pool", "volume_litres": 50000.0 }),
            )
            .await
            .id();
        let today = chrono::Utc::now().date_naive().to_string();
        let service = self
            .post(
                "/api/services",
                owner,
                json!({ "unit_id": unit, "service_date": today }),
            )
            .await
            .id();
        (property, unit, service)
    }
}
