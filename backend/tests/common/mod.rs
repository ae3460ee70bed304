//! Common test utilities for integration tests
//!
//! The remote store and the analysis service are stood in for by wiremock
//! servers; the router itself runs in-process through `oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use healthwise_backend::{
    auth::Claims,
    config::{AnalysisConfig, AppConfig, PersistenceConfig},
    routes,
    state::AppState,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-32chars";
pub const TEST_API_KEY: &str = "test-api-key";

/// Response captured from the router
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub persistence: MockServer,
    pub analysis: MockServer,
    pub user_id: Uuid,
    pub token: String,
}

impl TestApp {
    /// Create a test application wired to fresh mock services
    pub async fn new() -> Self {
        let persistence = MockServer::start().await;
        let analysis = MockServer::start().await;

        let state = AppState::new(test_config(&persistence.uri(), &analysis.uri())).unwrap();
        let app = routes::create_router(state);

        let user_id = Uuid::new_v4();
        Self {
            app,
            persistence,
            analysis,
            user_id,
            token: token_for(user_id),
        }
    }

    /// Remote store answers profile and report reads of the test user
    pub async fn mount_user_data(&self, profile: Option<Value>, reports: Vec<Value>) {
        let profiles: Vec<Value> = profile.into_iter().collect();

        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("id", format!("eq.{}", self.user_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(profiles)))
            .mount(&self.persistence)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/reports"))
            .and(query_param("user_id", format!("eq.{}", self.user_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(reports)))
            .mount(&self.persistence)
            .await;
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        content_type: Option<&str>,
        body: Body,
    ) -> TestResponse {
        let mut request = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(content_type) = content_type {
            request = request.header("Content-Type", content_type);
        }

        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(body.to_vec()).unwrap(),
        }
    }

    /// Make an authenticated GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Method::GET, path, Some(&self.token), None, Body::empty())
            .await
    }

    /// Make an authenticated DELETE request
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.send(Method::DELETE, path, Some(&self.token), None, Body::empty())
            .await
    }

    /// Make an authenticated request with a JSON body
    pub async fn json(&self, method: Method, path: &str, body: &Value) -> TestResponse {
        self.send(
            method,
            path,
            Some(&self.token),
            Some("application/json"),
            Body::from(body.to_string()),
        )
        .await
    }

    /// Upload a file as multipart field `file`
    pub async fn upload(&self, file_name: &str, content_type: &str, bytes: &[u8]) -> TestResponse {
        let boundary = "healthwise-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        self.send(
            Method::POST,
            "/api/v1/reports",
            Some(&self.token),
            Some(&format!("multipart/form-data; boundary={}", boundary)),
            Body::from(body),
        )
        .await
    }
}

/// Session token as the auth provider would issue it
pub fn token_for(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        email: Some("patient@example.com".to_string()),
        aud: Some("authenticated".to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Report row as the remote store returns it
pub fn report_row(id: i64, user_id: Uuid, lab_name: &str) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "lab_name": lab_name,
        "report_date": "2024-01-15",
        "upload_date": "2024-01-16",
        "summary": "Routine panel",
        "abnormalities": ["LDL Cholesterol"],
        "results": [
            {
                "testName": "LDL Cholesterol",
                "value": 165,
                "unit": "mg/dL",
                "referenceRange": "< 130",
                "category": "Lipid Profile",
                "status": "High"
            },
            {
                "testName": "Hemoglobin",
                "value": "13.9",
                "unit": "g/dL",
                "referenceRange": "12.0 - 15.5",
                "category": "Complete Blood Count",
                "status": "Normal"
            }
        ],
        "clinical_interpretation": null,
        "dietary_recommendations": null,
        "created_at": "2024-01-16T09:30:00Z"
    })
}

fn test_config(persistence_url: &str, analysis_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.port = 0;
    config.persistence = PersistenceConfig {
        url: persistence_url.to_string(),
        api_key: TEST_API_KEY.to_string(),
        timeout_secs: 5,
    };
    config.analysis = AnalysisConfig {
        url: format!("{}/api", analysis_url),
        timeout_secs: 5,
    };
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config
}
