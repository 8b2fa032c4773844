//! Test harness: application state over an in-memory SQLite database with
//! stubbed external collaborators.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use sourcing_api::clients::{IdentityProvider, Mailer, ObjectStore, VerifiedToken};
use sourcing_api::config::AppConfig;
use sourcing_api::db::{establish_connection_with_config, run_migrations, DbConfig};
use sourcing_api::entities::{supplier, user, SupplierType, UserRole};
use sourcing_api::errors::ServiceError;
use sourcing_api::events::{event_channel, process_events};
use sourcing_api::handlers::AppServices;
use sourcing_api::{api_routes, AppState};

pub const ADMIN_TOKEN: &str = "token-admin";
pub const USER_TOKEN: &str = "token-user";
pub const SUPPLIER_TOKEN: &str = "token-supplier";

/// Identity stub: a fixed token → uid table.
struct StubIdentity {
    tokens: HashMap<String, VerifiedToken>,
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, ServiceError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("invalid token".into()))
    }

    async fn create_account(
        &self,
        _email: &str,
        _password: &str,
        _display_name: &str,
    ) -> Result<Uuid, ServiceError> {
        Ok(Uuid::new_v4())
    }

    async fn update_account(
        &self,
        _uid: Uuid,
        _email: Option<&str>,
        _display_name: Option<&str>,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn delete_account(&self, _uid: Uuid) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Object store stub: every upload succeeds and yields a deterministic URL.
struct StubStorage;

#[async_trait]
impl ObjectStore for StubStorage {
    async fn upload(
        &self,
        path: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<String, ServiceError> {
        Ok(format!("https://files.test/{path}"))
    }
}

/// Mailer stub: sends vanish.
struct StubMailer;

#[async_trait]
impl Mailer for StubMailer {
    async fn send_html(
        &self,
        _to: &[String],
        _subject: &str,
        _html_body: &str,
    ) -> Result<(), ServiceError> {
        Ok(())
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "warn".to_string(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        identity_base_url: "http://identity.test".to_string(),
        identity_api_key: "test".to_string(),
        storage_base_url: "http://storage.test".to_string(),
        email_base_url: "http://email.test".to_string(),
        email_api_key: "test".to_string(),
        email_from_address: "sourcing@example.com".to_string(),
        email_from_name: "Sourcing Portal".to_string(),
        portal_url: "http://localhost:5173".to_string(),
        expiry_sweep_interval_secs: 3600,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_acquire_timeout_secs: 5,
        db_idle_timeout_secs: 60,
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    pub admin_uid: Uuid,
    pub user_uid: Uuid,
    pub supplier_uid: Uuid,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = test_config();

        // A single connection keeps the in-memory database alive and shared.
        let db_cfg = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..DbConfig::default()
        };
        let db = Arc::new(
            establish_connection_with_config(&db_cfg)
                .await
                .expect("test database"),
        );
        run_migrations(db.as_ref()).await.expect("migrations");

        let admin_uid = Uuid::new_v4();
        let user_uid = Uuid::new_v4();
        let supplier_uid = Uuid::new_v4();

        let mut tokens = HashMap::new();
        tokens.insert(
            ADMIN_TOKEN.to_string(),
            VerifiedToken {
                uid: admin_uid,
                name: "Asha Admin".to_string(),
                email: "asha@example.com".to_string(),
            },
        );
        tokens.insert(
            USER_TOKEN.to_string(),
            VerifiedToken {
                uid: user_uid,
                name: "Uma User".to_string(),
                email: "uma@example.com".to_string(),
            },
        );
        tokens.insert(
            SUPPLIER_TOKEN.to_string(),
            VerifiedToken {
                uid: supplier_uid,
                name: "Acme Metals".to_string(),
                email: "sales@acme.example.com".to_string(),
            },
        );

        let identity: Arc<dyn IdentityProvider> = Arc::new(StubIdentity { tokens });
        let storage: Arc<dyn ObjectStore> = Arc::new(StubStorage);
        let mailer: Arc<dyn Mailer> = Arc::new(StubMailer);

        let (event_sender, event_rx) = event_channel(64);
        tokio::spawn(process_events(event_rx));

        let services = AppServices::new(
            db.clone(),
            event_sender.clone(),
            identity.clone(),
            mailer,
            &cfg,
        );

        let state = AppState {
            db,
            config: cfg,
            event_sender,
            identity,
            storage,
            services,
        };

        let app = Self {
            router: api_routes().with_state(state.clone()),
            state,
            admin_uid,
            user_uid,
            supplier_uid,
        };
        app.seed_accounts().await;
        app
    }

    async fn seed_accounts(&self) {
        let now = Utc::now();
        user::ActiveModel {
            id: Set(self.admin_uid),
            email: Set("asha@example.com".to_string()),
            name: Set("Asha Admin".to_string()),
            role: Set(UserRole::Admin),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed admin");

        user::ActiveModel {
            id: Set(self.user_uid),
            email: Set("uma@example.com".to_string()),
            name: Set("Uma User".to_string()),
            role: Set(UserRole::User),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed user");

        supplier::ActiveModel {
            id: Set(self.supplier_uid),
            email: Set("sales@acme.example.com".to_string()),
            name: Set("Acme Metals".to_string()),
            vendor_id: Set("V-001".to_string()),
            phone: Set(None),
            country: Set(Some("IN".to_string())),
            location: Set(None),
            category: Set(Some("Machining".to_string())),
            sub_category: Set(None),
            supplier_type: Set(SupplierType::Regular),
            msme_status: Set("MSME".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed supplier");
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        self.router.clone().oneshot(request).await.expect("response")
    }
}

#[allow(dead_code)]
pub async fn response_json(response: Response<Body>) -> Value {
    use http_body_util::BodyExt;
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[allow(dead_code)]
pub async fn response_bytes(response: Response<Body>) -> Vec<u8> {
    use http_body_util::BodyExt;
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec()
}

#[allow(dead_code)]
pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}
