//! Typed wrappers over the car-ads REST backend, one async operation per
//! resource and verb. Calls are fire-once: no retries, no timeout, no
//! cancellation. Failures are `Transport` (no usable response), `Api`
//! (non-2xx status) or `Unauthorized` (gated call refused locally, no
//! request issued).

use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{
    Advertisement, AdvertisementUpdate, CarSummary, ErrorBody, LoginResponse,
    ManagedUser, MessageResponse, NewAdvertisement, RegisterResponse, Role,
    SearchFilters, Transaction, TransactionCreated, TransactionStatus,
};
use crate::session::{Session, SessionError, SessionStore, AUTH_MARKER};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("{0}")]
    Unauthorized(String),
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Result of a successful login: the server message plus the session that
/// was persisted (roles defaulted to `["User"]` when the response had none).
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub message: String,
    pub session: Session,
}

pub struct ApiClient<S: SessionStore> {
    base_url: String,
    http: reqwest::Client,
    store: S,
}

impl<S: SessionStore> ApiClient<S> {
    pub fn new(base_url: impl Into<String>, store: S) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        // Cookie store on: the backend's real auth is its session cookie
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(ApiClient {
            base_url,
            http,
            store,
        })
    }

    /// Current session as persisted (anonymous when nothing is stored)
    pub fn session(&self) -> Session {
        self.store.load()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Local gate for authenticated operations; no request leaves the client
    /// without a stored session.
    fn require_session(&self) -> Result<Session, ApiError> {
        let session = self.store.load();
        if session.authenticated {
            Ok(session)
        } else {
            Err(ApiError::Unauthorized(
                "You must be logged in to perform this action.".to_string(),
            ))
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", AUTH_MARKER)
    }

    /// Map a non-2xx response to an Api error, preferring the body's
    /// `description` over `message`.
    async fn expect_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: ErrorBody = response.json().await.unwrap_or_default();
        let message = body
            .description
            .or(body.message)
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        warn!(status = status.as_u16(), %message, "api error response");
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }

    // --- Accounts ---

    pub async fn register(
        &self,
        mobile: &str,
        password: &str,
    ) -> Result<RegisterResponse, ApiError> {
        debug!(mobile, "POST /api/register");
        let res = self
            .http
            .post(self.url("/api/register"))
            .json(&json!({ "mobile_number": mobile, "password": password }))
            .send()
            .await?;
        Ok(Self::expect_success(res).await?.json().await?)
    }

    /// Login lives at /login_api, not under /api. On success the session is
    /// persisted with the reported roles; an absent or empty roles list
    /// defaults to `["User"]`.
    pub async fn login(
        &self,
        mobile: &str,
        password: &str,
    ) -> Result<LoginOutcome, ApiError> {
        debug!(mobile, "POST /login_api");
        let res = self
            .http
            .post(self.url("/login_api"))
            .json(&json!({ "mobile_number": mobile, "password": password }))
            .send()
            .await?;
        let body: LoginResponse = Self::expect_success(res).await?.json().await?;

        let roles: Vec<Role> = match body.roles {
            Some(names) if !names.is_empty() => {
                names.into_iter().map(Role::from).collect()
            }
            _ => vec![Role::User],
        };
        let session = Session::logged_in(mobile, roles);
        self.store.save(&session)?;
        Ok(LoginOutcome {
            message: body.message,
            session,
        })
    }

    /// Clears the stored session only when the server acknowledged the logout
    pub async fn logout(&self) -> Result<String, ApiError> {
        self.require_session()?;
        let res = self
            .http
            .post(self.url("/logout"))
            .header("Authorization", self.bearer())
            .send()
            .await?;
        let body: MessageResponse = Self::expect_success(res).await?.json().await?;
        self.store.clear()?;
        Ok(body.message)
    }

    // --- Advertisements ---

    pub async fn list_advertisements(&self) -> Result<Vec<Advertisement>, ApiError> {
        let res = self.http.get(self.url("/api/advertisements")).send().await?;
        Ok(Self::expect_success(res).await?.json().await?)
    }

    pub async fn get_advertisement(&self, id: i64) -> Result<Advertisement, ApiError> {
        let res = self
            .http
            .get(self.url(&format!("/api/advertisements/{}", id)))
            .send()
            .await?;
        Ok(Self::expect_success(res).await?.json().await?)
    }

    pub async fn create_advertisement(
        &self,
        ad: &NewAdvertisement,
    ) -> Result<Advertisement, ApiError> {
        self.require_session()?;
        let res = self
            .http
            .post(self.url("/api/advertisements"))
            .header("Authorization", self.bearer())
            .json(ad)
            .send()
            .await?;
        Ok(Self::expect_success(res).await?.json().await?)
    }

    pub async fn update_advertisement(
        &self,
        id: i64,
        update: &AdvertisementUpdate,
    ) -> Result<Advertisement, ApiError> {
        self.require_session()?;
        let res = self
            .http
            .put(self.url(&format!("/api/advertisements/{}", id)))
            .header("Authorization", self.bearer())
            .json(update)
            .send()
            .await?;
        Ok(Self::expect_success(res).await?.json().await?)
    }

    /// Delete returns 204 on success; no body to parse
    pub async fn delete_advertisement(&self, id: i64) -> Result<(), ApiError> {
        self.require_session()?;
        let res = self
            .http
            .delete(self.url(&format!("/api/advertisements/{}", id)))
            .header("Authorization", self.bearer())
            .send()
            .await?;
        Self::expect_success(res).await?;
        Ok(())
    }

    // --- Cars & search ---

    pub async fn list_cars(&self) -> Result<Vec<CarSummary>, ApiError> {
        let res = self.http.get(self.url("/api/cars")).send().await?;
        Ok(Self::expect_success(res).await?.json().await?)
    }

    pub async fn search_cars(
        &self,
        filters: &SearchFilters,
    ) -> Result<Vec<CarSummary>, ApiError> {
        let res = self
            .http
            .get(self.url("/api/search/cars"))
            .query(&filters.to_query())
            .send()
            .await?;
        Ok(Self::expect_success(res).await?.json().await?)
    }

    pub async fn related_cars(&self, car_id: i64) -> Result<Vec<CarSummary>, ApiError> {
        let res = self
            .http
            .get(self.url(&format!("/api/cars/{}/related", car_id)))
            .send()
            .await?;
        Ok(Self::expect_success(res).await?.json().await?)
    }

    // --- Users (admin tier) ---

    pub async fn list_users(&self) -> Result<Vec<ManagedUser>, ApiError> {
        self.require_session()?;
        let res = self
            .http
            .get(self.url("/api/users"))
            .header("Authorization", self.bearer())
            .send()
            .await?;
        Ok(Self::expect_success(res).await?.json().await?)
    }

    pub async fn deactivate_user(&self, user_id: i64) -> Result<String, ApiError> {
        self.require_session()?;
        let res = self
            .http
            .put(self.url(&format!("/api/users/{}/deactivate", user_id)))
            .header("Authorization", self.bearer())
            .send()
            .await?;
        let body: MessageResponse = Self::expect_success(res).await?.json().await?;
        Ok(body.message)
    }

    // --- Transactions ---

    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        self.require_session()?;
        let res = self
            .http
            .get(self.url("/api/transactions"))
            .header("Authorization", self.bearer())
            .send()
            .await?;
        Ok(Self::expect_success(res).await?.json().await?)
    }

    pub async fn create_transaction(
        &self,
        car_id: i64,
        agreed_price: f64,
    ) -> Result<TransactionCreated, ApiError> {
        self.require_session()?;
        let res = self
            .http
            .post(self.url("/api/transactions"))
            .header("Authorization", self.bearer())
            .json(&json!({ "car_id": car_id, "agreed_price": agreed_price }))
            .send()
            .await?;
        Ok(Self::expect_success(res).await?.json().await?)
    }

    /// Proposes a status transition. `pending` is the initial state and can
    /// never be proposed, so it is refused before any request goes out.
    pub async fn update_transaction_status(
        &self,
        id: i64,
        new_status: TransactionStatus,
    ) -> Result<String, ApiError> {
        if new_status == TransactionStatus::Pending {
            return Err(ApiError::Invalid(
                "Status must be 'accepted', 'rejected', or 'completed'.".to_string(),
            ));
        }
        self.require_session()?;
        let res = self
            .http
            .put(self.url(&format!("/api/transactions/{}/status", id)))
            .header("Authorization", self.bearer())
            .json(&json!({ "status": new_status.to_string() }))
            .send()
            .await?;
        let body: MessageResponse = Self::expect_success(res).await?.json().await?;
        Ok(body.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{delete, get, post, put};
    use axum::{Json, Router};
    use std::collections::HashMap;

    /// Run a throwaway backend on an OS-assigned port, return its base URL
    async fn spawn_backend(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });
        format!("http://{}", addr)
    }

    fn logged_in_store(mobile: &str, roles: Vec<Role>) -> MemorySessionStore {
        let store = MemorySessionStore::new();
        store
            .save(&Session::logged_in(mobile, roles))
            .expect("seed session");
        store
    }

    #[tokio::test]
    async fn test_login_defaults_roles_to_user() {
        // One backend version sends no roles field at all
        let app = Router::new().route(
            "/login_api",
            post(|| async { Json(serde_json::json!({ "message": "Login successful" })) }),
        );
        let url = spawn_backend(app).await;

        let client = ApiClient::new(url, MemorySessionStore::new()).expect("client");
        let outcome = client.login("5551234", "pw").await.expect("login");
        assert_eq!(outcome.message, "Login successful");
        assert_eq!(outcome.session.roles, vec![Role::User]);
        // The fallback is what gets persisted, too
        assert_eq!(client.session().roles, vec![Role::User]);
        assert_eq!(client.session().user_mobile.as_deref(), Some("5551234"));
    }

    #[tokio::test]
    async fn test_login_empty_roles_default_to_user() {
        let app = Router::new().route(
            "/login_api",
            post(|| async {
                Json(serde_json::json!({ "message": "Login successful", "roles": [] }))
            }),
        );
        let url = spawn_backend(app).await;

        let client = ApiClient::new(url, MemorySessionStore::new()).expect("client");
        let outcome = client.login("5551234", "pw").await.expect("login");
        assert_eq!(outcome.session.roles, vec![Role::User]);
    }

    #[tokio::test]
    async fn test_login_stores_reported_roles() {
        let app = Router::new().route(
            "/login_api",
            post(|| async {
                Json(serde_json::json!({
                    "message": "Login successful",
                    "roles": ["Seller", "Admin"]
                }))
            }),
        );
        let url = spawn_backend(app).await;

        let client = ApiClient::new(url, MemorySessionStore::new()).expect("client");
        let outcome = client.login("5551234", "pw").await.expect("login");
        assert_eq!(outcome.session.roles, vec![Role::Seller, Role::Admin]);
        assert!(client.session().authenticated);
    }

    #[tokio::test]
    async fn test_error_message_prefers_description() {
        let app = Router::new().route(
            "/api/advertisements/:id",
            delete(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(serde_json::json!({
                        "description": "not owner",
                        "message": "You do not have permission."
                    })),
                )
            }),
        );
        let url = spawn_backend(app).await;

        let store = logged_in_store("5551234", vec![Role::User]);
        let client = ApiClient::new(url, store).expect("client");
        let err = client.delete_advertisement(9).await.expect_err("must fail");
        match err {
            ApiError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "not owner");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparseable_error_body_gets_generic_message() {
        let app = Router::new().route(
            "/api/advertisements",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let url = spawn_backend(app).await;

        let client = ApiClient::new(url, MemorySessionStore::new()).expect("client");
        let err = client.list_advertisements().await.expect_err("must fail");
        match err {
            ApiError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Request failed with status 500");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_distinct_kind() {
        // Grab a free port, then close the listener so nothing answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let client =
            ApiClient::new(format!("http://{}", addr), MemorySessionStore::new())
                .expect("client");
        let err = client.list_advertisements().await.expect_err("must fail");
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn test_gated_call_refused_locally_without_session() {
        // Unreachable base URL: if the gate works, no request is attempted
        let client = ApiClient::new("http://127.0.0.1:1", MemorySessionStore::new())
            .expect("client");
        let ad = NewAdvertisement {
            car: crate::models::NewCar {
                make: "Toyota".to_string(),
                model: "Corolla".to_string(),
                year: 2019,
                color: "white".to_string(),
                status: "used".to_string(),
            },
            title: "Family sedan".to_string(),
            description: "Low mileage".to_string(),
            price: 15500.0,
        };
        let err = client.create_advertisement(&ad).await.expect_err("gated");
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let err = client.list_transactions().await.expect_err("gated");
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_search_sends_only_set_filters() {
        let app = Router::new().route(
            "/api/search/cars",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("min_price").map(String::as_str), Some("1000"));
                assert_eq!(params.get("brand").map(String::as_str), Some("Toyota"));
                assert!(!params.contains_key("max_price"));
                assert!(!params.contains_key("color"));
                assert!(!params.contains_key("status"));
                Json(serde_json::json!([
                    {"id": 3, "make": "Toyota", "model": "Corolla", "year": 2019,
                     "color": "white", "status": "used"}
                ]))
            }),
        );
        let url = spawn_backend(app).await;

        let client = ApiClient::new(url, MemorySessionStore::new()).expect("client");
        let filters = SearchFilters {
            min_price: Some(1000.0),
            brand: Some("Toyota".to_string()),
            ..Default::default()
        };
        let cars = client.search_cars(&filters).await.expect("search");
        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0].make, "Toyota");
    }

    #[tokio::test]
    async fn test_authenticated_calls_carry_bearer_marker() {
        let app = Router::new().route(
            "/api/users",
            get(|headers: HeaderMap| async move {
                assert_eq!(
                    headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok()),
                    Some("Bearer true")
                );
                Json(serde_json::json!([
                    {"id": 1, "mobile_number": "5551234", "active": true,
                     "roles": ["User", "Seller"]}
                ]))
            }),
        );
        let url = spawn_backend(app).await;

        let store = logged_in_store("5550000", vec![Role::Admin]);
        let client = ApiClient::new(url, store).expect("client");
        let users = client.list_users().await.expect("list users");
        assert_eq!(users[0].roles, vec![Role::User, Role::Seller]);
    }

    #[tokio::test]
    async fn test_pending_status_refused_locally() {
        let client = ApiClient::new(
            "http://127.0.0.1:1",
            logged_in_store("5551234", vec![Role::Seller]),
        )
        .expect("client");
        let err = client
            .update_transaction_status(4, TransactionStatus::Pending)
            .await
            .expect_err("pending must be refused");
        assert!(matches!(err, ApiError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_transaction_status_update_round_trip() {
        let app = Router::new().route(
            "/api/transactions/:id/status",
            put(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["status"], "accepted");
                Json(serde_json::json!({
                    "message": "Transaction 4 status updated to accepted"
                }))
            }),
        );
        let url = spawn_backend(app).await;

        let store = logged_in_store("5551234", vec![Role::Seller]);
        let client = ApiClient::new(url, store).expect("client");
        let message = client
            .update_transaction_status(4, TransactionStatus::Accepted)
            .await
            .expect("update");
        assert_eq!(message, "Transaction 4 status updated to accepted");
    }

    #[tokio::test]
    async fn test_logout_clears_session_on_success_only() {
        let app = Router::new().route(
            "/logout",
            post(|| async { Json(serde_json::json!({ "message": "Logged out" })) }),
        );
        let url = spawn_backend(app).await;

        let store = logged_in_store("5551234", vec![Role::User]);
        let client = ApiClient::new(url, store).expect("client");
        assert!(client.session().authenticated);
        let message = client.logout().await.expect("logout");
        assert_eq!(message, "Logged out");
        assert!(!client.session().authenticated);

        // A failed logout leaves the session in place
        let failing = Router::new().route(
            "/logout",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "message": "Logout failed." })),
                )
            }),
        );
        let url = spawn_backend(failing).await;
        let store = logged_in_store("5551234", vec![Role::User]);
        let client = ApiClient::new(url, store).expect("client");
        let err = client.logout().await.expect_err("logout fails");
        assert!(matches!(err, ApiError::Api { status: 500, .. }));
        assert!(client.session().authenticated);
    }
}
