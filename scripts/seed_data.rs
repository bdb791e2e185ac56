//! Seed script for a development backend
//!
//! Populates the marketplace through its public API:
//! - registers demo accounts (a 409 means already seeded and is skipped)
//! - logs in as the demo seller and publishes sample advertisements
//! Run: cargo run --bin seed_data
//! The backend URL comes from CAR_ADS_API_URL or defaults to localhost:5000.

use car_ads_client::client::{ApiClient, ApiError};
use car_ads_client::models::{NewAdvertisement, NewCar};
use car_ads_client::session::{MemorySessionStore, SessionStore};

const DEFAULT_URL: &str = "http://127.0.0.1:5000";

const DEMO_USERS: &[(&str, &str)] = &[
    ("09120000001", "sellerpass"),
    ("09120000002", "buyerpass"),
];

fn sample_ads() -> Vec<NewAdvertisement> {
    let cars = [
        ("Toyota", "Corolla", 2019, "white", 15500.0),
        ("Toyota", "Camry", 2021, "black", 24300.0),
        ("Honda", "Civic", 2018, "blue", 13900.0),
        ("Peugeot", "206", 2015, "silver", 6200.0),
    ];
    cars.iter()
        .map(|(make, model, year, color, price)| NewAdvertisement {
            car: NewCar {
                make: make.to_string(),
                model: model.to_string(),
                year: *year,
                color: color.to_string(),
                status: "used".to_string(),
            },
            title: format!("{} {} ({})", make, model, year),
            description: format!("Well-kept {} {} in {}.", make, model, color),
            price: *price,
        })
        .collect()
}

/// Register demo users, log in as the seller, publish the sample ads.
/// Conflicts (409) mean a previous run already seeded that record; they are
/// reported and skipped so the run stays idempotent. Returns the number of
/// newly created advertisements.
async fn seed<S: SessionStore>(client: &ApiClient<S>) -> Result<usize, ApiError> {
    for (mobile, password) in DEMO_USERS {
        match client.register(mobile, password).await {
            Ok(res) => println!("✅ Registered {}: {}", mobile, res.message),
            Err(ApiError::Api { status: 409, .. }) => {
                println!("User {} already exists, skipping", mobile)
            }
            Err(e) => return Err(e),
        }
    }

    let (seller_mobile, seller_password) = DEMO_USERS[0];
    let outcome = client.login(seller_mobile, seller_password).await?;
    println!("✅ Logged in as {}: {}", seller_mobile, outcome.message);

    let mut created = 0;
    for ad in sample_ads() {
        match client.create_advertisement(&ad).await {
            Ok(record) => {
                created += 1;
                println!("✅ Created advertisement #{}: {}", record.id, record.title);
            }
            Err(ApiError::Api { status: 409, .. }) => {
                println!("Advertisement '{}' already exists, skipping", ad.title)
            }
            Err(e) => return Err(e),
        }
    }
    Ok(created)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let url = std::env::var("CAR_ADS_API_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    println!("Seeding backend at {}", url);

    // Memory store: seeding must not clobber the operator's own session file
    let client = ApiClient::new(url, MemorySessionStore::new())?;
    let created = seed(&client).await?;
    println!("✅ Seeding complete: {} new advertisements", created);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

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

    fn created_ad() -> serde_json::Value {
        json!({
            "id": 1,
            "title": "Toyota Corolla (2019)",
            "description": "Well-kept Toyota Corolla in white.",
            "price": "15500.00",
            "status": "active",
            "created_at": "2024-03-01T10:30:00",
            "car_id": 1,
            "user_id": 1,
            "publisher_mobile": "09120000001"
        })
    }

    #[tokio::test]
    async fn test_seed_skips_duplicate_users_and_continues() {
        // Every registration conflicts, as on a re-run against a seeded backend
        let app = Router::new()
            .route(
                "/api/register",
                post(|| async {
                    (
                        StatusCode::CONFLICT,
                        Json(json!({ "description": "Mobile number already registered." })),
                    )
                }),
            )
            .route(
                "/login_api",
                post(|| async {
                    Json(json!({ "message": "Login successful", "roles": ["Seller"] }))
                }),
            )
            .route(
                "/api/advertisements",
                post(|| async { (StatusCode::CREATED, Json(created_ad())) }),
            );
        let url = spawn_backend(app).await;

        let client = ApiClient::new(url, MemorySessionStore::new()).expect("client");
        let created = seed(&client).await.expect("seed must survive 409s");
        assert_eq!(created, sample_ads().len());
    }

    #[tokio::test]
    async fn test_seed_aborts_on_unexpected_error() {
        // Anything other than a conflict is a real failure and stops the run
        let app = Router::new().route(
            "/api/register",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "description": "Registration failed" })),
                )
            }),
        );
        let url = spawn_backend(app).await;

        let client = ApiClient::new(url, MemorySessionStore::new()).expect("client");
        let err = seed(&client).await.expect_err("must abort");
        assert!(matches!(err, ApiError::Api { status: 500, .. }));
    }
}
