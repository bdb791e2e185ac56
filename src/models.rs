use serde::{Deserialize, Serialize};
use std::fmt;

/// Role names as the backend knows them. The role table also contains names
/// this client has no policy rules for (System, Moderator); those are kept as
/// `Other` so a stored session round-trips without losing them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Senior,
    Seller,
    User,
    Other(String),
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Admin" => Role::Admin,
            "Senior" => Role::Senior,
            "Seller" => Role::Seller,
            "User" => Role::User,
            _ => Role::Other(name),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::Senior => write!(f, "Senior"),
            Role::Seller => write!(f, "Seller"),
            Role::User => write!(f, "User"),
            Role::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Car summary embedded in advertisements and returned by the search routes
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CarSummary {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    #[serde(default)]
    pub status: Option<String>,  // 'used' / 'new'; older rows may omit it
}

/// Advertisement record as serialized by the backend.
/// Price arrives as a decimal string (Numeric column stringified); it is kept
/// verbatim and only parsed for display.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Advertisement {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: String,
    pub status: String,
    pub created_at: String,
    pub car_id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub car_details: Option<CarSummary>,
    #[serde(default)]
    pub publisher_mobile: Option<String>,
}

/// Transaction lifecycle states. Transitions are server-authoritative; the
/// client only proposes one via `update_transaction_status`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Accepted => write!(f, "accepted"),
            TransactionStatus::Rejected => write!(f, "rejected"),
            TransactionStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub car_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub status: TransactionStatus,
    pub agreed_price: String,
    pub transaction_date: String,
    #[serde(default)]
    pub car_make: Option<String>,
    #[serde(default)]
    pub buyer_mobile: Option<String>,
    #[serde(default)]
    pub seller_mobile: Option<String>,
}

/// User row from the admin-only /api/users listing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ManagedUser {
    pub id: i64,
    pub mobile_number: String,
    pub active: bool,
    pub roles: Vec<Role>,
}

// --- Request payloads ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewCar {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub status: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewAdvertisement {
    pub car: NewCar,
    pub title: String,
    pub description: String,
    pub price: f64,
}

/// Partial update for PUT /api/advertisements/{id}; absent fields are left
/// unchanged by the backend.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AdvertisementUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Filters for GET /api/search/cars; every field optional, omitted fields are
/// not sent at all.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub status: Option<String>,
}

impl SearchFilters {
    /// Query pairs in route order, skipping unset filters
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(min) = self.min_price {
            pairs.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price", max.to_string()));
        }
        if let Some(brand) = &self.brand {
            pairs.push(("brand", brand.clone()));
        }
        if let Some(color) = &self.color {
            pairs.push(("color", color.clone()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        pairs
    }
}

// --- Response payloads ---

#[derive(Deserialize, Debug, Clone)]
pub struct RegisterResponse {
    pub message: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Login response. `roles` is optional: one backend version never sends it,
/// so an absent or empty list defaults to `["User"]` at the call site.
#[derive(Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub message: String,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TransactionCreated {
    pub message: String,
    #[serde(default)]
    pub transaction_id: Option<i64>,
}

/// Error body shape: Flask aborts carry `description`, ad-hoc errors carry
/// `message`; either or both may be missing.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
