//! Pure rendering: records plus session in, declarative view fragments out.
//!
//! A `Fragment` is the view model for one card/row: display lines plus the
//! policy-permitted actions. Nothing here touches I/O, so a refresh can be
//! a full discard-and-rebuild.

use chrono::NaiveDateTime;

use crate::models::{Advertisement, CarSummary, ManagedUser, Transaction};
use crate::policy::{self, Action};
use crate::session::Session;

/// One rendered record (or the empty-state placeholder, which has no id and
/// no actions)
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub id: Option<i64>,
    pub title: String,
    pub lines: Vec<String>,
    pub actions: Vec<Action>,
}

impl Fragment {
    fn empty_state(text: &str) -> Self {
        Fragment {
            id: None,
            title: text.to_string(),
            lines: Vec::new(),
            actions: Vec::new(),
        }
    }
}

/// Backend timestamps are naive ISO strings; show them in a shorter form and
/// fall back to the raw value when the shape is unexpected.
fn display_timestamp(raw: &str) -> String {
    raw.parse::<NaiveDateTime>()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub fn render_advertisements(ads: &[Advertisement], session: &Session) -> Vec<Fragment> {
    if ads.is_empty() {
        return vec![Fragment::empty_state("No advertisements found.")];
    }
    ads.iter()
        .map(|ad| {
            let mut lines = Vec::new();
            match &ad.car_details {
                Some(car) => {
                    lines.push(format!("Car: {} {}", car.make, car.model));
                    lines.push(format!("Year: {}", car.year));
                    lines.push(format!("Color: {}", car.color));
                }
                None => lines.push("Car: N/A".to_string()),
            }
            lines.push(format!("Status: {}", ad.status));
            lines.push(
                ad.description
                    .clone()
                    .unwrap_or_else(|| "No description provided.".to_string()),
            );
            lines.push(format!("Price: ${}", ad.price));
            lines.push(format!(
                "Published by: {}",
                ad.publisher_mobile.as_deref().unwrap_or("Unknown")
            ));
            lines.push(format!("Created: {}", display_timestamp(&ad.created_at)));

            Fragment {
                id: Some(ad.id),
                title: ad.title.clone(),
                lines,
                actions: policy::advertisement_actions(session, ad),
            }
        })
        .collect()
}

pub fn render_cars(cars: &[CarSummary], _session: &Session) -> Vec<Fragment> {
    if cars.is_empty() {
        return vec![Fragment::empty_state("No cars found.")];
    }
    cars.iter()
        .map(|car| Fragment {
            id: Some(car.id),
            title: format!("{} {}", car.make, car.model),
            lines: vec![
                format!("Year: {}", car.year),
                format!("Color: {}", car.color),
                format!("Status: {}", car.status.as_deref().unwrap_or("unknown")),
            ],
            actions: Vec::new(),
        })
        .collect()
}

pub fn render_transactions(txs: &[Transaction], session: &Session) -> Vec<Fragment> {
    if txs.is_empty() {
        return vec![Fragment::empty_state("No transactions found.")];
    }
    txs.iter()
        .map(|tx| {
            let car = match &tx.car_make {
                Some(make) => format!("car #{} ({})", tx.car_id, make),
                None => format!("car #{}", tx.car_id),
            };
            Fragment {
                id: Some(tx.id),
                title: format!("Transaction #{} - {}", tx.id, car),
                lines: vec![
                    format!("Status: {}", tx.status),
                    format!("Agreed price: ${}", tx.agreed_price),
                    format!(
                        "Buyer: {}",
                        tx.buyer_mobile.as_deref().unwrap_or("Unknown")
                    ),
                    format!(
                        "Seller: {}",
                        tx.seller_mobile.as_deref().unwrap_or("Unknown")
                    ),
                    format!("Date: {}", display_timestamp(&tx.transaction_date)),
                ],
                actions: policy::transaction_actions(session, tx),
            }
        })
        .collect()
}

pub fn render_users(users: &[ManagedUser], session: &Session) -> Vec<Fragment> {
    if users.is_empty() {
        return vec![Fragment::empty_state("No users found.")];
    }
    users.iter()
        .map(|user| {
            let roles = user
                .roles
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            Fragment {
                id: Some(user.id),
                title: format!("User #{} - {}", user.id, user.mobile_number),
                lines: vec![
                    format!("Active: {}", if user.active { "yes" } else { "no" }),
                    format!("Roles: {}", if roles.is_empty() { "none".to_string() } else { roles }),
                ],
                actions: policy::user_actions(session, user),
            }
        })
        .collect()
}
