//! Car-ads marketplace client
//!
//! Client-side logic for a car-classifieds REST backend: session persistence,
//! role-based UI policy, panel state machine, typed resource client (reqwest),
//! and a pure renderer producing view fragments.
//!
//! The binaries wire these together:
//!   cargo run --bin car-ads -- ads        # browse listings
//!   cargo run --bin seed_data             # populate a dev backend

pub mod models;
pub mod session;
// Role policy: pure session -> permitted panels/actions
pub mod policy;
// View controller: one active section at a time, transient notices
pub mod view;
pub mod client;
pub mod render;
