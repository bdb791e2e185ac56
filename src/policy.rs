//! Role policy: pure functions from session state to permitted UI surface.
//!
//! Nothing here performs I/O or consults hidden state; panel visibility and
//! per-record actions are functions of the session and the record alone.

use std::collections::BTreeSet;

use crate::models::{Advertisement, ManagedUser, Role, Transaction, TransactionStatus};
use crate::session::Session;

/// Top-level panels the UI can offer. The advertisement listing itself is
/// always reachable and is not gated through this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Panel {
    Register,
    Login,
    CreateAd,
    AdvancedSearch,
    UserManagement,
    AllTransactions,
}

/// Per-record action affordances attached to rendered rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Delete,
    BuyNow,
    Accept,
    Reject,
    MarkCompleted,
    Deactivate,
}

/// Admin-tier roles unlock user management and see every record's controls
fn admin_tier(session: &Session) -> bool {
    session.has_role(&Role::Admin) || session.has_role(&Role::Senior)
}

/// Both sides present and equal; two absent mobiles never match
fn same_mobile(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

/// Panels visible for the given session. Search is open to everyone;
/// register/login disappear once authenticated; user management is admin
/// tier only; transactions require a marketplace role.
pub fn visible_panels(session: &Session) -> BTreeSet<Panel> {
    let mut panels = BTreeSet::new();
    panels.insert(Panel::AdvancedSearch);

    if !session.authenticated {
        panels.insert(Panel::Register);
        panels.insert(Panel::Login);
        return panels;
    }

    panels.insert(Panel::CreateAd);
    if admin_tier(session) {
        panels.insert(Panel::UserManagement);
        panels.insert(Panel::AllTransactions);
    } else if session.has_role(&Role::Seller) || session.has_role(&Role::User) {
        panels.insert(Panel::AllTransactions);
    }
    panels
}

/// Controls for one advertisement row.
/// Edit/Delete for admin tier or the publisher; Buy Now for a User who is
/// not the publisher.
pub fn advertisement_actions(session: &Session, ad: &Advertisement) -> Vec<Action> {
    let mut actions = Vec::new();
    let owner = same_mobile(&session.user_mobile, &ad.publisher_mobile);

    if admin_tier(session) || owner {
        actions.push(Action::Edit);
        actions.push(Action::Delete);
    }
    if session.has_role(&Role::User) && !owner {
        actions.push(Action::BuyNow);
    }
    actions
}

/// Controls for one transaction row.
/// The seller (or admin tier) may accept/reject while pending, and mark an
/// accepted or rejected transaction completed.
pub fn transaction_actions(session: &Session, tx: &Transaction) -> Vec<Action> {
    let actor =
        admin_tier(session) || same_mobile(&session.user_mobile, &tx.seller_mobile);
    if !actor {
        return Vec::new();
    }
    match tx.status {
        TransactionStatus::Pending => vec![Action::Accept, Action::Reject],
        TransactionStatus::Accepted | TransactionStatus::Rejected => {
            vec![Action::MarkCompleted]
        }
        TransactionStatus::Completed => Vec::new(),
    }
}

/// Controls for one user-management row. Deactivation is admin-tier only,
/// never offered for an already-inactive user or the viewer's own account
/// (the backend rejects self-deactivation anyway).
pub fn user_actions(session: &Session, user: &ManagedUser) -> Vec<Action> {
    let own_row = session.user_mobile.as_deref() == Some(user.mobile_number.as_str());
    if admin_tier(session) && user.active && !own_row {
        vec![Action::Deactivate]
    } else {
        Vec::new()
    }
}
