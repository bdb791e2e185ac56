//! View controller: one active section at a time, plus transient notices.
//! Storing a single `Section` is the hide-all-then-show-one rule made
//! structural.

use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use crate::policy::{visible_panels, Panel};
use crate::session::Session;

/// Mutually exclusive UI sections. `Listing` is the home state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Listing,
    Register,
    Login,
    CreateAd,
    AdvancedSearch,
    SearchResults,
    RelatedCars,
    UserManagement,
    AllTransactions,
}

impl Section {
    /// Panel that must be visible before this section may open.
    /// Listing and the two result views are never gated.
    fn required_panel(self) -> Option<Panel> {
        match self {
            Section::Listing | Section::SearchResults | Section::RelatedCars => None,
            Section::Register => Some(Panel::Register),
            Section::Login => Some(Panel::Login),
            Section::CreateAd => Some(Panel::CreateAd),
            Section::AdvancedSearch => Some(Panel::AdvancedSearch),
            Section::UserManagement => Some(Panel::UserManagement),
            Section::AllTransactions => Some(Panel::AllTransactions),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("you do not have the required permissions for this panel")]
    NotPermitted,
}

/// Notices auto-dismiss after this window, like the original 5s message div
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient user-facing message with a fixed visibility window
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    posted: Instant,
}

impl Notice {
    fn new(text: String, kind: NoticeKind, posted: Instant) -> Self {
        Notice { text, kind, posted }
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        now.duration_since(self.posted) < NOTICE_TTL
    }
}

/// Holds the single active section plus the current transient notice
pub struct ViewController {
    active: Section,
    notice: Option<Notice>,
}

impl ViewController {
    /// Initial state on load: the listing, no notice
    pub fn new() -> Self {
        ViewController {
            active: Section::Listing,
            notice: None,
        }
    }

    pub fn active(&self) -> Section {
        self.active
    }

    /// Hide everything, then show `section` if the session's policy exposes
    /// the corresponding panel. On refusal the state is unchanged.
    pub fn show(&mut self, section: Section, session: &Session) -> Result<(), ViewError> {
        if let Some(panel) = section.required_panel() {
            if !visible_panels(session).contains(&panel) {
                debug!(?section, "panel not visible for current session");
                return Err(ViewError::NotPermitted);
            }
        }
        self.active = section;
        Ok(())
    }

    /// Transition taken after login/registration success: back to the listing
    /// so the caller re-renders with the new session's controls.
    pub fn return_to_listing(&mut self) {
        self.active = Section::Listing;
    }

    pub fn post_notice(&mut self, text: impl Into<String>, kind: NoticeKind) {
        self.notice = Some(Notice::new(text.into(), kind, Instant::now()));
    }

    /// Current notice if still inside its visibility window; expired notices
    /// are dropped on the way out.
    pub fn notice(&mut self, now: Instant) -> Option<&Notice> {
        if let Some(n) = &self.notice {
            if !n.is_visible(now) {
                self.notice = None;
            }
        }
        self.notice.as_ref()
    }
}

impl Default for ViewController {
    fn default() -> Self {
        ViewController::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_initial_state_is_listing() {
        let view = ViewController::new();
        assert_eq!(view.active(), Section::Listing);
    }

    #[test]
    fn test_show_replaces_previous_section() {
        let mut view = ViewController::new();
        let anon = Session::anonymous();
        view.show(Section::Register, &anon).expect("register visible");
        assert_eq!(view.active(), Section::Register);
        view.show(Section::Login, &anon).expect("login visible");
        // Exactly one section active: the previous one is gone
        assert_eq!(view.active(), Section::Login);
    }

    #[test]
    fn test_gated_section_refused_keeps_state() {
        let mut view = ViewController::new();
        let anon = Session::anonymous();
        assert_eq!(
            view.show(Section::CreateAd, &anon),
            Err(ViewError::NotPermitted)
        );
        assert_eq!(view.active(), Section::Listing);

        let seller = Session::logged_in("5551234", vec![Role::Seller]);
        assert_eq!(
            view.show(Section::UserManagement, &seller),
            Err(ViewError::NotPermitted)
        );
        assert_eq!(view.active(), Section::Listing);
    }

    #[test]
    fn test_login_flow_transitions() {
        let mut view = ViewController::new();
        view.show(Section::Login, &Session::anonymous())
            .expect("login panel");

        // After a successful login the controller returns to the listing and
        // the new session opens the previously hidden panels.
        let session = Session::logged_in("5551234", vec![Role::Admin]);
        view.return_to_listing();
        assert_eq!(view.active(), Section::Listing);
        view.show(Section::UserManagement, &session)
            .expect("admin panel now visible");
        // Logging out makes it gated again
        assert_eq!(
            view.show(Section::UserManagement, &Session::anonymous()),
            Err(ViewError::NotPermitted)
        );
    }

    #[test]
    fn test_result_sections_are_never_gated() {
        let mut view = ViewController::new();
        let anon = Session::anonymous();
        view.show(Section::SearchResults, &anon).expect("results");
        view.show(Section::RelatedCars, &anon).expect("related");
        view.show(Section::Listing, &anon).expect("listing");
    }

    #[test]
    fn test_notice_expires_after_window() {
        let mut view = ViewController::new();
        view.post_notice("Advertisement created successfully!", NoticeKind::Success);

        let now = Instant::now();
        assert!(view.notice(now).is_some());
        let later = now + NOTICE_TTL + Duration::from_millis(1);
        assert!(view.notice(later).is_none());
        // Dropped for good, not just hidden
        assert!(view.notice(now).is_none());
    }
}
