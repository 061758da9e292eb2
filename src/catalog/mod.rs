//! Event catalogs for the two bus instances.
//!
//! - [`UiEvent`]  component-level interactions (carousels, CTAs, modals, forms);
//! - [`AppEvent`] domain-level milestones (waitlist signup, Dream Mode, sharing).
//!
//! Both catalogs include an `internal_error` kind used by the bus to surface
//! listener failures.

mod app;
mod ui;

pub use app::AppEvent;
pub use ui::UiEvent;
