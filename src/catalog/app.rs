use std::fmt;
use std::str::FromStr;

use crate::events::EventKind;

/// Domain-level events published on the application bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppEvent {
    WaitlistSignupStarted,
    /// A waitlist signup was accepted.
    SignupCompleted,
    SignupFailed,
    /// The Dream Mode simulation funnel was entered.
    DreamModeStarted,
    DreamModeStepCompleted,
    DreamModeCompleted,
    ShareCardGenerated,
    /// A listener on this bus failed.
    InternalError,
}

const ALL: &[AppEvent] = &[
    AppEvent::WaitlistSignupStarted,
    AppEvent::SignupCompleted,
    AppEvent::SignupFailed,
    AppEvent::DreamModeStarted,
    AppEvent::DreamModeStepCompleted,
    AppEvent::DreamModeCompleted,
    AppEvent::ShareCardGenerated,
    AppEvent::InternalError,
];

impl EventKind for AppEvent {
    fn name(&self) -> &'static str {
        match self {
            AppEvent::WaitlistSignupStarted => "waitlist_signup_started",
            AppEvent::SignupCompleted => "signup_completed",
            AppEvent::SignupFailed => "signup_failed",
            AppEvent::DreamModeStarted => "dream_mode_started",
            AppEvent::DreamModeStepCompleted => "dream_mode_step_completed",
            AppEvent::DreamModeCompleted => "dream_mode_completed",
            AppEvent::ShareCardGenerated => "share_card_generated",
            AppEvent::InternalError => "internal_error",
        }
    }

    fn required_fields(&self) -> &'static [&'static str] {
        match self {
            AppEvent::WaitlistSignupStarted => &[],
            AppEvent::SignupCompleted => &["userId"],
            AppEvent::SignupFailed => &["reason"],
            AppEvent::DreamModeStarted => &["scenario"],
            AppEvent::DreamModeStepCompleted => &["scenario", "step"],
            AppEvent::DreamModeCompleted => &["scenario", "durationMs"],
            AppEvent::ShareCardGenerated => &["format", "platform"],
            AppEvent::InternalError => &["error", "severity"],
        }
    }

    fn internal_error() -> Self {
        AppEvent::InternalError
    }

    fn all() -> &'static [Self] {
        ALL
    }
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AppEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppEvent::from_name(s).ok_or_else(|| format!("unknown app event `{s}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_unique_name() {
        let mut names: Vec<&str> = AppEvent::all().iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), AppEvent::all().len());
    }

    #[test]
    fn test_parse() {
        assert_eq!("signup_completed".parse::<AppEvent>(), Ok(AppEvent::SignupCompleted));
        assert!("cta_clicked".parse::<AppEvent>().is_err());
        assert!(AppEvent::InternalError.is_internal_error());
    }
}
