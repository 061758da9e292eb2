use std::fmt;
use std::str::FromStr;

use crate::events::EventKind;

/// Component-level events published on the UI bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiEvent {
    /// A carousel moved to another slide.
    SlideChanged,
    /// Carousel autoplay switched on or off.
    CarouselAutoplayToggled,
    /// A call-to-action was clicked.
    CtaClicked,
    ModalOpened,
    ModalClosed,
    FormFieldFocused,
    FormSubmitted,
    /// The user asked for a share card image.
    ShareCardRequested,
    /// A listener on this bus failed.
    InternalError,
}

const ALL: &[UiEvent] = &[
    UiEvent::SlideChanged,
    UiEvent::CarouselAutoplayToggled,
    UiEvent::CtaClicked,
    UiEvent::ModalOpened,
    UiEvent::ModalClosed,
    UiEvent::FormFieldFocused,
    UiEvent::FormSubmitted,
    UiEvent::ShareCardRequested,
    UiEvent::InternalError,
];

impl EventKind for UiEvent {
    fn name(&self) -> &'static str {
        match self {
            UiEvent::SlideChanged => "slide_changed",
            UiEvent::CarouselAutoplayToggled => "carousel_autoplay_toggled",
            UiEvent::CtaClicked => "cta_clicked",
            UiEvent::ModalOpened => "modal_opened",
            UiEvent::ModalClosed => "modal_closed",
            UiEvent::FormFieldFocused => "form_field_focused",
            UiEvent::FormSubmitted => "form_submitted",
            UiEvent::ShareCardRequested => "share_card_requested",
            UiEvent::InternalError => "internal_error",
        }
    }

    fn required_fields(&self) -> &'static [&'static str] {
        match self {
            UiEvent::SlideChanged => &["slideIndex"],
            UiEvent::CarouselAutoplayToggled => &["enabled"],
            UiEvent::CtaClicked => &["ctaLabel", "ctaUrl"],
            UiEvent::ModalOpened | UiEvent::ModalClosed => &["modalId"],
            UiEvent::FormFieldFocused => &["formId", "field"],
            UiEvent::FormSubmitted => &["formId"],
            UiEvent::ShareCardRequested => &["format"],
            UiEvent::InternalError => &["error", "severity"],
        }
    }

    fn internal_error() -> Self {
        UiEvent::InternalError
    }

    fn all() -> &'static [Self] {
        ALL
    }
}

impl fmt::Display for UiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UiEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UiEvent::from_name(s).ok_or_else(|| format!("unknown ui event `{s}`"))
    }
}
