//! # Event registry: kinds and their required-field schemas.
//!
//! Every bus is generic over an [`EventKind`]: a closed enum whose
//! [`required_fields`](EventKind::required_fields) is written as an exhaustive
//! `match`. Adding a variant without a schema entry does not compile.
//!
//! Validation is presence-only and table-driven:
//! ```text
//! validate(kind, payload)
//!   ├─► source empty?          ─► MissingSource
//!   ├─► for field in kind.required_fields()
//!   │      └─► field absent?   ─► MissingField { field }
//!   └─► Ok(())
//! ```

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::ValidationError;
use crate::events::payload::Payload;

/// A category of event known to a bus.
///
/// Implementors are plain `Copy` enums. The catalog is process-wide and
/// immutable; see [`UiEvent`](crate::UiEvent) and [`AppEvent`](crate::AppEvent).
pub trait EventKind: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Stable wire name (`"cta_clicked"`), used for telemetry and history filters.
    fn name(&self) -> &'static str;

    /// Payload fields that must be present, in schema order.
    fn required_fields(&self) -> &'static [&'static str];

    /// The kind used to surface listener failures on the same bus.
    fn internal_error() -> Self;

    /// Every kind in the catalog.
    fn all() -> &'static [Self];

    /// Returns true for the internal error kind.
    fn is_internal_error(&self) -> bool {
        *self == Self::internal_error()
    }

    /// Looks a kind up by wire name.
    fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// Checks `payload` against the schema of `kind`.
///
/// Only presence is checked; values are not type-checked.
pub fn validate<K: EventKind>(kind: K, payload: &Payload) -> Result<(), ValidationError> {
    if payload.source().trim().is_empty() {
        return Err(ValidationError::MissingSource { kind: kind.name() });
    }
    match kind
        .required_fields()
        .iter()
        .find(|field| !payload.contains(field))
    {
        Some(field) => Err(ValidationError::MissingField {
            kind: kind.name(),
            field,
        }),
        None => Ok(()),
    }
}
