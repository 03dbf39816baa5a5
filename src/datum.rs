use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::stamp::Stamp;

/// The kind of a [`Datum`], in ascending priority order.
///
/// `edge_data_info`'s `max_status` is the highest-priority kind present in a
/// batch; the derived [`Ord`] implementation follows declaration order,
/// giving the priority ordering `data < empty < complete < error < invalid`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum DatumKind {
    Data,
    Empty,
    Complete,
    Error,
    Invalid,
}

/// A tagged value exchanged on an edge.
///
/// Variants indicate either a payload ([`DatumKind::Data`]) or a control
/// signal (empty/complete/error/invalid). The payload is type-erased: the
/// core has no knowledge of concrete port payload types, so it is carried
/// behind `Arc<dyn Any + Send + Sync>` rather than a generic parameter. This
/// also makes a `Datum` cheap to clone for output fan-out, matching the
/// edge's requirement to broadcast one push to every connected edge.
#[derive(Clone)]
pub struct Datum {
    kind: DatumKind,
    payload: Option<Arc<dyn Any + Send + Sync>>,
    message: Option<Arc<str>>,
}

impl Datum {
    /// Construct a `data` datum carrying `payload`.
    pub fn data<T>(payload: T) -> Self
    where
        T: Any + Send + Sync + 'static,
    {
        Self {
            kind: DatumKind::Data,
            payload: Some(Arc::new(payload)),
            message: None,
        }
    }

    /// Construct an `empty` datum.
    #[inline]
    pub fn empty() -> Self {
        Self {
            kind: DatumKind::Empty,
            payload: None,
            message: None,
        }
    }

    /// Construct a `complete` datum.
    #[inline]
    pub fn complete() -> Self {
        Self {
            kind: DatumKind::Complete,
            payload: None,
            message: None,
        }
    }

    /// Construct an `error` datum carrying a human-readable message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: DatumKind::Error,
            payload: None,
            message: Some(Arc::from(message.into())),
        }
    }

    /// Construct an `invalid` datum.
    #[inline]
    pub fn invalid() -> Self {
        Self {
            kind: DatumKind::Invalid,
            payload: None,
            message: None,
        }
    }

    /// The kind of this datum.
    #[inline]
    pub fn kind(&self) -> DatumKind {
        self.kind
    }

    /// The message carried by an `error` datum, if any.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Borrow the payload as `T`, if this is a `data` datum carrying exactly
    /// that type.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }

    /// Consume this datum, returning the payload as an owned `T`.
    ///
    /// Requires both that this is a `data` datum carrying exactly `T` and
    /// that no other clone of this datum is holding the same payload `Arc`;
    /// a cloned-and-shared payload falls back to `None` rather than
    /// requiring `T: Clone` just to serve the single-owner case.
    pub fn into_payload<T: Any + Send + Sync>(self) -> Option<T> {
        let arc = self.payload?.downcast::<T>().ok()?;
        Arc::try_unwrap(arc).ok()
    }
}

impl fmt::Debug for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Datum");
        s.field("kind", &self.kind);

        if let Some(message) = &self.message {
            s.field("message", message);
        }

        s.finish_non_exhaustive()
    }
}

/// A `(datum, stamp)` pair, the unit exchanged over an edge.
#[derive(Clone, Debug)]
pub struct EdgeDatum {
    pub datum: Datum,
    pub stamp: Stamp,
}

impl EdgeDatum {
    #[inline]
    pub fn new(datum: Datum, stamp: Stamp) -> Self {
        Self { datum, stamp }
    }
}

/// Summary of a batch of [`EdgeDatum`]s, as produced by
/// [`edge_data_info`][crate::process::edge_data_info].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DataInfo {
    /// `true` iff every stamp in the batch shares the first stamp's color.
    pub same_color: bool,
    /// `true` iff every stamp in the batch equals the first stamp exactly.
    pub in_sync: bool,
    /// The highest-priority [`DatumKind`] present in the batch.
    pub max_status: DatumKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_priority_is_ascending() {
        assert!(DatumKind::Data < DatumKind::Empty);
        assert!(DatumKind::Empty < DatumKind::Complete);
        assert!(DatumKind::Complete < DatumKind::Error);
        assert!(DatumKind::Error < DatumKind::Invalid);
    }

    #[test]
    fn data_payload_round_trips() {
        let datum = Datum::data(42i32);
        assert_eq!(datum.kind(), DatumKind::Data);
        assert_eq!(datum.payload::<i32>(), Some(&42));
        assert_eq!(datum.payload::<&str>(), None);
    }

    #[test]
    fn into_payload_rejects_wrong_type() {
        let datum = Datum::data(42i32);
        assert_eq!(datum.into_payload::<&'static str>(), None);
    }

    #[test]
    fn into_payload_requires_sole_ownership() {
        let datum = Datum::data(42i32);
        let clone = datum.clone();

        // Shared with `clone`, so the owned downcast can't move it out.
        assert_eq!(datum.into_payload::<i32>(), None);
        // The failed attempt above dropped its Arc handle, leaving `clone`
        // as the sole owner.
        assert_eq!(clone.into_payload::<i32>(), Some(42));
    }

    #[test]
    fn control_variants_carry_no_payload() {
        assert_eq!(Datum::empty().payload::<i32>(), None);
        assert_eq!(Datum::complete().kind(), DatumKind::Complete);
        assert_eq!(Datum::invalid().kind(), DatumKind::Invalid);
    }

    #[test]
    fn error_datum_carries_message() {
        let datum = Datum::error("boom");
        assert_eq!(datum.kind(), DatumKind::Error);
        assert_eq!(datum.message(), Some("boom"));
    }
}
