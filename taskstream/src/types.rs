//! Core types for the `TaskStream` event sourcing engine.
//!
//! All identifier types use smart constructors so that validity is
//! established at construction time, following the "parse, don't validate"
//! principle.

use chrono::{DateTime, Utc};
use nutype::nutype;
use serde::{Deserialize, Serialize};

/// An opaque identifier naming one aggregate's event stream.
///
/// `AggregateId` values are guaranteed to be non-empty and at most 255
/// characters. Once constructed, an `AggregateId` is always valid - no
/// further validation needed.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct AggregateId(String);

/// The position of an event within its aggregate's stream.
///
/// Sequence numbers increment monotonically per aggregate; the first event
/// of a stream carries sequence number 1. A stream's *version* is the
/// sequence number of its latest event, so `initial()` (zero) doubles as
/// the version of a stream that does not exist yet.
#[nutype(
    validate(greater_or_equal = 0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Display,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    /// The version of an empty (or nonexistent) stream.
    pub fn initial() -> Self {
        Self::try_new(0).expect("0 is always a valid sequence number")
    }

    /// Returns the next sequence number after this one.
    #[must_use]
    pub fn next(self) -> Self {
        let current: u64 = self.into();
        Self::try_new(current + 1).expect("next sequence number should always be valid")
    }
}

/// A timestamp recording when an event occurred.
///
/// This wrapper ensures consistent timestamp handling throughout the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a new timestamp from a UTC `DateTime`.
    pub const fn new(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Creates a timestamp representing the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the underlying `DateTime`.
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::new(datetime)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn aggregate_id_accepts_valid_strings(s in "[a-zA-Z0-9_-]{1,255}") {
            let result = AggregateId::try_new(s.clone());
            prop_assert!(result.is_ok());
            let id = result.unwrap();
            prop_assert_eq!(id.as_ref(), &s);
        }

        #[test]
        fn aggregate_id_rejects_blank_strings(s in " {0,50}") {
            prop_assert!(AggregateId::try_new(s).is_err());
        }

        #[test]
        fn sequence_number_next_increments_by_one(v in 0u64..u64::MAX) {
            let seq = SequenceNumber::try_new(v).unwrap();
            let next: u64 = seq.next().into();
            prop_assert_eq!(next, v + 1);
        }

        #[test]
        fn sequence_number_roundtrip_serialization(v in 0u64..=u64::MAX) {
            let seq = SequenceNumber::try_new(v).unwrap();
            let json = serde_json::to_string(&seq).unwrap();
            let deserialized: SequenceNumber = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(seq, deserialized);
        }
    }

    #[test]
    fn sequence_number_initial_is_zero() {
        let value: u64 = SequenceNumber::initial().into();
        assert_eq!(value, 0);
    }

    #[test]
    fn aggregate_id_rejects_oversized_strings() {
        assert!(AggregateId::try_new("a".repeat(256)).is_err());
        assert!(AggregateId::try_new("a".repeat(255)).is_ok());
    }

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let timestamp = Timestamp::now();
        let after = Utc::now();

        assert!(timestamp.as_datetime() >= &before);
        assert!(timestamp.as_datetime() <= &after);
    }
}
