//! # Seatbook Testing
//!
//! Testing utilities for Seatbook.
//!
//! This crate provides:
//! - [`FixedClock`]: deterministic time for the allocation engine
//! - [`InMemoryStore`]: seat directory, person directory and ledger in one lock
//! - [`properties`]: proptest strategies for ledger operation sequences
//!
//! ## Example
//!
//! ```ignore
//! use seatbook_testing::{InMemoryStore, test_clock};
//! use seatbook_runtime::{AllocationEngine, EngineConfig, Stores};
//!
//! #[tokio::test]
//! async fn books_a_seat() {
//!     let store = Arc::new(InMemoryStore::new());
//!     let engine = AllocationEngine::new(
//!         Stores::shared(Arc::clone(&store)),
//!         Arc::new(test_clock()),
//!         EngineConfig::default(),
//!     );
//!     // ...
//! }
//! ```

use chrono::{DateTime, Utc};
use seatbook_core::Clock;

pub mod properties;
pub mod store;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making lead-time checks reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use seatbook_testing::mocks::FixedClock;
    /// use seatbook_core::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Parse an RFC 3339 instant, e.g. `2025-06-09T10:00:00Z`.
        ///
        /// # Errors
        ///
        /// Returns the parse error for malformed input.
        pub fn at(instant: &str) -> Result<Self, chrono::ParseError> {
            Ok(Self::new(
                DateTime::parse_from_rfc3339(instant)?.with_timezone(&Utc),
            ))
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }
}

pub use mocks::{FixedClock, test_clock};
pub use store::InMemoryStore;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_fixed_at_new_year() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn fixed_clock_parses_instants() {
        let clock = FixedClock::at("2025-06-09T10:00:00Z").unwrap();
        assert_eq!(clock.now().to_rfc3339(), "2025-06-09T10:00:00+00:00");
        assert!(FixedClock::at("yesterday").is_err());
    }
}
