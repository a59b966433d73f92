//! Request-id allocation.
//!
//! A request id correlates an outbound request with every reply the
//! gateway sends for it. Ids are unique and strictly increasing for the
//! lifetime of one connection; each engine owns its own allocator.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Client-generated correlation id, echoed by the gateway in replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub i64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RequestId> for crate::value::FieldValue {
    fn from(id: RequestId) -> Self {
        crate::value::FieldValue::Int(id.0)
    }
}

/// Thread-safe monotonic id counter.
#[derive(Debug)]
pub struct RequestIdAllocator {
    next: AtomicI64,
}

impl Default for RequestIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestIdAllocator {
    /// Counter starting at 1.
    pub fn new() -> Self {
        Self::with_seed(1)
    }

    pub fn with_seed(seed: i64) -> Self {
        RequestIdAllocator {
            next: AtomicI64::new(seed),
        }
    }

    /// Hand out a fresh id, greater than every id returned before.
    pub fn next(&self) -> RequestId {
        RequestId(self.next.fetch_add(1, Ordering::AcqRel))
    }

    /// Raise the counter so the next id is at least `seed`.
    ///
    /// Never moves the counter backwards.
    pub fn advance_to(&self, seed: i64) {
        self.next.fetch_max(seed, Ordering::AcqRel);
    }

    /// The id the next call to [`RequestIdAllocator::next`] would return.
    pub fn peek(&self) -> RequestId {
        RequestId(self.next.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one_and_increments() {
        let ids = RequestIdAllocator::new();
        assert_eq!(ids.next(), RequestId(1));
        assert_eq!(ids.next(), RequestId(2));
        assert_eq!(ids.peek(), RequestId(3));
    }

    #[test]
    fn advance_never_goes_backwards() {
        let ids = RequestIdAllocator::new();
        ids.advance_to(100);
        assert_eq!(ids.next(), RequestId(100));
        ids.advance_to(10);
        assert_eq!(ids.next(), RequestId(101));
    }
}
