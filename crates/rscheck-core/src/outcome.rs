use std::time::Instant;

/// Health status of a check or query at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

/// Immutable result of one check cycle or query evaluation.
///
/// Once constructed an `Outcome` never changes; [`crate::result_store::ResultStore`]
/// replaces entries wholesale rather than mutating them in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: Status,
    pub message: String,
    pub timestamp: Instant,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Outcome {
            status: Status::Ok,
            message: message.into(),
            timestamp: Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Outcome {
            status: Status::Error,
            message: message.into(),
            timestamp: Instant::now(),
        }
    }

    /// The value a check holds before its first cycle has completed, or that
    /// an unknown name resolves to. Contributes `OK` to any aggregated
    /// verdict — see spec.md §4.5 "Empty-state policy".
    pub fn sentinel() -> Self {
        Outcome {
            status: Status::Ok,
            message: String::new(),
            timestamp: epoch(),
        }
    }
}

// `Instant` has no "zero" value on stable Rust; we approximate spec.md's
// "epoch-zero" sentinel with a fixed instant captured once at process start,
// which predates every real outcome's timestamp and is never advanced.
static EPOCH: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

fn epoch() -> Instant {
    *EPOCH.get_or_init(Instant::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_ok_with_empty_message() {
        let s = Outcome::sentinel();
        assert_eq!(s.status, Status::Ok);
        assert_eq!(s.message, "");
    }

    #[test]
    fn sentinel_predates_fresh_outcomes() {
        let s = Outcome::sentinel();
        let fresh = Outcome::ok("hi");
        assert!(s.timestamp <= fresh.timestamp);
    }
}
