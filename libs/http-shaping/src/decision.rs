use tracing::debug;

/// Outcome of the per-request admission check.
///
/// Deliberately carries no reason: an inbound and an outbound breach look the
/// same to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allow: bool,
}

impl Decision {
    pub const fn allow() -> Self {
        Self { allow: true }
    }

    pub const fn reject() -> Self {
        Self { allow: false }
    }

    pub fn is_allowed(&self) -> bool {
        self.allow
    }
}

/// Rejects when enforcement is on and either sum has reached its limit.
///
/// A zero limit therefore rejects every request, including the first one of a
/// fresh window.
pub fn evaluate(enforce: bool, sum_in: u64, sum_out: u64, limit_in: u64, limit_out: u64) -> Decision {
    if !enforce {
        return Decision::allow();
    }

    if sum_in >= limit_in {
        debug!(sum_in, limit_in, "Inbound traffic limit reached");
        return Decision::reject();
    }

    if sum_out >= limit_out {
        debug!(sum_out, limit_out, "Outbound traffic limit reached");
        return Decision::reject();
    }

    Decision::allow()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_below_limits() {
        assert!(evaluate(true, 0, 0, 1024, 1024).is_allowed());
        assert!(evaluate(true, 1023, 1023, 1024, 1024).is_allowed());
    }

    #[test]
    fn test_rejects_at_either_limit() {
        assert_eq!(evaluate(true, 1024, 0, 1024, 1024), Decision::reject());
        assert_eq!(evaluate(true, 0, 1024, 1024, 1024), Decision::reject());
        assert_eq!(evaluate(true, 5000, 5000, 1024, 1024), Decision::reject());
    }

    #[test]
    fn test_zero_limit_blocks_everything() {
        assert!(!evaluate(true, 0, 0, 0, 1024).is_allowed());
        assert!(!evaluate(true, 0, 0, 1024, 0).is_allowed());
    }

    #[test]
    fn test_disabled_enforcement_always_allows() {
        assert!(evaluate(false, 0, 0, 0, 0).is_allowed());
        assert!(evaluate(false, u64::MAX, u64::MAX, 1, 1).is_allowed());
    }

    #[test]
    fn test_breach_direction_is_not_observable() {
        let inbound = evaluate(true, 10, 0, 10, 10);
        let outbound = evaluate(true, 0, 10, 10, 10);
        assert_eq!(inbound, outbound);
    }
}
