//! Key-usage lifetime accounting (SPEC_FULL.md §4.4).
//!
//! Grounded on `srtp.c`'s `key_limit_set`/`key_limit_update`/
//! `key_limit_clone`/`key_event_t`: a stream's key limiter is shared with
//! every stream cloned from the same template, so repeated use of one
//! master key across many SSRCs is accounted against a single ceiling.

/// Outcome of one [`KeyLimit::update`] call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum KeyEvent {
    Normal,
    SoftLimit,
    HardLimit,
}

pub(crate) struct KeyLimit {
    count: u64,
    soft_limit: u64,
    hard_limit: u64,
}

impl KeyLimit {
    /// A very large default ceiling, matching the original source's
    /// `key_limit_set`-less default of effectively unbounded use.
    const DEFAULT_HARD_LIMIT: u64 = u64::MAX;

    pub fn new() -> Self {
        KeyLimit {
            count: 0,
            soft_limit: Self::DEFAULT_HARD_LIMIT / 2,
            hard_limit: Self::DEFAULT_HARD_LIMIT,
        }
    }

    /// Install an explicit hard limit; the soft limit is set to half of it,
    /// matching the original source's convention.
    pub fn set(&mut self, hard_limit: u64) {
        self.hard_limit = hard_limit;
        self.soft_limit = hard_limit / 2;
    }

    /// Account for one more use of the key. `hard_limit` uses of the key
    /// succeed; the call that would make it the `hard_limit + 1`th fails
    /// with [`KeyEvent::HardLimit`] instead, and every call after that
    /// keeps returning `HardLimit` without incrementing further (the limit
    /// is terminal).
    pub fn update(&mut self) -> KeyEvent {
        if self.count > self.hard_limit {
            return KeyEvent::HardLimit;
        }
        self.count += 1;
        if self.count > self.hard_limit {
            KeyEvent::HardLimit
        } else if self.count == self.soft_limit {
            KeyEvent::SoftLimit
        } else {
            KeyEvent::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_normal_then_soft_then_hard() {
        let mut limit = KeyLimit::new();
        limit.set(4);
        assert_eq!(limit.update(), KeyEvent::Normal);
        assert_eq!(limit.update(), KeyEvent::SoftLimit);
        assert_eq!(limit.update(), KeyEvent::Normal);
        assert_eq!(limit.update(), KeyEvent::Normal);
        assert_eq!(limit.update(), KeyEvent::HardLimit);
    }

    #[test]
    fn hard_limit_is_terminal() {
        let mut limit = KeyLimit::new();
        limit.set(1);
        assert_eq!(limit.update(), KeyEvent::Normal);
        assert_eq!(limit.update(), KeyEvent::HardLimit);
        assert_eq!(limit.update(), KeyEvent::HardLimit);
    }
}
