//! Tie between an in-flight generator call and the turn that started it.
//!
//! A new user request supersedes any call still streaming; completions and
//! previews carrying a stale [`Turn`] must be dropped before they reach the
//! pending-change store.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of one generator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn(u64);

/// Monotone counter of generator calls; only the most recent is current.
#[derive(Debug, Default)]
pub struct TurnGate {
    current: AtomicU64,
}

impl TurnGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new turn, invalidating all earlier ones.
    pub fn begin(&self) -> Turn {
        Turn(self.current.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn is_current(&self, turn: Turn) -> bool {
        self.current.load(Ordering::Relaxed) == turn.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_turn_wins() {
        let gate = TurnGate::new();
        let first = gate.begin();
        assert!(gate.is_current(first));
        let second = gate.begin();
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
    }
}
