use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

/// Skip-allowance seam. The engine only asks whether a skip may proceed;
/// whoever owns the allowance policy implements this.
pub trait SkipGate: Send + Sync {
    /// Consume one skip for `participant` in the given session. `false`
    /// means the allowance is exhausted and the skip must be rejected.
    fn try_consume(&self, session_id: Uuid, participant: Uuid) -> bool;
}

/// Fixed per-participant allowance per session.
pub struct FixedSkipGate {
    limit: u32,
    used: Mutex<HashMap<(Uuid, Uuid), u32>>,
}

impl FixedSkipGate {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            used: Mutex::new(HashMap::new()),
        }
    }
}

impl SkipGate for FixedSkipGate {
    fn try_consume(&self, session_id: Uuid, participant: Uuid) -> bool {
        let mut used = self.used.lock().expect("skip gate lock poisoned");
        let count = used.entry((session_id, participant)).or_insert(0);
        if *count >= self.limit {
            return false;
        }
        *count += 1;
        true
    }
}

/// Never says no; useful in tests.
pub struct UnlimitedSkips;

impl SkipGate for UnlimitedSkips {
    fn try_consume(&self, _session_id: Uuid, _participant: Uuid) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowance_per_participant() {
        let gate = FixedSkipGate::new(2);
        let session = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        assert!(gate.try_consume(session, alice));
        assert!(gate.try_consume(session, alice));
        assert!(!gate.try_consume(session, alice));

        // Bob's allowance is untouched by Alice's skips.
        assert!(gate.try_consume(session, bob));
    }

    #[test]
    fn test_allowance_per_session() {
        let gate = FixedSkipGate::new(1);
        let alice = Uuid::new_v4();

        assert!(gate.try_consume(Uuid::new_v4(), alice));
        assert!(gate.try_consume(Uuid::new_v4(), alice));
    }
}
