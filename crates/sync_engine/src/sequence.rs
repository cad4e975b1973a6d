//! Frame-sequence deduplication.

/// Admits a stream message only when its sequence differs from the last one
#[derive(Debug, Clone, Default)]
pub struct SequenceGate {
    last: Option<u64>,
}

impl SequenceGate {
    /// Returns true and records `sequence` if it was not the last admitted one
    pub fn admit(&mut self, sequence: u64) -> bool {
        if self.last == Some(sequence) {
            return false;
        }
        self.last = Some(sequence);
        true
    }

    pub fn last(&self) -> Option<u64> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_once_per_sequence() {
        let mut gate = SequenceGate::default();
        assert!(gate.admit(1));
        assert!(!gate.admit(1));
        assert!(gate.admit(2));
        assert_eq!(gate.last(), Some(2));
    }

    #[test]
    fn test_any_change_is_admitted() {
        // receive frames can restart after a publisher restart
        let mut gate = SequenceGate::default();
        assert!(gate.admit(10));
        assert!(gate.admit(3));
        assert!(!gate.admit(3));
    }

    #[test]
    fn test_zero_is_a_valid_sequence() {
        let mut gate = SequenceGate::default();
        assert!(gate.admit(0));
        assert!(!gate.admit(0));
    }
}
