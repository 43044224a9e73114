//! Run lifecycle phases.

use std::fmt;

/// `Loading → Filtering → Running → Finalizing → Done`; `Aborted` from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Loading,
    Filtering,
    Running,
    Finalizing,
    Done,
    Aborted,
}

impl RunPhase {
    /// Whether `next` may follow `self`.
    pub fn can_enter(self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Loading, Filtering)
                | (Filtering, Running)
                | (Running, Finalizing)
                | (Finalizing, Done)
                | (Loading | Filtering | Running | Finalizing, Aborted)
        )
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Loading => "loading",
            RunPhase::Filtering => "filtering",
            RunPhase::Running => "running",
            RunPhase::Finalizing => "finalizing",
            RunPhase::Done => "done",
            RunPhase::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::RunPhase::*;

    #[test]
    fn forward_transitions_only() {
        assert!(Loading.can_enter(Filtering));
        assert!(Finalizing.can_enter(Done));
        assert!(!Loading.can_enter(Running));
        assert!(!Done.can_enter(Loading));
    }

    #[test]
    fn aborted_reachable_until_done() {
        for p in [Loading, Filtering, Running, Finalizing] {
            assert!(p.can_enter(Aborted), "{p}");
        }
        assert!(!Done.can_enter(Aborted));
        assert!(!Aborted.can_enter(Aborted));
    }
}
