//! SOS session state.
//!
//! `Idle -> Countdown -> (resolved) -> Idle`. At most one session is open;
//! opening another supersedes it and bumps the generation so ticks queued
//! for the old countdown are ignored.

use serde::Serialize;

use crate::emergency::EmergencyKind;

/// Why a session was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "kind", rename_all = "snake_case")]
pub enum SosMode {
    Emergency(EmergencyKind),
    Test,
}

impl SosMode {
    pub fn is_test(self) -> bool {
        matches!(self, SosMode::Test)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SosPhase {
    Idle,
    Countdown {
        mode: SosMode,
        remaining: u32,
        generation: u64,
    },
}

/// Result of opening a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opened {
    pub generation: u64,
    /// The session this one replaced, if any.
    pub superseded: Option<SosMode>,
}

#[derive(Debug, Clone, Default)]
pub struct SosSession {
    phase: Option<(SosMode, u32, u64)>,
    generation: u64,
}

impl SosSession {
    pub fn phase(&self) -> SosPhase {
        match self.phase {
            None => SosPhase::Idle,
            Some((mode, remaining, generation)) => SosPhase::Countdown {
                mode,
                remaining,
                generation,
            },
        }
    }

    pub fn is_open(&self) -> bool {
        self.phase.is_some()
    }

    pub fn mode(&self) -> Option<SosMode> {
        self.phase.map(|(mode, _, _)| mode)
    }

    pub fn remaining(&self) -> Option<u32> {
        self.phase.map(|(_, remaining, _)| remaining)
    }

    /// Open a countdown of `seconds`, replacing any open session.
    pub fn open(&mut self, mode: SosMode, seconds: u32) -> Opened {
        let superseded = self.mode();
        self.generation += 1;
        self.phase = Some((mode, seconds, self.generation));
        Opened {
            generation: self.generation,
            superseded,
        }
    }

    /// One countdown second for session `generation`.
    ///
    /// Returns the remaining seconds, or `None` when that session is no
    /// longer open. At zero the count holds; nothing else happens.
    pub fn tick(&mut self, generation: u64) -> Option<u32> {
        let (_, remaining, current) = self.phase.as_mut()?;
        if *current != generation {
            return None;
        }
        *remaining = remaining.saturating_sub(1);
        Some(*remaining)
    }

    /// Close the open session, returning its mode. `None` when idle.
    pub fn resolve(&mut self) -> Option<SosMode> {
        self.phase.take().map(|(mode, _, _)| mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALL: SosMode = SosMode::Emergency(EmergencyKind::Fall);

    #[test]
    fn countdown_runs_to_zero_then_holds() {
        let mut session = SosSession::default();
        let opened = session.open(FALL, 10);

        let seen: Vec<_> = (0..10).map(|_| session.tick(opened.generation)).collect();
        assert_eq!(seen.last(), Some(&Some(0)));
        assert_eq!(seen[0], Some(9));

        assert_eq!(session.tick(opened.generation), Some(0));
        assert!(session.is_open());
    }

    #[test]
    fn reopening_supersedes_and_ignores_stale_ticks() {
        let mut session = SosSession::default();
        let first = session.open(SosMode::Test, 5);
        let second = session.open(FALL, 10);

        assert_eq!(second.superseded, Some(SosMode::Test));
        assert_eq!(session.tick(first.generation), None);
        assert_eq!(session.remaining(), Some(10));
        assert_eq!(session.tick(second.generation), Some(9));
    }

    #[test]
    fn resolve_closes_once() {
        let mut session = SosSession::default();
        let opened = session.open(FALL, 10);

        assert_eq!(session.resolve(), Some(FALL));
        assert_eq!(session.resolve(), None);
        assert_eq!(session.tick(opened.generation), None);
        assert_eq!(session.phase(), SosPhase::Idle);
    }
}
