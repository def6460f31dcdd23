//! Exactly-once start/stop tracking.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::{SubsystemError, SubsystemResult};

/// Observable state of a subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum SubsystemState {
    Created,
    Started,
    Stopped,
}

impl SubsystemState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Created,
            1 => Self::Started,
            _ => Self::Stopped,
        }
    }
}

/// Lifecycle tracker embedded in each subsystem.
///
/// Transitions are `Created -> Started -> Stopped` and `Created -> Stopped`.
/// `Stopped` is terminal.
#[derive(Debug)]
pub struct Lifecycle {
    name: &'static str,
    state: AtomicU8,
}

impl Lifecycle {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            state: AtomicU8::new(SubsystemState::Created as u8),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> SubsystemState {
        SubsystemState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == SubsystemState::Started
    }

    /// Move `Created -> Started`.
    pub fn try_start(&self) -> SubsystemResult<()> {
        match self.state.compare_exchange(
            SubsystemState::Created as u8,
            SubsystemState::Started as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => Ok(()),
            Err(raw) => match SubsystemState::from_u8(raw) {
                SubsystemState::Stopped => Err(SubsystemError::AlreadyStopped(self.name)),
                _ => Err(SubsystemError::AlreadyStarted(self.name)),
            },
        }
    }

    /// Move to `Stopped`, returning the state the subsystem left.
    ///
    /// Returns `None` when already stopped. Teardown work is only owed when
    /// the previous state was [`SubsystemState::Started`].
    pub fn try_stop(&self) -> Option<SubsystemState> {
        let prev = self
            .state
            .swap(SubsystemState::Stopped as u8, Ordering::SeqCst);
        match SubsystemState::from_u8(prev) {
            SubsystemState::Stopped => None,
            state => Some(state),
        }
    }

    /// Like [`try_stop`](Self::try_stop), but true only when teardown is owed.
    pub fn stop_needs_teardown(&self) -> bool {
        self.try_stop() == Some(SubsystemState::Started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_start_then_stop() {
        let lifecycle = Lifecycle::new("server");
        assert_eq!(lifecycle.state(), SubsystemState::Created);

        lifecycle.try_start().unwrap();
        assert!(lifecycle.is_running());
        assert_matches!(
            lifecycle.try_start(),
            Err(SubsystemError::AlreadyStarted("server"))
        );

        assert_eq!(lifecycle.try_stop(), Some(SubsystemState::Started));
        assert_eq!(lifecycle.try_stop(), None);
        assert_eq!(lifecycle.state(), SubsystemState::Stopped);
    }

    #[test]
    fn test_stop_without_start_needs_no_teardown() {
        let lifecycle = Lifecycle::new("handler");
        assert!(!lifecycle.stop_needs_teardown());
        assert_eq!(lifecycle.state(), SubsystemState::Stopped);
    }

    #[test]
    fn test_start_after_stop_is_rejected() {
        let lifecycle = Lifecycle::new("pool");
        lifecycle.try_stop();
        assert_matches!(
            lifecycle.try_start(),
            Err(SubsystemError::AlreadyStopped("pool"))
        );
    }
}
