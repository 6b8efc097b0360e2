//! Per-connection integrity guard.
//!
//! Every connection task owns one [`Guard`] holding a random expected value.
//! Functions that work on bounded buffers call [`Guard::enter`] on entry and
//! hand the returned [`Frame`] back through [`Guard::leave`] on every exit.
//! A frame whose captured value no longer matches the guard means the
//! connection's memory can't be trusted, and the connection task is torn
//! down on the spot.

use std::fmt;

/// Expected value for one connection's guarded call chain.
pub struct Guard {
    expected: u64,
}

/// Value captured by a guarded function on entry.
#[must_use = "a frame must be handed back through Guard::leave"]
pub struct Frame {
    captured: u64,
}

/// A frame came back with a value different from the one it was issued with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub expected: u64,
    pub found: u64,
}

impl Guard {
    /// Creates a guard with a fresh random value.
    ///
    /// Called once per accepted connection, so sibling connections never
    /// share a value.
    pub fn new() -> Self {
        Self {
            expected: rand::random(),
        }
    }

    pub fn enter(&self) -> Frame {
        Frame {
            captured: self.expected,
        }
    }

    /// Checks a frame without acting on the result.
    pub fn verify(&self, frame: &Frame) -> Result<(), Violation> {
        if frame.captured == self.expected {
            Ok(())
        } else {
            Err(Violation {
                expected: self.expected,
                found: frame.captured,
            })
        }
    }

    /// Verifies `frame` and passes `value` through.
    ///
    /// # Panics
    ///
    /// Panics on a mismatch. The panic unwinds only the connection task that
    /// owns this guard; the listener sees it when reaping.
    pub fn leave<T>(&self, frame: Frame, value: T) -> T {
        if let Err(violation) = self.verify(&frame) {
            tracing::error!("{}", violation);
            panic!("{violation}");
        }
        value
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Guard {
    // The expected value stays out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "integrity guard violated: expected {:#018x}, found {:#018x}",
            self.expected, self.found
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_frame_passes_value_through() {
        let guard = Guard::new();
        let frame = guard.enter();
        assert_eq!(guard.leave(frame, 42), 42);
    }

    #[test]
    fn frame_from_another_guard_is_a_violation() {
        let a = Guard { expected: 1 };
        let b = Guard { expected: 2 };
        let frame = a.enter();

        assert_eq!(
            b.verify(&frame),
            Err(Violation {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    #[should_panic(expected = "integrity guard violated")]
    fn leave_panics_on_violation() {
        let guard = Guard { expected: 7 };
        let forged = Frame { captured: 8 };
        guard.leave(forged, ());
    }

    #[test]
    fn fresh_guards_differ() {
        // 64 random bits; a collision here means the generator is broken.
        let a = Guard::new();
        let b = Guard::new();
        assert_ne!(a.expected, b.expected);
    }
}
