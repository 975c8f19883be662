//! Critical section primitive
//!
//! Start and stop conditions must not be split by an edge interrupt from the
//! same device, so the engines bracket those windows with
//! [`CriticalSection::enter`] / [`CriticalSection::exit`]. Sections are
//! paired and never nested by the engines.

/// Interrupt-masking bracket
pub trait CriticalSection {
    /// Mask interrupts until the matching [`exit`](CriticalSection::exit)
    fn enter(&mut self);

    /// Restore the interrupt state saved by [`enter`](CriticalSection::enter)
    fn exit(&mut self);
}

/// No-op section for polled, single-context use
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCriticalSection;

impl CriticalSection for NoCriticalSection {
    fn enter(&mut self) {}

    fn exit(&mut self) {}
}

/// Section backed by the `critical-section` crate
///
/// The platform provides the implementation (e.g. through its HAL's
/// `critical-section-impl` feature).
#[derive(Default)]
pub struct InterruptFree {
    restore: Option<critical_section::RestoreState>,
}

impl InterruptFree {
    pub const fn new() -> Self {
        Self { restore: None }
    }

    pub fn is_held(&self) -> bool {
        self.restore.is_some()
    }
}

impl CriticalSection for InterruptFree {
    fn enter(&mut self) {
        if self.restore.is_some() {
            return;
        }
        // SAFETY: every acquire is released by `exit` or on drop, in order,
        // and sections are never nested through this type.
        #[allow(unsafe_code)]
        let state = unsafe { critical_section::acquire() };
        self.restore = Some(state);
    }

    fn exit(&mut self) {
        if let Some(state) = self.restore.take() {
            // SAFETY: `state` was returned by the matching acquire in `enter`.
            #[allow(unsafe_code)]
            unsafe {
                critical_section::release(state)
            };
        }
    }
}

impl Drop for InterruptFree {
    fn drop(&mut self) {
        self.exit();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Section that records how it was used
    #[derive(Debug, Default)]
    pub(crate) struct CountingSection {
        pub enters: usize,
        pub exits: usize,
        pub depth: isize,
        pub max_depth: isize,
    }

    impl CriticalSection for CountingSection {
        fn enter(&mut self) {
            self.enters += 1;
            self.depth += 1;
            self.max_depth = self.max_depth.max(self.depth);
        }

        fn exit(&mut self) {
            self.exits += 1;
            self.depth -= 1;
        }
    }

    #[test]
    fn test_interrupt_free_pairs() {
        let mut cs = InterruptFree::new();
        cs.enter();
        assert!(cs.is_held());
        // Re-entering while held does not acquire twice
        cs.enter();
        cs.exit();
        assert!(!cs.is_held());
        // Exit without enter is a no-op
        cs.exit();
        assert!(!cs.is_held());
    }

    #[test]
    fn test_interrupt_free_releases_on_drop() {
        let mut cs = InterruptFree::new();
        cs.enter();
        drop(cs);

        // The section is free again, so a fresh one can be taken
        let mut again = InterruptFree::new();
        again.enter();
        again.exit();
    }

    #[test]
    fn test_counting_section() {
        let mut cs = CountingSection::default();
        cs.enter();
        cs.exit();
        assert_eq!((cs.enters, cs.exits, cs.depth, cs.max_depth), (1, 1, 0, 1));
    }
}
