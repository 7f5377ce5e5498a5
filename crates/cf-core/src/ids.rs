//! Arena handles for components and ports.

use std::fmt;
use std::num::NonZeroU32;

/// Handle to a slot in one of the circuit's arenas.
///
/// Stored as slot + 1 so that `Option<Id>`, the source every input carries,
/// is no larger than `Id`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Handle for arena slot `slot`. Slots beyond the `u32` range all map to
    /// the last handle.
    pub fn for_slot(slot: usize) -> Self {
        let raw = u32::try_from(slot).unwrap_or(u32::MAX);
        Self(NonZeroU32::MIN.saturating_add(raw))
    }

    /// Position in the arena.
    pub fn slot(self) -> usize {
        self.index() as usize
    }

    /// Position as reported in errors.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

pub type CompId = Id;
pub type InputId = Id;
pub type OutputId = Id;
