//! Logical pin maps
//!
//! A board header position maps to an index into the chip's descriptor
//! table, or to nothing (power, ground and other non-GPIO pins).

/// Board pin index -> descriptor table index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalPinMap {
    entries: Vec<Option<usize>>,
}

impl LogicalPinMap {
    pub fn new(entries: Vec<Option<usize>>) -> Self {
        Self { entries }
    }

    /// Build a map from a signed table where negative values mean "no pin"
    pub fn from_signed(entries: &[i32]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|&e| usize::try_from(e).ok())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `None` if `pin` is out of range, `Some(None)` if the position is unused
    pub fn get(&self, pin: usize) -> Option<Option<usize>> {
        self.entries.get(pin).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<usize>)> + '_ {
        self.entries.iter().copied().enumerate()
    }

    /// Number of positions backed by a GPIO
    pub fn connected(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}

impl From<Vec<Option<usize>>> for LogicalPinMap {
    fn from(entries: Vec<Option<usize>>) -> Self {
        Self::new(entries)
    }
}
