//! Newtype for canonical class indices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The position of a normalized class name in the unified vocabulary.
///
/// Indices are 0-based and contiguous, so they double as YOLO class ids.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassIndex(pub u32);

impl ClassIndex {
    #[inline]
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for ClassIndex {
    fn from(index: u32) -> Self {
        ClassIndex(index)
    }
}

impl fmt::Debug for ClassIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassIndex({})", self.0)
    }
}

impl fmt::Display for ClassIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_index_orders_numerically() {
        assert!(ClassIndex(2) < ClassIndex(10));
        assert_eq!(ClassIndex::from(7).as_usize(), 7);
    }

    #[test]
    fn class_index_serializes_transparently() {
        let json = serde_json::to_string(&vec![ClassIndex(0), ClassIndex(4)]).unwrap();
        assert_eq!(json, "[0,4]");
    }
}
