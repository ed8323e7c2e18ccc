//! Identifiers and a simple allocator for runtime-created entities.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlacementId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AmbientId(pub u32);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    #[error("placement ids exhausted")]
    PlacementsExhausted,
    #[error("ambient ids exhausted")]
    AmbientExhausted,
}

/// Monotonic allocator for placement and ambient ids. Ids are never reused within a
/// page lifetime: once a counter has handed out `u32::MAX` further allocations fail.
#[derive(Debug)]
pub struct IdAllocator {
    next_placement: Option<u32>,
    next_ambient: Option<u32>,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next_placement: Some(0),
            next_ambient: Some(0),
        }
    }
}

fn take(next: &mut Option<u32>, exhausted: IdError) -> Result<u32, IdError> {
    let id = next.ok_or(exhausted)?;
    *next = id.checked_add(1);
    Ok(id)
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_placement(&mut self) -> Result<PlacementId, IdError> {
        take(&mut self.next_placement, IdError::PlacementsExhausted).map(PlacementId)
    }

    #[inline]
    pub fn alloc_ambient(&mut self) -> Result<AmbientId, IdError> {
        take(&mut self.next_ambient, IdError::AmbientExhausted).map(AmbientId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_placement(), Ok(PlacementId(0)));
        assert_eq!(alloc.alloc_placement(), Ok(PlacementId(1)));
        assert_eq!(alloc.alloc_ambient(), Ok(AmbientId(0)));
        assert_eq!(alloc.alloc_ambient(), Ok(AmbientId(1)));
    }

    #[test]
    fn last_id_is_handed_out_once() {
        let mut alloc = IdAllocator {
            next_placement: Some(u32::MAX - 1),
            next_ambient: Some(u32::MAX),
        };
        assert_eq!(alloc.alloc_ambient(), Ok(AmbientId(u32::MAX)));
        assert_eq!(alloc.alloc_ambient(), Err(IdError::AmbientExhausted));
        assert_eq!(alloc.alloc_ambient(), Err(IdError::AmbientExhausted));

        assert_eq!(alloc.alloc_placement(), Ok(PlacementId(u32::MAX - 1)));
        assert_eq!(alloc.alloc_placement(), Ok(PlacementId(u32::MAX)));
        assert_eq!(alloc.alloc_placement(), Err(IdError::PlacementsExhausted));
    }
}
