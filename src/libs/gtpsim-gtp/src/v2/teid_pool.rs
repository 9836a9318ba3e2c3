//! TEID Pool
//!
//! Monotonic allocator of Tunnel Endpoint Identifiers. The simulator keeps
//! one pool for control-plane TEIDs and an independent one for user-plane
//! TEIDs.

use crate::error::{GtpError, GtpResult};

/// TEID Pool for allocating unique TEIDs
#[derive(Debug, Clone)]
pub struct TeidPool {
    /// Next TEID to hand out
    next: u32,
    /// Starting TEID value
    base: u32,
    /// Maximum TEID value (exclusive)
    max: u32,
    /// Set once the counter wrapped back to `base`
    wrapped: bool,
}

impl TeidPool {
    /// Create a new TEID pool with default range (1..0xFFFFFFFF)
    pub fn new() -> Self {
        Self {
            next: 1,
            base: 1,
            max: u32::MAX,
            wrapped: false,
        }
    }

    /// Create a new TEID pool with custom range
    pub fn with_range(base: u32, max: u32) -> GtpResult<Self> {
        if base == 0 {
            return Err(GtpError::ResourceExhausted(
                "TEID base must be greater than 0".to_string(),
            ));
        }
        if base >= max {
            return Err(GtpError::ResourceExhausted(
                "TEID base must be less than max".to_string(),
            ));
        }
        Ok(Self {
            next: base,
            base,
            max,
            wrapped: false,
        })
    }

    /// Allocate a new TEID.
    ///
    /// TEID 0 is never returned; after `max` the counter wraps to `base`.
    pub fn allocate(&mut self) -> GtpResult<u32> {
        if self.next >= self.max {
            if self.base >= self.max {
                return Err(GtpError::ResourceExhausted("TEID pool exhausted".to_string()));
            }
            log::debug!("TEID pool wrapped at {:#x}", self.max);
            self.next = self.base;
            self.wrapped = true;
        }
        let teid = self.next;
        self.next += 1;
        Ok(teid)
    }

    /// Get the next TEID that will be allocated (without allocating it)
    pub fn peek_next(&self) -> u32 {
        self.next
    }

    pub fn has_wrapped(&self) -> bool {
        self.wrapped
    }
}

impl Default for TeidPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teid_pool_allocation() {
        let mut pool = TeidPool::new();
        assert_eq!(pool.allocate().unwrap(), 1);
        assert_eq!(pool.allocate().unwrap(), 2);
        assert_eq!(pool.allocate().unwrap(), 3);
        assert_eq!(pool.peek_next(), 4);
    }

    #[test]
    fn test_teid_pool_custom_range() {
        let mut pool = TeidPool::with_range(1000, 2000).unwrap();
        assert_eq!(pool.allocate().unwrap(), 1000);
        assert_eq!(pool.allocate().unwrap(), 1001);
    }

    #[test]
    fn test_teid_pool_wrap_around() {
        let mut pool = TeidPool::with_range(1, 4).unwrap();
        let teids: Vec<u32> = (0..5).map(|_| pool.allocate().unwrap()).collect();
        assert_eq!(teids, vec![1, 2, 3, 1, 2]);
        assert!(pool.has_wrapped());
    }

    #[test]
    fn test_teid_pool_invalid_range() {
        assert!(TeidPool::with_range(0, 10).is_err());
        assert!(TeidPool::with_range(10, 10).is_err());
    }

    #[test]
    fn test_independent_pools() {
        let mut control = TeidPool::new();
        let mut user = TeidPool::new();
        assert_eq!(control.allocate().unwrap(), 1);
        assert_eq!(control.allocate().unwrap(), 2);
        assert_eq!(user.allocate().unwrap(), 1);
    }
}
