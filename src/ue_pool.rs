//! UE Address Pool
//!
//! IPv4 address allocation for PDU sessions out of the configured UE subnet.
//! The cursor is an atomic, so concurrent session setup paths can allocate
//! without a lock. Addresses are handed out monotonically from the subnet
//! base and never reclaimed; running past the last-octet boundary or the
//! subnet end is an allocation error, not a wrap.

#![allow(dead_code)]

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU32, Ordering};

use thiserror::Error;

/// UE address pool errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("invalid UE subnet [{0}]: expected a.b.c.d/prefix")]
    InvalidSubnet(String),

    #[error("UE address pool exhausted")]
    Exhausted,

    #[error("no usable UE subnet configured")]
    Unavailable,
}

/// An IPv4 subnet in CIDR notation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UeSubnet {
    base: Ipv4Addr,
    prefix_len: u8,
}

impl UeSubnet {
    /// Parse "a.b.c.d/prefix". The base is masked down to the network
    /// address.
    pub fn parse(s: &str) -> Result<Self, PoolError> {
        let (addr_part, len_part) = s
            .split_once('/')
            .ok_or_else(|| PoolError::InvalidSubnet(s.to_string()))?;
        let addr: Ipv4Addr = addr_part
            .trim()
            .parse()
            .map_err(|_| PoolError::InvalidSubnet(s.to_string()))?;
        let prefix_len: u8 = len_part
            .trim()
            .parse()
            .map_err(|_| PoolError::InvalidSubnet(s.to_string()))?;
        if prefix_len > 32 {
            return Err(PoolError::InvalidSubnet(s.to_string()));
        }
        let base = Ipv4Addr::from(u32::from(addr) & Self::mask_for(prefix_len));
        Ok(Self { base, prefix_len })
    }

    fn mask_for(prefix_len: u8) -> u32 {
        if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - prefix_len)
        }
    }

    pub fn base(&self) -> Ipv4Addr {
        self.base
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn mask(&self) -> u32 {
        Self::mask_for(self.prefix_len)
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        (u32::from(addr) & self.mask()) == u32::from(self.base)
    }
}

impl std::str::FromStr for UeSubnet {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for UeSubnet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix_len)
    }
}

/// Monotonic UE address allocator over a subnet.
///
/// The first allocation returns the base address plus one; each subsequent
/// allocation increments the last octet by exactly one.
#[derive(Debug)]
pub struct UeIpPool {
    subnet: UeSubnet,
    cursor: AtomicU32,
}

impl UeIpPool {
    pub fn new(subnet: UeSubnet) -> Self {
        Self {
            subnet,
            cursor: AtomicU32::new(u32::from(subnet.base())),
        }
    }

    pub fn subnet(&self) -> &UeSubnet {
        &self.subnet
    }

    /// Allocate the next UE address.
    ///
    /// Fails with `Exhausted` once the increment would leave the subnet or
    /// carry past the last octet; the pool stays exhausted from then on.
    pub fn alloc(&self) -> Result<Ipv4Addr, PoolError> {
        let next = self.cursor.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        let addr = Ipv4Addr::from(next);
        let base = u32::from(self.subnet.base());
        if !self.subnet.contains(addr) || (next >> 8) != (base >> 8) {
            return Err(PoolError::Exhausted);
        }
        Ok(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subnet_parse() {
        let subnet = UeSubnet::parse("10.45.0.0/16").unwrap();
        assert_eq!(subnet.base(), Ipv4Addr::new(10, 45, 0, 0));
        assert_eq!(subnet.prefix_len(), 16);
        assert!(subnet.contains(Ipv4Addr::new(10, 45, 200, 7)));
        assert!(!subnet.contains(Ipv4Addr::new(10, 46, 0, 1)));
    }

    #[test]
    fn test_subnet_parse_masks_host_bits() {
        let subnet = UeSubnet::parse("10.45.0.77/24").unwrap();
        assert_eq!(subnet.base(), Ipv4Addr::new(10, 45, 0, 0));
    }

    #[test]
    fn test_subnet_parse_rejects_malformed() {
        assert!(UeSubnet::parse("10.45.0.0").is_err());
        assert!(UeSubnet::parse("10.45.0/16").is_err());
        assert!(UeSubnet::parse("10.45.0.0/33").is_err());
        assert!(UeSubnet::parse("not-a-subnet/8").is_err());
        assert!(UeSubnet::parse("10.45.0.0/sixteen").is_err());
    }

    #[test]
    fn test_alloc_sequence() {
        let pool = UeIpPool::new(UeSubnet::parse("10.45.0.0/16").unwrap());
        for n in 1..=10u8 {
            assert_eq!(pool.alloc().unwrap(), Ipv4Addr::new(10, 45, 0, n));
        }
    }

    #[test]
    fn test_alloc_exhausts_at_last_octet_boundary() {
        let pool = UeIpPool::new(UeSubnet::parse("10.45.0.0/16").unwrap());
        for _ in 1..=255 {
            pool.alloc().unwrap();
        }
        assert_eq!(pool.alloc(), Err(PoolError::Exhausted));
        // stays exhausted, never wraps into the next octet
        assert_eq!(pool.alloc(), Err(PoolError::Exhausted));
    }

    #[test]
    fn test_alloc_exhausts_small_subnet() {
        let pool = UeIpPool::new(UeSubnet::parse("10.45.0.0/30").unwrap());
        assert_eq!(pool.alloc().unwrap(), Ipv4Addr::new(10, 45, 0, 1));
        assert_eq!(pool.alloc().unwrap(), Ipv4Addr::new(10, 45, 0, 2));
        assert_eq!(pool.alloc().unwrap(), Ipv4Addr::new(10, 45, 0, 3));
        assert_eq!(pool.alloc(), Err(PoolError::Exhausted));
    }

    #[test]
    fn test_alloc_concurrent_unique() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let pool = Arc::new(UeIpPool::new(UeSubnet::parse("10.45.0.0/16").unwrap()));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let pool = pool.clone();
            handles.push(std::thread::spawn(move || {
                let mut got = Vec::new();
                for _ in 0..50 {
                    got.push(pool.alloc().unwrap());
                }
                got
            }));
        }

        let mut all = HashSet::new();
        for handle in handles {
            for addr in handle.join().unwrap() {
                assert!(all.insert(addr), "address {} issued twice", addr);
            }
        }
        assert_eq!(all.len(), 200);
    }
}
