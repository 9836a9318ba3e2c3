//! Tunnel and PDN Registry
//!
//! Control tunnels live in one table keyed by local TEID and are shared by
//! handle. On S11/S4 every PDN of a session rides the same control tunnel,
//! so a tunnel carries a reference count equal to the number of PDNs holding
//! its handle and is freed by the release that brings it to zero.
//!
//! PDNs and bearers are plain values owned by their session; each PDN owns
//! its bearers.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;

use gtpsim_gtp::v2::TeidPool;
use gtpsim_gtp::GtpResult;

use crate::context::SessionId;

// ============================================================================
// Control tunnels
// ============================================================================

/// Shared handle to a control tunnel (its local TEID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlHandle(u32);

impl ControlHandle {
    pub fn local_teid(&self) -> u32 {
        self.0
    }
}

/// A GTP-C TEID pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlTunnel {
    pub local_teid: u32,
    /// Learned from the peer's sender F-TEID, 0 until then
    pub remote_teid: u32,
    pub local: SocketAddr,
    pub peer: SocketAddr,
    /// Session the tunnel belongs to
    pub owner: SessionId,
    refcount: usize,
}

impl ControlTunnel {
    pub fn refcount(&self) -> usize {
        self.refcount
    }
}

// ============================================================================
// User tunnels, bearers, PDNs
// ============================================================================

/// A GTP-U TEID pair; identifiers only, no data path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserTunnel {
    pub local_teid: u32,
    pub remote_teid: u32,
}

/// One EPS bearer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bearer {
    pub ebi: u8,
    pub user: UserTunnel,
}

/// One PDN connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdn {
    pub control: ControlHandle,
    pub bearers: BTreeMap<u8, Bearer>,
}

impl Pdn {
    pub fn new(control: ControlHandle) -> Self {
        Self {
            control,
            bearers: BTreeMap::new(),
        }
    }

    /// Bit n set for every bearer with EBI n
    pub fn bearer_mask(&self) -> u16 {
        self.bearers
            .keys()
            .fold(0u16, |mask, &ebi| mask | (1u16 << (ebi & 0x0F)))
    }

    pub fn bearer(&self, ebi: u8) -> Option<&Bearer> {
        self.bearers.get(&ebi)
    }

    pub fn bearer_mut(&mut self, ebi: u8) -> Option<&mut Bearer> {
        self.bearers.get_mut(&ebi)
    }

    pub fn remove_bearer(&mut self, ebi: u8) -> Option<Bearer> {
        let removed = self.bearers.remove(&ebi);
        if removed.is_some() {
            log::debug!("[Removed] Bearer (ebi={ebi})");
        }
        removed
    }
}

// ============================================================================
// Registry
// ============================================================================

/// TEID allocation and control-tunnel sharing
#[derive(Debug)]
pub struct TunnelRegistry {
    control_pool: TeidPool,
    user_pool: TeidPool,
    tunnels: HashMap<u32, ControlTunnel>,
    /// One control tunnel serves all PDNs of a session
    shared: bool,
}

impl TunnelRegistry {
    pub fn new(shared: bool) -> Self {
        Self {
            control_pool: TeidPool::new(),
            user_pool: TeidPool::new(),
            tunnels: HashMap::new(),
            shared,
        }
    }

    /// Control tunnel for a new PDN of `owner`.
    ///
    /// With sharing enabled and `existing` naming a live tunnel, that tunnel
    /// gains a reference instead of a new one being allocated.
    pub fn allocate_control_tunnel(
        &mut self,
        owner: SessionId,
        existing: Option<ControlHandle>,
        local: SocketAddr,
        peer: SocketAddr,
    ) -> GtpResult<ControlHandle> {
        if self.shared {
            if let Some(tunnel) = existing.and_then(|h| self.tunnels.get_mut(&h.0)) {
                tunnel.refcount += 1;
                log::debug!(
                    "[Shared] Control tunnel (teid={:#x}, refcount={})",
                    tunnel.local_teid,
                    tunnel.refcount
                );
                return Ok(ControlHandle(tunnel.local_teid));
            }
        }

        let local_teid = self.next_control_teid()?;
        self.tunnels.insert(
            local_teid,
            ControlTunnel {
                local_teid,
                remote_teid: 0,
                local,
                peer,
                owner,
                refcount: 1,
            },
        );
        log::debug!("[Added] Control tunnel (teid={local_teid:#x}, session={owner})");
        Ok(ControlHandle(local_teid))
    }

    /// Skip TEIDs still held after the counter wrapped
    fn next_control_teid(&mut self) -> GtpResult<u32> {
        loop {
            let teid = self.control_pool.allocate()?;
            if !self.tunnels.contains_key(&teid) {
                return Ok(teid);
            }
        }
    }

    /// Drop one reference; returns true when the tunnel was freed
    pub fn release(&mut self, handle: ControlHandle) -> bool {
        let Some(tunnel) = self.tunnels.get_mut(&handle.0) else {
            log::warn!("Release of unknown control tunnel {:#x}", handle.0);
            return false;
        };
        tunnel.refcount = tunnel.refcount.saturating_sub(1);
        if tunnel.refcount > 0 {
            return false;
        }
        self.tunnels.remove(&handle.0);
        log::debug!("[Removed] Control tunnel (teid={:#x})", handle.0);
        true
    }

    pub fn allocate_user_tunnel(&mut self) -> GtpResult<UserTunnel> {
        Ok(UserTunnel {
            local_teid: self.user_pool.allocate()?,
            remote_teid: 0,
        })
    }

    /// New bearer with a fresh user-plane TEID
    pub fn create_bearer(&mut self, ebi: u8) -> GtpResult<Bearer> {
        let user = self.allocate_user_tunnel()?;
        log::debug!("[Added] Bearer (ebi={ebi}, teid={:#x})", user.local_teid);
        Ok(Bearer { ebi, user })
    }

    pub fn get(&self, handle: ControlHandle) -> Option<&ControlTunnel> {
        self.tunnels.get(&handle.0)
    }

    pub fn get_mut(&mut self, handle: ControlHandle) -> Option<&mut ControlTunnel> {
        self.tunnels.get_mut(&handle.0)
    }

    /// Session owning the control tunnel with this local TEID
    pub fn owner_of(&self, local_teid: u32) -> Option<SessionId> {
        self.tunnels.get(&local_teid).map(|t| t.owner)
    }

    pub fn control_tunnel_count(&self) -> usize {
        self.tunnels.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_shared_control_tunnel_refcount() {
        let mut registry = TunnelRegistry::new(true);
        let first = registry
            .allocate_control_tunnel(1, None, addr(2123), addr(2124))
            .unwrap();
        let second = registry
            .allocate_control_tunnel(1, Some(first), addr(2123), addr(2124))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.get(first).unwrap().refcount(), 2);
        assert_eq!(registry.control_tunnel_count(), 1);

        assert!(!registry.release(first));
        assert_eq!(registry.get(first).unwrap().refcount(), 1);
        assert!(registry.release(second));
        assert!(registry.get(first).is_none());
        assert_eq!(registry.owner_of(first.local_teid()), None);
    }

    #[test]
    fn test_unshared_allocates_per_pdn() {
        let mut registry = TunnelRegistry::new(false);
        let first = registry
            .allocate_control_tunnel(7, None, addr(2123), addr(2124))
            .unwrap();
        let second = registry
            .allocate_control_tunnel(7, Some(first), addr(2123), addr(2124))
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(registry.control_tunnel_count(), 2);
        assert_eq!(registry.owner_of(second.local_teid()), Some(7));
        assert!(registry.release(first));
        assert!(registry.release(second));
    }

    #[test]
    fn test_release_unknown_handle() {
        let mut registry = TunnelRegistry::new(true);
        assert!(!registry.release(ControlHandle(99)));
    }

    #[test]
    fn test_independent_teid_counters() {
        let mut registry = TunnelRegistry::new(true);
        let control = registry
            .allocate_control_tunnel(1, None, addr(1), addr(2))
            .unwrap();
        let bearer = registry.create_bearer(5).unwrap();
        assert_eq!(control.local_teid(), 1);
        assert_eq!(bearer.user.local_teid, 1);
        assert_eq!(registry.create_bearer(6).unwrap().user.local_teid, 2);
    }

    #[test]
    fn test_pdn_bearer_mask() {
        let mut registry = TunnelRegistry::new(true);
        let handle = registry
            .allocate_control_tunnel(1, None, addr(1), addr(2))
            .unwrap();
        let mut pdn = Pdn::new(handle);
        for ebi in [5, 6, 9] {
            let bearer = registry.create_bearer(ebi).unwrap();
            pdn.bearers.insert(ebi, bearer);
        }
        assert_eq!(pdn.bearer_mask(), (1 << 5) | (1 << 6) | (1 << 9));
        assert!(pdn.remove_bearer(6).is_some());
        assert!(pdn.remove_bearer(6).is_none());
        assert_eq!(pdn.bearer_mask(), (1 << 5) | (1 << 9));
        assert!(pdn.bearer(5).is_some());
    }
}
