//! Simulator Timer Management
//!
//! T3/N3 retransmission settings, the dead-call grace period, and the
//! per-session wake-up table the scheduler scans each loop iteration.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::SimConfig;
use crate::context::SessionId;

// ============================================================================
// Timer Configuration
// ============================================================================

/// Timer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerConfig {
    /// Maximum retry count
    pub max_count: u32,
    /// Timer duration
    pub duration: Duration,
}

impl TimerConfig {
    pub fn new(max_count: u32, duration: Duration) -> Self {
        Self {
            max_count,
            duration,
        }
    }
}

/// Simulator timer configurations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimTimerConfigs {
    /// T3 duration, N3 as max_count
    pub t3_response: TimerConfig,
    pub dead_call: TimerConfig,
}

impl SimTimerConfigs {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            t3_response: TimerConfig::new(config.n3, config.t3()),
            dead_call: TimerConfig::new(0, config.dead_call()),
        }
    }
}

// ============================================================================
// Timer Manager
// ============================================================================

/// Wake-up instants of paused sessions
#[derive(Debug, Default)]
pub struct TimerManager {
    expiration_times: HashMap<SessionId, Instant>,
}

impl TimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the wake-up of a session
    pub fn start(&mut self, session: SessionId, expiration: Instant) {
        self.expiration_times.insert(session, expiration);
    }

    pub fn stop(&mut self, session: SessionId) {
        self.expiration_times.remove(&session);
    }

    /// Remove and return every session whose wake-up is due, oldest session
    /// first
    pub fn check_expired(&mut self, now: Instant) -> Vec<SessionId> {
        let mut expired = Vec::new();

        self.expiration_times.retain(|session, expiration| {
            if now >= *expiration {
                expired.push(*session);
                false
            } else {
                true
            }
        });

        expired.sort_unstable();
        expired
    }

}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_configs_from_config() {
        let config = SimConfig {
            t3_ms: 1000,
            n3: 3,
            dead_call_ms: 500,
            ..Default::default()
        };
        let configs = SimTimerConfigs::from_config(&config);
        assert_eq!(configs.t3_response.max_count, 3);
        assert_eq!(configs.t3_response.duration, Duration::from_secs(1));
        assert_eq!(configs.dead_call.duration, Duration::from_millis(500));
    }

    #[test]
    fn test_check_expired_in_session_order() {
        let mut manager = TimerManager::new();
        let now = Instant::now();
        manager.start(3, now);
        manager.start(1, now - Duration::from_millis(1));
        manager.start(2, now + Duration::from_secs(1));

        assert_eq!(manager.check_expired(now), vec![1, 3]);
        assert!(manager.check_expired(now).is_empty());
        assert_eq!(manager.check_expired(now + Duration::from_secs(1)), vec![2]);
    }

    #[test]
    fn test_restart_replaces_expiration() {
        let mut manager = TimerManager::new();
        let now = Instant::now();
        manager.start(1, now);
        manager.start(1, now + Duration::from_secs(5));
        assert!(manager.check_expired(now).is_empty());
        assert_eq!(manager.check_expired(now + Duration::from_secs(5)), vec![1]);

        manager.start(2, now);
        manager.stop(2);
        assert!(manager.check_expired(now + Duration::from_secs(10)).is_empty());
    }
}
