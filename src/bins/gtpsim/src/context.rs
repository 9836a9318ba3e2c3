//! Simulator Context
//!
//! Owns every session together with the registries they share, generates
//! client traffic, routes inbound datagrams to their session and runs
//! sessions whose wake-up time has come.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::time::Instant;

use bytes::Bytes;
use gtpsim_gtp::v2::{message_name, Gtp2Message, Gtp2MessageType};

use crate::config::{ConfigError, SimConfig};
use crate::event::SimEvent;
use crate::gtp_path::{ConnId, Transport};
use crate::scenario::Scenario;
use crate::sequence::PeerSequenceRegistry;
use crate::session::{SessionContext, SessionState, UeSession};
use crate::stats::SimStats;
use crate::timer::{SimTimerConfigs, TimerManager};
use crate::tunnel::TunnelRegistry;

/// Session identifier, increasing in creation order
pub type SessionId = u64;

/// Transaction key: peer and sequence number of an exchange
type TransactionKey = (SocketAddr, u32);

// ============================================================================
// Simulator
// ============================================================================

pub struct Simulator<T: Transport> {
    config: SimConfig,
    scenario: Scenario,
    timer_configs: SimTimerConfigs,
    transport: T,
    /// Connection new client sessions send on
    conn: ConnId,
    local: SocketAddr,

    sequences: PeerSequenceRegistry,
    tunnels: TunnelRegistry,
    stats: SimStats,

    // Session list, iterated in creation order
    sessions: BTreeMap<SessionId, UeSession>,
    timers: TimerManager,

    // Lookup tables
    /// IMSI -> session
    imsi_index: HashMap<String, SessionId>,
    /// (peer, sequence) -> session
    transactions: HashMap<TransactionKey, SessionId>,
    /// Keys each session currently holds in `transactions`
    session_keys: HashMap<SessionId, Vec<TransactionKey>>,

    next_session_id: SessionId,
    /// Client sessions generated so far
    generated: u64,
    imsi_base: u64,
    imsi_width: usize,
    started: Option<Instant>,
}

impl<T: Transport> Simulator<T> {
    /// Build a simulator around an already bound transport
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: SimConfig, scenario: Scenario, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        let imsi_base = config.imsi_start_value()?;
        let imsi_width = config.imsi_start.len();
        let local = transport.local_addr(0).unwrap_or(config.local_addr);
        let shared = config.interface.shares_control_tunnel();

        log::info!(
            "Simulator ready: scenario '{}' ({} jobs, {} procedures), {} interface, peer {}",
            scenario.name,
            scenario.jobs.len(),
            scenario.procedures.len(),
            config.interface.name(),
            config.remote_addr
        );

        Ok(Self {
            timer_configs: SimTimerConfigs::from_config(&config),
            stats: SimStats::new(scenario.jobs.len()),
            config,
            scenario,
            transport,
            conn: 0,
            local,
            sequences: PeerSequenceRegistry::new(),
            tunnels: TunnelRegistry::new(shared),
            sessions: BTreeMap::new(),
            timers: TimerManager::new(),
            imsi_index: HashMap::new(),
            transactions: HashMap::new(),
            session_keys: HashMap::new(),
            next_session_id: 1,
            generated: 0,
            imsi_base,
            imsi_width,
            started: None,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn session(&self, id: SessionId) -> Option<&UeSession> {
        self.sessions.get(&id)
    }

    pub fn session_by_imsi(&self, imsi: &str) -> Option<&UeSession> {
        self.imsi_index.get(imsi).and_then(|id| self.sessions.get(id))
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn control_tunnel_count(&self) -> usize {
        self.tunnels.control_tunnel_count()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// All configured sessions were generated and none is left
    pub fn finished(&self) -> bool {
        self.config.max_sessions > 0
            && self.stats.created >= self.config.max_sessions
            && self.sessions.is_empty()
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    /// Generate due client sessions, then run every session whose wake-up
    /// time has come
    pub fn tick(&mut self, now: Instant) {
        self.generate_traffic(now);

        for id in self.timers.check_expired(now) {
            self.run_session(id, now, SimEvent::tick());
        }
    }

    fn generate_traffic(&mut self, now: Instant) {
        if !self.scenario.is_client() {
            return;
        }
        let started = *self.started.get_or_insert(now);
        let elapsed = now.saturating_duration_since(started).as_secs_f64();

        let mut due = (elapsed * self.config.rate).floor() as u64 + 1;
        if self.config.max_sessions > 0 {
            due = due.min(self.config.max_sessions);
        }

        while self.generated < due {
            if self.config.max_concurrent > 0 && self.sessions.len() >= self.config.max_concurrent {
                break;
            }
            let imsi = self.imsi_for(self.generated);
            self.generated += 1;
            let peer = self.config.remote_addr;
            let id = self.add_session(imsi, self.conn, peer);
            self.with_session(id, |session, ctx| session.start(ctx, now));
            self.sync_session(id);
        }
    }

    fn imsi_for(&self, n: u64) -> String {
        format!("{:0width$}", self.imsi_base + n, width = self.imsi_width)
    }

    fn add_session(&mut self, imsi: String, conn: ConnId, peer: SocketAddr) -> SessionId {
        let id = self.next_session_id;
        self.next_session_id += 1;
        self.stats.created += 1;
        self.stats.active += 1;

        log::debug!("[Added] Session {} IMSI[{}] peer {}", id, imsi, peer);
        self.imsi_index.insert(imsi.clone(), id);
        self.sessions.insert(id, UeSession::new(id, imsi, conn, peer));
        id
    }

    /// Run `f` against a session and the shared state it needs
    fn with_session<R>(
        &mut self,
        id: SessionId,
        f: impl FnOnce(&mut UeSession, &mut SessionContext<'_>) -> R,
    ) -> Option<R> {
        let session = self.sessions.get_mut(&id)?;
        let mut ctx = SessionContext {
            scenario: &self.scenario,
            timers: &self.timer_configs,
            sequences: &mut self.sequences,
            tunnels: &mut self.tunnels,
            stats: &mut self.stats,
            transport: &mut self.transport,
            local: self.local,
        };
        Some(f(session, &mut ctx))
    }

    fn run_session(&mut self, id: SessionId, now: Instant, event: SimEvent) {
        self.with_session(id, |session, ctx| session.run(ctx, now, event));
        self.sync_session(id);
    }

    /// Bring the wake-up table and lookup tables in line with the session,
    /// removing it once it is done
    fn sync_session(&mut self, id: SessionId) {
        let Some(session) = self.sessions.get(&id) else {
            return;
        };

        for key in self.session_keys.remove(&id).unwrap_or_default() {
            if self.transactions.get(&key) == Some(&id) {
                self.transactions.remove(&key);
            }
        }

        if session.is_done() {
            self.timers.stop(id);
            if self.imsi_index.get(session.imsi()) == Some(&id) {
                self.imsi_index.remove(session.imsi());
            }
            log::debug!("[Removed] Session {} IMSI[{}]", id, session.imsi());
            self.sessions.remove(&id);
            return;
        }

        match session.wake_at() {
            Some(wake) => self.timers.start(id, wake),
            None => self.timers.stop(id),
        }
        let keys = session.transaction_keys();
        for key in &keys {
            self.transactions.insert(*key, id);
        }
        self.session_keys.insert(id, keys);
    }

    /// Tear down every session immediately
    pub fn abort_all(&mut self) {
        let ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        if !ids.is_empty() {
            log::info!("Aborting {} sessions", ids.len());
        }
        for id in ids {
            self.with_session(id, |session, ctx| session.abort(ctx));
            self.sync_session(id);
        }
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Read and dispatch up to `batch` pending datagrams
    pub fn poll_network(&mut self, now: Instant, batch: usize) {
        for _ in 0..batch {
            match self.transport.poll() {
                Ok(Some((conn, peer, data))) => self.dispatch(now, conn, peer, data),
                Ok(None) => break,
                Err(e) => {
                    log::warn!("Receive failed: {}", e);
                    break;
                }
            }
        }
    }

    /// Route one inbound datagram
    pub fn dispatch(&mut self, now: Instant, conn: ConnId, peer: SocketAddr, data: Bytes) {
        let mut buf = data;
        let message = match Gtp2Message::decode(&mut buf) {
            Ok(message) => message,
            Err(e) => {
                self.stats.malformed += 1;
                log::warn!("Malformed GTPv2-C message from {}: {}", peer, e);
                return;
            }
        };

        let message_type = message.message_type();
        if message_type == Gtp2MessageType::EchoRequest as u8 {
            self.answer_echo(conn, peer, &message);
            return;
        }
        if message_type == Gtp2MessageType::EchoResponse as u8 {
            self.stats.echo_responses += 1;
            log::debug!("Echo Response from {}", peer);
            return;
        }

        if let Some(id) = self.find_session(peer, &message) {
            self.run_session(id, now, SimEvent::gtp_message(conn, peer, message));
            return;
        }

        if self.scenario.server_trigger() == Some(message_type) {
            self.retire_dead_call(&message);
            if self.accepts_server_session() {
                let imsi = match message.imsi() {
                    Some(imsi) if !imsi.is_empty() => imsi.to_string(),
                    _ => {
                        let imsi = self.imsi_for(self.generated);
                        self.generated += 1;
                        imsi
                    }
                };
                let id = self.add_session(imsi, conn, peer);
                self.with_session(id, |session, ctx| session.start(ctx, now));
                self.run_session(id, now, SimEvent::gtp_message(conn, peer, message));
                return;
            }
        }

        self.stats.unknown_session += 1;
        log::debug!(
            "No session for {} (teid={:#x}, seq={:#x}) from {}",
            message_name(message_type),
            message.teid(),
            message.sequence_number(),
            peer
        );
    }

    fn find_session(&self, peer: SocketAddr, message: &Gtp2Message) -> Option<SessionId> {
        let live = |id: &SessionId| self.sessions.contains_key(id);

        let teid = message.teid();
        if teid != 0 {
            if let Some(id) = self.tunnels.owner_of(teid).filter(live) {
                return Some(id);
            }
        }
        if let Some(id) = self
            .transactions
            .get(&(peer, message.sequence_number()))
            .copied()
            .filter(live)
        {
            return Some(id);
        }
        // A dead call answers duplicates only, and those matched above
        let fresh_trigger = self.scenario.server_trigger() == Some(message.message_type());
        message
            .imsi()
            .and_then(|imsi| self.imsi_index.get(imsi))
            .copied()
            .filter(live)
            .filter(|id| !(fresh_trigger && self.in_dead_call(*id)))
    }

    fn in_dead_call(&self, id: SessionId) -> bool {
        self.sessions
            .get(&id)
            .is_some_and(|session| session.state() == SessionState::DeadCall)
    }

    /// End the dead call holding the IMSI of a new server-role request
    fn retire_dead_call(&mut self, message: &Gtp2Message) {
        let Some(id) = message
            .imsi()
            .and_then(|imsi| self.imsi_index.get(imsi))
            .copied()
            .filter(|id| self.in_dead_call(*id))
        else {
            return;
        };
        log::debug!("Session {} replaced by a new {}", id, message_name(message.message_type()));
        self.with_session(id, |session, ctx| session.abort(ctx));
        self.sync_session(id);
    }

    fn accepts_server_session(&self) -> bool {
        if self.config.max_sessions > 0 && self.stats.created >= self.config.max_sessions {
            return false;
        }
        self.config.max_concurrent == 0 || self.sessions.len() < self.config.max_concurrent
    }

    fn answer_echo(&mut self, conn: ConnId, peer: SocketAddr, request: &Gtp2Message) {
        self.stats.echo_requests += 1;
        let response = Gtp2Message::echo_response(request.sequence_number(), self.config.recovery);
        match response.encode() {
            Ok(buf) => {
                if let Err(e) = self.transport.send_message(conn, peer, &buf) {
                    log::warn!("Echo Response to {} failed: {}", peer, e);
                } else {
                    log::debug!("Echo Response to {} (seq={:#x})", peer, request.sequence_number());
                }
            }
            Err(e) => log::error!("Cannot encode Echo Response: {}", e),
        }
    }

    /// Sessions per state, for reporting
    pub fn state_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for session in self.sessions.values() {
            let name = match session.state() {
                SessionState::Sending => "sending",
                SessionState::AwaitingResponse => "awaiting",
                SessionState::Waiting => "waiting",
                SessionState::DeadCall => "dead_call",
                SessionState::Done => "done",
            };
            *counts.entry(name).or_insert(0) += 1;
        }
        counts
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtp_path::MockTransport;
    use crate::session::SessionOutcome;
    use gtpsim_gtp::v2::{CauseIe, FTeidIe, Gtp2Header, Gtp2IeType, IeKind, InformationElement};
    use std::net::Ipv4Addr;
    use std::time::Duration;

    const CLIENT: &str = r#"
name: attach-detach
jobs:
  - kind: send
    message: create_session_request
    ies:
      - { type: imsi }
      - { type: f_teid, params: { interface_type: 10, ipv4: 127.0.0.1 } }
      - type: bearer_context
        ies:
          - { type: ebi, params: { value: 5 } }
          - { type: f_teid, params: { interface_type: 0, ipv4: 127.0.0.1 } }
  - kind: recv
    message: create_session_response
  - kind: send
    message: delete_session_request
    ies:
      - { type: ebi, params: { value: 5 } }
  - kind: recv
    message: delete_session_response
"#;

    const SERVER: &str = r#"
name: answer-attach
jobs:
  - kind: recv
    message: create_session_request
  - kind: send
    message: create_session_response
    ies:
      - { type: cause, params: { value: 16 } }
      - { type: f_teid, params: { interface_type: 11 } }
"#;

    fn local() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 2123))
    }

    fn remote() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 2], 2123))
    }

    fn config(max_sessions: u64) -> SimConfig {
        SimConfig {
            local_addr: local(),
            remote_addr: remote(),
            t3_ms: 1000,
            n3: 3,
            dead_call_ms: 2000,
            rate: 10.0,
            max_sessions,
            ..Default::default()
        }
    }

    fn simulator(yaml: &str, max_sessions: u64) -> Simulator<MockTransport> {
        let _ = env_logger::try_init();
        let scenario = Scenario::from_yaml(yaml).unwrap();
        Simulator::new(config(max_sessions), scenario, MockTransport::new(local())).unwrap()
    }

    fn sent(sim: &mut Simulator<MockTransport>) -> Vec<Gtp2Message> {
        sim.transport_mut()
            .take_sent()
            .into_iter()
            .map(|(_, _, data)| Gtp2Message::decode(&mut data.clone()).unwrap())
            .collect()
    }

    fn deliver(sim: &mut Simulator<MockTransport>, now: Instant, message: &Gtp2Message) {
        let data = message.encode().unwrap().freeze();
        sim.dispatch(now, 0, remote(), data);
    }

    fn create_session_response(teid: u32, sequence: u32) -> Gtp2Message {
        let mut message = Gtp2Message::new(Gtp2Header::new(33, teid, sequence));
        message.add_ie(InformationElement::new(0, IeKind::Cause(CauseIe::new(16))));
        message.add_ie(InformationElement::new(
            0,
            IeKind::FTeid(FTeidIe::ipv4(11, 0x7000, Ipv4Addr::new(127, 0, 0, 2))),
        ));
        message
    }

    fn sender_teid(message: &Gtp2Message) -> u32 {
        message
            .get_ie(Gtp2IeType::FTeid, 0, 0)
            .and_then(InformationElement::as_fteid)
            .map(|f| f.teid)
            .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let scenario = Scenario::from_yaml(CLIENT).unwrap();
        let bad = SimConfig {
            imsi_start: "12".to_string(),
            ..config(1)
        };
        assert!(Simulator::new(bad, scenario, MockTransport::new(local())).is_err());
    }

    #[test]
    fn test_traffic_rate_and_limit() {
        let mut sim = simulator(CLIENT, 3);
        let t0 = Instant::now();

        sim.tick(t0);
        assert_eq!(sim.stats().created, 1);
        assert_eq!(sent(&mut sim).len(), 1);

        sim.tick(t0 + Duration::from_millis(50));
        assert_eq!(sim.stats().created, 1);

        sim.tick(t0 + Duration::from_millis(100));
        assert_eq!(sim.stats().created, 2);
        sim.tick(t0 + Duration::from_millis(200));
        assert_eq!(sim.stats().created, 3);

        let imsis: Vec<String> = sent(&mut sim)
            .iter()
            .filter_map(|m| m.imsi().map(str::to_string))
            .collect();
        assert_eq!(imsis, vec!["001010000000002", "001010000000003"]);
        assert!(sim.session_by_imsi("001010000000001").is_some());

        sim.tick(t0 + Duration::from_secs(10));
        assert_eq!(sim.stats().created, 3);
        assert!(!sim.finished());
    }

    #[test]
    fn test_max_concurrent() {
        let scenario = Scenario::from_yaml(CLIENT).unwrap();
        let config = SimConfig {
            max_concurrent: 2,
            ..config(0)
        };
        let mut sim = Simulator::new(config, scenario, MockTransport::new(local())).unwrap();
        let t0 = Instant::now();
        sim.tick(t0);
        sim.tick(t0 + Duration::from_secs(1));
        assert_eq!(sim.active_sessions(), 2);
    }

    #[test]
    fn test_end_to_end_through_dispatch() {
        let mut sim = simulator(CLIENT, 1);
        let t0 = Instant::now();

        sim.tick(t0);
        let csr = sent(&mut sim).remove(0);
        assert_eq!(csr.message_type(), 32);
        let local_teid = sender_teid(&csr);

        deliver(&mut sim, t0, &create_session_response(local_teid, csr.sequence_number()));
        sim.tick(t0);
        let dsr = sent(&mut sim).remove(0);
        assert_eq!(dsr.message_type(), 36);
        assert_eq!(dsr.teid(), 0x7000);

        let mut dsresp = Gtp2Message::new(Gtp2Header::new(37, local_teid, dsr.sequence_number()));
        dsresp.add_ie(InformationElement::new(0, IeKind::Cause(CauseIe::new(16))));
        deliver(&mut sim, t0, &dsresp);

        let session = sim.session_by_imsi("001010000000001").unwrap();
        assert_eq!(session.state(), SessionState::DeadCall);
        assert_eq!(session.outcome(), Some(SessionOutcome::Completed));

        let stats = sim.stats();
        assert_eq!(stats.job(0).unwrap().sent, 1);
        assert_eq!(stats.job(1).unwrap().received, 1);
        assert_eq!(stats.job(2).unwrap().sent, 1);
        assert_eq!(stats.job(3).unwrap().received, 1);
        assert!(stats.jobs.iter().all(|j| j.retransmitted_sent == 0 && j.timeouts == 0));

        sim.tick(t0 + Duration::from_millis(1999));
        assert_eq!(sim.active_sessions(), 1);
        sim.tick(t0 + Duration::from_millis(2000));
        assert_eq!(sim.active_sessions(), 0);
        assert_eq!(sim.stats().active, 0);
        assert!(sim.finished());
    }

    #[test]
    fn test_response_without_teid_matches_transaction() {
        let mut sim = simulator(CLIENT, 1);
        let t0 = Instant::now();
        sim.tick(t0);
        let csr = sent(&mut sim).remove(0);

        deliver(&mut sim, t0, &create_session_response(0, csr.sequence_number()));
        assert_eq!(sim.stats().job(1).unwrap().received, 1);
        assert_eq!(sim.stats().unknown_session, 0);
    }

    #[test]
    fn test_retransmission_then_failure() {
        let mut sim = simulator(CLIENT, 1);
        let t0 = Instant::now();
        sim.tick(t0);
        for n in 1..=4u64 {
            sim.tick(t0 + Duration::from_millis(1000 * n));
        }
        assert_eq!(sent(&mut sim).len(), 4);
        assert_eq!(sim.stats().job(0).unwrap().retransmitted_sent, 3);
        assert_eq!(sim.stats().job(0).unwrap().timeouts, 1);
        assert_eq!(sim.stats().failed_max_retry, 1);
        assert_eq!(sim.active_sessions(), 0);
        assert!(sim.finished());
    }

    #[test]
    fn test_echo_request_answered() {
        let mut sim = simulator(CLIENT, 1);
        let t0 = Instant::now();
        deliver(&mut sim, t0, &Gtp2Message::echo_request(0x99, 4));

        let replies = sent(&mut sim);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].message_type(), 2);
        assert_eq!(replies[0].sequence_number(), 0x99);
        assert_eq!(sim.stats().echo_requests, 1);
        assert_eq!(sim.active_sessions(), 0);

        deliver(&mut sim, t0, &Gtp2Message::echo_response(0x99, 4));
        assert_eq!(sim.stats().echo_responses, 1);
        assert!(sent(&mut sim).is_empty());
    }

    #[test]
    fn test_malformed_and_unknown() {
        let mut sim = simulator(CLIENT, 1);
        let t0 = Instant::now();
        sim.dispatch(t0, 0, remote(), Bytes::from_static(&[0x48, 0x21]));
        assert_eq!(sim.stats().malformed, 1);

        deliver(&mut sim, t0, &create_session_response(0x1234, 0x55));
        assert_eq!(sim.stats().unknown_session, 1);
    }

    #[test]
    fn test_server_session_and_duplicate() {
        let mut sim = simulator(SERVER, 0);
        let t0 = Instant::now();
        // Server scenarios never generate traffic
        sim.tick(t0);
        assert_eq!(sim.stats().created, 0);

        let mut csr = Gtp2Message::new(Gtp2Header::new(32, 0, 0x10));
        csr.add_ie(InformationElement::new(0, IeKind::Imsi("001019999999999".to_string())));
        csr.add_ie(InformationElement::new(
            0,
            IeKind::FTeid(FTeidIe::ipv4(10, 0xCAFE, Ipv4Addr::new(127, 0, 0, 2))),
        ));
        deliver(&mut sim, t0, &csr);

        let replies = sent(&mut sim);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].message_type(), 33);
        assert_eq!(replies[0].teid(), 0xCAFE);
        assert_eq!(replies[0].sequence_number(), 0x10);
        assert_eq!(sim.stats().created, 1);

        // Retransmitted request reaches the same session
        deliver(&mut sim, t0 + Duration::from_millis(500), &csr);
        let resent = sent(&mut sim);
        assert_eq!(resent, replies);
        assert_eq!(sim.stats().created, 1);
        assert_eq!(sim.stats().job(0).unwrap().retransmitted_received, 1);

        sim.tick(t0 + Duration::from_millis(2000));
        assert_eq!(sim.active_sessions(), 0);

        // Only the trigger opens a session
        let other = Gtp2Message::new(Gtp2Header::new(34, 0, 0x11));
        deliver(&mut sim, t0, &other);
        assert_eq!(sim.stats().unknown_session, 1);
    }

    #[test]
    fn test_duplicate_after_advancing_procedure() {
        let mut sim = simulator(include_str!("../../../../scenarios/answer_attach.yaml"), 0);
        let t0 = Instant::now();

        let mut csr = Gtp2Message::new(Gtp2Header::new(32, 0, 0x10));
        csr.add_ie(InformationElement::new(0, IeKind::Imsi("001018888888888".to_string())));
        csr.add_ie(InformationElement::new(
            0,
            IeKind::FTeid(FTeidIe::ipv4(10, 0xBEEF, Ipv4Addr::new(127, 0, 0, 2))),
        ));
        deliver(&mut sim, t0, &csr);

        let replies = sent(&mut sim);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].message_type(), 33);
        let session = sim.session_by_imsi("001018888888888").unwrap();
        assert_eq!(session.procedure_index(), 1);
        assert_eq!(session.state(), SessionState::AwaitingResponse);

        // Peer missed the response and sends the request again
        deliver(&mut sim, t0 + Duration::from_millis(300), &csr);

        let resent = sent(&mut sim);
        assert_eq!(resent, replies);
        let session = sim.session_by_imsi("001018888888888").unwrap();
        assert_eq!(session.procedure_index(), 1);
        assert_eq!(session.state(), SessionState::AwaitingResponse);
        assert_eq!(sim.stats().created, 1);
        assert_eq!(sim.stats().job(0).unwrap().retransmitted_received, 1);
        assert_eq!(sim.stats().job(1).unwrap().retransmitted_sent, 1);
        assert_eq!(sim.stats().job(0).unwrap().unexpected, 0);
    }

    #[test]
    fn test_new_request_replaces_dead_call() {
        let mut sim = simulator(SERVER, 0);
        let t0 = Instant::now();

        let mut csr = Gtp2Message::new(Gtp2Header::new(32, 0, 0x10));
        csr.add_ie(InformationElement::new(0, IeKind::Imsi("001019999999999".to_string())));
        csr.add_ie(InformationElement::new(
            0,
            IeKind::FTeid(FTeidIe::ipv4(10, 0xCAFE, Ipv4Addr::new(127, 0, 0, 2))),
        ));
        deliver(&mut sim, t0, &csr);
        assert_eq!(sent(&mut sim).len(), 1);
        let first = sim.session_by_imsi("001019999999999").unwrap().id();
        assert_eq!(sim.state_counts().get("dead_call"), Some(&1));

        // Same subscriber, new transaction, while the first call lingers
        csr.header.sequence_number = 0x20;
        deliver(&mut sim, t0 + Duration::from_millis(100), &csr);

        let replies = sent(&mut sim);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].message_type(), 33);
        assert_eq!(replies[0].sequence_number(), 0x20);
        assert_eq!(sim.stats().created, 2);
        assert_eq!(sim.stats().completed, 2);
        assert_eq!(sim.stats().job(0).unwrap().unexpected, 0);
        assert_eq!(sim.active_sessions(), 1);
        assert_ne!(sim.session_by_imsi("001019999999999").unwrap().id(), first);
    }

    #[test]
    fn test_abort_all() {
        let mut sim = simulator(CLIENT, 0);
        let t0 = Instant::now();
        sim.tick(t0);
        sim.tick(t0 + Duration::from_millis(200));
        assert_eq!(sim.active_sessions(), 3);
        assert_eq!(sim.state_counts().get("awaiting"), Some(&3));

        sim.abort_all();
        assert_eq!(sim.active_sessions(), 0);
        assert_eq!(sim.stats().aborted, 3);
        assert_eq!(sim.stats().active, 0);
    }
}
