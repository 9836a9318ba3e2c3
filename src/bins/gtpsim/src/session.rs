//! UE Session State Machine
//!
//! One subscriber's walk through the scenario's procedures. A session is run
//! by the scheduler with either a tick or an inbound message and reacts by
//! sending, retransmitting, answering duplicates or advancing.
//!
//! Only two procedures are remembered: the current one and the last
//! completed message exchange. Each keeps its sequence number, the messages
//! accepted from the peer and the last buffer sent, which is what
//! retransmissions and duplicate answers are served from.

use std::net::{IpAddr, SocketAddr};
use std::time::Instant;

use bytes::Bytes;
use gtpsim_gtp::v2::{
    is_accepted_cause, message_name, Gtp2Header, Gtp2IeType, Gtp2Message, Gtp2MessageType,
    IeKind, InformationElement,
};
use gtpsim_gtp::{GtpError, GtpResult};

use crate::context::SessionId;
use crate::event::{GtpEventData, SimEvent};
use crate::gtp_path::{ConnId, Transport};
use crate::scenario::{JobAction, MessageTemplate, Scenario};
use crate::sequence::PeerSequenceRegistry;
use crate::stats::SimStats;
use crate::timer::SimTimerConfigs;
use crate::tunnel::{Pdn, TunnelRegistry};

use Gtp2MessageType as M;

/// Highest EPS bearer identity
const MAX_EBI: u8 = 15;

/// Shared state a session runs against
pub struct SessionContext<'a> {
    pub scenario: &'a Scenario,
    pub timers: &'a SimTimerConfigs,
    pub sequences: &'a mut PeerSequenceRegistry,
    pub tunnels: &'a mut TunnelRegistry,
    pub stats: &'a mut SimStats,
    pub transport: &'a mut dyn Transport,
    /// Local GTP-C address, used in auto-filled F-TEIDs
    pub local: SocketAddr,
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// About to transmit the initial message of the current procedure
    Sending,
    /// Waiting for the peer, with T3 armed when we are the requester
    AwaitingResponse,
    /// Scripted pause
    Waiting,
    /// Scenario finished, answering late retransmissions
    DeadCall,
    Done,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    MaxRetryExceeded,
    BuildFailed,
    Aborted,
}

#[derive(Debug, Clone)]
struct SentMessage {
    data: Bytes,
    job: usize,
    step: usize,
}

#[derive(Debug, Clone, Copy)]
struct ReceivedMessage {
    message_type: u8,
    job: usize,
    step: usize,
}

/// What one procedure exchange leaves behind
#[derive(Debug, Clone)]
struct ProcedureCache {
    sequence: u32,
    conn: ConnId,
    peer: SocketAddr,
    received: Vec<ReceivedMessage>,
    last_sent: Option<SentMessage>,
}

impl ProcedureCache {
    fn new(sequence: u32, conn: ConnId, peer: SocketAddr) -> Self {
        Self {
            sequence,
            conn,
            peer,
            received: Vec::new(),
            last_sent: None,
        }
    }

    fn find_received(&self, message_type: u8, sequence: u32) -> Option<ReceivedMessage> {
        if sequence != self.sequence {
            return None;
        }
        self.received
            .iter()
            .find(|r| r.message_type == message_type)
            .copied()
    }
}

/// One subscriber's scenario run
#[derive(Debug)]
pub struct UeSession {
    id: SessionId,
    imsi: String,
    conn: ConnId,
    peer: SocketAddr,
    state: SessionState,
    /// Index into the scenario's procedures
    procedure: usize,
    /// Index into the current procedure's message jobs
    step: usize,
    retry_count: u32,
    wake: Option<Instant>,
    current: Option<ProcedureCache>,
    previous: Option<ProcedureCache>,
    pdns: Vec<Pdn>,
    outcome: Option<SessionOutcome>,
}

impl UeSession {
    pub fn new(id: SessionId, imsi: String, conn: ConnId, peer: SocketAddr) -> Self {
        Self {
            id,
            imsi,
            conn,
            peer,
            state: SessionState::Sending,
            procedure: 0,
            step: 0,
            retry_count: 0,
            wake: None,
            current: None,
            previous: None,
            pdns: Vec::new(),
            outcome: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn imsi(&self) -> &str {
        &self.imsi
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    /// When the scheduler should tick this session next
    pub fn wake_at(&self) -> Option<Instant> {
        self.wake
    }

    pub fn procedure_index(&self) -> usize {
        self.procedure
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn pdns(&self) -> &[Pdn] {
        &self.pdns
    }

    pub fn is_done(&self) -> bool {
        self.state == SessionState::Done
    }

    /// (peer, sequence) of the exchanges this session can still match
    pub fn transaction_keys(&self) -> Vec<(SocketAddr, u32)> {
        [self.current.as_ref(), self.previous.as_ref()]
            .into_iter()
            .flatten()
            .map(|cache| (cache.peer, cache.sequence))
            .collect()
    }

    /// Enter the first procedure
    pub fn start(&mut self, ctx: &mut SessionContext<'_>, now: Instant) {
        log::debug!("[{}] Session {} started", self.imsi, self.id);
        self.enter_procedure(ctx, now);
    }

    pub fn run(&mut self, ctx: &mut SessionContext<'_>, now: Instant, event: SimEvent) {
        log::trace!("[{}] {} in {:?}", self.imsi, event.name(), self.state);
        match event.gtp {
            Some(gtp) => self.handle_message(ctx, now, gtp),
            None => self.handle_tick(ctx, now),
        }
    }

    /// Tear down immediately, releasing tunnels and PDNs
    pub fn abort(&mut self, ctx: &mut SessionContext<'_>) {
        match self.state {
            SessionState::Done => {}
            SessionState::DeadCall => self.terminate(ctx),
            _ => {
                log::debug!("[{}] Session {} aborted", self.imsi, self.id);
                self.outcome = Some(SessionOutcome::Aborted);
                ctx.stats.aborted += 1;
                self.terminate(ctx);
            }
        }
    }

    // ========================================================================
    // Ticks
    // ========================================================================

    fn handle_tick(&mut self, ctx: &mut SessionContext<'_>, now: Instant) {
        let due = self.wake.is_some_and(|wake| now >= wake);
        match self.state {
            SessionState::Sending => self.send_initial(ctx, now),
            SessionState::AwaitingResponse if due => self.retry_timeout(ctx, now),
            SessionState::Waiting if due => {
                self.procedure += 1;
                self.enter_procedure(ctx, now);
            }
            SessionState::DeadCall if due => {
                log::debug!("[{}] Dead call period over", self.imsi);
                self.terminate(ctx);
            }
            _ => {}
        }
    }

    fn enter_procedure(&mut self, ctx: &mut SessionContext<'_>, now: Instant) {
        self.step = 0;
        self.retry_count = 0;

        let scenario = ctx.scenario;
        let Some(procedure) = scenario.procedures.get(self.procedure) else {
            log::debug!("[{}] Scenario complete", self.imsi);
            self.state = SessionState::DeadCall;
            self.wake = Some(now + ctx.timers.dead_call.duration);
            self.outcome = Some(SessionOutcome::Completed);
            ctx.stats.completed += 1;
            return;
        };

        if let Some(wait) = procedure.wait {
            let delay = match scenario.job(wait).map(|job| &job.action) {
                Some(JobAction::Wait(delay)) => *delay,
                _ => Default::default(),
            };
            self.state = SessionState::Waiting;
            self.wake = Some(now + delay);
            return;
        }

        let opens_with_send = procedure
            .initial
            .and_then(|job| scenario.job(job))
            .is_some_and(|job| job.is_send());
        if opens_with_send {
            self.state = SessionState::Sending;
            self.wake = Some(now);
        } else {
            self.state = SessionState::AwaitingResponse;
            self.wake = None;
        }
    }

    fn retry_timeout(&mut self, ctx: &mut SessionContext<'_>, now: Instant) {
        let Some((conn, peer, sent)) = self
            .current
            .as_ref()
            .and_then(|c| c.last_sent.clone().map(|s| (c.conn, c.peer, s)))
        else {
            self.wake = None;
            return;
        };

        if self.retry_count >= ctx.timers.t3_response.max_count {
            ctx.stats.job_mut(sent.job).timeouts += 1;
            log::warn!(
                "[{}] No answer after {} retransmissions, session failed",
                self.imsi,
                self.retry_count
            );
            self.fail(ctx, SessionOutcome::MaxRetryExceeded);
            return;
        }

        self.retry_count += 1;
        log::debug!("[{}] Retransmission #{} (job {})", self.imsi, self.retry_count, sent.job);
        if let Err(e) = ctx.transport.send_message(conn, peer, &sent.data) {
            log::warn!("[{}] Retransmission failed: {}", self.imsi, e);
        }
        ctx.stats.job_mut(sent.job).retransmitted_sent += 1;
        self.wake = Some(now + ctx.timers.t3_response.duration);
    }

    // ========================================================================
    // Sending
    // ========================================================================

    fn current_jobs(&self, scenario: &Scenario) -> Vec<usize> {
        scenario
            .procedures
            .get(self.procedure)
            .map(|p| p.message_jobs())
            .unwrap_or_default()
    }

    fn send_initial(&mut self, ctx: &mut SessionContext<'_>, now: Instant) {
        let Some(category) = self
            .current_jobs(ctx.scenario)
            .first()
            .and_then(|&job| ctx.scenario.job(job))
            .and_then(|job| job.category())
        else {
            return;
        };
        let sequence = ctx.sequences.generate(self.peer, category);
        self.current = Some(ProcedureCache::new(sequence, self.conn, self.peer));
        self.send_step(ctx, now);
    }

    /// Build and transmit the Send job at the current step
    fn send_step(&mut self, ctx: &mut SessionContext<'_>, now: Instant) {
        let scenario = ctx.scenario;
        let jobs = self.current_jobs(scenario);
        let Some(&job_index) = jobs.get(self.step) else {
            return;
        };
        let Some(template) = scenario.job(job_index).and_then(|job| job.template()) else {
            return;
        };
        let Some((sequence, conn, peer)) = self.current.as_ref().map(|c| (c.sequence, c.conn, c.peer))
        else {
            return;
        };

        let message = match self.build_message(ctx, template, sequence) {
            Ok(message) => message,
            Err(e) => {
                log::warn!(
                    "[{}] Failed to build {}: {}",
                    self.imsi,
                    message_name(template.message_type),
                    e
                );
                self.fail(ctx, SessionOutcome::BuildFailed);
                return;
            }
        };
        let data = match message.encode_checked() {
            Ok(buf) => buf.freeze(),
            Err(e) => {
                log::warn!(
                    "[{}] Failed to encode {}: {}",
                    self.imsi,
                    message_name(template.message_type),
                    e
                );
                self.fail(ctx, SessionOutcome::BuildFailed);
                return;
            }
        };

        if let Err(e) = ctx.transport.send_message(conn, peer, &data) {
            log::warn!("[{}] Send to {} failed: {}", self.imsi, peer, e);
        }
        ctx.stats.job_mut(job_index).sent += 1;
        log::debug!(
            "[{}] Sent {} (seq={:#x}, teid={:#x})",
            self.imsi,
            message_name(template.message_type),
            sequence,
            message.teid()
        );

        self.apply_outgoing(ctx, &message);
        if let Some(cache) = self.current.as_mut() {
            cache.last_sent = Some(SentMessage {
                data,
                job: job_index,
                step: self.step,
            });
        }

        self.step += 1;
        if self.step < jobs.len() {
            self.state = SessionState::AwaitingResponse;
            self.retry_count = 0;
            self.wake = Some(now + ctx.timers.t3_response.duration);
        } else {
            self.complete_procedure(ctx, now);
        }
    }

    fn complete_procedure(&mut self, ctx: &mut SessionContext<'_>, now: Instant) {
        self.previous = self.current.take();
        self.procedure += 1;
        self.enter_procedure(ctx, now);
    }

    /// Build an outgoing message from its template, filling in the
    /// session's IMSI, TEIDs and extra bearers
    fn build_message(
        &mut self,
        ctx: &mut SessionContext<'_>,
        template: &MessageTemplate,
        sequence: u32,
    ) -> GtpResult<Gtp2Message> {
        let message_type = template.message_type;
        let mut ies = template.build_ies()?;

        if message_type == M::CreateSessionRequest as u8 {
            self.create_pdn(ctx)?;
            replicate_bearer_contexts(&mut ies, ctx.scenario.bearers_to_create);
        }

        let new_bearers = creates_bearers(message_type);
        for ie in ies.iter_mut() {
            self.fill_ie(ctx, ie, new_bearers)?;
        }

        let teid = self
            .pdns
            .last()
            .and_then(|pdn| ctx.tunnels.get(pdn.control))
            .map_or(0, |tunnel| tunnel.remote_teid);
        let mut message = Gtp2Message::new(Gtp2Header::new(message_type, teid, sequence));
        message.ies = ies;
        Ok(message)
    }

    fn fill_ie(
        &mut self,
        ctx: &mut SessionContext<'_>,
        ie: &mut InformationElement,
        creates_bearers: bool,
    ) -> GtpResult<()> {
        let local_ip = ctx.local.ip();
        let control_teid = self.pdns.last().map(|pdn| pdn.control.local_teid());

        match &mut ie.kind {
            IeKind::Imsi(imsi) if imsi.is_empty() => imsi.clone_from(&self.imsi),
            IeKind::FTeid(fteid) => {
                if fteid.teid == 0 {
                    fteid.teid = control_teid.unwrap_or(0);
                }
                fill_fteid_address(fteid, local_ip);
            }
            IeKind::BearerContext(group) => {
                let Some(ebi) = group.ebi().filter(|&ebi| ebi != 0) else {
                    return Ok(());
                };
                let Some(pdn) = self.pdns.last_mut() else {
                    return Ok(());
                };
                if creates_bearers && pdn.bearer(ebi).is_none() {
                    pdn.bearers.insert(ebi, ctx.tunnels.create_bearer(ebi)?);
                }
                let user_teid = pdn.bearer(ebi).map(|b| b.user.local_teid);
                for child in group.ies.iter_mut() {
                    if let Some(fteid) = child.as_fteid_mut() {
                        if fteid.teid == 0 {
                            fteid.teid = user_teid.unwrap_or(0);
                        }
                        fill_fteid_address(fteid, local_ip);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn create_pdn(&mut self, ctx: &mut SessionContext<'_>) -> GtpResult<()> {
        let existing = self.pdns.first().map(|pdn| pdn.control);
        let handle = ctx
            .tunnels
            .allocate_control_tunnel(self.id, existing, ctx.local, self.peer)?;
        self.pdns.push(Pdn::new(handle));
        Ok(())
    }

    fn release_current_pdn(&mut self, ctx: &mut SessionContext<'_>) {
        if let Some(pdn) = self.pdns.pop() {
            ctx.tunnels.release(pdn.control);
        }
    }

    // ========================================================================
    // Receiving
    // ========================================================================

    fn handle_message(&mut self, ctx: &mut SessionContext<'_>, now: Instant, gtp: GtpEventData) {
        let message_type = gtp.message.message_type();
        let sequence = gtp.message.sequence_number();

        if self.handle_duplicate(ctx, message_type, sequence) {
            return;
        }

        if self.is_expected(ctx.scenario, message_type, sequence) {
            self.accept(ctx, now, gtp);
            return;
        }

        let jobs = self.current_jobs(ctx.scenario);
        let job = jobs
            .get(self.step)
            .copied()
            .unwrap_or(ctx.scenario.jobs.len().saturating_sub(1));
        ctx.stats.job_mut(job).unexpected += 1;
        log::debug!(
            "[{}] Unexpected {} (seq={:#x}) in {:?}",
            self.imsi,
            message_name(message_type),
            sequence,
            self.state
        );
    }

    /// Serve a retransmission of something already accepted
    fn handle_duplicate(&mut self, ctx: &mut SessionContext<'_>, message_type: u8, sequence: u32) -> bool {
        for cache in [self.current.as_ref(), self.previous.as_ref()].into_iter().flatten() {
            let Some(received) = cache.find_received(message_type, sequence) else {
                continue;
            };
            ctx.stats.job_mut(received.job).retransmitted_received += 1;
            log::debug!(
                "[{}] Duplicate {} (seq={:#x})",
                self.imsi,
                message_name(message_type),
                sequence
            );

            // Answer it again only if our last send was the answer to it
            if let Some(sent) = cache.last_sent.as_ref().filter(|s| s.step > received.step) {
                if let Err(e) = ctx.transport.send_message(cache.conn, cache.peer, &sent.data) {
                    log::warn!("[{}] Resend failed: {}", self.imsi, e);
                }
                ctx.stats.job_mut(sent.job).retransmitted_sent += 1;
            }
            return true;
        }
        false
    }

    fn is_expected(&self, scenario: &Scenario, message_type: u8, sequence: u32) -> bool {
        if self.state != SessionState::AwaitingResponse {
            return false;
        }
        let jobs = self.current_jobs(scenario);
        let Some(job) = jobs.get(self.step).and_then(|&j| scenario.job(j)) else {
            return false;
        };
        if job.action != JobAction::Recv(message_type) {
            return false;
        }
        match (&self.current, self.step) {
            (_, 0) => true,
            (Some(cache), _) => cache.sequence == sequence,
            (None, _) => false,
        }
    }

    fn accept(&mut self, ctx: &mut SessionContext<'_>, now: Instant, gtp: GtpEventData) {
        let jobs = self.current_jobs(ctx.scenario);
        let Some(&job) = jobs.get(self.step) else {
            return;
        };
        let message = &gtp.message;
        let message_type = message.message_type();
        let sequence = message.sequence_number();

        ctx.stats.job_mut(job).received += 1;
        log::debug!(
            "[{}] Received {} (seq={:#x})",
            self.imsi,
            message_name(message_type),
            sequence
        );

        if self.step == 0 {
            ctx.sequences.observe(gtp.peer, sequence);
            self.current = Some(ProcedureCache::new(sequence, gtp.conn, gtp.peer));
        }
        if let Some(cache) = self.current.as_mut() {
            cache.received.push(ReceivedMessage {
                message_type,
                job,
                step: self.step,
            });
        }

        if let Err(e) = self.apply_incoming(ctx, message) {
            log::warn!("[{}] Cannot record {}: {}", self.imsi, message_name(message_type), e);
        }

        self.step += 1;
        self.retry_count = 0;
        self.wake = None;
        if self.step < jobs.len() {
            self.send_step(ctx, now);
        } else {
            self.complete_procedure(ctx, now);
        }
    }

    // ========================================================================
    // Tunnel bookkeeping
    // ========================================================================

    fn apply_incoming(&mut self, ctx: &mut SessionContext<'_>, message: &Gtp2Message) -> GtpResult<()> {
        let message_type = message.message_type();
        match message_type {
            t if t == M::CreateSessionRequest as u8 => {
                self.create_pdn(ctx)?;
                self.learn_control_teid(ctx, message);
                self.learn_bearers(ctx, message, true)?;
            }
            t if t == M::CreateSessionResponse as u8 => {
                self.learn_control_teid(ctx, message);
                let accepted = message.cause().map_or(true, is_accepted_cause);
                self.learn_bearers(ctx, message, accepted)?;
            }
            t if t == M::CreateBearerRequest as u8 || t == M::CreateBearerResponse as u8 => {
                self.learn_bearers(ctx, message, true)?;
            }
            t if t == M::DeleteBearerRequest as u8 => self.remove_bearers(message),
            t if t == M::DeleteSessionResponse as u8 => self.release_current_pdn(ctx),
            _ => {}
        }
        Ok(())
    }

    fn apply_outgoing(&mut self, ctx: &mut SessionContext<'_>, message: &Gtp2Message) {
        let message_type = message.message_type();
        if message_type == M::DeleteBearerRequest as u8 {
            self.remove_bearers(message);
        } else if message_type == M::DeleteSessionResponse as u8 {
            self.release_current_pdn(ctx);
        }
    }

    /// Remote control TEID from the sender F-TEID
    fn learn_control_teid(&mut self, ctx: &mut SessionContext<'_>, message: &Gtp2Message) {
        let Some(remote) = message
            .get_ie(Gtp2IeType::FTeid, 0, 0)
            .and_then(InformationElement::as_fteid)
            .map(|fteid| fteid.teid)
        else {
            return;
        };
        if let Some(tunnel) = self.pdns.last().and_then(|pdn| ctx.tunnels.get_mut(pdn.control)) {
            tunnel.remote_teid = remote;
        }
    }

    /// Remote user TEIDs from BearerContexts, adding bearers when `create`
    fn learn_bearers(
        &mut self,
        ctx: &mut SessionContext<'_>,
        message: &Gtp2Message,
        create: bool,
    ) -> GtpResult<()> {
        let Some(pdn) = self.pdns.last_mut() else {
            return Err(GtpError::ResourceExhausted("no PDN for bearer".to_string()));
        };
        for occurrence in 0..message.get_ie_count(Gtp2IeType::BearerContext, 0) {
            let Some(group) = message
                .get_ie(Gtp2IeType::BearerContext, 0, occurrence)
                .and_then(InformationElement::as_grouped)
            else {
                continue;
            };
            let Some(ebi) = group.ebi().filter(|&ebi| ebi != 0) else {
                continue;
            };
            if pdn.bearer(ebi).is_none() {
                if !create {
                    continue;
                }
                pdn.bearers.insert(ebi, ctx.tunnels.create_bearer(ebi)?);
            }
            let remote = group.ies.iter().find_map(|ie| ie.as_fteid()).map(|f| f.teid);
            if let (Some(bearer), Some(remote)) = (pdn.bearer_mut(ebi), remote) {
                bearer.user.remote_teid = remote;
            }
        }
        log::trace!("[{}] Bearers {:#06x}", self.imsi, pdn.bearer_mask());
        Ok(())
    }

    /// Drop the bearers a Delete Bearer Request names
    fn remove_bearers(&mut self, message: &Gtp2Message) {
        let Some(pdn) = self.pdns.last_mut() else {
            return;
        };
        let listed = message
            .ies
            .iter()
            .filter(|ie| ie.instance == 1)
            .filter_map(InformationElement::as_ebi);
        let in_contexts = message
            .ies
            .iter()
            .filter_map(InformationElement::as_grouped)
            .filter_map(|group| group.ebi());
        let ebis: Vec<u8> = listed.chain(in_contexts).collect();
        for ebi in ebis {
            pdn.remove_bearer(ebi);
        }
    }

    // ========================================================================
    // Termination
    // ========================================================================

    fn fail(&mut self, ctx: &mut SessionContext<'_>, outcome: SessionOutcome) {
        self.outcome = Some(outcome);
        match outcome {
            SessionOutcome::MaxRetryExceeded => ctx.stats.failed_max_retry += 1,
            SessionOutcome::BuildFailed => ctx.stats.failed_build += 1,
            SessionOutcome::Aborted => ctx.stats.aborted += 1,
            SessionOutcome::Completed => ctx.stats.completed += 1,
        }
        self.terminate(ctx);
    }

    fn terminate(&mut self, ctx: &mut SessionContext<'_>) {
        while !self.pdns.is_empty() {
            self.release_current_pdn(ctx);
        }
        self.state = SessionState::Done;
        self.wake = None;
        ctx.stats.active = ctx.stats.active.saturating_sub(1);
        log::debug!("[{}] Session {} done ({:?})", self.imsi, self.id, self.outcome);
    }
}

fn creates_bearers(message_type: u8) -> bool {
    [
        M::CreateSessionRequest,
        M::CreateSessionResponse,
        M::CreateBearerRequest,
        M::CreateBearerResponse,
    ]
    .iter()
    .any(|&t| t as u8 == message_type)
}

/// An F-TEID without an address gets the local one, unless we are bound to
/// the wildcard address
fn fill_fteid_address(fteid: &mut gtpsim_gtp::v2::FTeidIe, local_ip: IpAddr) {
    if fteid.ipv4.is_some() || fteid.ipv6.is_some() || local_ip.is_unspecified() {
        return;
    }
    match local_ip {
        IpAddr::V4(addr) => fteid.ipv4 = Some(addr),
        IpAddr::V6(addr) => fteid.ipv6 = Some(addr),
    }
}

/// Append copies of the last BearerContext (instance 0), with increasing
/// EBIs, until there are `wanted` of them
fn replicate_bearer_contexts(ies: &mut Vec<InformationElement>, wanted: usize) {
    let is_context = |ie: &InformationElement| {
        ie.ie_type() == Gtp2IeType::BearerContext as u8 && ie.instance == 0
    };
    let present = ies.iter().filter(|ie| is_context(ie)).count();
    let Some(last) = ies.iter().rposition(is_context) else {
        return;
    };
    if present >= wanted {
        return;
    }

    let template = ies[last].clone();
    let base_ebi = template.as_grouped().and_then(|g| g.ebi()).unwrap_or(0);
    for extra in 1..=(wanted - present) {
        let ebi = usize::from(base_ebi) + extra;
        if ebi > usize::from(MAX_EBI) {
            log::warn!("Cannot create more than {} bearers", MAX_EBI);
            break;
        }
        let mut copy = template.clone();
        if let Some(ebi_ie) = copy
            .as_grouped_mut()
            .and_then(|g| g.get_mut(Gtp2IeType::Ebi, 0, 0))
        {
            ebi_ie.kind = IeKind::Ebi(ebi as u8);
        }
        ies.insert(last + extra, copy);
    }
}

// ============================================================================
// Tests
// ============================================================================
