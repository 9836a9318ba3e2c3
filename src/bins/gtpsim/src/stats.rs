//! Simulator Statistics
//!
//! Global session counters plus one counter set per scenario job. Only the
//! simulator mutates them; `main` reads them for periodic reporting.

use crate::scenario::Scenario;

/// Counters of one scenario job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobCounters {
    pub sent: u64,
    pub received: u64,
    pub retransmitted_sent: u64,
    pub retransmitted_received: u64,
    pub timeouts: u64,
    pub unexpected: u64,
}

/// Simulator-wide counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimStats {
    pub created: u64,
    pub completed: u64,
    pub failed_max_retry: u64,
    pub failed_build: u64,
    pub aborted: u64,
    pub active: u64,
    pub malformed: u64,
    pub unknown_session: u64,
    pub echo_requests: u64,
    pub echo_responses: u64,
    pub jobs: Vec<JobCounters>,
}

impl SimStats {
    pub fn new(job_count: usize) -> Self {
        Self {
            jobs: vec![JobCounters::default(); job_count],
            ..Default::default()
        }
    }

    pub fn job(&self, index: usize) -> Option<&JobCounters> {
        self.jobs.get(index)
    }

    /// Counters of a job; out-of-range indices land in a scratch entry
    pub(crate) fn job_mut(&mut self, index: usize) -> &mut JobCounters {
        if index >= self.jobs.len() {
            self.jobs.resize(index + 1, JobCounters::default());
        }
        &mut self.jobs[index]
    }

    /// Sessions that ended, whatever the reason
    pub fn finished(&self) -> u64 {
        self.completed + self.failed_max_retry + self.failed_build + self.aborted
    }

    pub fn summary(&self) -> String {
        format!(
            "sessions: created={} active={} completed={} failed(retry)={} failed(build)={} aborted={} | \
             malformed={} unknown={} echo(req/rsp)={}/{}",
            self.created,
            self.active,
            self.completed,
            self.failed_max_retry,
            self.failed_build,
            self.aborted,
            self.malformed,
            self.unknown_session,
            self.echo_requests,
            self.echo_responses,
        )
    }

    /// Log the summary line and a line per job
    pub fn log_summary(&self, scenario: &Scenario) {
        log::info!("{}", self.summary());
        for (job, counters) in scenario.jobs.iter().zip(&self.jobs) {
            log::info!(
                "  [{:>2}] {:<48} sent={} recv={} retrans(sent/recv)={}/{} timeout={} unexpected={}",
                job.index,
                job.label(),
                counters.sent,
                counters.received,
                counters.retransmitted_sent,
                counters.retransmitted_received,
                counters.timeouts,
                counters.unexpected,
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
