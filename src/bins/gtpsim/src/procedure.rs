//! Procedure Assembly
//!
//! Groups the flat job list of a scenario into procedures: one initial
//! message, the message it triggers and, after a command, the reply to the
//! triggered request. A wait job forms a procedure on its own.

use gtpsim_gtp::v2::{classify, message_name, MessageCategory};

use crate::scenario::{Job, JobAction, ScenarioError};

/// Shape of a completed procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureType {
    Wait,
    /// Initial message answered by a response or command failure indication
    RequestResponse,
    /// Command, triggered request, reply to the triggered request
    RequestTriggeredReply,
}

/// A matched exchange; slots hold job indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    pub procedure_type: ProcedureType,
    pub initial: Option<usize>,
    pub triggered: Option<usize>,
    pub triggered_reply: Option<usize>,
    pub wait: Option<usize>,
}

impl Procedure {
    /// Message jobs in exchange order
    pub fn message_jobs(&self) -> Vec<usize> {
        [self.initial, self.triggered, self.triggered_reply]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Assembler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssemblerState {
    Empty,
    HaveInitial,
    HaveTriggered,
}

/// Feeds jobs one at a time and hands back each procedure as it completes
#[derive(Debug)]
pub struct ProcedureAssembler {
    state: AssemblerState,
    initial: Option<usize>,
    triggered: Option<usize>,
    /// Direction of the last stored message job
    last_send: bool,
    command_seen: bool,
}

impl Default for ProcedureAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcedureAssembler {
    pub fn new() -> Self {
        Self {
            state: AssemblerState::Empty,
            initial: None,
            triggered: None,
            last_send: false,
            command_seen: false,
        }
    }

    /// Consume one job; returns the procedure it completes, if any
    pub fn feed(&mut self, job: &Job) -> Result<Option<Procedure>, ScenarioError> {
        let message_type = match &job.action {
            JobAction::Wait(_) => return self.feed_wait(job),
            JobAction::Send(template) => template.message_type,
            JobAction::Recv(message_type) => *message_type,
        };

        let category = classify(message_type, self.command_seen);
        match self.state {
            AssemblerState::Empty => self.state_empty(job, message_type, category),
            AssemblerState::HaveInitial => self.state_have_initial(job, message_type, category),
            AssemblerState::HaveTriggered => self.state_have_triggered(job, message_type, category),
        }
    }

    /// Fail if a procedure is still open at the end of the script
    pub fn finish(&self, last_job: usize) -> Result<(), ScenarioError> {
        if self.state == AssemblerState::Empty {
            return Ok(());
        }
        Err(malformed(last_job, "scenario ends inside an unfinished procedure"))
    }

    fn feed_wait(&mut self, job: &Job) -> Result<Option<Procedure>, ScenarioError> {
        if self.state != AssemblerState::Empty {
            return Err(malformed(job.index, "wait inside an unfinished procedure"));
        }
        Ok(Some(Procedure {
            procedure_type: ProcedureType::Wait,
            initial: None,
            triggered: None,
            triggered_reply: None,
            wait: Some(job.index),
        }))
    }

    fn state_empty(
        &mut self,
        job: &Job,
        message_type: u8,
        category: MessageCategory,
    ) -> Result<Option<Procedure>, ScenarioError> {
        match category {
            MessageCategory::Command | MessageCategory::Request => {
                self.initial = Some(job.index);
                self.command_seen = category == MessageCategory::Command;
                self.last_send = job.is_send();
                self.state = AssemblerState::HaveInitial;
                Ok(None)
            }
            _ => Err(malformed(
                job.index,
                format!("{} does not start a procedure", message_name(message_type)),
            )),
        }
    }

    fn state_have_initial(
        &mut self,
        job: &Job,
        message_type: u8,
        category: MessageCategory,
    ) -> Result<Option<Procedure>, ScenarioError> {
        self.check_direction(job)?;
        match category {
            MessageCategory::Response => {
                Ok(Some(self.complete(ProcedureType::RequestResponse, Some(job.index), None)))
            }
            MessageCategory::CommandFailureIndication if self.command_seen => {
                Ok(Some(self.complete(ProcedureType::RequestResponse, Some(job.index), None)))
            }
            MessageCategory::Request if self.command_seen => {
                self.triggered = Some(job.index);
                self.last_send = job.is_send();
                self.state = AssemblerState::HaveTriggered;
                Ok(None)
            }
            _ => Err(malformed(
                job.index,
                format!("unexpected {} after the initial message", message_name(message_type)),
            )),
        }
    }

    fn state_have_triggered(
        &mut self,
        job: &Job,
        message_type: u8,
        category: MessageCategory,
    ) -> Result<Option<Procedure>, ScenarioError> {
        self.check_direction(job)?;
        match category {
            MessageCategory::Response => {
                let triggered = self.triggered;
                Ok(Some(self.complete(
                    ProcedureType::RequestTriggeredReply,
                    triggered,
                    Some(job.index),
                )))
            }
            _ => Err(malformed(
                job.index,
                format!("expected a reply to the triggered request, got {}", message_name(message_type)),
            )),
        }
    }

    /// Consecutive messages of one procedure travel in opposite directions
    fn check_direction(&self, job: &Job) -> Result<(), ScenarioError> {
        if job.is_send() == self.last_send {
            return Err(malformed(
                job.index,
                "message travels in the same direction as the one it answers",
            ));
        }
        Ok(())
    }

    fn complete(
        &mut self,
        procedure_type: ProcedureType,
        triggered: Option<usize>,
        triggered_reply: Option<usize>,
    ) -> Procedure {
        let procedure = Procedure {
            procedure_type,
            initial: self.initial.take(),
            triggered,
            triggered_reply,
            wait: None,
        };
        *self = Self::new();
        procedure
    }
}

fn malformed(job: usize, reason: impl Into<String>) -> ScenarioError {
    ScenarioError::MalformedProcedure {
        job,
        reason: reason.into(),
    }
}

/// Assemble a complete job list
pub fn assemble(jobs: &[Job]) -> Result<Vec<Procedure>, ScenarioError> {
    let mut assembler = ProcedureAssembler::new();
    let mut procedures = Vec::new();
    for job in jobs {
        if let Some(procedure) = assembler.feed(job)? {
            procedures.push(procedure);
        }
    }
    assembler.finish(jobs.len().saturating_sub(1))?;
    Ok(procedures)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::MessageTemplate;
    use std::time::Duration;

    fn send(index: usize, message_type: u8) -> Job {
        Job::send(
            index,
            MessageTemplate {
                message_type,
                ies: Vec::new(),
            },
        )
    }

    #[test]
    fn test_request_response() {
        let jobs = vec![send(0, 32), Job::recv(1, 33), send(2, 36), Job::recv(3, 37)];
        let procedures = assemble(&jobs).unwrap();
        assert_eq!(procedures.len(), 2);
        assert_eq!(procedures[0].procedure_type, ProcedureType::RequestResponse);
        assert_eq!(procedures[0].initial, Some(0));
        assert_eq!(procedures[0].triggered, Some(1));
        assert_eq!(procedures[0].triggered_reply, None);
        assert_eq!(procedures[1].message_jobs(), vec![2, 3]);
    }

    #[test]
    fn test_server_role() {
        let jobs = vec![Job::recv(0, 32), send(1, 33)];
        let procedures = assemble(&jobs).unwrap();
        assert_eq!(procedures.len(), 1);
        assert_eq!(procedures[0].message_jobs(), vec![0, 1]);
    }

    #[test]
    fn test_command_triggered_reply() {
        // Bearer Resource Command -> Create Bearer Request -> Create Bearer Response
        let jobs = vec![send(0, 68), Job::recv(1, 95), send(2, 96)];
        let procedures = assemble(&jobs).unwrap();
        assert_eq!(procedures.len(), 1);
        assert_eq!(procedures[0].procedure_type, ProcedureType::RequestTriggeredReply);
        assert_eq!(procedures[0].initial, Some(0));
        assert_eq!(procedures[0].triggered, Some(1));
        assert_eq!(procedures[0].triggered_reply, Some(2));
    }

    #[test]
    fn test_command_failure_indication() {
        let jobs = vec![send(0, 66), Job::recv(1, 67)];
        let procedures = assemble(&jobs).unwrap();
        assert_eq!(procedures[0].procedure_type, ProcedureType::RequestResponse);
        assert_eq!(procedures[0].triggered, Some(1));
    }

    #[test]
    fn test_wait_procedure() {
        let jobs = vec![
            Job::wait(0, Duration::from_millis(5)),
            send(1, 32),
            Job::recv(2, 33),
        ];
        let procedures = assemble(&jobs).unwrap();
        assert_eq!(procedures.len(), 2);
        assert_eq!(procedures[0].procedure_type, ProcedureType::Wait);
        assert_eq!(procedures[0].wait, Some(0));
        assert!(procedures[0].message_jobs().is_empty());
    }

    #[test]
    fn test_response_without_initial() {
        let jobs = vec![Job::recv(0, 33)];
        assert!(matches!(
            assemble(&jobs),
            Err(ScenarioError::MalformedProcedure { job: 0, .. })
        ));
    }

    #[test]
    fn test_request_after_command_not_triggerable() {
        let jobs = vec![send(0, 64), Job::recv(1, 34)];
        assert!(matches!(
            assemble(&jobs),
            Err(ScenarioError::MalformedProcedure { job: 1, .. })
        ));
    }

    #[test]
    fn test_two_requests_in_a_row() {
        let jobs = vec![send(0, 32), Job::recv(1, 34)];
        assert!(assemble(&jobs).is_err());
    }

    #[test]
    fn test_dangling_procedure() {
        let jobs = vec![send(0, 32), Job::recv(1, 33), send(2, 36)];
        assert!(matches!(
            assemble(&jobs),
            Err(ScenarioError::MalformedProcedure { job: 2, .. })
        ));
    }

    #[test]
    fn test_wait_inside_procedure() {
        let jobs = vec![send(0, 32), Job::wait(1, Duration::ZERO), Job::recv(2, 33)];
        assert!(assemble(&jobs).is_err());
    }

    #[test]
    fn test_same_direction_rejected() {
        let jobs = vec![send(0, 32), send(1, 33)];
        assert!(assemble(&jobs).is_err());
    }

    #[test]
    fn test_assembler_resets_after_completion() {
        let mut assembler = ProcedureAssembler::new();
        assert!(assembler.feed(&send(0, 68)).unwrap().is_none());
        assert!(assembler.feed(&Job::recv(1, 69)).unwrap().is_some());
        // The command is forgotten: a plain request opens the next procedure
        assert!(assembler.feed(&send(2, 34)).unwrap().is_none());
        assert!(assembler.feed(&Job::recv(3, 35)).unwrap().is_some());
        assert!(assembler.finish(3).is_ok());
    }
}
