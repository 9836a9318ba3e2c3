//! Scenario Loading
//!
//! A scenario is an ordered list of jobs (send a message, expect a message,
//! pause) read from YAML. Outgoing messages are described by IE templates
//! whose parameters go straight to the codec's named-parameter builders.
//! After loading, the jobs are grouped into procedures.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use gtpsim_gtp::v2::{
    classify, message_name, message_type_from_tag, Gtp2IeType, IeParams, InformationElement,
    MessageCategory,
};
use gtpsim_gtp::GtpResult;
use serde::Deserialize;
use thiserror::Error;

use crate::procedure::{assemble, Procedure};

/// Errors raised while loading a scenario
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse scenario: {0}")]
    ParseError(String),

    #[error("Scenario has no jobs")]
    Empty,

    #[error("Job {job}: unknown message '{name}'")]
    UnknownMessage { job: usize, name: String },

    #[error("Job {job}: '{name}' cannot appear in a scenario")]
    InvalidMessage { job: usize, name: String },

    #[error("Job {job}: unknown IE '{name}'")]
    UnknownIe { job: usize, name: String },

    #[error("Job {job}: invalid IE template: {reason}")]
    InvalidIe { job: usize, reason: String },

    #[error("Job {job}: {reason}")]
    MalformedProcedure { job: usize, reason: String },
}

// ============================================================================
// YAML representation
// ============================================================================

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    name: String,
    #[serde(default = "default_bearers_to_create")]
    bearers_to_create: usize,
    #[serde(default)]
    jobs: Vec<JobEntry>,
}

fn default_bearers_to_create() -> usize {
    1
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum JobEntry {
    Send {
        message: String,
        #[serde(default)]
        ies: Vec<IeEntry>,
    },
    Recv {
        message: String,
    },
    Wait {
        ms: u64,
    },
}

#[derive(Debug, Deserialize)]
struct IeEntry {
    #[serde(rename = "type")]
    ie_type: String,
    #[serde(default)]
    instance: u8,
    #[serde(default)]
    params: BTreeMap<String, ParamValue>,
    #[serde(default)]
    ies: Vec<IeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ParamValue {
    Bool(bool),
    Int(u64),
    Str(String),
}

impl ParamValue {
    fn into_string(self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Str(s) => s,
        }
    }
}

// ============================================================================
// Templates
// ============================================================================

/// One IE of an outgoing message, built on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IeTemplate {
    pub ie_type: Gtp2IeType,
    pub instance: u8,
    pub params: IeParams,
    /// Children of a grouped IE
    pub children: Vec<IeTemplate>,
}

impl IeTemplate {
    pub fn new(ie_type: Gtp2IeType, instance: u8, params: IeParams) -> Self {
        Self {
            ie_type,
            instance,
            params,
            children: Vec::new(),
        }
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: IeTemplate) -> Self {
        self.children.push(child);
        self
    }

    pub fn build(&self) -> GtpResult<InformationElement> {
        let mut ie = InformationElement::from_params(self.ie_type, self.instance, &self.params)?;
        if let Some(group) = ie.as_grouped_mut() {
            for child in &self.children {
                group.ies.push(child.build()?);
            }
        }
        Ok(ie)
    }

    fn from_entry(job: usize, entry: IeEntry) -> Result<Self, ScenarioError> {
        let ie_type = Gtp2IeType::from_tag(&entry.ie_type).ok_or_else(|| ScenarioError::UnknownIe {
            job,
            name: entry.ie_type.clone(),
        })?;
        if entry.instance > 0x0F {
            return Err(ScenarioError::InvalidIe {
                job,
                reason: format!("{}: instance {} out of range", entry.ie_type, entry.instance),
            });
        }
        if !entry.ies.is_empty() && !ie_type.is_grouped() {
            return Err(ScenarioError::InvalidIe {
                job,
                reason: format!("{} is not a grouped IE", entry.ie_type),
            });
        }

        let params = entry
            .params
            .into_iter()
            .map(|(name, value)| (name, value.into_string()))
            .collect();
        let children = entry
            .ies
            .into_iter()
            .map(|child| Self::from_entry(job, child))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            ie_type,
            instance: entry.instance,
            params,
            children,
        })
    }
}

/// Outgoing message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    pub message_type: u8,
    pub ies: Vec<IeTemplate>,
}

impl MessageTemplate {
    pub fn build_ies(&self) -> GtpResult<Vec<InformationElement>> {
        self.ies.iter().map(IeTemplate::build).collect()
    }
}

// ============================================================================
// Jobs
// ============================================================================

/// What a job does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobAction {
    Send(MessageTemplate),
    Recv(u8),
    Wait(Duration),
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Position in the scenario
    pub index: usize,
    pub action: JobAction,
}

impl Job {
    pub fn send(index: usize, template: MessageTemplate) -> Self {
        Self {
            index,
            action: JobAction::Send(template),
        }
    }

    pub fn recv(index: usize, message_type: u8) -> Self {
        Self {
            index,
            action: JobAction::Recv(message_type),
        }
    }

    pub fn wait(index: usize, delay: Duration) -> Self {
        Self {
            index,
            action: JobAction::Wait(delay),
        }
    }

    pub fn message_type(&self) -> Option<u8> {
        match &self.action {
            JobAction::Send(template) => Some(template.message_type),
            JobAction::Recv(message_type) => Some(*message_type),
            JobAction::Wait(_) => None,
        }
    }

    /// Category of the message, ignoring any preceding command
    pub fn category(&self) -> Option<MessageCategory> {
        self.message_type().map(|t| classify(t, false))
    }

    pub fn is_send(&self) -> bool {
        matches!(self.action, JobAction::Send(_))
    }

    pub fn template(&self) -> Option<&MessageTemplate> {
        match &self.action {
            JobAction::Send(template) => Some(template),
            _ => None,
        }
    }

    /// Label used in logs and statistics
    pub fn label(&self) -> String {
        match &self.action {
            JobAction::Send(template) => format!("send {}", message_name(template.message_type)),
            JobAction::Recv(message_type) => format!("recv {}", message_name(*message_type)),
            JobAction::Wait(delay) => format!("wait {}ms", delay.as_millis()),
        }
    }
}

// ============================================================================
// Scenario
// ============================================================================

/// A loaded, assembled scenario
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    /// Bearers a Create Session Request sets up
    pub bearers_to_create: usize,
    pub jobs: Vec<Job>,
    pub procedures: Vec<Procedure>,
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ScenarioError> {
        let file: ScenarioFile =
            serde_yaml::from_str(yaml).map_err(|e| ScenarioError::ParseError(e.to_string()))?;

        let jobs = file
            .jobs
            .into_iter()
            .enumerate()
            .map(|(index, entry)| job_from_entry(index, entry))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(file.name, file.bearers_to_create, jobs)
    }

    /// Validate the jobs and group them into procedures
    pub fn new(name: String, bearers_to_create: usize, jobs: Vec<Job>) -> Result<Self, ScenarioError> {
        if jobs.is_empty() {
            return Err(ScenarioError::Empty);
        }
        for job in &jobs {
            if let Some(template) = job.template() {
                template.build_ies().map_err(|e| ScenarioError::InvalidIe {
                    job: job.index,
                    reason: e.to_string(),
                })?;
            }
        }

        let procedures = assemble(&jobs)?;
        log::debug!(
            "Scenario '{}': {} jobs, {} procedures",
            name,
            jobs.len(),
            procedures.len()
        );

        Ok(Self {
            name,
            bearers_to_create,
            jobs,
            procedures,
        })
    }

    pub fn job(&self, index: usize) -> Option<&Job> {
        self.jobs.get(index)
    }

    /// Scenarios whose first message job is a Send drive client sessions
    pub fn is_client(&self) -> bool {
        self.jobs
            .iter()
            .find(|job| !matches!(job.action, JobAction::Wait(_)))
            .is_some_and(Job::is_send)
    }

    /// Message type that opens a server-role session, if the scenario
    /// starts by receiving a request or command
    pub fn server_trigger(&self) -> Option<u8> {
        let first = self.jobs.first()?;
        match (&first.action, first.category()) {
            (JobAction::Recv(message_type), Some(category)) if category.is_initial() => {
                Some(*message_type)
            }
            _ => None,
        }
    }
}

fn job_from_entry(index: usize, entry: JobEntry) -> Result<Job, ScenarioError> {
    match entry {
        JobEntry::Send { message, ies } => {
            let message_type = resolve_message(index, &message)?;
            let ies = ies
                .into_iter()
                .map(|ie| IeTemplate::from_entry(index, ie))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Job::send(index, MessageTemplate { message_type, ies }))
        }
        JobEntry::Recv { message } => Ok(Job::recv(index, resolve_message(index, &message)?)),
        JobEntry::Wait { ms } => Ok(Job::wait(index, Duration::from_millis(ms))),
    }
}

fn resolve_message(job: usize, name: &str) -> Result<u8, ScenarioError> {
    let message_type = message_type_from_tag(name).ok_or_else(|| ScenarioError::UnknownMessage {
        job,
        name: name.to_string(),
    })?;
    if classify(message_type, false) == MessageCategory::Invalid {
        return Err(ScenarioError::InvalidMessage {
            job,
            name: name.to_string(),
        });
    }
    Ok(message_type)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedure::ProcedureType;

    const ATTACH_DETACH: &str = r#"
name: attach-detach
bearers_to_create: 2
jobs:
  - kind: send
    message: create_session_request
    ies:
      - { type: imsi }
      - { type: rat_type, params: { value: 6 } }
      - { type: f_teid, params: { interface_type: 10, ipv4: 127.0.0.1 } }
      - type: bearer_context
        ies:
          - { type: ebi, params: { value: 5 } }
          - { type: f_teid, instance: 0, params: { interface_type: 0, ipv4: 127.0.0.1 } }
  - kind: recv
    message: create_session_response
  - kind: wait
    ms: 250
  - kind: send
    message: delete_session_request
    ies:
      - { type: ebi, params: { value: 5 } }
      - { type: indication, params: { oi: true } }
  - kind: recv
    message: delete_session_response
"#;

    #[test]
    fn test_load_scenario() {
        let scenario = Scenario::from_yaml(ATTACH_DETACH).unwrap();
        assert_eq!(scenario.name, "attach-detach");
        assert_eq!(scenario.bearers_to_create, 2);
        assert_eq!(scenario.jobs.len(), 5);
        assert_eq!(scenario.procedures.len(), 3);
        assert!(scenario.is_client());
        assert_eq!(scenario.server_trigger(), None);

        assert_eq!(scenario.procedures[0].procedure_type, ProcedureType::RequestResponse);
        assert_eq!(scenario.procedures[1].procedure_type, ProcedureType::Wait);
        assert_eq!(scenario.jobs[2].action, JobAction::Wait(Duration::from_millis(250)));
    }

    #[test]
    fn test_template_build() {
        let scenario = Scenario::from_yaml(ATTACH_DETACH).unwrap();
        let template = scenario.jobs[0].template().unwrap();
        assert_eq!(template.message_type, 32);

        let ies = template.build_ies().unwrap();
        assert_eq!(ies.len(), 4);
        assert_eq!(ies[0].as_imsi(), Some(""));
        let fteid = ies[2].as_fteid().unwrap();
        assert_eq!(fteid.interface_type, 10);
        assert_eq!(fteid.teid, 0);

        let bearer = ies[3].as_grouped().unwrap();
        assert_eq!(bearer.ebi(), Some(5));
        assert_eq!(bearer.ies.len(), 2);
    }

    #[test]
    fn test_server_scenario() {
        let yaml = r#"
jobs:
  - { kind: recv, message: create_session_request }
  - kind: send
    message: create_session_response
    ies:
      - { type: cause, params: { value: 16 } }
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert!(!scenario.is_client());
        assert_eq!(scenario.server_trigger(), Some(32));
        assert_eq!(scenario.bearers_to_create, 1);
    }

    #[test]
    fn test_unknown_names() {
        let yaml = "jobs:\n  - { kind: send, message: attach_request }\n";
        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(ScenarioError::UnknownMessage { job: 0, .. })
        ));

        let yaml = r#"
jobs:
  - kind: send
    message: echo_request
    ies:
      - { type: not_an_ie }
"#;
        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(ScenarioError::UnknownIe { job: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_message_category() {
        let yaml = "jobs:\n  - { kind: recv, message: version_not_supported_indication }\n";
        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(ScenarioError::InvalidMessage { .. })
        ));
    }

    #[test]
    fn test_invalid_ie_params() {
        let yaml = r#"
jobs:
  - kind: send
    message: create_session_request
    ies:
      - { type: ebi, params: { value: 300 } }
  - { kind: recv, message: create_session_response }
"#;
        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(ScenarioError::InvalidIe { job: 0, .. })
        ));

        let yaml = r#"
jobs:
  - kind: send
    message: create_session_request
    ies:
      - type: ebi
        ies:
          - { type: ebi }
"#;
        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(ScenarioError::InvalidIe { .. })
        ));

        let yaml = r#"
jobs:
  - kind: send
    message: create_session_request
    ies:
      - { type: pco, params: { hex: "aé0" } }
  - { kind: recv, message: create_session_response }
"#;
        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(ScenarioError::InvalidIe { job: 0, .. })
        ));
    }

    #[test]
    fn test_empty_and_unparsable() {
        assert!(matches!(Scenario::from_yaml("name: x\n"), Err(ScenarioError::Empty)));
        assert!(matches!(
            Scenario::from_yaml("jobs:\n  - { kind: jump }\n"),
            Err(ScenarioError::ParseError(_))
        ));
    }

    #[test]
    fn test_job_labels() {
        assert_eq!(Job::recv(0, 33).label(), "recv Create Session Response");
        assert_eq!(Job::wait(1, Duration::from_millis(10)).label(), "wait 10ms");
    }

    #[test]
    fn test_bundled_scenarios() {
        let attach = Scenario::from_yaml(include_str!("../../../../scenarios/attach_detach.yaml")).unwrap();
        assert!(attach.is_client());
        assert_eq!(attach.procedures.len(), 4);

        let answer = Scenario::from_yaml(include_str!("../../../../scenarios/answer_attach.yaml")).unwrap();
        assert_eq!(answer.server_trigger(), Some(32));
        assert_eq!(answer.procedures.len(), 2);

        let bearer =
            Scenario::from_yaml(include_str!("../../../../scenarios/dedicated_bearer.yaml")).unwrap();
        assert_eq!(bearer.procedures.len(), 3);
        assert_eq!(bearer.procedures[1].procedure_type, ProcedureType::RequestTriggeredReply);
        assert_eq!(bearer.procedures[1].message_jobs(), vec![2, 3, 4]);
    }
}
