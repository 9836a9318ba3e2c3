//! GTPv2-C message classification
//!
//! Static table mapping each message type to its category, display name and
//! scenario tag.

use super::header::Gtp2MessageType;
use Gtp2MessageType as T;
use MessageCategory::{Command, CommandFailureIndication, Invalid, Request, Response};

/// Role a message type plays in a procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCategory {
    Command,
    Request,
    Response,
    CommandFailureIndication,
    Invalid,
}

impl MessageCategory {
    /// Whether messages of this category open a transaction and get retried
    pub fn is_initial(&self) -> bool {
        matches!(self, Self::Command | Self::Request)
    }
}

struct MessageInfo {
    message_type: Gtp2MessageType,
    name: &'static str,
    tag: &'static str,
    category: MessageCategory,
}

const fn info(
    message_type: Gtp2MessageType,
    name: &'static str,
    tag: &'static str,
    category: MessageCategory,
) -> MessageInfo {
    MessageInfo {
        message_type,
        name,
        tag,
        category,
    }
}

const MESSAGE_TABLE: &[MessageInfo] = &[
    info(T::EchoRequest, "Echo Request", "echo_request", Request),
    info(T::EchoResponse, "Echo Response", "echo_response", Response),
    info(
        T::VersionNotSupportedIndication,
        "Version Not Supported Indication",
        "version_not_supported_indication",
        Invalid,
    ),
    info(T::CreateSessionRequest, "Create Session Request", "create_session_request", Request),
    info(T::CreateSessionResponse, "Create Session Response", "create_session_response", Response),
    info(T::ModifyBearerRequest, "Modify Bearer Request", "modify_bearer_request", Request),
    info(T::ModifyBearerResponse, "Modify Bearer Response", "modify_bearer_response", Response),
    info(T::DeleteSessionRequest, "Delete Session Request", "delete_session_request", Request),
    info(T::DeleteSessionResponse, "Delete Session Response", "delete_session_response", Response),
    info(
        T::ChangeNotificationRequest,
        "Change Notification Request",
        "change_notification_request",
        Request,
    ),
    info(
        T::ChangeNotificationResponse,
        "Change Notification Response",
        "change_notification_response",
        Response,
    ),
    info(
        T::RemoteUeReportNotification,
        "Remote UE Report Notification",
        "remote_ue_report_notification",
        Request,
    ),
    info(
        T::RemoteUeReportAcknowledge,
        "Remote UE Report Acknowledge",
        "remote_ue_report_acknowledge",
        Response,
    ),
    info(T::ModifyBearerCommand, "Modify Bearer Command", "modify_bearer_command", Command),
    info(
        T::ModifyBearerFailureIndication,
        "Modify Bearer Failure Indication",
        "modify_bearer_failure_indication",
        CommandFailureIndication,
    ),
    info(T::DeleteBearerCommand, "Delete Bearer Command", "delete_bearer_command", Command),
    info(
        T::DeleteBearerFailureIndication,
        "Delete Bearer Failure Indication",
        "delete_bearer_failure_indication",
        CommandFailureIndication,
    ),
    info(T::BearerResourceCommand, "Bearer Resource Command", "bearer_resource_command", Command),
    info(
        T::BearerResourceFailureIndication,
        "Bearer Resource Failure Indication",
        "bearer_resource_failure_indication",
        CommandFailureIndication,
    ),
    info(
        T::DownlinkDataNotificationFailureIndication,
        "Downlink Data Notification Failure Indication",
        "downlink_data_notification_failure_indication",
        Invalid,
    ),
    info(T::TraceSessionActivation, "Trace Session Activation", "trace_session_activation", Invalid),
    info(
        T::TraceSessionDeactivation,
        "Trace Session Deactivation",
        "trace_session_deactivation",
        Invalid,
    ),
    info(T::StopPagingIndication, "Stop Paging Indication", "stop_paging_indication", Invalid),
    info(T::CreateBearerRequest, "Create Bearer Request", "create_bearer_request", Request),
    info(T::CreateBearerResponse, "Create Bearer Response", "create_bearer_response", Response),
    info(T::UpdateBearerRequest, "Update Bearer Request", "update_bearer_request", Request),
    info(T::UpdateBearerResponse, "Update Bearer Response", "update_bearer_response", Response),
    info(T::DeleteBearerRequest, "Delete Bearer Request", "delete_bearer_request", Request),
    info(T::DeleteBearerResponse, "Delete Bearer Response", "delete_bearer_response", Response),
    info(
        T::DeletePdnConnectionSetRequest,
        "Delete PDN Connection Set Request",
        "delete_pdn_connection_set_request",
        Request,
    ),
    info(
        T::DeletePdnConnectionSetResponse,
        "Delete PDN Connection Set Response",
        "delete_pdn_connection_set_response",
        Response,
    ),
    info(
        T::PgwDownlinkTriggeringNotification,
        "PGW Downlink Triggering Notification",
        "pgw_downlink_triggering_notification",
        Request,
    ),
    info(
        T::PgwDownlinkTriggeringAcknowledge,
        "PGW Downlink Triggering Acknowledge",
        "pgw_downlink_triggering_acknowledge",
        Response,
    ),
    info(
        T::CreateForwardingTunnelRequest,
        "Create Forwarding Tunnel Request",
        "create_forwarding_tunnel_request",
        Request,
    ),
    info(
        T::CreateForwardingTunnelResponse,
        "Create Forwarding Tunnel Response",
        "create_forwarding_tunnel_response",
        Response,
    ),
    info(T::SuspendNotification, "Suspend Notification", "suspend_notification", Request),
    info(T::SuspendAcknowledge, "Suspend Acknowledge", "suspend_acknowledge", Response),
    info(T::ResumeNotification, "Resume Notification", "resume_notification", Request),
    info(T::ResumeAcknowledge, "Resume Acknowledge", "resume_acknowledge", Response),
    info(
        T::CreateIndirectDataForwardingTunnelRequest,
        "Create Indirect Data Forwarding Tunnel Request",
        "create_indirect_data_forwarding_tunnel_request",
        Request,
    ),
    info(
        T::CreateIndirectDataForwardingTunnelResponse,
        "Create Indirect Data Forwarding Tunnel Response",
        "create_indirect_data_forwarding_tunnel_response",
        Response,
    ),
    info(
        T::DeleteIndirectDataForwardingTunnelRequest,
        "Delete Indirect Data Forwarding Tunnel Request",
        "delete_indirect_data_forwarding_tunnel_request",
        Request,
    ),
    info(
        T::DeleteIndirectDataForwardingTunnelResponse,
        "Delete Indirect Data Forwarding Tunnel Response",
        "delete_indirect_data_forwarding_tunnel_response",
        Response,
    ),
    info(
        T::ReleaseAccessBearersRequest,
        "Release Access Bearers Request",
        "release_access_bearers_request",
        Request,
    ),
    info(
        T::ReleaseAccessBearersResponse,
        "Release Access Bearers Response",
        "release_access_bearers_response",
        Response,
    ),
    info(
        T::DownlinkDataNotification,
        "Downlink Data Notification",
        "downlink_data_notification",
        Request,
    ),
    info(
        T::DownlinkDataNotificationAcknowledge,
        "Downlink Data Notification Acknowledge",
        "downlink_data_notification_acknowledge",
        Response,
    ),
    info(
        T::PgwRestartNotification,
        "PGW Restart Notification",
        "pgw_restart_notification",
        Request,
    ),
    info(
        T::PgwRestartNotificationAcknowledge,
        "PGW Restart Notification Acknowledge",
        "pgw_restart_notification_acknowledge",
        Response,
    ),
    info(
        T::UpdatePdnConnectionSetRequest,
        "Update PDN Connection Set Request",
        "update_pdn_connection_set_request",
        Request,
    ),
    info(
        T::UpdatePdnConnectionSetResponse,
        "Update PDN Connection Set Response",
        "update_pdn_connection_set_response",
        Response,
    ),
    info(
        T::ModifyAccessBearersRequest,
        "Modify Access Bearers Request",
        "modify_access_bearers_request",
        Request,
    ),
    info(
        T::ModifyAccessBearersResponse,
        "Modify Access Bearers Response",
        "modify_access_bearers_response",
        Response,
    ),
];

fn lookup(message_type: u8) -> Option<&'static MessageInfo> {
    MESSAGE_TABLE
        .iter()
        .find(|info| info.message_type as u8 == message_type)
}

/// Create/Update/Delete Bearer Request and Response.
///
/// Sent standalone on S5/S8, or as the network's answer to a Command on
/// S11/S4.
pub fn is_command_triggerable(message_type: u8) -> bool {
    let first = T::CreateBearerRequest as u8;
    let last = T::DeleteBearerResponse as u8;
    (first..=last).contains(&message_type)
}

/// Category of `message_type` as seen by a procedure that has (or has not)
/// already consumed a Command.
///
/// After a Command only the bearer messages may follow as Requests; any
/// other Request there is `Invalid`.
pub fn classify(message_type: u8, command_seen: bool) -> MessageCategory {
    let category = lookup(message_type).map_or(Invalid, |info| info.category);
    if command_seen && category == Request && !is_command_triggerable(message_type) {
        return Invalid;
    }
    category
}

/// Human-readable name, e.g. "Create Session Request"
pub fn message_name(message_type: u8) -> &'static str {
    lookup(message_type).map_or("Unknown", |info| info.name)
}

/// Scenario tag, e.g. "create_session_request"
pub fn message_tag(message_type: u8) -> &'static str {
    lookup(message_type).map_or("unknown", |info| info.tag)
}

/// Reverse of [`message_tag`]
pub fn message_type_from_tag(tag: &str) -> Option<u8> {
    MESSAGE_TABLE
        .iter()
        .find(|info| info.tag.eq_ignore_ascii_case(tag))
        .map(|info| info.message_type as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_categories() {
        assert_eq!(classify(32, false), Request);
        assert_eq!(classify(33, false), Response);
        assert_eq!(classify(64, false), Command);
        assert_eq!(classify(65, false), CommandFailureIndication);
        assert_eq!(classify(1, false), Request);
        assert_eq!(classify(2, false), Response);
    }

    #[test]
    fn test_invalid_types() {
        for message_type in [0, 3, 70, 71, 72, 73, 255] {
            assert_eq!(classify(message_type, false), Invalid, "type {message_type}");
        }
    }

    #[test]
    fn test_request_after_command() {
        // Bearer requests may be triggered by a command
        assert_eq!(classify(95, true), Request);
        assert_eq!(classify(97, true), Request);
        assert_eq!(classify(99, true), Request);
        assert_eq!(classify(96, true), Response);
        // Anything else is not
        assert_eq!(classify(32, true), Invalid);
        assert_eq!(classify(34, true), Invalid);
        // Responses are unaffected
        assert_eq!(classify(33, true), Response);
    }

    #[test]
    fn test_names_and_tags() {
        assert_eq!(message_name(32), "Create Session Request");
        assert_eq!(message_tag(32), "create_session_request");
        assert_eq!(message_type_from_tag("create_session_request"), Some(32));
        assert_eq!(message_type_from_tag("Delete_Bearer_Command"), Some(66));
        assert_eq!(message_type_from_tag("nope"), None);
        assert_eq!(message_name(250), "Unknown");

        for info in MESSAGE_TABLE {
            assert_eq!(message_type_from_tag(info.tag), Some(info.message_type as u8));
        }
    }

    #[test]
    fn test_table_covers_every_message_type() {
        for value in 0..=u8::MAX {
            if let Ok(message_type) = Gtp2MessageType::try_from(value) {
                assert!(lookup(message_type as u8).is_some(), "{message_type:?} missing");
            }
        }
    }
}
