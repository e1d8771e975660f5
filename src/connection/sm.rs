use crate::model::{ApnContext, Cid, DataCallResponse, FailCause, LinkProperties, LocalSessionId, RetryHint};

/// Phase of a [`Session`]'s lifecycle. Named distinctly from
/// [`ConnectionEvent`]/[`ConnectionEffect`] so a reader can tell state from
/// transition at a glance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Inactive,
    Activating,
    Retrying,
    Active,
    Disconnecting,
}

/// Everything the reducer needs to decide the next state. Lives inside the
/// owning [`crate::connection::DcController`]; the reducer itself never
/// touches a radio or a clock.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: LocalSessionId,
    pub apn: ApnContext,
    pub state: ConnectionState,
    pub cid: Option<Cid>,
    pub link_properties: LinkProperties,
    pub retry_count: u32,
}

impl Session {
    pub fn new(id: LocalSessionId, apn: ApnContext) -> Self {
        Self {
            id,
            apn,
            state: ConnectionState::Inactive,
            cid: None,
            link_properties: LinkProperties::default(),
            retry_count: 0,
        }
    }
}

/// Stimuli the reducer can receive. Inbound from the radio, from a policy
/// decision above (handover, teardown-on-request), or from the retry timer.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// Start (or restart) activation.
    Activate,
    /// `setup_data_call` completed.
    SetupComplete(DataCallResponse),
    /// An unsolicited call-list snapshot reports this session's `Cid` as
    /// gone, or with a new fail cause.
    ListReportsFailure(FailCause),
    /// The unsolicited list now reconciles this session's link properties
    /// to a new value.
    ListReportsLinkProperties(LinkProperties),
    /// The retry timer fired.
    RetryTimerFired,
    /// Something above (teardown, handover, disable) asked for a clean
    /// disconnect.
    Disconnect,
    /// `deactivate_data_call` completed.
    DeactivateComplete,
}

/// Side effects the owner must carry out. The reducer only describes them;
/// [`crate::connection::DcController`] executes them.
#[derive(Debug, Clone)]
pub enum ConnectionEffect {
    CallSetupDataCall,
    CallDeactivateDataCall(Cid),
    ScheduleRetry(std::time::Duration),
    PublishLinkProperties(LinkProperties),
    PublishDisconnected,
    NotifyActive,
    /// The setup failure classified as [`crate::model::FailureClass::RadioRestart`];
    /// the owner must ask the radio facade to restart. The session itself
    /// goes `Inactive` rather than retrying in place, since the radio
    /// restarting means every session on it needs rebuilding anyway.
    RequestRadioRestart,
}

/// Pure state transition. No I/O, no clock reads — every side effect the
/// caller must perform comes back as a [`ConnectionEffect`].
pub fn step(session: &mut Session, event: ConnectionEvent) -> Vec<ConnectionEffect> {
    match (session.state, event) {
        (ConnectionState::Inactive, ConnectionEvent::Activate) => {
            session.state = ConnectionState::Activating;
            vec![ConnectionEffect::CallSetupDataCall]
        }

        (ConnectionState::Activating, ConnectionEvent::SetupComplete(response)) => {
            if response.validate().is_ok() && response.status == crate::model::DataCallStatus::Success {
                session.cid = Some(response.cid);
                session.link_properties = response.link_properties();
                session.retry_count = 0;
                session.state = ConnectionState::Active;
                vec![
                    ConnectionEffect::PublishLinkProperties(session.link_properties.clone()),
                    ConnectionEffect::NotifyActive,
                ]
            } else {
                let fail_cause = match response.status {
                    crate::model::DataCallStatus::Failed(cause) => cause,
                    crate::model::DataCallStatus::Success => FailCause(0),
                };
                handle_setup_failure(session, fail_cause, response.suggested_retry)
            }
        }

        (ConnectionState::Activating | ConnectionState::Retrying, ConnectionEvent::RetryTimerFired) => {
            session.state = ConnectionState::Activating;
            vec![ConnectionEffect::CallSetupDataCall]
        }

        (ConnectionState::Active, ConnectionEvent::ListReportsLinkProperties(new_props)) => {
            use crate::model::LinkPropertiesDelta;
            match session.link_properties.reconcile(&new_props) {
                LinkPropertiesDelta::Identical => vec![],
                LinkPropertiesDelta::UpdateInPlace => {
                    session.link_properties = new_props.clone();
                    vec![ConnectionEffect::PublishLinkProperties(new_props)]
                }
                LinkPropertiesDelta::RequiresCleanup => {
                    session.state = ConnectionState::Retrying;
                    session.retry_count += 1;
                    vec![
                        ConnectionEffect::PublishDisconnected,
                        ConnectionEffect::ScheduleRetry(std::time::Duration::from_secs(0)),
                    ]
                }
            }
        }

        (ConnectionState::Active, ConnectionEvent::ListReportsFailure(cause)) => {
            handle_setup_failure(session, cause, RetryHint::UseRetryManager)
        }

        (_, ConnectionEvent::Disconnect) => {
            session.state = ConnectionState::Disconnecting;
            match session.cid {
                Some(cid) => vec![ConnectionEffect::CallDeactivateDataCall(cid)],
                None => {
                    session.state = ConnectionState::Inactive;
                    vec![ConnectionEffect::PublishDisconnected]
                }
            }
        }

        (ConnectionState::Disconnecting, ConnectionEvent::DeactivateComplete) => {
            session.state = ConnectionState::Inactive;
            session.cid = None;
            vec![ConnectionEffect::PublishDisconnected]
        }

        // Events that don't apply to the current state are dropped rather
        // than panicking — late radio callbacks racing a newer transition
        // are expected, not exceptional.
        (_, _) => vec![],
    }
}

fn handle_setup_failure(
    session: &mut Session,
    cause: FailCause,
    hint: RetryHint,
) -> Vec<ConnectionEffect> {
    use crate::model::FailureClass;
    match cause.classify() {
        FailureClass::Permanent => {
            session.state = ConnectionState::Inactive;
            session.cid = None;
            vec![ConnectionEffect::PublishDisconnected]
        }
        FailureClass::RadioRestart => {
            session.state = ConnectionState::Inactive;
            session.cid = None;
            vec![ConnectionEffect::PublishDisconnected, ConnectionEffect::RequestRadioRestart]
        }
        FailureClass::Transient => {
            session.cid = None;
            session.state = ConnectionState::Retrying;
            session.retry_count += 1;
            match hint {
                RetryHint::Never => {
                    session.state = ConnectionState::Inactive;
                    vec![ConnectionEffect::PublishDisconnected]
                }
                RetryHint::After(delay) => vec![ConnectionEffect::ScheduleRetry(delay)],
                RetryHint::UseRetryManager => {
                    vec![ConnectionEffect::ScheduleRetry(std::time::Duration::from_secs(0))]
                }
            }
        }
    }
}
