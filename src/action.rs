use crate::error::ExplorerError;
use crate::model::{Catalog, ResourceKind};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

const DESTRUCTIVE: [&str; 5] = ["power-off", "delete", "remove", "revert", "evacuate"];

pub fn is_destructive(action: &str) -> bool {
    DESTRUCTIVE.contains(&action)
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// Retriability is part of the error value; the protocol never probes for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("{0}")]
    Retriable(String),
    #[error("{0}")]
    Fatal(String),
}

impl ExecError {
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Retriable(_))
    }
}

pub trait ActionExecutor {
    fn execute(
        &mut self,
        kind: ResourceKind,
        action: &str,
        targets: &[String],
    ) -> Result<(), ExecError>;
}

pub trait ActionCanceler {
    fn cancel(
        &mut self,
        kind: ResourceKind,
        action: &str,
        targets: &[String],
    ) -> Result<(), ExecError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub kind: ResourceKind,
    pub action: String,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionStatus {
    Queued,
    Running,
    Success,
    Failure,
    Cancelled,
    PostState(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTransition {
    pub action: String,
    pub status: TransitionStatus,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionAudit {
    pub actor: String,
    pub at: DateTime<Utc>,
    pub kind: ResourceKind,
    pub action: String,
    pub targets: Vec<String>,
    pub outcome: AuditOutcome,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ActionTuning {
    pub timeout_ms: HashMap<String, i64>,
    pub retries: HashMap<String, u32>,
}

impl ActionTuning {
    fn timeout_for(&self, action: &str) -> Option<i64> {
        self.timeout_ms.get(action).copied()
    }

    fn retry_limit(&self, action: &str) -> u32 {
        self.retries.get(action).copied().unwrap_or(0)
    }
}

pub fn parse_action_text(text: &str) -> Result<(String, Vec<(String, String)>), ExplorerError> {
    let mut tokens = text.split_whitespace();
    let name = tokens
        .next()
        .ok_or_else(|| ExplorerError::InvalidAction("empty action".to_string()))?
        .to_ascii_lowercase();
    let mut options = Vec::new();
    for token in tokens {
        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                options.push((key.to_ascii_lowercase(), value.to_string()));
            }
            _ => {
                return Err(ExplorerError::InvalidAction(format!(
                    "malformed option '{token}', expected key=value"
                )));
            }
        }
    }
    Ok((name, options))
}

pub fn validate_options(
    kind: ResourceKind,
    action: &str,
    options: &[(String, String)],
    catalog: &Catalog,
) -> Result<(), ExplorerError> {
    match (kind, action) {
        (ResourceKind::Vms, "migrate") => match options {
            [(key, value)] if key == "host" => {
                if catalog.host(value).is_none() {
                    return Err(ExplorerError::InvalidAction(format!(
                        "unknown migration host '{value}'"
                    )));
                }
                Ok(())
            }
            [(key, value)] if key == "datastore" => {
                if catalog.datastore(value).is_none() {
                    return Err(ExplorerError::InvalidAction(format!(
                        "unknown migration datastore '{value}'"
                    )));
                }
                Ok(())
            }
            _ => Err(ExplorerError::InvalidAction(
                "migrate requires exactly one of host= or datastore=".to_string(),
            )),
        },
        (ResourceKind::Snapshots, "create") => match options {
            [(key, _)] if key == "snapshot" => Ok(()),
            _ => Err(ExplorerError::InvalidAction(
                "create requires exactly snapshot=<name>".to_string(),
            )),
        },
        (ResourceKind::Snapshots, "remove" | "revert") => match options {
            [(key, value)] if key == "snapshot" => {
                if catalog.snapshot_by_id(value).is_none() {
                    return Err(ExplorerError::InvalidAction(format!(
                        "unknown snapshot id '{value}'"
                    )));
                }
                Ok(())
            }
            _ => Err(ExplorerError::InvalidAction(format!(
                "{action} requires exactly snapshot=<id>"
            ))),
        },
        _ if !options.is_empty() => Err(ExplorerError::InvalidAction(format!(
            "'{action}' takes no options"
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostActionEffect {
    SetHostConnection { state: &'static str },
}

pub fn post_action_effect(kind: ResourceKind, action: &str) -> Option<PostActionEffect> {
    match (kind, action) {
        (ResourceKind::Hosts, "enter-maintenance") => Some(PostActionEffect::SetHostConnection {
            state: "maintenance",
        }),
        (ResourceKind::Hosts, "exit-maintenance") => Some(PostActionEffect::SetHostConnection {
            state: "connected",
        }),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct ActionProtocol {
    tuning: ActionTuning,
    pending: Option<ActionRequest>,
    last: Option<ActionRequest>,
    transitions: Vec<ActionTransition>,
    audits: Vec<ActionAudit>,
}

impl ActionProtocol {
    pub fn new(tuning: ActionTuning) -> Self {
        Self {
            tuning,
            ..Self::default()
        }
    }

    pub fn transitions(&self) -> &[ActionTransition] {
        &self.transitions
    }

    pub fn audits(&self) -> &[ActionAudit] {
        &self.audits
    }

    pub fn pending_confirmation(&self) -> Option<&ActionRequest> {
        self.pending.as_ref()
    }

    pub fn record_post_state(&mut self, action: &str, state: &str, clock: &dyn Clock) {
        self.push(action, TransitionStatus::PostState(state.to_string()), clock);
    }

    pub fn dispatch(
        &mut self,
        request: ActionRequest,
        actor: &str,
        executor: &mut dyn ActionExecutor,
        clock: &dyn Clock,
    ) -> Result<(), ExplorerError> {
        // A pending confirmation survives only an identical follow-up call.
        let pending = self.pending.take();
        if is_destructive(&request.action) && pending.as_ref() != Some(&request) {
            self.pending = Some(request.clone());
            return Err(ExplorerError::ConfirmationRequired {
                action: request.action,
                targets: request.targets.len(),
            });
        }

        self.last = Some(request.clone());
        self.push(&request.action, TransitionStatus::Queued, clock);
        self.push(&request.action, TransitionStatus::Running, clock);

        let attempts = 1 + self.tuning.retry_limit(&request.action);
        let timeout_ms = self.tuning.timeout_for(&request.action);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let started = clock.now();
            match executor.execute(request.kind, &request.action, &request.targets) {
                Ok(()) => {
                    if let Some(limit_ms) = timeout_ms {
                        let elapsed_ms = (clock.now() - started).num_milliseconds();
                        if elapsed_ms > limit_ms {
                            let err = ExplorerError::ActionTimeout {
                                action: request.action.clone(),
                                elapsed_ms,
                                limit_ms,
                            };
                            self.finish_failure(&request, actor, clock);
                            return Err(err);
                        }
                    }
                    debug!(action = %request.action, attempt, "action succeeded");
                    self.push(&request.action, TransitionStatus::Success, clock);
                    self.audits.push(ActionAudit {
                        actor: actor.to_string(),
                        at: clock.now(),
                        kind: request.kind,
                        action: request.action.clone(),
                        targets: request.targets.clone(),
                        outcome: AuditOutcome::Success,
                        failed: Vec::new(),
                    });
                    return Ok(());
                }
                Err(err) if err.is_retriable() && attempt < attempts => {
                    warn!(action = %request.action, attempt, %err, "retrying action");
                }
                Err(err) => {
                    self.finish_failure(&request, actor, clock);
                    return Err(ExplorerError::ActionFailed(err.to_string()));
                }
            }
        }
    }

    pub fn cancel_last(
        &mut self,
        canceler: Option<&mut dyn ActionCanceler>,
        clock: &dyn Clock,
    ) -> Result<(), ExplorerError> {
        let request = self.last.clone().ok_or(ExplorerError::NothingToCancel)?;
        let canceler = canceler.ok_or(ExplorerError::CancelUnsupported)?;
        canceler
            .cancel(request.kind, &request.action, &request.targets)
            .map_err(|err| ExplorerError::ActionFailed(err.to_string()))?;
        self.push(&request.action, TransitionStatus::Cancelled, clock);
        Ok(())
    }

    fn finish_failure(&mut self, request: &ActionRequest, actor: &str, clock: &dyn Clock) {
        self.push(&request.action, TransitionStatus::Failure, clock);
        self.audits.push(ActionAudit {
            actor: actor.to_string(),
            at: clock.now(),
            kind: request.kind,
            action: request.action.clone(),
            targets: request.targets.clone(),
            outcome: AuditOutcome::Failure,
            failed: request.targets.clone(),
        });
    }

    fn push(&mut self, action: &str, status: TransitionStatus, clock: &dyn Clock) {
        self.transitions.push(ActionTransition {
            action: action.to_string(),
            status,
            at: clock.now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ActionCanceler, ActionExecutor, ActionProtocol, ActionRequest, ActionTuning, AuditOutcome,
        Clock, ExecError, TransitionStatus, parse_action_text, post_action_effect,
        validate_options,
    };
    use crate::error::ExplorerError;
    use crate::model::{ResourceKind, sample_catalog};
    use chrono::{DateTime, Duration, Utc};
    use std::cell::RefCell;

    struct SteppingClock {
        now: RefCell<DateTime<Utc>>,
        step_ms: i64,
    }

    impl SteppingClock {
        fn new(step_ms: i64) -> Self {
            Self {
                now: RefCell::new(Utc::now()),
                step_ms,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let mut now = self.now.borrow_mut();
            *now += Duration::milliseconds(self.step_ms);
            *now
        }
    }

    struct ScriptedExecutor {
        calls: usize,
        script: Vec<Result<(), ExecError>>,
    }

    impl ScriptedExecutor {
        fn new(script: Vec<Result<(), ExecError>>) -> Self {
            Self { calls: 0, script }
        }
    }

    impl ActionExecutor for ScriptedExecutor {
        fn execute(
            &mut self,
            _kind: ResourceKind,
            _action: &str,
            _targets: &[String],
        ) -> Result<(), ExecError> {
            let result = self.script[self.calls.min(self.script.len() - 1)].clone();
            self.calls += 1;
            result
        }
    }

    struct RecordingCanceler {
        cancelled: Vec<String>,
    }

    impl ActionCanceler for RecordingCanceler {
        fn cancel(
            &mut self,
            _kind: ResourceKind,
            action: &str,
            _targets: &[String],
        ) -> Result<(), ExecError> {
            self.cancelled.push(action.to_string());
            Ok(())
        }
    }

    fn request(action: &str) -> ActionRequest {
        ActionRequest {
            kind: ResourceKind::Vms,
            action: action.to_string(),
            targets: vec!["vm-alpha".to_string()],
        }
    }

    #[test]
    fn action_text_parses_name_and_options() {
        let (name, options) = parse_action_text("migrate host=esx-02").unwrap();
        assert_eq!(name, "migrate");
        assert_eq!(
            options,
            vec![("host".to_string(), "esx-02".to_string())]
        );
        assert!(parse_action_text("migrate host").is_err());
        assert!(parse_action_text("migrate =x").is_err());
    }

    #[test]
    fn migrate_requires_one_known_placement_option() {
        let catalog = sample_catalog();
        let host = [("host".to_string(), "esx-02".to_string())];
        assert!(validate_options(ResourceKind::Vms, "migrate", &host, &catalog).is_ok());

        let store = [("datastore".to_string(), "ssd-01".to_string())];
        assert!(validate_options(ResourceKind::Vms, "migrate", &store, &catalog).is_ok());

        let unknown = [("host".to_string(), "esx-99".to_string())];
        assert!(validate_options(ResourceKind::Vms, "migrate", &unknown, &catalog).is_err());

        let both = [
            ("host".to_string(), "esx-02".to_string()),
            ("datastore".to_string(), "ssd-01".to_string()),
        ];
        assert!(validate_options(ResourceKind::Vms, "migrate", &both, &catalog).is_err());
        assert!(validate_options(ResourceKind::Vms, "migrate", &[], &catalog).is_err());
    }

    #[test]
    fn snapshot_actions_validate_their_single_option() {
        let catalog = sample_catalog();
        let name = [("snapshot".to_string(), "nightly".to_string())];
        assert!(validate_options(ResourceKind::Snapshots, "create", &name, &catalog).is_ok());

        let known = [("snapshot".to_string(), "snap-101".to_string())];
        assert!(validate_options(ResourceKind::Snapshots, "remove", &known, &catalog).is_ok());
        assert!(validate_options(ResourceKind::Snapshots, "revert", &known, &catalog).is_ok());

        let unknown = [("snapshot".to_string(), "snap-999".to_string())];
        assert!(validate_options(ResourceKind::Snapshots, "remove", &unknown, &catalog).is_err());
        assert!(validate_options(ResourceKind::Snapshots, "create", &[], &catalog).is_err());
    }

    #[test]
    fn plain_actions_reject_any_option() {
        let catalog = sample_catalog();
        let stray = [("force".to_string(), "true".to_string())];
        assert!(validate_options(ResourceKind::Vms, "power-on", &stray, &catalog).is_err());
        assert!(validate_options(ResourceKind::Vms, "power-on", &[], &catalog).is_ok());
    }

    #[test]
    fn destructive_action_needs_identical_second_call() {
        let mut protocol = ActionProtocol::new(ActionTuning::default());
        let mut executor = ScriptedExecutor::new(vec![Ok(())]);
        let clock = SteppingClock::new(1);

        let first = protocol.dispatch(request("power-off"), "op", &mut executor, &clock);
        assert_eq!(
            first,
            Err(ExplorerError::ConfirmationRequired {
                action: "power-off".to_string(),
                targets: 1
            })
        );
        assert_eq!(executor.calls, 0);

        let second = protocol.dispatch(request("power-off"), "op", &mut executor, &clock);
        assert!(second.is_ok());
        assert_eq!(executor.calls, 1);
        assert!(protocol.pending_confirmation().is_none());
    }

    #[test]
    fn differing_request_discards_pending_confirmation() {
        let mut protocol = ActionProtocol::new(ActionTuning::default());
        let mut executor = ScriptedExecutor::new(vec![Ok(())]);
        let clock = SteppingClock::new(1);

        let _ = protocol.dispatch(request("power-off"), "op", &mut executor, &clock);
        let _ = protocol.dispatch(request("delete"), "op", &mut executor, &clock);
        // power-off is no longer pending, so repeating it starts over
        let again = protocol.dispatch(request("power-off"), "op", &mut executor, &clock);
        assert!(matches!(
            again,
            Err(ExplorerError::ConfirmationRequired { .. })
        ));
        assert_eq!(executor.calls, 0);
    }

    #[test]
    fn non_retriable_failure_is_observed_once() {
        let mut tuning = ActionTuning::default();
        tuning.retries.insert("power-on".to_string(), 3);
        let mut protocol = ActionProtocol::new(tuning);
        let mut executor =
            ScriptedExecutor::new(vec![Err(ExecError::Fatal("backend down".to_string()))]);
        let clock = SteppingClock::new(1);

        let result = protocol.dispatch(request("power-on"), "op", &mut executor, &clock);
        assert!(matches!(result, Err(ExplorerError::ActionFailed(_))));
        assert_eq!(executor.calls, 1);
    }

    #[test]
    fn retriable_failure_uses_full_attempt_budget() {
        let mut tuning = ActionTuning::default();
        tuning.retries.insert("power-on".to_string(), 2);
        let mut protocol = ActionProtocol::new(tuning);
        let mut executor =
            ScriptedExecutor::new(vec![Err(ExecError::Retriable("busy".to_string()))]);
        let clock = SteppingClock::new(1);

        let result = protocol.dispatch(request("power-on"), "op", &mut executor, &clock);
        assert!(matches!(result, Err(ExplorerError::ActionFailed(_))));
        assert_eq!(executor.calls, 3);

        let audit = protocol.audits().last().unwrap();
        assert_eq!(audit.outcome, AuditOutcome::Failure);
        assert_eq!(audit.failed, vec!["vm-alpha".to_string()]);
    }

    #[test]
    fn retriable_failure_then_success_recovers() {
        let mut tuning = ActionTuning::default();
        tuning.retries.insert("power-on".to_string(), 1);
        let mut protocol = ActionProtocol::new(tuning);
        let mut executor = ScriptedExecutor::new(vec![
            Err(ExecError::Retriable("busy".to_string())),
            Ok(()),
        ]);
        let clock = SteppingClock::new(1);

        assert!(
            protocol
                .dispatch(request("power-on"), "op", &mut executor, &clock)
                .is_ok()
        );
        assert_eq!(executor.calls, 2);
        let statuses: Vec<&TransitionStatus> = protocol
            .transitions()
            .iter()
            .map(|transition| &transition.status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                &TransitionStatus::Queued,
                &TransitionStatus::Running,
                &TransitionStatus::Success
            ]
        );
    }

    #[test]
    fn slow_success_becomes_a_timeout_failure() {
        let mut tuning = ActionTuning::default();
        tuning.timeout_ms.insert("power-on".to_string(), 10);
        let mut protocol = ActionProtocol::new(tuning);
        let mut executor = ScriptedExecutor::new(vec![Ok(())]);
        // every clock reading advances 50ms, so the attempt "takes" 50ms
        let clock = SteppingClock::new(50);

        let result = protocol.dispatch(request("power-on"), "op", &mut executor, &clock);
        assert!(matches!(result, Err(ExplorerError::ActionTimeout { .. })));
        assert_eq!(
            protocol.transitions().last().unwrap().status,
            TransitionStatus::Failure
        );
    }

    #[test]
    fn cancel_requires_history_and_a_canceler() {
        let mut protocol = ActionProtocol::new(ActionTuning::default());
        let clock = SteppingClock::new(1);
        let mut canceler = RecordingCanceler {
            cancelled: Vec::new(),
        };

        assert_eq!(
            protocol.cancel_last(Some(&mut canceler), &clock),
            Err(ExplorerError::NothingToCancel)
        );

        let mut executor = ScriptedExecutor::new(vec![Ok(())]);
        protocol
            .dispatch(request("power-on"), "op", &mut executor, &clock)
            .unwrap();
        assert_eq!(
            protocol.cancel_last(None, &clock),
            Err(ExplorerError::CancelUnsupported)
        );
        assert!(protocol.cancel_last(Some(&mut canceler), &clock).is_ok());
        assert_eq!(canceler.cancelled, vec!["power-on".to_string()]);
        assert_eq!(
            protocol.transitions().last().unwrap().status,
            TransitionStatus::Cancelled
        );
    }

    #[test]
    fn maintenance_actions_patch_host_connection_state() {
        assert!(post_action_effect(ResourceKind::Hosts, "enter-maintenance").is_some());
        assert!(post_action_effect(ResourceKind::Hosts, "exit-maintenance").is_some());
        assert!(post_action_effect(ResourceKind::Vms, "power-off").is_none());
    }
}
