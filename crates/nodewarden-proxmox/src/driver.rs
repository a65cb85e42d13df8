//! Power-state driver abstraction and the remediation state machine.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tracing::{info, warn};

use nodewarden_core::PowerState;

use crate::error::{ProxmoxError, ProxmoxResult};
use crate::session::Session;

/// Boxed future returned by [`PowerDriver`] methods.
pub type DriverFuture<'a, T> = Pin<Box<dyn Future<Output = ProxmoxResult<T>> + Send + 'a>>;

/// Remote power action issued against a VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Start,
    Reset,
}

impl PowerAction {
    /// The action that brings a VM in `state` back up, if any.
    ///
    /// Running VMs are reset rather than stopped and started again.
    pub fn for_state(state: &PowerState) -> Option<PowerAction> {
        match state {
            PowerState::Stopped => Some(PowerAction::Start),
            PowerState::Running => Some(PowerAction::Reset),
            PowerState::Unrecognized(_) => None,
        }
    }

    /// Path segment used by the status endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerAction::Start => "start",
            PowerAction::Reset => "reset",
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queries and mutates VM power state. Injected for testability.
pub trait PowerDriver: Send + Sync {
    /// Establish a session. Token credentials return immediately.
    fn authenticate(&self) -> DriverFuture<'_, Session>;

    /// Fetch the current power state of a VM.
    fn query_state<'a>(
        &'a self,
        session: &'a Session,
        host: &'a str,
        vmid: u32,
    ) -> DriverFuture<'a, PowerState>;

    /// Issue a single power action.
    fn issue<'a>(
        &'a self,
        session: &'a Session,
        host: &'a str,
        vmid: u32,
        action: PowerAction,
    ) -> DriverFuture<'a, ()>;
}

/// Bring a VM back up: query its state, then start or reset it.
///
/// Fails with [`ProxmoxError::UnsupportedState`] without issuing any
/// action when the VM is neither stopped nor running.
pub async fn remediate<D: PowerDriver + ?Sized>(
    driver: &D,
    session: &Session,
    host: &str,
    vmid: u32,
) -> ProxmoxResult<PowerAction> {
    let state = driver.query_state(session, host, vmid).await?;

    let action = match PowerAction::for_state(&state) {
        Some(action) => action,
        None => {
            warn!(%host, vmid, %state, "VM state not supported for remediation");
            return Err(ProxmoxError::UnsupportedState {
                host: host.to_string(),
                vmid,
                state: state.to_string(),
            });
        }
    };

    info!(%host, vmid, %state, %action, "issuing power action");
    driver.issue(session, host, vmid, action).await?;
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fake driver with a fixed state that records every call.
    struct FakeDriver {
        state: ProxmoxResult<PowerState>,
        fail_action: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeDriver {
        fn with_state(state: PowerState) -> Self {
            Self {
                state: Ok(state),
                fail_action: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PowerDriver for FakeDriver {
        fn authenticate(&self) -> DriverFuture<'_, Session> {
            Box::pin(async {
                Ok(Session::Token {
                    id: "id".to_string(),
                    secret: "secret".to_string(),
                })
            })
        }

        fn query_state<'a>(
            &'a self,
            _session: &'a Session,
            host: &'a str,
            vmid: u32,
        ) -> DriverFuture<'a, PowerState> {
            self.calls.lock().unwrap().push("query".to_string());
            let result = match &self.state {
                Ok(s) => Ok(s.clone()),
                Err(_) => Err(ProxmoxError::RemoteQuery {
                    host: host.to_string(),
                    vmid,
                    reason: "boom".to_string(),
                }),
            };
            Box::pin(async move { result })
        }

        fn issue<'a>(
            &'a self,
            _session: &'a Session,
            host: &'a str,
            vmid: u32,
            action: PowerAction,
        ) -> DriverFuture<'a, ()> {
            self.calls.lock().unwrap().push(action.to_string());
            let fail = self.fail_action;
            Box::pin(async move {
                if fail {
                    Err(ProxmoxError::RemoteAction {
                        host: host.to_string(),
                        vmid,
                        action,
                        reason: "500".to_string(),
                    })
                } else {
                    Ok(())
                }
            })
        }
    }

    fn session() -> Session {
        Session::Token {
            id: "id".to_string(),
            secret: "secret".to_string(),
        }
    }

    #[test]
    fn action_mapping_is_total() {
        assert_eq!(PowerAction::for_state(&PowerState::Stopped), Some(PowerAction::Start));
        assert_eq!(PowerAction::for_state(&PowerState::Running), Some(PowerAction::Reset));
        for raw in ["paused", "suspended", "prelaunch", ""] {
            assert_eq!(
                PowerAction::for_state(&PowerState::Unrecognized(raw.to_string())),
                None
            );
        }
    }

    #[tokio::test]
    async fn stopped_vm_is_started() {
        let driver = FakeDriver::with_state(PowerState::Stopped);
        let action = remediate(&driver, &session(), "pve1", 103).await.unwrap();
        assert_eq!(action, PowerAction::Start);
        assert_eq!(driver.calls(), vec!["query", "start"]);
    }

    #[tokio::test]
    async fn running_vm_is_reset_not_cycled() {
        let driver = FakeDriver::with_state(PowerState::Running);
        let action = remediate(&driver, &session(), "pve1", 103).await.unwrap();
        assert_eq!(action, PowerAction::Reset);
        // One query, one reset. No start, no intermediate query.
        assert_eq!(driver.calls(), vec!["query", "reset"]);
    }

    #[tokio::test]
    async fn unrecognized_state_issues_no_action() {
        let driver = FakeDriver::with_state(PowerState::Unrecognized("paused".to_string()));
        let err = remediate(&driver, &session(), "pve1", 103).await.unwrap_err();
        assert!(matches!(err, ProxmoxError::UnsupportedState { ref state, .. } if state == "paused"));
        assert_eq!(driver.calls(), vec!["query"]);
    }

    #[tokio::test]
    async fn query_failure_propagates() {
        let driver = FakeDriver {
            state: Err(ProxmoxError::Auth("x".to_string())),
            fail_action: false,
            calls: Mutex::new(Vec::new()),
        };
        let err = remediate(&driver, &session(), "pve1", 103).await.unwrap_err();
        assert!(matches!(err, ProxmoxError::RemoteQuery { .. }));
        assert_eq!(driver.calls(), vec!["query"]);
    }

    #[tokio::test]
    async fn action_failure_propagates() {
        let mut driver = FakeDriver::with_state(PowerState::Stopped);
        driver.fail_action = true;
        let err = remediate(&driver, &session(), "pve1", 103).await.unwrap_err();
        assert!(matches!(
            err,
            ProxmoxError::RemoteAction { action: PowerAction::Start, .. }
        ));
    }
}
