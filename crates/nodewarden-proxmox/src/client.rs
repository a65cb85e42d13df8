//! Proxmox VE REST client.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use nodewarden_core::PowerState;
use nodewarden_core::config::ProxmoxConfig;

use crate::driver::{DriverFuture, PowerAction, PowerDriver};
use crate::error::{ProxmoxError, ProxmoxResult};
use crate::session::Session;

/// Timeout for every hypervisor request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Standard Proxmox response envelope: `{"data": ...}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TicketData {
    ticket: String,
    #[serde(rename = "CSRFPreventionToken")]
    csrf_token: String,
}

#[derive(Debug, Deserialize)]
struct VmStatus {
    status: String,
}

#[derive(Debug, Clone)]
enum Credentials {
    Token { id: String, secret: String },
    Password { username: String, password: String },
}

/// HTTP client for the Proxmox VE API.
#[derive(Debug, Clone)]
pub struct ProxmoxClient {
    http: reqwest::Client,
    api_url: String,
    credentials: Credentials,
}

impl ProxmoxClient {
    pub fn new(config: &ProxmoxConfig) -> ProxmoxResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(config.insecure_skip_tls_verify)
            .build()
            .map_err(ProxmoxError::Client)?;

        // A complete token pair wins over username/password.
        let credentials = match config.token() {
            Some((id, secret)) => Credentials::Token {
                id: id.to_string(),
                secret: secret.to_string(),
            },
            None => Credentials::Password {
                username: config.username.clone(),
                password: config.password.clone(),
            },
        };

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub async fn login(&self) -> ProxmoxResult<Session> {
        let (username, password) = match &self.credentials {
            Credentials::Token { id, secret } => {
                return Ok(Session::Token {
                    id: id.clone(),
                    secret: secret.clone(),
                });
            }
            Credentials::Password { username, password } => (username, password),
        };

        let url = format!("{}/access/ticket", self.api_url);
        let resp = self
            .http
            .post(&url)
            .form(&[("username", username.as_str()), ("password", password.as_str())])
            .send()
            .await
            .map_err(|e| ProxmoxError::Auth(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProxmoxError::Auth(format!("status {}", status.as_u16())));
        }

        let body: Envelope<TicketData> = resp
            .json()
            .await
            .map_err(|e| ProxmoxError::Auth(format!("invalid ticket response: {e}")))?;

        debug!(%username, "obtained hypervisor ticket");
        Ok(Session::Ticket {
            ticket: body.data.ticket,
            csrf_token: body.data.csrf_token,
        })
    }

    pub async fn vm_state(
        &self,
        session: &Session,
        host: &str,
        vmid: u32,
    ) -> ProxmoxResult<PowerState> {
        let query_err = |reason: String| ProxmoxError::RemoteQuery {
            host: host.to_string(),
            vmid,
            reason,
        };

        let url = format!("{}/nodes/{host}/qemu/{vmid}/status/current", self.api_url);
        let resp = session
            .apply(self.http.get(&url))
            .send()
            .await
            .map_err(|e| query_err(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(query_err(format!("status {}, response: {body}", status.as_u16())));
        }

        let body: Envelope<VmStatus> = resp
            .json()
            .await
            .map_err(|e| query_err(format!("invalid status response: {e}")))?;

        debug!(%host, vmid, status = %body.data.status, "VM status");
        Ok(PowerState::from_status(&body.data.status))
    }

    pub async fn vm_action(
        &self,
        session: &Session,
        host: &str,
        vmid: u32,
        action: PowerAction,
    ) -> ProxmoxResult<()> {
        let action_err = |reason: String| ProxmoxError::RemoteAction {
            host: host.to_string(),
            vmid,
            action,
            reason,
        };

        let url = format!(
            "{}/nodes/{host}/qemu/{vmid}/status/{}",
            self.api_url,
            action.as_str()
        );
        let resp = session
            .apply(self.http.post(&url))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| action_err(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(action_err(format!("status {}, response: {body}", status.as_u16())));
        }

        Ok(())
    }
}

impl PowerDriver for ProxmoxClient {
    fn authenticate(&self) -> DriverFuture<'_, Session> {
        Box::pin(self.login())
    }

    fn query_state<'a>(
        &'a self,
        session: &'a Session,
        host: &'a str,
        vmid: u32,
    ) -> DriverFuture<'a, PowerState> {
        Box::pin(self.vm_state(session, host, vmid))
    }

    fn issue<'a>(
        &'a self,
        session: &'a Session,
        host: &'a str,
        vmid: u32,
        action: PowerAction,
    ) -> DriverFuture<'a, ()> {
        Box::pin(self.vm_action(session, host, vmid, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Form, Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};

    use crate::driver::remediate;

    /// Requests seen by the fake hypervisor: "METHOD path | auth".
    type Log = Arc<Mutex<Vec<String>>>;

    #[derive(Clone)]
    struct Fake {
        log: Log,
        vm_status: String,
        status_code: StatusCode,
    }

    fn auth_of(headers: &HeaderMap) -> String {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string()
        };
        let authz = get("authorization");
        if !authz.is_empty() {
            return authz;
        }
        format!("{}; csrf={}", get("cookie"), get("csrfpreventiontoken"))
    }

    async fn ticket(
        State(fake): State<Fake>,
        Form(form): Form<HashMap<String, String>>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        fake.log.lock().unwrap().push("POST /access/ticket".to_string());
        if form.get("password").map(String::as_str) != Some("hunter2") {
            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "data": null })));
        }
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "data": { "ticket": "PVE:root@pam:TICKET", "CSRFPreventionToken": "CSRF123" }
            })),
        )
    }

    async fn current(
        State(fake): State<Fake>,
        Path((host, vmid)): Path<(String, u32)>,
        headers: HeaderMap,
    ) -> (StatusCode, String) {
        fake.log.lock().unwrap().push(format!(
            "GET /nodes/{host}/qemu/{vmid}/status/current | {}",
            auth_of(&headers)
        ));
        if fake.status_code != StatusCode::OK {
            return (fake.status_code, "vm does not exist".to_string());
        }
        let body = serde_json::json!({ "data": { "status": fake.vm_status, "vmid": vmid } });
        (StatusCode::OK, body.to_string())
    }

    async fn action(
        State(fake): State<Fake>,
        Path((host, vmid, action)): Path<(String, u32, String)>,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, String) {
        let content_type = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        fake.log.lock().unwrap().push(format!(
            "POST /nodes/{host}/qemu/{vmid}/status/{action} | {} | {content_type} {body}",
            auth_of(&headers)
        ));
        (fake.status_code, r#"{"data":"UPID:pve1:task"}"#.to_string())
    }

    async fn serve(vm_status: &str, status_code: StatusCode) -> (String, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let fake = Fake {
            log: log.clone(),
            vm_status: vm_status.to_string(),
            status_code,
        };
        let router = Router::new()
            .route("/access/ticket", post(ticket))
            .route("/nodes/{host}/qemu/{vmid}/status/current", get(current))
            .route("/nodes/{host}/qemu/{vmid}/status/{action}", post(action))
            .with_state(fake);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}"), log)
    }

    /// Hypervisor behind a broken proxy: every route answers 200 with HTML.
    async fn serve_html() -> String {
        let page = || async { (StatusCode::OK, "<html>proxy error</html>") };
        let router = Router::new()
            .route("/access/ticket", post(page))
            .route("/nodes/{host}/qemu/{vmid}/status/current", get(page));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn password_config(api_url: &str, password: &str) -> ProxmoxConfig {
        ProxmoxConfig {
            api_url: api_url.to_string(),
            username: "root@pam".to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    fn token_config(api_url: &str) -> ProxmoxConfig {
        ProxmoxConfig {
            api_url: format!("{api_url}/"),
            username: "root@pam".to_string(),
            password: "hunter2".to_string(),
            token_id: "root@pam!monitor".to_string(),
            token_secret: "tok-secret".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn token_auth_skips_login() {
        let (url, log) = serve("running", StatusCode::OK).await;
        let client = ProxmoxClient::new(&token_config(&url)).unwrap();

        let session = client.authenticate().await.unwrap();
        assert_eq!(session.kind(), "token");

        let state = client.query_state(&session, "pve1", 103).await.unwrap();
        assert_eq!(state, PowerState::Running);

        let log = log.lock().unwrap().clone();
        assert_eq!(
            log,
            vec!["GET /nodes/pve1/qemu/103/status/current | PVEAPIToken=root@pam!monitor=tok-secret"]
        );
    }

    #[tokio::test]
    async fn ticket_auth_sends_cookie_and_csrf() {
        let (url, log) = serve("stopped", StatusCode::OK).await;
        let client = ProxmoxClient::new(&password_config(&url, "hunter2")).unwrap();

        let session = client.authenticate().await.unwrap();
        assert_eq!(session.kind(), "ticket");

        let state = client.query_state(&session, "pve1", 103).await.unwrap();
        assert_eq!(state, PowerState::Stopped);

        let log = log.lock().unwrap().clone();
        assert_eq!(log[0], "POST /access/ticket");
        assert_eq!(
            log[1],
            "GET /nodes/pve1/qemu/103/status/current | PVEAuthCookie=PVE:root@pam:TICKET; csrf=CSRF123"
        );
    }

    #[tokio::test]
    async fn bad_password_is_auth_error() {
        let (url, _log) = serve("running", StatusCode::OK).await;
        let client = ProxmoxClient::new(&password_config(&url, "wrong")).unwrap();
        let err = client.authenticate().await.unwrap_err();
        assert!(matches!(err, ProxmoxError::Auth(ref msg) if msg.contains("401")));
    }

    #[tokio::test]
    async fn non_success_query_is_remote_query_error() {
        let (url, _log) = serve("running", StatusCode::INTERNAL_SERVER_ERROR).await;
        let client = ProxmoxClient::new(&token_config(&url)).unwrap();
        let session = client.authenticate().await.unwrap();

        let err = client.query_state(&session, "pve1", 999).await.unwrap_err();
        match err {
            ProxmoxError::RemoteQuery { vmid, reason, .. } => {
                assert_eq!(vmid, 999);
                assert!(reason.contains("500"));
                assert!(reason.contains("vm does not exist"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_remote_query_error() {
        let client = ProxmoxClient::new(&token_config("http://127.0.0.1:1")).unwrap();
        let session = client.authenticate().await.unwrap();
        let err = client.query_state(&session, "pve1", 103).await.unwrap_err();
        assert!(matches!(err, ProxmoxError::RemoteQuery { .. }));
    }

    #[tokio::test]
    async fn malformed_status_body_is_remote_query_error() {
        let url = serve_html().await;
        let client = ProxmoxClient::new(&token_config(&url)).unwrap();
        let session = client.authenticate().await.unwrap();

        let err = client.query_state(&session, "pve1", 1).await.unwrap_err();
        match err {
            ProxmoxError::RemoteQuery { host, vmid, reason } => {
                assert_eq!(host, "pve1");
                assert_eq!(vmid, 1);
                assert!(reason.starts_with("invalid status response"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_ticket_body_is_auth_error() {
        let url = serve_html().await;
        let client = ProxmoxClient::new(&password_config(&url, "hunter2")).unwrap();

        let err = client.authenticate().await.unwrap_err();
        assert!(matches!(err, ProxmoxError::Auth(ref msg) if msg.starts_with("invalid ticket response")));
    }

    #[tokio::test]
    async fn unknown_status_is_unrecognized() {
        let (url, _log) = serve("paused", StatusCode::OK).await;
        let client = ProxmoxClient::new(&token_config(&url)).unwrap();
        let session = client.authenticate().await.unwrap();
        let state = client.query_state(&session, "pve1", 103).await.unwrap();
        assert_eq!(state, PowerState::Unrecognized("paused".to_string()));
    }

    #[tokio::test]
    async fn remediate_stopped_vm_posts_start_with_empty_json() {
        let (url, log) = serve("stopped", StatusCode::OK).await;
        let client = ProxmoxClient::new(&token_config(&url)).unwrap();
        let session = client.authenticate().await.unwrap();

        let action = remediate(&client, &session, "pve1", 103).await.unwrap();
        assert_eq!(action, PowerAction::Start);

        let log = log.lock().unwrap().clone();
        assert_eq!(log.len(), 2);
        assert_eq!(
            log[1],
            "POST /nodes/pve1/qemu/103/status/start | PVEAPIToken=root@pam!monitor=tok-secret | application/json {}"
        );
    }

    #[tokio::test]
    async fn remediate_running_vm_posts_reset() {
        let (url, log) = serve("running", StatusCode::OK).await;
        let client = ProxmoxClient::new(&token_config(&url)).unwrap();
        let session = client.authenticate().await.unwrap();

        let action = remediate(&client, &session, "pve2", 204).await.unwrap();
        assert_eq!(action, PowerAction::Reset);
        let log = log.lock().unwrap().clone();
        assert!(log[1].starts_with("POST /nodes/pve2/qemu/204/status/reset"));
        assert!(!log.iter().any(|l| l.contains("/status/stop")));
    }

    #[tokio::test]
    async fn remediate_paused_vm_issues_nothing() {
        let (url, log) = serve("paused", StatusCode::OK).await;
        let client = ProxmoxClient::new(&token_config(&url)).unwrap();
        let session = client.authenticate().await.unwrap();

        let err = remediate(&client, &session, "pve1", 103).await.unwrap_err();
        assert!(matches!(err, ProxmoxError::UnsupportedState { .. }));
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
