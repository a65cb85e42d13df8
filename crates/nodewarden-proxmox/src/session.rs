//! Authenticated session material.

use std::fmt;

use reqwest::RequestBuilder;

/// Credentials attached to every hypervisor request.
///
/// Held in memory only and never invalidated; a new process logs in again.
#[derive(Clone, PartialEq, Eq)]
pub enum Session {
    /// Static API token pair, sent as `Authorization: PVEAPIToken=id=secret`.
    Token { id: String, secret: String },
    /// Ticket login: auth cookie plus anti-forgery header.
    Ticket { ticket: String, csrf_token: String },
}

impl Session {
    pub fn kind(&self) -> &'static str {
        match self {
            Session::Token { .. } => "token",
            Session::Ticket { .. } => "ticket",
        }
    }

    pub(crate) fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Session::Token { id, secret } => {
                req.header("Authorization", format!("PVEAPIToken={id}={secret}"))
            }
            Session::Ticket { ticket, csrf_token } => req
                .header("Cookie", format!("PVEAuthCookie={ticket}"))
                .header("CSRFPreventionToken", csrf_token.as_str()),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Token { id, .. } => f
                .debug_struct("Token")
                .field("id", id)
                .finish_non_exhaustive(),
            Session::Ticket { .. } => f.debug_struct("Ticket").finish_non_exhaustive(),
        }
    }
}
