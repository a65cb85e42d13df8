//! nodewarden-proxmox — VM power-state driver for Proxmox VE.
//!
//! Queries and mutates the power state of the VM behind a cluster node.
//!
//! # Power-state machine
//!
//! ```text
//! query state ──► Stopped       ──start──► Running
//!             ├─► Running       ──reset──► Running   (reboot, no stop)
//!             └─► Unrecognized  ──✗──────► UnsupportedState, no action
//! ```
//!
//! The state is re-queried on every [`remediate`] call; nothing is cached
//! between calls.
//!
//! # Sessions
//!
//! Every query and action takes an explicit [`Session`] obtained from
//! [`PowerDriver::authenticate`]. A configured API token pair is used
//! directly and skips the ticket login; otherwise a ticket plus CSRF
//! token is requested once and can be reused for the rest of the run.

pub mod client;
pub mod driver;
pub mod error;
pub mod session;

pub use client::ProxmoxClient;
pub use driver::{remediate, DriverFuture, PowerAction, PowerDriver};
pub use error::{ProxmoxError, ProxmoxResult};
pub use session::Session;
