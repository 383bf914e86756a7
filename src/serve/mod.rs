//! Incremental build-and-serve loop.
//!
//! - [`coalesce`] - debounced rebuild state machine
//! - [`port`] - free port probing
//! - [`resolve`] - pretty URL resolution into the output directory
//! - [`clients`] - open live reload connections
//! - [`dev_server`] - the axum server tying these to a [`Project`](crate::project::Project)

pub mod clients;
pub mod coalesce;
pub mod dev_server;
pub mod port;
pub mod resolve;

pub use clients::{ClientRegistry, ReloadSignal, RELOAD_TOKEN};
pub use coalesce::{run_coalesced, CoalesceTiming, Coalescer, CoalescerState};
pub use dev_server::{rebuild_and_notify, DevServer};
pub use port::{probe_port, DEFAULT_PORT_RANGE};
pub use resolve::resolve_request;
