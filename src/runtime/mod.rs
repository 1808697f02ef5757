//! # Runtime
//!
//! Process lifecycle around the reconciler.
//!
//! - `initialization`: Configuration, tracing, metrics, HTTP server and client wiring
//! - `watch_loop`: Watch streams, change filtering and the controller loop
//! - `error_policy`: Requeue decisions for failed reconciles

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
