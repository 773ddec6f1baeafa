//! Update ingestion and dispatch engine.
//!
//! Flow: transport poll → [`classify`] → [`Route::resolve`] → [`Dispatcher`]
//! spawns one handling unit per event → [`Handler`] → actions delivered via
//! [`Outbound`]. The ingestion loop never waits for a handler to finish.

pub mod classify;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod route;
pub mod transport;

pub use {
    classify::classify,
    dispatcher::{DispatchPolicy, Dispatcher, UnitOutcome},
    error::{DispatchError, HandlerError, TransportError},
    handlers::{Handler, HandlerSet},
    ingest::run_ingestion,
    route::{COMMANDS, CommandRow, Route},
    transport::{BotIdentity, Outbound, UpdateSource},
};
