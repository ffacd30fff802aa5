//! Core logic of the support assistant: the conversation controller
//! state machine and the turn event pump.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod controller;
pub mod conversation;
mod turn_client;

pub use controller::{Controller, ControllerBuilder, Stage};
pub use turn_client::{TurnClient, TurnObserver, TurnOutcome};
