//! An abstraction layer for the support backend.
//!
//! This crate establishes the wire-level protocol between the
//! assistant front end and a support backend: the event frames a
//! streaming turn is made of, the ticket/feedback payloads of the
//! collaborator surfaces, and the traits that a concrete transport
//! should adhere to.
//!
//! Types in this crate don't define any behavior, instead they are
//! the constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod backend;
mod error;
mod request;
mod stream;
mod ticket;

pub use backend::*;
pub use error::*;
pub use request::*;
pub use stream::*;
pub use ticket::*;
