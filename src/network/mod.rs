//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor loop polling a non-blocking listener
//! - Admission gate bounding concurrently served clients
//! - One thread per admitted connection
//! - Requests routed through the Router

mod connection;
mod gate;
mod server;

pub use connection::Connection;
pub use gate::{AdmissionGate, Permit};
pub use server::{Server, REJECTION_MESSAGE};
