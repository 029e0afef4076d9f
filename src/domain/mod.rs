//! Domain models for the gateway.
//!
//! Request and response bodies for the CRUD endpoints.

pub mod dto;

pub use dto::{KeyRequest, Operation, RecordResponse, WriteRequest};
