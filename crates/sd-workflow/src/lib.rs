//! Transition engine for the service-desk order lifecycle.
//!
//! `engine` holds the pure transition rules; `service` wires them to the
//! entity store and the notification dispatcher; `error` is the taxonomy
//! surfaced to callers.

pub mod engine;
pub mod error;
pub mod service;

pub use engine::Transition;
pub use error::WorkflowError;
pub use service::OrderService;
