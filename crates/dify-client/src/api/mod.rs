//! API endpoint implementations.

mod workflow;

pub use workflow::WorkflowApi;
