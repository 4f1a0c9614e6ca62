//! Application services - Response orchestration

pub mod response_service;

pub use response_service::{ResponseReport, ResponseService};
