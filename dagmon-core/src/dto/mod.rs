//! Data Transfer Objects for the remote DAG service
//!
//! DTOs are the request-side shapes sent to the service that owns the DAG.
//! Responses deserialize straight into the domain types.

pub mod job;
