//! Dagmon Core
//!
//! Core types shared by the dagmon crates.
//!
//! This crate contains:
//! - Domain types: DAG lifecycle states, status snapshots, counters and vertex progress
//! - DTOs: Data transfer objects for the status endpoint of a remote DAG service

pub mod domain;
pub mod dto;
