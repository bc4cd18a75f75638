//! End-to-end integration tests for the LMA harness core.
//!
//! These tests exercise the public surface of the harness crates:
//! - Dashboard ingestion into template definitions
//! - Template tree materialization against a scripted backend
//! - Panel query classification through the resolution facade
//! - Bounded polling behavior

#![cfg(test)]
