//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the platform API and a recording
//! signer in place of the external signing process.

mod batch_tests;
mod common;
mod search_tests;
