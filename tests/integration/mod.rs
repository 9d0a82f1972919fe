//! Integration tests for CallMate
//!
//! These tests drive the real provider clients against wiremock servers and
//! verify routing, fallback and the analysis pipeline end to end.

mod providers;
mod routing;
