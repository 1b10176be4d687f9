//! Shared test utilities used across fine2x3 crates.
//!
//! [`tracing::RecordingLayer`] captures spans and events so suites can assert
//! on instrumentation, and [`ci::property_test_profile`] lets CI scale the
//! property suites through environment variables.

pub mod ci;
pub mod tracing;
