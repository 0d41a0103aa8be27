//! Test module for logy
//!
//! Unit and property-based tests for the request logger, its timer and
//! its configuration.




#[cfg(test)]
pub mod config_tests;

#[cfg(test)]
pub mod instrumentation_tests;
