//! Quanta Driver Library
//!
//! The conformance fixtures the `quanta` binary runs: each pairs a
//! TypeScript-shaped source text with the checker input built from it and
//! the diagnostic codes the checker is expected to produce.

pub mod fixtures;

pub use fixtures::{BuiltFixture, Fixture, FixtureRun, FIXTURES};
