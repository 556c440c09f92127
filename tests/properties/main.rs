//! Property-based tests for the engine invariants.

mod invariant_tests;
