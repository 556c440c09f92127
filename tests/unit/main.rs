//! Cross-module unit tests.

mod serde_contract_tests;
mod window_tests;
