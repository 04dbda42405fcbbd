/// Test suite for the account lifecycle core
///
/// Uses in-memory fakes for the store, cache, notifier and task queue so the
/// engine's invariants can be exercised without infrastructure.
pub mod fixtures;

mod token_tests;
