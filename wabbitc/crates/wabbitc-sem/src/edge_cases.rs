//! Edge case tests for wabbitc-sem.
