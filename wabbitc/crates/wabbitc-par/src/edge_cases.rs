//! Edge case tests for wabbitc-par.
