//! Edge case tests for wabbitc-ir.
