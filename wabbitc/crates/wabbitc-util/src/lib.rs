//! wabbitc-util - Shared infrastructure for the Wabbit compiler.
//!
//! The only thing every phase has in common is the need for typed indices
//! into owned arenas (basic blocks, instruction values). [`IndexVec`] keeps
//! those indices from getting mixed up at compile time.

pub mod index_vec;

pub use index_vec::{Idx, IndexVec};
