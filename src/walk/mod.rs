// src/walk/mod.rs
// =============================================================================
// This module walks repository trees and collects code samples.
//
// Submodules:
// - policy: Which directories/files to read and in what order
// - sample: CodeSample and the capped SampleSet
// - tree: The depth-first walker itself
// =============================================================================

mod policy;
mod sample;
mod tree;

pub use policy::WalkPolicy;
pub use sample::CodeSample;
pub use tree::TreeWalker;
