// crates/proofdesk-core/src/helpers/mod.rs
//
// Small pure helpers shared by the annotation overlay, the reorder strip and
// the poster sampler in proofdesk-media.

pub mod geometry;
pub mod luma;
pub mod path;
