// crates/proofdesk-core/src/lib.rs
//
// Pure data and algorithms for the media workspace.
// Nothing here touches egui, ffmpeg or the network, so it all tests in isolation
// and shared by proofdesk-media (workers) and proofdesk-ui (host view).

pub mod annotation;
pub mod commands;
pub mod error;
pub mod helpers;
pub mod media_types;
pub mod reorder;
pub mod state;
pub mod upload;
