// crates/proofdesk-media/src/helpers/mod.rs
//
// Internal helper modules for proofdesk-media.
// Not re-exported from lib.rs. These are decode implementation details,
// not part of the public API consumed by proofdesk-ui.

pub mod frame;
pub mod seek;
