// crates/proofdesk-media/src/lib.rs
//
// No egui dependency. Communicates with proofdesk-ui via channels only.
//
// To add a new media capability:
//   1. Create a new module file here
//   2. Add `pub mod mymodule;` below
//   3. Call it from worker.rs (a new MediaWorker method or an upload step)

pub mod decode;
pub mod encode;
pub mod remote;
pub mod thumbnail;
pub mod worker;

mod helpers;

// Re-export the main public API so proofdesk-ui imports are simple.
pub use worker::{MediaWorker, UploadFile};
pub use proofdesk_core::media_types::MediaResult;
pub use remote::{HttpBackend, RemoteConfig};
