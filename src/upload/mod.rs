//! Document Upload Module
//!
//! Simulated intake of user documents:
//! - Progress ticks from 0 to 100% at a fixed interval
//! - Full text read once the upload completes
//! - Simulated analysis delay before the document is ready
//!
//! Lifecycle:
//! 1. `submit` creates an `uploading` record per file
//! 2. Ticks advance progress and publish updates
//! 3. Content is read, the record moves to `processing`
//! 4. After analysis the record is `ready` and a notice is sent
//!
//! Any failure moves the record to `error` with a failure notice.

pub mod manager;
pub mod pacer;
pub mod source;
pub mod types;

pub use manager::DocumentManager;
pub use pacer::{InstantPacer, Pacer, TokioPacer};
pub use source::{AcceptedFormat, DiskFile, FileSource, MemoryFile, DOCX_MIME};
pub use types::*;
