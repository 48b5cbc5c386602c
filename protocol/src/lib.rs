//! Types shared between the retouch session engine and whatever renders it.
//!
//! Everything here is plain data: snapshots of the edited artifact, the
//! session phase, and the read-only `SessionView` projection handed to a
//! presentation layer.

pub mod session;
pub mod snapshot;
pub mod suggestions;

pub use session::CandidateView;
pub use session::HistoryEntryView;
pub use session::Phase;
pub use session::SessionView;
pub use snapshot::DEFAULT_GENERATED_MEDIA_TYPE;
pub use snapshot::ImagePayload;
pub use snapshot::PDF_MEDIA_TYPE;
pub use snapshot::PayloadDecodeError;
pub use snapshot::Snapshot;
pub use snapshot::SnapshotId;
pub use snapshot::SnapshotOrigin;
pub use suggestions::DEFAULT_SUGGESTIONS;
pub use suggestions::default_suggestions;
