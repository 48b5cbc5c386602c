//! Root of the `retouch-core` library.
//!
//! Owns the edit session state machine, its linear undo/redo history and the
//! client for the hosted generative model that performs the actual edits.

// All user-visible output goes through the presentation layer or tracing.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod api_clients;
pub mod config;
pub mod default_client;
pub mod driver;
pub mod error;
pub mod history;
pub mod intake;
pub mod service;
pub mod session;
pub mod shortcuts;

pub use api_clients::ApiError;
pub use api_clients::GeminiClient;
pub use api_clients::GeminiConfig;
pub use config::RetouchConfig;
pub use driver::SessionHandle;
pub use error::EditError;
pub use error::SessionError;
pub use error::ValidationError;
pub use history::HistoryStore;
pub use intake::IntakePolicy;
pub use service::RemoteEditService;
pub use session::EditSession;
pub use session::EditTicket;
pub use session::SubmitOutcome;
pub use session::SuggestionRefresh;
pub use session::SuggestionRequest;

pub use retouch_protocol as protocol;
