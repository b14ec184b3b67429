//! # bStat Core
//!
//! This crate provides the foundational types and traits for recording bStat
//! footsteps. It defines the raw event and footstep record shapes, the error
//! types, the collaborator traits that stores and context providers must
//! implement, and the [`FootstepRecorder`] that ties them together.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bstat_core::{FootstepRecorder, RawEvent};
//!
//! let recorder = FootstepRecorder::new(store, context);
//!
//! let id = recorder
//!     .record(RawEvent::new("plugin").with_user(42).with_info(["activated", "akismet/akismet.php"]))
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod recorder;
pub mod traits;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::RecorderConfig;
pub use error::{
    ContextError, ContextResult, RecordError, RecordResult, StoreError, StoreResult,
};
pub use recorder::{FootstepRecorder, utc_epoch_seconds};
pub use traits::{BackingStore, ContextProvider, EventSource};
pub use types::{
    FootstepRecord, INFO_SEPARATOR, POST_DISCRIMINATOR, RawEvent, RecordId, StoredFootstep,
    VARIATION_KEYS, Variations, actions,
};
