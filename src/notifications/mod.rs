//! Outcome Notifications
//!
//! Posts one Discord-style embed per processed submission: either the list
//! of offending files or a success note. Delivery problems are reported to
//! the caller as [`NotifyError`] and never retried.

pub mod discord;
pub mod error;
pub mod message;

pub use discord::{OutcomeNotifier, DEFAULT_NOTIFY_TIMEOUT};
pub use error::{NotifyError, NotifyResult};
pub use message::{Embed, EmbedPayload, MessageContext, EMBED_COLOR};
