//! Error reporting helpers shared by all components
//!
//! Errors that reach the top of the process (configuration, key loading,
//! listener binding) are logged through [`log_error_with_context`], which
//! shows operator-fixable problems verbatim and keeps system details at
//! debug level.

/// Errors that know whether an operator can fix them
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// True for problems an operator can fix (bad configuration, missing key file)
    fn is_user_actionable(&self) -> bool;

    /// The message to show when the error is user-actionable
    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error with the right amount of detail
///
/// User-actionable errors log their own message. System errors log the
/// operation context, with the error itself at debug level.
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => {
            log::error!("FATAL: {}: {}", operation_context, user_msg)
        }
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
