//! Existence check for candidate links.
//!
//! The check itself lives outside the core (typically an HTTP request);
//! the session controller receives it as an injected capability.

/// Confirms that a candidate link exists at the target site.
///
/// Implementations make one blocking attempt without retry. An `Err` is
/// treated exactly like `Ok(false)` by callers.
pub trait LinkValidator {
    fn exists(&self, candidate: &str) -> Result<bool, String>;
}

impl<V: LinkValidator + ?Sized> LinkValidator for Box<V> {
    fn exists(&self, candidate: &str) -> Result<bool, String> {
        (**self).exists(candidate)
    }
}

impl<V: LinkValidator + ?Sized> LinkValidator for &V {
    fn exists(&self, candidate: &str) -> Result<bool, String> {
        (**self).exists(candidate)
    }
}

/// Accepts every link; for offline sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllValidator;

impl LinkValidator for AcceptAllValidator {
    fn exists(&self, _candidate: &str) -> Result<bool, String> {
        Ok(true)
    }
}
