//! Configuration for a validation pass.

use std::fmt::{Debug, Display};

/// Default cap on rendered elements and errors in failure messages.
pub const DEFAULT_MAX_RENDERED_LEN: usize = 1024;

/// Settings applied to a single validation pass.
///
/// # Example
///
/// ```rust
/// use testkit_sequence::Config;
///
/// let config = Config::default().max_rendered_len(64);
/// assert_eq!(config.rendered_len_limit(), Some(64));
///
/// assert_eq!(Config::unlimited().rendered_len_limit(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    max_rendered_len: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_rendered_len: Some(DEFAULT_MAX_RENDERED_LEN),
        }
    }
}

impl Config {
    /// Configuration without any truncation of rendered values.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_rendered_len: None,
        }
    }

    /// Truncate rendered elements and errors to `len` characters.
    #[must_use]
    pub fn max_rendered_len(mut self, len: usize) -> Self {
        self.max_rendered_len = Some(len);
        self
    }

    /// The active truncation limit, if any.
    #[must_use]
    pub fn rendered_len_limit(&self) -> Option<usize> {
        self.max_rendered_len
    }

    /// Render an element through its `Debug` impl, honouring the limit.
    pub(crate) fn render_debug<T: Debug + ?Sized>(&self, value: &T) -> String {
        self.truncate(format!("{value:?}"))
    }

    /// Render an error through its `Display` impl, honouring the limit.
    pub(crate) fn render_display<T: Display + ?Sized>(&self, value: &T) -> String {
        self.truncate(value.to_string())
    }

    fn truncate(&self, mut rendered: String) -> String {
        let Some(limit) = self.max_rendered_len else {
            return rendered;
        };
        if let Some((cut, _)) = rendered.char_indices().nth(limit) {
            rendered.truncate(cut);
            rendered.push('…');
        }
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit() {
        assert_eq!(
            Config::default().rendered_len_limit(),
            Some(DEFAULT_MAX_RENDERED_LEN)
        );
    }

    #[test]
    fn test_short_values_untouched() {
        let config = Config::default().max_rendered_len(10);
        assert_eq!(config.render_debug(&42), "42");
        assert_eq!(config.render_display("ok"), "ok");
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        let config = Config::default().max_rendered_len(3);
        assert_eq!(config.render_display("héllo"), "hél…");
    }

    #[test]
    fn test_unlimited() {
        let long = "x".repeat(5000);
        assert_eq!(Config::unlimited().render_display(&long), long);
    }
}
