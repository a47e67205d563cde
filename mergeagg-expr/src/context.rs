use mergeagg_result::{Error, Result};
use mergeagg_types::MAX_DECIMAL_SCALE;

/// Default number of fractional digits added by decimal division.
///
/// Matches the MySQL `div_precision_increment` default.
pub const DEFAULT_DIV_PRECISION_INCREMENT: u8 = 4;

/// Per-query context threaded through aggregate update and finalize calls.
#[derive(Clone, Debug)]
pub struct EvalContext {
    div_precision_increment: u8,
    label: Option<String>,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext {
    /// Construct a context with default session settings.
    pub fn new() -> Self {
        Self {
            div_precision_increment: DEFAULT_DIV_PRECISION_INCREMENT,
            label: None,
        }
    }

    /// Override the fractional increment used by decimal division.
    ///
    /// Values above [`MAX_DECIMAL_SCALE`] are rejected.
    pub fn with_div_precision_increment(mut self, increment: u8) -> Result<Self> {
        if i16::from(increment) > i16::from(MAX_DECIMAL_SCALE) {
            return Err(Error::InvalidArgumentError(format!(
                "div_precision_increment {increment} exceeds maximum of {MAX_DECIMAL_SCALE}"
            )));
        }
        self.div_precision_increment = increment;
        Ok(self)
    }

    /// Attach a diagnostic label (typically the statement or fragment name).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[inline]
    pub fn div_precision_increment(&self) -> u8 {
        self.div_precision_increment
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_is_validated() {
        let ctx = EvalContext::new();
        assert_eq!(ctx.div_precision_increment(), DEFAULT_DIV_PRECISION_INCREMENT);

        let ctx = ctx.with_div_precision_increment(30).unwrap();
        assert_eq!(ctx.div_precision_increment(), 30);

        let err = EvalContext::new().with_div_precision_increment(31).unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentError(_)));
    }
}
