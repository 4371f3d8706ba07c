use std::time::Duration;

use crate::calendar::WeekStart;
use crate::error::ConfigError;

/// Settings for window building and scroll paging.
#[derive(Debug, Clone)]
pub struct PagingConfig {
    pub week_start: WeekStart,
    /// Width of one month page in the surface's logical scroll units.
    pub page_width: f64,
    /// How close an offset must be to a boundary to count as reaching it.
    pub tolerance: f64,
    /// Quiet period before a scroll sample is acted on.
    pub debounce: Duration,
    /// Upper bound for a single annotation lookup.
    pub lookup_timeout: Duration,
}

impl Default for PagingConfig {
    fn default() -> Self {
        PagingConfig {
            week_start: WeekStart::Monday,
            page_width: 1.0,
            tolerance: 0.01,
            debounce: Duration::from_millis(50),
            lookup_timeout: Duration::from_secs(2),
        }
    }
}

impl PagingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.page_width.is_finite() || self.page_width <= 0.0 {
            return Err(ConfigError::PageWidth(self.page_width));
        }
        let limit = self.page_width / 2.0;
        if !(0.0..limit).contains(&self.tolerance) {
            return Err(ConfigError::Tolerance {
                tolerance: self.tolerance,
                limit,
            });
        }
        if self.debounce.is_zero() {
            return Err(ConfigError::ZeroDuration("debounce"));
        }
        if self.lookup_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("lookup timeout"));
        }
        Ok(())
    }

    /// Offset of the leading (previous month) page.
    pub fn leading_boundary(&self) -> f64 {
        0.0
    }

    /// Offset of the centred (reference month) page.
    pub fn center_offset(&self) -> f64 {
        self.page_width
    }

    /// Offset of the trailing (next month) page.
    pub fn trailing_boundary(&self) -> f64 {
        2.0 * self.page_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = PagingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.center_offset(), 1.0);
        assert_eq!(config.trailing_boundary(), 2.0);
    }

    #[test]
    fn pixel_page_width() {
        let config = PagingConfig {
            page_width: 393.0,
            tolerance: 0.5,
            ..PagingConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.trailing_boundary(), 786.0);
    }

    #[test]
    fn rejects_bad_values() {
        let bad_width = PagingConfig {
            page_width: 0.0,
            ..PagingConfig::default()
        };
        assert_eq!(bad_width.validate(), Err(ConfigError::PageWidth(0.0)));

        let nan_width = PagingConfig {
            page_width: f64::NAN,
            ..PagingConfig::default()
        };
        assert!(nan_width.validate().is_err());

        let wide_tolerance = PagingConfig {
            tolerance: 0.5,
            ..PagingConfig::default()
        };
        assert!(matches!(
            wide_tolerance.validate(),
            Err(ConfigError::Tolerance { .. })
        ));

        let no_debounce = PagingConfig {
            debounce: Duration::ZERO,
            ..PagingConfig::default()
        };
        assert_eq!(
            no_debounce.validate(),
            Err(ConfigError::ZeroDuration("debounce"))
        );
    }
}
