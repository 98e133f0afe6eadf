//! Validated configuration.
//!
//! [`ValidatedWpsConfig`] wraps a [`WpsConfig`] that passed every WPS rule
//! and carries the parsed simulation dates. Steps and the namelist renderer
//! only ever see validated configuration.

use crate::config::error::{ConfigError, ConfigResult};
use chrono::{NaiveDate, NaiveDateTime};
use wr_protocol::config_models::{WpsConfig, WrfSettings};

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d_%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// A [`WpsConfig`] known to describe a runnable WPS setup.
///
/// # Example
///
/// ```rust,no_run
/// use wr_core::config::loader::load_wps_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_wps_config(Path::new("wps.json")).await?;
/// println!("{} domains, {} input times", config.domain_count(), config.interval_count());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedWpsConfig {
    config: WpsConfig,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl ValidatedWpsConfig {
    /// Validate `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - there are no domains
    /// - the first domain has no step size, or another domain has one
    /// - the first domain's parent is not 1
    /// - a nested domain's parent is not an earlier domain
    /// - a date cannot be parsed, or the end precedes the start
    /// - the interval is zero
    /// - a WRF setting (vertical levels, time step, history interval) is zero
    pub fn new(config: WpsConfig) -> ConfigResult<Self> {
        validate_domains(&config)?;
        validate_wrf(&config.wrf)?;

        let start = parse_date(&config.start_date).ok_or_else(|| {
            ConfigError::invalid(format!("Cannot parse the start date '{}'", config.start_date))
        })?;
        let end = parse_date(&config.end_date).ok_or_else(|| {
            ConfigError::invalid(format!("Cannot parse the end date '{}'", config.end_date))
        })?;

        if end < start {
            return Err(ConfigError::invalid("End date precedes the start date"));
        }
        if config.interval == 0 {
            return Err(ConfigError::invalid("Interval has to be positive"));
        }

        Ok(Self { config, start, end })
    }

    pub fn config(&self) -> &WpsConfig {
        &self.config
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn domain_count(&self) -> u32 {
        u32::try_from(self.config.domains.len()).unwrap_or(u32::MAX)
    }

    /// Number of input times in `[start, end]`, one every `interval` seconds.
    pub fn interval_count(&self) -> u32 {
        let span = (self.end - self.start).num_seconds();
        let steps = span / i64::from(self.config.interval);
        u32::try_from(steps + 1).unwrap_or(u32::MAX)
    }

    /// Zero-based index of `date` among the input times, if it is one.
    pub fn interval_index(&self, date: NaiveDateTime) -> Option<u32> {
        let offset = (date - self.start).num_seconds();
        let interval = i64::from(self.config.interval);
        if offset < 0 || offset % interval != 0 || date > self.end {
            return None;
        }
        u32::try_from(offset / interval).ok()
    }

    /// Grid spacing of the outermost domain.
    pub fn step_size(&self) -> [f64; 2] {
        self.config
            .domains
            .first()
            .and_then(|domain| domain.step_size)
            .unwrap_or_default()
    }

    /// Grid spacing (dx) of every domain, each nest refining its parent.
    pub fn grid_spacings(&self) -> Vec<f64> {
        let mut spacings: Vec<f64> = Vec::with_capacity(self.config.domains.len());
        for domain in &self.config.domains {
            let parent = spacings.get((domain.parent_id as usize).saturating_sub(1));
            let spacing = match parent {
                Some(parent) => parent / f64::from(domain.parent_ratio),
                None => self.step_size()[0],
            };
            spacings.push(spacing);
        }
        spacings
    }

    /// Model time step in seconds: the configured one, or six times the
    /// outer grid spacing in kilometres.
    pub fn wrf_time_step(&self) -> u32 {
        self.config.wrf.time_step.unwrap_or_else(|| {
            let seconds = (self.step_size()[0] / 1000.0 * 6.0).floor();
            (seconds as u32).max(1)
        })
    }

    /// Simulated minutes between the start and end dates.
    pub fn simulation_minutes(&self) -> u32 {
        u32::try_from((self.end - self.start).num_minutes()).unwrap_or(u32::MAX)
    }
}

fn validate_wrf(settings: &WrfSettings) -> ConfigResult<()> {
    if settings.vertical_levels == 0 {
        return Err(ConfigError::invalid("WRF vertical levels have to be positive"));
    }
    if settings.history_interval == 0 {
        return Err(ConfigError::invalid("WRF history interval has to be positive"));
    }
    if settings.time_step == Some(0) {
        return Err(ConfigError::invalid("WRF time step has to be positive"));
    }
    Ok(())
}

fn validate_domains(config: &WpsConfig) -> ConfigResult<()> {
    let Some(first) = config.domains.first() else {
        return Err(ConfigError::invalid("At least one domain is required"));
    };

    if first.step_size.is_none() {
        return Err(ConfigError::invalid("Step size not specified in the first domain"));
    }
    if config.domains[1..].iter().any(|domain| domain.step_size.is_some()) {
        return Err(ConfigError::invalid(
            "Step size can be specified only on the first domain",
        ));
    }

    if first.parent_id != 1 {
        return Err(ConfigError::invalid("First domain parent id has to be 1"));
    }

    // Domain at index i may nest inside any of the domains 1..=i.
    for (offset, domain) in config.domains[1..].iter().enumerate() {
        let index = offset + 1;
        if domain.parent_id < 1 {
            return Err(ConfigError::invalid(format!(
                "Invalid parent_id {} of domain {}: has to be at least 1",
                domain.parent_id,
                index + 1
            )));
        }
        if domain.parent_id as usize > index {
            return Err(ConfigError::invalid(format!(
                "Invalid parent_id {} of domain {}: too large",
                domain.parent_id,
                index + 1
            )));
        }
        if domain.parent_ratio == 0 {
            return Err(ConfigError::invalid(format!(
                "Invalid parent_ratio of domain {}: has to be positive",
                index + 1
            )));
        }
    }

    Ok(())
}

/// Parse the date formats accepted in configuration files.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
