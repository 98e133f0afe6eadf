//! Line classifiers.
//!
//! A [`ClassifierSet`] bundles the three predicates a step supplies to its
//! output monitor. Helpers for the patterns printed by the WPS programs and
//! by real.exe and wrf.exe live here as well.

use chrono::NaiveDateTime;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, OnceLock};
use wr_protocol::Progress;

type ProgressFn = dyn Fn(&str) -> Option<Progress> + Send + Sync;
type PredicateFn = dyn Fn(&str) -> bool + Send + Sync;

/// Result of running every predicate of a [`ClassifierSet`] on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_error: bool,
    pub is_completion: bool,
    pub progress: Option<Progress>,
}

impl Classification {
    /// A line matched by the error predicate. Nothing else is evaluated.
    pub fn error() -> Self {
        Self {
            is_error: true,
            ..Self::default()
        }
    }
}

/// Three pure predicates fixed at construction.
#[derive(Clone)]
pub struct ClassifierSet {
    progress: Arc<ProgressFn>,
    completion: Arc<PredicateFn>,
    error: Arc<PredicateFn>,
}

impl ClassifierSet {
    /// Build a classifier set from a progress extractor, a completion
    /// predicate and an error predicate.
    pub fn new<P, C, E>(progress: P, completion: C, error: E) -> Self
    where
        P: Fn(&str) -> Option<Progress> + Send + Sync + 'static,
        C: Fn(&str) -> bool + Send + Sync + 'static,
        E: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            progress: Arc::new(progress),
            completion: Arc::new(completion),
            error: Arc::new(error),
        }
    }

    /// Classifier set used by the WPS programs.
    ///
    /// - progress: `Processing domain <c> of <t>`
    /// - completion: `Successful completion of <program>`
    /// - error: any line containing `ERROR`
    pub fn wps(program: &str) -> Self {
        let completion_marker = format!("Successful completion of {program}");
        Self::new(
            domain_progress,
            move |line: &str| line.contains(&completion_marker),
            contains_error,
        )
    }

    /// Classify one line. An error line short-circuits the other predicates.
    pub fn classify(&self, line: &str) -> Classification {
        if (self.error)(line) {
            return Classification::error();
        }

        Classification {
            is_error: false,
            is_completion: (self.completion)(line),
            progress: (self.progress)(line),
        }
    }
}

impl fmt::Debug for ClassifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierSet").finish_non_exhaustive()
    }
}

fn domain_regex() -> Option<&'static Regex> {
    static DOMAIN_RE: OnceLock<Option<Regex>> = OnceLock::new();
    DOMAIN_RE
        .get_or_init(|| Regex::new(r"Processing domain (\d+) of (\d+)").ok())
        .as_ref()
}

/// Extract `(current, total)` from a `Processing domain <c> of <t>` line.
pub fn domain_progress(line: &str) -> Option<Progress> {
    let captures = domain_regex()?.captures(line)?;
    let current = captures.get(1)?.as_str().parse().ok()?;
    let total = captures.get(2)?.as_str().parse().ok()?;
    Some(Progress::new(current, total))
}

/// Error predicate shared by the WPS programs.
pub fn contains_error(line: &str) -> bool {
    line.contains("ERROR")
}

fn inventory_regex() -> Option<&'static Regex> {
    static INVENTORY_RE: OnceLock<Option<Regex>> = OnceLock::new();
    INVENTORY_RE
        .get_or_init(|| {
            Regex::new(r"Inventory for date = (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})").ok()
        })
        .as_ref()
}

/// Date of an ungrib `Inventory for date = YYYY-MM-DD HH:MM:SS` line.
pub fn inventory_date(line: &str) -> Option<NaiveDateTime> {
    let captures = inventory_regex()?.captures(line)?;
    NaiveDateTime::parse_from_str(captures.get(1)?.as_str(), "%Y-%m-%d %H:%M:%S").ok()
}

fn real_loop_regex() -> Option<&'static Regex> {
    static REAL_LOOP_RE: OnceLock<Option<Regex>> = OnceLock::new();
    REAL_LOOP_RE
        .get_or_init(|| Regex::new(r"loop #\s*(\d+) out of\s*(\d+)").ok())
        .as_ref()
}

/// Extract `(current, total)` from a real.exe
/// `Current date being processed: ..., which is loop #  2 out of  5` line.
pub fn real_progress(line: &str) -> Option<Progress> {
    let captures = real_loop_regex()?.captures(line)?;
    let current = captures.get(1)?.as_str().parse().ok()?;
    let total = captures.get(2)?.as_str().parse().ok()?;
    Some(Progress::new(current, total))
}

fn wrf_timing_regex() -> Option<&'static Regex> {
    static WRF_TIMING_RE: OnceLock<Option<Regex>> = OnceLock::new();
    WRF_TIMING_RE
        .get_or_init(|| {
            Regex::new(concat!(
                r"Timing for main: time ",
                r"(\d{4}-\d{2}-\d{2}_\d{2}:\d{2}:\d{2}) on domain\s+1:"
            ))
            .ok()
        })
        .as_ref()
}

/// Model time of a wrf.exe `Timing for main: time ... on domain 1:` line.
/// Nested domains report the same times and are skipped.
pub fn wrf_model_time(line: &str) -> Option<NaiveDateTime> {
    let captures = wrf_timing_regex()?.captures(line)?;
    NaiveDateTime::parse_from_str(captures.get(1)?.as_str(), "%Y-%m-%d_%H:%M:%S").ok()
}

/// Completion marker of real.exe and wrf.exe (`SUCCESS COMPLETE`).
pub fn wrf_success(line: &str) -> bool {
    line.contains("SUCCESS COMPLETE")
}

/// Error predicate of real.exe and wrf.exe.
pub fn wrf_fatal(line: &str) -> bool {
    line.contains("FATAL CALLED")
}
