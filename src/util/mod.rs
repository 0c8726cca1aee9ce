use crate::core::prelude::*;

use std::fmt::{Debug, Display, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::EnvFilter;

pub mod assert;
pub mod canvas;
pub mod colour;
pub mod linalg;

pub mod vm_err {
    use anyhow::Result;
    use tracing::error;

    fn log_error(e: &anyhow::Error) {
        error!("{}", e);
        e.chain()
            .skip(1)
            .for_each(|cause| error!("caused by: {}", cause));
    }

    pub fn log_err_and_ignore<T>(result: Result<T>) {
        if let Err(e) = result {
            log_error(&e);
        }
    }

    pub fn log_and_ok<T>(result: Result<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                log_error(&e);
                None
            }
        }
    }
}

pub mod vm_float {
    use num_traits::Zero;
    use std::time::Duration;

    pub fn force_positive_zero(x: f64) -> f64 {
        if x.is_zero() { 0.0 } else { x }
    }

    /// Parses user input as a number. Anything unparseable (including the empty string) is 0.
    ///
    /// ```
    /// use vmatrix::util::vm_float::parse_or_zero;
    /// assert_eq!(parse_or_zero(" 2.5 "), 2.5);
    /// assert_eq!(parse_or_zero("abc"), 0.0);
    /// assert_eq!(parse_or_zero("NaN"), 0.0);
    /// ```
    pub fn parse_or_zero(s: &str) -> f64 {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .unwrap_or(0.0)
    }

    /// Shortest round-trip representation, with `-0` printed as `0`.
    pub fn format_plain(x: f64) -> String {
        format!("{}", force_positive_zero(x))
    }

    pub fn millis(duration: Duration) -> f64 {
        duration.as_secs_f64() * 1000.0
    }
}

/// Shared ownership of a service that must only ever have one user at a time.
///
/// Unlike a plain `Arc<Mutex<T>>`, [`get()`](UniqueShared::get) never blocks: re-entrant or
/// concurrent access panics. Everything in a session runs on one thread, so contention can
/// only mean a mutation path was entered while another was still running.
pub struct UniqueShared<T: ?Sized> {
    inner: Arc<Mutex<T>>,
}

unsafe impl<T: ?Sized + Send> Send for UniqueShared<T> {}
unsafe impl<T: ?Sized + Send> Sync for UniqueShared<T> {}

// #[derive(Clone)] does not respect ?Sized.
impl<T: ?Sized> Clone for UniqueShared<T> {
    fn clone(&self) -> Self {
        UniqueShared {
            inner: self.inner.clone(),
        }
    }
}

impl<T> UniqueShared<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }
}

impl<T: ?Sized> UniqueShared<T> {
    pub fn get(&self) -> MutexGuard<'_, T> {
        self.inner
            .try_lock()
            .expect("attempted to acquire UniqueShared but it was already in use")
    }
}

impl<T: Clone> UniqueShared<T> {
    pub fn clone_inner(&self) -> T {
        self.get().clone()
    }
}

impl<T: Debug> Debug for UniqueShared<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "UniqueShared[{:?}]", self.get())
    }
}

impl<T: Display> Display for UniqueShared<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "UniqueShared[{}]", self.get())
    }
}

impl<T: Default> Default for UniqueShared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Installs the global `tracing` subscriber. Logs go to `logfile` if given, otherwise stderr.
/// The level is taken from `RUST_LOG`, defaulting to `info`.
pub fn setup_log(logfile: Option<&Path>) -> Result<()> {
    let timer = OffsetTime::new(
        time::UtcOffset::UTC,
        time::macros::format_description!("[hour]:[minute]:[second].[subsecond digits:6]"),
    );
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_target(false)
                .with_source_location(true)
                .with_timer(timer),
        )
        .with_env_filter(filter);
    if let Some(path) = logfile {
        let logfile = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .with_context(|| format!("could not open log file {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(logfile))
            .try_init()
            .map_err(|e| anyhow!("{e}"))?;
    } else {
        builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!("{e}"))?;
    }
    Ok(())
}
