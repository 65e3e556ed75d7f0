//! Run-scoped call-count and timing capture.
//!
//! Engine code is instrumented with `tracing` spans (usually through `#[instrument]`). While a
//! [`ProfileCapture`] is started, every span entered on the current thread is timed: one call per
//! enter/exit pair, cumulative time including callees, exclusive time without them. A function
//! calling itself only adds the outermost call to its cumulative time.
//!
//! ```
//! use ctf_profiler::profiling::ProfileCapture;
//!
//! #[tracing::instrument]
//! fn work() {}
//!
//! let capture = ProfileCapture::new();
//! {
//!     let _guard = capture.start();
//!     work();
//! } // capture stops here
//! let samples = capture.samples();
//! assert_eq!(samples[0].name, "work");
//! assert_eq!(samples[0].call_count, 1);
//! ```

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{layer::SubscriberExt, Registry};

use crate::logger;

mod layer;

use layer::{lock, CaptureLayer, CaptureState};

/// Statistics of one function during one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSample {
    /// Function (span) name
    pub name: String,
    /// Source file name without directories, and line
    pub location: String,
    /// Number of completed calls
    pub call_count: u64,
    /// Time in the function and its callees
    pub cumulative_time: Duration,
    /// Time in the function alone
    pub exclusive_time: Duration,
}

/// One run worth of profiling data.
#[derive(Debug, Default, Clone)]
pub struct ProfileCapture {
    state: Arc<Mutex<CaptureState>>,
}

impl ProfileCapture {
    /// Empty capture, not recording yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording spans of the current thread.
    ///
    /// Recording stops when the returned guard is dropped, including on early return or unwind.
    #[must_use = "the capture stops as soon as the guard is dropped"]
    pub fn start(&self) -> CaptureGuard {
        let subscriber = Registry::default()
            .with(CaptureLayer::new(self.state.clone()))
            .with(logger::file_layer());
        CaptureGuard {
            _default: tracing::subscriber::set_default(subscriber),
        }
    }

    /// Recorded functions, in the order they were first entered.
    ///
    /// Does not drain the capture: calling it twice returns the same values.
    pub fn samples(&self) -> Vec<ProfileSample> {
        lock(&self.state).samples()
    }
}

/// Keeps a [`ProfileCapture`] recording until dropped.
pub struct CaptureGuard {
    _default: DefaultGuard,
}

impl std::fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureGuard").finish_non_exhaustive()
    }
}
