use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use tracing::{callsite::Identifier, span::Id, Metadata, Subscriber};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

use super::ProfileSample;

/// Per-callsite totals of one capture.
#[derive(Debug)]
struct FunctionStats {
    name: &'static str,
    file: Option<&'static str>,
    line: Option<u32>,
    calls: u64,
    cumulative: Duration,
    exclusive: Duration,
}

impl FunctionStats {
    fn new(metadata: &'static Metadata<'static>) -> Self {
        Self {
            name: metadata.name(),
            file: metadata.file(),
            line: metadata.line(),
            calls: 0,
            cumulative: Duration::ZERO,
            exclusive: Duration::ZERO,
        }
    }

    fn location(&self) -> String {
        let file = self
            .file
            .and_then(|f| Path::new(f).file_name())
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "~".to_owned());
        match self.line {
            Some(line) => format!("{file}:{line}"),
            None => file,
        }
    }
}

#[derive(Debug)]
struct Frame {
    span: Id,
    callsite: Identifier,
    entered_at: Instant,
    children: Duration,
}

/// Call stack and totals shared between a [`CaptureLayer`] and its
/// [`ProfileCapture`](super::ProfileCapture).
#[derive(Debug, Default)]
pub(super) struct CaptureState {
    stack: Vec<Frame>,
    index: HashMap<Identifier, usize>,
    functions: Vec<FunctionStats>,
}

impl CaptureState {
    pub(super) fn enter(&mut self, span: Id, metadata: &'static Metadata<'static>, now: Instant) {
        let callsite = metadata.callsite();
        if !self.index.contains_key(&callsite) {
            self.index.insert(callsite.clone(), self.functions.len());
            self.functions.push(FunctionStats::new(metadata));
        }
        self.stack.push(Frame {
            span,
            callsite,
            entered_at: now,
            children: Duration::ZERO,
        });
    }

    pub(super) fn exit(&mut self, span: &Id, now: Instant) {
        let Some(pos) = self.stack.iter().rposition(|frame| &frame.span == span) else {
            return;
        };
        // frames above were never exited
        self.stack.truncate(pos + 1);
        let Some(frame) = self.stack.pop() else {
            return;
        };

        let elapsed = now.saturating_duration_since(frame.entered_at);
        let recursive = self.stack.iter().any(|f| f.callsite == frame.callsite);
        let stats = &mut self.functions[self.index[&frame.callsite]];
        stats.calls += 1;
        stats.exclusive += elapsed.saturating_sub(frame.children);
        if !recursive {
            stats.cumulative += elapsed;
        }
        if let Some(parent) = self.stack.last_mut() {
            parent.children += elapsed;
        }
    }

    pub(super) fn samples(&self) -> Vec<ProfileSample> {
        self.functions
            .iter()
            .map(|f| ProfileSample {
                name: f.name.to_owned(),
                location: f.location(),
                call_count: f.calls,
                cumulative_time: f.cumulative,
                exclusive_time: f.exclusive,
            })
            .collect()
    }
}

pub(super) fn lock(state: &Mutex<CaptureState>) -> MutexGuard<'_, CaptureState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Times every span entered while it is installed.
pub(super) struct CaptureLayer {
    state: Arc<Mutex<CaptureState>>,
}

impl CaptureLayer {
    pub(super) fn new(state: Arc<Mutex<CaptureState>>) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let metadata = span.metadata();
        lock(&self.state).enter(id.clone(), metadata, Instant::now());
    }

    fn on_exit(&self, id: &Id, _ctx: Context<'_, S>) {
        let now = Instant::now();
        lock(&self.state).exit(id, now);
    }
}
