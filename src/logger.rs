use std::{
    fs::File,
    sync::{Arc, OnceLock},
};

use anyhow::Context;
use time::{
    format_description::{self, parse, BorrowedFormatItem},
    OffsetDateTime, UtcOffset,
};
use tracing::{level_filters::LevelFilter, subscriber::set_global_default, Subscriber};
use tracing_subscriber::{
    fmt::time::OffsetTime, layer::SubscriberExt, registry::LookupSpan, Layer, Registry,
};

static LOG_FILE: OnceLock<Arc<File>> = OnceLock::new();

/// Create the session log file and route every event of the process to it.
///
/// Profiled runs install their own subscriber; they pick the same file up through
/// [`file_layer`].
pub fn init_logger() -> anyhow::Result<()> {
    let file_name = get_log_file_name()?;
    let file = File::create(&file_name)
        .with_context(|| format!("could not create log file '{file_name}'"))?;
    LOG_FILE
        .set(Arc::new(file))
        .map_err(|_| anyhow::anyhow!("logger already initialized"))?;

    let subscriber = Registry::default().with(file_layer());
    set_global_default(subscriber).context(
        "could not set global default tracing subscriber. Consider disabling logs if you are already setting a subscriber",
    )
}

/// Writes to the session log file, if [`init_logger`] was called.
pub(crate) fn file_layer<S>() -> Option<Box<dyn Layer<S> + Send + Sync + 'static>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let file = LOG_FILE.get()?.clone();
    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_timer(local_timer())
        .with_writer(file)
        .with_filter(LevelFilter::DEBUG);
    Some(Box::new(layer))
}

fn local_timer() -> OffsetTime<Vec<BorrowedFormatItem<'static>>> {
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let format = format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
        .unwrap_or_default();
    OffsetTime::new(local_offset, format)
}

fn get_log_file_name() -> anyhow::Result<String> {
    let format = parse("[year]-[month]-[day]_[hour]:[minute]:[second]_profile_log.txt")?;
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    Ok(now.format(&format)?)
}
