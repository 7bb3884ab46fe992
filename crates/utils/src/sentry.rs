use sentry_tracing::{EventFilter, SentryLayer};
use tracing::Level;

/// Initialises the Sentry client when a DSN is configured.
///
/// The returned guard must be held for the lifetime of the process; dropping
/// it flushes pending events.
pub fn init(dsn: Option<&str>, environment: &str) -> Option<sentry::ClientInitGuard> {
    let dsn = dsn.filter(|d| !d.trim().is_empty())?;
    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(environment.to_string().into()),
            ..Default::default()
        },
    ));
    Some(guard)
}

/// Tracing layer forwarding errors to Sentry as events and warnings as
/// breadcrumbs.
pub fn sentry_layer<S>() -> SentryLayer<S>
where
    S: tracing::Subscriber,
    S: for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    SentryLayer::default()
        .span_filter(|meta| matches!(*meta.level(), Level::DEBUG | Level::INFO | Level::WARN | Level::ERROR))
        .event_filter(|meta| match *meta.level() {
            Level::ERROR => EventFilter::Event,
            Level::DEBUG | Level::INFO | Level::WARN => EventFilter::Breadcrumb,
            Level::TRACE => EventFilter::Ignore,
        })
}
