//! Tracing subscriber setup shared by the binaries
//!
//! The server logs to stdout. The CLI owns stdout for its JSON output and
//! passes stderr instead.

use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Default filter when `RUST_LOG` is unset
pub fn default_directives(level: &str) -> String {
    format!(
        "postnorm_api={level},postnorm_normalize={level},postnorm_common={level},tower_http={level}",
        level = level
    )
}

/// `RUST_LOG` if set, else the default directives at `level`
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Formatting subscriber writing to `writer`
pub fn subscriber<W>(filter: EnvFilter, writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing<W>(level: &str, writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    subscriber(env_filter(level), writer).init();
}


#[cfg(test)]
mod tests {
    use super::capture::Capture;
    use super::*;
    use tracing::{info, warn};

    #[test]
    fn test_default_directives_cover_all_crates() {
        let directives = default_directives("debug");
        assert_eq!(
            directives,
            "postnorm_api=debug,postnorm_normalize=debug,postnorm_common=debug,tower_http=debug"
        );
        assert!(directives.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn test_events_go_to_the_given_writer() {
        let logs = Capture::default();
        let sink = logs.clone();
        let subscriber = subscriber(EnvFilter::new("postnorm_api=warn"), move || sink.clone());

        tracing::subscriber::with_default(subscriber, || {
            info!("filtered out");
            warn!("Registry lists a platform outside the allow-list");
        });

        let contents = logs.contents();
        assert!(contents.contains("outside the allow-list"));
        assert!(!contents.contains("filtered out"));
    }
}
