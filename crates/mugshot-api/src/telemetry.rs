//! Tracing initialization.

use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize the tracing subscriber.
///
/// Production emits JSON lines for log shipping; everywhere else gets a
/// compact human-readable format. `RUST_LOG` overrides the default filter.
pub fn init_telemetry(is_production: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "info,mugshot_api=debug,mugshot_db=debug,mugshot_storage=debug,tower_http=debug".into()
    });

    if is_production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        let console_fmt = tracing_subscriber::fmt::layer().event_format(
            Format::default()
                .compact()
                .with_target(false)
                .without_time(),
        );
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_fmt)
            .init();
    }

    tracing::info!(json_output = is_production, "Telemetry initialized");
}
