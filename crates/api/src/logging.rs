use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn setup(log_level: &str) {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(true)
        .compact();

    // RUST_LOG wins over the configured level
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{log_level},spread_arb_api=debug,spread_arb_core=info,tower_http=info"
        ))
    });

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .init();
}
