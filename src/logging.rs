use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the stderr subscriber. `RUST_LOG` wins over the verbosity count.
pub fn init(verbosity: u8, json: bool) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,newcomers={level}")));

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        tracing_subscriber::registry().with(filter).with(layer.json()).try_init()?;
    } else {
        tracing_subscriber::registry().with(filter).with(layer).try_init()?;
    }
    Ok(())
}
