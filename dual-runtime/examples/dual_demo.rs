//! Dual-mode calling demonstration
//!
//! This example wraps one async and one blocking function and calls each in
//! both modes.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run -p dual-runtime --example dual_demo
//!
//! # JSON format
//! cargo run -p dual-runtime --example dual_demo -- json
//!
//! # With custom filter
//! cargo run -p dual-runtime --example dual_demo -- compact "dual_async=trace"
//! ```

use anyhow::Context;
use dual_async::signature::FnSignature;
use dual_runtime::logging::{init_logging, ConsoleLogger, LogFormat, LogLevel, LoggingConfig};
use dual_runtime::{CallFlags, DualConfig, DualFunction};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Debug)
        .with_spans(true)
        // Mirrors info and above, as a host logging pipeline would.
        .with_logger_sink(Arc::new(ConsoleLogger::default()));

    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    init_logging(config).context("Failed to initialize logging")?;

    info!("=== Dual-Mode Demo ===");

    let dual_config = DualConfig::default();

    let lookup = DualFunction::new(
        FnSignature::from_params("lookup", ["key"]),
        dual_config.clone(),
        lookup,
    )?;

    let digest = DualFunction::from_blocking(
        FnSignature::from_params("digest", ["input"]),
        dual_config,
        digest,
    )?;

    // Sync mode: plain blocking calls from an ordinary thread.
    let value = lookup
        .call("answer".to_string(), &CallFlags::sync())?
        .into_ready()
        .context("sync call returned a deferred outcome")?;
    info!(value = %value, "sync lookup");

    let hash = digest.call_sync("hello".to_string())??;
    info!(hash, "sync digest");

    // Async mode: the same functions composed inside one event loop.
    dual_async::await_blocking(async {
        let (value, hash) = futures::join!(
            lookup.call_async("answer".to_string()),
            digest.call_async("hello".to_string()),
        );
        info!(value = %value, hash = ?hash, "async results");

        // Asking for sync mode here cannot block the running loop.
        if let Err(err) = lookup.call("again".to_string(), &CallFlags::sync()) {
            warn!(error = %err, "sync call refused inside the loop");
        }
    })?;

    info!("=== Demo Complete ===");
    Ok(())
}

#[instrument]
async fn lookup(key: String) -> String {
    tokio::time::sleep(Duration::from_millis(10)).await;
    format!("{}=42", key)
}

fn digest(input: String) -> u64 {
    std::thread::sleep(Duration::from_millis(20));
    input
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
            (hash ^ byte as u64).wrapping_mul(0x0000_0100_0000_01b3)
        })
}
