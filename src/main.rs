use anyhow::Result;
use netspeed::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Rows carry bytes per poll; scale by the measured span between polls.
fn print_processes(poll: &models::ProcessPoll) {
    if poll.rows.is_empty() {
        return;
    }
    println!("{:>7}  {:<28} {:>12} {:>12}", "PID", "PROCESS", "DOWN", "UP");
    for row in &poll.rows {
        println!(
            "{:>7}  {:<28} {:>12} {:>12}",
            row.pid,
            row.name,
            display::format_speed(poll.per_second(row.rx_delta)),
            display::format_speed(poll.per_second(row.tx_delta)),
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        version = %version::banner(),
        scope = ?app_config.monitor.scope,
        "starting"
    );

    let monitor = Arc::new(rate::RateMonitor::new(
        Arc::new(counters::SystemCounterSource::new()),
        Arc::new(counters::SystemRouteSource),
        app_config.monitor.scope,
        app_config.monitor.fallback_prefixes.clone(),
    ));

    let (updates_tx, mut updates_rx) = watch::channel(models::RateUpdate::default());
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let loop_handle = worker::spawn_interface_loop(
        worker::InterfaceLoopDeps {
            monitor,
            updates_tx,
            shutdown_rx,
        },
        worker::InterfaceLoopConfig {
            controller: rate::IntervalController::from_config(&app_config.monitor),
            stats_log_interval_secs: app_config.monitor.stats_log_interval_secs,
        },
    );

    let (process_tx, mut process_rx) = mpsc::channel(4);
    let _session = if app_config.process.enabled {
        let engine = Arc::new(process_rate::ProcessRateEngine::new(Arc::new(
            accounting::NettopSource::from_config(&app_config.process),
        )));
        Some(
            worker::ProcessSession::start(
                engine,
                worker::ProcessSessionConfig {
                    interval: Duration::from_millis(app_config.process.interval_ms),
                    limit: app_config.process.limit,
                },
                process_tx,
            )
            .await,
        )
    } else {
        drop(process_tx);
        None
    };

    let mode = app_config.display.mode;
    let show_icons = app_config.display.show_icons;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            changed = updates_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let update = *updates_rx.borrow_and_update();
                println!("{}", mode.line(update.upload, update.download, show_icons));
            }
            Some(poll) = process_rx.recv() => {
                print_processes(&poll);
            }
            _ = &mut shutdown => {
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(());
    let _ = loop_handle.await;
    Ok(())
}
