use std::sync::Arc;
use std::thread;

use clap::Parser;
use motion_core::command::{self, Command, RawRequest};
use motion_core::config::{self, Config};
use motion_core::engine::Engine;
use motion_core::telemetry::{self, TelemetryRing};
use motion_core::transport;

#[derive(Parser, Debug)]
#[command(name = "motion-core", version, about = "Multi-axis motion control engine")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(default_value = "motion-core.toml")]
    config: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("could not load '{}' ({e}); falling back to defaults", cli.config);
            Config::default()
        }
    };

    tracing_subscriber::fmt().with_env_filter(config.log_level.as_filter()).init();

    tracing::info!("starting motion-core, axis_count={}", config.engine.axis_count);

    let ring = TelemetryRing::new();
    let csv_ring = Arc::clone(&ring);
    let csv_path = config.telemetry.csv_path.clone();
    let csv_handle = thread::spawn(move || {
        if let Err(e) = telemetry::run_csv_sink(csv_ring, &csv_path) {
            tracing::error!("csv sink terminated: {e}");
        }
    });

    let (tx, rx) = crossbeam_channel::unbounded::<(RawRequest, crossbeam_channel::Sender<(bool, Option<String>)>)>();

    let transport_port = config.transport.port;
    thread::spawn(move || {
        if let Err(e) = transport::run_server(transport_port, tx) {
            tracing::error!("transport server terminated: {e}");
        }
    });

    // Give the transport thread a moment to bind before the control worker
    // starts draining the channel, mirroring the upstream bootstrap order.
    thread::sleep(std::time::Duration::from_millis(50));

    let mut engine = Engine::new(config.engine.axis_count);
    let axis_count = engine.axis_count();

    while engine.running {
        match rx.recv_timeout(std::time::Duration::from_millis(10)) {
            Ok((req, reply_tx)) => {
                let outcome = match Command::decode(req, axis_count) {
                    Some(cmd) => {
                        let ring = Arc::clone(&ring);
                        command::dispatch(&mut engine, cmd, move |record| ring.push(record))
                    }
                    None => {
                        tracing::warn!("rejected malformed command cmd={} axis={}", req.cmd, req.axis);
                        command::DispatchOutcome { close_connection: false, status_text: Some("rejected".to_string()) }
                    }
                };
                let _ = reply_tx.send((outcome.close_connection, outcome.status_text));
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    tracing::info!("control worker stopped, draining telemetry sink");
    ring.shutdown();
    let _ = csv_handle.join();

    Ok(())
}
