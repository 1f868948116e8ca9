use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use occugrid::config::Config;
use occugrid::ingest::Ingestor;
use occugrid::render;
use occugrid::session::{until_shutdown, CalendarSession, CycleOutcome};
use occugrid::source::HttpSheetTransport;

const HELP: &str = "commands: p = previous month, n = next month, r = reload, d = debug panel, q = quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    occugrid::observability::init(config.metrics_port)?;

    info!("occugrid starting");
    info!("  sheet: {}", config.sheet.id);
    info!("  rooms: {}", config.rooms);
    info!("  fetch_timeout: {}ms", config.fetch_timeout.as_millis());
    info!("  metrics: {}", config.metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    let ingestor = Ingestor::new(Arc::new(HttpSheetTransport::new()), config.sheet.clone())
        .with_fetch_timeout(config.fetch_timeout);
    let session = CalendarSession::new(Arc::new(ingestor), config.rooms, config.start_month);

    show(&session, session.open().await).await;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = line.trim();
                match command {
                    "p" | "n" | "r" => {}
                    "d" => {
                        if let Some(view) = session.snapshot().await.view() {
                            print!("{}", render::debug_panel(view, &config.sheet.id));
                        }
                        continue;
                    }
                    "q" => break,
                    "" => continue,
                    _ => {
                        println!("{HELP}");
                        continue;
                    }
                }
                let cycle = async {
                    match command {
                        "p" => session.previous().await,
                        "n" => session.next().await,
                        _ => session.reload().await,
                    }
                };
                // Keep ctrl-c live while the sheet is loading.
                let Some(outcome) = until_shutdown(cycle, &mut shutdown).await else {
                    info!("shutdown signal received");
                    break;
                };
                show(&session, outcome).await;
            }
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    info!("occugrid stopped");
    Ok(())
}

async fn show(session: &CalendarSession, outcome: CycleOutcome) {
    match outcome {
        CycleOutcome::Ready(view) => print!("{}", render::month_view(&view)),
        CycleOutcome::Superseded => print!("{}", render::snapshot(&session.snapshot().await)),
    }
}
