mod app;
mod ui;

use crate::app::{Action, App, CatalogView};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ocr_flow::{
    catalog::InstrumentCatalog,
    config::{FeedConfig, SessionConfig},
    error::CatalogError,
    feed::binance::{BinanceRest, BinanceTradeSource},
    logging::init_file_logging,
    session::{SessionController, SessionSnapshot},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use rustls::crypto::ring::default_provider;
use smol_str::SmolStr;
use std::{error::Error, io, sync::Arc, time::Duration};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info};

const DEFAULT_LOG_FILE: &str = "ocr-flow.log";
const TICK_RATE: Duration = Duration::from_millis(100);

/// Session command queued by the UI. Executed in order by the command task so the event loop
/// never waits on session start up or tear down.
#[derive(Debug)]
enum Command {
    Start(SmolStr),
    Stop,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = default_provider().install_default();

    let log_file = std::env::var("OCR_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    init_file_logging(&log_file)?;

    let feed_config = FeedConfig::from_env();
    let session_config = SessionConfig::from_env();
    info!(?feed_config, ?session_config, "starting ocr-flow-tui");

    let rest = Arc::new(BinanceRest::new(&feed_config)?);
    let trades = Arc::new(BinanceTradeSource::new(
        feed_config.trade_stream_url.clone(),
        feed_config.read_timeout,
    ));
    let controller = Arc::new(SessionController::new(
        trades,
        Arc::<BinanceRest>::clone(&rest),
        session_config,
    ));

    // Catalog is fetched in the background while the loading view is shown
    let (catalog_tx, catalog_rx) = oneshot::channel();
    {
        let rest = Arc::clone(&rest);
        tokio::spawn(async move {
            let catalog = InstrumentCatalog::fetch(&rest, &feed_config).await;
            if let Err(error) = &catalog {
                error!(%error, "failed to load instrument catalog");
            }
            let _ = catalog_tx.send(catalog);
        });
    }

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let command_task = tokio::spawn(run_commands(Arc::clone(&controller), command_rx));

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, catalog_rx, controller.subscribe(), &command_tx);

    // Release the feed before handing the terminal back
    drop(command_tx);
    if let Err(error) = command_task.await {
        error!(%error, "command task terminated abnormally");
    }
    controller.stop().await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("ocr-flow-tui exited");
    Ok(result?)
}

async fn run_commands(
    controller: Arc<SessionController>,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
) {
    while let Some(command) = command_rx.recv().await {
        match command {
            Command::Start(symbol) => {
                if let Err(error) = controller.start(&symbol).await {
                    error!(%symbol, %error, "failed to start session");
                }
            }
            Command::Stop => controller.stop().await,
        }
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut catalog_rx: oneshot::Receiver<Result<InstrumentCatalog, CatalogError>>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    command_tx: &mpsc::UnboundedSender<Command>,
) -> io::Result<()> {
    let mut app = App::new();
    let mut catalog_pending = true;

    loop {
        if catalog_pending {
            match catalog_rx.try_recv() {
                Ok(catalog) => {
                    app.set_catalog(catalog);
                    catalog_pending = false;
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    app.catalog = CatalogView::Failed("catalog task exited".to_string());
                    catalog_pending = false;
                }
            }
        }

        let snapshot = snapshot_rx.borrow().clone();
        terminal.draw(|f| ui::render(f, &mut app, &snapshot))?;

        if !event::poll(TICK_RATE)? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };

        let command = match app.handle_key(key) {
            Some(Action::Quit) => return Ok(()),
            Some(Action::Start(symbol)) => Command::Start(symbol),
            Some(Action::Stop) => Command::Stop,
            None => continue,
        };

        if command_tx.send(command).is_err() {
            error!("command task has exited");
            return Ok(());
        }
    }
}
