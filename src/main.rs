//! multivid-search: a live search box for the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ set_query  ┌──────────┐ fan-out  ┌───────────┐
//! │ input.rs │ ─────────► │ query.rs │ ───────► │  source/  │
//! │ (binding)│ ◄───────── │ (model)  │          │  (items)  │
//! └──────────┘ QueryEvent └──────────┘          └───────────┘
//!                                    FetchRequest │       ▲ FetchMsg
//!                                                 ▼       │
//! ┌──────────┐   draw()   ┌──────────┐ Reset    ┌───────────┐
//! │  ui.rs   │ ◄───────── │  app.rs  │ ◄─────── │ fetch.rs  │
//! │ (paint)  │            │ (panes)  │          │ (tokio)   │
//! └──────────┘            └──────────┘          └───────────┘
//! ```
//!
//! * **`query`** the query text and its debounce scheduler.
//! * **`source/`** item sources, the item type and response decoding.
//! * **`fetch`** the transport and the worker running requests on tokio.
//! * **`render`** the provider-fair capping of what is shown.
//! * **`input`** the search box, its binding to the model, and keys.
//! * **`app`** owns the model and the painted panes.
//! * **`ui`** pure rendering: reads `App` state and draws widgets.
//! * **`main`** wires everything together: parse args, set up the terminal,
//!   and run the event loop.

mod app;
mod config;
mod fetch;
mod input;
mod logging;
mod observer;
mod query;
mod render;
mod source;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use app::App;
use config::{Args, Settings};
use fetch::HttpTransport;
use query::{QueryModel, QueryOrigin};
use source::ItemSource;

// ---------------------------------------------------------------------------
// RAII terminal guard, restores the terminal even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the panic message is printed.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        tracing::error!(%info, "panic");
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let settings = Settings::from(Args::parse());
    logging::init(settings.log_file.as_deref(), &settings.log_level)?;
    install_panic_hook();

    // -- fetch worker --------------------------------------------------------
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let transport = HttpTransport::new(settings.base_url.clone())?;
    let (requests, completions) = fetch::spawn(runtime.handle(), Arc::new(transport));

    // -- model ---------------------------------------------------------------
    let sources = vec![
        ItemSource::new(settings.suggestions.clone(), requests.clone()),
        ItemSource::new(settings.results.clone(), requests),
    ];
    let mut model = QueryModel::new(sources, settings.min_update_interval);
    if let Some(query) = &settings.initial_query {
        model.set_query(query, QueryOrigin::Initial, Instant::now());
        model.flush();
    }
    let mut app = App::new(model, settings.suggestion_render, settings.result_render);
    info!(base_url = %settings.base_url, "search box ready");

    // -- terminal setup (RAII, Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;

    // -- main event loop -----------------------------------------------------
    // Each iteration:
    //   1. Drain fetch completions.
    //   2. Fire the debounce timer if due and apply model/source events.
    //   3. Render.
    //   4. Wait for input, no longer than the tick or the pending deadline.
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Ok(msg) = completions.try_recv() {
            app.handle_fetch(msg);
        }

        app.tick(Instant::now());

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        let timeout = app
            .model
            .time_until_fire(Instant::now())
            .map_or(tick_rate, |left| left.min(tick_rate));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key, Instant::now());
            }
        }

        if app.quit {
            break;
        }
    }

    let _ = app.close();
    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
