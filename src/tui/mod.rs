//! Terminal User Interface for askdb.
//!
//! Provides the main TUI application loop using ratatui and crossterm.
//! Turns are awaited inline: while one runs no input is read, and every
//! state change of the orchestrator triggers a redraw.

pub mod app;
mod events;
mod ui;
pub mod widgets;

pub use app::App;
pub use events::{Event, EventHandler};

use crate::app::{Orchestrator, TurnObserver, TurnState};
use crate::config::ConnectionConfig;
use crate::error::{AskError, Result};
use crate::session::Session;
use app::{AppAction, ConnectStatus};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use tracing::{error, info, warn};

type Term = Terminal<CrosstermBackend<Stdout>>;

/// The main TUI application runner.
pub struct Tui {
    terminal: Term,
    event_handler: EventHandler,
}

/// Redraws the screen on every orchestrator state change.
struct Redraw<'a> {
    terminal: &'a mut Term,
    app: &'a mut App,
}

impl TurnObserver for Redraw<'_> {
    fn on_state(&mut self, state: TurnState, session: &Session) {
        self.app.turn_state = state;
        self.app.sync_history(session);
        let app = &*self.app;
        if let Err(e) = self.terminal.draw(|frame| ui::render(frame, app)) {
            warn!("Failed to redraw: {}", e);
        }
    }
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        let terminal = Self::setup_terminal()?;

        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
        })
    }

    /// Sets up the terminal for TUI rendering.
    fn setup_terminal() -> Result<Term> {
        enable_raw_mode()
            .map_err(|e| AskError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)
            .map_err(|e| AskError::internal(format!("Failed to enter alternate screen: {e}")))?;

        Terminal::new(CrosstermBackend::new(stdout))
            .map_err(|e| AskError::internal(format!("Failed to create terminal: {e}")))
    }

    /// Restores the terminal to its original state.
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| AskError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|e| AskError::internal(format!("Failed to leave alternate screen: {e}")))?;

        self.terminal
            .show_cursor()
            .map_err(|e| AskError::internal(format!("Failed to show cursor: {e}")))?;

        Ok(())
    }

    /// Runs the main event loop until the user quits.
    ///
    /// `defaults` pre-fills the connection form. `startup_error` is shown in
    /// the side panel, for a failed `--connect`.
    pub async fn run(
        &mut self,
        orchestrator: &mut Orchestrator,
        defaults: &ConnectionConfig,
        startup_error: Option<AskError>,
    ) -> Result<()> {
        // Set up panic hook to restore terminal on panic
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        let mut app_state = App::new(defaults);
        app_state.turn_state = orchestrator.state();
        app_state.connection_info = orchestrator
            .session()
            .connections()
            .label()
            .map(String::from);
        if let Some(e) = startup_error {
            app_state.connect_status = Some(ConnectStatus::Failed(e.to_string()));
        } else if app_state.connection_info.is_some() {
            app_state.connect_status = Some(ConnectStatus::Connected);
        }

        let result = self.event_loop(&mut app_state, orchestrator).await;

        if let Err(e) = orchestrator.close().await {
            warn!("Error closing database connection: {}", e);
        }

        // Restore panic hook
        let _ = panic::take_hook();

        result
    }

    async fn event_loop(&mut self, app_state: &mut App, orchestrator: &mut Orchestrator) -> Result<()> {
        while app_state.running {
            self.draw(app_state)?;

            let handler = self.event_handler;
            let event = tokio::task::spawn_blocking(move || handler.next())
                .await
                .map_err(|e| AskError::internal(format!("Event reader failed: {e}")))??;

            match app_state.handle_event(event) {
                Some(AppAction::Ask(question)) => {
                    self.ask(&question, app_state, orchestrator).await;
                }
                Some(AppAction::Connect) => {
                    self.connect(app_state, orchestrator).await?;
                }
                None => {}
            }
        }

        Ok(())
    }

    fn draw(&mut self, app_state: &App) -> Result<()> {
        self.terminal
            .draw(|frame| ui::render(frame, app_state))
            .map_err(|e| AskError::internal(format!("Failed to draw: {e}")))?;
        Ok(())
    }

    /// Runs one question and appends what it produced to the chat.
    async fn ask(&mut self, question: &str, app_state: &mut App, orchestrator: &mut Orchestrator) {
        let mut observer = Redraw {
            terminal: &mut self.terminal,
            app: &mut *app_state,
        };
        let outcome = orchestrator.ask(question, &mut observer).await;
        app_state.turn_state = orchestrator.state();

        if let Err(e) = &outcome {
            error!("Turn failed: {}", e);
        }
        app_state.show_outcome(orchestrator.session(), &outcome);
    }

    /// Connects with the form values and reports the outcome in the side panel.
    async fn connect(&mut self, app_state: &mut App, orchestrator: &mut Orchestrator) -> Result<()> {
        let config = match app_state.form.to_config() {
            Ok(config) => config,
            Err(e) => {
                app_state.connect_status = Some(ConnectStatus::Failed(e.to_string()));
                return Ok(());
            }
        };

        app_state.connect_status = Some(ConnectStatus::Connecting);
        self.draw(app_state)?;

        info!("Connecting to {}", config.display_string());
        app_state.connect_status = Some(match orchestrator.connect(&config).await {
            Ok(()) => ConnectStatus::Connected,
            Err(e) => ConnectStatus::Failed(e.to_string()),
        });

        app_state.turn_state = orchestrator.state();
        app_state.connection_info = orchestrator
            .session()
            .connections()
            .label()
            .map(String::from);

        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}
