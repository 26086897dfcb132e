//! Application state for the TUI.
//!
//! Contains the main App struct and related types for managing UI state.

use crate::app::{TurnOutcome, TurnState};
use crate::config::ConnectionConfig;
use crate::db::DatabaseBackend;
use crate::error::{AskError, Result};
use crate::llm::{Message, Role};
use crate::session::Session;

/// Shown in the side panel after a successful connect.
pub const CONNECTED_NOTICE: &str = "Database connected ✅";

/// Which panel currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Chat,
    Sidebar,
}

impl Focus {
    /// Cycles to the next focus panel.
    pub fn next(self) -> Self {
        match self {
            Self::Input => Self::Chat,
            Self::Chat => Self::Sidebar,
            Self::Sidebar => Self::Input,
        }
    }
}

/// A message in the chat panel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    /// A question from the user.
    User(String),
    /// An answer from the model.
    Assistant(String),
    /// A failed turn. Display only, never part of the session history.
    Error(String),
    /// A notice such as the welcome text or the connect-first advisory.
    System(String),
}

impl ChatMessage {
    fn from_history(message: &Message) -> Self {
        let text = message.content.clone();
        match message.role {
            Role::User => Self::User(text),
            Role::Assistant => Self::Assistant(text),
            Role::System => Self::System(text),
        }
    }

    /// Returns the message type as a string for display purposes.
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::User(_) => "You",
            Self::Assistant(_) => "askdb",
            Self::Error(_) => "Error",
            Self::System(_) => "System",
        }
    }

    /// The message text.
    pub fn text(&self) -> &str {
        match self {
            Self::User(text) | Self::Assistant(text) | Self::Error(text) | Self::System(text) => {
                text
            }
        }
    }
}

/// Input state for text editing.
///
/// `cursor` counts characters, not bytes.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    /// Current input text.
    pub text: String,
    /// Cursor position (character index).
    pub cursor: usize,
}

impl InputState {
    /// Creates a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an input holding `text` with the cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    /// Inserts a character at the cursor position.
    pub fn insert(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.text.insert(idx, c);
        self.cursor += 1;
    }

    /// Deletes the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index(self.cursor);
            self.text.remove(idx);
        }
    }

    /// Deletes the character at the cursor (delete key).
    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let idx = self.byte_index(self.cursor);
            self.text.remove(idx);
        }
    }

    /// Moves the cursor left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Moves the cursor right.
    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    /// Moves the cursor to the start of the input.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor to the end of the input.
    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Clears the input and returns the previous text.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Returns true if the input is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Applies an editing key. Returns false if the key is not an editing key.
    pub fn handle_key(&mut self, code: crossterm::event::KeyCode) -> bool {
        use crossterm::event::KeyCode;

        match code {
            KeyCode::Char(c) => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }
        true
    }
}

/// One labelled text field of the connect form.
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub input: InputState,
    /// Render the value as bullets.
    pub masked: bool,
}

impl FormField {
    fn new(label: &'static str, value: impl Into<String>, masked: bool) -> Self {
        Self {
            label,
            input: InputState::with_text(value),
            masked,
        }
    }

    /// The value as it should appear on screen.
    pub fn display_value(&self) -> String {
        if self.masked {
            "•".repeat(self.input.text.chars().count())
        } else {
            self.input.text.clone()
        }
    }
}

/// The side panel form: host, port, username, password and database.
#[derive(Debug, Clone)]
pub struct ConnectForm {
    pub fields: [FormField; 5],
    /// Index of the field being edited.
    pub selected: usize,
    backend: DatabaseBackend,
}

impl ConnectForm {
    pub const HOST: usize = 0;
    pub const PORT: usize = 1;
    pub const USER: usize = 2;
    pub const PASSWORD: usize = 3;
    pub const DATABASE: usize = 4;

    /// Creates a form pre-filled from a connection config.
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            fields: [
                FormField::new("Host", &config.host, false),
                FormField::new("Port", config.port.to_string(), false),
                FormField::new("Username", &config.user, false),
                FormField::new("Password", &config.password, true),
                FormField::new("Database", &config.database, false),
            ],
            selected: Self::HOST,
            backend: config.backend,
        }
    }

    /// Moves the selection to the next field, wrapping around.
    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % self.fields.len();
    }

    /// Moves the selection to the previous field, wrapping around.
    pub fn select_prev(&mut self) {
        self.selected = (self.selected + self.fields.len() - 1) % self.fields.len();
    }

    /// The field being edited.
    pub fn selected_field(&self) -> &FormField {
        &self.fields[self.selected]
    }

    /// The field being edited, mutably.
    pub fn selected_field_mut(&mut self) -> &mut FormField {
        &mut self.fields[self.selected]
    }

    fn value(&self, idx: usize) -> &str {
        &self.fields[idx].input.text
    }

    /// Builds a connection config from the current field values.
    ///
    /// Values are taken verbatim; only the port must parse.
    pub fn to_config(&self) -> Result<ConnectionConfig> {
        let port_text = self.value(Self::PORT).trim();
        let port = port_text
            .parse::<u16>()
            .map_err(|_| AskError::connection(format!("Invalid port '{port_text}'")))?;

        Ok(ConnectionConfig {
            backend: self.backend,
            host: self.value(Self::HOST).to_string(),
            port,
            user: self.value(Self::USER).to_string(),
            password: self.value(Self::PASSWORD).to_string(),
            database: self.value(Self::DATABASE).to_string(),
        })
    }
}

/// Outcome of the last Connect action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectStatus {
    Connecting,
    Connected,
    Failed(String),
}

impl ConnectStatus {
    /// Text shown under the Connect button.
    pub fn message(&self) -> &str {
        match self {
            Self::Connecting => "Connecting...",
            Self::Connected => CONNECTED_NOTICE,
            Self::Failed(error) => error,
        }
    }
}

/// Work the event loop has to perform for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Run a question through the orchestrator.
    Ask(String),
    /// Connect with the form values.
    Connect,
}

/// Main application state.
pub struct App {
    /// Whether the application is still running.
    pub running: bool,
    /// Current focus panel.
    pub focus: Focus,
    /// Chat input field state.
    pub input: InputState,
    /// Chat lines as displayed: the session history with notices in between.
    pub messages: Vec<ChatMessage>,
    /// Display-only lines, each shown after the given number of turns.
    notices: Vec<(usize, ChatMessage)>,
    /// Chat scroll offset (lines from bottom).
    pub chat_scroll: usize,
    /// Connection form in the side panel.
    pub form: ConnectForm,
    /// Result of the last Connect action.
    pub connect_status: Option<ConnectStatus>,
    /// Label of the active connection for display.
    pub connection_info: Option<String>,
    /// Orchestrator state, mirrored for the header.
    pub turn_state: TurnState,
}

impl App {
    /// Creates a new App instance with the form pre-filled from `defaults`.
    pub fn new(defaults: &ConnectionConfig) -> Self {
        let welcome = ChatMessage::System(
            "Welcome to askdb! Connect in the side panel (Tab), then ask questions about your database."
                .to_string(),
        );

        let mut app = Self {
            running: true,
            focus: Focus::default(),
            input: InputState::new(),
            messages: Vec::new(),
            notices: vec![(0, welcome)],
            chat_scroll: 0,
            form: ConnectForm::from_config(defaults),
            connect_status: None,
            connection_info: None,
            turn_state: TurnState::Idle,
        };
        app.rebuild_messages(&[]);
        app
    }

    /// Rebuilds the chat lines from the session history.
    pub fn sync_history(&mut self, session: &Session) {
        let before = self.messages.len();
        self.rebuild_messages(&session.messages());
        if self.messages.len() != before {
            // Auto-scroll to bottom when something new shows up
            self.chat_scroll = 0;
        }
    }

    /// Adds a display-only line after the turns recorded so far.
    pub fn add_notice(&mut self, session: &Session, message: ChatMessage) {
        self.notices.push((session.turns().len(), message));
        self.sync_history(session);
    }

    /// Shows what a submitted question produced.
    ///
    /// A question asked without a connection leaves no turn behind, so only
    /// the advisory appears.
    pub fn show_outcome(&mut self, session: &Session, outcome: &Result<TurnOutcome>) {
        match outcome {
            Ok(outcome @ TurnOutcome::NotConnected) => {
                self.add_notice(session, ChatMessage::System(outcome.display_text().to_string()));
            }
            Ok(TurnOutcome::Answered(_)) => self.sync_history(session),
            Err(e) => self.add_notice(session, ChatMessage::Error(e.to_string())),
        }
    }

    fn rebuild_messages(&mut self, history: &[Message]) {
        let mut notices = self.notices.iter().peekable();
        let mut messages = Vec::with_capacity(history.len() + self.notices.len());
        let mut turns = 0;

        for message in history {
            if message.role == Role::User {
                while let Some((_, notice)) = notices.next_if(|(after, _)| *after <= turns) {
                    messages.push(notice.clone());
                }
                turns += 1;
            }
            messages.push(ChatMessage::from_history(message));
        }
        messages.extend(notices.map(|(_, notice)| notice.clone()));

        self.messages = messages;
    }

    /// Returns true while a question is being answered.
    pub fn is_busy(&self) -> bool {
        self.turn_state.is_busy()
    }

    /// Handles an event and returns the work it requests, if any.
    pub fn handle_event(&mut self, event: super::Event) -> Option<AppAction> {
        use super::Event;
        use crossterm::event::{KeyCode, KeyModifiers};

        let Event::Key(key) = event else {
            // Resize is handled by ratatui on the next draw
            return None;
        };

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                self.running = false;
                None
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
                None
            }
            _ => match self.focus {
                Focus::Input => self.handle_input_key(key.code),
                Focus::Chat => {
                    self.handle_chat_key(key.code);
                    None
                }
                Focus::Sidebar => self.handle_sidebar_key(key.code),
            },
        }
    }

    fn handle_input_key(&mut self, code: crossterm::event::KeyCode) -> Option<AppAction> {
        use crossterm::event::KeyCode;

        if code == KeyCode::Enter {
            return self.submit_input().map(AppAction::Ask);
        }
        self.input.handle_key(code);
        None
    }

    fn handle_chat_key(&mut self, code: crossterm::event::KeyCode) {
        use crossterm::event::KeyCode;

        match code {
            KeyCode::Up => self.chat_scroll = self.chat_scroll.saturating_add(1),
            KeyCode::Down => self.chat_scroll = self.chat_scroll.saturating_sub(1),
            KeyCode::PageUp => self.chat_scroll = self.chat_scroll.saturating_add(10),
            KeyCode::PageDown => self.chat_scroll = self.chat_scroll.saturating_sub(10),
            KeyCode::Home => self.chat_scroll = usize::MAX, // Clamped during render
            KeyCode::End => self.chat_scroll = 0,
            _ => {}
        }
    }

    fn handle_sidebar_key(&mut self, code: crossterm::event::KeyCode) -> Option<AppAction> {
        use crossterm::event::KeyCode;

        match code {
            KeyCode::Enter => return Some(AppAction::Connect),
            KeyCode::Up | KeyCode::BackTab => self.form.select_prev(),
            KeyCode::Down => self.form.select_next(),
            other => {
                self.form.selected_field_mut().input.handle_key(other);
            }
        }
        None
    }

    /// Submits the current input for processing.
    pub fn submit_input(&mut self) -> Option<String> {
        if self.input.text.trim().is_empty() {
            None
        } else {
            Some(self.input.take())
        }
    }
}
