use crate::backend::ChatBackend;
use crate::config::ChatConfig;
use crate::event::{AppEvent, Event, EventHandler};
use crate::store::{ChatStore, Sender};
use color_eyre::Result;
use ratatui::{
    DefaultTerminal,
    crossterm::event::{KeyCode, KeyEvent, KeyModifiers},
};
use throbber_widgets_tui::ThrobberState;

/// Shown as a bot message when a request fails for any reason.
pub const SEND_FAILED_APOLOGY: &str =
    "متأسفانه مشکلی در ارتباط با سرور پیش آمد. لطفاً دوباره تلاش کنید.";

/// Fixed payload of the silent auto-greeting request.
pub const GREETING_PROBE: &str = "سلام";

/// Settled result of a chat request, posted back onto the event loop by
/// the request task. The task posts exactly one outcome per request, so
/// applying it is the single place the loading flag comes back down.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    Answer { text: String, fallback: bool },
    Failed,
}

/// Application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    pub running: bool,
    /// Conversation state.
    pub store: ChatStore,
    /// Client for the remote chat service.
    pub backend: ChatBackend,
    pub config: ChatConfig,

    /// Current input line buffer.
    pub input: String,
    /// Whether the input line has keyboard focus.
    pub input_focused: bool,
    /// Focus is taken on the tick after the panel opens, once layout has
    /// settled.
    focus_pending: bool,

    /// History scroll offset in lines.
    pub chat_scroll: u16,
    /// When pinned, the view follows the newest message.
    pub chat_pinned: bool,
    /// Largest valid scroll offset, synced by the history renderer.
    pub chat_max_scroll: u16,

    /// Result of the startup health probe. `None` until it settles.
    pub backend_online: Option<bool>,
    pub throbber_state: ThrobberState,

    /// Event handler.
    pub events: EventHandler,
}

impl App {
    /// Constructs a new instance of [`App`].
    pub fn new(config: ChatConfig) -> Self {
        let backend = ChatBackend::from_config(&config);
        let events = EventHandler::new();

        // Startup reachability probe, informational only.
        {
            let backend = backend.clone();
            let sender = events.sender();
            tokio::spawn(async move {
                let online = backend.health().await;
                tracing::info!(online, "backend health probe settled");
                let _ = sender.send(Event::App(AppEvent::HealthChecked(online)));
            });
        }

        Self {
            running: true,
            store: ChatStore::new(),
            backend,
            config,
            input: String::new(),
            input_focused: false,
            focus_pending: false,
            chat_scroll: 0,
            chat_pinned: true,
            chat_max_scroll: 0,
            backend_online: None,
            throbber_state: ThrobberState::default(),
            events,
        }
    }

    /// Run the application's main loop.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.store.seed_greeting();

        let mut needs_redraw = true;
        while self.running {
            if needs_redraw {
                terminal.draw(|frame| frame.render_widget(&mut self, frame.area()))?;
                needs_redraw = false;
            }

            match self.events.next().await? {
                Event::Tick => {
                    needs_redraw = self.tick();
                }
                Event::Crossterm(event) => {
                    if let crossterm::event::Event::Key(key_event) = event {
                        self.handle_key_events(key_event)?;
                        needs_redraw = true;
                    }
                }
                Event::App(app_event) => {
                    self.handle_app_event(app_event);
                    needs_redraw = true;
                }
            }
        }
        Ok(())
    }

    /// Handles the tick event of the terminal. Returns whether anything
    /// changed that needs a redraw.
    pub fn tick(&mut self) -> bool {
        let mut redraw = false;
        if self.focus_pending {
            self.focus_pending = false;
            self.input_focused = true;
            redraw = true;
        }
        if self.store.is_loading() {
            self.throbber_state.calc_next();
            redraw = true;
        }
        redraw
    }

    /// Handles the key events and updates the state of [`App`].
    pub fn handle_key_events(&mut self, key_event: KeyEvent) -> Result<()> {
        if self.store.is_open() {
            match key_event.code {
                KeyCode::Esc => self.events.send(AppEvent::ToggleChat),
                KeyCode::Char('c' | 'C') if key_event.modifiers == KeyModifiers::CONTROL => {
                    self.events.send(AppEvent::Quit)
                }
                KeyCode::Char('l' | 'L') if key_event.modifiers == KeyModifiers::CONTROL => {
                    self.events.send(AppEvent::ClearHistory)
                }
                KeyCode::Enter => self.events.send(AppEvent::Submit),
                KeyCode::Backspace => self.events.send(AppEvent::InputBackspace),
                KeyCode::Char(ch) => self.events.send(AppEvent::InputChar(ch)),
                KeyCode::PageUp | KeyCode::Up => self.events.send(AppEvent::ScrollUp),
                KeyCode::PageDown | KeyCode::Down => self.events.send(AppEvent::ScrollDown),
                _ => {}
            }
            return Ok(());
        }

        // Collapsed launcher
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') => self.events.send(AppEvent::Quit),
            KeyCode::Char('c' | 'C') if key_event.modifiers == KeyModifiers::CONTROL => {
                self.events.send(AppEvent::Quit)
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('c') => {
                self.events.send(AppEvent::ToggleChat)
            }
            _ => {}
        }
        Ok(())
    }

    pub fn handle_app_event(&mut self, app_event: AppEvent) {
        match app_event {
            AppEvent::ToggleChat => self.toggle_chat(),
            AppEvent::ClearHistory => self.store.clear(),
            AppEvent::InputChar(ch) => {
                // Input is disabled while a request is outstanding.
                if !self.store.is_loading() {
                    self.input.push(ch);
                }
            }
            AppEvent::InputBackspace => {
                if !self.store.is_loading() {
                    self.input.pop();
                }
            }
            AppEvent::Submit => self.submit_message(),
            AppEvent::ScrollUp => self.scroll_up(),
            AppEvent::ScrollDown => self.scroll_down(),
            AppEvent::ReplyReceived(outcome) => self.apply_outcome(outcome),
            AppEvent::GreetingReceived(text, fallback) => {
                self.store.push(text, Sender::Bot, fallback);
                self.chat_pinned = true;
            }
            AppEvent::HealthChecked(online) => self.backend_online = Some(online),
            AppEvent::Quit => self.quit(),
        }
    }

    /// Set running to false to quit the application.
    pub fn quit(&mut self) {
        self.running = false;
    }

    fn toggle_chat(&mut self) {
        self.store.toggle_open();
        if self.store.is_open() {
            self.focus_pending = true;
            self.maybe_auto_greet();
        } else {
            self.focus_pending = false;
            self.input_focused = false;
        }
    }

    /// Issues the silent greeting request the first time the panel opens,
    /// if enabled. The reply lands as an ordinary bot message; a failure
    /// is logged and dropped. The loading flag is not involved.
    fn maybe_auto_greet(&mut self) {
        if !self.config.auto_greet || !self.store.mark_greeted() {
            return;
        }

        let backend = self.backend.clone();
        let sender = self.events.sender();
        tokio::spawn(async move {
            match backend.ask(GREETING_PROBE).await {
                Ok(reply) => {
                    let fallback = reply.is_fallback();
                    let _ = sender.send(Event::App(AppEvent::GreetingReceived(
                        reply.response,
                        fallback,
                    )));
                }
                Err(err) => tracing::warn!("greeting request failed: {err}"),
            }
        });
    }

    /// The send sequence: guard, capture and clear the input, append the
    /// user message, raise the loading flag, dispatch the request.
    pub fn submit_message(&mut self) {
        if self.input.trim().is_empty() || self.store.is_loading() {
            return;
        }

        let text = self.input.trim().to_string();
        self.input.clear();

        self.store.push(text.clone(), Sender::User, false);
        self.store.set_loading(true);
        self.chat_pinned = true;

        let backend = self.backend.clone();
        let sender = self.events.sender();
        tokio::spawn(async move {
            // Both branches post an outcome, so the loading flag cannot
            // stay raised.
            let outcome = match backend.ask(&text).await {
                Ok(reply) => {
                    let fallback = reply.is_fallback();
                    ChatOutcome::Answer {
                        text: reply.response,
                        fallback,
                    }
                }
                Err(err) => {
                    tracing::error!("chat request failed: {err}");
                    ChatOutcome::Failed
                }
            };
            let _ = sender.send(Event::App(AppEvent::ReplyReceived(outcome)));
        });
    }

    /// Applies a settled request outcome: append the reply (or the fixed
    /// apology) and lower the loading flag last.
    pub fn apply_outcome(&mut self, outcome: ChatOutcome) {
        match outcome {
            ChatOutcome::Answer { text, fallback } => {
                self.store.push(text, Sender::Bot, fallback);
            }
            ChatOutcome::Failed => {
                self.store.push(SEND_FAILED_APOLOGY, Sender::Bot, true);
            }
        }
        self.chat_pinned = true;
        self.store.set_loading(false);
    }

    fn scroll_up(&mut self) {
        self.chat_pinned = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    fn scroll_down(&mut self) {
        if self.chat_scroll >= self.chat_max_scroll {
            self.chat_pinned = true;
            return;
        }
        self.chat_scroll += 1;
        if self.chat_scroll >= self.chat_max_scroll {
            self.chat_pinned = true;
        }
    }
}
