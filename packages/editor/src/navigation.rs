//! # Navigation Guard
//!
//! Intercepts attempts to leave a dirty session and asks the operator what to
//! do with the unsaved changes.
//!
//! ## State machine
//!
//! ```text
//!            dirty && intent                    SaveDraft | Publish
//!   IDLE ───────────────────────▶ PROMPTING ───────────────────────▶ COMMITTING
//!     ▲                             │   ▲                                  │
//!     │   Discard (navigate)        │   │        commit failed             │
//!     ├─────────────────────────────┤   └──────────────────────────────────┤
//!     │   Cancel (stay)             │                                      │
//!     └─────────────────────────────┘◀─────── commit ok (navigate) ────────┘
//! ```
//!
//! - Only one prompt is open at a time; intents arriving while PROMPTING or
//!   COMMITTING are dropped
//! - Back/forward has already moved the history cursor when it is observed,
//!   so the guard re-asserts the current location first and keeps the
//!   intended destination as a deferred intent
//! - Tab close can only be delegated to the host's native prompt
//! - The guard's own navigations (the history re-assert, the final redirect)
//!   arm a one-shot echo. Only the next event, and only if it reports that
//!   same destination, passes through; any other event disarms it, and so
//!   does [`NavigationGuard::tick`] on the next scheduling tick
//! - The open prompt is checked before the echo, so nothing slips past it
//! - Every resolution except Cancel honors the original destination exactly
//!   once; the intent is moved out of the state when it is honored

use crate::draft::RecordStatus;
use std::fmt;

/// Where a navigation attempt wants to go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Href(String),
    Back,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Href(href) => f.write_str(href),
            Destination::Back => f.write_str("<back>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub destination: Destination,
    /// Links leaving the application are left to the native unload prompt
    pub is_external_origin: bool,
}

impl NavigationIntent {
    pub fn link(href: impl Into<String>) -> Self {
        Self {
            destination: Destination::Href(href.into()),
            is_external_origin: false,
        }
    }

    pub fn external(href: impl Into<String>) -> Self {
        Self {
            destination: Destination::Href(href.into()),
            is_external_origin: true,
        }
    }
}

/// Platform side of navigation (router, history, unload prompt)
pub trait NavigationHost {
    /// Start delivering link, history and unload events to the guard
    fn attach(&mut self) {}

    /// Stop delivering events
    fn detach(&mut self) {}

    fn current_location(&self) -> String;

    /// Push `href` onto history without leaving the page
    fn push_location(&mut self, href: &str);

    fn navigate(&mut self, destination: &Destination);

    /// Enable or disable the user agent's native leave-page prompt
    fn set_unload_prompt(&mut self, enabled: bool);
}

/// Operator's answer to the unsaved-changes prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Discard,
    SaveDraft,
    Publish,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    Prompting(NavigationIntent),
    Committing {
        intent: NavigationIntent,
        status: RecordStatus,
    },
}

/// What the host should do with the event it reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    /// Let the default navigation happen
    Allowed,
    /// Default navigation suppressed; a prompt is open
    Prompted,
    /// Default navigation suppressed; another prompt already owns the screen
    Dropped,
}

/// Result of answering the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardAction {
    Navigated(Destination),
    /// The caller must commit with this status, then report back
    CommitRequired(RecordStatus),
    Cancelled,
    NoPrompt,
}

pub struct NavigationGuard {
    host: Box<dyn NavigationHost>,
    state: GuardState,
    listening: bool,
    /// The guard's own last navigation, expected back from the host once
    echo: Option<Destination>,
    unload_prompt: bool,
}

impl NavigationGuard {
    pub fn new(host: Box<dyn NavigationHost>) -> Self {
        Self {
            host,
            state: GuardState::Idle,
            listening: false,
            echo: None,
            unload_prompt: false,
        }
    }

    pub fn start(&mut self) {
        if !self.listening {
            self.host.attach();
            self.listening = true;
            tracing::debug!("navigation guard started");
        }
    }

    pub fn stop(&mut self) {
        if self.listening {
            if self.unload_prompt {
                self.host.set_unload_prompt(false);
                self.unload_prompt = false;
            }
            self.host.detach();
            self.listening = false;
            self.state = GuardState::Idle;
            tracing::debug!("navigation guard stopped");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn host(&self) -> &dyn NavigationHost {
        self.host.as_ref()
    }

    /// Keep the native unload prompt in step with dirty state
    pub fn sync_unload_prompt(&mut self, dirty: bool) {
        let wanted = self.listening && dirty;
        if wanted != self.unload_prompt {
            self.host.set_unload_prompt(wanted);
            self.unload_prompt = wanted;
        }
    }

    /// Tab/window close. Returns whether the native prompt should be shown.
    pub fn on_before_unload(&mut self, dirty: bool) -> bool {
        self.sync_unload_prompt(dirty);
        self.unload_prompt
    }

    /// In-document link activation, observed before the router acts on it
    pub fn on_link_activation(&mut self, intent: NavigationIntent, dirty: bool) -> Interception {
        if !self.listening {
            return Interception::Allowed;
        }
        let echoed = self.take_echo(&intent.destination);
        if self.state != GuardState::Idle {
            return self.drop_intent(&intent.destination);
        }
        if echoed || intent.is_external_origin || !dirty {
            return Interception::Allowed;
        }
        self.open_prompt(intent)
    }

    /// Browser back/forward, observed after the history cursor moved
    pub fn on_history_navigation(&mut self, intended: Destination, dirty: bool) -> Interception {
        if !self.listening {
            return Interception::Allowed;
        }
        let echoed = self.take_echo(&intended);
        if self.state != GuardState::Idle {
            // The cursor already moved; put it back under the open prompt
            self.reassert_location();
            return self.drop_intent(&intended);
        }
        if echoed || !dirty {
            return Interception::Allowed;
        }

        // Undo the implicit navigation before anything else
        self.reassert_location();
        self.open_prompt(NavigationIntent {
            destination: intended,
            is_external_origin: false,
        })
    }

    fn reassert_location(&mut self) {
        let current = self.host.current_location();
        self.host.push_location(&current);
        self.echo = Some(Destination::Href(current));
    }

    /// Disarm the echo; true if `destination` was the guard's own navigation
    fn take_echo(&mut self, destination: &Destination) -> bool {
        self.echo.take().as_ref() == Some(destination)
    }

    fn drop_intent(&self, destination: &Destination) -> Interception {
        tracing::debug!(destination = %destination, "prompt already open; dropping intent");
        Interception::Dropped
    }

    fn open_prompt(&mut self, intent: NavigationIntent) -> Interception {
        tracing::debug!(destination = %intent.destination, "unsaved changes; prompting");
        self.state = GuardState::Prompting(intent);
        Interception::Prompted
    }

    /// Disarm the echo of the guard's own navigation
    pub fn tick(&mut self) {
        self.echo = None;
    }

    /// Apply the operator's answer
    pub fn choose(&mut self, choice: PromptChoice) -> GuardAction {
        let intent = match std::mem::replace(&mut self.state, GuardState::Idle) {
            GuardState::Prompting(intent) => intent,
            other => {
                self.state = other;
                return GuardAction::NoPrompt;
            }
        };

        match choice {
            PromptChoice::Cancel => {
                tracing::debug!("navigation cancelled");
                GuardAction::Cancelled
            }
            PromptChoice::Discard => GuardAction::Navigated(self.proceed(intent)),
            PromptChoice::SaveDraft | PromptChoice::Publish => {
                let status = if choice == PromptChoice::Publish {
                    RecordStatus::Published
                } else {
                    RecordStatus::Draft
                };
                self.state = GuardState::Committing { intent, status };
                GuardAction::CommitRequired(status)
            }
        }
    }

    /// The commit requested by [`GuardAction::CommitRequired`] succeeded
    pub fn commit_succeeded(&mut self) -> Option<Destination> {
        match std::mem::replace(&mut self.state, GuardState::Idle) {
            GuardState::Committing { intent, .. } => Some(self.proceed(intent)),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// The commit failed; reopen the prompt for the same destination
    pub fn commit_failed(&mut self) {
        if let GuardState::Committing { intent, .. } =
            std::mem::replace(&mut self.state, GuardState::Idle)
        {
            self.state = GuardState::Prompting(intent);
        }
    }

    fn proceed(&mut self, intent: NavigationIntent) -> Destination {
        self.echo = Some(intent.destination.clone());
        if self.unload_prompt {
            self.host.set_unload_prompt(false);
            self.unload_prompt = false;
        }
        tracing::debug!(destination = %intent.destination, "navigating");
        self.host.navigate(&intent.destination);
        intent.destination
    }
}

impl Drop for NavigationGuard {
    fn drop(&mut self) {
        self.stop();
    }
}
