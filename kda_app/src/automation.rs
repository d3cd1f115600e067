//! Unattended screens and the record of what they displayed, used by the emulator and tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::review::ReviewScreen;
use crate::screen::{Input, Page, Screen, UiEvent};

/// A rendered screen as reported to automation clients
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScreenEvent {
    Prompt {
        header: String,
        prompt: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        paginate: bool,
    },
    Confirm {
        text: String,
        x: u16,
        y: u16,
    },
}

impl From<&ReviewScreen> for ScreenEvent {
    fn from(screen: &ReviewScreen) -> Self {
        match screen {
            ReviewScreen::Prompt {
                header,
                prompt,
                paginate,
            } => ScreenEvent::Prompt {
                header: header.clone(),
                prompt: prompt.clone(),
                paginate: *paginate,
            },
            ReviewScreen::Confirm { text, position } => ScreenEvent::Confirm {
                text: text.clone(),
                x: position.x,
                y: position.y,
            },
        }
    }
}

/// Shared, append only record of the screens shown, each screen once and in order.
///
/// Clones share the same record.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ScreenEvent>>>,
}

impl EventLog {
    pub fn record(&self, screen: &ReviewScreen) {
        let event = ScreenEvent::from(screen);
        tracing::debug!("screen shown: {event:?}");
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn events(&self) -> Vec<ScreenEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return the recorded events and start a new record
    pub fn take(&self) -> Vec<ScreenEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self.events())
    }
}

/// How an unattended screen answers a review
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Automation {
    /// Scroll through every page and approve on the confirm screen
    AcceptAll,

    /// Scroll through every page and refuse on the confirm screen
    RejectAll,

    /// Replay the given inputs, the review is cancelled when they run out
    Script(Vec<Input>),
}

/// A [`Screen`] driven by an [`Automation`] policy
#[derive(Debug)]
pub struct AutomatedScreen {
    automation: Automation,
    script: VecDeque<Input>,
    on_confirm: bool,
    log: EventLog,
}

impl AutomatedScreen {
    pub fn new(automation: Automation, log: EventLog) -> Self {
        let script = match &automation {
            Automation::Script(inputs) => inputs.iter().copied().collect(),
            _ => VecDeque::new(),
        };
        Self {
            automation,
            script,
            on_confirm: false,
            log,
        }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }
}

impl Screen for AutomatedScreen {
    fn render(&mut self, page: &Page<'_>) {
        self.on_confirm = page.screen.is_confirm();
        if page.is_first() {
            self.log.record(page.screen);
        }
    }

    fn next_event(&mut self) -> UiEvent {
        match (&self.automation, self.on_confirm) {
            (Automation::AcceptAll, true) => Input::Accept.into(),
            (Automation::RejectAll, true) => Input::Reject.into(),
            (Automation::AcceptAll | Automation::RejectAll, false) => Input::Next.into(),
            (Automation::Script(_), _) => match self.script.pop_front() {
                Some(input) => input.into(),
                None => UiEvent::Cancel,
            },
        }
    }

    fn release(&mut self) {
        self.on_confirm = false;
        if let Automation::Script(inputs) = &self.automation {
            self.script = inputs.iter().copied().collect();
        }
    }
}
