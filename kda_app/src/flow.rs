//! Drives a [`ReviewFlow`] on a [`Screen`] until the user decides or the review is aborted.
//!
//! ```text
//! Idle -> Rendering -> AwaitingInput -> Rendering (next page or screen)
//!                                    -> Confirmed (Accept on the confirm screen)
//!                                    -> Rejected  (Reject anywhere)
//!                                    -> Cancelled (host or device abort)
//! ```

use crate::review::ReviewFlow;
use crate::screen::{Input, Page, Screen, ScreenGuard, UiEvent};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Rendering { screen: usize, page: usize },
    AwaitingInput { screen: usize, page: usize },
    Confirmed,
    Rejected,
    Cancelled,
}

/// The final state of a review
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Confirmed,
    Rejected,
    Cancelled,
}

impl FlowState {
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            FlowState::Confirmed => Some(Outcome::Confirmed),
            FlowState::Rejected => Some(Outcome::Rejected),
            FlowState::Cancelled => Some(Outcome::Cancelled),
            _ => None,
        }
    }
}

pub struct FlowController<'a> {
    flow: &'a ReviewFlow,
    chars_per_page: usize,
    state: FlowState,
}

impl<'a> FlowController<'a> {
    pub fn new(flow: &'a ReviewFlow, chars_per_page: usize) -> Self {
        Self {
            flow,
            chars_per_page,
            state: FlowState::Idle,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// The page to draw, if the flow is in [`FlowState::Rendering`]
    pub fn page(&self) -> Option<Page<'a>> {
        let FlowState::Rendering { screen, page } = self.state else {
            return None;
        };
        let flow: &'a ReviewFlow = self.flow;
        let review = flow.screens().get(screen)?;
        Some(Page {
            screen: review,
            index: page,
            count: review.page_count(self.chars_per_page),
            text: review.page_text(page, self.chars_per_page),
        })
    }

    pub fn start(&mut self) {
        if self.state == FlowState::Idle {
            self.state = if self.flow.is_empty() {
                FlowState::Cancelled
            } else {
                FlowState::Rendering { screen: 0, page: 0 }
            };
        }
    }

    /// The current page has been drawn
    pub fn rendered(&mut self) {
        if let FlowState::Rendering { screen, page } = self.state {
            self.state = FlowState::AwaitingInput { screen, page };
        }
    }

    /// Apply an event, ignored unless the flow is awaiting input
    pub fn handle(&mut self, event: UiEvent) {
        let FlowState::AwaitingInput { screen, page } = self.state else {
            return;
        };
        let Some(current) = self.flow.screens().get(screen) else {
            self.state = FlowState::Cancelled;
            return;
        };
        self.state = match event {
            UiEvent::Cancel => FlowState::Cancelled,
            UiEvent::Input(Input::Reject) => FlowState::Rejected,
            UiEvent::Input(Input::Accept) if current.is_confirm() => FlowState::Confirmed,
            UiEvent::Input(Input::Accept) => self.state,
            UiEvent::Input(Input::Next | Input::Page) if current.is_confirm() => self.state,
            UiEvent::Input(Input::Next | Input::Page) => {
                if page + 1 < current.page_count(self.chars_per_page) {
                    FlowState::Rendering {
                        screen,
                        page: page + 1,
                    }
                } else {
                    FlowState::Rendering {
                        screen: screen + 1,
                        page: 0,
                    }
                }
            }
        };
        tracing::trace!("{event:?} -> {:?}", self.state);
    }

    /// Show the flow on `screen` and block until it reaches a final state.
    ///
    /// The screen is released on every outcome.
    pub fn run<S: Screen + ?Sized>(mut self, screen: &mut S) -> Outcome {
        let mut guard = ScreenGuard::acquire(screen);
        self.start();
        loop {
            if let Some(outcome) = self.state.outcome() {
                tracing::info!("review ended: {outcome:?}");
                return outcome;
            }
            match self.page() {
                Some(page) => {
                    guard.render(&page);
                    self.rendered();
                }
                None => {
                    let event = guard.next_event();
                    self.handle(event);
                }
            }
        }
    }
}
