//! The display and buttons a review flow is driven through.

use std::ops::{Deref, DerefMut};
use std::sync::mpsc::{self, Receiver, Sender};

use crate::automation::EventLog;
use crate::review::ReviewScreen;

/// A user action on the device
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Next,
    Page,
    Accept,
    Reject,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    Input(Input),

    /// The host or the device aborted the review
    Cancel,
}

impl From<Input> for UiEvent {
    fn from(input: Input) -> Self {
        UiEvent::Input(input)
    }
}

/// One page of a [`ReviewScreen`] as it must appear on the display
#[derive(Clone, Copy, Debug)]
pub struct Page<'a> {
    pub screen: &'a ReviewScreen,

    /// 0-based
    pub index: usize,

    pub count: usize,

    pub text: &'a str,
}

impl Page<'_> {
    pub fn is_first(&self) -> bool {
        self.index == 0
    }
}

/// A display able to show review screens and to report what the user does.
pub trait Screen {
    fn render(&mut self, page: &Page<'_>);

    /// Blocks until the user acts or the review is aborted
    fn next_event(&mut self) -> UiEvent;

    /// Called once the flow is over, whatever its outcome
    fn release(&mut self) {}
}

impl<S: Screen + ?Sized> Screen for &mut S {
    fn render(&mut self, page: &Page<'_>) {
        (**self).render(page)
    }

    fn next_event(&mut self) -> UiEvent {
        (**self).next_event()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

impl<S: Screen + ?Sized> Screen for Box<S> {
    fn render(&mut self, page: &Page<'_>) {
        (**self).render(page)
    }

    fn next_event(&mut self) -> UiEvent {
        (**self).next_event()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Exclusive access to a [`Screen`] for the duration of a flow, released when dropped
pub struct ScreenGuard<'a, S: Screen + ?Sized> {
    screen: &'a mut S,
}

impl<'a, S: Screen + ?Sized> ScreenGuard<'a, S> {
    pub fn acquire(screen: &'a mut S) -> Self {
        tracing::trace!("display acquired");
        Self { screen }
    }
}

impl<S: Screen + ?Sized> Deref for ScreenGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &Self::Target {
        self.screen
    }
}

impl<S: Screen + ?Sized> DerefMut for ScreenGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.screen
    }
}

impl<S: Screen + ?Sized> Drop for ScreenGuard<'_, S> {
    fn drop(&mut self) {
        self.screen.release();
        tracing::trace!("display released");
    }
}

/// A screen fed by another thread through a [`UiHandle`].
///
/// Rendered screens are recorded in an [`EventLog`]. Dropping every handle cancels a pending
/// review.
#[derive(Debug)]
pub struct ChannelScreen {
    events: Receiver<UiEvent>,
    log: EventLog,
}

/// The buttons of a [`ChannelScreen`]
#[derive(Clone, Debug)]
pub struct UiHandle {
    sender: Sender<UiEvent>,
}

impl ChannelScreen {
    pub fn new(log: EventLog) -> (Self, UiHandle) {
        let (sender, events) = mpsc::channel();
        (Self { events, log }, UiHandle { sender })
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }
}

impl Screen for ChannelScreen {
    fn render(&mut self, page: &Page<'_>) {
        if page.is_first() {
            self.log.record(page.screen);
        }
    }

    fn next_event(&mut self) -> UiEvent {
        self.events.recv().unwrap_or(UiEvent::Cancel)
    }

    fn release(&mut self) {
        // leftover presses must not leak into the next review
        while self.events.try_recv().is_ok() {}
    }
}

impl UiHandle {
    /// Returns false if the screen is gone
    pub fn press(&self, input: Input) -> bool {
        self.sender.send(input.into()).is_ok()
    }

    pub fn cancel(&self) -> bool {
        self.sender.send(UiEvent::Cancel).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::ReviewScreen;

    #[derive(Default)]
    struct CountingScreen {
        released: usize,
    }

    impl Screen for CountingScreen {
        fn render(&mut self, _page: &Page<'_>) {}

        fn next_event(&mut self) -> UiEvent {
            UiEvent::Cancel
        }

        fn release(&mut self) {
            self.released += 1;
        }
    }

    #[test]
    fn guard_releases_once() {
        let mut screen = CountingScreen::default();
        {
            let mut guard = ScreenGuard::acquire(&mut screen);
            assert_eq!(guard.next_event(), UiEvent::Cancel);
        }
        assert_eq!(screen.released, 1);
    }

    #[test]
    fn channel_screen() {
        let (mut screen, handle) = ChannelScreen::new(EventLog::default());
        let prompt = ReviewScreen::paginated("Address", "k:00");
        for index in 0..2 {
            screen.render(&Page {
                screen: &prompt,
                index,
                count: 2,
                text: "",
            });
        }
        assert_eq!(screen.log().len(), 1);

        assert!(handle.press(Input::Next));
        assert!(handle.cancel());
        assert_eq!(screen.next_event(), UiEvent::Input(Input::Next));
        assert_eq!(screen.next_event(), UiEvent::Cancel);

        assert!(handle.press(Input::Accept));
        screen.release();
        drop(handle);
        assert_eq!(screen.next_event(), UiEvent::Cancel);
    }
}
