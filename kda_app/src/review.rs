//! What the user is shown before a key leaves the device.

use kda_common::Address;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::consts::{ADDRESS_HEADER, CONFIRM_TEXT, PROVIDE_PUBLIC_KEY_HEADER};
use crate::Error;

/// Coordinates of a control on the display
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

/// A single step of a review flow
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReviewScreen {
    /// Shows a header and a text, the text is split in pages when `paginate` is set
    Prompt {
        header: String,
        prompt: String,
        paginate: bool,
    },

    /// The only screen where the user can approve
    Confirm { text: String, position: Position },
}

impl ReviewScreen {
    pub fn prompt(header: impl Into<String>, prompt: impl Into<String>) -> Self {
        ReviewScreen::Prompt {
            header: header.into(),
            prompt: prompt.into(),
            paginate: false,
        }
    }

    pub fn paginated(header: impl Into<String>, prompt: impl Into<String>) -> Self {
        ReviewScreen::Prompt {
            header: header.into(),
            prompt: prompt.into(),
            paginate: true,
        }
    }

    pub fn confirm(text: impl Into<String>, position: Position) -> Self {
        ReviewScreen::Confirm {
            text: text.into(),
            position,
        }
    }

    pub fn is_confirm(&self) -> bool {
        matches!(self, ReviewScreen::Confirm { .. })
    }

    /// Number of pages needed to show this screen, at least 1
    pub fn page_count(&self, chars_per_page: usize) -> usize {
        match self {
            ReviewScreen::Prompt {
                prompt,
                paginate: true,
                ..
            } if chars_per_page > 0 => prompt.chars().count().div_ceil(chars_per_page).max(1),
            _ => 1,
        }
    }

    /// The text shown on the given page, the whole text if the screen is not paginated
    pub fn page_text(&self, page: usize, chars_per_page: usize) -> &str {
        match self {
            ReviewScreen::Prompt {
                prompt,
                paginate: true,
                ..
            } if chars_per_page > 0 => {
                let mut bounds = prompt
                    .char_indices()
                    .map(|(i, _)| i)
                    .chain(std::iter::once(prompt.len()))
                    .skip(page * chars_per_page)
                    .step_by(chars_per_page);
                match (bounds.next(), bounds.next()) {
                    (Some(start), Some(end)) => &prompt[start..end],
                    (Some(start), None) => &prompt[start..],
                    _ => "",
                }
            }
            ReviewScreen::Prompt { prompt, .. } => prompt,
            ReviewScreen::Confirm { text, .. } => text,
        }
    }
}

impl Zeroize for ReviewScreen {
    fn zeroize(&mut self) {
        match self {
            ReviewScreen::Prompt { header, prompt, .. } => {
                header.zeroize();
                prompt.zeroize();
            }
            ReviewScreen::Confirm { text, .. } => text.zeroize(),
        }
    }
}

/// An ordered sequence of screens ending with exactly one [`ReviewScreen::Confirm`].
///
/// Screens are wiped when the flow is dropped.
#[derive(Debug, PartialEq, Eq)]
pub struct ReviewFlow {
    screens: Vec<ReviewScreen>,
}

impl ReviewFlow {
    pub fn new(screens: Vec<ReviewScreen>) -> Result<Self, Error> {
        let confirms = screens.iter().filter(|s| s.is_confirm()).count();
        match screens.last() {
            Some(last) if last.is_confirm() && confirms == 1 => Ok(Self { screens }),
            _ => Err(Error::InvalidReviewFlow),
        }
    }

    /// The flow shown before revealing the key behind `address`
    pub fn verify_address(address: &Address, confirm_position: Position) -> Self {
        Self {
            screens: vec![
                ReviewScreen::prompt(PROVIDE_PUBLIC_KEY_HEADER, ""),
                ReviewScreen::paginated(ADDRESS_HEADER, address.as_str()),
                ReviewScreen::confirm(CONFIRM_TEXT, confirm_position),
            ],
        }
    }

    pub fn screens(&self) -> &[ReviewScreen] {
        &self.screens
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }
}

impl Drop for ReviewFlow {
    fn drop(&mut self) {
        self.screens.iter_mut().for_each(Zeroize::zeroize);
    }
}
