use std::io::{BufRead, Write};

use kda_app::{EventLog, Input, Page, ReviewScreen, Screen, UiEvent};

const HELP: &str = "[n]ext, [p]age, [a]ccept, [r]eject";

/// Review screens on a terminal, the user answers one line per input.
///
/// End of input cancels the review.
pub struct ConsoleScreen<R, W> {
    input: R,
    output: W,
    log: EventLog,
}

impl<R: BufRead, W: Write> ConsoleScreen<R, W> {
    pub fn new(input: R, output: W, log: EventLog) -> Self {
        Self { input, output, log }
    }

    fn show(&mut self, page: &Page<'_>) -> std::io::Result<()> {
        match page.screen {
            ReviewScreen::Prompt { header, .. } if page.count > 1 => writeln!(
                self.output,
                "{header} ({}/{}): {}",
                page.index + 1,
                page.count,
                page.text
            )?,
            ReviewScreen::Prompt { header, .. } => {
                writeln!(self.output, "{header}: {}", page.text)?
            }
            ReviewScreen::Confirm { text, .. } => writeln!(self.output, "<{text}>")?,
        }
        writeln!(self.output, "{HELP}")?;
        self.output.flush()
    }
}

fn parse_input(line: &str) -> Option<Input> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "n" | "next" => Some(Input::Next),
        "p" | "page" => Some(Input::Page),
        "a" | "accept" => Some(Input::Accept),
        "r" | "reject" => Some(Input::Reject),
        _ => None,
    }
}

impl<R: BufRead, W: Write> Screen for ConsoleScreen<R, W> {
    fn render(&mut self, page: &Page<'_>) {
        if page.is_first() {
            self.log.record(page.screen);
        }
        if let Err(e) = self.show(page) {
            tracing::warn!("cannot write to the console: {e}");
        }
    }

    fn next_event(&mut self) -> UiEvent {
        loop {
            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) | Err(_) => return UiEvent::Cancel,
                Ok(_) => match parse_input(&line) {
                    Some(input) => return input.into(),
                    None => {
                        let _ = writeln!(self.output, "unknown input {:?}, {HELP}", line.trim());
                    }
                },
            }
        }
    }

    fn release(&mut self) {
        let _ = self.output.flush();
    }
}
