use std::time::Duration;

use crate::review::Position;

/// Instruction class of every command of the application
pub const CLA: u8 = 0x00;

pub const PROVIDE_PUBLIC_KEY_HEADER: &str = "Provide Public Key";
pub const ADDRESS_HEADER: &str = "Address";
pub const CONFIRM_TEXT: &str = "Confirm";

/// Where the confirm control sits on the review screen
pub const CONFIRM_POSITION: Position = Position { x: 43, y: 11 };

/// Characters of prompt text that fit one page of the display
pub const CHARS_PER_PAGE: usize = 16;

/// Same port speculos uses for its APDU socket
pub const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 9999);

/// How often the emulator checks whether it has been asked to stop
pub const ACCEPT_INTERVAL: Duration = Duration::from_millis(100);
