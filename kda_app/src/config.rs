use std::net::SocketAddr;
use std::num::NonZeroUsize;

use crate::consts::{CHARS_PER_PAGE, CONFIRM_POSITION, DEFAULT_ADDR};
use crate::review::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where the emulator listens for APDUs.
    pub addr: SocketAddr,
    /// Characters of a paginated prompt shown on each page.
    pub chars_per_page: NonZeroUsize,
    /// Placement of the confirm control.
    pub confirm_position: Position,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::default().build()
    }
}

pub struct ConfigBuilder {
    addr: SocketAddr,
    chars_per_page: NonZeroUsize,
    confirm_position: Position,
}

impl ConfigBuilder {
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_chars_per_page(mut self, chars: NonZeroUsize) -> Self {
        self.chars_per_page = chars;
        self
    }

    pub fn with_confirm_position(mut self, position: Position) -> Self {
        self.confirm_position = position;
        self
    }

    pub fn build(self) -> Config {
        Config {
            addr: self.addr,
            chars_per_page: self.chars_per_page,
            confirm_position: self.confirm_position,
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.into(),
            chars_per_page: NonZeroUsize::new(CHARS_PER_PAGE).expect("non-zero"),
            confirm_position: CONFIRM_POSITION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let config = Config::default();
        assert_eq!(config.addr.to_string(), "127.0.0.1:9999");
        assert_eq!(config.chars_per_page.get(), 16);
        assert_eq!(config.confirm_position, Position { x: 43, y: 11 });

        let config = Config::builder()
            .with_addr("127.0.0.1:40000".parse().unwrap())
            .with_chars_per_page(NonZeroUsize::new(20).unwrap())
            .with_confirm_position(Position { x: 1, y: 2 })
            .build();
        assert_eq!(config.addr.port(), 40000);
        assert_eq!(config.chars_per_page.get(), 20);
        assert_eq!(config.confirm_position, Position { x: 1, y: 2 });
    }
}
