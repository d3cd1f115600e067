#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! The command processor of the Kadena device application.
//!
//! The host sends commands, as APDUs or [`CommandRequest`]s, to a [`Dispatcher`] which derives
//! keys with a [`kda_common::Deriver`] and, for [`CommandKind::VerifyAddress`], shows the address
//! on a [`Screen`] releasing the key only when the user confirms.
//!
//! ```
//! use kda_app::{AutomatedScreen, Automation, CommandRequest, Config, Dispatcher, EventLog, Status};
//! # use kda_common::{DerivationPath, Deriver, KeyPair, PublicKey};
//! # struct Zero;
//! # impl Deriver for Zero {
//! #     type Error = std::convert::Infallible;
//! #     fn derive(&self, _: &DerivationPath) -> Result<KeyPair, Self::Error> {
//! #         Ok(KeyPair::new([0; 32], PublicKey::from_bytes([1; 32])))
//! #     }
//! # }
//!
//! let dispatcher = Dispatcher::new(Zero, Config::default());
//! let mut screen = AutomatedScreen::new(Automation::AcceptAll, EventLog::default());
//! let response = dispatcher.handle(&CommandRequest::verify_address("44'/626'/0"), &mut screen);
//! assert_eq!(response.status, Status::Ok);
//! assert_eq!(screen.log().len(), 3);
//! ```

pub mod apdu;
mod automation;
mod command;
mod config;
pub mod consts;
mod dispatcher;
mod error;
pub mod flow;
mod review;
mod screen;
pub mod transport_tcp;

pub use crate::automation::{AutomatedScreen, Automation, EventLog, ScreenEvent};
pub use crate::command::{
    CommandKind, CommandRequest, CommandResponse, Payload, Status, Version,
};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::dispatcher::Dispatcher;
pub use crate::error::Error;
pub use crate::flow::{FlowController, FlowState, Outcome};
pub use crate::review::{Position, ReviewFlow, ReviewScreen};
pub use crate::screen::{ChannelScreen, Input, Page, Screen, ScreenGuard, UiEvent, UiHandle};
pub use crate::transport_tcp::{Emulator, TransportTcp};

pub type Result<T> = std::result::Result<T, Error>;
