use kda_common::{Deriver, KeyPair};

use crate::apdu;
use crate::command::{CommandKind, CommandRequest, CommandResponse, Payload, Version};
use crate::flow::{FlowController, Outcome};
use crate::review::ReviewFlow;
use crate::screen::Screen;
use crate::{Config, Error};

/// Routes host commands to the key derivation engine and, when required, to the user.
///
/// Commands are processed one at a time: a review blocks until the user decides.
#[derive(Debug)]
pub struct Dispatcher<D: Deriver> {
    deriver: D,
    config: Config,
}

impl<D: Deriver> Dispatcher<D> {
    pub fn new(deriver: D, config: Config) -> Self {
        Self { deriver, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute `request`, using `screen` for the commands needing the user approval
    pub fn handle<S: Screen + ?Sized>(
        &self,
        request: &CommandRequest,
        screen: &mut S,
    ) -> CommandResponse {
        tracing::info!("handling {} {:?}", request.kind, request.path);
        match self.execute(request, screen) {
            Ok(payload) => CommandResponse::ok(payload),
            Err(e) => {
                tracing::warn!("{} failed: {e}", request.kind);
                CommandResponse::error(e.status())
            }
        }
    }

    /// Decode a raw APDU, execute it and return the answer bytes ending with the status word
    pub fn process_apdu<S: Screen + ?Sized>(&self, raw: &[u8], screen: &mut S) -> Vec<u8> {
        let request = apdu::parse(raw)
            .map_err(Error::InvalidApdu)
            .and_then(|command| CommandRequest::from_apdu(&command));
        match request {
            Ok(request) => self.handle(&request, screen).to_answer(),
            Err(Error::InvalidApdu(sw)) => {
                tracing::warn!("invalid apdu {raw:02x?}: {sw:?}");
                apdu::answer(&[], sw)
            }
            Err(e) => {
                tracing::warn!("cannot decode apdu: {e}");
                CommandResponse::error(e.status()).to_answer()
            }
        }
    }

    fn execute<S: Screen + ?Sized>(
        &self,
        request: &CommandRequest,
        screen: &mut S,
    ) -> Result<Payload, Error> {
        match request.kind {
            CommandKind::GetVersion => Ok(Payload::Version(Version::current())),
            CommandKind::GetPublicKey => {
                let pair = self.derive(request)?;
                Ok(Payload::PublicKey(pair.public_key()))
            }
            CommandKind::VerifyAddress => {
                let pair = self.derive(request)?;
                let flow = ReviewFlow::verify_address(&pair.address(), self.config.confirm_position);
                let controller = FlowController::new(&flow, self.config.chars_per_page.get());
                match controller.run(screen) {
                    Outcome::Confirmed => Ok(Payload::PublicKey(pair.public_key())),
                    Outcome::Rejected => Err(Error::UserRejected),
                    Outcome::Cancelled => Err(Error::Cancelled),
                }
            }
        }
    }

    fn derive(&self, request: &CommandRequest) -> Result<KeyPair, Error> {
        let path = request.derivation_path()?;
        self.deriver
            .derive(&path)
            .map_err(|e| Error::Derivation(e.to_string()))
    }
}
