//! Commands understood by the application, their APDU encoding and their answers.

use std::fmt;

use kda_common::{DerivationPath, PathError, PublicKey};
use serde::Serialize;

use crate::apdu::{self, APDUCmdVec, Ins, StatusWord};
use crate::consts::CLA;
use crate::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Return the key at a path without any user interaction
    GetPublicKey,

    /// Return the key at a path once the user approved its address on screen
    VerifyAddress,

    /// Return the application version
    GetVersion,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandKind::GetPublicKey => "get_public_key",
            CommandKind::VerifyAddress => "verify_address",
            CommandKind::GetVersion => "get_version",
        };
        write!(f, "{s}")
    }
}

impl From<Ins> for CommandKind {
    fn from(ins: Ins) -> Self {
        match ins {
            Ins::GetPublicKey => CommandKind::GetPublicKey,
            Ins::VerifyAddress => CommandKind::VerifyAddress,
            Ins::GetVersion => CommandKind::GetVersion,
        }
    }
}

impl From<CommandKind> for Ins {
    fn from(kind: CommandKind) -> Self {
        match kind {
            CommandKind::GetPublicKey => Ins::GetPublicKey,
            CommandKind::VerifyAddress => Ins::VerifyAddress,
            CommandKind::GetVersion => Ins::GetVersion,
        }
    }
}

/// A command received from the host, the path is kept in its textual form until dispatched
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandRequest {
    pub kind: CommandKind,
    pub path: String,
}

impl CommandRequest {
    pub fn get_public_key(path: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::GetPublicKey,
            path: path.into(),
        }
    }

    pub fn verify_address(path: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::VerifyAddress,
            path: path.into(),
        }
    }

    pub fn get_version() -> Self {
        Self {
            kind: CommandKind::GetVersion,
            path: String::new(),
        }
    }

    pub fn derivation_path(&self) -> Result<DerivationPath, PathError> {
        self.path.parse()
    }

    /// Decode a command from an APDU, the binary path is turned into its textual form
    pub fn from_apdu(command: &APDUCmdVec) -> Result<Self, Error> {
        if command.cla != CLA {
            return Err(Error::InvalidApdu(StatusWord::ClaNotSupported));
        }
        let ins =
            Ins::try_from(command.ins).map_err(|_| Error::InvalidApdu(StatusWord::InsNotSupported))?;
        if command.p1 != 0 || command.p2 != 0 {
            return Err(Error::InvalidApdu(StatusWord::WrongP1P2));
        }
        match ins {
            Ins::GetVersion => Ok(Self::get_version()),
            Ins::GetPublicKey | Ins::VerifyAddress => {
                let path = DerivationPath::from_wire(&command.data)?;
                Ok(Self {
                    kind: ins.into(),
                    path: path.to_string(),
                })
            }
        }
    }

    /// Encode the command for the device
    pub fn to_apdu(&self) -> Result<APDUCmdVec, Error> {
        match self.kind {
            CommandKind::GetVersion => Ok(apdu::apdu_empty(Ins::GetVersion)),
            kind => {
                let data = self.derivation_path()?.to_wire()?;
                Ok(apdu::apdu(kind.into(), data))
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    UserRejected,
    Cancelled,
    MalformedPath,
    InternalError,
}

impl From<Status> for StatusWord {
    fn from(status: Status) -> Self {
        match status {
            Status::Ok => StatusWord::OK,
            Status::UserRejected => StatusWord::Deny,
            Status::Cancelled => StatusWord::Cancelled,
            Status::MalformedPath => StatusWord::IncorrectData,
            Status::InternalError => StatusWord::InternalError,
        }
    }
}

impl TryFrom<StatusWord> for Status {
    type Error = StatusWord;

    fn try_from(sw: StatusWord) -> Result<Self, Self::Error> {
        match sw {
            StatusWord::OK => Ok(Status::Ok),
            StatusWord::Deny => Ok(Status::UserRejected),
            StatusWord::Cancelled => Ok(Status::Cancelled),
            StatusWord::IncorrectData => Ok(Status::MalformedPath),
            StatusWord::InternalError => Ok(Status::InternalError),
            sw => Err(sw),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl Version {
    /// The version of this application
    pub fn current() -> Self {
        Self {
            major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            patch: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    PublicKey(PublicKey),
    Version(Version),
}

/// The answer to a [`CommandRequest`]: a payload only when the status is [`Status::Ok`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CommandResponse {
    pub status: Status,
    pub payload: Option<Payload>,
}

impl CommandResponse {
    pub fn ok(payload: Payload) -> Self {
        Self {
            status: Status::Ok,
            payload: Some(payload),
        }
    }

    pub fn error(status: Status) -> Self {
        Self {
            status,
            payload: None,
        }
    }

    pub fn public_key(&self) -> Option<PublicKey> {
        match self.payload {
            Some(Payload::PublicKey(public_key)) => Some(public_key),
            _ => None,
        }
    }

    pub fn version(&self) -> Option<Version> {
        match self.payload {
            Some(Payload::Version(version)) => Some(version),
            _ => None,
        }
    }

    /// Answer bytes: `[32][key]` or `[major][minor][patch]` followed by the status word
    pub fn to_answer(&self) -> Vec<u8> {
        let data = match self.payload {
            Some(Payload::PublicKey(public_key)) => {
                let mut data = vec![PublicKey::LEN as u8];
                data.extend_from_slice(public_key.as_bytes());
                data
            }
            Some(Payload::Version(v)) => vec![v.major, v.minor, v.patch],
            None => vec![],
        };
        apdu::answer(&data, self.status.into())
    }

    /// Decode the answer data of `kind` as received by the host
    pub fn from_answer(kind: CommandKind, sw: StatusWord, data: &[u8]) -> Result<Self, Error> {
        let status = Status::try_from(sw).map_err(Error::Device)?;
        if status != Status::Ok {
            return Ok(Self::error(status));
        }
        let payload = match kind {
            CommandKind::GetVersion => match data {
                [major, minor, patch] => Payload::Version(Version {
                    major: *major,
                    minor: *minor,
                    patch: *patch,
                }),
                _ => return Err(Error::InvalidAnswer(format!("version {data:?}"))),
            },
            CommandKind::GetPublicKey | CommandKind::VerifyAddress => match data.split_first() {
                Some((&len, key)) if len as usize == PublicKey::LEN => {
                    let key = PublicKey::from_slice(key)
                        .map_err(|e| Error::InvalidAnswer(e.to_string()))?;
                    Payload::PublicKey(key)
                }
                _ => return Err(Error::InvalidAnswer(format!("public key {data:?}"))),
            },
        };
        Ok(Self::ok(payload))
    }
}
