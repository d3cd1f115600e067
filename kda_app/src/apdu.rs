use core::convert::TryFrom;

use ledger_apdu::APDUCommand;

use crate::consts::CLA;

pub type APDUCmdVec = APDUCommand<Vec<u8>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Ins {
    GetVersion = 0x00,
    VerifyAddress = 0x01,
    GetPublicKey = 0x02,
}

impl TryFrom<u8> for Ins {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Ins::GetVersion),
            0x01 => Ok(Ins::VerifyAddress),
            0x02 => Ok(Ins::GetPublicKey),
            _ => Err(()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum StatusWord {
    /// Rejected by user
    Deny = 0x6985,
    /// Incorrect Data
    IncorrectData = 0x6A80,
    /// Wrong P1P2
    WrongP1P2 = 0x6A86,
    /// Wrong DataLength
    WrongDataLength = 0x6A87,
    /// Ins not supported
    InsNotSupported = 0x6D00,
    /// Cla not supported
    ClaNotSupported = 0x6E00,
    /// Review aborted by the host or the device
    Cancelled = 0x6401,
    /// Unexpected failure while processing the command
    InternalError = 0x6F00,
    /// Success
    OK = 0x9000,
    /// Unknown
    Unknown,
}

impl TryFrom<u16> for StatusWord {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x6985 => Ok(StatusWord::Deny),
            0x6A80 => Ok(StatusWord::IncorrectData),
            0x6A86 => Ok(StatusWord::WrongP1P2),
            0x6A87 => Ok(StatusWord::WrongDataLength),
            0x6D00 => Ok(StatusWord::InsNotSupported),
            0x6E00 => Ok(StatusWord::ClaNotSupported),
            0x6401 => Ok(StatusWord::Cancelled),
            0x6F00 => Ok(StatusWord::InternalError),
            0x9000 => Ok(StatusWord::OK),
            _ => Err(()),
        }
    }
}

impl StatusWord {
    pub fn to_be_bytes(self) -> [u8; 2] {
        // `Unknown` is never sent by the device
        let code = match self {
            StatusWord::Unknown => StatusWord::InternalError as u16,
            sw => sw as u16,
        };
        code.to_be_bytes()
    }
}

/// Split a raw frame `CLA INS P1 P2 [Lc data]` into its fields.
///
/// A 4 bytes frame is a command without data, otherwise `Lc` must match the data length.
pub fn parse(raw: &[u8]) -> Result<APDUCmdVec, StatusWord> {
    let data = match raw.len() {
        0..=3 => return Err(StatusWord::WrongDataLength),
        4 => Vec::new(),
        _ => {
            let lc = raw[4] as usize;
            let data = &raw[5..];
            if data.len() != lc {
                return Err(StatusWord::WrongDataLength);
            }
            data.to_vec()
        }
    };
    Ok(APDUCmdVec {
        cla: raw[0],
        ins: raw[1],
        p1: raw[2],
        p2: raw[3],
        data,
    })
}

/// Concatenate the answer data and the status word, as sent back to the host
pub fn answer(data: &[u8], status: StatusWord) -> Vec<u8> {
    let mut answer = Vec::with_capacity(data.len() + 2);
    answer.extend_from_slice(data);
    answer.extend_from_slice(&status.to_be_bytes());
    answer
}

pub fn apdu(ins: Ins, data: Vec<u8>) -> APDUCmdVec {
    APDUCmdVec {
        cla: CLA,
        ins: ins as u8,
        p1: 0x00,
        p2: 0x00,
        data,
    }
}

pub fn apdu_empty(ins: Ins) -> APDUCmdVec {
    apdu(ins, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_frames() {
        let cmd = parse(&[0x00, 0x02, 0x00, 0x00, 0x02, 0xaa, 0xbb]).unwrap();
        assert_eq!(cmd.cla, 0x00);
        assert_eq!(cmd.ins, Ins::GetPublicKey as u8);
        assert_eq!(cmd.data, vec![0xaa, 0xbb]);

        let cmd = parse(&[0x00, 0x00, 0x00, 0x00]).unwrap();
        assert!(cmd.data.is_empty());

        assert_eq!(parse(&[0x00, 0x02]).err(), Some(StatusWord::WrongDataLength));
        assert_eq!(
            parse(&[0x00, 0x02, 0x00, 0x00, 0x03, 0xaa]).err(),
            Some(StatusWord::WrongDataLength)
        );
    }

    #[test]
    fn serialize_round_trip() {
        let cmd = apdu(Ins::VerifyAddress, vec![1, 2, 3]);
        let raw = cmd.serialize();
        assert_eq!(raw, vec![0x00, 0x01, 0x00, 0x00, 0x03, 1, 2, 3]);
        let parsed = parse(&raw).unwrap();
        assert_eq!(parsed.ins, cmd.ins);
        assert_eq!(parsed.data, cmd.data);
    }

    #[test]
    fn status_words() {
        assert_eq!(answer(&[7], StatusWord::OK), vec![7, 0x90, 0x00]);
        assert_eq!(StatusWord::try_from(0x6985), Ok(StatusWord::Deny));
        assert_eq!(StatusWord::try_from(0x1234), Err(()));
        assert_eq!(StatusWord::Unknown.to_be_bytes(), [0x6F, 0x00]);
        assert_eq!(Ins::try_from(0x02), Ok(Ins::GetPublicKey));
        assert_eq!(Ins::try_from(0x03), Err(()));
    }
}
