//! APDU exchange over TCP using the speculos framing.
//!
//! A command is sent as a 4 bytes big endian length followed by the APDU. The answer is a 4 bytes
//! big endian length of the data, the data, then the 2 bytes status word.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use kda_common::Deriver;
use ledger_apdu::APDUAnswer;

use crate::apdu::{APDUCmdVec, StatusWord};
use crate::command::{CommandRequest, CommandResponse};
use crate::consts::ACCEPT_INTERVAL;
use crate::screen::Screen;
use crate::{Dispatcher, Error};

/// Largest frame accepted, an APDU is at most 5 + 255 bytes
const MAX_FRAME: usize = 260;

/// Transport to communicate with a device listening on TCP, such as [`Emulator`] or speculos.
#[derive(Debug)]
pub struct TransportTcp {
    connection: Mutex<TcpStream>,
}

impl TransportTcp {
    pub fn connect(addr: SocketAddr) -> Result<Self, Error> {
        let stream = TcpStream::connect(addr)?;
        Ok(Self {
            connection: Mutex::new(stream),
        })
    }

    pub fn exchange(&self, command: &APDUCmdVec) -> Result<(StatusWord, Vec<u8>), Error> {
        let mut stream = self.connection.lock()?;
        let command_bytes = command.serialize();

        let mut req = vec![0u8; command_bytes.len() + 4];
        req[..4].copy_from_slice(&(command_bytes.len() as u32).to_be_bytes());
        req[4..].copy_from_slice(&command_bytes);
        stream.write_all(&req)?;

        let mut buff = [0u8; 4];
        stream.read_exact(&mut buff)?;
        let len = u32::from_be_bytes(buff);

        let mut resp = vec![0u8; len as usize + 2];
        stream.read_exact(&mut resp)?;
        let answer = APDUAnswer::from_answer(resp)
            .map_err(|_| Error::InvalidAnswer("missing status word".to_string()))?;
        Ok((
            StatusWord::try_from(answer.retcode()).unwrap_or(StatusWord::Unknown),
            answer.data().to_vec(),
        ))
    }

    /// Send `request` and decode its answer
    pub fn send(&self, request: &CommandRequest) -> Result<CommandResponse, Error> {
        let (sw, data) = self.exchange(&request.to_apdu()?)?;
        CommandResponse::from_answer(request.kind, sw, &data)
    }
}

/// A device listening for APDUs on TCP, answering through a [`Dispatcher`].
///
/// Connections are served one at a time, as a device talks to a single host.
pub struct Emulator<D: Deriver, S: Screen> {
    dispatcher: Dispatcher<D>,
    screen: S,
    listener: TcpListener,
}

impl<D: Deriver, S: Screen> Emulator<D, S> {
    /// Listen on the address of the dispatcher configuration
    pub fn bind(dispatcher: Dispatcher<D>, screen: S) -> Result<Self, Error> {
        let listener = TcpListener::bind(dispatcher.config().addr)?;
        tracing::info!("emulator listening on {}", listener.local_addr()?);
        Ok(Self {
            dispatcher,
            screen,
            listener,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    /// Accept a single connection and serve it until the host disconnects
    pub fn serve_one(&mut self) -> Result<(), Error> {
        let (stream, peer) = self.listener.accept()?;
        self.serve_connection(stream, peer, &AtomicBool::new(true))
    }

    /// Serve connections until `running` is cleared, also while a host is connected
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), Error> {
        self.listener.set_nonblocking(true)?;
        while running.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    stream.set_nonblocking(false)?;
                    if let Err(e) = self.serve_connection(stream, peer, running) {
                        tracing::warn!("connection with {peer} ended: {e}");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_INTERVAL)
                }
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!("emulator stopped");
        Ok(())
    }

    fn serve_connection(
        &mut self,
        mut stream: TcpStream,
        peer: SocketAddr,
        running: &AtomicBool,
    ) -> Result<(), Error> {
        tracing::info!("host {peer} connected");
        while wait_readable(&stream, running)? {
            let Some(apdu) = read_frame(&mut stream)? else {
                break;
            };
            tracing::debug!("<= {apdu:02x?}");
            let answer = self.dispatcher.process_apdu(&apdu, &mut self.screen);
            tracing::debug!("=> {answer:02x?}");
            write_answer(&mut stream, &answer)?;
        }
        tracing::info!("host {peer} disconnected");
        Ok(())
    }
}

/// Block until the host sent something or closed the connection.
///
/// Returns `false` when the host closed the connection or `running` has been cleared in the
/// meantime. The stream is left without read timeout so that a frame is then read whole.
fn wait_readable(stream: &TcpStream, running: &AtomicBool) -> Result<bool, Error> {
    let mut byte = [0u8; 1];
    stream.set_read_timeout(Some(ACCEPT_INTERVAL))?;
    let readable = loop {
        if !running.load(Ordering::Relaxed) {
            break false;
        }
        match stream.peek(&mut byte) {
            Ok(n) => break n > 0,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) => {}
            Err(e) => return Err(e.into()),
        }
    };
    stream.set_read_timeout(None)?;
    Ok(readable)
}

/// Read a length prefixed frame, `None` when the peer closed the connection
fn read_frame(stream: &mut impl Read) -> Result<Option<Vec<u8>>, Error> {
    let mut buff = [0u8; 4];
    match stream.read_exact(&mut buff) {
        Ok(()) => (),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(buff) as usize;
    if len > MAX_FRAME {
        return Err(Error::IoError(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {len} bytes"),
        )));
    }
    let mut frame = vec![0u8; len];
    stream.read_exact(&mut frame)?;
    Ok(Some(frame))
}

/// `answer` holds the data followed by the status word
fn write_answer(stream: &mut impl Write, answer: &[u8]) -> Result<(), Error> {
    let data_len = answer.len().saturating_sub(2) as u32;
    let mut resp = Vec::with_capacity(answer.len() + 4);
    resp.extend_from_slice(&data_len.to_be_bytes());
    resp.extend_from_slice(answer);
    stream.write_all(&resp)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames() {
        let mut input: &[u8] = &[0, 0, 0, 2, 0xaa, 0xbb];
        assert_eq!(read_frame(&mut input).unwrap(), Some(vec![0xaa, 0xbb]));
        assert_eq!(read_frame(&mut input).unwrap(), None);

        let mut truncated: &[u8] = &[0, 0, 0, 3, 0xaa];
        assert!(read_frame(&mut truncated).is_err());

        let mut huge: &[u8] = &[0, 1, 0, 0];
        assert!(read_frame(&mut huge).is_err());

        let mut out = vec![];
        write_answer(&mut out, &[7, 0x90, 0x00]).unwrap();
        assert_eq!(out, vec![0, 0, 0, 1, 7, 0x90, 0x00]);
    }
}
