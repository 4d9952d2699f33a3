use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use haierac_protocol::frame::{Frame, FrameError, FrameParser};
use haierac_protocol::pretty::Hex;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_serial::SerialPortBuilderExt;

pub const DEFAULT_BAUD_RATE: u32 = 9600;

pub struct TransportOpt {
    pub port: PathBuf,
    pub baud_rate: u32,
}

pub type AsyncTransport = (TransportReceiver, TransportSender);

pub async fn open(opt: &TransportOpt) -> Result<AsyncTransport, OpenError> {
    match open_serial_port(&opt.port, opt.baud_rate) {
        Ok(io) => {
            log::info!("opened {} at {} baud", opt.port.display(), opt.baud_rate);
            Ok(io)
        }
        Err(error) => Err(OpenError { path: opt.port.to_owned(), error }),
    }
}

#[derive(Debug, Error)]
#[error("opening port {path}: {error}", path = .path.display())]
pub struct OpenError {
    path: PathBuf,
    #[source]
    error: tokio_serial::Error,
}

pub struct TransportReceiver {
    rd: Pin<Box<dyn Stream<Item = FrameStreamResult> + Send>>,
}

impl TransportReceiver {
    pub fn new(rd: impl AsyncRead + Send + 'static) -> Self {
        // monomorphise before calling frame_stream:
        let rd = Box::pin(rd) as Pin<Box<dyn AsyncRead + Send + 'static>>;
        let rd = Box::pin(frame_stream(rd)) as Pin<Box<_>>;
        TransportReceiver { rd }
    }

    /// Reads the next frame that passes validation. Frames failing their
    /// checksum are logged and skipped.
    pub async fn read(&mut self) -> Result<Frame, io::Error> {
        while let Some(result) = self.rd.next().await {
            match result? {
                Ok(frame) => {
                    log::debug!("recv frame: {}", Hex(frame.as_bytes()));
                    return Ok(frame);
                }
                Err(err) => { log::warn!("receive: {err}"); }
            }
        }

        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "transport receiver stream ended",
        ));
    }
}

pub struct TransportSender {
    wr: Pin<Box<dyn AsyncWrite + Send>>,
}

impl TransportSender {
    pub fn new(wr: impl AsyncWrite + Send + 'static) -> Self {
        let wr = Box::pin(wr) as Pin<Box<_>>;
        TransportSender { wr }
    }

    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), io::Error> {
        log::debug!("send: {}", Hex(bytes));
        self.wr.write_all(bytes).await?;
        self.wr.flush().await?;
        Ok(())
    }
}

type FrameStreamResult = io::Result<Result<Frame, FrameError>>;

fn frame_stream(mut io: Pin<Box<dyn AsyncRead + Send>>)
    -> impl Stream<Item = FrameStreamResult>
{
    try_stream! {
        let mut parser = FrameParser::new();
        let mut buffer = [0u8; 64];

        loop {
            let data = match io.read(&mut buffer).await? {
                0 => break,
                n => &buffer[..n],
            };

            for byte in data {
                match parser.feed(*byte) {
                    Ok(None) => continue,
                    Ok(Some(frame)) => { yield Ok(frame); }
                    Err(err) => { yield Err(err); }
                }
            }
        }
    }
}

fn open_serial_port(path: &Path, baud_rate: u32) -> Result<AsyncTransport, tokio_serial::Error> {
    let path = path.to_string_lossy();

    let serial = tokio_serial::new(path, baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .timeout(Duration::from_secs(1))
        .open_native_async()?;

    let (rd, wr) = tokio::io::split(serial);
    let rd = TransportReceiver::new(rd);
    let wr = TransportSender::new(wr);

    Ok((rd, wr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use haierac_protocol::frame::{checksum, CHECKSUM, FRAME_SIZE};

    fn status_bytes(current: u8) -> [u8; FRAME_SIZE] {
        let mut frame = Frame::zeroed();
        frame.set(13, current);
        frame.set(29, 9);
        frame.serialize()
    }

    #[tokio::test]
    async fn reads_frames_across_chunks() {
        let (mut device, host) = tokio::io::duplex(64);
        let mut rx = TransportReceiver::new(host);

        let bytes = status_bytes(21);
        device.write_all(&[0x10, 0xff]).await.unwrap();
        device.write_all(&bytes[..10]).await.unwrap();
        device.write_all(&bytes[10..]).await.unwrap();

        let frame = rx.read().await.unwrap();
        assert_eq!(frame.get(13), 21);
    }

    #[tokio::test]
    async fn skips_frames_with_bad_checksum() {
        let (mut device, host) = tokio::io::duplex(256);
        let mut rx = TransportReceiver::new(host);

        let mut corrupt = status_bytes(20);
        corrupt[CHECKSUM] = checksum(&corrupt).wrapping_add(1);
        device.write_all(&corrupt).await.unwrap();
        device.write_all(&status_bytes(22)).await.unwrap();

        let frame = rx.read().await.unwrap();
        assert_eq!(frame.get(13), 22);
    }

    #[tokio::test]
    async fn eof_ends_reader() {
        let (device, host) = tokio::io::duplex(64);
        let mut rx = TransportReceiver::new(host);
        drop(device);

        let err = rx.read().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn sender_writes_bytes_verbatim() {
        let (mut device, host) = tokio::io::duplex(64);
        let mut tx = TransportSender::new(host);

        tx.send(&[0xff, 0xff, 0x0a]).await.unwrap();

        let mut buf = [0u8; 3];
        device.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [0xff, 0xff, 0x0a]);
    }
}
