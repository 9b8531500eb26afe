//! Byte-stream transport seam between the controller and its client.
//!
//! The session loop is written against [`LinkIo`], so any async byte stream
//! works as a client link:
//!
//! - `tokio::net::TcpStream` (the simulated-instrument daemon)
//! - `tokio_serial::SerialStream` (real UART, feature `serial`)
//! - `tokio::io::DuplexStream` (tests)

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

#[cfg(feature = "serial")]
use crate::error::{ScopeError, ScopeResult};

/// Trait alias for a client link.
pub trait LinkIo: AsyncRead + AsyncWrite + Unpin + Send {}

// Blanket implementation for all types meeting the requirements
impl<T: AsyncRead + AsyncWrite + Unpin + Send> LinkIo for T {}

/// Read and discard whatever is already queued on `link`.
///
/// UART clients can leave stale bytes from a previous run in the OS buffer;
/// draining before the banner keeps the first exchange clean. Returns the
/// number of bytes discarded.
pub async fn drain_link<R>(link: &mut R, window: Duration) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut discard = [0u8; 256];
    let deadline = tokio::time::Instant::now() + window;
    let mut total = 0usize;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, link.read(&mut discard)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => total += n,
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::WouldBlock => break,
            Ok(Err(_)) => break,
            Err(_) => break,
        }
    }

    total
}

/// Open a serial port asynchronously with the standard 8N1 settings.
///
/// The blocking open happens on the blocking pool so the runtime is never
/// stalled during port initialization.
#[cfg(feature = "serial")]
pub async fn open_serial_async(
    port_path: &str,
    baud_rate: u32,
) -> ScopeResult<tokio_serial::SerialStream> {
    use tokio::task::spawn_blocking;
    use tokio_serial::SerialPortBuilderExt;

    let path = port_path.to_string();
    spawn_blocking(move || {
        tokio_serial::new(&path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|err| {
                ScopeError::Io(std::io::Error::other(format!(
                    "failed to open serial port {path}: {err}"
                )))
            })
    })
    .await
    .map_err(|err| ScopeError::Io(std::io::Error::other(err)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn drain_discards_stale_bytes() {
        let (mut host, mut device) = tokio::io::duplex(64);
        host.write_all(b"stale junk\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let discarded = drain_link(&mut device, Duration::from_millis(30)).await;
        assert_eq!(discarded, 11);

        // nothing further arrives inside the window
        let more = drain_link(&mut device, Duration::from_millis(10)).await;
        assert_eq!(more, 0);
    }

    #[tokio::test]
    async fn duplex_stream_satisfies_link_io() {
        fn assert_link<L: LinkIo>(_link: &L) {}
        let (a, _b) = tokio::io::duplex(16);
        assert_link(&a);
    }
}
