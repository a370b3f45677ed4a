//! TCP connection to the game server
//!
//! Each protocol message travels as one frame: a 4-byte big-endian length
//! followed by that many bytes of UTF-8 text. Framing keeps multi-line
//! payloads such as `SCORES` intact.

use crate::error::{ProtocolError, Result};
use crate::protocol::{ClientMessage, ServerMessage};
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Largest frame we accept
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// What the connection task reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    Connected,
    Message(ServerMessage),
    Disconnected { reason: String },
    Error { message: String },
}

/// Serialize a message with its length prefix
pub fn encode_frame(text: &str) -> Vec<u8> {
    let len = text.len() as u32;
    let mut data = len.to_be_bytes().to_vec();
    data.extend(text.as_bytes());
    data
}

/// Write one frame
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> Result<()> {
    if text.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(text.len()).into());
    }
    writer.write_all(&encode_frame(text)).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame; `Ok(None)` means the peer closed cleanly between frames
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<String>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len).into());
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).await?;
    String::from_utf8(data)
        .map(Some)
        .map_err(|_| ProtocolError::InvalidUtf8.into())
}

/// Forward inbound frames as events until the stream ends
async fn read_loop<R: AsyncRead + Unpin>(mut reader: R, events: UnboundedSender<NetEvent>) {
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(text)) => match text.parse::<ServerMessage>() {
                Ok(message) => {
                    debug!("Received {:?}", message);
                    let _ = events.send(NetEvent::Message(message));
                }
                Err(e) => warn!("Dropping server message: {}", e),
            },
            Ok(None) => {
                info!("Server closed the connection");
                let _ = events.send(NetEvent::Disconnected {
                    reason: "Connection closed".to_string(),
                });
                return;
            }
            Err(e) => {
                error!("Read failed: {}", e);
                let _ = events.send(NetEvent::Disconnected {
                    reason: e.to_string(),
                });
                return;
            }
        }
    }
}

/// Pump outbound messages to the server and inbound frames to `events`
///
/// Returns once the outbound channel is closed and drained, or the server
/// goes away.
async fn connection_loop(
    stream: TcpStream,
    mut outbound: UnboundedReceiver<ClientMessage>,
    events: UnboundedSender<NetEvent>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut read_task = tokio::spawn(read_loop(reader, events.clone()));

    loop {
        tokio::select! {
            message = outbound.recv() => match message {
                Some(message) => {
                    debug!("Sending {}", message);
                    if let Err(e) = write_frame(&mut writer, &message.to_string()).await {
                        read_task.abort();
                        let _ = events.send(NetEvent::Disconnected {
                            reason: "Write failed".to_string(),
                        });
                        return Err(e);
                    }
                }
                None => {
                    debug!("Outbound channel closed, shutting down connection");
                    let _ = writer.shutdown().await;
                    read_task.abort();
                    return Ok(());
                }
            },
            // The reader already reported why
            _ = &mut read_task => return Ok(()),
        }
    }
}

/// Connect to `addr` and run the connection until either side closes
pub async fn connect(
    addr: &str,
    outbound: UnboundedReceiver<ClientMessage>,
    events: UnboundedSender<NetEvent>,
) -> Result<()> {
    info!("Connecting to {}", addr);
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    info!("Connected to {}", addr);
    let _ = events.send(NetEvent::Connected);
    connection_loop(stream, outbound, events).await
}

/// Spawn a connection on `handle`
///
/// Returns the outbound sender, the event receiver and the task itself. Drop
/// the sender and await the task to flush everything queued.
pub fn spawn_connection(
    handle: &tokio::runtime::Handle,
    addr: String,
) -> (
    UnboundedSender<ClientMessage>,
    UnboundedReceiver<NetEvent>,
    JoinHandle<()>,
) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let task = handle.spawn(async move {
        if let Err(e) = connect(&addr, cmd_rx, event_tx.clone()).await {
            error!("Connection to {} ended: {}", addr, e);
            let _ = event_tx.send(NetEvent::Error {
                message: e.to_string(),
            });
        }
    });

    (cmd_tx, event_rx, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;
    use crate::piece::PieceKind;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_frame_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(64);
        write_frame(&mut client, "SCORES a:1:3\nb:2:DEAD").await.unwrap();
        drop(client);
        assert_eq!(
            read_frame(&mut server).await.unwrap().as_deref(),
            Some("SCORES a:1:3\nb:2:DEAD")
        );
        assert_eq!(read_frame(&mut server).await.unwrap(), None);
    }

    #[test]
    fn test_encode_frame_prefix() {
        assert_eq!(encode_frame("DIE"), vec![0, 0, 0, 3, b'D', b'I', b'E']);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let len = (MAX_FRAME_LEN as u32 + 1).to_be_bytes();
        client.write_all(&len).await.unwrap();
        assert!(matches!(
            read_frame(&mut server).await,
            Err(GameError::Protocol(ProtocolError::FrameTooLarge(_)))
        ));
    }

    #[tokio::test]
    async fn test_invalid_utf8_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&[0, 0, 0, 2, 0xff, 0xfe]).await.unwrap();
        assert!(matches!(
            read_frame(&mut server).await,
            Err(GameError::Protocol(ProtocolError::InvalidUtf8))
        ));
    }

    #[tokio::test]
    async fn test_loopback_session() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_frame(&mut socket).await.unwrap();
            assert_eq!(request.as_deref(), Some("PIECE"));
            write_frame(&mut socket, "PIECE 4").await.unwrap();
            write_frame(&mut socket, "BOGUS").await.unwrap();
            write_frame(&mut socket, "MSG hello").await.unwrap();
            let bye = read_frame(&mut socket).await.unwrap();
            assert_eq!(bye.as_deref(), Some("DIE"));
        });

        let (tx, mut rx, task) = spawn_connection(&tokio::runtime::Handle::current(), addr);
        assert_eq!(rx.recv().await, Some(NetEvent::Connected));
        tx.send(ClientMessage::RequestPiece).unwrap();
        assert_eq!(
            rx.recv().await,
            Some(NetEvent::Message(ServerMessage::Piece(PieceKind::Square)))
        );
        assert_eq!(
            rx.recv().await,
            Some(NetEvent::Message(ServerMessage::Chat("hello".into())))
        );
        tx.send(ClientMessage::Die).unwrap();
        drop(tx);
        task.await.unwrap();
        server.await.unwrap();
    }
}
