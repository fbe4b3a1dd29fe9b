use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{ByteChannel, ChannelError};

/// Reads straight from the link, with no buffering and no timeouts.
pub struct PolledChannel<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> PolledChannel<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R, W> ByteChannel for PolledChannel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn recv_byte(&mut self) -> Result<u8, ChannelError> {
        match self.reader.read_u8().await {
            Ok(byte) => Ok(byte),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(ChannelError::Closed),
            Err(e) => Err(e.into()),
        }
    }

    async fn send_byte(&mut self, byte: u8) -> Result<(), ChannelError> {
        self.writer.write_u8(byte).await?;
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        self.writer.write_all(bytes).await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ChannelError> {
        self.writer.flush().await?;
        Ok(())
    }
}
