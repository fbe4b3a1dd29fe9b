pub mod buffered;
pub mod polled;
pub mod ring;

pub use buffered::{BufferedChannel, RxProducer, buffered, spawn_rx_pump};
pub use polled::PolledChannel;
pub use ring::RingBuffer;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,
    #[error("frame truncated")]
    Underrun,
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Byte-in/byte-out link to the host.
#[allow(async_fn_in_trait)]
pub trait ByteChannel {
    /// Wait for the next byte, however long it takes.
    async fn recv_byte(&mut self) -> Result<u8, ChannelError>;

    /// Next byte of a fixed-length argument. Channels able to detect a stalled
    /// frame report it as [`ChannelError::Underrun`].
    async fn recv_arg_byte(&mut self) -> Result<u8, ChannelError> {
        self.recv_byte().await
    }

    async fn send_byte(&mut self, byte: u8) -> Result<(), ChannelError>;

    async fn send(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        for byte in bytes {
            self.send_byte(*byte).await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }
}
