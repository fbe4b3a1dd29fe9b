use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::{ByteChannel, ChannelError, RingBuffer};

struct RxQueue {
    ring: Mutex<RingBuffer>,
    ready: Notify,
    closed: AtomicBool,
    dropped: AtomicUsize,
}

/// Receive side fed by the rx pump, the software stand-in for the UART
/// receive interrupt. Only ever pushes.
#[derive(Clone)]
pub struct RxProducer {
    queue: Arc<RxQueue>,
}

impl RxProducer {
    /// Queue one byte. A full buffer drops it and returns `false`.
    pub fn push(&self, byte: u8) -> bool {
        let accepted = self
            .queue
            .ring
            .lock()
            .map(|mut ring| ring.push(byte))
            .unwrap_or(false);
        if !accepted {
            let dropped = self.queue.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(dropped, "rx buffer full, byte dropped");
        }
        self.queue.ready.notify_one();
        accepted
    }

    /// No more bytes will arrive; the consumer sees `Closed` once drained.
    pub fn close(&self) {
        self.queue.closed.store(true, Ordering::Release);
        self.queue.ready.notify_one();
    }
}

/// Consumer half of the interrupt-buffered link. Only ever pops.
pub struct BufferedChannel<W> {
    queue: Arc<RxQueue>,
    writer: W,
    frame_gap: Duration,
}

/// Build a buffered link holding at most `capacity` unread bytes.
pub fn buffered<W>(
    capacity: usize,
    writer: W,
    frame_gap: Duration,
) -> (RxProducer, BufferedChannel<W>) {
    let queue = Arc::new(RxQueue {
        ring: Mutex::new(RingBuffer::new(capacity)),
        ready: Notify::new(),
        closed: AtomicBool::new(false),
        dropped: AtomicUsize::new(0),
    });
    (
        RxProducer {
            queue: queue.clone(),
        },
        BufferedChannel {
            queue,
            writer,
            frame_gap,
        },
    )
}

impl<W> BufferedChannel<W> {
    /// Bytes lost to overflow since creation.
    pub fn dropped(&self) -> usize {
        self.queue.dropped.load(Ordering::Relaxed)
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn pop(&self) -> Option<u8> {
        self.queue.ring.lock().ok().and_then(|mut ring| ring.pop())
    }
}

impl<W: AsyncWrite + Unpin> ByteChannel for BufferedChannel<W> {
    async fn recv_byte(&mut self) -> Result<u8, ChannelError> {
        loop {
            if let Some(byte) = self.pop() {
                return Ok(byte);
            }
            if self.queue.closed.load(Ordering::Acquire) {
                return Err(ChannelError::Closed);
            }
            self.queue.ready.notified().await;
        }
    }

    async fn recv_arg_byte(&mut self) -> Result<u8, ChannelError> {
        let gap = self.frame_gap;
        match tokio::time::timeout(gap, self.recv_byte()).await {
            Ok(res) => res,
            Err(_) => Err(ChannelError::Underrun),
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

/// Copy every byte from `reader` into `producer`, closing it on EOF or error.
pub fn spawn_rx_pump<R>(mut reader: R, producer: RxProducer) -> JoinHandle<std::io::Result<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; 64];
        let res = loop {
            match reader.read(&mut buf).await {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    tracing::trace!(n, "rx");
                    for byte in &buf[..n] {
                        producer.push(*byte);
                    }
                }
                Err(e) => break Err(e),
            }
        };
        producer.close();
        res
    })
}
