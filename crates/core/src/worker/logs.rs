use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tokio::sync::{mpsc, watch};

use super::ProcessState;

const CHUNK_SIZE: usize = 8 * 1024;
const CHANNEL_CAPACITY: usize = 64;

/// Worker output from stdout and stderr merged into one byte stream.
///
/// Bytes from one source keep their order; there is no ordering between the
/// two sources. The stream reaches EOF after both pipes are closed and the
/// process has been reaped.
#[derive(Debug)]
pub struct LogStream {
    rx: mpsc::Receiver<Vec<u8>>,
    chunk: Vec<u8>,
    pos: usize,
}

impl LogStream {
    /// Fan in `sources` and close once all of them and `exit` are done.
    pub(super) fn merge<R>(sources: Vec<R>, mut exit: watch::Receiver<ProcessState>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        for source in sources {
            tokio::spawn(forward(source, tx.clone()));
        }

        // Holds the last sender so the stream cannot end before the process
        // is reaped, even if both pipes close early.
        tokio::spawn(async move {
            let _ = exit.wait_for(ProcessState::is_exited).await;
            drop(tx);
        });

        Self::from_receiver(rx)
    }

    /// A stream that is already at EOF
    pub(super) fn finished() -> Self {
        let (_, rx) = mpsc::channel(1);
        Self::from_receiver(rx)
    }

    fn from_receiver(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            rx,
            chunk: Vec::new(),
            pos: 0,
        }
    }
}

async fn forward<R>(mut source: R, tx: mpsc::Sender<Vec<u8>>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "worker pipe read failed");
                break;
            }
        }
    }
}

impl AsyncRead for LogStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        while this.pos >= this.chunk.len() {
            match ready!(this.rx.poll_recv(cx)) {
                Some(chunk) => {
                    this.chunk = chunk;
                    this.pos = 0;
                }
                None => return Poll::Ready(Ok(())),
            }
        }

        let n = (this.chunk.len() - this.pos).min(buf.remaining());
        buf.put_slice(&this.chunk[this.pos..this.pos + n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}
