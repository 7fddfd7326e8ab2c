use std::{io, mem};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::Stream;
use pin_project::pin_project;
use tokio::io::{AsyncRead, ReadBuf};

const IO_BUFFER_SIZE: usize = 64 * 1024;

/// Sequential chunk stream over any [`AsyncRead`].
#[pin_project]
pub struct ReadStream<R> {
    buffer: BytesMut,
    done: bool,
    #[pin]
    reader: R,
}

impl<R: AsyncRead> ReadStream<R> {
    pub fn new(reader: R) -> Self {
        ReadStream { buffer: allocate_buffer(), done: false, reader }
    }
}

impl<R: AsyncRead> Stream for ReadStream<R> {
    type Item = io::Result<Bytes>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>
    ) -> Poll<Option<io::Result<Bytes>>> {
        let this = self.project();

        if *this.done {
            return Poll::Ready(None);
        }

        let uninit = this.buffer.spare_capacity_mut();
        let mut read_buf = ReadBuf::uninit(uninit);

        match this.reader.poll_read(cx, &mut read_buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => {
                *this.done = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(Ok(())) => {
                match read_buf.filled().len() {
                    0 => {
                        *this.done = true;
                        Poll::Ready(None)
                    }
                    n => {
                        // SAFETY: poll_read has filled the buffer with `n`
                        // additional bytes. `buffer.len` should always be
                        // 0 here, but include it for rigorous correctness
                        unsafe { this.buffer.set_len(this.buffer.len() + n); }

                        // replace state buffer and take this one to return
                        let chunk = mem::replace(this.buffer, allocate_buffer());
                        Poll::Ready(Some(Ok(chunk.freeze())))
                    }
                }
            }
        }
    }
}

fn allocate_buffer() -> BytesMut {
    BytesMut::with_capacity(IO_BUFFER_SIZE)
}

/// Streams an in-memory buffer in slices of at most `chunk_size` bytes.
/// Slices share the buffer's allocation.
pub fn chunked(bytes: Bytes, chunk_size: usize) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    let chunk_size = chunk_size.max(1);
    async_stream::stream! {
        let mut offset = 0;
        while offset < bytes.len() {
            let end = usize::min(offset + chunk_size, bytes.len());
            yield Ok(bytes.slice(offset..end));
            offset = end;
        }
    }
}
