use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub struct Error(pub ChunksError);

/// A type for reading server-sent event frames from a chunk stream.
///
/// Frames are separated by a blank line and may be split across
/// delivery increments at any byte, including inside the delimiter
/// or inside a multi-byte UTF-8 sequence. The carry-over buffer is
/// therefore kept as raw bytes and only complete frames are decoded
/// to text.
pub struct Sse {
    buf: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
        }
    }

    /// Reads the payload of the next `data` frame.
    ///
    /// Returns `None` when the underlying byte source has completed.
    pub async fn next_frame(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Drain complete frames from the buffer first.
            if let Some(payload) = self.try_take_frame() {
                return Ok(Some(payload));
            }

            // Not enough data for a frame, read more from the stream.
            let Some(bytes) = self.chunks.next_chunk().await.map_err(Error)?
            else {
                // The source has completed; whatever is left in the
                // buffer is a truncated trailing frame.
                if !self.buf.is_empty() {
                    debug!(
                        "discarding {} bytes of truncated trailing frame",
                        self.buf.len()
                    );
                    self.buf.clear();
                }
                return Ok(None);
            };
            self.buf.extend_from_slice(&bytes);
        }
    }

    fn try_take_frame(&mut self) -> Option<String> {
        loop {
            let delim_idx =
                self.buf.windows(2).position(|window| window == b"\n\n")?;

            let frame: Vec<u8> = self.buf.drain(0..delim_idx + 2).collect();
            let frame = String::from_utf8_lossy(&frame[..delim_idx]);

            // Only the `data` field is used by the backend; comments
            // and other fields are skipped.
            let Some(payload) = frame.strip_prefix("data: ") else {
                debug!("skipping non-data frame: {frame:?}");
                continue;
            };
            return Some(payload.to_owned());
        }
    }
}
