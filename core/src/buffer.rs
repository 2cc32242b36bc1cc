//! Growable accumulator for one response body.

use std::io::{ErrorKind, Read};

use crate::error::PostError;

/// Size of each read from the transport.
const CHUNK_SIZE: usize = 16 * 1024;

/// Owned byte buffer collecting every chunk delivered for a single request.
///
/// Growth uses fallible reservation: if the allocator refuses, the chunk is
/// not consumed and the request fails with `PostError::OutOfMemory`. The
/// buffer length is always the sum of the chunks appended so far.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    data: Vec<u8>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Append one chunk, returning the number of bytes consumed.
    pub fn append(&mut self, chunk: &[u8]) -> Result<usize, PostError> {
        self.reserve(chunk.len())?;
        self.data.extend_from_slice(chunk);
        Ok(chunk.len())
    }

    /// Make room for `additional` more bytes without aborting on failure.
    fn reserve(&mut self, additional: usize) -> Result<(), PostError> {
        if self.data.try_reserve(additional).is_err() {
            let requested = self.data.len().saturating_add(additional);
            tracing::error!(requested, "not enough memory to grow response buffer");
            return Err(PostError::OutOfMemory { requested });
        }
        Ok(())
    }

    /// Drain `reader` to EOF, appending each chunk. Returns how many chunks
    /// were read.
    pub fn fill_from<R: Read>(&mut self, mut reader: R) -> Result<usize, PostError> {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut chunks = 0;
        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => return Ok(chunks),
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(PostError::from_body_read(err)),
            };
            self.append(&chunk[..n])?;
            chunks += 1;
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
