use std::io::{self, Read};

use crate::{Checksum, Hasher, Result};

/// Streaming reader that hashes data as it passes through.
/// Wraps any `Read` source for single-pass verification.
pub struct VerifiedReader<R, H> {
    reader: R,
    hasher: H,
    bytes:  u64,
}

impl<R, H> VerifiedReader<R, H> {
    pub fn new(reader: R, hasher: H) -> Self {
        Self { reader, hasher, bytes: 0 }
    }

    /// Bytes read so far.
    pub fn bytes_read(&self) -> u64 { self.bytes }
}

impl<R: Read, H: Hasher> Read for VerifiedReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes += n as u64;
        }
        Ok(n)
    }
}

impl<R: Read, H: Hasher> VerifiedReader<R, H> {
    /// Finalize verification against the expected checksum.
    pub fn finish(self, expected: &Checksum) -> Result<()> {
        expected.check(&self.hasher.finalize())
    }

    pub fn into_digest(self) -> Vec<u8> { self.hasher.finalize() }
}
