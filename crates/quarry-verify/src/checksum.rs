use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::hasher::{HashAlgorithm, Hasher};
use crate::{Result, VerifyError};

const READ_CHUNK: usize = 64 * 1024;

/// An expected digest together with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    algorithm: HashAlgorithm,
    digest:    Vec<u8>,
}

impl Checksum {
    pub fn new(algorithm: HashAlgorithm, digest: Vec<u8>) -> Self {
        Self { algorithm, digest }
    }

    /// Parses `algo:hex` or a bare hex digest.
    ///
    /// A bare digest picks its algorithm from its length, so a 40 character
    /// value is SHA-1 and a 64 character value is SHA-256.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let (algorithm, hex_part) = match value.split_once(':') {
            Some((name, hex_part)) => {
                let algorithm = HashAlgorithm::from_name(name)
                    .ok_or_else(|| VerifyError::InvalidChecksum(value.to_string()))?;
                (algorithm, hex_part)
            }
            None => {
                let algorithm = HashAlgorithm::from_hex_len(value.len())
                    .ok_or_else(|| VerifyError::InvalidChecksum(value.to_string()))?;
                (algorithm, value)
            }
        };

        if hex_part.len() != algorithm.digest_length() * 2 {
            return Err(VerifyError::InvalidChecksum(value.to_string()));
        }
        let digest = hex::decode(hex_part.to_ascii_lowercase())
            .map_err(|_| VerifyError::InvalidChecksum(value.to_string()))?;

        Ok(Self { algorithm, digest })
    }

    pub fn algorithm(&self) -> HashAlgorithm { self.algorithm }

    pub fn digest(&self) -> &[u8] { &self.digest }

    pub fn to_hex(&self) -> String { hex::encode(&self.digest) }

    pub fn matches(&self, actual: &[u8]) -> bool { self.digest == actual }

    /// Compares `actual` and reports a mismatch with both digests hex-encoded.
    pub fn check(&self, actual: &[u8]) -> Result<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(VerifyError::Mismatch {
                expected: self.to_hex(),
                actual:   hex::encode(actual),
            })
        }
    }

    /// Hashes the file at `path` and tells whether it carries this digest.
    pub fn verify_file(&self, path: impl AsRef<Path>) -> Result<bool> {
        let actual = hash_file(path, self.algorithm)?;
        Ok(self.matches(&actual))
    }
}

impl FromStr for Checksum {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self> { Checksum::parse(s) }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.as_str(), self.to_hex())
    }
}

/// Streams a file through the given algorithm.
pub fn hash_file(path: impl AsRef<Path>, algorithm: HashAlgorithm) -> Result<Vec<u8>> {
    let mut file = File::open(path.as_ref())?;
    let mut hasher = algorithm.hasher();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}
