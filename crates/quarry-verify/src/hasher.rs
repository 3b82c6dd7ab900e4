use sha1::Digest as _;

pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
}

pub struct Sha1Hasher(sha1::Sha1);

impl Hasher for Sha1Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

impl Default for Sha1Hasher {
    fn default() -> Self { Self::new() }
}

impl Sha1Hasher {
    pub fn new() -> Self { Self(sha1::Sha1::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { sha1::Sha1::digest(data).to_vec() }
}

pub struct Sha256Hasher(sha2::Sha256);

impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

impl Default for Sha256Hasher {
    fn default() -> Self { Self::new() }
}

impl Sha256Hasher {
    pub fn new() -> Self { Self(sha2::Sha256::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { sha2::Sha256::digest(data).to_vec() }
}

/// Supported hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Digest length in bytes.
    pub fn digest_length(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sha1" => Some(HashAlgorithm::Sha1),
            "sha256" => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }

    /// Infers the algorithm from the length of a hex digest.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        [HashAlgorithm::Sha1, HashAlgorithm::Sha256]
            .into_iter()
            .find(|a| a.digest_length() * 2 == len)
    }

    pub fn hasher(&self) -> AnyHasher {
        match self {
            HashAlgorithm::Sha1 => AnyHasher::Sha1(Sha1Hasher::new()),
            HashAlgorithm::Sha256 => AnyHasher::Sha256(Sha256Hasher::new()),
        }
    }
}

/// Hasher selected at runtime from a [`HashAlgorithm`].
pub enum AnyHasher {
    Sha1(Sha1Hasher),
    Sha256(Sha256Hasher),
}

impl Hasher for AnyHasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            AnyHasher::Sha1(h) => h.update(data),
            AnyHasher::Sha256(h) => h.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            AnyHasher::Sha1(h) => h.finalize(),
            AnyHasher::Sha256(h) => h.finalize(),
        }
    }
}
