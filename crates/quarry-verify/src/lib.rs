//! Content verification primitives for downloaded artifacts.
//!
//! Provides incremental hashing so a transfer can be verified in the same
//! pass that writes it to disk, plus a [`Checksum`] type that carries an
//! expected digest and knows which algorithm produced it.
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//! use quarry_verify::{Checksum, HashAlgorithm, Sha1Hasher, VerifiedReader};
//!
//! let data = b"hello world";
//! let expected = Checksum::new(HashAlgorithm::Sha1, Sha1Hasher::digest(data));
//!
//! let mut reader = VerifiedReader::new(&data[..], HashAlgorithm::Sha1.hasher());
//! let mut buffer = Vec::new();
//! reader.read_to_end(&mut buffer).unwrap();
//!
//! reader.finish(&expected).unwrap();
//! ```

pub use self::checksum::{Checksum, hash_file};
pub use self::error::{Result, VerifyError};
pub use self::hasher::{AnyHasher, HashAlgorithm, Hasher, Sha1Hasher, Sha256Hasher};
pub use self::reader::VerifiedReader;

mod checksum;
mod error;
mod hasher;
mod reader;
