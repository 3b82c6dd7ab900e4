use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quarry_verify::{HashAlgorithm, VerifiedReader};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::control::Control;
use crate::core::{apply_prefix, retry_delay};
use crate::data::{FetchOptions, FetchRequest};
use crate::effects::http::HttpClient;
use crate::error::{FetchError, Result, TransportError};

/// Downloads files with retry, proxy rewriting and single-pass verification.
#[derive(Clone)]
pub struct Fetcher {
    client:  Arc<dyn HttpClient>,
    options: FetchOptions,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").field("options", &self.options).finish_non_exhaustive()
    }
}

impl Fetcher {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            options: FetchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// The URL actually requested for `url` after proxy rewriting.
    pub fn resolve_url(&self, url: &str) -> String {
        apply_prefix(self.options.url_prefix.as_deref(), url)
    }

    /// Streams `request.url` into `request.destination`.
    ///
    /// `on_progress(bytes_so_far, total)` runs after every chunk. A checksum
    /// mismatch removes the part file and counts as a failed attempt.
    /// Interruption is returned immediately and never retried.
    pub fn fetch(
        &self,
        request: &FetchRequest,
        on_progress: Option<&dyn Fn(u64, Option<u64>)>,
        control: Option<&Control>,
    ) -> Result<PathBuf> {
        let url = self.resolve_url(&request.url);
        if let Some(parent) = request.destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;
        }

        debug!(url = %url, dest = %request.destination.display(), "download started");
        let path = self.with_retries(&url, control, || {
            self.attempt(&url, request, on_progress, control)
        })?;
        debug!(dest = %path.display(), "download completed");
        Ok(path)
    }

    /// Reads a whole body into memory with the same retry policy as [`Fetcher::fetch`].
    pub fn fetch_bytes(&self, url: &str, control: Option<&Control>) -> Result<Vec<u8>> {
        let url = self.resolve_url(url);
        self.with_retries(&url, control, || {
            let response = self.client.get(&url)?;
            let mut body = response.body;
            let mut bytes = Vec::with_capacity(response.content_length.unwrap_or(0) as usize);
            let mut buf = vec![0u8; self.options.chunk_size.max(1)];
            loop {
                checkpoint(control)?;
                match read_chunk(&mut body, &mut buf, &url)? {
                    0 => break,
                    n => bytes.extend_from_slice(&buf[..n]),
                }
            }
            Ok(bytes)
        })
    }

    pub fn fetch_json<T: DeserializeOwned>(&self, url: &str, control: Option<&Control>) -> Result<T> {
        let bytes = self.fetch_bytes(url, control)?;
        serde_json::from_slice(&bytes).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn with_retries<T>(
        &self,
        url: &str,
        control: Option<&Control>,
        mut op: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        let attempts = self.options.attempts();
        let mut last = None;

        for attempt in 1..=attempts {
            checkpoint(control)?;
            if attempt > 1 {
                let delay = retry_delay(attempt - 2, self.options.retry_backoff);
                match control {
                    Some(control) => control.sleep(delay)?,
                    None => std::thread::sleep(delay),
                }
            }

            match op() {
                Ok(value) => return Ok(value),
                Err(FetchError::Interrupted) => return Err(FetchError::Interrupted),
                Err(e) => {
                    warn!(url = %url, attempt, attempts, error = %e, "download attempt failed");
                    last = Some(e);
                }
            }
        }

        Err(FetchError::RetriesExhausted {
            attempts,
            last: Box::new(last.unwrap_or_else(|| {
                TransportError::new(url, "no attempt was made").into()
            })),
        })
    }

    fn attempt(
        &self,
        url: &str,
        request: &FetchRequest,
        on_progress: Option<&dyn Fn(u64, Option<u64>)>,
        control: Option<&Control>,
    ) -> Result<PathBuf> {
        let dest = &request.destination;
        let part = PartFile::new(quarry_fs::part_path(dest));

        let response = self.client.get(url)?;
        let total = response.content_length.or(request.size);
        let algorithm = request.checksum.as_ref().map_or(HashAlgorithm::Sha1, |c| c.algorithm());
        let mut body = VerifiedReader::new(response.body, algorithm.hasher());

        let file = File::create(part.path()).map_err(|e| FetchError::io(part.path(), e))?;
        let mut writer = BufWriter::new(file);
        let mut buf = vec![0u8; self.options.chunk_size.max(1)];

        loop {
            checkpoint(control)?;
            let n = read_chunk(&mut body, &mut buf, url)?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n]).map_err(|e| FetchError::io(part.path(), e))?;
            if let Some(on_progress) = on_progress {
                on_progress(body.bytes_read(), total);
            }
        }
        writer.flush().map_err(|e| FetchError::io(part.path(), e))?;
        drop(writer);

        if let Some(expected) = &request.checksum {
            let actual = body.into_digest();
            if !expected.matches(&actual) {
                return Err(FetchError::ChecksumMismatch {
                    url:      url.to_string(),
                    expected: expected.to_hex(),
                    actual:   hex::encode(actual),
                });
            }
        }

        quarry_fs::replace_file(part.path(), dest)?;
        part.keep();
        Ok(dest.to_path_buf())
    }
}

fn checkpoint(control: Option<&Control>) -> Result<()> {
    match control {
        Some(control) => Ok(control.checkpoint()?),
        None => Ok(()),
    }
}

fn read_chunk(body: &mut dyn Read, buf: &mut [u8], url: &str) -> Result<usize> {
    loop {
        match body.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::new(url, e.to_string()).into()),
        }
    }
}

/// Removes the staging file on drop unless it was renamed into place.
struct PartFile {
    path: PathBuf,
    keep: bool,
}

impl PartFile {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn keep(mut self) {
        self.keep = true;
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if !self.keep {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
