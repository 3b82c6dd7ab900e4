#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use quarry_fetch::{FetchOptions, Fetcher, HttpClient, Response, TransportError};
use quarry_install::{ArtifactKey, HttpMetadataSource, Installer, Layout};
use quarry_verify::{Checksum, HashAlgorithm, Sha1Hasher};
use serde_json::json;
use zip::write::SimpleFileOptions;

pub const CATALOG_URL: &str = "https://meta.test/catalog.json";
pub const DOCUMENT_URL: &str = "https://meta.test/v/1.20.1.json";
pub const LEGACY_DOCUMENT_URL: &str = "https://meta.test/v/1.5.2.json";
pub const LEGACY_CLIENT_URL: &str = "https://cdn.test/1.5.2.jar";
pub const CLIENT_URL: &str = "https://cdn.test/client.jar";
pub const INDEX_URL: &str = "https://meta.test/indexes/5.json";
pub const LEGACY_INDEX_URL: &str = "https://meta.test/indexes/pre-1.6.json";
pub const RESOURCE_BASE: &str = "https://res.test";

pub const LWJGL_OLD_URL: &str = "https://libs.test/org/lwjgl/lwjgl/3.2.1/lwjgl-3.2.1.jar";
pub const LWJGL_NEW_URL: &str = "https://libs.test/org/lwjgl/lwjgl/3.2.2/lwjgl-3.2.2.jar";
pub const GSON_URL: &str = "https://libs.test/com/google/gson/2.10/gson-2.10.jar";
pub const NATIVES_LINUX_URL: &str = "https://libs.test/org/lwjgl/lwjgl-glfw/3.2.2/natives-linux.jar";
pub const NATIVES_WINDOWS_URL: &str = "https://libs.test/org/lwjgl/lwjgl-glfw/3.2.2/natives-windows.jar";

pub const RESOURCE_A: &[u8] = b"icon png bytes";
pub const RESOURCE_B: &[u8] = b"sound ogg bytes";

/// In-memory HTTP server: unknown URLs answer 404.
#[derive(Default)]
pub struct MockHttp {
    bodies:   Mutex<HashMap<String, Vec<u8>>>,
    delays:   Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<String>>,
}

impl MockHttp {
    pub fn insert(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.bodies.lock().unwrap().insert(url.into(), body.into());
    }

    pub fn remove(&self, url: &str) {
        self.bodies.lock().unwrap().remove(url);
    }

    /// Serves `url` in small chunks, sleeping `delay` before each one.
    pub fn slow(&self, url: &str, delay: Option<Duration>) {
        let mut delays = self.delays.lock().unwrap();
        match delay {
            Some(delay) => delays.insert(url.to_string(), delay),
            None => delays.remove(url),
        };
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| *u == url).count()
    }
}

struct SlowBody {
    inner: Cursor<Vec<u8>>,
    delay: Duration,
}

impl Read for SlowBody {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        thread::sleep(self.delay);
        let n = buf.len().min(64);
        self.inner.read(&mut buf[..n])
    }
}

impl HttpClient for MockHttp {
    fn get(&self, url: &str) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        let body = self.bodies.lock().unwrap().get(url).cloned();
        let Some(body) = body else {
            return Err(TransportError::new(url, "404 Not Found").with_status(404));
        };
        let len = Some(body.len() as u64);
        match self.delays.lock().unwrap().get(url).copied() {
            Some(delay) => Ok(Response::new(len, SlowBody {
                inner: Cursor::new(body),
                delay,
            })),
            None => Ok(Response::new(len, Cursor::new(body))),
        }
    }
}

pub fn sha1_hex(data: &[u8]) -> String {
    Checksum::new(HashAlgorithm::Sha1, Sha1Hasher::digest(data)).to_hex()
}

pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(body).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn resource_url(body: &[u8]) -> String {
    let hash = sha1_hex(body);
    format!("{RESOURCE_BASE}/{}/{hash}", &hash[..2])
}

pub fn client_body() -> Vec<u8> {
    vec![b'c'; 4096]
}

fn download(url: &str, path: Option<&str>, body: &[u8]) -> serde_json::Value {
    let mut value = json!({ "url": url, "sha1": sha1_hex(body), "size": body.len() });
    if let Some(path) = path {
        value["path"] = json!(path);
    }
    value
}

/// A temporary data root wired to a [`MockHttp`] serving two versions:
/// `1.20.1` (modern, with libraries, natives and resources) and `1.5.2` (legacy).
pub struct Fixture {
    pub root:   tempfile::TempDir,
    pub http:   Arc<MockHttp>,
    pub layout: Layout,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let layout = Layout::new(root.path().join("data"));
        let http = Arc::new(MockHttp::default());

        http.insert(
            CATALOG_URL,
            json!({
                "versions": [
                    { "id": "1.20.1", "type": "release", "url": DOCUMENT_URL },
                    { "id": "1.5.2", "type": "release", "url": LEGACY_DOCUMENT_URL },
                ]
            })
            .to_string(),
        );

        let client = client_body();
        http.insert(CLIENT_URL, client.clone());

        let libraries: [(&str, &str, &[u8]); 3] = [
            (LWJGL_OLD_URL, "org/lwjgl/lwjgl/3.2.1/lwjgl-3.2.1.jar", b"old lwjgl"),
            (LWJGL_NEW_URL, "org/lwjgl/lwjgl/3.2.2/lwjgl-3.2.2.jar", b"new lwjgl"),
            (GSON_URL, "com/google/gson/2.10/gson-2.10.jar", b"gson"),
        ];
        for (url, _, body) in &libraries {
            http.insert(*url, body.to_vec());
        }
        let library_json = |i: usize| {
            let (url, path, body) = libraries[i];
            json!({ "name": path, "downloads": { "artifact": download(url, Some(path), body) } })
        };

        let linux = build_zip(&[("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n"), ("liblwjgl.so", b"so")]);
        let windows = build_zip(&[("lwjgl.dll", b"dll")]);
        http.insert(NATIVES_LINUX_URL, linux.clone());
        http.insert(NATIVES_WINDOWS_URL, windows.clone());

        let index = json!({
            "objects": {
                "icons/a.png": { "hash": sha1_hex(RESOURCE_A), "size": RESOURCE_A.len() },
                "sounds/b.ogg": { "hash": sha1_hex(RESOURCE_B), "size": RESOURCE_B.len() },
            }
        })
        .to_string();
        http.insert(INDEX_URL, index.clone());
        for body in [RESOURCE_A, RESOURCE_B] {
            http.insert(resource_url(body), body.to_vec());
        }

        let document = json!({
            "id": "1.20.1",
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "downloads": { "client": download(CLIENT_URL, None, &client) },
            "libraries": [
                library_json(0),
                library_json(1),
                library_json(2),
                library_json(2),
                {
                    "name": "org.lwjgl:lwjgl-glfw:3.2.2",
                    "downloads": {
                        "classifiers": {
                            "natives-linux": download(NATIVES_LINUX_URL, Some("org/lwjgl/lwjgl-glfw/3.2.2/natives-linux.jar"), &linux),
                            "natives-windows": download(NATIVES_WINDOWS_URL, Some("org/lwjgl/lwjgl-glfw/3.2.2/natives-windows.jar"), &windows),
                        }
                    },
                    "extract": { "exclude": ["META-INF/"] }
                }
            ],
            "assetIndex": {
                "id": "5",
                "url": INDEX_URL,
                "sha1": sha1_hex(index.as_bytes()),
                "size": index.len(),
                "totalSize": RESOURCE_A.len() + RESOURCE_B.len(),
            },
            "arguments": { "game": ["--username", "${auth_player_name}"] }
        });
        http.insert(DOCUMENT_URL, document.to_string());

        let legacy_client = b"legacy client".to_vec();
        http.insert(LEGACY_CLIENT_URL, legacy_client.clone());
        let legacy = json!({
            "id": "1.5.2",
            "type": "release",
            "minecraftArguments": "${auth_player_name} ${auth_session}",
            "downloads": { "client": download(LEGACY_CLIENT_URL, None, &legacy_client) },
            "libraries": [],
            "assetIndex": { "id": "pre-1.6", "url": LEGACY_INDEX_URL, "size": 10 }
        });
        http.insert(LEGACY_DOCUMENT_URL, legacy.to_string());

        Self { root, http, layout }
    }

    pub fn fetcher(&self) -> Fetcher {
        let options = FetchOptions::default().retry_backoff(Duration::ZERO).chunk_size(256);
        Fetcher::new(self.http.clone()).with_options(options)
    }

    pub fn installer(&self) -> Installer {
        self.installer_with_catalogs(&[CATALOG_URL])
    }

    pub fn installer_with_catalogs(&self, catalogs: &[&str]) -> Installer {
        let fetcher = self.fetcher();
        let metadata = Arc::new(HttpMetadataSource::new(fetcher.clone()).with_catalog_urls(catalogs.iter().copied()));
        Installer::new(self.layout.clone(), fetcher, metadata)
            .with_resource_base_url(RESOURCE_BASE)
            .with_asset_threads(2)
    }

    /// Serves every resource body slowly.
    pub fn slow_resources(&self, delay: Option<Duration>) {
        for body in [RESOURCE_A, RESOURCE_B] {
            self.http.slow(&resource_url(body), delay);
        }
    }

    pub fn client_dir(&self, key: &ArtifactKey) -> PathBuf {
        self.layout.client_dir(key)
    }
}

/// Polls `condition` every 10ms until it holds or `timeout` elapses.
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}
