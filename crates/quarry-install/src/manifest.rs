//! The `data.ini` install manifest.
//!
//! One `key=value` assignment per line, written in a fixed key order. Every
//! value escapes `\` as `\\`, newline as `\n` and carriage return as `\r`.
//! List values additionally escape `,` as `\,` and join elements with `,`.

use std::path::Path;

use quarry_fs::AtomicWriteOptions;

use crate::error::{InstallError, ManifestError};
use crate::metadata::DEFAULT_MAIN_CLASS;

pub const MANIFEST_FILE: &str = "data.ini";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchFlag {
    pub disabled: bool,
    pub message:  Option<String>,
}

/// Everything a launcher needs to start an installed client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallManifest {
    pub main_class:       String,
    /// Primary binary first, then libraries in install order.
    pub classpath:        Vec<String>,
    pub asset_index:      String,
    pub version_type:     String,
    pub full_assets:      bool,
    pub total_size_bytes: u64,
    pub extra_args:       Option<String>,
    pub launch:           LaunchFlag,
    /// Optional keys a user may add by hand.
    pub display_name:     Option<String>,
    pub native_subfolder: Option<String>,
}

impl Default for InstallManifest {
    fn default() -> Self {
        Self {
            main_class:       DEFAULT_MAIN_CLASS.to_string(),
            classpath:        vec!["client.jar".to_string()],
            asset_index:      String::new(),
            version_type:     String::new(),
            full_assets:      false,
            total_size_bytes: 0,
            extra_args:       None,
            launch:           LaunchFlag::default(),
            display_name:     None,
            native_subfolder: None,
        }
    }
}

impl InstallManifest {
    pub fn to_text(&self) -> String {
        let mut lines = vec![
            format!("main_class={}", escape(&self.main_class)),
            format!("classpath={}", join_list(&self.classpath)),
            format!("asset_index={}", escape(&self.asset_index)),
            format!("version_type={}", escape(&self.version_type)),
            format!("full_assets={}", self.full_assets),
            format!("total_size_bytes={}", self.total_size_bytes),
        ];
        if let Some(name) = &self.display_name {
            lines.push(format!("display_name={}", escape(name)));
        }
        if let Some(folder) = &self.native_subfolder {
            lines.push(format!("native_subfolder={}", escape(folder)));
        }
        if let Some(args) = &self.extra_args {
            lines.push(format!("extra_jvm_args={}", escape(args)));
        }
        let launch = match &self.launch.message {
            Some(message) => join_list(&[self.launch.disabled.to_string(), message.clone()]),
            None => self.launch.disabled.to_string(),
        };
        lines.push(format!("launch_disabled={launch}"));

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Blank lines and `#` comments are skipped; absent keys keep their defaults.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut manifest = Self::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "main_class" if !value.is_empty() => manifest.main_class = unescape(value),
                "classpath" if !value.is_empty() => manifest.classpath = split_list(value),
                "asset_index" => manifest.asset_index = unescape(value),
                "version_type" => manifest.version_type = unescape(value),
                "full_assets" => manifest.full_assets = parse_flag("full_assets", value)?,
                "total_size_bytes" => {
                    manifest.total_size_bytes =
                        value.parse().map_err(|_| ManifestError::InvalidValue {
                            key:   "total_size_bytes",
                            value: value.to_string(),
                        })?;
                }
                "extra_jvm_args" if !value.is_empty() => manifest.extra_args = Some(unescape(value)),
                "display_name" if !value.is_empty() => manifest.display_name = Some(unescape(value)),
                "native_subfolder" if !value.is_empty() => {
                    manifest.native_subfolder = Some(unescape(value));
                }
                "launch_disabled" if !value.is_empty() => manifest.launch = parse_launch(value)?,
                _ => {}
            }
        }

        Ok(manifest)
    }

    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<(), InstallError> {
        let path = dir.as_ref().join(MANIFEST_FILE);
        quarry_fs::atomic_write(path, self.to_text().as_bytes(), AtomicWriteOptions::new().sync(true))?;
        Ok(())
    }

    /// A missing file reads as the default manifest.
    pub fn read_from(dir: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = dir.as_ref().join(MANIFEST_FILE);
        match std::fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ManifestError::Read { path, source }),
        }
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ManifestError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ManifestError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

/// `<flag>` or `<flag>,<message>`; a quoted message loses its quotes.
fn parse_launch(value: &str) -> Result<LaunchFlag, ManifestError> {
    let mut parts = split_list(value).into_iter();
    let disabled = parse_flag("launch_disabled", parts.next().unwrap_or_default().trim())?;
    let rest: Vec<String> = parts.collect();
    let message = (!rest.is_empty()).then(|| {
        let message = rest.join(",");
        let trimmed = message.trim();
        let unquoted = ['"', '\'']
            .iter()
            .find_map(|q| trimmed.strip_prefix(*q).and_then(|m| m.strip_suffix(*q)))
            .unwrap_or(trimmed);
        unquoted.to_string()
    });
    Ok(LaunchFlag { disabled, message })
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn join_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| escape(item).replace(',', "\\,"))
        .collect::<Vec<_>>()
        .join(",")
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other @ ('\\' | ',')) => out.push(other),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Splits on unescaped commas, dropping empty elements.
fn split_list(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push('\\');
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ',' => items.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    items.push(current);
    items
        .into_iter()
        .map(|raw| unescape(&raw))
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InstallManifest {
        InstallManifest {
            main_class:       "net.minecraft.client.main.Main".into(),
            classpath:        vec!["client.jar".into(), "lwjgl-3.2.2.jar".into(), "odd,name.jar".into()],
            asset_index:      "5".into(),
            version_type:     "release".into(),
            full_assets:      true,
            total_size_bytes: 12345,
            extra_args:       Some("--username ${auth_player_name}".into()),
            launch:           LaunchFlag::default(),
            display_name:     None,
            native_subfolder: None,
        }
    }

    #[test]
    fn writes_keys_in_order() {
        let text = sample().to_text();
        let keys: Vec<&str> = text.lines().filter_map(|l| l.split_once('=')).map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            [
                "main_class",
                "classpath",
                "asset_index",
                "version_type",
                "full_assets",
                "total_size_bytes",
                "extra_jvm_args",
                "launch_disabled"
            ]
        );
        assert!(text.contains("classpath=client.jar,lwjgl-3.2.2.jar,odd\\,name.jar\n"));
        assert!(text.ends_with("launch_disabled=false\n"));
    }

    #[test]
    fn parse_inverts_to_text() {
        let manifest = sample();
        assert_eq!(InstallManifest::parse(&manifest.to_text()).unwrap(), manifest);
    }

    #[test]
    fn escaping_survives_control_characters() {
        let manifest = InstallManifest {
            extra_args: Some("line one\nline two \\ done\r".into()),
            classpath: vec!["a\\b.jar".into(), "c\nd.jar".into()],
            launch: LaunchFlag {
                disabled: true,
                message:  Some("Broken, do not launch".into()),
            },
            ..sample()
        };
        let text = manifest.to_text();
        assert_eq!(text.lines().count(), 8);
        assert_eq!(InstallManifest::parse(&text).unwrap(), manifest);
    }

    #[test]
    fn hand_written_manifest() {
        let manifest = InstallManifest::parse(
            "# edited by hand\n\nmain_class = \ndisplay_name = Beta 1.7.3\nlaunch_disabled = yes, \"Needs a patched jar\"\n",
        )
        .unwrap();
        assert_eq!(manifest.main_class, DEFAULT_MAIN_CLASS);
        assert_eq!(manifest.classpath, vec!["client.jar"]);
        assert_eq!(manifest.display_name.as_deref(), Some("Beta 1.7.3"));
        assert!(manifest.launch.disabled);
        assert_eq!(manifest.launch.message.as_deref(), Some("Needs a patched jar"));
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(InstallManifest::parse("total_size_bytes=lots").is_err());
        assert!(InstallManifest::parse("full_assets=maybe").is_err());
    }

    #[test]
    fn read_and_write_files() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(InstallManifest::read_from(dir.path()).unwrap(), InstallManifest::default());
        sample().write_to(dir.path()).unwrap();
        assert_eq!(InstallManifest::read_from(dir.path()).unwrap(), sample());
    }
}
