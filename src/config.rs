// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Configuration loading for the record and generate commands.

use hyper::Uri;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct RecordConfig {
    /// Listen address, e.g. 127.0.0.1:9000
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Origin every captured request is forwarded to
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Directory fixture files are written into on shutdown
    #[serde(default = "default_recordings_dir")]
    pub output_dir: PathBuf,
}

fn default_listen() -> String {
    "127.0.0.1:9000".to_string()
}

fn default_backend() -> String {
    "http://localhost:8080".to_string()
}

fn default_recordings_dir() -> PathBuf {
    PathBuf::from("recordings")
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            backend: default_backend(),
            output_dir: default_recordings_dir(),
        }
    }
}

impl RecordConfig {
    /// Parse and check the backend origin.
    pub fn backend_uri(&self) -> anyhow::Result<Uri> {
        let uri: Uri = self.backend.parse()?;
        match uri.scheme_str() {
            Some("http") | Some("https") if uri.authority().is_some() => Ok(uri),
            _ => Err(anyhow::anyhow!(
                "backend must be an absolute http(s) origin, got {}",
                self.backend
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateConfig {
    /// Directory generated test files are written into
    #[serde(default = "default_gentest_dir")]
    pub output_dir: PathBuf,

    /// Token marking a route/type binding line in scanned source
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Extension (without dot) of the source files to scan
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// Suffix appended to the derived output file name
    #[serde(default = "default_test_suffix")]
    pub test_suffix: String,
}

fn default_gentest_dir() -> PathBuf {
    PathBuf::from("gentest")
}

fn default_marker() -> String {
    "@testgen".to_string()
}

fn default_source_extension() -> String {
    "go".to_string()
}

fn default_test_suffix() -> String {
    "_test.go".to_string()
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            output_dir: default_gentest_dir(),
            marker: default_marker(),
            source_extension: default_source_extension(),
            test_suffix: default_test_suffix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub record: RecordConfig,

    #[serde(default)]
    pub generate: GenerateConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// [record]
    /// listen = "127.0.0.1:9000"
    /// backend = "http://localhost:8080"
    ///
    /// [generate]
    /// output_dir = "gentest"
    pub async fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let s = tokio::fs::read_to_string(path.as_ref()).await?;
        let cfg: Self = toml::from_str(&s)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tokio::fs;
    use uuid::Uuid;

    #[test]
    fn defaults_match_cli_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.record.listen, "127.0.0.1:9000");
        assert_eq!(cfg.record.backend, "http://localhost:8080");
        assert_eq!(cfg.generate.marker, "@testgen");
        assert_eq!(cfg.generate.test_suffix, "_test.go");
    }

    #[tokio::test]
    async fn load_toml_file() -> anyhow::Result<()> {
        let tmp = std::env::temp_dir().join(format!("testgen_cfg_test_{}.toml", Uuid::new_v4()));
        let toml = r#"[record]
listen = "0.0.0.0:7000"
backend = "http://127.0.0.1:3000"

[generate]
output_dir = "out"
"#;
        fs::write(&tmp, toml).await?;
        let cfg = Config::load_from_path(&tmp).await?;
        assert_eq!(cfg.record.listen, "0.0.0.0:7000");
        assert_eq!(cfg.record.output_dir, PathBuf::from("recordings"));
        assert_eq!(cfg.generate.output_dir, PathBuf::from("out"));
        assert_eq!(cfg.generate.source_extension, "go");
        fs::remove_file(&tmp).await?;
        Ok(())
    }

    #[tokio::test]
    async fn load_empty_file_uses_defaults() -> anyhow::Result<()> {
        let tmp = std::env::temp_dir().join(format!("testgen_cfg_empty_{}.toml", Uuid::new_v4()));
        fs::write(&tmp, "").await?;
        let cfg = Config::load_from_path(&tmp).await?;
        assert_eq!(cfg.record.listen, default_listen());
        fs::remove_file(&tmp).await?;
        Ok(())
    }

    #[tokio::test]
    async fn load_missing_file_errors() {
        let tmp = std::env::temp_dir().join(format!("testgen_cfg_missing_{}.toml", Uuid::new_v4()));
        assert!(Config::load_from_path(&tmp).await.is_err());
    }

    #[rstest]
    #[case("http://localhost:8080", true)]
    #[case("https://api.example.com", true)]
    #[case("localhost:8080", false)]
    #[case("ftp://host", false)]
    #[case("/just/a/path", false)]
    fn backend_uri_validation(#[case] backend: &str, #[case] ok: bool) {
        let cfg = RecordConfig {
            backend: backend.to_string(),
            ..RecordConfig::default()
        };
        assert_eq!(cfg.backend_uri().is_ok(), ok);
    }
}
