// Cache keys derived from input bytes and build configuration
use anyhow::{Context, Result};
use cograph_core::BuildConfig;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Incremental SHA-256 over an input and the configuration that builds it.
///
/// The topology and the JSON form of the configuration are hashed after the
/// input, so the same file built two different ways gets two cache entries.
pub struct Fingerprinter {
    hasher: Sha256,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self { hasher: Sha256::new() }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    pub fn finish(mut self, config: &BuildConfig) -> Result<String> {
        let config_json = serde_json::to_vec(config).context("serializing build config")?;
        self.hasher.update(b"\0topology=");
        self.hasher.update(config.topology().as_str().as_bytes());
        self.hasher.update(b"\0config=");
        self.hasher.update(&config_json);
        Ok(format!("{:x}", self.hasher.finalize()))
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Fingerprint of in-memory input bytes.
pub fn fingerprint_bytes(input: &[u8], config: &BuildConfig) -> Result<String> {
    let mut fp = Fingerprinter::new();
    fp.update(input);
    fp.finish(config)
}

/// Fingerprint of a file, read in blocks.
pub fn fingerprint_file<P: AsRef<Path>>(path: P, config: &BuildConfig) -> Result<String> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut fp = Fingerprinter::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = reader
            .read(&mut buf)
            .with_context(|| format!("reading {}", path.display()))?;
        if read == 0 {
            break;
        }
        fp.update(&buf[..read]);
    }
    fp.finish(config)
}

/// Fingerprints are lowercase hex; anything else is never used as a path.
pub fn is_valid_fingerprint(fingerprint: &str) -> bool {
    !fingerprint.is_empty() && fingerprint.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
