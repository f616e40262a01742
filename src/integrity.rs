//! Integrity verification: SHA-256 digests over the core asset files.
//!
//! Digests are computed in 4 KiB blocks and recorded in a JSON manifest
//! mapping relative file path to lowercase hex digest. The manifest is
//! only written when every listed file is present and hashed.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Error, Result};

const BLOCK_SIZE: usize = 4096;

/// Manifest contents: relative path to hex SHA-256 digest.
pub type Manifest = BTreeMap<String, String>;

/// Compute the SHA-256 digest of a file, streaming in 4 KiB blocks.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::IoRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; BLOCK_SIZE];

    loop {
        let n = file.read(&mut buf).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash every listed file under `root`.
///
/// Fails on the first missing file; nothing is written in that case.
pub fn compute_manifest(root: &Path, files: &[String]) -> Result<Manifest> {
    let mut manifest = Manifest::new();

    for rel in files {
        let path = root.join(rel);
        if !path.exists() {
            return Err(Error::AssetMissing { path });
        }
        let digest = sha256_file(&path)?;
        debug!(file = %rel, %digest, "Hashed");
        manifest.insert(rel.clone(), digest);
    }

    Ok(manifest)
}

/// Write a manifest as pretty-printed JSON, replacing any existing file.
pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(path, json).map_err(|e| Error::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!(path = %path.display(), entries = manifest.len(), "Manifest written");
    Ok(())
}

/// Read a manifest from disk.
pub fn read_manifest(path: &Path) -> Result<Manifest> {
    if !path.exists() {
        return Err(Error::ManifestMissing {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(serde_json::from_str(&content)?)
}

/// Recompute digests for every manifest entry and compare.
///
/// Fails on the first missing file or digest mismatch.
pub fn check_manifest(root: &Path, manifest: &Manifest) -> Result<()> {
    for (rel, expected) in manifest {
        let path = root.join(rel);
        if !path.exists() {
            return Err(Error::AssetMissing { path });
        }

        let actual = sha256_file(&path)?;
        if actual != *expected {
            return Err(Error::ChecksumMismatch {
                file: rel.clone(),
                expected: expected.clone(),
                actual,
            });
        }
        debug!(file = %rel, "Checksum ok");
    }

    Ok(())
}
