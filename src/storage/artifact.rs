//! Framed artifact container shared by prototypes, calibrators and spoof detectors.
//!
//! Layout (little-endian):
//!
//! | offset | size | field                      |
//! |--------|------|----------------------------|
//! | 0      | 4    | magic `NKAF`               |
//! | 4      | 1    | [`ArtifactKind`]           |
//! | 5      | 1    | format version             |
//! | 6      | 8    | payload length             |
//! | 14     | 32   | BLAKE3 digest of payload   |
//! | 46     | n    | payload                    |

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::error::{StorageError, StorageResult};
use crate::hashing::hash_payload;

/// File magic.
pub const MAGIC: [u8; 4] = *b"NKAF";

/// Format version written by this build.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the fixed header preceding the payload.
pub const HEADER_LEN: usize = 4 + 1 + 1 + 8 + 32;

/// Which model component an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ArtifactKind {
    Prototypes = 1,
    Calibrator = 2,
    SpoofDetector = 3,
}

impl ArtifactKind {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Prototypes),
            2 => Some(Self::Calibrator),
            3 => Some(Self::SpoofDetector),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Prototypes => "prototypes",
            Self::Calibrator => "calibrator",
            Self::SpoofDetector => "spoof-detector",
        };
        f.write_str(name)
    }
}

/// Wraps `payload` in a frame.
pub fn encode_artifact(kind: ArtifactKind, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&MAGIC);
    out.push(kind as u8);
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    out.extend_from_slice(&hash_payload(payload));
    out.extend_from_slice(payload);
    out
}

/// Validates a frame and returns the payload slice.
pub fn decode_artifact(expected: ArtifactKind, bytes: &[u8]) -> StorageResult<&[u8]> {
    if bytes.len() < HEADER_LEN {
        return Err(StorageError::Corrupt {
            reason: format!(
                "artifact is {} bytes, shorter than the {}-byte header",
                bytes.len(),
                HEADER_LEN
            ),
        });
    }
    if bytes[0..4] != MAGIC {
        return Err(StorageError::Corrupt {
            reason: "bad magic".to_string(),
        });
    }

    let kind_byte = bytes[4];
    match ArtifactKind::from_byte(kind_byte) {
        Some(kind) if kind == expected => {}
        _ => {
            return Err(StorageError::KindMismatch {
                expected,
                actual: kind_byte,
            });
        }
    }

    let version = bytes[5];
    if version != FORMAT_VERSION {
        return Err(StorageError::UnsupportedVersion {
            version,
            supported: FORMAT_VERSION,
        });
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[6..14]);
    let declared = u64::from_le_bytes(len_bytes);
    let payload = &bytes[HEADER_LEN..];
    if declared != payload.len() as u64 {
        return Err(StorageError::Corrupt {
            reason: format!(
                "declared payload length {} but found {}",
                declared,
                payload.len()
            ),
        });
    }

    if hash_payload(payload)[..] != bytes[14..HEADER_LEN] {
        return Err(StorageError::Corrupt {
            reason: "payload digest mismatch".to_string(),
        });
    }

    Ok(payload)
}

/// Atomically replaces `path` with a framed artifact.
///
/// The frame is written to a temporary file in the destination directory,
/// fsynced, then renamed over `path`. Readers observe either the old or
/// the new file, never a partial one.
pub fn write_artifact(path: &Path, kind: ArtifactKind, payload: &[u8]) -> StorageResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let framed = encode_artifact(kind, payload);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&framed)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;

    info!(
        path = %path.display(),
        kind = %kind,
        bytes = framed.len(),
        "Artifact written"
    );
    Ok(())
}

/// Reads and validates a framed artifact, returning its payload.
pub fn read_artifact(path: &Path, kind: ArtifactKind) -> StorageResult<Vec<u8>> {
    if !path.exists() {
        return Err(StorageError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path)?;
    let payload = decode_artifact(kind, &bytes)?.to_vec();
    debug!(path = %path.display(), kind = %kind, bytes = payload.len(), "Artifact read");
    Ok(payload)
}
