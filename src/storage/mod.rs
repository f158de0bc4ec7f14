//! Artifact persistence (framed, checksummed, atomically replaced files).

pub mod artifact;
pub mod error;


pub use artifact::{
    ArtifactKind, FORMAT_VERSION, HEADER_LEN, MAGIC, decode_artifact, encode_artifact,
    read_artifact, write_artifact,
};
pub use error::{StorageError, StorageResult};
