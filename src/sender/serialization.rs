use bytes::Bytes;
use flate2::{Compression, write::GzEncoder};
use serde::Serialize;
use std::io::Write;
use thiserror::Error;

// Bodies below this size are sent as-is even with compression enabled
const MIN_COMPRESS_SIZE: usize = 1024;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error during serialization: {0}")]
    IoError(#[from] std::io::Error),
}

/// A serialized request body, ready to be sent (and re-sent) unchanged.
#[derive(Debug, Clone)]
pub struct EncodedBody {
    pub bytes: Bytes,
    pub gzipped: bool,
}

impl EncodedBody {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BodyEncoder {
    compress: bool,
}

impl BodyEncoder {
    pub fn new(compress: bool) -> Self {
        Self { compress }
    }

    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<EncodedBody, SerializationError> {
        let json = serde_json::to_vec(value)?;

        if !self.compress || json.len() < MIN_COMPRESS_SIZE {
            return Ok(EncodedBody {
                bytes: Bytes::from(json),
                gzipped: false,
            });
        }

        let mut encoder = GzEncoder::new(Vec::with_capacity(json.len() / 4), Compression::fast());
        encoder.write_all(&json)?;
        let compressed = encoder.finish()?;

        Ok(EncodedBody {
            bytes: Bytes::from(compressed),
            gzipped: true,
        })
    }
}
