//! Export of the published fog grid.
//!
//! 导出已发布的迷雾网格
//!
//! A [`FogSnapshot`] is a copy of one [`FogOverlay`](crate::overlay::FogOverlay)
//! generation. It can be encoded for saving, network sync or tooling.
//!
//! # Features
//! - `format-bincode` (default): compact binary encoding
//! - `format-json`: human readable encoding

use crate::error::FogError;
use serde::{Deserialize, Serialize};

/// 快照编码格式
/// Snapshot encoding format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// JSON格式（人类可读）
    /// JSON format (human readable)
    #[cfg(feature = "format-json")]
    Json,
    /// bincode格式（Rust原生，最快）
    /// bincode format (Rust native, fastest)
    #[cfg(feature = "format-bincode")]
    Bincode,
}

impl SnapshotFormat {
    pub fn extension(self) -> &'static str {
        match self {
            #[cfg(feature = "format-json")]
            SnapshotFormat::Json => "json",
            #[cfg(feature = "format-bincode")]
            SnapshotFormat::Bincode => "bincode",
        }
    }
}

/// 迷雾网格快照
/// A published fog grid, row-major from the grid's minimum corner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FogSnapshot {
    pub resolution: u32,
    /// Publish generation the values were taken from
    pub generation: u64,
    pub values: Vec<u8>,
}

impl FogSnapshot {
    /// Checks that `values` holds exactly `resolution²` cells.
    pub fn validate(&self) -> Result<(), FogError> {
        let expected = self.resolution as usize * self.resolution as usize;
        if self.values.len() != expected {
            return Err(FogError::ResolutionMismatch {
                expected,
                found: self.values.len(),
            });
        }
        Ok(())
    }

    pub fn encode(&self, format: SnapshotFormat) -> Result<Vec<u8>, FogError> {
        self.validate()?;
        match format {
            #[cfg(feature = "format-json")]
            SnapshotFormat::Json => serde_json::to_vec(self)
                .map_err(|e| FogError::SerializationFailed(e.to_string())),
            #[cfg(feature = "format-bincode")]
            SnapshotFormat::Bincode => {
                bincode::serde::encode_to_vec(self, bincode::config::standard())
                    .map_err(|e| FogError::SerializationFailed(e.to_string()))
            }
        }
    }

    /// Decodes and validates a snapshot.
    pub fn decode(bytes: &[u8], format: SnapshotFormat) -> Result<Self, FogError> {
        let snapshot: Self = match format {
            #[cfg(feature = "format-json")]
            SnapshotFormat::Json => serde_json::from_slice(bytes)
                .map_err(|e| FogError::DeserializationFailed(e.to_string()))?,
            #[cfg(feature = "format-bincode")]
            SnapshotFormat::Bincode => {
                let (snapshot, _) =
                    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                        .map_err(|e| FogError::DeserializationFailed(e.to_string()))?;
                snapshot
            }
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}
