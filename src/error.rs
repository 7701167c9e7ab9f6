/// 迷雾错误
/// Fog of war error
///
/// Only configuration loading and snapshot encoding report errors. The
/// visibility computation itself is total and never fails.
#[derive(Debug, Clone, PartialEq)]
pub enum FogError {
    /// 无效的设置
    /// Invalid settings
    InvalidSettings(String),
    /// 序列化失败
    /// Serialization failed
    SerializationFailed(String),
    /// 反序列化失败
    /// Deserialization failed
    DeserializationFailed(String),
    /// 快照分辨率与数据长度不匹配
    /// Snapshot resolution does not match its data length
    ResolutionMismatch { expected: usize, found: usize },
}

impl std::fmt::Display for FogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FogError::InvalidSettings(msg) => write!(f, "Invalid settings: {msg}"),
            FogError::SerializationFailed(msg) => {
                write!(f, "Serialization failed: {msg}")
            }
            FogError::DeserializationFailed(msg) => {
                write!(f, "Deserialization failed: {msg}")
            }
            FogError::ResolutionMismatch { expected, found } => {
                write!(
                    f,
                    "Resolution mismatch: expected {expected} cells, found {found}"
                )
            }
        }
    }
}

impl std::error::Error for FogError {}
