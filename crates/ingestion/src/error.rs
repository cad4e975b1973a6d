//! Ingestion 错误类型

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 回放文件读取失败
    #[error("failed to read replay file {}: {source}", path.display())]
    ReadFailed {
        /// 文件路径
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 回放文件中没有可用记录
    #[error("replay {name} contains no valid records")]
    EmptyReplay {
        /// 来源名称
        name: String,
    },

    /// 事件解析失败
    #[error(transparent)]
    Parse(#[from] ContractError),

    /// 参数非法
    #[error("invalid source parameter '{field}': {message}")]
    InvalidParameter {
        /// 字段名
        field: String,
        /// 错误消息
        message: String,
    },

    /// 来源已在运行
    #[error("source {name} is already running")]
    AlreadyRunning {
        /// 来源名称
        name: String,
    },
}

impl IngestionError {
    pub fn invalid_parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
