// ==========================================
// 料箱仓储仿真系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::config::ConfigError;
use crate::importer::ImportError;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("仓储错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("导入错误: {0}")]
    Import(#[from] ImportError),

    /// 输入校验错误已累积, 拒绝进入计算
    #[error("输入校验失败, 共 {} 条错误", .0.len())]
    InputRejected(Vec<String>),

    #[error("参数非法: {0}")]
    InvalidParameter(String),

    #[error("一致性检查失败: {0}")]
    Inconsistent(String),

    #[error("导出失败: {0}")]
    Export(String),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Export(err.to_string())
    }
}

impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        EngineError::Export(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Export(err.to_string())
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
