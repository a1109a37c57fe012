use crate::error::{ReaderError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 运行配置
///
/// 可以从 TOML 文件加载，缺失的字段使用默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite 文档库路径
    pub database_path: PathBuf,
    /// 检索块长度（字符）
    pub chunk_size: usize,
    /// 相邻检索块的重叠长度（字符）
    pub chunk_overlap: usize,
    /// 少于该字符数的文档视为无法提取文本
    pub min_text_chars: usize,
    /// 导入队列的最大并发数
    pub max_concurrent_ingests: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("library.db"),
            chunk_size: 700,
            chunk_overlap: 100,
            min_text_chars: 100,
            max_concurrent_ingests: 3,
        }
    }
}

impl Settings {
    /// 从 TOML 文件加载配置并校验
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// 有配置文件则加载，否则使用默认值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ReaderError::InvalidConfig("chunk_size 必须大于 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ReaderError::InvalidConfig(format!(
                "chunk_overlap ({}) 必须小于 chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.max_concurrent_ingests == 0 {
            return Err(ReaderError::InvalidConfig(
                "max_concurrent_ingests 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }
}
