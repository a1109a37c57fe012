use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("配置文件解析失败: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("配置无效: {0}")]
    InvalidConfig(String),
    #[error("不支持的文件格式: {0}")]
    UnsupportedFormat(String),
    #[error("PDF 解析失败: {0}")]
    PdfExtraction(String),
    #[error("文本内容不足（{chars} 个字符），可能是扫描版或加密的 PDF")]
    InsufficientText { chars: usize },
    #[error("名称 '{0}' 已存在")]
    DuplicateName(String),
    #[error("找不到文档 '{0}'")]
    DocumentNotFound(String),
    #[error("找不到章节 '{query}'，可用章节: {available:?}")]
    ChapterNotFound { query: String, available: Vec<String> },
    #[error("页码必须在 1 到 {total_pages} 之间，收到 {page}")]
    InvalidPage { page: u32, total_pages: u32 },
    #[error("导入队列错误: {0}")]
    Queue(String),
}

pub type Result<T> = std::result::Result<T, ReaderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_not_found_lists_available() {
        let err = ReaderError::ChapterNotFound {
            query: "lecture 9".to_string(),
            available: vec!["Lecture 1".to_string(), "Lecture 2".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("lecture 9"));
        assert!(message.contains("Lecture 2"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ReaderError = io.into();
        assert!(matches!(err, ReaderError::Io(_)));
    }
}
