use super::*;
use std::fs;
use tracing::{debug, warn};

/// 默认最少可提取字符数
pub const DEFAULT_MIN_TEXT_CHARS: usize = 100;

/// PDF 解析器
///
/// 逐页提取纯文本，不支持扫描版 PDF
#[derive(Clone)]
pub struct PdfParser {
    min_text_chars: usize,
}

impl PdfParser {
    /// 创建新的 PDF 解析器实例
    pub fn new() -> Self {
        Self::with_min_text_chars(DEFAULT_MIN_TEXT_CHARS)
    }

    pub fn with_min_text_chars(min_text_chars: usize) -> Self {
        Self { min_text_chars }
    }

    /// 从内存中的 PDF 字节提取逐页文本
    ///
    /// # 参数
    /// - `bytes`: PDF 文件字节
    ///
    /// # 返回
    /// 页码从 1 开始的文档；可提取文本过少时返回 `InsufficientText`
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedDocument> {
        let texts = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| ReaderError::PdfExtraction(e.to_string()))?;

        debug!(pages = texts.len(), "PDF 文本提取完成");

        let document = ParsedDocument::from_page_texts(texts, bytes);
        let chars = document.text_chars();
        if chars < self.min_text_chars {
            warn!(chars, pages = document.total_pages(), "PDF 可提取文本过少，可能是扫描版或加密文件");
        }
        document.ensure_min_text(self.min_text_chars)
    }
}

impl Parser for PdfParser {
    fn parse(&self, file_path: &Path) -> Result<ParsedDocument> {
        // 读取文件字节
        let bytes = fs::read(file_path)?;
        self.parse_bytes(&bytes)
    }

    fn supported_extensions(&self) -> Vec<&str> {
        vec!["pdf"]
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_parser_creation() {
        let parser = PdfParser::new();
        assert_eq!(parser.min_text_chars, DEFAULT_MIN_TEXT_CHARS);
        assert_eq!(parser.supported_extensions(), vec!["pdf"]);
    }

    #[test]
    fn test_invalid_pdf_bytes() {
        let parser = PdfParser::new();
        let result = parser.parse_bytes(b"definitely not a pdf");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let parser = PdfParser::new();
        let result = parser.parse(Path::new("/nonexistent/lecture.pdf"));
        assert!(matches!(result, Err(ReaderError::Io(_))));
    }
}
