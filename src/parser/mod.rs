use crate::error::{ReaderError, Result};
use crate::segmentation::Page;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;

// 子模块声明
pub mod pdf_parser;
pub mod txt_parser;

/// 解析后的文档
///
/// 逐页纯文本，页码从 1 开始，外加源文件的 SHA-256
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    /// 按页码排列的页面
    pub pages: Vec<Page>,
    /// 源文件字节的 SHA-256（十六进制）
    pub content_hash: String,
}

impl ParsedDocument {
    /// 由逐页文本构建文档，页码依次编为 1..=N
    ///
    /// # 参数
    /// - `texts`: 每页的文本
    /// - `source`: 源文件字节，用于计算哈希
    pub fn from_page_texts(texts: Vec<String>, source: &[u8]) -> Self {
        let pages = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Page::new(i as u32 + 1, text))
            .collect();

        Self {
            pages,
            content_hash: content_hash(source),
        }
    }

    /// 页数
    pub fn total_pages(&self) -> u32 {
        self.pages.len() as u32
    }

    /// 去掉首尾空白后的字符总数
    pub fn text_chars(&self) -> usize {
        self.pages
            .iter()
            .map(|page| page.text.trim().chars().count())
            .sum()
    }

    /// 文本过少时返回 `InsufficientText`
    pub fn ensure_min_text(self, min_chars: usize) -> Result<Self> {
        let chars = self.text_chars();
        if chars < min_chars {
            return Err(ReaderError::InsufficientText { chars });
        }
        Ok(self)
    }
}

/// 计算字节数据的 SHA-256
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Parser trait
///
/// 所有格式解析器必须实现此 trait
pub trait Parser: Send + Sync {
    /// 解析文件
    ///
    /// # 参数
    /// - `file_path`: 要解析的文件路径
    ///
    /// # 返回
    /// 逐页文本和内容哈希
    fn parse(&self, file_path: &Path) -> Result<ParsedDocument>;

    /// 获取支持的文件扩展名列表
    fn supported_extensions(&self) -> Vec<&str>;
}

/// Parser 路由器
///
/// 根据文件扩展名路由到对应的解析器
pub struct ParserRouter {
    /// 扩展名到解析器的映射
    parsers: HashMap<String, Box<dyn Parser>>,
}

impl ParserRouter {
    /// 创建新的路由器实例，使用默认的最少文本阈值
    pub fn new() -> Self {
        Self::with_min_text_chars(pdf_parser::DEFAULT_MIN_TEXT_CHARS)
    }

    /// 创建路由器并注册所有可用的解析器
    ///
    /// # 参数
    /// - `min_text_chars`: PDF 可提取文本的最少字符数
    pub fn with_min_text_chars(min_text_chars: usize) -> Self {
        let mut parsers: HashMap<String, Box<dyn Parser>> = HashMap::new();

        // 注册 PDF 解析器
        let pdf = Box::new(pdf_parser::PdfParser::with_min_text_chars(min_text_chars));
        for ext in pdf.supported_extensions() {
            parsers.insert(ext.to_string(), pdf.clone());
        }

        // 注册 TXT 解析器
        let txt = Box::new(txt_parser::TxtParser::new());
        for ext in txt.supported_extensions() {
            parsers.insert(ext.to_string(), txt.clone());
        }

        Self { parsers }
    }

    /// 根据文件路径路由到对应的解析器
    ///
    /// # 参数
    /// - `file_path`: 文件路径
    ///
    /// # 返回
    /// 对应的解析器引用，如果不支持该格式则返回错误
    pub fn route(&self, file_path: &Path) -> Result<&dyn Parser> {
        let ext = file_path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ReaderError::UnsupportedFormat("无法识别文件扩展名".to_string()))?
            .to_lowercase();

        self.parsers
            .get(&ext)
            .map(|p| p.as_ref())
            .ok_or(ReaderError::UnsupportedFormat(ext))
    }

    /// 路由并解析
    pub fn parse(&self, file_path: &Path) -> Result<ParsedDocument> {
        self.route(file_path)?.parse(file_path)
    }

    /// 获取所有支持的文件扩展名
    pub fn supported_extensions(&self) -> Vec<String> {
        self.parsers.keys().cloned().collect()
    }

    /// 检查是否支持指定的文件扩展名
    pub fn supports(&self, extension: &str) -> bool {
        self.parsers.contains_key(&extension.to_lowercase())
    }
}

impl Default for ParserRouter {
    fn default() -> Self {
        Self::new()
    }
}
