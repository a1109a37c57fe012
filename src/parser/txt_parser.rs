use super::*;
use encoding_rs::*;
use std::fs;
use tracing::warn;

/// 分页符
const PAGE_BREAK: char = '\x0c';

/// TXT 解析器
///
/// 用于纯文本导出的讲义。自动检测编码（UTF-8, GBK 等），按分页符切分页面
#[derive(Clone)]
pub struct TxtParser;

impl TxtParser {
    /// 创建新的 TXT 解析器实例
    pub fn new() -> Self {
        Self
    }

    /// 检测文件编码
    ///
    /// # 参数
    /// - `bytes`: 文件字节数据
    ///
    /// # 返回
    /// 检测到的编码
    fn detect_encoding(&self, bytes: &[u8]) -> &'static Encoding {
        // 1. 检查 BOM
        if let Some((encoding, _bom_length)) = Encoding::for_bom(bytes) {
            return encoding;
        }

        // 2. 尝试 UTF-8 解码
        if std::str::from_utf8(bytes).is_ok() {
            return UTF_8;
        }

        // 3. 检测是否为 GBK
        if self.looks_like_gbk(bytes) {
            return GBK;
        }

        UTF_8
    }

    /// 检测字节序列是否像 GBK 编码
    ///
    /// 第一字节 0x81-0xFE，第二字节 0x40-0xFE
    fn looks_like_gbk(&self, bytes: &[u8]) -> bool {
        let mut gbk_pairs = 0;
        let mut total_pairs = 0;

        let mut i = 0;
        while i < bytes.len().saturating_sub(1) {
            let b1 = bytes[i];
            let b2 = bytes[i + 1];

            if b1 < 0x80 {
                i += 1;
                continue;
            }

            total_pairs += 1;

            if (0x81..=0xFE).contains(&b1) && (0x40..=0xFE).contains(&b2) {
                gbk_pairs += 1;
                i += 2;
            } else {
                i += 1;
            }
        }

        // 超过一半的非 ASCII 字节对符合 GBK 规则
        total_pairs > 0 && (gbk_pairs as f32 / total_pairs as f32) > 0.5
    }

    /// 按分页符切分页面
    ///
    /// 没有分页符时整份文本是一页；末尾分页符后的空白不算新页
    fn split_pages(&self, content: &str) -> Vec<String> {
        let mut pages: Vec<String> = content.split(PAGE_BREAK).map(str::to_string).collect();
        while pages.len() > 1 && pages.last().is_some_and(|page| page.trim().is_empty()) {
            pages.pop();
        }
        pages
    }

    /// 解码并切分内存中的文本
    pub fn parse_bytes(&self, bytes: &[u8]) -> ParsedDocument {
        let encoding = self.detect_encoding(bytes);
        let (content, _encoding_used, had_errors) = encoding.decode(bytes);
        if had_errors {
            warn!(encoding = encoding.name(), "文件解码时出现错误，可能存在乱码");
        }

        ParsedDocument::from_page_texts(self.split_pages(&content), bytes)
    }
}

impl Parser for TxtParser {
    fn parse(&self, file_path: &Path) -> Result<ParsedDocument> {
        let bytes = fs::read(file_path)?;
        Ok(self.parse_bytes(&bytes))
    }

    fn supported_extensions(&self) -> Vec<&str> {
        vec!["txt"]
    }
}

impl Default for TxtParser {
    fn default() -> Self {
        Self::new()
    }
}
