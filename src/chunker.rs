// 检索块切分
// 按页切分固定长度、带重叠的文本窗口，每块标注所属章节

use crate::segmentation::{ChapterMap, Page, COMPLETE_CHAPTER};
use serde::{Deserialize, Serialize};

/// 检索块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// 在整个文档中的序号，从 0 开始
    pub index: usize,
    pub page_number: u32,
    /// 所属章节名
    pub chapter: String,
    pub text: String,
}

/// 固定窗口切分器
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// 创建切分器
    ///
    /// # 参数
    /// - `chunk_size`: 窗口长度（字符），必须大于 0
    /// - `chunk_overlap`: 相邻窗口重叠长度，必须小于 `chunk_size`
    ///
    /// 参数由 `Settings::validate` 保证合法
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// 切分单页文本
    fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut windows = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            if !window.trim().is_empty() {
                windows.push(window);
            }
            if end == chars.len() {
                break;
            }
            start += self.step();
        }

        windows
    }

    /// 切分整份文档
    ///
    /// # 参数
    /// - `pages`: 逐页文本
    /// - `chapters`: 章节映射，用于给每块标注章节
    ///
    /// # 返回
    /// 按页码顺序排列的检索块
    pub fn chunk_document(&self, pages: &[Page], chapters: &ChapterMap) -> Vec<Chunk> {
        let page_index = chapters.page_index();
        let mut chunks = Vec::new();

        for page in pages {
            let chapter = page_index
                .get(&page.page_number)
                .cloned()
                .unwrap_or_else(|| COMPLETE_CHAPTER.to_string());

            for text in self.split_text(&page.text) {
                chunks.push(Chunk {
                    index: chunks.len(),
                    page_number: page.page_number,
                    chapter: chapter.clone(),
                    text,
                });
            }
        }

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(700, 100)
    }
}
