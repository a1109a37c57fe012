use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// 未检测到任何章节时，覆盖全部页面的哨兵章节名
pub const COMPLETE_CHAPTER: &str = "Complete";
/// 第一个检测到的章节之前的页面归入的哨兵章节名
pub const PREFACE_CHAPTER: &str = "Preface";

/// 判断章节名是否为保留的哨兵名称
pub fn is_sentinel(title: &str) -> bool {
    title == COMPLETE_CHAPTER || title == PREFACE_CHAPTER
}

/// 单页文本
///
/// 由外部文本提取器生成，页码从 1 开始
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: u32,
    pub text: String,
}

impl Page {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// 标题候选
/// 扫描过程中产生的临时结构，边界确定后即丢弃
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingCandidate {
    pub page_number: u32,
    pub title: String,         // 去除首尾空白，最多 80 个字符
    pub position: usize,       // 在页面文本中的字节偏移
    pub number: Option<u32>,   // 标题中提取出的章节编号
}

/// 章节边界
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterBoundary {
    pub start_page: u32,
    pub title: String,
}

impl From<HeadingCandidate> for ChapterBoundary {
    fn from(candidate: HeadingCandidate) -> Self {
        Self {
            start_page: candidate.page_number,
            title: candidate.title,
        }
    }
}

/// 单个章节及其连续页码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRange {
    pub title: String,
    pub pages: Vec<u32>,
}

/// 章节映射：章节标题 -> 升序页码列表
///
/// 按起始页排序，标题唯一，至少包含一个条目。
/// `Complete` 与 `Preface` 为保留的哨兵名称。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChapterMap {
    entries: Vec<ChapterRange>,
}

impl ChapterMap {
    /// 整本文档作为单一章节
    pub fn complete(pages: Vec<u32>) -> Self {
        Self {
            entries: vec![ChapterRange {
                title: COMPLETE_CHAPTER.to_string(),
                pages,
            }],
        }
    }

    pub(crate) fn from_entries(entries: Vec<ChapterRange>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChapterRange> {
        self.entries.iter()
    }

    /// 按标题查找章节页码
    pub fn get(&self, title: &str) -> Option<&[u32]> {
        self.entries
            .iter()
            .find(|entry| entry.title == title)
            .map(|entry| entry.pages.as_slice())
    }

    /// 所有章节标题（包含哨兵）
    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.title.as_str()).collect()
    }

    /// 是否只检测到了 `Complete` 哨兵
    pub fn is_unstructured(&self) -> bool {
        self.entries.len() == 1 && self.entries[0].title == COMPLETE_CHAPTER
    }

    /// 需要持久化的章节名列表（去除哨兵）
    pub fn chapter_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| !is_sentinel(&entry.title))
            .map(|entry| entry.title.clone())
            .collect()
    }

    /// 页码 -> 章节标题 的反向索引，用于给检索块打标签
    pub fn page_index(&self) -> BTreeMap<u32, String> {
        let mut index = BTreeMap::new();
        for entry in &self.entries {
            for &page in &entry.pages {
                index.insert(page, entry.title.clone());
            }
        }
        index
    }
}

impl Serialize for ChapterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.title, &entry.pages)?;
        }
        map.end()
    }
}
