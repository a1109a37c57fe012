// 文档结构切分模块
// 从逐页纯文本中识别章节结构，并把用户输入的章节引用解析回检测到的章节名

pub mod types;
pub mod pattern_catalog;
pub mod heading_classifier;
pub mod toc_detector;
pub mod boundary_resolver;
pub mod chapter_resolver;

#[cfg(test)]
mod integration_tests;

// 重新导出主要类型
pub use types::*;
pub use pattern_catalog::PatternCatalog;
pub use boundary_resolver::{BoundaryResolver, DetectionPath};
pub use chapter_resolver::{resolve_chapter, ChapterMatch, MatchStage};

/// 检测文档的章节结构
///
/// 纯函数：相同的页面输入总是得到相同的 `ChapterMap`
pub fn detect_chapters(pages: &[Page]) -> ChapterMap {
    BoundaryResolver::new().resolve(pages)
}
