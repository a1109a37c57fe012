use super::pattern_catalog::PatternCatalog;
use super::types::Page;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// 目录页最少的关键词命中次数
pub const TOC_MIN_MATCHES: usize = 4;

/// 不锚定行首的 "chapter 数字"，用于目录编号提取和按编号定位章节
static CHAPTER_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bchapter\s*[#:.\-–—]?\s*(\d+)\b").expect("chapter number pattern")
});

/// 页面中一次 "chapter N" 命中
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterHit {
    pub number: u32,
    pub start: usize,
    pub end: usize,
}

/// 判断页面是否为目录页
///
/// 正文页最多偶尔提到一两次章节，目录页会在短距离内列出很多章节
pub fn is_toc_page(text: &str, catalog: &PatternCatalog) -> bool {
    catalog.count_matches(text) >= TOC_MIN_MATCHES
}

/// 为每一页计算目录页标记，顺序与 `pages` 一致
pub fn toc_flags(pages: &[Page], catalog: &PatternCatalog) -> Vec<bool> {
    pages
        .iter()
        .map(|page| is_toc_page(&page.text, catalog))
        .collect()
}

/// 找出页面中所有 "chapter N" 出现的位置
pub fn chapter_hits(text: &str) -> Vec<ChapterHit> {
    CHAPTER_NUMBER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?.as_str().parse().ok()?;
            Some(ChapterHit {
                number,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// 从目录页中提取有序的章节编号
///
/// 只扫描被标记为目录页的页面；按 (页码, 位置) 排序后去重，保留首次出现的顺序。
/// 该序列被视为"存在哪些章节、顺序如何"的依据，但不代表章节的起始位置。
pub fn extract_ordered_numbers(pages: &[Page]) -> Vec<u32> {
    let flags = toc_flags(pages, PatternCatalog::primary());
    extract_ordered_numbers_with_flags(pages, &flags)
}

pub(crate) fn extract_ordered_numbers_with_flags(pages: &[Page], flags: &[bool]) -> Vec<u32> {
    let mut hits: Vec<(u32, u32, usize)> = pages
        .iter()
        .zip(flags)
        .filter(|(_, is_toc)| **is_toc)
        .flat_map(|(page, _)| {
            chapter_hits(&page.text)
                .into_iter()
                .map(move |hit| (hit.number, page.page_number, hit.start))
        })
        .collect();

    hits.sort_by_key(|&(_, page, position)| (page, position));

    let mut seen = HashSet::new();
    hits.into_iter()
        .map(|(number, _, _)| number)
        .filter(|number| seen.insert(*number))
        .collect()
}
