use super::heading_classifier::{enclosing_line, is_heading, make_title};
use super::pattern_catalog::{parse_number_token, PatternCatalog};
use super::toc_detector::{chapter_hits, extract_ordered_numbers_with_flags, toc_flags};
use super::types::*;
use std::cmp::Reverse;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// 标题必须出现在页面前 1500 个字符之内
pub const HEADING_WINDOW: usize = 1500;
/// 目录至少列出 3 个章节才启用目录驱动路径
pub const MIN_TOC_CHAPTERS: usize = 3;

/// 实际采用的检测路径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionPath {
    /// 路径 A：按目录编号定位章节
    TableOfContents,
    /// 路径 B：主关键词首次出现扫描
    PrimaryScan,
    /// 路径 B：全部关键词首次出现扫描
    FallbackScan,
    /// 未检测到结构
    Unstructured,
}

/// 边界解析器
///
/// 实现两条路径的章节边界识别：
/// 1. 目录驱动：从目录页得到章节编号序列，再逐个定位每章的最佳起始页
/// 2. 首次出现回退：逐页扫描关键词标题，按章节编号去重
/// 3. 都失败时，整本文档作为单一的 `Complete` 章节
pub struct BoundaryResolver {
    primary: &'static PatternCatalog,
    fallback: &'static PatternCatalog,
    heading_window: usize,
    min_toc_chapters: usize,
}

impl BoundaryResolver {
    pub fn new() -> Self {
        Self {
            primary: PatternCatalog::primary(),
            fallback: PatternCatalog::fallback(),
            heading_window: HEADING_WINDOW,
            min_toc_chapters: MIN_TOC_CHAPTERS,
        }
    }

    /// 检测章节并分配页码范围
    ///
    /// 不会失败：没有结构时返回 `{"Complete": 全部页码}`
    pub fn resolve(&self, pages: &[Page]) -> ChapterMap {
        let (path, boundaries) = self.find_boundaries(pages);
        let map = assign_ranges(boundaries, &page_numbers(pages));
        debug!(
            path = ?path,
            pages = pages.len(),
            chapters = map.len(),
            "章节检测完成"
        );
        map
    }

    /// 找出章节边界，同时返回采用的检测路径
    pub fn find_boundaries(&self, pages: &[Page]) -> (DetectionPath, Vec<ChapterBoundary>) {
        if pages.is_empty() {
            return (DetectionPath::Unstructured, Vec::new());
        }

        // 路径 A：目录驱动
        let flags = toc_flags(pages, self.primary);
        let toc_numbers = extract_ordered_numbers_with_flags(pages, &flags);
        debug!(
            toc_pages = flags.iter().filter(|f| **f).count(),
            toc_chapters = toc_numbers.len(),
            "目录页扫描"
        );

        if toc_numbers.len() >= self.min_toc_chapters {
            let boundaries = self.locate_toc_chapters(pages, &flags, &toc_numbers);
            if !boundaries.is_empty() {
                return (DetectionPath::TableOfContents, boundaries);
            }
            debug!("目录中的章节均未定位到，回退到首次出现扫描");
        }

        // 路径 B：首次出现扫描，先主关键词，再全部关键词
        let candidates = self.scan_first_occurrences(pages, self.primary);
        if !candidates.is_empty() {
            return (DetectionPath::PrimaryScan, dedupe_by_number(candidates));
        }

        let candidates = self.scan_first_occurrences(pages, self.fallback);
        if !candidates.is_empty() {
            return (DetectionPath::FallbackScan, dedupe_by_number(candidates));
        }

        (DetectionPath::Unstructured, Vec::new())
    }

    /// 路径 A：为目录中的每个章节编号挑选一个最佳起始位置
    fn locate_toc_chapters(
        &self,
        pages: &[Page],
        flags: &[bool],
        toc_numbers: &[u32],
    ) -> Vec<ChapterBoundary> {
        let hits_per_page: Vec<_> = pages.iter().map(|page| chapter_hits(&page.text)).collect();

        toc_numbers
            .iter()
            .filter_map(|&number| {
                let mut candidates = Vec::new();
                for ((page, hits), &is_toc) in pages.iter().zip(&hits_per_page).zip(flags) {
                    for hit in hits.iter().filter(|hit| hit.number == number) {
                        let (line, token_end) = enclosing_line(&page.text, hit.start, hit.end);
                        if is_heading(line, token_end) {
                            candidates.push((
                                is_toc,
                                HeadingCandidate {
                                    page_number: page.page_number,
                                    title: make_title(line),
                                    position: hit.start,
                                    number: Some(number),
                                },
                            ));
                        }
                    }
                }
                self.best_candidate(candidates)
            })
            .map(ChapterBoundary::from)
            .collect()
    }

    /// 按优先级元组取最小值：
    /// (在目录页上, 位置超出窗口, 位置, 页码倒序)
    fn best_candidate(&self, candidates: Vec<(bool, HeadingCandidate)>) -> Option<HeadingCandidate> {
        candidates
            .into_iter()
            .min_by_key(|(is_toc, c)| {
                (
                    *is_toc,
                    c.position >= self.heading_window,
                    c.position,
                    Reverse(c.page_number),
                )
            })
            .map(|(_, candidate)| candidate)
    }

    /// 路径 B：每个非目录页最多取一个标题
    fn scan_first_occurrences(&self, pages: &[Page], catalog: &PatternCatalog) -> Vec<HeadingCandidate> {
        let flags = toc_flags(pages, catalog);
        pages
            .iter()
            .zip(&flags)
            .filter(|(_, is_toc)| !**is_toc)
            .filter_map(|(page, _)| self.scan_page(page, catalog))
            .collect()
    }

    fn scan_page(&self, page: &Page, catalog: &PatternCatalog) -> Option<HeadingCandidate> {
        for pattern in catalog.heading_patterns() {
            let Some(caps) = pattern.captures(&page.text) else {
                continue;
            };
            let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() >= self.heading_window {
                continue;
            }

            let (line, token_end) = enclosing_line(&page.text, whole.start(), whole.end());
            if is_heading(line, token_end) {
                return Some(HeadingCandidate {
                    page_number: page.page_number,
                    title: make_title(line),
                    position: whole.start(),
                    number: parse_number_token(token.as_str()),
                });
            }
        }
        None
    }
}

impl Default for BoundaryResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// 按章节编号去重
///
/// 编号重复时保留位置更靠前的那次；位置相同且页码更大时改用后者。
/// 没有编号的标题原样保留。结果按起始页排序。
pub fn dedupe_by_number(candidates: Vec<HeadingCandidate>) -> Vec<ChapterBoundary> {
    let mut numbered: BTreeMap<u32, HeadingCandidate> = BTreeMap::new();
    let mut unnumbered = Vec::new();

    for candidate in candidates {
        let Some(number) = candidate.number else {
            unnumbered.push(candidate);
            continue;
        };
        match numbered.entry(number) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
            Entry::Occupied(mut slot) => {
                let kept = slot.get();
                let replace = candidate.position < kept.position
                    || (candidate.position == kept.position && candidate.page_number > kept.page_number);
                if replace {
                    slot.insert(candidate);
                }
            }
        }
    }

    let mut boundaries: Vec<ChapterBoundary> = numbered
        .into_values()
        .chain(unnumbered)
        .map(ChapterBoundary::from)
        .collect();
    boundaries.sort_by_key(|b| b.start_page);
    boundaries
}

/// 根据边界分配页码范围
///
/// 每章范围为 [起始页, 下一章起始页 - 1]，最后一章延伸到末页；
/// 第一章之前的页面归入 `Preface`；没有可用边界时返回 `Complete`。
/// 起始页重复或标题重复的边界被丢弃，其页面并入前一章。
pub fn assign_ranges(boundaries: Vec<ChapterBoundary>, page_numbers: &[u32]) -> ChapterMap {
    let (Some(&first_page), Some(&last_page)) = (page_numbers.first(), page_numbers.last()) else {
        return ChapterMap::complete(Vec::new());
    };

    let mut sorted = boundaries;
    sorted.sort_by_key(|b| b.start_page);

    let mut seen_titles = HashSet::new();
    let mut kept: Vec<ChapterBoundary> = Vec::new();
    for boundary in sorted {
        if boundary.start_page < first_page || boundary.start_page > last_page {
            continue;
        }
        if kept.last().is_some_and(|prev| prev.start_page == boundary.start_page) {
            continue;
        }
        if is_sentinel(&boundary.title) || !seen_titles.insert(boundary.title.clone()) {
            continue;
        }
        kept.push(boundary);
    }

    if kept.is_empty() {
        return ChapterMap::complete(page_numbers.to_vec());
    }

    let pages_between = |start: u32, end: u32| -> Vec<u32> {
        page_numbers
            .iter()
            .copied()
            .filter(|&p| p >= start && p <= end)
            .collect()
    };

    let mut entries = Vec::with_capacity(kept.len() + 1);
    if kept[0].start_page > first_page {
        entries.push(ChapterRange {
            title: PREFACE_CHAPTER.to_string(),
            pages: pages_between(first_page, kept[0].start_page - 1),
        });
    }

    for (i, boundary) in kept.iter().enumerate() {
        let end = kept
            .get(i + 1)
            .map(|next| next.start_page - 1)
            .unwrap_or(last_page);
        let pages = pages_between(boundary.start_page, end);
        if !pages.is_empty() {
            entries.push(ChapterRange {
                title: boundary.title.clone(),
                pages,
            });
        }
    }

    ChapterMap::from_entries(entries)
}

/// 排序去重后的页码
fn page_numbers(pages: &[Page]) -> Vec<u32> {
    let mut numbers: Vec<u32> = pages.iter().map(|p| p.page_number).collect();
    numbers.sort_unstable();
    numbers.dedup();
    numbers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary(start_page: u32, title: &str) -> ChapterBoundary {
        ChapterBoundary {
            start_page,
            title: title.to_string(),
        }
    }

    fn candidate(page_number: u32, title: &str, position: usize, number: Option<u32>) -> HeadingCandidate {
        HeadingCandidate {
            page_number,
            title: title.to_string(),
            position,
            number,
        }
    }

    #[test]
    fn test_assign_ranges_with_preface() {
        let map = assign_ranges(
            vec![boundary(5, "Chapter 2 B"), boundary(3, "Chapter 1 A")],
            &[1, 2, 3, 4, 5, 6],
        );
        assert_eq!(map.titles(), vec!["Preface", "Chapter 1 A", "Chapter 2 B"]);
        assert_eq!(map.get("Preface"), Some(&[1, 2][..]));
        assert_eq!(map.get("Chapter 1 A"), Some(&[3, 4][..]));
        assert_eq!(map.get("Chapter 2 B"), Some(&[5, 6][..]));
    }

    #[test]
    fn test_assign_ranges_without_preface() {
        let map = assign_ranges(vec![boundary(1, "Unit 1"), boundary(2, "Unit 2")], &[1, 2, 3]);
        assert_eq!(map.titles(), vec!["Unit 1", "Unit 2"]);
        assert_eq!(map.get("Unit 2"), Some(&[2, 3][..]));
    }

    #[test]
    fn test_assign_ranges_empty_boundaries() {
        let map = assign_ranges(Vec::new(), &[1, 2]);
        assert!(map.is_unstructured());
        assert_eq!(map.get("Complete"), Some(&[1, 2][..]));

        let map = assign_ranges(vec![boundary(1, "Chapter 1")], &[]);
        assert_eq!(map.get("Complete"), Some(&[][..]));
    }

    #[test]
    fn test_assign_ranges_drops_duplicate_pages_and_titles() {
        let map = assign_ranges(
            vec![
                boundary(2, "Chapter 1"),
                boundary(2, "Chapter 2"),
                boundary(4, "Chapter 1"),
                boundary(5, "Chapter 3"),
            ],
            &[1, 2, 3, 4, 5],
        );
        assert_eq!(map.titles(), vec!["Preface", "Chapter 1", "Chapter 3"]);
        assert_eq!(map.get("Chapter 1"), Some(&[2, 3, 4][..]));
    }

    #[test]
    fn test_dedupe_keeps_smaller_position() {
        let boundaries = dedupe_by_number(vec![
            candidate(3, "Chapter 1 Intro", 40, Some(1)),
            candidate(7, "Chapter 1 Intro", 0, Some(1)),
            candidate(9, "Chapter 2 Next", 0, Some(2)),
        ]);
        assert_eq!(
            boundaries,
            vec![boundary(7, "Chapter 1 Intro"), boundary(9, "Chapter 2 Next")]
        );
    }

    #[test]
    fn test_dedupe_equal_position_prefers_later_page() {
        let boundaries = dedupe_by_number(vec![
            candidate(2, "Chapter 1 A", 0, Some(1)),
            candidate(6, "Chapter 1 A (cont.)", 0, Some(1)),
        ]);
        assert_eq!(boundaries, vec![boundary(6, "Chapter 1 A (cont.)")]);
    }

    #[test]
    fn test_dedupe_keeps_unnumbered_and_sorts_by_page() {
        let boundaries = dedupe_by_number(vec![
            candidate(8, "Chapter 2", 0, Some(2)),
            candidate(4, "Chapter 99999999999", 0, None),
            candidate(1, "Chapter 1", 0, Some(1)),
        ]);
        let pages: Vec<u32> = boundaries.iter().map(|b| b.start_page).collect();
        assert_eq!(pages, vec![1, 4, 8]);
    }

    #[test]
    fn test_best_candidate_priority() {
        let resolver = BoundaryResolver::new();
        let best = resolver
            .best_candidate(vec![
                (true, candidate(2, "Chapter 1 toc", 10, Some(1))),
                (false, candidate(9, "Chapter 1 late", 2000, Some(1))),
                (false, candidate(5, "Chapter 1 body", 300, Some(1))),
                (false, candidate(4, "Chapter 1 header", 0, Some(1))),
                (false, candidate(6, "Chapter 1 header", 0, Some(1))),
            ])
            .unwrap();
        // 位置相同则取页码更大的
        assert_eq!(best.page_number, 6);
    }

    #[test]
    fn test_best_candidate_prefers_window_over_toc() {
        let resolver = BoundaryResolver::new();
        let best = resolver
            .best_candidate(vec![
                (true, candidate(2, "Chapter 3 toc", 0, Some(3))),
                (false, candidate(12, "Chapter 3 deep", 1800, Some(3))),
            ])
            .unwrap();
        assert_eq!(best.page_number, 12);
    }

    #[test]
    fn test_scan_page_respects_window() {
        let resolver = BoundaryResolver::new();
        let late = format!("{}\nChapter 4 Late Heading", "x".repeat(1600));
        assert!(resolver
            .scan_page(&Page::new(1, late), PatternCatalog::primary())
            .is_none());

        let early = "Chapter 4 Early Heading\nbody";
        let found = resolver
            .scan_page(&Page::new(2, early), PatternCatalog::primary())
            .unwrap();
        assert_eq!(found.title, "Chapter 4 Early Heading");
        assert_eq!(found.number, Some(4));
        assert_eq!(found.position, 0);
    }

    #[test]
    fn test_scan_page_tries_next_pattern_after_rejection() {
        let resolver = BoundaryResolver::new();
        let text = "Chapter 2 describes the method\nPart Three: Results";
        let found = resolver
            .scan_page(&Page::new(1, text), PatternCatalog::primary())
            .unwrap();
        assert_eq!(found.title, "Part Three: Results");
        assert_eq!(found.number, Some(3));
    }

    #[test]
    fn test_find_boundaries_empty_pages() {
        let resolver = BoundaryResolver::new();
        let (path, boundaries) = resolver.find_boundaries(&[]);
        assert_eq!(path, DetectionPath::Unstructured);
        assert!(boundaries.is_empty());
    }
}
