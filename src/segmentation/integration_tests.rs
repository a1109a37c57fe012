// 集成测试：测试完整的章节检测与章节名解析流程

use crate::segmentation::*;
use std::collections::BTreeSet;

fn pages(texts: &[&str]) -> Vec<Page> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| Page::new(i as u32 + 1, *text))
        .collect()
}

/// 覆盖性：所有章节页码的并集恰好是 1..=N，且没有重叠
fn assert_full_coverage(map: &ChapterMap, total: u32) {
    let mut seen = BTreeSet::new();
    for entry in map.iter() {
        for &page in &entry.pages {
            assert!(seen.insert(page), "page {} assigned twice", page);
        }
    }
    assert_eq!(seen, (1..=total).collect::<BTreeSet<_>>());
}

/// 起始页严格递增，每章页码连续
fn assert_monotonic(map: &ChapterMap) {
    let starts: Vec<u32> = map.iter().map(|entry| entry.pages[0]).collect();
    assert!(starts.windows(2).all(|w| w[0] < w[1]), "starts: {:?}", starts);
    for entry in map.iter() {
        assert!(entry.pages.windows(2).all(|w| w[1] == w[0] + 1));
    }
}

fn textbook() -> Vec<Page> {
    pages(&[
        "Introductory Physical Science\nSecond Edition",
        "Contents\nChapter 1 Matter ........ 3\nChapter 2 Energy ........ 5\nChapter 3 Waves ........ 7\nChapter 4 Light ........ 8\nChapter 5 Sound ........ 9",
        "Chapter 1 Matter\nEverything around us is made of matter.",
        "Matter has mass. As Chapter 2 shows, the energy that matter stores can be released.",
        "Chapter 2 Energy\nEnergy is the ability to do work.",
        "Kinetic and potential energy are the two main forms.",
        "Chapter 3 Waves\nA wave transfers energy.",
        "Chapter 4 Light\nLight is an electromagnetic wave.",
        "Chapter 5 Sound\nSound is a mechanical wave.",
        "Index\nAtoms, 3\nWaves, 7",
    ])
}

#[test]
fn test_textbook_with_table_of_contents() {
    let book = textbook();
    let (path, _) = BoundaryResolver::new().find_boundaries(&book);
    assert_eq!(path, DetectionPath::TableOfContents);

    let map = detect_chapters(&book);
    assert_eq!(
        map.titles(),
        vec![
            "Preface",
            "Chapter 1 Matter",
            "Chapter 2 Energy",
            "Chapter 3 Waves",
            "Chapter 4 Light",
            "Chapter 5 Sound",
        ]
    );
    assert_eq!(map.get("Preface"), Some(&[1, 2][..]));
    assert_eq!(map.get("Chapter 1 Matter"), Some(&[3, 4][..]));
    assert_eq!(map.get("Chapter 2 Energy"), Some(&[5, 6][..]));
    assert_eq!(map.get("Chapter 5 Sound"), Some(&[9, 10][..]));

    assert_full_coverage(&map, 10);
    assert_monotonic(&map);
}

#[test]
fn test_wrapped_chapter_headings_keep_their_numbers() {
    let book = pages(&[
        "Contents\nChapter 1 Matter 2\nChapter 2 Energy 3\nChapter 3 Waves 4\nChapter 4 Light 5",
        "CHAPTER\n1\nMatter",
        "CHAPTER\n2\nEnergy",
        "CHAPTER\n3\nWaves",
        "CHAPTER\n4\nLight",
    ]);
    let (path, _) = BoundaryResolver::new().find_boundaries(&book);
    assert_eq!(path, DetectionPath::TableOfContents);

    let map = detect_chapters(&book);
    assert_eq!(
        map.titles(),
        vec!["Preface", "CHAPTER 1", "CHAPTER 2", "CHAPTER 3", "CHAPTER 4"]
    );
    assert_eq!(map.get("CHAPTER 1"), Some(&[2][..]));
    assert_eq!(map.get("CHAPTER 4"), Some(&[5][..]));
    assert_full_coverage(&map, 5);
    assert_monotonic(&map);
}

#[test]
fn test_detection_is_deterministic() {
    let book = textbook();
    let first = detect_chapters(&book);
    for _ in 0..5 {
        assert_eq!(detect_chapters(&book), first);
    }
}

#[test]
fn test_no_keywords_returns_complete_sentinel() {
    let doc = pages(&["Once upon a time.", "The middle.", "The end."]);
    let map = detect_chapters(&doc);
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("Complete"), Some(&[1, 2, 3][..]));
    assert!(map.chapter_names().is_empty());
}

#[test]
fn test_empty_document() {
    let map = detect_chapters(&[]);
    assert_eq!(map.titles(), vec!["Complete"]);
    assert_eq!(map.get("Complete"), Some(&[][..]));
}

#[test]
fn test_prose_line_is_not_a_boundary() {
    let doc = pages(&[
        "Chapter 1 Basics\nReactions convert reactants into products.",
        "Chapter 2 Rates\nRates depend on temperature.",
        "Chapter 3 that the reaction does not proceed without a catalyst",
        "Chapter 4 Equilibrium\nForward and reverse rates balance.",
    ]);
    let map = detect_chapters(&doc);

    assert!(map.iter().all(|entry| entry.pages[0] != 3));
    assert_eq!(map.get("Chapter 2 Rates"), Some(&[2, 3][..]));
    assert_full_coverage(&map, 4);
}

#[test]
fn test_toc_page_excluded_from_first_occurrence_scan() {
    let doc = pages(&[
        "Course Outline\nUnit 1 Cells … Unit 2 Tissues … Unit 3 Organs … Unit 4 Systems",
        "Unit 1 Cells\nThe cell is the basic unit of life.",
        "Membranes and organelles.",
        "Unit 2 Tissues\nGroups of similar cells.",
    ]);
    let (path, boundaries) = BoundaryResolver::new().find_boundaries(&doc);
    assert_eq!(path, DetectionPath::PrimaryScan);
    assert!(boundaries.iter().all(|b| b.start_page != 1));

    let map = detect_chapters(&doc);
    assert_eq!(map.titles(), vec!["Preface", "Unit 1 Cells", "Unit 2 Tissues"]);
    assert_eq!(map.get("Preface"), Some(&[1][..]));
    assert_eq!(map.get("Unit 1 Cells"), Some(&[2, 3][..]));
    assert_full_coverage(&map, 4);
}

#[test]
fn test_dense_toc_never_selected_when_body_heading_exists() {
    let doc = pages(&[
        "Chapter 1 … Chapter 2 … Chapter 3 … Chapter 4",
        "Chapter 1 Origins\ntext",
        "Chapter 2 Growth\ntext",
        "Chapter 3 Decline\ntext",
        "Chapter 4 Legacy\ntext",
    ]);
    let map = detect_chapters(&doc);
    assert_eq!(map.get("Chapter 1 Origins"), Some(&[2][..]));
    assert_eq!(map.get("Preface"), Some(&[1][..]));
    assert_eq!(map.len(), 5);
}

#[test]
fn test_lecture_slides_use_fallback_catalog() {
    let doc = pages(&[
        "Lecture 1: Intro to OS\nWhat an operating system provides.",
        "Kernel mode and user mode.",
        "Lecture 2: Processes\nAddress spaces and scheduling.",
    ]);
    let (path, _) = BoundaryResolver::new().find_boundaries(&doc);
    assert_eq!(path, DetectionPath::FallbackScan);

    let map = detect_chapters(&doc);
    assert_eq!(map.get("Lecture 1: Intro to OS"), Some(&[1, 2][..]));
    assert_eq!(map.get("Lecture 2: Processes"), Some(&[3][..]));

    let names = map.chapter_names();
    let found = resolve_chapter("lecture 2", &names).unwrap();
    assert_eq!(found.name, "Lecture 2: Processes");
}

#[test]
fn test_rejected_toc_entries_fall_back_to_scan() {
    // 目录行以小写延续，全部被分类器拒绝，路径 A 放弃
    let doc = pages(&[
        "chapter 1 introduction 2\nchapter 2 method 3\nchapter 3 results 4\nchapter 4 outlook 4",
        "PART ONE\nThe Beginning",
        "More of the beginning.",
        "PART TWO\nThe End",
    ]);
    let (path, _) = BoundaryResolver::new().find_boundaries(&doc);
    assert_eq!(path, DetectionPath::PrimaryScan);

    let map = detect_chapters(&doc);
    assert_eq!(map.titles(), vec!["Preface", "PART ONE", "PART TWO"]);
    assert_eq!(map.get("PART ONE"), Some(&[2, 3][..]));
    assert_monotonic(&map);
}

#[test]
fn test_repeated_heading_deduplicated_by_number() {
    let doc = pages(&[
        "Chapter 1 Start\nbody",
        "Notes on the start\nChapter 1 Start",
        "Chapter 2 Middle\nbody",
    ]);
    let map = detect_chapters(&doc);
    assert_eq!(map.titles(), vec!["Chapter 1 Start", "Chapter 2 Middle"]);
    assert_eq!(map.get("Chapter 1 Start"), Some(&[1, 2][..]));
}

#[test]
fn test_page_index_tags_every_page() {
    let map = detect_chapters(&textbook());
    let index = map.page_index();
    assert_eq!(index.len(), 10);
    assert_eq!(index[&2], "Preface");
    assert_eq!(index[&6], "Chapter 2 Energy");
}
