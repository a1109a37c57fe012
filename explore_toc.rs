/// 探索文档的目录页与章节检测过程
///
/// 逐页打印目录页标记和关键词命中数，再打印目录中提取的章节编号和最终的检测结果

use std::path::PathBuf;
use study_reader::parser::ParserRouter;
use study_reader::segmentation::toc_detector::{extract_ordered_numbers, toc_flags};
use study_reader::segmentation::{BoundaryResolver, PatternCatalog};

fn main() {
    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        eprintln!("用法: explore_toc <file.pdf|file.txt>");
        std::process::exit(2);
    };

    println!("正在解析文件: {:?}\n", path);

    let document = match ParserRouter::new().parse(&path) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("错误: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ 共 {} 页，SHA-256 {}\n", document.total_pages(), document.content_hash);

    // 1. 每页的目录页标记
    let primary = PatternCatalog::primary();
    let fallback = PatternCatalog::fallback();
    let primary_flags = toc_flags(&document.pages, primary);
    let fallback_flags = toc_flags(&document.pages, fallback);

    println!("=== 逐页关键词命中 ===");
    println!("{:>5}  {:>7}  {:>8}  {:>5}  首行", "页码", "primary", "fallback", "TOC");
    for (i, page) in document.pages.iter().enumerate() {
        let first_line: String = page
            .text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
            .chars()
            .take(50)
            .collect();
        let flag = match (primary_flags[i], fallback_flags[i]) {
            (true, _) => "P",
            (false, true) => "F",
            _ => "",
        };
        println!(
            "{:>5}  {:>7}  {:>8}  {:>5}  {}",
            page.page_number,
            primary.count_matches(&page.text),
            fallback.count_matches(&page.text),
            flag,
            first_line
        );
    }
    println!();

    // 2. 目录中的章节编号
    println!("=== 目录章节编号 ===");
    let numbers = extract_ordered_numbers(&document.pages);
    println!("{:?}\n", numbers);

    // 3. 检测结果
    let resolver = BoundaryResolver::new();
    let (detection, boundaries) = resolver.find_boundaries(&document.pages);
    println!("=== 检测路径: {:?} ===", detection);
    for boundary in &boundaries {
        println!("  p.{:<5} {}", boundary.start_page, boundary.title);
    }
    println!();

    println!("=== 章节映射 ===");
    for entry in resolver.resolve(&document.pages).iter() {
        let first = entry.pages.first().copied().unwrap_or(0);
        let last = entry.pages.last().copied().unwrap_or(0);
        println!("  {:<50} {}-{} ({} 页)", entry.title, first, last, entry.pages.len());
    }
}
