// 学习资料库：PDF 章节切分、章节引用解析与文档库

pub mod chunker;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod ingest_queue;
pub mod library;
pub mod parser;
pub mod segmentation;

pub use config::Settings;
pub use error::{ReaderError, Result};
pub use segmentation::{detect_chapters, resolve_chapter, ChapterMap, Page};
