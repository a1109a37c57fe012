//! 文档导入模块
//!
//! 解析 → 章节检测 → 切分检索块 → 写入文档库

use crate::chunker::Chunker;
use crate::config::Settings;
use crate::db;
use crate::error::{ReaderError, Result};
use crate::ingest_queue::{IngestQueue, IngestStatus, IngestTask};
use crate::library::{self, NewDocument};
use crate::parser::ParserRouter;
use crate::segmentation::BoundaryResolver;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 导入请求
#[derive(Debug, Clone, PartialEq)]
pub struct IngestRequest {
    pub path: PathBuf,
    /// 文档在库中的唯一名称
    pub name: String,
    pub uploaded_by: String,
}

/// 导入结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub name: String,
    pub pages: u32,
    /// 检测到的章节数（不含哨兵）
    pub chapters_found: usize,
    pub chunks: usize,
    pub chapters: Vec<String>,
}

/// 导入单个文件
///
/// # 参数
/// - `conn`: 文档库连接
/// - `settings`: 运行配置
/// - `request`: 导入请求
///
/// # 返回
/// 导入结果；名称重复时在解析之前就返回 `DuplicateName`
pub fn ingest_file(
    conn: &mut Connection,
    settings: &Settings,
    request: &IngestRequest,
) -> Result<IngestReport> {
    ingest_with_progress(conn, settings, request, |_, _| {})
}

/// 导入单个文件，并在每个阶段开始时回调进度
pub fn ingest_with_progress<F>(
    conn: &mut Connection,
    settings: &Settings,
    request: &IngestRequest,
    mut on_progress: F,
) -> Result<IngestReport>
where
    F: FnMut(IngestStatus, f32),
{
    if library::name_exists(conn, &request.name)? {
        return Err(ReaderError::DuplicateName(request.name.clone()));
    }

    // 1. 提取逐页文本
    on_progress(IngestStatus::Parsing, 0.1);
    let router = ParserRouter::with_min_text_chars(settings.min_text_chars);
    let document = router.parse(&request.path)?;
    info!(name = %request.name, pages = document.total_pages(), "文本提取完成");

    // 2. 检测章节
    on_progress(IngestStatus::Segmenting, 0.4);
    let chapters = BoundaryResolver::new().resolve(&document.pages);
    let chapter_names = chapters.chapter_names();
    if chapters.is_unstructured() {
        warn!(name = %request.name, "未检测到章节结构，整份文档作为单一章节");
    }

    // 3. 切分并写入
    on_progress(IngestStatus::Indexing, 0.7);
    let chunks = Chunker::new(settings.chunk_size, settings.chunk_overlap)
        .chunk_document(&document.pages, &chapters);

    let filename = request
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    // 立即获取写锁，并发导入时由 busy_timeout 排队等待
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let document_id = library::add_document(
        &tx,
        &NewDocument {
            name: &request.name,
            uploaded_by: &request.uploaded_by,
            filename,
            total_pages: document.total_pages(),
            chapters: chapter_names.clone(),
            content_hash: &document.content_hash,
        },
    )?;
    library::store_pages(&tx, document_id, &document.pages, &chapters)?;
    let stored = library::store_chunks(&tx, document_id, &chunks)?;
    tx.commit()?;

    info!(
        name = %request.name,
        chapters = chapter_names.len(),
        chunks = stored,
        "文档导入完成"
    );

    Ok(IngestReport {
        name: request.name.clone(),
        pages: document.total_pages(),
        chapters_found: chapter_names.len(),
        chunks: stored,
        chapters: chapter_names,
    })
}

/// 处理单个队列任务（在阻塞线程中运行）
fn run_task(queue: &IngestQueue, settings: &Settings, task: &IngestTask) -> Result<IngestReport> {
    let mut conn = db::init_db(&settings.database_path)?;

    ingest_with_progress(&mut conn, settings, &task.request, |status, progress| {
        if let Err(e) = queue.update_progress(task.task_id, progress, status) {
            warn!(task_id = task.task_id, "更新任务进度失败: {}", e);
        }
    })
}

/// 处理导入队列
///
/// 从队列中取出任务，在 `spawn_blocking` 线程中执行，直到队列清空
///
/// # 返回
/// 本次处理结束的所有任务（包含最终状态）
pub async fn process_queue(queue: Arc<IngestQueue>, settings: Arc<Settings>) -> Result<Vec<IngestTask>> {
    let mut handles = VecDeque::new();

    loop {
        match queue.dequeue()? {
            Some(task) => {
                queue.mark_active(task.clone())?;

                let queue = Arc::clone(&queue);
                let settings = Arc::clone(&settings);
                handles.push_back(tokio::task::spawn_blocking(move || {
                    let status = match run_task(&queue, &settings, &task) {
                        Ok(report) => {
                            debug!(task_id = task.task_id, chunks = report.chunks, "导入任务完成");
                            IngestStatus::Completed
                        }
                        Err(e) => {
                            error!(task_id = task.task_id, name = %task.request.name, "导入任务失败: {}", e);
                            IngestStatus::Failed(e.to_string())
                        }
                    };
                    queue.mark_finished(task.task_id, status)
                }));
            }
            None => {
                // 队列为空或已达并发上限，等待最早的任务结束
                match handles.pop_front() {
                    Some(handle) => join(handle).await?,
                    None if queue.queue_size() == 0 => break,
                    None => tokio::time::sleep(Duration::from_millis(50)).await,
                }
            }
        }
    }

    while let Some(handle) = handles.pop_front() {
        join(handle).await?;
    }

    Ok(queue.finished())
}

async fn join(handle: tokio::task::JoinHandle<Result<()>>) -> Result<()> {
    handle
        .await
        .map_err(|e| ReaderError::Queue(format!("导入线程异常退出: {}", e)))?
}
