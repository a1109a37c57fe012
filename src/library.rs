use crate::chunker::Chunk;
use crate::error::{ReaderError, Result};
use crate::segmentation::{resolve_chapter, ChapterMap, Page};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 文档库中的文档记录
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: i64,
    pub name: String,
    pub uploaded_by: String,
    pub filename: String,
    pub total_pages: u32,
    pub chapters: Vec<String>, // 检测到的章节名，不含哨兵
    pub content_hash: String,
    pub upload_date: String,   // RFC 3339
}

/// 新文档的登记信息
#[derive(Debug, Clone)]
pub struct NewDocument<'a> {
    pub name: &'a str,
    pub uploaded_by: &'a str,
    pub filename: &'a str,
    pub total_pages: u32,
    pub chapters: Vec<String>,
    pub content_hash: &'a str,
}

/// 按章节取回的内容
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChapterContent {
    /// 解析后的章节名
    pub chapter: String,
    pub pages: Vec<u32>,
    pub text: String,
}

const DOCUMENT_COLUMNS: &str =
    "id, name, uploaded_by, filename, total_pages, chapters_json, content_hash, upload_date";

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<DocumentRecord> {
    let chapters_json: String = row.get(5)?;
    let chapters: Vec<String> = serde_json::from_str(&chapters_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(DocumentRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        uploaded_by: row.get(2)?,
        filename: row.get(3)?,
        total_pages: row.get(4)?,
        chapters,
        content_hash: row.get(6)?,
        upload_date: row.get(7)?,
    })
}

// ==================== Document CRUD 操作 ====================

/// 检查名称是否已被占用
pub fn name_exists(conn: &Connection, name: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM documents WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// 登记新文档
///
/// # 返回
/// 新文档的 ID；名称已存在时返回 `DuplicateName`
pub fn add_document(conn: &Connection, doc: &NewDocument) -> Result<i64> {
    if name_exists(conn, doc.name)? {
        return Err(ReaderError::DuplicateName(doc.name.to_string()));
    }

    let chapters_json = serde_json::to_string(&doc.chapters)?;
    let upload_date = chrono::Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO documents (name, uploaded_by, filename, total_pages, chapters_json, content_hash, upload_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            doc.name,
            doc.uploaded_by,
            doc.filename,
            doc.total_pages,
            chapters_json,
            doc.content_hash,
            upload_date
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// 列出所有文档，按登记顺序
pub fn list_documents(conn: &Connection) -> Result<Vec<DocumentRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM documents ORDER BY id",
        DOCUMENT_COLUMNS
    ))?;

    let documents = stmt
        .query_map([], row_to_document)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(documents)
}

/// 按名称获取文档
pub fn get_document(conn: &Connection, name: &str) -> Result<Option<DocumentRecord>> {
    let document = conn
        .query_row(
            &format!("SELECT {} FROM documents WHERE name = ?1", DOCUMENT_COLUMNS),
            [name],
            row_to_document,
        )
        .optional()?;
    Ok(document)
}

fn require_document(conn: &Connection, name: &str) -> Result<DocumentRecord> {
    get_document(conn, name)?.ok_or_else(|| ReaderError::DocumentNotFound(name.to_string()))
}

/// 删除文档及其页面和检索块
///
/// # 返回
/// 是否确实删除了文档
pub fn delete_document(conn: &Connection, name: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM documents WHERE name = ?1", [name])?;
    Ok(removed > 0)
}

// ==================== Page / Chunk 存储 ====================

/// 保存逐页文本，并按章节映射标注每页所属章节
pub fn store_pages(
    conn: &Connection,
    document_id: i64,
    pages: &[Page],
    chapters: &ChapterMap,
) -> Result<usize> {
    let page_index = chapters.page_index();
    let mut stmt = conn.prepare(
        "INSERT INTO pages (document_id, page_number, chapter, text) VALUES (?1, ?2, ?3, ?4)",
    )?;

    for page in pages {
        let chapter = page_index
            .get(&page.page_number)
            .map(String::as_str)
            .unwrap_or_default();
        stmt.execute(rusqlite::params![document_id, page.page_number, chapter, page.text])?;
    }
    Ok(pages.len())
}

/// 保存检索块
pub fn store_chunks(conn: &Connection, document_id: i64, chunks: &[Chunk]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO chunks (document_id, chunk_index, page_number, chapter, text)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    for chunk in chunks {
        stmt.execute(rusqlite::params![
            document_id,
            chunk.index as i64,
            chunk.page_number,
            chunk.chapter,
            chunk.text
        ])?;
    }
    Ok(chunks.len())
}

/// 获取文档的检索块
pub fn get_chunks(conn: &Connection, name: &str) -> Result<Vec<Chunk>> {
    let document = require_document(conn, name)?;
    let mut stmt = conn.prepare(
        "SELECT chunk_index, page_number, chapter, text FROM chunks
         WHERE document_id = ?1 ORDER BY chunk_index",
    )?;

    let chunks = stmt
        .query_map([document.id], |row| {
            let index: i64 = row.get(0)?;
            Ok(Chunk {
                index: index as usize,
                page_number: row.get(1)?,
                chapter: row.get(2)?,
                text: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(chunks)
}

// ==================== 内容查询 ====================

/// 校验页码在 1..=total_pages 之内
pub fn validate_page(conn: &Connection, name: &str, page: u32) -> Result<()> {
    let document = require_document(conn, name)?;
    if page == 0 || page > document.total_pages {
        return Err(ReaderError::InvalidPage {
            page,
            total_pages: document.total_pages,
        });
    }
    Ok(())
}

/// 获取单页文本
pub fn content_by_page(conn: &Connection, name: &str, page: u32) -> Result<String> {
    validate_page(conn, name, page)?;
    let text = conn
        .query_row(
            "SELECT p.text FROM pages p JOIN documents d ON d.id = p.document_id
             WHERE d.name = ?1 AND p.page_number = ?2",
            rusqlite::params![name, page],
            |row| row.get(0),
        )
        .optional()?;
    Ok(text.unwrap_or_default())
}

/// 把用户输入的章节引用解析为文档中的章节名
///
/// # 返回
/// 章节名；文档不存在返回 `DocumentNotFound`，无法匹配返回 `ChapterNotFound`
pub fn find_chapter(conn: &Connection, name: &str, query: &str) -> Result<String> {
    let document = require_document(conn, name)?;
    match resolve_chapter(query, &document.chapters) {
        Some(found) => Ok(found.name.to_string()),
        None => Err(ReaderError::ChapterNotFound {
            query: query.to_string(),
            available: document.chapters,
        }),
    }
}

/// 获取章节全文
pub fn content_by_chapter(conn: &Connection, name: &str, query: &str) -> Result<ChapterContent> {
    let chapter = find_chapter(conn, name, query)?;
    let mut stmt = conn.prepare(
        "SELECT p.page_number, p.text FROM pages p JOIN documents d ON d.id = p.document_id
         WHERE d.name = ?1 AND p.chapter = ?2 ORDER BY p.page_number",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![name, chapter], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let (pages, texts): (Vec<u32>, Vec<String>) = rows.into_iter().unzip();
    Ok(ChapterContent {
        chapter,
        pages,
        text: texts.join("\n\n"),
    })
}

/// 获取整份文档的文本
pub fn all_content(conn: &Connection, name: &str) -> Result<String> {
    let document = require_document(conn, name)?;
    let mut stmt =
        conn.prepare("SELECT text FROM pages WHERE document_id = ?1 ORDER BY page_number")?;
    let texts = stmt
        .query_map([document.id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(texts.join("\n\n"))
}

/// 每章的页数统计
pub fn chapter_page_counts(conn: &Connection, name: &str) -> Result<BTreeMap<String, u32>> {
    let document = require_document(conn, name)?;
    let mut stmt = conn.prepare(
        "SELECT chapter, COUNT(*) FROM pages WHERE document_id = ?1 GROUP BY chapter",
    )?;
    let counts = stmt
        .query_map([document.id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<BTreeMap<String, u32>>>()?;
    Ok(counts)
}
