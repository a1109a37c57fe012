use rusqlite::{Connection, Result};
use std::path::Path;
use std::time::Duration;

/// 多个导入线程同时写入时的等待上限
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// 打开（或创建）文档库并初始化表结构
pub fn init_db<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 内存数据库，供测试和一次性检测使用
pub fn init_memory_db() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA encoding = 'UTF-8'", [])?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            uploaded_by TEXT NOT NULL,
            filename TEXT NOT NULL,
            total_pages INTEGER NOT NULL,
            chapters_json TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            upload_date TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS pages (
            document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            page_number INTEGER NOT NULL,
            chapter TEXT NOT NULL,
            text TEXT NOT NULL,
            PRIMARY KEY (document_id, page_number)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS chunks (
            id INTEGER PRIMARY KEY,
            document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            chunk_index INTEGER NOT NULL,
            page_number INTEGER NOT NULL,
            chapter TEXT NOT NULL,
            text TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id, chunk_index)",
        [],
    )?;

    Ok(())
}
