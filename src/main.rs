//! study-reader 命令行
//!
//! 用法：
//!   study-reader detect <file>                 打印检测到的章节映射（JSON）
//!   study-reader ingest <file> --name --user   导入文档
//!   study-reader ingest-batch <files...> --user
//!   study-reader list                          列出文档库
//!   study-reader resolve <name> <query>        解析章节引用
//!   study-reader page <name> <n>               打印单页文本
//!   study-reader chapter <name> <query>        打印整章文本
//!   study-reader delete <name>                 删除文档

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use study_reader::ingest::{ingest_file, process_queue, IngestRequest};
use study_reader::ingest_queue::{IngestQueue, IngestStatus};
use study_reader::parser::ParserRouter;
use study_reader::segmentation::BoundaryResolver;
use study_reader::{db, library, Result, Settings};
use tracing::error;

#[derive(Parser)]
#[command(name = "study-reader", version, about = "PDF 章节切分与学习资料库")]
struct Cli {
    /// TOML 配置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 检测文件的章节结构，不写入文档库
    Detect { file: PathBuf },
    /// 导入单个文件
    Ingest {
        file: PathBuf,
        /// 文档名称，默认使用文件名
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "anonymous")]
        user: String,
    },
    /// 通过导入队列并发导入多个文件，名称取自文件名
    IngestBatch {
        files: Vec<PathBuf>,
        #[arg(long, default_value = "anonymous")]
        user: String,
    },
    /// 列出文档库中的文档
    List,
    /// 把章节引用解析为章节名
    Resolve { name: String, query: String },
    /// 打印单页文本
    Page { name: String, page: u32 },
    /// 打印整章文本
    Chapter { name: String, query: String },
    /// 删除文档
    Delete { name: String },
}

fn default_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Detect { file } => {
            let router = ParserRouter::with_min_text_chars(settings.min_text_chars);
            let document = router.parse(&file)?;
            let chapters = BoundaryResolver::new().resolve(&document.pages);
            print_json(&chapters)
        }
        Commands::Ingest { file, name, user } => {
            let mut conn = db::init_db(&settings.database_path)?;
            let request = IngestRequest {
                name: name.unwrap_or_else(|| default_name(&file)),
                path: file,
                uploaded_by: user,
            };
            let report = ingest_file(&mut conn, &settings, &request)?;
            print_json(&report)
        }
        Commands::IngestBatch { files, user } => {
            db::init_db(&settings.database_path)?;
            let queue = Arc::new(IngestQueue::new(settings.max_concurrent_ingests));
            for file in files {
                queue.enqueue(IngestRequest {
                    name: default_name(&file),
                    path: file,
                    uploaded_by: user.clone(),
                })?;
            }

            let finished = process_queue(queue, Arc::new(settings)).await?;
            for task in &finished {
                match &task.status {
                    IngestStatus::Completed => println!("✓ {}", task.request.name),
                    IngestStatus::Failed(e) => println!("✗ {}: {}", task.request.name, e),
                    other => println!("? {}: {:?}", task.request.name, other),
                }
            }
            Ok(())
        }
        Commands::List => {
            let conn = db::init_db(&settings.database_path)?;
            print_json(&library::list_documents(&conn)?)
        }
        Commands::Resolve { name, query } => {
            let conn = db::init_db(&settings.database_path)?;
            println!("{}", library::find_chapter(&conn, &name, &query)?);
            Ok(())
        }
        Commands::Page { name, page } => {
            let conn = db::init_db(&settings.database_path)?;
            println!("{}", library::content_by_page(&conn, &name, page)?);
            Ok(())
        }
        Commands::Chapter { name, query } => {
            let conn = db::init_db(&settings.database_path)?;
            let content = library::content_by_chapter(&conn, &name, &query)?;
            println!("# {} (pages {:?})\n", content.chapter, content.pages);
            println!("{}", content.text);
            Ok(())
        }
        Commands::Delete { name } => {
            let conn = db::init_db(&settings.database_path)?;
            if library::delete_document(&conn, &name)? {
                println!("已删除 '{}'", name);
            } else {
                println!("找不到 '{}'", name);
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("study_reader=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("错误: {}", e);
        std::process::exit(1);
    }
}
