use crate::error::{ReaderError, Result};
use crate::ingest::IngestRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// 导入状态枚举
///
/// 表示导入任务的各个阶段
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum IngestStatus {
    /// 等待处理
    Pending,
    /// 正在提取逐页文本
    Parsing,
    /// 正在检测章节结构
    Segmenting,
    /// 正在切分检索块并写入文档库
    Indexing,
    /// 完成
    Completed,
    /// 失败（包含错误信息）
    Failed(String),
}

impl IngestStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, IngestStatus::Completed | IngestStatus::Failed(_))
    }
}

/// 导入任务
#[derive(Clone, Debug)]
pub struct IngestTask {
    /// 队列分配的任务 ID
    pub task_id: u64,
    pub request: IngestRequest,
    /// 当前状态
    pub status: IngestStatus,
    /// 进度（0.0 - 1.0）
    pub progress: f32,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 导入队列
///
/// 管理所有导入任务的队列，支持并发控制
pub struct IngestQueue {
    /// 待处理任务队列
    tasks: Arc<Mutex<VecDeque<IngestTask>>>,
    /// 正在处理的任务（task_id -> task）
    active_tasks: Arc<Mutex<HashMap<u64, IngestTask>>>,
    /// 已结束的任务，保留最终状态
    finished_tasks: Arc<Mutex<HashMap<u64, IngestTask>>>,
    /// 最大并发任务数
    max_concurrent: usize,
    next_id: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| ReaderError::Queue(format!("锁定任务队列失败: {}", e)))
}

impl IngestQueue {
    /// 创建新的导入队列
    ///
    /// # 参数
    /// - `max_concurrent`: 最大并发任务数
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(VecDeque::new())),
            active_tasks: Arc::new(Mutex::new(HashMap::new())),
            finished_tasks: Arc::new(Mutex::new(HashMap::new())),
            max_concurrent,
            next_id: AtomicU64::new(1),
        }
    }

    /// 将导入请求加入队列
    ///
    /// # 返回
    /// 新任务的 ID
    pub fn enqueue(&self, request: IngestRequest) -> Result<u64> {
        let task_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut tasks = lock(&self.tasks)?;
        tasks.push_back(IngestTask {
            task_id,
            request,
            status: IngestStatus::Pending,
            progress: 0.0,
            created_at: Utc::now(),
        });
        Ok(task_id)
    }

    /// 从队列中取出任务
    ///
    /// # 返回
    /// - Ok(Some(task)): 成功取出任务
    /// - Ok(None): 队列为空或已达并发上限
    pub fn dequeue(&self) -> Result<Option<IngestTask>> {
        let mut tasks = lock(&self.tasks)?;
        let active = lock(&self.active_tasks)?;

        if active.len() >= self.max_concurrent {
            return Ok(None);
        }

        Ok(tasks.pop_front())
    }

    /// 标记任务为活动状态
    pub fn mark_active(&self, task: IngestTask) -> Result<()> {
        let mut active = lock(&self.active_tasks)?;
        active.insert(task.task_id, task);
        Ok(())
    }

    /// 结束任务并记录最终状态
    ///
    /// # 参数
    /// - `task_id`: 任务 ID
    /// - `status`: `Completed` 或 `Failed`
    pub fn mark_finished(&self, task_id: u64, status: IngestStatus) -> Result<()> {
        let task = lock(&self.active_tasks)?.remove(&task_id);
        if let Some(mut task) = task {
            task.progress = 1.0;
            task.status = status;
            lock(&self.finished_tasks)?.insert(task_id, task);
        }
        Ok(())
    }

    /// 获取任务状态（排队中、进行中或已结束）
    pub fn get_status(&self, task_id: u64) -> Option<IngestTask> {
        if let Some(task) = self.active_tasks.lock().ok()?.get(&task_id) {
            return Some(task.clone());
        }
        if let Some(task) = self.finished_tasks.lock().ok()?.get(&task_id) {
            return Some(task.clone());
        }
        let tasks = self.tasks.lock().ok()?;
        tasks.iter().find(|task| task.task_id == task_id).cloned()
    }

    /// 更新任务进度和状态
    pub fn update_progress(&self, task_id: u64, progress: f32, status: IngestStatus) -> Result<()> {
        let mut active = lock(&self.active_tasks)?;

        if let Some(task) = active.get_mut(&task_id) {
            task.progress = progress;
            task.status = status;
        }

        Ok(())
    }

    /// 已结束的任务，按任务 ID 排序
    pub fn finished(&self) -> Vec<IngestTask> {
        let mut tasks: Vec<IngestTask> = self
            .finished_tasks
            .lock()
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default();
        tasks.sort_by_key(|task| task.task_id);
        tasks
    }

    /// 获取队列中的任务数量
    pub fn queue_size(&self) -> usize {
        self.tasks.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// 获取活动任务数量
    pub fn active_count(&self) -> usize {
        self.active_tasks.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// 检查是否有空闲槽位
    pub fn has_capacity(&self) -> bool {
        self.active_count() < self.max_concurrent
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

impl Default for IngestQueue {
    fn default() -> Self {
        Self::new(3) // 默认最多 3 个并发任务
    }
}
