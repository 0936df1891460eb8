use std::time::{Duration, Instant};

/// 协作式调度器 (Cooperative Scheduler)
///
/// 事件循环每圈轮询到期任务: 先执行, 执行完再重新武装
/// (fire-and-reschedule), 所以一次缓慢的检测通过会推迟而不是
/// 叠加下一次tick。取消是一等操作, 而不是"不再自我提交"。
///
/// 显示任务与遥测任务各自独立配速, 都跑在同一个界面线程上,
/// 任务之间以及任务与输入处理之间严格交错, 从不并发。

/// 任务句柄
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

struct Task {
    id: u64,
    period: Duration,
    due: Instant,
    active: bool,
}

pub struct Scheduler {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
        }
    }

    /// 注册一个周期任务, 首次在 `now` 立即到期
    pub fn arm(&mut self, period: Duration, now: Instant) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            period,
            due: now,
            active: true,
        });
        TaskId(id)
    }

    /// 任务是否到期 (已取消的任务永不到期)
    pub fn due(&self, id: TaskId, now: Instant) -> bool {
        self.find(id)
            .map(|t| t.active && now >= t.due)
            .unwrap_or(false)
    }

    /// 执行完毕后重新武装: 下次到期 = 完成时刻 + 周期
    pub fn rearm(&mut self, id: TaskId, completed_at: Instant) {
        if let Some(task) = self.find_mut(id) {
            task.due = completed_at + task.period;
        }
    }

    /// 取消任务, 之后不再到期
    pub fn cancel(&mut self, id: TaskId) {
        if let Some(task) = self.find_mut(id) {
            task.active = false;
        }
    }

    pub fn is_active(&self, id: TaskId) -> bool {
        self.find(id).map(|t| t.active).unwrap_or(false)
    }

    fn find(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id.0)
    }

    fn find_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id.0)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
