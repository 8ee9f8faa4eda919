// ==========================================
// 面包店订货系统 - 防抖自动保存
// ==========================================
// 每个订单会话持有自己的定时器与"上次已保存"哈希，无全局状态
// - 每次选择变化重置定时器，静默期结束后才写入
// - 与上次成功写入内容相同的明细不重复写入
// - 会话销毁（drop）或 cancel() 后，挂起的写入不会再触发
// ==========================================

use crate::api::error::ApiError;
use crate::api::persister::{build_lines, content_hash, OrderPersister, SaveReceipt};
use crate::domain::order::{Order, OrderKey};
use crate::domain::product::ProductIndex;
use crate::domain::selection::Selection;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// 时钟（返回面包店本地时间）
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// 系统时钟
pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Local::now().naive_local())
}

/// 保存状态（供界面展示"保存中"等瞬时状态）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SaveStatus {
    #[default]
    Idle,
    Pending,
    Saving,
    Saved,
    Failed(String),
}

#[derive(Default)]
struct AutosaveState {
    order: Option<Order>,
    pending: Option<Selection>,
    last_saved_hash: Option<String>,
    status: SaveStatus,
}

struct AutosaveShared {
    persister: Arc<OrderPersister>,
    key: OrderKey,
    products: Arc<ProductIndex>,
    clock: Clock,
    state: Mutex<AutosaveState>,
    // 串行化写入，定时器与 flush_now 不会并发落库
    write_lock: tokio::sync::Mutex<()>,
}

impl AutosaveShared {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, AutosaveState> {
        // 状态只含普通数据，锁中毒时沿用内部数据
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn flush(&self) -> Option<Result<SaveReceipt, ApiError>> {
        let _write = self.write_lock.lock().await;

        let (selection, order, last_hash) = {
            let mut state = self.lock_state();
            let selection = state.pending.take()?;
            (selection, state.order.clone(), state.last_saved_hash.clone())
        };

        let hash = content_hash(&build_lines(&selection, &self.products));
        if last_hash.as_deref() == Some(hash.as_str()) {
            tracing::debug!(order_key = %self.key, "明细与上次保存一致，跳过写入");
            self.lock_state().status = SaveStatus::Saved;
            return None;
        }

        self.lock_state().status = SaveStatus::Saving;
        let result = self
            .persister
            .persist(&self.key, order.as_ref(), &selection, &self.products, (self.clock)())
            .await;

        let mut state = self.lock_state();
        match &result {
            Ok(receipt) => {
                if receipt.order.is_some() {
                    state.order = receipt.order.clone();
                }
                state.last_saved_hash = Some(receipt.content_hash.clone());
                state.status = SaveStatus::Saved;
            }
            Err(e) => {
                tracing::warn!(order_key = %self.key, error = %e, "自动保存失败");
                // 保留失败的选择集，等待用户再次触发
                if state.pending.is_none() {
                    state.pending = Some(selection);
                }
                state.status = SaveStatus::Failed(e.user_message());
            }
        }
        Some(result)
    }
}

// ==========================================
// AutosaveSession
// ==========================================
pub struct AutosaveSession {
    shared: Arc<AutosaveShared>,
    quiet: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl AutosaveSession {
    /// 创建自动保存会话
    ///
    /// # 参数
    /// - order: 当前已知订单（None 表示尚未建单，首次写入时隐式创建）
    /// - quiet: 静默期
    pub fn new(
        persister: Arc<OrderPersister>,
        key: OrderKey,
        order: Option<Order>,
        products: Arc<ProductIndex>,
        quiet: Duration,
        clock: Clock,
    ) -> Self {
        let shared = AutosaveShared {
            persister,
            key,
            products,
            clock,
            state: Mutex::new(AutosaveState {
                order,
                ..Default::default()
            }),
            write_lock: tokio::sync::Mutex::new(()),
        };
        Self {
            shared: Arc::new(shared),
            quiet,
            timer: Mutex::new(None),
        }
    }

    /// 记录已知的"上次保存"内容（如刚从远端加载），相同内容不会再写
    pub fn mark_saved(&self, selection: &Selection) {
        let hash = content_hash(&build_lines(selection, &self.shared.products));
        self.shared.lock_state().last_saved_hash = Some(hash);
    }

    /// 更新会话持有的订单（发送/归档后调用）
    pub fn set_order(&self, order: Option<Order>) {
        self.shared.lock_state().order = order;
    }

    /// 选择集变化: 重置定时器
    ///
    /// 需在 tokio 运行时内调用
    pub fn schedule(&self, selection: Selection) {
        {
            let mut state = self.shared.lock_state();
            state.pending = Some(selection);
            state.status = SaveStatus::Pending;
        }

        let shared = Arc::clone(&self.shared);
        let quiet = self.quiet;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            shared.flush().await;
        });

        let mut timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = timer.replace(handle) {
            previous.abort();
        }
    }

    /// 立即写入挂起的选择集（取消定时器）
    ///
    /// # 返回
    /// - None: 没有挂起内容，或内容与上次保存一致
    /// - Some(Ok/Err): 本次写入结果
    pub async fn flush_now(&self) -> Option<Result<SaveReceipt, ApiError>> {
        self.abort_timer();
        self.shared.flush().await
    }

    /// 取消挂起的写入
    pub fn cancel(&self) {
        self.abort_timer();
        let mut state = self.shared.lock_state();
        state.pending = None;
        if state.status == SaveStatus::Pending {
            state.status = SaveStatus::Idle;
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.shared.lock_state().status.clone()
    }

    pub fn has_pending(&self) -> bool {
        self.shared.lock_state().pending.is_some()
    }

    pub fn order(&self) -> Option<Order> {
        self.shared.lock_state().order.clone()
    }

    pub fn last_saved_hash(&self) -> Option<String> {
        self.shared.lock_state().last_saved_hash.clone()
    }

    fn abort_timer(&self) {
        let mut timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }
}

impl Drop for AutosaveSession {
    fn drop(&mut self) {
        self.abort_timer();
    }
}
