// ==========================================
// 面包店订货系统 - 远端订单存储 Trait
// ==========================================
// 职责: 定义订单/明细/商品目录的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 说明: 所有远端读写均为异步，可能挂起
// ==========================================

use crate::domain::order::{LineDraft, Order, OrderKey, OrderLine};
use crate::domain::product::ProductRecord;
use crate::domain::types::OrderStatus;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::NaiveDateTime;

// ==========================================
// OrderStore Trait
// ==========================================
// 实现者: SqliteOrderStore（使用 rusqlite）
#[async_trait]
pub trait OrderStore: Send + Sync {
    // ===== 订单 =====

    /// 查询自然键下最新的未归档订单（状态 ∈ {DRAFT, SENT}）
    ///
    /// # 返回
    /// - Ok(None): 订单不存在（不是错误）
    async fn fetch_open_order(&self, key: &OrderKey) -> RepositoryResult<Option<Order>>;

    /// 按订单ID查询
    async fn find_order(&self, order_id: &str) -> RepositoryResult<Option<Order>>;

    /// 以自然键为冲突键创建订单；已存在时原样返回，永不重复创建
    async fn upsert_order(&self, key: &OrderKey, now: NaiveDateTime) -> RepositoryResult<Order>;

    /// 更新订单状态（带期望状态，保证状态转换只发生一次）
    ///
    /// # 返回
    /// - Err(InvalidStateTransition): 当前状态与期望状态不符
    /// - Err(NotFound): 订单不存在
    async fn update_status(
        &self,
        order_id: &str,
        expected: OrderStatus,
        status: OrderStatus,
        sent_at: Option<NaiveDateTime>,
        cutoff_at: Option<NaiveDateTime>,
    ) -> RepositoryResult<Order>;

    // ===== 明细 =====

    /// 查询订单全部明细（按 product_id 升序）
    async fn fetch_lines(&self, order_id: &str) -> RepositoryResult<Vec<OrderLine>>;

    /// 草稿模式: 原子替换全部明细（单事务内删除 + 插入）
    async fn replace_lines(&self, order_id: &str, lines: &[LineDraft]) -> RepositoryResult<usize>;

    /// 已发送模式: 按商品收敛到总量，持久化数量 = max(原数量, 目标数量)
    ///
    /// 不删除任何明细，数量只增不减
    async fn converge_lines(&self, order_id: &str, lines: &[LineDraft]) -> RepositoryResult<usize>;

    // ===== 商品目录 =====

    /// 按供应商查询商品目录
    async fn list_products(&self, supplier_key: &str) -> RepositoryResult<Vec<ProductRecord>>;

    /// 新增或更新商品（目录维护/测试数据使用）
    async fn upsert_product(&self, record: &ProductRecord) -> RepositoryResult<()>;
}
