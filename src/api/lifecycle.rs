// ==========================================
// 面包店订货系统 - 订单生命周期编排
// ==========================================
// 状态机: draft --send()--> sent --archive()--> archived
//         sent --absorb_rajout()--> sent（只覆盖基线，不改状态）
// 红线: 不存在 sent → draft 的回退
// ==========================================
// 职责: 组合 日历/分类/合并/增量/截单/写入 完成订单操作
// 约束: 输入校验在任何存储调用之前完成
// ==========================================

use crate::api::autosave::{AutosaveSession, Clock};
use crate::api::error::{ApiError, ApiResult};
use crate::api::persister::{build_lines, OrderPersister, SaveReceipt};
use crate::api::session::OrderSession;
use crate::api::validator::{validate_order_key, validate_product_record};
use crate::config::supplier_config_trait::SupplierConfigReader;
use crate::domain::baseline::Baseline;
use crate::domain::order::{line_totals, Order, OrderKey};
use crate::domain::product::{index_products, Product, ProductIndex, ProductRecord};
use crate::domain::supplier::SupplierConfig;
use crate::domain::types::{OrderStatus, UrgencyStage};
use crate::engine::calendar::CalendarRules;
use crate::engine::cutoff::CutoffGate;
use crate::engine::department::DepartmentClassifier;
use crate::engine::merge::SelectionMerger;
use crate::engine::message::{MessageFormatter, MessageLine};
use crate::repository::baseline_repo::BaselineStore;
use crate::repository::order_store::OrderStore;
use crate::repository::selection_cache::SelectionCache;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// 发送结果
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    pub order: Order,
    pub baseline: Baseline,
    /// 外发消息文本（由外部通道发送）
    pub message: String,
}

// ==========================================
// OrderLifecycle
// ==========================================
pub struct OrderLifecycle {
    store: Arc<dyn OrderStore>,
    config: Arc<dyn SupplierConfigReader>,
    baselines: Arc<BaselineStore>,
    cache: Arc<SelectionCache>,
    classifier: DepartmentClassifier,
    merger: SelectionMerger,
}

impl OrderLifecycle {
    pub fn new(
        store: Arc<dyn OrderStore>,
        config: Arc<dyn SupplierConfigReader>,
        baselines: Arc<BaselineStore>,
        cache: Arc<SelectionCache>,
    ) -> Self {
        Self {
            store,
            config,
            baselines,
            cache,
            classifier: DepartmentClassifier::new(),
            merger: SelectionMerger::new(),
        }
    }

    // ==========================================
    // 配置与目录
    // ==========================================

    pub async fn supplier_config(&self, supplier_key: &str) -> ApiResult<SupplierConfig> {
        Ok(self.config.get_supplier_config(supplier_key).await?)
    }

    /// 按消息语言配置构建格式化器
    pub async fn message_formatter(&self) -> ApiResult<MessageFormatter> {
        Ok(MessageFormatter::new(self.config.get_message_locale().await?))
    }

    /// 供应商商品目录（已规整名称与部门）
    pub async fn list_products(&self, supplier_key: &str) -> ApiResult<Vec<Product>> {
        let records = self.store.list_products(supplier_key).await?;
        Ok(records.iter().map(|r| self.classifier.normalize(r)).collect())
    }

    /// 新增或更新商品（名称为空等在写入前拒绝）
    pub async fn upsert_product(&self, record: &ProductRecord) -> ApiResult<Product> {
        validate_product_record(record)?;
        self.store.upsert_product(record).await?;
        Ok(self.classifier.normalize(record))
    }

    async fn product_index(&self, supplier_key: &str) -> ApiResult<Arc<ProductIndex>> {
        Ok(Arc::new(index_products(self.list_products(supplier_key).await?)))
    }

    // ==========================================
    // 交货日历
    // ==========================================

    /// 供应商从 `from`（含）起的下一个可交货日期
    pub async fn next_delivery_date(&self, supplier_key: &str, from: NaiveDate) -> ApiResult<NaiveDate> {
        let config = self.supplier_config(supplier_key).await?;
        Ok(CalendarRules::for_supplier(&config).next_allowed_date(from, config.allowed_weekdays))
    }

    /// 订单的临近交货阶段
    pub async fn urgency_stage(&self, key: &OrderKey, now: NaiveDateTime) -> ApiResult<UrgencyStage> {
        validate_order_key(key)?;
        let config = self.supplier_config(&key.supplier_key).await?;
        Ok(CalendarRules::for_supplier(&config).urgency_stage(key.delivery_date, now))
    }

    // ==========================================
    // 打开 / 保存
    // ==========================================

    /// 打开订单: 远端明细 + 本地缓存合并为工作选择集
    ///
    /// 已发送订单若本设备无基线，以当前明细初始化基线
    #[tracing::instrument(skip(self, key), fields(order_key = %key))]
    pub async fn open(&self, key: &OrderKey, now: NaiveDateTime) -> ApiResult<OrderSession> {
        validate_order_key(key)?;
        let config = self.supplier_config(&key.supplier_key).await?;
        let gate = CutoffGate::new(CalendarRules::for_supplier(&config));
        let products = self.product_index(&key.supplier_key).await?;

        let order = self.store.fetch_open_order(key).await?;
        let lines = match &order {
            Some(o) => self.store.fetch_lines(&o.order_id).await?,
            None => Vec::new(),
        };

        let baseline = match &order {
            Some(o) if o.status == OrderStatus::Sent => {
                Some(self.baselines.ensure(&o.order_id, &lines, now))
            }
            _ => None,
        };

        let cached = self.cache.load(key);
        let selection = self.merger.merge(&line_totals(&lines), cached.as_ref());

        let mut session = OrderSession::new(key.clone(), order, baseline, selection, products, gate)
            .with_cache(Arc::clone(&self.cache));
        // 缓存里的取消勾选不能让基线商品低于基线
        session.raise_to_baseline();
        let modifiable = session.can_modify(now);

        tracing::info!(
            status = %session.status(),
            lines = lines.len(),
            selected = session.selection().len(),
            modifiable,
            "订单已打开"
        );
        Ok(session)
    }

    /// 立即写入会话的选择集（不经防抖）
    ///
    /// 写入前先以存储中的订单状态刷新会话
    pub async fn save(&self, session: &mut OrderSession, now: NaiveDateTime) -> ApiResult<SaveReceipt> {
        if !session.can_modify(now) {
            return Err(ApiError::OrderLocked(session.key().to_string()));
        }
        self.refresh_order(session, now).await?;
        if !session.can_modify(now) {
            return Err(ApiError::OrderLocked(session.key().to_string()));
        }
        let persister = OrderPersister::new(Arc::clone(&self.store), *session.gate());
        let receipt = persister
            .persist(session.key(), session.order(), session.selection(), session.products(), now)
            .await?;
        if receipt.order.is_some() {
            session.set_order(receipt.order.clone());
        }
        Ok(receipt)
    }

    /// 重新读取会话订单；已被其他会话发送时接收基线与最小数量
    async fn refresh_order(&self, session: &mut OrderSession, now: NaiveDateTime) -> ApiResult<()> {
        let current = match session.order() {
            Some(o) => self.store.find_order(&o.order_id).await?,
            None => self.store.fetch_open_order(session.key()).await?,
        };
        let current = match current {
            Some(order) => order,
            None => return Ok(()),
        };

        if current.status == OrderStatus::Sent && session.baseline().is_none() {
            let lines = self.store.fetch_lines(&current.order_id).await?;
            let baseline = self.baselines.ensure(&current.order_id, &lines, now);
            tracing::info!(order_id = %current.order_id, "订单已由其他会话发送，接收基线");
            session.adopt_sent(current, baseline);
        } else {
            session.set_order(Some(current));
        }
        Ok(())
    }

    /// 为会话创建防抖自动保存（静默期取全局配置）
    pub async fn autosave_for(&self, session: &OrderSession, clock: Clock) -> ApiResult<AutosaveSession> {
        let quiet_ms = self.config.get_autosave_quiet_ms().await?;
        let persister = Arc::new(OrderPersister::new(Arc::clone(&self.store), *session.gate()));
        let autosave = AutosaveSession::new(
            persister,
            session.key().clone(),
            session.order().cloned(),
            Arc::clone(session.products()),
            Duration::from_millis(quiet_ms),
            clock,
        );
        Ok(autosave)
    }

    // ==========================================
    // 状态转换
    // ==========================================

    /// draft → sent
    ///
    /// 写入全部明细，标记发送时间与截单时刻，以落库明细捕获基线，生成外发消息
    #[tracing::instrument(skip(self, session), fields(order_key = %session.key()))]
    pub async fn send(&self, session: &mut OrderSession, now: NaiveDateTime) -> ApiResult<SendOutcome> {
        let key = session.key().clone();
        validate_order_key(&key)?;

        if let Some(order) = session.order() {
            if order.status != OrderStatus::Draft {
                return Err(ApiError::InvalidStateTransition {
                    from: order.status.to_string(),
                    to: OrderStatus::Sent.to_string(),
                });
            }
        }
        if !session.selection().has_active() {
            return Err(ApiError::NothingToSend(key.to_string()));
        }

        let config = self.supplier_config(&key.supplier_key).await?;
        let calendar = CalendarRules::for_supplier(&config);

        let order = match session.order() {
            Some(o) => o.clone(),
            None => self.store.upsert_order(&key, now).await?,
        };
        if order.status != OrderStatus::Draft {
            // 其他会话已先行发送
            session.set_order(Some(order.clone()));
            return Err(ApiError::InvalidStateTransition {
                from: order.status.to_string(),
                to: OrderStatus::Sent.to_string(),
            });
        }

        let lines = build_lines(session.selection(), session.products());
        self.store.replace_lines(&order.order_id, &lines).await?;

        let cutoff_at = calendar.cutoff_instant(key.delivery_date);
        let sent = self
            .store
            .update_status(
                &order.order_id,
                OrderStatus::Draft,
                OrderStatus::Sent,
                Some(now),
                Some(cutoff_at),
            )
            .await?;

        let stored = self.store.fetch_lines(&sent.order_id).await?;
        let baseline = self.baselines.capture(&sent.order_id, &stored, now);

        let formatter = self.message_formatter().await?;
        let message = formatter.format_order(
            &config.label,
            key.delivery_date,
            &MessageLine::from_totals(&line_totals(&stored), session.products()),
        );

        session.set_order(Some(sent.clone()));
        session.set_baseline(Some(baseline.clone()));
        tracing::info!(order_id = %sent.order_id, %cutoff_at, lines = stored.len(), "订单已发送");

        Ok(SendOutcome {
            order: sent,
            baseline,
            message,
        })
    }

    /// 追加（rajout）消息: 只含相对基线的增量
    pub async fn rajout_message(&self, session: &OrderSession) -> ApiResult<String> {
        let order = Self::require_status(session, OrderStatus::Sent)?;
        let delta = session.delta();
        if delta.is_empty() {
            return Err(ApiError::NoRajout(order.order_id.clone()));
        }

        let config = self.supplier_config(&session.key().supplier_key).await?;
        let formatter = self.message_formatter().await?;
        Ok(formatter.format_rajout(
            &config.label,
            order.delivery_date,
            &MessageLine::from_delta(&delta),
        ))
    }

    /// 吸收追加: 先把选择集收敛写入，再以落库总量覆盖基线
    ///
    /// 之后对未变化的选择集计算增量为空
    #[tracing::instrument(skip(self, session), fields(order_key = %session.key()))]
    pub async fn absorb_rajout(&self, session: &mut OrderSession, now: NaiveDateTime) -> ApiResult<Baseline> {
        let order_id = Self::require_status(session, OrderStatus::Sent)?.order_id.clone();
        if !session.has_rajout() {
            return Err(ApiError::NoRajout(order_id));
        }

        self.save(session, now).await?;

        let stored = self.store.fetch_lines(&order_id).await?;
        let baseline = self.baselines.absorb(&order_id, &stored, now);
        session.set_baseline(Some(baseline.clone()));
        Ok(baseline)
    }

    /// sent → archived（用户确认到货后，只读且不可退出）
    pub async fn archive(&self, session: &mut OrderSession) -> ApiResult<Order> {
        let order_id = Self::require_status(session, OrderStatus::Sent)?.order_id.clone();
        let archived = self
            .store
            .update_status(&order_id, OrderStatus::Sent, OrderStatus::Archived, None, None)
            .await?;
        session.set_order(Some(archived.clone()));
        self.cache.clear(session.key());
        tracing::info!(order_id = %archived.order_id, "订单已归档");
        Ok(archived)
    }

    fn require_status(session: &OrderSession, expected: OrderStatus) -> ApiResult<&Order> {
        match session.order() {
            Some(order) if order.status == expected => Ok(order),
            Some(order) => Err(ApiError::InvalidStateTransition {
                from: order.status.to_string(),
                to: expected.to_string(),
            }),
            None => Err(ApiError::InvalidStateTransition {
                from: OrderStatus::Draft.to_string(),
                to: expected.to_string(),
            }),
        }
    }
}
