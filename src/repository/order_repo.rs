// ==========================================
// 面包店订货系统 - 订单数据仓储 (SQLite)
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::order::{LineDraft, Order, OrderKey, OrderLine};
use crate::domain::product::ProductRecord;
use crate::domain::types::OrderStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::order_store::OrderStore;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

const ORDER_COLUMNS: &str =
    "order_id, supplier_key, delivery_date, status, sent_at, cutoff_at, created_at";

// ==========================================
// SqliteOrderStore - 订单仓储
// ==========================================
pub struct SqliteOrderStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteOrderStore {
    /// 创建新的 SqliteOrderStore 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn find_order_by_id(conn: &Connection, order_id: &str) -> RepositoryResult<Option<Order>> {
        let sql = format!("SELECT {} FROM purchase_order WHERE order_id = ?1", ORDER_COLUMNS);
        let order = conn
            .query_row(&sql, params![order_id], map_order_row)
            .optional()?;
        Ok(order)
    }

    fn find_order_by_key(conn: &Connection, key: &OrderKey) -> RepositoryResult<Option<Order>> {
        let sql = format!(
            "SELECT {} FROM purchase_order WHERE supplier_key = ?1 AND delivery_date = ?2",
            ORDER_COLUMNS
        );
        let order = conn
            .query_row(
                &sql,
                params![key.supplier_key, key.delivery_date.format(DATE_FMT).to_string()],
                map_order_row,
            )
            .optional()?;
        Ok(order)
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn fetch_open_order(&self, key: &OrderKey) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM purchase_order
            WHERE supplier_key = ?1 AND delivery_date = ?2 AND status IN ('DRAFT', 'SENT')
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            ORDER_COLUMNS
        );
        let order = conn
            .query_row(
                &sql,
                params![key.supplier_key, key.delivery_date.format(DATE_FMT).to_string()],
                map_order_row,
            )
            .optional()?;
        Ok(order)
    }

    async fn find_order(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        Self::find_order_by_id(&conn, order_id)
    }

    async fn upsert_order(&self, key: &OrderKey, now: NaiveDateTime) -> RepositoryResult<Order> {
        let conn = self.get_conn()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO purchase_order (order_id, supplier_key, delivery_date, status, created_at)
            VALUES (?1, ?2, ?3, 'DRAFT', ?4)
            ON CONFLICT(supplier_key, delivery_date) DO NOTHING
            "#,
            params![
                Uuid::new_v4().to_string(),
                key.supplier_key,
                key.delivery_date.format(DATE_FMT).to_string(),
                now.format(DATETIME_FMT).to_string(),
            ],
        )?;
        if inserted > 0 {
            tracing::info!(order_key = %key, "新建订单");
        }

        Self::find_order_by_key(&conn, key)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "purchase_order".to_string(),
            id: key.to_string(),
        })
    }

    async fn update_status(
        &self,
        order_id: &str,
        expected: OrderStatus,
        status: OrderStatus,
        sent_at: Option<NaiveDateTime>,
        cutoff_at: Option<NaiveDateTime>,
    ) -> RepositoryResult<Order> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE purchase_order
            SET status = ?3,
                sent_at = COALESCE(?4, sent_at),
                cutoff_at = COALESCE(?5, cutoff_at)
            WHERE order_id = ?1 AND status = ?2
            "#,
            params![
                order_id,
                expected.to_db_str(),
                status.to_db_str(),
                sent_at.map(|t| t.format(DATETIME_FMT).to_string()),
                cutoff_at.map(|t| t.format(DATETIME_FMT).to_string()),
            ],
        )?;

        let current = Self::find_order_by_id(&conn, order_id)?;
        match (affected, current) {
            (_, None) => Err(RepositoryError::NotFound {
                entity: "purchase_order".to_string(),
                id: order_id.to_string(),
            }),
            (0, Some(order)) => Err(RepositoryError::InvalidStateTransition {
                from: order.status.to_string(),
                to: status.to_string(),
            }),
            (_, Some(order)) => Ok(order),
        }
    }

    async fn fetch_lines(&self, order_id: &str) -> RepositoryResult<Vec<OrderLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT order_id, product_id, product_name, unit_price, qty
            FROM order_line
            WHERE order_id = ?1
            ORDER BY product_id ASC
            "#,
        )?;
        let lines = stmt
            .query_map(params![order_id], |row| {
                Ok(OrderLine {
                    order_id: row.get(0)?,
                    product_id: row.get(1)?,
                    product_name: row.get(2)?,
                    unit_price: row.get(3)?,
                    qty: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(lines)
    }

    async fn replace_lines(&self, order_id: &str, lines: &[LineDraft]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        // 仅草稿可整体替换；已发送订单的明细不能被删除
        let status: Option<String> = tx
            .query_row(
                "SELECT status FROM purchase_order WHERE order_id = ?1",
                params![order_id],
                |row| row.get(0),
            )
            .optional()?;
        match status.as_deref() {
            None => {
                return Err(RepositoryError::NotFound {
                    entity: "Order".to_string(),
                    id: order_id.to_string(),
                })
            }
            Some(s) if s != OrderStatus::Draft.to_db_str() => {
                return Err(RepositoryError::InvalidStateTransition {
                    from: OrderStatus::from_str(s).to_string(),
                    to: OrderStatus::Draft.to_string(),
                })
            }
            Some(_) => {}
        }

        tx.execute("DELETE FROM order_line WHERE order_id = ?1", params![order_id])?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO order_line (order_id, product_id, product_name, unit_price, qty)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for line in lines.iter().filter(|l| l.qty > 0) {
                stmt.execute(params![
                    order_id,
                    line.product_id,
                    line.product_name,
                    line.unit_price,
                    line.qty,
                ])?;
                count += 1;
            }
        }

        tx.commit()?;
        tracing::debug!(order_id, count, "草稿明细已整体替换");
        Ok(count)
    }

    async fn converge_lines(&self, order_id: &str, lines: &[LineDraft]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO order_line (order_id, product_id, product_name, unit_price, qty)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(order_id, product_id) DO UPDATE SET
                    qty = MAX(order_line.qty, excluded.qty),
                    updated_at = datetime('now')
                "#,
            )?;
            for line in lines.iter().filter(|l| l.qty > 0) {
                count += stmt.execute(params![
                    order_id,
                    line.product_id,
                    line.product_name,
                    line.unit_price,
                    line.qty,
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(order_id, count, "已发送订单明细已收敛到总量");
        Ok(count)
    }

    async fn list_products(&self, supplier_key: &str) -> RepositoryResult<Vec<ProductRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_id, supplier_key, name, unit_price,
                   department, dept, category, categorie, famille, rayon, kind
            FROM product
            WHERE supplier_key = ?1 AND active = 1
            ORDER BY name ASC, product_id ASC
            "#,
        )?;
        let products = stmt
            .query_map(params![supplier_key], |row| {
                Ok(ProductRecord {
                    product_id: row.get(0)?,
                    supplier_key: row.get(1)?,
                    name: row.get(2)?,
                    unit_price: row.get(3)?,
                    department: row.get(4)?,
                    dept: row.get(5)?,
                    category: row.get(6)?,
                    categorie: row.get(7)?,
                    famille: row.get(8)?,
                    rayon: row.get(9)?,
                    kind: row.get(10)?,
                    ..Default::default()
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(products)
    }

    async fn upsert_product(&self, record: &ProductRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO product (
                product_id, supplier_key, name, unit_price,
                department, dept, category, categorie, famille, rayon, kind
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(product_id) DO UPDATE SET
                supplier_key = excluded.supplier_key,
                name = excluded.name,
                unit_price = excluded.unit_price,
                department = excluded.department,
                dept = excluded.dept,
                category = excluded.category,
                categorie = excluded.categorie,
                famille = excluded.famille,
                rayon = excluded.rayon,
                kind = excluded.kind,
                active = 1
            "#,
            params![
                record.product_id,
                record.supplier_key,
                record.display_name(),
                record.unit_price,
                record.department,
                record.dept,
                record.category,
                record.categorie,
                record.famille,
                record.rayon,
                record.kind,
            ],
        )?;
        Ok(())
    }
}

// ==========================================
// 行映射
// ==========================================

fn map_order_row(row: &Row) -> SqliteResult<Order> {
    Ok(Order {
        order_id: row.get(0)?,
        supplier_key: row.get(1)?,
        delivery_date: parse_date(2, &row.get::<_, String>(2)?)?,
        status: OrderStatus::from_str(&row.get::<_, String>(3)?),
        sent_at: parse_opt_datetime(4, row.get::<_, Option<String>>(4)?)?,
        cutoff_at: parse_opt_datetime(5, row.get::<_, Option<String>>(5)?)?,
        created_at: parse_datetime(6, &row.get::<_, String>(6)?)?,
    })
}

fn conversion_error(idx: usize, err: chrono::ParseError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_date(idx: usize, raw: &str) -> SqliteResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FMT).map_err(|e| conversion_error(idx, e))
}

fn parse_datetime(idx: usize, raw: &str) -> SqliteResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FMT).map_err(|e| conversion_error(idx, e))
}

fn parse_opt_datetime(idx: usize, raw: Option<String>) -> SqliteResult<Option<NaiveDateTime>> {
    raw.map(|s| parse_datetime(idx, &s)).transpose()
}
