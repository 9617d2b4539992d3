use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ordernest_types::domain::order::{Order, OrderListFilter, OrderReceipt, OrderStatus};
use ordernest_types::domain::pagination::Pagination;
use ordernest_types::domain::user::{NewUser, User};
use ordernest_types::ports::order_repository::{OrderRepository, RepoError};
use ordernest_types::ports::user_repository::UserRepository;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

const MIGRATIONS: [&str; 3] = [
    include_str!("../migrations/0001_create_users.sql"),
    include_str!("../migrations/0002_create_orders.sql"),
    include_str!("../migrations/0003_index_orders_listing.sql"),
];

const ORDER_COLUMNS: &str = "id, consignment_id, merchant_order_id, recipient_name, recipient_address, \
     recipient_phone, description, instruction, amount_to_collect, delivery_fee, cod_fee, total_fee, \
     promo_discount, discount, order_type_id, order_type, item_type, status, transfer_status, archive, \
     created_by, updated_by, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct DbOrder {
    id: i64,
    consignment_id: String,
    merchant_order_id: String,
    recipient_name: String,
    recipient_address: String,
    recipient_phone: String,
    description: String,
    instruction: String,
    amount_to_collect: i64,
    delivery_fee: f64,
    cod_fee: f64,
    total_fee: f64,
    promo_discount: i64,
    discount: i64,
    order_type_id: i64,
    order_type: String,
    item_type: String,
    status: String,
    transfer_status: i64,
    archive: i64,
    created_by: i64,
    updated_by: i64,
    created_at: String,
    updated_at: String,
}

#[derive(FromRow)]
struct DbUser {
    id: i64,
    username: String,
    password_hash: String,
    created_at: String,
    updated_at: String,
}

fn db_err(e: impl ToString) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

fn to_u64(v: i64) -> Result<u64, RepoError> {
    u64::try_from(v).map_err(db_err)
}

fn to_i64(v: u64) -> Result<i64, RepoError> {
    i64::try_from(v).map_err(db_err)
}

fn to_u8(v: i64) -> Result<u8, RepoError> {
    u8::try_from(v).map_err(db_err)
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        Ok(Order {
            id: to_u64(self.id)?,
            consignment_id: self.consignment_id,
            merchant_order_id: self.merchant_order_id,
            recipient_name: self.recipient_name,
            recipient_address: self.recipient_address,
            recipient_phone: self.recipient_phone,
            description: self.description,
            instruction: self.instruction,
            amount_to_collect: self.amount_to_collect,
            delivery_fee: self.delivery_fee,
            cod_fee: self.cod_fee,
            total_fee: self.total_fee,
            promo_discount: self.promo_discount,
            discount: self.discount,
            order_type_id: self.order_type_id,
            order_type: self.order_type,
            item_type: self.item_type,
            status: OrderStatus::from_str(&self.status).map_err(db_err)?,
            transfer_status: to_u8(self.transfer_status)?,
            archive: to_u8(self.archive)?,
            created_by: to_u64(self.created_by)?,
            updated_by: to_u64(self.updated_by)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

impl DbUser {
    fn into_user(self) -> Result<User, RepoError> {
        Ok(User {
            id: to_u64(self.id)?,
            username: self.username,
            password_hash: self.password_hash,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|d| d.is_unique_violation())
        .unwrap_or(false)
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        for ddl in MIGRATIONS {
            sqlx::query(ddl).execute(&pool).await?;
        }
        tracing::debug!(migrations = MIGRATIONS.len(), "sqlite schema ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create(&self, order: Order) -> Result<OrderReceipt, RepoError> {
        let query = format!(
            "INSERT INTO orders ({}) VALUES (NULL, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            ORDER_COLUMNS
        );
        sqlx::query(&query)
            .bind(&order.consignment_id)
            .bind(&order.merchant_order_id)
            .bind(&order.recipient_name)
            .bind(&order.recipient_address)
            .bind(&order.recipient_phone)
            .bind(&order.description)
            .bind(&order.instruction)
            .bind(order.amount_to_collect)
            .bind(order.delivery_fee)
            .bind(order.cod_fee)
            .bind(order.total_fee)
            .bind(order.promo_discount)
            .bind(order.discount)
            .bind(order.order_type_id)
            .bind(&order.order_type)
            .bind(&order.item_type)
            .bind(order.status.as_str())
            .bind(i64::from(order.transfer_status))
            .bind(i64::from(order.archive))
            .bind(to_i64(order.created_by)?)
            .bind(to_i64(order.updated_by)?)
            .bind(order.created_at.to_rfc3339())
            .bind(order.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepoError::Conflict(format!("consignment {} already exists", order.consignment_id))
                } else {
                    db_err(e)
                }
            })?;
        Ok(order.receipt())
    }

    async fn get(&self, consignment_id: &str) -> Result<Option<Order>, RepoError> {
        let query = format!("SELECT {} FROM orders WHERE consignment_id = ?", ORDER_COLUMNS);
        let row: Option<DbOrder> = sqlx::query_as(&query)
            .bind(consignment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| r.into_order()).transpose()
    }

    async fn cancel(&self, consignment_id: &str, user_id: u64) -> Result<(), RepoError> {
        let updated = sqlx::query(
            "UPDATE orders SET status = ?, updated_by = ?, updated_at = ? WHERE consignment_id = ?",
        )
        .bind(OrderStatus::Canceled.as_str())
        .bind(to_i64(user_id)?)
        .bind(Utc::now().to_rfc3339())
        .bind(consignment_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: &OrderListFilter,
        page: &Pagination,
    ) -> Result<(Vec<Order>, u64), RepoError> {
        let created_by = to_i64(filter.created_by)?;
        let transfer_status = i64::from(filter.transfer_status);
        let archive = i64::from(filter.archive);

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM orders WHERE created_by = ? AND transfer_status = ? AND archive = ?",
        )
        .bind(created_by)
        .bind(transfer_status)
        .bind(archive)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let query = format!(
            "SELECT {} FROM orders WHERE created_by = ? AND transfer_status = ? AND archive = ? \
             ORDER BY id LIMIT ? OFFSET ?",
            ORDER_COLUMNS
        );
        let rows: Vec<DbOrder> = sqlx::query_as(&query)
            .bind(created_by)
            .bind(transfer_status)
            .bind(archive)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let orders = rows
            .into_iter()
            .map(|r| r.into_order())
            .collect::<Result<Vec<_>, _>>()?;
        Ok((orders, to_u64(total)?))
    }
}

#[async_trait]
impl UserRepository for SqliteRepo {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let now = Utc::now().to_rfc3339();
        let res = sqlx::query(
            "INSERT INTO users (username, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepoError::Conflict(format!("username {} already exists", user.username))
            } else {
                db_err(e)
            }
        })?;
        self.get_by_id(to_u64(res.last_insert_rowid())?).await
    }

    async fn get_by_username(&self, username: &str) -> Result<User, RepoError> {
        let row: Option<DbUser> = sqlx::query_as(
            "SELECT id, username, password_hash, created_at, updated_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.ok_or(RepoError::NotFound)?.into_user()
    }

    async fn get_by_id(&self, id: u64) -> Result<User, RepoError> {
        let row: Option<DbUser> = sqlx::query_as(
            "SELECT id, username, password_hash, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.ok_or(RepoError::NotFound)?.into_user()
    }
}
