//! # Voucher Repository
//!
//! Sales and purchase vouchers share one repository parameterised by
//! [`VoucherKind`]; each kind has its own header and item tables.
//!
//! ## Stock Rules
//! ```text
//! create (draft)        no stock change
//! create (post = true)  apply item deltas
//! post                  draft → posted, apply item deltas
//! cancel                draft → cancelled: nothing
//!                       posted → cancelled: reverse item deltas
//! delete                reverse item deltas if posted, items cascade
//! ```
//!
//! Sales vouchers issue stock, purchase vouchers receive it.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use stockline_core::picker::{Page, PageRequest};
use stockline_core::pos::Cart;
use stockline_core::report::DateRange;
use stockline_core::stock::{deltas_for_voucher, StockDelta};
use stockline_core::{
    format_voucher_number, CoreError, Voucher, VoucherInput, VoucherItem, VoucherKind, VoucherWithItems,
    MAX_PAGE_SIZE,
};

use super::stock::load_ledger;
use super::{apply_deltas, load_products};
use crate::error::{with_duplicate_value, DbError, DbResult};

const ITEM_COLUMNS: &str = "id, voucher_id, product_id, quantity, unit_price_cents, line_total_cents";

fn header_columns(kind: VoucherKind) -> String {
    format!(
        "id, '{}' AS kind, voucher_number, party_id, party_name, voucher_date, status, \
         subtotal_cents, discount_cents, tax_cents, total_cents, notes, created_at, updated_at",
        kind.as_str()
    )
}

fn entity(kind: VoucherKind) -> &'static str {
    match kind {
        VoucherKind::Sales => "Sales voucher",
        VoucherKind::Purchase => "Purchase voucher",
    }
}

/// Repository for one kind of voucher.
#[derive(Debug, Clone)]
pub struct VoucherRepository {
    pool: SqlitePool,
    kind: VoucherKind,
}

impl VoucherRepository {
    pub fn new(pool: SqlitePool, kind: VoucherKind) -> Self {
        VoucherRepository { pool, kind }
    }

    pub fn kind(&self) -> VoucherKind {
        self.kind
    }

    /// Voucher headers, newest first.
    pub async fn list(&self, request: PageRequest) -> DbResult<Page<Voucher>> {
        let request = request.clamped(MAX_PAGE_SIZE);
        debug!(kind = self.kind.as_str(), page = request.page, "Listing vouchers");

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.kind.table()))
            .fetch_one(&self.pool)
            .await?;
        let sql = format!(
            "SELECT {} FROM {} ORDER BY voucher_date DESC, voucher_number DESC LIMIT ?1 OFFSET ?2",
            header_columns(self.kind),
            self.kind.table()
        );
        let items = sqlx::query_as::<_, Voucher>(&sql)
            .bind(request.limit() as i64)
            .bind(request.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            total: total as u64,
            page: request.page,
            page_size: request.page_size,
        })
    }

    /// Vouchers dated within the range with their items, oldest first.
    pub async fn list_range(&self, range: &DateRange) -> DbResult<Vec<VoucherWithItems>> {
        let sql = format!(
            "SELECT {} FROM {} \
             WHERE (?1 IS NULL OR voucher_date >= ?1) AND (?2 IS NULL OR voucher_date <= ?2) \
             ORDER BY voucher_date, voucher_number",
            header_columns(self.kind),
            self.kind.table()
        );
        let headers = sqlx::query_as::<_, Voucher>(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;

        let items_sql = format!(
            "SELECT i.id, i.voucher_id, i.product_id, i.quantity, i.unit_price_cents, \
             i.line_total_cents \
             FROM {} i JOIN {} v ON v.id = i.voucher_id \
             WHERE (?1 IS NULL OR v.voucher_date >= ?1) AND (?2 IS NULL OR v.voucher_date <= ?2) \
             ORDER BY i.rowid",
            self.kind.items_table(),
            self.kind.table()
        );
        let rows = sqlx::query_as::<_, VoucherItem>(&items_sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;

        let mut by_voucher: HashMap<String, Vec<VoucherItem>> = HashMap::new();
        for item in rows {
            by_voucher.entry(item.voucher_id.clone()).or_default().push(item);
        }

        Ok(headers
            .into_iter()
            .map(|voucher| {
                let items = by_voucher.remove(&voucher.id).unwrap_or_default();
                VoucherWithItems { voucher, items }
            })
            .collect())
    }

    pub async fn get(&self, id: &str) -> DbResult<VoucherWithItems> {
        let mut conn = self.pool.acquire().await?;
        fetch_voucher(&mut conn, self.kind, id).await
    }

    /// The number the next voucher dated `date` would get.
    pub async fn next_number(&self, date: NaiveDate) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        next_number_on(&mut conn, self.kind, date).await
    }

    /// Creates a voucher with its items; moves stock when created posted.
    pub async fn create(&self, input: &VoucherInput) -> DbResult<VoucherWithItems> {
        let mut tx = self.pool.begin().await?;
        let built = self.insert(&mut tx, input).await?;
        tx.commit().await?;
        Ok(built)
    }

    /// Point-of-sale checkout: checks the cart against calculated stock and
    /// writes the posted sales voucher in one transaction.
    ///
    /// `BEGIN IMMEDIATE` takes SQLite's write lock before the ledger is
    /// read, so concurrent checkouts queue up and each one sees the stock
    /// left by the previous.
    pub async fn checkout(
        &self,
        cart: &Cart,
        party_id: Option<String>,
        party_name: Option<String>,
        notes: Option<String>,
    ) -> DbResult<VoucherWithItems> {
        if self.kind != VoucherKind::Sales {
            return Err(DbError::Internal("checkout issues sales vouchers only".to_string()));
        }
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let products =
            load_products(&mut tx, cart.items.iter().map(|item| item.product_id.as_str())).await?;
        let mut on_hand = HashMap::with_capacity(products.len());
        for product in products.values() {
            if !product.is_active() {
                return Err(CoreError::ProductInactive(product.sku.clone()).into());
            }
            let ledger = load_ledger(&mut tx, Some(&product.id)).await?;
            on_hand.insert(product.id.clone(), ledger.snapshot(product).calculated);
        }
        if let Some(shortage) = cart
            .check_stock(|id| on_hand.get(id).copied())
            .into_iter()
            .next()
        {
            warn!(
                sku = %shortage.sku,
                available = shortage.available,
                requested = shortage.requested,
                "Checkout refused"
            );
            return Err(CoreError::from(shortage).into());
        }

        let input = cart.to_voucher_input(party_id, party_name, notes)?;
        let built = self.insert(&mut tx, &input).await?;
        tx.commit().await?;
        Ok(built)
    }

    async fn insert(
        &self,
        conn: &mut SqliteConnection,
        input: &VoucherInput,
    ) -> DbResult<VoucherWithItems> {
        let now = Utc::now();
        let today = now.date_naive();

        let products =
            load_products(&mut *conn, input.items.iter().map(|line| line.product_id.as_str())).await?;
        let number = match input.requested_number()? {
            Some(number) => number,
            None => {
                next_number_on(&mut *conn, self.kind, input.voucher_date.unwrap_or(today)).await?
            }
        };
        let built = VoucherWithItems::build(self.kind, number, input, &products, today, now)?;
        let header = &built.voucher;

        info!(
            kind = self.kind.as_str(),
            voucher_number = %header.voucher_number,
            items = built.items.len(),
            status = header.status.as_str(),
            "Creating voucher"
        );

        let sql = format!(
            r#"
            INSERT INTO {} (
                id, voucher_number, party_id, party_name, voucher_date, status,
                subtotal_cents, discount_cents, tax_cents, total_cents, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            self.kind.table()
        );
        sqlx::query(&sql)
            .bind(&header.id)
            .bind(&header.voucher_number)
            .bind(&header.party_id)
            .bind(&header.party_name)
            .bind(header.voucher_date)
            .bind(header.status)
            .bind(header.subtotal_cents)
            .bind(header.discount_cents)
            .bind(header.tax_cents)
            .bind(header.total_cents)
            .bind(&header.notes)
            .bind(header.created_at)
            .bind(header.updated_at)
            .execute(&mut *conn)
            .await
            .map_err(|e| with_duplicate_value(e.into(), "voucher_number", &header.voucher_number))?;

        let item_sql = format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            self.kind.items_table(),
            ITEM_COLUMNS
        );
        for item in &built.items {
            sqlx::query(&item_sql)
                .bind(&item.id)
                .bind(&item.voucher_id)
                .bind(&item.product_id)
                .bind(item.quantity)
                .bind(item.unit_price_cents)
                .bind(item.line_total_cents)
                .execute(&mut *conn)
                .await?;
        }

        apply_deltas(&mut *conn, deltas_for_voucher(&built), now).await?;
        Ok(built)
    }

    /// Draft → posted. Applies the item deltas.
    pub async fn post(&self, id: &str) -> DbResult<VoucherWithItems> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut voucher = fetch_voucher(&mut tx, self.kind, id).await?;
        voucher.voucher.post(now)?;

        info!(voucher_number = %voucher.voucher.voucher_number, "Posting voucher");

        write_status(&mut tx, self.kind, &voucher.voucher).await?;
        apply_deltas(&mut tx, deltas_for_voucher(&voucher), now).await?;

        tx.commit().await?;
        Ok(voucher)
    }

    /// Cancels a draft or posted voucher, undoing its stock if it was posted.
    pub async fn cancel(&self, id: &str) -> DbResult<VoucherWithItems> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut voucher = fetch_voucher(&mut tx, self.kind, id).await?;
        let undo: Vec<StockDelta> = deltas_for_voucher(&voucher)
            .iter()
            .map(StockDelta::reversed)
            .collect();
        voucher.voucher.cancel(now)?;

        info!(
            voucher_number = %voucher.voucher.voucher_number,
            reversed = undo.len(),
            "Cancelling voucher"
        );

        write_status(&mut tx, self.kind, &voucher.voucher).await?;
        apply_deltas(&mut tx, undo, now).await?;

        tx.commit().await?;
        Ok(voucher)
    }

    /// Deletes a voucher and its items, undoing its stock if it was posted.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let voucher = fetch_voucher(&mut tx, self.kind, id).await?;
        let undo: Vec<StockDelta> = deltas_for_voucher(&voucher)
            .iter()
            .map(StockDelta::reversed)
            .collect();

        info!(voucher_number = %voucher.voucher.voucher_number, "Deleting voucher");

        sqlx::query(&format!("DELETE FROM {} WHERE id = ?1", self.kind.table()))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        apply_deltas(&mut tx, undo, now).await?;

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================

async fn fetch_voucher(
    conn: &mut SqliteConnection,
    kind: VoucherKind,
    id: &str,
) -> DbResult<VoucherWithItems> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?1",
        header_columns(kind),
        kind.table()
    );
    let voucher = sqlx::query_as::<_, Voucher>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found(entity(kind), id))?;

    let items_sql = format!(
        "SELECT {} FROM {} WHERE voucher_id = ?1 ORDER BY rowid",
        ITEM_COLUMNS,
        kind.items_table()
    );
    let items = sqlx::query_as::<_, VoucherItem>(&items_sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(VoucherWithItems { voucher, items })
}

async fn write_status(
    conn: &mut SqliteConnection,
    kind: VoucherKind,
    voucher: &Voucher,
) -> DbResult<()> {
    sqlx::query(&format!(
        "UPDATE {} SET status = ?1, updated_at = ?2 WHERE id = ?3",
        kind.table()
    ))
    .bind(voucher.status)
    .bind(voucher.updated_at)
    .bind(&voucher.id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// `PREFIX-YYYYMMDD-NNNN`, one past the day's count, skipping numbers
/// already typed in by hand.
async fn next_number_on(
    conn: &mut SqliteConnection,
    kind: VoucherKind,
    date: NaiveDate,
) -> DbResult<String> {
    let pattern = format!("{}-{}-%", kind.prefix(), date.format("%Y%m%d"));
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE voucher_number LIKE ?1",
        kind.table()
    ))
    .bind(&pattern)
    .fetch_one(&mut *conn)
    .await?;

    let exists_sql = format!(
        "SELECT COUNT(*) FROM {} WHERE voucher_number = ?1",
        kind.table()
    );
    let mut seq = count as u32 + 1;
    loop {
        let candidate = format_voucher_number(kind, date, seq);
        let taken: i64 = sqlx::query_scalar(&exists_sql)
            .bind(&candidate)
            .fetch_one(&mut *conn)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
        seq += 1;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, product, product_input, stock_of};
    use stockline_core::{AmountInput, CoreError, ProductStatus, VoucherLineInput, VoucherStatus};

    fn input(lines: &[(&str, i64)], post: bool) -> VoucherInput {
        VoucherInput {
            voucher_number: None,
            party_id: None,
            party_name: Some("Walk-in".to_string()),
            voucher_date: NaiveDate::from_ymd_opt(2026, 3, 14),
            discount: None,
            tax_bps: 0,
            notes: None,
            post,
            items: lines
                .iter()
                .map(|(product_id, quantity)| VoucherLineInput {
                    product_id: product_id.to_string(),
                    quantity: *quantity,
                    unit_price: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_draft_then_post_then_cancel() {
        let db = db().await;
        let a = product(&db, "A", 20).await;
        let b = product(&db, "B", 20).await;
        let repo = db.vouchers(VoucherKind::Sales);

        let draft = repo
            .create(&input(&[(a.id.as_str(), 3), (b.id.as_str(), 2)], false))
            .await
            .unwrap();
        assert_eq!(draft.voucher.status, VoucherStatus::Draft);
        assert_eq!(draft.voucher.voucher_number, "SV-20260314-0001");
        assert_eq!(draft.voucher.subtotal_cents, 5 * 650);
        assert_eq!(stock_of(&db, &a.id).await, 20);

        let posted = repo.post(&draft.voucher.id).await.unwrap();
        assert_eq!(posted.voucher.status, VoucherStatus::Posted);
        assert_eq!(stock_of(&db, &a.id).await, 17);
        assert_eq!(stock_of(&db, &b.id).await, 18);

        let err = repo.post(&draft.voucher.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidVoucherStatus { .. })
        ));

        repo.cancel(&draft.voucher.id).await.unwrap();
        assert_eq!(stock_of(&db, &a.id).await, 20);
        assert_eq!(stock_of(&db, &b.id).await, 20);
        assert_eq!(
            repo.get(&draft.voucher.id).await.unwrap().voucher.status,
            VoucherStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_purchase_voucher_receives_and_delete_reverses() {
        let db = db().await;
        let a = product(&db, "A", 0).await;
        let repo = db.vouchers(VoucherKind::Purchase);

        let created = repo.create(&input(&[(a.id.as_str(), 12)], true)).await.unwrap();
        assert_eq!(created.voucher.voucher_number, "PV-20260314-0001");
        assert_eq!(created.items[0].unit_price_cents, 400);
        assert_eq!(stock_of(&db, &a.id).await, 12);

        repo.delete(&created.voucher.id).await.unwrap();
        assert_eq!(stock_of(&db, &a.id).await, 0);
        assert!(matches!(
            repo.get(&created.voucher.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_numbers_are_sequential_and_unique() {
        let db = db().await;
        let a = product(&db, "A", 50).await;
        let repo = db.vouchers(VoucherKind::Sales);
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

        let mut typed = input(&[(a.id.as_str(), 1)], false);
        typed.voucher_number = Some("SV-20260314-0002".to_string());
        repo.create(&typed).await.unwrap();

        // One voucher today puts the counter at 0002, which is taken
        assert_eq!(repo.next_number(date).await.unwrap(), "SV-20260314-0003");

        let err = repo.create(&typed).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Sales and purchase numbering are independent
        assert_eq!(
            db.vouchers(VoucherKind::Purchase).next_number(date).await.unwrap(),
            "PV-20260314-0001"
        );
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back() {
        let db = db().await;
        let a = product(&db, "A", 10).await;
        let repo = db.vouchers(VoucherKind::Sales);

        let err = repo
            .create(&input(&[(a.id.as_str(), 1), ("missing", 1)], true))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
        assert_eq!(stock_of(&db, &a.id).await, 10);
        assert_eq!(repo.list(PageRequest::default()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_list_range_includes_items() {
        let db = db().await;
        let a = product(&db, "A", 10).await;
        let repo = db.vouchers(VoucherKind::Sales);

        let mut priced = input(&[(a.id.as_str(), 2)], true);
        priced.items[0].unit_price = Some(AmountInput::Text("$7.00".to_string()));
        repo.create(&priced).await.unwrap();

        let all = repo.list_range(&DateRange::all()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].items.len(), 1);
        assert_eq!(all[0].voucher.total_cents, 1_400);

        let before = DateRange::new(None, NaiveDate::from_ymd_opt(2026, 3, 1)).unwrap();
        assert!(repo.list_range(&before).await.unwrap().is_empty());
    }

    fn cart_of(product: &stockline_core::Product, quantity: i64) -> Cart {
        let mut cart = Cart::new();
        cart.add_item(product, quantity).unwrap();
        cart
    }

    #[tokio::test]
    async fn test_checkout_checks_stock_inside_the_write() {
        let db = db().await;
        let a = product(&db, "A", 1).await;
        let repo = db.vouchers(VoucherKind::Sales);

        let sold = repo
            .checkout(&cart_of(&a, 1), None, Some("Walk-in".to_string()), None)
            .await
            .unwrap();
        assert_eq!(sold.voucher.status, VoucherStatus::Posted);
        assert_eq!(stock_of(&db, &a.id).await, 0);

        let err = repo.checkout(&cart_of(&a, 1), None, None, None).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 0, requested: 1, .. })
        ));
        assert_eq!(repo.list(PageRequest::default()).await.unwrap().total, 1);

        let err = db
            .vouchers(VoucherKind::Purchase)
            .checkout(&cart_of(&a, 1), None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Internal(_)));
    }

    #[tokio::test]
    async fn test_checkout_rechecks_product_status() {
        let db = db().await;
        let a = product(&db, "A", 5).await;
        let cart = cart_of(&a, 1);

        let mut retired = product_input("A", 5);
        retired.status = Some(ProductStatus::Inactive);
        db.products().update(&a.id, &retired).await.unwrap();

        let err = db
            .vouchers(VoucherKind::Sales)
            .checkout(&cart, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductInactive(_))));
        assert_eq!(stock_of(&db, &a.id).await, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_checkouts_cannot_oversell() {
        let path = std::env::temp_dir().join(format!("stockline-{}.db", stockline_core::new_id()));
        let db = crate::Database::new(crate::DbConfig::new(path.clone()).max_connections(4))
            .await
            .unwrap();
        let a = product(&db, "LAST", 1).await;
        let cart = cart_of(&a, 1);

        let first = db.vouchers(VoucherKind::Sales);
        let second = db.vouchers(VoucherKind::Sales);
        let (one, two) = tokio::join!(
            first.checkout(&cart, None, None, None),
            second.checkout(&cart, None, None, None)
        );

        let refused = [&one, &two]
            .iter()
            .filter(|result| {
                matches!(
                    result,
                    Err(DbError::Domain(CoreError::InsufficientStock { .. }))
                )
            })
            .count();
        assert_eq!(refused, 1, "one checkout must win: {one:?} / {two:?}");
        assert!(one.is_ok() || two.is_ok());
        assert_eq!(stock_of(&db, &a.id).await, 0);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
