//! Dashboard statistics aggregation queries.
//!
//! Monthly totals are scoped to the current calendar month; the product and
//! category leaderboards cover all sales ever recorded.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, Duration, Local, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::employee::EmployeeStatus;
use crate::models::material::MaterialCategory;
use crate::models::order::{
    PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus, SalesOrder, SalesOrderItem,
    SalesOrderStatus,
};
use crate::models::party::{Customer, Supplier};

/// Number of orders shown in each "recent orders" feed.
pub const RECENT_ORDERS_LIMIT: i64 = 10;

/// Number of entries in each best-seller leaderboard.
pub const LEADERBOARD_LIMIT: i64 = 10;

/// Aggregated statistics for the dashboard overview page.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(with = "rust_decimal::serde::float")]
    pub sales_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub purchase_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
    pub last_sales_orders: Vec<RecentSalesOrder>,
    pub last_purchase_orders: Vec<RecentPurchaseOrder>,
    pub top_products: Vec<TopProduct>,
    pub top_categories: Vec<TopCategory>,
    pub active_employees: i64,
    pub received_orders: i64,
    pub pending_orders: i64,
}

/// Sales order with its customer resolved.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentSalesOrder {
    pub id: Uuid,
    pub customer: Option<Customer>,
    pub date: DateTime<Utc>,
    pub status: SalesOrderStatus,
    pub items: Vec<SalesOrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Purchase order with its supplier resolved.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentPurchaseOrder {
    pub id: Uuid,
    pub supplier: Option<Supplier>,
    pub order_date: DateTime<Utc>,
    pub status: PurchaseOrderStatus,
    pub items: Vec<PurchaseOrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Units sold of a single material. `name` is `None` when the material no
/// longer exists.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    #[serde(rename = "material")]
    pub material_id: Uuid,
    pub name: Option<String>,
    pub total_sold: i64,
}

/// Units sold per material category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopCategory {
    pub category: MaterialCategory,
    pub total_sold: i64,
}

/// Compute dashboard statistics relative to the server's local clock.
pub async fn compute_dashboard_stats(pool: &PgPool) -> Result<DashboardStats, AppError> {
    compute_dashboard_stats_at(pool, &Local::now()).await
}

/// Compute dashboard statistics with the monthly window anchored at `now`.
///
/// All sub-queries run concurrently; the first failure aborts the whole
/// computation and no partial result is returned.
pub async fn compute_dashboard_stats_at<Tz: TimeZone>(
    pool: &PgPool,
    now: &DateTime<Tz>,
) -> Result<DashboardStats, AppError> {
    let since = month_start(now);

    let (
        sales_total,
        purchase_total,
        last_sales_orders,
        last_purchase_orders,
        top_products,
        top_categories,
        active_employees,
        received_orders,
        pending_orders,
    ) = tokio::try_join!(
        fetch_sales_total(pool, since),
        fetch_purchase_total(pool, since),
        fetch_recent_sales_orders(pool),
        fetch_recent_purchase_orders(pool),
        fetch_top_products(pool),
        fetch_top_categories(pool),
        fetch_active_employee_count(pool),
        fetch_received_order_count(pool),
        fetch_pending_order_count(pool),
    )?;

    let profit = sales_total - purchase_total;

    tracing::debug!(
        since = %since,
        %sales_total,
        %purchase_total,
        %profit,
        "Computed dashboard stats"
    );

    Ok(DashboardStats {
        sales_total,
        purchase_total,
        profit,
        last_sales_orders,
        last_purchase_orders,
        top_products,
        top_categories,
        active_employees,
        received_orders,
        pending_orders,
    })
}

/// First instant of the calendar month containing `now`, in `now`'s zone.
pub fn month_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let today = now.date_naive();
    let first_day = today - Days::new(u64::from(today.day0()));
    let midnight = first_day.and_time(NaiveTime::MIN);
    let tz = now.timezone();

    // A DST jump can skip local midnight; take the first instant after the gap.
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Sum of price × quantity over sales order lines dated on or after `since`.
async fn fetch_sales_total(pool: &PgPool, since: DateTime<Utc>) -> Result<Decimal, AppError> {
    let total = sqlx::query_scalar::<_, Decimal>(
        r#"
        SELECT COALESCE(SUM(i.price * i.quantity), 0)
        FROM sales_orders o
        INNER JOIN sales_order_items i ON i.sales_order_id = o.id
        WHERE o.order_date >= $1
        "#,
    )
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// Sum of cost × quantity over purchase order lines dated on or after `since`.
async fn fetch_purchase_total(pool: &PgPool, since: DateTime<Utc>) -> Result<Decimal, AppError> {
    let total = sqlx::query_scalar::<_, Decimal>(
        r#"
        SELECT COALESCE(SUM(i.cost * i.quantity), 0)
        FROM purchase_orders o
        INNER JOIN purchase_order_items i ON i.purchase_order_id = o.id
        WHERE o.order_date >= $1
        "#,
    )
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// Fetch the most recently created sales orders with items and customers.
async fn fetch_recent_sales_orders(pool: &PgPool) -> Result<Vec<RecentSalesOrder>, AppError> {
    let orders = sqlx::query_as::<_, SalesOrder>(
        r#"
        SELECT id, customer_id, order_date, status, created_at, updated_at
        FROM sales_orders
        ORDER BY created_at DESC, id DESC
        LIMIT $1
        "#,
    )
    .bind(RECENT_ORDERS_LIMIT)
    .fetch_all(pool)
    .await?;

    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let customer_ids = distinct_ids(orders.iter().filter_map(|o| o.customer_id));

    let (items, customers) = tokio::try_join!(
        sqlx::query_as::<_, SalesOrderItem>(
            r#"
            SELECT sales_order_id, material_id, quantity, price
            FROM sales_order_items
            WHERE sales_order_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&order_ids)
        .fetch_all(pool),
        sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, address, created_at, updated_at
            FROM customers
            WHERE id = ANY($1)
            "#,
        )
        .bind(&customer_ids)
        .fetch_all(pool),
    )?;

    Ok(join_sales_orders(orders, items, customers))
}

/// Fetch the most recently created purchase orders with items and suppliers.
async fn fetch_recent_purchase_orders(
    pool: &PgPool,
) -> Result<Vec<RecentPurchaseOrder>, AppError> {
    let orders = sqlx::query_as::<_, PurchaseOrder>(
        r#"
        SELECT id, supplier_id, order_date, status, created_at, updated_at
        FROM purchase_orders
        ORDER BY created_at DESC, id DESC
        LIMIT $1
        "#,
    )
    .bind(RECENT_ORDERS_LIMIT)
    .fetch_all(pool)
    .await?;

    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let supplier_ids = distinct_ids(orders.iter().filter_map(|o| o.supplier_id));

    let (items, suppliers) = tokio::try_join!(
        sqlx::query_as::<_, PurchaseOrderItem>(
            r#"
            SELECT purchase_order_id, material_id, quantity, cost
            FROM purchase_order_items
            WHERE purchase_order_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&order_ids)
        .fetch_all(pool),
        sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, contact_person, email, phone, address, created_at, updated_at
            FROM suppliers
            WHERE id = ANY($1)
            "#,
        )
        .bind(&supplier_ids)
        .fetch_all(pool),
    )?;

    Ok(join_purchase_orders(orders, items, suppliers))
}

/// Top materials by total quantity sold across all sales orders.
///
/// Ties are broken by material id so repeated calls return the same order.
async fn fetch_top_products(pool: &PgPool) -> Result<Vec<TopProduct>, AppError> {
    let rows = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT
            i.material_id,
            m.material_name AS name,
            SUM(i.quantity)::BIGINT AS total_sold
        FROM sales_order_items i
        LEFT JOIN materials m ON m.id = i.material_id
        GROUP BY i.material_id, m.material_name
        ORDER BY total_sold DESC, i.material_id ASC
        LIMIT $1
        "#,
    )
    .bind(LEADERBOARD_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Top material categories by total quantity sold.
///
/// Lines whose material cannot be resolved are dropped by the inner join.
async fn fetch_top_categories(pool: &PgPool) -> Result<Vec<TopCategory>, AppError> {
    let rows = sqlx::query_as::<_, TopCategory>(
        r#"
        SELECT
            m.category,
            SUM(i.quantity)::BIGINT AS total_sold
        FROM sales_order_items i
        INNER JOIN materials m ON m.id = i.material_id
        GROUP BY m.category
        ORDER BY total_sold DESC, m.category ASC
        LIMIT $1
        "#,
    )
    .bind(LEADERBOARD_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn fetch_active_employee_count(pool: &PgPool) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE status = $1")
        .bind(EmployeeStatus::Active)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

async fn fetch_received_order_count(pool: &PgPool) -> Result<i64, AppError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM purchase_orders WHERE status = $1")
            .bind(PurchaseOrderStatus::Received)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Count sales orders that are not yet shipped.
async fn fetch_pending_order_count(pool: &PgPool) -> Result<i64, AppError> {
    let [first, second] = SalesOrderStatus::OPEN;
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sales_orders WHERE status IN ($1, $2)",
    )
    .bind(first)
    .bind(second)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Collect ids into a de-duplicated list for an `= ANY($1)` lookup.
fn distinct_ids(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = ids.collect();
    out.sort_unstable();
    out.dedup();
    out
}

fn group_by_order<T>(items: Vec<T>, key: impl Fn(&T) -> Uuid) -> HashMap<Uuid, Vec<T>> {
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for item in items {
        grouped.entry(key(&item)).or_default().push(item);
    }
    grouped
}

/// Attach line items and customers to sales order headers, preserving header order.
fn join_sales_orders(
    orders: Vec<SalesOrder>,
    items: Vec<SalesOrderItem>,
    customers: Vec<Customer>,
) -> Vec<RecentSalesOrder> {
    let mut items = group_by_order(items, |i| i.sales_order_id);
    let customers: HashMap<Uuid, Customer> = customers.into_iter().map(|c| (c.id, c)).collect();

    orders
        .into_iter()
        .map(|o| RecentSalesOrder {
            id: o.id,
            customer: o.customer_id.and_then(|id| customers.get(&id).cloned()),
            date: o.order_date,
            status: o.status,
            items: items.remove(&o.id).unwrap_or_default(),
            created_at: o.created_at,
            updated_at: o.updated_at,
        })
        .collect()
}

/// Attach line items and suppliers to purchase order headers, preserving header order.
fn join_purchase_orders(
    orders: Vec<PurchaseOrder>,
    items: Vec<PurchaseOrderItem>,
    suppliers: Vec<Supplier>,
) -> Vec<RecentPurchaseOrder> {
    let mut items = group_by_order(items, |i| i.purchase_order_id);
    let suppliers: HashMap<Uuid, Supplier> = suppliers.into_iter().map(|s| (s.id, s)).collect();

    orders
        .into_iter()
        .map(|o| RecentPurchaseOrder {
            id: o.id,
            supplier: o.supplier_id.and_then(|id| suppliers.get(&id).cloned()),
            order_date: o.order_date,
            status: o.status,
            items: items.remove(&o.id).unwrap_or_default(),
            created_at: o.created_at,
            updated_at: o.updated_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};
    use rust_decimal_macros::dec;

    fn customer(id: Uuid, name: &str) -> Customer {
        Customer {
            id,
            name: name.to_string(),
            email: None,
            phone: None,
            address: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sales_order(id: Uuid, customer_id: Option<Uuid>) -> SalesOrder {
        SalesOrder {
            id,
            customer_id,
            order_date: Utc::now(),
            status: SalesOrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sales_item(order: Uuid, quantity: i32) -> SalesOrderItem {
        SalesOrderItem {
            sales_order_id: order,
            material_id: Uuid::new_v4(),
            quantity,
            price: dec!(1.00),
        }
    }

    #[test]
    fn month_start_in_utc() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 13, 45, 9).unwrap();
        assert_eq!(
            month_start(&now),
            Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn month_start_is_fixed_point() {
        let first = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(month_start(&first), first);
        let before = first - Duration::seconds(1);
        assert_eq!(
            month_start(&before),
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn month_start_uses_local_midnight_of_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        // 2026-11-01 01:00 at +02:00 is still October in UTC
        let now = tz.with_ymd_and_hms(2026, 11, 1, 1, 0, 0).unwrap();
        let expected = NaiveDate::from_ymd_opt(2026, 10, 31)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(month_start(&now), expected);
    }

    #[test]
    fn distinct_ids_removes_duplicates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let ids = distinct_ids([a, b, a, a].into_iter());
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a) && ids.contains(&b));
    }

    #[test]
    fn join_preserves_order_and_resolves_customers() {
        let (o1, o2, o3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let shared = Uuid::new_v4();
        let orders = vec![
            sales_order(o1, Some(shared)),
            sales_order(o2, Some(shared)),
            sales_order(o3, None),
        ];
        let items = vec![sales_item(o2, 1), sales_item(o1, 2), sales_item(o2, 3)];
        let customers = vec![customer(shared, "Acme")];

        let joined = join_sales_orders(orders, items, customers);
        let ids: Vec<Uuid> = joined.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![o1, o2, o3]);

        assert_eq!(joined[0].customer.as_ref().unwrap().name, "Acme");
        assert_eq!(joined[1].customer.as_ref().unwrap().name, "Acme");
        assert!(joined[2].customer.is_none());

        let quantities: Vec<i32> = joined[1].items.iter().map(|i| i.quantity).collect();
        assert_eq!(quantities, vec![1, 3]);
        assert_eq!(joined[0].items.len(), 1);
        assert!(joined[2].items.is_empty());
    }

    #[test]
    fn join_leaves_dangling_customer_unresolved() {
        let order = Uuid::new_v4();
        let joined = join_sales_orders(
            vec![sales_order(order, Some(Uuid::new_v4()))],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(joined.len(), 1);
        assert!(joined[0].customer.is_none());
    }

    #[test]
    fn join_purchase_orders_resolves_suppliers() {
        let order = Uuid::new_v4();
        let supplier_id = Uuid::new_v4();
        let header = PurchaseOrder {
            id: order,
            supplier_id: Some(supplier_id),
            order_date: Utc::now(),
            status: PurchaseOrderStatus::Received,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let item = PurchaseOrderItem {
            purchase_order_id: order,
            material_id: Uuid::new_v4(),
            quantity: 4,
            cost: dec!(2.25),
        };
        let supplier = Supplier {
            id: supplier_id,
            name: "Steelco".to_string(),
            contact_person: None,
            email: None,
            phone: None,
            address: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let joined = join_purchase_orders(vec![header], vec![item.clone()], vec![supplier]);
        assert_eq!(joined[0].supplier.as_ref().unwrap().name, "Steelco");
        assert_eq!(joined[0].items, vec![item]);
    }

    #[test]
    fn stats_serialize_with_camel_case_numbers() {
        let stats = DashboardStats {
            sales_total: dec!(70.00),
            purchase_total: dec!(100.50),
            profit: dec!(70.00) - dec!(100.50),
            last_sales_orders: Vec::new(),
            last_purchase_orders: Vec::new(),
            top_products: vec![TopProduct {
                material_id: Uuid::nil(),
                name: Some("Bolt M8".to_string()),
                total_sold: 42,
            }],
            top_categories: vec![TopCategory {
                category: MaterialCategory::SemiFinished,
                total_sold: 42,
            }],
            active_employees: 3,
            received_orders: 1,
            pending_orders: 2,
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["salesTotal"], 70.0);
        assert_eq!(json["purchaseTotal"], 100.5);
        assert_eq!(json["profit"], -30.5);
        assert_eq!(json["topProducts"][0]["name"], "Bolt M8");
        assert_eq!(json["topProducts"][0]["totalSold"], 42);
        assert_eq!(json["topCategories"][0]["category"], "Semi-finished");
        assert_eq!(json["activeEmployees"], 3);
        assert_eq!(json["receivedOrders"], 1);
        assert_eq!(json["pendingOrders"], 2);
        assert!(json["lastSalesOrders"].as_array().unwrap().is_empty());
        assert!(json["lastPurchaseOrders"].as_array().unwrap().is_empty());
    }
}
