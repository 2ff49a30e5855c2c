//! Seed script for development — populates a fresh database with sample ERP data.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `DATABASE_URL` and `JWT_SECRET` environment variables (reads .env).

use chrono::{Duration, Utc};
use millworks::models::employee::EmployeeStatus;
use millworks::models::material::MaterialCategory;
use millworks::models::order::{PurchaseOrderStatus, SalesOrderStatus};
use millworks::models::user::UserRole;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Token lifetime for the printed development token.
const DEV_TOKEN_EXPIRY_SECS: i64 = 7 * 24 * 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = millworks::config::AppConfig::from_env()?;
    let pool = millworks::db::create_pool(&config.database_url, 5).await?;

    // Run migrations first
    millworks::db::run_migrations(&pool).await?;

    println!("=== Millworks Seed Script ===");

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales_orders")
        .fetch_one(&pool)
        .await?;
    if existing > 0 {
        println!("[skip] Database already has {existing} sales orders");
    } else {
        let customers = seed_customers(&pool).await?;
        let suppliers = seed_suppliers(&pool).await?;
        let materials = seed_materials(&pool).await?;
        seed_sales_orders(&pool, &customers, &materials).await?;
        seed_purchase_orders(&pool, &suppliers, &materials).await?;
        seed_employees(&pool).await?;
    }

    let token = millworks::services::auth::generate_access_token(
        Uuid::new_v4(),
        "dev",
        UserRole::Admin,
        &config.jwt_secret,
        DEV_TOKEN_EXPIRY_SECS,
    )?;

    println!("\n=== Seed complete! ===");
    println!("Dev token (Authorization: Bearer ...):\n{token}");

    Ok(())
}

async fn seed_customers(pool: &PgPool) -> anyhow::Result<Vec<Uuid>> {
    let customers = [
        ("Northwind Fabrication", "orders@northwind.example"),
        ("Contoso Assembly", "buying@contoso.example"),
        ("Fabrikam Tools", "procurement@fabrikam.example"),
    ];

    let mut ids = Vec::with_capacity(customers.len());
    for (name, email) in customers {
        let id: Uuid =
            sqlx::query_scalar("INSERT INTO customers (name, email) VALUES ($1, $2) RETURNING id")
                .bind(name)
                .bind(email)
                .fetch_one(pool)
                .await?;
        ids.push(id);
    }

    println!("[done] Created {} customers", ids.len());
    Ok(ids)
}

async fn seed_suppliers(pool: &PgPool) -> anyhow::Result<Vec<Uuid>> {
    let suppliers = [
        ("Baltic Steel", "Ilze Ozola"),
        ("Rhine Polymers", "Jonas Weber"),
    ];

    let mut ids = Vec::with_capacity(suppliers.len());
    for (name, contact) in suppliers {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO suppliers (name, contact_person) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(contact)
        .fetch_one(pool)
        .await?;
        ids.push(id);
    }

    println!("[done] Created {} suppliers", ids.len());
    Ok(ids)
}

async fn seed_materials(pool: &PgPool) -> anyhow::Result<Vec<Uuid>> {
    let materials = [
        ("Steel sheet 2mm", MaterialCategory::Raw, "m2"),
        ("ABS granulate", MaterialCategory::Raw, "kg"),
        ("Bracket blank", MaterialCategory::SemiFinished, "pcs"),
        ("Housing shell", MaterialCategory::SemiFinished, "pcs"),
        ("Mounting kit", MaterialCategory::Finished, "pcs"),
        ("Control cabinet", MaterialCategory::Finished, "pcs"),
    ];

    let mut ids = Vec::with_capacity(materials.len());
    for (name, category, unit) in materials {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO materials (material_name, category, unit) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(category)
        .bind(unit)
        .fetch_one(pool)
        .await?;
        ids.push(id);
    }

    println!("[done] Created {} materials", ids.len());
    Ok(ids)
}

/// Orders spread over the last ~60 days so both this month and last month have data.
async fn seed_sales_orders(
    pool: &PgPool,
    customers: &[Uuid],
    materials: &[Uuid],
) -> anyhow::Result<()> {
    let statuses = [
        SalesOrderStatus::Pending,
        SalesOrderStatus::Confirmed,
        SalesOrderStatus::Shipped,
        SalesOrderStatus::Delivered,
    ];

    let count = 24;
    for n in 0..count {
        let order_date = Utc::now() - Duration::days(60 - i64::from(n) * 5 / 2);
        let order_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO sales_orders (customer_id, order_date, status, created_at, updated_at)
            VALUES ($1, $2, $3, $2, $2)
            RETURNING id
            "#,
        )
        .bind(customers[n as usize % customers.len()])
        .bind(order_date)
        .bind(statuses[n as usize % statuses.len()])
        .fetch_one(pool)
        .await?;

        for line in 0..2 {
            let material = materials[(n as usize + line) % materials.len()];
            sqlx::query(
                "INSERT INTO sales_order_items (sales_order_id, material_id, quantity, price) VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(material)
            .bind(1 + (n + line as i32) % 7)
            .bind(Decimal::new(1250 + i64::from(n) * 75, 2))
            .execute(pool)
            .await?;
        }
    }

    println!("[done] Created {count} sales orders");
    Ok(())
}

async fn seed_purchase_orders(
    pool: &PgPool,
    suppliers: &[Uuid],
    materials: &[Uuid],
) -> anyhow::Result<()> {
    let statuses = [
        PurchaseOrderStatus::Ordered,
        PurchaseOrderStatus::Received,
        PurchaseOrderStatus::Received,
        PurchaseOrderStatus::Cancelled,
    ];

    let count = 12;
    for n in 0..count {
        let order_date = Utc::now() - Duration::days(55 - i64::from(n) * 4);
        let order_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO purchase_orders (supplier_id, order_date, status, created_at, updated_at)
            VALUES ($1, $2, $3, $2, $2)
            RETURNING id
            "#,
        )
        .bind(suppliers[n as usize % suppliers.len()])
        .bind(order_date)
        .bind(statuses[n as usize % statuses.len()])
        .fetch_one(pool)
        .await?;

        // Raw inputs only
        sqlx::query(
            "INSERT INTO purchase_order_items (purchase_order_id, material_id, quantity, cost) VALUES ($1, $2, $3, $4)",
        )
        .bind(order_id)
        .bind(materials[n as usize % 2])
        .bind(10 + n * 3)
        .bind(Decimal::new(420 + i64::from(n) * 15, 2))
        .execute(pool)
        .await?;
    }

    println!("[done] Created {count} purchase orders");
    Ok(())
}

async fn seed_employees(pool: &PgPool) -> anyhow::Result<()> {
    let employees = [
        ("Anna Berzina", "Production", EmployeeStatus::Active),
        ("Marek Novak", "Production", EmployeeStatus::Active),
        ("Sofia Lind", "Warehouse", EmployeeStatus::Active),
        ("Tomas Ruiz", "Finance", EmployeeStatus::Inactive),
    ];

    for (name, department, status) in employees {
        sqlx::query(
            "INSERT INTO employees (name, department, status) VALUES ($1, $2, $3)",
        )
        .bind(name)
        .bind(department)
        .bind(status)
        .execute(pool)
        .await?;
    }

    println!("[done] Created {} employees", employees.len());
    Ok(())
}
