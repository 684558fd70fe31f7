use argon2::{
    Argon2, PasswordHasher,
    password_hash::{rand_core::OsRng, SaltString},
};
use axum_school_admin_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let pool = create_pool(&config.database_url).await?;

    let admin_id = ensure_admin(&pool, "admin@example.com", "admin123").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user123").await?;
    seed_products(&pool).await?;
    seed_students(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_admin(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    ensure_user_with_role(pool, email, password, "admin").await
}

async fn ensure_user(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    ensure_user_with_role(pool, email, password, "user").await
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let name = email.split('@').next().unwrap_or(email);
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        ("School Shirt", "White short-sleeve uniform shirt", 180000, 120),
        ("Exercise Book Pack", "Pack of ten CR-ruled books", 95000, 300),
        ("House T-Shirt", "Sports-meet house colours", 140000, 80),
        ("School Tie", "Striped junior tie", 60000, 150),
    ];

    for (name, desc, price, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, stock)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_students(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let students = vec![
        ("ST1001", "Kasun Perera", "2014-05-12", "Male", "Primary", 6, "A", "N. Perera"),
        ("ST1002", "Nimali Silva", "2014-11-03", "Female", "Primary", 6, "A", "S. Silva"),
        ("ST1003", "Tharindu Fernando", "2013-01-25", "Male", "Primary", 6, "B", "A. Fernando"),
        ("ST1004", "Sachini Jayawardena", "2008-07-19", "Female", "Secondary", 13, "A", "L. Jayawardena"),
    ];

    for (student_id, name, dob, gender, level, grade, grade_type, parent) in students {
        sqlx::query(
            r#"
            INSERT INTO students
                (id, student_id, name, date_of_birth, gender, grade_level, grade_number, grade_type, parent)
            VALUES ($1, $2, $3, $4::date, $5, $6, $7, $8, $9)
            ON CONFLICT (student_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(name)
        .bind(dob)
        .bind(gender)
        .bind(level)
        .bind(grade)
        .bind(grade_type)
        .bind(parent)
        .execute(pool)
        .await?;
    }

    println!("Seeded students");
    Ok(())
}
