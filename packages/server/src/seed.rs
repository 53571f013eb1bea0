use anyhow::Context;
use chrono::{NaiveDate, Utc};
use common::{
    GatewayStatus, PaymentMethod, PaymentStatus, RegistrationStatus, RegistrationType,
};
use sea_orm::sea_query::{
    Index, IndexCreateStatement, MysqlQueryBuilder, OnConflict, PostgresQueryBuilder,
    SqliteQueryBuilder,
};
use sea_orm::*;
use serde_json::json;
use tracing::info;

use crate::entity::{payment_record, registration, user, workshop};
use crate::models::workshop::NewWorkshop;
use crate::utils::hash;

/// Ensure required database indexes exist.
///
/// Schema sync only creates single-column indexes, so composite ones are
/// created here on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Admin list: WHERE status = ? ORDER BY registered_at DESC
    let name = "idx_registration_status_registered";
    create_index(
        db,
        name,
        Index::create()
            .if_not_exists()
            .name(name)
            .table(registration::Entity)
            .col(registration::Column::Status)
            .col(registration::Column::RegisteredAt)
            .to_owned(),
    )
    .await;

    // Workshop list sorted by date within a category
    let name = "idx_workshop_category_date";
    create_index(
        db,
        name,
        Index::create()
            .if_not_exists()
            .name(name)
            .table(workshop::Entity)
            .col(workshop::Column::Category)
            .col(workshop::Column::Date)
            .to_owned(),
    )
    .await;

    Ok(())
}

async fn create_index(db: &DatabaseConnection, name: &str, stmt: IndexCreateStatement) {
    let sql = match db.get_database_backend() {
        DbBackend::Postgres => stmt.to_string(PostgresQueryBuilder),
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        _ => stmt.to_string(MysqlQueryBuilder),
    };

    match db.execute_unprepared(&sql).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
    }
}

struct DemoUser {
    name: &'static str,
    email: &'static str,
    password: &'static str,
    role: &'static str,
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        name: "John Doe",
        email: "john@example.com",
        password: "password123",
        role: user::DEFAULT_ROLE,
    },
    DemoUser {
        name: "Admin User",
        email: "admin@example.com",
        password: "admin123",
        role: user::ADMIN_ROLE,
    },
    DemoUser {
        name: "Sarah Johnson",
        email: "sarah@example.com",
        password: "password123",
        role: user::DEFAULT_ROLE,
    },
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| ToString::to_string(s)).collect()
}

fn demo_workshops() -> anyhow::Result<Vec<NewWorkshop>> {
    let date = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").context("demo workshop date");

    Ok(vec![
        NewWorkshop {
            title: "Advanced React Development".into(),
            description: "Master advanced React concepts including hooks, context, and performance optimization.".into(),
            organizer: "TechCorp Solutions".into(),
            instructor: "Sarah Johnson".into(),
            date: date("2024-02-15")?,
            time: "10:00 AM".into(),
            duration: "6 hours".into(),
            location: "Online".into(),
            city: "Mumbai".into(),
            price: 2999,
            mode: RegistrationType::Automated,
            category: "Technology".into(),
            level: "Advanced".into(),
            max_seats: 50,
            featured: true,
            image_url: Some("/placeholder.svg?height=300&width=400".into()),
            tags: strings(&[
                "react",
                "javascript",
                "frontend",
                "hooks",
                "performance",
                "web development",
            ]),
            prerequisites: strings(&["Basic React knowledge", "JavaScript ES6+", "HTML/CSS"]),
            what_you_learn: strings(&[
                "Advanced React Hooks patterns",
                "Context API and state management",
                "Performance optimization techniques",
                "Testing React applications",
                "Deployment and CI/CD",
            ]),
            agenda: vec![
                json!({"time": "10:00 - 11:30", "topic": "Advanced Hooks and Custom Hooks"}),
                json!({"time": "11:45 - 13:00", "topic": "Context API and State Management"}),
                json!({"time": "14:00 - 15:30", "topic": "Performance Optimization"}),
                json!({"time": "15:45 - 16:00", "topic": "Q&A and Wrap-up"}),
            ],
        },
        NewWorkshop {
            title: "Digital Marketing Masterclass".into(),
            description: "Learn cutting-edge digital marketing strategies from industry experts.".into(),
            organizer: "Marketing Pro Inc".into(),
            instructor: "Rahul Sharma".into(),
            date: date("2024-02-20")?,
            time: "2:00 PM".into(),
            duration: "4 hours".into(),
            location: "Bandra, Mumbai".into(),
            city: "Mumbai".into(),
            price: 0,
            mode: RegistrationType::Manual,
            category: "Marketing".into(),
            level: "Intermediate".into(),
            max_seats: 100,
            featured: false,
            image_url: Some("/placeholder.svg?height=300&width=400".into()),
            tags: strings(&[
                "digital marketing",
                "seo",
                "social media",
                "advertising",
                "analytics",
            ]),
            prerequisites: strings(&[
                "Basic marketing knowledge",
                "Social media familiarity",
                "Computer literacy",
            ]),
            what_you_learn: strings(&[
                "Social media marketing strategies",
                "Search Engine Optimization (SEO)",
                "Content marketing best practices",
                "Google Ads and Facebook Ads",
                "Analytics and performance tracking",
            ]),
            agenda: vec![
                json!({"time": "14:00 - 15:00", "topic": "Digital Marketing Fundamentals"}),
                json!({"time": "15:15 - 16:15", "topic": "Social Media and Content Strategy"}),
                json!({"time": "16:30 - 17:30", "topic": "SEO and Paid Advertising"}),
                json!({"time": "17:30 - 18:00", "topic": "Analytics and Q&A"}),
            ],
        },
    ])
}

/// Transactions known to the simulated payment gateway.
const DEMO_PAYMENTS: &[(&str, i64, GatewayStatus, PaymentMethod, Option<&str>)] = &[
    (
        "TXN123456789",
        2999,
        GatewayStatus::Success,
        PaymentMethod::Upi,
        Some("user@paytm"),
    ),
    (
        "TXN987654321",
        4999,
        GatewayStatus::Success,
        PaymentMethod::BankTransfer,
        None,
    ),
    (
        "TXN555666777",
        1999,
        GatewayStatus::Pending,
        PaymentMethod::Upi,
        Some("test@gpay"),
    ),
    (
        "TXN111222333",
        999,
        GatewayStatus::Failed,
        PaymentMethod::Upi,
        None,
    ),
];

/// Seed the gateway's payment records. Existing transactions are left alone.
pub async fn seed_payment_records(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = Utc::now();
    let mut inserted = 0u32;
    for &(transaction_id, amount, status, method, upi_id) in DEMO_PAYMENTS {
        let model = payment_record::ActiveModel {
            transaction_id: Set(transaction_id.to_string()),
            amount: Set(amount),
            status: Set(status),
            payment_method: Set(method),
            upi_id: Set(upi_id.map(str::to_string)),
            timestamp: Set(now),
        };

        let result = payment_record::Entity::insert(model)
            .on_conflict(
                OnConflict::column(payment_record::Column::TransactionId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} payment records", inserted);
    }
    Ok(())
}

/// Seed demo users, workshops and registrations into an empty database.
///
/// Does nothing when any user already exists.
pub async fn seed_demo_data(db: &DatabaseConnection) -> anyhow::Result<()> {
    seed_payment_records(db).await?;

    if user::Entity::find().count(db).await? > 0 {
        info!("Database already has users, skipping demo data");
        return Ok(());
    }

    let now = Utc::now();
    let txn = db.begin().await?;

    let mut users = Vec::with_capacity(DEMO_USERS.len());
    for demo in DEMO_USERS {
        let password = hash::hash_password_blocking(demo.password.to_string())
            .await
            .with_context(|| format!("hashing password for {}", demo.email))?;
        let model = user::ActiveModel {
            name: Set(demo.name.to_string()),
            email: Set(demo.email.to_string()),
            password: Set(password),
            role: Set(demo.role.to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        users.push(model);
    }

    let mut workshops = Vec::new();
    for w in demo_workshops()? {
        workshops.push(w.into_active_model(now).insert(&txn).await?);
    }

    let (john, sarah) = (&users[0], &users[2]);
    let (react, marketing) = (&workshops[0], &workshops[1]);

    registration::ActiveModel {
        user_id: Set(john.id),
        workshop_id: Set(react.id),
        registration_type: Set(RegistrationType::Automated),
        status: Set(RegistrationStatus::PaymentPending),
        payment_status: Set(PaymentStatus::PendingVerification),
        payment_amount: Set(react.price),
        transaction_id: Set(Some("TXN123456789".into())),
        payment_screenshot: Set(None),
        upi_id: Set(Some("user@paytm".into())),
        notes: Set("Looking forward to the hooks session".into()),
        admin_notes: Set(None),
        reviewed_at: Set(None),
        version: Set(0),
        registered_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    registration::ActiveModel {
        user_id: Set(sarah.id),
        workshop_id: Set(marketing.id),
        registration_type: Set(RegistrationType::Manual),
        status: Set(RegistrationStatus::PendingApproval),
        payment_status: Set(PaymentStatus::NotRequired),
        payment_amount: Set(marketing.price),
        transaction_id: Set(None),
        payment_screenshot: Set(None),
        upi_id: Set(None),
        notes: Set(String::new()),
        admin_notes: Set(None),
        reviewed_at: Set(None),
        version: Set(0),
        registered_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        users = users.len(),
        workshops = workshops.len(),
        "Seeded demo data"
    );
    Ok(())
}
