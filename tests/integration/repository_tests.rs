//! Repository integration tests against a live database
//!
//! Run with: DATABASE_URL=postgresql://root@localhost:26257/gamesroom cargo test -- --ignored

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use gamesroom_persistence::{
    models::{
        activity::UpdateActivity, shift_total::UpdateShiftTotal, Activity, Actor, Audit, Profile,
        ShiftTotal,
    },
    repository::upsert::UpsertDialect,
    AppError, Repository, Services,
};

async fn services() -> Services {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let dialect = match std::env::var("UPSERT_DIALECT").as_deref() {
        Ok("postgres") => UpsertDialect::Postgres,
        _ => UpsertDialect::Cockroach,
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    Services::new(Repository::new(pool, dialect), Default::default())
}

fn shift_total(student: &str, attendant: &str, cost: Decimal, payment_mode: &str) -> ShiftTotal {
    ShiftTotal {
        id: Uuid::nil(),
        student_name: student.to_string(),
        attendant_name: attendant.to_string(),
        activity: "Pool table".to_string(),
        cost,
        payment_mode: payment_mode.to_string(),
        start_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
        shift_date: NaiveDate::from_ymd_opt(2024, 8, 6).unwrap(),
        duration: "30m".to_string(),
        attendant_status: "IN".to_string(),
        audit: Audit::default(),
    }
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_activity_lifecycle() {
    let services = services().await;
    let actor = Actor::new("integration");

    let mut activity = Activity::new("8-ball", "Pool table");
    activity.price = Some(2);
    let saved = services.activities.save(activity, &actor).await.unwrap();

    let loaded = services.activities.get(saved.id).await.unwrap();
    assert_eq!(loaded.activity, "8-ball");
    assert_eq!(loaded.audit.created_by.as_deref(), Some("integration"));

    let update = UpdateActivity {
        price: Some(4),
        ..Default::default()
    };
    let updated = services.activities.update(saved.id, &update, &actor).await.unwrap();
    assert_eq!(updated.price, Some(4));
    assert_eq!(updated.audit.last_updated_by.as_deref(), Some("integration"));

    let categories = services.activities.categories().await.unwrap();
    assert!(categories.contains(&"Pool table".to_string()));

    services.activities.delete(saved.id).await.unwrap();
    let err = services.activities.get(saved.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
#[ignore]
async fn test_upsert_all_overwrites_existing_rows() {
    let services = services().await;
    let actor = Actor::new("integration");

    let first = services
        .activities
        .save_all(
            vec![Activity::new("Catan", "Board game"), Activity::new("Uno", "Board game")],
            &actor,
        )
        .await
        .unwrap();

    let mut second = first.clone();
    second[1].activity = "Uno Flip".to_string();
    services.activities.save_all(second, &actor).await.unwrap();

    let reloaded = services.activities.get(first[1].id).await.unwrap();
    assert_eq!(reloaded.activity, "Uno Flip");

    for activity in first {
        services.activities.delete(activity.id).await.unwrap();
    }
}

#[tokio::test]
#[ignore]
async fn test_shift_total_cost_summary() {
    let services = services().await;
    let actor = Actor::new("integration");
    let attendant = format!("attendant-{}", Uuid::new_v4());

    let saved = services
        .shift_totals
        .save_all(
            vec![
                shift_total("Ana", &attendant, Decimal::new(350, 2), "card"),
                shift_total("Ben", &attendant, Decimal::new(200, 2), "cash"),
                shift_total("Cy", &attendant, Decimal::new(150, 2), "card"),
            ],
            &actor,
        )
        .await
        .unwrap();

    let summary = services
        .shift_totals
        .cost_summary(&attendant, NaiveDate::from_ymd_opt(2024, 8, 6).unwrap())
        .await
        .unwrap()
        .expect("rows were written");
    assert_eq!(summary.total_cost_card, Decimal::new(500, 2));
    assert_eq!(summary.total_cost_cash, Decimal::new(200, 2));
    assert_eq!(summary.total_cost, Decimal::new(700, 2));

    let update = UpdateShiftTotal {
        attendant_status: Some("OUT".to_string()),
        ..Default::default()
    };
    let updated = services.shift_totals.update(saved[0].id, &update, &actor).await.unwrap();
    assert_eq!(updated.attendant_status, "OUT");

    for total in saved {
        services.shift_totals.delete(total.id).await.unwrap();
    }
}

#[tokio::test]
#[ignore]
async fn test_profile_password_is_hashed() {
    let services = services().await;
    let user_id = format!("user-{}", Uuid::new_v4());

    let profile = Profile {
        user_id: user_id.clone(),
        user_password: "correct horse".to_string(),
        first_name: "Dana".to_string(),
        last_name: "Reyes".to_string(),
        role: "attendant".to_string(),
        permission: "{\"shifts\":true}".to_string(),
        audit: Audit::default(),
    };
    let saved = services.profiles.save_or_update(profile, &Actor::default()).await.unwrap();
    assert_ne!(saved.user_password, "correct horse");

    assert!(services.profiles.verify_password(&user_id, "correct horse").await.unwrap());
    assert!(!services.profiles.verify_password(&user_id, "wrong").await.unwrap());

    services.profiles.delete(&user_id).await.unwrap();
    let err = services.profiles.delete(&user_id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
