//! Runs against a local Postgres on port 5430 (user and password `postgres`).
//! Ignored by default, run with `--ignored` once the database is up.

use chrono::{DateTime, TimeZone, Utc};
use config::shared::{PgConnectionConfig, TlsConfig};
use futures::StreamExt;
use relay::models::User;
use relay::source::{PgRowSource, RowSource};
use relay::store::{CheckpointStore, PostgresCheckpointStore, ZERO_CHECKPOINT};
use sqlx::{Executor, PgPool};
use telemetry::init_test_tracing;
use uuid::Uuid;

const USER_QUERY: &str = r#"
select u.id, u.status, u.name, u.email,
       c.code as country_code, c.name as country_name,
       u.created_at, u.updated_at
from users u
join countries c on c.code = u.country_code
where u.updated_at > $1
order by u.updated_at, u.id
"#;

fn local_pg_connection_config() -> PgConnectionConfig {
    PgConnectionConfig {
        host: "localhost".to_owned(),
        port: 5430,
        name: Uuid::new_v4().to_string(),
        username: "postgres".to_owned(),
        password: Some("postgres".to_owned().into()),
        tls: TlsConfig {
            trusted_root_certs: String::new(),
            enabled: false,
        },
        max_connections: 2,
    }
}

async fn spawn_database() -> PgPool {
    let config = local_pg_connection_config();

    let admin = PgPool::connect_with(config.without_db())
        .await
        .expect("Failed to connect to Postgres");
    admin
        .execute(format!(r#"create database "{}""#, config.name).as_str())
        .await
        .expect("Failed to create test database");

    let pool = PgPool::connect_with(config.with_db())
        .await
        .expect("Failed to connect to the test database");

    sqlx::migrate!("../poller/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn checkpoints_are_upserted_per_task() {
    init_test_tracing();

    let pool = spawn_database().await;
    let store = PostgresCheckpointStore::new(pool);

    assert_eq!(store.get("users").await.unwrap(), ZERO_CHECKPOINT);

    store.set("users", at(1)).await.unwrap();
    store.set("orders", at(2)).await.unwrap();
    store.set("users", at(3)).await.unwrap();

    assert_eq!(store.get("users").await.unwrap(), at(3));
    assert_eq!(store.get("orders").await.unwrap(), at(2));
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn user_rows_changed_since_checkpoint_are_streamed() {
    init_test_tracing();

    let pool = spawn_database().await;
    pool.execute(
        r#"
        create table countries (code text primary key, name text not null);
        create table users (
            id bigint primary key,
            status text not null,
            name text not null,
            email text,
            country_code text not null references countries (code),
            created_at timestamptz not null,
            updated_at timestamptz not null
        );
        insert into countries values ('PT', 'Portugal'), ('JP', 'Japan');
        insert into users values
            (1, 'active', 'Ana', 'ana@example.com', 'PT', '2024-05-01 00:00:00+00', '2024-05-01 01:00:00+00'),
            (2, 'active', 'Kenji', null, 'JP', '2024-05-01 00:00:00+00', '2024-05-01 03:00:00+00'),
            (3, 'banned', 'Rui', null, 'PT', '2024-05-01 00:00:00+00', '2024-05-01 05:00:00+00');
        "#,
    )
    .await
    .unwrap();

    let source = PgRowSource::<User>::new(pool, USER_QUERY);
    let users: Vec<User> = source
        .stream(at(2))
        .map(|row| row.unwrap())
        .collect()
        .await;

    // An unchanged checkpoint yields the same rows again.
    let again: Vec<User> = source
        .stream(at(2))
        .map(|row| row.unwrap())
        .collect()
        .await;
    assert_eq!(again, users);

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id, 2);
    assert_eq!(users[0].email, None);
    assert_eq!(users[0].country.code, "JP");
    assert_eq!(users[1].name, "Rui");
    assert_eq!(users[1].updated_at, at(5));
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn first_run_reaches_old_rows_at_full_precision() {
    init_test_tracing();

    let pool = spawn_database().await;
    pool.execute(
        r#"
        create table countries (code text primary key, name text not null);
        create table users (
            id bigint primary key,
            status text not null,
            name text not null,
            email text,
            country_code text not null references countries (code),
            created_at timestamptz not null,
            updated_at timestamptz not null
        );
        insert into countries values ('PT', 'Portugal');
        insert into users values
            (1, 'active', 'Ana', null, 'PT', '1965-03-01 00:00:00+00', '1965-03-01 10:20:30.123456+00');
        "#,
    )
    .await
    .unwrap();

    let source = PgRowSource::<User>::new(pool, USER_QUERY);
    let users: Vec<User> = source
        .stream(ZERO_CHECKPOINT)
        .map(|row| row.unwrap())
        .collect()
        .await;

    assert_eq!(users.len(), 1);
    assert_eq!(
        users[0].updated_at,
        Utc.with_ymd_and_hms(1965, 3, 1, 10, 20, 30).unwrap() + chrono::Duration::microseconds(123_456)
    );
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn failing_query_ends_the_stream_with_one_error() {
    init_test_tracing();

    let pool = spawn_database().await;
    let source = PgRowSource::<User>::new(pool, "select * from missing_table where $1 is not null");

    let rows: Vec<_> = source.stream(ZERO_CHECKPOINT).collect().await;

    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_err());
}
