use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use crate::models::{Country, Record};

/// Avro schema registered for user records.
pub const USER_AVRO_SCHEMA: &str = r#"{
  "type": "record",
  "name": "User",
  "namespace": "relay.models",
  "fields": [
    {"name": "user_id", "type": "long"},
    {"name": "status", "type": "string"},
    {"name": "name", "type": "string"},
    {"name": "email", "type": ["null", "string"], "default": null},
    {
      "name": "country",
      "type": {
        "type": "record",
        "name": "Country",
        "fields": [
          {"name": "code", "type": "string"},
          {"name": "name", "type": "string"}
        ]
      }
    },
    {"name": "created_at", "type": {"type": "long", "logicalType": "timestamp-micros"}},
    {"name": "updated_at", "type": {"type": "long", "logicalType": "timestamp-micros"}}
  ]
}"#;

/// A user row joined with its country.
///
/// The query must return the columns `id`, `status`, `name`, `email`,
/// `country_code`, `country_name`, `created_at` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "user_id")]
    pub id: i64,
    pub status: String,
    pub name: String,
    pub email: Option<String>,
    pub country: Country,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Record for User {
    fn avro_schema() -> &'static str {
        USER_AVRO_SCHEMA
    }

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(User {
            id: row.try_get("id")?,
            status: row.try_get("status")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            country: Country {
                code: row.try_get("country_code")?,
                name: row.try_get("country_name")?,
            },
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
