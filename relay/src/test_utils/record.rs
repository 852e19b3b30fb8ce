use serde::{Deserialize, Serialize};

use crate::models::Record;

pub const TEST_RECORD_SCHEMA: &str = r#"
{
  "type": "record",
  "name": "TestRecord",
  "namespace": "relay.test",
  "fields": [
    { "name": "id", "type": "long" },
    { "name": "name", "type": "string" }
  ]
}
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    pub id: i64,
    pub name: String,
}

impl TestRecord {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Record for TestRecord {
    fn avro_schema() -> &'static str {
        TEST_RECORD_SCHEMA
    }

    fn key(&self) -> String {
        self.id.to_string()
    }
}
