/// The `projects_his` primary key is a PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A structured map field: a JSON object keyed by string.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
