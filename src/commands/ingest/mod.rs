mod db_setup;
mod pipeline;
mod run;
mod tools_and_manifest;

pub use run::run;

pub const DB_SCHEMA_VERSION: &str = "0.1.0";
pub const DEFAULT_DB_FILENAME: &str = "fas_index.sqlite";
const DEFAULT_EXPORT_FILENAME: &str = "vector_records.jsonl";
