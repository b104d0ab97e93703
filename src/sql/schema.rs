//! Downstream table definitions.

/// Schema DDL embedded at compile time
const SCHEMA_SQL: &str = include_str!("../../schema/airspace.sql");

/// DDL for the `import` and `area` tables the batches insert into
pub fn schema_sql() -> &'static str {
    SCHEMA_SQL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_matches_insert_columns() {
        let ddl = schema_sql();
        assert!(ddl.contains("create table if not exists import"));
        assert!(ddl.contains("create table if not exists area"));
        for column in ["import_id", "class", "name", "floor", "ceiling", "boundary"] {
            assert!(ddl.contains(column), "missing column {}", column);
        }
        assert!(ddl.contains("geography(polygon, 4326)"));
        assert!(ddl.contains("using gist (boundary)"));
    }
}
