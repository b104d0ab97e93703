//! Batch statement construction for one import run.

use tracing::debug;

use super::escape::{integer_literal, quote_literal};
use crate::error::{IngestError, Result};
use crate::kml::polygon_to_wkt;
use crate::models::{Area, ImportRun};

const IMPORT_TABLE: &str = "import";
const IMPORT_COLUMNS: &[&str] = &["id", "name"];

const AREA_TABLE: &str = "area";
const AREA_COLUMNS: &[&str] = &["import_id", "class", "name", "floor", "ceiling", "boundary"];

/// Options controlling the emitted batch
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Prefix the batch with a delete of the import row, so reloading the
    /// artifact replaces the rows of a previous load (areas cascade)
    pub replace_existing: bool,
}

/// Accumulates areas for one import run and renders them as a single batch
pub struct BatchBuilder {
    import: ImportRun,
    options: BatchOptions,
    rows: Vec<String>,
}

impl BatchBuilder {
    /// Create a new builder for an import run
    pub fn new(import: &ImportRun, options: BatchOptions) -> Self {
        Self {
            import: import.clone(),
            options,
            rows: Vec::new(),
        }
    }

    /// Render one area as a value row; rows keep the order they are added in
    pub fn add(&mut self, area: &Area) {
        let import_id = area.import_id.to_string();
        let wkt = polygon_to_wkt(&area.boundary);
        self.rows.push(format!(
            "({}, {}, {}, {}, {}, ST_GeogFromText({}))",
            quote_literal(Some(import_id.as_str())),
            quote_literal(area.class.as_deref()),
            quote_literal(area.name.as_deref()),
            integer_literal(area.floor),
            integer_literal(area.ceiling),
            quote_literal(Some(wkt.as_str())),
        ));
    }

    /// Number of area rows added so far
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the batch.
    ///
    /// The area insert is left out entirely when no areas were added.
    pub fn finish(self) -> Result<String> {
        let import_id = self.import.id.to_string();
        let mut sql = String::new();

        if self.options.replace_existing {
            sql.push_str(&format!(
                "delete from {} where id = {};\n",
                IMPORT_TABLE,
                quote_literal(Some(import_id.as_str()))
            ));
        }

        let import_row = format!(
            "({}, {})",
            quote_literal(Some(import_id.as_str())),
            quote_literal(Some(self.import.name.as_str()))
        );
        sql.push_str(&insert_statement(IMPORT_TABLE, IMPORT_COLUMNS, &[import_row])?);

        if self.rows.is_empty() {
            debug!("Import {} has no areas, emitting import row only", import_id);
        } else {
            sql.push_str(&insert_statement(AREA_TABLE, AREA_COLUMNS, &self.rows)?);
        }

        Ok(sql)
    }
}

/// Build the batch for a complete list of areas
pub fn build_batch(import: &ImportRun, areas: &[Area], options: BatchOptions) -> Result<String> {
    let mut builder = BatchBuilder::new(import, options);
    for area in areas {
        builder.add(area);
    }
    builder.finish()
}

/// Multi-row insert; an insert without value rows is invalid SQL
fn insert_statement(table: &'static str, columns: &[&str], rows: &[String]) -> Result<String> {
    if rows.is_empty() {
        return Err(IngestError::EmptyInsert(table));
    }

    Ok(format!(
        "insert into {}({}) values\n{};\n",
        table,
        columns.join(", "),
        rows.join(",\n")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kml::coords_to_polygon;

    fn area(import: &ImportRun, name: Option<&str>, class: Option<&str>) -> Area {
        Area {
            import_id: import.id,
            name: name.map(str::to_string),
            class: class.map(str::to_string),
            floor: Some(50),
            ceiling: None,
            boundary: coords_to_polygon("1,2,10 3,4,20 5,6,30 1,2,10").unwrap(),
        }
    }

    #[test]
    fn test_empty_run_has_no_area_insert() {
        let import = ImportRun::from_locator("http://example.org/empty.kmz");
        let sql = build_batch(&import, &[], BatchOptions::default()).unwrap();
        assert_eq!(
            sql,
            format!(
                "insert into import(id, name) values\n('{}', 'http://example.org/empty.kmz');\n",
                import.id
            )
        );
        assert!(!sql.contains("insert into area"));
    }

    #[test]
    fn test_area_rows() {
        let import = ImportRun::from_locator("http://example.org/a.kmz");
        let areas = vec![
            area(&import, Some("First"), Some("Controlled")),
            area(&import, None, None),
        ];
        let sql = build_batch(&import, &areas, BatchOptions::default()).unwrap();
        let expected = format!(
            "insert into import(id, name) values\n('{id}', 'http://example.org/a.kmz');\n\
             insert into area(import_id, class, name, floor, ceiling, boundary) values\n\
             ('{id}', 'Controlled', 'First', 50, NULL, ST_GeogFromText('POLYGON((1 2,3 4,5 6,1 2))')),\n\
             ('{id}', NULL, NULL, 50, NULL, ST_GeogFromText('POLYGON((1 2,3 4,5 6,1 2))'));\n",
            id = import.id
        );
        assert_eq!(sql, expected);
        assert!(sql.ends_with(";\n"));
    }

    #[test]
    fn test_hostile_values_are_quoted() {
        let import = ImportRun::from_locator("http://example.org/x.kmz?a='1'");
        let areas = vec![area(&import, Some("x'); drop table area; --"), None)];
        let sql = build_batch(&import, &areas, BatchOptions::default()).unwrap();
        assert!(sql.contains("'http://example.org/x.kmz?a=''1'''"));
        assert!(sql.contains("'x''); drop table area; --'"));
    }

    #[test]
    fn test_replace_existing_prefix() {
        let import = ImportRun::from_locator("http://example.org/a.kmz");
        let options = BatchOptions {
            replace_existing: true,
        };
        let sql = build_batch(&import, &[], options).unwrap();
        assert!(sql.starts_with(&format!("delete from import where id = '{}';\n", import.id)));
    }

    #[test]
    fn test_builder_counts_rows() {
        let import = ImportRun::from_locator("http://example.org/a.kmz");
        let mut builder = BatchBuilder::new(&import, BatchOptions::default());
        assert!(builder.is_empty());
        builder.add(&area(&import, Some("A"), None));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_insert_without_rows_is_rejected() {
        let result = insert_statement(AREA_TABLE, AREA_COLUMNS, &[]);
        assert!(matches!(result, Err(IngestError::EmptyInsert("area"))));
    }
}
