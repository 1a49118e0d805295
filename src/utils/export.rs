use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// A flat table handed to the spreadsheet sink. `columns` fixes the column order;
/// each row maps column name to a primitive value.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExportSheet {
    #[schema(example = "attendance")]
    pub sheet: String,
    pub columns: Vec<String>,
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<Map<String, Value>>,
}

pub trait ExportRow {
    const COLUMNS: &'static [&'static str];

    /// Values in `COLUMNS` order.
    fn values(&self) -> Vec<Value>;
}

impl ExportSheet {
    pub fn build<T: ExportRow>(sheet: &str, items: &[T]) -> Self {
        let rows = items
            .iter()
            .map(|item| {
                T::COLUMNS
                    .iter()
                    .map(|c| c.to_string())
                    .zip(item.values())
                    .collect::<Map<String, Value>>()
            })
            .collect();

        ExportSheet {
            sheet: sheet.to_string(),
            columns: T::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Line {
        name: &'static str,
        amount: f64,
    }

    impl ExportRow for Line {
        const COLUMNS: &'static [&'static str] = &["Name", "Amount"];

        fn values(&self) -> Vec<Value> {
            vec![json!(self.name), json!(self.amount)]
        }
    }

    #[test]
    fn test_build_sheet_keeps_column_order() {
        let sheet = ExportSheet::build(
            "lines",
            &[Line { name: "b", amount: 1.5 }, Line { name: "a", amount: 2.0 }],
        );

        assert_eq!(sheet.columns, vec!["Name", "Amount"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0]["Name"], "b");
        assert_eq!(sheet.rows[1]["Amount"], 2.0);
    }

    #[test]
    fn test_empty_sheet_still_has_columns() {
        let sheet = ExportSheet::build::<Line>("lines", &[]);
        assert!(sheet.rows.is_empty());
        assert_eq!(sheet.columns.len(), 2);
    }
}
