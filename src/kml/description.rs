//! Placemark description table parsing.
//!
//! Airspace feeds describe each area with a small two-column HTML table,
//! e.g. `<tr><td>Floor</td><td>1500 ft (457 m)</td></tr>`.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::models::AreaAttributes;

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static METRES: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+) m").unwrap());

/// Parse the floor, ceiling and class out of a description table.
///
/// Rows without exactly two `td` cells are ignored. When a key appears more
/// than once the last row wins.
pub fn parse_attributes(html: Option<&str>) -> AreaAttributes {
    let mut attributes = AreaAttributes::default();
    let html = match html {
        Some(h) => h,
        None => return attributes,
    };

    // Bare rows outside a table are dropped by the HTML parser
    let fragment = if html.to_ascii_lowercase().contains("<table") {
        Html::parse_fragment(html)
    } else {
        Html::parse_fragment(&format!("<table>{}</table>", html))
    };
    for row in fragment.select(&ROW) {
        let cells: Vec<ElementRef> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| cell.value().name() == "td")
            .collect();

        if cells.len() != 2 {
            continue;
        }

        let key: String = cells[0].text().collect();
        let value: String = cells[1].text().collect();

        if key.contains("Floor") {
            if let Some(metres) = parse_metres(&value) {
                attributes.floor = Some(metres);
            }
        } else if key.contains("Ceiling") {
            if let Some(metres) = parse_metres(&value) {
                attributes.ceiling = Some(metres);
            }
        } else if key.contains("Class") {
            attributes.class = Some(value.trim().to_string());
        }
    }

    attributes
}

/// First `<digits> m` in the text
fn parse_metres(text: &str) -> Option<i32> {
    METRES
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> String {
        let mut html = String::from("<table>");
        for row in rows {
            html.push_str("<tr>");
            for cell in *row {
                html.push_str(&format!("<td>{}</td>", cell));
            }
            html.push_str("</tr>");
        }
        html.push_str("</table>");
        html
    }

    #[test]
    fn test_absent_description() {
        assert!(parse_attributes(None).is_empty());
    }

    #[test]
    fn test_floor_and_ceiling() {
        let html = table(&[&["Floor", "50 m"], &["Ceiling", "200 m"]]);
        let attrs = parse_attributes(Some(&html));
        assert_eq!(attrs.floor, Some(50));
        assert_eq!(attrs.ceiling, Some(200));
        assert_eq!(attrs.class, None);
    }

    #[test]
    fn test_metres_inside_mixed_units() {
        let html = table(&[&["Floor", "FL 65 (1981 m)"], &["Ceiling", "9500 ft (2895 m) MSL"]]);
        let attrs = parse_attributes(Some(&html));
        assert_eq!(attrs.floor, Some(1981));
        assert_eq!(attrs.ceiling, Some(2895));
    }

    #[test]
    fn test_value_without_metres() {
        let html = table(&[&["Floor", "GND"]]);
        assert_eq!(parse_attributes(Some(&html)).floor, None);
    }

    #[test]
    fn test_class_is_trimmed_verbatim() {
        let html = table(&[&["Class", "  Controlled  "]]);
        assert_eq!(
            parse_attributes(Some(&html)).class.as_deref(),
            Some("Controlled")
        );
    }

    #[test]
    fn test_unknown_key_ignored() {
        let html = table(&[&["Frequency", "123.45 m"]]);
        assert!(parse_attributes(Some(&html)).is_empty());
    }

    #[test]
    fn test_row_with_three_cells_ignored() {
        let html = table(&[&["Floor", "50 m", "extra"], &["Ceiling", "200 m"]]);
        let attrs = parse_attributes(Some(&html));
        assert_eq!(attrs.floor, None);
        assert_eq!(attrs.ceiling, Some(200));
    }

    #[test]
    fn test_last_row_wins() {
        let html = table(&[&["Floor", "50 m"], &["Floor", "75 m"]]);
        assert_eq!(parse_attributes(Some(&html)).floor, Some(75));
    }

    #[test]
    fn test_key_substring_match() {
        let html = table(&[&["Airspace Class:", "D"], &["Floor (AMSL)", "300 m"]]);
        let attrs = parse_attributes(Some(&html));
        assert_eq!(attrs.class.as_deref(), Some("D"));
        assert_eq!(attrs.floor, Some(300));
    }

    #[test]
    fn test_plain_text_description() {
        assert!(parse_attributes(Some("Just a note, no table")).is_empty());
    }

    #[test]
    fn test_bare_rows_without_table() {
        let html = "<tr><td>Floor</td><td>300 m</td></tr><tr><td>Class</td><td>D</td></tr>";
        let attrs = parse_attributes(Some(html));
        assert_eq!(attrs.floor, Some(300));
        assert_eq!(attrs.class.as_deref(), Some("D"));
    }
}
