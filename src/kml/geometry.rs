//! Coordinate text to polygon conversion.

use geo_types::{Coord, LineString, Polygon};
use wkt::ToWkt;

/// Minimum number of tuples for a usable ring (triangle plus closing point)
pub const MIN_RING_TUPLES: usize = 4;

/// Convert KML coordinate text into a polygon.
///
/// Tuples are separated by whitespace and hold `lon,lat[,alt]`; the altitude
/// is dropped. Returns `None` when there are fewer than four tuples or when
/// any tuple lacks a numeric longitude/latitude. Unclosed rings are closed by
/// repeating the first point.
pub fn coords_to_polygon(raw: &str) -> Option<Polygon<f64>> {
    let tuples: Vec<&str> = raw.split_whitespace().collect();
    if tuples.len() < MIN_RING_TUPLES {
        return None;
    }

    let coords = tuples
        .iter()
        .map(|tuple| parse_tuple(tuple))
        .collect::<Option<Vec<Coord<f64>>>>()?;

    let mut ring = LineString::new(coords);
    ring.close();

    Some(Polygon::new(ring, vec![]))
}

fn parse_tuple(tuple: &str) -> Option<Coord<f64>> {
    let mut parts = tuple.split(',');
    let x: f64 = parts.next()?.trim().parse().ok()?;
    let y: f64 = parts.next()?.trim().parse().ok()?;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(Coord { x, y })
}

/// Render a polygon as `POLYGON((x y,x y,...))`
pub fn polygon_to_wkt(polygon: &Polygon<f64>) -> String {
    polygon.wkt_string()
}
