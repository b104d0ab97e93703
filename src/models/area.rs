//! Airspace area records extracted from placemarks.

use geo_types::Polygon;
use uuid::Uuid;

/// Metadata read from a placemark's description table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaAttributes {
    /// Lower vertical bound in metres
    pub floor: Option<i32>,
    /// Upper vertical bound in metres
    pub ceiling: Option<i32>,
    /// Airspace class label, e.g. "Controlled"
    pub class: Option<String>,
}

impl AreaAttributes {
    pub fn is_empty(&self) -> bool {
        self.floor.is_none() && self.ceiling.is_none() && self.class.is_none()
    }
}

/// One polygon region extracted from one placemark.
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    /// Owning import run
    pub import_id: Uuid,

    /// Placemark label
    pub name: Option<String>,

    /// Explicit class from the description, else the folder default
    pub class: Option<String>,

    pub floor: Option<i32>,
    pub ceiling: Option<i32>,

    /// Closed exterior ring in lon/lat order
    pub boundary: Polygon<f64>,
}
