//! State boundaries and the region name to jurisdiction code mapping.

use std::f64::consts::FRAC_PI_4;
use std::fs::File;
use std::io::BufReader;

use geojson::{GeoJson, Value};

use crate::error::LoadError;
use crate::source::{fetch, SourceLocator};

/// Boundary property holding the region's display name.
pub const NAME_PROPERTY: &str = "STATE_NAME";

const REGION_CODES: [(&str, &str); 8] = [
    ("New South Wales", "NSW"),
    ("Victoria", "VIC"),
    ("Queensland", "QLD"),
    ("South Australia", "SA"),
    ("Western Australia", "WA"),
    ("Tasmania", "TAS"),
    ("Northern Territory", "NT"),
    ("Australian Capital Territory", "ACT"),
];

/// Jurisdiction code for a boundary region name, if the name is known.
pub fn lookup(name: &str) -> Option<&'static str> {
    REGION_CODES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
}

/// Jurisdiction code for `name`; unknown names come back unchanged.
pub fn region_code(name: &str) -> &str {
    lookup(name).unwrap_or(name)
}

/// Display name for a jurisdiction code.
pub fn region_name(code: &str) -> Option<&'static str> {
    REGION_CODES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
}

/// Closed ring of (longitude, latitude) positions.
pub type Ring = Vec<(f64, f64)>;

/// One named boundary region. Each polygon is its exterior ring followed by holes.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub name: String,
    pub code: String,
    pub polygons: Vec<Vec<Ring>>,
}

impl Region {
    /// Exterior rings of every polygon.
    pub fn exteriors(&self) -> impl Iterator<Item = &Ring> + '_ {
        self.polygons.iter().filter_map(|p| p.first())
    }
}

/// Longitude/latitude bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

/// Regions read from a GeoJSON FeatureCollection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Boundaries {
    regions: Vec<Region>,
}

impl Boundaries {
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Load and parse a boundary file.
    pub fn load(locator: &SourceLocator) -> Result<Self, LoadError> {
        let name = locator.to_string();
        let local = fetch(locator)?;
        let file = File::open(local.path()).map_err(|e| LoadError::from_io(&name, &e))?;
        let geojson = GeoJson::from_reader(BufReader::new(file)).map_err(|e| {
            LoadError::Geometry {
                locator: name.clone(),
                message: e.to_string(),
            }
        })?;
        Self::from_geojson(&name, geojson)
    }

    pub fn from_geojson_str(locator: &str, text: &str) -> Result<Self, LoadError> {
        let geojson = text.parse::<GeoJson>().map_err(|e| LoadError::Geometry {
            locator: locator.to_string(),
            message: e.to_string(),
        })?;
        Self::from_geojson(locator, geojson)
    }

    fn from_geojson(locator: &str, geojson: GeoJson) -> Result<Self, LoadError> {
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(LoadError::Geometry {
                locator: locator.to_string(),
                message: "expected a FeatureCollection".to_string(),
            });
        };

        let mut regions = Vec::new();
        let mut skipped = 0usize;
        for feature in &collection.features {
            let Some(name) = feature
                .property(NAME_PROPERTY)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
            else {
                skipped += 1;
                continue;
            };
            let polygons = match feature.geometry.as_ref().map(|g| &g.value) {
                Some(Value::Polygon(rings)) => vec![convert_polygon(rings)],
                Some(Value::MultiPolygon(polys)) => {
                    polys.iter().map(|p| convert_polygon(p)).collect()
                }
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            let code = match lookup(name) {
                Some(code) => code.to_string(),
                None => {
                    tracing::warn!(region = name, "no jurisdiction code for boundary region");
                    name.to_string()
                }
            };
            regions.push(Region {
                name: name.to_string(),
                code,
                polygons,
            });
        }

        if skipped > 0 {
            tracing::debug!(
                source = locator,
                skipped,
                "skipped features without a name or polygon geometry"
            );
        }
        Ok(Self { regions })
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self
            .regions
            .iter()
            .flat_map(|r| r.polygons.iter())
            .flat_map(|p| p.iter())
            .flat_map(|ring| ring.iter());
        let &(lon, lat) = points.next()?;
        let init = Bounds {
            min_lon: lon,
            min_lat: lat,
            max_lon: lon,
            max_lat: lat,
        };
        Some(points.fold(init, |b, &(lon, lat)| Bounds {
            min_lon: b.min_lon.min(lon),
            min_lat: b.min_lat.min(lat),
            max_lon: b.max_lon.max(lon),
            max_lat: b.max_lat.max(lat),
        }))
    }
}

fn convert_polygon(rings: &[Vec<Vec<f64>>]) -> Vec<Ring> {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .filter_map(|pos| match pos.as_slice() {
                    [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some((*lon, *lat)),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

const MAX_LAT: f64 = 85.0;

fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    (lon.to_radians(), (FRAC_PI_4 + lat / 2.0).tan().ln())
}

/// Mercator projection scaled and centred to fit a pixel box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    scale: f64,
    origin_x: f64,
    origin_y: f64,
    max_y: f64,
    min_x: f64,
}

impl Projection {
    /// Fit `bounds` into the box at (`left`, `top`) of `width` x `height` pixels.
    pub fn fit(bounds: Bounds, left: f64, top: f64, width: f64, height: f64) -> Self {
        let (min_x, min_y) = mercator(bounds.min_lon, bounds.min_lat);
        let (max_x, max_y) = mercator(bounds.max_lon, bounds.max_lat);
        let dx = (max_x - min_x).max(f64::EPSILON);
        let dy = (max_y - min_y).max(f64::EPSILON);
        let scale = (width / dx).min(height / dy);
        Self {
            scale,
            origin_x: left + (width - dx * scale) / 2.0,
            origin_y: top + (height - dy * scale) / 2.0,
            max_y,
            min_x,
        }
    }

    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = mercator(lon, lat);
        (
            self.origin_x + (x - self.min_x) * self.scale,
            self.origin_y + (self.max_y - y) * self.scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"STATE_NAME": "Victoria"},
             "geometry": {"type": "Polygon", "coordinates": [[[141.0,-34.0],[150.0,-37.5],[141.0,-39.0],[141.0,-34.0]]]}},
            {"type": "Feature", "properties": {"STATE_NAME": "Other Territories"},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[150.0,-35.0],[151.0,-35.0],[151.0,-36.0],[150.0,-35.0]]]]}},
            {"type": "Feature", "properties": {"NAME": "nameless"},
             "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}}
        ]
    }"#;

    #[test]
    fn known_and_unknown_names() {
        assert_eq!(region_code("New South Wales"), "NSW");
        assert_eq!(region_code("Australian Capital Territory"), "ACT");
        assert_eq!(region_code("Other Territories"), "Other Territories");
        assert_eq!(region_name("WA"), Some("Western Australia"));
        assert_eq!(region_name("XX"), None);
    }

    #[test]
    fn parses_polygons_and_skips_unnamed() {
        let b = Boundaries::from_geojson_str("mem", SAMPLE).expect("parse");
        assert_eq!(b.regions().len(), 2);
        assert_eq!(b.regions()[0].code, "VIC");
        assert_eq!(b.regions()[1].code, "Other Territories");
        assert_eq!(b.regions()[1].exteriors().count(), 1);
        let bounds = b.bounds().expect("bounds");
        assert_eq!(bounds.min_lon, 141.0);
        assert_eq!(bounds.max_lat, -34.0);
    }

    #[test]
    fn non_collection_is_geometry_error() {
        let err = Boundaries::from_geojson_str(
            "mem",
            r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#,
        )
        .expect_err("should fail");
        assert!(matches!(err, LoadError::Geometry { .. }));
    }

    #[test]
    fn projection_fits_inside_box() {
        let bounds = Bounds {
            min_lon: 113.0,
            min_lat: -44.0,
            max_lon: 154.0,
            max_lat: -10.0,
        };
        let proj = Projection::fit(bounds, 10.0, 20.0, 300.0, 200.0);
        for (lon, lat) in [(113.0, -44.0), (154.0, -10.0), (133.0, -25.0)] {
            let (x, y) = proj.project(lon, lat);
            assert!((10.0 - 1e-6..=310.0 + 1e-6).contains(&x), "x={x}");
            assert!((20.0 - 1e-6..=220.0 + 1e-6).contains(&y), "y={y}");
        }
        let (_, north) = proj.project(133.0, -10.0);
        let (_, south) = proj.project(133.0, -44.0);
        assert!(north < south);
    }
}
