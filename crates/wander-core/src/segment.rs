//! Parsing of brouter message records into tagged route segments.
//!
//! The routing service answers with a geojson feature collection whose
//! LineString feature carries a side-channel `messages` array: one
//! tokenized record per segment, with a header legend as the first
//! row. Each record describes the sub-path ending at its lon/lat
//! endpoint, which the service encodes as integer micro-degrees.

use std::collections::HashMap;

use geojson::GeoJson;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A geojson coordinate: lng, lat, optional elevation.
pub type Position = Vec<f64>;

/// Field count of a brouter message record.
pub const MESSAGE_FIELDS: usize = 13;

const F_LON: usize = 0;
const F_LAT: usize = 1;
const F_ELEVATION: usize = 2;
const F_DISTANCE: usize = 3;
const F_COST_PER_KM: usize = 4;
const F_ELEV_COST: usize = 5;
const F_TURN_COST: usize = 6;
const F_NODE_COST: usize = 7;
const F_INITIAL_COST: usize = 8;
const F_WAY_TAGS: usize = 9;
const F_NODE_TAGS: usize = 10;
const F_TIME: usize = 11;
const F_ENERGY: usize = 12;

#[derive(Debug, Error)]
pub enum MessageParseError {
    #[error("message record has {got} fields, expected {MESSAGE_FIELDS}")]
    FieldCount { got: usize },
    #[error("message field {name} is not numeric: {value:?}")]
    Numeric { name: &'static str, value: String },
    #[error("response is not valid geojson: {0}")]
    Geojson(#[from] geojson::Error),
    #[error("messages property has unexpected shape: {0}")]
    Messages(#[from] serde_json::Error),
}

/// One parsed routing-service message record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentMessage {
    /// Segment endpoint in micro-degrees, as encoded by the service.
    pub lon_e6: i64,
    pub lat_e6: i64,
    /// Endpoint elevation in meters.
    pub elevation: i64,
    /// Distance covered by the segment in meters.
    pub distance: f64,
    pub cost_per_km: i64,
    pub elev_cost: i64,
    pub turn_cost: i64,
    pub node_cost: i64,
    pub initial_cost: i64,
    pub way_tags: HashMap<String, String>,
    pub node_tags: HashMap<String, String>,
    pub time_s: f64,
    pub energy: f64,
}

impl SegmentMessage {
    /// Parse one tokenized record. The field count is validated before
    /// any indexed access; a short or non-numeric record is an error,
    /// never a silent zero.
    pub fn parse(fields: &[String]) -> Result<Self, MessageParseError> {
        if fields.len() < MESSAGE_FIELDS {
            return Err(MessageParseError::FieldCount { got: fields.len() });
        }
        Ok(Self {
            lon_e6: int_field(fields, F_LON, "Longitude")?,
            lat_e6: int_field(fields, F_LAT, "Latitude")?,
            elevation: int_field(fields, F_ELEVATION, "Elevation")?,
            distance: int_field(fields, F_DISTANCE, "Distance")? as f64,
            cost_per_km: int_field(fields, F_COST_PER_KM, "CostPerKm")?,
            elev_cost: int_field(fields, F_ELEV_COST, "ElevCost")?,
            turn_cost: int_field(fields, F_TURN_COST, "TurnCost")?,
            node_cost: int_field(fields, F_NODE_COST, "NodeCost")?,
            initial_cost: int_field(fields, F_INITIAL_COST, "InitialCost")?,
            way_tags: parse_tags(&fields[F_WAY_TAGS]),
            node_tags: parse_tags(&fields[F_NODE_TAGS]),
            time_s: float_field(fields, F_TIME, "Time")?,
            energy: float_field(fields, F_ENERGY, "Energy")?,
        })
    }

    pub fn lon(&self) -> f64 {
        self.lon_e6 as f64 / 1e6
    }

    pub fn lat(&self) -> f64 {
        self.lat_e6 as f64 / 1e6
    }

    /// Way type from the `highway` tag.
    pub fn way_type(&self) -> &str {
        self.way_tags
            .get("highway")
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    /// Surface from the `surface` tag.
    pub fn surface(&self) -> &str {
        self.way_tags
            .get("surface")
            .map(String::as_str)
            .unwrap_or("unknown")
    }
}

fn int_field(fields: &[String], index: usize, name: &'static str) -> Result<i64, MessageParseError> {
    let value = &fields[index];
    value.trim().parse().map_err(|_| MessageParseError::Numeric {
        name,
        value: value.clone(),
    })
}

fn float_field(
    fields: &[String],
    index: usize,
    name: &'static str,
) -> Result<f64, MessageParseError> {
    let value = &fields[index];
    value.trim().parse().map_err(|_| MessageParseError::Numeric {
        name,
        value: value.clone(),
    })
}

/// Split a space-separated `key=value` block into a map. Tokens
/// without `=` (bare flags) map to an empty value.
fn parse_tags(block: &str) -> HashMap<String, String> {
    block
        .split_whitespace()
        .map(|token| match token.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (token.to_string(), String::new()),
        })
        .collect()
}

fn micro_deg(value: f64) -> i64 {
    (value * 1e6).round() as i64
}

/// One tagged sub-path of a route: contiguous geometry points plus the
/// message record they derive from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteSegment {
    pub points: Vec<Position>,
    pub message: SegmentMessage,
    /// Transient UI flag for surface/way-type highlighting.
    #[serde(skip)]
    pub highlight: bool,
}

impl RouteSegment {
    /// Consume points from the front of the pool until one matches the
    /// message endpoint. The matching point is included in the segment
    /// but left in the pool as the next segment's start point.
    fn consume(message: SegmentMessage, coords: &[Position], cursor: &mut usize) -> Self {
        let mut points = Vec::new();
        if *cursor >= coords.len() {
            tracing::warn!(
                lon = message.lon(),
                lat = message.lat(),
                "coordinate pool exhausted before message endpoint"
            );
            return Self {
                points,
                message,
                highlight: false,
            };
        }
        while *cursor < coords.len() {
            let point = &coords[*cursor];
            points.push(point.clone());
            let matches = point.len() >= 2
                && micro_deg(point[0]) == message.lon_e6
                && micro_deg(point[1]) == message.lat_e6;
            if matches {
                break;
            }
            *cursor += 1;
        }
        Self {
            points,
            message,
            highlight: false,
        }
    }
}

/// The routed path between two adjacent waypoints, in traversal order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Route {
    pub segments: Vec<RouteSegment>,
}

impl Route {
    /// Parse a routing-service response body into a route.
    ///
    /// Only LineString features carrying a `messages` property are
    /// considered; other features are ignored. The first message row
    /// is the header legend, not data.
    pub fn from_response(body: &str) -> Result<Self, MessageParseError> {
        let geojson: GeoJson = body.parse()?;
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Ok(Route::default());
        };

        let mut route = Route::default();
        for feature in &collection.features {
            let Some(raw_messages) = feature
                .properties
                .as_ref()
                .and_then(|properties| properties.get("messages"))
            else {
                continue;
            };
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            let geojson::Value::LineString(coords) = &geometry.value else {
                continue;
            };

            let messages: Vec<Vec<String>> = serde_json::from_value(raw_messages.clone())?;
            let mut cursor = 0usize;
            for fields in messages.iter().skip(1) {
                let message = SegmentMessage::parse(fields)?;
                route
                    .segments
                    .push(RouteSegment::consume(message, coords, &mut cursor));
            }
        }
        Ok(route)
    }

    /// Total distance in meters.
    pub fn distance(&self) -> f64 {
        self.segments
            .iter()
            .map(|segment| segment.message.distance)
            .sum()
    }

    /// Per-segment geometry, in traversal order.
    pub fn lines(&self) -> Vec<&[Position]> {
        self.segments
            .iter()
            .map(|segment| segment.points.as_slice())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HEADER: [&str; 13] = [
        "Longitude",
        "Latitude",
        "Elevation",
        "Distance",
        "CostPerKm",
        "ElevCost",
        "TurnCost",
        "NodeCost",
        "InitialCost",
        "WayTags",
        "NodeTags",
        "Time",
        "Energy",
    ];

    fn fixture() -> String {
        // Two segments sharing the boundary point at 10.087361.
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {
                    "messages": [
                        HEADER,
                        ["10087361", "53908933", "15", "65", "277", "0", "0", "0", "0",
                         "highway=track surface=gravel", "", "4", "0"],
                        ["10087461", "53908953", "15", "3", "277", "0", "0", "0", "0",
                         "highway=residential surface=asphalt", "", "1", "0"],
                    ],
                },
                "geometry": {
                    "type": "LineString",
                    "coordinates": [
                        [10.086934, 53.90889, 15.0],
                        [10.087082, 53.908913, 15.0],
                        [10.087361, 53.908933, 15.0],
                        [10.087461, 53.908953, 15.0],
                    ],
                },
            }],
        })
        .to_string()
    }

    #[test]
    fn parses_fixture_into_segments() {
        let route = Route::from_response(&fixture()).unwrap();
        assert_eq!(route.segments.len(), 2);

        let first = &route.segments[0];
        assert_eq!(first.points.len(), 3);
        assert_eq!(first.message.elevation, 15);
        assert_eq!(first.message.distance, 65.0);

        // The boundary point is shared: it ends the first segment and
        // starts the second.
        let second = &route.segments[1];
        assert_eq!(second.points.len(), 2);
        assert_eq!(second.points[0][0], 10.087361);
        assert_eq!(second.message.distance, 3.0);

        assert_eq!(route.distance(), 68.0);
    }

    #[test]
    fn tags_are_split_into_maps() {
        let route = Route::from_response(&fixture()).unwrap();
        let first = &route.segments[0];
        assert_eq!(first.message.way_type(), "track");
        assert_eq!(first.message.surface(), "gravel");
        assert!(first.message.node_tags.is_empty());
    }

    #[test]
    fn untagged_segment_reports_unknown() {
        let message = SegmentMessage::default();
        assert_eq!(message.way_type(), "unknown");
        assert_eq!(message.surface(), "unknown");
    }

    #[test]
    fn short_record_fails_parse() {
        let fields: Vec<String> = vec!["10087361".into(), "53908933".into()];
        let err = SegmentMessage::parse(&fields).unwrap_err();
        assert!(matches!(err, MessageParseError::FieldCount { got: 2 }));
    }

    #[test]
    fn non_numeric_field_fails_parse() {
        let mut fields: Vec<String> = HEADER.iter().map(|s| s.to_string()).collect();
        fields[F_WAY_TAGS] = "highway=track".into();
        let err = SegmentMessage::parse(&fields).unwrap_err();
        assert!(matches!(err, MessageParseError::Numeric { .. }));
    }

    #[test]
    fn exhausted_pool_yields_empty_segment() {
        // Three data records but geometry only reaches the first
        // endpoint: the trailing segments come out empty.
        let body = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {
                    "messages": [
                        HEADER,
                        ["10087361", "53908933", "15", "65", "0", "0", "0", "0", "0", "", "", "4", "0"],
                        ["10087461", "53908953", "15", "3", "0", "0", "0", "0", "0", "", "", "1", "0"],
                        ["10087561", "53908973", "15", "9", "0", "0", "0", "0", "0", "", "", "1", "0"],
                    ],
                },
                "geometry": {
                    "type": "LineString",
                    "coordinates": [
                        [10.086934, 53.90889],
                        [10.087361, 53.908933],
                    ],
                },
            }],
        })
        .to_string();

        let route = Route::from_response(&body).unwrap();
        assert_eq!(route.segments.len(), 3);
        assert_eq!(route.segments[0].points.len(), 2);
        // Second segment consumes the shared point and then runs out.
        assert_eq!(route.segments[1].points.len(), 1);
        assert!(route.segments[2].points.is_empty());
    }

    #[test]
    fn features_without_messages_are_ignored() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"name": "just a line"},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[10.0, 53.6], [10.1, 53.7]],
                },
            }],
        })
        .to_string();
        let route = Route::from_response(&body).unwrap();
        assert!(route.segments.is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(Route::from_response("not json").is_err());
    }
}
