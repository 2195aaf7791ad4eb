use std::fmt::Write;

use super::{Geometry, Position};

/// Render `geometry` as Well-Known Text, coordinates in the order given.
///
/// No validation: unclosed rings and mixed dimensions are written as-is.
pub fn to_wkt(geometry: &Geometry) -> String {
    let mut out = String::new();
    write_geometry(&mut out, geometry);
    out
}

fn write_geometry(out: &mut String, geometry: &Geometry) {
    out.push_str(tag(geometry));
    if has_z(geometry) {
        out.push_str(" Z");
    }
    if is_empty(geometry) {
        out.push_str(" EMPTY");
        return;
    }
    out.push(' ');
    match geometry {
        Geometry::Point { coordinates } => {
            out.push('(');
            write_position(out, coordinates);
            out.push(')');
        }
        Geometry::MultiPoint { coordinates } => write_list(out, coordinates, |out, p| {
            out.push('(');
            write_position(out, p);
            out.push(')');
        }),
        Geometry::LineString { coordinates } => write_ring(out, coordinates),
        Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
            write_list(out, coordinates, |out, ring| write_ring(out, ring))
        }
        Geometry::MultiPolygon { coordinates } => write_list(out, coordinates, |out, polygon| {
            write_list(out, polygon, |out, ring| write_ring(out, ring))
        }),
        Geometry::GeometryCollection { geometries } => write_list(out, geometries, write_geometry),
    }
}

fn tag(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point { .. } => "POINT",
        Geometry::MultiPoint { .. } => "MULTIPOINT",
        Geometry::LineString { .. } => "LINESTRING",
        Geometry::MultiLineString { .. } => "MULTILINESTRING",
        Geometry::Polygon { .. } => "POLYGON",
        Geometry::MultiPolygon { .. } => "MULTIPOLYGON",
        Geometry::GeometryCollection { .. } => "GEOMETRYCOLLECTION",
    }
}

fn is_empty(geometry: &Geometry) -> bool {
    match geometry {
        Geometry::Point { coordinates } => coordinates.is_empty(),
        Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
            coordinates.is_empty()
        }
        Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
            coordinates.is_empty()
        }
        Geometry::MultiPolygon { coordinates } => coordinates.is_empty(),
        Geometry::GeometryCollection { geometries } => geometries.is_empty(),
    }
}

// collections carry the dimension on each member
fn has_z(geometry: &Geometry) -> bool {
    if matches!(geometry, Geometry::GeometryCollection { .. }) {
        return false;
    }
    geometry
        .positions()
        .first()
        .is_some_and(|p| p.len() > 2)
}

fn write_list<T>(out: &mut String, items: &[T], mut write_item: impl FnMut(&mut String, &T)) {
    out.push('(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_item(out, item);
    }
    out.push(')');
}

fn write_ring(out: &mut String, ring: &[Position]) {
    write_list(out, ring, |out, p| write_position(out, p));
}

fn write_position(out: &mut String, position: &Position) {
    for (i, v) in position.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // writing into a String cannot fail
        let _ = write!(out, "{}", v);
    }
}
