use portal_protocol::{MapBounds, MapPoint, Record};

/// Map centre used before any record has coordinates (India).
pub const DEFAULT_MAP_CENTER: (f64, f64) = (20.5937, 78.9629);
/// Fraction of the point span added on every side when fitting the map.
pub const BOUNDS_PADDING: f64 = 0.2;

pub fn map_points(records: &[Record]) -> Vec<MapPoint> {
    records
        .iter()
        .filter_map(|r| {
            let (lat, lon) = r.coordinates()?;
            Some(MapPoint {
                accession: r.accession.clone(),
                organism: r.organism.clone(),
                region: r.region.clone(),
                subregion: r.subregion.clone(),
                lat,
                lon,
            })
        })
        .collect()
}

pub fn map_bounds(points: &[MapPoint], padding: f64) -> Option<MapBounds> {
    let first = points.first()?;
    let mut bounds = MapBounds {
        south: first.lat,
        west: first.lon,
        north: first.lat,
        east: first.lon,
    };
    for p in &points[1..] {
        bounds.south = bounds.south.min(p.lat);
        bounds.north = bounds.north.max(p.lat);
        bounds.west = bounds.west.min(p.lon);
        bounds.east = bounds.east.max(p.lon);
    }
    let lat_pad = (bounds.north - bounds.south) * padding;
    let lon_pad = (bounds.east - bounds.west) * padding;
    Some(MapBounds {
        south: bounds.south - lat_pad,
        west: bounds.west - lon_pad,
        north: bounds.north + lat_pad,
        east: bounds.east + lon_pad,
    })
}

pub fn map_center(bounds: Option<&MapBounds>) -> (f64, f64) {
    match bounds {
        Some(b) => ((b.south + b.north) * 0.5, (b.west + b.east) * 0.5),
        None => DEFAULT_MAP_CENTER,
    }
}
