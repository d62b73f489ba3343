//! Ground track history and antimeridian-aware segmentation.

use std::collections::VecDeque;

use crate::config::TRAIL_CAPACITY;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Clamps latitude to [-90, 90] and wraps longitude into (-180, 180].
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat: lat.clamp(-90.0, 90.0),
            lon: Self::normalize_lon(lon),
        }
    }

    pub fn normalize_lon(lon: f64) -> f64 {
        let wrapped = lon.rem_euclid(360.0);
        if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
    }

    /// `[lon, lat]`, the order the map plot expects.
    pub fn plot_xy(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

pub type PathSegment = Vec<GeoPoint>;

/// Fixed-size FIFO of the most recent ground track points.
#[derive(Clone, Debug)]
pub struct TrailBuffer {
    points: VecDeque<GeoPoint>,
    capacity: usize,
}

impl Default for TrailBuffer {
    fn default() -> Self {
        Self::with_capacity(TRAIL_CAPACITY)
    }
}

impl TrailBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity: capacity.max(1),
        }
    }

    pub fn add_point(&mut self, point: GeoPoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<GeoPoint> {
        self.points.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeoPoint> {
        self.points.iter()
    }

    pub fn segments(&self) -> Vec<PathSegment> {
        segment(self.iter().copied())
    }
}

/// Splits a ground track wherever consecutive longitudes jump by more
/// than 180°. Fewer than two points yield no segments at all.
pub fn segment(points: impl IntoIterator<Item = GeoPoint>) -> Vec<PathSegment> {
    let points: Vec<GeoPoint> = points.into_iter().collect();
    if points.len() < 2 {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current: PathSegment = vec![points[0]];
    for pair in points.windows(2) {
        if (pair[1].lon - pair[0].lon).abs() > 180.0 {
            segments.push(std::mem::take(&mut current));
        }
        current.push(pair[1]);
    }
    segments.push(current);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<GeoPoint> {
        raw.iter().map(|&(lat, lon)| GeoPoint::new(lat, lon)).collect()
    }

    #[test]
    fn antimeridian_crossing_splits_in_two() {
        let track = pts(&[(10.0, 170.0), (10.0, 175.0), (10.0, -179.0), (10.0, -175.0)]);
        let segments = segment(track);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], pts(&[(10.0, 170.0), (10.0, 175.0)]));
        assert_eq!(segments[1], pts(&[(10.0, -179.0), (10.0, -175.0)]));
    }

    #[test]
    fn no_segment_contains_a_wrap() {
        let mut buffer = TrailBuffer::default();
        let mut lon = 100.0;
        for i in 0..200 {
            buffer.add_point(GeoPoint::new((i as f64 * 0.3).sin() * 50.0, lon));
            lon += 4.0;
        }
        let segments = buffer.segments();
        assert!(!segments.is_empty());
        for seg in &segments {
            for pair in seg.windows(2) {
                assert!((pair[1].lon - pair[0].lon).abs() <= 180.0);
            }
        }
    }

    #[test]
    fn single_point_has_nothing_to_connect() {
        let mut buffer = TrailBuffer::default();
        assert!(buffer.segments().is_empty());
        buffer.add_point(GeoPoint::new(0.0, 0.0));
        assert!(buffer.segments().is_empty());
        buffer.add_point(GeoPoint::new(0.5, 1.0));
        assert_eq!(buffer.segments().len(), 1);
    }

    #[test]
    fn crossing_right_after_first_point_leaves_a_lone_head() {
        let segments = segment(pts(&[(0.0, 179.0), (0.0, -179.0), (0.0, -178.0)]));
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], pts(&[(0.0, 179.0)]));
        assert_eq!(segments[1], pts(&[(0.0, -179.0), (0.0, -178.0)]));
    }

    #[test]
    fn two_points_always_yield_a_segment() {
        assert_eq!(segment(pts(&[(0.0, 179.0), (0.0, -179.0)])).len(), 2);
        assert_eq!(segment(pts(&[(0.0, 10.0), (0.0, 12.0)])).len(), 1);
    }

    #[test]
    fn buffer_evicts_oldest_past_capacity() {
        let mut buffer = TrailBuffer::default();
        for i in 0..61 {
            buffer.add_point(GeoPoint::new(0.0, i as f64));
        }
        assert_eq!(buffer.len(), 60);
        assert!(buffer.iter().all(|p| p.lon != 0.0));
        assert_eq!(buffer.iter().next().unwrap().lon, 1.0);
        assert_eq!(buffer.latest().unwrap().lon, 60.0);
    }

    #[test]
    fn longitude_normalization() {
        assert_eq!(GeoPoint::new(0.0, -180.0).lon, 180.0);
        assert_eq!(GeoPoint::new(0.0, 190.0).lon, -170.0);
        assert_eq!(GeoPoint::new(0.0, -540.0).lon, 180.0);
        assert_eq!(GeoPoint::new(95.0, 0.0).lat, 90.0);
    }
}
