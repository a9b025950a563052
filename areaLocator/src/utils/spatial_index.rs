use crate::config::constants::{MIN_LAT, MAX_LAT, MIN_LON, MAX_LON, QUADTREE_NODE_CAPACITY, QUADTREE_MAX_DEPTH};
use crate::data::poi::{Coordinate, POI};
use crate::models::area::BoundingBox;
use crate::utils::logging::{self, SearchPhase};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpatialIndexError {
    #[error("Point {key} at ({lat}, {lon}) lies outside the index bounds")]
    OutOfBounds { key: usize, lat: f64, lon: f64 },
}

#[derive(Clone, Copy, Debug)]
struct IndexEntry {
    key: usize,
    position: Coordinate,
}

#[derive(Clone, Debug)]
pub struct QuadTreeNode {
    boundary: Boundary,
    children: Option<Box<[QuadTreeNode; 4]>>,
    entries: Vec<IndexEntry>,
    depth: usize,
}

/// Node extent; x is longitude, y is latitude.
#[derive(Clone, Debug)]
pub struct Boundary {
    center: Coordinate,
    half_width: f64,
    half_height: f64,
}

impl Boundary {
    fn from_box(bounds: &BoundingBox) -> Self {
        Self {
            center: bounds.center(),
            half_width: (bounds.max_lon - bounds.min_lon) / 2.0,
            half_height: (bounds.max_lat - bounds.min_lat) / 2.0,
        }
    }

    fn contains(&self, point: &Coordinate) -> bool {
        point.lon >= self.center.lon - self.half_width &&
        point.lon <= self.center.lon + self.half_width &&
        point.lat >= self.center.lat - self.half_height &&
        point.lat <= self.center.lat + self.half_height
    }

    fn intersects(&self, range: &BoundingBox) -> bool {
        range.min_lon <= self.center.lon + self.half_width &&
        range.max_lon >= self.center.lon - self.half_width &&
        range.min_lat <= self.center.lat + self.half_height &&
        range.max_lat >= self.center.lat - self.half_height
    }

    fn is_inside(&self, range: &BoundingBox) -> bool {
        range.min_lon <= self.center.lon - self.half_width &&
        range.max_lon >= self.center.lon + self.half_width &&
        range.min_lat <= self.center.lat - self.half_height &&
        range.max_lat >= self.center.lat + self.half_height
    }
}

impl QuadTreeNode {
    fn new(center: Coordinate, half_width: f64, half_height: f64, depth: usize) -> Self {
        Self {
            boundary: Boundary {
                center,
                half_width,
                half_height,
            },
            children: None,
            entries: Vec::new(),
            depth,
        }
    }

    fn subdivide(&mut self) {
        let lon = self.boundary.center.lon;
        let lat = self.boundary.center.lat;
        let hw = self.boundary.half_width / 2.0;
        let hh = self.boundary.half_height / 2.0;
        let depth = self.depth + 1;

        let children = Box::new([
            // Northwest
            QuadTreeNode::new(Coordinate::new(lat + hh, lon - hw), hw, hh, depth),
            // Northeast
            QuadTreeNode::new(Coordinate::new(lat + hh, lon + hw), hw, hh, depth),
            // Southwest
            QuadTreeNode::new(Coordinate::new(lat - hh, lon - hw), hw, hh, depth),
            // Southeast
            QuadTreeNode::new(Coordinate::new(lat - hh, lon + hw), hw, hh, depth),
        ]);

        self.children = Some(children);

        for entry in std::mem::take(&mut self.entries) {
            self.insert_into_children(entry);
        }
    }

    fn insert_into_children(&mut self, entry: IndexEntry) {
        if let Some(children) = &mut self.children {
            // Edges are shared, so the first child that accepts the point owns it
            if let Some(child) = children.iter_mut().find(|c| c.boundary.contains(&entry.position)) {
                child.insert(entry);
                return;
            }
        }
        self.entries.push(entry);
    }

    fn insert(&mut self, entry: IndexEntry) {
        if self.children.is_some() {
            self.insert_into_children(entry);
            return;
        }

        if self.entries.len() < QUADTREE_NODE_CAPACITY || self.depth >= QUADTREE_MAX_DEPTH {
            self.entries.push(entry);
            return;
        }

        self.subdivide();
        self.insert_into_children(entry);
    }

    fn collect_all(&self, out: &mut Vec<usize>) {
        out.extend(self.entries.iter().map(|e| e.key));
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.collect_all(out);
            }
        }
    }

    fn query(&self, range: &BoundingBox, out: &mut Vec<usize>) {
        if !self.boundary.intersects(range) {
            return;
        }

        if self.boundary.is_inside(range) {
            self.collect_all(out);
            return;
        }

        out.extend(
            self.entries
                .iter()
                .filter(|e| range.contains(&e.position))
                .map(|e| e.key),
        );

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(range, out);
            }
        }
    }

    fn count_all(&self) -> usize {
        self.entries.len()
            + self
                .children
                .as_ref()
                .map_or(0, |children| children.iter().map(|c| c.count_all()).sum())
    }

    fn count_in(&self, range: &BoundingBox) -> usize {
        if !self.boundary.intersects(range) {
            return 0;
        }

        if self.boundary.is_inside(range) {
            return self.count_all();
        }

        let own = self.entries.iter().filter(|e| range.contains(&e.position)).count();
        own + self
            .children
            .as_ref()
            .map_or(0, |children| children.iter().map(|c| c.count_in(range)).sum())
    }

    fn max_depth(&self) -> usize {
        match &self.children {
            Some(children) => children.iter().map(|c| c.max_depth()).max().unwrap_or(self.depth),
            None => self.depth,
        }
    }
}

/// Point quadtree answering "which keys lie in this rectangle" queries.
#[derive(Clone)]
pub struct SpatialIndex {
    root: QuadTreeNode,
    len: usize,
}

impl fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.len)
            .field("depth", &self.depth())
            .finish()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    /// Index covering the whole globe.
    pub fn new() -> Self {
        Self::with_bounds(&BoundingBox::new(MIN_LAT, MAX_LAT, MIN_LON, MAX_LON))
    }

    pub fn with_bounds(bounds: &BoundingBox) -> Self {
        let boundary = Boundary::from_box(bounds);
        Self {
            root: QuadTreeNode::new(boundary.center, boundary.half_width, boundary.half_height, 0),
            len: 0,
        }
    }

    /// Builds an index keyed by each point's position in `points`.
    pub fn from_points<P: POI>(points: &[P]) -> Result<Self, SpatialIndexError> {
        let _timing = logging::start_timing("build_spatial_index", SearchPhase::IndexBuild);

        let mut index = Self::new();
        for (key, point) in points.iter().enumerate() {
            index.insert(key, point.get_coordinate())?;
        }

        tracing::debug!(points = index.len(), depth = index.depth(), "Built spatial index");
        Ok(index)
    }

    pub fn insert(&mut self, key: usize, position: &Coordinate) -> Result<(), SpatialIndexError> {
        if !self.root.boundary.contains(position) {
            return Err(SpatialIndexError::OutOfBounds {
                key,
                lat: position.lat,
                lon: position.lon,
            });
        }

        self.root.insert(IndexEntry { key, position: *position });
        self.len += 1;
        Ok(())
    }

    /// Keys of all points inside `range` (edges inclusive), in no particular order.
    pub fn intersection(&self, range: &BoundingBox) -> Vec<usize> {
        let mut keys = Vec::new();
        self.root.query(range, &mut keys);
        keys
    }

    /// Number of points inside `range`, without collecting their keys.
    pub fn count(&self, range: &BoundingBox) -> usize {
        self.root.count_in(range)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn depth(&self) -> usize {
        self.root.max_depth()
    }
}
