//! Integer polygons, floating point outlines and rectangle helpers.

use std::{fmt, str::FromStr};

use glam::{DVec2, IVec2};
use serde::{Deserialize, Serialize};

/// Axis-aligned integer rectangle in pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge of the rectangle.
    pub x: i32,
    /// Top edge of the rectangle.
    pub y: i32,
    /// Width of the rectangle; empty when not positive.
    pub width: i32,
    /// Height of the rectangle; empty when not positive.
    pub height: i32,
}

impl Rect {
    /// Creates a rectangle from its upper-left corner and size.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` when the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Exclusive right edge.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Reports whether the point lies inside the half-open rectangle.
    #[must_use]
    pub const fn contains(&self, point: IVec2) -> bool {
        point.x >= self.x && point.y >= self.y && point.x < self.right() && point.y < self.bottom()
    }

    /// Reports whether the two rectangles overlap.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Overlapping part of two rectangles; empty when they are disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }
}

/// Errors raised when decoding a polygon path string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// A `;`-separated entry was not an `x,y` pair of integers.
    #[error("path entry `{entry}` at position {position} is not an `x,y` integer pair")]
    MalformedPoint {
        /// Offending entry text.
        entry: String,
        /// Zero-based position of the entry within the path.
        position: usize,
    },
}

/// Closed polygon with integer vertices, as used for zone boundaries.
///
/// The closing edge from the last vertex back to the first is implicit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Polygon {
    points: Vec<IVec2>,
}

impl Polygon {
    /// Creates a polygon from its vertices in drawing order.
    #[must_use]
    pub fn new(points: Vec<IVec2>) -> Self {
        Self { points }
    }

    /// Creates the four-vertex polygon outlining `rect`.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(vec![
            IVec2::new(rect.x, rect.y),
            IVec2::new(rect.right(), rect.y),
            IVec2::new(rect.right(), rect.bottom()),
            IVec2::new(rect.x, rect.bottom()),
        ])
    }

    /// Vertices in drawing order.
    #[must_use]
    pub fn points(&self) -> &[IVec2] {
        &self.points
    }

    /// Mutable access to the vertices in drawing order.
    pub fn points_mut(&mut self) -> &mut Vec<IVec2> {
        &mut self.points
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` when the polygon has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Even-odd point-in-polygon test evaluated at the exact pixel coordinate.
    ///
    /// Polygons with fewer than three vertices contain nothing.
    #[must_use]
    pub fn contains(&self, point: IVec2) -> bool {
        self.to_shape().contains(point.as_dvec2())
    }

    /// Smallest rectangle enclosing every vertex.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        let first = *self.points.first()?;
        let (min, max) = self
            .points
            .iter()
            .fold((first, first), |(min, max), point| {
                (min.min(*point), max.max(*point))
            });
        Some(Rect::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    /// Index of the vertex closest to `point`, if any.
    #[must_use]
    pub fn nearest_vertex(&self, point: IVec2) -> Option<usize> {
        let target = point.as_dvec2();
        self.points
            .iter()
            .enumerate()
            .map(|(index, vertex)| (index, vertex.as_dvec2().distance_squared(target)))
            .min_by(|left, right| left.1.total_cmp(&right.1))
            .map(|(index, _)| index)
    }

    /// Converts the polygon into a floating point outline.
    #[must_use]
    pub fn to_shape(&self) -> Shape {
        Shape::new(self.points.iter().map(|point| point.as_dvec2()).collect())
    }

    /// Encodes the polygon as `x1,y1;x2,y2;...`.
    #[must_use]
    pub fn to_path(&self) -> String {
        self.to_string()
    }

    /// Decodes a path, silently skipping entries that are not integer pairs.
    ///
    /// Mirrors the forgiving behaviour expected when loading hand-edited
    /// board files; use [`str::parse`] for strict decoding.
    #[must_use]
    pub fn from_path_lenient(path: &str) -> Self {
        let points = path
            .split(';')
            .filter_map(|entry| parse_pair(entry).ok())
            .collect();
        Self::new(points)
    }
}

fn parse_pair(entry: &str) -> Result<IVec2, ()> {
    let (x, y) = entry.split_once(',').ok_or(())?;
    let x = x.trim().parse::<i32>().map_err(|_| ())?;
    let y = y.trim().parse::<i32>().map_err(|_| ())?;
    Ok(IVec2::new(x, y))
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, point) in self.points.iter().enumerate() {
            if index > 0 {
                f.write_str(";")?;
            }
            write!(f, "{},{}", point.x, point.y)?;
        }
        Ok(())
    }
}

impl FromStr for Polygon {
    type Err = PathError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let points = trimmed
            .split(';')
            .enumerate()
            .map(|(position, entry)| {
                parse_pair(entry).map_err(|()| PathError::MalformedPoint {
                    entry: entry.to_owned(),
                    position,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(points))
    }
}

impl TryFrom<String> for Polygon {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Polygon> for String {
    fn from(value: Polygon) -> Self {
        value.to_path()
    }
}

/// Closed outline with floating point vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shape {
    vertices: Vec<DVec2>,
}

impl Shape {
    /// Creates an outline from its vertices in drawing order.
    #[must_use]
    pub fn new(vertices: Vec<DVec2>) -> Self {
        Self { vertices }
    }

    /// Axis-aligned rectangle centred on `center`.
    #[must_use]
    pub fn rectangle(center: DVec2, size: DVec2) -> Self {
        let half = size * 0.5;
        Self::new(vec![
            DVec2::new(center.x - half.x, center.y - half.y),
            DVec2::new(center.x + half.x, center.y - half.y),
            DVec2::new(center.x + half.x, center.y + half.y),
            DVec2::new(center.x - half.x, center.y + half.y),
        ])
    }

    /// Vertices in drawing order.
    #[must_use]
    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    /// Iterator over the closed edge list.
    pub fn edges(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        let count = self.vertices.len();
        (0..count).map(move |index| (self.vertices[index], self.vertices[(index + 1) % count]))
    }

    /// Even-odd point-in-polygon test.
    #[must_use]
    pub fn contains(&self, point: DVec2) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        let mut inside = false;
        for (start, end) in self.edges() {
            if (start.y > point.y) != (end.y > point.y) {
                let crossing = start.x + (point.y - start.y) * (end.x - start.x) / (end.y - start.y);
                if point.x < crossing {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Unsigned enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        let twice: f64 = self
            .edges()
            .map(|(start, end)| start.x * end.y - end.x * start.y)
            .sum();
        twice.abs() * 0.5
    }

    /// Shortest distance from `point` to the outline.
    #[must_use]
    pub fn distance_to_outline(&self, point: DVec2) -> f64 {
        self.edges()
            .map(|(start, end)| distance_to_segment(point, start, end))
            .fold(f64::INFINITY, f64::min)
    }

    /// Returns the outline moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: DVec2) -> Self {
        Self::new(self.vertices.iter().map(|vertex| *vertex + offset).collect())
    }

    /// Returns the outline scaled about the board origin.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.vertices.iter().map(|vertex| *vertex * factor).collect())
    }

    /// Minimum and maximum corners of the bounding box.
    #[must_use]
    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(min, max), vertex| {
                    (min.min(*vertex), max.max(*vertex))
                }),
        )
    }
}

fn distance_to_segment(point: DVec2, start: DVec2, end: DVec2) -> f64 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared <= f64::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

/// Union of pairwise disjoint outlines, such as the cells within a range.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    shapes: Vec<Shape>,
}

impl Region {
    /// Creates a region from disjoint outlines.
    #[must_use]
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    /// Outlines composing the region.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Number of outlines composing the region.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` when the region has no outlines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Reports whether any outline contains the point.
    #[must_use]
    pub fn contains(&self, point: DVec2) -> bool {
        self.shapes.iter().any(|shape| shape.contains(point))
    }

    /// Total enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.shapes.iter().map(Shape::area).sum()
    }

    /// Returns the region moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: DVec2) -> Self {
        Self::new(
            self.shapes
                .iter()
                .map(|shape| shape.translated(offset))
                .collect(),
        )
    }

    /// Minimum and maximum corners of the bounding box.
    #[must_use]
    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        self.shapes
            .iter()
            .filter_map(Shape::bounds)
            .reduce(|(min, max), (shape_min, shape_max)| (min.min(shape_min), max.max(shape_max)))
    }
}
