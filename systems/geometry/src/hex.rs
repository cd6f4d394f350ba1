use mapgrid_core::{
    attributes::{AttributeError, AttributeMap, Configurable, Field, FieldKind},
    round_to_i32, Axis, CellIndex, DVec2, GridError, IVec2, Point, Region, Revision, Rgb, Shape,
};
use serde::{Deserialize, Serialize};

use crate::{cache::ShapeCache, validate_dimension, GeometricGrid};

/// Persisted configuration of a [`HexGrid`].
///
/// Hexes are flat-topped and stacked in columns; odd columns sit half a hex
/// lower than even ones. With `sideways` set the layout is transposed so
/// hexes are pointy-topped and stacked in rows, odd rows shifted right.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexGridConfig {
    /// Distance between neighbouring column centres.
    pub dx: f64,
    /// Hex height measured between opposite flat sides.
    pub dy: f64,
    /// Pixel centre of cell `(0, 0)`.
    pub origin: IVec2,
    /// Transposes the layout so hexes lie in rows.
    pub sideways: bool,
    /// Hex side midpoints are legal snap locations.
    pub edges_legal: bool,
    /// Hex vertices are legal snap locations.
    pub corners_legal: bool,
    /// Hex outlines are drawn.
    pub visible: bool,
    /// Centre dots are drawn.
    pub dots_visible: bool,
    /// Colour of outlines and dots.
    pub color: Rgb,
}

impl Default for HexGridConfig {
    fn default() -> Self {
        Self {
            dx: 64.0 * 3.0_f64.sqrt() / 2.0,
            dy: 64.0,
            origin: IVec2::new(0, 32),
            sideways: false,
            edges_legal: false,
            corners_legal: false,
            visible: false,
            dots_visible: false,
            color: Rgb::BLACK,
        }
    }
}

impl HexGridConfig {
    fn validate(&self) -> Result<(), GridError> {
        validate_dimension("dx", self.dx)?;
        validate_dimension("dy", self.dy)
    }
}

fn grid_visible(config: &HexGridConfig) -> bool {
    config.visible
}

static HEX_GRID_SCHEMA: &[Field<HexGridConfig>] = &[
    Field::new("x0", FieldKind::Integer, "X offset"),
    Field::new("y0", FieldKind::Integer, "Y offset"),
    Field::new("dx", FieldKind::Double, "Column spacing"),
    Field::new("dy", FieldKind::Double, "Hex height"),
    Field::new("sideways", FieldKind::Boolean, "Sideways (hexes lie in rows)?"),
    Field::new("edgesLegal", FieldKind::Boolean, "Edges are legal locations?"),
    Field::new("cornersLegal", FieldKind::Boolean, "Vertices are legal locations?"),
    Field::new("visible", FieldKind::Boolean, "Show grid?"),
    Field::new("dotsVisible", FieldKind::Boolean, "Draw center dots?"),
    Field::new("color", FieldKind::Color, "Color").visible_when(grid_visible),
];

impl Configurable for HexGridConfig {
    fn schema() -> &'static [Field<Self>] {
        HEX_GRID_SCHEMA
    }

    fn to_attributes(&self) -> AttributeMap {
        AttributeMap::new()
            .with("x0", self.origin.x)
            .with("y0", self.origin.y)
            .with("dx", self.dx)
            .with("dy", self.dy)
            .with("sideways", self.sideways)
            .with("edgesLegal", self.edges_legal)
            .with("cornersLegal", self.corners_legal)
            .with("visible", self.visible)
            .with("dotsVisible", self.dots_visible)
            .with("color", self.color)
    }

    fn decode_attributes(map: &AttributeMap) -> Result<Self, AttributeError> {
        Ok(Self {
            dx: map.parse("dx")?,
            dy: map.parse("dy")?,
            origin: IVec2::new(map.parse("x0")?, map.parse("y0")?),
            sideways: map.parse("sideways")?,
            edges_legal: map.parse("edgesLegal")?,
            corners_legal: map.parse("cornersLegal")?,
            visible: map.parse("visible")?,
            dots_visible: map.parse("dotsVisible")?,
            color: map.parse("color")?,
        })
    }
}

/// Grid of hexagonal cells; distances are counted in hex steps.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "HexGridConfig", into = "HexGridConfig")]
pub struct HexGrid {
    config: HexGridConfig,
    revision: Revision,
    shapes: ShapeCache,
}

/// Column and row in the untransposed frame, where columns are offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Offset {
    column: i32,
    row: i32,
}

impl Offset {
    fn is_shifted(self) -> bool {
        self.column.rem_euclid(2) == 1
    }

    /// Axial coordinates of the offset cell.
    fn axial(self) -> (i32, i32) {
        let q = self.column;
        (q, self.row - (q - (q & 1)) / 2)
    }

    fn from_axial(q: i32, r: i32) -> Self {
        Self {
            column: q,
            row: r + (q - (q & 1)) / 2,
        }
    }

    fn distance(self, other: Offset) -> u32 {
        let (q1, r1) = self.axial();
        let (q2, r2) = other.axial();
        let dq = q1 - q2;
        let dr = r1 - r2;
        (dq.unsigned_abs() + dr.unsigned_abs() + (dq + dr).unsigned_abs()) / 2
    }
}

impl HexGrid {
    /// Creates a grid, rejecting non-positive dimensions.
    pub fn new(config: HexGridConfig) -> Result<Self, GridError> {
        config.validate()?;
        Ok(Self {
            config,
            revision: Revision::initial(),
            shapes: ShapeCache::default(),
        })
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &HexGridConfig {
        &self.config
    }

    /// Configuration revision; bumped by every setter.
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Replaces the whole configuration.
    pub fn set_config(&mut self, config: HexGridConfig) -> Result<(), GridError> {
        config.validate()?;
        self.config = config;
        self.revision.bump();
        Ok(())
    }

    /// Changes the column spacing and hex height.
    pub fn set_dimensions(&mut self, dx: f64, dy: f64) -> Result<(), GridError> {
        self.set_config(HexGridConfig {
            dx,
            dy,
            ..self.config.clone()
        })
    }

    /// Moves the centre of cell `(0, 0)`.
    pub fn set_origin(&mut self, origin: IVec2) {
        self.config.origin = origin;
        self.revision.bump();
    }

    fn transpose(&self, value: DVec2) -> DVec2 {
        if self.config.sideways {
            DVec2::new(value.y, value.x)
        } else {
            value
        }
    }

    /// Point relative to the origin, in the untransposed frame.
    fn local(&self, point: Point) -> DVec2 {
        self.transpose((point - self.config.origin).as_dvec2())
    }

    /// Pixel position of a point given in the untransposed frame.
    fn global(&self, local: DVec2) -> DVec2 {
        self.config.origin.as_dvec2() + self.transpose(local)
    }

    fn to_offset(&self, cell: CellIndex) -> Offset {
        if self.config.sideways {
            Offset {
                column: cell.row(),
                row: cell.column(),
            }
        } else {
            Offset {
                column: cell.column(),
                row: cell.row(),
            }
        }
    }

    fn to_cell(&self, offset: Offset) -> CellIndex {
        if self.config.sideways {
            CellIndex::new(offset.row, offset.column)
        } else {
            CellIndex::new(offset.column, offset.row)
        }
    }

    fn local_center(&self, offset: Offset) -> DVec2 {
        let shift = if offset.is_shifted() {
            self.config.dy / 2.0
        } else {
            0.0
        };
        DVec2::new(
            f64::from(offset.column) * self.config.dx,
            f64::from(offset.row) * self.config.dy + shift,
        )
    }

    /// Vertices of the hex centred on the local origin, clockwise from east.
    fn local_vertices(&self) -> [DVec2; 6] {
        let (dx, dy) = (self.config.dx, self.config.dy);
        [
            DVec2::new(2.0 * dx / 3.0, 0.0),
            DVec2::new(dx / 3.0, dy / 2.0),
            DVec2::new(-dx / 3.0, dy / 2.0),
            DVec2::new(-2.0 * dx / 3.0, 0.0),
            DVec2::new(-dx / 3.0, -dy / 2.0),
            DVec2::new(dx / 3.0, -dy / 2.0),
        ]
    }

    /// Scaled distance from a hex centre; a point lies inside the hex when it is at most one.
    fn hex_norm(&self, delta: DVec2) -> f64 {
        let u = delta.x.abs() / self.config.dx;
        let v = delta.y.abs() / self.config.dy;
        (2.0 * v).max((3.0 * u + 2.0 * v) / 2.0)
    }

    fn local_offset_at(&self, local: DVec2) -> Offset {
        let column = round_to_i32(local.x / self.config.dx);
        let mut best = Offset { column, row: 0 };
        let mut best_norm = f64::INFINITY;
        for column in column - 1..=column + 1 {
            let base = Offset { column, row: 0 };
            let row = round_to_i32((local.y - self.local_center(base).y) / self.config.dy);
            for row in row - 1..=row + 1 {
                let candidate = Offset { column, row };
                let norm = self.hex_norm(local - self.local_center(candidate));
                if norm < best_norm {
                    best = candidate;
                    best_norm = norm;
                }
            }
        }
        best
    }

    fn local_shape(&self, center: DVec2) -> Shape {
        Shape::new(
            self.local_vertices()
                .iter()
                .map(|vertex| self.transpose(center + *vertex))
                .collect(),
        )
    }

    fn compute_shape(&self, range: u32) -> Region {
        let range = i32::try_from(range).unwrap_or(i32::MAX);
        let mut shapes = Vec::new();
        for q in -range..=range {
            for r in (-range).max(-q - range)..=range.min(-q + range) {
                let center = self.local_center(Offset::from_axial(q, r));
                shapes.push(self.local_shape(center));
            }
        }
        Region::new(shapes)
    }

    fn to_pixel(&self, local: DVec2) -> Point {
        let global = self.global(local);
        IVec2::new(round_to_i32(global.x), round_to_i32(global.y))
    }
}

impl GeometricGrid for HexGrid {
    fn snap_to(&self, point: Point) -> Point {
        let local = self.local(point);
        let center = self.local_center(self.local_offset_at(local));
        let vertices = self.local_vertices();

        let mut candidates = vec![center];
        if self.config.edges_legal {
            candidates.extend(
                (0..vertices.len())
                    .map(|index| center + (vertices[index] + vertices[(index + 1) % 6]) / 2.0),
            );
        }
        if self.config.corners_legal {
            candidates.extend(vertices.iter().map(|vertex| center + *vertex));
        }

        let nearest = candidates
            .into_iter()
            .min_by(|left, right| {
                left.distance_squared(local)
                    .total_cmp(&right.distance_squared(local))
            })
            .unwrap_or(center);
        self.to_pixel(nearest)
    }

    fn range(&self, from: Point, to: Point) -> u32 {
        let from = self.local_offset_at(self.local(from));
        let to = self.local_offset_at(self.local(to));
        from.distance(to)
    }

    fn shape_within_range(&self, center: Point, range: u32) -> Region {
        self.shapes
            .get_or_compute(self.revision, range, || self.compute_shape(range))
            .translated(center.as_dvec2())
    }

    fn cell_at(&self, point: Point) -> CellIndex {
        self.to_cell(self.local_offset_at(self.local(point)))
    }

    fn cell_center(&self, cell: CellIndex) -> Point {
        self.to_pixel(self.local_center(self.to_offset(cell)))
    }

    fn cell_shape(&self, cell: CellIndex) -> Shape {
        self.local_shape(self.local_center(self.to_offset(cell)))
            .translated(self.config.origin.as_dvec2())
    }

    fn stagger_axis(&self, cell: CellIndex) -> Option<Axis> {
        if !self.to_offset(cell).is_shifted() {
            return None;
        }
        Some(if self.config.sideways {
            Axis::Column
        } else {
            Axis::Row
        })
    }
}

impl PartialEq for HexGrid {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
    }
}

impl TryFrom<HexGridConfig> for HexGrid {
    type Error = GridError;

    fn try_from(config: HexGridConfig) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}

impl From<HexGrid> for HexGridConfig {
    fn from(grid: HexGrid) -> Self {
        grid.config
    }
}
