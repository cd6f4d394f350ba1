use mapgrid_core::{
    attributes::{AttributeError, AttributeMap, Configurable, Field, FieldKind},
    round_to_i32, CellIndex, DVec2, GridError, IVec2, Point, Region, Revision, Rgb, Shape,
};
use serde::{Deserialize, Serialize};

use crate::{cache::ShapeCache, validate_dimension, GeometricGrid, RangePolicy};

/// Persisted configuration of a [`SquareGrid`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquareGridConfig {
    /// Cell width in pixels.
    pub dx: f64,
    /// Cell height in pixels.
    pub dy: f64,
    /// Pixel centre of cell `(0, 0)`.
    pub origin: IVec2,
    /// Distance policy.
    pub range: RangePolicy,
    /// Cell edge midpoints are legal snap locations.
    pub edges_legal: bool,
    /// Cell corners are legal snap locations.
    pub corners_legal: bool,
    /// Grid lines are drawn.
    pub visible: bool,
    /// Centre dots are drawn.
    pub dots_visible: bool,
    /// Number of snap divisions per half cell when only centres are legal; 0 disables.
    pub snap_scale: i32,
    /// Colour of grid lines and dots.
    pub color: Rgb,
}

impl Default for SquareGridConfig {
    fn default() -> Self {
        Self {
            dx: 48.0,
            dy: 48.0,
            origin: IVec2::new(24, 24),
            range: RangePolicy::Metric,
            edges_legal: false,
            corners_legal: false,
            visible: false,
            dots_visible: false,
            snap_scale: 0,
            color: Rgb::BLACK,
        }
    }
}

impl SquareGridConfig {
    fn validate(&self) -> Result<(), GridError> {
        validate_dimension("dx", self.dx)?;
        validate_dimension("dy", self.dy)?;
        if self.snap_scale < 0 {
            return Err(GridError::InvalidDimension {
                name: "snapScale",
                value: f64::from(self.snap_scale),
            });
        }
        Ok(())
    }
}

fn grid_visible(config: &SquareGridConfig) -> bool {
    config.visible
}

static SQUARE_GRID_SCHEMA: &[Field<SquareGridConfig>] = &[
    Field::new("x0", FieldKind::Integer, "X offset"),
    Field::new("y0", FieldKind::Integer, "Y offset"),
    Field::new("dx", FieldKind::Double, "Cell width"),
    Field::new("dy", FieldKind::Double, "Cell height"),
    Field::new(
        "range",
        FieldKind::Choice(RangePolicy::NAMES),
        "Range calculation method",
    ),
    Field::new("edgesLegal", FieldKind::Boolean, "Edges are legal locations?"),
    Field::new("cornersLegal", FieldKind::Boolean, "Corners are legal locations?"),
    Field::new("visible", FieldKind::Boolean, "Show grid?"),
    Field::new("dotsVisible", FieldKind::Boolean, "Draw center dots?"),
    Field::new("snapScale", FieldKind::Integer, "Snap divisions per half cell"),
    Field::new("color", FieldKind::Color, "Color").visible_when(grid_visible),
];

impl Configurable for SquareGridConfig {
    fn schema() -> &'static [Field<Self>] {
        SQUARE_GRID_SCHEMA
    }

    fn to_attributes(&self) -> AttributeMap {
        AttributeMap::new()
            .with("x0", self.origin.x)
            .with("y0", self.origin.y)
            .with("dx", self.dx)
            .with("dy", self.dy)
            .with("range", self.range)
            .with("edgesLegal", self.edges_legal)
            .with("cornersLegal", self.corners_legal)
            .with("visible", self.visible)
            .with("dotsVisible", self.dots_visible)
            .with("snapScale", self.snap_scale)
            .with("color", self.color)
    }

    fn decode_attributes(map: &AttributeMap) -> Result<Self, AttributeError> {
        Ok(Self {
            dx: map.parse("dx")?,
            dy: map.parse("dy")?,
            origin: IVec2::new(map.parse("x0")?, map.parse("y0")?),
            range: map.parse("range")?,
            edges_legal: map.parse("edgesLegal")?,
            corners_legal: map.parse("cornersLegal")?,
            visible: map.parse("visible")?,
            dots_visible: map.parse("dotsVisible")?,
            snap_scale: map.parse("snapScale")?,
            color: map.parse("color")?,
        })
    }
}

/// Grid of equally sized rectangular cells.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "SquareGridConfig", into = "SquareGridConfig")]
pub struct SquareGrid {
    config: SquareGridConfig,
    revision: Revision,
    shapes: ShapeCache,
}

impl SquareGrid {
    /// Creates a grid, rejecting non-positive cell dimensions.
    pub fn new(config: SquareGridConfig) -> Result<Self, GridError> {
        config.validate()?;
        Ok(Self {
            config,
            revision: Revision::initial(),
            shapes: ShapeCache::default(),
        })
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &SquareGridConfig {
        &self.config
    }

    /// Configuration revision; bumped by every setter.
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Replaces the whole configuration.
    pub fn set_config(&mut self, config: SquareGridConfig) -> Result<(), GridError> {
        config.validate()?;
        self.config = config;
        self.revision.bump();
        Ok(())
    }

    /// Changes the cell size.
    pub fn set_dimensions(&mut self, dx: f64, dy: f64) -> Result<(), GridError> {
        self.set_config(SquareGridConfig {
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

    /// Changes the distance policy.
    pub fn set_range_policy(&mut self, range: RangePolicy) {
        self.config.range = range;
        self.revision.bump();
    }

    fn cell_offset(&self, cell: CellIndex) -> DVec2 {
        DVec2::new(
            f64::from(cell.column()) * self.config.dx,
            f64::from(cell.row()) * self.config.dy,
        )
    }

    fn within(&self, column: i32, row: i32, range: i32) -> bool {
        match self.config.range {
            RangePolicy::Metric => column.abs().max(row.abs()) <= range,
            RangePolicy::Manhattan => column.abs() + row.abs() <= range,
        }
    }

    fn compute_shape(&self, range: u32) -> Region {
        let range = i32::try_from(range).unwrap_or(i32::MAX);
        let size = DVec2::new(self.config.dx, self.config.dy);
        let mut shapes = Vec::new();
        for column in -range..=range {
            for row in -range..=range {
                if self.within(column, row, range) {
                    let offset = self.cell_offset(CellIndex::new(column, row));
                    shapes.push(Shape::rectangle(offset, size));
                }
            }
        }
        Region::new(shapes)
    }
}

/// Whole-cell snap expressed in half-cell units.
fn whole_cell(offset: f64, size: f64) -> i32 {
    2 * round_to_i32(offset / size)
}

/// Quantises the remaining offset from a cell centre into `scale` divisions
/// of the half cell, keeping the result strictly inside the cell.
fn quantise(offset: f64, half_index: i32, size: f64, scale: i32) -> f64 {
    let step = 0.5 * size / f64::from(scale);
    let delta = offset - f64::from(round_to_i32(f64::from(half_index) * size / 2.0));
    let units = round_to_i32(delta / step).clamp(1 - scale, scale - 1);
    f64::from(round_to_i32(f64::from(units) * step))
}

impl GeometricGrid for SquareGrid {
    fn snap_to(&self, point: Point) -> Point {
        let config = &self.config;
        let offset = (point - config.origin).as_dvec2();
        // (0, 0) is the origin cell centre, (1, 0) its east edge, (1, 1) its
        // lower-right corner.
        let mut nx = round_to_i32(offset.x / (0.5 * config.dx));
        let mut ny = round_to_i32(offset.y / (0.5 * config.dy));

        match (config.corners_legal, config.edges_legal) {
            (true, true) => {}
            (true, false) => {
                nx = if ny % 2 == 0 {
                    whole_cell(offset.x, config.dx)
                } else {
                    1 + 2 * round_to_i32(offset.x / config.dx - 0.5)
                };
            }
            (false, true) => {
                if ny % 2 != 0 || nx % 2 == 0 {
                    nx = whole_cell(offset.x, config.dx);
                }
            }
            (false, false) => {
                nx = whole_cell(offset.x, config.dx);
                ny = whole_cell(offset.y, config.dy);
                if config.snap_scale > 0 {
                    let x = f64::from(nx) * config.dx / 2.0
                        + quantise(offset.x, nx, config.dx, config.snap_scale);
                    let y = f64::from(ny) * config.dy / 2.0
                        + quantise(offset.y, ny, config.dy, config.snap_scale);
                    return config.origin + IVec2::new(round_to_i32(x), round_to_i32(y));
                }
            }
        }

        config.origin
            + IVec2::new(
                round_to_i32(f64::from(nx) * config.dx / 2.0),
                round_to_i32(f64::from(ny) * config.dy / 2.0),
            )
    }

    fn range(&self, from: Point, to: Point) -> u32 {
        let delta = (to - from).as_dvec2();
        let columns = round_to_i32(delta.x / self.config.dx).unsigned_abs();
        let rows = round_to_i32(delta.y / self.config.dy).unsigned_abs();
        match self.config.range {
            RangePolicy::Metric => columns.max(rows),
            RangePolicy::Manhattan => columns + rows,
        }
    }

    fn shape_within_range(&self, center: Point, range: u32) -> Region {
        self.shapes
            .get_or_compute(self.revision, range, || self.compute_shape(range))
            .translated(center.as_dvec2())
    }

    fn cell_at(&self, point: Point) -> CellIndex {
        let offset = (point - self.config.origin).as_dvec2();
        CellIndex::new(
            round_to_i32(offset.x / self.config.dx),
            round_to_i32(offset.y / self.config.dy),
        )
    }

    fn cell_center(&self, cell: CellIndex) -> Point {
        let center = self.config.origin.as_dvec2() + self.cell_offset(cell);
        IVec2::new(round_to_i32(center.x), round_to_i32(center.y))
    }

    fn cell_shape(&self, cell: CellIndex) -> Shape {
        Shape::rectangle(
            self.config.origin.as_dvec2() + self.cell_offset(cell),
            DVec2::new(self.config.dx, self.config.dy),
        )
    }
}

impl PartialEq for SquareGrid {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
    }
}

impl TryFrom<SquareGridConfig> for SquareGrid {
    type Error = GridError;

    fn try_from(config: SquareGridConfig) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}

impl From<SquareGrid> for SquareGridConfig {
    fn from(grid: SquareGrid) -> Self {
        grid.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(config: SquareGridConfig) -> SquareGrid {
        SquareGrid::new(config).expect("valid grid")
    }

    fn legal(edges_legal: bool, corners_legal: bool) -> SquareGrid {
        grid(SquareGridConfig {
            edges_legal,
            corners_legal,
            ..SquareGridConfig::default()
        })
    }

    #[test]
    fn centres_only_snaps_to_nearest_centre() {
        let grid = legal(false, false);
        assert_eq!(grid.snap_to(IVec2::new(30, 30)), IVec2::new(24, 24));
        assert_eq!(grid.snap_to(IVec2::new(50, 80)), IVec2::new(72, 72));
        assert_eq!(grid.snap_to(IVec2::new(-10, -30)), IVec2::new(-24, -24));
    }

    #[test]
    fn corners_only_snaps_to_corners_or_centres() {
        let grid = legal(false, true);
        assert_eq!(grid.snap_to(IVec2::new(46, 46)), IVec2::new(48, 48));
        assert_eq!(grid.snap_to(IVec2::new(30, 26)), IVec2::new(24, 24));
        assert_eq!(grid.snap_to(IVec2::new(2, 46)), IVec2::new(0, 48));
    }

    #[test]
    fn edges_only_snaps_to_edge_midpoints() {
        let grid = legal(true, false);
        assert_eq!(grid.snap_to(IVec2::new(46, 26)), IVec2::new(48, 24));
        assert_eq!(grid.snap_to(IVec2::new(26, 46)), IVec2::new(24, 48));
        assert_eq!(grid.snap_to(IVec2::new(46, 46)), IVec2::new(24, 48));
    }

    #[test]
    fn snap_scale_quantises_inside_the_cell() {
        let grid = grid(SquareGridConfig {
            snap_scale: 2,
            ..SquareGridConfig::default()
        });
        // Half cell of 24 pixels in 2 divisions of 12, clamped to [-1, 1].
        assert_eq!(grid.snap_to(IVec2::new(37, 24)), IVec2::new(36, 24));
        assert_eq!(grid.snap_to(IVec2::new(46, 2)), IVec2::new(36, 12));
        assert_eq!(grid.snap_to(IVec2::new(25, 23)), IVec2::new(24, 24));
    }

    #[test]
    fn range_follows_policy() {
        let mut grid = legal(false, false);
        let from = IVec2::new(0, 0);
        let to = IVec2::new(96, 96);
        assert_eq!(grid.range(from, to), 2);
        grid.set_range_policy(RangePolicy::Manhattan);
        assert_eq!(grid.range(from, to), 4);
        assert_eq!(grid.range(to, from), 4);
        assert_eq!(grid.range(to, to), 0);
    }

    #[test]
    fn shape_within_range_matches_policy() {
        let mut grid = legal(false, false);
        let block = grid.shape_within_range(IVec2::ZERO, 2);
        assert_eq!(block.len(), 25);
        assert!((block.area() - 25.0 * 48.0 * 48.0).abs() < 1e-6);
        assert!(block.contains(DVec2::new(100.0, 100.0)));

        grid.set_range_policy(RangePolicy::Manhattan);
        let diamond = grid.shape_within_range(IVec2::ZERO, 2);
        assert_eq!(diamond.len(), 13);
        assert!(!diamond.contains(DVec2::new(100.0, 100.0)));
        assert!(diamond.contains(DVec2::new(96.0, 0.0)));
    }

    #[test]
    fn resizing_invalidates_cached_shapes() {
        let mut grid = legal(false, false);
        let before = grid.shape_within_range(IVec2::ZERO, 1);
        grid.set_dimensions(10.0, 10.0).expect("positive");
        let after = grid.shape_within_range(IVec2::ZERO, 1);
        assert!((before.area() - 9.0 * 48.0 * 48.0).abs() < 1e-6);
        assert!((after.area() - 900.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        let mut grid = legal(false, false);
        let revision = grid.revision();
        assert_eq!(
            grid.set_dimensions(0.0, 48.0),
            Err(GridError::InvalidDimension {
                name: "dx",
                value: 0.0
            })
        );
        assert_eq!(grid.revision(), revision);
        assert!(SquareGrid::new(SquareGridConfig {
            dy: f64::NAN,
            ..SquareGridConfig::default()
        })
        .is_err());
    }

    #[test]
    fn cells_map_to_centres_and_shapes() {
        let grid = legal(false, false);
        let cell = grid.cell_at(IVec2::new(80, 10));
        assert_eq!(cell, CellIndex::new(1, 0));
        assert_eq!(grid.cell_center(cell), IVec2::new(72, 24));
        assert!(grid.cell_shape(cell).contains(DVec2::new(80.0, 10.0)));
    }

    #[test]
    fn colour_is_only_visible_for_visible_grids() {
        let mut config = SquareGridConfig::default();
        assert!(!config.visible_fields().contains(&"color"));
        config.visible = true;
        assert!(config.visible_fields().contains(&"color"));
    }
}
