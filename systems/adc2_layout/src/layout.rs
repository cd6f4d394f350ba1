use mapgrid_core::{GridError, IVec2, Point, Rect};
use mapgrid_system_geometry::{BoardGrid, HexGrid, HexGridConfig, SquareGrid, SquareGridConfig};
use serde::{Deserialize, Serialize};

use crate::{LayoutError, MapSheet};

/// Cell arrangement of an ADC2 map board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// Squares in a checkerboard; four neighbours.
    Grid,
    /// Hexes in rows, odd rows shifted right by half a hex.
    HorizontalHex,
    /// Hexes in columns, odd columns shifted down by half a hex.
    VerticalHex,
    /// Squares with odd rows shifted right, approximating hexes.
    GridOffsetRow,
    /// Squares with odd columns shifted down, approximating hexes.
    GridOffsetColumn,
}

/// Which lines of cells sit half a cell out of line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stagger {
    None,
    Rows,
    Columns,
}

impl LayoutKind {
    /// Layout named by a map file's orientation byte and symbol shape.
    #[must_use]
    pub fn from_orientation(orientation: u8, square_symbols: bool) -> Self {
        match (orientation, square_symbols) {
            (0 | 1, true) => Self::GridOffsetColumn,
            (0 | 1, false) => Self::VerticalHex,
            (2, true) => Self::GridOffsetRow,
            (2, false) => Self::HorizontalHex,
            _ => Self::Grid,
        }
    }

    pub(crate) const fn stagger(self) -> Stagger {
        match self {
            Self::Grid => Stagger::None,
            Self::HorizontalHex | Self::GridOffsetRow => Stagger::Rows,
            Self::VerticalHex | Self::GridOffsetColumn => Stagger::Columns,
        }
    }

    /// Number of flat sides per cell.
    #[must_use]
    pub const fn n_faces(self) -> u32 {
        match self.stagger() {
            Stagger::None => 4,
            Stagger::Rows | Stagger::Columns => 6,
        }
    }
}

/// Compass direction from a cell to one of its neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Up.
    North,
    /// Up and right.
    NorthEast,
    /// Right.
    East,
    /// Down and right.
    SouthEast,
    /// Down.
    South,
    /// Down and left.
    SouthWest,
    /// Left.
    West,
    /// Up and left.
    NorthWest,
}

impl Direction {
    /// Every direction, clockwise from north.
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct RawLayout {
    kind: LayoutKind,
    hex_size: i32,
    columns: i32,
    rows: i32,
    #[serde(default)]
    legacy_metrics: bool,
}

/// Pixel geometry of an ADC2 map board.
///
/// Cells are addressed by `(column, row)` from the top-left cell and by a
/// raw row-major index. Positions are the upper-left pixel of a cell's
/// bounding square; cell `(0, 0)` starts at the board origin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLayout", into = "RawLayout")]
pub struct Layout {
    kind: LayoutKind,
    hex_size: i32,
    columns: i32,
    rows: i32,
    legacy_metrics: bool,
}

impl Layout {
    /// Creates a layout of `columns` by `rows` cells of `hex_size` pixels.
    pub fn new(kind: LayoutKind, hex_size: i32, columns: i32, rows: i32) -> Result<Self, LayoutError> {
        for (name, value) in [("hex_size", hex_size), ("columns", columns), ("rows", rows)] {
            if value <= 0 {
                return Err(LayoutError::InvalidSize { name, value });
            }
        }
        Ok(Self {
            kind,
            hex_size,
            columns,
            rows,
            legacy_metrics: false,
        })
    }

    /// Uses the tighter hex spacing of map files written before version 2.08.
    #[must_use]
    pub fn with_legacy_metrics(mut self, legacy_metrics: bool) -> Self {
        self.legacy_metrics = legacy_metrics;
        self
    }

    /// Cell arrangement.
    #[must_use]
    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Side of a cell's bounding square in pixels.
    #[must_use]
    pub fn hex_size(&self) -> i32 {
        self.hex_size
    }

    /// Number of columns.
    #[must_use]
    pub fn columns(&self) -> i32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> i32 {
        self.rows
    }

    /// Number of flat sides per cell.
    #[must_use]
    pub fn n_faces(&self) -> u32 {
        self.kind.n_faces()
    }

    fn legacy(&self, amount: i32) -> i32 {
        if self.legacy_metrics {
            amount
        } else {
            0
        }
    }

    /// Horizontal distance to the next cell on the right.
    #[must_use]
    pub fn delta_x(&self) -> i32 {
        match self.kind {
            LayoutKind::HorizontalHex => self.hex_size - self.legacy(2),
            LayoutKind::VerticalHex => self.hex_size * 4 / 5 - self.legacy(1),
            LayoutKind::Grid | LayoutKind::GridOffsetRow | LayoutKind::GridOffsetColumn => {
                self.hex_size
            }
        }
    }

    /// Vertical distance to the next cell below.
    #[must_use]
    pub fn delta_y(&self) -> i32 {
        match self.kind {
            LayoutKind::HorizontalHex => self.hex_size * 4 / 5 - 1,
            LayoutKind::VerticalHex => self.hex_size - 1 - self.legacy(1),
            LayoutKind::Grid | LayoutKind::GridOffsetRow | LayoutKind::GridOffsetColumn => {
                self.hex_size
            }
        }
    }

    /// Cell centre relative to the cell position.
    #[must_use]
    pub fn origin(&self) -> Point {
        let half = self.hex_size / 2;
        match self.kind {
            LayoutKind::Grid => IVec2::new(half, half),
            LayoutKind::HorizontalHex | LayoutKind::VerticalHex => {
                IVec2::new(half, half - self.legacy(1))
            }
            LayoutKind::GridOffsetRow | LayoutKind::GridOffsetColumn => {
                IVec2::new(self.hex_size * 7 / 12, half)
            }
        }
    }

    /// Board image size in pixels.
    #[must_use]
    pub fn board_size(&self) -> IVec2 {
        let width = self.delta_x() * self.columns;
        let height = self.delta_y() * self.rows;
        let (half, fifth) = (self.hex_size / 2, self.hex_size / 5);
        match self.kind {
            LayoutKind::Grid => IVec2::new(width, height),
            LayoutKind::HorizontalHex => IVec2::new(width + half, height + fifth + 1),
            LayoutKind::VerticalHex => IVec2::new(width + fifth + 1, height + half + 1),
            LayoutKind::GridOffsetRow => IVec2::new(width + half + 1, height + 1),
            LayoutKind::GridOffsetColumn => IVec2::new(width + 1, height + half + 1),
        }
    }

    /// Whether `(column, row)` addresses a cell of the board.
    #[must_use]
    pub fn is_on_board(&self, column: i32, row: i32) -> bool {
        (0..self.columns).contains(&column) && (0..self.rows).contains(&row)
    }

    /// Upper-left pixel of cell `(column, row)`, on the board or not.
    #[must_use]
    pub fn coordinates_to_position(&self, column: i32, row: i32) -> Point {
        let (dx, dy) = (self.delta_x(), self.delta_y());
        match self.kind.stagger() {
            Stagger::None => IVec2::new(dx * column, dy * row),
            Stagger::Rows => IVec2::new(dx * column + row.rem_euclid(2) * dx / 2, dy * row),
            Stagger::Columns => IVec2::new(dx * column, dy * row + column.rem_euclid(2) * dy / 2),
        }
    }

    /// Upper-left pixel of cell `(column, row)` when it lies on the board.
    #[must_use]
    pub fn position_on_board(&self, column: i32, row: i32) -> Option<Point> {
        self.is_on_board(column, row)
            .then(|| self.coordinates_to_position(column, row))
    }

    /// Column and row of a raw row-major index.
    #[must_use]
    pub fn index_to_coordinates(&self, index: i32) -> (i32, i32) {
        (index % self.columns, index / self.columns)
    }

    /// Upper-left pixel of the cell at a raw index, when on the board.
    #[must_use]
    pub fn index_to_position(&self, index: i32) -> Option<Point> {
        if index < 0 {
            return None;
        }
        let (column, row) = self.index_to_coordinates(index);
        self.position_on_board(column, row)
    }

    /// Position of the neighbour of the cell at `index` in `direction`.
    ///
    /// The neighbour may lie off the board.
    #[must_use]
    pub fn neighbour(&self, index: i32, direction: Direction) -> Point {
        let (column, row) = self.index_to_coordinates(index);
        let (column, row) = match (self.kind.stagger(), direction) {
            (Stagger::Rows, Direction::NorthEast) => (column + row.rem_euclid(2), row - 1),
            (Stagger::Rows, Direction::SouthEast) => (column + row.rem_euclid(2), row + 1),
            (Stagger::Rows, Direction::NorthWest) => {
                (column - (row - 1).rem_euclid(2), row - 1)
            }
            (Stagger::Rows, Direction::SouthWest) => {
                (column - (row + 1).rem_euclid(2), row + 1)
            }
            (Stagger::Columns, Direction::NorthEast) => {
                (column + 1, row - (column + 1).rem_euclid(2))
            }
            (Stagger::Columns, Direction::NorthWest) => {
                (column - 1, row - (column - 1).rem_euclid(2))
            }
            (Stagger::Columns, Direction::SouthEast) => (column + 1, row + column.rem_euclid(2)),
            (Stagger::Columns, Direction::SouthWest) => (column - 1, row + column.rem_euclid(2)),
            (_, Direction::North) => (column, row - 1),
            (_, Direction::NorthEast) => (column + 1, row - 1),
            (_, Direction::East) => (column + 1, row),
            (_, Direction::SouthEast) => (column + 1, row + 1),
            (_, Direction::South) => (column, row + 1),
            (_, Direction::SouthWest) => (column - 1, row + 1),
            (_, Direction::West) => (column - 1, row),
            (_, Direction::NorthWest) => (column - 1, row - 1),
        };
        self.coordinates_to_position(column, row)
    }

    /// Grid matching the layout, with cell `(0, 0)` centred on [`Layout::origin`].
    pub fn geometric_grid(&self) -> Result<BoardGrid, GridError> {
        let origin = self.origin();
        let (dx, dy) = (f64::from(self.delta_x()), f64::from(self.delta_y()));
        let grid = match self.kind {
            LayoutKind::Grid => BoardGrid::from(SquareGrid::new(SquareGridConfig {
                dx,
                dy,
                origin,
                ..SquareGridConfig::default()
            })?),
            LayoutKind::VerticalHex | LayoutKind::GridOffsetColumn => {
                BoardGrid::from(HexGrid::new(HexGridConfig {
                    dx,
                    dy,
                    origin,
                    ..HexGridConfig::default()
                })?)
            }
            // Sideways hex grids measure their spacing along the stacking
            // direction, which is vertical here.
            LayoutKind::HorizontalHex | LayoutKind::GridOffsetRow => {
                BoardGrid::from(HexGrid::new(HexGridConfig {
                    dx: dy,
                    dy: dx,
                    origin,
                    sideways: true,
                    ..HexGridConfig::default()
                })?)
            }
        };
        Ok(grid)
    }

    /// Pixel rectangle enclosing the cells of `sheet`, clipped to the board.
    ///
    /// Returns `None` for sheets without cells.
    #[must_use]
    pub fn sheet_rectangle(&self, sheet: &MapSheet) -> Option<Rect> {
        let field = sheet.field;
        if field.is_empty() {
            return None;
        }
        let size = self.hex_size;
        let (half, fifth) = (size / 2, size / 5);
        let last_column = field.x + field.width - 1;
        let last_row = field.y + field.height - 1;
        let mut upper_left = self.coordinates_to_position(field.x, field.y);
        let mut lower_right = self.coordinates_to_position(last_column, last_row);

        match self.kind.stagger() {
            Stagger::None => {}
            Stagger::Rows => {
                let first_left = sheet.first_hex_left(self.kind);
                if first_left {
                    upper_left.x -= half;
                }
                let (top_odd, bottom_odd) = (field.y.rem_euclid(2) == 1, last_row.rem_euclid(2) == 1);
                if top_odd == bottom_odd {
                    if sheet.first_hex_right(self.kind) {
                        lower_right.x += half;
                    }
                } else if top_odd {
                    lower_right.x += if first_left { half } else { size };
                } else if first_left {
                    lower_right.x -= half;
                }
                upper_left.x += fifth;
                lower_right.x -= fifth;
            }
            Stagger::Columns => {
                let first_down = sheet.first_hex_down(self.kind);
                if sheet.first_hex_up(self.kind) {
                    upper_left.y -= half;
                }
                let (left_odd, right_odd) =
                    (field.x.rem_euclid(2) == 1, last_column.rem_euclid(2) == 1);
                if left_odd == right_odd {
                    if first_down {
                        lower_right.y += half;
                    }
                } else if left_odd {
                    lower_right.y += if first_down { size } else { half };
                } else if sheet.first_hex_up(self.kind) {
                    lower_right.y -= half;
                }
                upper_left.y += fifth;
                lower_right.y -= fifth;
            }
        }
        // Lower-right pixel of the lower-right cell.
        lower_right += IVec2::splat(size - 1);

        let upper_left = upper_left.max(IVec2::ZERO);
        let lower_right = lower_right.min(self.board_size() - IVec2::ONE);
        let extent = lower_right - upper_left + IVec2::ONE;
        Some(Rect::new(upper_left.x, upper_left.y, extent.x, extent.y))
    }
}

impl TryFrom<RawLayout> for Layout {
    type Error = LayoutError;

    fn try_from(raw: RawLayout) -> Result<Self, Self::Error> {
        Ok(Self::new(raw.kind, raw.hex_size, raw.columns, raw.rows)?
            .with_legacy_metrics(raw.legacy_metrics))
    }
}

impl From<Layout> for RawLayout {
    fn from(layout: Layout) -> Self {
        Self {
            kind: layout.kind,
            hex_size: layout.hex_size,
            columns: layout.columns,
            rows: layout.rows,
            legacy_metrics: layout.legacy_metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use mapgrid_core::CellIndex;
    use mapgrid_system_geometry::GeometricGrid;

    use super::*;

    const KINDS: [LayoutKind; 5] = [
        LayoutKind::Grid,
        LayoutKind::HorizontalHex,
        LayoutKind::VerticalHex,
        LayoutKind::GridOffsetRow,
        LayoutKind::GridOffsetColumn,
    ];

    fn layout(kind: LayoutKind) -> Layout {
        Layout::new(kind, 40, 10, 8).expect("valid layout")
    }

    #[test]
    fn orientation_byte_selects_layout() {
        assert_eq!(LayoutKind::from_orientation(0, false), LayoutKind::VerticalHex);
        assert_eq!(LayoutKind::from_orientation(1, true), LayoutKind::GridOffsetColumn);
        assert_eq!(LayoutKind::from_orientation(2, false), LayoutKind::HorizontalHex);
        assert_eq!(LayoutKind::from_orientation(2, true), LayoutKind::GridOffsetRow);
        assert_eq!(LayoutKind::from_orientation(3, false), LayoutKind::Grid);
    }

    #[test]
    fn spacing_follows_layout_kind() {
        let horizontal = layout(LayoutKind::HorizontalHex);
        assert_eq!((horizontal.delta_x(), horizontal.delta_y()), (40, 31));
        assert_eq!(horizontal.board_size(), IVec2::new(420, 257));

        let vertical = layout(LayoutKind::VerticalHex);
        assert_eq!((vertical.delta_x(), vertical.delta_y()), (32, 39));
        assert_eq!(vertical.origin(), IVec2::new(20, 20));
        assert_eq!(vertical.board_size(), IVec2::new(329, 333));

        let legacy = layout(LayoutKind::VerticalHex).with_legacy_metrics(true);
        assert_eq!((legacy.delta_x(), legacy.delta_y()), (31, 38));
        assert_eq!(legacy.origin(), IVec2::new(20, 19));

        let offset = layout(LayoutKind::GridOffsetRow);
        assert_eq!(offset.origin(), IVec2::new(23, 20));
        assert_eq!(offset.n_faces(), 6);
        assert_eq!(layout(LayoutKind::Grid).n_faces(), 4);
    }

    #[test]
    fn first_cell_starts_at_the_board_origin() {
        for kind in KINDS {
            assert_eq!(layout(kind).coordinates_to_position(0, 0), IVec2::ZERO);
            assert_eq!(layout(kind).index_to_position(0), Some(IVec2::ZERO));
        }
    }

    #[test]
    fn staggered_lines_shift_by_half_a_cell() {
        let rows = layout(LayoutKind::HorizontalHex);
        assert_eq!(rows.coordinates_to_position(2, 1), IVec2::new(100, 31));
        let columns = layout(LayoutKind::VerticalHex);
        assert_eq!(columns.coordinates_to_position(1, 2), IVec2::new(32, 97));
        assert_eq!(columns.index_to_position(12), Some(IVec2::new(64, 39)));
        assert_eq!(columns.index_to_position(80), None);
        assert_eq!(columns.position_on_board(-1, 0), None);
    }

    #[test]
    fn neighbours_of_staggered_cells() {
        let rows = layout(LayoutKind::HorizontalHex);
        // Cell (3, 1) sits on a shifted row.
        let index = 13;
        assert_eq!(rows.neighbour(index, Direction::NorthEast), rows.coordinates_to_position(4, 0));
        assert_eq!(rows.neighbour(index, Direction::NorthWest), rows.coordinates_to_position(3, 0));
        assert_eq!(rows.neighbour(index, Direction::SouthWest), rows.coordinates_to_position(3, 2));
        assert_eq!(rows.neighbour(index, Direction::East), rows.coordinates_to_position(4, 1));

        let columns = layout(LayoutKind::VerticalHex);
        // Cell (2, 1) sits on an unshifted column.
        let index = 12;
        assert_eq!(
            columns.neighbour(index, Direction::NorthEast),
            columns.coordinates_to_position(3, 0)
        );
        assert_eq!(
            columns.neighbour(index, Direction::SouthEast),
            columns.coordinates_to_position(3, 1)
        );
        assert_eq!(
            columns.neighbour(index, Direction::North),
            columns.coordinates_to_position(2, 0)
        );
    }

    #[test]
    fn neighbours_sit_one_cell_apart_on_hex_layouts() {
        for kind in [LayoutKind::HorizontalHex, LayoutKind::VerticalHex] {
            let layout = layout(kind);
            let grid = layout.geometric_grid().expect("valid grid");
            let index = 3 * layout.columns() + 4;
            let centre = layout.index_to_position(index).expect("on board") + layout.origin();
            let neighbours: HashSet<_> = Direction::ALL
                .into_iter()
                .map(|direction| layout.neighbour(index, direction) + layout.origin())
                .collect();
            assert_eq!(neighbours.len(), 6, "{kind:?}");
            for neighbour in neighbours {
                assert_eq!(grid.range(centre, neighbour), 1, "{kind:?}");
            }
        }
    }

    #[test]
    fn grid_cells_line_up_with_layout_cells() {
        for kind in KINDS {
            let layout = layout(kind);
            let grid = layout.geometric_grid().expect("valid grid");
            for (column, row) in [(0, 0), (3, 4), (9, 7), (4, 1)] {
                let centre = layout.coordinates_to_position(column, row) + layout.origin();
                assert_eq!(grid.cell_at(centre), CellIndex::new(column, row), "{kind:?}");
            }
        }
    }

    #[test]
    fn rejects_empty_boards() {
        assert_eq!(
            Layout::new(LayoutKind::Grid, 40, 0, 8),
            Err(LayoutError::InvalidSize {
                name: "columns",
                value: 0
            })
        );
        let json = r#"{"kind":"grid","hex_size":-4,"columns":2,"rows":2}"#;
        assert!(serde_json::from_str::<Layout>(json).is_err());
    }
}
