use mapgrid_core::{CellIndex, Polygon, Rect, Rgb};
use mapgrid_system_numbering::{AxisNumbering, AxisOrder, AxisType, NumberedGrid, RegularGridNumbering};
use mapgrid_system_zones::Zone;
use serde::{Deserialize, Serialize};

use crate::{
    layout::{LayoutKind, Stagger},
    Layout, LayoutError,
};

/// Location format given to zones created from map sheets.
pub const SHEET_LOCATION_FORMAT: &str = "$name$ $gridLocation$";

/// Numbering style flags of a map sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetStyle(pub u8);

impl SheetStyle {
    /// Column label written before the row label.
    pub const COLUMNS_FIRST: u8 = 0x02;
    /// Column labels are numeric.
    pub const NUMERIC_COLUMNS: u8 = 0x04;
    /// Row labels are numeric.
    pub const NUMERIC_ROWS: u8 = 0x08;
    /// Column labels increase going right.
    pub const COLUMNS_INCREASE_RIGHT: u8 = 0x10;
    /// Row labels increase going down.
    pub const ROWS_INCREASE_DOWN: u8 = 0x20;
    /// The first column (or row) is the offset one.
    pub const FIRST_HEX_SHIFTED: u8 = 0x40;

    fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }
}

/// Rectangular block of cells numbered by its own scheme.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSheet {
    /// Sheet name, used as the zone name.
    pub name: String,
    /// Cells covered by the sheet, in layout coordinates.
    pub field: Rect,
    /// Numbering style flags.
    #[serde(default)]
    pub style: SheetStyle,
    /// Characters in a column label.
    #[serde(default)]
    pub column_chars: u32,
    /// Characters in a row label.
    #[serde(default)]
    pub row_chars: u32,
    /// Label value of the sheet's leftmost column.
    #[serde(default)]
    pub top_left_column: i32,
    /// Label value of the sheet's topmost row.
    #[serde(default)]
    pub top_left_row: i32,
}

impl MapSheet {
    /// Creates a sheet covering `field` with default numbering flags.
    #[must_use]
    pub fn new(name: impl Into<String>, field: Rect) -> Self {
        Self {
            name: name.into(),
            field,
            style: SheetStyle::default(),
            column_chars: 0,
            row_chars: 0,
            top_left_column: 0,
            top_left_row: 0,
        }
    }

    /// Column label written first.
    #[must_use]
    pub fn columns_first(&self) -> bool {
        self.style.has(SheetStyle::COLUMNS_FIRST)
    }

    /// Column labels are numeric.
    #[must_use]
    pub fn numeric_columns(&self) -> bool {
        self.style.has(SheetStyle::NUMERIC_COLUMNS)
    }

    /// Row labels are numeric.
    #[must_use]
    pub fn numeric_rows(&self) -> bool {
        self.style.has(SheetStyle::NUMERIC_ROWS)
    }

    /// Column labels increase going right.
    #[must_use]
    pub fn columns_increase_right(&self) -> bool {
        self.style.has(SheetStyle::COLUMNS_INCREASE_RIGHT)
    }

    /// Row labels increase going down.
    #[must_use]
    pub fn rows_increase_down(&self) -> bool {
        self.style.has(SheetStyle::ROWS_INCREASE_DOWN)
    }

    fn first_shifted(&self, kind: LayoutKind, stagger: Stagger, shifted: bool) -> bool {
        kind.stagger() == stagger && self.style.has(SheetStyle::FIRST_HEX_SHIFTED) == shifted
    }

    /// The sheet's first column sits above the second one.
    #[must_use]
    pub fn first_hex_up(&self, kind: LayoutKind) -> bool {
        self.first_shifted(kind, Stagger::Columns, false)
    }

    /// The sheet's first column sits below the second one.
    #[must_use]
    pub fn first_hex_down(&self, kind: LayoutKind) -> bool {
        self.first_shifted(kind, Stagger::Columns, true)
    }

    /// The sheet's first row sits left of the second one.
    #[must_use]
    pub fn first_hex_left(&self, kind: LayoutKind) -> bool {
        self.first_shifted(kind, Stagger::Rows, true)
    }

    /// The sheet's first row sits right of the second one.
    #[must_use]
    pub fn first_hex_right(&self, kind: LayoutKind) -> bool {
        self.first_shifted(kind, Stagger::Rows, false)
    }

    /// Pixel rectangle enclosing the sheet.
    #[must_use]
    pub fn rectangle(&self, layout: &Layout) -> Option<Rect> {
        layout.sheet_rectangle(self)
    }

    /// Zone boundary through the corner pixels of the sheet rectangle.
    #[must_use]
    pub fn zone_path(&self, layout: &Layout) -> Option<Polygon> {
        let rect = self.rectangle(layout)?;
        Some(Polygon::from_rect(Rect::new(
            rect.x,
            rect.y,
            rect.width - 1,
            rect.height - 1,
        )))
    }

    fn staggered(&self, kind: LayoutKind) -> bool {
        let column_odd = self.field.x.rem_euclid(2) == 1;
        let row_odd = self.field.y.rem_euclid(2) == 1;
        (self.first_hex_down(kind) && column_odd)
            || (self.first_hex_up(kind) && !column_odd)
            || (self.first_hex_left(kind) && row_odd)
            || (self.first_hex_right(kind) && !row_odd)
    }

    /// Numbering scheme of the sheet before its offsets are applied.
    #[must_use]
    pub fn base_numbering(&self, kind: LayoutKind) -> RegularGridNumbering {
        let axis = |numeric: bool, chars: u32, increasing: bool| AxisNumbering {
            kind: if numeric {
                AxisType::Numeric
            } else {
                AxisType::Alphabetic
            },
            leading: chars.saturating_sub(1),
            descending: !increasing,
            offset: 0,
        };
        RegularGridNumbering {
            first: if self.columns_first() {
                AxisOrder::ColumnFirst
            } else {
                AxisOrder::RowFirst
            },
            separator: String::new(),
            column: axis(
                self.numeric_columns(),
                self.column_chars,
                self.columns_increase_right(),
            ),
            row: axis(self.numeric_rows(), self.row_chars, self.rows_increase_down()),
            stagger: self.staggered(kind),
            visible: false,
            color: Rgb::BLACK,
        }
    }

    /// Layout grid numbered so the sheet's top-left cell carries the
    /// sheet's top-left label values.
    pub fn numbered_grid(&self, layout: &Layout) -> Result<NumberedGrid, LayoutError> {
        let grid = layout.geometric_grid()?;
        let mut numbering = self.base_numbering(layout.kind());
        let corner = CellIndex::new(self.field.x, self.field.y);
        let column = numbering.column_label_value(&grid, corner);
        let row = numbering.row_label_value(&grid, corner);
        let overflow = || LayoutError::OffsetOutOfRange(self.name.clone());
        numbering.column.offset =
            i32::try_from(i64::from(self.top_left_column) - column).map_err(|_| overflow())?;
        numbering.row.offset =
            i32::try_from(i64::from(self.top_left_row) - row).map_err(|_| overflow())?;
        Ok(NumberedGrid::new(grid, Some(numbering)))
    }

    /// Zone covering the sheet, named after it and numbered by it.
    pub fn zone(&self, layout: &Layout) -> Result<Zone, LayoutError> {
        let path = self
            .zone_path(layout)
            .ok_or_else(|| LayoutError::EmptySheet(self.name.clone()))?;
        let mut zone = Zone::new(self.name.clone(), path).with_grid(self.numbered_grid(layout)?);
        zone.set_location_format(SHEET_LOCATION_FORMAT);
        Ok(zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(style: u8) -> MapSheet {
        MapSheet {
            style: SheetStyle(style),
            column_chars: 2,
            row_chars: 2,
            ..MapSheet::new("North", Rect::new(2, 3, 4, 5))
        }
    }

    const NUMERIC_DOWN_RIGHT: u8 = SheetStyle::COLUMNS_FIRST
        | SheetStyle::NUMERIC_COLUMNS
        | SheetStyle::NUMERIC_ROWS
        | SheetStyle::COLUMNS_INCREASE_RIGHT
        | SheetStyle::ROWS_INCREASE_DOWN;

    #[test]
    fn square_sheet_rectangle_covers_its_cells() {
        let layout = Layout::new(LayoutKind::Grid, 40, 10, 10).expect("valid layout");
        let sheet = sheet(NUMERIC_DOWN_RIGHT);
        assert_eq!(sheet.rectangle(&layout), Some(Rect::new(80, 120, 160, 200)));
        assert_eq!(
            sheet.zone_path(&layout).map(|path| path.to_path()).as_deref(),
            Some("80,120;239,120;239,319;80,319")
        );
    }

    #[test]
    fn rectangles_are_clipped_to_the_board() {
        let layout = Layout::new(LayoutKind::Grid, 40, 4, 4).expect("valid layout");
        let sheet = MapSheet::new("Edge", Rect::new(2, 2, 5, 5));
        assert_eq!(sheet.rectangle(&layout), Some(Rect::new(80, 80, 80, 80)));
        assert_eq!(MapSheet::new("Empty", Rect::new(0, 0, 0, 3)).rectangle(&layout), None);
    }

    #[test]
    fn vertical_hex_sheet_trims_neighbouring_centres() {
        let layout = Layout::new(LayoutKind::VerticalHex, 40, 10, 10).expect("valid layout");
        let sheet = sheet(NUMERIC_DOWN_RIGHT);
        // First column even and not shifted down: the sheet starts half a hex higher.
        assert!(sheet.first_hex_up(layout.kind()));
        let rect = sheet.rectangle(&layout).expect("non-empty");
        assert_eq!(rect.x, 64);
        assert_eq!(rect.y, 3 * 39 - 20 + 8);
    }

    #[test]
    fn style_flags_drive_the_numbering() {
        let numbering = sheet(NUMERIC_DOWN_RIGHT).base_numbering(LayoutKind::Grid);
        assert_eq!(numbering.first, AxisOrder::ColumnFirst);
        assert_eq!(numbering.column.kind, AxisType::Numeric);
        assert_eq!(numbering.column.leading, 1);
        assert!(!numbering.column.descending);
        assert!(!numbering.stagger);

        let numbering = sheet(0).base_numbering(LayoutKind::Grid);
        assert_eq!(numbering.first, AxisOrder::RowFirst);
        assert_eq!(numbering.row.kind, AxisType::Alphabetic);
        assert!(numbering.row.descending);
    }

    #[test]
    fn top_left_cell_carries_the_sheet_labels() {
        let layout = Layout::new(LayoutKind::Grid, 40, 10, 10).expect("valid layout");
        let sheet = MapSheet {
            top_left_column: 10,
            top_left_row: 0,
            ..sheet(NUMERIC_DOWN_RIGHT)
        };
        let grid = sheet.numbered_grid(&layout).expect("numbered");
        assert_eq!(grid.label(CellIndex::new(2, 3)).as_deref(), Some("1101"));
        assert_eq!(grid.label(CellIndex::new(3, 4)).as_deref(), Some("1202"));
    }

    #[test]
    fn sheet_zone_names_locations_inside_the_sheet() {
        let layout = Layout::new(LayoutKind::VerticalHex, 40, 10, 10).expect("valid layout");
        let zone = sheet(NUMERIC_DOWN_RIGHT).zone(&layout).expect("zone");
        assert_eq!(zone.name(), "North");
        assert_eq!(zone.location_format(), SHEET_LOCATION_FORMAT);

        let centre = layout.coordinates_to_position(3, 5) + layout.origin();
        let name = zone.location_name(centre);
        // Column 3 is shifted down, so its row labels are staggered by one.
        assert_eq!(name, "North 0204");
        let resolved = zone.location(&name).expect("inside the sheet");
        assert!((resolved - centre).abs().max_element() <= 1);
    }

    #[test]
    fn empty_sheets_have_no_zone() {
        let layout = Layout::new(LayoutKind::Grid, 40, 10, 10).expect("valid layout");
        assert_eq!(
            MapSheet::new("Void", Rect::new(0, 0, 0, 0)).zone(&layout),
            Err(LayoutError::EmptySheet("Void".to_owned()))
        );
    }
}
