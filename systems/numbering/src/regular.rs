use std::{fmt, str::FromStr};

use mapgrid_core::{
    attributes::{AttributeError, AttributeMap, Configurable, Field, FieldKind, UnknownChoice},
    Axis, CellIndex, GridError, Point, Rgb,
};
use mapgrid_system_geometry::GeometricGrid;
use serde::{Deserialize, Serialize};

use crate::label;

/// Encoding of one axis label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisType {
    /// Decimal digits.
    #[default]
    Numeric,
    /// Spreadsheet-style letters.
    Alphabetic,
}

impl AxisType {
    /// Attribute strings accepted for the axis type.
    pub const NAMES: &'static [&'static str] = &["N", "A"];
}

impl fmt::Display for AxisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Numeric => "N",
            Self::Alphabetic => "A",
        })
    }
}

impl FromStr for AxisType {
    type Err = UnknownChoice;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "N" => Ok(Self::Numeric),
            "A" => Ok(Self::Alphabetic),
            _ => Err(UnknownChoice::new(value, Self::NAMES)),
        }
    }
}

/// Which axis label is written first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisOrder {
    /// Column label, then row label.
    #[default]
    ColumnFirst,
    /// Row label, then column label.
    RowFirst,
}

impl AxisOrder {
    /// Attribute strings accepted for the axis order.
    pub const NAMES: &'static [&'static str] = &["H", "V"];

    const fn axes(self) -> [Axis; 2] {
        match self {
            Self::ColumnFirst => [Axis::Column, Axis::Row],
            Self::RowFirst => [Axis::Row, Axis::Column],
        }
    }
}

impl fmt::Display for AxisOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ColumnFirst => "H",
            Self::RowFirst => "V",
        })
    }
}

impl FromStr for AxisOrder {
    type Err = UnknownChoice;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "H" => Ok(Self::ColumnFirst),
            "V" => Ok(Self::RowFirst),
            _ => Err(UnknownChoice::new(value, Self::NAMES)),
        }
    }
}

/// Labelling rules for one axis.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisNumbering {
    /// Label encoding.
    #[serde(rename = "type")]
    pub kind: AxisType,
    /// Extra leading characters: labels are padded to `leading + 1` zero
    /// digits, or `A` letters on alphabetic axes.
    pub leading: u32,
    /// Labels decrease as the raw index grows.
    pub descending: bool,
    /// Label value of raw index zero.
    pub offset: i32,
}

impl AxisNumbering {
    fn sign(&self) -> i64 {
        if self.descending {
            -1
        } else {
            1
        }
    }

    /// Label value of a raw index, before stagger adjustment.
    fn value(&self, raw: i32) -> i64 {
        self.sign() * i64::from(raw) + i64::from(self.offset)
    }

    /// Raw index carrying label value `value`, before stagger adjustment.
    fn raw(&self, value: i64) -> Option<i32> {
        i32::try_from(self.sign() * (value - i64::from(self.offset))).ok()
    }

    /// Minimum number of characters in a label, not counting a sign.
    fn width(&self) -> usize {
        self.leading as usize + 1
    }

    fn format(&self, value: i64) -> String {
        let ordinal = value + 1;
        match self.kind {
            AxisType::Numeric => label::format_numeric(ordinal, self.width()),
            AxisType::Alphabetic => label::format_alphabetic(ordinal, self.width()),
        }
    }

    fn decode(&self, text: &str) -> Option<i64> {
        let ordinal = match self.kind {
            AxisType::Numeric => label::decode_numeric(text)?,
            AxisType::Alphabetic => label::decode_alphabetic(text, self.width())?,
        };
        Some(ordinal - 1)
    }
}

/// Row and column labelling for a regular grid.
///
/// The label value of an axis is `±raw + offset` (negated when descending)
/// plus one on cells the grid reports as staggered along that axis when
/// `stagger` is set. A value `v` is written as ordinal `v + 1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegularGridNumbering {
    /// Axis written first.
    pub first: AxisOrder,
    /// Text placed between the two axis labels.
    pub separator: String,
    /// Column labelling.
    pub column: AxisNumbering,
    /// Row labelling.
    pub row: AxisNumbering,
    /// Offset lines count one higher along their staggered axis.
    pub stagger: bool,
    /// Labels are drawn in grid overlays.
    pub visible: bool,
    /// Colour of drawn labels.
    pub color: Rgb,
}

impl Default for RegularGridNumbering {
    fn default() -> Self {
        Self {
            first: AxisOrder::ColumnFirst,
            separator: String::new(),
            column: AxisNumbering {
                kind: AxisType::Alphabetic,
                ..AxisNumbering::default()
            },
            row: AxisNumbering::default(),
            stagger: false,
            visible: false,
            color: Rgb::BLACK,
        }
    }
}

impl RegularGridNumbering {
    fn axis(&self, axis: Axis) -> &AxisNumbering {
        match axis {
            Axis::Column => &self.column,
            Axis::Row => &self.row,
        }
    }

    fn stagger_bonus(&self, grid: &dyn GeometricGrid, cell: CellIndex, axis: Axis) -> i64 {
        if self.stagger && grid.stagger_axis(cell) == Some(axis) {
            1
        } else {
            0
        }
    }

    fn label_value(&self, grid: &dyn GeometricGrid, cell: CellIndex, axis: Axis) -> i64 {
        self.axis(axis).value(cell.along(axis)) + self.stagger_bonus(grid, cell, axis)
    }

    /// Label value of the cell's column.
    #[must_use]
    pub fn column_label_value(&self, grid: &dyn GeometricGrid, cell: CellIndex) -> i64 {
        self.label_value(grid, cell, Axis::Column)
    }

    /// Label value of the cell's row.
    #[must_use]
    pub fn row_label_value(&self, grid: &dyn GeometricGrid, cell: CellIndex) -> i64 {
        self.label_value(grid, cell, Axis::Row)
    }

    /// Text of one axis label of `cell`.
    #[must_use]
    pub fn axis_label(&self, grid: &dyn GeometricGrid, cell: CellIndex, axis: Axis) -> String {
        self.axis(axis).format(self.label_value(grid, cell, axis))
    }

    /// Full label of `cell`.
    #[must_use]
    pub fn label(&self, grid: &dyn GeometricGrid, cell: CellIndex) -> String {
        let [first, second] = self.first.axes();
        format!(
            "{}{}{}",
            self.axis_label(grid, cell, first),
            self.separator,
            self.axis_label(grid, cell, second)
        )
    }

    /// Label of the cell covering `point`.
    #[must_use]
    pub fn location_name(&self, grid: &dyn GeometricGrid, point: Point) -> String {
        self.label(grid, grid.cell_at(point))
    }

    /// Cell whose label is exactly `label`.
    ///
    /// The first axis label is read at its configured width before any other
    /// split is tried, so padded labels split without a separator.
    pub fn parse(&self, grid: &dyn GeometricGrid, label: &str) -> Result<CellIndex, GridError> {
        let [first, second] = self.first.axes();
        let width = self.axis(first).width();
        let padded = if label.starts_with('-') {
            width + 1
        } else {
            width
        };
        let splits = std::iter::once(padded)
            .chain(label.char_indices().map(|(index, _)| index))
            .chain(std::iter::once(label.len()))
            .filter(|split| label.is_char_boundary(*split));
        for split in splits {
            let (head, rest) = label.split_at(split);
            let Some(tail) = rest.strip_prefix(self.separator.as_str()) else {
                continue;
            };
            let (Some(head_value), Some(tail_value)) =
                (self.axis(first).decode(head), self.axis(second).decode(tail))
            else {
                continue;
            };
            let mut values = [0; 2];
            values[axis_slot(first)] = head_value;
            values[axis_slot(second)] = tail_value;
            if let Some(cell) = self.cell_with_values(grid, values[0], values[1]) {
                if self.label(grid, cell) == label {
                    return Ok(cell);
                }
            }
        }
        Err(GridError::BadCoordinate(label.to_owned()))
    }

    /// Pixel centre of the cell labelled `label`.
    pub fn location(&self, grid: &dyn GeometricGrid, label: &str) -> Result<Point, GridError> {
        Ok(grid.cell_center(self.parse(grid, label)?))
    }

    /// Finds the cell carrying the given label values.
    ///
    /// Staggered cells add one to a label value, so the raw index of either
    /// axis may sit one label below the value read.
    fn cell_with_values(
        &self,
        grid: &dyn GeometricGrid,
        column_value: i64,
        row_value: i64,
    ) -> Option<CellIndex> {
        let columns = [column_value, column_value - 1];
        let rows = [row_value, row_value - 1];
        columns
            .iter()
            .flat_map(|column| rows.iter().map(move |row| (*column, *row)))
            .filter_map(|(column, row)| {
                Some(CellIndex::new(
                    self.column.raw(column)?,
                    self.row.raw(row)?,
                ))
            })
            .find(|cell| {
                self.column_label_value(grid, *cell) == column_value
                    && self.row_label_value(grid, *cell) == row_value
            })
    }
}

const fn axis_slot(axis: Axis) -> usize {
    match axis {
        Axis::Column => 0,
        Axis::Row => 1,
    }
}

fn numbering_visible(config: &RegularGridNumbering) -> bool {
    config.visible
}

static NUMBERING_SCHEMA: &[Field<RegularGridNumbering>] = &[
    Field::new("first", FieldKind::Choice(AxisOrder::NAMES), "Order"),
    Field::new("sep", FieldKind::Text, "Separator"),
    Field::new("hType", FieldKind::Choice(AxisType::NAMES), "Horizontal numbering"),
    Field::new("hLeading", FieldKind::Integer, "Leading zeros in horizontal"),
    Field::new("hDescend", FieldKind::Boolean, "Horizontal numbering descending?"),
    Field::new("hOff", FieldKind::Integer, "Starting number in horizontal"),
    Field::new("vType", FieldKind::Choice(AxisType::NAMES), "Vertical numbering"),
    Field::new("vLeading", FieldKind::Integer, "Leading zeros in vertical"),
    Field::new("vDescend", FieldKind::Boolean, "Vertical numbering descending?"),
    Field::new("vOff", FieldKind::Integer, "Starting number in vertical"),
    Field::new("stagger", FieldKind::Boolean, "Odd-numbered lines numbered higher?"),
    Field::new("visible", FieldKind::Boolean, "Draw numbering?"),
    Field::new("color", FieldKind::Color, "Color").visible_when(numbering_visible),
];

impl Configurable for RegularGridNumbering {
    fn schema() -> &'static [Field<Self>] {
        NUMBERING_SCHEMA
    }

    fn to_attributes(&self) -> AttributeMap {
        AttributeMap::new()
            .with("first", self.first)
            .with("sep", &self.separator)
            .with("hType", self.column.kind)
            .with("hLeading", self.column.leading)
            .with("hDescend", self.column.descending)
            .with("hOff", self.column.offset)
            .with("vType", self.row.kind)
            .with("vLeading", self.row.leading)
            .with("vDescend", self.row.descending)
            .with("vOff", self.row.offset)
            .with("stagger", self.stagger)
            .with("visible", self.visible)
            .with("color", self.color)
    }

    fn decode_attributes(map: &AttributeMap) -> Result<Self, AttributeError> {
        Ok(Self {
            first: map.parse("first")?,
            separator: map.require("sep")?.to_owned(),
            column: AxisNumbering {
                kind: map.parse("hType")?,
                leading: map.parse("hLeading")?,
                descending: map.parse("hDescend")?,
                offset: map.parse("hOff")?,
            },
            row: AxisNumbering {
                kind: map.parse("vType")?,
                leading: map.parse("vLeading")?,
                descending: map.parse("vDescend")?,
                offset: map.parse("vOff")?,
            },
            stagger: map.parse("stagger")?,
            visible: map.parse("visible")?,
            color: map.parse("color")?,
        })
    }
}
