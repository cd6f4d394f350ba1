use mapgrid_core::{DVec2, IVec2, Rgb};
use serde::{Deserialize, Serialize};

use crate::{layout::Direction, Layout};

/// Hex sides drawn along the edge of one cell.
///
/// Only the north and west sides of a cell are encoded; the remaining sides
/// belong to the neighbouring cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexSides(pub u16);

impl HexSides {
    /// Lower-left side of a hex in columns.
    pub const VERTICAL_SOUTH_WEST: u16 = 0x01;
    /// Upper-left side of a hex in columns.
    pub const VERTICAL_NORTH_WEST: u16 = 0x02;
    /// Top side of a hex in columns.
    pub const VERTICAL_NORTH: u16 = 0x04;
    /// Lower-left side of a hex in rows.
    pub const HORIZONTAL_SOUTH_WEST: u16 = 0x08;
    /// Left side of a hex in rows.
    pub const HORIZONTAL_WEST: u16 = 0x10;
    /// Upper-left side of a hex in rows.
    pub const HORIZONTAL_NORTH_WEST: u16 = 0x20;
    /// Left side of a square.
    pub const SQUARE_LEFT: u16 = 0x40;
    /// Top side of a square.
    pub const SQUARE_TOP: u16 = 0x80;

    fn has(self, flag: u16) -> bool {
        self.0 & flag != 0
    }
}

/// Spokes drawn from a cell centre towards its neighbours.
///
/// Several file versions encode the same direction with different bits, so
/// each direction is a mask of every bit that selects it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexLineDirections(pub u16);

impl HexLineDirections {
    /// Spoke towards the north-west neighbour.
    pub const NORTH_WEST: u16 = 0x0006;
    /// Spoke towards the west neighbour.
    pub const WEST: u16 = 0x0008;
    /// Spoke towards the south-west neighbour.
    pub const SOUTH_WEST: u16 = 0x0030;
    /// Spoke towards the south neighbour.
    pub const SOUTH: u16 = 0x0080;
    /// Spoke towards the north neighbour.
    pub const NORTH: u16 = 0x0100;
    /// Spoke towards the north-east neighbour.
    pub const NORTH_EAST: u16 = 0x0C00;
    /// Spoke towards the east neighbour.
    pub const EAST: u16 = 0x1000;
    /// Spoke towards the south-east neighbour.
    pub const SOUTH_EAST: u16 = 0x6000;

    const SPOKES: [(u16, Direction); 8] = [
        (Self::NORTH_WEST, Direction::NorthWest),
        (Self::WEST, Direction::West),
        (Self::SOUTH_WEST, Direction::SouthWest),
        (Self::SOUTH, Direction::South),
        (Self::NORTH, Direction::North),
        (Self::NORTH_EAST, Direction::NorthEast),
        (Self::EAST, Direction::East),
        (Self::SOUTH_EAST, Direction::SouthEast),
    ];
}

/// Straight piece of a line, in pixels.
pub type Segment = (DVec2, DVec2);

fn segment(from: IVec2, to: IVec2) -> Segment {
    (from.as_dvec2(), to.as_dvec2())
}

impl Layout {
    /// Segments outlining the requested sides of the cell at `index`.
    ///
    /// Cells off the board yield nothing.
    #[must_use]
    pub fn hex_side_segments(&self, index: i32, sides: HexSides) -> Vec<Segment> {
        let Some(p) = self.index_to_position(index) else {
            return Vec::new();
        };
        let fifth = self.hex_size() / 5;
        let (dx, dy) = (self.delta_x(), self.delta_y());
        let south_west_y = self.neighbour(index, Direction::SouthWest).y;
        let mut segments = Vec::new();

        if sides.has(HexSides::VERTICAL_SOUTH_WEST) {
            let south = self.neighbour(index, Direction::South);
            segments.push(segment(
                IVec2::new(p.x, south_west_y),
                IVec2::new(p.x + fifth, south.y),
            ));
        }
        if sides.has(HexSides::VERTICAL_NORTH_WEST) {
            segments.push(segment(
                IVec2::new(p.x, south_west_y),
                IVec2::new(p.x + fifth, p.y),
            ));
        }
        if sides.has(HexSides::VERTICAL_NORTH) {
            segments.push(segment(IVec2::new(p.x + fifth, p.y), IVec2::new(p.x + dx, p.y)));
        }
        if sides.has(HexSides::HORIZONTAL_SOUTH_WEST) {
            let south_east = self.neighbour(index, Direction::SouthEast);
            segments.push(segment(
                IVec2::new(p.x, p.y + dy),
                IVec2::new(south_east.x, p.y + dy + fifth),
            ));
        }
        if sides.has(HexSides::HORIZONTAL_WEST) {
            segments.push(segment(IVec2::new(p.x, p.y + fifth), IVec2::new(p.x, p.y + dy)));
        }
        if sides.has(HexSides::HORIZONTAL_NORTH_WEST) {
            let north_east = self.neighbour(index, Direction::NorthEast);
            segments.push(segment(
                IVec2::new(p.x, p.y + fifth),
                IVec2::new(north_east.x, p.y),
            ));
        }
        if sides.has(HexSides::SQUARE_LEFT) {
            segments.push(segment(p, IVec2::new(p.x, p.y + dy)));
        }
        if sides.has(HexSides::SQUARE_TOP) {
            segments.push(segment(p, IVec2::new(p.x + dx, p.y)));
        }
        segments
    }

    /// Spokes from the centre of the cell at `index` to the midpoints
    /// between it and the requested neighbours.
    #[must_use]
    pub fn hex_line_segments(&self, index: i32, directions: HexLineDirections) -> Vec<Segment> {
        let Some(position) = self.index_to_position(index) else {
            return Vec::new();
        };
        let half = IVec2::splat(self.hex_size() / 2);
        let centre = (position + half).as_dvec2();
        HexLineDirections::SPOKES
            .iter()
            .filter(|(mask, _)| directions.0 & mask != 0)
            .map(|&(_, direction)| {
                let neighbour = (self.neighbour(index, direction) + half).as_dvec2();
                (centre, (centre + neighbour) / 2.0)
            })
            .collect()
    }
}

/// Polylines assembled from loose segments.
///
/// Segments that share an end point with an existing polyline extend it, and
/// a segment bridging two polylines joins them. Repeated segments are
/// dropped. A polyline whose first and last points coincide is closed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineSet {
    lines: Vec<Vec<DVec2>>,
}

impl LineSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Polylines in creation order.
    #[must_use]
    pub fn polylines(&self) -> &[Vec<DVec2>] {
        &self.lines
    }

    /// Number of polylines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` when no segment has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Forgets every polyline.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Moves the polyline at `take` onto the polyline at `keep`.
    fn merge(&mut self, keep: usize, take: usize, join: impl FnOnce(&mut Vec<DVec2>, Vec<DVec2>)) {
        let taken = self.lines.remove(take);
        let keep = if take < keep { keep - 1 } else { keep };
        join(&mut self.lines[keep], taken);
    }

    fn find_other(&self, skip: usize, matches: impl Fn(&[DVec2]) -> bool) -> Option<usize> {
        self.lines
            .iter()
            .enumerate()
            .position(|(index, line)| index != skip && matches(line))
    }

    /// Adds the segment from `a` to `b`.
    pub fn add_segment(&mut self, a: DVec2, b: DVec2) {
        if a == b {
            return;
        }
        for i in 0..self.lines.len() {
            let line = &self.lines[i];
            let last = line.len() - 1;
            if line[0] == a {
                if line[1] == b {
                    return;
                }
                if let Some(j) = self.find_other(i, |other| other[0] == b) {
                    self.merge(i, j, |line, other| {
                        let mut joined: Vec<_> = other.into_iter().rev().collect();
                        joined.append(line);
                        *line = joined;
                    });
                } else if let Some(j) = self.find_other(i, |other| other[other.len() - 1] == b) {
                    self.merge(j, i, |other, line| other.extend(line));
                } else {
                    self.lines[i].insert(0, b);
                }
                return;
            }
            if line[last] == a {
                if line[last - 1] == b {
                    return;
                }
                if let Some(j) = self.find_other(i, |other| other[0] == b) {
                    self.merge(i, j, |line, other| line.extend(other));
                } else if let Some(j) = self.find_other(i, |other| other[other.len() - 1] == b) {
                    self.merge(i, j, |line, other| line.extend(other.into_iter().rev()));
                } else {
                    self.lines[i].push(b);
                }
                return;
            }
            let repeated = (1..last).any(|k| line[k] == a && (line[k - 1] == b || line[k + 1] == b));
            if repeated {
                return;
            }
        }

        for line in &mut self.lines {
            let last = line.len() - 1;
            if line[0] == b {
                if line[1] != a {
                    line.insert(0, a);
                }
                return;
            }
            if line[last] == b {
                if line[last - 1] != a {
                    line.push(a);
                }
                return;
            }
        }

        self.lines.push(vec![a, b]);
    }
}

/// Dash pattern of a drawn line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    /// Long dash, gap, dot, gap.
    DashDot,
    /// Long dash followed by two dots.
    DashDotDot,
    /// Evenly spaced dashes.
    Dashed,
    /// Evenly spaced dots.
    Dotted,
    /// Continuous line.
    #[default]
    Solid,
}

impl LineStyle {
    /// Alternating on and off lengths in pixels; `None` for solid lines.
    #[must_use]
    pub fn dash_pattern(self) -> Option<&'static [f32]> {
        match self {
            Self::DashDot => Some(&[12.0, 8.0, 4.0, 8.0]),
            Self::DashDotDot => Some(&[12.0, 4.0, 4.0, 4.0, 4.0, 4.0]),
            Self::Dashed => Some(&[12.0, 8.0]),
            Self::Dotted => Some(&[4.0, 4.0]),
            Self::Solid => None,
        }
    }
}

/// Appearance of a family of hex sides or hex lines, with the polylines
/// collected for it.
#[derive(Clone, Debug, PartialEq)]
pub struct LineDefinition {
    /// Stroke colour.
    pub color: Rgb,
    /// Stroke width in pixels; zero hides the line.
    pub width: u32,
    /// Dash pattern.
    pub style: LineStyle,
    /// Collected polylines.
    pub lines: LineSet,
}

impl LineDefinition {
    /// Creates a definition with no collected lines.
    #[must_use]
    pub fn new(color: Rgb, width: u32, style: LineStyle) -> Self {
        Self {
            color,
            width,
            style,
            lines: LineSet::new(),
        }
    }

    /// Whether the line is drawn at all.
    #[must_use]
    pub fn is_drawn(&self) -> bool {
        self.width > 0
    }

    /// Collects segments into the definition's polylines.
    pub fn extend(&mut self, segments: impl IntoIterator<Item = Segment>) {
        for (a, b) in segments {
            self.lines.add_segment(a, b);
        }
    }
}
