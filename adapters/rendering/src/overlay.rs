use mapgrid_core::{CellIndex, DVec2, Point, Polygon, Rect};
use mapgrid_system_geometry::{BoardGrid, GeometricGrid};
use mapgrid_system_numbering::NumberedGrid;
use mapgrid_system_zones::ZonedGrid;
use serde::Serialize;

use crate::{Color, Raster};

/// Placement of a board inside the view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    /// View-space rectangle the whole board is drawn into.
    pub bounds: Rect,
    /// Part of the view currently visible.
    pub visible: Rect,
    /// Zoom factor from board pixels to view pixels.
    pub scale: f64,
    /// Board is drawn mirrored on both axes.
    pub reversed: bool,
}

impl View {
    /// Unscaled view of a whole board of `size` pixels.
    #[must_use]
    pub fn whole_board(size: Point) -> Self {
        let bounds = Rect::new(0, 0, size.x, size.y);
        Self {
            bounds,
            visible: bounds,
            scale: 1.0,
            reversed: false,
        }
    }

    /// Visible part of the board.
    #[must_use]
    pub fn region(&self) -> Rect {
        self.bounds.intersection(&self.visible)
    }

    fn anchor(&self) -> DVec2 {
        let corner = DVec2::new(f64::from(self.bounds.x), f64::from(self.bounds.y));
        if self.reversed {
            corner + DVec2::new(f64::from(self.bounds.width), f64::from(self.bounds.height))
        } else {
            corner
        }
    }

    fn direction(&self) -> f64 {
        if self.reversed {
            -self.scale
        } else {
            self.scale
        }
    }

    /// Maps a board pixel into the view.
    #[must_use]
    pub fn to_view(&self, board: DVec2) -> DVec2 {
        self.anchor() + board * self.direction()
    }

    /// Maps a view pixel back onto the board.
    #[must_use]
    pub fn to_board(&self, view: DVec2) -> DVec2 {
        (view - self.anchor()) / self.direction()
    }
}

/// Straight line in view pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LineSegment {
    /// Start point.
    pub from: DVec2,
    /// End point.
    pub to: DVec2,
}

/// Cell label anchored at a cell centre in view pixels.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabelPlacement {
    /// Label text.
    pub text: String,
    /// Centre of the labelled cell.
    pub position: DVec2,
}

/// Drawable description of a grid within a view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GridOverlay {
    /// Colour of lines and dots.
    pub color: Color,
    /// Grid lines, clipped to the visible region.
    pub lines: Vec<LineSegment>,
    /// Cell centres to mark with dots.
    pub dots: Vec<DVec2>,
    /// Colour of labels.
    pub label_color: Color,
    /// Cell labels.
    pub labels: Vec<LabelPlacement>,
}

impl GridOverlay {
    /// Overlay of `grid` over the visible part of `view`.
    ///
    /// Lines are only produced when the grid is visible, dots when centre
    /// dots are enabled and labels when the numbering is visible.
    #[must_use]
    pub fn build(grid: &NumberedGrid, view: &View) -> Self {
        Self::build_within(grid, view, view.region(), None)
    }

    fn build_within(
        grid: &NumberedGrid,
        view: &View,
        region: Rect,
        zone: Option<&Polygon>,
    ) -> Self {
        let numbering = grid.numbering.as_ref();
        let mut overlay = Self {
            color: grid.grid.color().into(),
            lines: Vec::new(),
            dots: Vec::new(),
            label_color: numbering.map_or(Color::TRANSPARENT, |numbering| numbering.color.into()),
            labels: Vec::new(),
        };
        if region.is_empty() {
            return overlay;
        }
        let labels_visible = numbering.map_or(false, |numbering| numbering.visible);
        let zone_shape = zone.map(Polygon::to_shape);
        let centres_inside = |cell: CellIndex| {
            let centre = grid.grid.cell_center(cell);
            let inside_zone = zone_shape
                .as_ref()
                .map_or(true, |shape| shape.contains(centre.as_dvec2()));
            let position = view.to_view(centre.as_dvec2());
            (inside_zone && contains(region, position)).then_some(position)
        };

        match &grid.grid {
            BoardGrid::Square(square) => {
                let config = square.config();
                let cell = DVec2::new(config.dx, config.dy) * view.scale;
                let origin = view.to_view(config.origin.as_dvec2());
                if config.visible {
                    overlay.lines = square_lines(origin, cell, region);
                }
                if config.dots_visible {
                    overlay.dots = lattice(origin, cell, region, 0.0)
                        .into_iter()
                        .filter(|dot| {
                            zone_shape
                                .as_ref()
                                .map_or(true, |shape| shape.contains(view.to_board(*dot)))
                        })
                        .collect();
                }
            }
            BoardGrid::Hex(_) => {
                if grid.grid.is_visible() {
                    overlay.lines = visible_cells(&grid.grid, view, region)
                        .flat_map(|cell| {
                            let shape = grid.grid.cell_shape(cell);
                            shape
                                .edges()
                                .filter_map(|(start, end)| {
                                    clip_segment(view.to_view(start), view.to_view(end), region)
                                })
                                .collect::<Vec<_>>()
                        })
                        .collect();
                }
                if grid.grid.dots_visible() {
                    overlay.dots = visible_cells(&grid.grid, view, region)
                        .filter_map(centres_inside)
                        .collect();
                }
            }
        }

        if labels_visible {
            overlay.labels = visible_cells(&grid.grid, view, region)
                .filter_map(|cell| {
                    let position = centres_inside(cell)?;
                    let text = grid.label(cell)?;
                    Some(LabelPlacement { text, position })
                })
                .collect();
        }
        overlay
    }

    /// Returns `true` when nothing would be drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.dots.is_empty() && self.labels.is_empty()
    }

    /// Strokes the lines and dots onto `raster`, which holds the view.
    ///
    /// Labels need a font and are left to the caller.
    pub fn rasterize(&self, raster: &mut Raster) {
        for line in &self.lines {
            raster.draw_line(pixel(line.from), pixel(line.to), self.color);
        }
        for dot in &self.dots {
            let (x, y) = pixel(*dot);
            for (dx, dy) in [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)] {
                if let (Ok(x), Ok(y)) = (u32::try_from(x + dx), u32::try_from(y + dy)) {
                    raster.set_pixel(x, y, self.color);
                }
            }
        }
    }
}

fn pixel(point: DVec2) -> (i32, i32) {
    (point.x.floor() as i32, point.y.floor() as i32)
}

/// Overlays for the background grid followed by each zone's grid.
///
/// Zone overlays are clipped to the zone's bounding box; their dots and
/// labels are restricted to cells centred inside the zone.
#[must_use]
pub fn zoned_overlays(zones: &ZonedGrid, view: &View) -> Vec<GridOverlay> {
    let region = view.region();
    let background = zones
        .background()
        .map(|grid| GridOverlay::build_within(grid, view, region, None));
    let zoned = zones.zones().iter().filter_map(|zone| {
        let grid = zone.grid()?;
        let bounds = zone.path().bounds()?;
        let corners = [
            view.to_view(DVec2::new(f64::from(bounds.x), f64::from(bounds.y))),
            view.to_view(DVec2::new(f64::from(bounds.right()), f64::from(bounds.bottom()))),
        ];
        let min = corners[0].min(corners[1]).floor();
        let max = corners[0].max(corners[1]).ceil();
        let clip = Rect::new(
            min.x as i32,
            min.y as i32,
            (max.x - min.x) as i32 + 1,
            (max.y - min.y) as i32 + 1,
        );
        Some(GridOverlay::build_within(
            grid,
            view,
            region.intersection(&clip),
            Some(zone.path()),
        ))
    });
    background.into_iter().chain(zoned).collect()
}

fn contains(region: Rect, point: DVec2) -> bool {
    point.x >= f64::from(region.x)
        && point.y >= f64::from(region.y)
        && point.x < f64::from(region.right())
        && point.y < f64::from(region.bottom())
}

/// Values `origin + offset + k·step` inside `[start, end)`.
///
/// The phase is always derived from `origin`, so scrolling the view never
/// shifts the lines relative to the board.
fn phase_locked(origin: f64, step: f64, offset: f64, start: f64, end: f64) -> Vec<f64> {
    let step = step.abs();
    let first = origin + offset + step * ((start - origin - offset) / step).ceil();
    let count = ((end - first) / step).ceil().max(0.0) as usize;
    (0..count).map(|k| first + step * k as f64).collect()
}

fn square_lines(origin: DVec2, cell: DVec2, region: Rect) -> Vec<LineSegment> {
    let (left, right) = (f64::from(region.x), f64::from(region.right()));
    let (top, bottom) = (f64::from(region.y), f64::from(region.bottom()));
    let verticals = phase_locked(origin.x, cell.x, cell.x.abs() / 2.0, left, right)
        .into_iter()
        .map(|x| LineSegment {
            from: DVec2::new(x.round(), top),
            to: DVec2::new(x.round(), bottom),
        });
    let horizontals = phase_locked(origin.y, cell.y, cell.y.abs() / 2.0, top, bottom)
        .into_iter()
        .map(|y| LineSegment {
            from: DVec2::new(left, y.round()),
            to: DVec2::new(right, y.round()),
        });
    verticals.chain(horizontals).collect()
}

fn lattice(origin: DVec2, cell: DVec2, region: Rect, offset: f64) -> Vec<DVec2> {
    let xs = phase_locked(origin.x, cell.x, offset, f64::from(region.x), f64::from(region.right()));
    let ys = phase_locked(origin.y, cell.y, offset, f64::from(region.y), f64::from(region.bottom()));
    ys.iter()
        .flat_map(|y| xs.iter().map(move |x| DVec2::new(*x, *y)))
        .collect()
}

/// Cells that may intersect `region`, with a one cell margin.
fn visible_cells<'a>(
    grid: &'a BoardGrid,
    view: &View,
    region: Rect,
) -> impl Iterator<Item = CellIndex> + 'a {
    let corners = [
        (region.x, region.y),
        (region.right(), region.y),
        (region.x, region.bottom()),
        (region.right(), region.bottom()),
    ]
    .map(|(x, y)| {
        let board = view.to_board(DVec2::new(f64::from(x), f64::from(y)));
        grid.cell_at(board.round().as_ivec2())
    });
    let columns = corners.iter().map(CellIndex::column);
    let rows = corners.iter().map(CellIndex::row);
    let (first_column, last_column) = (columns.clone().min(), columns.max());
    let (first_row, last_row) = (rows.clone().min(), rows.max());
    let columns = first_column.unwrap_or(0) - 1..=last_column.unwrap_or(0) + 1;
    let rows = first_row.unwrap_or(0) - 1..=last_row.unwrap_or(0) + 1;
    rows.flat_map(move |row| columns.clone().map(move |column| CellIndex::new(column, row)))
}

/// Liang-Barsky clipping of a segment against `region`.
fn clip_segment(from: DVec2, to: DVec2, region: Rect) -> Option<LineSegment> {
    let delta = to - from;
    let (mut enter, mut exit) = (0.0_f64, 1.0_f64);
    let bounds = [
        (-delta.x, from.x - f64::from(region.x)),
        (delta.x, f64::from(region.right()) - from.x),
        (-delta.y, from.y - f64::from(region.y)),
        (delta.y, f64::from(region.bottom()) - from.y),
    ];
    for (p, q) in bounds {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            enter = enter.max(t);
        } else {
            exit = exit.min(t);
        }
        if enter > exit {
            return None;
        }
    }
    let low = DVec2::new(f64::from(region.x), f64::from(region.y));
    let high = DVec2::new(f64::from(region.right()), f64::from(region.bottom()));
    Some(LineSegment {
        from: (from + delta * enter).clamp(low, high),
        to: (from + delta * exit).clamp(low, high),
    })
}

#[cfg(test)]
mod tests {
    use mapgrid_core::{IVec2, Rgb};
    use mapgrid_system_geometry::{HexGrid, HexGridConfig, SquareGrid, SquareGridConfig};
    use mapgrid_system_numbering::RegularGridNumbering;
    use mapgrid_system_zones::Zone;

    use super::*;

    fn square(visible: bool, dots: bool) -> SquareGrid {
        SquareGrid::new(SquareGridConfig {
            dx: 50.0,
            dy: 40.0,
            origin: IVec2::new(25, 20),
            visible,
            dots_visible: dots,
            color: Rgb::new(255, 0, 0),
            ..SquareGridConfig::default()
        })
        .expect("valid grid")
    }

    #[test]
    fn square_lines_fall_on_cell_boundaries() {
        let grid = NumberedGrid::new(square(true, false), None);
        let overlay = GridOverlay::build(&grid, &View::whole_board(IVec2::new(200, 100)));
        let xs: Vec<_> = overlay
            .lines
            .iter()
            .filter(|line| line.from.x == line.to.x)
            .map(|line| line.from.x)
            .collect();
        let ys: Vec<_> = overlay
            .lines
            .iter()
            .filter(|line| line.from.y == line.to.y)
            .map(|line| line.from.y)
            .collect();
        assert_eq!(xs, [0.0, 50.0, 100.0, 150.0]);
        assert_eq!(ys, [0.0, 40.0, 80.0]);
        assert_eq!(overlay.color, Color::from_rgb_u8(255, 0, 0));
        assert!(overlay.dots.is_empty());
    }

    #[test]
    fn lines_stay_phase_locked_while_scrolling() {
        let grid = NumberedGrid::new(square(true, false), None);
        let board = View {
            bounds: Rect::new(-37, 0, 400, 200),
            visible: Rect::new(0, 0, 120, 200),
            scale: 2.0,
            reversed: false,
        };
        let overlay = GridOverlay::build(&grid, &board);
        for line in overlay.lines.iter().filter(|line| line.from.x == line.to.x) {
            let board_x = board.to_board(line.from).x;
            assert_eq!(board_x.rem_euclid(50.0), 0.0, "line at {}", line.from.x);
            assert!((0.0..120.0).contains(&line.from.x));
        }
    }

    #[test]
    fn invisible_grids_only_draw_dots() {
        let grid = NumberedGrid::new(square(false, true), None);
        let overlay = GridOverlay::build(&grid, &View::whole_board(IVec2::new(100, 80)));
        assert!(overlay.lines.is_empty());
        assert_eq!(
            overlay.dots,
            [
                DVec2::new(25.0, 20.0),
                DVec2::new(75.0, 20.0),
                DVec2::new(25.0, 60.0),
                DVec2::new(75.0, 60.0),
            ]
        );
    }

    #[test]
    fn visible_numbering_places_labels_at_centres() {
        let grid = NumberedGrid::new(
            square(false, false),
            Some(RegularGridNumbering {
                visible: true,
                ..RegularGridNumbering::default()
            }),
        );
        let overlay = GridOverlay::build(&grid, &View::whole_board(IVec2::new(100, 40)));
        let labels: Vec<_> = overlay
            .labels
            .iter()
            .map(|label| (label.text.as_str(), label.position))
            .collect();
        assert_eq!(
            labels,
            [("A1", DVec2::new(25.0, 20.0)), ("B1", DVec2::new(75.0, 20.0))]
        );
    }

    #[test]
    fn reversed_views_mirror_labels() {
        let grid = NumberedGrid::new(
            square(false, false),
            Some(RegularGridNumbering {
                visible: true,
                ..RegularGridNumbering::default()
            }),
        );
        let view = View {
            reversed: true,
            ..View::whole_board(IVec2::new(100, 40))
        };
        let overlay = GridOverlay::build(&grid, &view);
        let a1 = overlay
            .labels
            .iter()
            .find(|label| label.text == "A1")
            .expect("A1 is visible");
        assert_eq!(a1.position, DVec2::new(75.0, 20.0));
    }

    #[test]
    fn hex_outlines_are_clipped_to_the_view() {
        let grid = NumberedGrid::new(
            HexGrid::new(HexGridConfig {
                visible: true,
                ..HexGridConfig::default()
            })
            .expect("valid grid"),
            None,
        );
        let view = View::whole_board(IVec2::new(300, 200));
        let overlay = GridOverlay::build(&grid, &view);
        assert!(!overlay.lines.is_empty());
        for line in &overlay.lines {
            for point in [line.from, line.to] {
                assert!((0.0..=300.0).contains(&point.x) && (0.0..=200.0).contains(&point.y));
            }
        }
    }

    #[test]
    fn offscreen_boards_draw_nothing() {
        let grid = NumberedGrid::new(square(true, true), None);
        let view = View {
            visible: Rect::new(500, 500, 10, 10),
            ..View::whole_board(IVec2::new(100, 100))
        };
        assert!(GridOverlay::build(&grid, &view).is_empty());
    }

    #[test]
    fn zone_overlays_stay_inside_their_zone() {
        let mut zones = ZonedGrid::new(Some(NumberedGrid::new(square(true, false), None)));
        let fine = SquareGrid::new(SquareGridConfig {
            dx: 10.0,
            dy: 10.0,
            origin: IVec2::new(5, 5),
            dots_visible: true,
            ..SquareGridConfig::default()
        })
        .expect("valid grid");
        zones
            .add_zone(
                Zone::new("Town", "40,40;80,40;80,80;40,80".parse().expect("path"))
                    .with_grid(NumberedGrid::new(fine, None)),
            )
            .expect("unique zone");
        let overlays = zoned_overlays(&zones, &View::whole_board(IVec2::new(200, 200)));
        assert_eq!(overlays.len(), 2);
        assert!(overlays[0].dots.is_empty());
        assert_eq!(overlays[1].dots.len(), 16);
        for dot in &overlays[1].dots {
            assert!((40.0..=80.0).contains(&dot.x) && (40.0..=80.0).contains(&dot.y));
        }
    }

    #[test]
    fn segments_outside_the_region_are_dropped() {
        let region = Rect::new(0, 0, 10, 10);
        assert_eq!(
            clip_segment(DVec2::new(20.0, 0.0), DVec2::new(30.0, 5.0), region),
            None
        );
        assert_eq!(
            clip_segment(DVec2::new(-5.0, 5.0), DVec2::new(15.0, 5.0), region),
            Some(LineSegment {
                from: DVec2::new(0.0, 5.0),
                to: DVec2::new(10.0, 5.0),
            })
        );
    }

    #[test]
    fn rasterized_overlays_stroke_lines_and_dots() {
        let red = Color::from_rgb_u8(255, 0, 0);
        let overlay = GridOverlay {
            color: red,
            lines: vec![LineSegment {
                from: DVec2::new(0.0, 5.0),
                to: DVec2::new(9.0, 5.0),
            }],
            dots: vec![DVec2::new(0.5, 0.5)],
            label_color: Color::TRANSPARENT,
            labels: Vec::new(),
        };
        let mut raster = Raster::new(10, 10, Color::WHITE);
        overlay.rasterize(&mut raster);
        for x in 0..10 {
            assert_eq!(raster.pixel(x, 5), Some(red));
        }
        assert_eq!(raster.pixel(0, 0), Some(red));
        assert_eq!(raster.pixel(1, 0), Some(red));
        assert_eq!(raster.pixel(0, 1), Some(red));
        assert_eq!(raster.pixel(1, 1), Some(Color::WHITE));
    }
}
