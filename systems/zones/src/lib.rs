#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Named polygonal zones and zone-aware location queries.
//!
//! A [`ZonedGrid`] partitions a board into ordered [`Zone`]s. Point queries
//! scan the zones in declaration order and the first zone whose boundary
//! contains the point owns it, so overlapping zones resolve by order alone.
//! Points outside every zone fall back to the optional background grid.

use mapgrid_core::{GridError, Point};
use mapgrid_system_numbering::NumberedGrid;
use serde::{Deserialize, Serialize};

mod editor;
mod highlight;
mod zone;

pub use editor::PolygonEditor;
pub use highlight::{Coverage, HighlightConfig, Pattern, ZoneHighlight};
pub use zone::{Zone, GRID_LOCATION_PLACEHOLDER, NAME_PLACEHOLDER};

/// Errors raised while assembling zones.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ZoneError {
    /// Zone names must be unique within a board.
    #[error("duplicate zone name `{0}`")]
    DuplicateZone(String),
    /// Highlight opacity is a percentage.
    #[error("opacity {0} is outside 0..=100")]
    OpacityOutOfRange(u32),
}

/// Ordered zones with an optional board-wide background grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ZonedGrid {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background: Option<NumberedGrid>,
    #[serde(default)]
    zones: Vec<Zone>,
}

impl ZonedGrid {
    /// Creates an empty zone set over an optional background grid.
    #[must_use]
    pub fn new(background: Option<NumberedGrid>) -> Self {
        Self {
            background,
            zones: Vec::new(),
        }
    }

    /// Appends a zone; its position decides overlap resolution.
    pub fn add_zone(&mut self, zone: Zone) -> Result<(), ZoneError> {
        if self.zone(zone.name()).is_some() {
            return Err(ZoneError::DuplicateZone(zone.name().to_owned()));
        }
        self.zones.push(zone);
        Ok(())
    }

    /// Removes the zone named `name`, keeping the order of the others.
    pub fn remove_zone(&mut self, name: &str) -> Option<Zone> {
        let index = self.zones.iter().position(|zone| zone.name() == name)?;
        Some(self.zones.remove(index))
    }

    /// Zones in declaration order.
    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Zone named `name`.
    #[must_use]
    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.name() == name)
    }

    /// Mutable access to the zone named `name`.
    pub fn zone_mut(&mut self, name: &str) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|zone| zone.name() == name)
    }

    /// Grid used where no zone matches.
    #[must_use]
    pub fn background(&self) -> Option<&NumberedGrid> {
        self.background.as_ref()
    }

    /// Replaces the background grid.
    pub fn set_background(&mut self, background: Option<NumberedGrid>) {
        self.background = background;
    }

    /// First zone, in declaration order, whose boundary contains `point`.
    #[must_use]
    pub fn find_zone(&self, point: Point) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.contains(point))
    }

    /// Grid governing `point`: the owning zone's grid, else the background grid.
    ///
    /// A zone without its own grid defers to the background grid.
    #[must_use]
    pub fn grid_at(&self, point: Point) -> Option<&NumberedGrid> {
        self.find_zone(point)
            .and_then(Zone::grid)
            .or(self.background.as_ref())
    }

    /// Snaps through the governing grid; points without one are returned unchanged.
    #[must_use]
    pub fn snap_to(&self, point: Point) -> Point {
        self.grid_at(point)
            .map_or(point, |grid| grid.snap_to(point))
    }

    /// Range measured by the grid governing `from`.
    #[must_use]
    pub fn range(&self, from: Point, to: Point) -> Option<u32> {
        self.grid_at(from).map(|grid| grid.range(from, to))
    }

    /// Location name of `point`: the owning zone's template, else the background label.
    #[must_use]
    pub fn location_name(&self, point: Point) -> Option<String> {
        match self.find_zone(point) {
            Some(zone) => Some(zone.location_name(point)),
            None => self
                .background
                .as_ref()
                .and_then(|grid| grid.location_name(point)),
        }
    }

    /// Resolves a location name against the zones in order, then the background grid.
    pub fn location(&self, name: &str) -> Result<Point, GridError> {
        if let Some(point) = self
            .zones
            .iter()
            .find_map(|zone| zone.location(name).ok())
        {
            return Ok(point);
        }
        match &self.background {
            Some(grid) => grid.location(name),
            None => Err(GridError::BadCoordinate(name.to_owned())),
        }
    }
}
