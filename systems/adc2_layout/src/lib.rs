#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! ADC2 map board conventions expressed as grids, numbering and zones.
//!
//! ADC2 boards address cells by column and row from the top-left cell and
//! stagger alternate rows or columns depending on their [`LayoutKind`]. A
//! [`Layout`] converts those coordinates to pixels, builds the matching
//! grid, and turns [`MapSheet`]s into numbered zones. Hex sides and hex
//! lines are produced as loose segments and stitched into continuous
//! polylines by [`LineSet`].

use mapgrid_core::GridError;
use mapgrid_system_numbering::NumberedGrid;
use mapgrid_system_zones::{ZoneError, ZonedGrid};
use serde::{Deserialize, Serialize};

mod layout;
mod lines;
mod sheet;

pub use layout::{Direction, Layout, LayoutKind};
pub use lines::{HexLineDirections, HexSides, LineDefinition, LineSet, LineStyle, Segment};
pub use sheet::{MapSheet, SheetStyle, SHEET_LOCATION_FORMAT};

/// Errors raised while converting ADC2 boards.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// Board dimensions must be positive.
    #[error("{name} must be positive, got {value}")]
    InvalidSize {
        /// Dimension name.
        name: &'static str,
        /// Rejected value.
        value: i32,
    },
    /// The sheet covers no cells.
    #[error("map sheet `{0}` covers no cells")]
    EmptySheet(String),
    /// Sheet label offsets do not fit the numbering.
    #[error("label offsets of map sheet `{0}` are out of range")]
    OffsetOutOfRange(String),
    /// The layout produced an invalid grid.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// Sheets could not be registered as zones.
    #[error(transparent)]
    Zone(#[from] ZoneError),
}

/// ADC2 board: a layout and the map sheets numbering it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    /// Cell arrangement and size.
    pub layout: Layout,
    /// Numbered sheets in file order.
    #[serde(default)]
    pub sheets: Vec<MapSheet>,
}

impl BoardLayout {
    /// Zones for every sheet over the unnumbered layout grid.
    ///
    /// Sheets covering no cells are skipped.
    pub fn zoned_grid(&self) -> Result<ZonedGrid, LayoutError> {
        let background = NumberedGrid::new(self.layout.geometric_grid()?, None);
        let mut zones = ZonedGrid::new(Some(background));
        for sheet in &self.sheets {
            match sheet.zone(&self.layout) {
                Ok(zone) => zones.add_zone(zone)?,
                Err(LayoutError::EmptySheet(name)) => {
                    tracing::warn!(sheet = %name, "skipping map sheet without cells");
                }
                Err(error) => return Err(error),
            }
        }
        Ok(zones)
    }
}
