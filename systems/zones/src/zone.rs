use mapgrid_core::{
    attributes::{AttributeError, AttributeMap, Configurable, Field, FieldKind},
    GridError, Point, Polygon, Revision,
};
use mapgrid_system_numbering::NumberedGrid;
use serde::{Deserialize, Serialize};

use crate::ZoneHighlight;

/// Placeholder replaced by the zone name in location formats.
pub const NAME_PLACEHOLDER: &str = "$name$";

/// Placeholder replaced by the grid label in location formats.
pub const GRID_LOCATION_PLACEHOLDER: &str = "$gridLocation$";

fn default_location_format() -> String {
    GRID_LOCATION_PLACEHOLDER.to_owned()
}

/// Named polygonal region of a board.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Zone {
    name: String,
    path: Polygon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    grid: Option<NumberedGrid>,
    #[serde(default = "default_location_format")]
    location_format: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    highlights: Vec<ZoneHighlight>,
    #[serde(skip)]
    revision: Revision,
}

impl Zone {
    /// Creates a zone without a grid or highlights.
    #[must_use]
    pub fn new(name: impl Into<String>, path: Polygon) -> Self {
        Self {
            name: name.into(),
            path,
            grid: None,
            location_format: default_location_format(),
            highlights: Vec::new(),
            revision: Revision::initial(),
        }
    }

    /// Builder form of [`Zone::set_grid`].
    #[must_use]
    pub fn with_grid(mut self, grid: NumberedGrid) -> Self {
        self.set_grid(Some(grid));
        self
    }

    /// Zone name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zone boundary.
    #[must_use]
    pub fn path(&self) -> &Polygon {
        &self.path
    }

    /// Grid used inside the zone, if any.
    #[must_use]
    pub fn grid(&self) -> Option<&NumberedGrid> {
        self.grid.as_ref()
    }

    /// Template used to name locations inside the zone.
    #[must_use]
    pub fn location_format(&self) -> &str {
        &self.location_format
    }

    /// Highlights in drawing order.
    #[must_use]
    pub fn highlights(&self) -> &[ZoneHighlight] {
        &self.highlights
    }

    /// Revision bumped by every change to the zone.
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Replaces the boundary.
    pub fn set_path(&mut self, path: Polygon) {
        self.edit_path(|current| *current = path);
    }

    /// Attaches or removes the zone grid.
    pub fn set_grid(&mut self, grid: Option<NumberedGrid>) {
        self.grid = grid;
        self.revision.bump();
    }

    /// Changes the location name template.
    pub fn set_location_format(&mut self, format: impl Into<String>) {
        self.location_format = format.into();
        self.revision.bump();
    }

    /// Appends a highlight; later highlights paint over earlier ones.
    pub fn add_highlight(&mut self, highlight: ZoneHighlight) {
        self.highlights.push(highlight);
        self.revision.bump();
    }

    /// Removes the first highlight named `name`.
    pub fn remove_highlight(&mut self, name: &str) -> Option<ZoneHighlight> {
        let index = self
            .highlights
            .iter()
            .position(|highlight| highlight.name() == name)?;
        self.revision.bump();
        Some(self.highlights.remove(index))
    }

    /// Mutable access to a highlight by name.
    pub fn highlight_mut(&mut self, name: &str) -> Option<&mut ZoneHighlight> {
        self.highlights
            .iter_mut()
            .find(|highlight| highlight.name() == name)
    }

    pub(crate) fn edit_path<R>(&mut self, edit: impl FnOnce(&mut Polygon) -> R) -> R {
        let result = edit(&mut self.path);
        self.revision.bump();
        result
    }

    /// Even-odd containment test against the boundary.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.path.contains(point)
    }

    /// Location name of `point` rendered through the zone's template.
    #[must_use]
    pub fn location_name(&self, point: Point) -> String {
        let grid_location = self
            .grid
            .as_ref()
            .and_then(|grid| grid.location_name(point))
            .unwrap_or_default();
        self.location_format
            .replace(NAME_PLACEHOLDER, &self.name)
            .replace(GRID_LOCATION_PLACEHOLDER, &grid_location)
    }

    /// Resolves a location name produced by [`Zone::location_name`].
    ///
    /// The resolved point must lie inside the zone.
    pub fn location(&self, name: &str) -> Result<Point, GridError> {
        let bad = || GridError::BadCoordinate(name.to_owned());
        let grid = self.grid.as_ref().ok_or_else(bad)?;
        let template = self.location_format.replace(NAME_PLACEHOLDER, &self.name);
        let (prefix, suffix) = template
            .split_once(GRID_LOCATION_PLACEHOLDER)
            .ok_or_else(bad)?;
        let label = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix))
            .ok_or_else(bad)?;
        let point = grid.location(label)?;
        if self.contains(point) {
            Ok(point)
        } else {
            Err(bad())
        }
    }
}

impl PartialEq for Zone {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.path == other.path
            && self.grid == other.grid
            && self.location_format == other.location_format
            && self.highlights == other.highlights
    }
}

static ZONE_SCHEMA: &[Field<Zone>] = &[
    Field::new("name", FieldKind::Text, "Name"),
    Field::new("path", FieldKind::Path, "Shape"),
    Field::new("locationFormat", FieldKind::Text, "Location format"),
];

impl Configurable for Zone {
    fn schema() -> &'static [Field<Self>] {
        ZONE_SCHEMA
    }

    fn to_attributes(&self) -> AttributeMap {
        AttributeMap::new()
            .with("name", &self.name)
            .with("path", &self.path)
            .with("locationFormat", &self.location_format)
    }

    fn decode_attributes(map: &AttributeMap) -> Result<Self, AttributeError> {
        let mut zone = Self::new(map.require("name")?, map.parse("path")?);
        zone.location_format = map.require("locationFormat")?.to_owned();
        Ok(zone)
    }
}
