use std::{fmt, str::FromStr};

use mapgrid_core::{
    attributes::{AttributeError, AttributeMap, Configurable, Field, FieldKind, UnknownChoice},
    Revision, Rgb,
};
use serde::{Deserialize, Serialize};

use crate::ZoneError;

/// Part of the zone a highlight paints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coverage {
    /// Fill the zone interior.
    #[default]
    #[serde(rename = "Entire Zone")]
    EntireZone,
    /// Stroke the zone outline.
    #[serde(rename = "Zone Border")]
    ZoneBorder,
}

impl Coverage {
    /// Attribute strings accepted for the coverage.
    pub const NAMES: &'static [&'static str] = &["Entire Zone", "Zone Border"];
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EntireZone => "Entire Zone",
            Self::ZoneBorder => "Zone Border",
        })
    }
}

impl FromStr for Coverage {
    type Err = UnknownChoice;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Entire Zone" => Ok(Self::EntireZone),
            "Zone Border" => Ok(Self::ZoneBorder),
            _ => Err(UnknownChoice::new(value, Self::NAMES)),
        }
    }
}

/// Paint used for the covered area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pattern {
    /// Solid colour.
    #[default]
    Plain,
    /// Diagonal stripes tiled every six pixels.
    Striped,
    /// Crossed diagonals tiled every six pixels.
    Crosshatched,
    /// Externally supplied image, tiled.
    #[serde(rename = "Tiled Image")]
    TiledImage,
}

impl Pattern {
    /// Attribute strings accepted for the pattern.
    pub const NAMES: &'static [&'static str] = &["Plain", "Striped", "Crosshatched", "Tiled Image"];
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plain => "Plain",
            Self::Striped => "Striped",
            Self::Crosshatched => "Crosshatched",
            Self::TiledImage => "Tiled Image",
        })
    }
}

impl FromStr for Pattern {
    type Err = UnknownChoice;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Plain" => Ok(Self::Plain),
            "Striped" => Ok(Self::Striped),
            "Crosshatched" => Ok(Self::Crosshatched),
            "Tiled Image" => Ok(Self::TiledImage),
            _ => Err(UnknownChoice::new(value, Self::NAMES)),
        }
    }
}

/// Persisted configuration of a [`ZoneHighlight`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Name used to add and remove the highlight.
    pub name: String,
    /// Paint colour for plain and procedural patterns.
    pub color: Rgb,
    /// Painted part of the zone.
    pub coverage: Coverage,
    /// Border stroke width in board pixels.
    pub width: u32,
    /// Paint pattern.
    pub style: Pattern,
    /// Opacity percentage from 0 to 100.
    pub opacity: u32,
    /// Image name resolved for tiled image highlights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Rgb::BLACK,
            coverage: Coverage::EntireZone,
            width: 1,
            style: Pattern::Plain,
            opacity: 100,
            image: None,
        }
    }
}

fn border_coverage(config: &HighlightConfig) -> bool {
    config.coverage == Coverage::ZoneBorder
}

fn tiled_image(config: &HighlightConfig) -> bool {
    config.style == Pattern::TiledImage
}

static HIGHLIGHT_SCHEMA: &[Field<HighlightConfig>] = &[
    Field::new("name", FieldKind::Text, "Name"),
    Field::new("color", FieldKind::Color, "Color"),
    Field::new("coverage", FieldKind::Choice(Coverage::NAMES), "Coverage"),
    Field::new("width", FieldKind::Integer, "Width").visible_when(border_coverage),
    Field::new("style", FieldKind::Choice(Pattern::NAMES), "Style"),
    Field::new("image", FieldKind::Text, "Image").visible_when(tiled_image),
    Field::new("opacity", FieldKind::Integer, "Opacity(%)"),
];

impl Configurable for HighlightConfig {
    fn schema() -> &'static [Field<Self>] {
        HIGHLIGHT_SCHEMA
    }

    fn to_attributes(&self) -> AttributeMap {
        AttributeMap::new()
            .with("name", &self.name)
            .with("color", self.color)
            .with("coverage", self.coverage)
            .with("width", self.width)
            .with("style", self.style)
            .with("image", self.image.as_deref().unwrap_or_default())
            .with("opacity", self.opacity)
    }

    fn decode_attributes(map: &AttributeMap) -> Result<Self, AttributeError> {
        let image = map.require("image")?;
        Ok(Self {
            name: map.require("name")?.to_owned(),
            color: map.parse("color")?,
            coverage: map.parse("coverage")?,
            width: map.parse("width")?,
            style: map.parse("style")?,
            image: (!image.is_empty()).then(|| image.to_owned()),
            opacity: map.parse("opacity")?,
        })
    }
}

/// Style painted over a zone.
///
/// Every change bumps the highlight revision so renderers can rebuild cached
/// textures.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "HighlightConfig", into = "HighlightConfig")]
pub struct ZoneHighlight {
    config: HighlightConfig,
    revision: Revision,
}

impl ZoneHighlight {
    /// Creates a highlight, rejecting opacities above 100 percent.
    pub fn new(config: HighlightConfig) -> Result<Self, ZoneError> {
        validate(&config)?;
        Ok(Self {
            config,
            revision: Revision::initial(),
        })
    }

    /// Highlight name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Configuration revision.
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Replaces the configuration.
    pub fn set_config(&mut self, config: HighlightConfig) -> Result<(), ZoneError> {
        validate(&config)?;
        self.config = config;
        self.revision.bump();
        Ok(())
    }

    /// Changes the opacity percentage.
    pub fn set_opacity(&mut self, opacity: u32) -> Result<(), ZoneError> {
        self.set_config(HighlightConfig {
            opacity,
            ..self.config.clone()
        })
    }

    /// Whether drawing the highlight can change the image at all.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.config.opacity > 0
    }
}

fn validate(config: &HighlightConfig) -> Result<(), ZoneError> {
    if config.opacity > 100 {
        return Err(ZoneError::OpacityOutOfRange(config.opacity));
    }
    Ok(())
}

impl PartialEq for ZoneHighlight {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
    }
}

impl TryFrom<HighlightConfig> for ZoneHighlight {
    type Error = ZoneError;

    fn try_from(config: HighlightConfig) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}

impl From<ZoneHighlight> for HighlightConfig {
    fn from(highlight: ZoneHighlight) -> Self {
        highlight.config
    }
}
