use mapgrid_core::{
    attributes::{AttributeError, AttributeMap, Configurable, Field, FieldKind},
    IVec2,
};
use mapgrid_system_geometry::{BoardGrid, GridConfigError};
use mapgrid_system_numbering::{NumberedGrid, RegularGridNumbering};
use mapgrid_system_zones::{HighlightConfig, Zone, ZoneError, ZoneHighlight};

use crate::{Board, BoardError};

/// Errors raised while importing attribute text.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ExportError {
    /// The text does not start with a `[board]` section.
    #[error("attribute text must start with a [board] section")]
    MissingBoardSection,
    /// A section header is not recognised.
    #[error("line {line}: unknown section [{header}]")]
    UnknownSection {
        /// One-based line of the header.
        line: usize,
        /// Header text without brackets.
        header: String,
    },
    /// A section appears where its parent is missing.
    #[error("line {line}: section [{header}] has no parent component")]
    MisplacedSection {
        /// One-based line of the header.
        line: usize,
        /// Header text without brackets.
        header: String,
    },
    /// A section's attributes did not match its schema.
    #[error("line {line}: {source}")]
    Attribute {
        /// One-based line of the section header.
        line: usize,
        /// Underlying failure.
        #[source]
        source: AttributeError,
    },
    /// A grid section describes an invalid grid.
    #[error(transparent)]
    Grid(#[from] GridConfigError),
    /// A highlight or zone was rejected.
    #[error(transparent)]
    Zone(#[from] ZoneError),
    /// The board itself was rejected.
    #[error(transparent)]
    Board(#[from] BoardError),
}

struct BoardHeader {
    name: String,
    width: i32,
    height: i32,
}

static BOARD_SCHEMA: &[Field<BoardHeader>] = &[
    Field::new("name", FieldKind::Text, "Board name"),
    Field::new("width", FieldKind::Integer, "Width"),
    Field::new("height", FieldKind::Integer, "Height"),
];

impl Configurable for BoardHeader {
    fn schema() -> &'static [Field<Self>] {
        BOARD_SCHEMA
    }

    fn to_attributes(&self) -> AttributeMap {
        AttributeMap::new()
            .with("name", &self.name)
            .with("width", self.width)
            .with("height", self.height)
    }

    fn decode_attributes(map: &AttributeMap) -> Result<Self, AttributeError> {
        Ok(Self {
            name: map.require("name")?.to_owned(),
            width: map.parse("width")?,
            height: map.parse("height")?,
        })
    }
}

struct Section {
    line: usize,
    header: String,
    attributes: AttributeMap,
}

impl Section {
    fn decode<T: Configurable>(&self) -> Result<T, ExportError> {
        T::from_attributes(&self.attributes).map_err(|source| ExportError::Attribute {
            line: self.line,
            source,
        })
    }

    fn misplaced(&self) -> ExportError {
        ExportError::MisplacedSection {
            line: self.line,
            header: self.header.clone(),
        }
    }
}

fn push_section(out: &mut String, header: &str, attributes: &AttributeMap) {
    out.push('[');
    out.push_str(header);
    out.push_str("]\n");
    out.push_str(&attributes.encode());
}

fn push_grid(out: &mut String, prefix: &str, grid: &NumberedGrid) {
    push_section(
        out,
        &format!("{prefix}grid {}", grid.grid.kind()),
        &grid.grid.to_attributes(),
    );
    if let Some(numbering) = &grid.numbering {
        push_section(out, &format!("{prefix}numbering"), &numbering.to_attributes());
    }
}

fn split_sections(text: &str) -> Result<Vec<Section>, ExportError> {
    let mut sections: Vec<(usize, String, String)> = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if let Some(header) = trimmed.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            sections.push((index + 1, header.trim().to_owned(), String::new()));
            continue;
        }
        match sections.last_mut() {
            Some((_, _, body)) => {
                body.push_str(line);
                body.push('\n');
            }
            None if trimmed.is_empty() => {}
            None => return Err(ExportError::MissingBoardSection),
        }
    }
    sections
        .into_iter()
        .map(|(line, header, body)| {
            let attributes = AttributeMap::decode(&body)
                .map_err(|source| ExportError::Attribute { line, source })?;
            Ok(Section {
                line,
                header,
                attributes,
            })
        })
        .collect()
}

impl Board {
    /// Flattens the board into sectioned attribute text.
    ///
    /// Each component is written as a `[header]` line followed by its
    /// attributes in schema order. Zone sections own the grid, numbering and
    /// highlight sections that follow them.
    #[must_use]
    pub fn export_attributes(&self) -> String {
        let mut out = String::new();
        let header = BoardHeader {
            name: self.name.clone(),
            width: self.size.x,
            height: self.size.y,
        };
        push_section(&mut out, "board", &header.to_attributes());
        if let Some(background) = self.grid.background() {
            push_grid(&mut out, "", background);
        }
        for zone in self.grid.zones() {
            push_section(&mut out, "zone", &zone.to_attributes());
            if let Some(grid) = zone.grid() {
                push_grid(&mut out, "zone.", grid);
            }
            for highlight in zone.highlights() {
                push_section(&mut out, "zone.highlight", &highlight.config().to_attributes());
            }
        }
        out
    }

    /// Rebuilds a board from text produced by [`Board::export_attributes`].
    pub fn import_attributes(text: &str) -> Result<Self, ExportError> {
        let mut sections = split_sections(text)?.into_iter();
        let first = sections.next().ok_or(ExportError::MissingBoardSection)?;
        if first.header != "board" {
            return Err(ExportError::MissingBoardSection);
        }
        let header: BoardHeader = first.decode()?;
        let mut board = Self::new(header.name, IVec2::new(header.width, header.height))?;

        let mut background: Option<NumberedGrid> = None;
        let mut zones: Vec<Zone> = Vec::new();
        for section in sections {
            let (scope, kind) = match section.header.split_once(' ') {
                Some((scope, kind)) => (scope, Some(kind.trim())),
                None => (section.header.as_str(), None),
            };
            match (scope, kind) {
                ("grid", Some(kind)) => {
                    if background.is_some() || !zones.is_empty() {
                        return Err(section.misplaced());
                    }
                    let grid = BoardGrid::from_attributes(kind, &section.attributes)?;
                    background = Some(NumberedGrid::new(grid, None));
                }
                ("numbering", None) => {
                    let grid = background
                        .as_mut()
                        .filter(|_| zones.is_empty())
                        .ok_or_else(|| section.misplaced())?;
                    grid.numbering = Some(section.decode::<RegularGridNumbering>()?);
                }
                ("zone", None) => zones.push(section.decode::<Zone>()?),
                ("zone.grid", Some(kind)) => {
                    let zone = zones.last_mut().ok_or_else(|| section.misplaced())?;
                    let grid = BoardGrid::from_attributes(kind, &section.attributes)?;
                    zone.set_grid(Some(NumberedGrid::new(grid, None)));
                }
                ("zone.numbering", None) => {
                    let zone = zones.last_mut().ok_or_else(|| section.misplaced())?;
                    let mut grid = zone.grid().cloned().ok_or_else(|| section.misplaced())?;
                    grid.numbering = Some(section.decode::<RegularGridNumbering>()?);
                    zone.set_grid(Some(grid));
                }
                ("zone.highlight", None) => {
                    let zone = zones.last_mut().ok_or_else(|| section.misplaced())?;
                    let config = section.decode::<HighlightConfig>()?;
                    zone.add_highlight(ZoneHighlight::new(config)?);
                }
                _ => {
                    return Err(ExportError::UnknownSection {
                        line: section.line,
                        header: section.header.clone(),
                    })
                }
            }
        }

        board.grid.set_background(background);
        for zone in zones {
            board.grid.add_zone(zone).map_err(BoardError::from)?;
        }
        Ok(board)
    }
}
