use std::{
    fs, io,
    path::{Path, PathBuf},
};

use mapgrid_core::IVec2;
use mapgrid_system_numbering::NumberedGrid;
use mapgrid_system_zones::Zone;
use serde::{Deserialize, Serialize};

use crate::{Board, BoardError};

/// Board file format version written by [`Board::to_toml`].
pub const FORMAT_VERSION: u32 = 1;

/// Errors raised while reading or writing board files.
#[derive(Debug, thiserror::Error)]
pub enum BoardFileError {
    /// The file could not be read or written.
    #[error("could not access board file {path}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The text is not a valid board file.
    #[error("could not parse board file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The board could not be written as TOML.
    #[error("could not write board file: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// The file was written by an unsupported format version.
    #[error("unsupported board file version {found}; expected {}", FORMAT_VERSION)]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
    },
    /// The file parsed but describes an invalid board.
    #[error(transparent)]
    Board(#[from] BoardError),
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// Serialized form shared by board files and share strings.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct BoardFile {
    pub(crate) version: u32,
    name: String,
    width: i32,
    height: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    grid: Option<NumberedGrid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    zones: Vec<Zone>,
}

impl From<&Board> for BoardFile {
    fn from(board: &Board) -> Self {
        Self {
            version: FORMAT_VERSION,
            name: board.name.clone(),
            width: board.size.x,
            height: board.size.y,
            grid: board.grid.background().cloned(),
            zones: board.grid.zones().to_vec(),
        }
    }
}

impl TryFrom<BoardFile> for Board {
    type Error = BoardError;

    fn try_from(file: BoardFile) -> Result<Self, Self::Error> {
        let mut board = Board::new(file.name, IVec2::new(file.width, file.height))?;
        board.grid.set_background(file.grid);
        for zone in file.zones {
            board.grid.add_zone(zone)?;
        }
        Ok(board)
    }
}

impl Board {
    /// Parses a TOML board file.
    ///
    /// The version is checked before the rest of the file so that newer
    /// formats are reported as such rather than as parse errors.
    pub fn from_toml(text: &str) -> Result<Self, BoardFileError> {
        let probe: VersionProbe = toml::from_str(text)?;
        if probe.version != FORMAT_VERSION {
            return Err(BoardFileError::UnsupportedVersion {
                found: probe.version,
            });
        }
        let file: BoardFile = toml::from_str(text)?;
        Ok(Self::try_from(file)?)
    }

    /// Writes the board as a TOML board file.
    pub fn to_toml(&self) -> Result<String, BoardFileError> {
        Ok(toml::to_string(&BoardFile::from(self))?)
    }

    /// Reads a board file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BoardFileError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| BoardFileError::Io {
            path: path.to_owned(),
            source,
        })?;
        let board = Self::from_toml(&text)?;
        tracing::debug!(
            path = %path.display(),
            zones = board.grid.zones().len(),
            "loaded board file"
        );
        Ok(board)
    }

    /// Writes the board file to disk.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BoardFileError> {
        let path = path.as_ref();
        fs::write(path, self.to_toml()?).map_err(|source| BoardFileError::Io {
            path: path.to_owned(),
            source,
        })
    }
}
