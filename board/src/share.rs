use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};

use crate::{
    file::{BoardFile, FORMAT_VERSION},
    Board, BoardError,
};

const SHARE_DOMAIN: &str = "board";
const SHARE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded board payload.
pub const SHARE_HEADER: &str = "board:v1";
/// Delimiter used to separate the prefix, version and payload.
const FIELD_DELIMITER: char = ':';

/// Errors that can occur while encoding or decoding share strings.
#[derive(Debug, thiserror::Error)]
pub enum ShareStringError {
    /// The provided string was empty or contained only whitespace.
    #[error("share string was empty")]
    EmptyPayload,
    /// The share string did not contain a version segment.
    #[error("share string is missing the version")]
    MissingVersion,
    /// The share string did not include the payload segment.
    #[error("share string is missing the payload")]
    MissingPayload,
    /// The share string used an unexpected prefix segment.
    #[error("share string prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The share string used an unsupported version identifier.
    #[error("share string version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The payload was written by an unsupported board format version.
    #[error("unsupported board format version {found}; expected {}", FORMAT_VERSION)]
    UnsupportedFormat {
        /// Version found in the payload.
        found: u32,
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode board payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The board could not be converted to or from JSON.
    #[error("could not process board payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The payload decoded but describes an invalid board.
    #[error(transparent)]
    Board(#[from] BoardError),
}

impl Board {
    /// Encodes the board into a single-line string suitable for clipboard transfer.
    pub fn to_share_string(&self) -> Result<String, ShareStringError> {
        let json =
            serde_json::to_vec(&BoardFile::from(self)).map_err(ShareStringError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{SHARE_HEADER}{FIELD_DELIMITER}{encoded}"))
    }

    /// Decodes a board from a string produced by [`Board::to_share_string`].
    pub fn from_share_string(value: &str) -> Result<Self, ShareStringError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ShareStringError::EmptyPayload);
        }

        let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
        let domain = parts.next().unwrap_or_default();
        let version = parts.next().ok_or(ShareStringError::MissingVersion)?;
        let payload = parts.next().ok_or(ShareStringError::MissingPayload)?;

        if domain != SHARE_DOMAIN {
            return Err(ShareStringError::InvalidPrefix(domain.to_owned()));
        }
        if version != SHARE_VERSION {
            return Err(ShareStringError::UnsupportedVersion(version.to_owned()));
        }

        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(ShareStringError::InvalidEncoding)?;
        let file: BoardFile =
            serde_json::from_slice(&bytes).map_err(ShareStringError::InvalidPayload)?;
        if file.version != FORMAT_VERSION {
            return Err(ShareStringError::UnsupportedFormat {
                found: file.version,
            });
        }
        Ok(Self::try_from(file)?)
    }
}

#[cfg(test)]
mod tests {
    use mapgrid_core::{IVec2, Polygon, Rect};
    use mapgrid_system_geometry::{HexGrid, HexGridConfig};
    use mapgrid_system_numbering::{NumberedGrid, RegularGridNumbering};
    use mapgrid_system_zones::Zone;

    use super::*;

    fn populated_board() -> Board {
        let mut board = Board::new("Front", IVec2::new(600, 400)).expect("valid board");
        let grid = HexGrid::new(HexGridConfig {
            dx: 60.0,
            dy: 70.0,
            ..HexGridConfig::default()
        })
        .expect("valid grid");
        board.grid_mut().set_background(Some(NumberedGrid::new(
            grid,
            Some(RegularGridNumbering::default()),
        )));
        board
            .grid_mut()
            .add_zone(Zone::new("Ridge", Polygon::from_rect(Rect::new(0, 0, 100, 80))))
            .expect("unique zone");
        board
    }

    #[test]
    fn round_trip_empty_board() {
        let board = Board::new("Blank", IVec2::new(64, 32)).expect("valid board");
        let encoded = board.to_share_string().expect("encodes");
        assert!(encoded.starts_with(&format!("{SHARE_HEADER}:")));
        assert!(!encoded.contains('\n'));

        let decoded = Board::from_share_string(&encoded).expect("share string decodes");
        assert_eq!(board, decoded);
    }

    #[test]
    fn round_trip_populated_board() {
        let board = populated_board();
        let encoded = board.to_share_string().expect("encodes");
        let decoded =
            Board::from_share_string(&format!("  {encoded}\n")).expect("share string decodes");
        assert_eq!(board, decoded);
    }

    #[test]
    fn newer_payload_formats_are_rejected() {
        let mut file = BoardFile::from(&populated_board());
        file.version = FORMAT_VERSION + 1;
        let json = serde_json::to_vec(&file).expect("serializable board");
        let encoded = format!("{SHARE_HEADER}:{}", STANDARD_NO_PAD.encode(json));
        assert!(matches!(
            Board::from_share_string(&encoded),
            Err(ShareStringError::UnsupportedFormat { found: 2 })
        ));
    }

    #[test]
    fn malformed_strings_are_rejected() {
        assert!(matches!(
            Board::from_share_string("   "),
            Err(ShareStringError::EmptyPayload)
        ));
        assert!(matches!(
            Board::from_share_string("board"),
            Err(ShareStringError::MissingVersion)
        ));
        assert!(matches!(
            Board::from_share_string("board:v1"),
            Err(ShareStringError::MissingPayload)
        ));
        assert!(matches!(
            Board::from_share_string("deck:v1:e30"),
            Err(ShareStringError::InvalidPrefix(prefix)) if prefix == "deck"
        ));
        assert!(matches!(
            Board::from_share_string("board:v2:e30"),
            Err(ShareStringError::UnsupportedVersion(version)) if version == "v2"
        ));
        assert!(matches!(
            Board::from_share_string("board:v1:!!"),
            Err(ShareStringError::InvalidEncoding(_))
        ));
        // "{}" lacks every required field.
        assert!(matches!(
            Board::from_share_string("board:v1:e30"),
            Err(ShareStringError::InvalidPayload(_))
        ));
    }
}
