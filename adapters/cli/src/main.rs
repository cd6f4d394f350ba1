#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for querying, converting and rendering mapgrid boards.

use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use mapgrid_board::Board;
use mapgrid_core::{BadDataLog, Point, Rect};
use mapgrid_rendering::{
    paint_highlights, zoned_overlays, Color, Raster, RenderContext, TextureCache, View,
};
use mapgrid_system_adc2_layout::BoardLayout;
use tracing_subscriber::EnvFilter;

/// Query, convert and render mapgrid boards.
#[derive(Debug, Parser)]
#[command(name = "mapgrid", version, about)]
struct Cli {
    /// Log debug output, including cache rebuilds
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Snap a point to the nearest legal grid location
    Snap {
        /// Board file
        board: PathBuf,
        /// Point as `x,y`
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        point: Point,
    },
    /// Print the grid range between two points
    Range {
        /// Board file
        board: PathBuf,
        /// Start point as `x,y`; its grid measures the range
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        from: Point,
        /// End point as `x,y`
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        to: Point,
    },
    /// Print the location name of a point
    Name {
        /// Board file
        board: PathBuf,
        /// Point as `x,y`
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        point: Point,
    },
    /// Resolve a location name to a point
    Locate {
        /// Board file
        board: PathBuf,
        /// Location name, as printed by `name`
        name: String,
    },
    /// Print the zone containing a point
    Zone {
        /// Board file
        board: PathBuf,
        /// Point as `x,y`
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        point: Point,
    },
    /// Print the grid overlays of a board as JSON
    Overlay {
        /// Board file
        board: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Render highlights and grids to a binary PPM image
    Render {
        /// Board file
        board: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
        /// Output image
        #[arg(long, short = 'o')]
        output: PathBuf,
        /// PPM drawn beneath the highlights; must match the rendered size
        #[arg(long)]
        background: Option<PathBuf>,
        /// Directory holding the PPM images of tiled highlights
        #[arg(long)]
        images: Option<PathBuf>,
    },
    /// Print a board as sectioned attribute text
    Export {
        /// Board file
        board: PathBuf,
    },
    /// Convert sectioned attribute text into a board file
    Import {
        /// Attribute text file
        attributes: PathBuf,
        /// Board file to write
        #[arg(long, short = 'o')]
        output: PathBuf,
    },
    /// Print a board as a single-line share string
    Share {
        /// Board file
        board: PathBuf,
    },
    /// Convert a share string into a board file
    Unshare {
        /// Share string, as printed by `share`
        share: String,
        /// Board file to write
        #[arg(long, short = 'o')]
        output: PathBuf,
    },
    /// Convert an ADC2 layout description (TOML or JSON) into a board file
    Adc2 {
        /// Layout description
        layout: PathBuf,
        /// Board name; defaults to the layout file stem
        #[arg(long)]
        name: Option<String>,
        /// Board file to write
        #[arg(long, short = 'o')]
        output: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ViewArgs {
    /// Zoom factor from board pixels to output pixels
    #[arg(long, default_value_t = 1.0)]
    scale: f64,
    /// Draw the board rotated by 180 degrees
    #[arg(long)]
    reversed: bool,
}

impl ViewArgs {
    fn view(&self, board: &Board) -> Result<View> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            bail!("scale must be positive, got {}", self.scale);
        }
        let size = board.size().as_dvec2() * self.scale;
        let bounds = Rect::new(0, 0, size.x.ceil() as i32, size.y.ceil() as i32);
        Ok(View {
            bounds,
            visible: bounds,
            scale: self.scale,
            reversed: self.reversed,
        })
    }
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{value}`"))?;
    let coordinate = |part: &str| {
        part.trim()
            .parse::<i32>()
            .map_err(|error| format!("invalid coordinate `{part}`: {error}"))
    };
    Ok(Point::new(coordinate(x)?, coordinate(y)?))
}

/// Entry point for the mapgrid command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let stdout = io::stdout();
    run(cli.command, &mut stdout.lock())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Snap { board, point } => {
            let snapped = load(&board)?.grid().snap_to(point);
            writeln!(out, "{},{}", snapped.x, snapped.y)?;
        }
        Command::Range { board, from, to } => {
            let range = load(&board)?
                .grid()
                .range(from, to)
                .with_context(|| format!("no grid covers {},{}", from.x, from.y))?;
            writeln!(out, "{range}")?;
        }
        Command::Name { board, point } => {
            let name = load(&board)?
                .grid()
                .location_name(point)
                .with_context(|| format!("no grid covers {},{}", point.x, point.y))?;
            writeln!(out, "{name}")?;
        }
        Command::Locate { board, name } => {
            let point = load(&board)?
                .grid()
                .location(&name)
                .with_context(|| format!("cannot resolve location `{name}`"))?;
            writeln!(out, "{},{}", point.x, point.y)?;
        }
        Command::Zone { board, point } => {
            let board = load(&board)?;
            let zone = board
                .grid()
                .find_zone(point)
                .with_context(|| format!("no zone contains {},{}", point.x, point.y))?;
            writeln!(out, "{}", zone.name())?;
        }
        Command::Overlay { board, view } => {
            let board = load(&board)?;
            let overlays = zoned_overlays(board.grid(), &view.view(&board)?);
            serde_json::to_writer_pretty(&mut *out, &overlays)?;
            writeln!(out)?;
        }
        Command::Render {
            board,
            view,
            output,
            background,
            images,
        } => {
            let board = load(&board)?;
            let raster = render(
                &board,
                &view.view(&board)?,
                background.as_deref(),
                images.as_deref(),
            )?;
            fs::write(&output, raster.to_ppm())
                .with_context(|| format!("failed to write {}", output.display()))?;
            tracing::info!(path = %output.display(), "rendered board");
        }
        Command::Export { board } => {
            write!(out, "{}", load(&board)?.export_attributes())?;
        }
        Command::Import { attributes, output } => {
            let text = fs::read_to_string(&attributes)
                .with_context(|| format!("failed to read {}", attributes.display()))?;
            let board = Board::import_attributes(&text)
                .with_context(|| format!("invalid attribute text in {}", attributes.display()))?;
            save(&board, &output)?;
        }
        Command::Share { board } => {
            writeln!(out, "{}", load(&board)?.to_share_string()?)?;
        }
        Command::Unshare { share, output } => {
            let board = Board::from_share_string(share.trim()).context("invalid share string")?;
            save(&board, &output)?;
        }
        Command::Adc2 {
            layout,
            name,
            output,
        } => {
            let description = load_layout(&layout)?;
            let name = name.unwrap_or_else(|| {
                layout
                    .file_stem()
                    .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned())
            });
            let board = Board::from_layout(name, &description)
                .with_context(|| format!("invalid layout in {}", layout.display()))?;
            save(&board, &output)?;
        }
    }
    Ok(())
}

fn load(path: &Path) -> Result<Board> {
    Board::load(path).with_context(|| format!("failed to load board {}", path.display()))
}

fn save(board: &Board, path: &Path) -> Result<()> {
    board
        .save(path)
        .with_context(|| format!("failed to save board {}", path.display()))
}

fn load_layout(path: &Path) -> Result<BoardLayout> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let layout = if path.extension().is_some_and(|extension| extension == "json") {
        serde_json::from_str(&text)?
    } else {
        toml::from_str(&text)?
    };
    Ok(layout)
}

fn render(
    board: &Board,
    view: &View,
    background: Option<&Path>,
    images: Option<&Path>,
) -> Result<Raster> {
    let width = u32::try_from(view.bounds.width)?;
    let height = u32::try_from(view.bounds.height)?;
    let mut raster = match background {
        Some(path) => {
            let image = read_ppm(path)?;
            if (image.width(), image.height()) != (width, height) {
                bail!(
                    "background {} is {}x{}, expected {width}x{height}",
                    path.display(),
                    image.width(),
                    image.height()
                );
            }
            image
        }
        None => Raster::new(width, height, Color::WHITE),
    };

    let library = images.map_or_else(HashMap::new, |directory| load_images(board, directory));
    let reports = BadDataLog::new();
    let context = RenderContext {
        images: &library,
        reports: &reports,
    };
    paint_highlights(&mut raster, board.grid(), view, &context, &TextureCache::new());
    for overlay in zoned_overlays(board.grid(), view) {
        overlay.rasterize(&mut raster);
    }
    Ok(raster)
}

fn read_ppm(path: &Path) -> Result<Raster> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Raster::from_ppm(&bytes).with_context(|| format!("failed to decode {}", path.display()))
}

/// Loads every image referenced by a highlight; unreadable ones are left for
/// the renderer to report.
fn load_images(board: &Board, directory: &Path) -> HashMap<String, Raster> {
    board
        .grid()
        .zones()
        .iter()
        .flat_map(|zone| zone.highlights())
        .filter_map(|highlight| highlight.config().image.clone())
        .filter_map(|name| match read_ppm(&directory.join(&name)) {
            Ok(image) => Some((name, image)),
            Err(error) => {
                tracing::debug!(image = %name, "{error:#}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const BOARD: &str = r#"
version = 1
name = "Campaign"
width = 96
height = 96

[grid]
kind = "square"
dx = 48.0
dy = 48.0
origin = [24, 24]
dots_visible = true

[grid.numbering]
separator = "-"

[[zones]]
name = "Harbour"
path = "0,0;48,0;48,48;0,48"
location_format = "$name$"

[[zones.highlights]]
name = "water"
color = "0,0,255"
"#;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).expect("fixture file");
        path
    }

    fn execute(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("mapgrid").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        run(cli.command, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn points_parse_with_signs_and_spaces() {
        assert_eq!(parse_point("12,-4"), Ok(Point::new(12, -4)));
        assert_eq!(parse_point(" 3 , 5 "), Ok(Point::new(3, 5)));
        assert!(parse_point("12").is_err());
        assert!(parse_point("a,1").is_err());
    }

    #[test]
    fn queries_answer_through_the_board() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let board = write(&dir, "board.toml", BOARD);
        let board = board.to_str().expect("utf-8 path");

        assert_eq!(execute(&["snap", board, "70,30"]).expect("snaps"), "72,24\n");
        assert_eq!(execute(&["snap", board, "-3,-3"]).expect("snaps"), "-24,-24\n");
        assert_eq!(execute(&["range", board, "24,24", "72,72"]).expect("range"), "1\n");
        assert_eq!(execute(&["zone", board, "10,10"]).expect("zone"), "Harbour\n");
        assert_eq!(execute(&["name", board, "10,10"]).expect("name"), "Harbour\n");
        assert!(execute(&["zone", board, "70,70"]).is_err());

        let name = execute(&["name", board, "70,30"]).expect("name");
        let located = execute(&["locate", board, name.trim()]).expect("locates");
        assert_eq!(located, "72,24\n");
    }

    #[test]
    fn boards_convert_between_formats() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let board = write(&dir, "board.toml", BOARD);
        let expected = Board::load(&board).expect("valid board");

        let attributes = execute(&["export", board.to_str().expect("utf-8 path")]).expect("exports");
        let text = write(&dir, "board.txt", &attributes);
        let imported = dir.path().join("imported.toml");
        let _ = execute(&[
            "import",
            text.to_str().expect("utf-8 path"),
            "--output",
            imported.to_str().expect("utf-8 path"),
        ])
        .expect("imports");
        assert_eq!(Board::load(&imported).expect("valid board"), expected);

        let share = execute(&["share", board.to_str().expect("utf-8 path")]).expect("shares");
        assert!(share.starts_with(mapgrid_board::SHARE_HEADER));
        let unshared = dir.path().join("unshared.toml");
        let _ = execute(&[
            "unshare",
            share.trim(),
            "-o",
            unshared.to_str().expect("utf-8 path"),
        ])
        .expect("unshares");
        assert_eq!(Board::load(&unshared).expect("valid board"), expected);
    }

    #[test]
    fn adc2_layouts_become_board_files() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let layout = write(
            &dir,
            "Campaign.toml",
            r#"
[layout]
kind = "grid"
hex_size = 40
columns = 5
rows = 4

[[sheets]]
name = "Main"
field = { x = 0, y = 0, width = 5, height = 4 }
"#,
        );
        let output = dir.path().join("board.toml");
        let _ = execute(&[
            "adc2",
            layout.to_str().expect("utf-8 path"),
            "-o",
            output.to_str().expect("utf-8 path"),
        ])
        .expect("converts");
        let board = Board::load(&output).expect("valid board");
        assert_eq!(board.name(), "Campaign");
        assert_eq!(board.grid().zones().len(), 1);
        assert_eq!(board.grid().zones()[0].name(), "Main");
    }

    #[test]
    fn renders_paint_highlights_and_dots() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let board = write(&dir, "board.toml", BOARD);
        let output = dir.path().join("board.ppm");
        let _ = execute(&[
            "render",
            board.to_str().expect("utf-8 path"),
            "-o",
            output.to_str().expect("utf-8 path"),
        ])
        .expect("renders");
        let raster = Raster::from_ppm(&fs::read(&output).expect("rendered file")).expect("ppm");
        assert_eq!((raster.width(), raster.height()), (96, 96));
        assert_eq!(raster.pixel(5, 5), Some(Color::from_rgb_u8(0, 0, 255)));
        assert_eq!(raster.pixel(90, 90), Some(Color::WHITE));
        assert_eq!(raster.pixel(72, 72), Some(Color::from_rgb_u8(0, 0, 0)));
    }

    #[test]
    fn invalid_scales_are_rejected() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let board = write(&dir, "board.toml", BOARD);
        let result = execute(&["overlay", board.to_str().expect("utf-8 path"), "--scale", "0"]);
        assert!(result.is_err());
    }
}
