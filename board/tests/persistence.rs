use mapgrid_board::Board;
use mapgrid_core::{IVec2, Polygon, Rect, Rgb};
use mapgrid_system_adc2_layout::{BoardLayout, Layout, LayoutKind, MapSheet, SheetStyle};
use mapgrid_system_geometry::{HexGrid, HexGridConfig, RangePolicy, SquareGrid, SquareGridConfig};
use mapgrid_system_numbering::{
    AxisNumbering, AxisOrder, AxisType, NumberedGrid, RegularGridNumbering,
};
use mapgrid_system_zones::{Coverage, HighlightConfig, Pattern, Zone, ZoneHighlight};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_grid(rng: &mut ChaCha8Rng) -> NumberedGrid {
    let origin = IVec2::new(rng.gen_range(0..50), rng.gen_range(0..50));
    let size = f64::from(rng.gen_range(8..120)) / 2.0;
    let color = Rgb::new(rng.gen(), rng.gen(), rng.gen());
    let numbering = rng.gen_bool(0.7).then(|| RegularGridNumbering {
        first: if rng.gen_bool(0.5) {
            AxisOrder::ColumnFirst
        } else {
            AxisOrder::RowFirst
        },
        separator: if rng.gen_bool(0.5) { "." } else { "" }.to_owned(),
        stagger: rng.gen_bool(0.5),
        visible: rng.gen_bool(0.5),
        color,
        ..RegularGridNumbering::default()
    });
    if rng.gen_bool(0.5) {
        let grid = HexGrid::new(HexGridConfig {
            dx: size,
            dy: size * 1.25,
            origin,
            sideways: rng.gen_bool(0.5),
            visible: rng.gen_bool(0.5),
            color,
            ..HexGridConfig::default()
        })
        .expect("valid hex grid");
        NumberedGrid::new(grid, numbering)
    } else {
        let grid = SquareGrid::new(SquareGridConfig {
            dx: size,
            dy: size,
            origin,
            range: if rng.gen_bool(0.5) {
                RangePolicy::Metric
            } else {
                RangePolicy::Manhattan
            },
            snap_scale: rng.gen_range(0..4),
            color,
            ..SquareGridConfig::default()
        })
        .expect("valid square grid");
        NumberedGrid::new(grid, numbering)
    }
}

fn random_board(rng: &mut ChaCha8Rng) -> Board {
    let mut board = Board::new("Random", IVec2::new(1000, 800)).expect("valid board");
    if rng.gen_bool(0.8) {
        let background = random_grid(rng);
        board.grid_mut().set_background(Some(background));
    }
    let zone_count = rng.gen_range(0..5);
    for index in 0..zone_count {
        let rect = Rect::new(
            rng.gen_range(0..800),
            rng.gen_range(0..600),
            rng.gen_range(10..200),
            rng.gen_range(10..200),
        );
        let mut zone = Zone::new(format!("Zone {index}"), Polygon::from_rect(rect));
        if rng.gen_bool(0.5) {
            let grid = random_grid(rng);
            zone.set_grid(Some(grid));
            zone.set_location_format("$name$: $gridLocation$");
        }
        if rng.gen_bool(0.5) {
            let highlight = HighlightConfig {
                name: format!("highlight {index}"),
                coverage: if rng.gen_bool(0.5) {
                    Coverage::EntireZone
                } else {
                    Coverage::ZoneBorder
                },
                width: rng.gen_range(1..6),
                style: Pattern::Crosshatched,
                opacity: rng.gen_range(0..=100),
                ..HighlightConfig::default()
            };
            zone.add_highlight(ZoneHighlight::new(highlight).expect("valid highlight"));
        }
        board.grid_mut().add_zone(zone).expect("unique zone");
    }
    board
}

#[test]
fn boards_survive_every_persistence_format() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for _ in 0..40 {
        let board = random_board(&mut rng);

        let toml = board.to_toml().expect("toml encodes");
        assert_eq!(Board::from_toml(&toml).expect("toml decodes"), board);

        let attributes = board.export_attributes();
        assert_eq!(
            Board::import_attributes(&attributes).expect("attributes decode"),
            board
        );

        let shared = board.to_share_string().expect("share string encodes");
        assert_eq!(
            Board::from_share_string(&shared).expect("share string decodes"),
            board
        );
    }
}

#[test]
fn saved_files_load_back() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let board = random_board(&mut rng);
    let dir = tempfile::tempdir().expect("temporary directory");
    let path = dir.path().join("board.toml");
    board.save(&path).expect("board saves");
    assert_eq!(Board::load(&path).expect("board loads"), board);
}

#[test]
fn imported_layouts_persist_with_their_sheets() {
    let layout = BoardLayout {
        layout: Layout::new(LayoutKind::VerticalHex, 40, 12, 10).expect("valid layout"),
        sheets: vec![
            MapSheet {
                style: SheetStyle(SheetStyle::NUMERIC_COLUMNS | SheetStyle::NUMERIC_ROWS),
                column_chars: 2,
                row_chars: 2,
                ..MapSheet::new("North", Rect::new(0, 0, 12, 5))
            },
            MapSheet::new("South", Rect::new(0, 5, 12, 5)),
        ],
    };
    let board = Board::from_layout("Campaign", &layout).expect("valid board");
    let reloaded = Board::from_toml(&board.to_toml().expect("encodes")).expect("decodes");
    assert_eq!(reloaded, board);

    let centre = layout.layout.index_to_position(2).expect("on board") + layout.layout.origin();
    let name = reloaded.grid().location_name(centre).expect("named location");
    assert!(name.starts_with("North "), "{name}");
    let resolved = reloaded.grid().location(&name).expect("resolves");
    assert!((resolved - centre).abs().max_element() <= 1);
}

#[test]
fn alphabetic_numbering_survives_attribute_text() {
    let mut board = Board::new("Letters", IVec2::new(300, 300)).expect("valid board");
    let grid = SquareGrid::new(SquareGridConfig::default()).expect("valid grid");
    board.grid_mut().set_background(Some(NumberedGrid::new(
        grid,
        Some(RegularGridNumbering {
            first: AxisOrder::RowFirst,
            row: AxisNumbering {
                kind: AxisType::Alphabetic,
                leading: 1,
                ..AxisNumbering::default()
            },
            ..RegularGridNumbering::default()
        }),
    )));
    let text = board.export_attributes();
    assert!(text.contains("first=V\n"));
    assert!(text.contains("vType=A\nvLeading=1\n"));
    let restored = Board::import_attributes(&text).expect("decodes");
    assert_eq!(
        restored.grid().location_name(IVec2::new(24, 24)),
        board.grid().location_name(IVec2::new(24, 24))
    );
}
