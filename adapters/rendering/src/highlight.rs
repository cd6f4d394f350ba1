use std::{cell::RefCell, collections::HashMap, rc::Rc};

use mapgrid_core::{BadDataLog, BadDataReport, DVec2, Rect, Revision, Rgb, Shape};
use mapgrid_system_zones::{Coverage, HighlightConfig, Pattern, Zone, ZoneHighlight, ZonedGrid};

use crate::{Color, Raster, View};

/// Edge length of the procedural stripe and crosshatch tiles.
pub const TEXTURE_SIZE: u32 = 6;

/// Resolves image names referenced by tiled image highlights.
pub trait ImageSource {
    /// Image registered under `name`, if any.
    fn image(&self, name: &str) -> Option<Raster>;
}

/// Image source that resolves nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoImages;

impl ImageSource for NoImages {
    fn image(&self, _name: &str) -> Option<Raster> {
        None
    }
}

impl ImageSource for HashMap<String, Raster> {
    fn image(&self, name: &str) -> Option<Raster> {
        self.get(name).cloned()
    }
}

/// Services available while rendering.
pub struct RenderContext<'a> {
    /// Source of tiled highlight images.
    pub images: &'a dyn ImageSource,
    /// Log receiving reports about unresolvable images.
    pub reports: &'a BadDataLog,
}

#[derive(Clone, Debug, PartialEq)]
struct TextureInputs {
    revision: Revision,
    style: Pattern,
    color: Rgb,
    image: Option<String>,
}

impl TextureInputs {
    fn of(highlight: &ZoneHighlight) -> Self {
        let config = highlight.config();
        Self {
            revision: highlight.revision(),
            style: config.style,
            color: config.color,
            image: config.image.clone(),
        }
    }
}

#[derive(Debug)]
struct CachedTexture {
    inputs: TextureInputs,
    texture: Option<Rc<Raster>>,
}

/// Highlight textures keyed by zone and highlight name.
///
/// Entries are stamped with the highlight revision and the inputs of the
/// texture; any change rebuilds the texture on the next read. Building a
/// texture drops the entries of highlights its zone no longer carries, and
/// [`paint_highlights`] drops the entries of zones that are gone.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: RefCell<HashMap<(String, String), CachedTexture>>,
}

impl TextureCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached textures, including failed lookups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Texture painted by `highlight` of `zone`.
    ///
    /// Plain highlights have no texture. Tiled image highlights whose image
    /// cannot be resolved file a bad data report and yield `None`.
    pub fn texture(
        &self,
        zone: &Zone,
        highlight: &ZoneHighlight,
        context: &RenderContext<'_>,
    ) -> Option<Rc<Raster>> {
        if highlight.config().style == Pattern::Plain {
            return None;
        }
        let inputs = TextureInputs::of(highlight);
        let key = (zone.name().to_owned(), highlight.name().to_owned());
        if let Some(cached) = self.entries.borrow().get(&key) {
            if cached.inputs == inputs {
                return cached.texture.clone();
            }
        }

        tracing::debug!(
            zone = zone.name(),
            highlight = highlight.name(),
            revision = inputs.revision.get(),
            "building highlight texture"
        );
        let texture = build_texture(highlight.config(), context).map(Rc::new);
        let mut entries = self.entries.borrow_mut();
        entries.retain(|(owner, name), _| {
            owner.as_str() != zone.name()
                || zone
                    .highlights()
                    .iter()
                    .any(|current| current.name() == name.as_str())
        });
        let _ = entries.insert(
            key,
            CachedTexture {
                inputs,
                texture: texture.clone(),
            },
        );
        texture
    }

    fn retain_zones(&self, zones: &ZonedGrid) {
        self.entries
            .borrow_mut()
            .retain(|(owner, _), _| zones.zone(owner).is_some());
    }
}

fn build_texture(config: &HighlightConfig, context: &RenderContext<'_>) -> Option<Raster> {
    let color = Color::from(config.color);
    let last = TEXTURE_SIZE as i32 - 1;
    match config.style {
        Pattern::Plain => None,
        Pattern::Striped => {
            let mut tile = Raster::new(TEXTURE_SIZE, TEXTURE_SIZE, Color::TRANSPARENT);
            tile.draw_line((0, last), (last, 0), color);
            Some(tile)
        }
        Pattern::Crosshatched => {
            let mut tile = Raster::new(TEXTURE_SIZE, TEXTURE_SIZE, Color::TRANSPARENT);
            tile.draw_line((0, last), (last, 0), color);
            tile.draw_line((1, 0), (last, last - 1), color);
            Some(tile)
        }
        Pattern::TiledImage => {
            let Some(name) = config.image.as_deref() else {
                let _ = context.reports.report(BadDataReport::new(
                    "no image configured for tiled highlight",
                    &config.name,
                ));
                return None;
            };
            match context.images.image(name) {
                Some(image) if !image.is_empty() => Some(image),
                _ => {
                    let _ = context
                        .reports
                        .report(BadDataReport::new("unable to locate image", name));
                    None
                }
            }
        }
    }
}

enum Paint {
    Solid(Color),
    Texture(Rc<Raster>),
}

impl Paint {
    fn at(&self, x: u32, y: u32) -> Color {
        match self {
            Self::Solid(color) => *color,
            Self::Texture(texture) => texture.tiled_pixel(i64::from(x), i64::from(y)),
        }
    }
}

/// Composites every highlight of `zone` onto `raster` in registration order.
///
/// The raster holds the view; pixels are sampled at their centres. Border
/// coverage strokes the outline `width·scale` pixels wide.
pub fn paint_zone(
    raster: &mut Raster,
    zone: &Zone,
    view: &View,
    context: &RenderContext<'_>,
    cache: &TextureCache,
) {
    let outline = Shape::new(
        zone.path()
            .to_shape()
            .vertices()
            .iter()
            .map(|vertex| view.to_view(*vertex))
            .collect(),
    );
    let Some((low, high)) = outline.bounds() else {
        return;
    };
    let canvas = Rect::new(
        0,
        0,
        i32::try_from(raster.width()).unwrap_or(i32::MAX),
        i32::try_from(raster.height()).unwrap_or(i32::MAX),
    );
    let region = view.region().intersection(&canvas);

    for highlight in zone.highlights() {
        if !highlight.is_drawable() {
            continue;
        }
        let config = highlight.config();
        let paint = match config.style {
            Pattern::Plain => Paint::Solid(config.color.into()),
            _ => match cache.texture(zone, highlight, context) {
                Some(texture) => Paint::Texture(texture),
                None => continue,
            },
        };
        let opacity = config.opacity as f32 / 100.0;
        let half_width = f64::from(config.width) * view.scale / 2.0;
        let margin = match config.coverage {
            Coverage::EntireZone => 0.0,
            Coverage::ZoneBorder => half_width,
        };
        let area = Rect::new(
            (low.x - margin).floor() as i32,
            (low.y - margin).floor() as i32,
            (high.x - low.x + 2.0 * margin).ceil() as i32 + 2,
            (high.y - low.y + 2.0 * margin).ceil() as i32 + 2,
        )
        .intersection(&region);

        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let centre = DVec2::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let covered = match config.coverage {
                    Coverage::EntireZone => outline.contains(centre),
                    Coverage::ZoneBorder => outline.distance_to_outline(centre) <= half_width,
                };
                if covered {
                    // `area` lies within the canvas, so both coordinates are non-negative.
                    let (x, y) = (x as u32, y as u32);
                    raster.blend_pixel(x, y, paint.at(x, y), opacity);
                }
            }
        }
    }
}

/// Paints the highlights of every zone in declaration order.
pub fn paint_highlights(
    raster: &mut Raster,
    zones: &ZonedGrid,
    view: &View,
    context: &RenderContext<'_>,
    cache: &TextureCache,
) {
    cache.retain_zones(zones);
    for zone in zones.zones() {
        paint_zone(raster, zone, view, context, cache);
    }
}

#[cfg(test)]
mod tests {
    use mapgrid_core::IVec2;

    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);

    fn highlight(config: HighlightConfig) -> ZoneHighlight {
        ZoneHighlight::new(HighlightConfig {
            name: "h".to_owned(),
            color: RED,
            ..config
        })
        .expect("valid highlight")
    }

    fn square_zone(highlights: Vec<ZoneHighlight>) -> Zone {
        let mut zone = Zone::new("Square", "2,2;12,2;12,12;2,12".parse().expect("path"));
        for highlight in highlights {
            zone.add_highlight(highlight);
        }
        zone
    }

    fn paint(zone: &Zone, images: &dyn ImageSource, reports: &BadDataLog) -> Raster {
        let mut raster = Raster::new(16, 16, Color::WHITE);
        let context = RenderContext { images, reports };
        paint_zone(
            &mut raster,
            zone,
            &View::whole_board(IVec2::new(16, 16)),
            &context,
            &TextureCache::new(),
        );
        raster
    }

    #[test]
    fn zero_opacity_leaves_the_image_unchanged() {
        let zone = square_zone(vec![highlight(HighlightConfig {
            opacity: 0,
            ..HighlightConfig::default()
        })]);
        let raster = paint(&zone, &NoImages, &BadDataLog::new());
        assert_eq!(raster, Raster::new(16, 16, Color::WHITE));
    }

    #[test]
    fn full_opacity_replaces_the_covered_area() {
        let zone = square_zone(vec![highlight(HighlightConfig::default())]);
        let raster = paint(&zone, &NoImages, &BadDataLog::new());
        let red = Color::from(RED);
        assert_eq!(raster.pixel(2, 2), Some(red));
        assert_eq!(raster.pixel(11, 11), Some(red));
        assert_eq!(raster.pixel(12, 5), Some(Color::WHITE));
        assert_eq!(raster.pixel(1, 5), Some(Color::WHITE));
    }

    #[test]
    fn half_opacity_blends_source_over() {
        let zone = square_zone(vec![highlight(HighlightConfig {
            opacity: 50,
            ..HighlightConfig::default()
        })]);
        let raster = paint(&zone, &NoImages, &BadDataLog::new());
        let pixel = raster.pixel(6, 6).expect("inside raster");
        assert_eq!(pixel.to_rgba_u8(), [255, 128, 128, 255]);
    }

    #[test]
    fn later_highlights_paint_on_top() {
        let blue = Rgb::new(0, 0, 255);
        let zone = square_zone(vec![
            highlight(HighlightConfig::default()),
            ZoneHighlight::new(HighlightConfig {
                name: "top".to_owned(),
                color: blue,
                ..HighlightConfig::default()
            })
            .expect("valid highlight"),
        ]);
        let raster = paint(&zone, &NoImages, &BadDataLog::new());
        assert_eq!(raster.pixel(6, 6), Some(Color::from(blue)));
    }

    #[test]
    fn border_coverage_strokes_only_the_outline() {
        let zone = square_zone(vec![highlight(HighlightConfig {
            coverage: Coverage::ZoneBorder,
            width: 2,
            ..HighlightConfig::default()
        })]);
        let raster = paint(&zone, &NoImages, &BadDataLog::new());
        let red = Color::from(RED);
        assert_eq!(raster.pixel(2, 6), Some(red));
        assert_eq!(raster.pixel(1, 6), Some(red));
        assert_eq!(raster.pixel(6, 6), Some(Color::WHITE));
        assert_eq!(raster.pixel(6, 0), Some(Color::WHITE));
    }

    #[test]
    fn procedural_textures_draw_diagonals() {
        let reports = BadDataLog::new();
        let context = RenderContext {
            images: &NoImages,
            reports: &reports,
        };
        let cache = TextureCache::new();
        let zone = square_zone(vec![
            highlight(HighlightConfig {
                style: Pattern::Striped,
                ..HighlightConfig::default()
            }),
            ZoneHighlight::new(HighlightConfig {
                name: "crossed".to_owned(),
                style: Pattern::Crosshatched,
                color: RED,
                ..HighlightConfig::default()
            })
            .expect("valid highlight"),
        ]);
        let texture = cache
            .texture(&zone, &zone.highlights()[0], &context)
            .expect("striped texture");
        let red = Color::from(RED);
        for i in 0..6 {
            assert_eq!(texture.pixel(i, 5 - i), Some(red));
        }
        assert_eq!(texture.pixel(0, 0), Some(Color::TRANSPARENT));

        let texture = cache
            .texture(&zone, &zone.highlights()[1], &context)
            .expect("crosshatched texture");
        for i in 0..5 {
            assert_eq!(texture.pixel(1 + i, i), Some(red));
        }
        assert_eq!(texture.pixel(0, 0), Some(Color::TRANSPARENT));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn textures_are_reused_until_the_highlight_changes() {
        let reports = BadDataLog::new();
        let context = RenderContext {
            images: &NoImages,
            reports: &reports,
        };
        let cache = TextureCache::new();
        let mut zone = square_zone(vec![highlight(HighlightConfig {
            style: Pattern::Striped,
            ..HighlightConfig::default()
        })]);

        let first = cache
            .texture(&zone, &zone.highlights()[0], &context)
            .expect("texture");
        let again = cache
            .texture(&zone, &zone.highlights()[0], &context)
            .expect("texture");
        assert!(Rc::ptr_eq(&first, &again));

        let highlight = zone.highlight_mut("h").expect("highlight");
        let mut config = highlight.config().clone();
        config.color = Rgb::new(0, 255, 0);
        highlight.set_config(config).expect("valid config");
        let rebuilt = cache
            .texture(&zone, &zone.highlights()[0], &context)
            .expect("texture");
        assert!(!Rc::ptr_eq(&first, &rebuilt));
        assert_eq!(rebuilt.pixel(0, 5), Some(Color::from_rgb_u8(0, 255, 0)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn textures_of_removed_highlights_and_zones_are_dropped() {
        let reports = BadDataLog::new();
        let context = RenderContext {
            images: &NoImages,
            reports: &reports,
        };
        let striped = |name: &str| {
            ZoneHighlight::new(HighlightConfig {
                name: name.to_owned(),
                style: Pattern::Striped,
                color: RED,
                ..HighlightConfig::default()
            })
            .expect("valid highlight")
        };
        let cache = TextureCache::new();
        let mut zone = square_zone(vec![striped("old"), striped("kept")]);
        for highlight in zone.highlights() {
            let _ = cache.texture(&zone, highlight, &context);
        }
        assert_eq!(cache.len(), 2);

        let _ = zone.remove_highlight("old").expect("highlight present");
        zone.add_highlight(striped("new"));
        let _ = cache.texture(&zone, &zone.highlights()[1], &context);
        assert_eq!(cache.len(), 2);

        let mut zones = ZonedGrid::new(None);
        zones.add_zone(zone).expect("unique zone");
        let mut raster = Raster::new(16, 16, Color::WHITE);
        let view = View::whole_board(IVec2::new(16, 16));
        paint_highlights(&mut raster, &zones, &view, &context, &cache);
        assert_eq!(cache.len(), 2);

        let _ = zones.remove_zone("Square").expect("zone present");
        paint_highlights(&mut raster, &zones, &view, &context, &cache);
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_images_are_reported_once_and_skipped() {
        let zone = square_zone(vec![highlight(HighlightConfig {
            style: Pattern::TiledImage,
            image: Some("forest.ppm".to_owned()),
            ..HighlightConfig::default()
        })]);
        let reports = BadDataLog::new();
        let raster = paint(&zone, &NoImages, &reports);
        let _ = paint(&zone, &NoImages, &reports);
        assert_eq!(raster, Raster::new(16, 16, Color::WHITE));
        let filed = reports.reports();
        assert_eq!(filed.len(), 1);
        assert_eq!(filed[0].data(), "forest.ppm");
    }

    #[test]
    fn tiled_images_repeat_across_the_zone() {
        let mut tile = Raster::new(2, 1, Color::from_rgb_u8(0, 0, 0));
        tile.set_pixel(1, 0, Color::from_rgb_u8(0, 0, 255));
        let images = HashMap::from([("tile".to_owned(), tile)]);
        let zone = square_zone(vec![highlight(HighlightConfig {
            style: Pattern::TiledImage,
            image: Some("tile".to_owned()),
            ..HighlightConfig::default()
        })]);
        let raster = paint(&zone, &images, &BadDataLog::new());
        assert_eq!(raster.pixel(4, 4), Some(Color::from_rgb_u8(0, 0, 0)));
        assert_eq!(raster.pixel(5, 4), Some(Color::from_rgb_u8(0, 0, 255)));
        assert_eq!(raster.pixel(1, 4), Some(Color::WHITE));
    }
}
