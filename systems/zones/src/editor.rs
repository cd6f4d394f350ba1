use mapgrid_core::{IVec2, Point, Polygon};

use crate::Zone;

/// Interactive boundary editing model for a zone.
///
/// Mirrors the gestures of a polygon editor without any widget code: a
/// rectangle is dragged out to create the boundary, presses select the
/// nearest vertex, drags move it, and vertices can be inserted or deleted at
/// the selection. Every edit bumps the zone revision.
#[derive(Debug)]
pub struct PolygonEditor<'a> {
    zone: &'a mut Zone,
    selected: Option<usize>,
}

impl<'a> PolygonEditor<'a> {
    /// Starts editing `zone` with nothing selected.
    pub fn new(zone: &'a mut Zone) -> Self {
        Self {
            zone,
            selected: None,
        }
    }

    /// Index of the selected vertex.
    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Boundary being edited.
    #[must_use]
    pub fn polygon(&self) -> &Polygon {
        self.zone.path()
    }

    /// Replaces the boundary with the rectangle dragged from `anchor` to `corner`.
    ///
    /// The dragged corner stays selected.
    pub fn define_rectangle(&mut self, anchor: Point, corner: Point) {
        self.zone.set_path(Polygon::new(vec![
            anchor,
            IVec2::new(corner.x, anchor.y),
            corner,
            IVec2::new(anchor.x, corner.y),
        ]));
        self.selected = Some(2);
    }

    /// Selects the vertex nearest to `point`.
    pub fn select_nearest(&mut self, point: Point) -> Option<usize> {
        self.selected = self.zone.path().nearest_vertex(point);
        self.selected
    }

    /// Moves the selected vertex to `point`.
    pub fn move_selected(&mut self, point: Point) -> bool {
        let Some(index) = self.selected else {
            return false;
        };
        self.zone.edit_path(|path| match path.points_mut().get_mut(index) {
            Some(vertex) => {
                *vertex = point;
                true
            }
            None => false,
        })
    }

    /// Inserts `point` before the vertex nearest to it and selects the new vertex.
    ///
    /// An empty boundary simply gains its first vertex.
    pub fn insert_at(&mut self, point: Point) {
        let index = self.select_nearest(point).unwrap_or(0);
        self.zone
            .edit_path(|path| path.points_mut().insert(index, point));
        self.selected = Some(index);
    }

    /// Removes the selected vertex and clears the selection.
    pub fn delete_selected(&mut self) -> Option<Point> {
        let index = self.selected.take()?;
        self.zone.edit_path(|path| {
            let points = path.points_mut();
            (index < points.len()).then(|| points.remove(index))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> Zone {
        Zone::new("Marsh", Polygon::default())
    }

    #[test]
    fn rectangle_drag_creates_four_vertices() {
        let mut zone = zone();
        let before = zone.revision();
        let mut editor = PolygonEditor::new(&mut zone);
        editor.define_rectangle(IVec2::new(10, 20), IVec2::new(110, 70));
        assert_eq!(editor.selected(), Some(2));
        assert_eq!(editor.polygon().to_path(), "10,20;110,20;110,70;10,70");
        assert!(zone.revision() > before);
    }

    #[test]
    fn vertices_can_be_moved_inserted_and_deleted() {
        let mut zone = zone();
        let mut editor = PolygonEditor::new(&mut zone);
        editor.define_rectangle(IVec2::new(0, 0), IVec2::new(100, 100));

        assert_eq!(editor.select_nearest(IVec2::new(95, 4)), Some(1));
        assert!(editor.move_selected(IVec2::new(120, -10)));
        assert_eq!(editor.polygon().to_path(), "0,0;120,-10;100,100;0,100");

        editor.insert_at(IVec2::new(90, 90));
        assert_eq!(editor.selected(), Some(2));
        assert_eq!(
            editor.polygon().to_path(),
            "0,0;120,-10;90,90;100,100;0,100"
        );

        assert_eq!(editor.delete_selected(), Some(IVec2::new(90, 90)));
        assert_eq!(editor.selected(), None);
        assert!(!editor.move_selected(IVec2::ZERO));
        assert_eq!(editor.polygon().len(), 4);
    }

    #[test]
    fn inserting_into_an_empty_boundary_adds_the_first_vertex() {
        let mut zone = zone();
        let mut editor = PolygonEditor::new(&mut zone);
        editor.insert_at(IVec2::new(5, 5));
        assert_eq!(editor.selected(), Some(0));
        assert_eq!(editor.polygon().points(), &[IVec2::new(5, 5)]);
    }
}
