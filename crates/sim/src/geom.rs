/// Rectangle convention:
/// - `x`/`y` is the top-left corner in integer pixel units, y grows downward.
/// - `right = x + width`, `bottom = y + height`.
/// - `contains` is boundary-inclusive on all four edges, so two rectangles
///   that merely share an edge still register as touching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.x, self.bottom()),
            Point::new(self.right(), self.bottom()),
        ]
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        other
            .corners()
            .iter()
            .any(|corner| self.contains(*corner))
            || self
                .corners()
                .iter()
                .any(|corner| other.contains(*corner))
    }

    /// Overlap region of two rectangles, or `None` when either projection is
    /// disjoint. A shared edge yields a zero-area rectangle rather than
    /// `None`, matching the boundary-inclusive `contains`.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if self.right() < other.x || other.right() < self.x {
            return None;
        }
        if self.bottom() < other.y || other.bottom() < self.y {
            return None;
        }
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(
            left,
            top,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_boundary_inclusive() {
        let rect = Rect::new(10, 20, 5, 5);
        assert!(rect.contains(Point::new(10, 20)));
        assert!(rect.contains(Point::new(15, 25)));
        assert!(rect.contains(Point::new(15, 20)));
        assert!(!rect.contains(Point::new(16, 20)));
        assert!(!rect.contains(Point::new(10, 26)));
        assert!(!rect.contains(Point::new(9, 20)));
    }

    #[test]
    fn intersects_is_symmetric() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        let c = Rect::new(100, 100, 3, 3);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(!c.intersects(&a));
    }

    #[test]
    fn edge_touching_rectangles_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn small_rect_fully_inside_larger_intersects_both_ways() {
        let outer = Rect::new(0, 0, 100, 100);
        let inner = Rect::new(40, 40, 2, 2);
        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
    }

    #[test]
    fn intersection_is_symmetric() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(4, 6, 10, 10);
        assert_eq!(a.intersection(&b), b.intersection(&a));
        assert_eq!(a.intersection(&b), Some(Rect::new(4, 6, 6, 4)));
    }

    #[test]
    fn intersection_of_disjoint_rects_is_none() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(11, 0, 10, 10);
        let c = Rect::new(0, 11, 10, 10);
        assert_eq!(a.intersection(&b), None);
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn intersection_of_edge_touching_rects_is_zero_area() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        let overlap = a.intersection(&b).expect("touching rects overlap");
        assert_eq!(overlap, Rect::new(10, 0, 0, 10));
        assert!(overlap.is_empty());
    }

    #[test]
    fn intersection_is_contained_in_both_inputs() {
        let cases = [
            (Rect::new(0, 0, 10, 10), Rect::new(3, 4, 20, 2)),
            (Rect::new(-5, -5, 10, 10), Rect::new(0, 0, 10, 10)),
            (Rect::new(2, 2, 4, 4), Rect::new(0, 0, 10, 10)),
        ];
        for (a, b) in cases {
            let overlap = a.intersection(&b).expect("overlap");
            for corner in overlap.corners() {
                assert!(a.contains(corner), "{corner:?} not in {a:?}");
                assert!(b.contains(corner), "{corner:?} not in {b:?}");
            }
        }
    }

    #[test]
    fn equality_is_purely_positional() {
        assert_eq!(Rect::new(1, 2, 3, 4), Rect::new(1, 2, 3, 4));
        assert_ne!(Rect::new(1, 2, 3, 4), Rect::new(1, 2, 3, 5));
    }

    #[test]
    fn translated_preserves_size() {
        let rect = Rect::new(1, 2, 3, 4).translated(-10, 5);
        assert_eq!(rect, Rect::new(-9, 7, 3, 4));
    }
}
