// SPDX-License-Identifier: MIT
//
// Grid — the fixed-size 2D cell buffer.
//
// A session keeps two of these: the pending frame the application paints
// into and the committed frame the renderer keeps in sync with the terminal.
// Both share this type; only who is allowed to write differs.
//
// Flat `Vec<Cell>` with row-major indexing: `index = y * width + x`. A row is
// contiguous, so the renderer's left-to-right scan is a linear walk and a
// whole-row equality check is a single slice compare.
//
// Drawing takes signed coordinates and never fails. Anything that lands off
// the grid is dropped on the floor.

use crate::cell::{Cell, Style};
use crate::geometry::{Line, Point, Rect};

/// A `width × height` grid of cells.
///
/// # Examples
///
/// ```
/// use tx_term::cell::Cell;
/// use tx_term::grid::Grid;
///
/// let mut grid = Grid::new(80, 24);
/// grid.draw(5, 3, Cell::new('X'));
/// grid.draw(-1, 3, Cell::new('!')); // off-grid: ignored
/// assert_eq!(grid.get(5, 3), Some(&Cell::new('X')));
/// assert_eq!(grid.size(), (80, 24));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Grid {
    // ─── Construction ────────────────────────────────────────────────────

    /// A grid filled with [`Cell::EMPTY`].
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        let size = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; size],
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// The full grid as a [`Rect`], for clipping.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::of_grid(self.width, self.height)
    }

    /// Convert signed coordinates to a flat index, if on the grid.
    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = u16::try_from(x).ok().filter(|&x| x < self.width)?;
        let y = u16::try_from(y).ok().filter(|&y| y < self.height)?;
        Some(usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    /// The cell at `(x, y)`, or `None` off the grid.
    #[inline]
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// One row as a slice, or `None` if `y` is out of range.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.height {
            let w = usize::from(self.width);
            let start = usize::from(y) * w;
            Some(&self.cells[start..start + w])
        } else {
            None
        }
    }

    /// Raw row-major cell slice.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Write one cell. Off-grid writes are silently ignored.
    #[inline]
    pub fn draw(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// Reset every cell to [`Cell::EMPTY`].
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Copy another grid of the same size into this one without allocating.
    ///
    /// Grids of a different size are cloned instead.
    pub fn copy_from(&mut self, other: &Self) {
        if self.size() == other.size() {
            self.cells.copy_from_slice(&other.cells);
        } else {
            self.clone_from(other);
        }
    }

    // ─── Shapes ──────────────────────────────────────────────────────────

    /// Same as [`draw`](Self::draw); named for symmetry with the shapes.
    #[inline]
    pub fn draw_point(&mut self, x: i32, y: i32, cell: Cell) {
        self.draw(x, y, cell);
    }

    /// Draw a filled or outlined `w × h` rectangle with its corner at `(x, y)`.
    ///
    /// Only the on-grid part is visited, so huge rectangles are cheap.
    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, filled: bool, cell: Cell) {
        let clip = self.bounds();
        for p in Rect::new(x, y, w, h).cells_within(clip, filled) {
            self.draw(p.x, p.y, cell);
        }
    }

    /// Draw a Bresenham line between two points, endpoints included.
    ///
    /// Only the on-grid run of the line is visited, so far-off endpoints
    /// cost nothing extra.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, cell: Cell) {
        let line = Line::new(Point::new(x0, y0), Point::new(x1, y1));
        for p in line.cells_within(self.bounds()) {
            self.draw(p.x, p.y, cell);
        }
    }

    /// Write `text` left to right from `(x, y)`, one cell per `char`.
    ///
    /// No wrapping; characters past the right edge are dropped.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, style: Style) {
        let mut cx = x;
        for ch in text.chars() {
            self.draw(cx, y, Cell::styled(ch, style));
            cx = match cx.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Color;
    use proptest::prelude::*;

    // ── Construction ────────────────────────────────────────────────────

    #[test]
    fn new_grid_is_blank() {
        let grid = Grid::new(10, 4);
        assert_eq!(grid.size(), (10, 4));
        assert_eq!(grid.cells().len(), 40);
        assert!(grid.cells().iter().all(Cell::is_blank));
    }

    #[test]
    fn row_slices() {
        let mut grid = Grid::new(3, 2);
        grid.draw(1, 1, Cell::new('m'));
        assert_eq!(grid.row(1).unwrap()[1], Cell::new('m'));
        assert!(grid.row(2).is_none());
    }

    // ── Draw / Clear ────────────────────────────────────────────────────

    #[test]
    fn draw_in_bounds() {
        let mut grid = Grid::new(4, 4);
        grid.draw(3, 3, Cell::new('z'));
        assert_eq!(grid.get(3, 3), Some(&Cell::new('z')));
    }

    #[test]
    fn draw_out_of_bounds_is_ignored() {
        let mut grid = Grid::new(4, 4);
        let before = grid.clone();
        grid.draw(4, 0, Cell::new('x'));
        grid.draw(0, 4, Cell::new('x'));
        grid.draw(-1, -1, Cell::new('x'));
        grid.draw(i32::MAX, i32::MIN, Cell::new('x'));
        assert_eq!(grid, before);
    }

    #[test]
    fn clear_resets_everything() {
        let mut grid = Grid::new(5, 5);
        grid.draw_rect(0, 0, 5, 5, true, Cell::new('#'));
        grid.clear();
        assert_eq!(grid, Grid::new(5, 5));
    }

    #[test]
    fn copy_from_same_size() {
        let mut a = Grid::new(3, 3);
        let mut b = Grid::new(3, 3);
        b.draw(2, 2, Cell::new('q'));
        a.copy_from(&b);
        assert_eq!(a, b);
    }

    #[test]
    fn copy_from_different_size() {
        let mut a = Grid::new(3, 3);
        let b = Grid::new(5, 1);
        a.copy_from(&b);
        assert_eq!(a.size(), (5, 1));
    }

    // ── Shapes ──────────────────────────────────────────────────────────

    #[test]
    fn filled_rect_counts() {
        let mut grid = Grid::new(20, 20);
        grid.draw_rect(2, 3, 4, 5, true, Cell::new('#'));
        let drawn = grid.cells().iter().filter(|c| c.ch == '#').count();
        assert_eq!(drawn, 20);
    }

    #[test]
    fn outline_rect_counts() {
        let mut grid = Grid::new(20, 20);
        grid.draw_rect(2, 3, 4, 5, false, Cell::new('#'));
        let drawn = grid.cells().iter().filter(|c| c.ch == '#').count();
        assert_eq!(drawn, 2 * 4 + 2 * 5 - 4);
        assert_eq!(grid.get(3, 4), Some(&Cell::EMPTY));
    }

    #[test]
    fn rect_partially_off_grid() {
        let mut grid = Grid::new(4, 4);
        grid.draw_rect(-2, -2, 4, 4, true, Cell::new('#'));
        let drawn = grid.cells().iter().filter(|c| c.ch == '#').count();
        assert_eq!(drawn, 4);
    }

    #[test]
    fn border_around_grid() {
        let (w, h) = (8u16, 5u16);
        let mut grid = Grid::new(w, h);
        grid.draw_rect(0, 0, i32::from(w), i32::from(h), false, Cell::new('!'));
        assert_eq!(grid.get(0, 0).unwrap().ch, '!');
        assert_eq!(grid.get(7, 4).unwrap().ch, '!');
        assert_eq!(grid.get(3, 2).unwrap().ch, ' ');
    }

    #[test]
    fn line_leaving_grid() {
        let mut grid = Grid::new(10, 10);
        grid.draw_line(5, 5, 50, 50, Cell::new('-'));
        let drawn = grid.cells().iter().filter(|c| c.ch == '-').count();
        assert_eq!(drawn, 5); // (5,5)..=(9,9)
    }

    #[test]
    fn line_to_far_endpoint_is_clipped() {
        let mut grid = Grid::new(10, 10);
        grid.draw_line(0, 0, 400_000_000, 0, Cell::new('-'));
        grid.draw_line(i32::MIN, 5, i32::MAX, 5, Cell::new('='));
        grid.draw_line(i32::MIN, i32::MIN, i32::MAX, i32::MAX, Cell::new('\\'));

        let count = |y: u16, ch: char| grid.row(y).unwrap().iter().filter(|c| c.ch == ch).count();
        assert_eq!(count(0, '-'), 9); // (0,0) is taken by the diagonal
        assert_eq!(count(5, '='), 9); // so is (5,5)
        for i in 0..10 {
            assert_eq!(grid.get(i, i).unwrap().ch, '\\');
        }
    }

    #[test]
    fn text_is_clipped() {
        let mut grid = Grid::new(5, 1);
        let style = Style::NONE.fg(Color::Cyan);
        grid.draw_text(2, 0, "hello", style);
        assert_eq!(grid.get(2, 0), Some(&Cell::styled('h', style)));
        assert_eq!(grid.get(4, 0), Some(&Cell::styled('l', style)));
    }

    #[test]
    fn text_starting_left_of_grid() {
        let mut grid = Grid::new(3, 1);
        grid.draw_text(-2, 0, "abcd", Style::NONE);
        assert_eq!(grid.get(0, 0).unwrap().ch, 'c');
        assert_eq!(grid.get(1, 0).unwrap().ch, 'd');
    }

    proptest! {
        #[test]
        fn prop_out_of_bounds_draw_never_mutates(
            w in 1u16..40, h in 1u16..40,
            x in -100i32..100, y in -100i32..100,
        ) {
            let mut grid = Grid::new(w, h);
            let before = grid.clone();
            grid.draw(x, y, Cell::new('@'));
            let inside = x >= 0 && y >= 0 && x < i32::from(w) && y < i32::from(h);
            if inside {
                prop_assert_eq!(grid.get(x, y), Some(&Cell::new('@')));
            } else {
                prop_assert_eq!(grid, before);
            }
        }
    }
}
