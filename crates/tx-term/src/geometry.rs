// SPDX-License-Identifier: MIT
//
// Rasterization — which cells does a shape cover?
//
// Pure functions over signed cell coordinates. Nothing here knows about the
// grid beyond an optional clip rectangle: shapes are computed in unbounded
// integer space and the grid silently drops whatever lands off-screen. A
// bouncing sprite that is half outside the window is the normal case, not
// an error.
//
// Lines use integer Bresenham. The rounding-vector approach (normalize the
// direction, step by one, round each coordinate) is tempting but can skip
// the far endpoint and does not trace the same cells in both directions.
// Bresenham with a canonical start point gives both guarantees for free.

// ─── Point ──────────────────────────────────────────────────────────────────

/// A cell position. Signed, because computed geometry leaves the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

// ─── Rect ───────────────────────────────────────────────────────────────────

/// An axis-aligned rectangle `[x, x + width) × [y, y + height)`.
///
/// Non-positive width or height means the rectangle is empty.
///
/// # Examples
///
/// ```
/// use tx_term::geometry::Rect;
///
/// let r = Rect::new(10, 5, 4, 3);
/// assert!(r.contains(10, 5));
/// assert!(r.contains(13, 7));
/// assert!(!r.contains(14, 5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a `width × height` grid from the origin.
    #[inline]
    #[must_use]
    pub fn of_grid(width: u16, height: u16) -> Self {
        Self::new(0, 0, i32::from(width), i32::from(height))
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> i32 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Overlap of two rectangles, or `None` if they don't touch.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x2 > x1 && y2 > y1 {
            Some(Self::new(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }

    /// Whether `(px, py)` lies on the one-cell border of this rectangle.
    #[inline]
    #[must_use]
    pub const fn on_border(self, px: i32, py: i32) -> bool {
        let dx = px - self.x;
        let dy = py - self.y;
        dx == 0 || dx == self.width - 1 || dy == 0 || dy == self.height - 1
    }

    /// Cells of this rectangle inside `clip`, in row-major order.
    ///
    /// With `filled = false` only the border is produced. The outline is
    /// always judged against the full rectangle, so clipping never invents
    /// a border along the clip edge.
    pub fn cells_within(self, clip: Self, filled: bool) -> impl Iterator<Item = Point> {
        let region = if self.is_empty() {
            None
        } else {
            self.intersect(clip)
        };

        region.into_iter().flat_map(move |r| {
            (r.y..r.bottom()).flat_map(move |y| {
                (r.x..r.right())
                    .filter(move |&x| filled || self.on_border(x, y))
                    .map(move |x| Point::new(x, y))
            })
        })
    }

    /// All cells of this rectangle, in row-major order.
    pub fn cells(self, filled: bool) -> impl Iterator<Item = Point> {
        self.cells_within(self, filled)
    }
}

// ─── Primitives ─────────────────────────────────────────────────────────────

/// The single cell at `(x, y)` if it falls inside a `width × height` grid.
#[must_use]
pub fn point_cells(x: i32, y: i32, width: u16, height: u16) -> Option<Point> {
    Rect::of_grid(width, height)
        .contains(x, y)
        .then_some(Point::new(x, y))
}

/// Cells covered by the rectangle at `(x, y)` of size `w × h`.
///
/// Filled: all `w * h` cells. Outline: only cells in the first/last column
/// or first/last row, each once. A one-wide or one-tall rectangle is its own
/// outline. Non-positive sizes produce nothing.
///
/// # Examples
///
/// ```
/// use tx_term::geometry::rect_cells;
///
/// assert_eq!(rect_cells(0, 0, 4, 3, true).len(), 12);
/// assert_eq!(rect_cells(0, 0, 4, 3, false).len(), 10);
/// ```
#[must_use]
pub fn rect_cells(x: i32, y: i32, w: i32, h: i32, filled: bool) -> Vec<Point> {
    Rect::new(x, y, w, h).cells(filled).collect()
}

/// Cells on the line from `(x0, y0)` to `(x1, y1)`, start to end.
///
/// Integer Bresenham over all octants. Both endpoints are included, every
/// step moves to one of the eight neighbours, and a zero-length line is a
/// single cell. The line is always traced from the lexicographically
/// smaller endpoint, so swapping the endpoints yields exactly the reversed
/// sequence.
///
/// # Examples
///
/// ```
/// use tx_term::geometry::{line_cells, Point};
///
/// let cells = line_cells(0, 0, 3, 1);
/// assert_eq!(cells.first(), Some(&Point::new(0, 0)));
/// assert_eq!(cells.last(), Some(&Point::new(3, 1)));
/// assert_eq!(cells.len(), 4);
/// ```
#[must_use]
pub fn line_cells(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point> {
    let start = Point::new(x0, y0);
    let end = Point::new(x1, y1);

    if end < start {
        let mut cells = bresenham(end, start);
        cells.reverse();
        cells
    } else {
        bresenham(start, end)
    }
}

// ─── Line ───────────────────────────────────────────────────────────────────

/// A Bresenham segment with random access to its cells.
///
/// Cell `i` is computed from the step index alone, so clipping a segment to
/// a small rectangle costs time in the visible cells plus a logarithmic
/// search, however far off-screen the endpoints are. The segment is held in
/// canonical direction (lexicographically smaller endpoint first), so it
/// covers exactly the cells of [`line_cells`].
///
/// ```
/// use tx_term::geometry::{Line, Point, Rect};
///
/// let line = Line::new(Point::new(0, 0), Point::new(400_000_000, 0));
/// assert_eq!(line.cells_within(Rect::of_grid(10, 10)).count(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    x0: i64,
    y0: i64,
    dx: i64,
    dy: i64,
    sx: i64,
    sy: i64,
}

impl Line {
    #[must_use]
    pub fn new(a: Point, b: Point) -> Self {
        let (from, to) = if b < a { (b, a) } else { (a, b) };
        let (x0, y0) = (i64::from(from.x), i64::from(from.y));
        let (x1, y1) = (i64::from(to.x), i64::from(to.y));
        Self {
            x0,
            y0,
            dx: (x1 - x0).abs(),
            dy: (y1 - y0).abs(),
            sx: if x0 < x1 { 1 } else { -1 },
            sy: if y0 < y1 { 1 } else { -1 },
        }
    }

    /// Steps from start to end. The segment has `steps() + 1` cells.
    #[inline]
    #[must_use]
    pub const fn steps(&self) -> i64 {
        if self.dx >= self.dy { self.dx } else { self.dy }
    }

    /// The cell after `i` steps, for `i` in `0..=steps()`.
    ///
    /// The major axis advances every step. The minor axis has advanced
    /// once for every `m` with `(2m + 1) * major < 2 * minor * i`, which is
    /// exactly where the error term of the iterative walk crosses over.
    #[allow(clippy::cast_possible_truncation)] // every cell lies between two i32 endpoints
    #[must_use]
    pub fn cell(&self, i: i64) -> Point {
        let (along_x, along_y) = if self.dx >= self.dy {
            (i, minor_steps(i, self.dx, self.dy))
        } else {
            (minor_steps(i, self.dy, self.dx), i)
        };
        Point::new(
            (self.x0 + self.sx * along_x) as i32,
            (self.y0 + self.sy * along_y) as i32,
        )
    }

    /// Cells of the segment inside `clip`, in walk order.
    ///
    /// Both coordinates move monotonically along the walk, so the visible
    /// part is one contiguous run of step indices, found by binary search.
    pub fn cells_within(self, clip: Rect) -> impl Iterator<Item = Point> {
        let visible = if clip.is_empty() {
            0..0
        } else {
            let (x_in, x_out) = self.axis_span(self.sx, clip.x, clip.right(), |p| p.x);
            let (y_in, y_out) = self.axis_span(self.sy, clip.y, clip.bottom(), |p| p.y);
            x_in.max(y_in)..x_out.min(y_out)
        };
        visible.map(move |i| self.cell(i))
    }

    /// First step inside `[lo, hi)` on one axis, and first step past it.
    fn axis_span(&self, sign: i64, lo: i32, hi: i32, coord: fn(Point) -> i32) -> (i64, i64) {
        if sign > 0 {
            (
                self.first_step(|p| coord(p) >= lo),
                self.first_step(|p| coord(p) >= hi),
            )
        } else {
            (
                self.first_step(|p| coord(p) < hi),
                self.first_step(|p| coord(p) < lo),
            )
        }
    }

    /// Smallest step whose cell satisfies `pred`, or `steps() + 1` if none.
    /// `pred` must be monotone along the walk.
    fn first_step(&self, pred: impl Fn(Point) -> bool) -> i64 {
        let (mut lo, mut hi) = (0, self.steps() + 1);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if pred(self.cell(mid)) {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        lo
    }
}

/// How far the minor axis has moved after `i` steps.
#[allow(clippy::cast_possible_truncation)] // bounded by `i`
fn minor_steps(i: i64, major: i64, minor: i64) -> i64 {
    let lead = 2 * i128::from(minor) * i128::from(i) - i128::from(major);
    if lead <= 0 {
        return 0;
    }
    let span = 2 * i128::from(major);
    ((lead + span - 1) / span) as i64
}

/// Bresenham's line walk. Arithmetic is widened to `i64` so lines between
/// extreme `i32` coordinates cannot overflow the error term.
#[allow(clippy::cast_possible_truncation)] // every visited coordinate lies between two i32 endpoints
fn bresenham(from: Point, to: Point) -> Vec<Point> {
    let (mut x, mut y) = (i64::from(from.x), i64::from(from.y));
    let (x1, y1) = (i64::from(to.x), i64::from(to.y));

    let dx = (x1 - x).abs();
    let dy = (y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    let len = usize::try_from(dx.max(dy)).map_or(0, |n| n.saturating_add(1));
    let mut cells = Vec::with_capacity(len);

    loop {
        cells.push(Point::new(x as i32, y as i32));

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }

    cells
}

// ─── Tests ───────────────────────────────────────────────────────────────────
