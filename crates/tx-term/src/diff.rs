// SPDX-License-Identifier: MIT
//
// Differential renderer — write only what changed.
//
// The renderer owns the committed grid: a cell-for-cell record of what the
// terminal is showing right now. Each frame, the application's pending grid
// is compared against it in row-major order. For every cell that differs we
// emit a cursor move and the cell, then copy the cell forward into the
// committed grid. Cells that match cost nothing.
//
// The pipeline per frame:
//
//   1. Application paints the pending Grid.
//   2. DiffRenderer.render() diffs pending against committed into OutputBuffer.
//   3. DiffRenderer.flush_to() writes the whole frame in one call.
//
// A frame where nothing changed produces an empty buffer, and flushing an
// empty buffer does not touch the output stream at all. That property is
// the reason this module exists.
//
// Optimizations:
//
//   - Row-level skip: unchanged rows are detected with one slice compare.
//   - Copy-forward per changed cell: no second pass, no allocation in
//     steady state.

use std::io::{self, Write};

use crate::grid::Grid;
use crate::output::OutputBuffer;

// ─── RenderStats ─────────────────────────────────────────────────────────────

/// Statistics from a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Cells that differed from the committed frame and were written.
    pub cells_rendered: usize,
    /// Cells that matched and were skipped.
    pub cells_skipped: usize,
    /// Total bytes of ANSI output generated.
    pub bytes_written: usize,
}

impl RenderStats {
    #[inline]
    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.cells_rendered + self.cells_skipped
    }
}

// ─── DiffRenderer ────────────────────────────────────────────────────────────

/// Differential renderer holding the committed frame.
///
/// # Usage
///
/// ```
/// use tx_term::cell::Cell;
/// use tx_term::diff::DiffRenderer;
/// use tx_term::grid::Grid;
///
/// let mut renderer = DiffRenderer::new(80, 24);
/// let mut pending = Grid::new(80, 24);
/// pending.draw(3, 1, Cell::new('@'));
///
/// let stats = renderer.render(&pending);
/// assert_eq!(stats.cells_rendered, 1);
/// assert_eq!(renderer.output_bytes(), b"\x1b[2;4H@");
///
/// let mut out = Vec::new();
/// renderer.flush_to(&mut out).unwrap();
/// assert_eq!(renderer.render(&pending).cells_rendered, 0);
/// ```
pub struct DiffRenderer {
    committed: Grid,
    output: OutputBuffer,
    full_redraw: bool,
}

impl DiffRenderer {
    /// A renderer whose committed frame is all blank cells.
    ///
    /// That matches a terminal whose screen was just cleared.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            committed: Grid::new(width, height),
            output: OutputBuffer::new(),
            full_redraw: false,
        }
    }

    /// What the terminal is believed to be showing.
    #[inline]
    #[must_use]
    pub const fn committed(&self) -> &Grid {
        &self.committed
    }

    /// Diff `pending` against the committed frame and queue the output.
    ///
    /// Output accumulates until [`flush_to`](Self::flush_to). A pending grid
    /// of a different size than the committed one redraws every cell and
    /// adopts the new size.
    pub fn render(&mut self, pending: &Grid) -> RenderStats {
        let mut stats = RenderStats::default();
        let start_len = self.output.len();

        let full = self.full_redraw || pending.size() != self.committed.size();
        if full {
            self.committed = Grid::new(pending.width(), pending.height());
        }

        for y in 0..pending.height() {
            let (Some(next), Some(prev)) = (pending.row(y), self.committed.row(y)) else {
                continue;
            };

            if !full && next == prev {
                stats.cells_skipped += next.len();
                continue;
            }

            for x in 0..pending.width() {
                let (cx, cy) = (i32::from(x), i32::from(y));
                let (Some(&cell), Some(&old)) = (pending.get(cx, cy), self.committed.get(cx, cy))
                else {
                    continue;
                };

                if full || cell != old {
                    self.output.push_cell(x, y, &cell);
                    self.committed.draw(cx, cy, cell);
                    stats.cells_rendered += 1;
                } else {
                    stats.cells_skipped += 1;
                }
            }
        }

        self.full_redraw = false;
        stats.bytes_written = self.output.len() - start_len;

        tracing::trace!(
            rendered = stats.cells_rendered,
            skipped = stats.cells_skipped,
            bytes = stats.bytes_written,
            "render pass"
        );

        stats
    }

    /// Bytes queued since the last flush (for tests and debugging).
    #[must_use]
    pub fn output_bytes(&self) -> &[u8] {
        self.output.as_bytes()
    }

    /// Write queued output to `w` in one call.
    ///
    /// If the write fails, the committed frame already holds cells that may
    /// never have reached the terminal, so the next render repaints
    /// everything.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        let result = self.output.flush_to(w);
        if result.is_err() {
            self.full_redraw = true;
        }
        result
    }

    /// Make the next render write every cell.
    ///
    /// For when the terminal content was disturbed behind our back and the
    /// committed frame can no longer be trusted.
    pub fn force_redraw(&mut self) {
        self.full_redraw = true;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Attr, Cell, Color, Style};
    use pretty_assertions::assert_eq;

    /// Render and drain, returning (stats, output).
    fn render_frame(renderer: &mut DiffRenderer, frame: &Grid) -> (RenderStats, String) {
        let stats = renderer.render(frame);
        let output = String::from_utf8(renderer.output_bytes().to_vec()).unwrap();
        let mut sink = Vec::new();
        renderer.flush_to(&mut sink).unwrap();
        (stats, output)
    }

    // ── Blank Start ─────────────────────────────────────────────────────

    #[test]
    fn blank_frame_over_blank_screen_is_free() {
        let mut renderer = DiffRenderer::new(10, 5);
        let frame = Grid::new(10, 5);

        let (stats, output) = render_frame(&mut renderer, &frame);

        assert_eq!(stats.cells_rendered, 0);
        assert_eq!(stats.cells_skipped, 50);
        assert_eq!(output, "");
    }

    // ── Identical Frames ────────────────────────────────────────────────

    #[test]
    fn identical_frames_emit_nothing() {
        let mut renderer = DiffRenderer::new(10, 5);
        let mut frame = Grid::new(10, 5);
        frame.draw_rect(0, 0, 10, 5, true, Cell::new('.'));

        let (first, _) = render_frame(&mut renderer, &frame);
        assert_eq!(first.cells_rendered, 50);

        let (second, output) = render_frame(&mut renderer, &frame);
        assert_eq!(second.cells_rendered, 0);
        assert_eq!(second.bytes_written, 0);
        assert_eq!(output, "");
    }

    #[test]
    fn committed_matches_pending_after_render() {
        let mut renderer = DiffRenderer::new(6, 3);
        let mut frame = Grid::new(6, 3);
        frame.draw_line(0, 0, 5, 2, Cell::new('/'));

        renderer.render(&frame);

        assert_eq!(renderer.committed(), &frame);
    }

    #[test]
    fn clear_and_redraw_same_content_is_free() {
        let mut renderer = DiffRenderer::new(8, 8);
        let mut frame = Grid::new(8, 8);
        frame.draw_rect(1, 1, 4, 4, false, Cell::new('+'));
        render_frame(&mut renderer, &frame);

        frame.clear();
        frame.draw_rect(1, 1, 4, 4, false, Cell::new('+'));
        let (stats, output) = render_frame(&mut renderer, &frame);

        assert_eq!(stats.cells_rendered, 0);
        assert_eq!(output, "");
    }

    // ── Single Cell Change ──────────────────────────────────────────────

    #[test]
    fn single_cell_exact_output() {
        let mut renderer = DiffRenderer::new(10, 5);
        let mut frame = Grid::new(10, 5);
        frame.draw(7, 4, Cell::new('Z'));

        let (stats, output) = render_frame(&mut renderer, &frame);

        assert_eq!(stats.cells_rendered, 1);
        assert_eq!(stats.cells_skipped, 49);
        assert_eq!(output, "\x1b[5;8HZ");
    }

    #[test]
    fn row_major_order() {
        let mut renderer = DiffRenderer::new(4, 3);
        let mut frame = Grid::new(4, 3);
        frame.draw(3, 2, Cell::new('c'));
        frame.draw(0, 1, Cell::new('b'));
        frame.draw(2, 0, Cell::new('a'));

        let (_, output) = render_frame(&mut renderer, &frame);

        assert_eq!(output, "\x1b[1;3Ha\x1b[2;1Hb\x1b[3;4Hc");
    }

    #[test]
    fn reverting_a_cell_writes_a_blank() {
        let mut renderer = DiffRenderer::new(4, 1);
        let mut frame = Grid::new(4, 1);
        frame.draw(1, 0, Cell::new('x'));
        render_frame(&mut renderer, &frame);

        frame.clear();
        let (stats, output) = render_frame(&mut renderer, &frame);

        assert_eq!(stats.cells_rendered, 1);
        assert_eq!(output, "\x1b[1;2H ");
    }

    // ── Styles ──────────────────────────────────────────────────────────

    #[test]
    fn style_change_alone_is_a_change() {
        let mut renderer = DiffRenderer::new(2, 1);
        let mut frame = Grid::new(2, 1);
        frame.draw(0, 0, Cell::new('s'));
        render_frame(&mut renderer, &frame);

        let style = Style::NONE.fg(Color::Red).attrs(Attr::BOLD);
        frame.draw(0, 0, Cell::styled('s', style));
        let (stats, output) = render_frame(&mut renderer, &frame);

        assert_eq!(stats.cells_rendered, 1);
        assert_eq!(output, "\x1b[1;1H\x1b[1;31ms\x1b[0m");
    }

    #[test]
    fn styled_cells_do_not_leak() {
        let mut renderer = DiffRenderer::new(2, 1);
        let mut frame = Grid::new(2, 1);
        frame.draw(0, 0, Cell::styled('a', Style::NONE.bg(Color::Blue)));
        frame.draw(1, 0, Cell::new('b'));

        let (_, output) = render_frame(&mut renderer, &frame);

        assert_eq!(output, "\x1b[1;1H\x1b[44ma\x1b[0m\x1b[1;2Hb");
    }

    // ── Full Redraw ─────────────────────────────────────────────────────

    #[test]
    fn force_redraw_writes_everything_once() {
        let mut renderer = DiffRenderer::new(3, 2);
        let frame = Grid::new(3, 2);

        renderer.force_redraw();
        let (stats, _) = render_frame(&mut renderer, &frame);
        assert_eq!(stats.cells_rendered, 6);

        let (stats, _) = render_frame(&mut renderer, &frame);
        assert_eq!(stats.cells_rendered, 0);
    }

    #[test]
    fn size_mismatch_redraws_and_adopts_size() {
        let mut renderer = DiffRenderer::new(3, 2);
        let frame = Grid::new(4, 4);

        let (stats, _) = render_frame(&mut renderer, &frame);

        assert_eq!(stats.cells_rendered, 16);
        assert_eq!(renderer.committed().size(), (4, 4));
    }

    // ── Row Skip ────────────────────────────────────────────────────────

    #[test]
    fn unchanged_rows_are_skipped() {
        let mut renderer = DiffRenderer::new(100, 50);
        let mut frame = Grid::new(100, 50);
        frame.draw_line(0, 25, 99, 25, Cell::new('#'));

        let (stats, _) = render_frame(&mut renderer, &frame);

        assert_eq!(stats.cells_rendered, 100);
        assert_eq!(stats.cells_skipped, 4900);
        assert_eq!(stats.total_cells(), 5000);
    }

    // ── Flush ───────────────────────────────────────────────────────────

    #[test]
    fn flush_drains_output() {
        let mut renderer = DiffRenderer::new(2, 2);
        let mut frame = Grid::new(2, 2);
        frame.draw(1, 1, Cell::new('k'));
        renderer.render(&frame);

        let mut out = Vec::new();
        renderer.flush_to(&mut out).unwrap();

        assert_eq!(out, b"\x1b[2;2Hk");
        assert!(renderer.output_bytes().is_empty());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_flush_repaints_next_frame() {
        let mut renderer = DiffRenderer::new(3, 2);
        let mut frame = Grid::new(3, 2);
        frame.draw(2, 1, Cell::new('X'));

        renderer.render(&frame);
        assert!(renderer.flush_to(&mut BrokenPipe).is_err());

        // The lost cell must come back, along with everything else.
        let (stats, output) = render_frame(&mut renderer, &frame);
        assert_eq!(stats.cells_rendered, 6);
        assert!(output.contains("\x1b[2;3HX"));

        let (stats, output) = render_frame(&mut renderer, &frame);
        assert_eq!(stats.cells_rendered, 0);
        assert_eq!(output, "");
    }
}
