use crate::hud::HudPanel;
use crate::memory::{VideoView, REGISTER_COUNT, VIDEO_HEIGHT, VIDEO_WIDTH};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::text::Spans;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders, Paragraph};
use tui::Terminal;

/// Something the renderer can paint filled squares on, in device pixels.
pub trait Surface {
    /// blank the whole surface
    fn clear(&mut self);

    /// paint one filled rectangle
    fn fill_rect(&mut self, rect: Rect);
}

/// Surface that just remembers what was painted since the last clear.
#[derive(Debug, Clone)]
pub struct DisplayList {
    width: u16,
    height: u16,
    rects: Vec<Rect>,
    clears: u64,
}

impl DisplayList {
    pub fn new(width: u16, height: u16) -> Self {
        DisplayList {
            width,
            height,
            rects: Vec::new(),
            clears: 0,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// how many times the surface has been wiped
    pub fn clears(&self) -> u64 {
        self.clears
    }

    /// is there an `s` by `s` square with its top left corner at (x, y)
    pub fn has_square(&self, x: u16, y: u16, s: u16) -> bool {
        self.rects.contains(&Rect::new(x, y, s, s))
    }
}

impl Surface for DisplayList {
    fn clear(&mut self) {
        self.rects.clear();
        self.clears += 1;
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.rects.push(rect);
    }
}

/// Paints the video buffer as `scale` x `scale` squares, one per lit pixel.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    scale: u16,
}

impl Renderer {
    pub fn new(scale: u16) -> Self {
        assert!(scale > 0, "pixel scale must be at least 1");
        assert!(
            scale as usize * VIDEO_WIDTH <= u16::MAX as usize,
            "pixel scale {} doesn't fit a u16 surface",
            scale
        );
        Renderer { scale }
    }

    pub fn scale(&self) -> u16 {
        self.scale
    }

    /// surface size needed for the whole 64x32 screen
    pub fn surface_size(&self) -> (u16, u16) {
        (
            VIDEO_WIDTH as u16 * self.scale,
            VIDEO_HEIGHT as u16 * self.scale,
        )
    }

    /// clear and repaint everything, but only on frames that asked for it.
    /// returns whether anything was drawn.
    pub fn render(&self, draw: bool, video: &VideoView, surface: &mut impl Surface) -> bool {
        if !draw {
            return false;
        }
        surface.clear();
        let s = self.scale;
        for (x, y) in video.lit_pixels() {
            surface.fill_rect(Rect::new(x as u16 * s, y as u16 * s, s, s));
        }
        true
    }
}

/// Display presents a finished frame somewhere a human can see it. It
/// should abstract the implementation details, so a variety of kinds of
/// screen would work.
pub trait Display {
    fn draw(&mut self, surface: &DisplayList, hud: &HudPanel) -> Result<(), io::Error>;
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct TermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TermDisplay {
    pub fn new() -> Result<TermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(TermDisplay { terminal })
    }
}

impl Display for TermDisplay {
    fn draw(&mut self, surface: &DisplayList, hud: &HudPanel) -> Result<(), io::Error> {
        // one terminal cell per chip8 pixel, whatever the surface scale
        let points: Vec<(f64, f64)> = surface
            .rects()
            .iter()
            .map(|r| {
                (
                    r.x as f64 + r.width as f64 / 2.0,
                    -(r.y as f64 + r.height as f64 / 2.0),
                )
            })
            .collect();
        let x_bounds = [0.0, surface.width() as f64];
        let y_bounds = [-(surface.height() as f64), 0.0];
        let lines: Vec<Spans> = std::iter::once(format!("PC  {:>5}", hud.pc()))
            .chain((0..REGISTER_COUNT).map(|i| format!("V{:X}  {:>5}", i, hud.register(i))))
            .map(Spans::from)
            .collect();

        self.terminal.draw(|f| {
            let area = f.size();
            let screen = Rect::new(
                0,
                0,
                2 + VIDEO_WIDTH as u16,
                2 + VIDEO_HEIGHT as u16,
            )
            .intersection(area);
            let panel = Rect::new(screen.width, 0, 14, 2 + 1 + REGISTER_COUNT as u16)
                .intersection(area);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(x_bounds)
                .y_bounds(y_bounds)
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &points,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, screen);

            let registers = Paragraph::new(lines.clone())
                .block(Block::default().title("regs").borders(Borders::ALL));
            f.render_widget(registers, panel);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines
#[derive(Debug, Default)]
pub struct DummyDisplay {
    frames: u64,
}

impl DummyDisplay {
    pub fn new() -> Self {
        DummyDisplay { frames: 0 }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Display for DummyDisplay {
    #[allow(unused)]
    fn draw(&mut self, surface: &DisplayList, hud: &HudPanel) -> Result<(), io::Error> {
        self.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;
    use crate::machine::{Chip8, DummyMachine};

    fn blank_chip8() -> Result<Chip8<DummyMachine>, DriverError> {
        Chip8::initialize(DummyMachine::blank(), 64, 32)
    }

    #[test]
    fn test_surface_size() {
        assert_eq!(Renderer::new(10).surface_size(), (640, 320));
        assert_eq!(Renderer::new(1).surface_size(), (64, 32));
    }

    #[test]
    #[should_panic]
    fn test_zero_scale_rejected() {
        let _ = Renderer::new(0);
    }

    #[test]
    #[should_panic]
    fn test_oversized_scale_rejected() {
        let _ = Renderer::new(2000);
    }

    #[test]
    fn test_largest_scale_paints_last_pixel() -> Result<(), DriverError> {
        let mut c = blank_chip8()?;
        c.machine_mut().poke_video(2047, 1);
        let r = Renderer::new(1023);
        let mut list = DisplayList::new(0, 0);
        assert!(r.render(true, &c.video()?, &mut list));
        assert!(list.has_square(63 * 1023, 31 * 1023, 1023));
        assert_eq!(r.surface_size(), (64 * 1023, 32 * 1023));
        Ok(())
    }

    #[test]
    fn test_no_draw_leaves_surface() -> Result<(), DriverError> {
        let mut c = blank_chip8()?;
        c.machine_mut().poke_video(0, 1);
        let r = Renderer::new(10);
        let mut list = DisplayList::new(640, 320);
        list.fill_rect(Rect::new(30, 30, 10, 10));
        assert!(!r.render(false, &c.video()?, &mut list));
        assert_eq!(list.clears(), 0);
        assert_eq!(list.rects(), &[Rect::new(30, 30, 10, 10)]);
        Ok(())
    }

    #[test]
    fn test_square_position() -> Result<(), DriverError> {
        let mut c = blank_chip8()?;
        c.machine_mut().poke_video(5 * 64 + 10, 1);
        let r = Renderer::new(10);
        let mut list = DisplayList::new(640, 320);
        assert!(r.render(true, &c.video()?, &mut list));
        assert_eq!(list.rects(), &[Rect::new(100, 50, 10, 10)]);
        assert!(list.has_square(100, 50, 10));
        Ok(())
    }

    #[test]
    fn test_clear_drops_old_squares() -> Result<(), DriverError> {
        let mut c = blank_chip8()?;
        let r = Renderer::new(4);
        let mut list = DisplayList::new(256, 128);
        c.machine_mut().poke_video(0, 1);
        r.render(true, &c.video()?, &mut list);
        c.machine_mut().poke_video(0, 0);
        c.machine_mut().poke_video(65, 1);
        r.render(true, &c.video()?, &mut list);
        assert!(!list.has_square(0, 0, 4));
        assert!(list.has_square(4, 4, 4));
        assert_eq!(list.clears(), 2);
        Ok(())
    }

    #[test]
    fn test_every_lit_pixel_painted() -> Result<(), DriverError> {
        let c = Chip8::initialize(DummyMachine::new(), 64, 32)?;
        let v = c.video()?;
        let r = Renderer::new(3);
        let mut list = DisplayList::new(192, 96);
        r.render(true, &v, &mut list);
        assert_eq!(list.rects().len(), v.lit_pixels().count());
        for i in 0..v.len() {
            let (x, y) = ((i % 64) as u16, (i / 64) as u16);
            assert_eq!(v.as_slice()[i] != 0, list.has_square(x * 3, y * 3, 3));
        }
        Ok(())
    }

    #[test]
    fn test_redraw_is_idempotent() -> Result<(), DriverError> {
        let c = Chip8::initialize(DummyMachine::new(), 64, 32)?;
        let r = Renderer::new(10);
        let mut list = DisplayList::new(640, 320);
        r.render(true, &c.video()?, &mut list);
        let first = list.rects().to_vec();
        r.render(true, &c.video()?, &mut list);
        assert_eq!(list.rects(), &first[..]);
        Ok(())
    }

    #[test]
    fn test_dummy_display_counts() -> Result<(), io::Error> {
        let mut d = DummyDisplay::new();
        d.draw(&DisplayList::new(64, 32), &HudPanel::new())?;
        assert_eq!(d.frames(), 1);
        Ok(())
    }
}
