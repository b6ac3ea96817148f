//! TUI rendering for the simulated keyboard
//!
//! Keys are placed on a cell grid by scaling layout units with
//! `unit_width` x `unit_height`. Rotated keys are drawn upright at their
//! rotated center; terminals cannot draw the tilt itself.

use crate::color::Rgb;
use crate::config::UiSettings;
use crate::error::{Error, Result};
use crate::keyboard::KeySimulator;
use crate::layout::{Grid, GridCoord, Key};
use crate::legend::LegendTable;
use crossterm::event::{
    DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Widget};
use std::io::{self, Stdout};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Switch to raw mode and the alternate screen with focus and mouse events
pub fn enter_terminal() -> Result<Tui> {
    enable_raw_mode().map_err(terminal_error)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange, EnableMouseCapture)
        .map_err(terminal_error)?;
    Terminal::new(CrosstermBackend::new(stdout)).map_err(terminal_error)
}

/// Restore the terminal left by [`enter_terminal`]
pub fn leave_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().map_err(terminal_error)?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableFocusChange,
        DisableMouseCapture
    )
    .map_err(terminal_error)?;
    terminal.show_cursor().map_err(terminal_error)
}

fn terminal_error(e: io::Error) -> Error {
    Error::Terminal(e.to_string())
}

/// Keyboard widget for rendering in ratatui
pub struct KeyboardWidget<'a, T: LegendTable> {
    simulator: &'a KeySimulator<T>,
    settings: &'a UiSettings,
    os_input: bool,
}

impl<'a, T: LegendTable> KeyboardWidget<'a, T> {
    pub fn new(simulator: &'a KeySimulator<T>, settings: &'a UiSettings) -> Self {
        Self {
            simulator,
            settings,
            os_input: false,
        }
    }

    /// Set whether OS keyboard input is active
    pub fn os_input(mut self, active: bool) -> Self {
        self.os_input = active;
        self
    }
}

impl<'a, T: LegendTable> Widget for KeyboardWidget<'a, T> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let sim = self.simulator;
        let case = sim.case_color();
        let body = sim.meta().background.unwrap_or_else(|| case.darken(0.5));

        let name = sim.meta().name.as_deref().unwrap_or("Keyboard");
        let input_mode = if self.os_input { "OS" } else { "Terminal" };
        let block = Block::default()
            .title(format!(" {} ({}) ", name, input_mode))
            .title_bottom(" Tab layout | F2 case | click keys | Esc quit ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(to_color(case.darken(0.3))))
            .style(Style::default().bg(to_color(body)));
        let inner = block.inner(area);
        block.render(area, buf);

        let keys_area = keys_area(inner, self.settings);
        for (coord, rect) in place_keys(
            sim.grid(),
            keys_area,
            self.settings.unit_width,
            self.settings.unit_height,
        ) {
            if let Some(key) = sim.grid().get(coord) {
                draw_key(buf, rect, key, body, self.settings);
            }
        }

        if self.settings.show_pressed_codes && inner.height > keys_area.height {
            let status = Rect {
                y: inner.y + inner.height - 1,
                height: 1,
                ..inner
            };
            let line = held_line(sim, self.settings.pressed_color);
            buf.set_line(status.x + 1, status.y, &line, status.width.saturating_sub(1));
        }
    }
}

/// Render the keyboard filling `area`
pub fn render_keyboard<T: LegendTable>(
    frame: &mut Frame,
    area: Rect,
    simulator: &KeySimulator<T>,
    settings: &UiSettings,
    os_input: bool,
) {
    frame.render_widget(KeyboardWidget::new(simulator, settings).os_input(os_input), area);
}

/// Area left for keys inside the widget border
pub fn keys_area(inner: Rect, settings: &UiSettings) -> Rect {
    if settings.show_pressed_codes {
        Rect {
            height: inner.height.saturating_sub(1),
            ..inner
        }
    } else {
        inner
    }
}

/// Screen rectangle of every key, centered in `area` and clipped to it.
///
/// Keys entirely outside `area` are left out, as are keys whose geometry
/// overflows to infinity.
pub fn place_keys(grid: &Grid, area: Rect, unit_width: u16, unit_height: u16) -> Vec<(GridCoord, Rect)> {
    let boxes: Vec<(GridCoord, [f64; 4])> = grid
        .keys()
        .map(|(coord, key)| (coord, upright_box(key)))
        .filter(|(_, b)| b.iter().all(|v| v.is_finite()) && (b[0] + b[2]).is_finite() && (b[1] + b[3]).is_finite())
        .collect();
    if boxes.is_empty() {
        return Vec::new();
    }

    let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
    let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
    for (_, [x, y, w, h]) in &boxes {
        min_x = min_x.min(*x);
        min_y = min_y.min(*y);
        max_x = max_x.max(x + w);
        max_y = max_y.max(y + h);
    }

    let uw = unit_width.max(1) as f64;
    let uh = unit_height.max(1) as f64;
    let total_w = cells(max_x - min_x, uw);
    let total_h = cells(max_y - min_y, uh);
    let left = area.x as i64 + ((area.width as i64 - total_w) / 2).max(0);
    let top = area.y as i64 + ((area.height as i64 - total_h) / 2).max(0);

    let mut placed = Vec::with_capacity(boxes.len());
    for (coord, [x, y, w, h]) in boxes {
        let x0 = left + cells(x - min_x, uw);
        let y0 = top + cells(y - min_y, uh);
        let x1 = left + cells(x + w - min_x, uw);
        let y1 = top + cells(y + h - min_y, uh);

        if let Some(rect) = clip(x0, y0, x1, y1, area) {
            placed.push((coord, rect));
        }
    }
    placed
}

/// Key drawn at screen cell (`column`, `row`), if any
pub fn hit_test(placed: &[(GridCoord, Rect)], column: u16, row: u16) -> Option<GridCoord> {
    // Later keys draw on top
    placed
        .iter()
        .rev()
        .find(|(_, r)| column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height)
        .map(|(coord, _)| *coord)
}

/// Axis-aligned box `[x, y, w, h]` centered on the key's rotated center
fn upright_box(key: &Key) -> [f64; 4] {
    let (cx, cy) = (key.x + key.width / 2.0, key.y + key.height / 2.0);
    let rot = key.rotation;
    let (cx, cy) = if rot.angle == 0.0 {
        (cx, cy)
    } else {
        let (sin, cos) = rot.angle.to_radians().sin_cos();
        let (dx, dy) = (cx - rot.origin_x, cy - rot.origin_y);
        (rot.origin_x + dx * cos - dy * sin, rot.origin_y + dx * sin + dy * cos)
    };
    [cx - key.width / 2.0, cy - key.height / 2.0, key.width, key.height]
}

/// Key units scaled to terminal cells, bounded to the `i32` range so that
/// offsets added to it cannot overflow
fn cells(units: f64, per_unit: f64) -> i64 {
    (units * per_unit).round().clamp(i32::MIN as f64, i32::MAX as f64) as i64
}

fn clip(x0: i64, y0: i64, x1: i64, y1: i64, area: Rect) -> Option<Rect> {
    let x0 = x0.max(area.x as i64);
    let y0 = y0.max(area.y as i64);
    let x1 = x1.min(area.x as i64 + area.width as i64);
    let y1 = y1.min(area.y as i64 + area.height as i64);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect::new(x0 as u16, y0 as u16, (x1 - x0) as u16, (y1 - y0) as u16))
}

fn draw_key(buf: &mut Buffer, rect: Rect, key: &Key, body: Rgb, settings: &UiSettings) {
    let colors = key.colors();

    if key.decal {
        let style = Style::default().fg(to_color(colors.text)).bg(to_color(body));
        write_legends(buf, rect, key, style, settings.show_sublegends);
        return;
    }

    let (keytop, text, border) = if key.is_pressed() {
        let top = settings.pressed_color;
        (top, top.contrast_text(), top.darken(0.3))
    } else {
        (colors.keytop, colors.text, colors.border)
    };

    let fill = Style::default().bg(to_color(keytop));
    buf.set_style(rect, fill);

    let mut text_style = fill.fg(to_color(text));
    if key.is_pressed() {
        text_style = text_style.add_modifier(Modifier::BOLD);
    }

    if rect.width >= 3 && rect.height >= 3 {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(fill.fg(to_color(border)));
        let inner = block.inner(rect);
        block.render(rect, buf);
        write_legends(buf, inner, key, text_style, settings.show_sublegends);
    } else {
        write_legends(buf, rect, key, text_style, settings.show_sublegends);
    }
}

fn write_legends(buf: &mut Buffer, area: Rect, key: &Key, style: Style, sublegends: bool) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let width = area.width as usize;
    buf.set_stringn(area.x, area.y, &key.legend, width, style);

    if sublegends && area.height >= 2 && !key.sublegend.is_empty() {
        let y = area.y + area.height - 1;
        buf.set_stringn(area.x, y, &key.sublegend, width, style.remove_modifier(Modifier::BOLD));
    }
}

/// "Held:" status line listing codes with their legends
fn held_line<T: LegendTable>(sim: &KeySimulator<T>, accent: Rgb) -> Line<'static> {
    let held = if sim.any_key_down() {
        sim.pressed_keys()
            .iter()
            .map(|&code| match sim.legends().legend_for(code) {
                Some(legend) => format!("{} ({})", legend, code),
                None => format!("? ({})", code),
            })
            .collect::<Vec<_>>()
            .join("  ")
    } else {
        "-".to_string()
    };

    Line::from(vec![
        Span::styled("Held: ", Style::default().fg(Color::DarkGray)),
        Span::styled(held, Style::default().fg(to_color(accent)).add_modifier(Modifier::BOLD)),
    ])
}

fn to_color(c: Rgb) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::parse;
    use crate::legend::{KeyCode, LegendMap};

    fn find_symbol(buf: &Buffer, symbol: &str) -> Vec<(u16, u16)> {
        buf.content()
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.symbol() == symbol)
            .map(|(i, _)| buf.pos_of(i))
            .collect()
    }

    fn bg_at(buf: &Buffer, x: u16, y: u16) -> Color {
        buf.content()[buf.index_of(x, y)].bg
    }

    #[test]
    fn test_place_keys_centers_and_scales() {
        let grid = parse(r#"["A",{w:2},"B"]"#).unwrap().grid;
        let placed = place_keys(&grid, Rect::new(0, 0, 40, 10), 4, 2);
        assert_eq!(
            placed,
            vec![
                (GridCoord::new(0, 0), Rect::new(14, 4, 4, 2)),
                (GridCoord::new(0, 1), Rect::new(18, 4, 8, 2)),
            ]
        );
    }

    #[test]
    fn test_place_keys_clips_to_area() {
        let grid = parse(r#"["A","B","C"]"#).unwrap().grid;
        let placed = place_keys(&grid, Rect::new(0, 0, 10, 3), 7, 3);
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[1].1, Rect::new(7, 0, 3, 3));
    }

    #[test]
    fn test_place_keys_huge_offset() {
        let grid = parse(r#"["A",{x:1e300},"B"]"#).unwrap().grid;
        let placed = place_keys(&grid, Rect::new(1, 1, 78, 20), 7, 3);
        assert_eq!(placed, vec![(GridCoord::new(0, 0), Rect::new(1, 9, 7, 3))]);

        // 1e308 + 1e308 overflows to infinity
        let grid = parse(r#"[{x:1e308},"A",{x:1e308},"B"]"#).unwrap().grid;
        let placed = place_keys(&grid, Rect::new(1, 1, 78, 20), 7, 3);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].0, GridCoord::new(0, 0));
    }

    #[test]
    fn test_render_survives_huge_offset() {
        let mut sim = KeySimulator::new(LegendMap::standard());
        sim.load_layout(r#"["Q",{x:1e300},"W"]"#).unwrap();
        let settings = UiSettings::default();
        let area = Rect::new(0, 0, 80, 12);
        let mut buf = Buffer::empty(area);
        KeyboardWidget::new(&sim, &settings).render(area, &mut buf);
        assert_eq!(find_symbol(&buf, "Q").len(), 1);
        assert!(find_symbol(&buf, "W").is_empty());
    }

    #[test]
    fn test_render_keyboard_into_frame() {
        let mut sim = KeySimulator::new(LegendMap::standard());
        sim.load_layout(r#"["Q","W"]"#).unwrap();
        let settings = UiSettings::default();
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(60, 10)).unwrap();
        terminal
            .draw(|frame| render_keyboard(frame, frame.area(), &sim, &settings, false))
            .unwrap();
        let buf = terminal.backend().buffer();
        assert_eq!(find_symbol(buf, "Q").len(), 1);
        assert_eq!(find_symbol(buf, "W").len(), 1);
    }

    #[test]
    fn test_rotated_key_stays_in_area() {
        let grid = parse(r#"[{r:90,rx:0,ry:0},"A"]"#).unwrap().grid;
        let area = Rect::new(0, 0, 20, 10);
        let placed = place_keys(&grid, area, 4, 2);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].1.width, 4);
        assert!(placed[0].1.x + placed[0].1.width <= area.width);
    }

    #[test]
    fn test_hit_test() {
        let grid = parse(r#"["A",{w:2},"B"]"#).unwrap().grid;
        let placed = place_keys(&grid, Rect::new(0, 0, 40, 10), 4, 2);
        assert_eq!(hit_test(&placed, 14, 4), Some(GridCoord::new(0, 0)));
        assert_eq!(hit_test(&placed, 25, 5), Some(GridCoord::new(0, 1)));
        assert_eq!(hit_test(&placed, 26, 5), None);
        assert_eq!(hit_test(&placed, 0, 0), None);
    }

    #[test]
    fn test_render_highlights_pressed_key() {
        let mut sim = KeySimulator::new(LegendMap::standard());
        sim.load_layout(r#"["Q","W"]"#).unwrap();
        sim.key_down(KeyCode(81));

        let settings = UiSettings {
            show_pressed_codes: false,
            ..UiSettings::default()
        };
        let area = Rect::new(0, 0, 40, 8);
        let mut buf = Buffer::empty(area);
        KeyboardWidget::new(&sim, &settings).render(area, &mut buf);

        let q = find_symbol(&buf, "Q");
        assert_eq!(q.len(), 1);
        assert_eq!(bg_at(&buf, q[0].0, q[0].1), to_color(settings.pressed_color));

        let w = find_symbol(&buf, "W");
        assert_eq!(w.len(), 1);
        assert_eq!(bg_at(&buf, w[0].0, w[0].1), to_color(sim.case_color()));
    }

    #[test]
    fn test_held_line_names_codes() {
        let mut sim = KeySimulator::new(LegendMap::standard());
        sim.load_layout(r#"["Q"]"#).unwrap();
        assert_eq!(held_line(&sim, Rgb::WHITE).spans[1].content, "-");

        sim.key_down(KeyCode(81));
        sim.key_down(KeyCode(999));
        assert_eq!(held_line(&sim, Rgb::WHITE).spans[1].content, "Q (81)  ? (999)");
    }
}
