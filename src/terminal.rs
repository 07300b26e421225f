// SPDX-License-Identifier: GPL-3.0-only

//! Terminal rendering surface
//!
//! Draws the flow's container top to bottom: the two device lists and the
//! confirm button while selecting, then the live preview using Unicode
//! half-block characters for double vertical resolution.

use crate::backends::{CaptureStream, DeviceKind, MediaDevices, VideoFrame};
use crate::config::Config;
use crate::errors::AppResult;
use crate::flow::{
    CancelScope, CapturePreview, ConfirmButton, DeviceList, DeviceSelector, FlowController, Phase,
    Presentation, View, Viewport,
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Block, List, ListItem, ListState, Paragraph, Widget},
};
use std::io::{self, stdout};
use tracing::{error, info};

/// Run the interactive selection and preview flow
///
/// Devices are enumerated before the terminal switches to the alternate
/// screen, so an enumeration failure is reported on the normal console.
pub fn run<B: MediaDevices>(backend: B, config: &Config) -> AppResult<()> {
    let flow = pollster::block_on(FlowController::mount(backend, CancelScope::new()))?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, flow, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Keyboard focus while selecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Audio,
    Video,
    Confirm,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Audio => Focus::Video,
            Focus::Video => Focus::Confirm,
            Focus::Confirm => Focus::Audio,
        }
    }

    fn previous(self) -> Self {
        match self {
            Focus::Audio => Focus::Confirm,
            Focus::Video => Focus::Audio,
            Focus::Confirm => Focus::Video,
        }
    }

    fn kind(self) -> Option<DeviceKind> {
        match self {
            Focus::Audio => Some(DeviceKind::AudioInput),
            Focus::Video => Some(DeviceKind::VideoInput),
            Focus::Confirm => None,
        }
    }
}

fn run_app<B: MediaDevices>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut flow: FlowController<B>,
    config: &Config,
) -> AppResult<()> {
    let mut focus = Focus::Audio;
    let mut status_message: Option<String> = None;

    loop {
        flow.pump();
        if let Some(preview) = flow.container_mut().preview_mut() {
            preview.poll_frame();
        }

        terminal.draw(|f| draw(f, &flow, focus, status_message.as_deref()))?;

        if !event::poll(config.ui_poll_interval())? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // Ctrl+C or 'q' to quit
        if (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
            || key.code == KeyCode::Char('q')
        {
            break;
        }

        if flow.phase() != Phase::Selecting {
            continue;
        }

        match key.code {
            KeyCode::Tab => focus = focus.next(),
            KeyCode::BackTab => focus = focus.previous(),
            KeyCode::Up | KeyCode::Down => {
                let delta = if key.code == KeyCode::Up { -1 } else { 1 };
                if let (Some(kind), Some(selector)) =
                    (focus.kind(), flow.container().selector().cloned())
                {
                    selector.step(kind, delta);
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') if focus == Focus::Confirm => {
                status_message = Some("Starting preview...".to_string());
                terminal.draw(|f| draw(f, &flow, focus, status_message.as_deref()))?;

                match pollster::block_on(flow.confirm()) {
                    Ok(()) => {
                        info!("Preview mounted");
                        status_message = None;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to start preview");
                        status_message = Some(format!("Error: {}", e));
                    }
                }
            }
            KeyCode::Enter => focus = focus.next(),
            _ => {}
        }
    }

    Ok(())
}

fn draw<B: MediaDevices>(
    f: &mut Frame<'_>,
    flow: &FlowController<B>,
    focus: Focus,
    status_message: Option<&str>,
) {
    let area = f.area();
    let [content_area, status_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

    let children = flow.container().children();
    let constraints: Vec<Constraint> = children
        .iter()
        .map(|child| match child {
            View::Selector(selector) => Constraint::Length(selector_height(selector)),
            View::ConfirmButton(_) => Constraint::Length(1),
            View::Preview(_) => Constraint::Min(0),
        })
        .collect();
    let areas = Layout::vertical(constraints).split(content_area);

    for (child, child_area) in children.iter().zip(areas.iter()) {
        match child {
            View::Selector(selector) => draw_selector(f, *child_area, selector, focus),
            View::ConfirmButton(button) => {
                draw_confirm(f, *child_area, button, focus == Focus::Confirm)
            }
            View::Preview(preview) => f.render_widget(PreviewWidget { preview }, *child_area),
        }
    }

    let message = match status_message {
        Some(message) => message.to_string(),
        None => build_status_message(flow),
    };
    f.render_widget(StatusBar { message: &message }, status_area);
}

fn selector_height(selector: &DeviceSelector) -> u16 {
    let rows = selector.audio().options().len().max(selector.video().options().len());
    // Borders plus at least one row for the "(none)" placeholder
    (rows.max(1) as u16).saturating_add(2)
}

fn draw_selector(f: &mut Frame<'_>, area: Rect, selector: &DeviceSelector, focus: Focus) {
    let [audio_area, video_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
    draw_device_list(f, audio_area, " Audio ", &selector.audio(), focus == Focus::Audio);
    draw_device_list(f, video_area, " Video ", &selector.video(), focus == Focus::Video);
}

fn draw_device_list(f: &mut Frame<'_>, area: Rect, title: &str, list: &DeviceList, focused: bool) {
    let border_style = if focused {
        Style::new().fg(Color::Yellow)
    } else {
        Style::new().fg(Color::DarkGray)
    };
    let block = Block::bordered().title(title).border_style(border_style);

    if list.is_empty() {
        f.render_widget(Paragraph::new("(none)").dark_gray().block(block), area);
        return;
    }

    let items: Vec<ListItem> = list
        .options()
        .iter()
        .map(|d| ListItem::new(d.display_name().to_string()))
        .collect();
    let mut state = ListState::default().with_selected(list.current_index());
    let widget = List::new(items)
        .block(block)
        .highlight_symbol("> ")
        .highlight_style(Style::new().reversed());
    f.render_stateful_widget(widget, area, &mut state);
}

fn draw_confirm(f: &mut Frame<'_>, area: Rect, button: &ConfirmButton, focused: bool) {
    let text = format!("[ {} ]", button.label);
    let style = if focused {
        Style::new().black().on_yellow()
    } else {
        Style::new().white().on_dark_gray()
    };
    f.render_widget(Paragraph::new(text).style(style), area);
}

fn build_status_message<B: MediaDevices>(flow: &FlowController<B>) -> String {
    match flow.phase() {
        Phase::Selecting => {
            let selection = flow.selection();
            format!(
                "Tab focus | Up/Down change | Enter confirm | q quit | {} + {}",
                selection
                    .audio
                    .as_ref()
                    .map_or("no audio", |d| d.display_name()),
                selection
                    .video
                    .as_ref()
                    .map_or("no video", |d| d.display_name()),
            )
        }
        Phase::Previewing => {
            let frames = flow
                .container()
                .preview()
                .map_or(0, |preview| preview.frames_received());
            format!("Previewing | {} frames | q quit", frames)
        }
    }
}

/// Widget that renders the preview box and its current frame
struct PreviewWidget<'a, S> {
    preview: &'a CapturePreview<S>,
}

impl<S: CaptureStream> Widget for PreviewWidget<'_, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let presentation = self.preview.presentation();

        // Work in half-block pixels: one cell is two pixels tall
        let preview_box = presentation.preview_box(area.width as u32, area.height as u32 * 2);
        let picture = self
            .preview
            .frame()
            .map(|frame| presentation.letterbox(preview_box, frame.width, frame.height));

        let rows = preview_box.height.div_ceil(2);
        for ty in 0..rows {
            for tx in 0..preview_box.width {
                let term_x = area.x + (preview_box.x + tx) as u16;
                let term_y = area.y + (preview_box.y / 2 + ty) as u16;
                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let px = preview_box.x + tx;
                let py_top = preview_box.y + ty * 2;
                let top = pixel_color(presentation, self.preview.frame(), picture, px, py_top);
                let bottom =
                    pixel_color(presentation, self.preview.frame(), picture, px, py_top + 1);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }

        if self.preview.frame().is_none() {
            // No frame yet - show placeholder
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + (rows.min(area.height as u32) as u16) / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::new().white().on_black());
            }
        }
    }
}

fn pixel_color(
    presentation: &Presentation,
    frame: Option<&VideoFrame>,
    picture: Option<Viewport>,
    x: u32,
    y: u32,
) -> Color {
    let (r, g, b) = presentation.background;
    let background = Color::Rgb(r, g, b);

    let (Some(frame), Some(picture)) = (frame, picture) else {
        return background;
    };
    if picture.width == 0
        || picture.height == 0
        || x < picture.x
        || y < picture.y
        || x >= picture.x + picture.width
        || y >= picture.y + picture.height
    {
        return background;
    }

    let src_x = ((x - picture.x) as u64 * frame.width as u64 / picture.width as u64) as u32;
    let src_y = ((y - picture.y) as u64 * frame.height as u64 / picture.height as u64) as u32;
    let (r, g, b) = frame.pixel(src_x, src_y);
    Color::Rgb(r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::new().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::synthetic::SyntheticMediaDevices;

    #[test]
    fn test_focus_cycles_through_all_controls() {
        let mut focus = Focus::Audio;
        for _ in 0..3 {
            focus = focus.next();
        }
        assert_eq!(focus, Focus::Audio);
        assert_eq!(Focus::Audio.previous(), Focus::Confirm);
    }

    #[test]
    fn test_preview_widget_fills_box_black_without_frame() {
        let backend = SyntheticMediaDevices::new(1);
        let mut flow =
            pollster::block_on(FlowController::mount(backend, CancelScope::new())).unwrap();
        pollster::block_on(flow.confirm()).unwrap();
        let preview = flow.container().preview().unwrap();

        let area = Rect::new(0, 0, 32, 20);
        let mut buf = Buffer::empty(area);
        PreviewWidget { preview }.render(area, &mut buf);

        // 32 wide at 16:9 is 18 pixel rows, so 9 cell rows
        let cell = buf.cell((0, 0)).unwrap();
        assert_eq!(cell.fg, Color::Rgb(0, 0, 0));
        assert_eq!(buf.cell((0, 9)).unwrap().symbol(), " ");
    }

    #[test]
    fn test_preview_widget_draws_frame() {
        let backend = SyntheticMediaDevices::new(1);
        let mut flow =
            pollster::block_on(FlowController::mount(backend, CancelScope::new())).unwrap();
        pollster::block_on(flow.confirm()).unwrap();
        let preview = flow.container_mut().preview_mut().unwrap();
        assert!(preview.poll_frame());
        let preview = flow.container().preview().unwrap();

        let area = Rect::new(0, 0, 32, 20);
        let mut buf = Buffer::empty(area);
        PreviewWidget { preview }.render(area, &mut buf);

        // Leftmost synthetic bar is light gray
        assert_eq!(buf.cell((0, 0)).unwrap().fg, Color::Rgb(192, 192, 192));
        assert_eq!(buf.cell((0, 0)).unwrap().symbol(), "▀");
    }

    #[test]
    fn test_status_bar_truncates() {
        let area = Rect::new(0, 0, 5, 1);
        let mut buf = Buffer::empty(area);
        StatusBar {
            message: "abcdefgh",
        }
        .render(area, &mut buf);
        assert_eq!(buf.cell((4, 0)).unwrap().symbol(), "e");
    }
}
