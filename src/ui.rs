//! UI rendering helpers for the terminal user interface.
//!
//! This module renders a `ViewModel` computed by the playback session using
//! `ratatui`. Nothing here decides anything about playback.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::App;
use crate::config::{ControlsSettings, UiSettings};
use crate::library::Playlist;
use crate::metadata::CoverArt;
use crate::player::{PlaybackState, ViewModel};

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("gg/G".to_string(), "top/bottom".to_string());
    map.insert("enter".to_string(), "play selected".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("h/l".to_string(), "prev/next".to_string());
    // H/L and +/- are filled dynamically from config.
    map.insert("m".to_string(), "mute".to_string());
    map.insert("K".to_string(), "file info".to_string());
    map.insert("R".to_string(), "reselect".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Render the controls help text, incorporating scrub seconds and volume step.
fn controls_text(controls: &ControlsSettings) -> String {
    let order = [
        "j/k", "h/l", "H/L", "+/-", "enter", "space/p", "m", "gg/G", "K", "R", "q",
    ];
    order
        .iter()
        .filter_map(|k| match *k {
            "H/L" => Some(format!("[H/L] scrub -/+{}s", controls.scrub_seconds)),
            "+/-" => Some(format!(
                "[+/-] volume +/-{:.0}%",
                controls.volume_step * 100.0
            )),
            _ => CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v)),
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

fn state_text(state: &PlaybackState) -> &'static str {
    match state {
        PlaybackState::Idle => "Idle",
        PlaybackState::Loading => "Loading",
        PlaybackState::ReadyPaused => "Ready",
        PlaybackState::ReadyAutoplayPending => "Starting",
        PlaybackState::Playing => "Playing",
        PlaybackState::Paused => "Paused",
        PlaybackState::Error(_) => "Error",
    }
}

/// Terminals can't show the picture itself; describe it instead.
fn art_text(art: &CoverArt) -> String {
    let kib = art.size.div_ceil(1024);
    format!("[art] {} ({}, {} KiB)", art.alt, art.mime, kib)
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn left_padded(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Render the entire UI into the provided `frame`.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    playlist: &Playlist,
    view: &ViewModel,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" playdeck ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Now playing
    {
        let icon = if view.is_playing { "▶" } else { "⏸" };
        let mut lines = vec![
            Line::from(vec![
                Span::raw(format!("{icon} ")),
                Span::raw(view.title.as_str()).bold(),
            ]),
            Line::from(view.credits.as_str()),
        ];
        if let Some(art) = &view.art {
            lines.push(Line::from(art_text(art)).italic());
        }

        let mut status = vec![
            state_text(&view.state).to_string(),
            format!("SINK: {}", view.sink.name()),
        ];
        if app.follow_playback {
            status.push("CURSOR: Follow".to_string());
        } else {
            status.push("CURSOR: Free-roam".to_string());
        }
        lines.push(Line::from(status.join(" • ")).dim());

        let style = if view.state.is_error() {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        let now_playing = Paragraph::new(lines)
            .style(style)
            .block(left_padded(" now playing "))
            .wrap(Wrap { trim: true });
        frame.render_widget(now_playing, chunks[1]);
    }

    // Progress and volume
    {
        let row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
            .split(chunks[2]);

        let progress = Gauge::default()
            .block(Block::bordered().title(" progress "))
            .gauge_style(Style::default().fg(Color::Cyan))
            .percent(view.progress_percent.round() as u16)
            .label(format!("{} / {}", view.elapsed_text, view.total_text));
        frame.render_widget(progress, row[0]);

        let volume_label = if view.muted {
            "muted".to_string()
        } else {
            format!("{:.0}%", view.volume_percent)
        };
        let volume = Gauge::default()
            .block(Block::bordered().title(" volume "))
            .gauge_style(Style::default().fg(Color::Green))
            .percent(if view.muted {
                0
            } else {
                view.volume_percent.round() as u16
            })
            .label(volume_label);
        frame.render_widget(volume, row[1]);
    }

    // Playlist
    {
        // Only build ListItems for the visible window around the cursor.
        let total = playlist.len();
        let list_height = chunks[3].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = playlist
            .iter()
            .enumerate()
            .skip(start)
            .take(end - start)
            .map(|(i, file)| {
                if view.highlight == Some(i) {
                    ListItem::new(format!("♪ {}", file.name)).style(Style::default().bold())
                } else {
                    ListItem::new(format!("  {}", file.name))
                }
            })
            .collect();

        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(" playlist "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[3], &mut state);
    }

    // File info popup over the playlist.
    if app.info_window {
        let popup_area = centered_rect_sized(72, 8, chunks[3]);
        frame.render_widget(Clear, popup_area);

        let info = match playlist.get(app.selected) {
            Some(file) => format!(
                "Name: {}\nType: {}\nSink: {}\nPath: {}",
                file.name,
                file.media_type.as_deref().unwrap_or("-"),
                crate::player::select_sink(file).name(),
                file.path.display()
            ),
            None => "No file selected".to_string(),
        };
        let info_paragraph = Paragraph::new(info)
            .block(left_padded(" file info (K closes) "))
            .wrap(Wrap { trim: true });
        frame.render_widget(info_paragraph, popup_area);
    }

    let footer = Paragraph::new(controls_text(controls_settings))
        .block(left_padded(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controls_text_uses_configured_steps() {
        let controls = ControlsSettings {
            scrub_seconds: 10,
            volume_step: 0.1,
        };
        let text = controls_text(&controls);
        assert!(text.contains("[H/L] scrub -/+10s"));
        assert!(text.contains("[+/-] volume +/-10%"));
        assert!(text.starts_with("[j/k] up/down"));
    }

    #[test]
    fn art_is_described_not_drawn() {
        let art = CoverArt {
            data_url: String::new(),
            mime: "image/jpeg".into(),
            alt: "Live".into(),
            size: 1500,
        };
        assert_eq!(art_text(&art), "[art] Live (image/jpeg, 2 KiB)");
    }
}
