// ============================================================================
// Écran de settings
// ============================================================================
// Champs : clé API, intervalle (minutes), cinq cases de symboles avec leur
// validité (· vide, 👍 valide, 👎 invalide). Intervalle et symboles ne sont
// proposés qu'une fois une clé saisie.
// ============================================================================

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, SettingsField};
use crate::models::{SymbolValidity, MAX_SYMBOLS};
use crate::ui::dashboard::{create_layout, render_header, status_line};

const HELP_TEXT: &str = "Symbols are validated against the list fetched from the API. \
Valid symbols show a thumbs up, invalid ones a thumbs down. Empty inputs are ignored.";

pub fn render_settings(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, chunks[0]);
    render_form(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Settings ");

    let form = &app.form;
    let mut lines = vec![
        Line::from(""),
        field_line(
            "API Key",
            &mask_key(&form.api_key_input),
            form.focus == SettingsField::ApiKey,
        ),
        Line::from(Span::styled(
            "   Get your free key at https://api-ninjas.com/  (Enter to apply)",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    if app.settings().has_api_key() {
        lines.push(Line::from(""));
        lines.push(field_line(
            "Refresh Interval (minutes)",
            &form.interval_input,
            form.focus == SettingsField::RefreshInterval,
        ));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Symbol Selection",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));

        if form.fetching_symbols {
            lines.push(Line::from(Span::styled(
                "Fetching symbols...",
                Style::default().fg(Color::Yellow),
            )));
        }

        for i in 0..MAX_SYMBOLS {
            lines.push(symbol_line(
                i,
                &form.symbol_inputs[i],
                form.validity[i],
                form.focus == SettingsField::Symbol(i),
            ));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(HELP_TEXT, Style::default().fg(Color::DarkGray))));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn field_line<'a>(label: &'a str, value: &str, focused: bool) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {:<28}", label), label_style(focused)),
        Span::styled(value.to_string(), Style::default().fg(Color::White)),
        cursor(focused),
    ])
}

fn symbol_line(index: usize, value: &str, validity: SymbolValidity, focused: bool) -> Line<'static> {
    let value_style = match validity {
        SymbolValidity::Empty => Style::default().fg(Color::Gray),
        SymbolValidity::Valid => Style::default().fg(Color::Green),
        SymbolValidity::Invalid => Style::default().fg(Color::Red),
    };

    Line::from(vec![
        Span::styled(format!("   Symbol {}  ", index + 1), label_style(focused)),
        Span::raw(format!("{} ", validity.icon())),
        Span::styled(format!("{:<10}", value), value_style),
        cursor(focused),
        Span::styled(format!("  {}", validity.label()), Style::default().fg(Color::DarkGray)),
    ])
}

fn label_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    }
}

fn cursor(focused: bool) -> Span<'static> {
    if focused {
        Span::styled("█", Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK))
    } else {
        Span::raw("")
    }
}

/// Masque la clé sauf ses 4 derniers caractères
fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 4 {
        return key.to_string();
    }
    let visible: String = key.chars().skip(count - 4).collect();
    format!("{}{}", "•".repeat(count - 4), visible)
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let help = Line::from(vec![
        Span::styled("[Tab/↓]", key),
        Span::raw(" Next  "),
        Span::styled("[Shift-Tab/↑]", key),
        Span::raw(" Previous  "),
        Span::styled("[Enter]", key),
        Span::raw(" Apply key  "),
        Span::styled("[ESC]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" Back"),
    ]);

    let paragraph = Paragraph::new(vec![status_line(app), help])
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, SettingsStore};
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("abc"), "abc");
        assert_eq!(mask_key("secret-key"), "••••••-key");
    }

    #[test]
    fn test_settings_screen_shows_validity() {
        let store = SettingsStore::open(Box::new(MemoryStore::new(Some(json!({
            "apiKey": "key",
            "symbols": ["btc"],
            "availableSymbols": { "symbols": ["BTC"] }
        })))));
        let mut app = App::new(store);
        app.open_settings();

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render_settings(frame, &app)).unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect();

        assert!(screen.contains("Refresh Interval"));
        assert!(screen.contains("Symbol 1"));
        assert!(screen.contains("Valid"));
        assert!(screen.contains("60"));
    }
}
