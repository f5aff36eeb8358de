// ============================================================================
// Dashboard - Rendu du panneau des prix
// ============================================================================
// Routage entre le panneau et l'écran de settings, puis rendu du panneau :
// une ligne par quote (symbole, prix, heure de mise à jour).
// ============================================================================

use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::{App, Screen};
use crate::models::PriceQuote;
use crate::ui::settings;

/// Dessine l'écran courant
pub fn render(frame: &mut Frame, app: &App) {
    match app.current_screen {
        Screen::Panel => render_panel(frame, app),
        Screen::Settings => settings::render_settings(frame, app),
    }
}

fn render_panel(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, chunks[0]);
    render_quotes(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);
}

/// Header / contenu / footer
pub(crate) fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(area)
        .to_vec()
}

pub(crate) fn render_header(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" CryptoPanel ")
        .title_alignment(Alignment::Center);

    let text = Line::from(Span::styled(
        "₿ Crypto prices",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ));

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Contenu : liste des quotes
// ============================================================================

fn render_quotes(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Crypto ");

    if !app.panel_open {
        render_placeholder(frame, block, area, "Panel closed: press [o] to open");
        return;
    }

    let quotes = app.visible_quotes();
    if quotes.is_empty() {
        let message = if !app.settings().has_api_key() {
            "No API key: press [s] to open settings"
        } else if app.is_fetching() {
            "Loading..."
        } else {
            "No data to display"
        };
        render_placeholder(frame, block, area, message);
        return;
    }

    let items: Vec<ListItem> = quotes
        .into_iter()
        .map(|quote| quote_item(app, quote))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Une quote : symbole coloré selon sa présence dans l'univers connu
fn quote_item<'a>(app: &App, quote: &PriceQuote) -> ListItem<'a> {
    let symbol_style = if app.settings().is_available(&quote.symbol) {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    };

    let price_style = if quote.has_price() {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::Gray)
    };

    ListItem::new(Line::from(vec![
        Span::styled(format!(" {:<8}", quote.symbol.to_uppercase()), symbol_style),
        Span::styled(format!("{:>16}", quote.price), price_style),
        Span::styled(
            format!("   Updated: {}", quote.formatted_timestamp()),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
}

fn render_placeholder(frame: &mut Frame, block: Block, area: Rect, message: &str) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Gray))),
    ];
    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Footer : statut + raccourcis
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Press ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " again to quit, any other key to cancel ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        Line::from(vec![
            Span::styled("[q]", key),
            Span::raw(" Quit  "),
            Span::styled("[r]", key),
            Span::raw(" Refresh  "),
            Span::styled("[o]", key),
            Span::raw(" Open  "),
            Span::styled("[c]", key),
            Span::raw(" Close  "),
            Span::styled("[s]", key),
            Span::raw(" Settings"),
        ])
    };

    let paragraph = Paragraph::new(vec![status_line(app), shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Ligne de statut : notification, sinon erreur, sinon état du refresh
pub(crate) fn status_line(app: &App) -> Line<'static> {
    if let Some(notice) = &app.notice {
        return Line::from(Span::styled(
            notice.message.clone(),
            Style::default().fg(Color::Green),
        ));
    }

    if let Some(error) = &app.last_error {
        return Line::from(Span::styled(
            format!("Last refresh failed: {}", error),
            Style::default().fg(Color::Red),
        ));
    }

    let minutes = app.settings().refresh_interval_minutes();
    let last = app
        .last_fetch()
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());
    let fetching = if app.is_fetching() { "  ⟳ fetching..." } else { "" };

    Line::from(Span::styled(
        format!("Every {} min · last fetch {}{}", minutes, last, fetching),
        Style::default().fg(Color::Gray),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, SettingsStore};
    use chrono::Utc;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 16)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app() -> App {
        let store = SettingsStore::open(Box::new(MemoryStore::new(Some(json!({
            "apiKey": "key",
            "symbols": ["btc"],
            "availableSymbols": { "symbols": ["BTC"] }
        })))));
        App::new(store)
    }

    #[test]
    fn test_panel_shows_quotes() {
        let mut app = app();
        app.open_panel(Utc::now());
        app.on_prices_loaded(
            vec![PriceQuote::new("btc".to_string(), "61234.5".to_string())],
            Utc::now(),
        );

        let screen = draw(&app);
        assert!(screen.contains("BTC"));
        assert!(screen.contains("61234.5"));
        assert!(screen.contains("Updated:"));
    }

    #[test]
    fn test_footer_rounds_sub_minute_interval_up() {
        let store = SettingsStore::open(Box::new(MemoryStore::new(Some(json!({
            "refreshInterval": 30
        })))));
        let app = App::new(store);

        let screen = draw(&app);
        assert!(screen.contains("Every 1 min"));
        assert!(!screen.contains("Every 0 min"));
    }

    #[test]
    fn test_panel_placeholder_without_data() {
        let mut app = app();
        let screen = draw(&app);
        assert!(screen.contains("Panel closed"));

        app.open_panel(Utc::now());
        app.on_prices_failed("offline".to_string(), Utc::now());
        let screen = draw(&app);
        assert!(screen.contains("No data to display"));
        assert!(screen.contains("Last refresh failed"));
    }
}
