use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use rand::seq::SliceRandom;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};
use rusqlite::Connection;

use crate::cli::copras_manager::CoprasManager;
use crate::cli::fishpond_manager::FishpondManager;
use crate::cli::log_manager::LogManager;
use crate::cli::rental_manager::RentalManager;
use crate::cli::status::load_summary;
use crate::db::open_default;
use crate::error::{HarvestError, Result};
use crate::fmt::number;
use crate::models::NetSplit;
use crate::reports::{area_summaries, AreaSummary, DashboardSummary};
use crate::settings::load_settings;
use crate::store::{self, CoprasFilter};
use crate::tui::{draw_chrome, money_span, title_line, PageAction, AMOUNT_POS_STYLE, FOOTER_STYLE};

const GREETINGS: &[&str] = &[
    "The coconuts are not going to count themselves.",
    "Let's see how the harvest is doing.",
    "Good day for drying copra.",
    "The pond says hello.",
    "Rent day is always around the corner.",
    "Back again? Good.",
    "Pull up a chair.",
    "Everything's in order. Mostly.",
    "Let's have a look at the books.",
    "Ah, there you are.",
];

const MENU_ITEMS: &[&str] = &[
    "Copra records",
    "Fishpond",
    "Rental",
    "Activity log",
    "Mango farm",
];

enum DashboardScreen {
    Home,
    Copras(CoprasManager),
    Fishpond(FishpondManager),
    Rental(RentalManager),
    Logs(LogManager),
    Mango,
}

struct Dashboard {
    screen: DashboardScreen,
    greeting: String,
    split: NetSplit,
    menu_selection: usize,
    summary: Option<DashboardSummary>,
    areas: Vec<AreaSummary>,
    status_message: Option<String>,
}

fn make_greeting(owner: &str) -> String {
    let mut rng = rand::thread_rng();
    let random_greeting = GREETINGS.choose(&mut rng).unwrap_or(&"Hello.");
    match owner.split_whitespace().next() {
        Some(first) => format!("Hello, {first}. {random_greeting}"),
        None => format!("Harvestbook: {random_greeting}"),
    }
}

impl Dashboard {
    fn new(owner: &str, split: NetSplit) -> Self {
        Self {
            screen: DashboardScreen::Home,
            greeting: make_greeting(owner),
            split,
            menu_selection: 0,
            summary: None,
            areas: Vec::new(),
            status_message: None,
        }
    }

    fn load_data(&mut self, conn: &Connection) -> Result<()> {
        self.summary = Some(load_summary(conn, self.split)?);
        let records = store::list_copras(conn, &CoprasFilter::default())?;
        self.areas = area_summaries(&records, self.split);
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        match &self.screen {
            DashboardScreen::Home => self.draw_home(frame),
            DashboardScreen::Copras(page) => page.draw(frame),
            DashboardScreen::Fishpond(page) => page.draw(frame),
            DashboardScreen::Rental(page) => page.draw(frame),
            DashboardScreen::Logs(page) => page.draw(frame),
            DashboardScreen::Mango => self.draw_mango(frame),
        }
    }

    fn draw_home(&self, frame: &mut Frame) {
        let content = draw_chrome(
            frame,
            &self.greeting,
            "Up/Down=navigate  Enter=select  r=refresh  q=quit",
            self.status_message.as_deref(),
        );

        let menu_rows = MENU_ITEMS.len() as u16 + 1;
        let [stats_area, sep, chart_area, sep2, menu_area] = Layout::vertical([
            Constraint::Length(6),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(menu_rows),
        ])
        .areas(content);

        let sep_line = "━".repeat(content.width as usize);
        let sep_widget = Paragraph::new(sep_line.as_str()).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(sep_widget.clone(), sep);
        frame.render_widget(sep_widget, sep2);

        if let Some(s) = &self.summary {
            let [left_area, right_area] =
                Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .areas(stats_area);

            let left = vec![
                Line::from(vec![Span::raw(" Copra Net        "), money_span(s.copras_net)]),
                Line::from(format!(" Copra Records    {}", number(s.copras_records as i64))),
                Line::from(format!(" Areas            {}", s.areas)),
                Line::from(format!(" Activity Entries {}", s.activity_logs)),
            ];
            frame.render_widget(Paragraph::new(left), left_area);

            let right = vec![
                Line::from(format!(" Ongoing Croppings   {}", s.ongoing_croppings)),
                Line::from(format!(" Completed Croppings {}", s.completed_croppings)),
                Line::from(format!(" Tenants             {}", s.tenants)),
                Line::from(format!(" Open Collections    {}", s.open_transactions)),
                Line::from(vec![
                    Span::raw(" Outstanding Rent    "),
                    money_span(-s.outstanding_rent),
                ]),
            ];
            frame.render_widget(Paragraph::new(right), right_area);
        }

        self.draw_area_chart(frame, chart_area);

        let [menu_title_area, menu_list_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(menu_area);
        frame.render_widget(
            Paragraph::new(Span::styled(
                " What would you like to do?",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            menu_title_area,
        );
        let lines: Vec<Line> = (0..MENU_ITEMS.len()).map(|i| self.menu_item_line(i)).collect();
        frame.render_widget(Paragraph::new(lines), menu_list_area);
    }

    /// Copra sales per area, in thousands.
    fn draw_area_chart(&self, frame: &mut Frame, area: Rect) {
        if self.areas.is_empty() {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::from(""),
                    Line::from(Span::styled(" No copra records yet.", FOOTER_STYLE)),
                ]),
                area,
            );
            return;
        }
        let bars: Vec<Bar> = self
            .areas
            .iter()
            .map(|a| {
                let thousands = (a.sales / 1000.0).max(0.0).round() as u64;
                Bar::default()
                    .value(thousands)
                    .text_value(format!("{thousands}k"))
                    .label(Line::from(a.name.clone()))
                    .style(AMOUNT_POS_STYLE)
            })
            .collect();

        let block = Block::default()
            .title(" Copra Sales by Area")
            .title_style(Style::default().add_modifier(Modifier::BOLD))
            .borders(Borders::NONE);
        let width = self
            .areas
            .iter()
            .map(|a| a.name.chars().count())
            .max()
            .unwrap_or(4)
            .clamp(4, 14) as u16;

        let chart = BarChart::default()
            .block(block)
            .bar_width(width)
            .bar_gap(2)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn draw_mango(&self, frame: &mut Frame) {
        let content = draw_chrome(frame, &self.greeting, "Esc=back  q=back", None);
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(""),
                title_line("Mango Farm"),
                Line::from(""),
                Line::from(Span::styled(
                    "   Nothing is tracked for the mango farm yet.",
                    FOOTER_STYLE,
                )),
            ]),
            content,
        );
    }

    fn menu_item_line(&self, i: usize) -> Line<'static> {
        let marker = if i == self.menu_selection { ">" } else { " " };
        let badge = match (i, &self.summary) {
            (1, Some(s)) => format!(" ({} ongoing)", s.ongoing_croppings),
            (2, Some(s)) if s.open_transactions > 0 => format!(" ({} open)", s.open_transactions),
            _ => String::new(),
        };
        let style = if i == self.menu_selection {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Line::from(Span::styled(
            format!(" {marker} {}{badge}", MENU_ITEMS[i]),
            style,
        ))
    }

    /// Returns true when the dashboard should quit.
    fn handle_home_key(&mut self, code: KeyCode, conn: &Connection) -> bool {
        self.status_message = None;
        match code {
            KeyCode::Up => self.menu_selection = self.menu_selection.saturating_sub(1),
            KeyCode::Down => {
                self.menu_selection = (self.menu_selection + 1).min(MENU_ITEMS.len() - 1);
            }
            KeyCode::Char('q') => return true,
            KeyCode::Char('r') => {
                if let Err(e) = self.load_data(conn) {
                    self.status_message = Some(format!("Refresh failed: {e}"));
                }
            }
            KeyCode::Enter => {
                self.screen = match self.menu_selection {
                    0 => DashboardScreen::Copras(CoprasManager::new(conn, &self.greeting, self.split)),
                    1 => DashboardScreen::Fishpond(FishpondManager::new(conn, &self.greeting)),
                    2 => DashboardScreen::Rental(RentalManager::new(conn, &self.greeting)),
                    3 => DashboardScreen::Logs(LogManager::new(conn, &self.greeting)),
                    _ => DashboardScreen::Mango,
                };
            }
            _ => {}
        }
        false
    }
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let conn = open_default()?;
    let mut dashboard = Dashboard::new(&settings.owner_name, settings.net_split);
    dashboard.load_data(&conn)?;

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    tracing::debug!("dashboard started");

    let exit: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| dashboard.draw(frame)) {
            break Err(HarvestError::from(e));
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break Ok(());
                }

                let action = match &mut dashboard.screen {
                    DashboardScreen::Home => {
                        if dashboard.handle_home_key(key.code, &conn) {
                            break Ok(());
                        }
                        PageAction::Continue
                    }
                    DashboardScreen::Copras(page) => page.handle_key(key.code, &conn),
                    DashboardScreen::Fishpond(page) => page.handle_key(key.code, &conn),
                    DashboardScreen::Rental(page) => page.handle_key(key.code, &conn),
                    DashboardScreen::Logs(page) => page.handle_key(key.code, &conn),
                    DashboardScreen::Mango => match key.code {
                        KeyCode::Esc | KeyCode::Char('q') => PageAction::Close,
                        _ => PageAction::Continue,
                    },
                };

                if let PageAction::Close = action {
                    dashboard.screen = DashboardScreen::Home;
                    if let Err(e) = dashboard.load_data(&conn) {
                        dashboard.status_message = Some(format!("Refresh failed: {e}"));
                    }
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn test_greeting_uses_first_name() {
        let greeting = make_greeting("Maria Santos");
        assert!(greeting.starts_with("Hello, Maria."));
        assert!(make_greeting("").starts_with("Harvestbook:"));
    }

    #[test]
    fn test_menu_enters_and_leaves_pages() {
        let (_dir, conn) = test_db();
        let mut d = Dashboard::new("", NetSplit::Full);
        d.load_data(&conn).unwrap();

        d.handle_home_key(KeyCode::Down, &conn);
        d.handle_home_key(KeyCode::Enter, &conn);
        assert!(matches!(d.screen, DashboardScreen::Fishpond(_)));

        d.screen = DashboardScreen::Home;
        for _ in 0..10 {
            d.handle_home_key(KeyCode::Down, &conn);
        }
        assert_eq!(d.menu_selection, MENU_ITEMS.len() - 1);
        d.handle_home_key(KeyCode::Enter, &conn);
        assert!(matches!(d.screen, DashboardScreen::Mango));
        assert!(d.handle_home_key(KeyCode::Char('q'), &conn));
    }

    #[test]
    fn test_load_data_summarises_areas() {
        let (_dir, conn) = test_db();
        let area = store::add_area(&conn, "North", 4).unwrap();
        store::insert_copras(
            &conn,
            &store::CoprasDraft {
                date: chrono::NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                area_id: area,
                farmer: "Ana".into(),
                sales: 2500.0,
                expenses: 500.0,
                weight: 0.0,
            },
        )
        .unwrap();
        let mut d = Dashboard::new("", NetSplit::Halved);
        d.load_data(&conn).unwrap();
        assert_eq!(d.areas.len(), 1);
        assert_eq!(d.summary.unwrap().copras_net, 1000.0);
    }
}
