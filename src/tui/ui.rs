use crate::tui::app::{App, Row, RowKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use runonserver::catalog::menu::DispatchTarget;
use runonserver::ops::probe::HostStatus;

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3), // Title
                Constraint::Min(0),    // Menu
                Constraint::Length(8), // Notices
                Constraint::Length(3), // Footer/Help
            ]
            .as_ref(),
        )
        .split(f.area());

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            " RunOnServer ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            app.catalog_path.display().to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_menu(f, app, chunks[1]);
    render_notices(f, app, chunks[2]);

    let help_text = "[Enter]Run  [P]rovision key  [R]eload  [↑/↓]Nav  [Q]uit";
    let help = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[3]);
}

fn status_span(status: HostStatus) -> Span<'static> {
    let color = match status {
        HostStatus::Online => Color::Green,
        HostStatus::Offline => Color::Red,
        HostStatus::Unknown => Color::DarkGray,
    };
    Span::styled(format!(" [{}]", status.label()), Style::default().fg(color))
}

fn row_line(app: &App, row: &Row) -> Line<'static> {
    let indent = "  ".repeat(row.depth as usize);
    match &row.kind {
        RowKind::Header(name) => Line::from(Span::styled(
            format!("{}▸ {}", indent, name),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )),
        RowKind::Server(server) => Line::from(vec![
            Span::styled(
                format!("{}🖥️  {}", indent, server.name),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                format!(" {}", server.destination()),
                Style::default().fg(Color::DarkGray),
            ),
            status_span(app.status_of(&server.host)),
        ]),
        RowKind::Entry(entry) => {
            let (marker, color) = match entry.target {
                DispatchTarget::Single(_) => ("•", Color::White),
                DispatchTarget::Category(_) => ("🌐", Color::Yellow),
                DispatchTarget::Global => ("🌍", Color::Yellow),
            };
            let hold = if entry.command.hold_terminal { " ⏸" } else { "" };
            Line::from(Span::styled(
                format!("{}{} {}{}", indent, marker, entry.label, hold),
                Style::default().fg(color),
            ))
        }
    }
}

fn render_menu(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Servers ")
        .border_style(Style::default().fg(Color::Cyan));

    if let Some(err) = &app.load_error {
        let msg = Paragraph::new(format!("Catalog could not be loaded:\n{}", err))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: false })
            .block(block);
        f.render_widget(msg, area);
        return;
    }

    if app.rows.is_empty() {
        let msg = Paragraph::new("No servers configured.\nAdd one with 'runonserver server add'.")
            .block(block);
        f.render_widget(msg, area);
        return;
    }

    let items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| ListItem::new(row_line(app, row)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    state.select(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_notices(f: &mut Frame, app: &App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .notices
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|n| Line::from(n.as_str()))
        .collect();

    let notices = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Activity "));
    f.render_widget(notices, area);
}
