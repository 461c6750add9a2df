use crate::session::Session;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

pub const VIEWPORT_ROWS: usize = 20;

const BG: Color = Color::Rgb(9, 15, 25);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);

// The plain-text table contract: fixed-width columns, newline-terminated,
// cursor and marks as one-character glyphs in a fixed prefix.
pub fn render_table(session: &Session) -> String {
    let view = session.view();
    let sort = session.sort();

    let headers: Vec<String> = view
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let mut name = column.clone();
            if let Some(sort) = sort
                && sort.column == index
            {
                name.push(if sort.ascending { '^' } else { 'v' });
            }
            if index == session.cursor_col() {
                format!("[{name}]")
            } else {
                name
            }
        })
        .collect();

    // Widths count chars, not bytes, so multibyte names pad like ASCII ones.
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in &view.rows {
        for (index, cell) in row.cells.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        " {}(ctx:{}) ro:{} sort:{} marks:{}\n",
        session.kind().title(),
        session.context(),
        if session.read_only() { "on" } else { "off" },
        sort.map(|s| {
            format!(
                "{}{}",
                view.columns[s.column],
                if s.ascending { "^" } else { "v" }
            )
        })
        .unwrap_or_else(|| "none".to_string()),
        session.marks().len(),
    ));

    out.push_str("   ");
    out.push_str(&pad_cells(&headers, &widths));
    out.push('\n');

    let (start, end) = viewport(view.rows.len(), session.cursor_row());
    for (index, row) in view.rows.iter().enumerate().take(end).skip(start) {
        let cursor = if index == session.cursor_row() { '>' } else { ' ' };
        let mark = if session.marks().contains(&row.id) {
            '*'
        } else {
            ' '
        };
        out.push(cursor);
        out.push(mark);
        out.push(' ');
        out.push_str(&pad_cells(&row.cells, &widths));
        out.push('\n');
    }

    if view.actions.is_empty() {
        out.push_str(" actions: none\n");
    } else {
        out.push_str(&format!(" actions: {}\n", view.actions.join(", ")));
    }
    out.push_str(
        " <j/k> move  <space> mark  <ctrl+space> range  </> filter  <!> action  <:> command  <:q> quit\n",
    );
    out
}

// Contiguous window of VIEWPORT_ROWS rows that always contains the cursor.
fn viewport(rows: usize, cursor: usize) -> (usize, usize) {
    if rows <= VIEWPORT_ROWS {
        return (0, rows);
    }
    let start = cursor
        .saturating_sub(VIEWPORT_ROWS / 2)
        .min(rows - VIEWPORT_ROWS);
    (start, start + VIEWPORT_ROWS)
}

fn pad_cells(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

pub fn render(frame: &mut Frame, session: &Session, input: &str, status: &str, in_prompt: bool) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let crumb = Line::from(vec![
        Span::styled(session.breadcrumb(), Style::default().fg(ACCENT)),
        Span::raw("  "),
        Span::styled(
            format!("filter:{}", session.filter()),
            Style::default().fg(MUTED),
        ),
    ]);
    frame.render_widget(Paragraph::new(crumb).style(Style::default().bg(BG)), root[0]);

    let table = Paragraph::new(render_table(session))
        .style(Style::default().bg(BG).fg(Color::White))
        .block(Block::default().borders(Borders::NONE));
    frame.render_widget(table, root[1]);

    let prompt = if in_prompt {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(ACCENT)),
            Span::raw(input.to_string()),
        ])
    } else {
        Line::from(Span::styled(
            "press : for commands, / to filter, ! for actions",
            Style::default().fg(MUTED),
        ))
    };
    frame.render_widget(Paragraph::new(prompt).style(Style::default().bg(BG)), root[2]);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(MUTED).add_modifier(Modifier::ITALIC),
        )))
        .style(Style::default().bg(BG)),
        root[3],
    );
}
