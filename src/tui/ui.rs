use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::core::error::AppError;
use crate::tui::app::{AppController, ApplicationState};
use crate::tui::component::Component;

/// Columns the error view is indented by.
const ERROR_INDENT: &str = "   ";

pub fn draw_ui(frame: &mut Frame, app: &mut AppController) {
    let area = frame.area();

    if let Some(err) = app.fatal_error() {
        draw_error_view(frame, area, err);
        return;
    }

    match app.state() {
        ApplicationState::ListActive => app.list_mut().render(frame, area),
        ApplicationState::DocumentActive => app.pager_mut().render(frame, area),
    }
}

/// Full-screen error. Only fatal errors get here, so any key exits.
fn draw_error_view(frame: &mut Frame, area: Rect, err: &AppError) {
    let lines = vec![
        Line::default(),
        Line::from(vec![
            Span::raw(ERROR_INDENT),
            Span::styled(
                " ERROR ",
                Style::default()
                    .fg(Color::White)
                    .bg(Color::Red)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::default(),
        Line::from(format!("{ERROR_INDENT}{err}")),
        Line::default(),
        Line::from(Span::styled(
            format!("{ERROR_INDENT}press any key to exit"),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}
