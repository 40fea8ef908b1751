//! UI module: View components for the TUI.

pub mod form;
pub mod outcome;

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::MedicalTheme;

/// Credits line rendered on every frame.
pub const FOOTER_CREDITS: &str =
    "Designed and Developed By: Yahaya Joel Casmed, Agyarko Samuel Boakye, Coffie Jones";

pub fn render_header(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            "Diabetes Prediction System",
            MedicalTheme::header(),
        )),
        Line::from(Span::styled(
            "University of Mines and Technology",
            MedicalTheme::text_secondary(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    f.render_widget(p, area);
}

pub fn render_footer(f: &mut Frame, area: Rect) {
    let text = vec![Line::from(Span::styled(
        FOOTER_CREDITS,
        MedicalTheme::text_muted(),
    ))];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
