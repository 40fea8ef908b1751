//! Outcome box view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::Prediction;
use crate::tui::styles::MedicalTheme;

/// Outcome box state
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OutcomeState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Cosmetic pause before the classifier runs
    Analyzing { progress: f64 },
    /// Completed with result
    Complete { prediction: Prediction },
}

/// Render the outcome box
pub fn render_outcome(f: &mut Frame, area: Rect, state: &OutcomeState) {
    match state {
        OutcomeState::Idle => render_idle(f, area),
        OutcomeState::Analyzing { progress } => render_progress(f, area, *progress),
        OutcomeState::Complete { prediction } => render_result(f, area, prediction),
    }
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Enter patient data and press Enter to predict",
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(outcome_block());

    f.render_widget(content, area);
}

fn render_progress(f: &mut Frame, area: Rect, progress: f64) {
    let block = outcome_block();
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(3), Constraint::Min(0)])
        .split(inner);

    let desc = Paragraph::new(Line::from(Span::styled(
        "Analyzing patient data...",
        MedicalTheme::focused(),
    )))
    .alignment(Alignment::Center);
    f.render_widget(desc, chunks[0]);

    let progress = progress.clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::info())
        .ratio(progress)
        .label(format!("{:.0}%", progress * 100.0));
    f.render_widget(gauge, chunks[1]);
}

fn render_result(f: &mut Frame, area: Rect, prediction: &Prediction) {
    let style = MedicalTheme::outcome(prediction.outcome);

    let content = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Prediction: ", MedicalTheme::text_secondary()),
            Span::styled(prediction.outcome.to_string().to_uppercase(), style),
        ]),
        Line::from(Span::styled(prediction.outcome.headline(), style)),
        Line::from(""),
        Line::from(vec![
            Span::styled("Confidence: ", MedicalTheme::text_secondary()),
            Span::styled(prediction.confidence_percent(), MedicalTheme::title()),
        ]),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(Span::styled(" Prediction Result ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(style),
    );

    f.render_widget(content, area);
}

fn outcome_block() -> Block<'static> {
    Block::default()
        .title(Span::styled(" Prediction Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border())
}
