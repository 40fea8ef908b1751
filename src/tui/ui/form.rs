//! Patient measurement entry form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{Field, PatientRecord, FEATURE_COUNT};
use crate::tui::styles::MedicalTheme;

/// Placeholder shown in an empty field, in feature order.
const FIELD_HINTS: [&str; FEATURE_COUNT] = [
    "count (min 0)",
    "mg/dL (max 1000)",
    "mmHg (max 140)",
    "mm (max 99)",
    "mu U/ml (max 1000)",
    "kg/m² (max 120.0)",
    "score, e.g. 0.472",
    "years (min 1)",
];

/// Fields the validator does not range-check; the form keeps them at or
/// above zero instead.
fn is_non_negative(field: Field) -> bool {
    matches!(field, Field::Pregnancies | Field::DiabetesPedigreeFunction)
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub field: Field,
    pub hint: &'static str,
    pub value: String,
}

impl FormField {
    fn new(field: Field, hint: &'static str) -> Self {
        Self {
            field,
            hint,
            value: String::new(),
        }
    }
}

/// Patient form state
pub struct PatientFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for PatientFormState {
    fn default() -> Self {
        Self {
            fields: Field::ALL
                .iter()
                .zip(FIELD_HINTS)
                .map(|(field, hint)| FormField::new(*field, hint))
                .collect(),
            selected_field: 0,
            error_message: None,
        }
    }
}

impl PatientFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field.
    ///
    /// Integer fields take digits and, unless the field is non-negative, a
    /// leading minus. Decimal fields also take a single point.
    pub fn input_char(&mut self, c: char) {
        let current = &mut self.fields[self.selected_field];
        let accepted = match c {
            '0'..='9' => true,
            '-' => current.value.is_empty() && !is_non_negative(current.field),
            '.' => !current.field.is_integer() && !current.value.contains('.'),
            _ => false,
        };
        if accepted {
            current.value.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        self.fields[self.selected_field].value.pop();
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        self.fields[self.selected_field].value.zeroize();
    }

    /// Wipe all field buffers and reset the cursor.
    pub fn clear_sensitive(&mut self) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Parse every field into a record.
    ///
    /// Each entry must be a finite number, and non-negative fields must not
    /// go below zero. Range checks belong to the validator.
    pub fn to_patient_record(&self) -> Result<PatientRecord, String> {
        let mut values = Vec::with_capacity(self.fields.len());

        for field in self.fields.iter() {
            let value = field
                .value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("{}: Invalid number", field.field))?;
            if is_non_negative(field.field) && value < 0.0 {
                return Err(format!("{}: Must not be negative", field.field));
            }
            values.push(value);
        }

        PatientRecord::from_features(&values)
    }

    /// Load sample data for testing (typical adult screening visit)
    pub fn load_sample_data(&mut self) {
        // Feature order: pregnancies, glucose (mg/dL), blood pressure
        // (mmHg), skin thickness (mm), insulin (mu U/ml), BMI, pedigree
        // function, age (years).
        let sample = ["1", "120", "70", "20", "80", "25.0", "0.500", "30"];
        for (field, val) in self.fields.iter_mut().zip(sample) {
            field.value = val.to_string();
        }
        self.error_message = None;
    }
}

/// Render the patient data input form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState, locked: bool) {
    let block = Block::default()
        .title(Span::styled(" Enter Patient Data ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Fields
            Constraint::Length(2), // Hints / error
        ])
        .split(inner);

    render_form_fields(f, chunks[0], state, locked);
    render_form_footer(f, chunks[1], state, locked);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState, locked: bool) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mid = (state.fields.len() + 1) / 2;
    let selected = if locked { None } else { Some(state.selected_field) };

    render_field_column(f, columns[0], &state.fields[..mid], 0, selected);
    render_field_column(f, columns[1], &state.fields[mid..], mid, selected);
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: Option<usize>,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = selected == Some(offset + i);
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.field), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value_display = if field.value.is_empty() {
            Span::styled(field.hint, MedicalTheme::text_muted())
        } else {
            Span::styled(field.value.as_str(), MedicalTheme::text())
        };

        let cursor = if is_selected {
            Span::styled("▌", Style::default().fg(MedicalTheme::PRIMARY_LIGHT))
        } else {
            Span::raw("")
        };

        let content = Paragraph::new(Line::from(vec![Span::raw(" "), value_display, cursor]))
            .block(block);

        f.render_widget(content, chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState, locked: bool) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.as_str(), MedicalTheme::danger()),
        ])
    } else if locked {
        Line::from(Span::styled(
            "Analyzing patient data...",
            MedicalTheme::text_muted(),
        ))
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Predict Diabetes ", MedicalTheme::key_desc()),
            Span::styled("[S] ", MedicalTheme::key_hint()),
            Span::styled("Sample ", MedicalTheme::key_desc()),
            Span::styled("[R] ", MedicalTheme::key_hint()),
            Span::styled("Reset ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(MedicalTheme::border()),
        );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(state: &mut PatientFormState, s: &str) {
        for c in s.chars() {
            state.input_char(c);
        }
    }

    #[test]
    fn test_sample_data_parses_to_record() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        let record = state.to_patient_record().expect("sample parses");
        assert_eq!(record.to_features(), [1.0, 120.0, 70.0, 20.0, 80.0, 25.0, 0.5, 30.0]);
    }

    #[test]
    fn test_integer_fields_reject_decimal_point() {
        let mut state = PatientFormState::default();
        state.selected_field = Field::Glucose.index();
        type_str(&mut state, "12.5");
        assert_eq!(state.fields[Field::Glucose.index()].value, "125");

        state.selected_field = Field::Bmi.index();
        type_str(&mut state, "33.6.1");
        assert_eq!(state.fields[Field::Bmi.index()].value, "33.61");
    }

    #[test]
    fn test_minus_only_leading() {
        let mut state = PatientFormState::default();
        state.selected_field = Field::Glucose.index();
        type_str(&mut state, "-3-");
        assert_eq!(state.fields[Field::Glucose.index()].value, "-3");
        type_str(&mut state, "abc");
        assert_eq!(state.fields[Field::Glucose.index()].value, "-3");
    }

    #[test]
    fn test_non_negative_fields_refuse_minus() {
        let mut state = PatientFormState::default();
        state.load_sample_data();

        for field in [Field::Pregnancies, Field::DiabetesPedigreeFunction] {
            state.selected_field = field.index();
            state.clear_field();
            type_str(&mut state, "-3");
            assert_eq!(state.fields[field.index()].value, "3");
        }

        let record = state.to_patient_record().expect("parses");
        assert!(record.pregnancies >= 0.0);
        assert!(record.diabetes_pedigree >= 0.0);
    }

    #[test]
    fn test_negative_values_rejected_on_parse() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        state.fields[Field::Pregnancies.index()].value = "-3".into();
        assert_eq!(
            state.to_patient_record().unwrap_err(),
            "Pregnancies: Must not be negative"
        );

        state.load_sample_data();
        state.fields[Field::DiabetesPedigreeFunction.index()].value = "-0.2".into();
        assert!(state.to_patient_record().is_err());
    }

    #[test]
    fn test_overflowing_input_is_invalid_number() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        state.selected_field = Field::Pregnancies.index();
        state.clear_field();
        type_str(&mut state, &"9".repeat(400));

        assert_eq!(
            state.to_patient_record().unwrap_err(),
            "Pregnancies: Invalid number"
        );
    }

    #[test]
    fn test_empty_field_is_reported_by_name() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        state.selected_field = Field::BloodPressure.index();
        state.clear_field();
        let err = state.to_patient_record().unwrap_err();
        assert_eq!(err, "Blood Pressure: Invalid number");
    }

    #[test]
    fn test_out_of_range_values_still_parse() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        state.fields[Field::Glucose.index()].value = "0".into();
        let record = state.to_patient_record().expect("parses");
        assert_eq!(record.glucose, 0.0);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut state = PatientFormState::default();
        state.prev_field();
        assert_eq!(state.selected_field, 7);
        state.next_field();
        assert_eq!(state.selected_field, 0);
    }

    #[test]
    fn test_clear_sensitive() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        state.selected_field = 4;
        state.error_message = Some("x".into());
        state.clear_sensitive();
        assert!(state.fields.iter().all(|f| f.value.is_empty()));
        assert_eq!(state.selected_field, 0);
        assert!(state.error_message.is_none());
    }
}
