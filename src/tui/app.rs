//! Main TUI application state machine.
//!
//! Handles:
//! - Input event handling
//! - Form submission and validation feedback
//! - The cosmetic analysis pause before the classifier runs

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};

use crate::application::PredictionService;
use crate::domain::{validate, Assessment, PatientRecord};
use crate::ports::Classifier;

use super::ui::{
    form::{render_patient_form, PatientFormState},
    outcome::{render_outcome, OutcomeState},
    render_footer, render_header,
};

/// A validated record waiting out the analysis pause.
struct PendingAnalysis {
    record: PatientRecord,
    started_at: Instant,
}

/// Main application state
pub struct App<C>
where
    C: Classifier,
{
    /// Whether the app should quit
    should_quit: bool,

    /// Validation plus inference
    service: PredictionService<C>,

    /// Length of the "Analyzing patient data..." pause
    analysis_delay: Duration,

    /// Patient form state
    form_state: PatientFormState,

    /// Outcome box state
    outcome_state: OutcomeState,

    /// Submission in its analysis pause (if any)
    pending: Option<PendingAnalysis>,
}

impl<C> App<C>
where
    C: Classifier,
{
    /// Create the application around an already-loaded classifier.
    pub fn new(service: PredictionService<C>, analysis_delay: Duration) -> Self {
        Self {
            should_quit: false,
            service,
            analysis_delay,
            form_state: PatientFormState::default(),
            outcome_state: OutcomeState::default(),
            pending: None,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail or the classifier fails
    /// during a submission. The terminal is restored in both cases.
    pub fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main loop
        let result = self.main_loop(&mut terminal);

        // Patient values must not outlive the session.
        self.form_state.clear_sensitive();
        self.pending = None;

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.tick(Instant::now())?;

            terminal.draw(|f| self.draw(f))?;

            // Handle input (short poll to keep the progress bar moving)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers)?;
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Draw the whole page: header, form, outcome box and footer.
    fn draw(&self, f: &mut Frame) {
        let area = f.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Header
                Constraint::Length(16), // Form
                Constraint::Min(6),     // Outcome
                Constraint::Length(3),  // Footer
            ])
            .split(area);

        render_header(f, chunks[0]);
        render_patient_form(f, chunks[1], &self.form_state, self.pending.is_some());
        render_outcome(f, chunks[2], &self.outcome_state);
        render_footer(f, chunks[3]);
    }

    /// Advance the analysis pause; run the classifier once it has elapsed.
    fn tick(&mut self, now: Instant) -> Result<()> {
        let Some(pending) = &self.pending else {
            return Ok(());
        };

        let elapsed = now.saturating_duration_since(pending.started_at);
        if elapsed < self.analysis_delay {
            let progress = elapsed.as_secs_f64() / self.analysis_delay.as_secs_f64();
            self.outcome_state = OutcomeState::Analyzing { progress };
            return Ok(());
        }

        let record = pending.record;
        self.pending = None;
        self.run_analysis(&record)
    }

    fn run_analysis(&mut self, record: &PatientRecord) -> Result<()> {
        let assessment = self
            .service
            .assess(record)
            .context("Classifier failed during prediction")?;

        match assessment {
            Assessment::Predicted(prediction) => {
                self.outcome_state = OutcomeState::Complete { prediction };
            }
            Assessment::Rejected(violations) => {
                self.outcome_state = OutcomeState::Idle;
                self.form_state.error_message = Some(violations.message());
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        // Global quit handling
        if key == KeyCode::Esc
            || (key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL))
        {
            self.should_quit = true;
            return Ok(());
        }

        // The form is locked while a submission is being analyzed.
        if self.pending.is_some() {
            return Ok(());
        }

        match key {
            KeyCode::Up => {
                self.form_state.prev_field();
            }
            KeyCode::Down | KeyCode::Tab => {
                self.form_state.next_field();
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.form_state.load_sample_data();
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.form_state.clear_sensitive();
                self.outcome_state = OutcomeState::Idle;
            }
            KeyCode::Char(c) => {
                self.form_state.input_char(c);
            }
            KeyCode::Backspace => {
                self.form_state.delete_char();
            }
            KeyCode::Delete => {
                self.form_state.clear_field();
            }
            KeyCode::Enter => {
                return self.submit_form(Instant::now());
            }
            _ => {}
        }
        Ok(())
    }

    fn submit_form(&mut self, now: Instant) -> Result<()> {
        let record = match self.form_state.to_patient_record() {
            Ok(record) => record,
            Err(e) => {
                self.form_state.error_message = Some(e);
                self.outcome_state = OutcomeState::Idle;
                return Ok(());
            }
        };

        let violations = validate(&record);
        if !violations.is_empty() {
            self.form_state.error_message = Some(violations.message());
            self.outcome_state = OutcomeState::Idle;
            return Ok(());
        }

        self.form_state.error_message = None;
        if self.analysis_delay.is_zero() {
            return self.run_analysis(&record);
        }

        self.outcome_state = OutcomeState::Analyzing { progress: 0.0 };
        self.pending = Some(PendingAnalysis {
            record,
            started_at: now,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Outcome, Prediction, FEATURE_NAMES};
    use crate::ports::ModelError;
    use ratatui::backend::TestBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubClassifier {
        names: Vec<String>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubClassifier {
        fn new(fail: bool) -> Self {
            Self {
                names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl Classifier for StubClassifier {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict(&self, _features: &[f64]) -> Result<u8, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ModelError::InvalidOutput("stub failure".into()));
            }
            Ok(1)
        }

        fn predict_proba(&self, _features: &[f64]) -> Result<Vec<f64>, ModelError> {
            Ok(vec![0.13, 0.87])
        }
    }

    fn make_app(delay: Duration, fail: bool) -> (App<StubClassifier>, Arc<StubClassifier>) {
        let stub = Arc::new(StubClassifier::new(fail));
        let service = PredictionService::new(Arc::clone(&stub)).expect("service");
        (App::new(service, delay), stub)
    }

    fn render(app: &App<StubClassifier>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).expect("terminal");
        terminal.draw(|f| app.draw(f)).expect("draw");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn press(app: &mut App<StubClassifier>, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE).expect("key");
    }

    #[test]
    fn test_invalid_submission_shows_error_without_prediction() {
        let (mut app, stub) = make_app(Duration::ZERO, false);
        press(&mut app, KeyCode::Char('s'));
        app.form_state.fields[1].value = "0".into();
        app.form_state.fields[2].value = "141".into();
        press(&mut app, KeyCode::Enter);

        assert_eq!(
            app.form_state.error_message.as_deref(),
            Some("Invalid input detected in: Glucose, Blood Pressure. Please enter realistic values.")
        );
        assert_eq!(app.outcome_state, OutcomeState::Idle);
        assert!(app.pending.is_none());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unparseable_field_shows_error() {
        let (mut app, stub) = make_app(Duration::ZERO, false);
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.form_state.error_message.as_deref(),
            Some("Pregnancies: Invalid number")
        );
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_valid_submission_without_delay_completes() {
        let (mut app, stub) = make_app(Duration::ZERO, false);
        press(&mut app, KeyCode::Char('S'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(
            app.outcome_state,
            OutcomeState::Complete {
                prediction: Prediction::new(Outcome::Diabetes, 0.87)
            }
        );
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);

        // Values stay on the form for resubmission.
        assert_eq!(app.form_state.fields[1].value, "120");
    }

    #[test]
    fn test_analysis_pause_runs_classifier_after_delay() {
        let (mut app, stub) = make_app(Duration::from_millis(2000), false);
        press(&mut app, KeyCode::Char('s'));
        let start = Instant::now();
        app.submit_form(start).expect("submit");
        assert!(app.pending.is_some());

        app.tick(start + Duration::from_millis(500)).expect("tick");
        match app.outcome_state {
            OutcomeState::Analyzing { progress } => assert!((progress - 0.25).abs() < 1e-9),
            ref other => panic!("expected analyzing, got {other:?}"),
        }
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);

        // Keys other than quit are ignored while analyzing.
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.form_state.fields[0].value, "1");

        app.tick(start + Duration::from_millis(2000)).expect("tick");
        assert!(matches!(app.outcome_state, OutcomeState::Complete { .. }));
        assert!(app.pending.is_none());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_classifier_failure_propagates() {
        let (mut app, _) = make_app(Duration::ZERO, true);
        press(&mut app, KeyCode::Char('s'));
        assert!(app.handle_key(KeyCode::Enter, KeyModifiers::NONE).is_err());
    }

    #[test]
    fn test_parse_error_clears_previous_outcome() {
        let (mut app, _) = make_app(Duration::ZERO, false);
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.outcome_state, OutcomeState::Complete { .. }));

        app.form_state.selected_field = 2;
        press(&mut app, KeyCode::Delete);
        press(&mut app, KeyCode::Enter);

        assert_eq!(
            app.form_state.error_message.as_deref(),
            Some("Blood Pressure: Invalid number")
        );
        assert_eq!(app.outcome_state, OutcomeState::Idle);
        let screen = render(&app);
        assert!(!screen.contains("Confidence:"));
    }

    #[test]
    fn test_overflowing_input_never_reaches_real_model() {
        use crate::adapters::logistic::LogisticModel;
        use crate::config::IntegrityPolicy;
        use std::path::Path;

        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let model = LogisticModel::load(&dir, &IntegrityPolicy::default()).expect("model");
        let service = PredictionService::new(Arc::new(model)).expect("service");
        let mut app = App::new(service, Duration::ZERO);

        app.handle_key(KeyCode::Char('s'), KeyModifiers::NONE).expect("key");
        for (index, typed) in [(0, "9".repeat(400)), (6, format!("-{}", "9".repeat(400)))] {
            app.form_state.selected_field = index;
            app.handle_key(KeyCode::Delete, KeyModifiers::NONE).expect("key");
            for c in typed.chars() {
                app.handle_key(KeyCode::Char(c), KeyModifiers::NONE).expect("key");
            }
        }

        app.handle_key(KeyCode::Enter, KeyModifiers::NONE).expect("bad input is not fatal");
        assert_eq!(
            app.form_state.error_message.as_deref(),
            Some("Pregnancies: Invalid number")
        );
        assert_eq!(app.outcome_state, OutcomeState::Idle);
    }

    #[test]
    fn test_reset_clears_form_and_outcome() {
        let (mut app, _) = make_app(Duration::ZERO, false);
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('R'));
        assert!(app.form_state.fields.iter().all(|f| f.value.is_empty()));
        assert_eq!(app.outcome_state, OutcomeState::Idle);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _) = make_app(Duration::ZERO, false);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);

        let (mut app, _) = make_app(Duration::ZERO, false);
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL).expect("key");
        assert!(app.should_quit);
    }

    #[test]
    fn test_render_outcome_and_footer() {
        let (mut app, _) = make_app(Duration::ZERO, false);
        let idle = render(&app);
        assert!(idle.contains("Designed and Developed By: Yahaya Joel Casmed"));
        assert!(!idle.contains("87.00%"));

        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);
        let screen = render(&app);
        assert!(screen.contains("Confidence: 87.00%"));
        assert!(screen.contains("The patient is likely to have diabetes."));
        assert!(screen.contains("Coffie Jones"));
    }

    #[test]
    fn test_render_validation_error() {
        let (mut app, _) = make_app(Duration::ZERO, false);
        press(&mut app, KeyCode::Char('s'));
        app.form_state.fields[5].value = "121".into();
        press(&mut app, KeyCode::Enter);
        let screen = render(&app);
        assert!(screen.contains("Invalid input detected in: BMI."));
        assert!(screen.contains("Designed and Developed By"));
    }
}
