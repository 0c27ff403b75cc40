//! Form, submission and history protocol driving the [`Renderer`].
//!
//! One request per submission. A request is split into
//! [`Controller::begin_submission`] (validate, record history, hand out a
//! ticket) and [`Controller::complete_submission`] (apply the outcome if the
//! ticket is still the latest). [`Controller::submit`] runs both around the
//! evaluator call; front-ends that drive their own runtime can call the
//! halves directly.

use chrono::{Datelike, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

use crate::error::{CrontentionError, Result};
use crate::evaluator::{Evaluation, Evaluator};
use crate::history::{History, HistoryEntry, ROOT_LOCATION};
use crate::query::{DateRule, FieldError, Query};
use crate::renderer::{DrawReport, Renderer};

/// Which half of the page is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Edit,
    Rendered,
}

/// An issued request. Only the latest ticket's response is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub query: Query,
}

/// What a submission (or navigation) ended in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A request is in flight and submit is disabled.
    Busy,
    /// Nothing to evaluate.
    Ignored,
    /// Local validation failed; no request was issued.
    Invalid(FieldError),
    Drawn(DrawReport),
    /// The service rejected one or more fields.
    Rejected(Vec<FieldError>),
    /// Transport or unexpected failure, with the alert text.
    Failed(String),
    /// A newer request was issued meanwhile; this response was dropped.
    Stale,
    /// Navigated to an empty entry; the grid was cleared.
    Cleared,
}

/// Result of [`Controller::begin_submission`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Issue(Ticket),
    Settled(SubmitOutcome),
}

pub struct Controller<E> {
    evaluator: E,
    form: Query,
    errors: Vec<FieldError>,
    alert: Option<String>,
    submit_enabled: bool,
    mode: ViewMode,
    issued: u64,
    date_rule: DateRule,
    renderer: Renderer,
    history: History,
}

impl<E: Evaluator> Controller<E> {
    pub fn new(evaluator: E, zone: Tz) -> Result<Self> {
        Ok(Self {
            evaluator,
            form: Query::default(),
            errors: Vec::new(),
            alert: None,
            submit_enabled: true,
            mode: ViewMode::Edit,
            issued: 0,
            date_rule: DateRule::new()?,
            renderer: Renderer::new(zone),
            history: History::default(),
        })
    }

    /// Start a session at `location`: its query becomes the current history
    /// state and the form contents, then is submitted.
    pub async fn load_initial(&mut self, location: &str) -> SubmitOutcome {
        let query = Query::from_location(location);
        self.history = History::new(location);
        self.history.replace(Some(query.clone()));
        self.form = query;
        self.submit().await
    }

    /// Submit the form as a user would.
    pub async fn submit(&mut self) -> SubmitOutcome {
        match self.begin_submission(true) {
            Submission::Issue(ticket) => self.run(ticket).await,
            Submission::Settled(outcome) => outcome,
        }
    }

    async fn run(&mut self, ticket: Ticket) -> SubmitOutcome {
        let result = self.evaluator.evaluate(&ticket.query).await;
        self.complete_submission(ticket, result)
    }

    /// Validate the form and, if it is worth a request, issue a ticket.
    pub fn begin_submission(&mut self, push_history: bool) -> Submission {
        if !self.submit_enabled {
            debug!("Submit ignored while a request is in flight");
            return Submission::Settled(SubmitOutcome::Busy);
        }
        self.prepare(push_history)
    }

    fn prepare(&mut self, push_history: bool) -> Submission {
        self.errors.clear();
        self.alert = None;

        if let Err(field_error) = self.date_rule.validate(&self.form.date, Utc::now().year()) {
            debug!(value = %field_error.value, "Date rejected locally");
            self.errors.push(field_error.clone());
            self.enter_edit_mode();
            return Submission::Settled(SubmitOutcome::Invalid(field_error));
        }

        if self.form.is_empty() {
            if push_history && !self.history.current().search().is_empty() {
                self.history.push(Some(Query::default()), ROOT_LOCATION);
            }
            return Submission::Settled(SubmitOutcome::Ignored);
        }

        if push_history {
            if self.history.current().state.as_ref() != Some(&self.form) {
                self.history.push(Some(self.form.clone()), self.form.location());
            }
        }

        self.submit_enabled = false;
        self.issued += 1;
        info!(seq = self.issued, date = %self.form.date, "Submitting expressions");
        Submission::Issue(Ticket {
            seq: self.issued,
            query: self.form.clone(),
        })
    }

    /// Apply the response to `ticket`. Re-enables submit in every branch.
    pub fn complete_submission(
        &mut self,
        ticket: Ticket,
        result: Result<Evaluation>,
    ) -> SubmitOutcome {
        self.submit_enabled = true;

        if ticket.seq != self.issued {
            warn!(seq = ticket.seq, latest = self.issued, "Discarding superseded response");
            return SubmitOutcome::Stale;
        }

        match result {
            Ok(Evaluation::Rows(records)) => {
                self.renderer.set_reference_date(&ticket.query.date);
                self.renderer.set_listing(ticket.query.expression_lines());
                match self.renderer.draw(records) {
                    Ok(report) => {
                        self.mode = ViewMode::Rendered;
                        SubmitOutcome::Drawn(report)
                    }
                    Err(e) => self.fail(e),
                }
            }
            Ok(Evaluation::Rejected(rejection)) => {
                self.errors = rejection.field_errors();
                debug!(errors = self.errors.len(), "Service rejected fields");
                self.enter_edit_mode();
                SubmitOutcome::Rejected(self.errors.clone())
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, e: CrontentionError) -> SubmitOutcome {
        error!(error = %e, "Evaluation failed");
        let message = match e {
            CrontentionError::Service { body, .. } => body,
            other => other.to_string(),
        };
        self.alert = Some(message.clone());
        SubmitOutcome::Failed(message)
    }

    // ── Navigation ──────────────────────────────────────────────────

    pub async fn back(&mut self) -> SubmitOutcome {
        let entry = self.history.back().cloned();
        self.navigate(entry).await
    }

    pub async fn forward(&mut self) -> SubmitOutcome {
        let entry = self.history.forward().cloned();
        self.navigate(entry).await
    }

    /// Replay an entry's query without recording history. Navigation is not
    /// blocked by an in-flight request; that request becomes stale.
    async fn navigate(&mut self, entry: Option<HistoryEntry>) -> SubmitOutcome {
        let Some(query) = entry.and_then(|e| e.state) else {
            debug!("No history state to restore");
            return SubmitOutcome::Ignored;
        };

        self.form = query;
        if self.form.is_empty() {
            self.issued += 1;
            self.submit_enabled = true;
            self.errors.clear();
            self.alert = None;
            return match self.renderer.draw(Vec::new()) {
                Ok(_) => {
                    self.enter_edit_mode();
                    SubmitOutcome::Cleared
                }
                Err(e) => self.fail(e),
            };
        }

        match self.prepare(false) {
            Submission::Issue(ticket) => self.run(ticket).await,
            Submission::Settled(outcome) => outcome,
        }
    }

    // ── View mode ───────────────────────────────────────────────────

    /// Show the form again; clears highlight and the detail lock.
    pub fn edit(&mut self) {
        self.enter_edit_mode();
    }

    fn enter_edit_mode(&mut self) {
        self.mode = ViewMode::Edit;
        self.renderer.clear_highlight();
        self.renderer.unfreeze();
    }

    // ── Form ────────────────────────────────────────────────────────

    pub fn set_expressions(&mut self, expressions: impl Into<String>) {
        self.form.expressions = expressions.into();
    }

    /// Append one expression line.
    pub fn add_expression(&mut self, expression: &str) {
        if !self.form.expressions.is_empty() && !self.form.expressions.ends_with('\n') {
            self.form.expressions.push('\n');
        }
        self.form.expressions.push_str(expression.trim());
    }

    pub fn clear_expressions(&mut self) {
        self.form.expressions.clear();
    }

    pub fn set_date(&mut self, date: impl Into<String>) {
        self.form.date = date.into();
    }

    pub fn set_time_zone(&mut self, zone: Tz) {
        self.renderer.set_time_zone(zone);
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn form(&self) -> &Query {
        &self.form
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }
}
