//! End-to-end tests of the controller against an in-process evaluator.
//!
//! The evaluator answers with canned tables for the queries below, passing
//! them through the same response interpretation as the HTTP client.

use std::sync::Mutex;

use async_trait::async_trait;

use crontention_core::error::Result;
use crontention_core::evaluator::interpret_response;
use crontention_core::lock::DetailLock;
use crontention_core::scale::ScaleKind;
use crontention_core::{Controller, Evaluation, Evaluator, Query, SubmitOutcome, ViewMode};

const HEADER: &str = "key,h,m,count,expressions\n";
const EVERY_MINUTE: &str = "0 * * * * ?";
const SUNDAY: &str = "0 0 0 ? * SUN";
const MONDAY: &str = "0 1,2 0 ? * MON";

/// Records every query and answers from a fixed table of cases.
#[derive(Default)]
struct Canned {
    seen: Mutex<Vec<Query>>,
}

impl Canned {
    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn body_for(query: &Query) -> (u16, String) {
        let lines = query.expression_lines();
        let names: Vec<&str> = lines.iter().map(String::as_str).collect();
        match (names.as_slice(), query.date.as_str()) {
            ([EVERY_MINUTE], _) => {
                let mut body = HEADER.to_string();
                for h in 0..24 {
                    for m in 0..60 {
                        body.push_str(&format!("{h:02}:{m:02},{h},{m},1,{EVERY_MINUTE}\n"));
                    }
                }
                (200, body)
            }
            ([SUNDAY, MONDAY], "2020-07-12") => {
                (200, format!("{HEADER}00:00,0,0,1,{SUNDAY}\n"))
            }
            ([SUNDAY, MONDAY], "2020-07-13") => (
                200,
                format!("{HEADER}00:01,0,1,1,{MONDAY}\n00:02,0,2,1,{MONDAY}\n"),
            ),
            (["busy"], _) => {
                let mut body = HEADER.to_string();
                body.push_str("00:00,0,0,3,\"busy\nbusy\nbusy\"\n");
                body.push_str("00:01,0,1,2,\"busy\nbusy\"\n");
                body.push_str("00:02,0,2,1,busy\n");
                (200, body)
            }
            (["nope"], _) => (
                400,
                r#"{"expressions":[{"expr":"nope","msg":"Unparseable"}]}"#.to_string(),
            ),
            _ => (500, "Internal Server Error".to_string()),
        }
    }
}

#[async_trait]
impl Evaluator for Canned {
    async fn evaluate(&self, query: &Query) -> Result<Evaluation> {
        self.seen.lock().unwrap().push(query.clone());
        let (status, body) = Self::body_for(query);
        interpret_response(status, status == 200, &body)
    }
}

fn controller() -> Controller<Canned> {
    Controller::new(Canned::default(), chrono_tz::UTC).unwrap()
}

fn location(expressions: &[&str], date: &str) -> String {
    format!("/{}", Query::new(expressions.join("\n"), date).location())
}

#[tokio::test]
async fn every_minute_fills_the_grid() {
    let mut c = controller();
    let outcome = c.load_initial(&location(&[EVERY_MINUTE], "")).await;

    let SubmitOutcome::Drawn(report) = outcome else {
        panic!("expected draw, got {outcome:?}");
    };
    assert_eq!(report.cells, 1440);
    assert_eq!(report.scale, ScaleKind::Ordinal);
    assert_eq!(c.mode(), ViewMode::Rendered);
    assert_eq!(
        c.renderer().summary()[0].to_string(),
        "1 event at 00:00, 00:01, 00:02, 00:03, \u{2026}"
    );
    assert_eq!(c.renderer().index().cells_for(EVERY_MINUTE).len(), 1440);
}

#[tokio::test]
async fn weekday_expressions_depend_on_date() {
    let mut c = controller();
    c.set_expressions(format!("{SUNDAY}\n{MONDAY}"));

    c.set_date("2020-07-12");
    assert!(matches!(c.submit().await, SubmitOutcome::Drawn(ref r) if r.cells == 1));

    c.set_date("2020-07-13");
    assert!(matches!(c.submit().await, SubmitOutcome::Drawn(ref r) if r.cells == 2));
    assert!(c.renderer().scene().get("00:00").is_none());
    assert_eq!(c.renderer().summary()[0].to_string(), "1 event at 00:01, 00:02");
}

#[tokio::test]
async fn bad_date_never_reaches_the_service() {
    let mut c = controller();
    let outcome = c.load_initial(&location(&[EVERY_MINUTE], "bah")).await;

    let SubmitOutcome::Invalid(error) = outcome else {
        panic!("expected field error, got {outcome:?}");
    };
    assert_eq!(error.value, "bah");
    assert_eq!(c.errors().len(), 1);
    assert_eq!(c.evaluator().calls(), 0);
    assert!(c.renderer().scene().is_empty());
}

#[tokio::test]
async fn rejection_and_failure_are_reported() {
    let mut c = controller();
    c.set_expressions("nope");
    let outcome = c.submit().await;
    assert!(matches!(outcome, SubmitOutcome::Rejected(ref e) if e[0].message == "Unparseable"));
    assert_eq!(c.mode(), ViewMode::Edit);

    c.set_expressions("anything else");
    assert_eq!(
        c.submit().await,
        SubmitOutcome::Failed("Internal Server Error".to_string())
    );
    assert!(c.errors().is_empty());
    assert!(c.submit_enabled());
}

#[tokio::test]
async fn back_and_forward_replay_without_pushing() {
    let mut c = controller();
    c.set_expressions(format!("{SUNDAY}\n{MONDAY}"));
    c.set_date("2020-07-12");
    c.submit().await;
    c.set_date("2020-07-13");
    c.submit().await;
    assert_eq!(c.history().len(), 3);

    let outcome = c.back().await;
    assert!(matches!(outcome, SubmitOutcome::Drawn(ref r) if r.cells == 1));
    assert_eq!(c.form().date, "2020-07-12");
    assert_eq!(c.history().len(), 3);

    // The first entry carries no state and is ignored.
    assert_eq!(c.back().await, SubmitOutcome::Ignored);

    c.forward().await;
    let outcome = c.forward().await;
    assert!(matches!(outcome, SubmitOutcome::Drawn(ref r) if r.cells == 2));
    assert_eq!(c.form().date, "2020-07-13");
    assert_eq!(c.evaluator().calls(), 5);
}

#[tokio::test]
async fn resubmitting_the_loaded_query_keeps_one_entry() {
    let mut c = controller();
    c.load_initial("/?expressions=busy").await;
    assert_eq!(c.history().len(), 1);

    c.submit().await;
    assert_eq!(c.history().len(), 1);
    assert_eq!(c.history().location(), "/?expressions=busy");
    assert_eq!(c.evaluator().calls(), 2);
}

#[tokio::test]
async fn navigating_to_cleared_entry_empties_the_grid() {
    let mut c = controller();
    c.load_initial(&location(&[EVERY_MINUTE], "today")).await;
    c.clear_expressions();
    c.submit().await;
    c.back().await;
    assert_eq!(c.renderer().scene().len(), 1440);

    assert_eq!(c.forward().await, SubmitOutcome::Cleared);
    assert!(c.renderer().scene().is_empty());
    assert!(c.renderer().summary().is_empty());
    assert_eq!(c.mode(), ViewMode::Edit);
}

#[tokio::test]
async fn interaction_survives_until_next_draw() {
    let mut c = controller();
    c.set_expressions("busy");
    c.submit().await;

    let renderer = c.renderer_mut();
    let top = renderer.scene().id_of("00:00").unwrap();
    renderer.click(top);
    assert_eq!(renderer.detail().header(), "3 events at 00:00:");
    assert!(renderer.toggle_highlight(0));
    assert!(renderer.scene().iter().all(|e| e.highlighted));

    c.submit().await;
    assert_eq!(c.renderer().lock(), DetailLock::Unfrozen);
    assert_eq!(c.renderer().active_highlight(), None);
    assert_eq!(c.renderer().scene().id_of("00:00"), Some(top));
}

#[tokio::test]
async fn time_zone_switch_relabels_axes_only() {
    let mut c = controller();
    c.set_expressions(format!("{SUNDAY}\n{MONDAY}"));
    c.set_date("2020-07-12");
    c.submit().await;

    let utc = c.renderer().axis_labels().clone();
    let cell = c.renderer().scene().get("00:00").cloned().unwrap();

    c.set_time_zone(chrono_tz::Europe::Copenhagen);
    assert_eq!(c.renderer().axis_labels().hours[0].label, "02");
    assert_eq!(c.renderer().scene().get("00:00"), Some(&cell));

    c.set_time_zone(chrono_tz::Asia::Kolkata);
    assert_eq!(c.renderer().axis_labels().minutes[0].label, "30");

    c.set_time_zone(chrono_tz::UTC);
    assert_eq!(c.renderer().axis_labels(), &utc);
}
