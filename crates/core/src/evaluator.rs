//! Seam to the evaluation service and its HTTP implementation.
//!
//! `POST {base}/evaluate` with a form-encoded [`Query`]. A success body is the
//! cell table; a failure body starting with `{` is a per-field rejection;
//! anything else is an opaque service failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::{CrontentionError, Result};
use crate::query::{Field, FieldError, Query};
use crate::record::{parse_table, CellRecord};

pub const EVALUATE_PATH: &str = "/evaluate";

/// Server complaint about the date field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateErrorDetail {
    pub value: String,
    pub msg: String,
}

/// Server complaint about one expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionErrorDetail {
    pub expr: String,
    pub msg: String,
}

/// Structured validation failure reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateErrorDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expressions: Option<Vec<ExpressionErrorDetail>>,
}

impl Rejection {
    /// Date first, then expressions in reported order.
    pub fn field_errors(&self) -> Vec<FieldError> {
        let date = self
            .date
            .iter()
            .map(|d| FieldError::new(Field::Date, &d.value, &d.msg));
        let expressions = self
            .expressions
            .iter()
            .flatten()
            .map(|e| FieldError::new(Field::Expressions, &e.expr, &e.msg));
        date.chain(expressions).collect()
    }
}

/// Non-transport outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Rows(Vec<CellRecord>),
    Rejected(Rejection),
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Issue exactly one request for `query`.
    async fn evaluate(&self, query: &Query) -> Result<Evaluation>;
}

/// Classify a response by status and body.
pub fn interpret_response(status: u16, ok: bool, body: &str) -> Result<Evaluation> {
    if ok {
        return Ok(Evaluation::Rows(parse_table(body)?));
    }
    if body.starts_with('{') {
        let rejection: Rejection = serde_json::from_str(body)?;
        return Ok(Evaluation::Rejected(rejection));
    }
    Err(CrontentionError::Service {
        status,
        body: body.to_string(),
    })
}

// ── HTTP ────────────────────────────────────────────────────────────

/// Client for the evaluation service.
#[derive(Debug, Clone)]
pub struct HttpEvaluator {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl HttpEvaluator {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            timeout,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(&config.service_url, config.request_timeout())
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, EVALUATE_PATH)
    }
}

#[async_trait]
impl Evaluator for HttpEvaluator {
    async fn evaluate(&self, query: &Query) -> Result<Evaluation> {
        let url = self.endpoint();
        info!(url = %url, date = %query.date, "Evaluating expressions");

        let resp = self
            .http
            .post(&url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(query.form_body())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Evaluation response");

        interpret_response(status.as_u16(), status.is_success(), &body)
    }
}
