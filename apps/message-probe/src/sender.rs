use std::collections::BTreeMap;
use std::io::{self, Write};

use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ProbeConfig;
use crate::message::Message;

const SEPARATOR_WIDTH: usize = 50;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("could not reach port {port}: {source}")]
    Connect {
        port: u16,
        #[source]
        source: reqwest::Error,
    },
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for SendError {
    fn from(err: serde_json::Error) -> Self {
        SendError::Other(format!("could not encode message: {err}"))
    }
}

impl SendError {
    pub fn class(&self) -> &'static str {
        match self {
            SendError::Connect { .. } => "connect",
            SendError::Request(_) => "request",
            SendError::Other(_) => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        }
    }
}

/// A finished exchange. Any status counts, including 4xx and 5xx.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub url: String,
    pub request_headers: BTreeMap<String, String>,
    pub sent: Value,
    pub status: StatusCode,
    pub response: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Delivered(StatusCode),
    Failed(&'static str),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub delivered: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }

    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Delivered(_) => self.delivered += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

#[derive(Clone)]
pub struct MessageSender {
    http: Client,
    endpoint: String,
    port: u16,
}

impl MessageSender {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            http: Client::new(),
            endpoint: config.endpoint(),
            port: config.port,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts one message and reads the reply. Single attempt.
    pub async fn deliver(&self, message: &Message) -> Result<Delivery, SendError> {
        let payload = serde_json::to_string(message)?;
        let sent = serde_json::to_value(message)?;

        let request = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(payload)
            .build()
            .map_err(|err| self.classify(err))?;
        let request_headers = header_map(request.headers());

        debug!(url = %self.endpoint, kind = ?message.kind, "posting message");
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|err| self.classify(err))?;
        let status = response.status();
        let text = response.text().await.map_err(|err| self.classify(err))?;
        debug!(%status, bytes = text.len(), "message api replied");

        Ok(Delivery {
            url: self.endpoint.clone(),
            request_headers,
            sent,
            status,
            response: ResponseBody::from_text(text),
        })
    }

    /// Delivers `message` and writes the exchange to `out`. Delivery failures
    /// end up in the report; only a failed write is returned as an error.
    pub async fn send<W: Write>(&self, message: &Message, out: &mut W) -> io::Result<Outcome> {
        match self.deliver(message).await {
            Ok(delivery) => {
                write_delivery(out, &delivery)?;
                Ok(Outcome::Delivered(delivery.status))
            }
            Err(err) => {
                warn!(class = err.class(), error = %err, "message not delivered");
                write_failure(out, &err)?;
                Ok(Outcome::Failed(err.class()))
            }
        }
    }

    fn classify(&self, err: reqwest::Error) -> SendError {
        if err.is_connect() {
            SendError::Connect {
                port: self.port,
                source: err,
            }
        } else {
            SendError::Request(err)
        }
    }
}

/// Sends every message in order, pausing `config.delay` after each one.
pub async fn run<W: Write>(
    config: &ProbeConfig,
    messages: &[Message],
    out: &mut W,
) -> io::Result<RunSummary> {
    let sender = MessageSender::new(config);
    let separator = "-".repeat(SEPARATOR_WIDTH);
    let mut summary = RunSummary::default();

    writeln!(out, "Sending test messages...")?;
    writeln!(out, "Target URL: {}", sender.endpoint())?;
    writeln!(out, "{separator}")?;

    for (index, message) in messages.iter().enumerate() {
        writeln!(out, "\nSending test message {}/{}:", index + 1, messages.len())?;
        let outcome = sender.send(message, out).await?;
        summary.record(&outcome);
        writeln!(out, "{separator}")?;
        out.flush()?;
        sleep(config.delay).await;
    }

    writeln!(out, "\nTest complete!")?;
    writeln!(
        out,
        "Delivered {} of {} messages ({} failed)",
        summary.delivered,
        summary.total(),
        summary.failed
    )?;
    out.flush()?;
    info!(
        delivered = summary.delivered,
        failed = summary.failed,
        "probe run finished"
    );
    Ok(summary)
}

fn write_delivery<W: Write>(out: &mut W, delivery: &Delivery) -> io::Result<()> {
    writeln!(out, "URL: {}", delivery.url)?;
    writeln!(out, "Request headers (set by probe): {:?}", delivery.request_headers)?;
    writeln!(out, "Sent message: {}", pretty(&delivery.sent))?;
    writeln!(out, "Status: {}", delivery.status.as_u16())?;
    match &delivery.response {
        ResponseBody::Json(value) => writeln!(out, "Response: {}", pretty(value)),
        ResponseBody::Text(text) => writeln!(out, "Raw response: {text}"),
    }
}

fn write_failure<W: Write>(out: &mut W, err: &SendError) -> io::Result<()> {
    match err {
        SendError::Connect { port, source } => {
            writeln!(
                out,
                "Connection error: make sure the server is running on port {port}"
            )?;
            writeln!(out, "Error detail: {}", error_chain(source))
        }
        SendError::Request(source) => writeln!(out, "Request error: {}", error_chain(source)),
        SendError::Other(detail) => writeln!(out, "Other error: {detail}"),
    }
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

// reqwest keeps the useful part (refused, timed out, ...) in the source chain.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
