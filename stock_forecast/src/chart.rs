//! Renderer-neutral chart and summary descriptions

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// X coordinate of a trace point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XValue {
    Date(NaiveDate),
    Number(f64),
}

/// One named line of a chart; absent y values are gaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub name: String,
    pub x: Vec<XValue>,
    pub y: Vec<Option<f64>>,
}

impl Trace {
    /// Trace over a series' dates
    pub fn from_series(name: impl Into<String>, series: &TimeSeries) -> Self {
        Self {
            name: name.into(),
            x: series.dates().iter().map(|d| XValue::Date(*d)).collect(),
            y: series.values().iter().map(|v| Some(*v)).collect(),
        }
    }

    /// Trace of optional values over dates
    pub fn from_dates(name: impl Into<String>, dates: &[NaiveDate], y: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            x: dates.iter().map(|d| XValue::Date(*d)).collect(),
            y,
        }
    }

    /// Trace over numeric x values
    pub fn from_numbers(name: impl Into<String>, x: &[f64], y: &[f64]) -> Self {
        Self {
            name: name.into(),
            x: x.iter().map(|v| XValue::Number(*v)).collect(),
            y: y.iter().map(|v| Some(*v)).collect(),
        }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Check if the trace has no points
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// A titled chart made of named traces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub traces: Vec<Trace>,
}

impl Chart {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            traces: Vec::new(),
        }
    }

    /// Add a trace
    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.traces.push(trace);
        self
    }

    /// Look up a trace by name
    pub fn trace(&self, name: &str) -> Option<&Trace> {
        self.traces.iter().find(|t| t.name == name)
    }

    /// Serialise to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ForecastError::DataError(e.to_string()))
    }
}

/// Ordered label to value table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub title: String,
    pub entries: Vec<(String, f64)>,
}

impl Summary {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    /// Append an entry
    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.entries.push((label.into(), value));
    }

    /// Value stored under `label`
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }

    /// Labels in insertion order
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(l, _)| l.as_str()).collect()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        let width = self.entries.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
        for (label, value) in &self.entries {
            writeln!(f, "{:<width$}  {:.6}", label, value, width = width)?;
        }
        Ok(())
    }
}
