//! Shell state: runtime configuration, the per-session selection, and the
//! pure event reducer that updates it.
//!
//! Widget changes arrive as [`UiEvent`]s; `reduce` applies them and the shell
//! rebuilds the affected sections through the view pipeline. No hidden
//! control flow: event in, new state out, render.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::Metric;
use crate::view::DisplayMode;

#[derive(Debug, Clone)]
pub struct Config {
    pub country_csv: PathBuf,
    pub industry_csv: PathBuf,
    pub bind_addr: String,
    pub port: u16,
    pub top_k: usize,
    pub out_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            country_csv: std::env::var("COUNTRY_CSV")
                .unwrap_or_else(|_| "data/countrylevel.csv".to_string())
                .into(),
            industry_csv: std::env::var("INDUSTRY_CSV")
                .unwrap_or_else(|_| "data/industrylevel.csv".to_string())
                .into(),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8787),
            top_k: std::env::var("TOP_K")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            out_dir: std::env::var("OUT_DIR")
                .unwrap_or_else(|_| "out".to_string())
                .into(),
        }
    }
}

/// Everything the widgets can select.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Indicator shown on the world map.
    pub indicator: Metric,
    /// Map display mode.
    pub mode: DisplayMode,
    /// Year for single-year map mode; None means latest available.
    pub year: Option<i32>,
    /// Index driving the top-k ranking chart.
    pub ranking_metric: Metric,
    /// Greenwashing index on the industry scatter's y axis.
    pub industry_y: Metric,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            indicator: Metric::Ccii,
            mode: DisplayMode::SingleYear,
            year: None,
            ranking_metric: Metric::Ccii,
            industry_y: Metric::Gwe,
        }
    }
}

/// Per-session mutable state. Counters are ephemeral: zeroed at session
/// start, never persisted, never shared across sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub selection: Selection,
    pub like_count: u32,
    pub really_like_count: u32,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiEvent {
    SelectIndicator(Metric),
    SelectMode(DisplayMode),
    SelectYear(Option<i32>),
    SelectRankingMetric(Metric),
    SelectIndustryMetric(Metric),
    Like,
    ReallyLike,
}

/// Pure reducer: (state, event) -> state.
///
/// The industry y-axis selector only offers the two greenwashing indices;
/// a CCII selection there is ignored rather than plotted against itself.
pub fn reduce(state: &mut SessionState, event: UiEvent) {
    match event {
        UiEvent::SelectIndicator(metric) => state.selection.indicator = metric,
        UiEvent::SelectMode(mode) => state.selection.mode = mode,
        UiEvent::SelectYear(year) => state.selection.year = year,
        UiEvent::SelectRankingMetric(metric) => state.selection.ranking_metric = metric,
        UiEvent::SelectIndustryMetric(metric) => {
            if metric != Metric::Ccii {
                state.selection.industry_y = metric;
            }
        }
        UiEvent::Like => state.like_count += 1,
        UiEvent::ReallyLike => state.really_like_count += 1,
    }
}
