//! The pure view pipeline: (selection state) -> (derived view).
//!
//! Every derived view is recomputed from the loaded tables on each selection
//! change; nothing here caches or mutates. Renderers consume these outputs
//! and never re-derive ranking or layout themselves.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::{DataError, IndexTable, Metric};
use crate::quadrant::{QuadrantFrame, QuadrantLayout};
use crate::ranking::{rank_top_k, trajectories, Trajectory};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ViewError {
    /// A selection named a year/group with zero rows; the section degrades
    /// to an empty chart with a notice.
    EmptyGroup { group: String },
    /// mean/min/max over a column with no finite values; fails loudly
    /// instead of pushing NaN into layout math.
    InsufficientData { what: String },
    /// The table backing the section could not be loaded.
    Data(DataError),
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::EmptyGroup { group } => write!(f, "no rows for {}", group),
            ViewError::InsufficientData { what } => write!(f, "insufficient data: {}", what),
            ViewError::Data(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewError::Data(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DataError> for ViewError {
    fn from(err: DataError) -> Self {
        ViewError::Data(err)
    }
}

// =============================================================================
// Display mode
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    SingleYear,
    Animated,
}

impl DisplayMode {
    pub fn from_query(raw: &str) -> Option<Self> {
        match raw {
            "single_year" | "single" => Some(DisplayMode::SingleYear),
            "animated" | "animate" => Some(DisplayMode::Animated),
            _ => None,
        }
    }
}

// =============================================================================
// Derived views
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub entity: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFrame {
    pub year: i32,
    pub points: Vec<MapPoint>,
}

/// Input to the choropleth renderer. Single-year mode carries exactly one
/// frame; animated mode carries one frame per year in the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub metric: Metric,
    pub mode: DisplayMode,
    pub frames: Vec<MapFrame>,
}

/// Input to the rank-trajectory renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingView {
    pub metric: Metric,
    pub k: usize,
    pub trajectories: Vec<Trajectory>,
}

/// Input to the quadrant-scatter renderer: one shared layout plus per-year
/// frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryView {
    pub layout: QuadrantLayout,
    pub frames: Vec<QuadrantFrame>,
}

// =============================================================================
// Pipeline
// =============================================================================

fn map_frame(table: &IndexTable, metric: Metric, year: i32) -> MapFrame {
    MapFrame {
        year,
        points: table
            .rows_for_year(year)
            .into_iter()
            .map(|r| MapPoint {
                entity: r.entity.clone(),
                value: metric.value(r),
            })
            .collect(),
    }
}

/// Build the choropleth view for the selected indicator and mode. In
/// single-year mode a missing `year` defaults to the latest year present.
pub fn country_map_view(
    table: &IndexTable,
    metric: Metric,
    mode: DisplayMode,
    year: Option<i32>,
) -> Result<MapView, ViewError> {
    let years = table.years();
    match mode {
        DisplayMode::SingleYear => {
            let year = match year.or_else(|| years.last().copied()) {
                Some(y) => y,
                None => {
                    return Err(ViewError::EmptyGroup {
                        group: format!("{} table", table.entity_column),
                    })
                }
            };
            let frame = map_frame(table, metric, year);
            if frame.points.is_empty() {
                return Err(ViewError::EmptyGroup {
                    group: format!("year {}", year),
                });
            }
            Ok(MapView {
                metric,
                mode,
                frames: vec![frame],
            })
        }
        DisplayMode::Animated => {
            if years.is_empty() {
                return Err(ViewError::EmptyGroup {
                    group: format!("{} table", table.entity_column),
                });
            }
            Ok(MapView {
                metric,
                mode,
                frames: years
                    .into_iter()
                    .map(|y| map_frame(table, metric, y))
                    .collect(),
            })
        }
    }
}

/// Build the top-k ranking view for the selected index. An empty table yields
/// an empty set of trajectories, which renders as an empty chart.
pub fn ranking_view(table: &IndexTable, metric: Metric, k: usize) -> RankingView {
    let ranked = rank_top_k(table, metric, k);
    RankingView {
        metric,
        k,
        trajectories: trajectories(&ranked),
    }
}

/// Build the animated quadrant view: x is always the commitment index, y is
/// the selected greenwashing index.
pub fn industry_view(table: &IndexTable, y_metric: Metric) -> Result<IndustryView, ViewError> {
    let layout = QuadrantLayout::compute(table, Metric::Ccii, y_metric)?;
    let frames = layout.frames(table);
    Ok(IndustryView { layout, frames })
}
