//! Quadrant layout for the industry commitment-vs-greenwashing scatter.
//!
//! Reference lines and annotation anchors are computed once from the whole
//! table (all years) and shared across every animation frame, so the
//! quadrant boundaries never jump while the animation plays.

use serde::{Deserialize, Serialize};

use crate::data::{IndexTable, Metric};
use crate::view::ViewError;

/// Fraction of the x extreme at which each annotation sits.
const ANNOTATION_X_FRACTION: f64 = 0.6;
/// Fraction of the y extreme at which each annotation sits.
const ANNOTATION_Y_FRACTION: f64 = 0.9;

/// Fixed quadrant semantics; the text never depends on the data.
const LABEL_HIGH_X_HIGH_Y: &str = "High CCII<br>High Greenwashing<br>(Symbolic Commitment)";
const LABEL_LOW_X_HIGH_Y: &str = "Low CCII<br>High Greenwashing<br>(Formalist / Passive)";
const LABEL_LOW_X_LOW_Y: &str = "Low CCII<br>Low Greenwashing<br>(Low-risk Industry)";
const LABEL_HIGH_X_LOW_Y: &str = "High CCII<br>Low Greenwashing<br>(Substantive Commitment)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrantPoint {
    pub entity: String,
    pub x: f64,
    pub y: f64,
}

/// One year of the animation; reference lines and annotations live on the
/// shared [`QuadrantLayout`], not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrantFrame {
    pub year: i32,
    pub points: Vec<QuadrantPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrantLayout {
    pub x_metric: Metric,
    pub y_metric: Metric,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// The commitment axis is centered at its natural zero.
    pub x_ref: f64,
    /// Global mean of the greenwashing axis, over all rows and years.
    pub y_ref: f64,
    pub annotations: [Annotation; 4],
}

impl QuadrantLayout {
    pub fn compute(
        table: &IndexTable,
        x_metric: Metric,
        y_metric: Metric,
    ) -> Result<Self, ViewError> {
        let xs = table.metric_values(x_metric);
        let ys = table.metric_values(y_metric);

        let x_min = column_min(&xs, x_metric.column())?;
        let x_max = column_max(&xs, x_metric.column())?;
        let y_min = column_min(&ys, y_metric.column())?;
        let y_max = column_max(&ys, y_metric.column())?;
        let y_ref = column_mean(&ys, y_metric.column())?;

        // Anchor positions follow the formula even when x_min >= 0 and the
        // "low" quadrants are visually degenerate.
        let annotations = [
            Annotation {
                x: x_max * ANNOTATION_X_FRACTION,
                y: y_max * ANNOTATION_Y_FRACTION,
                text: LABEL_HIGH_X_HIGH_Y.to_string(),
            },
            Annotation {
                x: x_min * ANNOTATION_X_FRACTION,
                y: y_max * ANNOTATION_Y_FRACTION,
                text: LABEL_LOW_X_HIGH_Y.to_string(),
            },
            Annotation {
                x: x_min * ANNOTATION_X_FRACTION,
                y: y_min * ANNOTATION_Y_FRACTION,
                text: LABEL_LOW_X_LOW_Y.to_string(),
            },
            Annotation {
                x: x_max * ANNOTATION_X_FRACTION,
                y: y_min * ANNOTATION_Y_FRACTION,
                text: LABEL_HIGH_X_LOW_Y.to_string(),
            },
        ];

        Ok(Self {
            x_metric,
            y_metric,
            x_min,
            x_max,
            y_min,
            y_max,
            x_ref: 0.0,
            y_ref,
            annotations,
        })
    }

    /// Project one year's rows onto the layout axes. A year with no rows
    /// yields an empty frame, which renders as an empty chart.
    pub fn frame(&self, table: &IndexTable, year: i32) -> QuadrantFrame {
        let points = table
            .rows_for_year(year)
            .into_iter()
            .map(|r| QuadrantPoint {
                entity: r.entity.clone(),
                x: self.x_metric.value(r),
                y: self.y_metric.value(r),
            })
            .collect();
        QuadrantFrame { year, points }
    }

    /// One frame per distinct year, ascending.
    pub fn frames(&self, table: &IndexTable) -> Vec<QuadrantFrame> {
        table
            .years()
            .into_iter()
            .map(|year| self.frame(table, year))
            .collect()
    }
}

// NaN cells are holes left by the upstream exporter; extrema and mean skip
// them, and a column with no finite value at all is insufficient data.

fn finite(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(|v| !v.is_nan())
}

fn column_min(values: &[f64], column: &str) -> Result<f64, ViewError> {
    finite(values)
        .reduce(f64::min)
        .ok_or_else(|| ViewError::InsufficientData {
            what: format!("min of empty column {:?}", column),
        })
}

fn column_max(values: &[f64], column: &str) -> Result<f64, ViewError> {
    finite(values)
        .reduce(f64::max)
        .ok_or_else(|| ViewError::InsufficientData {
            what: format!("max of empty column {:?}", column),
        })
}

fn column_mean(values: &[f64], column: &str) -> Result<f64, ViewError> {
    let (sum, count) = finite(values).fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        return Err(ViewError::InsufficientData {
            what: format!("mean of empty column {:?}", column),
        });
    }
    Ok(sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::IndexRecord;

    fn row(entity: &str, year: i32, ccii: f64, gwe: f64) -> IndexRecord {
        IndexRecord {
            entity: entity.to_string(),
            year,
            ccii,
            gwe,
            gwghg: 0.0,
        }
    }

    fn industry_table() -> IndexTable {
        // ccii spans [-2, 4]; gwe spans [0, 10] with mean 4.
        IndexTable {
            entity_column: "industry".to_string(),
            rows: vec![
                row("Energy", 2020, -2.0, 0.0),
                row("Utilities", 2020, 4.0, 10.0),
                row("Materials", 2021, 1.0, 6.0),
                row("Transport", 2021, 2.0, 0.0),
            ],
        }
    }

    #[test]
    fn test_reference_lines_and_anchor_positions() {
        let layout =
            QuadrantLayout::compute(&industry_table(), Metric::Ccii, Metric::Gwe).unwrap();
        assert_eq!(layout.x_ref, 0.0);
        assert_eq!(layout.y_ref, 4.0);
        assert_eq!(layout.x_min, -2.0);
        assert_eq!(layout.x_max, 4.0);
        assert_eq!(layout.y_min, 0.0);
        assert_eq!(layout.y_max, 10.0);

        // Top-right anchor at (4 * 0.6, 10 * 0.9).
        let top_right = &layout.annotations[0];
        assert!((top_right.x - 2.4).abs() < 1e-12);
        assert!((top_right.y - 9.0).abs() < 1e-12);

        let bottom_left = &layout.annotations[2];
        assert!((bottom_left.x - (-1.2)).abs() < 1e-12);
        assert!((bottom_left.y - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_layout_shared_across_frames() {
        let table = industry_table();
        let layout = QuadrantLayout::compute(&table, Metric::Ccii, Metric::Gwe).unwrap();
        let frames = layout.frames(&table);
        assert_eq!(frames.len(), 2);
        // The layout is computed once; frames only carry points, so the
        // references cannot drift between years by construction. Check the
        // frames project the right rows.
        assert_eq!(frames[0].year, 2020);
        assert_eq!(frames[0].points.len(), 2);
        assert_eq!(frames[1].year, 2021);
        assert_eq!(frames[1].points.len(), 2);
        let utilities = frames[0]
            .points
            .iter()
            .find(|p| p.entity == "Utilities")
            .unwrap();
        assert_eq!(utilities.x, 4.0);
        assert_eq!(utilities.y, 10.0);
    }

    #[test]
    fn test_missing_year_degrades_to_empty_frame() {
        let table = industry_table();
        let layout = QuadrantLayout::compute(&table, Metric::Ccii, Metric::Gwe).unwrap();
        let frame = layout.frame(&table, 1999);
        assert!(frame.points.is_empty());
    }

    #[test]
    fn test_all_positive_x_keeps_formula_anchors() {
        let table = IndexTable {
            entity_column: "industry".to_string(),
            rows: vec![row("A", 2020, 1.0, 2.0), row("B", 2020, 3.0, 4.0)],
        };
        let layout = QuadrantLayout::compute(&table, Metric::Ccii, Metric::Gwe).unwrap();
        // x_min = 1.0 > 0: the "low-x" anchors still land at x_min * 0.6.
        assert!((layout.annotations[1].x - 0.6).abs() < 1e-12);
        assert!((layout.annotations[2].x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_empty_table_is_insufficient_data() {
        let table = IndexTable {
            entity_column: "industry".to_string(),
            rows: vec![],
        };
        let err = QuadrantLayout::compute(&table, Metric::Ccii, Metric::Gwe).unwrap_err();
        assert!(matches!(err, ViewError::InsufficientData { .. }));
    }

    #[test]
    fn test_nan_cells_skipped_in_stats() {
        let table = IndexTable {
            entity_column: "industry".to_string(),
            rows: vec![
                row("A", 2020, 1.0, f64::NAN),
                row("B", 2020, 3.0, 6.0),
                row("C", 2020, -1.0, 2.0),
            ],
        };
        let layout = QuadrantLayout::compute(&table, Metric::Ccii, Metric::Gwe).unwrap();
        assert_eq!(layout.y_ref, 4.0);
        assert_eq!(layout.y_min, 2.0);
        assert_eq!(layout.y_max, 6.0);
    }
}
