//! Figure builders: thin presentation glue turning derived views into
//! Plotly-style figure JSON (`{"data": [...], "layout": {...}, "frames":
//! [...]}`). No ranking or layout math happens here.

use serde_json::{json, Value};

use crate::data::Metric;
use crate::view::{DisplayMode, IndustryView, MapFrame, MapView, RankingView};

/// Dashboard background shared by every figure.
pub const PAGE_BACKGROUND: &str = "#0E1117";

// =============================================================================
// Indicator display configuration
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct IndicatorStyle {
    pub metric: Metric,
    pub title: &'static str,
    pub short_label: &'static str,
    pub colorscale: [&'static str; 3],
}

/// Column / title / colorscale per indicator, as published.
pub fn indicator_style(metric: Metric) -> IndicatorStyle {
    match metric {
        Metric::Ccii => IndicatorStyle {
            metric,
            title: "Climate Commitment Intensity Index (CCII)",
            short_label: "CCII",
            colorscale: ["#cce6ff", "#3399ff", "#003366"],
        },
        Metric::Gwe => IndicatorStyle {
            metric,
            title: "Greenwashing based on Environmental Score (GWE)",
            short_label: "GWE",
            colorscale: ["#d9f2d9", "#4caf50", "#1b5e20"],
        },
        Metric::Gwghg => IndicatorStyle {
            metric,
            title: "Greenwashing based on Carbon Emissions (GWGHG)",
            short_label: "GWGHG",
            colorscale: ["#f5cccc", "#e53935", "#7f0000"],
        },
    }
}

/// Label used by the ranking and industry selectors.
pub fn index_label(metric: Metric) -> &'static str {
    match metric {
        Metric::Ccii => "Climate Commitment Intensity Index (CCII)",
        Metric::Gwe => "Greenwashing Index (GWE)",
        Metric::Gwghg => "Greenwashing Index (GWGHG)",
    }
}

fn continuous_scale(colors: &[&str; 3]) -> Value {
    json!([[0.0, colors[0]], [0.5, colors[1]], [1.0, colors[2]]])
}

fn dark_layout(title: &str) -> Value {
    json!({
        "title": {"text": title},
        "paper_bgcolor": PAGE_BACKGROUND,
        "plot_bgcolor": PAGE_BACKGROUND,
        "font": {"color": "white"},
        "margin": {"l": 40, "r": 40, "t": 60, "b": 40}
    })
}

// =============================================================================
// Choropleth map
// =============================================================================

fn choropleth_trace(frame: &MapFrame, style: &IndicatorStyle) -> Value {
    let locations: Vec<&str> = frame.points.iter().map(|p| p.entity.as_str()).collect();
    let z: Vec<Value> = frame
        .points
        .iter()
        .map(|p| {
            if p.value.is_nan() {
                Value::Null
            } else {
                json!(p.value)
            }
        })
        .collect();
    json!({
        "type": "choropleth",
        "locations": locations,
        "locationmode": "country names",
        "z": z,
        "colorscale": continuous_scale(&style.colorscale),
        "colorbar": {"title": {"text": style.short_label}},
        "hovertemplate": format!(
            "%{{location}}<br>year: {}<br>{}: %{{z:.4f}}<extra></extra>",
            frame.year, style.short_label
        )
    })
}

/// Choropleth of one indicator across countries; animated mode emits one
/// frame per year plus a year slider.
pub fn choropleth_figure(view: &MapView) -> Value {
    let style = indicator_style(view.metric);
    let first = &view.frames[0];

    let mut layout = dark_layout(&match view.mode {
        DisplayMode::SingleYear => format!(
            "Global Distribution of {} ({})",
            style.title, first.year
        ),
        DisplayMode::Animated => {
            format!("Global Distribution of {} (Animated)", style.title)
        }
    });
    layout["margin"] = json!({"l": 0, "r": 0, "t": 60, "b": 0});
    layout["geo"] = json!({"bgcolor": PAGE_BACKGROUND});

    let mut figure = json!({
        "data": [choropleth_trace(first, &style)],
        "layout": layout
    });

    if view.mode == DisplayMode::Animated {
        let frames: Vec<Value> = view
            .frames
            .iter()
            .map(|f| {
                json!({
                    "name": f.year.to_string(),
                    "data": [choropleth_trace(f, &style)]
                })
            })
            .collect();
        figure["frames"] = json!(frames);
        let years: Vec<i32> = view.frames.iter().map(|f| f.year).collect();
        figure["layout"]["sliders"] = json!([year_slider(&years)]);
    }
    figure
}

fn year_slider(years: &[i32]) -> Value {
    let steps: Vec<Value> = years
        .iter()
        .map(|year| {
            let name = year.to_string();
            json!({
                "label": name,
                "method": "animate",
                "args": [[name], {"mode": "immediate", "transition": {"duration": 0}}]
            })
        })
        .collect();
    json!({
        "active": 0,
        "currentvalue": {"prefix": "Year: "},
        "steps": steps
    })
}

// =============================================================================
// Rank trajectories
// =============================================================================

/// Top-k bump chart: one line per contiguous run of ranked years so an entity
/// that drops out of the top k shows a visible gap instead of an
/// interpolated bridge.
pub fn rank_trajectory_figure(view: &RankingView) -> Value {
    let label = index_label(view.metric);
    let mut traces = Vec::new();
    for trajectory in &view.trajectories {
        for (i, segment) in trajectory.segments.iter().enumerate() {
            let years: Vec<i32> = segment.iter().map(|e| e.year).collect();
            let ranks: Vec<u32> = segment.iter().map(|e| e.rank).collect();
            let values: Vec<f64> = segment.iter().map(|e| e.value).collect();
            traces.push(json!({
                "type": "scatter",
                "mode": "lines+markers",
                "name": trajectory.entity,
                "legendgroup": trajectory.entity,
                "showlegend": i == 0,
                "x": years,
                "y": ranks,
                "customdata": values,
                "hovertemplate":
                    "%{fullData.name}<br>year: %{x}<br>rank: %{y}<br>value: %{customdata:.4f}<extra></extra>"
            }));
        }
    }

    let mut layout = dark_layout(&format!("Top {} by {} Over Time", view.k, label));
    layout["height"] = json!(650);
    layout["xaxis"] = json!({"title": {"text": "Year"}});
    layout["yaxis"] = json!({
        "title": {"text": "Rank (1 = Highest)"},
        "autorange": "reversed"
    });
    layout["legend"] = json!({"title": {"text": "Country"}});

    json!({"data": traces, "layout": layout})
}

// =============================================================================
// Quadrant scatter
// =============================================================================

fn quadrant_trace(frame: &crate::quadrant::QuadrantFrame) -> Value {
    let xs: Vec<f64> = frame.points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = frame.points.iter().map(|p| p.y).collect();
    let labels: Vec<&str> = frame.points.iter().map(|p| p.entity.as_str()).collect();
    json!({
        "type": "scatter",
        "mode": "markers+text",
        "x": xs,
        "y": ys,
        "text": labels,
        "textposition": "top center",
        "marker": {
            "size": 14,
            "line": {"width": 1, "color": "white"},
            "color": ys,
            "colorscale": "RdYlGn",
            "reversescale": true,
            "showscale": true
        },
        "hovertemplate": format!(
            "%{{text}}<br>year: {}<br>ccii: %{{x:.4f}}<br>greenwashing: %{{y:.4f}}<extra></extra>",
            frame.year
        )
    })
}

/// Animated industry scatter with the fixed quadrant overlay. Reference
/// lines and annotations live in the layout, so every frame shares them.
pub fn quadrant_scatter_figure(view: &IndustryView) -> Value {
    let y_label = index_label(view.layout.y_metric);
    let l = &view.layout;

    let shapes = json!([
        {
            "type": "line",
            "x0": l.x_ref, "x1": l.x_ref,
            "y0": l.y_min, "y1": l.y_max,
            "line": {"color": "white", "dash": "dash"}
        },
        {
            "type": "line",
            "x0": l.x_min, "x1": l.x_max,
            "y0": l.y_ref, "y1": l.y_ref,
            "line": {"color": "white", "dash": "dash"}
        }
    ]);
    let annotations: Vec<Value> = l
        .annotations
        .iter()
        .map(|a| {
            json!({
                "x": a.x,
                "y": a.y,
                "text": a.text,
                "showarrow": false,
                "align": "center",
                "font": {"color": "white", "size": 12}
            })
        })
        .collect();

    let mut layout = dark_layout(&format!("Industry CCII vs {} (Animated)", y_label));
    layout["height"] = json!(650);
    layout["xaxis"] = json!({"title": {"text": index_label(Metric::Ccii)}});
    layout["yaxis"] = json!({"title": {"text": y_label}});
    layout["shapes"] = shapes;
    layout["annotations"] = json!(annotations);

    let first = view
        .frames
        .first()
        .map(quadrant_trace)
        .unwrap_or_else(|| quadrant_trace(&crate::quadrant::QuadrantFrame {
            year: 0,
            points: vec![],
        }));
    let frames: Vec<Value> = view
        .frames
        .iter()
        .map(|f| {
            json!({
                "name": f.year.to_string(),
                "data": [quadrant_trace(f)]
            })
        })
        .collect();

    let years: Vec<i32> = view.frames.iter().map(|f| f.year).collect();
    let mut figure = json!({
        "data": [first],
        "layout": layout,
        "frames": frames
    });
    figure["layout"]["sliders"] = json!([year_slider(&years)]);
    figure
}

/// Empty placeholder figure for a section that degraded (empty group).
pub fn empty_figure(title: &str, notice: &str) -> Value {
    let mut layout = dark_layout(title);
    layout["xaxis"] = json!({"visible": false});
    layout["yaxis"] = json!({"visible": false});
    layout["annotations"] = json!([{
        "text": notice,
        "showarrow": false,
        "font": {"color": "white", "size": 14},
        "xref": "paper",
        "yref": "paper",
        "x": 0.5,
        "y": 0.5
    }]);
    json!({"data": [], "layout": layout})
}
