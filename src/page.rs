//! Page assembly: builds every dashboard section from the current selection,
//! isolating failures per section so a broken industry file cannot take the
//! country map down with it.

use serde::Serialize;
use serde_json::Value;

use crate::cache::DatasetCache;
use crate::chart::{
    choropleth_figure, empty_figure, index_label, quadrant_scatter_figure,
    rank_trajectory_figure,
};
use crate::logging::{self, obj, v_str, Domain};
use crate::state::{Config, SessionState};
use crate::view::{country_map_view, industry_view, ranking_view, ViewError};

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub id: &'static str,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figure: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageModel {
    pub sections: Vec<Section>,
    pub years: Vec<i32>,
    pub selection: crate::state::Selection,
    pub like_count: u32,
    pub really_like_count: u32,
}

/// Fold a section's outcome into something renderable: a figure, a degraded
/// empty chart with a notice, or a visible error message.
fn section(id: &'static str, title: String, outcome: Result<Value, ViewError>) -> Section {
    match outcome {
        Ok(figure) => Section {
            id,
            title,
            figure: Some(figure),
            error: None,
        },
        Err(ViewError::EmptyGroup { group }) => {
            logging::warn(
                Domain::Render,
                "section_empty",
                obj(&[("section", v_str(id)), ("group", v_str(&group))]),
            );
            Section {
                id,
                title: title.clone(),
                figure: Some(empty_figure(&title, &format!("No data for {}", group))),
                error: None,
            }
        }
        Err(err) => {
            logging::error(
                Domain::Render,
                "section_failed",
                obj(&[("section", v_str(id)), ("error", v_str(&err.to_string()))]),
            );
            Section {
                id,
                title,
                figure: None,
                error: Some(err.to_string()),
            }
        }
    }
}

/// Build the whole page for the current session. Each section loads its table
/// through the shared cache and renders independently.
pub fn build_page(cache: &DatasetCache, config: &Config, state: &SessionState) -> PageModel {
    let sel = state.selection;

    let country_map = section(
        "country-map",
        "Global Climate Commitment and Greenwashing Indices".to_string(),
        cache
            .load(&config.country_csv)
            .map_err(ViewError::from)
            .and_then(|table| country_map_view(&table, sel.indicator, sel.mode, sel.year))
            .map(|view| choropleth_figure(&view)),
    );

    let country_ranking = section(
        "country-ranking",
        format!(
            "Top {} Countries by {}",
            config.top_k,
            index_label(sel.ranking_metric)
        ),
        cache
            .load(&config.country_csv)
            .map_err(ViewError::from)
            .map(|table| {
                rank_trajectory_figure(&ranking_view(&table, sel.ranking_metric, config.top_k))
            }),
    );

    let industry_quadrant = section(
        "industry-quadrant",
        "Industry-level Climate Commitment vs Greenwashing".to_string(),
        cache
            .load(&config.industry_csv)
            .map_err(ViewError::from)
            .and_then(|table| industry_view(&table, sel.industry_y))
            .map(|view| quadrant_scatter_figure(&view)),
    );

    let years = cache
        .load(&config.country_csv)
        .map(|table| table.years())
        .unwrap_or_default();

    PageModel {
        sections: vec![country_map, country_ranking, industry_quadrant],
        years,
        selection: sel,
        like_count: state.like_count,
        really_like_count: state.really_like_count,
    }
}

/// The served page: controls plus one div per section, hydrated by fetching
/// `/api/page` and handing each figure to Plotly.
pub fn index_html() -> String {
    INDEX_HTML.to_string()
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Global Distribution of Climate Commitments and Greenwashing</title>
<script src="https://cdn.plot.ly/plotly-2.32.0.min.js"></script>
<style>
  body { background: #0E1117; color: #fafafa; font-family: sans-serif; margin: 0 auto; max-width: 1100px; padding: 1rem 2rem; }
  h1 { font-size: 1.6rem; }
  h2 { font-size: 1.2rem; margin-top: 2.5rem; }
  hr { border-color: #30363d; }
  .controls { margin: 0.6rem 0; }
  .controls label { margin-right: 0.5rem; }
  select, button { background: #21262d; color: #fafafa; border: 1px solid #30363d; padding: 0.3rem 0.6rem; }
  .error { color: #ff7b72; padding: 1rem; border: 1px solid #ff7b72; }
  .muted { color: #8b949e; font-size: 0.9rem; }
</style>
</head>
<body>
<h1>Global Distribution of Climate Commitments and Greenwashing</h1>
<p>Greenwashing refers to the practice where firms exaggerate or misrepresent
their environmental performance or climate commitments to appear more
sustainable than they actually are. These views show the cross-country and
cross-industry distribution of three NLP-derived indices: CCII (climate
commitment intensity), GWE (greenwashing from environmental scores), and
GWGHG (greenwashing from greenhouse-gas emissions).</p>
<hr>

<h2>Global Indices Map</h2>
<div class="controls">
  <label>Indicator:
    <select id="indicator">
      <option value="ccii">CCII</option>
      <option value="gwe">GWE</option>
      <option value="gwghg">GWGHG</option>
    </select>
  </label>
  <label>Display mode:
    <select id="mode">
      <option value="single_year">Single Year</option>
      <option value="animated">Animate Over Years</option>
    </select>
  </label>
  <label>Year: <select id="year"></select></label>
</div>
<div id="country-map"></div>
<p class="muted">Hover over a country to view the exact values.</p>

<h2>Top 10 Countries Over Time</h2>
<div class="controls">
  <label>Index:
    <select id="rank_metric">
      <option value="ccii">Climate Commitment Intensity Index (CCII)</option>
      <option value="gwe">Greenwashing Index (GWE)</option>
      <option value="gwghg">Greenwashing Index (GWGHG)</option>
    </select>
  </label>
</div>
<div id="country-ranking"></div>

<h2>Industry-level Commitment vs Greenwashing</h2>
<div class="controls">
  <label>Greenwashing measure for Y-axis:
    <select id="industry_y">
      <option value="gwe">Greenwashing Index (GWE)</option>
      <option value="gwghg">Greenwashing Index (GWGHG)</option>
    </select>
  </label>
</div>
<div id="industry-quadrant"></div>
<p class="muted">The dashed lines split the plot into four quadrants:
top-right symbolic commitments, top-left formalist disclosure, bottom-left
low-risk industries, bottom-right substantive commitments.</p>
<hr>

<h2>Do you like these maps?</h2>
<div class="controls">
  <button id="like">&#11088; Like</button> <span id="like_count">0</span>
  <button id="really_like">&#11088;&#11088; Really Like</button> <span id="really_like_count">0</span>
</div>

<script>
const controls = ["indicator", "mode", "year", "rank_metric", "industry_y"];

function query() {
  const params = new URLSearchParams();
  for (const id of controls) {
    const el = document.getElementById(id);
    if (el.value) params.set(id, el.value);
  }
  return params.toString();
}

async function refresh() {
  const res = await fetch("/api/page?" + query());
  const page = await res.json();

  const yearSel = document.getElementById("year");
  if (yearSel.options.length === 0) {
    for (const y of page.years) {
      const opt = document.createElement("option");
      opt.value = y; opt.textContent = y;
      yearSel.appendChild(opt);
    }
    if (page.years.length) yearSel.value = page.years[page.years.length - 1];
  }

  for (const section of page.sections) {
    const div = document.getElementById(section.id);
    if (section.error) {
      div.innerHTML = '<div class="error">' + section.title + ": " + section.error + "</div>";
      continue;
    }
    Plotly.react(div, section.figure.data, section.figure.layout);
    if (section.figure.frames) {
      Plotly.addFrames(div, section.figure.frames);
    }
  }
  document.getElementById("like_count").textContent = page.like_count;
  document.getElementById("really_like_count").textContent = page.really_like_count;
}

async function click(button) {
  await fetch("/api/like?button=" + button);
  refresh();
}

for (const id of controls) {
  document.getElementById(id).addEventListener("change", refresh);
}
document.getElementById("like").addEventListener("click", () => click("like"));
document.getElementById("really_like").addEventListener("click", () => click("really_like"));
refresh();
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionState;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_csv(dir: &tempfile::TempDir, name: &str, header: &str, rows: &[&str]) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "{}", header).unwrap();
        for row in rows {
            writeln!(f, "{}", row).unwrap();
        }
        path
    }

    fn test_config(country: PathBuf, industry: PathBuf) -> Config {
        Config {
            country_csv: country,
            industry_csv: industry,
            bind_addr: "127.0.0.1".to_string(),
            port: 0,
            top_k: 10,
            out_dir: PathBuf::from("out"),
        }
    }

    #[test]
    fn test_all_sections_render_with_good_data() {
        let dir = tempfile::TempDir::new().unwrap();
        let country = write_csv(
            &dir,
            "country.csv",
            "country,year,ccii,gwe,gwghg",
            &["France,2020,1.0,0.5,0.2", "Japan,2020,2.0,0.1,0.4"],
        );
        let industry = write_csv(
            &dir,
            "industry.csv",
            "industry,year,ccii,gwe,gwghg",
            &["Energy,2020,-1.0,3.0,2.0", "Utilities,2020,2.0,1.0,0.5"],
        );
        let cache = DatasetCache::new();
        let page = build_page(&cache, &test_config(country, industry), &SessionState::new());

        assert_eq!(page.sections.len(), 3);
        for section in &page.sections {
            assert!(section.error.is_none(), "{} failed", section.id);
            assert!(section.figure.is_some());
        }
        assert_eq!(page.years, vec![2020]);
    }

    #[test]
    fn test_industry_failure_does_not_break_country_sections() {
        let dir = tempfile::TempDir::new().unwrap();
        let country = write_csv(
            &dir,
            "country.csv",
            "country,year,ccii,gwe,gwghg",
            &["France,2020,1.0,0.5,0.2"],
        );
        let missing = dir.path().join("industry.csv");
        let cache = DatasetCache::new();
        let page = build_page(&cache, &test_config(country, missing), &SessionState::new());

        let map = page.sections.iter().find(|s| s.id == "country-map").unwrap();
        assert!(map.figure.is_some());
        let quadrant = page
            .sections
            .iter()
            .find(|s| s.id == "industry-quadrant")
            .unwrap();
        assert!(quadrant.error.is_some());
    }

    #[test]
    fn test_empty_year_degrades_to_empty_chart() {
        let dir = tempfile::TempDir::new().unwrap();
        let country = write_csv(
            &dir,
            "country.csv",
            "country,year,ccii,gwe,gwghg",
            &["France,2020,1.0,0.5,0.2"],
        );
        let industry = write_csv(
            &dir,
            "industry.csv",
            "industry,year,ccii,gwe,gwghg",
            &["Energy,2020,-1.0,3.0,2.0"],
        );
        let cache = DatasetCache::new();
        let mut state = SessionState::new();
        state.selection.year = Some(1999);
        let page = build_page(&cache, &test_config(country, industry), &state);

        let map = page.sections.iter().find(|s| s.id == "country-map").unwrap();
        // Degraded, not failed: an empty figure with a notice.
        assert!(map.error.is_none());
        let figure = map.figure.as_ref().unwrap();
        assert!(figure["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_index_html_mentions_every_section() {
        let html = index_html();
        for id in ["country-map", "country-ranking", "industry-quadrant"] {
            assert!(html.contains(id), "missing {}", id);
        }
    }
}
