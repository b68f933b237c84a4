//! Static figure exporter: renders every figure the dashboard can show into
//! `out/figures/*.json`, plus a self-contained `out/site/index.html` that
//! embeds the default page for publishing without a server.

use anyhow::{Context, Result};
use std::fs;

use greenwash_atlas::cache::DatasetCache;
use greenwash_atlas::chart::{
    choropleth_figure, quadrant_scatter_figure, rank_trajectory_figure,
};
use greenwash_atlas::data::Metric;
use greenwash_atlas::page::build_page;
use greenwash_atlas::state::{Config, SessionState};
use greenwash_atlas::view::{country_map_view, industry_view, ranking_view, DisplayMode};

fn main() -> Result<()> {
    println!("=== greenwash-atlas figure export ===");
    let config = Config::from_env();
    let cache = DatasetCache::new();

    let figures_dir = config.out_dir.join("figures");
    fs::create_dir_all(&figures_dir)
        .with_context(|| format!("creating {}", figures_dir.display()))?;

    let mut written = 0usize;

    match cache.load(&config.country_csv) {
        Ok(country) => {
            for metric in Metric::ALL {
                let map = country_map_view(&country, metric, DisplayMode::Animated, None)
                    .map(|view| choropleth_figure(&view));
                match map {
                    Ok(figure) => {
                        let path = figures_dir.join(format!("map_{}.json", metric.column()));
                        fs::write(&path, serde_json::to_string_pretty(&figure)?)?;
                        written += 1;
                    }
                    Err(err) => eprintln!("skip map_{}: {}", metric.column(), err),
                }

                let rank =
                    rank_trajectory_figure(&ranking_view(&country, metric, config.top_k));
                let path = figures_dir.join(format!("rank_{}.json", metric.column()));
                fs::write(&path, serde_json::to_string_pretty(&rank)?)?;
                written += 1;
            }
        }
        Err(err) => eprintln!("skip country figures: {}", err),
    }

    match cache.load(&config.industry_csv) {
        Ok(industry) => {
            for metric in [Metric::Gwe, Metric::Gwghg] {
                match industry_view(&industry, metric).map(|v| quadrant_scatter_figure(&v)) {
                    Ok(figure) => {
                        let path =
                            figures_dir.join(format!("quadrant_{}.json", metric.column()));
                        fs::write(&path, serde_json::to_string_pretty(&figure)?)?;
                        written += 1;
                    }
                    Err(err) => eprintln!("skip quadrant_{}: {}", metric.column(), err),
                }
            }
        }
        Err(err) => eprintln!("skip industry figures: {}", err),
    }

    let site_dir = config.out_dir.join("site");
    fs::create_dir_all(&site_dir)?;
    let page = build_page(&cache, &config, &SessionState::new());
    let page_json = serde_json::to_string(&page)?;
    let html = STATIC_SITE_TEMPLATE.replace("/*__PAGE_JSON__*/null", &page_json);
    let site_path = site_dir.join("index.html");
    fs::write(&site_path, html)?;

    println!("  figures: {} written to {}", written, figures_dir.display());
    println!("  site: {}", site_path.display());
    Ok(())
}

const STATIC_SITE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Global Distribution of Climate Commitments and Greenwashing</title>
<script src="https://cdn.plot.ly/plotly-2.32.0.min.js"></script>
<style>
  body { background: #0E1117; color: #fafafa; font-family: sans-serif; margin: 0 auto; max-width: 1100px; padding: 1rem 2rem; }
  h2 { font-size: 1.2rem; margin-top: 2.5rem; }
  .error { color: #ff7b72; padding: 1rem; border: 1px solid #ff7b72; }
</style>
</head>
<body>
<h1>Global Distribution of Climate Commitments and Greenwashing</h1>
<div id="sections"></div>
<script>
const page = /*__PAGE_JSON__*/null;
const root = document.getElementById("sections");
for (const section of page.sections) {
  const h = document.createElement("h2");
  h.textContent = section.title;
  root.appendChild(h);
  const div = document.createElement("div");
  div.id = section.id;
  root.appendChild(div);
  if (section.error) {
    div.innerHTML = '<div class="error">' + section.error + "</div>";
    continue;
  }
  Plotly.newPlot(div, section.figure.data, section.figure.layout);
  if (section.figure.frames) {
    Plotly.addFrames(div, section.figure.frames);
  }
}
</script>
</body>
</html>
"#;
