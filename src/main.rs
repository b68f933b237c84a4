//! Dashboard server.
//!
//! Serves the page shell and per-section figure JSON over a single-threaded
//! HTTP loop. One server process hosts one session: the click counters start
//! at zero and die with the process.

use anyhow::Result;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;

use greenwash_atlas::cache::DatasetCache;
use greenwash_atlas::data::Metric;
use greenwash_atlas::logging::{self, obj, v_num, v_str, Domain};
use greenwash_atlas::page::{build_page, index_html};
use greenwash_atlas::state::{reduce, Config, SessionState, UiEvent};
use greenwash_atlas::view::DisplayMode;

fn main() -> Result<()> {
    let config = Config::from_env();
    let cache = DatasetCache::new();
    let mut session = SessionState::new();

    // Warm the cache so data problems surface at startup; a failure here
    // still leaves the other section rendering.
    for path in [&config.country_csv, &config.industry_csv] {
        if let Err(err) = cache.load(path) {
            logging::warn(
                Domain::System,
                "dataset_unavailable",
                obj(&[
                    ("path", v_str(&path.display().to_string())),
                    ("error", v_str(&err.to_string())),
                ]),
            );
        }
    }

    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = TcpListener::bind(&addr)?;
    logging::info(
        Domain::System,
        "listening",
        obj(&[("addr", v_str(&addr))]),
    );
    println!("greenwash-atlas dashboard at http://{}/", addr);

    for stream in listener.incoming() {
        let mut stream = match stream {
            Ok(s) => s,
            Err(_) => continue,
        };

        let buf_reader = BufReader::new(&stream);
        let request_line = match buf_reader.lines().next() {
            Some(Ok(line)) => line,
            _ => continue,
        };

        let (status, content_type, body) =
            route(&request_line, &config, &cache, &mut session);
        logging::info(
            Domain::Http,
            "request",
            obj(&[
                ("request", v_str(&request_line)),
                ("status", v_str(status)),
                ("bytes", v_num(body.len() as f64)),
            ]),
        );

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n{}",
            status,
            content_type,
            body.len(),
            body
        );
        let _ = stream.write_all(response.as_bytes());
    }

    Ok(())
}

fn route(
    request_line: &str,
    config: &Config,
    cache: &DatasetCache,
    session: &mut SessionState,
) -> (&'static str, &'static str, String) {
    let Some((path, query)) = parse_request_line(request_line) else {
        return ("400 BAD REQUEST", "text/plain", "Bad Request".to_string());
    };

    match path.as_str() {
        "/" => ("200 OK", "text/html; charset=utf-8", index_html()),
        "/api/health" => ("200 OK", "application/json", r#"{"status":"ok"}"#.to_string()),
        "/api/page" => {
            apply_selection(session, &query);
            let page = build_page(cache, config, session);
            let body = serde_json::to_string(&page).unwrap_or_else(|_| "{}".to_string());
            ("200 OK", "application/json", body)
        }
        "/api/like" => {
            match query.get("button").map(String::as_str) {
                Some("like") => reduce(session, UiEvent::Like),
                Some("really_like") => reduce(session, UiEvent::ReallyLike),
                _ => {}
            }
            logging::info(
                Domain::Session,
                "click",
                obj(&[
                    ("like_count", v_num(session.like_count as f64)),
                    ("really_like_count", v_num(session.really_like_count as f64)),
                ]),
            );
            let body = format!(
                r#"{{"like_count":{},"really_like_count":{}}}"#,
                session.like_count, session.really_like_count
            );
            ("200 OK", "application/json", body)
        }
        _ => ("404 NOT FOUND", "text/plain", "Not Found".to_string()),
    }
}

/// `GET /api/page?indicator=gwe HTTP/1.1` -> ("/api/page", {indicator: gwe})
fn parse_request_line(line: &str) -> Option<(String, HashMap<String, String>)> {
    let mut parts = line.split_whitespace();
    if parts.next() != Some("GET") {
        return None;
    }
    let target = parts.next()?;
    let (path, raw_query) = match target.split_once('?') {
        Some((p, q)) => (p, q),
        None => (target, ""),
    };
    let mut query = HashMap::new();
    for pair in raw_query.split('&').filter(|p| !p.is_empty()) {
        if let Some((k, v)) = pair.split_once('=') {
            query.insert(k.to_string(), v.to_string());
        }
    }
    Some((path.to_string(), query))
}

/// Translate query parameters into reducer events. Unknown values are
/// ignored; the selection keeps its previous state.
fn apply_selection(session: &mut SessionState, query: &HashMap<String, String>) {
    if let Some(metric) = query.get("indicator").and_then(|v| Metric::from_column(v)) {
        reduce(session, UiEvent::SelectIndicator(metric));
    }
    if let Some(mode) = query.get("mode").and_then(|v| DisplayMode::from_query(v)) {
        reduce(session, UiEvent::SelectMode(mode));
    }
    if let Some(raw) = query.get("year") {
        reduce(session, UiEvent::SelectYear(raw.parse().ok()));
    }
    if let Some(metric) = query.get("rank_metric").and_then(|v| Metric::from_column(v)) {
        reduce(session, UiEvent::SelectRankingMetric(metric));
    }
    if let Some(metric) = query.get("industry_y").and_then(|v| Metric::from_column(v)) {
        reduce(session, UiEvent::SelectIndustryMetric(metric));
    }
}
