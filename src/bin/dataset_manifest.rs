//! Dataset manifest generator: schema-checks an index CSV and writes a
//! `<file>.manifest.json` sidecar with its content hash and summary stats.

use greenwash_atlas::data::{
    analyze_table, default_manifest_path, validate_schema, ENTITY_COLUMNS, INDEX_COLUMNS,
};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "data/countrylevel.csv".to_string());
    let path = PathBuf::from(path);

    let now_ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let schema = match validate_schema(&path) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("schema check failed: {}", err);
            std::process::exit(1);
        }
    };

    if !schema.ok {
        eprintln!("schema mismatch: {}", schema.message);
        eprintln!(
            "expected columns: one of {:?}, then {:?}",
            ENTITY_COLUMNS, INDEX_COLUMNS
        );
        std::process::exit(2);
    }

    let manifest = match analyze_table(&path, now_ts) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("analysis failed: {}", err);
            std::process::exit(3);
        }
    };

    let out_path = default_manifest_path(&path);
    let payload = serde_json::to_string_pretty(&manifest).expect("manifest serializes");
    if let Err(err) = fs::write(&out_path, payload) {
        eprintln!("failed to write {}: {}", out_path.display(), err);
        std::process::exit(4);
    }
    println!("wrote manifest {}", out_path.display());
}
