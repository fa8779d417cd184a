use sdc_rs::cache::LoadCache;
use sdc_rs::combine::combine;
use sdc_rs::config::{LoaderOptions, SiteRegistry};
use sdc_rs::loader::{load_reader, load_site, load_sites};
use sdc_rs::models::SiteSource;
use sdc_rs::DashError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, body).unwrap();
    p
}

fn source(name: &str, path: PathBuf) -> SiteSource {
    SiteSource {
        name: name.into(),
        path,
    }
}

const BENIN: &str = "\
Timestamp,GHI,DNI,DHI,Tamb,Comments
2021-08-09 00:01:00,0.0,0.0,0.0,26.2,
2021-08-09 12:00:00,800.5,600.1,150.2,31.0,clean
2021-09-01 12:00:00,NaN,,120.0,30.5,
";

#[test]
fn loads_metrics_timestamps_and_drops_text_columns() {
    let dir = tempdir().unwrap();
    let p = write_csv(dir.path(), "benin.csv", BENIN);
    let t = load_site("Benin", &p, &LoaderOptions::default()).unwrap();

    assert_eq!(t.site, "Benin");
    assert_eq!(t.table.columns, vec!["GHI", "DNI", "DHI", "Tamb"]);
    assert!(t.table.has_timestamp);
    assert_eq!(t.table.len(), 3);
    assert!(t.table.rows.iter().all(|r| r.site == "Benin"));
    assert!(t.table.rows.iter().all(|r| r.timestamp.is_some()));

    let ghi = t.table.column_index("GHI").unwrap();
    let dhi = t.table.column_index("DHI").unwrap();
    assert_eq!(t.table.rows[1].value(ghi), Some(800.5));
    // missing GHI does not drop the row or its other metrics
    assert_eq!(t.table.rows[2].value(ghi), None);
    assert_eq!(t.table.rows[2].value(dhi), Some(120.0));
}

#[test]
fn existing_country_column_is_replaced_by_site_and_region_is_kept() {
    let csv = "Country,Region,GHI\nXX,North,10\nXX,,20\n";
    let t = load_reader("Togo", csv.as_bytes(), &LoaderOptions::default()).unwrap();
    assert_eq!(t.table.columns, vec!["GHI"]);
    assert!(!t.table.has_timestamp);
    assert_eq!(t.table.rows[0].site, "Togo");
    assert_eq!(t.table.rows[0].region.as_deref(), Some("North"));
    assert_eq!(t.table.rows[1].region, None);
}

#[test]
fn all_missing_column_is_still_a_metric_column() {
    let csv = "Timestamp,GHI\n2021-01-01 00:00:00,\n2021-01-01 01:00:00,NaN\n";
    let t = load_reader("C", csv.as_bytes(), &LoaderOptions::default()).unwrap();
    assert_eq!(t.table.columns, vec!["GHI"]);
    assert!(t.table.metric_values("GHI").is_empty());
}

#[test]
fn bad_cells_in_a_required_column_become_missing_values() {
    let csv = "\
Timestamp,GHI,Tamb
2021-01-01 12:00:00,500,30
2021-01-01 13:00:00,#VALUE!,31
2021-01-01 14:00:00,600,-
";
    let t = load_reader("A", csv.as_bytes(), &LoaderOptions::default()).unwrap();
    assert_eq!(t.table.columns, vec!["GHI", "Tamb"]);
    assert_eq!(t.table.len(), 3);

    let ghi = t.table.column_index("GHI").unwrap();
    let tamb = t.table.column_index("Tamb").unwrap();
    assert_eq!(t.table.rows[1].value(ghi), None);
    assert_eq!(t.table.rows[2].value(ghi), Some(600.0));
    // a mostly numeric column survives a stray text cell too
    assert_eq!(t.table.rows[2].value(tamb), None);
    let vals: Vec<f64> = t.table.metric_values("GHI").iter().map(|(_, v)| *v).collect();
    assert_eq!(vals, vec![500.0, 600.0]);
}

#[test]
fn required_column_without_any_number_is_still_kept() {
    let csv = "GHI,Tamb\nerr,20\nerr,21\n";
    let t = load_reader("A", csv.as_bytes(), &LoaderOptions::default()).unwrap();
    assert_eq!(t.table.columns, vec!["GHI", "Tamb"]);
    assert!(t.table.metric_values("GHI").is_empty());
}

#[test]
fn header_only_source_is_reported_not_loaded() {
    let err = load_reader("B", "GHI\n".as_bytes(), &LoaderOptions::default()).unwrap_err();
    assert!(matches!(err, DashError::SourceUnavailable { .. }));

    let dir = tempdir().unwrap();
    let a = write_csv(dir.path(), "a.csv", "GHI\n1\n");
    let b = write_csv(dir.path(), "b.csv", "GHI\n");
    let registry = SiteRegistry::new(vec![
        source("A", a),
        source("B", b),
    ])
    .unwrap();
    let loaded = load_sites(&registry, &LoaderOptions::default()).unwrap();
    assert_eq!(loaded.site_names(), vec!["A".to_string()]);
    assert_eq!(loaded.diagnostics.len(), 1);
    assert_eq!(loaded.diagnostics[0].site, "B");

    // every loaded site keeps an identity after combining
    let combined = combine(&loaded.sites);
    assert_eq!(combined.sites(), loaded.site_names());
}

#[test]
fn bad_sources_become_diagnostics_not_failures() {
    let dir = tempdir().unwrap();
    let good = write_csv(dir.path(), "good.csv", BENIN);
    let no_solar = write_csv(dir.path(), "wind.csv", "Timestamp,WS\n2021-01-01,3.2\n");
    let registry = SiteRegistry::new(vec![
        source("Missing", dir.path().join("nope.csv")),
        source("Benin", good),
        source("Windy", no_solar),
    ])
    .unwrap();

    let loaded = load_sites(&registry, &LoaderOptions::default()).unwrap();
    assert_eq!(loaded.site_names(), vec!["Benin".to_string()]);
    assert_eq!(loaded.diagnostics.len(), 2);
    assert_eq!(loaded.diagnostics[0].site, "Missing");
    assert!(matches!(
        loaded.diagnostics[0].error,
        DashError::SourceUnavailable { .. }
    ));
    assert_eq!(loaded.diagnostics[1].site, "Windy");
    assert!(matches!(
        loaded.diagnostics[1].error,
        DashError::SchemaMismatch { .. }
    ));
}

#[test]
fn every_site_failing_is_no_data_available() {
    let dir = tempdir().unwrap();
    let registry = SiteRegistry::single("Ghost", dir.path().join("ghost.csv"));
    let err = load_sites(&registry, &LoaderOptions::default()).unwrap_err();
    assert!(matches!(err, DashError::NoDataAvailable(_)));
    assert!(err.to_string().contains("Ghost"));

    let empty = SiteRegistry::new(Vec::new()).unwrap();
    assert!(matches!(
        load_sites(&empty, &LoaderOptions::default()),
        Err(DashError::NoDataAvailable(_))
    ));
}

#[test]
fn ragged_rows_are_a_parse_failure() {
    let csv = "GHI,DNI\n1,2\n3\n";
    let err = load_reader("R", csv.as_bytes(), &LoaderOptions::default()).unwrap_err();
    assert!(matches!(err, DashError::SourceUnavailable { .. }));
}

#[test]
fn cache_loads_once_and_rereads_after_invalidate() {
    let dir = tempdir().unwrap();
    let p = write_csv(dir.path(), "a.csv", "GHI\n1\n2\n");
    let registry = SiteRegistry::single("A", &p);
    let opts = LoaderOptions::default();
    let mut cache = LoadCache::new();

    assert_eq!(cache.load(&registry, &opts).unwrap().sites[0].table.len(), 2);
    assert!(cache.contains(&registry, &opts));

    // files are assumed static: a rewrite is invisible until invalidation
    fs::write(&p, "GHI\n1\n2\n3\n").unwrap();
    assert_eq!(cache.load(&registry, &opts).unwrap().sites[0].table.len(), 2);
    assert_eq!(cache.len(), 1);

    assert!(cache.invalidate(&registry, &opts));
    assert_eq!(cache.load(&registry, &opts).unwrap().sites[0].table.len(), 3);

    // a different registry is a different entry
    let other = SiteRegistry::single("B", &p);
    cache.load(&other, &opts).unwrap();
    assert_eq!(cache.len(), 2);
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn failed_loads_are_not_cached() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("late.csv");
    let registry = SiteRegistry::single("Late", &p);
    let opts = LoaderOptions::default();
    let mut cache = LoadCache::new();

    assert!(cache.load(&registry, &opts).is_err());
    assert!(cache.is_empty());
    fs::write(&p, "DNI\n5\n").unwrap();
    assert_eq!(cache.load(&registry, &opts).unwrap().sites.len(), 1);
}
