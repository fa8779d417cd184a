use sdc_rs::combine::combine;
use sdc_rs::filter::{EmptySelection, filter_sites};
use sdc_rs::models::{Measurement, MeasurementTable, SiteTable};

fn site(name: &str, columns: &[&str], rows: &[&[Option<f64>]]) -> SiteTable {
    SiteTable {
        site: name.into(),
        table: MeasurementTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            has_timestamp: false,
            rows: rows
                .iter()
                .map(|vals| Measurement {
                    site: name.into(),
                    timestamp: None,
                    region: None,
                    values: vals.to_vec(),
                })
                .collect(),
        },
    }
}

fn sample() -> Vec<SiteTable> {
    vec![
        site("A", &["GHI", "Tamb"], &[&[Some(1.0), Some(20.0)], &[Some(2.0), None]]),
        site("B", &["GHI"], &[&[Some(3.0)], &[Some(3.0)], &[None]]),
        site("C", &["DNI", "GHI"], &[&[Some(9.0), Some(4.0)]]),
    ]
}

#[test]
fn combine_keeps_every_row_in_registry_order() {
    let inputs = sample();
    let combined = combine(&inputs);

    let total: usize = inputs.iter().map(|s| s.table.len()).sum();
    assert_eq!(combined.len(), total);
    let sites: Vec<&str> = combined.rows.iter().map(|r| r.site.as_str()).collect();
    assert_eq!(sites, vec!["A", "A", "B", "B", "B", "C"]);
    assert_eq!(combined.sites(), vec!["A", "B", "C"]);
}

#[test]
fn combine_aligns_rows_to_the_column_union() {
    let combined = combine(&sample());
    assert_eq!(combined.columns, vec!["GHI", "Tamb", "DNI"]);
    let (ghi, tamb, dni) = (0, 1, 2);

    // duplicates survive
    assert_eq!(combined.rows[2].value(ghi), Some(3.0));
    assert_eq!(combined.rows[3].value(ghi), Some(3.0));
    // B never had Tamb
    assert_eq!(combined.rows[2].value(tamb), None);
    // C's columns were reordered
    assert_eq!(combined.rows[5].value(ghi), Some(4.0));
    assert_eq!(combined.rows[5].value(dni), Some(9.0));
    assert_eq!(combined.rows[0].value(tamb), Some(20.0));
}

#[test]
fn combine_of_nothing_is_empty_without_columns() {
    let combined = combine(&[]);
    assert!(combined.is_empty());
    assert!(combined.columns.is_empty());
    assert!(!combined.has_timestamp);
}

#[test]
fn filter_with_all_sites_is_identity() {
    let combined = combine(&sample());
    let all = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    for policy in [EmptySelection::ReturnAll, EmptySelection::ReturnNone] {
        assert_eq!(filter_sites(&combined, &all, policy), combined);
    }
}

#[test]
fn filter_keeps_order_and_leaves_input_untouched() {
    let combined = combine(&sample());
    let before = combined.clone();
    let out = filter_sites(
        &combined,
        &["C".to_string(), "A".to_string()],
        EmptySelection::ReturnAll,
    );
    let sites: Vec<&str> = out.rows.iter().map(|r| r.site.as_str()).collect();
    assert_eq!(sites, vec!["A", "A", "C"]);
    assert_eq!(out.columns, combined.columns);
    assert_eq!(combined, before);
}

#[test]
fn empty_selection_follows_the_configured_policy() {
    let combined = combine(&sample());

    let all = filter_sites(&combined, &[], EmptySelection::ReturnAll);
    assert_eq!(all, combined);

    let none = filter_sites(&combined, &[], EmptySelection::ReturnNone);
    assert!(none.is_empty());
    assert_eq!(none.columns, combined.columns);
}

#[test]
fn unknown_sites_select_nothing() {
    let combined = combine(&sample());
    let out = filter_sites(&combined, &["Z".to_string()], EmptySelection::ReturnAll);
    assert!(out.is_empty());
}
