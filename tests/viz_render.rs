use sdc_rs::dashboard::{MonthlyView, RankingView, ScatterView};
use sdc_rs::series::{BoxSummary, MonthlySeries, ScatterSeries};
use sdc_rs::stats::SiteRank;
use sdc_rs::viz;
use sdc_rs::{Dashboard, DashboardConfig, Selection, SiteRegistry};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn assert_svg(path: &Path) {
    let txt = fs::read_to_string(path).expect("svg written");
    assert!(txt.contains("<svg"), "{} is not an svg", path.display());
    assert!(txt.len() > 200);
}

fn boxes() -> Vec<BoxSummary> {
    vec![
        BoxSummary {
            site: "Benin".into(),
            count: 10,
            q1: 200.0,
            median: 450.0,
            q3: 700.0,
            lower_whisker: 0.0,
            upper_whisker: 1100.0,
            outliers: vec![1400.0],
        },
        BoxSummary {
            site: "Sierra Leone with a very long station name".into(),
            count: 8,
            q1: 150.0,
            median: 300.0,
            q3: 520.0,
            lower_whisker: 0.0,
            upper_whisker: 900.0,
            outliers: Vec::new(),
        },
    ]
}

fn rank(site: &str, mean: f64) -> SiteRank {
    SiteRank {
        site: site.into(),
        mean,
        count: 5,
    }
}

#[test]
fn each_chart_kind_writes_an_svg() {
    let dir = tempdir().unwrap();

    let p = dir.path().join("box.svg");
    viz::plot_boxplot(&boxes(), "GHI", &p, 800, 500).unwrap();
    assert_svg(&p);

    let ranks = vec![rank("Benin", 240.5), rank("Togo", 230.1), rank("Sierra Leone", 185.0)];
    let ranking = RankingView {
        metric: "GHI".into(),
        leader: ranks[0].clone(),
        ranks,
    };
    let p = dir.path().join("rank.svg");
    viz::plot_ranking(&ranking, &p, 800, 500).unwrap();
    assert_svg(&p);

    let scatter = ScatterView {
        x: "Tamb".into(),
        y: "GHI".into(),
        series: vec![
            ScatterSeries {
                site: "Benin".into(),
                points: vec![(25.0, 100.0), (31.0, 850.0)],
            },
            ScatterSeries {
                site: "Togo".into(),
                points: vec![(22.0, 50.0)],
            },
        ],
    };
    let p = dir.path().join("scatter.svg");
    viz::plot_scatter(&scatter, &p, 800, 500).unwrap();
    assert_svg(&p);

    let monthly = MonthlyView {
        metric: "GHI".into(),
        series: vec![
            MonthlySeries {
                site: "Benin".into(),
                points: vec![(1, 210.0), (2, 250.0), (6, 180.0)],
            },
            MonthlySeries {
                site: "Togo".into(),
                points: vec![(12, 1500.0)],
            },
        ],
    };
    let p = dir.path().join("monthly.svg");
    viz::plot_monthly(&monthly, &p, 800, 500).unwrap();
    assert_svg(&p);
}

#[test]
fn empty_payloads_are_rejected() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("empty.svg");
    assert!(viz::plot_boxplot(&[], "GHI", &p, 400, 300).is_err());
    let scatter = ScatterView {
        x: "Tamb".into(),
        y: "GHI".into(),
        series: Vec::new(),
    };
    assert!(viz::plot_scatter(&scatter, &p, 400, 300).is_err());
}

#[test]
fn write_charts_renders_ready_panels_only() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("a.csv");
    fs::write(
        &csv,
        "Timestamp,GHI,Tamb\n2022-01-05 12:00:00,500,30\n2022-02-05 12:00:00,600,31\n",
    )
    .unwrap();
    let mut dash = Dashboard::new(DashboardConfig::with_registry(SiteRegistry::single("A", &csv)));
    let view = dash.render(&Selection::new(vec!["A".into()], "GHI")).unwrap();

    let out = dir.path().join("charts");
    let written = viz::write_charts(&view, &out, 640, 400).unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["distribution.svg", "ranking.svg", "scatter.svg", "monthly.svg"]
    );
    for p in &written {
        assert_svg(p);
    }

    // without timestamps the monthly panel is a notice and gets no file
    fs::write(&csv, "GHI,Tamb\n500,30\n").unwrap();
    dash.invalidate();
    let view = dash.render(&Selection::new(vec!["A".into()], "GHI")).unwrap();
    let written = viz::write_charts(&view, dir.path().join("plain"), 640, 400).unwrap();
    assert_eq!(written.len(), 3);
    assert!(!dir.path().join("plain/monthly.svg").exists());
}
