use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sdc_rs::dashboard::{Dashboard, DashboardView, Panel};
use sdc_rs::models::{MeasurementTable, SiteSource};
use sdc_rs::stats::{self, round2};
use sdc_rs::{DashError, DashboardConfig, EmptySelection, Selection, SiteRegistry};
use sdc_rs::{storage, viz};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "sdc",
    version,
    about = "Compare solar irradiance measurements across sites"
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// TOML config with the site registry (defaults to ./sdc.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Ad hoc site source as NAME=PATH; repeatable, replaces the configured sites.
    #[arg(long = "site", value_name = "NAME=PATH", global = true)]
    sites: Vec<String>,
    /// Sites to compare, separated by comma or semicolon. Omit to select all loaded sites.
    #[arg(long, global = true)]
    select: Option<String>,
    /// Metric column to analyze (e.g., GHI, DNI, DHI, Tamb, WS, RH, BP).
    #[arg(short, long, default_value = "GHI", global = true)]
    metric: String,
    /// What an empty --select means for this command (overrides the config).
    #[arg(long, value_enum, global = true)]
    empty_selection: Option<EmptyPolicy>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the sites that loaded and the ones that were skipped.
    Sites,
    /// Per-site count, mean, median, std, min and max of the metric.
    Summary,
    /// Sites ranked by mean of the metric.
    Rank,
    /// Rows with the largest values of the metric.
    Top(TopArgs),
    /// Mean of the metric per site and month of year.
    Monthly,
    /// Full dashboard pass (all panels), optionally writing SVG charts.
    Report(ReportArgs),
    /// Save the combined table, the summary, or the ranking as CSV/JSON.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct TopArgs {
    /// Number of rows (defaults to the configured top_n).
    #[arg(short = 'n', long)]
    count: Option<usize>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Directory to write distribution/ranking/scatter/monthly SVG charts into.
    #[arg(long)]
    charts: Option<PathBuf>,
    /// Width of the charts (default 1000).
    #[arg(long, default_value_t = 1000)]
    width: u32,
    /// Height of the charts (default 600).
    #[arg(long, default_value_t = 600)]
    height: u32,
    /// Override the top-N row count.
    #[arg(short = 'n', long)]
    count: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EmptyPolicy {
    ReturnAll,
    ReturnNone,
}

impl From<EmptyPolicy> for EmptySelection {
    fn from(p: EmptyPolicy) -> Self {
        match p {
            EmptyPolicy::ReturnAll => EmptySelection::ReturnAll,
            EmptyPolicy::ReturnNone => EmptySelection::ReturnNone,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExportWhat {
    Combined,
    Summary,
    Ranking,
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long, value_enum)]
    what: ExportWhat,
    /// Output file (format inferred by --format or extension).
    #[arg(long)]
    out: PathBuf,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{:.2}", round2(x)),
        _ => "NA".to_string(),
    }
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn parse_site(s: &str) -> Result<SiteSource> {
    let (name, path) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("invalid --site '{s}', expected NAME=PATH"))?;
    Ok(SiteSource {
        name: name.trim().to_string(),
        path: PathBuf::from(path.trim()),
    })
}

fn build_config(common: &CommonArgs) -> Result<DashboardConfig> {
    let mut config = match &common.config {
        Some(path) => DashboardConfig::from_path(path)?,
        None if Path::new("sdc.toml").exists() => DashboardConfig::from_path("sdc.toml")?,
        None => DashboardConfig::default(),
    };
    if !common.sites.is_empty() {
        let sites = common
            .sites
            .iter()
            .map(|s| parse_site(s))
            .collect::<Result<Vec<_>>>()?;
        config.registry = SiteRegistry::new(sites)?;
    }
    if let Some(p) = common.empty_selection {
        config.selection.filter = p.into();
        config.selection.dashboard = p.into();
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut dash = Dashboard::new(build_config(&cli.common)?);

    let available = match dash.available_sites() {
        Ok(sites) => sites,
        Err(e @ DashError::NoDataAvailable(_)) => {
            eprintln!("{e}");
            eprintln!("Please ensure the site CSV files exist (see --config / --site).");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    for d in dash.diagnostics()? {
        eprintln!("warning: skipped site '{}' ({}): {}", d.site, d.path.display(), d.error);
    }

    let selected = match &cli.common.select {
        Some(s) => parse_list(s),
        None => available.clone(),
    };
    let metric = cli.common.metric.clone();

    match cli.cmd {
        Command::Sites => cmd_sites(&available),
        Command::Summary => cmd_summary(&dash.filtered(&selected)?, &metric),
        Command::Rank => cmd_rank(&dash.filtered(&selected)?, &metric),
        Command::Top(args) => {
            let n = args.count.unwrap_or(dash.config().display.top_n);
            cmd_top(&dash.filtered(&selected)?, &metric, n)
        }
        Command::Monthly => cmd_monthly(&dash.filtered(&selected)?, &metric),
        Command::Report(args) => {
            let mut selection = Selection::new(selected, metric);
            selection.top_n = args.count;
            let view = dash.render(&selection)?;
            print_report(&view);
            if let Some(dir) = args.charts.as_ref() {
                for p in viz::write_charts(&view, dir, args.width, args.height)? {
                    eprintln!("Wrote chart to {}", p.display());
                }
            }
            Ok(())
        }
        Command::Export(args) => cmd_export(&dash.filtered(&selected)?, &metric, args),
    }
}

fn cmd_sites(available: &[String]) -> Result<()> {
    for s in available {
        println!("{s}");
    }
    Ok(())
}

fn cmd_summary(table: &MeasurementTable, metric: &str) -> Result<()> {
    let rows = stats::group_summary(table, metric);
    if rows.is_empty() {
        println!("No '{metric}' data in the selected sites.");
        return Ok(());
    }
    let hl = stats::highlight_max(&rows);
    for s in rows {
        let mark = |site: &Option<String>| {
            if site.as_deref() == Some(s.site.as_str()) {
                "*"
            } else {
                ""
            }
        };
        println!(
            "{}  count={} missing={}  mean={}{} median={}{} std={} min={} max={}",
            s.site,
            s.count,
            s.missing,
            fmt_opt(s.mean),
            mark(&hl.max_mean),
            fmt_opt(s.median),
            mark(&hl.max_median),
            fmt_opt(s.std),
            fmt_opt(s.min),
            fmt_opt(s.max)
        );
    }
    Ok(())
}

fn cmd_rank(table: &MeasurementTable, metric: &str) -> Result<()> {
    let ranks = stats::rank_sites(table, metric);
    let Some(leader) = ranks.first() else {
        println!("No '{metric}' data in the selected sites.");
        return Ok(());
    };
    for (i, r) in ranks.iter().enumerate() {
        println!("{}. {}  mean={}  n={}", i + 1, r.site, fmt_opt(Some(r.mean)), r.count);
    }
    println!(
        "{} has the highest average {metric}: {}",
        leader.site,
        fmt_opt(Some(leader.mean))
    );
    Ok(())
}

fn cmd_top(table: &MeasurementTable, metric: &str, n: usize) -> Result<()> {
    let rows = stats::top_n(table, metric, n);
    if rows.is_empty() {
        println!("No '{metric}' data in the selected sites.");
    }
    for r in rows {
        println!("{}  {metric}={}", r.site, fmt_opt(Some(r.value)));
    }
    Ok(())
}

fn cmd_monthly(table: &MeasurementTable, metric: &str) -> Result<()> {
    let rows = stats::monthly_means(table, metric);
    if rows.is_empty() {
        println!("No timestamped '{metric}' data in the selected sites.");
    }
    for m in rows {
        println!("{}  month={:02}  mean={}  n={}", m.site, m.month, fmt_opt(Some(m.mean)), m.count);
    }
    Ok(())
}

fn print_report(view: &DashboardView) {
    println!("== {} ({} rows)", view.metric, view.rows);

    println!("-- Summary statistics");
    match &view.summary {
        Panel::Ready(t) => {
            for s in &t.rows {
                println!(
                    "{}  count={}  mean={} median={} std={} min={} max={}",
                    s.site,
                    s.count,
                    fmt_opt(s.mean),
                    fmt_opt(s.median),
                    fmt_opt(s.std),
                    fmt_opt(s.min),
                    fmt_opt(s.max)
                );
            }
        }
        Panel::Notice(n) => println!("{n}"),
    }

    println!("-- Ranking");
    match &view.ranking {
        Panel::Ready(r) => {
            for (i, s) in r.ranks.iter().enumerate() {
                println!("{}. {}  {}", i + 1, s.site, fmt_opt(Some(s.mean)));
            }
            println!(
                "{} has the highest average {}: {}",
                r.leader.site,
                r.metric,
                fmt_opt(Some(r.leader.mean))
            );
        }
        Panel::Notice(n) => println!("{n}"),
    }

    println!("-- Top rows");
    match &view.top_rows {
        Panel::Ready(rows) => {
            for r in rows {
                println!("{}  {}", r.site, fmt_opt(Some(r.value)));
            }
        }
        Panel::Notice(n) => println!("{n}"),
    }

    println!("-- Monthly averages");
    match &view.monthly {
        Panel::Ready(m) => {
            for s in &m.series {
                let cells: Vec<String> = s
                    .points
                    .iter()
                    .map(|(month, v)| format!("{month:02}:{}", fmt_opt(Some(*v))))
                    .collect();
                println!("{}  {}", s.site, cells.join(" "));
            }
        }
        Panel::Notice(n) => println!("{n}"),
    }

    println!("-- Top regions");
    match &view.regions {
        Panel::Ready(rows) => {
            for r in rows {
                println!("{} / {}  {}", r.site, r.region, fmt_opt(Some(r.mean)));
            }
        }
        Panel::Notice(n) => println!("{n}"),
    }
}

fn cmd_export(table: &MeasurementTable, metric: &str, args: ExportArgs) -> Result<()> {
    let path = &args.out;
    let fmt = match args.format {
        Some(OutFormat::Csv) => "csv",
        Some(OutFormat::Json) => "json",
        None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
    }
    .to_ascii_lowercase();
    match (args.what, fmt.as_str()) {
        (ExportWhat::Combined, "csv") => storage::save_table_csv(table, path)?,
        (ExportWhat::Combined, "json") => storage::save_json(table, path)?,
        (ExportWhat::Summary, "csv") => {
            storage::save_summary_csv(&stats::group_summary(table, metric), path)?
        }
        (ExportWhat::Summary, "json") => {
            storage::save_json(&stats::group_summary(table, metric), path)?
        }
        (ExportWhat::Ranking, "csv") => {
            storage::save_ranking_csv(&stats::rank_sites(table, metric), path)?
        }
        (ExportWhat::Ranking, "json") => {
            storage::save_json(&stats::rank_sites(table, metric), path)?
        }
        (_, other) => anyhow::bail!("unsupported format: {}", other),
    }
    eprintln!("Saved {:?} to {}", args.what, path.display());
    Ok(())
}
