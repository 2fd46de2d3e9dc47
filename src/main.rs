use clap::Parser;
use color_eyre::Result;
use rdtdash::chart_export::write_chart;
use rdtdash::charts;
use rdtdash::cli::FilterArg;
use rdtdash::{
    AppConfig, Args, ChartKind, ConfigManager, Content, Dashboard, DashboardEvent, Frame,
    SelectionChange, Theme, APP_NAME,
};
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        match ConfigManager::new(APP_NAME) {
            Ok(manager) => match manager.write_default_config(args.force) {
                Ok(path) => {
                    println!("Default configuration written to {}", path.display());
                    return Ok(Some(()));
                }
                Err(e) => {
                    eprintln!("Error writing config: {}", e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error initializing config manager: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

/// `RUST_LOG` wins over the configured level unless `--debug` was given.
fn init_logging(args: &Args, config: &AppConfig) {
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Filters from the command line, addressed to the charts that use them.
fn initial_selections(args: &Args) -> Vec<(ChartKind, SelectionChange)> {
    let mut changes = Vec::new();
    if let Some(year) = &args.year {
        for kind in [ChartKind::Jurisdictions, ChartKind::StateMap] {
            changes.push((kind, SelectionChange::Year(year.clone().into())));
        }
    }
    if let Some(code) = &args.jurisdiction {
        changes.push((
            ChartKind::Enforcement,
            SelectionChange::Category(code.clone().into()),
        ));
    }
    if let Some(group) = &args.age_group {
        changes.push((
            ChartKind::AgeGroups,
            SelectionChange::Category(group.clone().into()),
        ));
    }
    changes
}

fn selected_charts(args: &Args) -> Vec<ChartKind> {
    if args.charts.is_empty() {
        return ChartKind::ALL.to_vec();
    }
    let mut kinds = args.charts.clone();
    kinds.sort();
    kinds.dedup();
    kinds
}

fn print_summary(frames: &[Frame]) {
    for frame in frames {
        println!("== {} ==", frame.title);
        match &frame.content {
            Content::Empty(message) => println!("{}", message),
            Content::View(view) if view.is_empty() => println!("(no data)"),
            Content::View(view) => {
                let rows = view.rows();
                let width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
                for (key, value) in rows {
                    println!(
                        "{:<width$}  {:>12}",
                        key,
                        rdtdash::format::format_number(value),
                        width = width
                    );
                }
                for line in view.kpi_lines() {
                    println!("{}", line);
                }
            }
        }
        println!();
    }
}

fn write_frames(frames: &[Frame], config: &AppConfig, theme: &Theme) -> Result<()> {
    let format = config.render.export_format()?;
    let out_dir: &Path = &config.render.out_dir;
    std::fs::create_dir_all(out_dir)?;
    for frame in frames {
        let path = out_dir.join(format!("{}.{}", frame.chart.as_str(), format.extension()));
        write_chart(&path, format, frame.title, &frame.content, theme, frame.size)?;
        info!(chart = %frame.chart.as_str(), path = %path.display(), "wrote chart");
    }
    Ok(())
}

fn run(args: &Args, config: &AppConfig) -> Result<()> {
    let theme = Theme::from_config(&config.theme)?;
    let sources = config.sources();
    let kinds = selected_charts(args);

    let (tx, rx) = channel::<DashboardEvent>();
    let mut dashboard = Dashboard::new(
        tx,
        kinds
            .iter()
            .map(|kind| charts::build(*kind, &sources))
            .collect(),
        (config.render.width, config.render.height),
        Duration::from_millis(config.dashboard.resize_debounce_ms),
    );
    for (kind, change) in initial_selections(args) {
        dashboard.event(DashboardEvent::Select(kind, change));
    }
    for kind in &kinds {
        dashboard.event(DashboardEvent::Load(*kind));
    }
    dashboard.run_until_settled(
        &rx,
        Duration::from_millis(config.dashboard.event_poll_interval_ms),
    );

    let frames = dashboard.drain_frames();
    if args.summary {
        print_summary(&frames);
        Ok(())
    } else {
        write_frames(&frames, config, &theme)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    let mut config = AppConfig::load(APP_NAME)?;
    config.apply_args(&args);
    config.validate()?;
    init_logging(&args, &config);

    if let Err(e) = run(&args, &config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdtdash::Filter;

    #[test]
    fn cli_filters_target_their_charts() {
        let args = Args::try_parse_from([
            "rdtdash",
            "--year",
            "2021",
            "--jurisdiction",
            "NSW",
            "--age-group",
            "all",
        ])
        .expect("args parse");
        let changes = initial_selections(&args);
        assert_eq!(
            changes,
            vec![
                (ChartKind::Jurisdictions, SelectionChange::Year(Filter::Only(2021))),
                (ChartKind::StateMap, SelectionChange::Year(Filter::Only(2021))),
                (
                    ChartKind::Enforcement,
                    SelectionChange::Category(Filter::Only("NSW".to_string()))
                ),
                (ChartKind::AgeGroups, SelectionChange::Category(Filter::All)),
            ]
        );
        assert!(matches!(args.year, Some(FilterArg::Only(2021))));
    }

    #[test]
    fn chart_selection_defaults_to_all() {
        let args = Args::try_parse_from(["rdtdash"]).expect("args parse");
        assert_eq!(selected_charts(&args), ChartKind::ALL.to_vec());
        let args = Args::try_parse_from(["rdtdash", "--chart", "stages", "--chart", "trend", "--chart", "stages"])
            .expect("args parse");
        assert_eq!(selected_charts(&args), vec![ChartKind::Trend, ChartKind::Stages]);
    }
}
