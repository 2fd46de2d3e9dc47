//! Shared CLI definitions for rdtdash.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

/// Dashboard chart identifiers accepted by `--chart`.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChartKind {
    /// Positive tests per year (line)
    Trend,
    /// Positive tests per jurisdiction (bar, filtered by --year)
    Jurisdictions,
    /// Share of tests per detection stage (pie)
    Stages,
    /// Fines, arrests and charges per jurisdiction (grouped bar, filtered by --jurisdiction)
    Enforcement,
    /// Positive tests per age group (bar, filtered by --age-group)
    AgeGroups,
    /// Positive tests per state (choropleth with share donut, filtered by --year)
    StateMap,
}

impl ChartKind {
    pub const ALL: [Self; 6] = [
        Self::Trend,
        Self::Jurisdictions,
        Self::Stages,
        Self::Enforcement,
        Self::AgeGroups,
        Self::StateMap,
    ];

    /// Stable identifier used for file names and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trend => "trend",
            Self::Jurisdictions => "jurisdictions",
            Self::Stages => "stages",
            Self::Enforcement => "enforcement",
            Self::AgeGroups => "age_groups",
            Self::StateMap => "state_map",
        }
    }
}

/// Output format for exported charts
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ExportFormat {
    /// Scalable vector graphics
    Svg,
    /// Portable network graphics
    Png,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

/// A filter value given on the command line: `all` or one concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterArg<T> {
    All,
    Only(T),
}

fn parse_year_filter(s: &str) -> Result<FilterArg<i32>, String> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok(FilterArg::All);
    }
    trimmed
        .parse::<i32>()
        .map(FilterArg::Only)
        .map_err(|_| format!("expected a year or \"all\", got '{}'", s))
}

fn parse_label_filter(s: &str) -> Result<FilterArg<String>, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("filter value must not be empty".to_string());
    }
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok(FilterArg::All);
    }
    Ok(FilterArg::Only(trimmed.to_string()))
}

/// Command-line arguments for rdtdash
#[derive(Clone, Parser, Debug)]
#[command(
    name = "rdtdash",
    version,
    about = "Roadside drug testing dashboard",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Directory holding the dashboard sources (overrides config [data] dir)
    #[arg(long = "data-dir", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory to write chart files into (overrides config [render] out_dir)
    #[arg(long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Chart file format (default: svg)
    #[arg(long = "format", value_enum)]
    pub format: Option<ExportFormat>,

    /// Only render these charts. Repeat to select several; all charts when omitted
    #[arg(long = "chart", value_enum)]
    pub charts: Vec<ChartKind>,

    /// Year filter for the jurisdiction and state map charts: a year or "all"
    #[arg(long = "year", value_name = "YEAR", value_parser = parse_year_filter)]
    pub year: Option<FilterArg<i32>>,

    /// Jurisdiction filter for the enforcement chart: a code such as NSW, or "all"
    #[arg(long = "jurisdiction", value_name = "CODE", value_parser = parse_label_filter)]
    pub jurisdiction: Option<FilterArg<String>>,

    /// Age group filter for the age group chart, or "all"
    #[arg(long = "age-group", value_name = "GROUP", value_parser = parse_label_filter)]
    pub age_group: Option<FilterArg<String>>,

    /// Chart width in pixels (overrides config)
    #[arg(long = "width")]
    pub width: Option<u32>,

    /// Chart height in pixels (overrides config)
    #[arg(long = "height")]
    pub height: Option<u32>,

    /// Print aggregated tables and KPIs to stdout instead of writing chart files
    #[arg(long = "summary", action)]
    pub summary: bool,

    /// Enable debug logging (same as RUST_LOG=debug)
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file at ~/.config/rdtdash/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let mut parts = Vec::new();
        if let Some(s) = arg.get_short() {
            parts.push(format!("-{s}"));
        }
        if let Some(l) = arg.get_long() {
            parts.push(format!("--{l}"));
        }
        let op = parts.join(", ");
        let placeholder: String = if arg.get_action().takes_values() {
            arg.get_value_names()
                .map(|names| {
                    names
                        .iter()
                        .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default()
        } else {
            String::new()
        };
        let option_str = if placeholder.is_empty() {
            op
        } else {
            format!("{op} {placeholder}")
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_filter_parsing() {
        assert_eq!(parse_year_filter("all"), Ok(FilterArg::All));
        assert_eq!(parse_year_filter("ALL"), Ok(FilterArg::All));
        assert_eq!(parse_year_filter(" 2019 "), Ok(FilterArg::Only(2019)));
        assert!(parse_year_filter("twenty").is_err());
    }

    #[test]
    fn test_label_filter_parsing() {
        assert_eq!(
            parse_label_filter("NSW"),
            Ok(FilterArg::Only("NSW".to_string()))
        );
        assert_eq!(parse_label_filter("All"), Ok(FilterArg::All));
        assert!(parse_label_filter("  ").is_err());
    }

    #[test]
    fn test_args_parse_repeated_charts() {
        let args = Args::try_parse_from([
            "rdtdash",
            "--chart",
            "trend",
            "--chart",
            "state-map",
            "--year",
            "2020",
        ])
        .expect("args parse");
        assert_eq!(args.charts, vec![ChartKind::Trend, ChartKind::StateMap]);
        assert_eq!(args.year, Some(FilterArg::Only(2020)));
        assert!(!args.summary);
    }

    #[test]
    fn test_force_requires_generate_config() {
        assert!(Args::try_parse_from(["rdtdash", "--force"]).is_err());
        assert!(Args::try_parse_from(["rdtdash", "--generate-config", "--force"]).is_ok());
    }

    #[test]
    fn test_options_markdown_lists_flags() {
        let md = render_options_markdown();
        assert!(md.contains("--data-dir"));
        assert!(md.contains("--generate-config"));
        assert!(!md.contains("`--help`"));
    }

    #[test]
    fn test_chart_kind_ids_unique() {
        let mut ids: Vec<&str> = ChartKind::ALL.iter().map(|c| c.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), ChartKind::ALL.len());
    }
}
