use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llm_prices_core::{
    align::{align, series_names, AlignedRow, DateRange, PriceField},
    api::ApiSource,
    batch::{fetch_histories, settle, HistoryTarget},
    model::normalize_model_name,
    provider::find_provider,
    MockSource, ModelInfo, PriceError, PriceQuote, PriceSource, ALL_PROVIDERS,
};

// ── Palette ──────────────────────────────────────────────────────────

fn s_header() -> Style { Style::new().color256(252).bold() }  // bright gray, bold
fn s_dim() -> Style    { Style::new().color256(248) }         // light gray
fn s_tree() -> Style   { Style::new().color256(245) }         // mid gray
fn s_hint() -> Style   { Style::new().color256(243) }         // soft gray
fn s_err() -> Style    { Style::new().color256(167) }         // red
fn s_bold() -> Style   { Style::new().bold() }
fn s_accent() -> Style { Style::new().color256(109) }         // teal accent
fn s_label() -> Style  { Style::new().color256(146) }         // muted lavender

fn sep(width: usize) -> String {
    s_tree().apply_to("\u{2500}".repeat(width)).to_string()
}

fn fmt_price(v: f64) -> String {
    if v >= 1.0 {
        format!("${:.2}", v)
    } else {
        format!("${:.3}", v)
    }
}

/// Day-over-day delta: a drop reads green, a hike red, flat is a dash.
fn change_cell(change: Option<f64>) -> Cell {
    match change {
        Some(c) if c < 0.0 => {
            Cell::new(format!("\u{25bc} {:.2}%", c.abs())).fg(Color::AnsiValue(114))
        }
        Some(c) if c > 0.0 => {
            Cell::new(format!("\u{25b2} {:.2}%", c)).fg(Color::AnsiValue(167))
        }
        _ => Cell::new("\u{2500}").fg(Color::AnsiValue(245)),
    }
}

// ── CLI Args ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "llm-prices",
    about = "Browse and compare AI-model API pricing across providers",
    version,
    after_help = "examples:\n  \
        llm-prices                               (dashboard: prices + 30-day chart)\n  \
        llm-prices --provider anthropic          (dashboard for one provider)\n  \
        llm-prices prices                        (current prices, all providers)\n  \
        llm-prices history GPT-4 --days 14\n  \
        llm-prices compare GPT-4 Claude-3-Opus\n  \
        llm-prices compare GPT-4 Claude-3-Opus --field output \\\n      --from 2025-03-01 --to 2025-03-10\n  \
        llm-prices --api http://localhost:8000 prices"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base URL of a pricing service; built-in mock data when omitted.
    #[arg(long, global = true)]
    api: Option<String>,

    #[arg(long, short, global = true)]
    json: bool,

    /// Provider shown on the dashboard ("all" for the union).
    #[arg(long, default_value = ALL_PROVIDERS)]
    provider: String,

    /// Price scalar charted on the dashboard: input or output.
    #[arg(long, default_value = "input")]
    field: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List providers with their model counts.
    Providers,
    /// Current prices with day-over-day deltas.
    Prices {
        /// Provider name, or "all" for the union.
        provider: Option<String>,
    },
    /// Price history for one model.
    History {
        model: String,
        #[arg(long, short)]
        provider: Option<String>,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Compare two models on a shared day timeline.
    Compare {
        model_a: String,
        model_b: String,
        /// Price scalar to chart: input or output.
        #[arg(long, short, default_value = "input")]
        field: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
        /// Inclusive range start (YYYY-MM-DD); requires --to.
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Inclusive range end (YYYY-MM-DD); requires --from.
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Ask the source to refresh its pricing data.
    Refresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let source: Arc<dyn PriceSource> = match cli.api.as_deref() {
        Some(url) => Arc::new(ApiSource::new(url)),
        None => Arc::new(MockSource::new()),
    };

    match cli.command {
        Some(Commands::Providers) => cmd_providers(source, &cli).await?,
        Some(Commands::Prices { ref provider }) => {
            let provider = provider.as_deref().unwrap_or(ALL_PROVIDERS);
            cmd_prices(source, provider, &cli).await?;
        }
        Some(Commands::History { ref model, ref provider, days }) => {
            cmd_history(source, model, provider.as_deref(), days, &cli).await?;
        }
        Some(Commands::Compare { ref model_a, ref model_b, ref field, days, from, to }) => {
            let field = parse_field(field)?;
            let range = parse_range(from, to)?;
            cmd_compare(source, model_a, model_b, field, days, range, &cli).await?;
        }
        Some(Commands::Refresh) => cmd_refresh(source).await?,
        None => {
            let field = parse_field(&cli.field)?;
            cmd_dashboard(source, &cli.provider, field, &cli).await?;
        }
    }
    Ok(())
}

fn parse_field(s: &str) -> anyhow::Result<PriceField> {
    PriceField::from_str(s).map_err(|e| anyhow::anyhow!("{e} (expected input or output)"))
}

fn parse_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> anyhow::Result<Option<DateRange>> {
    match (from, to) {
        (Some(from), Some(to)) => {
            if from > to {
                anyhow::bail!("--from {from} is after --to {to}");
            }
            Ok(Some(DateRange::days(from, to)))
        }
        (None, None) => Ok(None),
        _ => anyhow::bail!("--from and --to must be given together"),
    }
}

/// Resolve a user-typed model name against the source's model list.
async fn resolve_model(
    source: &Arc<dyn PriceSource>,
    query: &str,
) -> anyhow::Result<ModelInfo> {
    let models = source.list_models().await?;
    let wanted = normalize_model_name(query);
    models
        .iter()
        .find(|m| m.normalized_id() == wanted)
        .cloned()
        .ok_or_else(|| {
            let known: Vec<&str> = models.iter().map(|m| m.display_name.as_str()).collect();
            anyhow::anyhow!(
                "model not found: {query}\n  known models: {}",
                known.join(", ")
            )
        })
}

// ── Dashboard ────────────────────────────────────────────────────────

async fn cmd_dashboard(
    source: Arc<dyn PriceSource>,
    provider: &str,
    field: PriceField,
    opts: &Cli,
) -> anyhow::Result<()> {
    let term = Term::stderr();
    term.write_line(&format!("{}", s_dim().apply_to("loading...")))?;

    let providers = source.list_providers().await?;
    let quotes = source.list_prices(provider).await?;
    let models = source.list_models().await?;

    let targets: Vec<HistoryTarget> = models
        .iter()
        .filter(|m| {
            provider.eq_ignore_ascii_case(ALL_PROVIDERS)
                || m.provider.eq_ignore_ascii_case(provider)
        })
        .map(HistoryTarget::from)
        .collect();
    let (histories, failures) = settle(fetch_histories(Arc::clone(&source), &targets, 30).await);
    term.clear_last_lines(1)?;

    let rows = align(&histories, field, None);

    if opts.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "providers": providers,
                "prices": quotes,
                "chart": rows,
            }))?
        );
        return Ok(());
    }

    let scope = if provider.eq_ignore_ascii_case(ALL_PROVIDERS) {
        "all providers".to_string()
    } else {
        provider.to_string()
    };

    println!();
    println!("{}", s_header().apply_to("model pricing dashboard"));
    println!("{}", sep(64));

    let total_models: usize = providers.iter().map(|p| p.model_count).sum();
    for p in &providers {
        println!(
            "  {:<16} {}",
            s_bold().apply_to(&p.name),
            s_dim().apply_to(format!("{} models", p.model_count)),
        );
    }
    println!(
        "  {}",
        s_hint().apply_to(format!("{} providers, {} models", providers.len(), total_models)),
    );

    println!();
    println!(
        "{}  {}",
        s_header().apply_to("current prices"),
        s_dim().apply_to(format!("per 1M tokens, {scope}")),
    );
    print_prices_table(&quotes);

    if !rows.is_empty() {
        println!();
        println!(
            "{}  {}",
            s_header().apply_to("price history"),
            s_dim().apply_to(format!("last 30 days, {} price, {scope}", field.label())),
        );
        print_aligned_table(&rows);
    }
    print_failures(&failures);

    println!(
        "{}",
        s_hint().apply_to("  llm-prices compare <a> <b> to put two models side by side"),
    );
    println!();
    Ok(())
}

// ── Providers ────────────────────────────────────────────────────────

async fn cmd_providers(source: Arc<dyn PriceSource>, opts: &Cli) -> anyhow::Result<()> {
    let providers = source.list_providers().await?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&providers)?);
        return Ok(());
    }

    println!();
    println!("{}", s_header().apply_to("providers"));
    println!("{}", sep(64));
    for p in &providers {
        let page = find_provider(&p.name)
            .map(|r| r.pricing_url)
            .unwrap_or_default();
        println!(
            "  {:<16} {:<12} {}",
            s_bold().apply_to(&p.name),
            s_dim().apply_to(format!("{} models", p.model_count)),
            s_hint().apply_to(page),
        );
    }
    println!("{}", sep(64));
    println!(
        "{}",
        s_hint().apply_to(format!(
            "  {} providers   llm-prices prices <name> for their models",
            providers.len()
        ))
    );
    println!();
    Ok(())
}

// ── Prices ───────────────────────────────────────────────────────────

async fn cmd_prices(
    source: Arc<dyn PriceSource>,
    provider: &str,
    opts: &Cli,
) -> anyhow::Result<()> {
    let quotes = source.list_prices(provider).await?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&quotes)?);
        return Ok(());
    }

    if quotes.is_empty() {
        eprintln!(
            "{}",
            s_err().apply_to(format!("error: no prices for provider '{provider}'"))
        );
        eprintln!();
        eprintln!(
            "{}",
            s_dim().apply_to("  llm-prices providers lists what's available")
        );
        return Ok(());
    }

    println!();
    println!(
        "{}  {}",
        s_header().apply_to("current prices"),
        s_dim().apply_to("per 1M tokens"),
    );
    print_prices_table(&quotes);
    println!();
    Ok(())
}

fn print_prices_table(quotes: &[PriceQuote]) {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("  Model").fg(Color::AnsiValue(243)),
        Cell::new("Provider").fg(Color::AnsiValue(243)),
        Cell::new("In $/1M").fg(Color::AnsiValue(243)),
        Cell::new("\u{0394} in").fg(Color::AnsiValue(243)),
        Cell::new("Out $/1M").fg(Color::AnsiValue(243)),
        Cell::new("\u{0394} out").fg(Color::AnsiValue(243)),
        Cell::new("Updated").fg(Color::AnsiValue(243)),
    ]);

    for q in quotes {
        table.add_row(vec![
            Cell::new(format!("  {}", q.model)).fg(Color::AnsiValue(252)),
            Cell::new(&q.provider).fg(Color::AnsiValue(146)),
            Cell::new(fmt_price(q.input_price_per_m)).fg(Color::AnsiValue(109)),
            change_cell(q.input_change_pct),
            Cell::new(fmt_price(q.output_price_per_m)).fg(Color::AnsiValue(109)),
            change_cell(q.output_change_pct),
            Cell::new(q.last_updated.format("%b %d, %Y").to_string())
                .fg(Color::AnsiValue(245)),
        ]);
    }
    println!("{table}");
}

// ── History ──────────────────────────────────────────────────────────

async fn cmd_history(
    source: Arc<dyn PriceSource>,
    model: &str,
    provider: Option<&str>,
    days: u32,
    opts: &Cli,
) -> anyhow::Result<()> {
    let resolved = resolve_model(&source, model).await?;
    let provider = provider.unwrap_or(&resolved.provider);
    let history = source.history(&resolved.display_name, provider, days).await?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    println!();
    println!(
        "{}  {}  {}",
        s_bold().apply_to(&history.model),
        s_label().apply_to(&history.provider),
        s_dim().apply_to(format!("last {days} days")),
    );

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("  Date").fg(Color::AnsiValue(243)),
        Cell::new("In $/1M").fg(Color::AnsiValue(243)),
        Cell::new("Out $/1M").fg(Color::AnsiValue(243)),
    ]);
    for p in history.sorted_points() {
        table.add_row(vec![
            Cell::new(format!("  {}", p.timestamp.format("%Y-%m-%d"))).fg(Color::AnsiValue(252)),
            Cell::new(fmt_price(p.input_price_per_m)).fg(Color::AnsiValue(109)),
            Cell::new(fmt_price(p.output_price_per_m)).fg(Color::AnsiValue(109)),
        ]);
    }
    println!("{table}");

    if let Some(last) = history.latest() {
        let fmt_delta = |d: Option<f64>| {
            d.map(|v| format!("{:+.2}%", v))
                .unwrap_or_else(|| "\u{2500}".to_string())
        };
        println!(
            "  {}",
            s_hint().apply_to(format!(
                "latest: in {} out {}   day-over-day: in {}  out {}",
                fmt_price(last.input_price_per_m),
                fmt_price(last.output_price_per_m),
                fmt_delta(history.change_pct(true)),
                fmt_delta(history.change_pct(false)),
            ))
        );
    }
    println!();
    Ok(())
}

// ── Compare ──────────────────────────────────────────────────────────

async fn cmd_compare(
    source: Arc<dyn PriceSource>,
    model_a: &str,
    model_b: &str,
    field: PriceField,
    days: u32,
    range: Option<DateRange>,
    opts: &Cli,
) -> anyhow::Result<()> {
    let a = resolve_model(&source, model_a).await?;
    let b = resolve_model(&source, model_b).await?;

    let targets = vec![HistoryTarget::from(&a), HistoryTarget::from(&b)];
    let (histories, failures) = settle(fetch_histories(Arc::clone(&source), &targets, days).await);
    let rows = align(&histories, field, range.as_ref());

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let range_label = match &range {
        Some(r) => format!(
            "{} to {}",
            r.start.format("%Y-%m-%d"),
            r.end.format("%Y-%m-%d"),
        ),
        None => "full window".to_string(),
    };

    println!();
    println!(
        "{}  {}",
        s_header().apply_to(format!(
            "{} vs {}",
            a.display_name, b.display_name
        )),
        s_dim().apply_to(format!("{} price, {range_label}", field.label())),
    );

    if rows.is_empty() {
        println!();
        println!(
            "  {}",
            s_dim().apply_to("no observations in the selected range")
        );
    } else {
        print_aligned_table(&rows);
    }
    print_failures(&failures);
    println!();
    Ok(())
}

fn print_aligned_table(rows: &[AlignedRow]) {
    let names = series_names(rows);

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    let mut header = vec![Cell::new("  Date").fg(Color::AnsiValue(243))];
    for name in &names {
        header.push(Cell::new(name).fg(Color::AnsiValue(243)));
    }
    table.set_header(header);

    for row in rows {
        let mut cells = vec![Cell::new(format!("  {}", row.label)).fg(Color::AnsiValue(252))];
        for name in &names {
            cells.push(match row.cells.get(name) {
                Some(v) => Cell::new(fmt_price(*v)).fg(Color::AnsiValue(109)),
                None => Cell::new("\u{2500}").fg(Color::AnsiValue(245)),
            });
        }
        table.add_row(cells);
    }
    println!("{table}");
}

fn print_failures(failures: &[(String, PriceError)]) {
    for (model, err) in failures {
        println!(
            "  {}",
            s_err().apply_to(format!("\u{2717} {model}: {err}"))
        );
    }
}

// ── Refresh ──────────────────────────────────────────────────────────

async fn cmd_refresh(source: Arc<dyn PriceSource>) -> anyhow::Result<()> {
    let term = Term::stderr();
    term.write_line(&format!("{}", s_dim().apply_to("refreshing...")))?;
    source.refresh().await?;
    term.clear_last_lines(1)?;
    println!("{}", s_accent().apply_to("prices refreshed"));
    Ok(())
}
