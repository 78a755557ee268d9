use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "boxkpi", about = "Company KPI roll-ups for gym and studio data")]
struct Cli {
    /// Database path (default: ~/.boxkpi/boxkpi.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a JSON export of tenant data
    Import {
        /// Path to the export file
        path: String,
        /// Output the import report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compute KPIs for a company over a reporting window
    Kpi {
        /// Company ID (default: config value `default_company`)
        #[arg(long)]
        company: Option<String>,
        /// Period shorthand (e.g. 2025-03, 2025-Q1, 30d, mtd, ytd).
        /// Defaults to the current calendar month.
        #[arg(long, conflicts_with_all = ["from", "to"])]
        period: Option<String>,
        /// Window start (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Window end (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List imported companies
    Companies {
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show store status
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => boxkpi::Database::open_at(path).await?,
        None => boxkpi::Database::open().await?,
    };
    let app = boxkpi::BoxKpi::new(db);

    match cli.command {
        Commands::Import { path, json } => {
            let report = app.import_file(&path).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_import_report(&report);
            }
        }
        Commands::Kpi {
            company,
            period,
            from,
            to,
            json,
        } => {
            let company_id = app.resolve_company(company.as_deref()).await?;
            let range = resolve_range(period.as_deref(), from.as_deref(), to.as_deref())?;
            let snapshot = app.company_kpis(&company_id, range).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_snapshot(&snapshot);
            }
        }
        Commands::Companies { json } => {
            let companies = app.companies().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&companies)?);
            } else if companies.is_empty() {
                println!("No companies imported. Run 'boxkpi import <file>' first.");
            } else {
                for c in companies {
                    println!(
                        "{} {} ({} members, {} active)",
                        c.company_id, c.name, c.member_count, c.active_member_count
                    );
                }
            }
        }
        Commands::Config { action } => {
            handle_config(&app, action).await?;
        }
        Commands::Status => {
            println!("Store Status");
            for (table, count) in app.table_counts().await? {
                println!("  {:<14} {count}", format!("{table}:"));
            }
            let default_company = app.config_get(boxkpi::DEFAULT_COMPANY_KEY).await?;
            println!(
                "  Default company: {}",
                default_company.unwrap_or_else(|| "not set".to_string())
            );
        }
    }

    Ok(())
}

fn resolve_range(
    period: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> anyhow::Result<Option<boxkpi::DateRange>> {
    match (period, from, to) {
        (Some(p), _, _) => Ok(Some(boxkpi::Period::parse(p)?.date_range()?)),
        (None, Some(from), Some(to)) => {
            let range = boxkpi::DateRange::parse(from, to)?;
            if range.from > range.to {
                anyhow::bail!("--from {from} is after --to {to}");
            }
            Ok(Some(range))
        }
        _ => Ok(None),
    }
}

async fn handle_config(app: &boxkpi::BoxKpi, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match app.config_get(&key).await? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            app.config_set(&key, &value).await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items = app.config_list().await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}

fn print_import_report(report: &boxkpi::ImportReport) {
    println!("Imported {} rows", report.total());
    println!("  Companies:     {}", report.companies);
    println!("  Plans:         {}", report.plans);
    println!("  Members:       {}", report.members);
    println!("  Subscriptions: {}", report.subscriptions);
    println!("  Transactions:  {}", report.transactions);
    println!("  Payments:      {}", report.payments);
    println!("  Classes:       {}", report.classes);
    println!("  Bookings:      {}", report.bookings);
    println!("  Check-ins:     {}", report.check_ins);
}

fn print_snapshot(s: &boxkpi::KpiSnapshot) {
    println!(
        "KPIs: {} ({} to {}, {} days; compared with {} to {})",
        s.company_name.as_deref().unwrap_or(&s.company_id),
        s.current_start,
        s.current_end,
        s.period_days,
        s.previous_start,
        s.previous_end
    );
    println!("  Members:");
    println!("    Active:      {} ({:+.1}%)", s.active_members, s.members_growth);
    println!("    New:         {}", s.new_members);
    println!("    Canceled:    {}", s.canceled_this_period);
    println!("    Churn:       {:.1}%", s.churn_rate);
    println!("    Retention:   {:.1}%", s.retention_rate);
    println!("  Finance:");
    println!("    Revenue:     {:.2} ({:+.1}%)", s.revenue, s.revenue_growth);
    println!("    Expenses:    {:.2}", s.expenses);
    println!("    Profit:      {:.2} ({:+.1}%)", s.profit, s.profit_growth);
    println!("    Margin:      {:.1}%", s.profit_margin);
    println!("    MRR / ARR:   {:.2} / {:.2}", s.mrr, s.arr);
    println!("    Avg ticket:  {:.2}", s.average_ticket);
    println!("    LTV / CAC:   {:.2} / {:.2} ({:.1}x)", s.ltv, s.cac, s.ltv_cac_ratio);
    println!("  Classes:");
    println!("    Scheduled:   {}", s.total_classes);
    println!("    Bookings:    {} of {} seats", s.total_bookings, s.total_capacity);
    println!("    Occupation:  {:.1}%", s.occupation_rate);
    println!("  Attendance:");
    println!("    Check-ins:   {} ({:+.1}%)", s.total_check_ins, s.check_ins_growth);
    println!("    Attendance:  {:.1}%", s.attendance_rate);
    println!("    Per member:  {:.2}", s.avg_check_ins_per_member);
}
