//! CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_export_adapter::CsvExportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::bd_update::{group_by_week, BdWeeklyUpdate};
use crate::domain::customer::{CustomerDraft, PicDraft, Sector};
use crate::domain::error::SalesTrackError;
use crate::domain::export::{
    bd_update_table, customer_table, export_file_name, project_table, ExportKind, ExportTable,
};
use crate::domain::filter::{
    authorize_monitoring, authorize_project, BdUpdateFilter, ProjectFilter, Viewer,
};
use crate::domain::format::{
    format_date, format_idr, format_optional_timestamp, format_timestamp, PLACEHOLDER,
};
use crate::domain::metrics::{CardValue, DashboardCards, MetricsSnapshot};
use crate::domain::profile::SalesDirectory;
use crate::domain::project::{NewProject, Project, ProjectRecord};
use crate::domain::project_update::ProjectUpdate;
use crate::domain::settings::{Backend, Settings};
use crate::domain::slug::slug_with_id;
use crate::domain::week::{format_label, reporting_weeks, weeks_in_year, WeekSpec};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::export_port::ExportPort;

#[derive(Parser, Debug)]
#[command(name = "salestrack", about = "Sales project and BD activity tracker")]
pub struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectFilterArgs {
    /// Budgetary, Tender, Win or Lose
    #[arg(long)]
    pub progress_type: Option<String>,
    /// "Hot Prospect" or Normal
    #[arg(long)]
    pub prospect: Option<String>,
    #[arg(long)]
    pub sales_id: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BdFilterArgs {
    #[arg(long)]
    pub week_from: Option<String>,
    #[arg(long)]
    pub week_to: Option<String>,
    #[arg(long)]
    pub sales_id: Option<String>,
    #[arg(long)]
    pub customer_id: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct NewProjectArgs {
    #[arg(long)]
    pub no_quote: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub customer_id: String,
    #[arg(long)]
    pub value: f64,
    #[arg(long)]
    pub progress_type: String,
    #[arg(long)]
    pub prospect: String,
    #[arg(long)]
    pub weekly_update: Option<String>,
}

impl NewProjectArgs {
    pub fn to_new_project(&self) -> Result<NewProject, SalesTrackError> {
        let project = NewProject {
            no_quote: self.no_quote.clone(),
            project_name: self.name.clone(),
            customer_id: self.customer_id.clone(),
            value: self.value,
            progress_type: self.progress_type.parse()?,
            prospect: self.prospect.parse()?,
            weekly_update: self.weekly_update.clone(),
        };
        project.validate()?;
        Ok(project)
    }
}

#[derive(Args, Debug, Clone)]
pub struct CustomerArgs {
    #[arg(long)]
    pub name: String,
    /// Data Center, Oil and Gas, Commercial, Industrial or Mining
    #[arg(long)]
    pub sector: Option<String>,
    /// name|email|phone|position, prefixed with `<pic-id>=` to keep an
    /// existing PIC; repeat for each PIC
    #[arg(long = "pic")]
    pub pics: Vec<String>,
}

impl CustomerArgs {
    pub fn to_draft(&self) -> Result<CustomerDraft, SalesTrackError> {
        let sector = match self.sector.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<Sector>()?),
        };
        let pics = self
            .pics
            .iter()
            .map(|raw| raw.parse::<PicDraft>())
            .collect::<Result<Vec<_>, _>>()?;
        CustomerDraft::new(&self.name, sector, pics)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the business days of an ISO week
    Week {
        /// Defaults to the current week
        #[arg(short, long)]
        week: Option<u32>,
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List every week of a year, newest first
    Weeks {
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Dashboard numbers over the visible projects
    Metrics {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        as_user: Option<String>,
        #[command(flatten)]
        filter: ProjectFilterArgs,
    },
    /// List projects, newest first
    Projects {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        as_user: Option<String>,
        #[command(flatten)]
        filter: ProjectFilterArgs,
    },
    /// List customers with their PICs
    Customers {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// BD monitoring (admin) or your own BD log with --mine
    BdUpdates {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        as_user: Option<String>,
        #[command(flatten)]
        filter: BdFilterArgs,
        /// Only the acting user's entries
        #[arg(long)]
        mine: bool,
        /// Also print weeks without entries
        #[arg(long)]
        all_weeks: bool,
    },
    /// Write a table to a CSV file
    Export {
        /// projects, customers or bd-updates
        kind: String,
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        as_user: Option<String>,
    },
    /// Create the SQLite schema
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Load a CSV directory into SQLite
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        from: PathBuf,
    },
    /// Record a new project for the acting user
    AddProject {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        as_user: String,
        #[command(flatten)]
        project: NewProjectArgs,
    },
    /// File or edit a BD weekly update
    BdLog {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        as_user: String,
        #[arg(short, long)]
        week: u32,
        #[arg(long)]
        customer_id: String,
        #[arg(long)]
        content: Option<String>,
        /// Edit this entry instead of filing a new one
        #[arg(long)]
        update_id: Option<String>,
    },
    /// Add a customer with its PICs
    AddCustomer {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        customer: CustomerArgs,
    },
    /// Replace a customer's name, sector and PIC list
    EditCustomer {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        id: String,
        #[command(flatten)]
        customer: CustomerArgs,
    },
    /// Delete a customer that has no projects
    DeleteCustomer {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// Rewrite a project's fields (owner or admin)
    EditProject {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        as_user: String,
        #[arg(long)]
        id: String,
        #[command(flatten)]
        project: NewProjectArgs,
    },
    /// Set the acting user's display name; omit --name to clear it
    SetDisplayName {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        as_user: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Show a project's history notes, newest first
    ProjectUpdates {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        as_user: Option<String>,
        #[arg(long)]
        id: String,
    },
    /// Add a history note to a project
    AddProjectUpdate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        as_user: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        content: String,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Week { week, year, config } => run_week(week, year, config.as_deref()),
        Command::Weeks { year, config } => run_weeks(year, config.as_deref()),
        Command::Metrics {
            config,
            as_user,
            filter,
        } => run_metrics(&config, as_user.as_deref(), &filter),
        Command::Projects {
            config,
            as_user,
            filter,
        } => run_projects(&config, as_user.as_deref(), &filter),
        Command::Customers { config } => run_customers(&config),
        Command::BdUpdates {
            config,
            as_user,
            filter,
            mine,
            all_weeks,
        } => run_bd_updates(&config, as_user.as_deref(), &filter, mine, all_weeks),
        Command::Export {
            kind,
            config,
            output,
            as_user,
        } => run_export(&kind, &config, output.as_deref(), as_user.as_deref()),
        Command::InitDb { config } => run_init_db(&config),
        Command::Import { config, from } => run_import(&config, &from),
        Command::AddProject {
            config,
            as_user,
            project,
        } => run_add_project(&config, &as_user, &project),
        Command::BdLog {
            config,
            as_user,
            week,
            customer_id,
            content,
            update_id,
        } => run_bd_log(
            &config,
            &as_user,
            week,
            &customer_id,
            content.as_deref(),
            update_id.as_deref(),
        ),
        Command::AddCustomer { config, customer } => run_add_customer(&config, &customer),
        Command::EditCustomer {
            config,
            id,
            customer,
        } => run_edit_customer(&config, &id, &customer),
        Command::DeleteCustomer { config, id } => run_delete_customer(&config, &id),
        Command::EditProject {
            config,
            as_user,
            id,
            project,
        } => run_edit_project(&config, &as_user, &id, &project),
        Command::SetDisplayName {
            config,
            as_user,
            name,
        } => run_set_display_name(&config, &as_user, name.as_deref()),
        Command::ProjectUpdates {
            config,
            as_user,
            id,
        } => run_project_updates(&config, as_user.as_deref(), &id),
        Command::AddProjectUpdate {
            config,
            as_user,
            id,
            content,
        } => run_add_project_update(&config, &as_user, &id, &content),
        Command::Validate { config } => run_validate(&config),
    };
    report(result)
}

fn report(result: Result<(), SalesTrackError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SalesTrackError> {
    tracing::debug!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn load_settings(path: &Path) -> Result<(FileConfigAdapter, Settings), SalesTrackError> {
    let config = load_config(path)?;
    let settings = Settings::from_config(&config, today())?;
    Ok((config, settings))
}

#[cfg_attr(all(feature = "sqlite", feature = "postgres"), allow(dead_code))]
fn feature_missing(feature: &str) -> SalesTrackError {
    SalesTrackError::ConfigInvalid {
        section: "data".into(),
        key: "backend".into(),
        reason: format!("salestrack was built without the {feature} feature"),
    }
}

/// Opens the configured backend.
pub fn open_data_port(
    config: &dyn ConfigPort,
    settings: &Settings,
) -> Result<Box<dyn DataPort>, SalesTrackError> {
    match &settings.backend {
        Backend::Csv { dir } => {
            tracing::debug!(dir = %dir.display(), "using csv backend");
            Ok(Box::new(
                CsvAdapter::new(dir.clone()).with_strict_weeks(settings.strict_weeks),
            ))
        }
        Backend::Sqlite { path, pool_size } => {
            #[cfg(feature = "sqlite")]
            {
                let adapter =
                    crate::adapters::sqlite_adapter::SqliteAdapter::open(path, *pool_size)?;
                Ok(Box::new(adapter))
            }
            #[cfg(not(feature = "sqlite"))]
            {
                let _ = (path, pool_size);
                Err(feature_missing("sqlite"))
            }
        }
        Backend::Postgres { .. } => {
            #[cfg(feature = "postgres")]
            {
                let adapter = crate::adapters::postgres_adapter::PostgresAdapter::from_config(config)?;
                Ok(Box::new(adapter))
            }
            #[cfg(not(feature = "postgres"))]
            {
                let _ = config;
                Err(feature_missing("postgres"))
            }
        }
    }
}

/// The operator (admin) without `--as-user`, otherwise the named profile.
pub fn resolve_viewer(
    port: &dyn DataPort,
    as_user: Option<&str>,
) -> Result<Viewer, SalesTrackError> {
    let Some(user_id) = as_user else {
        return Ok(Viewer::operator());
    };
    let profile = port
        .find_profile(user_id)?
        .ok_or_else(|| SalesTrackError::UnknownUser {
            user_id: user_id.to_string(),
        })?;
    tracing::debug!(user_id, role = %profile.role, "acting as user");
    Ok(Viewer::from(&profile))
}

/// Week to show: explicit flags first, then the configured reporting year,
/// then today's ISO week. Without `--week` the default is today's week when
/// the year is today's ISO year and week 1 of any other year.
pub fn resolve_week(
    week: Option<u32>,
    year: Option<i32>,
    settings: Option<&Settings>,
    today: NaiveDate,
) -> Result<WeekSpec, SalesTrackError> {
    let current = WeekSpec::containing(today);
    let year = year
        .or(settings.map(|s| s.reporting_year))
        .unwrap_or(current.year);
    let week = week.unwrap_or(if year == current.year { current.week } else { 1 });
    match settings {
        Some(s) => s.week_in(year, week),
        None => WeekSpec::new(year, week),
    }
}

pub fn week_lines(week: WeekSpec) -> Vec<String> {
    let range = week.range();
    vec![
        week.label(),
        format!("start: {}", range.start),
        format!("end:   {}", range.end),
    ]
}

fn optional_settings(config: Option<&Path>) -> Result<Option<Settings>, SalesTrackError> {
    config
        .map(|path| load_settings(path).map(|(_, settings)| settings))
        .transpose()
}

fn run_week(week: Option<u32>, year: Option<i32>, config: Option<&Path>) -> Result<(), SalesTrackError> {
    let settings = optional_settings(config)?;
    let week = resolve_week(week, year, settings.as_ref(), today())?;
    for line in week_lines(week) {
        println!("{line}");
    }
    Ok(())
}

fn run_weeks(year: Option<i32>, config: Option<&Path>) -> Result<(), SalesTrackError> {
    let settings = optional_settings(config)?;
    let year = year
        .or(settings.as_ref().map(|s| s.reporting_year))
        .unwrap_or(WeekSpec::containing(today()).year);
    tracing::debug!(year, weeks = weeks_in_year(year), "listing weeks");
    for week in reporting_weeks(year) {
        println!("{week}");
    }
    Ok(())
}

pub fn build_project_filter(
    args: &ProjectFilterArgs,
    viewer: &Viewer,
) -> Result<ProjectFilter, SalesTrackError> {
    Ok(ProjectFilter::from_params(
        args.progress_type.as_deref(),
        args.prospect.as_deref(),
        args.sales_id.as_deref(),
    )?
    .scoped_to(viewer))
}

/// Aggregates the projects `viewer` may see under `filter`.
pub fn compute_metrics(
    port: &dyn DataPort,
    filter: &ProjectFilter,
) -> Result<MetricsSnapshot, SalesTrackError> {
    let projects = port.list_projects(filter)?;
    let records: Vec<ProjectRecord> = projects.iter().map(Project::record).collect();
    Ok(MetricsSnapshot::aggregate(&records))
}

pub fn metrics_lines(snapshot: &MetricsSnapshot) -> Vec<String> {
    let mut lines: Vec<String> = DashboardCards::from(snapshot)
        .cards
        .iter()
        .map(|card| {
            let value = match card.value {
                CardValue::Currency(amount) => format_idr(amount),
                CardValue::Count(n) => n.to_string(),
            };
            match card.caption {
                Some(caption) => format!("{:<22} {value}  ({caption})", card.title),
                None => format!("{:<22} {value}", card.title),
            }
        })
        .collect();
    lines.push(format!(
        "{:<22} {} / {}",
        "Win / Lose", snapshot.win_count, snapshot.lose_count
    ));
    lines.push(format!(
        "{:<22} {}",
        "Hot Prospect Win Rate",
        snapshot
            .hot_prospect_win_ratio
            .map(|r| format!("{r}%"))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    ));
    lines
}

fn run_metrics(
    config_path: &Path,
    as_user: Option<&str>,
    args: &ProjectFilterArgs,
) -> Result<(), SalesTrackError> {
    let (config, settings) = load_settings(config_path)?;
    let port = open_data_port(&config, &settings)?;
    let viewer = resolve_viewer(port.as_ref(), as_user)?;
    let filter = build_project_filter(args, &viewer)?;
    let snapshot = compute_metrics(port.as_ref(), &filter)?;
    tracing::info!(projects = snapshot.total_count, "metrics computed");
    for line in metrics_lines(&snapshot) {
        println!("{line}");
    }
    Ok(())
}

pub fn project_line(project: &Project, directory: &SalesDirectory) -> String {
    format!(
        "{} | {} | {} | {} | {} | {} | {} | {}",
        format_date(project.created_at.date_naive()),
        project.no_quote,
        project.project_name,
        project.customer_name.as_deref().unwrap_or(PLACEHOLDER),
        format_idr(project.value.unwrap_or(0.0)),
        project.progress_type.map(|t| t.as_str()).unwrap_or(PLACEHOLDER),
        project.prospect.map(|p| p.as_str()).unwrap_or(PLACEHOLDER),
        directory.name_for(&project.sales_id),
    )
}

fn run_projects(
    config_path: &Path,
    as_user: Option<&str>,
    args: &ProjectFilterArgs,
) -> Result<(), SalesTrackError> {
    let (config, settings) = load_settings(config_path)?;
    let port = open_data_port(&config, &settings)?;
    let viewer = resolve_viewer(port.as_ref(), as_user)?;
    let filter = build_project_filter(args, &viewer)?;
    let directory = SalesDirectory::from_profiles(&port.list_profiles()?);

    let projects = port.list_projects(&filter)?;
    for project in &projects {
        println!("{}", project_line(project, &directory));
    }
    tracing::info!(count = projects.len(), "projects listed");
    Ok(())
}

fn run_customers(config_path: &Path) -> Result<(), SalesTrackError> {
    let (config, settings) = load_settings(config_path)?;
    let port = open_data_port(&config, &settings)?;
    let customers = port.list_customers()?;
    for customer in &customers {
        let pics = customer.pics_summary();
        println!(
            "{} | {} | {} | {}",
            slug_with_id(&customer.name, &customer.id),
            customer.name,
            customer.sector.map(|s| s.as_str()).unwrap_or(PLACEHOLDER),
            if pics.is_empty() { PLACEHOLDER } else { pics.as_str() },
        );
    }
    tracing::info!(count = customers.len(), "customers listed");
    Ok(())
}

/// BD updates for the reporting year. `mine` lists the viewer's own log;
/// otherwise this is the admin-only monitoring view.
pub fn fetch_bd_updates(
    port: &dyn DataPort,
    settings: &Settings,
    viewer: &Viewer,
    args: &BdFilterArgs,
    mine: bool,
) -> Result<Vec<BdWeeklyUpdate>, SalesTrackError> {
    let filter = BdUpdateFilter::from_params(
        settings.reporting_year,
        args.week_from.as_deref(),
        args.week_to.as_deref(),
        args.sales_id.as_deref(),
        args.customer_id.as_deref(),
    );
    for bound in [filter.week_from, filter.week_to].into_iter().flatten() {
        settings.reporting_week(bound)?;
    }

    let filter = if mine {
        filter.own(viewer)
    } else {
        authorize_monitoring(viewer)?;
        filter.scoped_to(viewer)
    };
    port.list_bd_updates(&filter)
}

pub fn bd_update_lines(
    updates: &[BdWeeklyUpdate],
    directory: &SalesDirectory,
    year: i32,
    all_weeks: bool,
) -> Vec<String> {
    let grouped = group_by_week(updates);
    let weeks: Vec<u32> = if all_weeks {
        reporting_weeks(year).iter().map(|w| w.week).collect()
    } else {
        grouped.iter().map(|(week, _)| *week).collect()
    };

    let mut lines = Vec::new();
    for week in weeks {
        lines.push(format_label(year, week));
        let entries = grouped
            .iter()
            .find(|(w, _)| *w == week)
            .map(|(_, entries)| entries.as_slice())
            .unwrap_or_default();
        if entries.is_empty() {
            lines.push(format!("  {PLACEHOLDER}"));
        }
        for update in entries {
            lines.push(format!(
                "  {} | {} | {} | {}",
                directory.name_for(&update.user_id),
                update.customer_name.as_deref().unwrap_or(PLACEHOLDER),
                update.trimmed_content().unwrap_or(PLACEHOLDER),
                format_optional_timestamp(update.submitted_at()),
            ));
        }
    }
    lines
}

fn run_bd_updates(
    config_path: &Path,
    as_user: Option<&str>,
    args: &BdFilterArgs,
    mine: bool,
    all_weeks: bool,
) -> Result<(), SalesTrackError> {
    if mine && as_user.is_none() {
        return Err(SalesTrackError::invalid_record(
            "bd-updates",
            "--mine needs --as-user",
        ));
    }
    let (config, settings) = load_settings(config_path)?;
    let port = open_data_port(&config, &settings)?;
    let viewer = resolve_viewer(port.as_ref(), as_user)?;
    let directory = SalesDirectory::from_profiles(&port.list_profiles()?);

    let updates = fetch_bd_updates(port.as_ref(), &settings, &viewer, args, mine)?;
    for line in bd_update_lines(&updates, &directory, settings.reporting_year, all_weeks) {
        println!("{line}");
    }
    tracing::info!(count = updates.len(), year = settings.reporting_year, "BD updates listed");
    Ok(())
}

pub fn build_export_table(
    port: &dyn DataPort,
    settings: &Settings,
    viewer: &Viewer,
    kind: ExportKind,
) -> Result<ExportTable, SalesTrackError> {
    let table = match kind {
        ExportKind::Projects => {
            let directory = SalesDirectory::from_profiles(&port.list_profiles()?);
            let projects = port.list_projects(&ProjectFilter::default().scoped_to(viewer))?;
            project_table(&projects, &directory)
        }
        ExportKind::Customers => customer_table(&port.list_customers()?),
        ExportKind::BdUpdates => {
            let directory = SalesDirectory::from_profiles(&port.list_profiles()?);
            let filter = BdUpdateFilter::for_year(settings.reporting_year).scoped_to(viewer);
            let updates = port.list_bd_updates(&filter)?;
            bd_update_table(&updates, &directory, settings.reporting_year)
        }
    };
    Ok(table)
}

fn run_export(
    kind: &str,
    config_path: &Path,
    output: Option<&Path>,
    as_user: Option<&str>,
) -> Result<(), SalesTrackError> {
    let kind: ExportKind = kind.parse()?;
    let (config, settings) = load_settings(config_path)?;
    let port = open_data_port(&config, &settings)?;
    let viewer = resolve_viewer(port.as_ref(), as_user)?;

    let table = build_export_table(port.as_ref(), &settings, &viewer, kind)?;
    let exporter = CsvExportAdapter;
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => settings
            .export_dir
            .join(export_file_name(kind, today(), exporter.extension())),
    };
    exporter.write(&table, &path)?;
    println!("{}", path.display());
    Ok(())
}

#[cfg(feature = "sqlite")]
fn sqlite_target(
    settings: &Settings,
) -> Result<crate::adapters::sqlite_adapter::SqliteAdapter, SalesTrackError> {
    match &settings.backend {
        Backend::Sqlite { path, pool_size } => {
            crate::adapters::sqlite_adapter::SqliteAdapter::open(path, *pool_size)
        }
        _ => Err(SalesTrackError::ConfigInvalid {
            section: "data".into(),
            key: "backend".into(),
            reason: "this command needs backend = sqlite".into(),
        }),
    }
}

fn run_init_db(config_path: &Path) -> Result<(), SalesTrackError> {
    let (_, settings) = load_settings(config_path)?;
    #[cfg(feature = "sqlite")]
    {
        sqlite_target(&settings)?.initialize_schema()?;
        tracing::info!("schema ready");
        Ok(())
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = settings;
        Err(feature_missing("sqlite"))
    }
}

fn run_import(config_path: &Path, from: &Path) -> Result<(), SalesTrackError> {
    let (_, settings) = load_settings(config_path)?;
    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::ImportBatch;

        let source = CsvAdapter::new(from.to_path_buf()).with_strict_weeks(settings.strict_weeks);
        let batch = ImportBatch {
            profiles: source.profiles()?,
            customers: source.customers()?,
            projects: source.projects()?,
            bd_updates: source.bd_updates()?,
            project_updates: source.project_updates()?,
        };
        let target = sqlite_target(&settings)?;
        target.initialize_schema()?;
        let counts = target.import(&batch)?;
        println!(
            "imported {} profiles, {} customers ({} PICs), {} projects ({} notes), {} BD updates",
            counts.profiles,
            counts.customers,
            counts.customer_pics,
            counts.projects,
            counts.project_updates,
            counts.bd_updates
        );
        Ok(())
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (settings, from);
        Err(feature_missing("sqlite"))
    }
}

fn run_add_project(
    config_path: &Path,
    as_user: &str,
    args: &NewProjectArgs,
) -> Result<(), SalesTrackError> {
    let project = args.to_new_project()?;
    let (_, settings) = load_settings(config_path)?;
    #[cfg(feature = "sqlite")]
    {
        let adapter = sqlite_target(&settings)?;
        let viewer = resolve_viewer(&adapter, Some(as_user))?;
        let stored = adapter.create_project(&viewer.user_id, &project, chrono::Utc::now())?;
        println!("{}", stored.id);
        Ok(())
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (settings, as_user, project);
        Err(feature_missing("sqlite"))
    }
}

fn run_bd_log(
    config_path: &Path,
    as_user: &str,
    week: u32,
    customer_id: &str,
    content: Option<&str>,
    update_id: Option<&str>,
) -> Result<(), SalesTrackError> {
    let (_, settings) = load_settings(config_path)?;
    let week = settings.reporting_week(week)?;
    #[cfg(feature = "sqlite")]
    {
        use crate::domain::bd_update::BdUpdateDraft;

        let adapter = sqlite_target(&settings)?;
        let viewer = resolve_viewer(&adapter, Some(as_user))?;
        let now = chrono::Utc::now();
        match update_id {
            Some(id) => {
                adapter.edit_bd_update(id, &viewer, customer_id, content, now)?;
                println!("{id}");
            }
            None => {
                let draft = BdUpdateDraft::new(viewer.user_id.clone(), week, customer_id, content)?;
                let stored = adapter.create_bd_update(&draft, now)?;
                println!("{} {}", stored.id, week.label());
            }
        }
        Ok(())
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (week, as_user, customer_id, content, update_id);
        Err(feature_missing("sqlite"))
    }
}

fn run_add_customer(config_path: &Path, args: &CustomerArgs) -> Result<(), SalesTrackError> {
    let draft = args.to_draft()?;
    let (_, settings) = load_settings(config_path)?;
    #[cfg(feature = "sqlite")]
    {
        let stored = sqlite_target(&settings)?.create_customer(&draft, chrono::Utc::now())?;
        println!("{}", slug_with_id(&stored.name, &stored.id));
        Ok(())
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (settings, draft);
        Err(feature_missing("sqlite"))
    }
}

fn run_edit_customer(
    config_path: &Path,
    id: &str,
    args: &CustomerArgs,
) -> Result<(), SalesTrackError> {
    let draft = args.to_draft()?;
    let (_, settings) = load_settings(config_path)?;
    #[cfg(feature = "sqlite")]
    {
        sqlite_target(&settings)?.update_customer(id, &draft)?;
        println!("{id}");
        Ok(())
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (settings, id, draft);
        Err(feature_missing("sqlite"))
    }
}

fn run_delete_customer(config_path: &Path, id: &str) -> Result<(), SalesTrackError> {
    let (_, settings) = load_settings(config_path)?;
    #[cfg(feature = "sqlite")]
    {
        sqlite_target(&settings)?.delete_customer(id)?;
        println!("deleted {id}");
        Ok(())
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (settings, id);
        Err(feature_missing("sqlite"))
    }
}

fn run_edit_project(
    config_path: &Path,
    as_user: &str,
    id: &str,
    args: &NewProjectArgs,
) -> Result<(), SalesTrackError> {
    let project = args.to_new_project()?;
    let (_, settings) = load_settings(config_path)?;
    #[cfg(feature = "sqlite")]
    {
        let adapter = sqlite_target(&settings)?;
        let viewer = resolve_viewer(&adapter, Some(as_user))?;
        let stored = adapter.edit_project(id, &viewer, &project)?;
        println!("{}", stored.id);
        Ok(())
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (settings, as_user, id, project);
        Err(feature_missing("sqlite"))
    }
}

fn run_set_display_name(
    config_path: &Path,
    as_user: &str,
    name: Option<&str>,
) -> Result<(), SalesTrackError> {
    let (_, settings) = load_settings(config_path)?;
    #[cfg(feature = "sqlite")]
    {
        let adapter = sqlite_target(&settings)?;
        adapter.set_display_name(as_user, name)?;
        if let Some(profile) = adapter.find_profile(as_user)? {
            println!("{}", profile.display());
        }
        Ok(())
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (settings, as_user, name);
        Err(feature_missing("sqlite"))
    }
}

/// A project the viewer may open, with its history notes.
pub fn fetch_project_history(
    port: &dyn DataPort,
    viewer: &Viewer,
    project_id: &str,
) -> Result<(Project, Vec<ProjectUpdate>), SalesTrackError> {
    let project = port.find_project(project_id)?.ok_or_else(|| {
        SalesTrackError::invalid_record("project", format!("no project with id {project_id}"))
    })?;
    authorize_project(viewer, &project)?;
    let updates = port.list_project_updates(&project.id)?;
    Ok((project, updates))
}

pub fn project_update_lines(updates: &[ProjectUpdate], directory: &SalesDirectory) -> Vec<String> {
    if updates.is_empty() {
        return vec![format!("  {PLACEHOLDER}")];
    }
    updates
        .iter()
        .map(|u| {
            format!(
                "  {} | {} | {}",
                format_timestamp(u.created_at),
                u.created_by
                    .as_deref()
                    .map(|id| directory.name_for(id))
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
                u.content,
            )
        })
        .collect()
}

fn run_project_updates(
    config_path: &Path,
    as_user: Option<&str>,
    id: &str,
) -> Result<(), SalesTrackError> {
    let (config, settings) = load_settings(config_path)?;
    let port = open_data_port(&config, &settings)?;
    let viewer = resolve_viewer(port.as_ref(), as_user)?;
    let directory = SalesDirectory::from_profiles(&port.list_profiles()?);

    let (project, updates) = fetch_project_history(port.as_ref(), &viewer, id)?;
    println!("{}", project_line(&project, &directory));
    for line in project_update_lines(&updates, &directory) {
        println!("{line}");
    }
    Ok(())
}

fn run_add_project_update(
    config_path: &Path,
    as_user: &str,
    id: &str,
    content: &str,
) -> Result<(), SalesTrackError> {
    let (_, settings) = load_settings(config_path)?;
    #[cfg(feature = "sqlite")]
    {
        let adapter = sqlite_target(&settings)?;
        let viewer = resolve_viewer(&adapter, Some(as_user))?;
        let note = adapter.add_project_update(id, &viewer, content, chrono::Utc::now())?;
        println!("{}", note.id);
        Ok(())
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (settings, as_user, id, content);
        Err(feature_missing("sqlite"))
    }
}

pub fn settings_summary(settings: &Settings) -> Vec<String> {
    let backend = match &settings.backend {
        Backend::Csv { dir } => format!("csv ({})", dir.display()),
        Backend::Sqlite { path, pool_size } => format!("sqlite ({path}, pool {pool_size})"),
        Backend::Postgres { .. } => "postgres".to_string(),
    };
    vec![
        format!(
            "reporting year: {} ({} weeks)",
            settings.reporting_year,
            weeks_in_year(settings.reporting_year)
        ),
        format!("strict weeks:   {}", settings.strict_weeks),
        format!("backend:        {backend}"),
        format!("export dir:     {}", settings.export_dir.display()),
    ]
}

fn run_validate(config_path: &Path) -> Result<(), SalesTrackError> {
    eprintln!("Validating config: {}", config_path.display());
    let (_, settings) = load_settings(config_path)?;
    for line in settings_summary(&settings) {
        println!("{line}");
    }
    eprintln!("Config validated successfully");
    Ok(())
}
