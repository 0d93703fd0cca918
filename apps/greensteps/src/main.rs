use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{ActionTransport, ClientSettings, Dashboard, FormValues, Severity};
use shared::domain::{Action, ActionId, IMPACT_GOAL_POINTS};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "greensteps", about = "Record sustainability actions and track their impact")]
struct Cli {
    /// Base url of the actions api, overriding greensteps.toml and GREENSTEPS_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Append a trailing slash to every request path.
    #[arg(long, global = true)]
    trailing_slash: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every recorded action.
    List,
    /// Record a new action.
    Add {
        #[arg(long)]
        description: String,
        /// YYYY-MM-DD, defaults to today.
        #[arg(long)]
        date: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        points: String,
    },
    /// Change an existing action; omitted fields keep their current value.
    Edit {
        action_id: i64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        points: Option<String>,
    },
    /// Remove an action.
    Delete { action_id: i64 },
    /// Show the total impact and progress towards the goal.
    Total,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    debug!(command = ?cli.command, "starting");
    let mut settings = ClientSettings::load()?;
    if let Some(api_url) = cli.api_url.as_deref() {
        settings = settings.with_base_url(api_url)?;
    }
    if cli.trailing_slash {
        settings = settings.with_trailing_slash(true);
    }

    let mut dashboard = Dashboard::connect(settings)?;
    if let Err(error) = dashboard.mount().await {
        bail!("{}: {}", client_core::dashboard::LOAD_FAILED_MESSAGE, error.message());
    }

    match cli.command {
        Command::List => {
            print_table(dashboard.store().items());
            println!("Total impact: {}", dashboard.store().total_impact());
        }
        Command::Add {
            description,
            date,
            points,
        } => {
            let mut values = dashboard.form_values();
            values.description = description;
            if let Some(date) = date {
                values.date = date;
            }
            values.points = points;
            submit(&mut dashboard, values).await?;
        }
        Command::Edit {
            action_id,
            description,
            date,
            points,
        } => {
            let action_id = ActionId(action_id);
            let target = dashboard
                .store()
                .find(action_id)
                .cloned()
                .with_context(|| format!("action {action_id} not found"))?;
            let mut values = dashboard.edit(target);
            if let Some(description) = description {
                values.description = description;
            }
            if let Some(date) = date {
                values.date = date;
            }
            if let Some(points) = points {
                values.points = points;
            }
            submit(&mut dashboard, values).await?;
        }
        Command::Delete { action_id } => {
            let result = dashboard.delete(ActionId(action_id)).await;
            report(&dashboard)?;
            result?;
        }
        Command::Total => {
            let impact = dashboard.store().impact();
            println!(
                "Total impact: {} / {IMPACT_GOAL_POINTS} points ({:.0}%)",
                impact.total, impact.progress_percent
            );
        }
    }

    Ok(())
}

async fn submit<T: ActionTransport>(dashboard: &mut Dashboard<T>, values: FormValues) -> Result<()> {
    let result = dashboard.submit(&values).await;
    report(dashboard)?;
    let outcome = result?;
    print_table(std::slice::from_ref(outcome.action()));
    Ok(())
}

/// Prints the visible notification; an error notification fails the command.
fn report<T: ActionTransport>(dashboard: &Dashboard<T>) -> Result<()> {
    let Some(notification) = dashboard.notifications().visible() else {
        return Ok(());
    };
    match notification.severity {
        Severity::Success => {
            println!("{}", notification.message);
            Ok(())
        }
        Severity::Error => bail!("{}", notification.message),
    }
}

fn print_table(actions: &[Action]) {
    if actions.is_empty() {
        println!("No actions recorded yet.");
        return;
    }
    let width = actions
        .iter()
        .map(|action| action.description.chars().count())
        .max()
        .unwrap_or(0)
        .max("Action".len());
    println!("{:>6}  {:<width$}  {:<10}  {:>8}", "ID", "Action", "Date", "Points");
    for action in actions {
        println!(
            "{:>6}  {:<width$}  {:<10}  {:>8}",
            action.id.0,
            action.description,
            action.date.format("%Y-%m-%d").to_string(),
            action.points
        );
    }
}
