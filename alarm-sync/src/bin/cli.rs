//! Command-line interface for alarm-sync.
//!
//! This binary provides a CLI for managing alarms through the daemon's
//! HTTP API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use alarm_sync::api_client::{self, DEFAULT_BASE_URL, types::AlarmState};

#[derive(Parser)]
#[command(name = "alarm-cli", about = "Manage alarms through the alarm-sync daemon")]
struct Cli {
    /// API base URL.
    #[arg(long, env = "ALARM_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show connectivity, ringing alarm and alarms.
    Status,
    /// List alarms.
    List,
    /// Add an enabled alarm, e.g. `add 07:30 AM`.
    Add { time: String, period: String },
    /// Enable or disable an alarm.
    Toggle { id: String },
    /// Delete an alarm.
    Delete { id: String },
    /// Stop the ringing alarm.
    Dismiss,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = api_client::Client::with_base_url(cli.api_url);

    match cli.command {
        Command::Status => cmd_status(&client).await?,
        Command::List => print_alarms(&client.list_alarms().await?),
        Command::Add { time, period } => {
            let created = client.add_alarm(&time, &period).await?;
            println!("Added {} ({time} {period})", created.id);
        }
        Command::Toggle { id } => {
            let toggled = client.toggle_alarm(&id).await?;
            let state = if toggled.enabled { "enabled" } else { "disabled" };
            println!("{} {state}", toggled.id);
        }
        Command::Delete { id } => {
            client.delete_alarm(&id).await?;
            println!("Deleted {id}");
        }
        Command::Dismiss => match client.dismiss().await?.dismissed {
            Some(alarm) => println!("Dismissed {} {}", alarm.time, alarm.period),
            None => println!("Nothing ringing"),
        },
    }

    Ok(())
}

/// Print a summary of the daemon state.
async fn cmd_status(client: &api_client::Client) -> Result<()> {
    let state = client.get_state().await?;

    println!("Store:   {}", state.status);
    match &state.ringing_alarm {
        Some(alarm) => println!("Ringing: {} {} ({})", alarm.time, alarm.period, alarm.id),
        None => println!("Ringing: (none)"),
    }
    if let Some(notice) = &state.notice {
        println!("Notice:  [{}] {}", notice.kind, notice.message);
    }
    print_alarms(&state.alarms);

    Ok(())
}

fn print_alarms(alarms: &[AlarmState]) {
    if alarms.is_empty() {
        println!("Alarms:  (none)");
        return;
    }

    println!("Alarms:");
    for alarm in alarms {
        let state = if alarm.enabled { "on " } else { "off" };
        println!("  [{state}] {} {}  {}", alarm.time, alarm.period, alarm.id);
    }
}
