use anyhow::Result;
use clap::Parser;
use colored::*;
use notification_client::{spawn, ConnectionStatus, EventSourceTransport, Mirror};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "notification-watch")]
#[command(about = "Follow a user's live notification stream")]
struct Cli {
    /// Base URL of the backend (e.g., http://localhost:4000)
    #[arg(long, env = "NOTIFICATION_BASE_URL", default_value = "http://localhost:4000")]
    base_url: String,

    /// Session token sent as a bearer credential
    #[arg(long, env = "NOTIFICATION_TOKEN")]
    token: String,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    let transport = EventSourceTransport::new(&cli.base_url, cli.token);
    println!("{} Watching {}", "→".blue(), transport.url().bright_white());
    println!(
        "{}",
        "Press Enter to reconnect after the stream gives up, Ctrl-C to quit.".dimmed()
    );

    let mut handle = spawn(transport);
    let mut status = handle.status();
    let mut mirror = handle.mirror();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                print_status(current);
            }
            changed = mirror.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = mirror.borrow_and_update().clone();
                print_mirror(&current);
            }
            Some(alert) = handle.next_alert() => {
                println!(
                    "{} {} {}",
                    "🔔".yellow(),
                    alert.title.bright_white().bold(),
                    alert.message
                );
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(_)) => handle.visibility_regained(),
                // Keep watching without a manual trigger
                Ok(None) => stdin_open = false,
                Err(e) => {
                    log::warn!("Failed to read stdin: {e}");
                    stdin_open = false;
                }
            },
        }
    }

    println!("{} Closing stream", "←".blue());
    handle.shutdown().await;
    Ok(())
}

fn print_status(status: ConnectionStatus) {
    match status {
        ConnectionStatus::Connecting => println!("{} Connecting...", "…".blue()),
        ConnectionStatus::Connected => println!("{} Connected", "✓".green()),
        ConnectionStatus::Disconnected => println!("{} Disconnected", "✗".red()),
        ConnectionStatus::Reconnecting { delay, attempt } => println!(
            "{} Reconnecting in {}ms (attempt {attempt})",
            "↻".yellow(),
            delay.as_millis()
        ),
        ConnectionStatus::Unavailable => println!(
            "{} Notifications unavailable. Press Enter to retry.",
            "!".red().bold()
        ),
    }
}

fn print_mirror(mirror: &Mirror) {
    println!(
        "{} {} unread",
        "==".bright_white(),
        mirror.unread_count().to_string().bold()
    );
    for notification in mirror.notifications() {
        let marker = if notification.is_read {
            " ".normal()
        } else {
            "•".cyan()
        };
        println!(
            "  {marker} [{}] {} ({})",
            notification.notification_type,
            notification.title,
            notification.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}
