use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use topowiz::api::ApiClient;
use topowiz::orchestrator::{Applied, Orchestrator, GO_BACK_HINT};
use topowiz::render::{self, PanelDetail, PanelState, RenderPlan};
use topowiz::snapshot::UiData;
use topowiz::step::{CurrentStep, StepStatus};
use topowiz::transcript::{Segment, Turn};

#[derive(Parser)]
#[command(name = "topowiz")]
#[command(about = "topowiz CLI: build a configuration diagram by chatting with the wizard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config.json.
    Init {
        /// Config file path (default: TOPOWIZ_CONFIG_PATH or ~/.topowiz/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Chat with the wizard (interactive). /restart, /retry, /status, /exit.
    Chat {
        /// Config file path (default: TOPOWIZ_CONFIG_PATH or ~/.topowiz/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Existing run id to continue instead of starting a new session.
        #[arg(long, value_name = "ID")]
        session: Option<String>,
    },

    /// Print the transcript and progress of an existing run.
    History {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        #[arg(long, value_name = "ID")]
        session: String,
    },

    /// Print the collected scope details of a run as JSON.
    Export {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        #[arg(long, value_name = "ID")]
        session: String,
    },

    /// Check that the wizard backend is reachable.
    Health {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("topowiz {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Init { config }) => run_init(config).context("init failed"),
        Some(Commands::Chat { config, session }) => {
            run_chat(config, session).await.context("chat failed")
        }
        Some(Commands::History { config, session }) => {
            run_history(config, &session).await.context("history failed")
        }
        Some(Commands::Export { config, session }) => {
            run_export(config, &session).await.context("export failed")
        }
        Some(Commands::Health { config }) => run_health(config).await.context("health check failed"),
        None => {
            println!("Run with --help for usage");
            Ok(())
        }
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(topowiz::config::default_config_path);
    let dir = topowiz::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

fn client_from(config_path: Option<PathBuf>) -> anyhow::Result<(ApiClient, topowiz::config::Config)> {
    let (config, path) = topowiz::config::load_config(config_path)?;
    let client = ApiClient::from_config(&config)
        .with_context(|| format!("building wizard client from {}", path.display()))?;
    log::info!("wizard backend: {}", client.base_url());
    Ok((client, config))
}

async fn run_chat(config_path: Option<PathBuf>, session: Option<String>) -> anyhow::Result<()> {
    let (client, config) = client_from(config_path)?;
    let mut wizard = Orchestrator::new(Arc::new(client), tokio::runtime::Handle::current());
    if let Some(text) = topowiz::config::resolve_welcome_message(&config) {
        wizard = wizard.with_welcome_message(text);
    }
    match session {
        Some(id) => wizard.resume(id),
        None => wizard.initialize(),
    }

    let style = Style::detect();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // Transcript turns already printed; the server resends the whole transcript every turn.
    let mut shown = 0usize;

    println!("({})", GO_BACK_HINT);
    println!("connecting...");

    loop {
        tokio::select! {
            applied = wizard.next_completion() => {
                let Some(applied) = applied else { break };
                match applied {
                    Applied::SessionReady => {
                        shown = print_delta(&wizard, 0, &style);
                        print_progress(&wizard.plan());
                    }
                    Applied::SessionFailed => {
                        if let Some(err) = wizard.error() {
                            eprintln!("! {} (/retry 로 다시 시도)", err);
                        }
                    }
                    Applied::TurnCompleted => {
                        shown = print_delta(&wizard, shown, &style);
                        print_progress(&wizard.plan());
                    }
                    Applied::TurnFailed => {
                        shown = print_delta(&wizard, shown, &style);
                    }
                    Applied::Stale => continue,
                }
                prompt()?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "" => prompt()?,
                    "/exit" | "/quit" => break,
                    "/restart" => {
                        wizard.restart();
                        shown = 0;
                        println!("restarting...");
                    }
                    "/retry" => {
                        if wizard.error().is_some() {
                            wizard.initialize();
                            println!("connecting...");
                        } else {
                            println!("nothing to retry");
                            prompt()?;
                        }
                    }
                    "/status" => {
                        print_progress(&wizard.plan());
                        prompt()?;
                    }
                    _ => {
                        wizard.set_input(line.as_str());
                        if wizard.submit() {
                            println!("...");
                        } else {
                            if wizard.is_loading() {
                                println!("(waiting for the previous reply)");
                            } else if wizard.session_id().is_none() {
                                println!("(no session yet)");
                            }
                            wizard.input_mut().clear();
                            prompt()?;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

async fn run_history(config_path: Option<PathBuf>, run_id: &str) -> anyhow::Result<()> {
    use topowiz::api::Transport;

    let (client, _) = client_from(config_path)?;
    let res = client.get_chat_history(run_id).await?;
    let style = Style::detect();
    for turn in &res.messages {
        print_turn(turn, &style);
    }
    let step = CurrentStep::from_server(res.current_step);
    print_progress(&render::plan(&step, &UiData::from_value(res.ui_data)));
    Ok(())
}

async fn run_export(config_path: Option<PathBuf>, run_id: &str) -> anyhow::Result<()> {
    let (client, _) = client_from(config_path)?;
    let export = client.export_scope_details(run_id).await?;
    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}

async fn run_health(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (client, _) = client_from(config_path)?;
    let health = client.health().await?;
    if !health.ok {
        anyhow::bail!("{} reported not ok", client.base_url());
    }
    println!("{} ok", client.base_url());
    Ok(())
}

fn prompt() -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()?;
    Ok(())
}

/// Print turns from `from` on (or all of them when the transcript shrank) and return the new
/// count. The user's own turns are skipped since they were just typed.
fn print_delta(wizard: &Orchestrator, from: usize, style: &Style) -> usize {
    let turns = wizard.transcript().turns();
    let start = if from > turns.len() { 0 } else { from };
    for turn in &turns[start..] {
        if !turn.role.is_user() {
            print_turn(turn, style);
        }
    }
    turns.len()
}

fn print_turn(turn: &Turn, style: &Style) {
    let time = turn.display_time().map(|t| format!(" {}", t)).unwrap_or_default();
    println!("< [{}{}]", turn.role.as_str(), time);
    for line in turn.layout() {
        let mut out = String::from("  ");
        for seg in line {
            match seg {
                Segment::Prose(text) => out.push_str(text),
                Segment::Code(text) => out.push_str(&style.code(text)),
            }
        }
        println!("{}", out);
    }
}

fn print_progress(plan: &RenderPlan) {
    let row: Vec<String> = plan
        .indicator
        .iter()
        .map(|(step, status)| {
            let mark = match status {
                StepStatus::Complete => "✓",
                StepStatus::Current => "●",
                StepStatus::Upcoming => "○",
            };
            format!("{} {}", mark, step.title())
        })
        .collect();
    println!("── {}", row.join("  "));
    if let Some(pct) = plan.progress {
        println!("   진행률 {}%", pct);
    }
    for view in plan.visible_panels() {
        let badge = match view.state {
            PanelState::Locked => "🔒",
            PanelState::Active => "▶",
            PanelState::Complete => "✓",
        };
        println!("   {} {}", badge, view.panel.title());
        match &view.detail {
            PanelDetail::CorpCenter {
                corporation,
                centers,
            } => {
                if corporation.is_none() && centers.is_empty() {
                    println!("      입력 대기 중...");
                }
                if let Some(corp) = corporation {
                    println!("      법인: {}", corp);
                }
                if !centers.is_empty() {
                    println!("      센터: {}", centers.join(", "));
                }
            }
            PanelDetail::Networks { current, zones } => {
                if let Some(c) = current {
                    match c.position {
                        Some((pos, total)) => println!("      현재: {} ({}/{})", c.name, pos, total),
                        None => println!("      현재: {}", c.name),
                    }
                }
                for (center, z) in zones {
                    println!("      {}: {}", center, z);
                }
            }
            PanelDetail::Status(line) => println!("      {}", line.text()),
        }
    }
}

/// Terminal styling for code spans; plain back-ticks when stdout is not a terminal.
struct Style {
    ansi: bool,
}

impl Style {
    fn detect() -> Self {
        Self {
            ansi: std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    fn code(&self, text: &str) -> String {
        if self.ansi {
            format!("\x1b[36m{}\x1b[0m", text)
        } else {
            format!("`{}`", text)
        }
    }
}
