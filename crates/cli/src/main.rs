mod cli;
mod command;
mod config;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use crontention_core::config::{load_dotenv, parse_time_zone};
use crontention_core::history::ROOT_LOCATION;
use crontention_core::{Controller, Evaluator, HttpEvaluator, Query, SubmitOutcome};

use crate::cli::CliArgs;
use crate::command::Command;
use crate::config::CliConfig;
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let terminal = Terminal::new();

    // Load config
    let file_config = CliConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;
    let service = file_config.resolve(args.server.as_deref(), args.timezone.as_deref());
    service.validate().context("invalid service configuration")?;
    service.log_summary();

    let zone = service.zone().context("invalid time zone")?;
    let evaluator = HttpEvaluator::from_config(&service);
    let mut controller =
        Controller::new(evaluator, zone).context("failed to initialize controller")?;

    let date = file_config.resolve_date(args.date.as_deref());
    let location = initial_location(&args, &date);
    info!(location = %location, "Loading initial view");

    let outcome = controller.load_initial(&location).await;
    if controller.form().is_empty() && !date.is_empty() {
        controller.set_date(date);
    }

    if args.once {
        terminal.print_view(&controller)?;
        return match outcome {
            SubmitOutcome::Drawn(_) | SubmitOutcome::Ignored => Ok(()),
            other => anyhow::bail!("evaluation did not produce a heat map: {:?}", other),
        };
    }

    terminal.print_banner(&service.service_url, &service.time_zone)?;
    terminal.print_view(&controller)?;
    terminal.print_outcome(&outcome)?;

    // REPL loop
    loop {
        let input = match terminal.read_input()? {
            Some(text) => text,
            None => {
                terminal.print_info("Goodbye.")?;
                break;
            }
        };

        if input.is_empty() {
            continue;
        }

        let command = match Command::parse(&input) {
            Ok(command) => command,
            Err(e) => {
                terminal.print_error(&format!("{:#}", e))?;
                continue;
            }
        };

        if command == Command::Quit {
            terminal.print_info("Goodbye.")?;
            break;
        }

        if let Err(e) = apply(&mut controller, &terminal, command).await {
            warn!(error = %e, "Command failed");
            terminal.print_error(&format!("{:#}", e))?;
        }
    }

    Ok(())
}

/// Location the session starts at: an explicit shareable query, or one built
/// from `-e`/`--date`.
fn initial_location(args: &CliArgs, date: &str) -> String {
    if let Some(url) = &args.url {
        let query = url.trim_start_matches('/');
        return if query.starts_with('?') {
            format!("{ROOT_LOCATION}{query}")
        } else {
            format!("{ROOT_LOCATION}?{query}")
        };
    }
    if args.expression.is_empty() {
        return ROOT_LOCATION.to_string();
    }
    let query = Query::new(args.expression.join("\n"), date);
    format!("{ROOT_LOCATION}{}", query.location())
}

/// Run one REPL command against the controller and repaint what changed.
async fn apply<E: Evaluator>(
    controller: &mut Controller<E>,
    terminal: &Terminal,
    command: Command,
) -> Result<()> {
    match command {
        Command::Expr(expression) => {
            controller.add_expression(&expression);
            let count = controller.form().expression_lines().len();
            terminal.print_info(&format!("{} expression(s) in form.", count))?;
        }
        Command::Clear => {
            controller.clear_expressions();
            terminal.print_info("Expressions cleared.")?;
        }
        Command::Date(date) => {
            controller.set_date(date);
        }
        Command::Eval => {
            let outcome = controller.submit().await;
            terminal.print_view(controller)?;
            terminal.print_outcome(&outcome)?;
        }
        Command::Edit => {
            controller.edit();
            terminal.print_view(controller)?;
        }
        Command::Hover { hour, minute } => {
            let renderer = controller.renderer_mut();
            let id = renderer
                .scene()
                .at(hour, minute)
                .map(|e| e.id)
                .with_context(|| format!("no cell at {:02}:{:02}", hour, minute))?;
            renderer.hover(id);
            terminal.print_detail(renderer.detail())?;
        }
        Command::Leave => {
            let renderer = controller.renderer_mut();
            if let Some(id) = renderer.hovered() {
                renderer.leave(id);
            }
        }
        Command::Click { hour, minute } => {
            let renderer = controller.renderer_mut();
            let id = renderer
                .scene()
                .at(hour, minute)
                .map(|e| e.id)
                .with_context(|| format!("no cell at {:02}:{:02}", hour, minute))?;
            renderer.click(id);
            terminal.print_grid(renderer)?;
            terminal.print_detail(renderer.detail())?;
        }
        Command::Highlight(n) => {
            let renderer = controller.renderer_mut();
            if n > renderer.listing().len() {
                anyhow::bail!("no expression {} in listing", n);
            }
            renderer.toggle_highlight(n - 1);
            terminal.print_grid(renderer)?;
            terminal.print_listing(renderer)?;
        }
        Command::TimeZone(name) => {
            let zone = parse_time_zone(&name)?;
            controller.set_time_zone(zone);
            terminal.print_grid(controller.renderer())?;
        }
        Command::Back => {
            if !controller.history().can_go_back() {
                return terminal.print_info("Already at the oldest entry.");
            }
            let outcome = controller.back().await;
            terminal.print_view(controller)?;
            terminal.print_outcome(&outcome)?;
        }
        Command::Forward => {
            if !controller.history().can_go_forward() {
                return terminal.print_info("Already at the newest entry.");
            }
            let outcome = controller.forward().await;
            terminal.print_view(controller)?;
            terminal.print_outcome(&outcome)?;
        }
        Command::Url => {
            terminal.print_info(controller.history().location())?;
        }
        Command::Show => terminal.print_view(controller)?,
        Command::Help => terminal.print_help()?,
        Command::Quit => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_location_from_expressions() {
        let args = CliArgs::parse_from(["crontention", "-e", "a", "-e", "b"]);
        assert_eq!(
            initial_location(&args, "2020-07-12"),
            "/?expressions=a%0Ab&date=2020-07-12"
        );
    }

    #[test]
    fn test_initial_location_from_url() {
        let args = CliArgs::parse_from(["crontention", "--url", "?expressions=x&date=today"]);
        assert_eq!(initial_location(&args, ""), "/?expressions=x&date=today");
        let args = CliArgs::parse_from(["crontention", "--url", "expressions=x"]);
        assert_eq!(initial_location(&args, ""), "/?expressions=x");
    }

    #[test]
    fn test_initial_location_empty() {
        let args = CliArgs::parse_from(["crontention"]);
        assert_eq!(initial_location(&args, "today"), "/");
    }
}
