//! Interactive dashboard session
//!
//! Operator commands and service completions are interleaved on one task:
//! the loop waits on stdin and on the dashboard's completion channel, so a
//! slow history page never blocks typing and late pages are discarded.

use anyhow::{anyhow, bail, Result};
use dashboard_lib::error::Result as DashboardResult;
use dashboard_lib::{Dashboard, FilterState, PredictionForm, SortOrder, Update};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::report::write_report;
use crate::output::{
    print_error, print_history, print_info, print_json, print_metrics, print_snapshot,
    OutputFormat,
};

const HELP: &str = "\
Commands:
  predict key=value ...   air_temp, process_temp, rpm, torque are required;
                          machine, cost, failures are optional
  next | prev | page N    move through the history
  sort asc|desc           change the sort order
  filter key=value ...    machine, risk, date (YYYY-MM-DD)
  clear                   remove all filters
  show                    print the metrics panel and history
  report [path]           download the maintenance report
  export [path]           export the filtered history as CSV
  metrics                 print session metrics
  quit                    leave the session";

enum Flow {
    Continue,
    Quit,
}

/// Run the session until `quit` or end of input
pub async fn run(dashboard: &mut Dashboard, format: OutputFormat) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_info("Type 'help' for commands");
    dashboard.refresh_history();
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match execute(dashboard, line.trim(), format).await {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => print_error(&e.to_string()),
                }
                prompt();
            }
            Some(event) = dashboard.next_event(), if dashboard.outstanding() > 0 => {
                let outcome = dashboard.handle_event(event);
                show_outcome(dashboard, outcome, format)?;
            }
        }
    }

    Ok(())
}

fn prompt() {
    print!("pmd> ");
    let _ = std::io::stdout().flush();
}

async fn execute(dashboard: &mut Dashboard, line: &str, format: OutputFormat) -> Result<Flow> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Flow::Continue);
    };
    let args: Vec<&str> = words.collect();

    match command {
        "help" | "?" => println!("{}", HELP),
        "quit" | "exit" => return Ok(Flow::Quit),
        "predict" => {
            let generation = dashboard.submit_prediction(&parse_form(&args)?)?;
            debug!(generation, "Prediction submitted from session");
            print_info("Prediction requested");
        }
        "next" => {
            dashboard.next_page();
        }
        "prev" => {
            if dashboard.prev_page().is_none() {
                print_info("Already on the first page");
            }
        }
        "page" => {
            let page = args
                .first()
                .ok_or_else(|| anyhow!("usage: page N"))?
                .parse::<u32>()?;
            dashboard.go_to_page(page);
        }
        "sort" => {
            let order = args
                .first()
                .ok_or_else(|| anyhow!("usage: sort asc|desc"))?
                .parse::<SortOrder>()
                .map_err(|e| anyhow!(e))?;
            dashboard.set_sort(order);
        }
        "filter" => {
            dashboard.set_filters(parse_filters(&args)?);
        }
        "clear" => {
            dashboard.set_filters(FilterState::default());
        }
        "show" => print_snapshot(
            dashboard.snapshot(),
            &dashboard.config().currency_symbol,
            dashboard.pager().page_number(),
            format,
        )?,
        "report" => {
            let output = output_path(&args, "maintenance_report.pdf");
            write_report(dashboard, &output).await?;
        }
        "export" => {
            let output = output_path(&args, "prediction_history.csv");
            super::export::export_history(dashboard, &output).await?;
        }
        "metrics" => print!("{}", dashboard.metrics().render()),
        other => bail!("unknown command '{}' (try 'help')", other),
    }

    Ok(Flow::Continue)
}

fn show_outcome(
    dashboard: &Dashboard,
    outcome: DashboardResult<Update>,
    format: OutputFormat,
) -> Result<()> {
    match outcome {
        Ok(Update::PredictionApplied { .. }) => {
            println!();
            match format {
                OutputFormat::Json => print_json(&dashboard.snapshot().metrics)?,
                OutputFormat::Table => print_metrics(&dashboard.snapshot().metrics),
            }
        }
        Ok(Update::HistoryApplied { .. }) => {
            println!();
            match format {
                OutputFormat::Json => print_json(&dashboard.snapshot().history)?,
                OutputFormat::Table => print_history(
                    dashboard.snapshot(),
                    &dashboard.config().currency_symbol,
                    dashboard.pager().page_number(),
                ),
            }
        }
        Ok(Update::Discarded) | Ok(Update::Superseded) => return Ok(()),
        Err(e) => {
            println!();
            print_error(&e.user_message());
        }
    }
    prompt();
    Ok(())
}

fn output_path(args: &[&str], default: &str) -> PathBuf {
    PathBuf::from(args.first().copied().unwrap_or(default))
}

fn pairs<'a>(args: &[&'a str]) -> Result<Vec<(&'a str, &'a str)>> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .ok_or_else(|| anyhow!("expected key=value, got '{}'", arg))
        })
        .collect()
}

fn parse_form(args: &[&str]) -> Result<PredictionForm> {
    let mut form = PredictionForm::default();
    for (key, value) in pairs(args)? {
        let slot = match key {
            "machine" | "machine_id" => &mut form.machine_id,
            "air_temp" | "air" => &mut form.air_temp,
            "process_temp" | "process" => &mut form.process_temp,
            "rpm" => &mut form.rpm,
            "torque" => &mut form.torque,
            "cost" | "breakdown_cost" => &mut form.breakdown_cost,
            "failures" | "failures_per_month" => &mut form.failures_per_month,
            other => bail!("unknown reading '{}'", other),
        };
        *slot = value.to_string();
    }
    Ok(form)
}

fn parse_filters(args: &[&str]) -> Result<FilterState> {
    let (mut machine, mut risk, mut date) = ("", "", "");
    for (key, value) in pairs(args)? {
        match key {
            "machine" => machine = value,
            "risk" => risk = value,
            "date" => date = value,
            other => bail!("unknown filter '{}'", other),
        }
    }
    FilterState::from_inputs(machine, risk, date).map_err(|e| anyhow!(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_lib::RiskLevel;

    #[test]
    fn test_parse_form_maps_aliases() {
        let form = parse_form(&["machine=M-7", "air=300.1", "rpm=1500", "cost=42000"]).unwrap();
        assert_eq!(form.machine_id, "M-7");
        assert_eq!(form.air_temp, "300.1");
        assert_eq!(form.rpm, "1500");
        assert_eq!(form.breakdown_cost, "42000");
        assert!(form.torque.is_empty());
    }

    #[test]
    fn test_parse_form_rejects_unknown_key() {
        assert!(parse_form(&["pressure=3"]).is_err());
        assert!(parse_form(&["torque"]).is_err());
    }

    #[test]
    fn test_parse_filters() {
        let filters = parse_filters(&["risk=high", "machine=M-2"]).unwrap();
        assert_eq!(filters.machine.as_deref(), Some("M-2"));
        assert_eq!(filters.risk_level, Some(RiskLevel::High));
        assert!(filters.date.is_none());

        assert!(parse_filters(&["date=yesterday"]).is_err());
    }

    #[test]
    fn test_output_path_default() {
        assert_eq!(output_path(&[], "a.csv"), PathBuf::from("a.csv"));
        assert_eq!(output_path(&["b.csv"], "a.csv"), PathBuf::from("b.csv"));
    }
}
