//! `rollcall` - CLI for the attendance store
//!
//! This binary is the front end of the store: it validates input, submits
//! records, renders views, and gates reset and export behind the admin password.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use rollcall::cli::{
    Cli, Command, ConfigCommand, ExportCommand, ResetCommand, SubmitCommand, ViewCommand,
};
use rollcall::record::parse_date_key;
use rollcall::{
    export, init_logging, AttendanceStore, AttendanceView, Config, DocumentState, ExportFormat,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Building the store does no I/O; each command touches the document itself
    let store = config.store();

    match cli.command {
        Command::Init => handle_init(&store),
        Command::Submit(cmd) => handle_submit(&store, &cmd),
        Command::View(cmd) => handle_view(&store, &cmd),
        Command::Dates(cmd) => handle_dates(&store, cmd.json),
        Command::Reset(cmd) => handle_reset(&config, &store, &cmd),
        Command::Export(cmd) => handle_export(&config, &store, &cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

/// Validate a date argument, returning it unchanged.
fn date_arg(value: &str) -> rollcall::Result<String> {
    parse_date_key(value).map(|_| value.to_string())
}

fn handle_init(store: &AttendanceStore) -> anyhow::Result<()> {
    let state = store
        .initialize()
        .with_context(|| format!("failed to initialize {}", store.path().display()))?;
    match state {
        DocumentState::Created => println!("Created {}", store.path().display()),
        DocumentState::Valid => println!("{} is valid", store.path().display()),
        DocumentState::Recovered(reason) => println!(
            "Repaired {} ({reason}); policy: {}",
            store.path().display(),
            store.recovery_policy()
        ),
    }
    Ok(())
}

fn handle_submit(store: &AttendanceStore, cmd: &SubmitCommand) -> anyhow::Result<()> {
    let name = cmd.student_name()?;
    let record = store
        .append(name, cmd.status.into(), cmd.meals())
        .context("failed to record attendance, please try again later")?;
    println!(
        "Thank you {}! Your attendance has been recorded (#{} at {}).",
        record.student_name, record.id, record.timestamp
    );
    Ok(())
}

fn handle_view(store: &AttendanceStore, cmd: &ViewCommand) -> anyhow::Result<()> {
    let view = if cmd.all {
        AttendanceView::all_dates(store)?
    } else {
        let date = match &cmd.date {
            Some(date) => date_arg(date)?,
            None => store.today(),
        };
        AttendanceView::for_date(store, &date)?
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    match &view.date {
        Some(date) => println!("Attendance for {date}"),
        None => println!("Attendance for all dates"),
    }
    println!("=====================");
    if view.is_empty() {
        println!("(no records)");
    } else {
        println!(
            "{:<10}  {:>3}  {:<24}  {:<10}  {:<3}  {:<3}  {:<3}  Timestamp",
            "Date", "ID", "Student", "Status", "B", "L", "D"
        );
        for dated in &view.records {
            let r = &dated.record;
            println!(
                "{:<10}  {:>3}  {:<24}  {:<10}  {:<3}  {:<3}  {:<3}  {}",
                dated.date,
                r.id,
                r.student_name,
                r.status,
                mark(r.meals.breakfast),
                mark(r.meals.lunch),
                mark(r.meals.dinner),
                r.timestamp
            );
        }
    }

    let stats = view.stats;
    println!();
    println!("Total:       {}", stats.total);
    println!("Coming:      {}", stats.coming);
    println!("Not coming:  {}", stats.not_coming);
    println!("Breakfast:   {}", stats.breakfast);
    println!("Lunch:       {}", stats.lunch);
    println!("Dinner:      {}", stats.dinner);
    Ok(())
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "x"
    } else {
        "-"
    }
}

fn handle_dates(store: &AttendanceStore, json: bool) -> anyhow::Result<()> {
    let dates = store.available_dates()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&dates)?);
    } else {
        for date in dates {
            println!("{date}");
        }
    }
    Ok(())
}

fn handle_reset(config: &Config, store: &AttendanceStore, cmd: &ResetCommand) -> anyhow::Result<()> {
    config.check_admin_password(&cmd.password)?;

    if cmd.scope.all {
        store.reset_all()?;
        println!("All attendance data has been reset");
        return Ok(());
    }

    let date = match &cmd.scope.date {
        Some(date) => date_arg(date)?,
        None => store.today(),
    };
    if store.reset_date(Some(&date))? {
        println!("Attendance data for {date} has been reset");
    } else {
        println!("No attendance data for {date}");
    }
    Ok(())
}

fn handle_export(config: &Config, store: &AttendanceStore, cmd: &ExportCommand) -> anyhow::Result<()> {
    config.check_admin_password(&cmd.password)?;

    let date = cmd.date.as_deref().map(date_arg).transpose()?;
    let format: ExportFormat = cmd.format.into();
    let content = export::export(store, date.as_deref(), format)?;

    match &cmd.output {
        Some(output) => {
            let path = if output.is_dir() {
                output.join(export::file_name(date.as_deref(), &store.today(), format))
            } else {
                output.clone()
            };
            fs::write(&path, content)
                .with_context(|| format!("failed to write export to {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                let mut shown = config.clone();
                shown.admin.password = "[REDACTED]".to_string();
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data path:          {}", config.data_path().display());
                println!("  Recovery policy:    {}", config.storage.recovery);
                println!();
                println!("[Admin]");
                println!("  Password:           [REDACTED]");
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path: PathBuf = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
