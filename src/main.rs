use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use orderlens::chart_export::export_charts;
use orderlens::dashboard::compute_snapshot;
use orderlens::loader::SessionData;
use orderlens::report::render_report;
use orderlens::{App, AppConfig, AppEvent, Args, ConfigManager, DashboardOptions, Theme, APP_NAME};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Headless runs log to stderr; the UI owns the terminal, so it logs to
/// `--log-file` or nowhere.
fn init_logging(args: &Args, tui: bool) -> Result<()> {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match (&args.log_file, tui) {
        (Some(path), _) => {
            let file = File::create(path)
                .map_err(|e| eyre!("Cannot open log file {}: {}", path.display(), e))?;
            builder.with_writer(Arc::new(file)).with_ansi(false).init();
        }
        (None, false) => builder.with_writer(std::io::stderr).init(),
        (None, true) => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(
    mut terminal: DefaultTerminal,
    options: DashboardOptions,
    theme: Theme,
    poll_interval: Duration,
) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::new_with_theme(tx.clone(), options, theme);
    render(&mut terminal, &mut app)?;
    tx.send(AppEvent::Open)?;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

/// `--report` and/or `--export-charts` without starting the UI.
fn run_headless(args: &Args, options: &DashboardOptions) -> Result<()> {
    let session = SessionData::new(options.path.clone(), options.load.clone());
    let table = session.table().map_err(|e| eyre!(e.user_message()))?;
    let bounds = table.date_bounds().ok_or_else(|| {
        eyre!(
            "No valid purchase dates found in '{}'.",
            options.path.display()
        )
    })?;

    let start = bounds.clamp(options.start.unwrap_or(bounds.min()));
    let end = bounds.clamp(options.end.unwrap_or(bounds.max()));
    let snapshot = compute_snapshot(&table, start, end, options.top_n)
        .map_err(|e| eyre!(e.user_message()))?;

    if args.report {
        println!("{}", render_report(&snapshot, Some(bounds), args.format)?);
    }

    if args.export_charts.is_some() {
        let files = export_charts(&options.export_dir, &snapshot, options.export_size)?;
        for file in files {
            eprintln!("Wrote {}", file.display());
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        match ConfigManager::new(APP_NAME) {
            Ok(config) => match config.write_default_config(args.force) {
                Ok(path) => {
                    println!("Configuration file written to {}", path.display());
                    return Ok(Some(()));
                }
                Err(e) => {
                    eprintln!("Error writing config file: {}", e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error initializing config manager: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();
    color_eyre::install()?;

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    let headless = args.report || args.export_charts.is_some();
    init_logging(&args, !headless)?;

    let config = AppConfig::load(APP_NAME)?;
    let options = DashboardOptions::from_args_and_config(&args, &config)?;

    if headless {
        return run_headless(&args, &options);
    }

    let theme = Theme::from_config(&config.theme)?;
    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);
    let terminal = ratatui::init();
    let result = run(terminal, options, theme, poll_interval);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
