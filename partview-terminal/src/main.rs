use anyhow::Context;
use clap::Parser;
use log::info;
use partview_terminal::{app, Cli, Config, TerminalApp};
use simple_logger::SimpleLogger;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let config = Config::discover(cli.config.as_deref(), &cwd)?;
    let level = match cli.log_level {
        Some(level) => level,
        None => config.level_filter()?,
    };
    SimpleLogger::new().with_level(level).init()?;

    if cli.snapshot {
        let text = app::snapshot(
            config,
            &cli.files,
            usize::from(cli.width),
            usize::from(cli.height),
        )?;
        print!("{text}");
        return Ok(());
    }

    info!("starting with {} files", cli.files.len());
    let mut app = TerminalApp::new(config).context("cannot query terminal size")?;
    app.open(&cli.files);
    app.run().context("terminal error")?;
    Ok(())
}
