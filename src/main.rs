mod app;
mod command;
mod commentary;
mod config;
mod consts;
mod finalize;
mod game;
mod history;
mod panel;
mod util;
use crate::app::App;
use crate::config::Config;
use crate::game::Game;
use anyhow::Context;
use crossterm::event::{DisableFocusChange, EnableFocusChange};
use lexopt::{Arg, Parser, ValueExt};
use simplelog::{LevelFilter, WriteLogger};
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "\
Usage: neon-snake [<options>]

Play Snake in your terminal, with a ranked history of your games

Options:
  -c, --config <FILE>       Read configuration from the given file
      --log-file <FILE>     Write log messages to the given file
      --log-level <LEVEL>   Log messages at or above the given level
                            [default: info]
  -h, --help                Display this help message and exit
  -V, --version             Show the program version and exit
";

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run(Arguments),
    Help,
    Version,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut args = Arguments::default();
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('c') | Arg::Long("config") => {
                    args.config = Some(PathBuf::from(parser.value()?));
                }
                Arg::Long("log-file") => args.log_file = Some(PathBuf::from(parser.value()?)),
                Arg::Long("log-level") => args.log_level = parser.value()?.parse()?,
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Command::Run(args))
    }

    fn run(self) -> ExitCode {
        match self {
            Command::Run(args) => match args.run() {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    log::error!("{e:?}");
                    eprintln!("neon-snake: {e:?}");
                    ExitCode::from(2)
                }
            },
            Command::Help => {
                print!("{USAGE}");
                ExitCode::SUCCESS
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                ExitCode::SUCCESS
            }
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Arguments {
    config: Option<PathBuf>,
    log_file: Option<PathBuf>,
    log_level: LevelFilter,
}

impl Default for Arguments {
    fn default() -> Arguments {
        Arguments {
            config: None,
            log_file: None,
            log_level: LevelFilter::Info,
        }
    }
}

impl Arguments {
    fn run(self) -> anyhow::Result<()> {
        self.init_logging()?;
        log::info!(
            "Starting {} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        );
        let config = match self.config {
            Some(ref path) => Config::load(path, false),
            None => Config::default_path().and_then(|p| Config::load(&p, true)),
        }
        .context("failed to load configuration")?;
        let app = App::new(Game::new(), config.history_store(), config.finalizer());
        let mut terminal = ratatui::init();
        let r = crossterm::execute!(terminal.backend_mut(), EnableFocusChange)
            .and_then(|()| app.run(terminal));
        let _ = crossterm::execute!(io::stdout(), DisableFocusChange);
        ratatui::restore();
        match r {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
            Err(e) => Err(e).context("terminal I/O failed"),
        }
    }

    /// Send log messages to a file, as the terminal is occupied by the game.
    /// If no log file is given and the default location can't be
    /// determined, nothing is logged.
    fn init_logging(&self) -> anyhow::Result<()> {
        let Some(path) = self.log_file.clone().or_else(default_log_file) else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent).context("failed to create log directory")?;
        }
        let file = fs_err::File::create(&path).context("failed to open log file")?;
        WriteLogger::init(self.log_level, simplelog::Config::default(), file)
            .context("failed to initialize logger")?;
        Ok(())
    }
}

fn default_log_file() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("neon-snake").join("neon-snake.log"))
}

fn main() -> ExitCode {
    match Command::from_parser(Parser::from_env()) {
        Ok(cmd) => cmd.run(),
        Err(e) => {
            eprintln!("neon-snake: {e}");
            ExitCode::from(2)
        }
    }
}
