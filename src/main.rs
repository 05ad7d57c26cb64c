//! gitgym - a simulated git terminal for learning version control.

use gitgym::cli::Cli;
use gitgym::config::Config;
use gitgym::error::{GitGymError, Result};
use gitgym::interpreter::Interpreter;
use gitgym::logging;
use gitgym::repl::Repl;
use gitgym::script::{ScriptConfig, ScriptOutput, ScriptRunner};
use tracing::{error, info};

fn main() {
    let cli = Cli::parse_args();

    logging::init(logging::LogSink::from_flag(cli.log_file));

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let state = cli.initial_state()?;
    let interpreter = match cli.seed {
        Some(seed) => Interpreter::seeded(config.interpreter.clone(), seed),
        None => Interpreter::new(config.interpreter.clone()),
    };

    if cli.is_scripted() {
        let script_config = ScriptConfig {
            output_format: cli.script_format()?,
            fail_fast: cli.fail_fast,
        };
        let mut runner = ScriptRunner::new(script_config, interpreter, state);
        if let Some(events) = &cli.events {
            runner.load_events(events)?;
        } else if let Some(path) = &cli.script {
            runner.load_script(path)?;
        }

        let result = runner.run();
        print!("{}", ScriptOutput::new(script_config.output_format).format(&result));
        return Ok(result.exit_code());
    }

    cli.validate_script().map_err(GitGymError::config)?;
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    Repl::new(interpreter, config.cli.clone(), state).run(stdin.lock(), &mut stdout)?;
    Ok(0)
}
