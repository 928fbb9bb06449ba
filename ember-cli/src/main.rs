//! Ember CLI - The Ember interpreter command line interface.
//! Ember CLI - Ember 解释器的命令行界面。

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
/// 保存日志过滤器的环境变量。
const LOG_VAR: &str = "EMBER_LOG";

/// Main CLI structure.
/// 主 CLI 结构体。
#[derive(Parser)]
#[command(name = "ember")]
#[command(author, version, about = "Ember - An Erlang-flavoured interpreter with lightweight processes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output. / 启用详细输出。
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress output. / 抑制输出。
    #[arg(short, long, global = true)]
    quiet: bool,

    /// JSON configuration file. / JSON 配置文件。
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

/// Available CLI commands.
/// 可用的 CLI 命令。
#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression. / 求值表达式。
    Eval {
        /// The expression to evaluate. / 要求值的表达式。
        expr: String,
    },

    /// Run an Ember file, calling main/0 if defined. / 运行 Ember 文件，若定义了 main/0 则调用它。
    Run {
        /// The file to run. / 要运行的文件。
        file: PathBuf,
    },

    /// Parse a file and report diagnostics. / 解析文件并报告诊断信息。
    Check {
        /// The file to check. / 要检查的文件。
        file: PathBuf,
    },

    /// Start an interactive REPL. / 启动交互式 REPL。
    Repl,
}

/// Install the log subscriber. `EMBER_LOG` wins over the flags.
/// 安装日志订阅者。`EMBER_LOG` 优先于命令行标志。
fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Main entry point.
/// 主入口点。
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let options = commands::Options {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
    };

    let result = match cli.command {
        Commands::Eval { expr } => commands::eval::run(&expr, &options),
        Commands::Run { file } => commands::run::run(&file, &options),
        Commands::Check { file } => commands::check::run(&file, &options),
        Commands::Repl => commands::repl::run(&options),
    };

    if let Err(e) = result {
        if !options.quiet {
            output::error(&e);
        }
        std::process::exit(1);
    }
}
