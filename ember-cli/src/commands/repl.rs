//! The `ember repl` command.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use super::{Options, machine, report};
use crate::output;

pub fn run(options: &Options) -> Result<(), String> {
    println!("Ember REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type :help for help, :quit to exit");
    println!();

    let mut rl = DefaultEditor::new().map_err(|e| e.to_string())?;

    // Bindings and definitions persist in the machine's root context.
    let machine = machine(options)?;

    loop {
        let readline = rl.readline("ember> ");
        match readline {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Handle REPL commands
                if line.starts_with(':') {
                    match line {
                        ":quit" | ":q" => break,
                        ":help" | ":h" => {
                            println!("Commands:");
                            println!("  :help, :h        Show this help");
                            println!("  :quit, :q        Exit the REPL");
                            println!("  :processes, :ps  List live processes");
                            println!();
                            println!("Enter a function definition or an expression, ending with '.'");
                        }
                        ":processes" | ":ps" => {
                            for process in machine.node().processes() {
                                println!(
                                    "{}  {:<10}  {} queued",
                                    process,
                                    process.state(),
                                    process.mailbox_len()
                                );
                            }
                        }
                        _ => println!("Unknown command: {}", line),
                    }
                    continue;
                }

                match machine.eval_input(line) {
                    Ok(value) => output::value(&value),
                    Err(e) => output::error(&report(e)),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
