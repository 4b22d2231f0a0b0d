//! Interactive line loop: session commands plus free-text questions.

use anyhow::Result;
use datachat::executor::TerminalSink;
use datachat::llm::MODEL_OPTIONS;
use datachat::session::Session;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;

pub async fn run(session: &mut Session) -> Result<()> {
    println!("datachat - ask questions about your data (:help for commands)");

    let mut editor = DefaultEditor::new()?;
    let mut sink = TerminalSink;

    loop {
        match editor.readline("datachat> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                if let Some(command) = line.strip_prefix(':') {
                    if !handle_command(command, session, &mut sink) {
                        break;
                    }
                } else {
                    let outcome = session.ask(line).await;
                    println!("\n{}\n", outcome.reply);
                    for snippet in &outcome.snippets {
                        println!(
                            "[snippet #{}] run it with :run {}",
                            snippet.ordinal, snippet.ordinal
                        );
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

fn handle_command(command: &str, session: &mut Session, sink: &mut TerminalSink) -> bool {
    let mut parts = command.splitn(2, ' ');
    let name = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    match name {
        "quit" | "q" | "exit" => return false,
        "help" => print_help(),
        "clear" => {
            session.clear_history();
            println!("Chat history cleared.");
        }
        "key" => {
            if rest.is_empty() {
                println!("usage: :key <api-key>");
            } else {
                session.set_credential(rest);
                println!("API key set.");
            }
        }
        "model" => {
            if rest.is_empty() {
                println!(
                    "Current model: {} (options: {})",
                    session.model(),
                    MODEL_OPTIONS.join(", ")
                );
            } else {
                match session.set_model(rest) {
                    Ok(()) => println!("Model set to {}.", rest),
                    Err(e) => println!("{}", e),
                }
            }
        }
        "load" => {
            if rest.is_empty() {
                println!("usage: :load <path>");
            } else {
                match session.load_dataset(Path::new(rest)) {
                    Ok(dataset) => println!(
                        "Loaded '{}' ({} rows, {} columns)",
                        dataset.name,
                        dataset.row_count(),
                        dataset.frame.width()
                    ),
                    Err(e) => println!("{}", e),
                }
            }
        }
        "run" => run_command(rest, session, sink),
        other => println!("Unknown command ':{}' (:help for commands)", other),
    }

    true
}

/// `:run <n>` targets the most recent reply; `:run <message> <n>` addresses
/// any assistant reply in history by its index.
fn run_command(rest: &str, session: &Session, sink: &mut TerminalSink) {
    let mut numbers = rest.split_whitespace().map(|p| p.parse::<usize>());

    let target = match (numbers.next(), numbers.next()) {
        (Some(Ok(origin)), Some(Ok(ordinal))) => Some((origin, ordinal)),
        (Some(Ok(ordinal)), None) => session
            .last_assistant_origin()
            .map(|origin| (origin, ordinal)),
        _ => None,
    };

    match target {
        Some((origin, ordinal)) => {
            let result = session.run_snippet(origin, ordinal, sink);
            if !result.success {
                println!("{}", result.message);
            }
        }
        None => {
            if session.history().is_empty() {
                println!("Nothing to run yet - ask a question first.");
            } else {
                println!("usage: :run [message] <snippet-number>");
            }
        }
    }
}

fn print_help() {
    println!(
        "\
Commands:
  :load <path>      load a CSV or Excel file
  :key <key>        set the API key for this session
  :model [name]     show or set the model
  :run [msg] <n>    run snippet n from the last reply, or from message msg
  :clear            clear the chat history
  :quit             exit

Anything else is sent to the model as a question about the loaded data."
    );
}
