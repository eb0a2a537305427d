//! UI utilities for the CLI

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, BufRead, IsTerminal, Write};

use docrag_core::{IndexingResult, RAGResult, Result, ScoredRow};

use crate::Answer;

const PROMPT: &str = "ask>";

/// Display startup banner
pub fn display_banner(table: &str, rows: usize) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = terminal_width.saturating_sub(4).clamp(40, 67);
    let inner = banner_width - 2;

    let top_border = format!("┌{}┐", "─".repeat(inner));
    let bottom_border = format!("└{}┘", "─".repeat(inner));
    let empty_line = format!("│{}│", " ".repeat(inner));

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());

    let title = "docrag - ask your documentation";
    println!(
        "{}{}{}",
        "│  ".blue(),
        title.blue().bold(),
        format!("{}│", " ".repeat(inner.saturating_sub(title.chars().count() + 2))).blue()
    );
    println!("{}", empty_line.blue());

    let table_line = format!("Table: {}", table);
    let rows_line = format!("{} row(s) loaded", rows);
    for line in [table_line.as_str(), rows_line.as_str()] {
        let shown: String = line.chars().take(inner.saturating_sub(4)).collect();
        let padding = inner.saturating_sub(shown.chars().count() + 2);
        println!("{}", format!("│  {}{}│", shown, " ".repeat(padding)).blue());
    }

    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
    println!(
        "{}",
        "Tip: ask a question in plain language, or 'help' for commands".dimmed()
    );
    println!();
}

/// Read one line, with ↑/↓ history navigation when stdin is a terminal.
///
/// Returns `None` at end of input (closed pipe, Ctrl+D or Ctrl+C).
pub async fn handle_input_with_history(history: &mut Vec<String>) -> Result<Option<String>> {
    if !io::stdin().is_terminal() {
        return read_piped_line(&mut io::stdin().lock(), history);
    }

    print!("{} ", PROMPT.green().bold());
    io::stdout().flush()?;

    enable_raw_mode()?;
    let read = read_raw_line(history);
    disable_raw_mode()?;
    println!();

    Ok(read?.map(|line| remember(line, history)))
}

fn read_piped_line(reader: &mut impl BufRead, history: &mut Vec<String>) -> Result<Option<String>> {
    let mut input = String::new();
    if reader.read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(remember(input, history)))
}

fn remember(line: String, history: &mut Vec<String>) -> String {
    let line = line.trim().to_string();
    if !line.is_empty() {
        history.push(line.clone());
    }
    line
}

fn read_raw_line(history: &[String]) -> Result<Option<String>> {
    let mut input = String::new();
    let mut history_index: Option<usize> = None;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        if key_event.kind == KeyEventKind::Release {
            continue;
        }

        match key_event.code {
            KeyCode::Char('c' | 'd') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(None);
            }
            KeyCode::Enter => return Ok(Some(input)),
            KeyCode::Esc => return Ok(Some(String::new())),
            KeyCode::Char(c) => {
                input.push(c);
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Up if !history.is_empty() => {
                let new_index = match history_index {
                    None => history.len() - 1,
                    Some(idx) => idx.saturating_sub(1),
                };
                history_index = Some(new_index);
                input = history[new_index].clone();
            }
            KeyCode::Down => {
                if let Some(idx) = history_index {
                    if idx + 1 < history.len() {
                        history_index = Some(idx + 1);
                        input = history[idx + 1].clone();
                    } else {
                        history_index = None;
                        input.clear();
                    }
                }
            }
            _ => continue,
        }

        print!("\r\x1b[2K{} {}", PROMPT.green().bold(), input);
        io::stdout().flush()?;
    }
}

/// Display help message
pub fn print_help() {
    println!("{}", "Available commands:".bold());
    println!("  {} - Ask a question about the indexed documents", "<question>".green());
    println!("  {} - Show table statistics", "stats".green());
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the application", "exit/quit".green());
    println!();
    println!("{}", "Examples:".bold());
    println!("  How do I close a job?");
    println!("  Where are customer price books maintained?");
}

/// One line per retrieved row: rank, score, location and title
pub fn format_sources(documents: &[ScoredRow]) -> Vec<String> {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let mut line = format!(
                "{}. [{:.3}] {}/{}#{}",
                i + 1,
                doc.score,
                doc.row.folder,
                doc.row.file,
                doc.row.chunk_index
            );
            if let Some(title) = &doc.row.title {
                line.push_str(&format!(" ({})", title));
            }
            line
        })
        .collect()
}

/// Print the retrieved sources (optional), the prompt and any model answer
pub fn print_answer(answer: &Answer, show_sources: bool) {
    print_retrieval(&answer.retrieval, show_sources);

    if let Some(completion) = &answer.completion {
        println!("{}", "Answer:".green().bold());
        println!("{}", completion.text.trim());
        if let Some(tokens) = completion.tokens_used {
            println!("{}", format!("({} tokens, {})", tokens, completion.model_id).dimmed());
        }
        println!();
    }
}

pub fn print_retrieval(result: &RAGResult, show_sources: bool) {
    if show_sources {
        println!("{}", "Sources:".bold());
        for line in format_sources(&result.documents) {
            println!("  {}", line.cyan());
        }
        println!();
    }

    println!("{}", "Prompt:".bold());
    println!("{}", result.prompt);
    println!();
}

/// Summary of an indexing run
pub fn print_indexing_summary(result: &IndexingResult, table_path: &str) {
    let status = if result.batches_failed == 0 {
        "✅".green()
    } else {
        "⚠️".yellow()
    };

    println!(
        "{} Indexed {} row(s) in {} batch(es)",
        status, result.rows_indexed, result.batches_total
    );
    if result.batches_failed > 0 {
        println!(
            "{}",
            format!(
                "   {} batch(es) failed, {} chunk(s) skipped",
                result.batches_failed, result.rows_skipped
            )
            .yellow()
        );
    }
    for error in &result.errors {
        eprintln!("   {}", error.red());
    }
    println!("{} Table saved to {}", "💾".cyan(), table_path.bold());
}
