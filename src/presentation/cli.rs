// Terminal-backed chat responder for the one-shot CLI
use crate::application::dispatcher::ChatResponder;
use crate::domain::resolution::Choice;
use async_trait::async_trait;

/// Prints chat messages to the terminal and writes delivered images to the
/// working directory. Stands in for a chat platform binding.
#[derive(Debug, Default)]
pub struct CliResponder;

#[async_trait]
impl ChatResponder for CliResponder {
    async fn send_message(&self, text: &str) {
        println!("{text}");
    }

    async fn send_error(&self, text: &str) {
        eprintln!("error: {text}");
    }

    async fn prompt_from_menu(&self, prompt: &str, choices: &[Choice]) {
        println!("{prompt}:");
        for choice in choices {
            println!("  {} ({})", choice.display, choice.value);
        }
    }

    async fn send_image(&self, filename: &str, image: &[u8]) {
        match std::fs::write(filename, image) {
            Ok(()) => println!("wrote {filename}"),
            Err(err) => eprintln!("error: failed to write {filename}: {err}"),
        }
    }
}
