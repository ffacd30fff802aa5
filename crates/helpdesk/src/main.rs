//! The terminal front end of the support assistant.

#[macro_use]
extern crate tracing;

mod review;

use std::env;
use std::io::Write as _;
use std::sync::{Arc, Mutex};

use helpdesk_core::conversation::{Message, Role, Transcript};
use helpdesk_core::{ControllerBuilder, Stage};
use helpdesk_http::{HttpBackend, HttpConfigBuilder};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = HttpConfigBuilder::new();
    if let Ok(base_url) = env::var("HELPDESK_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    let backend = HttpBackend::new(config.build());

    let health = backend.check_health().await;
    if health.status == "offline" {
        println!(
            "{}",
            "⚠️  The support backend is unreachable; set HELPDESK_BASE_URL \
             to point at it."
                .bright_yellow()
        );
    } else {
        let service = health.service.as_deref().unwrap_or("support backend");
        println!("{}", format!("Connected to {service}.").dimmed());
    }
    println!(
        "{}",
        "Commands: /new, /review, /ticket <text>, /quit".dimmed()
    );

    let renderer = Arc::new(Mutex::new(Renderer::default()));
    let mut controller = ControllerBuilder::with_backend(backend.clone())
        .on_update({
            let renderer = Arc::clone(&renderer);
            move |transcript| renderer.lock().unwrap().apply(transcript)
        })
        .build();
    // Render the greeting that was seeded at build time.
    renderer.lock().unwrap().apply(controller.transcript());

    loop {
        print!("\n> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        if line == "/new" {
            controller.start_new_ticket();
            println!("{}", "Starting a new ticket.".dimmed());
            continue;
        }
        if line == "/review" {
            review::run(&backend).await;
            continue;
        }
        if let Some(text) = line.strip_prefix("/ticket ") {
            file_ticket(&backend, text.trim()).await;
            continue;
        }

        controller.submit(line).await;

        if controller.stage() == Stage::AwaitingConfirmation {
            print!(
                "{}",
                "Has this resolved your issue? [y/N]: ".bright_white()
            );
            std::io::stdout().flush().unwrap();

            let Some(answer) = read_line().await else {
                break;
            };
            if answer.trim().eq_ignore_ascii_case("y") {
                controller.resolve_pending().await;
            } else {
                controller.continue_pending();
            }
        }
    }
}

/// Files a ticket without the conversational exchange and prints the
/// processing outcome.
async fn file_ticket(backend: &HttpBackend, text: &str) {
    if text.is_empty() {
        println!("{}", "Usage: /ticket <problem description>".dimmed());
        return;
    }
    match backend.create_ticket(text).await {
        Ok(ticket) => {
            println!(
                "Filed ticket {} ({}).",
                ticket.ticket_id.bright_white(),
                ticket.status
            );
            if let Some(solution) = &ticket.result.proposed_solution {
                println!("{}🤖 {}", BAR_CHAR.bright_cyan(), solution);
            }
        }
        Err(err) => {
            println!(
                "{}",
                format!("Failed to file the ticket: {err}").bright_red()
            );
        }
    }
}

/// Incrementally prints transcript snapshots.
///
/// The controller publishes the whole transcript on every change;
/// the renderer tracks how much of it is already on screen and only
/// writes the tail.
#[derive(Default)]
struct Renderer {
    rendered: usize,
    streamed: String,
}

impl Renderer {
    fn apply(&mut self, transcript: &Transcript) {
        let messages = transcript.messages();
        while self.rendered < messages.len() {
            let msg = &messages[self.rendered];
            if msg.is_streaming() {
                self.stream_delta(msg);
                return;
            }
            self.finish(msg);
            self.rendered += 1;
        }
    }

    fn stream_delta(&mut self, msg: &Message) {
        let content = msg.content();
        let Some(delta) = content.strip_prefix(self.streamed.as_str()) else {
            return;
        };
        if delta.is_empty() {
            return;
        }
        if self.streamed.is_empty() {
            print!("{}🤖 ", BAR_CHAR.bright_cyan());
        }
        print!("{}", delta.bright_white());
        std::io::stdout().flush().unwrap();
        self.streamed = content.to_owned();
    }

    fn finish(&mut self, msg: &Message) {
        let streamed = std::mem::take(&mut self.streamed);
        match msg.role() {
            // The user line is already on screen from the prompt.
            Role::User => {}
            Role::Assistant => {
                match msg.content().strip_prefix(streamed.as_str()) {
                    Some(rest) if !streamed.is_empty() => {
                        // The final content extends what was already
                        // streamed; write only the tail.
                        println!("{}", rest.bright_white());
                    }
                    _ => {
                        if !streamed.is_empty() {
                            println!();
                        }
                        println!(
                            "{}🤖 {}",
                            BAR_CHAR.bright_cyan(),
                            msg.content().bright_white()
                        );
                    }
                }
                self.print_metadata(msg);
            }
            Role::System => {
                println!(
                    "{}ℹ️  {}",
                    BAR_CHAR.bright_yellow(),
                    msg.content()
                );
            }
        }
    }

    fn print_metadata(&self, msg: &Message) {
        let Some(metadata) = msg.metadata() else {
            return;
        };
        let mut parts = Vec::new();
        if let Some(intent) = &metadata.intent {
            parts.push(format!("intent: {intent}"));
        }
        if let Some(confidence) = metadata.confidence {
            parts.push(format!("confidence: {:.0}%", confidence * 100.0));
        }
        if let Some(status) = &metadata.status {
            parts.push(format!("status: {status}"));
        }
        if parts.is_empty() {
            return;
        }
        println!(
            "{}{}",
            BAR_CHAR.bright_cyan(),
            parts.join("  ").dimmed()
        );
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
