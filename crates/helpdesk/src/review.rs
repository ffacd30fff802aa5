//! The review-queue view for tickets awaiting a human.

use std::io::Write as _;

use helpdesk_http::HttpBackend;
use helpdesk_protocol::{FeedbackRequest, SupportBackend, TicketSummary};
use owo_colors::OwoColorize;

use crate::read_line;

/// Runs the review loop until the user backs out.
///
/// Listing and fetch failures are printed and retried on the next
/// pass instead of aborting the view.
pub(crate) async fn run(backend: &HttpBackend) {
    loop {
        let tickets = match backend.list_tickets(Some("waiting_human")).await
        {
            Ok(tickets) => tickets,
            Err(err) => {
                println!(
                    "{}",
                    format!("Failed to load tickets: {err}").bright_red()
                );
                return;
            }
        };
        if tickets.is_empty() {
            println!("No tickets pending review.");
            return;
        }

        println!("\nTickets awaiting review:");
        for (index, ticket) in tickets.iter().enumerate() {
            let short_id = short_id(&ticket.ticket_id);
            let excerpt = ticket
                .result
                .ticket_text
                .as_deref()
                .unwrap_or("(no text)");
            println!(
                "  {}. #{} {}",
                index + 1,
                short_id.bright_white(),
                excerpt
            );
        }
        print!("Pick a ticket (or press enter to go back): ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            return;
        };
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let picked = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|n| tickets.get(n));
        let Some(ticket) = picked else {
            println!("{}", "Not a ticket number.".dimmed());
            continue;
        };
        if !review_ticket(backend, &ticket.ticket_id).await {
            return;
        }
    }
}

/// Reviews one ticket. Returns `false` when input ended.
async fn review_ticket(backend: &HttpBackend, ticket_id: &str) -> bool {
    // Refetch, the listing may be stale by now.
    let ticket = match backend.get_ticket(ticket_id).await {
        Ok(ticket) => ticket,
        Err(err) => {
            println!(
                "{}",
                format!("Failed to fetch the ticket: {err}").bright_red()
            );
            return true;
        }
    };
    print_context(&ticket);

    let proposed = ticket
        .result
        .proposed_solution
        .clone()
        .unwrap_or_default();
    print!("Resolution (enter keeps the proposed solution): ");
    std::io::stdout().flush().unwrap();
    let Some(line) = read_line().await else {
        return false;
    };
    let resolution = match line.trim() {
        "" => proposed,
        edited => edited.to_owned(),
    };

    print!("Feedback note (optional): ");
    std::io::stdout().flush().unwrap();
    let Some(line) = read_line().await else {
        return false;
    };
    let feedback = match line.trim() {
        "" => "Approved by human".to_owned(),
        note => note.to_owned(),
    };

    let req = FeedbackRequest {
        ticket_id: ticket.ticket_id.clone(),
        ticket_text: ticket
            .result
            .ticket_text
            .clone()
            .unwrap_or_else(|| "Text unavailable".to_owned()),
        final_response: resolution,
        feedback,
    };
    match backend.submit_feedback(&req).await {
        Ok(ack) => println!("{}", ack.message.bright_green()),
        Err(err) => {
            println!(
                "{}",
                format!("Failed to submit the resolution: {err}")
                    .bright_red()
            );
        }
    }
    true
}

// First 8 characters, not bytes; ids come off the wire.
fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

fn print_context(ticket: &TicketSummary) {
    let bar = crate::BAR_CHAR.bright_cyan();
    println!();
    if let Some(text) = &ticket.result.ticket_text {
        println!("{bar}{}", text.bright_white());
    }
    let mut parts = Vec::new();
    if let Some(intent) = &ticket.result.intent {
        parts.push(format!("intent: {intent}"));
    }
    if let Some(confidence) = ticket.result.confidence {
        parts.push(format!("confidence: {:.0}%", confidence * 100.0));
    }
    parts.push(format!("status: {}", ticket.status));
    println!("{bar}{}", parts.join("  ").dimmed());
    if let Some(solution) = &ticket.result.proposed_solution {
        println!("{bar}{}", solution);
    }
}
