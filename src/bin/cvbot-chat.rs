//! Interactive terminal chat against a cvbot server.
//!
//! # Usage
//!
//! ```bash
//! # Open an existing conversation
//! cvbot-chat --conversation 12
//!
//! # Start a new conversation about a candidate
//! cvbot-chat --candidate jdoe --model anthropic/claude-3.5-haiku
//!
//! # Point at another server (CVBOT_URL works too)
//! cvbot-chat --base-url http://cvbot.example.com/ --conversation 3
//! ```
//!
//! # Commands
//!
//! - `/help` - Show available commands
//! - `/edit <id> <text>` - Revise an earlier message
//! - `/threads [query]` - List conversations
//! - `/quit` - Exit the application

use arrrg::CommandLine;
use futures::StreamExt;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use cvbot_chat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSessionController, ChatView, SendOutcome,
    TerminalView, help_text, parse_command,
};
use cvbot_chat::usage::format_usd;
use cvbot_chat::{
    ChatEvent, ConversationRef, CvBot, JobFitRequest, UsageDisplay, cumulative_daily_totals,
    filter_conversations, split_sections,
};

type Session = ChatSessionController<CvBot, TerminalView<std::io::Stdout>>;

/// Main entry point for the cvbot-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("cvbot-chat [OPTIONS]");
    let explicit_base_url = args.base_url.is_some();
    let mut config = ChatConfig::from(args);
    if !explicit_base_url && let Ok(url) = std::env::var("CVBOT_URL") {
        config = config.with_base_url(url);
    }

    let client = CvBot::with_options(Some(config.base_url.clone()), Some(config.timeout))?;

    let mut conversation = config.conversation;
    if conversation.id().is_none()
        && let Some(candidate) = config.candidate.as_deref()
    {
        let created = client.create_conversation(candidate).await?;
        conversation = ConversationRef::bound(created.id);
    }

    let mut session = open_session(&client, &config, conversation).await;
    let mut rl = DefaultEditor::new()?;

    println!("cvbot chat (model: {})", session.model());
    match conversation.id() {
        Some(id) => println!("Conversation #{id}"),
        None => println!("No conversation open; use /new <candidate> or --conversation"),
    }
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Edit { message_id, text } => {
                            if !session.start_inline_edit(message_id) {
                                let message = format!("Message #{message_id} cannot be edited");
                                session.view_mut().print_error(&message);
                                continue;
                            }
                            session.update_edit_draft(&text);
                            let outcome = session.commit_inline_edit().await;
                            report(&mut session, outcome);
                        }
                        ChatCommand::Model(model) => {
                            session.set_model(model.clone());
                            config = config.with_model(model.clone());
                            session
                                .view_mut()
                                .print_info(&format!("Model changed to: {model}"));
                        }
                        ChatCommand::Usage => {
                            if let Err(err) = session.refresh_usage().await {
                                session.view_mut().print_error(err.message());
                            }
                        }
                        ChatCommand::New(candidate) => {
                            match client.create_conversation(&candidate).await {
                                Ok(created) => {
                                    conversation = ConversationRef::bound(created.id);
                                    session = open_session(&client, &config, conversation).await;
                                    session.view_mut().print_info(&format!(
                                        "Started conversation #{} about {}",
                                        created.id, created.candidate_id
                                    ));
                                }
                                Err(err) => session.view_mut().print_error(err.message()),
                            }
                        }
                        ChatCommand::Delete => {
                            let Some(id) = conversation.id() else {
                                session.view_mut().print_error("No conversation is open");
                                continue;
                            };
                            match client.delete_conversation(id).await {
                                Ok(()) => {
                                    conversation = ConversationRef::unbound();
                                    session = open_session(&client, &config, conversation).await;
                                    session
                                        .view_mut()
                                        .print_info(&format!("Deleted conversation #{id}"));
                                }
                                Err(err) => session.view_mut().print_error(err.message()),
                            }
                        }
                        ChatCommand::Threads(query) => match client.list_conversations().await {
                            Ok(threads) => {
                                let matches =
                                    filter_conversations(&threads, query.as_deref().unwrap_or(""));
                                if matches.is_empty() {
                                    println!("    (no conversations)");
                                }
                                for thread in matches {
                                    println!(
                                        "    #{:<5} {} ({})",
                                        thread.id,
                                        thread.title.as_deref().unwrap_or("(untitled)"),
                                        thread
                                            .candidate_name
                                            .as_deref()
                                            .unwrap_or(&thread.candidate_id)
                                    );
                                }
                            }
                            Err(err) => session.view_mut().print_error(err.message()),
                        },
                        ChatCommand::Costs => print_costs(&client, &mut session).await,
                        ChatCommand::Fit {
                            candidate_id,
                            job_description,
                        } => {
                            let request = JobFitRequest::new(candidate_id, job_description)
                                .with_model(session.model().to_string());
                            run_job_fit(&client, &request, &mut session).await;
                        }
                        ChatCommand::Invalid(message) => {
                            session.view_mut().print_error(&message);
                        }
                    }
                    continue;
                }

                if session.conversation().id().is_none() {
                    session
                        .view_mut()
                        .print_error("No conversation is open; use /new <candidate>");
                    continue;
                }
                session.set_composer_text(line);
                let outcome = session.send_message(None).await;
                report(&mut session, outcome);
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Input error: {}", err);
                break;
            }
        }
    }

    Ok(())
}

async fn open_session(
    client: &CvBot,
    config: &ChatConfig,
    conversation: ConversationRef,
) -> Session {
    let view = TerminalView::stdout(config.use_color);
    let mut session = ChatSessionController::new(conversation, client.clone(), view)
        .with_model(config.model.clone());
    session.initialize().await;
    session
}

fn report(session: &mut Session, outcome: SendOutcome) {
    // Edit failures are already surfaced by the view; new-send failures show inline.
    if let SendOutcome::Failed(err) = outcome
        && err.is_rate_limit()
    {
        session
            .view_mut()
            .print_info("The daily cost limit has been reached; try again tomorrow.");
    }
}

async fn print_costs(client: &CvBot, session: &mut Session) {
    let daily = match client.daily_costs().await {
        Ok(daily) => daily,
        Err(err) => return session.view_mut().print_error(err.message()),
    };
    println!("    Daily spend:");
    for point in cumulative_daily_totals(&daily) {
        println!(
            "      {}  {:>9}  (cumulative {})",
            point.date,
            format_usd(point.day_total),
            format_usd(point.cumulative)
        );
    }
    match client.monthly_costs().await {
        Ok(monthly) => {
            println!("    Monthly spend:");
            for row in monthly {
                println!(
                    "      {}  {:<32} {:>9}  {} calls",
                    row.month,
                    row.model,
                    format_usd(row.total),
                    row.calls
                );
            }
        }
        Err(err) => session.view_mut().print_error(err.message()),
    }
}

async fn run_job_fit(client: &CvBot, request: &JobFitRequest, session: &mut Session) {
    let stream = match client.stream_job_fit(request).await {
        Ok(stream) => stream,
        Err(err) => return session.view_mut().print_error(err.message()),
    };
    let mut stream = Box::pin(stream);
    let mut report = String::new();
    while let Some(event) = stream.next().await {
        match event {
            Ok(ChatEvent::Token { content }) => {
                session.view_mut().print_fragment(&content);
                report.push_str(&content);
            }
            Ok(ChatEvent::Usage(snapshot)) => {
                session.view_mut().show_usage(&UsageDisplay::new(snapshot))
            }
            Ok(_) => {}
            Err(err) => {
                session.view_mut().print_info("");
                return session.view_mut().print_error(err.message());
            }
        }
    }
    session.view_mut().print_info("");
    let sections = split_sections(&report);
    if let Some(verdict) = sections.find(&["verdict"]) {
        session
            .view_mut()
            .print_info(&format!("Verdict: {}", verdict.body.trim()));
    }
}
