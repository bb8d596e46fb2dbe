//! Question answering over the stored documents, with a generative fallback.
//!
//! A [`ChatSession`] owns the message log for one conversation and borrows
//! the embedding provider, vector store, and text generator. Each turn:
//!
//! 1. the question is appended to the log;
//! 2. the store is searched and the best hit is gated by the threshold;
//! 3. a confident hit is returned verbatim, otherwise the generator answers;
//! 4. the rendered answer is appended to the log.
//!
//! A failing generator does not end the session: its error becomes the
//! assistant's reply.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::config::Config;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::llm::{create_generator, TextGenerator};
use crate::models::{Answer, ChatMessage, Role};
use crate::retrieval;
use crate::store::{open_store, VectorStore};

pub struct ChatSession<'a> {
    provider: &'a dyn EmbeddingProvider,
    store: &'a dyn VectorStore,
    generator: &'a dyn TextGenerator,
    threshold: f64,
    top_k: usize,
    messages: Vec<ChatMessage>,
}

impl<'a> ChatSession<'a> {
    pub fn new(
        provider: &'a dyn EmbeddingProvider,
        store: &'a dyn VectorStore,
        generator: &'a dyn TextGenerator,
        threshold: f64,
        top_k: usize,
    ) -> Self {
        Self {
            provider,
            store,
            generator,
            threshold,
            top_k: top_k.max(1),
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Answer one question. Never fails: retrieval and generation errors
    /// are folded into the answer.
    pub async fn ask(&mut self, question: &str) -> Answer {
        self.messages.push(ChatMessage {
            role: Role::User,
            content: question.to_string(),
        });

        let hit = match retrieval::search(self.provider, self.store, question, self.top_k).await {
            Ok(hits) => retrieval::gate(hits, self.threshold),
            Err(e) => {
                warn!(error = %e, "retrieval failed, falling back to generator");
                None
            }
        };

        let answer = match hit {
            Some(hit) => {
                info!(filename = %hit.filename, score = hit.score, "answering from document");
                Answer::FromDocument(hit)
            }
            None => {
                let text = match self.generator.generate(question).await {
                    Ok(text) => text,
                    Err(e) => format!("Error generating response: {}", e),
                };
                Answer::FromModel {
                    model: self.generator.model_name().to_string(),
                    text,
                }
            }
        };

        self.messages.push(ChatMessage {
            role: Role::Assistant,
            content: answer.render(),
        });
        answer
    }

    /// Drive a line-oriented conversation until `/quit` or end of input.
    ///
    /// `/history` prints the log and `/clear` empties it. Blank lines are
    /// ignored. The `> ` prompt is written only when `interactive` is set.
    pub async fn run_repl<R, W>(&mut self, input: R, out: &mut W, interactive: bool) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        loop {
            if interactive {
                write!(out, "> ")?;
                out.flush()?;
            }
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            match line {
                "" => continue,
                "/quit" | "/exit" => break,
                "/clear" => {
                    self.clear();
                    writeln!(out, "History cleared.")?;
                }
                "/history" => {
                    if self.messages.is_empty() {
                        writeln!(out, "No messages yet.")?;
                    }
                    for msg in &self.messages {
                        writeln!(out, "[{}] {}", msg.role, msg.content)?;
                    }
                }
                question => {
                    let answer = self.ask(question).await;
                    writeln!(out, "{}\n", answer.render())?;
                }
            }
        }
        Ok(())
    }
}

/// `askdoc ask`: answer a single question and print it.
pub async fn run_ask(config: &Config, question: &str, threshold: Option<f64>) -> Result<()> {
    let provider = create_provider(&config.embedding)?;
    let store = open_store(config).await?;
    let generator = create_generator(&config.llm)?;

    let mut session = ChatSession::new(
        provider.as_ref(),
        store.as_ref(),
        generator.as_ref(),
        threshold.unwrap_or(config.retrieval.threshold),
        config.retrieval.top_k,
    );
    let answer = session.ask(question).await;
    println!("{}", answer.render());
    Ok(())
}

/// `askdoc chat`: interactive session on stdin/stdout.
pub async fn run_chat(config: &Config, threshold: Option<f64>) -> Result<()> {
    let provider = create_provider(&config.embedding)?;
    let store = open_store(config).await?;
    let generator = create_generator(&config.llm)?;

    let interactive = atty::is(atty::Stream::Stdin);
    if interactive {
        println!(
            "Ask about your documents ({} store, {}). /history, /clear, /quit.",
            store.name(),
            generator.model_name()
        );
    }

    let mut session = ChatSession::new(
        provider.as_ref(),
        store.as_ref(),
        generator.as_ref(),
        threshold.unwrap_or(config.retrieval.threshold),
        config.retrieval.top_k,
    );
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    session.run_repl(stdin, &mut stdout, interactive).await
}
