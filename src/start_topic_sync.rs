//! Startup helpers for the `topics` command-line client.
//!
//! Reads its backend settings from `TOPIC_SYNC_*` and the bearer token from
//! `TOPIC_SYNC_TOKEN`, runs one store action and prints the result.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, bail};

use crate::config::ClientConfig;
use crate::model::{Topic, TopicId};
use crate::remote::{HttpTopicGateway, StaticSession, TopicChanges, TopicGateway};
use crate::store::TopicStore;
use crate::telemetry;

/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "TOPIC_SYNC_TOKEN";

const USAGE: &str = "usage: topics <command>
  list [limit] [offset]
  create <name> [description] [--graph]
  show <id>
  rename <id> <name>
  delete <id>";

/// One invocation of the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// List one page of topics.
    List {
        /// Page size; the configured default when absent.
        limit: Option<u32>,
        /// Records to skip.
        offset: u32,
    },
    /// Create a topic.
    Create {
        /// Topic name.
        name: String,
        /// Optional description.
        description: Option<String>,
        /// Knowledge-graph mode.
        graph: bool,
    },
    /// Fetch one topic.
    Show(TopicId),
    /// Rename a topic.
    Rename(TopicId, String),
    /// Delete a topic.
    Delete(TopicId),
}

impl Command {
    /// Parse the arguments following the program name.
    ///
    /// # Errors
    /// Returns an error describing the first unusable argument.
    pub fn parse<I, A>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let Some((command, rest)) = args.split_first() else {
            bail!("missing command");
        };

        match command.as_str() {
            "list" => {
                let limit = rest
                    .first()
                    .map(|raw| raw.parse::<u32>().context("limit must be a number"))
                    .transpose()?;
                let offset = rest
                    .get(1)
                    .map(|raw| raw.parse::<u32>().context("offset must be a number"))
                    .transpose()?
                    .unwrap_or(0);
                Ok(Self::List { limit, offset })
            }
            "create" => {
                let graph = rest.iter().any(|a| a == "--graph");
                let mut positional = rest.iter().filter(|a| *a != "--graph");
                let name = positional.next().context("create needs a name")?.clone();
                let description = positional.next().cloned();
                Ok(Self::Create {
                    name,
                    description,
                    graph,
                })
            }
            "show" => Ok(Self::Show(topic_id(rest.first())?)),
            "rename" => {
                let id = topic_id(rest.first())?;
                let name = rest.get(1).context("rename needs a new name")?.clone();
                Ok(Self::Rename(id, name))
            }
            "delete" => Ok(Self::Delete(topic_id(rest.first())?)),
            other => bail!("unknown command `{other}`"),
        }
    }
}

fn topic_id(raw: Option<&String>) -> anyhow::Result<TopicId> {
    let raw = raw.context("missing topic id")?;
    TopicId::new(raw.as_str()).with_context(|| format!("invalid topic id `{raw}`"))
}

/// Run the client with the process arguments.
///
/// # Returns
/// `ExitCode::SUCCESS` when the action succeeded, `1` on failure, `2` on bad usage.
#[must_use]
pub fn run() -> ExitCode {
    let _ = telemetry::init_tracing_with("warn");

    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            let _ = writeln!(io::stderr(), "{e}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    match rt.block_on(execute(command, ClientConfig::from_env())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            let _ = writeln!(io::stderr(), "error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Build the store for `config` and run `command` against it.
///
/// # Errors
/// Returns an error if the configuration is invalid or the action fails.
pub async fn execute(command: Command, config: ClientConfig) -> anyhow::Result<()> {
    let session = std::env::var(TOKEN_ENV)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .map_or_else(StaticSession::anonymous, StaticSession::new);
    let gateway =
        HttpTopicGateway::new(&config, session).context("cannot configure the backend client")?;
    tracing::debug!("Backend: {}", gateway.collection_url());

    let store = TopicStore::new(gateway).with_page_size(config.default_page_size);
    let _trace = store.subscribe(|state| {
        tracing::trace!(
            topics = state.topics.len(),
            in_flight = state.in_flight.len(),
            "store updated"
        );
    });

    match command {
        Command::List { limit, offset } => {
            let limit = limit.unwrap_or(config.default_page_size);
            let page = store.load_topics_page(limit, offset).await?;
            let mut out = io::stdout().lock();
            for topic in &page.topics {
                writeln!(out, "{}", summary(topic))?;
            }
            if page.has_more {
                writeln!(out, "(more: offset {})", offset.saturating_add(limit))?;
            }
        }
        Command::Create {
            name,
            description,
            graph,
        } => {
            let topic = store
                .create_topic(&name, description.as_deref(), graph)
                .await?;
            writeln!(io::stdout().lock(), "{}", summary(&topic))?;
        }
        Command::Show(id) => {
            let topic = store.gateway().get_topic(&id).await?;
            write_details(&mut io::stdout().lock(), &topic)?;
        }
        Command::Rename(id, name) => {
            let topic = store
                .edit_topic(&id, &TopicChanges::new().with_name(name))
                .await?;
            writeln!(io::stdout().lock(), "{}", summary(&topic))?;
        }
        Command::Delete(id) => {
            store.delete_topic(&id).await?;
            writeln!(io::stdout().lock(), "deleted {id}")?;
        }
    }
    Ok(())
}

fn summary(topic: &Topic) -> String {
    let graph = if topic.uses_knowledge_graph { " [graph]" } else { "" };
    format!("{}\t{}{graph}", topic.id, topic.title)
}

fn write_details(out: &mut impl Write, topic: &Topic) -> io::Result<()> {
    writeln!(out, "id:          {}", topic.id)?;
    writeln!(out, "title:       {}", topic.title)?;
    if let Some(description) = &topic.description {
        writeln!(out, "description: {description}")?;
    }
    writeln!(out, "graph:       {}", topic.uses_knowledge_graph)?;
    writeln!(out, "created:     {}", topic.created_at.to_rfc3339())?;
    writeln!(out, "updated:     {}", topic.updated_at.to_rfc3339())
}
