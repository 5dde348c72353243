use anyhow::{bail, Result};
use std::fmt::{self, Write as _};
use std::path::Path;
use std::sync::Arc;

use crate::backend::HttpBackend;
use crate::config::Config;
use crate::dispatcher::{RequestDispatcher, TurnStatus};
use crate::events::{MessageId, SourceDocument};
use crate::segment::{self, SegmentKind};
use crate::store::ConversationStore;

/// Ask a single question and print the answer
pub async fn ask(config: &Config, question: &str, show_sources: bool) -> Result<()> {
    let backend = HttpBackend::new(&config.backend);
    let (dispatcher, _outcomes) = RequestDispatcher::new(Arc::new(backend));
    let mut store = ConversationStore::new();

    match dispatcher.ask(&mut store, question).await {
        TurnStatus::Rejected => {
            println!("Nothing to ask: the question is empty.");
            Ok(())
        }
        TurnStatus::Answered(id) => {
            print!("{}", format_answer(&store, id, show_sources));
            Ok(())
        }
        TurnStatus::Failed => bail!("The backend did not answer (see the error above)"),
    }
}

/// Print the effective configuration, optionally saving it to `path`
pub fn show_config(config: &Config, path: &Path, write: bool) -> Result<()> {
    if write {
        config.save(path)?;
        println!("✅ Wrote {}", path.display());
    }
    println!("# {}", path.display());
    println!("# chat url: {}", config.backend.chat_url());
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Plain-text rendering of answer `id`: prose, numbered code blocks, then
/// the cited documents when requested.
pub fn format_answer(store: &ConversationStore, id: MessageId, show_sources: bool) -> String {
    let mut out = String::new();
    if let Some(message) = store.message(id) {
        // Writing into a String never fails.
        let _ = write_answer(&mut out, &message.text, store.source_docs(id), show_sources);
    }
    out
}

fn write_answer(
    out: &mut String,
    text: &str,
    docs: &[SourceDocument],
    show_sources: bool,
) -> fmt::Result {
    let mut code_index = 0;
    for segment in segment::segment(text) {
        match segment.kind {
            SegmentKind::Prose => writeln!(out, "{}\n", segment.content)?,
            SegmentKind::Code => {
                code_index += 1;
                writeln!(out, "--- code {} ---", code_index)?;
                writeln!(out, "{}\n", segment.content.trim_matches('\n'))?;
            }
        }
    }

    if show_sources {
        for doc in docs {
            writeln!(out, "📄 {}", doc.source_path)?;
            writeln!(out, "{}\n", segment::fence(&doc.content))?;
        }
    } else if !docs.is_empty() {
        writeln!(out, "({} source document(s); pass --sources to show them)", docs.len())?;
    }
    Ok(())
}
