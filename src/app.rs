use std::io::{self, IsTerminal, Read};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::config;
use crate::snippet::{self, Snippet};
use crate::storage;
use crate::ui;

/// Entry point behind the binary's flag handling. With no arguments
/// (and an interactive stdin) this starts the full-screen view;
/// otherwise it runs one of the scriptable paths: `list`, printing a
/// snippet matched by fuzzy name, or saving piped stdin as a new
/// snippet.
pub fn run(args: &[String]) -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;

    let store = storage::Store::open(storage::Options {
        home: cfg.snippets.home.clone(),
        file: Some(cfg.snippets.file.clone()),
    })
    .context("open snippet store")?;

    let mut snippets = store.load(&cfg.snippets.default_language)?;
    if store.migrate_legacy(&mut snippets) {
        store.save(&snippets)?;
    }

    if args.first().map(String::as_str) == Some("list") {
        return list_snippets(&snippets);
    }

    if !io::stdin().is_terminal() {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("read stdin")?;
        // Empty piped input (e.g. stdin redirected from /dev/null)
        // falls through to the lookup path.
        if !content.is_empty() {
            return save_stdin(
                &store,
                &mut snippets,
                content,
                args,
                &cfg.snippets.default_language,
            );
        }
    }

    if let Some(query) = args.first() {
        return print_snippet(&store, &snippets, query);
    }

    run_interactive(cfg, store, snippets)
}

fn run_interactive(
    cfg: config::Config,
    store: storage::Store,
    snippets: Vec<Snippet>,
) -> Result<()> {
    let session = storage::read_state();
    let mut model = ui::Model::new(ui::Options {
        snippets,
        theme: ui::Theme::from_config(&cfg.ui),
        default_language: cfg.snippets.default_language.clone(),
        store: store.clone(),
        initial_folder: session.current_folder,
        status_message: format!("snipbox {}", crate::VERSION),
    });

    model.run()?;

    store.save(&model.snapshot())?;
    // Session state is a convenience; failing to write it is not worth
    // surfacing after a clean exit.
    let _ = model.session_state().save();
    Ok(())
}

/// `snipbox list` prints one `folder/name.language` label per line.
fn list_snippets(snippets: &[Snippet]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    for snippet in snippets {
        use io::Write;
        writeln!(stdout, "{}", snippet.label())?;
    }
    Ok(())
}

/// `snipbox <name>` prints the best fuzzy match's contents to stdout,
/// for piping into other tools.
fn print_snippet(store: &storage::Store, snippets: &[Snippet], query: &str) -> Result<()> {
    let matcher = SkimMatcherV2::default();
    let best = snippets
        .iter()
        .filter_map(|snippet| {
            matcher
                .fuzzy_match(&snippet.label(), query)
                .map(|score| (score, snippet))
        })
        .max_by_key(|(score, _)| *score);

    let Some((_, snippet)) = best else {
        bail!("no snippet matching {query:?}");
    };

    let path = store.snippet_path(snippet);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("read {}", path.display()))?;
    print!("{content}");
    Ok(())
}

/// `<cmd> | snipbox [folder/name.language]` stores stdin as a new
/// snippet. The optional argument names it; missing parts fall back to
/// the defaults.
fn save_stdin(
    store: &storage::Store,
    snippets: &mut Vec<Snippet>,
    content: String,
    args: &[String],
    default_language: &str,
) -> Result<()> {
    let raw_name = args.first().map(String::as_str).unwrap_or_default();
    let (folder, name, language) = snippet::parse_name(raw_name, default_language);

    let snippet = Snippet {
        tags: Vec::new(),
        folder,
        date: Utc::now(),
        favorite: false,
        file: format!("{name}.{language}"),
        name,
        language,
    };

    let path = store.snippet_path(&snippet);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    std::fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;

    println!("Saved {}", snippet.label());
    snippets.push(snippet);
    store.save(snippets)?;
    Ok(())
}
