use anyhow::Context;
use colored::Colorize;
use serde::Serialize;

use quill_store::{
    CacheStore, CredentialStore, Database, LegacyTokenMigration, SettingsStore, StoreConfig,
};
use quill_types::{Credential, CredentialKind, Note};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let db = open_store(&cli)?;
    run_on(&db, cli)
}

/// Run one command against an open store, then close the store file.
fn run_on(db: &Database, cli: Cli) -> anyhow::Result<()> {
    let json = matches!(cli.format, OutputFormat::Json);
    let result = match cli.command {
        Command::Info => cmd_info(db, json),
        Command::Settings => cmd_settings(db, json),
        Command::Credential(args) => cmd_credential(db, args.action, json),
        Command::Cache(args) => cmd_cache(db, args.kind, json),
    };
    db.close();
    result
}

fn open_store(cli: &Cli) -> anyhow::Result<Database> {
    let mut config = StoreConfig::load(&cli.config_dir)
        .with_context(|| format!("reading config in {}", cli.config_dir.display()))?;
    if let Some(ms) = cli.idle_timeout_ms {
        config.idle_timeout_ms = ms;
    }
    Database::open_with(&cli.config_dir, config, &LegacyTokenMigration)
        .with_context(|| format!("opening store in {}", cli.config_dir.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct Info {
    path: String,
    schema_version: u64,
    credentials: usize,
    cached_notebooks: usize,
    search_results: usize,
    has_recovery_note: bool,
}

fn cmd_info(db: &Database, json: bool) -> anyhow::Result<()> {
    let info = Info {
        path: db.path().display().to_string(),
        schema_version: db.schema_version()?,
        credentials: db.all()?.len(),
        cached_notebooks: db.notebook_cache()?.notebooks.len(),
        search_results: db.search()?.len(),
        has_recovery_note: !db.recovery_note()?.is_empty(),
    };
    if json {
        return print_json(&info);
    }
    println!("Store: {}", info.path.bold());
    println!("  Schema version: {}", info.schema_version.to_string().cyan());
    println!("  Credentials: {}", info.credentials);
    println!("  Cached notebooks: {}", info.cached_notebooks);
    println!("  Last search: {} notes", info.search_results);
    if info.has_recovery_note {
        println!("  {} unsaved note available for recovery", "!".yellow().bold());
    }
    Ok(())
}

fn cmd_settings(db: &Database, json: bool) -> anyhow::Result<()> {
    let settings = db.settings()?;
    if json {
        return print_json(&settings);
    }
    let unset = || "(not set)".dimmed().to_string();
    println!("default_notebook = {}", settings.default_notebook.unwrap_or_else(unset));
    println!("editor = {}", settings.editor.unwrap_or_else(unset));
    println!(
        "active_credential = {}",
        settings.active_credential.map(|i| i.to_string()).unwrap_or_else(unset)
    );
    Ok(())
}

#[derive(Serialize)]
struct CredentialView {
    index: usize,
    name: String,
    kind: CredentialKind,
    secret: String,
}

impl CredentialView {
    fn new(index: usize, credential: &Credential) -> Self {
        Self {
            index,
            name: credential.name.clone(),
            kind: credential.kind,
            secret: credential.masked_secret(),
        }
    }

    fn print(&self) {
        println!(
            "  [{}] {} ({}) {}",
            self.index.to_string().yellow(),
            self.name.bold(),
            self.kind.to_string().cyan(),
            self.secret.dimmed()
        );
    }
}

fn cmd_credential(db: &Database, action: CredentialAction, json: bool) -> anyhow::Result<()> {
    match action {
        CredentialAction::List => {
            let views: Vec<_> = db
                .all()?
                .iter()
                .enumerate()
                .map(|(i, c)| CredentialView::new(i, c))
                .collect();
            if json {
                return print_json(&views);
            }
            if views.is_empty() {
                println!("No credentials stored.");
            }
            for view in &views {
                view.print();
            }
        }
        CredentialAction::Show { index } => {
            let view = CredentialView::new(index, &db.by_index(index)?);
            if json {
                return print_json(&view);
            }
            view.print();
        }
        CredentialAction::Add { name, secret, kind } => {
            let credential = Credential::new(name, secret, kind)?;
            db.add(&credential)?;
            println!("{} Added credential {}", "✓".green().bold(), credential.name.bold());
        }
        CredentialAction::Remove { index } => {
            let credential = db.by_index(index)?;
            db.remove(&credential)?;
            println!("{} Removed credential {}", "✓".green().bold(), credential.name.bold());
        }
    }
    Ok(())
}

fn print_note(note: &Note) {
    let notebook = note.notebook.as_ref().map(|nb| nb.name.as_str()).unwrap_or("-");
    println!("  {} [{}]", note.title.bold(), notebook.cyan());
}

fn cmd_cache(db: &Database, kind: CacheKind, json: bool) -> anyhow::Result<()> {
    match kind {
        CacheKind::Notebooks => {
            let list = db.notebook_cache()?;
            if json {
                return print_json(&list);
            }
            match list.timestamp {
                Some(ts) => println!("Fetched {}", ts.to_rfc3339().dimmed()),
                None => println!("Notebook list never fetched."),
            }
            for nb in &list.notebooks {
                match &nb.stack {
                    Some(stack) => println!("  {} / {}", stack.dimmed(), nb.name.bold()),
                    None => println!("  {}", nb.name.bold()),
                }
            }
        }
        CacheKind::Search => {
            let notes = db.search()?;
            if json {
                return print_json(&notes);
            }
            if notes.is_empty() {
                println!("No saved search.");
            }
            for note in &notes {
                print_note(note);
            }
        }
        CacheKind::Recovery => {
            let note = db.recovery_note()?;
            if json {
                return print_json(&note);
            }
            if note.is_empty() {
                println!("No note to recover.");
            } else {
                print_note(&note);
                println!("{}", note.body);
            }
        }
    }
    Ok(())
}
