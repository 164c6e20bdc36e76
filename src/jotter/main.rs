use clap::Parser;
use directories::ProjectDirs;
use jotter::api::JotterApi;
use jotter::error::{JotterError, Result};
use jotter::model::Note;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::args::{Cli, Commands};
use cli::render;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("JOTTER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data)?;
    tracing::debug!("using data directory {}", data_dir.display());
    let api = JotterApi::open_dir(&data_dir)?;

    match cli.command {
        Some(Commands::Create {
            title,
            content,
            parent,
        }) => handle_create(&api, &title, &content, parent.as_deref()),
        Some(Commands::List) | None => handle_list(&api),
        Some(Commands::View { id }) => handle_view(&api, id.as_deref()),
        Some(Commands::Edit { id, content }) => handle_edit(&api, &id, &content),
        Some(Commands::Rename { id, title }) => handle_rename(&api, &id, &title),
        Some(Commands::Mv { id, parent }) => handle_move(&api, &id, parent.as_deref()),
        Some(Commands::Order { id, index }) => handle_order(&api, &id, index),
        Some(Commands::Rm { id }) => handle_delete(&api, &id),
        Some(Commands::Path { id }) => handle_path(&api, id.as_deref()),
        Some(Commands::History { id }) => handle_history(&api, id.as_deref()),
        Some(Commands::Restore { id, version }) => handle_restore(&api, &id, version),
        Some(Commands::Select { id, none }) => handle_select(&api, id.as_deref(), none),
        Some(Commands::Status) => handle_status(&api),
        Some(Commands::Doctor) => handle_doctor(&api),
        Some(Commands::Write) => handle_write(&api),
    }
}

fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os("JOTTER_HOME") {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "jotter", "jotter")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| JotterError::Api("Could not determine a data directory".into()))
}

/// The note named by `selector`, or the selected note when there is none.
fn target_note(api: &JotterApi, selector: Option<&str>) -> Result<Note> {
    match selector {
        Some(s) => api.get_note(s),
        None => api
            .selected_note()
            .ok_or_else(|| JotterError::Api("No note selected".into())),
    }
}

fn handle_create(api: &JotterApi, title: &str, content: &str, parent: Option<&str>) -> Result<()> {
    let id = api.create_note(title, content, parent)?;
    render::success(&format!("Created note {}", id.short()));
    Ok(())
}

fn handle_list(api: &JotterApi) -> Result<()> {
    let selected = api.status().selected.and_then(|path| path.last().map(|s| s.id.clone()));
    render::print_tree(&api.tree(), selected.as_ref());
    Ok(())
}

fn handle_view(api: &JotterApi, selector: Option<&str>) -> Result<()> {
    let note = target_note(api, selector)?;
    let path = api.note_path(note.id().as_str())?;
    render::print_note(&note, &path);
    Ok(())
}

fn handle_edit(api: &JotterApi, selector: &str, content: &str) -> Result<()> {
    let version = api.update_note(selector, content)?;
    render::success(&format!("Saved version {}", version));
    Ok(())
}

fn handle_rename(api: &JotterApi, selector: &str, title: &str) -> Result<()> {
    api.rename_note(selector, title)?;
    let note = api.get_note(selector)?;
    render::success(&format!("Renamed to \"{}\"", note.title()));
    Ok(())
}

fn handle_move(api: &JotterApi, selector: &str, parent: Option<&str>) -> Result<()> {
    api.move_note(selector, parent)?;
    let path = api.note_path(selector)?;
    render::print_path(&path);
    Ok(())
}

fn handle_order(api: &JotterApi, selector: &str, index: usize) -> Result<()> {
    api.reorder_note(selector, index)?;
    render::success("Reordered");
    Ok(())
}

fn handle_delete(api: &JotterApi, selector: &str) -> Result<()> {
    let (id, moved) = api.delete_note(selector)?;
    render::success(&format!("Deleted note {}", id.short()));
    if !moved.is_empty() {
        render::info(&format!("{} child note(s) moved up", moved.len()));
    }
    Ok(())
}

fn handle_path(api: &JotterApi, selector: Option<&str>) -> Result<()> {
    let note = target_note(api, selector)?;
    render::print_path(&api.note_path(note.id().as_str())?);
    Ok(())
}

fn handle_history(api: &JotterApi, selector: Option<&str>) -> Result<()> {
    let note = target_note(api, selector)?;
    render::print_history(note.versions());
    Ok(())
}

fn handle_restore(api: &JotterApi, selector: &str, version: u64) -> Result<()> {
    let new_version = api.restore_version(selector, version)?;
    render::success(&format!(
        "Restored version {} as version {}",
        version, new_version
    ));
    Ok(())
}

fn handle_select(api: &JotterApi, selector: Option<&str>, none: bool) -> Result<()> {
    if none {
        api.select_note(None)?;
        render::info("Selection cleared");
        return Ok(());
    }
    match api.select_note(selector)? {
        Some(id) => render::print_path(&api.note_path(id.as_str())?),
        None => render::info("Nothing selected"),
    }
    Ok(())
}

fn handle_status(api: &JotterApi) -> Result<()> {
    render::print_status(&api.status());
    Ok(())
}

fn handle_doctor(api: &JotterApi) -> Result<()> {
    render::print_doctor(&api.doctor()?);
    Ok(())
}

/// Each line read grows the buffer and is reported to autosave, the way an
/// editor reports keystrokes. EOF flushes whatever is still pending.
fn handle_write(api: &JotterApi) -> Result<()> {
    if api.selected_note().is_none() {
        return Err(JotterError::Api(
            "No note selected (use `jotter select <id>`)".into(),
        ));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let stats = runtime.block_on(async {
        let autosave = api.autosave();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut buffer = String::new();

        while let Some(line) = lines.next_line().await? {
            if !buffer.is_empty() {
                buffer.push('\n');
            }
            buffer.push_str(&line);
            autosave.change(buffer.clone())?;
        }

        autosave.flush().await?;
        Ok::<_, JotterError>(autosave.close().await)
    })?;

    if stats.commits == 0 {
        render::info("Nothing new to save");
    } else {
        render::success(&format!("Saved {} version(s)", stats.commits));
    }
    if stats.failed > 0 {
        return Err(JotterError::Api(format!(
            "{} autosave(s) could not be written",
            stats.failed
        )));
    }
    Ok(())
}
