use std::{fs::File, io::stdout, path::PathBuf};

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use crossterm::{
    event::EnableMouseCapture,
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
};
use log::{error, info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use pagemark::consent::ConsentJar;
use pagemark::editor::Editor;
use pagemark::event_source::KeyboardEventSource;
use pagemark::identity::{LocalIdentityProvider, SignInMethod};
use pagemark::panic_handler::{initialize_panic_handler, restore_terminal};
use pagemark::profile_store::ProfileStore;
use pagemark::routes::Route;
use pagemark::session::Session;
use pagemark::settings;
use pagemark::theme::{ThemeId, set_theme};
use pagemark::{App, run_app_with_event_source};

/// Terminal document viewer with highlights, comments and inline text edits
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Document to open in the editor
    file: Option<PathBuf>,

    /// Screen to start on, e.g. /login or /editor
    #[arg(long, default_value = "/")]
    route: String,

    /// Directory holding profiles and cookies
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Settings file to use instead of the platform default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sign a returning user in with a configured account: google, github
    #[arg(long, value_name = "PROVIDER")]
    user: Option<String>,

    #[arg(long, default_value = "pagemark.log")]
    log_file: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    WriteLogger::init(args.log_level, Config::default(), File::create(&args.log_file)?)?;
    initialize_panic_handler();

    info!("Starting pagemark");

    settings::load_settings(args.config.as_deref());
    if let Some(dir) = args.data_dir.clone() {
        settings::set_data_dir(dir);
    }
    match ThemeId::parse(&settings::theme_name()) {
        Some(theme) => set_theme(theme),
        None => info!("Unknown theme {:?}, keeping the default", settings::theme_name()),
    }

    let data_dir = settings::data_dir();
    let mut consent = ConsentJar::load_or_ephemeral(&data_dir);
    if let Err(e) = consent.ensure_essential(Utc::now()) {
        error!("Failed to store cookie consent: {e:#}");
    }
    let store = ProfileStore::open_or_ephemeral(&data_dir);
    let mut session = Session::new(
        Box::new(LocalIdentityProvider::from_settings()),
        store,
        consent,
    );

    let mut editor = Editor::from_settings();
    if let Some(provider) = args.user.as_deref() {
        let method = match provider.to_ascii_lowercase().as_str() {
            "google" => Some(SignInMethod::Google),
            "github" => Some(SignInMethod::Github),
            other => {
                warn!("--user expects google or github, got {other}");
                None
            }
        };
        if let Some(method) = method {
            let agreed = session.consent().terms_accepted(Utc::now());
            if let Err(e) = session.sign_in(method, agreed, editor.notices_mut()) {
                warn!("Startup sign-in failed: {e}");
            }
        }
    }
    let mut requested = Route::parse(&args.route);
    if let Some(file) = &args.file {
        if editor.open_file(file).is_ok() && requested == Route::Landing {
            requested = Route::Editor;
        }
    }

    let download_dir = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));
    let mut app = App::new(session, editor, requested, download_dir);

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app_with_event_source(&mut terminal, &mut app, &mut KeyboardEventSource);

    restore_terminal();

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down pagemark");
    Ok(())
}
