use clap::{Parser, Subcommand};
use hydro_core::*;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "hydro")]
#[command(about = "Daily water and calorie tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Load configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use the fallback temperature and the local food table instead of HTTP lookups
    #[arg(long, global = true)]
    offline: bool,

    /// Keep all state in memory only
    #[arg(long, global = true)]
    no_persist: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat interactively as one user (default)
    Chat {
        /// User identifier
        #[arg(long, default_value = "local")]
        user: String,
    },

    /// Replay a file of `<user-id> <text>` lines, one thread per user
    Replay {
        /// Input file
        file: PathBuf,
    },
}

/// Where the store snapshot lives, if persistence is on
struct Persistence {
    path: Option<PathBuf>,
}

impl Persistence {
    fn load(&self, lookups: Lookups) -> Result<SessionStore> {
        match &self.path {
            Some(path) => Ok(SessionStore::restore(lookups, StoreSnapshot::load(path)?)),
            None => Ok(SessionStore::new(lookups)),
        }
    }

    /// Merge the given users' sessions into the state file
    fn save(&self, store: &SessionStore, users: &[UserId]) -> Result<()> {
        match &self.path {
            Some(path) => {
                let mut snapshot = store.snapshot();
                snapshot.users.retain(|user, _| users.contains(user));
                snapshot.merge_into(path)
            }
            None => Ok(()),
        }
    }
}

fn main() -> Result<()> {
    // Pick up OPENWEATHERMAP_API_KEY and friends from .env
    let _ = dotenvy::dotenv();

    // Initialize logging
    hydro_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    let lookups = if cli.offline {
        Lookups::offline(&config.weather, &config.food)
    } else {
        Lookups::http(&config.weather, &config.food)?
    };

    let persistence = Persistence {
        path: (config.persistence.enabled && !cli.no_persist)
            .then(|| data_dir.join("state.json")),
    };
    let store = persistence.load(lookups)?;

    match cli.command {
        Some(Commands::Replay { file }) => cmd_replay(&store, &persistence, &file),
        Some(Commands::Chat { user }) => cmd_chat(&store, &persistence, UserId::new(user)),
        None => cmd_chat(&store, &persistence, UserId::new("local")),
    }
}

fn cmd_chat(store: &SessionStore, persistence: &Persistence, user: UserId) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if matches!(line.trim(), "quit" | "exit" | "/quit" | "/exit") {
            break;
        }

        let reply = store.handle(&user, &line);
        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;

        if Command::parse(&line).is_mutating() {
            persistence.save(store, std::slice::from_ref(&user))?;
        }
    }

    Ok(())
}

fn cmd_replay(store: &SessionStore, persistence: &Persistence, file: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(file)?;

    // Group lines per user, keeping first-appearance order
    let mut order: Vec<UserId> = Vec::new();
    let mut scripts: HashMap<UserId, Vec<String>> = HashMap::new();
    for (line_num, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((user, text)) = line.split_once(char::is_whitespace) else {
            tracing::warn!("Skipping line {}: expected `<user-id> <text>`", line_num + 1);
            continue;
        };
        let user = UserId::new(user);
        if !scripts.contains_key(&user) {
            order.push(user.clone());
        }
        scripts.entry(user).or_default().push(text.trim().to_string());
    }

    tracing::info!("Replaying {} users from {:?}", order.len(), file);

    let transcripts: HashMap<UserId, Vec<String>> = std::thread::scope(|scope| {
        let handles: Vec<_> = scripts
            .iter()
            .map(|(user, lines)| {
                scope.spawn(move || {
                    let replies: Vec<String> = lines
                        .iter()
                        .map(|line| store.handle(user, line).to_string())
                        .collect();
                    (user.clone(), replies)
                })
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|handle| match handle.join() {
                Ok(transcript) => Some(transcript),
                Err(_) => {
                    tracing::error!("Replay worker panicked");
                    None
                }
            })
            .collect()
    });

    let mut stdout = io::stdout();
    for user in &order {
        let Some(replies) = transcripts.get(user) else {
            continue;
        };
        for reply in replies {
            writeln!(stdout, "[{}] {}", user, reply)?;
        }
    }

    persistence.save(store, &order)?;
    Ok(())
}
