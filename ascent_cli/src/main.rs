use ascent_core::*;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ascent")]
#[command(about = "Climbing training tracker client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory (where the login token is kept)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the backend origin
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the token
    Login {
        #[arg(long)]
        email: String,

        /// Prompted for when omitted; the prompt echoes what you type
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account, then log in
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        username: String,

        /// Prompted for when omitted; the prompt echoes what you type
        #[arg(long)]
        password: Option<String>,

        /// Prompted for when omitted; the prompt echoes what you type
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Forget the stored token
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Stats for a period plus the latest sessions
    Dashboard {
        /// 7, 30 or 90 days
        #[arg(long)]
        period: Option<u32>,
    },

    /// Climbing sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsCommand,
    },

    /// Exercise library
    Exercises {
        #[command(subcommand)]
        action: ExercisesCommand,
    },

    /// Aggregated stats for a date range
    Stats {
        /// Start date (YYYY-MM-DD), defaults to 7 days ago
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<String>,
    },

    /// Training programs
    Programs {
        #[command(subcommand)]
        action: ProgramsCommand,
    },

    /// Goals and their progress
    Goals {
        #[command(subcommand)]
        action: GoalsCommand,
    },
}

#[derive(Subcommand)]
enum SessionsCommand {
    List {
        #[arg(long)]
        limit: Option<u32>,

        /// all, week or month
        #[arg(long, default_value = "all")]
        filter: String,
    },
    Show {
        id: i64,
    },
    New(SessionFields),
    Edit {
        id: i64,

        #[command(flatten)]
        fields: SessionFields,
    },
    Delete {
        id: i64,
    },
    /// Write sessions to a CSV file
    Export {
        #[arg(long)]
        output: PathBuf,

        #[arg(long, default_value = "all")]
        filter: String,
    },
}

/// Form fields shared by `sessions new` and `sessions edit`
#[derive(Args)]
struct SessionFields {
    #[arg(long)]
    title: Option<String>,

    /// YYYY-MM-DD, defaults to today for new sessions
    #[arg(long)]
    date: Option<String>,

    /// Minutes, defaults to 90 for new sessions
    #[arg(long)]
    duration: Option<u32>,

    /// 5a..8a, defaults to 6a for new sessions
    #[arg(long)]
    difficulty: Option<String>,

    /// salle, falaise or bloc
    #[arg(long = "type")]
    session_type: Option<String>,

    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum ExercisesCommand {
    List,
    New {
        #[arg(long)]
        name: String,

        /// sae, outdoor, running, routine_morning, routine_evening, other
        #[arg(long = "type")]
        exercise_type: String,

        #[arg(long)]
        duration: Option<u32>,

        #[arg(long)]
        description: Option<String>,

        /// 1 to 5
        #[arg(long)]
        intensity: Option<u8>,

        #[arg(long)]
        focus: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProgramsCommand {
    List,
    New {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        weeks: Option<u32>,

        #[arg(long)]
        active: bool,

        #[arg(long)]
        public: bool,
    },
}

#[derive(Subcommand)]
enum GoalsCommand {
    List,
    New {
        #[arg(long)]
        name: String,

        #[arg(long)]
        required_count: u32,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        order: Option<i32>,
    },
    Edit {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        required_count: Option<u32>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        order: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    ascent_core::logging::init();

    let cli = Cli::parse();

    let outcome = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted.");
            return ExitCode::from(130);
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?.with_env_overrides();
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.data.data_dir = dir;
    }
    config.validate()?;

    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(config.data.token_path()));
    let client = ApiClient::new(config.api.clone().into(), tokens)?.on_unauthorized(|| {
        eprintln!("Your session has expired. Run `ascent login` to sign in again.");
    });
    let auth = AuthSession::new(client.clone());

    match cli.command {
        Commands::Login { email, password } => cmd_login(&auth, &email, password).await,
        Commands::Register {
            email,
            username,
            password,
            confirm_password,
        } => cmd_register(&auth, email, username, password, confirm_password).await,
        Commands::Logout => {
            auth.logout()?;
            println!("✓ Logged out");
            Ok(())
        }
        Commands::Whoami => {
            let user = auth.current_user().await?;
            println!("{} <{}>", user.username, user.email);
            println!("  Member since {}", user.created_at.format("%Y-%m-%d"));
            Ok(())
        }
        Commands::Dashboard { period } => {
            let days = period.unwrap_or(config.dashboard.period_days);
            cmd_dashboard(&client, Period::from_days(days)?, config.dashboard.recent_limit).await
        }
        Commands::Sessions { action } => cmd_sessions(&client, action).await,
        Commands::Exercises { action } => cmd_exercises(&client, action).await,
        Commands::Stats { from, to } => cmd_stats(&client, from, to).await,
        Commands::Programs { action } => cmd_programs(&client, action).await,
        Commands::Goals { action } => cmd_goals(&client, action).await,
    }
}

async fn cmd_login(auth: &AuthSession, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt("Password (visible)")?,
    };
    auth.login(email, &password).await?;
    println!("✓ Logged in as {}", email.trim());
    Ok(())
}

async fn cmd_register(
    auth: &AuthSession,
    email: String,
    username: String,
    password: Option<String>,
    confirm_password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt("Password (visible)")?,
    };
    let confirm_password = match confirm_password {
        Some(p) => p,
        None => prompt("Confirm password (visible)")?,
    };

    let form = RegisterForm {
        email,
        username,
        password,
        confirm_password,
    };
    let user = auth.register(&form).await?;
    println!("✓ Account created for {} and logged in", user.username);
    Ok(())
}

async fn cmd_dashboard(client: &ApiClient, period: Period, recent_limit: u32) -> Result<()> {
    let dashboard = load_dashboard(client, period, today(), recent_limit).await?;
    let stats = &dashboard.stats;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  DASHBOARD ({})", dashboard.period);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Sessions:    {}", stats.total_sessions.unwrap_or(0));
    println!("  Total time:  {}h", stats.total_hours());
    println!("  Avg grade:   {}", stats.avg_difficulty_label());
    println!("  Progress:    {:+}%", stats.progress.unwrap_or(0.0));
    println!();

    if dashboard.recent_sessions.is_empty() {
        println!("  No sessions logged yet. Create one with `ascent sessions new`.");
    } else {
        println!("  Recent sessions:");
        for session in &dashboard.recent_sessions {
            print_session_row(session);
        }
    }
    println!();
    Ok(())
}

async fn cmd_sessions(client: &ApiClient, action: SessionsCommand) -> Result<()> {
    match action {
        SessionsCommand::List { limit, filter } => {
            let filter: SessionFilter = filter.parse()?;
            let query = SessionQuery { limit, skip: None };
            let sessions = filter.apply(client.get_sessions(&query).await?, today());
            if sessions.is_empty() {
                println!("No sessions found.");
            }
            for session in &sessions {
                print_session_row(session);
            }
        }
        SessionsCommand::Show { id } => {
            let session = client.get_session(id).await?;
            print_session_detail(&session);
        }
        SessionsCommand::New(fields) => {
            let input = fields.into_input()?;
            let session = client.create_session(&input).await?;
            println!("✓ Session created (#{})", session.id);
            print_session_detail(&session);
        }
        SessionsCommand::Edit { id, fields } => {
            let update = fields.into_update()?;
            if update.is_empty() {
                return Err(Error::Validation("nothing to update".into()));
            }
            let session = client.update_session(id, &update).await?;
            println!("✓ Session #{} updated", session.id);
            print_session_detail(&session);
        }
        SessionsCommand::Delete { id } => {
            client.delete_session(id).await?;
            println!("✓ Session #{} deleted", id);
        }
        SessionsCommand::Export { output, filter } => {
            let filter: SessionFilter = filter.parse()?;
            let sessions = filter.apply(client.get_sessions(&SessionQuery::default()).await?, today());
            let count = export_sessions_csv(&sessions, &output)?;
            println!("✓ Exported {} sessions", count);
            println!("  CSV: {}", output.display());
        }
    }
    Ok(())
}

impl SessionFields {
    fn into_input(self) -> Result<SessionInput> {
        let date = match self.date {
            Some(d) => parse_date(&d)?,
            None => today(),
        };
        let duration = positive_duration(self.duration.unwrap_or(90))?;
        let difficulty = match self.difficulty {
            Some(g) => g.parse::<Grade>()?,
            None => Grade::default(),
        };
        let session_type = match self.session_type {
            Some(t) => t.parse::<SessionType>()?,
            None => SessionType::default(),
        };

        let mut input = SessionInput::new(date, duration, difficulty, session_type);
        input.title = non_empty(self.title);
        input.location = non_empty(self.location);
        input.notes = non_empty(self.notes);
        Ok(input)
    }

    fn into_update(self) -> Result<SessionUpdate> {
        Ok(SessionUpdate {
            title: self.title,
            session_date: self.date.as_deref().map(parse_date).transpose()?,
            duration: self.duration.map(positive_duration).transpose()?,
            difficulty: self.difficulty.map(|g| g.parse::<Grade>()).transpose()?,
            location: self.location,
            session_type: self.session_type.map(|t| t.parse::<SessionType>()).transpose()?,
            notes: self.notes,
        })
    }
}

async fn cmd_exercises(client: &ApiClient, action: ExercisesCommand) -> Result<()> {
    match action {
        ExercisesCommand::List => {
            let exercises = client.get_exercises().await?;
            if exercises.is_empty() {
                println!("No exercises found.");
            }
            for exercise in &exercises {
                let duration = exercise
                    .duration_min
                    .map(|d| format!("{} min", d))
                    .unwrap_or_else(|| "-".into());
                println!(
                    "  #{:<5} {:<30} {:<16} {}",
                    exercise.id, exercise.name, exercise.exercise_type, duration
                );
            }
        }
        ExercisesCommand::New {
            name,
            exercise_type,
            duration,
            description,
            intensity,
            focus,
        } => {
            if let Some(i) = intensity {
                if !(1..=5).contains(&i) {
                    return Err(Error::Validation("intensity must be between 1 and 5".into()));
                }
            }
            let input = ExerciseInput {
                name,
                exercise_type: exercise_type.parse::<ExerciseType>()?,
                duration_min: duration,
                description: non_empty(description),
                intensity,
                focus: non_empty(focus),
            };
            let exercise = client.create_exercise(&input).await?;
            println!("✓ Exercise created (#{}): {}", exercise.id, exercise.name);
        }
    }
    Ok(())
}

async fn cmd_stats(client: &ApiClient, from: Option<String>, to: Option<String>) -> Result<()> {
    let end = match to {
        Some(d) => parse_date(&d)?,
        None => today(),
    };
    let start = match from {
        Some(d) => parse_date(&d)?,
        None => Period::Week.range(end).0,
    };
    if start > end {
        return Err(Error::Validation("--from must not be after --to".into()));
    }

    let stats = client.get_stats(start, end).await?;
    println!("Stats {} → {}", start, end);
    println!("  Sessions:    {}", stats.total_sessions.unwrap_or(0));
    println!("  Total time:  {}h", stats.total_hours());
    println!("  Avg grade:   {}", stats.avg_difficulty_label());
    println!("  Progress:    {:+}%", stats.progress.unwrap_or(0.0));
    for (key, value) in &stats.extra {
        println!("  {}: {}", key, value);
    }
    Ok(())
}

async fn cmd_programs(client: &ApiClient, action: ProgramsCommand) -> Result<()> {
    match action {
        ProgramsCommand::List => {
            let programs = client.get_programs().await?;
            if programs.is_empty() {
                println!("No programs found.");
            }
            for program in &programs {
                let marker = if program.is_active { "*" } else { " " };
                let weeks = program
                    .duration_weeks
                    .map(|w| format!("{} weeks", w))
                    .unwrap_or_default();
                println!("{} #{:<5} {:<30} {}", marker, program.id, program.name, weeks);
            }
        }
        ProgramsCommand::New {
            name,
            description,
            weeks,
            active,
            public,
        } => {
            let input = ProgramInput {
                name,
                description: non_empty(description),
                duration_weeks: weeks,
                is_active: active,
                is_public: public,
            };
            let program = client.create_program(&input).await?;
            println!("✓ Program created (#{}): {}", program.id, program.name);
        }
    }
    Ok(())
}

async fn cmd_goals(client: &ApiClient, action: GoalsCommand) -> Result<()> {
    match action {
        GoalsCommand::List => {
            let goals = client.get_goals().await?;
            if goals.is_empty() {
                println!("No goals found.");
            }
            for goal in &goals {
                let progress = goal
                    .progress
                    .as_ref()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "  #{:<5} {:<30} target {:<4} progress {}",
                    goal.id, goal.name, goal.required_count, progress
                );
            }
        }
        GoalsCommand::New {
            name,
            required_count,
            description,
            order,
        } => {
            let input = GoalInput {
                name,
                description: non_empty(description),
                required_count,
                order,
            };
            let goal = client.create_goal(&input).await?;
            println!("✓ Goal created (#{}): {}", goal.id, goal.name);
        }
        GoalsCommand::Edit {
            id,
            name,
            required_count,
            description,
            order,
        } => {
            let update = GoalUpdate {
                name,
                description,
                required_count,
                order,
            };
            if update == GoalUpdate::default() {
                return Err(Error::Validation("nothing to update".into()));
            }
            let goal = client.update_goal(id, &update).await?;
            println!("✓ Goal #{} updated", goal.id);
        }
    }
    Ok(())
}

fn print_session_row(session: &Session) {
    println!(
        "  #{:<5} {}  {:<28} {:>4}  {:>4} min",
        session.id,
        session.session_date,
        session.display_title(),
        session.difficulty,
        session.duration
    );
}

fn print_session_detail(session: &Session) {
    println!();
    println!("  {}", session.display_title());
    println!("  Date:       {}", session.session_date);
    println!("  Duration:   {} min", session.duration);
    println!("  Difficulty: {}", session.difficulty);
    println!("  Type:       {}", session.session_type_label());
    if let Some(ref location) = session.location {
        println!("  Location:   {}", location);
    }
    if let Some(count) = session.exercise_count {
        println!("  Exercises:  {}", count);
    }
    if let Some(ref notes) = session.notes {
        println!();
        println!("  {}", notes);
    }
    println!();
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("invalid date '{}' (expected YYYY-MM-DD)", s)))
}

fn positive_duration(minutes: u32) -> Result<u32> {
    if minutes == 0 {
        return Err(Error::Validation("duration must be at least 1 minute".into()));
    }
    Ok(minutes)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Read one line from stdin. Input is echoed.
fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
