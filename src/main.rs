mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use lernen::{
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore, StorageKind},
    controls::lesson_action,
    error::LessonError,
    lesson::{
        ActionResult, CompletionReport, CourseType, LessonCatalog, LessonSession, StaticCatalog,
    },
    runtime::{AppEvent, AppEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    stats::StatsStore,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration,
};

const TICK_RATE_MS: u64 = 250;

/// German lessons in the terminal, with streaks and statistics
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Step-by-step German lessons with multiple-choice practice. Progress, accuracy, time per category and your day streak are kept between runs."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    /// directory holding the statistics (overrides the config file)
    #[clap(long, global = true)]
    data_dir: Option<PathBuf>,

    /// statistics backend (overrides the config file)
    #[clap(long, value_enum, global = true)]
    storage: Option<StorageKind>,

    /// write a debug log to lernen.log in the data directory
    #[clap(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// open one lesson directly
    Lesson { id: u32 },
    /// print every course with lesson progress
    Courses,
    /// print the statistics snapshot
    Stats {
        /// print the raw statistics as JSON
        #[clap(long)]
        json: bool,
    },
    /// erase all statistics
    Reset {
        /// confirm the reset
        #[clap(long)]
        yes: bool,
    },
}

impl Cli {
    fn apply_overrides(&self, mut cfg: Config) -> Config {
        if let Some(dir) = &self.data_dir {
            cfg.data_dir = Some(dir.clone());
        }
        if let Some(storage) = self.storage {
            cfg.storage = storage;
        }
        cfg
    }

    fn is_interactive(&self) -> bool {
        matches!(self.command, None | Some(Command::Lesson { .. }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Courses,
    Lesson,
    LessonNotFound(u32),
    Stats,
}

pub struct App {
    pub state: AppState,
    pub catalog: StaticCatalog,
    pub store: StatsStore,
    pub session: Option<LessonSession>,
    /// Index into `catalog.lessons()` highlighted in the course list
    pub course_cursor: usize,
    pub status: Option<String>,
    clock: Rc<dyn Clock>,
    /// Points awarded for the first visit of each day
    visit_points: u32,
}

impl App {
    pub fn new(
        catalog: StaticCatalog,
        store: StatsStore,
        clock: Rc<dyn Clock>,
        visit_points: u32,
    ) -> Self {
        let status = store.load_warning().map(str::to_string);
        Self {
            state: AppState::Courses,
            catalog,
            store,
            session: None,
            course_cursor: 0,
            status,
            clock,
            visit_points,
        }
    }

    /// Streak check and visit points, once per calendar day
    pub fn daily_visit(&mut self) {
        match self.store.record_daily_visit(self.visit_points) {
            Ok(true) => log::debug!("first visit today, streak {}", self.store.stats().day_streak),
            Ok(false) => {}
            Err(e) => {
                log::warn!("daily visit not saved: {e}");
                self.status = Some(format!("Could not save statistics: {e}"));
            }
        }
    }

    pub fn open_lesson(&mut self, id: u32) {
        match LessonSession::open(&self.catalog, id, self.clock.clone()) {
            Ok(session) => {
                self.session = Some(session);
                self.state = AppState::Lesson;
                self.status = None;
            }
            Err(LessonError::NotFound { id }) => {
                log::info!("lesson {id} requested but not in the catalog");
                self.state = AppState::LessonNotFound(id);
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn back_to_courses(&mut self) {
        self.session = None;
        self.state = AppState::Courses;
        self.daily_visit();
    }

    /// Daily hook driven by the ticker
    pub fn on_tick(&mut self) {
        match self.store.start_new_day() {
            Ok(true) => self.daily_visit(),
            Ok(false) => {}
            Err(e) => self.status = Some(format!("Could not save statistics: {e}")),
        }
    }

    /// Returns true when the app should quit
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        match self.state {
            AppState::Courses => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return true,
                KeyCode::Up | KeyCode::Char('k') => {
                    self.course_cursor = self.course_cursor.saturating_sub(1);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    let last = self.catalog.lessons().len().saturating_sub(1);
                    self.course_cursor = (self.course_cursor + 1).min(last);
                }
                KeyCode::Enter => {
                    if let Some(id) = self.catalog.lessons().get(self.course_cursor).map(|l| l.id) {
                        self.open_lesson(id);
                    }
                }
                KeyCode::Char('s') => self.state = AppState::Stats,
                _ => {}
            },
            AppState::Lesson => self.on_lesson_key(key),
            AppState::LessonNotFound(_) => {
                if matches!(
                    key.code,
                    KeyCode::Enter | KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b')
                ) {
                    self.back_to_courses();
                }
            }
            AppState::Stats => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') | KeyCode::Char('q')
                ) {
                    self.state = AppState::Courses;
                }
            }
        }
        false
    }

    fn on_lesson_key(&mut self, key: KeyEvent) {
        let Some(session) = self.session.as_mut() else {
            self.back_to_courses();
            return;
        };
        let Some(action) = lesson_action(key, session) else {
            return;
        };

        match session.apply(action, &mut self.store) {
            Ok(ActionResult::Stay) => self.status = None,
            Ok(ActionResult::Finished(report)) => {
                self.status = Some(completion_message(&report));
                self.back_to_courses();
            }
            Ok(ActionResult::Abandoned { .. }) => self.back_to_courses(),
            Err(e @ LessonError::MalformedLessonData { .. }) => {
                self.status = Some(format!("{e}. Skip ahead with →."));
            }
            Err(e) => {
                self.status = Some(format!("Could not save statistics: {e}"));
                if session.is_closed() {
                    self.back_to_courses();
                }
            }
        }
    }

    /// Flush the active lesson's time before exit
    pub fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.abandon(&mut self.store) {
                log::warn!("could not record time on exit: {e}");
            }
        }
    }
}

fn completion_message(report: &CompletionReport) -> String {
    format!(
        "Lesson complete: {}/{} correct, {}% accuracy, +{} words, {} min",
        report.correct_answer_count,
        report.total_practice_step_count,
        report.session_accuracy,
        report.words_learned_delta,
        report.time_spent_minutes
    )
}

fn init_logging(cli: &Cli, data_dir: &Path) {
    let default_filter = match (cli.log, cli.is_interactive()) {
        (true, _) => "debug",
        (false, true) => "off",
        (false, false) => "warn",
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));

    if cli.log {
        let opened = std::fs::create_dir_all(data_dir).and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(data_dir.join("lernen.log"))
        });
        match opened {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("cannot open log file: {e}"),
        }
    }

    let _ = builder.try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config_store = FileConfigStore::new();
    let config = cli.apply_overrides(config_store.load());
    init_logging(&cli, &config.resolved_data_dir());
    if let Err(e) = config_store.write_default_if_missing() {
        log::warn!("could not write default config: {e}");
    }

    let clock: Rc<dyn Clock> = Rc::new(SystemClock);
    let mut store = StatsStore::open(config.open_backend()?, clock.clone())
        .with_daily_goal(config.daily_goal_points);
    let catalog = StaticCatalog::bundled();

    if !cli.is_interactive() {
        if let Some(warning) = store.load_warning() {
            eprintln!("{warning}");
        }
    }

    match cli.command {
        Some(Command::Courses) => {
            print_courses(&catalog, &store);
            return Ok(());
        }
        Some(Command::Stats { json }) => {
            print_stats(&store, json)?;
            return Ok(());
        }
        Some(Command::Reset { yes }) => {
            if !yes {
                let mut cmd = Cli::command();
                cmd.error(
                    ErrorKind::MissingRequiredArgument,
                    "reset erases all statistics; pass --yes to confirm",
                )
                .exit();
            }
            store.reset_user_data()?;
            println!("All statistics have been reset.");
            return Ok(());
        }
        None | Some(Command::Lesson { .. }) => {}
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(catalog, store, clock, config.visit_points);
    app.daily_visit();
    if let Some(Command::Lesson { id }) = cli.command {
        app.open_lesson(id);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);
    app.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: AppEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if app.on_key(key) {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn print_courses(catalog: &StaticCatalog, store: &StatsStore) {
    let stats = store.stats();
    for course in CourseType::ALL {
        let lessons = catalog.course(course);
        if lessons.is_empty() {
            continue;
        }
        println!("{course}");
        for lesson in lessons {
            let mark = if stats.is_completed(course, lesson.id) {
                "x"
            } else {
                " "
            };
            println!(
                "  [{mark}] {:>3}  {:<28} {:>3}%  {} min",
                lesson.id,
                lesson.title,
                stats.lesson_progress(course, lesson.id),
                lesson.duration_minutes
            );
        }
    }
}

fn print_stats(store: &StatsStore, json: bool) -> Result<(), Box<dyn Error>> {
    let stats = store.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    println!("Lessons completed  {}", stats.lessons_completed);
    println!("Words learned      {}", stats.words_learned);
    println!("Accuracy           {}%", stats.accuracy_percent);
    println!("Day streak         {}", stats.day_streak);
    println!("Time spent         {:.1} h", stats.total_hours());
    println!("Points earned      {}", stats.points_earned);
    println!(
        "Daily goal         {}/{} ({} to go)",
        stats.daily_goal.current_points,
        stats.daily_goal.target_points,
        stats.daily_goal.remaining()
    );
    Ok(())
}
