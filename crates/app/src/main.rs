use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reading_core::model::{Language, MistakeKind, ReadingReport, ReportVerdict, Segment};
use services::ai::{AiMistakeAnalyzer, AiStoryGenerator, ChatClient};
use services::{
    ContentRequest, CurriculumLibrary, Document, DocumentOutcome, ListenOutcome, NavOutcome,
    ReadingEngine, SessionConfig, SessionStep, SpeechUpdate, StoryContentProvider,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

mod terminal;

use terminal::{LineRecognizer, PrintingSynthesizer};

type InputLines = Lines<BufReader<Stdin>>;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidLanguage { raw: String },
    MissingSource,
    MissingLibrary,
    MissingClass,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLanguage { raw } => write!(f, "invalid --language value: {raw}"),
            ArgsError::MissingSource => {
                write!(f, "choose something to read: --text, --chapter or --story")
            }
            ArgsError::MissingLibrary => write!(f, "--library is required here"),
            ArgsError::MissingClass => write!(f, "--class (or READING_CLASS) is required here"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- read [--db <sqlite_url>] [--class <n>] <source>");
    eprintln!("  cargo run -p app -- list --library <json> [--class <n>]");
    eprintln!();
    eprintln!("Sources:");
    eprintln!("  --text <file> [--subject <name>]           read a plain text file");
    eprintln!("  --library <json> --subject <name> --chapter <title>");
    eprintln!("  --story [--language en|hi]                 generate a story (needs AI)");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:reading.sqlite3");
    eprintln!("  --subject English");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  READING_DB_URL, READING_CLASS");
    eprintln!("  READING_AI_API_KEY, READING_AI_BASE_URL, READING_AI_MODEL");
    eprintln!("  RUST_LOG (default info)");
}

fn print_help() {
    println!("  Type what you read, or one of:");
    println!("    :listen      start listening on this segment");
    println!("    :next :back  move between segments");
    println!("    :say <word>  hear a word");
    println!("    :end         finish now and see the report");
    println!("    :quit        leave without a report");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Read,
    List,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "read" => Some(Self::Read),
            "list" => Some(Self::List),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Source {
    Text(PathBuf),
    Chapter { library: PathBuf, title: String },
    Story,
}

#[derive(Debug)]
struct Args {
    db_url: String,
    class: Option<String>,
    subject: String,
    language: Language,
    library: Option<PathBuf>,
    text: Option<PathBuf>,
    chapter: Option<String>,
    story: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("READING_DB_URL")
                .ok()
                .map_or_else(|| normalize_sqlite_url("reading.sqlite3".into()), normalize_sqlite_url),
            class: std::env::var("READING_CLASS")
                .ok()
                .filter(|class| !class.trim().is_empty()),
            subject: "English".into(),
            language: Language::default(),
            library: None,
            text: None,
            chapter: None,
            story: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--class" => parsed.class = Some(require_value(args, "--class")?),
                "--subject" => parsed.subject = require_value(args, "--subject")?,
                "--language" => {
                    let value = require_value(args, "--language")?;
                    parsed.language = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLanguage { raw: value.clone() })?;
                }
                "--library" => parsed.library = Some(require_value(args, "--library")?.into()),
                "--text" => parsed.text = Some(require_value(args, "--text")?.into()),
                "--chapter" => parsed.chapter = Some(require_value(args, "--chapter")?),
                "--story" => parsed.story = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn source(&self) -> Result<Source, ArgsError> {
        if self.story {
            return Ok(Source::Story);
        }
        if let Some(path) = self.text.clone() {
            return Ok(Source::Text(path));
        }
        match (self.library.clone(), self.chapter.clone()) {
            (Some(library), Some(title)) => Ok(Source::Chapter { library, title }),
            (None, Some(_)) => Err(ArgsError::MissingLibrary),
            _ => Err(ArgsError::MissingSource),
        }
    }

    fn require_class(&self) -> Result<String, ArgsError> {
        self.class.clone().ok_or(ArgsError::MissingClass)
    }

    fn session_config(&self, source: &Source) -> SessionConfig {
        match source {
            Source::Story => SessionConfig::story(self.class.clone(), self.language),
            Source::Text(_) | Source::Chapter { .. } => {
                SessionConfig::curriculum(self.class.clone(), self.subject.clone())
            }
        }
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// Progress is optional: fall back to no persistence if `SQLite` will not open.
async fn open_storage(db_url: &str) -> Storage {
    if let Err(err) = prepare_sqlite_file(db_url) {
        tracing::warn!(error = %err, db = db_url, "progress will not be saved");
        return Storage::unavailable();
    }
    match Storage::sqlite(db_url).await {
        Ok(storage) => storage,
        Err(err) => {
            tracing::warn!(error = %err, db = db_url, "progress will not be saved");
            Storage::unavailable()
        }
    }
}

fn load_library(path: &Path) -> Result<CurriculumLibrary, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(CurriculumLibrary::from_json(&json)?)
}

fn list(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.library.as_deref().ok_or(ArgsError::MissingLibrary)?;
    let class = args.require_class()?;
    let library = load_library(path)?;

    let subjects = library.subjects(&class);
    if subjects.is_empty() {
        println!("No books for grade {class} yet.");
    }
    for subject in subjects {
        let Ok(book) = library.book(&class, subject) else {
            println!("{subject}: no chapters yet");
            continue;
        };
        println!("{subject} ({})", book.book_name);
        for chapter in &book.chapters {
            let marker = if chapter.content.is_some() { "" } else { "  (coming soon)" };
            println!("  - {}{marker}", chapter.title);
        }
    }
    Ok(())
}

async fn read(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let source = args.source()?;
    let config = args.session_config(&source);
    let client = ChatClient::from_env();
    if !client.enabled() {
        eprintln!("note: READING_AI_API_KEY is not set; mistakes will not be analyzed.");
    }

    let storage = open_storage(&args.db_url).await;
    let recognizer = Arc::new(LineRecognizer::new());
    let mut engine = ReadingEngine::new(
        config,
        storage.progress,
        Arc::new(AiMistakeAnalyzer::new(client.clone())),
    )
    .with_recognizer(recognizer.clone())
    .with_synthesizer(Arc::new(PrintingSynthesizer));

    let loaded = match &source {
        Source::Text(path) => {
            let content = std::fs::read_to_string(path)?;
            let title = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
            engine.load_document(Document::new(title, Some(content))).await
        }
        Source::Chapter { library, title } => {
            let library = load_library(library)?;
            let request = ContentRequest::Chapter {
                class: args.require_class()?,
                subject: args.subject.clone(),
                title: title.clone(),
            };
            engine.fetch_document(&library, &request).await
        }
        Source::Story => {
            println!("Writing a story for you...");
            let provider = StoryContentProvider::new(Arc::new(AiStoryGenerator::new(client)));
            let request = ContentRequest::Story {
                class: args.require_class()?,
                language: args.language,
            };
            engine.fetch_document(&provider, &request).await
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    match loaded {
        Ok(DocumentOutcome::Started) => {}
        Ok(DocumentOutcome::ResumeAvailable { saved_index }) => {
            println!("You stopped at part {}. Resume? [Y/n]", saved_index + 1);
            let answer = lines.next_line().await?.unwrap_or_default();
            if answer.trim().eq_ignore_ascii_case("n") {
                engine.start_over().await?;
            } else {
                engine.resume().await?;
            }
        }
        Err(err) => {
            if let SessionStep::Failed(message) = engine.step() {
                eprintln!("Something went wrong: {message}");
            }
            return Err(err.into());
        }
    }

    print_help();
    reading_loop(&mut engine, &recognizer, &mut lines).await?;

    if let (Some(report), Some(session)) = (engine.report(), engine.session()) {
        print_report(report, session.segments());
    }
    Ok(())
}

enum Input {
    Line(Option<String>),
    Update(Option<SpeechUpdate>),
}

async fn reading_loop(
    engine: &mut ReadingEngine,
    recognizer: &LineRecognizer,
    lines: &mut InputLines,
) -> Result<(), Box<dyn std::error::Error>> {
    print_segment(engine);
    while engine.step() == &SessionStep::Reading {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line?),
            update = engine.next_update() => Input::Update(update),
        };

        match input {
            Input::Line(None) => engine.end_early().await?,
            Input::Line(Some(line)) => handle_line(engine, recognizer, line.trim()).await?,
            Input::Update(Some(update)) => apply_update(engine, update).await?,
            Input::Update(None) => {}
        }
    }
    Ok(())
}

async fn handle_line(
    engine: &mut ReadingEngine,
    recognizer: &LineRecognizer,
    line: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match line {
        "" => {}
        ":help" | ":h" => print_help(),
        ":listen" | ":l" => {
            let outcome = engine.start_listening()?;
            report_listen(engine, outcome);
        }
        ":next" | ":n" => {
            let outcome = engine.advance().await?;
            show_nav(engine, outcome);
        }
        ":back" | ":b" => {
            let outcome = engine.retreat().await?;
            show_nav(engine, outcome);
        }
        ":end" | ":e" => engine.end_early().await?,
        ":quit" | ":q" => engine.reset(),
        command if command.starts_with(":say ") => {
            let word = command.trim_start_matches(":say ").trim();
            if !engine.pronounce(word) {
                println!("  (nothing to say)");
            }
        }
        command if command.starts_with(':') => println!("  unknown command {command}; try :help"),
        spoken => {
            if !engine.is_listening() {
                let outcome = engine.start_listening()?;
                report_listen(engine, outcome);
            }
            if !recognizer.hear(spoken) {
                println!("  (not listening; type :listen)");
            }
        }
    }
    Ok(())
}

fn report_listen(engine: &mut ReadingEngine, outcome: ListenOutcome) {
    match outcome {
        ListenOutcome::Listening | ListenOutcome::AlreadyListening => {}
        ListenOutcome::Unavailable | ListenOutcome::StartFailed => {
            if let Some(message) = engine.take_message() {
                eprintln!("  {message}");
            }
        }
    }
}

fn show_nav(engine: &ReadingEngine, outcome: NavOutcome) {
    match outcome {
        NavOutcome::Moved(_) => print_segment(engine),
        NavOutcome::Stayed => println!("  (already at the start)"),
        NavOutcome::Finished => {}
    }
}

/// Called outside `select!`: `advance` has to run to completion.
async fn apply_update(
    engine: &mut ReadingEngine,
    update: SpeechUpdate,
) -> Result<(), Box<dyn std::error::Error>> {
    match update {
        SpeechUpdate::Progress(live) => println!("  {}/{} words", live.matched, live.target),
        SpeechUpdate::Completed(live) => {
            println!("  {}/{} words, well read!", live.matched, live.target);
        }
        SpeechUpdate::Error(message) => {
            engine.take_message();
            eprintln!("  {message}");
        }
        SpeechUpdate::AdvanceDue(_) => {
            let outcome = engine.advance().await?;
            show_nav(engine, outcome);
        }
        SpeechUpdate::Started | SpeechUpdate::Stopped | SpeechUpdate::Ignored => {}
    }
    Ok(())
}

fn print_segment(engine: &ReadingEngine) {
    if let Some(session) = engine.session() {
        println!();
        println!(
            "[{}/{}] {}",
            session.current_index() + 1,
            session.segment_count(),
            session.current_segment()
        );
    }
}

fn print_report(report: &ReadingReport, segments: &[Segment]) {
    println!();
    match report.verdict() {
        ReportVerdict::NothingRead => println!("You didn't read anything this time."),
        ReportVerdict::Perfect => println!("Perfect reading!"),
        ReportVerdict::GreatEffort => println!("Great effort! Let's look at a few words."),
    }

    for (index, mistakes) in report.mistakes() {
        if mistakes.is_empty() {
            continue;
        }
        let segment = segments.get(*index).map_or("", Segment::as_str);
        println!();
        println!("Part {}: {segment}", index + 1);
        for mistake in mistakes {
            match mistake.kind() {
                MistakeKind::Omission => println!("  skipped \"{}\"", mistake.expected()),
                MistakeKind::Insertion => println!("  added \"{}\"", mistake.said()),
                MistakeKind::Substitution => println!(
                    "  said \"{}\" for \"{}\"",
                    mistake.said(),
                    mistake.expected()
                ),
            }
        }
    }

    if !report.unattempted().is_empty() && report.verdict() != ReportVerdict::NothingRead {
        let parts: Vec<String> = report
            .unattempted()
            .iter()
            .map(|index| (index + 1).to_string())
            .collect();
        println!();
        println!("Not read yet: part {}", parts.join(", "));
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => {
            print_usage();
            return Ok(());
        }
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Read,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    tracing::debug!(?cmd, db = %parsed.db_url, "starting");

    match cmd {
        Command::List => list(&parsed),
        Command::Read => read(&parsed).await,
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
