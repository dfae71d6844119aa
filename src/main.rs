use std::{
    collections::HashMap,
    io::Write,
    path::PathBuf,
    sync::Arc,
};

use clap::{
    Parser,
    Subcommand,
};
use log::{
    error,
    warn,
};
use tankyu::{
    core::{
        config::CONFIG_FILE,
        utils::human_time,
        EngineConfig,
        Feedback,
        Moment,
        NextQuiz,
        Quiz,
        QuizKind,
        TankyuError,
        WordStatus,
    },
    dictionary::{
        Denylist,
        VocabularyOrdering,
    },
    persistence::{
        get_app_data_dir,
        JsonStore,
    },
    search::MassifClient,
    QuizEngine,
};
use tokio::io::{
    AsyncBufReadExt,
    BufReader,
    Lines,
    Stdin,
};

const ORDERING_FILE: &str = "ordering.txt";

type Engine = QuizEngine<JsonStore, MassifClient>;

/// Adaptive vocabulary quizzes on real example sentences
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Engine config JSON, created with defaults if missing
    /// (defaults to config.json in the data directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Vocabulary ordering, most common word first
    #[arg(long)]
    ordering: Option<PathBuf>,

    /// Directory holding the word store and denylist
    #[arg(long)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Placement, today's introductions and the SRS queue
    Status,
    /// Print a placement test, or record the rank you read comfortably up to
    Placement {
        #[arg(long)]
        set: Option<usize>,

        #[arg(long, default_value_t = 5)]
        words_per_level: usize,
    },
    /// Quiz in the terminal
    Review {
        /// Stop after this many quizzes
        #[arg(short, long)]
        count: Option<usize>,
    },
    /// Words kept out of the vocabulary ordering
    Denylist {
        #[command(subcommand)]
        action: DenylistAction,
    },
}

#[derive(Subcommand, Debug)]
enum DenylistAction {
    List,
    Add { term: String },
    Remove { term: String },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), TankyuError> {
    let data_dir = args.data.unwrap_or_else(get_app_data_dir);
    let mut denylist = Denylist::load_from(&data_dir)?;
    let command = match args.command {
        Command::Denylist { action } => return edit_denylist(&mut denylist, action),
        command => command,
    };

    let config_path = args.config.unwrap_or_else(|| data_dir.join(CONFIG_FILE));
    let config = EngineConfig::load_or_create(&config_path)?;
    let ordering_path = args.ordering.unwrap_or_else(|| data_dir.join(ORDERING_FILE));

    let ordering = Arc::new(VocabularyOrdering::load(&ordering_path, &denylist)?);
    let store = JsonStore::open(&data_dir).await?;
    let search = MassifClient::new(&config.search)?;
    let engine = QuizEngine::load(config, ordering, store, search, Moment::now()).await?;

    match command {
        Command::Status => print_status(&engine),
        Command::Placement { set: Some(rank), .. } => {
            if rank > engine.ordering().len() {
                warn!("Rank {} is past the end of the ordering ({} words)", rank, engine.ordering().len());
            }
            engine.set_ordering_intro_idx(rank).await
        }
        Command::Placement { set: None, words_per_level } => {
            print_placement(&engine, words_per_level)
        }
        Command::Review { count } => review(&engine, count).await,
        Command::Denylist { .. } => Ok(()),
    }
}

fn edit_denylist(denylist: &mut Denylist, action: DenylistAction) -> Result<(), TankyuError> {
    match action {
        DenylistAction::List => {
            for term in denylist.terms() {
                println!("{}", term);
            }
        }
        DenylistAction::Add { term } => {
            if !denylist.add_term(&term)? {
                println!("'{}' is already denied", term);
            }
        }
        DenylistAction::Remove { term } => {
            if !denylist.remove_term(&term)? {
                println!("'{}' was not denied", term);
            }
        }
    }
    Ok(())
}

fn print_status(engine: &Engine) -> Result<(), TankyuError> {
    match engine.ordering_intro_idx()? {
        Some(rank) => println!("Placement: rank {} of {}", rank, engine.ordering().len()),
        None => println!("Placement: not set, run `tankyu placement`"),
    }

    let today = engine.day_stats()?;
    println!(
        "Introduced today: {}/{}",
        today.intro_count,
        engine.config().srs.daily_intro_limit
    );

    let mut by_status: HashMap<WordStatus, usize> = HashMap::new();
    for word in engine.tracked_words()? {
        *by_status.entry(word.state.status()).or_default() += 1;
    }
    for status in [
        WordStatus::Tracked,
        WordStatus::Queued,
        WordStatus::Ignored,
        WordStatus::Learning,
        WordStatus::Reviewing,
    ] {
        let name = format!("{:?}", status);
        println!("{:>10}: {}", name, by_status.get(&status).copied().unwrap_or(0));
    }

    let analysis = engine.srs_analysis(Moment::now())?;
    println!(
        "Due now: {} learning, {} reviewing",
        analysis.due_learning, analysis.due_reviewing
    );
    if let Some(secs) = analysis.time_until_next_learning {
        println!("Next learning step in {}", human_time(secs as f64));
    }
    Ok(())
}

fn print_placement(engine: &Engine, words_per_level: usize) -> Result<(), TankyuError> {
    for level in engine.placement_test(words_per_level)? {
        println!("[{:>6} - {:>6}] {}", level.begin_rank, level.end_rank, level.words.join(" "));
    }
    println!("Pick the first level you do not read comfortably and run `tankyu placement --set <begin>`");
    Ok(())
}

type StdinLines = Lines<BufReader<Stdin>>;

/// Prompts until one of `choices` is typed. `None` on end of input.
async fn ask(lines: &mut StdinLines, prompt: &str, choices: &str) -> Result<Option<char>, TankyuError> {
    loop {
        print!("{} [{}] ", prompt, choices);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        if let Some(c) = line.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            if choices.contains(c) {
                return Ok(Some(c));
            }
        }
    }
}

async fn collect_feedback(lines: &mut StdinLines, quiz: &Quiz) -> Result<Option<Feedback>, TankyuError> {
    println!();
    println!("{}", quiz.fragment_text);
    println!("  target: {}", quiz.target.spec);

    let Some(understood) = ask(lines, "Did you understand the sentence?", "yn").await? else {
        return Ok(None);
    };
    let mut feedback = Feedback { fragment_understood: understood == 'y', ..Feedback::default() };

    let prompt = format!("Did you know '{}'? (? unsure, i ignore, s not in sentence)", quiz.target.spec);
    let Some(known) = ask(lines, &prompt, "yn?is").await? else {
        return Ok(None);
    };
    match known {
        'y' => feedback.target_word_known = Some(true),
        'n' => feedback.target_word_known = Some(false),
        'i' => feedback.target_word_ignored = true,
        's' => feedback.target_word_not_in_fragment = true,
        _ => {}
    }

    if quiz.kind != QuizKind::SrsReview && !feedback.target_word_ignored {
        let prompt = match quiz.kind {
            QuizKind::SuggestQueue => "Queue it for SRS?",
            _ => "Add it to SRS?",
        };
        let Some(agreed) = ask(lines, prompt, "yn").await? else {
            return Ok(None);
        };
        feedback.target_word_agreed_to_srs = Some(agreed == 'y');
    }
    Ok(Some(feedback))
}

async fn review(engine: &Engine, count: Option<usize>) -> Result<(), TankyuError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    for _ in 0..count.unwrap_or(usize::MAX) {
        let quiz = match engine.get_next_quiz(Moment::now()).await? {
            NextQuiz::Ready(quiz) => quiz,
            NextQuiz::PlacementTestRequired => {
                println!("No placement yet, run `tankyu placement` first");
                return Ok(());
            }
            NextQuiz::NothingAvailable => {
                println!("Nothing to review or introduce right now");
                break;
            }
        };

        let Some(feedback) = collect_feedback(&mut lines, &quiz).await? else {
            break;
        };
        engine.take_feedback(Moment::now(), &quiz, &feedback).await?;
    }

    print_status(engine)
}
