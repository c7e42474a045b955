use clap::{Parser, Subcommand};
use flashcards_sched::database::db;
use flashcards_sched::models::{Difficulty, Quality};
use flashcards_sched::{CardId, Config, Result, ReviewService, SessionType, SystemClock};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "flashcards", version, about = "SM-2 review scheduler")]
struct Cli {
    /// Config file (defaults to $FLASHCARDS_CONFIG or ./flashcards.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database, optionally with a sample deck
    Init {
        #[arg(long)]
        sample: bool,
    },
    /// Create a deck
    AddDeck { name: String },
    /// Add a card to a deck
    AddCard {
        deck: String,
        term: String,
        definition: String,
    },
    /// List every card of a deck
    Cards { deck: String },
    /// List the cards of a deck that are due now
    Due { deck: String },
    /// Total, due, new and learning card counts of a deck
    Counts { deck: String },
    /// Study session commands
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Review history of a card
    History { card: CardId },
    /// Interval each rating 0-5 would give a card
    Preview { card: CardId },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Open a session on a deck
    Start {
        deck: String,
        /// review, learn_new or cram
        #[arg(long = "type", default_value = "review")]
        session_type: String,
    },
    /// Record a 0-5 rating for a card
    Review {
        session: Uuid,
        card: CardId,
        #[arg(allow_negative_numbers = true)]
        quality: i64,
    },
    /// Record a right/wrong answer for a card
    Answer {
        session: Uuid,
        card: CardId,
        #[arg(long)]
        wrong: bool,
        /// easy, normal or hard
        #[arg(long, default_value = "normal")]
        difficulty: String,
    },
    /// Close a session
    Close { session: Uuid },
    /// Accuracy and remaining due cards of a session
    Stats { session: Uuid },
}

fn setup_logging(config: &Config) -> std::result::Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(config.level_filter())
        .chain(std::io::stderr())
        .apply()
}

fn print<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human(value);
    }
    Ok(())
}

fn seed_sample(service: &ReviewService<SystemClock>) -> Result<()> {
    let conn = service.connection();
    if !db::get_all_decks(&conn)?.is_empty() {
        return Ok(());
    }
    db::new_deck("Polish Vocabulary", &conn)?;
    db::add_flashcard("Polish Vocabulary", "cześć", "hello", &conn)?;
    db::add_flashcard("Polish Vocabulary", "dziękuję", "thank you", &conn)?;
    db::add_flashcard("Polish Vocabulary", "proszę", "please", &conn)?;
    println!("Sample data created!");
    Ok(())
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let conn = db::init_database(&config.database_path)?;
    let service = ReviewService::new(conn, SystemClock);
    let json = cli.json;

    match cli.command {
        Commands::Init { sample } => {
            if sample {
                seed_sample(&service)?;
            }
            println!("Database ready at {}", config.database_path.display());
        }
        Commands::AddDeck { name } => {
            db::new_deck(&name, &service.connection())?;
            println!("Deck '{name}' created.");
        }
        Commands::AddCard {
            deck,
            term,
            definition,
        } => {
            let id = db::add_flashcard(&deck, &term, &definition, &service.connection())?;
            println!("Card {id} in '{deck}'.");
        }
        Commands::Cards { deck } => {
            let cards = db::get_flashcards_for_deck(&deck, &service.connection())?;
            print(json, &cards, |cards| {
                for card in cards {
                    println!("  [{}] {} = {}", card.id, card.term, card.definition);
                }
            })?;
        }
        Commands::Due { deck } => {
            let ids = service.due_cards(&deck)?;
            let conn = service.connection();
            let cards = ids
                .iter()
                .map(|id| db::get_flashcard(*id, &conn))
                .collect::<Result<Vec<_>>>()?;
            print(json, &cards, |cards| {
                println!("{} due in '{deck}':", cards.len());
                for card in cards {
                    println!("  [{}] {}", card.id, card.term);
                }
            })?;
        }
        Commands::Counts { deck } => {
            let counts = service.due_counts(&deck)?;
            print(json, &counts, |c| {
                println!(
                    "{}: {} cards, {} due, {} new, {} learning",
                    deck, c.total_cards, c.due_cards, c.new_cards, c.learning_cards
                );
            })?;
        }
        Commands::Session { action } => run_session(&service, &config, action, json)?,
        Commands::History { card } => {
            let (logs, summary) = service.card_history(card)?;
            print(json, &(&logs, &summary), |(logs, s)| {
                println!(
                    "card {}: {} reviews, avg quality {:.2}, streak {}",
                    s.card_id, s.total_reviews, s.average_quality, s.current_streak
                );
                for l in logs.iter() {
                    println!(
                        "  {}  q={}  ef={:.2}  interval={}d  reps={}",
                        l.reviewed_at().format("%Y-%m-%d %H:%M"),
                        l.quality(),
                        l.ease_factor(),
                        l.interval_days(),
                        l.repetitions()
                    );
                }
            })?;
        }
        Commands::Preview { card } => {
            let intervals = service.preview(card)?;
            print(json, &intervals, |intervals| {
                for (quality, days) in intervals.iter().enumerate() {
                    println!("  q={quality}: {days}d");
                }
            })?;
        }
    }
    Ok(())
}

fn run_session(
    service: &ReviewService<SystemClock>,
    config: &Config,
    action: SessionAction,
    json: bool,
) -> Result<()> {
    match action {
        SessionAction::Start { deck, session_type } => {
            let session_type: SessionType = session_type.parse()?;
            let session = service.start_session(&config.user_id, &deck, session_type)?;
            print(json, &session, |s| println!("Session {} started.", s.id()))?;
        }
        SessionAction::Review {
            session,
            card,
            quality,
        } => {
            let outcome = service.review_card(session, card, quality)?;
            print(json, &outcome, |o| {
                println!("Card {}: next review in {} days.", o.card_id, o.state.interval_days)
            })?;
        }
        SessionAction::Answer {
            session,
            card,
            wrong,
            difficulty,
        } => {
            let quality = Quality::from_answer(!wrong, Difficulty::parse_lenient(&difficulty));
            let outcome = service.review_card(session, card, i64::from(quality.value()))?;
            print(json, &outcome, |o| {
                println!(
                    "Card {} rated {}: next review in {} days.",
                    o.card_id, quality, o.state.interval_days
                )
            })?;
        }
        SessionAction::Close { session } => {
            let session = service.close_session(session)?;
            print(json, &session, |s| {
                println!(
                    "Session {} closed: {} reviewed ({} correct, {} incorrect) in {}s.",
                    s.id(),
                    s.cards_reviewed(),
                    s.cards_correct(),
                    s.cards_incorrect(),
                    s.duration_seconds().unwrap_or(0)
                )
            })?;
        }
        SessionAction::Stats { session } => {
            let stats = service.session_stats(session)?;
            print(json, &stats, |s| {
                println!(
                    "Session {}: {:.1}% correct, {} cards remaining.",
                    s.session.id, s.accuracy, s.cards_remaining
                )
            })?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = setup_logging(&config) {
        eprintln!("warning: logging disabled: {e}");
    }

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
