#![deny(warnings)]

//! Headless front end for Tabelline Hero: onboarding, practice sessions,
//! the cosmetic shop and the mentor, driven from the command line.

mod app;

use anyhow::{anyhow, bail, Context, Result};
use app::App;
use hero_core::{items_of, ItemKind, MentorEvent, Profile, Question, TableId, ThemeId};
use hero_mentor::{generator_from_config, Mentor, MentorConfig, OfflineGenerator, TextGenerator};
use hero_progress::{item_status, ItemStatus};
use hero_quiz::PracticeSession;
use persistence::ProfileStore;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Shown after a wrong answer when moving to the next question.
const ENCOURAGEMENT: &str = "Forza, la prossima andrà meglio!";

#[derive(Debug, Default, PartialEq)]
struct Cli {
    save_dir: Option<PathBuf>,
    mentor_config: Option<PathBuf>,
    command: Command,
}

#[derive(Debug, Default, PartialEq)]
enum Command {
    New {
        name: String,
        theme: ThemeId,
    },
    #[default]
    Show,
    Play(PlayArgs),
    Shop,
    Buy(String),
    Equip(String),
    Theme(ThemeId),
    Version,
}

#[derive(Debug, Default, PartialEq)]
struct PlayArgs {
    table: Option<TableId>,
    seed: Option<u64>,
    answers: Option<Vec<u32>>,
    accuracy: Option<f64>,
    offline: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut positional: Vec<String> = Vec::new();
    let mut theme: Option<ThemeId> = None;
    let mut play = PlayArgs::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().ok_or_else(|| anyhow!("{flag} needs a value"));
        match arg.as_str() {
            "--save-dir" => cli.save_dir = Some(value("--save-dir")?.into()),
            "--mentor-config" => cli.mentor_config = Some(value("--mentor-config")?.into()),
            "--theme" => theme = Some(value("--theme")?.parse()?),
            "--seed" => {
                play.seed = Some(value("--seed")?.parse().context("--seed must be a number")?)
            }
            "--answers" => {
                let list = value("--answers")?
                    .split(',')
                    .map(|s| s.trim().parse::<u32>())
                    .collect::<Result<Vec<_>, _>>()
                    .context("--answers must be comma-separated numbers")?;
                play.answers = Some(list);
            }
            "--accuracy" => {
                let p: f64 = value("--accuracy")?
                    .parse()
                    .context("--accuracy must be a number")?;
                if !(0.0..=1.0).contains(&p) {
                    bail!("--accuracy must be within [0, 1]");
                }
                play.accuracy = Some(p);
            }
            "--offline" => play.offline = true,
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            _ => positional.push(arg),
        }
    }

    let mut pos = positional.into_iter();
    let cmd = pos.next();
    let arg = pos.next();
    cli.command = match (cmd.as_deref(), arg) {
        (None, _) | (Some("show"), _) => Command::Show,
        (Some("new"), Some(name)) => Command::New {
            name,
            theme: theme.unwrap_or_default(),
        },
        (Some("play"), Some(table)) => {
            play.table = Some(table.parse()?);
            Command::Play(play)
        }
        (Some("shop"), _) => Command::Shop,
        (Some("buy"), Some(id)) => Command::Buy(id),
        (Some("equip"), Some(id)) => Command::Equip(id),
        (Some("theme"), Some(t)) => Command::Theme(t.parse()?),
        (Some("version"), _) => Command::Version,
        (Some(c @ ("new" | "play" | "buy" | "equip" | "theme")), None) => {
            bail!("`{c}` needs an argument")
        }
        (Some(other), _) => bail!("unknown command `{other}`"),
    };
    Ok(cli)
}

fn stars(n: u8) -> String {
    (0..3).map(|i| if i < n { '★' } else { '☆' }).collect()
}

fn print_profile(p: &Profile) {
    let theme = p.theme();
    println!(
        "{} | {} ({} {}) | level {} | xp {} | {} {}",
        p.name, theme.name, theme.mentor_name, theme.mentor_emoji, p.level, p.xp, p.coins, theme.coin_symbol
    );
    println!(
        "avatar: colour {} | accessory {} | expression {}",
        p.avatar.base_color,
        if p.avatar.accessory.is_empty() { "-" } else { p.avatar.accessory.as_str() },
        p.avatar.expression
    );
    for (table, progress) in &p.progress {
        let label = match table {
            TableId::Number(n) => format!("x{n:<5}"),
            TableId::Mixed => "mixed ".to_string(),
        };
        if progress.is_unlocked {
            println!("  {label} {} best {}", stars(progress.stars), progress.high_score);
        } else {
            println!("  {label} locked");
        }
    }
    println!("  stars on tables 1-10: {}", p.numeric_stars());
}

fn print_shop(p: &Profile) {
    let symbol = p.theme().coin_symbol;
    for (title, kind) in [
        ("Colours", ItemKind::Color),
        ("Accessories", ItemKind::Accessory),
        ("Expressions", ItemKind::Expression),
    ] {
        println!("{title}:");
        for item in items_of(kind) {
            let status = match item_status(p, item) {
                ItemStatus::Equipped => "equipped".to_string(),
                ItemStatus::Owned => "owned".to_string(),
                ItemStatus::Buyable => format!("{} {symbol}", item.cost),
                ItemStatus::TooExpensive => format!("{} {symbol} (not enough)", item.cost),
                ItemStatus::LevelLocked => format!("level {}", item.req_level),
            };
            println!("  {:<10} {:<10} {:<5} {status}", item.id, item.name, item.value);
        }
    }
}

/// Where answers come from during `play`.
enum Answerer {
    Scripted(std::vec::IntoIter<u32>),
    Simulated { accuracy: f64, rng: ChaCha8Rng },
    Stdin,
}

impl Answerer {
    fn from_args(args: &PlayArgs, seed: u64) -> Self {
        if let Some(list) = &args.answers {
            Answerer::Scripted(list.clone().into_iter())
        } else if let Some(accuracy) = args.accuracy {
            Answerer::Simulated {
                accuracy,
                rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
            }
        } else {
            Answerer::Stdin
        }
    }

    fn pick(&mut self, q: &Question) -> Result<u32> {
        match self {
            Answerer::Scripted(it) => it.next().ok_or_else(|| anyhow!("ran out of --answers")),
            Answerer::Simulated { accuracy, rng } => {
                if rng.gen_bool(*accuracy) {
                    Ok(q.correct_answer)
                } else {
                    let wrong: Vec<u32> = q
                        .options
                        .iter()
                        .copied()
                        .filter(|&o| o != q.correct_answer)
                        .collect();
                    Ok(wrong[rng.gen_range(0..wrong.len())])
                }
            }
            Answerer::Stdin => {
                let mut line = String::new();
                std::io::stdin().lock().read_line(&mut line)?;
                line.trim()
                    .parse()
                    .with_context(|| format!("not a number: {:?}", line.trim()))
            }
        }
    }
}

async fn play(app: &mut App, args: PlayArgs, mentor_config: &MentorConfig) -> Result<()> {
    let table = args.table.ok_or_else(|| anyhow!("`play` needs a table"))?;
    app.ensure_playable(table)?;
    let profile = app.require()?.clone();
    let theme = profile.theme();

    let generator: Box<dyn TextGenerator> = if args.offline {
        Box::new(OfflineGenerator)
    } else {
        generator_from_config(mentor_config)
    };
    let mentor = Mentor::new(generator, mentor_config);
    let feed = mentor.feed();

    let seed = args.seed.unwrap_or_else(rand::random);
    info!(%table, seed, "session started");
    let mut answerer = Answerer::from_args(&args, seed);
    let mut session = PracticeSession::new(table, seed);

    mentor.say(&MentorEvent::Welcome, &profile.name, theme).await;
    println!("{} {}", theme.mentor_emoji, feed.current());

    loop {
        let q = session.question().clone();
        println!(
            "[{}/{}] {} = ?   {:?}",
            session.number(),
            session.total(),
            q,
            q.options
        );
        let value = answerer.pick(&q)?;
        let feedback = session.answer(value)?;
        if feedback.correct {
            println!("  ✓ {value}");
        } else {
            println!("  ✗ {value}, it was {}", feedback.correct_answer);
        }
        if let Some(cue) = &feedback.cue {
            if mentor.say(cue, &profile.name, theme).await.is_some() {
                println!("{} {}", theme.mentor_emoji, feed.current());
            }
        }
        if session.is_finished() {
            break;
        }
        session.advance()?;
        if !feedback.correct {
            feed.replace(ENCOURAGEMENT);
            println!("{} {}", theme.mentor_emoji, feed.current());
        }
    }

    let result = session.finish()?;
    let outcome = app.complete_session(&result)?;
    mentor.say(&MentorEvent::LevelComplete, &profile.name, theme).await;
    println!("{} {}", theme.mentor_emoji, feed.current());
    println!(
        "Score {}/{} {} | +{} xp | +{} {}",
        result.score,
        result.total,
        stars(result.stars),
        outcome.xp_gained,
        outcome.coins_gained,
        theme.coin_symbol
    );
    if outcome.new_best {
        let best = app
            .require()?
            .table(table)
            .map(|t| t.high_score)
            .unwrap_or(result.score);
        println!("New best on table {table}: {} best {best}", stars(outcome.stars));
    }
    if outcome.leveled_up() {
        println!("Level up! Now level {}", outcome.level);
    }
    for t in &outcome.unlocked {
        println!("Unlocked table {t}!");
    }
    Ok(())
}

/// Log subscriber honouring `filter` (`RUST_LOG`, default `info`).
fn log_subscriber(filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt().with_env_filter(filter).finish()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing::subscriber::set_global_default(log_subscriber(filter))?;

    let cli = parse_args(std::env::args().skip(1))?;
    let store = match &cli.save_dir {
        Some(dir) => ProfileStore::new(dir),
        None => ProfileStore::from_env(),
    };
    let mentor_config = match &cli.mentor_config {
        Some(path) => MentorConfig::load(path)?,
        None => MentorConfig::default(),
    };
    let mut app = App::open(store)?;

    match cli.command {
        Command::New { name, theme } => {
            let p = app.onboard(&name, theme)?;
            print_profile(p);
        }
        Command::Show => match app.profile() {
            Some(p) => print_profile(p),
            None => println!("No learner yet. Start with `tabelline new <name> [--theme wizard|princess|robot|soccer]`."),
        },
        Command::Play(args) => play(&mut app, args, &mentor_config).await?,
        Command::Shop => print_shop(app.require()?),
        Command::Buy(id) => {
            app.buy(&id)?;
            println!("Bought {id}.");
        }
        Command::Equip(id) => {
            app.equip(&id)?;
            println!("Equipped {id}.");
        }
        Command::Theme(theme) => {
            app.set_theme(theme)?;
            println!("Welcome to {}!", theme.config().name);
        }
        Command::Version => {
            println!(
                "tabelline {} ({} built {})",
                env!("CARGO_PKG_VERSION"),
                env!("GIT_SHA"),
                env!("BUILD_DATE")
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn no_command_shows_profile() {
        assert_eq!(parse_args(args("")).unwrap().command, Command::Show);
    }

    #[test]
    fn parses_new_with_theme_and_save_dir() {
        let cli = parse_args(args("--save-dir /tmp/h new Alice --theme robot")).unwrap();
        assert_eq!(cli.save_dir, Some(PathBuf::from("/tmp/h")));
        assert_eq!(
            cli.command,
            Command::New {
                name: "Alice".into(),
                theme: ThemeId::Robot
            }
        );
    }

    #[test]
    fn parses_play_options() {
        let cli = parse_args(args("play 7 --seed 9 --answers 7,14,21 --offline")).unwrap();
        assert_eq!(
            cli.command,
            Command::Play(PlayArgs {
                table: Some(TableId::Number(7)),
                seed: Some(9),
                answers: Some(vec![7, 14, 21]),
                accuracy: None,
                offline: true,
            })
        );
        let cli = parse_args(args("play mixed --accuracy 0.5")).unwrap();
        match cli.command {
            Command::Play(p) => {
                assert_eq!(p.table, Some(TableId::Mixed));
                assert_eq!(p.accuracy, Some(0.5));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(args("play 11")).is_err());
        assert!(parse_args(args("play")).is_err());
        assert!(parse_args(args("theme pirate")).is_err());
        assert!(parse_args(args("dance")).is_err());
        assert!(parse_args(args("play 3 --accuracy 2")).is_err());
        assert!(parse_args(args("play 3 --answers 1,x")).is_err());
        assert!(parse_args(args("--seed")).is_err());
        assert!(parse_args(args("--loud")).is_err());
    }

    #[test]
    fn log_filter_controls_levels() {
        use tracing::Level;
        tracing::subscriber::with_default(log_subscriber(EnvFilter::new("debug")), || {
            assert!(tracing::enabled!(Level::DEBUG));
        });
        tracing::subscriber::with_default(log_subscriber(EnvFilter::new("warn")), || {
            assert!(!tracing::enabled!(Level::INFO));
            assert!(tracing::enabled!(Level::WARN));
        });
    }

    #[test]
    fn star_strip() {
        assert_eq!(stars(0), "☆☆☆");
        assert_eq!(stars(2), "★★☆");
    }

    #[test]
    fn simulated_answers_are_reproducible() {
        let q = Question {
            factor_a: 4,
            factor_b: 5,
            correct_answer: 20,
            options: [18, 20, 23, 21],
        };
        let play = PlayArgs {
            accuracy: Some(0.0),
            ..PlayArgs::default()
        };
        let mut a = Answerer::from_args(&play, 3);
        let picked = a.pick(&q).unwrap();
        assert_ne!(picked, 20);
        assert!(q.options.contains(&picked));

        let perfect = PlayArgs {
            accuracy: Some(1.0),
            ..PlayArgs::default()
        };
        let mut a = Answerer::from_args(&perfect, 3);
        assert_eq!(a.pick(&q).unwrap(), 20);
    }
}
