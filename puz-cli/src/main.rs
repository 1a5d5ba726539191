use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use puz_core::{Puzzle, ScrambleKey, decode, encode};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "puz-cli")]
#[command(about = "Across Lite .puz inspect / check / (un)scramble – CLI tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print metadata, sections and clues of a puzzle
    Info {
        /// Path to the .puz file
        file: PathBuf,

        /// Also list the words read off the board
        #[arg(long)]
        words: bool,
    },

    /// Check that puzzles decode and encode back to the same bytes
    Check {
        /// One or more .puz files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Scramble the solution with a four digit key
    Scramble {
        /// Path to the unscrambled puzzle
        input: PathBuf,

        /// Path to write the scrambled puzzle
        output: PathBuf,

        /// Four digits, none of them zero
        #[arg(long)]
        key: u16,
    },

    /// Unscramble the solution with a known key
    Unscramble {
        /// Path to the scrambled puzzle
        input: PathBuf,

        /// Path to write the unscrambled puzzle
        output: PathBuf,

        #[arg(long)]
        key: u16,
    },

    /// Search every key for a scrambled puzzle
    Crack {
        /// Path to the scrambled puzzle
        input: PathBuf,

        /// Worker threads (defaults to the number of CPUs)
        #[arg(long)]
        threads: Option<NonZeroUsize>,

        /// Write the unscrambled puzzle here once the key is found
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Rewrite a puzzle with its extra sections in canonical order
    SortSections {
        input: PathBuf,
        output: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file, words } => {
            cmd_info(&file, words)?;
        }
        Commands::Check { files } => {
            let failed = cmd_check(&files)?;
            if failed > 0 {
                bail!("{} of {} puzzle(s) did not round-trip", failed, files.len());
            }
        }
        Commands::Scramble { input, output, key } => {
            cmd_scramble(&input, &output, key)?;
        }
        Commands::Unscramble { input, output, key } => {
            cmd_unscramble(&input, &output, key)?;
        }
        Commands::Crack {
            input,
            threads,
            out,
        } => {
            let threads = threads
                .or_else(|| std::thread::available_parallelism().ok())
                .map_or(1, NonZeroUsize::get);
            cmd_crack(&input, threads, out.as_deref())?;
        }
        Commands::SortSections { input, output } => {
            cmd_sort_sections(&input, &output)?;
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<Puzzle> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read puzzle: {}", path.display()))?;
    decode(&bytes).with_context(|| format!("Failed to decode puzzle: {}", path.display()))
}

fn save(puzzle: &Puzzle, path: &Path) -> Result<()> {
    let bytes = encode(puzzle).context("Failed to encode puzzle")?;
    fs::write(path, &bytes)
        .with_context(|| format!("Failed to write puzzle: {}", path.display()))?;
    println!("[ok] wrote {} bytes -> {}", bytes.len(), path.display());
    Ok(())
}

fn cmd_info(path: &Path, show_words: bool) -> Result<()> {
    let puzzle = load(path)?;

    println!("[info] title={:?}", puzzle.title);
    println!("[info] author={:?}", puzzle.author);
    println!("[info] copyright={:?}", puzzle.copyright);
    if !puzzle.notes.is_empty() {
        println!("[info] notes={:?}", puzzle.notes);
    }
    println!(
        "[info] version={}  size={}x{}  type={:?}",
        puzzle.version(),
        puzzle.width(),
        puzzle.height(),
        puzzle.puzzle_type()
    );
    println!(
        "[info] scrambled={}  preamble={}B  postscript={}B",
        puzzle.is_scrambled(),
        puzzle.preamble().len(),
        puzzle.postscript().len()
    );

    let sections: Vec<&str> = puzzle.extra_sections().iter().map(|s| s.name()).collect();
    println!("[info] sections=[{}]", sections.join(", "));
    if let Some(timer) = puzzle.timer {
        println!(
            "[info] timer={}s ({})",
            timer.seconds_passed,
            if timer.running { "running" } else { "paused" }
        );
    }

    println!(
        "[info] rebus squares={}  marked squares={}",
        puzzle.board().has_rebus(),
        puzzle.board().has_markup()
    );

    for row in puzzle.board().rows() {
        let line: String = row.iter().map(|cell| cell.solution as char).collect();
        println!("  {}", line);
    }

    println!("[info] clues={}", puzzle.expected_clues());
    for clue in puzzle.clues() {
        println!("  {:>3}{} {}", clue.num, clue.direction, clue.text);
    }

    if show_words {
        for word in puzzle.words() {
            println!(
                "  {:>3}{} ({}, {}) {}",
                word.num, word.direction, word.x, word.y, word.text
            );
        }
    }

    Ok(())
}

/// Returns how many files failed.
fn cmd_check(paths: &[PathBuf]) -> Result<usize> {
    let mut failed = 0;

    for path in paths {
        match check_one(path) {
            Ok(()) => println!("[ok] {}", path.display()),
            Err(e) => {
                println!("[fail] {}: {:#}", path.display(), e);
                failed += 1;
            }
        }
    }

    println!(
        "[info] checked={}  passed={}  failed={}",
        paths.len(),
        paths.len() - failed,
        failed
    );
    Ok(failed)
}

fn check_one(path: &Path) -> Result<()> {
    let original =
        fs::read(path).with_context(|| format!("Failed to read puzzle: {}", path.display()))?;
    let puzzle = decode(&original)?;
    let encoded = encode(&puzzle)?;

    if encoded != original {
        let at = encoded
            .iter()
            .zip(&original)
            .position(|(a, b)| a != b)
            .unwrap_or(encoded.len().min(original.len()));
        bail!(
            "re-encoded bytes differ at offset {} (len {} vs {})",
            at,
            encoded.len(),
            original.len()
        );
    }
    Ok(())
}

fn cmd_scramble(input: &Path, output: &Path, key: u16) -> Result<()> {
    let mut puzzle = load(input)?;
    puzzle.scramble(key)?;
    println!("[info] scramble checksum=0x{:04x}", puzzle.scramble_checksum());
    save(&puzzle, output)
}

fn cmd_unscramble(input: &Path, output: &Path, key: u16) -> Result<()> {
    let mut puzzle = load(input)?;
    puzzle.unscramble(key)?;
    save(&puzzle, output)
}

fn cmd_crack(input: &Path, threads: usize, out: Option<&Path>) -> Result<()> {
    let mut puzzle = load(input)?;
    if !puzzle.is_scrambled() {
        bail!("{} is not scrambled", input.display());
    }

    println!("[info] searching keys with {} thread(s)", threads);
    let Some(key) = find_key(&puzzle, threads) else {
        bail!("no key in 1000..=9999 unscrambles {}", input.display());
    };
    println!("[ok] key={}", key);

    if let Some(out) = out {
        puzzle.unscramble(key)?;
        save(&puzzle, out)?;
    }
    Ok(())
}

/// Tries every valid key, split across `threads` workers. The first
/// worker to hit raises the flag and the rest stop.
fn find_key(puzzle: &Puzzle, threads: usize) -> Option<u16> {
    let keys: Vec<u16> = (1000..=9999)
        .filter(|&key| ScrambleKey::new(key).is_ok())
        .collect();
    let threads = threads.clamp(1, keys.len());
    let found = AtomicBool::new(false);

    std::thread::scope(|scope| {
        let workers: Vec<_> = (0..threads)
            .map(|worker| {
                let keys = &keys;
                let found = &found;
                scope.spawn(move || {
                    for &key in keys.iter().skip(worker).step_by(threads) {
                        if found.load(Ordering::Relaxed) {
                            return None;
                        }
                        if puzzle.verify_key(key).is_ok() {
                            found.store(true, Ordering::Relaxed);
                            tracing::debug!(worker, key, "key found");
                            return Some(key);
                        }
                    }
                    None
                })
            })
            .collect();

        workers
            .into_iter()
            .filter_map(|worker| worker.join().ok().flatten())
            .min()
    })
}

fn cmd_sort_sections(input: &Path, output: &Path) -> Result<()> {
    let mut puzzle = load(input)?;
    puzzle.sort_extra_sections();
    save(&puzzle, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use puz_core::{Board, Clue, ExtraSection, Timer};
    use tempfile::TempDir;

    fn mini() -> Puzzle {
        let mut puzzle = Puzzle::builder(5, 5).title("Mini").build().unwrap();
        puzzle
            .set_board(
                Board::from_solution_rows(&["BASS.", "ACHED", "STONE", "HORSE", ".REED"]).unwrap(),
            )
            .unwrap();
        for word in puzzle.words() {
            let text = format!("Clue for {}", word.text);
            puzzle.add_clue(Clue::new(text, word.num, word.x, word.y, word.direction));
        }
        puzzle
    }

    fn write(dir: &TempDir, name: &str, puzzle: &Puzzle) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, encode(puzzle).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_check() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.puz", &mini());

        let bad = dir.path().join("bad.puz");
        let mut bytes = encode(&mini()).unwrap();
        bytes[60] ^= 0x01;
        fs::write(&bad, bytes).unwrap();

        let missing = dir.path().join("missing.puz");

        assert_eq!(cmd_check(&[good.clone()]).unwrap(), 0);
        assert_eq!(cmd_check(&[good, bad, missing]).unwrap(), 2);
    }

    #[test]
    fn test_scramble_unscramble_files() {
        let dir = TempDir::new().unwrap();
        let plain = write(&dir, "plain.puz", &mini());
        let scrambled = dir.path().join("scrambled.puz");
        let restored = dir.path().join("restored.puz");

        cmd_scramble(&plain, &scrambled, 1234).unwrap();
        assert!(load(&scrambled).unwrap().is_scrambled());

        assert!(cmd_unscramble(&scrambled, &restored, 4321).is_err());
        assert!(!restored.exists());

        cmd_unscramble(&scrambled, &restored, 1234).unwrap();
        assert_eq!(fs::read(&restored).unwrap(), fs::read(&plain).unwrap());

        assert!(cmd_scramble(&scrambled, &restored, 1234).is_err());
    }

    #[test]
    fn test_find_key() {
        let mut puzzle = mini();
        puzzle.scramble(2468).unwrap();
        assert_eq!(find_key(&puzzle, 4), Some(2468));
        assert_eq!(find_key(&puzzle, 1), Some(2468));
    }

    #[test]
    fn test_crack_writes_solution() {
        let dir = TempDir::new().unwrap();
        let mut puzzle = mini();
        puzzle.scramble(1357).unwrap();
        let scrambled = write(&dir, "scrambled.puz", &puzzle);
        let out = dir.path().join("cracked.puz");

        cmd_crack(&scrambled, 3, Some(&out)).unwrap();
        assert_eq!(load(&out).unwrap(), mini());

        let plain = write(&dir, "plain.puz", &mini());
        assert!(cmd_crack(&plain, 2, None).is_err());
    }

    #[test]
    fn test_sort_sections() {
        let dir = TempDir::new().unwrap();
        let mut puzzle = mini();
        puzzle.timer = Some(Timer {
            seconds_passed: 90,
            running: true,
        });
        puzzle.add_extra_section(ExtraSection::Timer);
        puzzle.add_extra_section(ExtraSection::MarkupBoard);
        puzzle.add_extra_section(ExtraSection::RebusBoard);
        let input = write(&dir, "unsorted.puz", &puzzle);
        let output = dir.path().join("sorted.puz");

        cmd_sort_sections(&input, &output).unwrap();
        assert_eq!(
            load(&output).unwrap().extra_sections(),
            &[
                ExtraSection::RebusBoard,
                ExtraSection::Timer,
                ExtraSection::MarkupBoard
            ]
        );
    }

    #[test]
    fn test_info() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "mini.puz", &mini());
        cmd_info(&path, true).unwrap();
        assert!(cmd_info(&dir.path().join("nope.puz"), false).is_err());
    }
}
