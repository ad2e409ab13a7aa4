use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{self, Context};
use clap::{Args, Parser, Subcommand};
use gpxfs::gpx::{FileEntry, Gpx};
use log::{debug, info};
use termion;

#[derive(Parser, Debug)]
#[command(version, about = "Inspect and unpack GPX (Guitar Pro 6) containers")]
struct Cli {
    /// The GPX container to operate on
    container: PathBuf,

    /// Log decoding progress (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print file contents
    Cat(CatArgs),
    /// List files
    Ls(LsArgs),
    /// Write files to a directory
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
struct CatArgs {
    files: Vec<String>,
}

#[derive(Args, Debug)]
struct LsArgs {
    #[arg(short)]
    long: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Destination directory
    #[arg(short, long = "dest", default_value = "gpx-root")]
    dir: PathBuf,

    /// Write every stored sector, including the padding past the declared size
    #[arg(long)]
    raw: bool,

    /// Files to extract (all when empty)
    files: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let gpx = Gpx::open(&cli.container)
        .with_context(|| format!("Failed to open GPX container {}", cli.container.display()))?;
    debug!("{} entries in {:?} container", gpx.entries().len(), gpx.format());
    match &cli.command {
        Command::Cat(args) => { cmd_cat(&gpx, args) },
        Command::Ls(args) => { cmd_ls(&gpx, args) },
        Command::Extract(args) => { cmd_extract(&gpx, args) },
    }
}

fn cmd_cat(gpx: &Gpx, args: &CatArgs) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    for name in &args.files {
        let data = gpx.read_file(name)
            .with_context(|| format!("Cannot read '{}'", name))?;
        stdout.write_all(data)?;
    }
    Ok(())
}

fn cmd_ls(gpx: &Gpx, args: &LsArgs) -> anyhow::Result<()> {
    if args.long {
        display_files_long(gpx.entries())
    } else {
        display_files(gpx.file_names().collect())
    }
}

fn cmd_extract(gpx: &Gpx, args: &ExtractArgs) -> anyhow::Result<()> {
    let selected: Vec<&FileEntry> = if args.files.is_empty() {
        gpx.entries().iter().collect()
    } else {
        args.files.iter()
            .map(|n| gpx.file(n).with_context(|| format!("cannot access '{}': not in container", n)))
            .collect::<anyhow::Result<_>>()?
    };

    fs::create_dir_all(&args.dir)
        .with_context(|| format!("Failed to create {}", args.dir.display()))?;
    for entry in selected {
        let path = extract_path(&args.dir, entry.name())?;
        let data = if args.raw { entry.raw_data() } else { entry.data() };
        fs::write(&path, data)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("{} ({} bytes)", path.display(), data.len());
    }
    Ok(())
}

// Entry names are flat, but refuse anything that would land outside the destination
fn extract_path(dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let file_name = Path::new(name).file_name()
        .filter(|f| f.to_str() == Some(name))
        .with_context(|| format!("Refusing to extract entry with unsafe name '{}'", name))?;
    Ok(dir.join(file_name))
}

fn display_files(files: Vec<&str>) -> anyhow::Result<()> {
    if files.is_empty() {
        return Ok(());
    }

    if termion::is_tty(&std::io::stdout()) {
        let (term_width, _) = termion::terminal_size()
            .context("Failed to read terminal size")?;
        let term_width: usize = term_width as usize;

        // The correct number of columns is somewhere between width/max_col_length and
        // width/min_col_length
        let lengths: Vec<usize> = files.iter().map(|s| s.chars().count()).collect();
        let min_columns = (term_width / (lengths.iter().max().unwrap_or(&0) + 2)).max(1);
        let max_columns = (term_width / (lengths.iter().min().unwrap_or(&0) + 2)).max(1);

        let mut columns = max_columns;
        let mut col_widths: Vec<usize> = Vec::new();
        let mut files_per_column = 0;
        while columns >= min_columns {
            files_per_column = usize::div_ceil(lengths.len(), columns);
            col_widths = (0..columns).map(|c|
                lengths.iter()
                    .skip(files_per_column * c)
                    .take(files_per_column)
                    .map(|l| *l + 3)
                    .max()
                    .unwrap_or(0)
                ).collect();
            if col_widths.iter().sum::<usize>() <= term_width || columns == 1 {
                break;
            }
            columns -= 1;
        }

        for row in 0..files_per_column {
            for (n, filename) in files.iter().skip(row).step_by(files_per_column).enumerate() {
                if n != 0 {
                    print!("   ");
                }
                print!("{:1$}", filename, col_widths[n].saturating_sub(3));
            }
            println!();
        }
    } else {
        for filename in files {
            println!("{}", filename);
        }
    }
    Ok(())
}

fn display_files_long(entries: &[FileEntry]) -> anyhow::Result<()> {
    let width = entries.iter()
        .map(|e| e.raw_data().len().max(e.declared_size() as usize).to_string().len())
        .max()
        .unwrap_or(0);
    for e in entries {
        println!("{:>w$} {:>w$} {}", e.declared_size(), e.raw_data().len(), e.name(), w = width.max(6));
    }
    Ok(())
}
