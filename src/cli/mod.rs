use clap::Parser;
use gomergetypes::config::{MergeConfig, DEFAULT_CONFIG_FILE};
use gomergetypes::errors::{MergeError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "gomergetypes",
    version,
    about = "Generate a Go type that multiplexes calls across several implementations"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Print the generated code to stdout before writing it
    #[arg(short, long)]
    pub verbose: bool,

    /// Fail if the output file is not up to date instead of writing it
    #[arg(long)]
    pub check: bool,
}

pub fn run(cli: &Cli) -> Result<()> {
    let config = MergeConfig::load(&cli.config)?;
    let generated = gomergetypes::generate(&config)?;

    if cli.verbose {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(generated.as_bytes())?;
        stdout.flush()?;
    }

    let target = &config.output.file;
    if cli.check {
        return check(target, &generated);
    }

    write_atomic(target, &generated)?;
    tracing::info!("wrote {}", target.display());
    Ok(())
}

fn check(target: &Path, generated: &str) -> Result<()> {
    match std::fs::read_to_string(target) {
        Ok(existing) if existing == generated => {
            tracing::info!("{} is up to date", target.display());
            Ok(())
        }
        Ok(_) => Err(MergeError::Stale {
            file: target.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(MergeError::Stale {
            file: target.to_path_buf(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Write to `<file>.tmp` beside the target, then rename over it.
fn write_atomic(target: &Path, contents: &str) -> Result<()> {
    let mut tmp = target.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&tmp, contents)?;
    if let Err(e) = std::fs::rename(&tmp, target) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
