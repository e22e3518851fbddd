use anyhow::{bail, Result};
use colored::Colorize;
use std::io::{self, BufRead, Write};

use crate::config::Config;
use crate::marketplace::{Marketplace, MARKETPLACES};

/// Run the init command - interactively create a config file
pub fn run(force: bool) -> Result<()> {
    let config_path = Config::config_path()?;

    // Check if config already exists
    if config_path.exists() && !force {
        eprintln!(
            "{}: Config already exists at {}",
            "Error".red().bold(),
            config_path.display()
        );
        eprintln!();
        eprintln!("Use {} to overwrite.", "--force".cyan());
        bail!("Config file already exists");
    }

    println!("{}", "seriesctl configuration".bold());
    println!();
    println!(
        "This will create a config file at: {}",
        config_path.display().to_string().cyan()
    );
    println!();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    println!("{}", "Step 1: Choose your marketplace".bold());
    println!();
    let marketplace = choose_marketplace(&mut input, &mut output)?;

    println!();
    println!("{}", "Step 2: Series to ignore".bold());
    println!();
    let ignored = prompt_ignored_series(&mut input, &mut output)?;

    let mut config = Config::default();
    config.user.marketplace = Some(marketplace.code.to_string());
    config.ignore.series = ignored;
    config.save_to(&config_path)?;

    println!();
    println!(
        "{} Config written to {}",
        "✓".green(),
        config_path.display()
    );
    println!();
    println!("You can now use:");
    println!(
        "  {} - store your access token",
        "seriesctl login".cyan()
    );
    println!(
        "  {} - check your series for new releases",
        "seriesctl new".cyan()
    );

    Ok(())
}

/// Prompt until a known marketplace code is entered
pub fn choose_marketplace<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Marketplace> {
    writeln!(output, "Please choose a marketplace:")?;
    for marketplace in MARKETPLACES {
        writeln!(output, "  {}", marketplace)?;
    }

    loop {
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("No marketplace selected");
        }

        match Marketplace::from_code(line.trim()) {
            Ok(marketplace) => return Ok(marketplace),
            Err(e) => {
                if !line.trim().is_empty() {
                    writeln!(output, "{}", e)?;
                }
            }
        }
    }
}

/// Comma-separated series titles; empty input means none
fn prompt_ignored_series<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Vec<String>> {
    writeln!(output, "New releases in these series will not be reported.")?;
    write!(output, "Series titles, comma separated [none]: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(parse_series_list(&line))
}

fn parse_series_list(line: &str) -> Vec<String> {
    line.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
