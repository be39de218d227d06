//! Levels command - decode the level table and print tile grids
//!
//! Grids print bottom-up: the last row of the chunk list is the far
//! end of the playfield, so the first line of output is what the
//! player reaches last.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mathbox::{Level, LevelRom, Playfield, PlayfieldDecoder};

/// Arguments for the levels command
#[derive(Args)]
pub struct LevelsArgs {
    /// Directory holding the ROM images
    #[arg(long, default_value = "roms")]
    pub roms: PathBuf,

    /// Level number to print (1-52); omit for a one-line summary of all
    #[arg(long)]
    pub level: Option<u32>,
}

/// Execute the levels command
pub fn execute(args: LevelsArgs) -> Result<()> {
    let path = args.roms.join(mathbox::rom::PROGRAM_ROM.filename);
    let bytes =
        std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let rom = LevelRom::from_bytes(&bytes)?;
    let mut decoder = PlayfieldDecoder::new(&rom)?;
    let levels = decoder.level_table()?;

    match args.level {
        Some(number) => {
            let level = levels
                .iter()
                .find(|level| level.number == number as i32)
                .with_context(|| format!("no level {number}"))?;
            print_level(level);
        }
        None => {
            for level in &levels {
                println!(
                    "{:<24} rows={:<3} reds={:<2} timer={:<3} pyramid={}",
                    level.name,
                    level.playfield.num_rows(),
                    level.num_reds,
                    level.bonus_timer_secs,
                    level.bonus_pyramid.is_some()
                );
            }
        }
    }
    Ok(())
}

fn print_level(level: &Level) {
    println!("{}", level.name);
    println!(
        "  rows={} reds={} rows_to_pyramid={} bonus_timer={}s",
        level.playfield.num_rows(),
        level.num_reds,
        level.rows_to_pyramid,
        level.bonus_timer_secs
    );
    print_grid(&level.playfield);
    if let Some(pyramid) = &level.bonus_pyramid {
        println!("  bonus pyramid @ {:04X}", pyramid.address);
        print_grid(&pyramid.playfield);
    }
}

fn print_grid(playfield: &Playfield) {
    for row in playfield.rows().rev() {
        let line: String = row.iter().map(|tile| tile.kind.glyph()).collect();
        println!("  |{line}|");
    }
}
