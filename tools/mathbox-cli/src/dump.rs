//! Dump command - full detail for one object or all of them

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use mathbox::{Mesh, MeshRegistry, load_mathbox_memory};

/// Arguments for the dump command
#[derive(Args)]
pub struct DumpArgs {
    /// Directory holding the mathbox ROM images
    #[arg(long, default_value = "roms")]
    pub roms: PathBuf,

    /// Hex address of the object to dump (e.g. 3892); omit for all
    pub address: Option<String>,
}

/// Execute the dump command
pub fn execute(args: DumpArgs) -> Result<()> {
    let memory = load_mathbox_memory(&args.roms)
        .with_context(|| format!("loading ROMs from {}", args.roms.display()))?;

    let mut out = std::io::stdout().lock();
    match args.address {
        Some(text) => {
            let address = parse_address(&text)?;
            let mesh = Mesh::decode(&memory, address)
                .with_context(|| format!("no object at 0x{address:04X}"))?;
            mesh.dump(&mut out)?;
        }
        None => {
            let registry = MeshRegistry::build(&memory);
            for mesh in &registry {
                mesh.dump(&mut out)?;
            }
            writeln!(out, "{} objects", registry.len())?;
        }
    }
    Ok(())
}

fn parse_address(text: &str) -> Result<u16> {
    let digits = text.trim_start_matches("0x").trim_start_matches("0X");
    let Ok(address) = u16::from_str_radix(digits, 16) else {
        bail!("\"{text}\" is not a hex address");
    };
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("3892").unwrap(), 0x3892);
        assert_eq!(parse_address("0x3892").unwrap(), 0x3892);
        assert!(parse_address("zzz").is_err());
        assert!(parse_address("12345").is_err());
    }
}
