//! Meshes command - list every decodable object

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mathbox::{CpuBankAddress, MeshRegistry, load_mathbox_memory};

/// Arguments for the meshes command
#[derive(Args)]
pub struct MeshesArgs {
    /// Directory holding the mathbox ROM images
    #[arg(long, default_value = "roms")]
    pub roms: PathBuf,
}

/// Execute the meshes command
pub fn execute(args: MeshesArgs) -> Result<()> {
    let memory = load_mathbox_memory(&args.roms)
        .with_context(|| format!("loading ROMs from {}", args.roms.display()))?;
    let registry = MeshRegistry::build(&memory);

    println!("{} objects found", registry.len());
    for mesh in &registry {
        let shaded = mesh.shaded_surfaces().count();
        println!(
            "  0x{:04X} ({})  surfaces={:<3}  shaded={:<3}  vertices @ 0x{:04X}",
            mesh.address(),
            CpuBankAddress::from(mesh.address()),
            mesh.surfaces().len(),
            shaded,
            mesh.vertex_base()
        );
    }
    Ok(())
}
