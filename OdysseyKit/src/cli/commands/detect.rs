//! CLI command for format detection

use std::path::PathBuf;

use crate::converter::detect_resource;

pub fn execute(files: &[PathBuf]) -> anyhow::Result<()> {
    for file in files {
        let data = std::fs::read(file)?;
        println!("{}\t{}", detect_resource(&data), file.display());
    }
    Ok(())
}
