//! CLI interface for format conversion
use std::path::Path;

use crate::converter::convert_resource;
use crate::formats::common::ResourceFormat;

pub fn execute(source: &Path, destination: &Path, output_format: Option<ResourceFormat>) -> anyhow::Result<()> {
    println!("Converting {} to {}", source.display(), destination.display());
    let detected = convert_resource(source, destination, output_format)?;
    println!(
        "Converted {} -> {}",
        detected,
        output_format.unwrap_or_else(|| crate::converter::default_target(detected))
    );
    Ok(())
}
