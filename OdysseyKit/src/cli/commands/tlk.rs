//! CLI command for talk table lookups

use std::path::Path;

use crate::formats::tlk::TalkTable;

pub fn execute(source: &Path, stringrefs: &[i32], sound: bool) -> anyhow::Result<()> {
    let table = TalkTable::new(source);
    println!("Language: {:?}, {} entries", table.language()?, table.size()?);

    let stringrefs: Vec<i32> = if stringrefs.is_empty() {
        (0..i32::try_from(table.size()?)?).collect()
    } else {
        stringrefs.to_vec()
    };

    let resolved = table.batch(&stringrefs)?;
    for stringref in &stringrefs {
        let Some((text, resref)) = resolved.get(stringref) else {
            continue;
        };
        if sound {
            println!("{stringref}\t[{resref}]\t{text}");
        } else {
            println!("{stringref}\t{text}");
        }
    }
    Ok(())
}
