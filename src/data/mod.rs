use std::{fs::File, io::BufReader, path::Path};

use crate::{data::structs::Participation, error::Result};

pub mod structs;

/// Loads the pre-sorted participation table exported by the upstream data
/// pipeline. Sorting is verified by the engine, not here.
pub fn load_participations(path: &Path) -> Result<Vec<Participation>> {
    let file = File::open(path)?;
    let participations = serde_json::from_reader(BufReader::new(file))?;

    Ok(participations)
}
