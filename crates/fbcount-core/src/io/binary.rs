//! Length-prefixed binary persistence for between-stage tables.
//!
//! Spec §9 notes that the reference's Python pickle format is an
//! implementation detail the spec does not constrain; this crate uses
//! `bincode` instead, serializing through `serde`.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::Result;

pub fn write<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, value)?;
    Ok(())
}

pub fn read<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = std::fs::File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    Ok(bincode::deserialize_from(reader)?)
}
