//! Persisted optimization results.
//!
//! Records live as one JSON file per identifier. The schedule is stored zlib-compressed
//! and hex-encoded, so that a record stays small however long the season is.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use bon::Builder;
use chrono::NaiveDate;
use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    core::table::ScheduleTable,
    prelude::*,
    quantity::{area::SquareMetres, water::Litres},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Builder)]
pub struct SimulationRecord {
    #[builder(into, default = Uuid::new_v4().to_string())]
    pub id: String,

    /// Whoever requested the simulation, if known.
    #[builder(into)]
    pub owner: Option<String>,

    #[builder(into)]
    pub crop_type: String,

    /// Growth stage at the start date, informational.
    #[builder(default)]
    pub crop_stage: u32,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_water: Litres,
    pub field_size: SquareMetres,

    #[serde(with = "compressed")]
    pub schedule: ScheduleTable,

    pub harvest_date: NaiveDate,
}

mod compressed {
    use serde::{Deserializer, Serializer, de::Error as _, ser::Error as _};

    use super::*;

    pub fn serialize<S: Serializer>(table: &ScheduleTable, serializer: S) -> Result<S::Ok, S::Error> {
        let bytes = compress(table).map_err(S::Error::custom)?;
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ScheduleTable, D::Error> {
        let bytes = hex::decode(String::deserialize(deserializer)?).map_err(D::Error::custom)?;
        decompress(&bytes).map_err(D::Error::custom)
    }

    fn compress(table: &ScheduleTable) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        serde_json::to_writer(&mut encoder, table)?;
        Ok(encoder.finish()?)
    }

    fn decompress(bytes: &[u8]) -> Result<ScheduleTable> {
        Ok(serde_json::from_reader(ZlibDecoder::new(bytes))?)
    }
}

/// Directory of records with create-or-replace semantics.
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create `{}`", root.display()))?;
        Ok(Self { root })
    }

    /// Store the record, replacing any previous one with the same identifier.
    ///
    /// Returns `true` when a record got replaced.
    #[instrument(skip_all, fields(id = %record.id))]
    pub fn upsert(&self, record: &SimulationRecord) -> Result<bool> {
        let path = self.path(&record.id)?;
        let is_replaced = path.exists();

        write_atomically(&path, record)?;
        info!(is_replaced, "stored");
        Ok(is_replaced)
    }

    pub fn get(&self, id: &str) -> Result<Option<SimulationRecord>> {
        let path = self.path(id)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error).context(format!("failed to open `{}`", path.display())),
        };
        let record = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("malformed record `{}`", path.display()))?;
        Ok(Some(record))
    }

    /// Records of the owner, sorted by the start date.
    pub fn list_by_owner(&self, owner: &str) -> Result<Vec<SimulationRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_none_or(|extension| extension != "json") {
                continue;
            }
            let record: SimulationRecord = serde_json::from_reader(BufReader::new(File::open(&path)?))
                .with_context(|| format!("malformed record `{}`", path.display()))?;
            if record.owner.as_deref() == Some(owner) {
                records.push(record);
            }
        }
        records.sort_by_key(|record| record.start_date);
        Ok(records)
    }

    fn path(&self, id: &str) -> Result<PathBuf> {
        ensure!(
            !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "invalid record identifier `{id}`",
        );
        Ok(self.root.join(format!("{id}.json")))
    }
}

/// Write aside and rename, so that readers never see a partial file.
///
/// The temporary file is removed when writing fails.
fn write_atomically<T: Serialize>(path: &Path, value: &T) -> Result {
    let temporary_path = path.with_extension("json.tmp");
    let written = File::create(&temporary_path).map_err(Error::from).and_then(|file| {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        Ok(())
    });
    if let Err(error) = written {
        if let Err(remove_error) = fs::remove_file(&temporary_path) {
            debug!(%remove_error, "failed to remove the temporary file");
        }
        return Err(error.context(format!("failed to write `{}`", temporary_path.display())));
    }
    fs::rename(&temporary_path, path)
        .with_context(|| format!("failed to write `{}`", path.display()))
}
