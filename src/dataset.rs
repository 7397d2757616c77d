/*!
 * Character codex records and their JSON storage.
 *
 * The whole dataset is the unit of durability: it is read once, mutated in
 * memory and rewritten wholesale on every checkpoint.
 */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::script;

/// One character entry of the codex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub media_type: String,
    pub genre: String,
    pub character_name: String,
    pub media_source: String,
    /// Translated in place
    pub description: String,
    /// Translated in place
    pub scenario: String,
    /// Keys we don't model, carried through checkpoints untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CharacterRecord {
    /// Placeholder values for prompt rendering, in field order, followed by
    /// any extra keys.
    pub fn prompt_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("media_type".to_string(), self.media_type.clone()),
            ("genre".to_string(), self.genre.clone()),
            ("character_name".to_string(), self.character_name.clone()),
            ("media_source".to_string(), self.media_source.clone()),
            ("description".to_string(), self.description.clone()),
            ("scenario".to_string(), self.scenario.clone()),
        ];
        for (key, value) in &self.extra {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            fields.push((key.clone(), rendered));
        }
        fields
    }

    /// Number of translatable fields that still lack the target script
    pub fn pending_fields(&self) -> usize {
        [&self.description, &self.scenario]
            .into_iter()
            .filter(|text| script::needs_translation(text))
            .count()
    }
}

/// How much of a dataset is still untranslated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetStatus {
    pub records: usize,
    pub pending_records: usize,
    pub pending_fields: usize,
}

impl DatasetStatus {
    pub fn of(records: &[CharacterRecord]) -> Self {
        let mut status = Self {
            records: records.len(),
            ..Self::default()
        };
        for record in records {
            let pending = record.pending_fields();
            if pending > 0 {
                status.pending_records += 1;
                status.pending_fields += pending;
            }
        }
        status
    }

    pub fn is_complete(&self) -> bool {
        self.pending_fields == 0
    }
}

/// Parse a dataset from its JSON text
pub fn parse_dataset(content: &str) -> Result<Vec<CharacterRecord>, AppError> {
    Ok(serde_json::from_str(content)?)
}

/// Serialize a dataset the way it is stored on disk (pretty, 2-space indent)
pub fn render_dataset(records: &[CharacterRecord]) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Destination for checkpoint writes
pub trait CheckpointSink {
    /// Persist the full dataset
    fn write(&mut self, records: &[CharacterRecord]) -> Result<(), AppError>;
}

/// JSON file holding the dataset; read at startup and overwritten in place
#[derive(Debug, Clone)]
pub struct DatasetFile {
    path: PathBuf,
}

impl DatasetFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record from the file
    pub fn load(&self) -> Result<Vec<CharacterRecord>, AppError> {
        let content = FileManager::read_to_string(&self.path)
            .map_err(|e| AppError::File(format!("{:#}", e)))?;
        parse_dataset(&content)
    }

    /// Overwrite the file with the given records (not atomic)
    pub fn save(&self, records: &[CharacterRecord]) -> Result<(), AppError> {
        let content = render_dataset(records)?;
        FileManager::write_to_file(&self.path, &content)
            .map_err(|e| AppError::File(format!("{:#}", e)))
    }
}

impl CheckpointSink for DatasetFile {
    fn write(&mut self, records: &[CharacterRecord]) -> Result<(), AppError> {
        self.save(records)
    }
}
