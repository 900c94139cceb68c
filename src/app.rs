use std::fs;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{Entity, Field, SynonymSet, SynonymSource, is_standard_inchikey};
use crate::error::IntegrateError;
use crate::group::group_by_field;
use crate::merge::integrate;
use crate::synonyms::{SynonymTable, annotate};
use crate::table::{
    read_compound_table, read_synonym_table, render_compound_table, render_synonym_table,
    write_atomic,
};

pub const SYNONYMS_FILE: &str = "CompoundSynonyms.txt";
pub const COMPOUNDS_FILE: &str = "CompoundData.txt";

#[derive(Debug, Clone)]
pub struct IntegrateRequest {
    pub input: Utf8PathBuf,
    pub output_prefix: Utf8PathBuf,
    pub key: Field,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrateResult {
    pub key: String,
    pub files: usize,
    pub records: usize,
    pub discarded: usize,
    pub entities: usize,
    pub merged_groups: usize,
    pub ambiguous_fields: usize,
    pub nonstandard_inchikeys: usize,
    pub output_path: String,
    pub finished_at: String,
}

#[derive(Debug, Clone)]
pub struct SynonymRequest {
    pub compounds: Utf8PathBuf,
    pub tables: Vec<(SynonymSource, Utf8PathBuf)>,
    pub output_dir: Utf8PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct SynonymResult {
    pub entities: usize,
    pub discarded: usize,
    pub with_synonyms: usize,
    pub names_filled: usize,
    pub synonyms: usize,
    pub synonyms_path: String,
    pub compounds_path: String,
    pub finished_at: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App;

impl App {
    /// Reads every table in the input folder, merges records sharing the join
    /// key and writes `<prefix>.txt`.
    pub fn integrate(
        request: &IntegrateRequest,
        sink: &dyn ProgressSink,
    ) -> Result<IntegrateResult, IntegrateError> {
        let started = Instant::now();
        let files = list_tables(&request.input)?;
        sink.event(ProgressEvent {
            message: format!("phase=Read; found {} information files", files.len()),
            elapsed: None,
        });

        let mut records = Vec::new();
        for file in &files {
            let parsed = read_compound_table(file.as_std_path())?;
            debug!(file = %file, records = parsed.len(), "read compound table");
            records.extend(parsed);
        }
        let record_count = records.len();
        info!(records = record_count, files = files.len(), "loaded records");
        sink.event(ProgressEvent {
            message: format!("phase=Read; found total number of {record_count} entries"),
            elapsed: Some(started.elapsed()),
        });

        let grouping = group_by_field(records, request.key.clone());
        if grouping.discarded() > 0 {
            warn!(
                discarded = grouping.discarded(),
                key = %request.key,
                "dropped records without join key"
            );
        }
        let (entities, stats) = integrate(&grouping);
        info!(
            entities = entities.len(),
            merged_groups = stats.merged_groups,
            ambiguous_fields = stats.ambiguous_fields,
            "merged groups"
        );
        sink.event(ProgressEvent {
            message: format!(
                "phase=Merge; {} entities from {} groups",
                entities.len(),
                stats.groups
            ),
            elapsed: Some(started.elapsed()),
        });

        let nonstandard = count_nonstandard_inchikeys(&entities);
        if nonstandard > 0 {
            warn!(count = nonstandard, "entities with non-standard InChIKey");
        }

        let output_path = Utf8PathBuf::from(format!("{}.txt", request.output_prefix));
        write_atomic(&output_path, &render_compound_table(&entities))?;
        sink.event(ProgressEvent {
            message: format!("phase=Write; wrote {output_path}"),
            elapsed: Some(started.elapsed()),
        });

        Ok(IntegrateResult {
            key: request.key.to_string(),
            files: files.len(),
            records: record_count,
            discarded: grouping.discarded(),
            entities: entities.len(),
            merged_groups: stats.merged_groups,
            ambiguous_fields: stats.ambiguous_fields,
            nonstandard_inchikeys: nonstandard,
            output_path: output_path.to_string(),
            finished_at: now_rfc3339(),
        })
    }

    /// Annotates an integrated compound table with synonyms and missing names.
    pub fn synonyms(
        request: &SynonymRequest,
        sink: &dyn ProgressSink,
    ) -> Result<SynonymResult, IntegrateError> {
        let started = Instant::now();
        let mut tables = Vec::with_capacity(request.tables.len());
        for (source, path) in &request.tables {
            let table = read_synonym_table(path.as_std_path(), *source)?;
            debug!(%source, ids = table.len(), "read synonym table");
            tables.push(table);
        }
        sink.event(ProgressEvent {
            message: format!("phase=Read; loaded {} synonym tables", tables.len()),
            elapsed: Some(started.elapsed()),
        });

        let records = read_compound_table(request.compounds.as_std_path())?;
        let grouping = group_by_field(records, Field::InchiKey);
        if grouping.discarded() > 0 {
            warn!(
                discarded = grouping.discarded(),
                "dropped compound rows without InChIKey"
            );
        }
        let (mut entities, _) = integrate(&grouping);

        let (annotated, outcome) = annotate_all(&mut entities, &tables);
        info!(
            entities = entities.len(),
            with_synonyms = outcome.with_synonyms,
            names_filled = outcome.names_filled,
            "annotated entities"
        );
        sink.event(ProgressEvent {
            message: format!(
                "phase=Annotate; {} of {} entities have synonyms",
                outcome.with_synonyms,
                entities.len()
            ),
            elapsed: Some(started.elapsed()),
        });

        let synonyms_path = request.output_dir.join(SYNONYMS_FILE);
        let compounds_path = request.output_dir.join(COMPOUNDS_FILE);
        let rows = entities
            .iter()
            .zip(&annotated)
            .map(|(entity, synonyms)| (entity.key(), synonyms));
        write_atomic(&synonyms_path, &render_synonym_table(rows))?;
        write_atomic(&compounds_path, &render_compound_table(&entities))?;
        sink.event(ProgressEvent {
            message: format!("phase=Write; wrote {synonyms_path} and {compounds_path}"),
            elapsed: Some(started.elapsed()),
        });

        Ok(SynonymResult {
            entities: entities.len(),
            discarded: grouping.discarded(),
            with_synonyms: outcome.with_synonyms,
            names_filled: outcome.names_filled,
            synonyms: outcome.synonyms,
            synonyms_path: synonyms_path.to_string(),
            compounds_path: compounds_path.to_string(),
            finished_at: now_rfc3339(),
        })
    }
}

#[derive(Debug, Default)]
struct AnnotateOutcome {
    with_synonyms: usize,
    names_filled: usize,
    synonyms: usize,
}

fn annotate_all(
    entities: &mut [Entity],
    tables: &[SynonymTable],
) -> (Vec<SynonymSet>, AnnotateOutcome) {
    let mut outcome = AnnotateOutcome::default();
    let sets: Vec<SynonymSet> = entities
        .iter_mut()
        .map(|entity| {
            let had_name = entity.name().is_some();
            let synonyms = annotate(entity, tables);
            if !synonyms.is_empty() {
                outcome.with_synonyms += 1;
                outcome.synonyms += synonyms.len();
            }
            if !had_name && entity.name().is_some() {
                outcome.names_filled += 1;
            }
            synonyms
        })
        .collect();
    (sets, outcome)
}

fn list_tables(input: &Utf8Path) -> Result<Vec<Utf8PathBuf>, IntegrateError> {
    if !input.as_std_path().exists() {
        return Err(IntegrateError::MissingInput(input.as_std_path().to_path_buf()));
    }
    let entries = fs::read_dir(input.as_std_path())
        .map_err(|err| IntegrateError::Filesystem(format!("read dir {input}: {err}")))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| IntegrateError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(path).map_err(|path| {
            IntegrateError::Filesystem(format!("non UTF-8 path {}", path.display()))
        })?;
        files.push(path);
    }
    files.sort();
    Ok(files)
}

fn count_nonstandard_inchikeys(entities: &[Entity]) -> usize {
    entities
        .iter()
        .filter(|entity| {
            entity
                .get(&Field::InchiKey)
                .map(|value| value.members().any(|key| !is_standard_inchikey(key)))
                .unwrap_or(false)
        })
        .count()
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
