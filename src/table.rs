use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use camino::Utf8Path;
use flate2::read::GzDecoder;
use tempfile::Builder;

use crate::domain::{
    Entity, Field, FieldValue, OUTPUT_COLUMNS, Record, SynonymSet, SynonymSource,
};
use crate::error::IntegrateError;
use crate::synonyms::SynonymTable;

/// Opens a table for reading, decompressing `.gz` files on the fly.
pub fn open_table(path: &Path) -> Result<Box<dyn BufRead>, IntegrateError> {
    if !path.exists() {
        return Err(IntegrateError::MissingInput(path.to_path_buf()));
    }
    let file = File::open(path)
        .map_err(|err| IntegrateError::Filesystem(format!("open {}: {err}", path.display())))?;
    let is_gzip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    if is_gzip {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub fn read_compound_table(path: &Path) -> Result<Vec<Record>, IntegrateError> {
    let reader = open_table(path)?;
    parse_compound_table(reader, path)
}

/// Parses a tab-separated compound table whose header names the fields.
///
/// Empty cells are absent fields. Cells containing `|` are split into a set,
/// accepting both `|` and `||` as separators.
pub fn parse_compound_table<R: BufRead>(
    reader: R,
    origin: &Path,
) -> Result<Vec<Record>, IntegrateError> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line.map_err(|err| read_error(origin, err))?,
        None => return Err(IntegrateError::MissingHeader(origin.to_path_buf())),
    };
    let columns = split_row(&header)
        .map(|name| {
            let name = name.trim();
            (!name.is_empty()).then(|| Field::from_header(name))
        })
        .collect::<Vec<_>>();
    let mut seen = HashSet::new();
    if let Some(duplicate) = columns.iter().flatten().find(|field| !seen.insert(*field)) {
        return Err(malformed(
            origin,
            1,
            format!("column {duplicate} appears more than once in header"),
        ));
    }

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        let line = line.map_err(|err| read_error(origin, err))?;
        if line.trim().is_empty() {
            continue;
        }
        let line_number = index + 2;
        let mut record = Vec::new();
        for (position, cell) in split_row(&line).enumerate() {
            let Some(value) = parse_cell(cell) else {
                continue;
            };
            match columns.get(position) {
                Some(Some(field)) => record.push((field.clone(), value)),
                Some(None) => {
                    return Err(malformed(
                        origin,
                        line_number,
                        format!("value in unnamed column {}", position + 1),
                    ));
                }
                None => {
                    return Err(malformed(
                        origin,
                        line_number,
                        format!(
                            "{} columns in header but value in column {}",
                            columns.len(),
                            position + 1
                        ),
                    ));
                }
            }
        }
        records.push(record.into_iter().collect());
    }
    Ok(records)
}

fn split_row(line: &str) -> impl Iterator<Item = &str> {
    line.trim_end_matches(['\r', '\n']).split('\t')
}

fn parse_cell(cell: &str) -> Option<FieldValue> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if !cell.contains('|') {
        return Some(FieldValue::from(cell));
    }
    let members = cell
        .split('|')
        .map(str::trim)
        .filter(|member| !member.is_empty())
        .collect::<Vec<_>>();
    (!members.is_empty()).then(|| FieldValue::set(members))
}

pub fn read_synonym_table(
    path: &Path,
    source: SynonymSource,
) -> Result<SynonymTable, IntegrateError> {
    let reader = open_table(path)?;
    parse_synonym_table(reader, source, path)
}

/// Parses `<id>\t<synonym>\t<synonym>...` lines after a header line.
pub fn parse_synonym_table<R: BufRead>(
    reader: R,
    source: SynonymSource,
    origin: &Path,
) -> Result<SynonymTable, IntegrateError> {
    let mut table = SynonymTable::new(source);
    for line in reader.lines().skip(1) {
        let line = line.map_err(|err| read_error(origin, err))?;
        let mut cells = split_row(&line).map(str::trim);
        let Some(id) = cells.next().filter(|id| !id.is_empty()) else {
            continue;
        };
        table.extend(id, cells.filter(|name| !name.is_empty()));
    }
    Ok(table)
}

/// Renders entities under the fixed integrated-table header.
pub fn render_compound_table(entities: &[Entity]) -> String {
    let mut out = OUTPUT_COLUMNS
        .iter()
        .map(Field::as_str)
        .collect::<Vec<_>>()
        .join("\t");
    out.push('\n');
    for entity in entities {
        let row = OUTPUT_COLUMNS
            .iter()
            .map(|field| entity.get(field).map(FieldValue::render).unwrap_or_default())
            .collect::<Vec<_>>();
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}

pub fn render_synonym_table<'a, I>(rows: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a SynonymSet)>,
{
    let mut out = String::from("InChIKey\tSynonym1\tSynonym2\t...\n");
    for (key, synonyms) in rows {
        if synonyms.is_empty() {
            continue;
        }
        out.push_str(key);
        for name in synonyms.iter() {
            out.push('\t');
            out.push_str(name);
        }
        out.push('\n');
    }
    out
}

/// Writes `content` next to `path` and renames it into place.
pub fn write_atomic(path: &Utf8Path, content: &str) -> Result<(), IntegrateError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| IntegrateError::Filesystem(err.to_string()))?;
    let mut temp = Builder::new()
        .prefix("metab-int")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| IntegrateError::Filesystem(err.to_string()))?;
    temp.write_all(content.as_bytes())
        .map_err(|err| IntegrateError::Filesystem(format!("write {path}: {err}")))?;
    temp.persist(path.as_std_path())
        .map_err(|err| IntegrateError::Filesystem(format!("persist {path}: {err}")))?;
    Ok(())
}

fn read_error(origin: &Path, err: std::io::Error) -> IntegrateError {
    IntegrateError::Filesystem(format!("read {}: {err}", origin.display()))
}

fn malformed(origin: &Path, line: usize, message: String) -> IntegrateError {
    IntegrateError::MalformedRow {
        path: origin.to_path_buf(),
        line,
        message,
    }
}
