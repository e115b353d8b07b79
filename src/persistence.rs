// File: src/persistence.rs
//
// The tab-separated dictionary/history format. One header line, then one
// record per line with exactly ten fields.
use crate::core::types::{ConfidenceRange, Entry};
use crate::core::word_set::WordSet;
use crate::error::{Result, VocabError};
use log::{debug, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const HEADER: [&str; FIELD_COUNT] = [
    "id",
    "simplified",
    "traditional",
    "pronunciation",
    "meaning",
    "translation",
    "extra1",
    "extra2",
    "tag",
    "confidence",
];

pub const FIELD_COUNT: usize = 10;

/// What a load absorbed without failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

const BOM: char = '\u{feff}';

/// Any ten-field line naming `id` first and ending in the literal `tag` and
/// `confidence` columns, whatever the form columns are called.
fn is_header(line: &str) -> bool {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    fields.len() == FIELD_COUNT
        && fields[0].eq_ignore_ascii_case(HEADER[0])
        && fields[8].eq_ignore_ascii_case(HEADER[8])
        && fields[9].eq_ignore_ascii_case(HEADER[9])
}

fn parse_tag(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parses one record. `None` when the line does not have exactly ten fields.
pub fn parse_record(line: &str, range: &ConfidenceRange) -> Option<Entry> {
    let fields: Vec<&str> = line.split('\t').collect();
    let [id, primary, alternate, pronunciation, meaning, translation, extra1, extra2, tag, confidence] =
        <[&str; FIELD_COUNT]>::try_from(fields).ok()?;

    let tag = parse_tag(tag).unwrap_or_else(|| {
        warn!("Entry {}: unrecognised tag {:?}, treating as False", id, tag);
        false
    });

    Some(
        Entry::new(id, primary, alternate, range)
            .with_details(pronunciation, meaning, translation)
            .with_extras(extra1, extra2)
            .with_tag(tag)
            .with_confidence(range.parse_lenient(confidence), range),
    )
}

pub fn format_record(entry: &Entry) -> String {
    let confidence = entry.confidence().to_string();
    let fields: [&str; FIELD_COUNT] = [
        entry.id(),
        &entry.primary,
        &entry.alternate,
        &entry.pronunciation,
        &entry.meaning,
        &entry.translation,
        &entry.extra1,
        &entry.extra2,
        if entry.tag { "True" } else { "False" },
        &confidence,
    ];
    fields.join("\t")
}

impl WordSet {
    /// Reads records, skipping the header and any line without ten fields.
    /// The header, if any, is the first non-blank line.
    pub fn load<R: BufRead>(reader: R, range: &ConfidenceRange) -> io::Result<(WordSet, LoadReport)> {
        let mut set = WordSet::new();
        let mut report = LoadReport::default();
        let mut first_content = true;

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let mut line = line.strip_suffix('\r').unwrap_or(&line);
            if first_content {
                line = line.trim_start_matches(BOM);
            }
            if line.trim().is_empty() {
                continue;
            }
            if std::mem::take(&mut first_content) && is_header(line) {
                continue;
            }
            match parse_record(line, range) {
                Some(entry) => {
                    if set.upsert(entry).is_some() {
                        debug!("Line {}: duplicate id replaced earlier record", number + 1);
                    }
                    report.loaded += 1;
                }
                None => {
                    warn!(
                        "Line {}: expected {} tab-separated fields, skipping",
                        number + 1,
                        FIELD_COUNT
                    );
                    report.skipped += 1;
                }
            }
        }
        Ok((set, report))
    }

    /// Writes the header and every entry in insertion order.
    pub fn save<W: Write>(&self, writer: W) -> io::Result<()> {
        write_records(writer, self.iter())
    }

    /// Writes the header and only the tagged entries.
    pub fn save_tagged<W: Write>(&self, writer: W) -> io::Result<()> {
        write_records(writer, self.tagged())
    }
}

fn write_records<'a, W: Write>(mut writer: W, entries: impl Iterator<Item = &'a Entry>) -> io::Result<()> {
    writeln!(writer, "{}", HEADER.join("\t"))?;
    for entry in entries {
        writeln!(writer, "{}", format_record(entry))?;
    }
    writer.flush()
}

pub fn load_from_disk(path: &Path, range: &ConfidenceRange) -> Result<(WordSet, LoadReport)> {
    let file = File::open(path).map_err(|e| VocabError::io(path, e))?;
    let (set, report) =
        WordSet::load(BufReader::new(file), range).map_err(|e| VocabError::io(path, e))?;
    debug!(
        "Loaded {} entries from {} ({} skipped)",
        set.len(),
        path.display(),
        report.skipped
    );
    Ok((set, report))
}

/// Which entries a save writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveScope {
    All,
    TaggedOnly,
}

/// A fully written temp file in its target's directory, not yet in place.
pub struct StagedFile {
    temp_file: NamedTempFile,
    path: PathBuf,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renames the temp file over the target.
    pub fn commit(self) -> Result<()> {
        self.temp_file
            .persist(&self.path)
            .map_err(|e| VocabError::io(&self.path, e.error))?;
        debug!("Saved {}", self.path.display());
        Ok(())
    }
}

/// Writes `set` to a temp file beside `path` without touching `path` itself.
pub fn stage_to_disk(set: &WordSet, path: &Path, scope: SaveScope) -> Result<StagedFile> {
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| VocabError::io(parent_dir, e))?;
    {
        let writer = BufWriter::new(temp_file.as_file());
        match scope {
            SaveScope::All => set.save(writer),
            SaveScope::TaggedOnly => set.save_tagged(writer),
        }
        .map_err(|e| VocabError::io(path, e))?;
    }
    Ok(StagedFile {
        temp_file,
        path: path.to_path_buf(),
    })
}

/// Writes through a temp file in the target's directory, then renames it
/// over the target, so the file on disk is either the old or the new version.
pub fn save_to_disk(set: &WordSet, path: &Path, scope: SaveScope) -> Result<()> {
    stage_to_disk(set, path, scope)?.commit()
}
