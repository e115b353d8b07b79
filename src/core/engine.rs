use crate::config::EngineConfig;
use crate::core::scanner::{expand_corpus_path, Corpus, CorpusScanner, ThresholdMode};
use crate::core::word_set::WordSet;
use crate::error::{Result, VocabError};
use crate::history::HistoryMerger;
use crate::persistence::{load_from_disk, stage_to_disk, SaveScope};
use crate::review::{ReviewOutcome, ReviewPrompter, ReviewSampler, ReviewSession};
use log::{debug, info};
use rand::Rng;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryMode {
    Enabled(PathBuf),
    Disabled,
}

/// Everything one run needs to know. Built through `RunOptions::new`, which
/// rejects bad numbers before any file is touched.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub corpus_paths: Vec<PathBuf>,
    pub dictionary_path: PathBuf,
    pub required_count: usize,
    pub sample_size: usize,
    pub history: HistoryMode,
    /// Falls back to the midpoint of the configured confidence range.
    pub confidence_threshold: Option<i64>,
    pub threshold_mode: ThresholdMode,
    pub tagged_output: Option<PathBuf>,
    pub write_dictionary: bool,
}

impl RunOptions {
    pub fn new(
        corpus_paths: Vec<PathBuf>,
        dictionary_path: impl Into<PathBuf>,
        required_count: i64,
        sample_size: i64,
    ) -> Result<Self> {
        let required_count =
            usize::try_from(required_count).map_err(|_| VocabError::InvalidThreshold(required_count))?;
        if sample_size <= 0 {
            return Err(VocabError::InvalidSampleSize(sample_size));
        }
        if corpus_paths.is_empty() {
            return Err(VocabError::InvalidConfig("at least one corpus path is required".into()));
        }
        Ok(Self {
            corpus_paths,
            dictionary_path: dictionary_path.into(),
            required_count,
            sample_size: sample_size as usize,
            history: HistoryMode::Disabled,
            confidence_threshold: None,
            threshold_mode: ThresholdMode::default(),
            tagged_output: None,
            write_dictionary: false,
        })
    }

    pub fn with_history(mut self, path: impl Into<PathBuf>) -> Self {
        self.history = HistoryMode::Enabled(path.into());
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: i64) -> Self {
        self.confidence_threshold = Some(threshold);
        self
    }

    pub fn with_threshold_mode(mut self, mode: ThresholdMode) -> Self {
        self.threshold_mode = mode;
        self
    }

    pub fn with_tagged_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.tagged_output = Some(path.into());
        self
    }

    pub fn with_dictionary_write(mut self) -> Self {
        self.write_dictionary = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub entries: usize,
    pub skipped_lines: usize,
    pub sources: usize,
    pub tagged: usize,
    pub suppressed: usize,
    pub sampled: usize,
    pub reviewed: usize,
    pub aborted: bool,
    pub history_entries: usize,
}

/// A run whose preconditions have all passed and whose inputs are in memory.
#[derive(Debug)]
pub struct PreparedRun {
    pub options: RunOptions,
    pub dictionary: WordSet,
    pub history: WordSet,
    pub corpora: Vec<Corpus>,
    pub summary: RunSummary,
}

pub struct VocabEngine {
    config: EngineConfig,
    session: ReviewSession,
}

impl VocabEngine {
    pub fn new(config: EngineConfig) -> Self {
        debug!("Engine config: {:?}", config);
        Self {
            session: ReviewSession::new(config.confidence),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn confidence_threshold(&self, options: &RunOptions) -> i64 {
        options
            .confidence_threshold
            .unwrap_or_else(|| self.config.default_confidence_threshold())
    }

    /// Checks every precondition, then loads the dictionary, history and corpora.
    /// Nothing is written here, so a failure leaves every file as it was.
    pub fn prepare(&self, options: RunOptions) -> Result<PreparedRun> {
        // 1. Corpus paths, with directories expanded
        let mut corpus_files = Vec::new();
        for path in &options.corpus_paths {
            corpus_files.extend(expand_corpus_path(path)?);
        }

        // 2. Dictionary
        if !options.dictionary_path.is_file() {
            return Err(VocabError::MissingDictionary(options.dictionary_path.clone()));
        }

        // 3. History
        if let HistoryMode::Enabled(path) = &options.history {
            check_history_access(path)?;
        }

        // 4. Tagged snapshot and dictionary rewrite destinations
        let output_denied = |path: &Path| {
            let path = path.to_path_buf();
            move |reason: String| VocabError::OutputAccess {
                path: path.clone(),
                reason,
            }
        };
        if let Some(path) = &options.tagged_output {
            check_writable_target(path, output_denied(path))?;
        }
        if options.write_dictionary {
            check_writable_target(&options.dictionary_path, output_denied(&options.dictionary_path))?;
        }

        let range = self.config.confidence;
        let (dictionary, report) = load_from_disk(&options.dictionary_path, &range)?;
        let history = match &options.history {
            HistoryMode::Enabled(path) if path.exists() => load_from_disk(path, &range)?.0,
            _ => WordSet::new(),
        };
        let corpora = corpus_files
            .iter()
            .map(|path| Corpus::from_path(path))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Loaded {} entries, {} history entries, {} corpus source(s)",
            dictionary.len(),
            history.len(),
            corpora.len()
        );

        let summary = RunSummary {
            entries: dictionary.len(),
            skipped_lines: report.skipped,
            sources: corpora.len(),
            history_entries: history.len(),
            ..RunSummary::default()
        };
        Ok(PreparedRun {
            options,
            dictionary,
            history,
            corpora,
            summary,
        })
    }

    /// Tags the dictionary against the corpora, then suppresses entries the
    /// history already knows with confidence.
    pub fn tag(&self, run: &mut PreparedRun) {
        let scanner = CorpusScanner::new(run.options.threshold_mode);
        scanner.tag_pass(&mut run.dictionary, &run.corpora, run.options.required_count);

        if let HistoryMode::Enabled(_) = run.options.history {
            let merger = HistoryMerger::new(self.confidence_threshold(&run.options), self.config.confidence);
            let adopted = merger.adopt_history_confidence(&mut run.dictionary, &run.history);
            let suppressed = merger.suppress_confident(&mut run.dictionary, &run.history);
            debug!("Adopted {} history confidences", adopted);
            info!(
                "Suppressed {} entries known above confidence {}",
                suppressed,
                merger.confidence_threshold()
            );
            run.summary.suppressed = suppressed;
        }
        run.summary.tagged = run.dictionary.tagged_count();
    }

    /// Samples tagged entries, runs the review and writes the new confidences
    /// back into the dictionary.
    pub fn review<R: Rng, P: ReviewPrompter>(
        &self,
        run: &mut PreparedRun,
        sampler: &mut ReviewSampler<R>,
        prompter: &mut P,
    ) -> Result<ReviewOutcome> {
        let mut sample = sampler.select_random(run.dictionary.tagged(), run.options.sample_size);
        run.summary.sampled = sample.len();
        debug!(
            "Sampled: {:?}",
            sample.iter().map(|e| e.id()).collect::<Vec<_>>()
        );

        let outcome = self.session.run(&mut sample, prompter)?;
        for (id, confidence) in &outcome.reviewed {
            if !run.dictionary.set_confidence(id, *confidence, &self.config.confidence) {
                debug!("Confidence {} for {} was not written back", confidence, id);
            }
        }
        run.summary.reviewed = outcome.reviewed.len();
        run.summary.aborted = outcome.aborted;
        Ok(outcome)
    }

    /// Folds tagged entries into history and writes every requested file.
    /// Every file is written to a temp file first; targets are only replaced
    /// once all of them were written, history last.
    pub fn persist(&self, run: &mut PreparedRun) -> Result<RunSummary> {
        let mut staged = Vec::new();
        if let Some(path) = &run.options.tagged_output {
            staged.push(stage_to_disk(&run.dictionary, path, SaveScope::TaggedOnly)?);
            info!("Writing {} tagged entries to {}", run.summary.tagged, path.display());
        }
        if run.options.write_dictionary {
            staged.push(stage_to_disk(&run.dictionary, &run.options.dictionary_path, SaveScope::All)?);
            info!("Saving dictionary to {}", run.options.dictionary_path.display());
        }
        if let HistoryMode::Enabled(path) = &run.options.history {
            let merger = HistoryMerger::new(self.confidence_threshold(&run.options), self.config.confidence);
            let folded = merger.fold_into_history(&run.dictionary, &mut run.history);
            staged.push(stage_to_disk(&run.history, path, SaveScope::All)?);
            info!("Folding {} entries into history at {}", folded, path.display());
        }
        run.summary.history_entries = run.history.len();

        for file in staged {
            file.commit()?;
        }
        Ok(run.summary.clone())
    }

    pub fn run<R: Rng, P: ReviewPrompter>(
        &self,
        options: RunOptions,
        sampler: &mut ReviewSampler<R>,
        prompter: &mut P,
    ) -> Result<RunSummary> {
        let mut run = self.prepare(options)?;
        self.tag(&mut run);
        self.review(&mut run, sampler, prompter)?;
        self.persist(&mut run)
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn check_history_access(path: &Path) -> Result<()> {
    let denied = |reason: String| VocabError::HistoryAccess {
        path: path.to_path_buf(),
        reason,
    };
    if path.exists() && !path.is_dir() {
        File::open(path).map_err(|e| denied(format!("not readable: {e}")))?;
    }
    check_writable_target(path, denied)?;
    if !path.exists() {
        debug!("History {} does not exist yet; starting empty", path.display());
    }
    Ok(())
}

/// An existing target must be a writable file; a new one needs a writable
/// parent directory.
fn check_writable_target<F>(path: &Path, denied: F) -> Result<()>
where
    F: Fn(String) -> VocabError,
{
    if path.exists() {
        if path.is_dir() {
            return Err(denied("path is a directory".into()));
        }
        OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| denied(format!("not writable: {e}")))?;
    }

    let dir = parent_dir(path);
    let metadata = fs::metadata(dir).map_err(|e| denied(format!("parent directory unavailable: {e}")))?;
    if !metadata.is_dir() {
        return Err(denied("parent is not a directory".into()));
    }
    if metadata.permissions().readonly() {
        return Err(denied("parent directory is read-only".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::tests::ScriptedPrompter;

    const DICTIONARY: &str = "id\tsimplified\ttraditional\tpronunciation\tmeaning\ttranslation\textra1\textra2\ttag\tconfidence\n\
001\t你\t妳\tnǐ\tyou\tyou (singular)\t\t\tFalse\t1\n\
002\t好\t\thǎo\tgood\tgood\t\t\tFalse\t1\n";

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(corpus: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("words.tsv"), DICTIONARY).unwrap();
            fs::write(dir.path().join("text.txt"), corpus).unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn options(&self, required: i64) -> RunOptions {
            RunOptions::new(vec![self.path("text.txt")], self.path("words.tsv"), required, 5).unwrap()
        }
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let result = RunOptions::new(vec![PathBuf::from("t.txt")], "w.tsv", -1, 5);
        assert!(matches!(result, Err(VocabError::InvalidThreshold(-1))));
    }

    #[test]
    fn non_positive_sample_size_is_rejected() {
        let result = RunOptions::new(vec![PathBuf::from("t.txt")], "w.tsv", 1, 0);
        assert!(matches!(result, Err(VocabError::InvalidSampleSize(0))));
    }

    #[test]
    fn missing_dictionary_is_fatal() {
        let fixture = Fixture::new("你好");
        let options = RunOptions::new(vec![fixture.path("text.txt")], fixture.path("absent.tsv"), 1, 5).unwrap();
        let result = VocabEngine::new(EngineConfig::default()).prepare(options);
        assert!(matches!(result, Err(VocabError::MissingDictionary(_))));
    }

    #[test]
    fn missing_corpus_is_fatal() {
        let fixture = Fixture::new("你好");
        let options = RunOptions::new(vec![fixture.path("absent.txt")], fixture.path("words.tsv"), 1, 5).unwrap();
        let result = VocabEngine::new(EngineConfig::default()).prepare(options);
        assert!(matches!(result, Err(VocabError::MissingCorpus(_))));
    }

    #[test]
    fn history_directory_is_fatal() {
        let fixture = Fixture::new("你好");
        let options = fixture.options(1).with_history(fixture.dir.path());
        let result = VocabEngine::new(EngineConfig::default()).prepare(options);
        assert!(matches!(result, Err(VocabError::HistoryAccess { .. })));
    }

    #[test]
    fn read_only_history_is_fatal() {
        let fixture = Fixture::new("你好");
        let history = fixture.path("history.tsv");
        fs::write(&history, "").unwrap();
        let mut permissions = fs::metadata(&history).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&history, permissions).unwrap();
        if OpenOptions::new().append(true).open(&history).is_ok() {
            // Running with privileges that ignore file modes.
            return;
        }

        let options = fixture.options(1).with_history(&history);
        let result = VocabEngine::new(EngineConfig::default()).prepare(options);
        assert!(matches!(result, Err(VocabError::HistoryAccess { .. })));
    }

    #[test]
    fn tagged_output_directory_is_fatal() {
        let fixture = Fixture::new("你好");
        fs::create_dir(fixture.path("out")).unwrap();
        let options = fixture.options(1).with_tagged_output(fixture.path("out"));
        let result = VocabEngine::new(EngineConfig::default()).prepare(options);
        assert!(matches!(result, Err(VocabError::OutputAccess { .. })));
    }

    #[test]
    fn tagged_output_needs_existing_parent() {
        let fixture = Fixture::new("你好");
        let options = fixture.options(1).with_tagged_output(fixture.path("absent/tagged.tsv"));
        let result = VocabEngine::new(EngineConfig::default()).prepare(options);
        assert!(matches!(result, Err(VocabError::OutputAccess { .. })));
    }

    #[test]
    fn read_only_dictionary_rejects_rewrite() {
        let fixture = Fixture::new("你好");
        let words = fixture.path("words.tsv");
        let mut permissions = fs::metadata(&words).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&words, permissions).unwrap();
        if OpenOptions::new().append(true).open(&words).is_ok() {
            return;
        }

        let engine = VocabEngine::new(EngineConfig::default());
        assert!(engine.prepare(fixture.options(1)).is_ok());
        let result = engine.prepare(fixture.options(1).with_dictionary_write());
        assert!(matches!(result, Err(VocabError::OutputAccess { .. })));
    }

    #[test]
    fn persist_replaces_files_only_after_all_are_written() {
        let fixture = Fixture::new("你好");
        let engine = VocabEngine::new(EngineConfig::default());
        let options = fixture
            .options(1)
            .with_history(fixture.path("history.tsv"))
            .with_tagged_output(fixture.path("tagged.tsv"));
        let mut run = engine.prepare(options).unwrap();
        engine.tag(&mut run);
        // Output directory vanishes between prepare and persist.
        run.options.tagged_output = Some(fixture.path("gone/tagged.tsv"));

        assert!(engine.persist(&mut run).is_err());
        assert!(!fixture.path("history.tsv").exists());
    }

    #[test]
    fn new_history_file_starts_empty() {
        let fixture = Fixture::new("你好");
        let options = fixture.options(1).with_history(fixture.path("history.tsv"));
        let run = VocabEngine::new(EngineConfig::default()).prepare(options).unwrap();
        assert!(run.history.is_empty());
        assert!(!fixture.path("history.tsv").exists());
    }

    #[test]
    fn tag_applies_threshold() {
        let fixture = Fixture::new("你好你好");
        let engine = VocabEngine::new(EngineConfig::default());

        let mut run = engine.prepare(fixture.options(2)).unwrap();
        engine.tag(&mut run);
        assert_eq!(run.summary.tagged, 2);

        let mut run = engine.prepare(fixture.options(3)).unwrap();
        engine.tag(&mut run);
        assert_eq!(run.summary.tagged, 0);
    }

    #[test]
    fn review_writes_back_and_history_folds() {
        let fixture = Fixture::new("你好你好");
        let engine = VocabEngine::new(EngineConfig::default());
        let options = fixture.options(2).with_history(fixture.path("history.tsv"));
        let mut prompter = ScriptedPrompter::answering(&["5", "5"]);
        let summary = engine
            .run(options, &mut ReviewSampler::seeded(3), &mut prompter)
            .unwrap();
        assert_eq!(summary.reviewed, 2);
        assert_eq!(summary.history_entries, 2);

        let (history, _) = load_from_disk(&fixture.path("history.tsv"), &EngineConfig::default().confidence).unwrap();
        assert!(history.iter().all(|e| e.confidence() == 5 && e.tag));
    }
}
