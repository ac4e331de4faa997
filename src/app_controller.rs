use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::converter::{Converter, WorkbookImport};
use crate::feedback::FeedbackAnnotator;
use crate::file_utils::{DirectorySink, FileManager, FileSink, FileSource, PresetLocations, Selection};
use crate::package_builder::PackageBuilder;
use crate::session::{self, ReviewSession};
use crate::spreadsheet_codec;
use crate::translation_unit::LanguageDocument;
use crate::xliff_codec::DEFAULT_DOCUMENT_NAME;

// @module: Application controller for conversion, review and packaging runs

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls"];
const XLIFF_EXTENSIONS: &[&str] = &["xlf", "xliff"];

/// What a run wrote, skipped and failed on
#[derive(Debug, Default)]
pub struct RunSummary {
    // @field: Files written, in order
    pub written: Vec<PathBuf>,
    // @field: Outputs not saved because no location was chosen
    pub skipped: usize,
    // @field: "<item>: <error>" for every failed item
    pub failures: Vec<String>,
    // @field: Wall time of the run
    pub duration: Duration,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn fail(&mut self, item: &str, reason: impl std::fmt::Display) {
        error!("{}: {}", item, reason);
        self.failures.push(format!("{}: {}", item, reason));
    }
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    converter: Converter,
    builder: PackageBuilder,
    session: ReviewSession,
    source: Box<dyn FileSource + Send + Sync>,
    sink: Box<dyn FileSink + Send + Sync>,
    directory: Box<dyn DirectorySink + Send + Sync>,
}

impl Controller {
    // @method: Controller writing into the current directory
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_locations(config, PresetLocations::new(None, PathBuf::from("."), false))
    }

    // @method: Controller whose locations come from the command line
    pub fn with_locations(config: Config, locations: PresetLocations) -> Result<Self> {
        Self::with_capabilities(
            config,
            Box::new(locations.clone()),
            Box::new(locations.clone()),
            Box::new(locations),
        )
    }

    // @method: Controller with caller-supplied location capabilities
    pub fn with_capabilities(
        config: Config,
        source: Box<dyn FileSource + Send + Sync>,
        sink: Box<dyn FileSink + Send + Sync>,
        directory: Box<dyn DirectorySink + Send + Sync>,
    ) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        debug!("Language tag style: {}", config.describe_tag_style());

        Ok(Self {
            converter: Converter::new(&config.conversion),
            builder: PackageBuilder::new(&config.package),
            session: ReviewSession::new(),
            config,
            source,
            sink,
            directory,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    /// Export a workbook, or every workbook in a directory, to XLIFF files
    pub async fn export(&self, input: &Path) -> Result<RunSummary> {
        let start_time = Instant::now();
        let inputs = FileManager::collect_inputs(input, WORKBOOK_EXTENSIONS)?;
        if inputs.is_empty() {
            warn!("No workbooks found in {:?}", input);
        }

        let progress_bar = Self::batch_progress_bar(inputs.len() as u64, "workbooks");
        let tick = progress_bar.clone();
        let report = self
            .converter
            .export_batch(inputs, move |done, _| tick.set_position(done as u64))
            .await;
        progress_bar.finish_and_clear();

        let mut summary = RunSummary::default();
        for outcome in report.outcomes {
            match outcome.result {
                Ok(exports) => {
                    for export in exports {
                        self.save(&export.file_name, export.xml.as_bytes(), &mut summary);
                    }
                }
                Err(e) => summary.fail(&outcome.item, e),
            }
        }

        self.finish("Export", summary, start_time)
    }

    /// Import an XLIFF file, or every XLIFF file in a directory, into workbooks.
    ///
    /// With `combine`, all documents go into one workbook with a sheet per
    /// language. The last workbook produced is kept for review.
    pub async fn import(&self, input: &Path, combine: bool) -> Result<RunSummary> {
        let start_time = Instant::now();
        let inputs = FileManager::collect_inputs(input, XLIFF_EXTENSIONS)?;
        if inputs.is_empty() {
            warn!("No XLIFF files found in {:?}", input);
        }

        let progress_bar = Self::batch_progress_bar(inputs.len() as u64, "files");
        let tick = progress_bar.clone();
        let mut summary = RunSummary::default();

        if combine {
            let report = self
                .converter
                .parse_batch(inputs, move |done, _| tick.set_position(done as u64))
                .await;
            progress_bar.finish_and_clear();

            let mut documents = Vec::new();
            for outcome in report.outcomes {
                match outcome.result {
                    Ok(document) => documents.push(document),
                    Err(e) => summary.fail(&outcome.item, e),
                }
            }

            if !documents.is_empty() {
                let file_name = format!("{}.xlsx", DEFAULT_DOCUMENT_NAME);
                match self.converter.import_documents(documents, &file_name) {
                    Ok(workbook) => self.keep_for_review(workbook, &mut summary),
                    Err(e) => summary.fail(&file_name, e),
                }
            }
        } else {
            let report = self
                .converter
                .import_batch(inputs, move |done, _| tick.set_position(done as u64))
                .await;
            progress_bar.finish_and_clear();

            for outcome in report.outcomes {
                match outcome.result {
                    Ok(workbook) => self.keep_for_review(workbook, &mut summary),
                    Err(e) => summary.fail(&outcome.item, e),
                }
            }
        }

        self.finish("Import", summary, start_time)
    }

    /// Import XLIFF and add feedback columns to the result in one pass
    pub async fn review(&self, input: &Path) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = self.import(input, FileManager::dir_exists(input)).await?;
        if !self.session.has_artifact() {
            return Err(anyhow!("Nothing was converted from {:?}, no review workbook produced", input));
        }

        let reference = self.load_reference()?;
        let annotated = self.session.annotate_last(reference.as_ref())?;
        self.save(&annotated.file_name, &annotated.bytes, &mut summary);

        self.finish("Review", summary, start_time)
    }

    /// Add feedback columns to every sheet of an existing workbook
    pub async fn feedback(&self, workbook: &Path) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::default();
        let source_name = workbook.display().to_string();

        let bytes = FileManager::read_bytes(workbook)?;
        let sheets = spreadsheet_codec::read_workbook(&bytes, &source_name)?;
        let mut documents = Vec::with_capacity(sheets.len());
        for sheet in &sheets {
            let (document, dropped) = sheet.to_document()?;
            if !dropped.is_empty() {
                warn!("Sheet '{}': ignoring repeated id(s) {}", sheet.name, dropped.join(", "));
            }
            documents.push(document);
        }

        let reference = self.load_reference()?;
        let file_name = workbook
            .file_name()
            .map(|name| session::feedback_file_name(&name.to_string_lossy()))
            .unwrap_or_else(|| session::feedback_file_name(DEFAULT_DOCUMENT_NAME));
        let annotated = FeedbackAnnotator.annotate_workbook(&documents, reference.as_ref(), &file_name)?;
        self.save(&file_name, &annotated, &mut summary);

        self.finish("Feedback", summary, start_time)
    }

    /// Build one deployment archive per language from fragments in `dir`
    pub async fn package(&self, dir: &Path, write_tree: bool) -> Result<RunSummary> {
        let start_time = Instant::now();
        if !FileManager::dir_exists(dir) {
            return Err(anyhow!("Fragment directory does not exist: {:?}", dir));
        }

        let report = self.builder.run_from_dir(dir);
        let mut summary = RunSummary::default();
        for (item, e) in report.fragments.failures() {
            summary.fail(item, e);
        }

        let tree_root = if write_tree {
            self.directory.choose_directory("unpacked package tree")
        } else {
            Selection::Cancelled
        };

        for outcome in report.archives.outcomes {
            match outcome.result {
                Ok(archive) => {
                    self.save(&archive.file_name, &archive.bytes, &mut summary);
                    if let Some(root) = tree_root.path() {
                        for (relative, bytes) in archive.bundle.virtual_tree() {
                            let path = root.join(&relative);
                            match FileManager::write_bytes(&path, &bytes) {
                                Ok(()) => summary.written.push(path),
                                Err(e) => summary.fail(&relative, format!("{:#}", e)),
                            }
                        }
                    }
                }
                Err(e) => summary.fail(&outcome.item, e),
            }
        }

        self.finish("Packaging", summary, start_time)
    }

    /// Reference translation for the English column, if one was chosen.
    ///
    /// Workbooks contribute their first sheet; anything else is read as XLIFF.
    pub fn load_reference(&self) -> Result<Option<LanguageDocument>> {
        let path = match self.source.choose_input("reference translation") {
            Selection::Chosen(path) => path,
            Selection::Cancelled => return Ok(None),
        };
        let source_name = path.display().to_string();

        let is_workbook = path
            .extension()
            .map(|ext| WORKBOOK_EXTENSIONS.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted)))
            .unwrap_or(false);

        let document = if is_workbook {
            let bytes = FileManager::read_bytes(&path)?;
            let sheets = spreadsheet_codec::read_workbook(&bytes, &source_name)?;
            let first = sheets
                .first()
                .ok_or_else(|| anyhow!("Reference workbook {:?} has no sheets", path))?;
            first.to_document()?.0
        } else {
            let xml = FileManager::read_to_string(&path)?;
            self.converter.parse_xliff(&xml, &source_name)?
        };

        info!("Using {} unit(s) from {:?} as reference", document.len(), path);
        Ok(Some(document))
    }

    fn keep_for_review(&self, workbook: WorkbookImport, summary: &mut RunSummary) {
        self.save(&workbook.file_name, &workbook.bytes, summary);
        self.session.record(workbook);
    }

    // A failed write is recorded against this output; the run goes on
    fn save(&self, suggested_name: &str, bytes: &[u8], summary: &mut RunSummary) {
        match self.sink.choose_save_path(suggested_name) {
            Selection::Chosen(path) => match FileManager::write_bytes(&path, bytes) {
                Ok(()) => {
                    info!("Success: {}", path.display());
                    summary.written.push(path);
                }
                Err(e) => summary.fail(suggested_name, format!("{:#}", e)),
            },
            Selection::Cancelled => {
                debug!("No location chosen for {}", suggested_name);
                summary.skipped += 1;
            }
        }
    }

    fn finish(&self, what: &str, mut summary: RunSummary, start_time: Instant) -> Result<RunSummary> {
        summary.duration = start_time.elapsed();
        let message = format!(
            "{} finished in {}: {} written, {} skipped, {} failed",
            what,
            Self::format_duration(summary.duration),
            summary.written.len(),
            summary.skipped,
            summary.failures.len()
        );
        if summary.has_failures() {
            warn!("{}", message);
        } else {
            info!("{}", message);
        }
        Ok(summary)
    }

    fn batch_progress_bar(total: u64, unit: &str) -> ProgressBar {
        let progress_bar = ProgressBar::new(total);
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{eta}}",
            unit
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
