/*!
 * Deployment package assembly.
 *
 * Metadata translation fragments named `<objectApiName>-<languageCode>.<ext>`
 * are stripped of the configured top-level sections, grouped by language,
 * listed in a `package.xml` manifest and zipped into one archive per
 * language. A bad fragment is reported and skipped; the rest of the batch
 * still gets packaged.
 */

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::Path;

use log::{debug, info, warn};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::app_config::{PackageConfig, StripStrategy};
use crate::batch::{BatchReport, ItemOutcome};
use crate::errors::PackageError;
use crate::language_utils;

pub const MANIFEST_NAMESPACE: &str = "http://soap.sforce.com/2006/04/metadata";
pub const MANIFEST_TYPE_NAME: &str = "CustomObjectTranslation";
pub const PACKAGE_ROOT: &str = "unpackaged";
pub const FRAGMENT_DIR: &str = "objectTranslations";
pub const MANIFEST_FILE: &str = "package.xml";

/// A fragment as read from storage, before parsing its name
#[derive(Debug, Clone)]
pub struct RawFragment {
    pub filename: String,
    pub content: String,
}

impl RawFragment {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// A fragment with its key parsed and its sections stripped
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFragment {
    pub object_api_name: String,
    pub language_code: String,
    pub filename: String,
    pub body: String,
}

impl MetadataFragment {
    /// `<object>-<language>`, as listed in the manifest
    pub fn member_name(&self) -> String {
        format!("{}-{}", self.object_api_name, self.language_code)
    }
}

/// Identity of an accepted fragment, reported in batch outcomes
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentKey {
    pub object_api_name: String,
    pub language_code: String,
}

/// Fragments sharing one language code, with their manifest
#[derive(Debug, Clone)]
pub struct LanguageBundle {
    pub language_code: String,

    /// Fragments by object name, so iteration is sorted
    pub fragments: BTreeMap<String, MetadataFragment>,

    /// Generated package.xml text
    pub manifest: String,

    extension: String,
}

impl LanguageBundle {
    /// Manifest members, sorted by object name
    pub fn members(&self) -> Vec<String> {
        self.fragments.values().map(MetadataFragment::member_name).collect()
    }

    /// `<language>_deployment_package.zip`
    pub fn archive_name(&self) -> String {
        format!("{}_deployment_package.zip", self.language_code)
    }

    /// Files of the bundle, paths relative to the language root
    pub fn entries(&self) -> Vec<(String, Vec<u8>)> {
        let mut entries: Vec<(String, Vec<u8>)> = self
            .fragments
            .values()
            .map(|fragment| {
                (
                    format!(
                        "{}/{}/{}.{}",
                        PACKAGE_ROOT,
                        FRAGMENT_DIR,
                        fragment.member_name(),
                        self.extension
                    ),
                    fragment.body.clone().into_bytes(),
                )
            })
            .collect();
        entries.push((
            format!("{}/{}", PACKAGE_ROOT, MANIFEST_FILE),
            self.manifest.clone().into_bytes(),
        ));
        entries
    }

    /// Files of the bundle under `<language>/unpackaged/...`
    pub fn virtual_tree(&self) -> Vec<(String, Vec<u8>)> {
        self.entries()
            .into_iter()
            .map(|(path, bytes)| (format!("{}/{}", self.language_code, path), bytes))
            .collect()
    }

    /// Zip the `unpackaged` subtree; entry paths start with `unpackaged/`
    pub fn archive(&self) -> Result<Vec<u8>, PackageError> {
        let fail = |reason: String| PackageError::Archive {
            language_code: self.language_code.clone(),
            reason,
        };

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        for (path, bytes) in self.entries() {
            zip.start_file(path.as_str(), options)
                .map_err(|e| fail(format!("{}: {}", path, e)))?;
            zip.write_all(&bytes)
                .map_err(|e| fail(format!("{}: {}", path, e)))?;
        }

        let cursor = zip.finish().map_err(|e| fail(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

/// Archive produced for one language
#[derive(Debug, Clone)]
pub struct DeploymentArchive {
    pub bundle: LanguageBundle,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Everything a package run produced
#[derive(Debug, Default)]
pub struct PackageReport {
    /// One outcome per input fragment
    pub fragments: BatchReport<FragmentKey, PackageError>,

    /// One outcome per language group, keyed by language code
    pub archives: BatchReport<DeploymentArchive, PackageError>,
}

/// Removes designated top-level sections from fragments
#[derive(Debug, Clone)]
pub enum SectionStripper {
    Structural { sections: Vec<String> },
    Textual { patterns: Vec<Regex> },
}

impl SectionStripper {
    pub fn new(strategy: StripStrategy, sections: &[String]) -> Self {
        match strategy {
            StripStrategy::Structural => Self::Structural {
                sections: sections.to_vec(),
            },
            StripStrategy::Textual => Self::Textual {
                patterns: sections
                    .iter()
                    .filter_map(|name| match textual_pattern(name) {
                        Ok(pattern) => Some(pattern),
                        Err(e) => {
                            warn!("Ignoring section '{}': {}", name, e);
                            None
                        }
                    })
                    .collect(),
            },
        }
    }

    /// Strip sections; `Err` carries the XML error for structural stripping
    pub fn strip(&self, xml: &str) -> Result<String, String> {
        match self {
            Self::Structural { sections } => strip_sections_structural(xml, sections),
            Self::Textual { patterns } => Ok(patterns
                .iter()
                .fold(xml.to_string(), |text, pattern| pattern.replace_all(&text, "").into_owned())),
        }
    }
}

// Shortest match from the opening tag to the next closing tag, plus the
// whitespace after it. Nested same-named tags end the match too early.
fn textual_pattern(name: &str) -> Result<Regex, regex::Error> {
    let name = regex::escape(name);
    Regex::new(&format!(
        r"(?s)<{name}(?:\s[^>]*)?/>\s*|<{name}(?:\s[^>]*)?>.*?</{name}>\s*",
        name = name
    ))
}

/// Remove top-level sections by walking the XML event stream.
///
/// Only direct children of the root element are candidates, so an element
/// nested deeper with the same name is kept. Whitespace directly following
/// a removed section is dropped with it.
pub fn strip_sections_structural(xml: &str, sections: &[String]) -> Result<String, String> {
    let is_section = |name: &[u8]| sections.iter().any(|section| section.as_bytes() == name);

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::new());

    let mut depth = 0usize;
    let mut skipping_from: Option<usize> = None;
    let mut drop_whitespace = false;
    let mut saw_root = false;

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| format!("{} (near byte {})", e, position))?;

        match event {
            Event::Eof => break,
            Event::Start(e) => {
                depth += 1;
                saw_root = true;
                if skipping_from.is_some() {
                    continue;
                }
                if depth == 2 && is_section(e.local_name().as_ref()) {
                    skipping_from = Some(depth);
                    continue;
                }
                drop_whitespace = false;
                writer.write_event(Event::Start(e)).map_err(|e| e.to_string())?;
            }
            Event::End(e) => {
                if depth == 0 {
                    return Err(format!("unexpected closing tag near byte {}", position));
                }
                let closing = depth;
                depth -= 1;
                if let Some(start) = skipping_from {
                    if closing == start {
                        skipping_from = None;
                        drop_whitespace = true;
                    }
                    continue;
                }
                drop_whitespace = false;
                writer.write_event(Event::End(e)).map_err(|e| e.to_string())?;
            }
            Event::Empty(e) => {
                saw_root = true;
                if skipping_from.is_some() {
                    continue;
                }
                if depth == 1 && is_section(e.local_name().as_ref()) {
                    drop_whitespace = true;
                    continue;
                }
                drop_whitespace = false;
                writer.write_event(Event::Empty(e)).map_err(|e| e.to_string())?;
            }
            Event::Text(t) => {
                if skipping_from.is_some() {
                    continue;
                }
                if drop_whitespace && t.iter().all(u8::is_ascii_whitespace) {
                    drop_whitespace = false;
                    continue;
                }
                drop_whitespace = false;
                writer.write_event(Event::Text(t)).map_err(|e| e.to_string())?;
            }
            other => {
                if skipping_from.is_some() {
                    continue;
                }
                drop_whitespace = false;
                writer.write_event(other).map_err(|e| e.to_string())?;
            }
        }
    }

    if !saw_root {
        return Err("document has no root element".to_string());
    }
    if depth != 0 {
        return Err("unexpected end of document, root element is not closed".to_string());
    }

    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

/// Parse `<objectApiName>-<languageCode>.<extension>`
pub fn parse_fragment_filename(filename: &str, extension: &str) -> Result<FragmentKey, PackageError> {
    let invalid = || PackageError::FilenameFormat {
        filename: filename.to_string(),
        extension: extension.to_string(),
    };

    let base = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(invalid)?;
    let stem = base
        .strip_suffix(extension)
        .and_then(|rest| rest.strip_suffix('.'))
        .ok_or_else(invalid)?;
    let (object_api_name, language_code) = stem.split_once('-').ok_or_else(invalid)?;

    if object_api_name.is_empty() || !language_utils::is_valid_language_tag(language_code) {
        return Err(invalid());
    }

    Ok(FragmentKey {
        object_api_name: object_api_name.to_string(),
        language_code: language_code.to_string(),
    })
}

/// Render package.xml for the given members
pub fn build_manifest(members: &[String], version: &str) -> Result<String, String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    let write = |writer: &mut Writer<Vec<u8>>, event: Event| writer.write_event(event).map_err(|e| e.to_string());

    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write(
        &mut writer,
        Event::Start(BytesStart::new("Package").with_attributes([("xmlns", MANIFEST_NAMESPACE)])),
    )?;
    write(&mut writer, Event::Start(BytesStart::new("types")))?;
    for member in members {
        write_text_element(&mut writer, "members", member)?;
    }
    write_text_element(&mut writer, "name", MANIFEST_TYPE_NAME)?;
    write(&mut writer, Event::End(BytesEnd::new("types")))?;
    write_text_element(&mut writer, "version", version)?;
    write(&mut writer, Event::End(BytesEnd::new("Package")))?;

    let mut xml = String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())?;
    xml.push('\n');
    Ok(xml)
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), String> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| e.to_string())?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(|e| e.to_string())?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| e.to_string())
}

/// Builds per-language deployment archives from fragments
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    extension: String,
    manifest_version: String,
    stripper: SectionStripper,
}

impl Default for PackageBuilder {
    fn default() -> Self {
        Self::new(&PackageConfig::default())
    }
}

impl PackageBuilder {
    pub fn new(config: &PackageConfig) -> Self {
        if config.strip_strategy == StripStrategy::Textual {
            warn!("Textual section stripping cuts nested sections with the same tag name short");
        }
        Self {
            extension: config.fragment_extension.clone(),
            manifest_version: config.manifest_version.clone(),
            stripper: SectionStripper::new(config.strip_strategy, &config.sections),
        }
    }

    /// Parse and strip one fragment
    pub fn ingest(&self, raw: &RawFragment) -> Result<MetadataFragment, PackageError> {
        let key = parse_fragment_filename(&raw.filename, &self.extension)?;
        let body = self.stripper.strip(&raw.content).map_err(|reason| PackageError::Parse {
            filename: raw.filename.clone(),
            reason,
        })?;

        Ok(MetadataFragment {
            object_api_name: key.object_api_name,
            language_code: key.language_code,
            filename: raw.filename.clone(),
            body,
        })
    }

    /// Package fragments already held in memory
    pub fn run(&self, fragments: Vec<RawFragment>) -> PackageReport {
        self.run_loaded(
            fragments
                .into_iter()
                .map(|raw| (raw.filename.clone(), Ok(raw)))
                .collect(),
        )
    }

    /// Read every fragment with the configured extension directly in `dir`.
    ///
    /// Subdirectories are not searched, so a package tree written into the
    /// same directory by an earlier run is not picked up again.
    pub fn run_from_dir(&self, dir: &Path) -> PackageReport {
        let suffix = format!(".{}", self.extension);
        let mut loaded: Vec<(String, Result<RawFragment, PackageError>)> = Vec::new();

        for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let name = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| dir.display().to_string());
                    loaded.push((
                        name.clone(),
                        Err(PackageError::SourceRead {
                            filename: name,
                            reason: e.to_string(),
                        }),
                    ));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !filename.ends_with(&suffix) {
                continue;
            }

            let content = std::fs::read_to_string(entry.path()).map_err(|e| PackageError::SourceRead {
                filename: filename.clone(),
                reason: e.to_string(),
            });
            loaded.push((
                filename.clone(),
                content.map(|content| RawFragment::new(filename, content)),
            ));
        }

        info!("Found {} fragment(s) in {:?}", loaded.len(), dir);
        self.run_loaded(loaded)
    }

    fn run_loaded(&self, loaded: Vec<(String, Result<RawFragment, PackageError>)>) -> PackageReport {
        let mut report = PackageReport::default();
        let mut groups: BTreeMap<String, BTreeMap<String, MetadataFragment>> = BTreeMap::new();

        for (name, raw) in loaded {
            let result = raw.and_then(|raw| self.ingest(&raw)).and_then(|fragment| {
                let group = groups.entry(fragment.language_code.clone()).or_default();
                if group.contains_key(&fragment.object_api_name) {
                    return Err(PackageError::Duplicate {
                        filename: fragment.filename.clone(),
                        object_api_name: fragment.object_api_name.clone(),
                        language_code: fragment.language_code.clone(),
                    });
                }
                let key = FragmentKey {
                    object_api_name: fragment.object_api_name.clone(),
                    language_code: fragment.language_code.clone(),
                };
                group.insert(fragment.object_api_name.clone(), fragment);
                Ok(key)
            });

            match &result {
                Ok(key) => debug!("Accepted {} for {}", key.object_api_name, key.language_code),
                Err(e) => warn!("Skipping fragment: {}", e),
            }
            report.fragments.push(ItemOutcome::new(name, result));
        }

        for (language_code, fragments) in groups {
            let outcome = self.bundle(language_code.clone(), fragments).and_then(|bundle| {
                let bytes = bundle.archive()?;
                Ok(DeploymentArchive {
                    file_name: bundle.archive_name(),
                    bundle,
                    bytes,
                })
            });
            if let Ok(archive) = &outcome {
                info!(
                    "Packaged {} object(s) for {} into {}",
                    archive.bundle.fragments.len(),
                    language_utils::describe_language(&language_code),
                    archive.file_name
                );
            }
            report.archives.push(ItemOutcome::new(language_code, outcome));
        }

        report
    }

    /// Group fragments of one language and generate their manifest
    pub fn bundle(
        &self,
        language_code: String,
        fragments: BTreeMap<String, MetadataFragment>,
    ) -> Result<LanguageBundle, PackageError> {
        let members: Vec<String> = fragments.values().map(MetadataFragment::member_name).collect();
        let manifest = build_manifest(&members, &self.manifest_version).map_err(|reason| PackageError::Archive {
            language_code: language_code.clone(),
            reason,
        })?;

        Ok(LanguageBundle {
            language_code,
            fragments,
            manifest,
            extension: self.extension.clone(),
        })
    }
}
