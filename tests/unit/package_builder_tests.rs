/*!
 * Tests for fragment stripping, manifests and archives
 */

use anyhow::Result;
use xliffsheet::app_config::{PackageConfig, StripStrategy};
use xliffsheet::errors::PackageError;
use xliffsheet::package_builder::{
    build_manifest, strip_sections_structural, PackageBuilder, RawFragment, SectionStripper,
};

use crate::common;

fn sections() -> Vec<String> {
    PackageConfig::default().sections
}

#[test]
fn test_ingest_withValidFragment_shouldStripAllSections() -> Result<()> {
    let builder = PackageBuilder::default();
    let raw = RawFragment::new("Account-fr.objectTranslation", common::sample_fragment("Compte"));

    let fragment = builder.ingest(&raw)?;

    assert_eq!(fragment.object_api_name, "Account");
    assert_eq!(fragment.language_code, "fr");
    for removed in ["<fields>", "<validationRules>", "<webLinks>", "<layouts>", "<fieldSets>"] {
        assert!(!fragment.body.contains(removed), "{} should be removed", removed);
    }
    assert!(fragment.body.contains("<value>Compte</value>"));
    assert!(fragment.body.contains("    </caseValues>\n    <gender>Masculine</gender>"));
    Ok(())
}

#[test]
fn test_structural_strip_withNestedSameNamedTag_shouldRemoveWholeSection() {
    let xml = "<root>\n    <fields>\n        <fields>inner</fields>\n        <label>x</label>\n    </fields>\n    <keep/>\n</root>";

    let structural = strip_sections_structural(xml, &sections()).unwrap();
    let textual = SectionStripper::new(StripStrategy::Textual, &sections()).strip(xml).unwrap();

    assert_eq!(structural, "<root>\n    <keep/>\n</root>");
    // The shortest match stops at the inner closing tag
    assert!(textual.contains("<label>x</label>"));
}

#[test]
fn test_structural_strip_withDeepSection_shouldKeepIt() {
    let xml = "<root><caseValues><fields>deep</fields></caseValues><fields/></root>";

    let stripped = strip_sections_structural(xml, &sections()).unwrap();

    assert_eq!(stripped, "<root><caseValues><fields>deep</fields></caseValues></root>");
}

#[test]
fn test_ingest_withInvalidXml_shouldReturnParseError() {
    let builder = PackageBuilder::default();
    let raw = RawFragment::new("Account-fr.objectTranslation", "<CustomObjectTranslation><fields>");

    assert!(matches!(builder.ingest(&raw), Err(PackageError::Parse { .. })));
}

#[test]
fn test_build_manifest_shouldListMembersTypeAndVersion() {
    let manifest = build_manifest(&["Alpha-fr".to_string(), "Mid-fr".to_string()], "57.0").unwrap();

    assert!(manifest.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(manifest.contains("<Package xmlns=\"http://soap.sforce.com/2006/04/metadata\">"));
    assert!(manifest.contains("<members>Alpha-fr</members>"));
    assert!(manifest.contains("<name>CustomObjectTranslation</name>"));
    assert!(manifest.contains("<version>57.0</version>"));
}

#[test]
fn test_run_withUnsortedObjects_shouldSortManifestMembers() {
    let fragments = ["Zeta", "Alpha", "Mid"]
        .iter()
        .map(|name| RawFragment::new(format!("{}-fr.objectTranslation", name), common::sample_fragment(name)))
        .collect();

    let report = PackageBuilder::default().run(fragments);

    let (_, archive) = report.archives.successes().next().expect("one archive");
    assert_eq!(archive.bundle.members(), vec!["Alpha-fr", "Mid-fr", "Zeta-fr"]);
    let alpha = archive.bundle.manifest.find("Alpha-fr").unwrap();
    let mid = archive.bundle.manifest.find("Mid-fr").unwrap();
    let zeta = archive.bundle.manifest.find("Zeta-fr").unwrap();
    assert!(alpha < mid && mid < zeta);
}

#[test]
fn test_run_withMalformedFilename_shouldReportTwoSuccessesAndOneNamedFailure() {
    let fragments = vec![
        RawFragment::new("Account-fr.objectTranslation", common::sample_fragment("Compte")),
        RawFragment::new("NoLanguage.objectTranslation", common::sample_fragment("x")),
        RawFragment::new("Case-de.objectTranslation", common::sample_fragment("Fall")),
    ];

    let report = PackageBuilder::default().run(fragments);

    assert_eq!(report.fragments.success_count(), 2);
    let failures: Vec<_> = report.fragments.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "NoLanguage.objectTranslation");
    assert!(matches!(failures[0].1, PackageError::FilenameFormat { .. }));
    assert_eq!(report.archives.success_count(), 2);
}

#[test]
fn test_run_withDuplicatePair_shouldKeepFirstFragment() {
    let fragments = vec![
        RawFragment::new("Account-fr.objectTranslation", common::sample_fragment("Premier")),
        RawFragment::new("Account-fr.objectTranslation", common::sample_fragment("Second")),
    ];

    let report = PackageBuilder::default().run(fragments);

    assert!(matches!(
        report.fragments.outcomes[1].result,
        Err(PackageError::Duplicate { .. })
    ));
    let (_, archive) = report.archives.successes().next().expect("one archive");
    assert!(archive.bundle.fragments["Account"].body.contains("Premier"));
}

#[test]
fn test_archive_shouldHoldUnpackagedEntries() -> Result<()> {
    let report = PackageBuilder::default().run(vec![
        RawFragment::new("Account-pt_BR.objectTranslation", common::sample_fragment("Conta")),
    ]);
    let (language, archive) = report.archives.successes().next().expect("one archive");

    assert_eq!(language, "pt_BR");
    assert_eq!(archive.file_name, "pt_BR_deployment_package.zip");

    let mut names = common::zip_entry_names(&archive.bytes)?;
    names.sort();
    assert_eq!(
        names,
        vec![
            "unpackaged/objectTranslations/Account-pt_BR.objectTranslation",
            "unpackaged/package.xml",
        ]
    );
    let manifest = common::zip_entry_text(&archive.bytes, "unpackaged/package.xml")?;
    assert!(manifest.contains("<members>Account-pt_BR</members>"));

    let tree: Vec<String> = archive.bundle.virtual_tree().into_iter().map(|(path, _)| path).collect();
    assert!(tree.contains(&"pt_BR/unpackaged/package.xml".to_string()));
    Ok(())
}
