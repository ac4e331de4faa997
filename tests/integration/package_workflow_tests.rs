/*!
 * Fragment directory to deployment archive tests
 */

use anyhow::Result;
use xliffsheet::app_config::{PackageConfig, StripStrategy};
use xliffsheet::errors::PackageError;
use xliffsheet::package_builder::PackageBuilder;

use crate::common;

#[test]
fn test_run_from_dir_withMixedFiles_shouldGroupByLanguage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "Account-fr.objectTranslation", &common::sample_fragment("Compte"))?;
    common::create_test_file(temp_dir.path(), "Case-fr.objectTranslation", &common::sample_fragment("Requete"))?;
    common::create_test_file(temp_dir.path(), "Account-de.objectTranslation", &common::sample_fragment("Konto"))?;
    common::create_test_file(temp_dir.path(), "Broken-de.objectTranslation", "<CustomObjectTranslation>")?;
    common::create_test_file(temp_dir.path(), "README.md", "ignored")?;

    let report = PackageBuilder::default().run_from_dir(temp_dir.path());

    assert_eq!(report.fragments.len(), 4);
    assert_eq!(report.fragments.success_count(), 3);
    assert!(matches!(
        report.fragments.failures().next(),
        Some(("Broken-de.objectTranslation", PackageError::Parse { .. }))
    ));

    let languages: Vec<&str> = report.archives.successes().map(|(language, _)| language).collect();
    assert_eq!(languages, vec!["de", "fr"]);

    let (_, french) = report.archives.successes().nth(1).expect("french archive");
    let mut names = common::zip_entry_names(&french.bytes)?;
    names.sort();
    assert_eq!(
        names,
        vec![
            "unpackaged/objectTranslations/Account-fr.objectTranslation",
            "unpackaged/objectTranslations/Case-fr.objectTranslation",
            "unpackaged/package.xml",
        ]
    );
    let body = common::zip_entry_text(&french.bytes, "unpackaged/objectTranslations/Case-fr.objectTranslation")?;
    assert!(body.contains("<value>Requete</value>"));
    assert!(!body.contains("<fields>"));
    Ok(())
}

#[test]
fn test_run_from_dir_withNestedFragments_shouldOnlyReadTopLevel() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("fr/unpackaged/objectTranslations");
    std::fs::create_dir_all(&nested)?;
    common::create_test_file(temp_dir.path(), "Account-fr.objectTranslation", &common::sample_fragment("Compte"))?;
    common::create_test_file(&nested, "Account-fr.objectTranslation", "<CustomObjectTranslation/>")?;
    common::create_test_file(&nested, "Zeta-fr.objectTranslation", &common::sample_fragment("Z"))?;

    let report = PackageBuilder::default().run_from_dir(temp_dir.path());

    assert_eq!(report.fragments.len(), 1);
    assert_eq!(report.fragments.success_count(), 1);
    let (_, archive) = report.archives.successes().next().expect("french archive");
    assert!(archive.bundle.fragments["Account"].body.contains("<value>Compte</value>"));
    Ok(())
}

#[test]
fn test_run_withCustomConfig_shouldUseExtensionAndVersion() -> Result<()> {
    let config = PackageConfig {
        fragment_extension: "xml".to_string(),
        sections: vec!["layouts".to_string()],
        strip_strategy: StripStrategy::Textual,
        manifest_version: "60.0".to_string(),
    };
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "Lead-ja.xml", &common::sample_fragment("Rido"))?;

    let report = PackageBuilder::new(&config).run_from_dir(temp_dir.path());

    let (_, archive) = report.archives.successes().next().expect("one archive");
    assert!(archive.bundle.manifest.contains("<version>60.0</version>"));
    let body = &archive.bundle.fragments["Lead"].body;
    assert!(!body.contains("<layouts>"));
    assert!(body.contains("<fields>"));
    assert!(common::zip_entry_names(&archive.bytes)?.contains(&"unpackaged/objectTranslations/Lead-ja.xml".to_string()));
    Ok(())
}
