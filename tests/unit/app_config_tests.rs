/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use xliffsheet::app_config::{Config, LogLevel, StripStrategy};
use xliffsheet::language_utils::LanguageTagStyle;

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.conversion.language_tag_style, LanguageTagStyle::Verbatim);
    assert_eq!(config.conversion.max_workers, 4);
    assert_eq!(config.package.fragment_extension, "objectTranslation");
    assert_eq!(
        config.package.sections,
        vec!["fields", "validationRules", "webLinks", "layouts", "fieldSets"]
    );
    assert_eq!(config.package.strip_strategy, StripStrategy::Structural);
    assert_eq!(config.package.manifest_version, "57.0");
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    config.conversion.max_workers = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.package.fragment_extension = ".objectTranslation".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.package.sections = vec!["1fields".to_string()];
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.package.sections.clear();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.package.manifest_version = "latest".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_deserialization_withPartialJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{
        "conversion": { "language_tag_style": "hyphenated_lowercase" },
        "package": { "strip_strategy": "textual" },
        "log_level": "debug"
    }"#;

    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.conversion.language_tag_style, LanguageTagStyle::HyphenatedLowercase);
    assert_eq!(config.conversion.max_workers, 4);
    assert_eq!(config.package.strip_strategy, StripStrategy::Textual);
    assert_eq!(config.package.manifest_version, "57.0");
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.conversion.max_workers, 4);
    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.package.sections, config.package.sections);
    Ok(())
}

#[test]
fn test_strip_strategy_fromStr_shouldAcceptKnownNames() {
    assert_eq!("Structural".parse::<StripStrategy>().unwrap(), StripStrategy::Structural);
    assert_eq!("textual".parse::<StripStrategy>().unwrap(), StripStrategy::Textual);
    assert!("regex".parse::<StripStrategy>().is_err());
    assert_eq!(StripStrategy::Textual.to_string(), "textual");
}
