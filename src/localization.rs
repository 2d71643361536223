use anyhow::{Context, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};
use unic_langid::LanguageIdentifier;

/// Languages with a bundle under the locales directory
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "fr"];

pub const DEFAULT_LANGUAGE: &str = "en";

/// Localization manager for the recipe bot
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Load every supported language from `<dir>/<lang>/main.ftl`
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut bundles = HashMap::new();

        for language in SUPPORTED_LANGUAGES {
            let locale: LanguageIdentifier = language
                .parse()
                .with_context(|| format!("Invalid language identifier: {}", language))?;
            let path = dir.as_ref().join(language).join("main.ftl");
            bundles.insert(language.to_string(), Self::create_bundle(&locale, &path));
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale. A missing or broken file
    /// yields an empty bundle, so every lookup reports a missing translation.
    fn create_bundle(locale: &LanguageIdentifier, path: &Path) -> FluentBundle<FluentResource> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        bundle.set_use_isolating(false);

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Localization file not readable");
                return bundle;
            }
        };

        let resource = match FluentResource::try_new(content) {
            Ok(resource) => resource,
            Err((resource, errors)) => {
                warn!(path = %path.display(), errors = errors.len(), "Localization file has syntax errors");
                resource
            }
        };

        if let Err(errors) = bundle.add_resource(resource) {
            warn!(path = %path.display(), errors = errors.len(), "Duplicate localization keys");
        }

        debug!(locale = %locale, path = %path.display(), "Localization bundle loaded");
        bundle
    }

    /// Get a localized message, falling back to English for unknown languages
    pub fn get_message_in_language(&self, key: &str, language: &str, args: Option<&HashMap<&str, &str>>) -> String {
        let bundle = match self.bundles.get(language).or_else(|| self.bundles.get(DEFAULT_LANGUAGE)) {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match bundle.get_message(key).and_then(|msg| msg.value()) {
            Some(pattern) => pattern,
            None => return format!("Missing translation: {}", key),
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, FluentValue::from(*value));
            }
            fluent_args
        });

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            debug!(key, errors = errors.len(), "Localization formatting errors");
        }

        value.into_owned()
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, language: &str, args: &[(&str, &str)]) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }
}

/// Map a Telegram language code to a supported language ("fr-CA" becomes "fr")
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let Some(code) = language_code else {
        return DEFAULT_LANGUAGE;
    };

    let primary = code.split(['-', '_']).next().unwrap_or_default().to_lowercase();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|language| **language == primary)
        .copied()
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// English name of a supported language, used when asking the model to switch
pub fn language_name(language: &str) -> &'static str {
    match language {
        "fr" => "French",
        _ => "English",
    }
}

/// Global localization instance
static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager; later calls keep the first instance
pub fn init_localization_from(dir: impl AsRef<Path>) -> Result<()> {
    if LOCALIZATION_MANAGER.get().is_some() {
        return Ok(());
    }
    let manager = LocalizationManager::from_dir(dir)?;
    let _ = LOCALIZATION_MANAGER.set(manager);
    Ok(())
}

/// Get the global localization manager, if initialized
pub fn get_localization_manager() -> Option<&'static LocalizationManager> {
    LOCALIZATION_MANAGER.get()
}

/// Localized message for a Telegram language code
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    match get_localization_manager() {
        Some(manager) => manager.get_message_in_language(key, detect_language(language_code), None),
        None => format!("Missing translation: {}", key),
    }
}

/// Localized message with arguments for a Telegram language code
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    match get_localization_manager() {
        Some(manager) => manager.get_message_with_args(key, detect_language(language_code), args),
        None => format!("Missing translation: {}", key),
    }
}
