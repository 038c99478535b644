//! TOML-indexed rule store
//!
//! The index lists one `[[rules]]` entry per (code, code system, payer)
//! mapping. Each entry names its rule library either by `library` path
//! (relative paths resolve against the index's directory) or inline `source`.
//!
//! ```toml
//! [[rules]]
//! topic = "HomeOxygenTherapy"
//! fhir_version = "R4"
//! code = "E0424"
//! code_system = "https://bluebutton.cms.gov/resources/codesystem/hcpcs"
//! payer = "cms"
//! library = "HomeOxygenTherapy/R4/HomeOxygenTherapyRule.cql"
//! ```
//!
//! Libraries are read eagerly when the store is built.

use super::traits::RuleStore;
use crate::domain::{
    Criterion, EvaluableRule, FhirVersion, Payer, Result, RuleError, RuleMapping,
    DEFAULT_PAYER_ID,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Alias accepted in the index for the default payer
const DEFAULT_PAYER_ALIAS: &str = "cms";

#[derive(Debug, Deserialize)]
struct RuleIndex {
    #[serde(default)]
    rules: Vec<RuleIndexEntry>,
}

/// One `[[rules]]` entry of the index
#[derive(Debug, Clone, Deserialize)]
pub struct RuleIndexEntry {
    pub topic: String,

    #[serde(default)]
    pub fhir_version: FhirVersion,

    pub code: String,

    pub code_system: String,

    /// Payer id or name; `cms` names the default payer
    pub payer: String,

    #[serde(default)]
    pub library: Option<String>,

    #[serde(default)]
    pub source: Option<String>,
}

/// In-memory rule store loaded from a TOML index
#[derive(Debug, Default)]
pub struct FileRuleStore {
    mappings: Vec<RuleMapping>,
    rules: HashMap<(String, FhirVersion), EvaluableRule>,
}

impl FileRuleStore {
    /// Loads the index at `path` and every library it names
    ///
    /// # Errors
    ///
    /// Returns an error if the index is unreadable or malformed, or a library
    /// file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| RuleError::LibraryUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let index: RuleIndex = toml::from_str(&contents)
            .map_err(|e| RuleError::InvalidIndex(format!("{}: {e}", path.display())))?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let store = Self::from_entries_in(index.rules, base_dir)?;

        tracing::info!(
            index = %path.display(),
            mappings = store.mappings.len(),
            topics = store.rules.len(),
            "Loaded rule index"
        );
        Ok(store)
    }

    /// Builds a store from index entries; library paths resolve against the
    /// working directory
    pub fn from_entries(entries: Vec<RuleIndexEntry>) -> Result<Self> {
        Self::from_entries_in(entries, Path::new("."))
    }

    fn from_entries_in(entries: Vec<RuleIndexEntry>, base_dir: &Path) -> Result<Self> {
        let mut store = Self::default();
        for entry in entries {
            let key = (entry.topic.clone(), entry.fhir_version);
            if !store.rules.contains_key(&key) {
                let source = Self::read_source(&entry, base_dir)?;
                let library_name = entry
                    .library
                    .as_deref()
                    .and_then(|l| Path::new(l).file_stem())
                    .map(|stem| stem.to_string_lossy().to_string())
                    .unwrap_or_else(|| entry.topic.clone());
                store.rules.insert(
                    key,
                    EvaluableRule {
                        topic: entry.topic.clone(),
                        fhir_version: entry.fhir_version,
                        library_name,
                        source,
                    },
                );
            }

            store.mappings.push(RuleMapping {
                topic: entry.topic,
                fhir_version: entry.fhir_version,
                code: entry.code,
                code_system: entry.code_system,
                payer: entry.payer,
            });
        }
        Ok(store)
    }

    fn read_source(entry: &RuleIndexEntry, base_dir: &Path) -> Result<String> {
        match (&entry.source, &entry.library) {
            (Some(source), _) => Ok(source.clone()),
            (None, Some(library)) => {
                let path = base_dir.join(library);
                fs::read_to_string(&path).map_err(|e| {
                    RuleError::LibraryUnreadable {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    }
                    .into()
                })
            }
            (None, None) => Err(RuleError::InvalidIndex(format!(
                "rule '{}' names neither a library nor an inline source",
                entry.topic
            ))
            .into()),
        }
    }

    /// Number of criterion mappings in the index
    pub fn mapping_count(&self) -> usize {
        self.mappings.len()
    }
}

fn payer_matches(mapping_payer: &str, payer: &Payer) -> bool {
    if mapping_payer.eq_ignore_ascii_case(DEFAULT_PAYER_ALIAS) {
        return payer.id == DEFAULT_PAYER_ID;
    }
    mapping_payer.eq_ignore_ascii_case(&payer.id)
        || payer
            .name
            .as_deref()
            .map_or(false, |name| mapping_payer.eq_ignore_ascii_case(name))
}

impl RuleStore for FileRuleStore {
    fn find_rules(&self, criterion: &Criterion) -> Vec<RuleMapping> {
        self.mappings
            .iter()
            .filter(|mapping| {
                !criterion.code.is_empty()
                    && mapping.code == criterion.code
                    && mapping.code_system == criterion.code_system
                    && mapping.fhir_version == criterion.fhir_version
                    && payer_matches(&mapping.payer, &criterion.payer)
            })
            .cloned()
            .collect()
    }

    fn load_evaluable(&self, topic: &str, fhir_version: FhirVersion) -> Result<EvaluableRule> {
        self.rules
            .get(&(topic.to_string(), fhir_version))
            .cloned()
            .ok_or_else(|| {
                RuleError::TopicNotFound {
                    topic: topic.to_string(),
                    fhir_version: fhir_version.to_string(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CrdError;
    use std::io::Write;
    use tempfile::TempDir;

    const HCPCS: &str = "https://bluebutton.cms.gov/resources/codesystem/hcpcs";

    fn entry(topic: &str, code: &str, payer: &str) -> RuleIndexEntry {
        RuleIndexEntry {
            topic: topic.to_string(),
            fhir_version: FhirVersion::R4,
            code: code.to_string(),
            code_system: HCPCS.to_string(),
            payer: payer.to_string(),
            library: None,
            source: Some(format!("library {topic}")),
        }
    }

    #[test]
    fn test_find_rules_by_default_payer_alias() {
        let store = FileRuleStore::from_entries(vec![
            entry("HomeOxygenTherapy", "E0424", "cms"),
            entry("Other", "E0424", "acme"),
        ])
        .unwrap();

        let criterion = Criterion::new("E0424", HCPCS, Payer::default_payer(), FhirVersion::R4);
        let rules = store.find_rules(&criterion);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].topic, "HomeOxygenTherapy");
    }

    #[test]
    fn test_find_rules_matches_payer_name_case_insensitive() {
        let store = FileRuleStore::from_entries(vec![entry("Other", "E0424", "Acme Health")]).unwrap();
        let criterion = Criterion::new(
            "E0424",
            HCPCS,
            Payer::new("org-1", Some("ACME HEALTH".to_string())),
            FhirVersion::R4,
        );
        assert_eq!(store.find_rules(&criterion).len(), 1);

        let stu3 = Criterion {
            fhir_version: FhirVersion::Stu3,
            ..criterion
        };
        assert!(store.find_rules(&stu3).is_empty());
    }

    #[test]
    fn test_empty_code_matches_nothing() {
        let mut blank = entry("Blank", "", "cms");
        blank.code_system = String::new();
        let store = FileRuleStore::from_entries(vec![blank]).unwrap();
        let criterion = Criterion::new("", "", Payer::default_payer(), FhirVersion::R4);
        assert!(store.find_rules(&criterion).is_empty());
    }

    #[test]
    fn test_load_evaluable_missing_topic() {
        let store = FileRuleStore::default();
        let err = store.load_evaluable("Nope", FhirVersion::R4).unwrap_err();
        assert!(matches!(err, CrdError::Rule(RuleError::TopicNotFound { .. })));
    }

    #[test]
    fn test_from_path_reads_libraries() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("HomeOxygenTherapy")).unwrap();
        std::fs::write(
            dir.path().join("HomeOxygenTherapy/HomeOxygenTherapyRule.cql"),
            "library HomeOxygenTherapyRule version '0.1.0'",
        )
        .unwrap();

        let index_path = dir.path().join("index.toml");
        let mut index = std::fs::File::create(&index_path).unwrap();
        write!(
            index,
            r#"
[[rules]]
topic = "HomeOxygenTherapy"
fhir_version = "R4"
code = "E0424"
code_system = "{HCPCS}"
payer = "cms"
library = "HomeOxygenTherapy/HomeOxygenTherapyRule.cql"

[[rules]]
topic = "HomeOxygenTherapy"
fhir_version = "R4"
code = "E0431"
code_system = "{HCPCS}"
payer = "cms"
library = "HomeOxygenTherapy/HomeOxygenTherapyRule.cql"
"#
        )
        .unwrap();

        let store = FileRuleStore::from_path(&index_path).unwrap();
        assert_eq!(store.mapping_count(), 2);
        let rule = store
            .load_evaluable("HomeOxygenTherapy", FhirVersion::R4)
            .unwrap();
        assert_eq!(rule.library_name, "HomeOxygenTherapyRule");
        assert!(rule.source.starts_with("library HomeOxygenTherapyRule"));
    }

    #[test]
    fn test_from_path_missing_library() {
        let dir = TempDir::new().unwrap();
        let index_path = dir.path().join("index.toml");
        std::fs::write(
            &index_path,
            "[[rules]]\ntopic = \"X\"\ncode = \"1\"\ncode_system = \"s\"\npayer = \"cms\"\nlibrary = \"missing.cql\"\n",
        )
        .unwrap();

        let err = FileRuleStore::from_path(&index_path).unwrap_err();
        assert!(matches!(
            err,
            CrdError::Rule(RuleError::LibraryUnreadable { .. })
        ));
    }

    #[test]
    fn test_entry_without_library_or_source() {
        let mut bad = entry("X", "1", "cms");
        bad.source = None;
        let err = FileRuleStore::from_entries(vec![bad]).unwrap_err();
        assert!(matches!(err, CrdError::Rule(RuleError::InvalidIndex(_))));
    }
}
