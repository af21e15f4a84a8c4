use crate::i18n::{BuiltinStrings, Locale};
use crate::loaders::Contribution;
use crate::model::{filter_namespace, Namespace, Source, TranslationMap};
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads `<dir>/<locale>.json` bundles shipped with the frontend.
///
/// Fallback chain: requested locale's bundle, then the default locale's
/// bundle, then the compiled-in chrome strings.
#[derive(Debug, Clone)]
pub struct StaticBundleLoader {
    dir: PathBuf,
    builtins: HashMap<Locale, TranslationMap>,
}

impl StaticBundleLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let builtins = Locale::all()
            .into_iter()
            .filter_map(|locale| {
                BuiltinStrings::for_locale(locale).map(|set| {
                    let map = set
                        .entries
                        .iter()
                        .map(|(key, value)| (key.to_string(), value.to_string()))
                        .collect();
                    (locale, map)
                })
            })
            .collect();

        Self {
            dir: dir.into(),
            builtins,
        }
    }

    /// Replace the compiled-in fallback strings.
    pub fn with_builtins(mut self, builtins: HashMap<Locale, TranslationMap>) -> Self {
        self.builtins = builtins;
        self
    }

    pub fn bundle_path(&self, locale: Locale) -> PathBuf {
        self.dir.join(format!("{}.json", locale.code()))
    }

    pub async fn load(&self, locale: Locale, namespace: Option<&Namespace>) -> Contribution {
        let mut degraded = false;

        let mut chain = vec![locale];
        let default = Locale::default_locale();
        if default != locale {
            chain.push(default);
        }

        for candidate in chain {
            let path = self.bundle_path(candidate);
            match read_bundle(&path).await {
                Ok(Some(map)) => {
                    if candidate != locale {
                        warn!(
                            "Static bundle for {} missing, serving {} bundle instead",
                            locale, candidate
                        );
                    }
                    debug!("Loaded {} static entries from {}", map.len(), path.display());
                    let entries = filter_namespace(map, namespace);
                    return Contribution {
                        source: Source::Static,
                        entries,
                        degraded,
                    };
                }
                Ok(None) => {
                    debug!("No static bundle at {}", path.display());
                    degraded = true;
                }
                Err(e) => {
                    warn!("Failed to read static bundle {}: {:#}", path.display(), e);
                    degraded = true;
                }
            }
        }

        let builtins = self
            .builtins
            .get(&locale)
            .or_else(|| self.builtins.get(&default))
            .cloned()
            .unwrap_or_default();
        warn!(
            "No static bundle found for {}, using {} compiled-in strings",
            locale,
            builtins.len()
        );

        Contribution::degraded(Source::Static, filter_namespace(builtins, namespace))
    }
}

/// Read and flatten one bundle. `Ok(None)` means the file does not exist.
async fn read_bundle(path: &Path) -> Result<Option<TranslationMap>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).context(format!("Failed to read {}", path.display())),
    };

    let value: Value = serde_json::from_str(&content)
        .context(format!("Invalid JSON in {}", path.display()))?;

    flatten_bundle(&value).map(Some)
}

/// Flatten a bundle document into dot-separated keys.
///
/// Nested objects extend the key path; strings, numbers and booleans become
/// values; nulls and arrays are skipped. The root must be an object.
pub fn flatten_bundle(value: &Value) -> Result<TranslationMap> {
    let Value::Object(root) = value else {
        bail!("Bundle root must be a JSON object");
    };

    let mut out = TranslationMap::new();
    for (key, child) in root {
        flatten_into(key, child, &mut out);
    }
    Ok(out)
}

fn flatten_into(path: &str, value: &Value, out: &mut TranslationMap) {
    match value {
        Value::String(text) => {
            out.insert(path.to_string(), text.clone());
        }
        Value::Number(number) => {
            out.insert(path.to_string(), number.to_string());
        }
        Value::Bool(flag) => {
            out.insert(path.to_string(), flag.to_string());
        }
        Value::Object(children) => {
            for (key, child) in children {
                flatten_into(&format!("{}.{}", path, key), child, out);
            }
        }
        Value::Null | Value::Array(_) => {}
    }
}
