//! Merge of loader contributions into one translation map.

use crate::config::Config;
use crate::content::ContentRepository;
use crate::i18n::Locale;
use crate::loaders::{Contribution, DynamicContentLoader, MessageCatalogLoader, StaticBundleLoader};
use crate::model::{filter_namespace, Namespace, Source, SourceSet, TranslationMap};
use std::sync::Arc;
use tracing::debug;

/// Result of one merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub translations: TranslationMap,
    /// Sources whose loader degraded during this merge
    pub degraded_sources: Vec<Source>,
}

/// Runs the loaders a source set calls for and layers their output.
///
/// Loaders run concurrently; their results are applied strictly in the
/// order static, catalog, dynamic so later sources win on collision.
#[derive(Clone)]
pub struct MergeResolver {
    static_loader: StaticBundleLoader,
    catalog_loader: MessageCatalogLoader,
    dynamic_loader: DynamicContentLoader,
}

impl MergeResolver {
    pub fn new(
        static_loader: StaticBundleLoader,
        catalog_loader: MessageCatalogLoader,
        dynamic_loader: DynamicContentLoader,
    ) -> Self {
        Self {
            static_loader,
            catalog_loader,
            dynamic_loader,
        }
    }

    pub fn from_config(config: &Config, repository: Arc<dyn ContentRepository>) -> Self {
        Self::new(
            StaticBundleLoader::new(config.static_translations_dir.clone()),
            MessageCatalogLoader::new(config.catalog_dir.clone(), config.catalog_domain.clone())
                .skip_fuzzy(config.catalog_skip_fuzzy),
            DynamicContentLoader::new(repository).with_limit(config.dynamic_entity_limit),
        )
    }

    pub async fn merge(
        &self,
        locale: Locale,
        sources: SourceSet,
        namespace: Option<&Namespace>,
    ) -> MergeOutcome {
        let static_part = async {
            if sources.includes(Source::Static) {
                Some(self.static_loader.load(locale, namespace).await)
            } else {
                None
            }
        };
        let catalog_part = async {
            if sources.includes(Source::Catalog) {
                Some(self.catalog_loader.load(locale, namespace).await)
            } else {
                None
            }
        };
        let dynamic_part = async {
            if sources.includes(Source::Dynamic) {
                Some(self.dynamic_loader.load(locale, namespace).await)
            } else {
                None
            }
        };

        let (static_part, catalog_part, dynamic_part) =
            futures::join!(static_part, catalog_part, dynamic_part);

        let outcome = layer(
            [static_part, catalog_part, dynamic_part].into_iter().flatten(),
            namespace,
        );
        debug!(
            "Merged {} keys for {} (source={}, namespace={})",
            outcome.translations.len(),
            locale,
            sources,
            namespace.map_or("-", |ns| ns.as_str())
        );
        outcome
    }
}

/// Apply contributions in the order given, later entries overwriting earlier.
fn layer(
    contributions: impl IntoIterator<Item = Contribution>,
    namespace: Option<&Namespace>,
) -> MergeOutcome {
    let mut translations = TranslationMap::new();
    let mut degraded_sources = Vec::new();

    for contribution in contributions {
        if contribution.degraded {
            degraded_sources.push(contribution.source);
        }
        translations.extend(contribution.entries);
    }

    MergeOutcome {
        translations: filter_namespace(translations, namespace),
        degraded_sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentItem, EntityKind, InMemoryContentRepository};
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::path::Path;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        resolver: MergeResolver,
    }

    fn write_bundle(root: &Path, locale: &str, entries: &BTreeMap<String, String>) {
        let dir = root.join("static");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(format!("{}.json", locale)),
            serde_json::to_string(entries).unwrap(),
        )
        .unwrap();
    }

    fn write_catalog(root: &Path, locale: &str, entries: &BTreeMap<String, String>) {
        let dir = root.join("locale").join(locale).join("LC_MESSAGES");
        std::fs::create_dir_all(&dir).unwrap();
        let body: String = entries
            .iter()
            .map(|(id, text)| format!("msgid \"{}\"\nmsgstr \"{}\"\n\n", id, text))
            .collect();
        std::fs::write(dir.join("django.po"), body).unwrap();
    }

    fn fixture(
        bundle: &BTreeMap<String, String>,
        catalog: &BTreeMap<String, String>,
        services: &BTreeMap<String, String>,
    ) -> Fixture {
        let dir = TempDir::new().unwrap();
        write_bundle(dir.path(), "en", bundle);
        write_catalog(dir.path(), "en", catalog);

        let repo = InMemoryContentRepository::new();
        for (id, (slug, name)) in services.iter().enumerate() {
            repo.upsert(
                EntityKind::Service,
                ContentItem::new(id as i64 + 1)
                    .slug(slug.clone())
                    .text("name", Locale::ENGLISH, name.clone()),
            );
        }

        let resolver = MergeResolver::new(
            StaticBundleLoader::new(dir.path().join("static")),
            MessageCatalogLoader::new(dir.path().join("locale"), "django"),
            DynamicContentLoader::new(Arc::new(repo)),
        );
        Fixture { _dir: dir, resolver }
    }

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_later_sources_win() {
        let f = fixture(
            &map(&[
                ("nav.home", "Home"),
                ("catalog.Name", "static name"),
                ("services.cut.name", "static cut"),
            ]),
            &map(&[("Name", "Catalog name")]),
            &map(&[("cut", "Cutting")]),
        );

        let all = f.resolver.merge(Locale::ENGLISH, SourceSet::All, None).await;

        assert_eq!(all.translations["nav.home"], "Home");
        assert_eq!(all.translations["catalog.Name"], "Catalog name");
        assert_eq!(all.translations["services.cut.name"], "Cutting");
        assert!(all.degraded_sources.is_empty());
    }

    #[tokio::test]
    async fn test_single_source_runs_one_loader() {
        let f = fixture(
            &map(&[("nav.home", "Home")]),
            &map(&[("Name", "Catalog name")]),
            &map(&[("cut", "Cutting")]),
        );

        let only_catalog = f
            .resolver
            .merge(Locale::ENGLISH, SourceSet::Catalog, None)
            .await;

        assert_eq!(only_catalog.translations, map(&[("catalog.Name", "Catalog name")]));
    }

    #[tokio::test]
    async fn test_namespace_filters_merged_output() {
        let f = fixture(
            &map(&[("nav.home", "Home"), ("services.title", "Services")]),
            &map(&[("Name", "Catalog name")]),
            &map(&[("cut", "Cutting")]),
        );

        let ns = Namespace::parse("services").unwrap();
        let merged = f
            .resolver
            .merge(Locale::ENGLISH, SourceSet::All, ns.as_ref())
            .await;

        assert_eq!(
            merged.translations,
            map(&[("services.cut.name", "Cutting"), ("services.title", "Services")])
        );
    }

    #[tokio::test]
    async fn test_degraded_sources_reported() {
        let dir = TempDir::new().unwrap();
        let resolver = MergeResolver::new(
            StaticBundleLoader::new(dir.path().join("static")),
            MessageCatalogLoader::new(dir.path().join("locale"), "django"),
            DynamicContentLoader::new(Arc::new(InMemoryContentRepository::new())),
        );

        let merged = resolver.merge(Locale::ENGLISH, SourceSet::All, None).await;

        assert_eq!(merged.degraded_sources, vec![Source::Static, Source::Catalog]);
        assert!(merged.translations.contains_key("common.loading"));
    }

    fn text() -> impl Strategy<Value = String> {
        "[A-Za-z]{1,8}"
    }

    fn bundle_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
        let key = prop_oneof![
            "nav\\.[a-c]",
            "catalog\\.[a-c]",
            "services\\.[a-c]\\.name",
        ];
        prop::collection::btree_map(key, text(), 0..6)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// `all` holds every key of each single-source merge, and on
        /// collision dynamic beats catalog beats static.
        #[test]
        fn prop_all_is_layered_superset(
            bundle in bundle_strategy(),
            catalog in prop::collection::btree_map("[a-c]", text(), 0..4),
            services in prop::collection::btree_map("[a-c]", text(), 0..4),
        ) {
            let f = fixture(&bundle, &catalog, &services);
            let runtime = tokio::runtime::Runtime::new().unwrap();

            let (all, st, cat, dynamic, again) = runtime.block_on(async {
                (
                    f.resolver.merge(Locale::ENGLISH, SourceSet::All, None).await.translations,
                    f.resolver.merge(Locale::ENGLISH, SourceSet::Static, None).await.translations,
                    f.resolver.merge(Locale::ENGLISH, SourceSet::Catalog, None).await.translations,
                    f.resolver.merge(Locale::ENGLISH, SourceSet::Dynamic, None).await.translations,
                    f.resolver.merge(Locale::ENGLISH, SourceSet::All, None).await.translations,
                )
            });

            prop_assert_eq!(&all, &again);

            for part in [&st, &cat, &dynamic] {
                for key in part.keys() {
                    prop_assert!(all.contains_key(key), "missing {}", key);
                }
            }

            for (key, value) in &all {
                let expected = dynamic
                    .get(key)
                    .or_else(|| cat.get(key))
                    .or_else(|| st.get(key));
                prop_assert_eq!(Some(value), expected);
            }
        }
    }
}
