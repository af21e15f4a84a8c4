use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use translation_gateway::config::Config;
use translation_gateway::content::{self, ContentRepository, InMemoryContentRepository};
use translation_gateway::i18n::{CatalogValidator, Locale};
use translation_gateway::loaders::{MessageCatalogLoader, StaticBundleLoader};
use translation_gateway::merge::MergeResolver;
use translation_gateway::model::SourceSet;

struct ExportArgs {
    locale: Option<Locale>,
    source: SourceSet,
    out_dir: PathBuf,
    validate: bool,
}

fn print_usage() {
    println!("Export merged translations to JSON files");
    println!();
    println!("Usage: export [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --locale <code>    Export one locale (default: all enabled locales)");
    println!("  --source <set>     all | static | catalog | dynamic (default: all)");
    println!("  --out <dir>        Output directory (default: export)");
    println!("  --validate         Validate bundles and catalogs before exporting");
    println!("  -h, --help         Show this help");
}

/// Parse CLI arguments; `Ok(None)` means help was requested.
fn parse_args(args: &[String]) -> Result<Option<ExportArgs>> {
    let mut parsed = ExportArgs {
        locale: None,
        source: SourceSet::All,
        out_dir: PathBuf::from("export"),
        validate: false,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--locale" => {
                let code = iter.next().context("--locale needs a value")?;
                parsed.locale = Some(Locale::from_code(code)?);
            }
            "--source" => {
                let raw = iter.next().context("--source needs a value")?;
                parsed.source = raw.parse().map_err(anyhow::Error::msg)?;
            }
            "--out" => {
                parsed.out_dir = PathBuf::from(iter.next().context("--out needs a value")?);
            }
            "--validate" => parsed.validate = true,
            "--help" | "-h" | "help" => return Ok(None),
            other => bail!("Unknown argument: {}", other),
        }
    }

    Ok(Some(parsed))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_gateway=info".parse()?)
                .add_directive("export=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(args) = parse_args(&args)? else {
        print_usage();
        return Ok(());
    };

    let config = Config::from_env()?;
    let locales = match args.locale {
        Some(locale) => vec![locale],
        None => Locale::all(),
    };

    if args.validate {
        let validator = CatalogValidator::new(
            StaticBundleLoader::new(config.static_translations_dir.clone()),
            MessageCatalogLoader::new(config.catalog_dir.clone(), config.catalog_domain.clone()),
        );

        for locale in &locales {
            let report = validator.validate_locale(*locale);
            for error in &report.errors {
                println!("[{}] ERROR   {}", locale, error);
            }
            for warning in &report.warnings {
                println!("[{}] WARNING {}", locale, warning);
            }
            if report.is_clean() {
                info!("✓ {} sources are clean", locale.name());
            }
        }
    }

    // Static-only and catalog-only exports never touch the database.
    let repository: Arc<dyn ContentRepository> = if args.source.includes_dynamic() {
        content::repository_from_config(&config).await?
    } else {
        Arc::new(InMemoryContentRepository::new())
    };
    let resolver = MergeResolver::from_config(&config, repository);

    fs::create_dir_all(&args.out_dir)
        .context(format!("Failed to create {}", args.out_dir.display()))?;

    for locale in locales {
        let outcome = resolver.merge(locale, args.source, None).await;
        for source in &outcome.degraded_sources {
            warn!("{} source degraded for {}", source.as_str(), locale);
        }

        let path = args.out_dir.join(format!("{}.json", locale.code()));
        let json = serde_json::to_string_pretty(&outcome.translations)?;
        fs::write(&path, json).context(format!("Failed to write {}", path.display()))?;

        info!(
            "✓ Exported {} {} translations to {}",
            outcome.translations.len(),
            locale,
            path.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let parsed = parse_args(&[]).unwrap().unwrap();
        assert_eq!(parsed.locale, None);
        assert_eq!(parsed.source, SourceSet::All);
        assert_eq!(parsed.out_dir, PathBuf::from("export"));
        assert!(!parsed.validate);
    }

    #[test]
    fn test_all_options() {
        let parsed = parse_args(&args(&[
            "--locale", "en", "--source", "static", "--out", "/tmp/x", "--validate",
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(parsed.locale, Some(Locale::ENGLISH));
        assert_eq!(parsed.source, SourceSet::Static);
        assert_eq!(parsed.out_dir, PathBuf::from("/tmp/x"));
        assert!(parsed.validate);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse_args(&args(&["--locale", "de"])).is_err());
        assert!(parse_args(&args(&["--source", "po"])).is_err());
        assert!(parse_args(&args(&["--locale"])).is_err());
        assert!(parse_args(&args(&["--verbose"])).is_err());
    }

    #[test]
    fn test_help() {
        assert!(parse_args(&args(&["--help"])).unwrap().is_none());
    }
}
