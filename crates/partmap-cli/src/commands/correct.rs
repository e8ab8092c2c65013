//! Manual correction command.

use crate::cli::CorrectArgs;
use crate::commands::Engine;
use crate::error::Result;
use crate::output::Formatter;
use partmap_domain::traits::CatalogAccessor;
use partmap_domain::CatalogKind;

/// Execute the correct command.
///
/// The key is recorded as given; an unknown key only produces a warning.
pub async fn execute_correct(args: CorrectArgs, engine: &Engine, formatter: &Formatter) -> Result<()> {
    if !key_exists(engine, &args.key) {
        eprintln!(
            "{}",
            formatter.warning(&format!("'{}' is not in the loaded catalog", args.key))
        );
    }

    let result = engine.apply_manual_correction(args.key.clone());
    println!("{}", formatter.format_result(&args.key, &result)?);
    Ok(())
}

fn key_exists(engine: &Engine, key: &str) -> bool {
    [CatalogKind::Parts, CatalogKind::Entities]
        .into_iter()
        .any(|kind| matches!(engine.catalog().lookup_exact(kind, key), Ok(Some(_))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build_engine;
    use crate::commands::test_support::catalog_file;
    use crate::config::Config;

    #[test]
    fn test_key_exists() {
        let file = catalog_file();
        let engine = build_engine(&Config::default(), file.path()).unwrap();
        assert!(key_exists(&engine, "C1002"));
        assert!(key_exists(&engine, "28Y05E"));
        assert!(!key_exists(&engine, "NOPE"));
    }
}
