//! `zonewatch doctor` — Diagnose configuration and connectivity.

use super::CmdResult;
use zonewatch_config::AppConfig;
use zonewatch_core::provider::Provider;
use zonewatch_index::load_zone_documents;

pub async fn run() -> CmdResult {
    println!("🩺 ZoneWatch Doctor — System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config before running other checks.");
            return Ok(());
        }
    };

    match config.require_api_key() {
        Ok(_) => println!("  ✅ LLM API key configured ({})", config.default_provider),
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    match config.require_rerank_key() {
        Ok(Some(_)) => println!("  ✅ Rerank key configured ({})", config.rerank.provider),
        Ok(None) => println!("  ⚠️  Reranking disabled (rerank.provider = \"none\")"),
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    match config.speech_credentials() {
        Ok(_) => println!("  ✅ Speech credentials configured"),
        Err(e) => println!("  ⚠️  {e} — only needed for `listen` and `speak`"),
    }

    match load_zone_documents(&config.paths.data_dir).await {
        Ok(docs) if docs.is_empty() => {
            println!(
                "  ⚠️  No zone reports in {} — run `zonewatch upload`",
                config.paths.data_dir.display()
            );
            issues += 1;
        }
        Ok(docs) => println!(
            "  ✅ {} zone report(s) in {}",
            docs.len(),
            config.paths.data_dir.display()
        ),
        Err(e) => {
            println!("  ❌ Data directory unreadable: {e}");
            issues += 1;
        }
    }

    if let Ok(provider) = zonewatch_providers::build_provider(&config) {
        match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider reachable"),
            Ok(false) => {
                println!("  ❌ Provider answered with an error status");
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider unreachable: {e}");
                issues += 1;
            }
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
