//! `zonewatch upload` — Copy zone reports into the data directory.

use super::{CmdResult, load_config};
use std::path::PathBuf;
use zonewatch_index::save_upload;

pub async fn run(files: &[PathBuf]) -> CmdResult {
    let config = load_config()?;
    config.paths.ensure_dirs()?;

    let mut saved = 0;
    let mut failed = 0;
    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("Not a file path: {}", path.display()))?;
        let result = match tokio::fs::read(path).await {
            Ok(bytes) => save_upload(&config.paths.data_dir, name, &bytes)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(dest) => {
                println!("  ✅ {} → {}", path.display(), dest.display());
                saved += 1;
            }
            Err(e) => {
                println!("  ❌ {}: {e}", path.display());
                failed += 1;
            }
        }
    }

    println!();
    println!("  {saved} saved, {failed} failed. Run `zonewatch init` to rebuild indexes.");
    if failed > 0 && saved == 0 {
        return Err("No files were uploaded".into());
    }
    Ok(())
}
