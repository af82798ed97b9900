//! `streamlens doctor` — Check configuration and credentials.

use streamlens_config::AppConfig;
use streamlens_providers::build_from_config;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 streamlens Doctor — Configuration Check");
    println!("==========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ℹ️  No config file at {} — using defaults and env vars", config_path.display());
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  1 issue found. See above for details.");
            return Ok(());
        }
    };

    if config.twitch.is_configured() {
        println!("  ✅ Twitch credentials configured");
    } else {
        println!("  ❌ Twitch credentials missing — set TWITCH_CLIENT_ID and TWITCH_CLIENT_SECRET");
        issues += 1;
    }

    if config.store.access_key_id.is_some() && config.store.secret_access_key.is_some() {
        println!(
            "  ✅ AWS credentials configured (table {}, region {})",
            config.store.table, config.store.region
        );
    } else {
        println!("  ❌ AWS credentials missing — set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY");
        issues += 1;
    }

    let answers = build_from_config(&config);
    if answers.is_empty() {
        println!("  ❌ No answer provider configured — set GEMINI_API_KEY or OPENAI_API_KEY");
        issues += 1;
    } else {
        println!("  ✅ {} answer lane(s) configured", answers.len());
        if config.providers.gemini_api_key.is_some() && !config.providers.use_gemini {
            println!("  ℹ️  Gemini key present but use_gemini is false — lane disabled");
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
