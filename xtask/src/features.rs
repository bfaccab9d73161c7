use anyhow::{Context, Result};

use crate::cargo;

/// `(package, features)` pairs that must build on their own.
const FEATURE_COMBINATIONS: &[(&str, &[&str])] = &[
    ("userdesk-common", &[]),
    ("userdesk-common", &["test-utils"]),
    ("userdesk-core", &[]),
    ("userdesk-core", &["test-utils"]),
    ("userdesk-infra", &[]),
    ("userdesk-api", &[]),
];

/// Check that the test-utils features are additive and optional.
pub fn test_feature_matrix() -> Result<()> {
    println!("Testing {} crate/feature combinations...", FEATURE_COMBINATIONS.len());

    for (index, (package, features)) in FEATURE_COMBINATIONS.iter().enumerate() {
        let joined = features.join(",");
        let label = if features.is_empty() { "default" } else { joined.as_str() };

        println!("\n[{}/{}] {package} ({label})", index + 1, FEATURE_COMBINATIONS.len());

        let mut args = vec!["check", "-p", *package, "--all-targets"];
        if !features.is_empty() {
            args.extend(["--features", joined.as_str()]);
        }
        cargo(&args).with_context(|| format!("{package} failed to compile with '{label}'"))?;

        println!("✅ {package} ({label}) compiled successfully");
    }

    println!("\n✅ All {} combinations compile successfully!", FEATURE_COMBINATIONS.len());
    Ok(())
}
