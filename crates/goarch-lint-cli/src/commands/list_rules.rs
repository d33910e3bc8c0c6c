//! List rules command implementation.

use goarch_lint_rules::{all_rules, Preset};

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!("{:<8} {:<22} {:<18} Description", "Code", "Name", "Reads");
    println!("{}", "-".repeat(104));

    for rule in all_rules() {
        println!(
            "{:<8} {:<22} {:<18} {}",
            rule.code(),
            rule.name(),
            rule.capabilities().to_string(),
            rule.description()
        );
        if !rule.requires().is_empty() {
            println!("{:<50} after: {}", "", rule.requires().join(", "));
        }
    }

    println!("\nPresets:");
    for preset in Preset::ALL {
        let codes: Vec<&str> = preset
            .rules()
            .iter()
            .map(|r| r.code())
            .filter(|code| *code != "GA000" && *code != "GA100")
            .collect();
        let marker = if preset == Preset::default() { " (default)" } else { "" };
        println!("  {:<13} {}{}", preset.name(), codes.join(", "), marker);
    }

    println!("\nUse --rules to filter specific rules, e.g.:");
    println!("  goarch-lint check --rules interface-location,style-limits");
    println!("  goarch-lint check --rules GA007,GA010");
}
