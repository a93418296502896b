use anyhow::{Context, Result};
use stacksite_delivery::Resolver;
use stacksite_validator::{ValidationReport, validate_stack};

/// Check the stack's content against the site's resolver paths.
pub async fn run(resolver: &Resolver, environment: &str) -> Result<()> {
    println!("Validating content in environment: {}", environment);

    let report = validate_stack(resolver)
        .await
        .context("Failed to fetch content from the CMS")?;
    print_report(&report);

    if !report.is_ok() {
        anyhow::bail!(
            "{} content-model error(s); add the listed paths to the resolver or fix the entries",
            report.errors.len()
        );
    }

    println!("\n✓ Content model conforms");
    Ok(())
}

fn print_report(report: &ValidationReport) {
    for line in &report.info {
        println!("  ✓ {}", line);
    }
    for line in &report.warnings {
        println!("  ⚠ {}", line);
    }
    for line in &report.errors {
        eprintln!("  ✗ {}", line);
    }
}
