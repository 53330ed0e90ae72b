//! Statistics reporting.

use console::style;

use crate::download::RunStats;

/// Print the end-of-run summary.
pub fn print_run_stats(account: &str, stats: &RunStats) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style(format!("Statistics for {}:", account)).bold());
    println!("  Listed:   {}", stats.listed);
    println!("  Skipped:  {} (already archived)", stats.skipped);
    if stats.filtered > 0 {
        println!("  Filtered: {} (media type)", stats.filtered);
    }
    println!("  Missing:  {} (deleted)", stats.missing);
    println!(
        "  Blobs:    {} ({} images, {} videos)",
        stats.total_downloaded(),
        stats.images,
        stats.videos
    );
    println!("  JSON:     {}", stats.json_files);
    if stats.has_failures() {
        println!(
            "  Failed:   {} blob(s), {} lookup(s)",
            style(stats.failed_blobs).red(),
            style(stats.failed_lookups).red()
        );
    }
    println!("{}", style("═".repeat(50)).dim());

    if stats.new_posts > 0 {
        println!("{} new items downloaded", style(stats.new_posts).green());
    } else {
        println!("{}", style("Nothing new to download").yellow());
    }
}
