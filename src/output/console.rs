//! Styled one-line messages for the terminal.

use console::{style, StyledObject};

fn tagged(tag: StyledObject<&str>, message: &str) -> String {
    format!("{:>5} {}", tag.bold(), message)
}

pub fn print_info(message: &str) {
    println!("{}", tagged(style("info").cyan(), message));
}

pub fn print_success(message: &str) {
    println!("{}", tagged(style("done").green(), message));
}

pub fn print_warning(message: &str) {
    println!("{}", tagged(style("warn").yellow(), message));
}

/// Written to stderr.
pub fn print_error(message: &str) {
    eprintln!("{}", tagged(style("error").red(), message));
}

/// Print the application banner.
pub fn print_banner() {
    let title = format!(
        "{} {}",
        env!("CARGO_PKG_NAME"),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    );
    println!();
    println!("{}", style("~".repeat(48)).blue());
    println!("  {}", style(title).blue().bold());
    println!("  Likes, reposts and posts, with their media");
    println!("{}", style("~".repeat(48)).blue());
}

/// Print what this run is about to do.
pub fn print_config_summary(account: &str, mode: &str, feed_types: &[String], download_dir: &str) {
    let feeds = if feed_types.is_empty() {
        "all".to_string()
    } else {
        feed_types.join(", ")
    };

    println!();
    println!("  {:<10}{}", style("account").dim(), account);
    println!("  {:<10}{}", style("mode").dim(), mode);
    println!("  {:<10}{}", style("feeds").dim(), feeds);
    println!("  {:<10}{}", style("output").dim(), download_dir);
    println!();
}
