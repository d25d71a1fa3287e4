use colored::Colorize;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

// ============================================================================
// Tagged lines
// ============================================================================

/// `[INFO] msg`, the progress line format of every mutating command
pub fn tagged_info(msg: &str) {
    println!("{} {}", "[INFO]".blue().bold(), msg);
}

/// `[ERROR]: msg` on stderr
pub fn tagged_error(msg: &str) {
    eprintln!("{} {}", "[ERROR]:".red().bold(), msg);
}

/// Left-justify `name` in a column of `width`
pub fn pad(name: &str, width: usize) -> String {
    format!("{name:<width$}")
}
