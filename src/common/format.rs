use colored::*;

const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Format bytes with the largest binary unit not exceeding the value,
/// one decimal place: `1536` → `"1.5 KiB"`, `0` → `"0.0 B"`.
pub fn humanize(bytes: u64) -> String {
    let mut unit = 0;
    let mut threshold = 1u64;
    while unit + 1 < UNITS.len() && bytes / 1024 >= threshold {
        threshold *= 1024;
        unit += 1;
    }
    format!("{:.1} {}", bytes as f64 / threshold as f64, UNITS[unit])
}

/// Format size with color based on magnitude
pub fn humanize_colored(bytes: u64) -> ColoredString {
    let s = humanize(bytes);
    const GIB: u64 = 1024 * 1024 * 1024;
    const MIB100: u64 = 100 * 1024 * 1024;

    if bytes >= GIB {
        s.green().bold()
    } else if bytes >= MIB100 {
        s.green()
    } else {
        s.white()
    }
}

/// Format duration in human-readable form
pub fn format_duration(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{}m {:.0}s", mins, remaining)
    }
}
