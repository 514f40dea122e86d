//! Start-up banner

use colored::Colorize;

const LOGO: &str = r"
    ██████╗ ██╗    ██╗███╗   ██╗██████╗  ██████╗ ██╗  ██╗
    ██╔══██╗██║    ██║████╗  ██║██╔══██╗██╔═══██╗╚██╗██╔╝
    ██████╔╝██║ █╗ ██║██╔██╗ ██║██████╔╝██║   ██║ ╚███╔╝
    ██╔═══╝ ██║███╗██║██║╚██╗██║██╔══██╗██║   ██║ ██╔██╗
    ██║     ╚███╔███╔╝██║ ╚████║██████╔╝╚██████╔╝██╔╝ ██╗
    ╚═╝      ╚══╝╚══╝ ╚═╝  ╚═══╝╚═════╝  ╚═════╝ ╚═╝  ╚═╝
";

/// Subtitle centered under the logo
pub fn subtitle(version: &str) -> String {
    let text = format!("{} - Made by @DeadPackets", version);
    let width = LOGO
        .lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    format!("{:^width$}", text, width = width)
}

pub fn print_banner(version: &str) {
    println!("{}", LOGO.red());
    println!("{}\n", subtitle(version).blue());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtitle_centered() {
        let line = subtitle("v2.1.1");
        assert!(line.contains("v2.1.1 - Made by @DeadPackets"));
        assert!(line.starts_with(' '));
        assert_eq!(line.chars().count(), LOGO.lines().map(|l| l.chars().count()).max().unwrap());
    }
}
