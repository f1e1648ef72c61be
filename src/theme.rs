//! Display colors for commits.
//!
//! A commit's color pair is picked from a fixed palette by
//! `(message length + author name length) mod palette size`, so it depends
//! on those two lengths and nothing else.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorTheme {
    pub background: &'static str,
    pub foreground: &'static str,
}

const fn theme(background: &'static str, foreground: &'static str) -> ColorTheme {
    ColorTheme {
        background,
        foreground,
    }
}

pub const PALETTE: [ColorTheme; 12] = [
    theme("#ffbf00", "#000000"), // amber
    theme("#fedc56", "#000000"), // mustard
    theme("#ffddaf", "#000000"), // navajo
    theme("#ffd300", "#000000"), // cyber
    theme("#fada5e", "#000000"), // royal
    theme("#f8d373", "#000000"), // mellow
    theme("#a7ff57", "#000000"), // spring green
    theme("#0bda51", "#000000"), // malachite
    theme("#73c2fb", "#000000"), // maya
    theme("#cea8ff", "#000000"), // light purple
    theme("#ff9ff3", "#000000"), // jigglypuff
    theme("#ce3876", "#ffffff"), // slate pink
];

pub fn color_theme(message: &str, author_name: &str) -> ColorTheme {
    let length = message.chars().count() + author_name.chars().count();
    PALETTE[length % PALETTE.len()]
}
