//! Reading the source files of an atlas: sprite sheets, the TUI/emoji list
//! and the optional CJK list.

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use symforge_atlas::sprite;
use symforge_atlas::AtlasInputs;

/// Sprite sheets in slot order.
pub const SPRITE_SHEETS: [&str; 4] = ["c64l.png", "c64u.png", "c64e1.png", "c64e2.png"];
pub const TUI_LIST: &str = "tui.txt";
pub const CJK_LIST: &str = "3500C.txt";

/// Symbols that start an emoji although they sit outside the emoji blocks.
const EMOJI_EXTRA_STARTS: &str = "⭐⚡☔⛳⛵⚓⛱⛰⛲⏰✏✅✌❤❎❌⚫⚪⬛⬜";
const VARIATION_SELECTOR_16: char = '\u{fe0f}';

fn is_emoji_start(c: char) -> bool {
    let cp = c as u32;
    (0x1F000..=0x1FFFF).contains(&cp)
        || (0x2600..=0x27BF).contains(&cp)
        || (0x2300..=0x23FF).contains(&cp)
        || (0x2B00..=0x2BFF).contains(&cp)
        || EMOJI_EXTRA_STARTS.contains(c)
}

/// Split a TUI list into its two sections. The first section (after any
/// leading blank lines, up to the first blank line) holds TUI characters;
/// slot 0 is always a space. Everything after is scanned for emoji, each
/// optionally followed by VS16.
pub fn parse_tui_list(text: &str) -> Result<(Vec<char>, Vec<String>)> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
    let Some(separator) = lines[start..].iter().position(|l| l.trim().is_empty()).map(|i| start + i) else {
        bail!("no blank line separates the TUI section from the emoji section");
    };

    let mut tui = vec![' '];
    for line in &lines[start..separator] {
        tui.extend(line.trim().chars());
    }

    let mut emoji = Vec::new();
    for line in &lines[separator + 1..] {
        let mut chars = line.trim().chars().peekable();
        while let Some(c) = chars.next() {
            if !is_emoji_start(c) {
                continue;
            }
            let mut symbol = c.to_string();
            if let Some(vs) = chars.next_if_eq(&VARIATION_SELECTOR_16) {
                symbol.push(vs);
            }
            emoji.push(symbol);
        }
    }
    Ok((tui, emoji))
}

/// First character of every non-blank line.
pub fn parse_cjk_list(text: &str) -> Vec<char> {
    text.lines().filter_map(|l| l.trim().chars().next()).collect()
}

/// Load everything under `dir`. Sprite sheets and the TUI list are
/// required; a missing CJK list leaves the region empty.
pub fn load(dir: &Path) -> Result<AtlasInputs> {
    let sheets: Vec<_> = SPRITE_SHEETS.iter().map(|name| dir.join(name)).collect();
    for path in &sheets {
        if !path.is_file() {
            bail!("sprite sheet {} not found", path.display());
        }
    }
    let sprites = sprite::load_sheets(&sheets)?;

    let tui_path = dir.join(TUI_LIST);
    let text = std::fs::read_to_string(&tui_path).with_context(|| format!("reading {}", tui_path.display()))?;
    let (tui, emoji) = parse_tui_list(&text).with_context(|| format!("parsing {}", tui_path.display()))?;
    info!("{}: {} tui characters, {} emoji", tui_path.display(), tui.len(), emoji.len());

    let cjk_path = dir.join(CJK_LIST);
    let cjk = if cjk_path.is_file() {
        let text = std::fs::read_to_string(&cjk_path).with_context(|| format!("reading {}", cjk_path.display()))?;
        let cjk = parse_cjk_list(&text);
        info!("{}: {} cjk characters", cjk_path.display(), cjk.len());
        cjk
    } else {
        warn!("{} not found; the cjk region stays empty", cjk_path.display());
        Vec::new()
    };

    Ok(AtlasInputs { sprites, tui, emoji, cjk })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tui_section_starts_with_space() {
        let text = "\n\n  ─│┌┐ \nABC\n\n😀 ❤\u{fe0f} x ⭐\n\n🚀\n";
        let (tui, emoji) = parse_tui_list(text).unwrap();
        assert_eq!(tui, vec![' ', '─', '│', '┌', '┐', 'A', 'B', 'C']);
        assert_eq!(emoji, vec!["😀", "❤\u{fe0f}", "⭐", "🚀"]);
    }

    #[test]
    fn tui_list_needs_a_separator() {
        assert!(parse_tui_list("abc\ndef").is_err());
        assert!(parse_tui_list("").is_err());
    }

    #[test]
    fn cjk_takes_first_char_per_line() {
        assert_eq!(parse_cjk_list("中\n\n 文字 \n"), vec!['中', '文']);
    }

    #[test]
    fn load_reads_all_inputs() {
        let dir = tempfile::tempdir().unwrap();
        for name in SPRITE_SHEETS {
            image::RgbaImage::new(271, 271).save(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join(TUI_LIST), "ab\n\n😀\n").unwrap();
        let inputs = load(dir.path()).unwrap();
        assert_eq!(inputs.sprites.len(), 4 * 256);
        assert_eq!(inputs.tui, vec![' ', 'a', 'b']);
        assert_eq!(inputs.emoji, vec!["😀"]);
        assert!(inputs.cjk.is_empty());
    }

    #[test]
    fn missing_sheet_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TUI_LIST), "ab\n\n").unwrap();
        let err = load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("c64l.png"));
    }
}
