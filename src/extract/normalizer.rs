/// Recognized text in the two shapes the extractors need: one searchable line
/// and the original line sequence for segmentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    pub joined: String,
    pub lines: Vec<String>,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Fold full-width punctuation, collapse whitespace and drop blank lines
pub fn normalize_text(raw: &str) -> NormalizedText {
    let lines: Vec<String> = raw
        .lines()
        .map(normalize_line)
        .filter(|line| !line.is_empty())
        .collect();
    let joined = lines.join(" ");

    NormalizedText { joined, lines }
}

fn normalize_line(line: &str) -> String {
    let folded: String = line.chars().map(fold_char).collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_char(c: char) -> char {
    match c {
        '：' => ':',
        '，' => ',',
        '（' => '(',
        '）' => ')',
        '／' => '/',
        '－' | '−' | '–' => '-',
        '＋' => '+',
        '％' => '%',
        '\u{3000}' | '\u{feff}' | '\u{a0}' => ' ',
        _ => c,
    }
}
