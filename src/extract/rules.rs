//! Ordered `(keyword, value pattern)` tables shared by the screenshot and CSV paths.

use std::sync::LazyLock;

use regex::{Captures, Regex};

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect(concat!(stringify!($name), " is valid")));
    };
}

// Ticker glued to the quote currency, optional perpetual qualifier (stripped)
pattern!(
    SYMBOL,
    r"([0-9]*[A-Z][A-Z0-9]*)[/-]?USDT(?:\s*(?:永续|(?i:perpetual|perp)))?"
);
// "<number> USDT" or a bare decimal with 2-8 fraction digits, whichever comes first
pattern!(
    PRICE,
    r"(?i)(\d[\d,]*(?:\.\d+)?)\s*USDT|(\d{1,3}(?:,\d{3})+\.\d{2,8}|\d+\.\d{2,8})"
);
// Group 2 marks a percentage or a leverage multiplier instead of a plain amount
pattern!(
    SIGNED_DECIMAL,
    r"([+-]?\d[\d,]*(?:\.\d+)?)(\s*%|\s?[xX×倍](?:[^A-Za-z]|$))?"
);
pattern!(PERCENT, r"([+-]?\d+(?:\.\d+)?)\s*%");
// A whole number right after the keyword, or a suffixed multiplier further on
pattern!(
    LEVERAGE_VALUE,
    r"^[\s:=]*(\d{1,3})(?:\s*[xX×倍])?(?:[^\d.]|$)|(?:^|[^A-Za-z0-9.])(\d{1,3})\s?[xX×倍](?:[^A-Za-z]|$)"
);
pattern!(BARE_LEVERAGE, r"(?:^|[^A-Za-z0-9.])(\d{1,3})\s?[xX×倍](?:[^A-Za-z]|$)");
pattern!(
    LONG_SIDE,
    r"(?i)做多|开多|平多|多头|多仓|(?:^|[^a-z])long(?:[^a-z]|$)"
);
pattern!(
    SHORT_SIDE,
    r"(?i)做空|开空|平空|空头|空仓|(?:^|[^a-z])short(?:[^a-z]|$)"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuePattern {
    Symbol,
    Price,
    SignedDecimal,
    Percent,
    Leverage,
    /// Handled by the date parser rather than a single regex
    DateTime,
    /// Like `DateTime`, but the date has to follow the keyword directly
    DatePrefix,
}

impl ValuePattern {
    pub fn regex(self) -> Option<&'static Regex> {
        match self {
            ValuePattern::Symbol => Some(&SYMBOL),
            ValuePattern::Price => Some(&PRICE),
            ValuePattern::SignedDecimal => Some(&SIGNED_DECIMAL),
            ValuePattern::Percent => Some(&PERCENT),
            ValuePattern::Leverage => Some(&LEVERAGE_VALUE),
            ValuePattern::DateTime | ValuePattern::DatePrefix => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub keyword: &'static str,
    pub pattern: ValuePattern,
    /// Occurrences followed by one of these belong to a longer label ("收益" in "收益率")
    pub unless_followed_by: &'static [&'static str],
}

const fn rule(keyword: &'static str, pattern: ValuePattern) -> FieldRule {
    FieldRule {
        keyword,
        pattern,
        unless_followed_by: &[],
    }
}

const fn rule_unless(keyword: &'static str, pattern: ValuePattern, suffixes: &'static [&'static str]) -> FieldRule {
    FieldRule {
        keyword,
        pattern,
        unless_followed_by: suffixes,
    }
}

use ValuePattern::*;

pub const SYMBOL_RULES: &[FieldRule] = &[
    rule("合约", Symbol),
    rule("交易对", Symbol),
    rule("symbol", Symbol),
    rule("contract", Symbol),
    rule("pair", Symbol),
];

pub const OPEN_TIME_RULES: &[FieldRule] = &[
    rule("开仓时间", DateTime),
    rule("open time", DateTime),
    rule("opening time", DateTime),
    rule("opened at", DateTime),
    rule("entry time", DateTime),
    rule("opened", DatePrefix),
    rule("开仓", DatePrefix),
];

pub const CLOSE_TIME_RULES: &[FieldRule] = &[
    rule("平仓时间", DateTime),
    rule("close time", DateTime),
    rule("closing time", DateTime),
    rule("closed at", DateTime),
    rule("exit time", DateTime),
    rule("closed", DatePrefix),
    rule("平仓", DatePrefix),
];

pub const OPEN_PRICE_RULES: &[FieldRule] = &[
    rule("开仓均价", Price),
    rule("开仓价格", Price),
    rule("开仓价", Price),
    rule("entry price", Price),
    rule("open price", Price),
    rule("avg. entry", Price),
];

pub const CLOSE_PRICE_RULES: &[FieldRule] = &[
    rule("平仓均价", Price),
    rule("平仓价格", Price),
    rule("平仓价", Price),
    rule("close price", Price),
    rule("exit price", Price),
    rule("avg. close", Price),
];

pub const LEVERAGE_RULES: &[FieldRule] = &[
    rule("杠杆倍数", Leverage),
    rule("杠杆", Leverage),
    rule("leverage", Leverage),
    rule("倍数", Leverage),
];

pub const POSITION_SIZE_RULES: &[FieldRule] = &[
    rule("平仓数量", SignedDecimal),
    rule("持仓量", SignedDecimal),
    rule("仓位", SignedDecimal),
    rule("数量", SignedDecimal),
    rule("closed vol", SignedDecimal),
    rule("position size", SignedDecimal),
    rule("quantity", SignedDecimal),
    rule("size", SignedDecimal),
    rule("qty", SignedDecimal),
];

pub const PROFIT_AMOUNT_RULES: &[FieldRule] = &[
    rule("已实现盈亏", SignedDecimal),
    rule("realized pnl", SignedDecimal),
    rule("closing pnl", SignedDecimal),
    rule_unless("盈亏", SignedDecimal, &["率", "比"]),
    rule_unless("收益", SignedDecimal, &["率"]),
    rule_unless("pnl", SignedDecimal, &["%"]),
    rule_unless("profit", SignedDecimal, &["%", "rate"]),
];

pub const PROFIT_RATE_RULES: &[FieldRule] = &[
    rule("收益率", Percent),
    rule("回报率", Percent),
    rule("roe", Percent),
    rule("pnl%", Percent),
    rule("profit rate", Percent),
    rule("return", Percent),
];

pub fn symbol_pattern() -> &'static Regex {
    &SYMBOL
}

pub fn bare_leverage_pattern() -> &'static Regex {
    &BARE_LEVERAGE
}

pub fn percent_pattern() -> &'static Regex {
    &PERCENT
}

pub fn long_side_pattern() -> &'static Regex {
    &LONG_SIDE
}

pub fn short_side_pattern() -> &'static Regex {
    &SHORT_SIDE
}

/// Text after `byte_pos`, cut to at most `window` characters
pub fn window_after(text: &str, byte_pos: usize, window: usize) -> &str {
    let rest = &text[byte_pos..];
    match rest.char_indices().nth(window) {
        Some((end, _)) => &rest[..end],
        None => rest,
    }
}

/// Byte offset just past the first case-insensitive occurrence of `keyword`
pub fn find_keyword_end(text: &str, keyword: &str) -> Option<usize> {
    keyword_ends(text, keyword).first().copied()
}

/// Byte offsets just past every case-insensitive occurrence of `keyword`
pub fn keyword_ends(text: &str, keyword: &str) -> Vec<usize> {
    // ASCII lowering keeps byte offsets aligned with the original text
    let lowered = text.to_ascii_lowercase();
    let needle = keyword.to_ascii_lowercase();
    lowered
        .match_indices(&needle)
        .map(|(pos, _)| pos + needle.len())
        .collect()
}

/// Occurrences of the rule's keyword that are not part of a longer label
pub fn rule_matches<'a>(text: &'a str, rule: &'a FieldRule) -> impl Iterator<Item = usize> + 'a {
    keyword_ends(text, rule.keyword).into_iter().filter(move |end| {
        let rest = text[*end..].trim_start().to_ascii_lowercase();
        !rule.unless_followed_by.iter().any(|suffix| rest.starts_with(*suffix))
    })
}

/// Walk the rules in order and every occurrence of each keyword. Only the
/// first pattern match in the window after an occurrence is offered to
/// `accept`; if it is rejected the next occurrence is tried.
pub fn find_after_keyword<T>(
    text: &str,
    rules: &[FieldRule],
    window: usize,
    mut accept: impl FnMut(&Captures<'_>) -> Option<T>,
) -> Option<T> {
    for rule in rules {
        let Some(regex) = rule.pattern.regex() else {
            continue;
        };
        for end in rule_matches(text, rule) {
            let tail = window_after(text, end, window);
            if let Some(value) = regex.captures(tail).and_then(|caps| accept(&caps)) {
                return Some(value);
            }
        }
    }
    None
}

/// Same walk as [`find_after_keyword`] but hands the rule and the raw
/// trailing window to `accept`
pub fn find_window_after_keyword<T>(
    text: &str,
    rules: &[FieldRule],
    window: usize,
    mut accept: impl FnMut(&FieldRule, &str) -> Option<T>,
) -> Option<T> {
    for rule in rules {
        for end in rule_matches(text, rule) {
            if let Some(value) = accept(rule, window_after(text, end, window)) {
                return Some(value);
            }
        }
    }
    None
}
