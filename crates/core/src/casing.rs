use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CasingMode {
    #[default]
    Sentence,
    Title,
}

/// ベース名 (拡張子なし) を指定モードで変換します。
/// 返り値が入力と等しい場合、呼び出し側はリネームを省略できます。
pub fn compute_renamed_name(base_name: &str, mode: CasingMode) -> String {
    match mode {
        CasingMode::Sentence => to_sentence_case(base_name),
        CasingMode::Title => to_title_case(base_name),
    }
}

/// タイトルケース: 各単語の先頭を大文字、残りを小文字にします。
/// 頭字語 (2文字以上の全大文字単語) はそのまま保持します。
pub fn to_title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for segment in segments(input) {
        match segment {
            Segment::Separator(sep) => out.push_str(sep),
            Segment::Word(word) if is_acronym(word) => out.push_str(word),
            Segment::Word(word) => push_capitalised(&mut out, word),
        }
    }
    out
}

/// センテンスケース: 最初の通常単語の先頭のみ大文字、他は小文字にします。
/// 頭字語はそのまま保持し、大文字化の機会を消費しません。
pub fn to_sentence_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_capital = true;
    for segment in segments(input) {
        match segment {
            Segment::Separator(sep) => out.push_str(sep),
            Segment::Word(word) if is_acronym(word) => out.push_str(word),
            Segment::Word(word) => {
                if pending_capital {
                    push_capitalised(&mut out, word);
                    pending_capital = false;
                } else {
                    for ch in word.chars() {
                        out.extend(ch.to_lowercase());
                    }
                }
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Word(&'a str),
    Separator(&'a str),
}

/// 単語と区切り文字の連続を交互に、元の並びのまま返します。
/// 全セグメントを連結すると入力と完全に一致します。
fn segments(input: &str) -> Segments<'_> {
    Segments { rest: input }
}

struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let in_separator = is_separator(first);
        let end = self
            .rest
            .char_indices()
            .find(|(_, ch)| is_separator(*ch) != in_separator)
            .map(|(idx, _)| idx)
            .unwrap_or(self.rest.len());
        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        if in_separator {
            Some(Segment::Separator(run))
        } else {
            Some(Segment::Word(run))
        }
    }
}

fn is_separator(ch: char) -> bool {
    matches!(ch, ' ' | '-' | '_')
}

// 2文字以上、小文字を含まず、かつ1文字以上の英字を含む単語。
// 1文字の "A" は頭字語扱いしない。英字のない単語も通常扱い (変換は無操作)。
fn is_acronym(word: &str) -> bool {
    word.chars().take(2).count() == 2
        && word.chars().any(char::is_alphabetic)
        && !word.chars().any(char::is_lowercase)
}

fn push_capitalised(out: &mut String, word: &str) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        for ch in chars {
            out.extend(ch.to_lowercase());
        }
    }
}
