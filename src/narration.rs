//! Narration text normalization for speech synthesis.
//!
//! Legal text is written for the eye: "Art. 5º, § 2º, inc. III da CF/88"
//! reads badly when a TTS voice spells it out verbatim. This module expands
//! the common abbreviations and single-digit ordinals into speakable words
//! and strips markdown markers that leak in from generated content. Pure
//! string transformation, applied to speech prompts only.

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("art.", "artigo"),
    ("arts.", "artigos"),
    ("§", "parágrafo"),
    ("§§", "parágrafos"),
    ("inc.", "inciso"),
    ("incs.", "incisos"),
    ("al.", "alínea"),
    ("nº", "número"),
    ("n.º", "número"),
    ("c/c", "combinado com"),
    ("cf/88", "Constituição Federal de 1988"),
    ("cp", "Código Penal"),
    ("cpc", "Código de Processo Civil"),
];

const ORDINALS_MASC: &[&str] = &[
    "primeiro", "segundo", "terceiro", "quarto", "quinto", "sexto", "sétimo", "oitavo", "nono",
];
const ORDINALS_FEM: &[&str] = &[
    "primeira", "segunda", "terceira", "quarta", "quinta", "sexta", "sétima", "oitava", "nona",
];

/// Normalize text for narration: strip markdown, expand legal
/// abbreviations and single-digit ordinals, collapse whitespace.
pub fn prepare_narration(text: &str) -> String {
    let cleaned = strip_markdown(text);
    let mut words: Vec<String> = Vec::new();
    for token in cleaned.split_whitespace() {
        words.push(expand_token(token));
    }
    words.join(" ")
}

fn strip_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let line = line.trim_start_matches('#').trim_start();
        for ch in line.chars() {
            match ch {
                '*' | '`' => {}
                _ => out.push(ch),
            }
        }
        out.push('\n');
    }
    out
}

fn expand_token(token: &str) -> String {
    let (core, trailing) = split_trailing_punctuation(token);
    if core.is_empty() {
        return token.to_string();
    }

    let lowered = core.to_lowercase();
    for (abbrev, expansion) in ABBREVIATIONS {
        if lowered == *abbrev {
            return format!("{}{}", expansion, trailing);
        }
    }

    if let Some(ordinal) = expand_ordinal(core) {
        return format!("{}{}", ordinal, trailing);
    }

    token.to_string()
}

/// Expand "1º".."9º" (and the feminine "ª" forms). Larger ordinals are left
/// as digits; voices read those acceptably.
fn expand_ordinal(core: &str) -> Option<&'static str> {
    let (digits, table) = if let Some(digits) = core.strip_suffix('º') {
        (digits, ORDINALS_MASC)
    } else if let Some(digits) = core.strip_suffix('ª') {
        (digits, ORDINALS_FEM)
    } else {
        return None;
    };

    let value: usize = digits.parse().ok()?;
    if (1..=9).contains(&value) {
        Some(table[value - 1])
    } else {
        None
    }
}

fn split_trailing_punctuation(token: &str) -> (&str, &str) {
    let core_end = token
        .char_indices()
        .rev()
        .take_while(|(_, c)| matches!(c, ',' | ';' | ':' | ')' | '?' | '!'))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    token.split_at(core_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expands_article_citation() {
        assert_eq!(
            prepare_narration("Art. 5º, § 2º, inc. III da CF/88"),
            "artigo quinto, parágrafo segundo, inciso III da Constituição Federal de 1988"
        );
    }

    #[test]
    fn test_feminine_ordinals() {
        assert_eq!(
            prepare_narration("na 3ª edição, al. b"),
            "na terceira edição, alínea b"
        );
    }

    #[test]
    fn test_large_ordinals_keep_digits() {
        assert_eq!(prepare_narration("Art. 121º"), "artigo 121º");
    }

    #[test]
    fn test_strips_markdown_markers() {
        assert_eq!(
            prepare_narration("## Resumo\n**Importante**: o `caput` do art. 1º"),
            "Resumo Importante: o caput do artigo primeiro"
        );
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(
            prepare_narration("texto   com\n\n  espaços"),
            "texto com espaços"
        );
    }

    #[test]
    fn test_plain_text_is_untouched() {
        assert_eq!(
            prepare_narration("A lei entra em vigor na data de sua publicação."),
            "A lei entra em vigor na data de sua publicação."
        );
    }

    #[test]
    fn test_case_insensitive_abbreviations() {
        assert_eq!(prepare_narration("ART. 2º do CP"), "artigo segundo do Código Penal");
    }
}
