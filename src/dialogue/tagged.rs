use regex::Regex;

use super::{DialogueTurn, SpeakerLabels};

/// Extracts exactly `expected_count` turns, substituting the placeholder turn
/// for every ordinal whose block is missing or has an empty side.
pub fn extract(text: &str, expected_count: usize, labels: &SpeakerLabels) -> Vec<DialogueTurn> {
    let (Some(label_a), Some(label_b)) = (
        label_regex(&labels.speaker_a),
        label_regex(&labels.speaker_b),
    ) else {
        return vec![DialogueTurn::placeholder(); expected_count];
    };

    (1..=expected_count)
        .map(|ordinal| {
            block(text, ordinal)
                .and_then(|block| split_speakers(block, &label_a, &label_b))
                .unwrap_or_else(DialogueTurn::placeholder)
        })
        .collect()
}

/// Body between `DIALOGUE n:` and `FIN DIALOGUE n`. The trailing word boundary
/// keeps ordinal 1 from closing on `FIN DIALOGUE 10`.
fn block(text: &str, ordinal: usize) -> Option<&str> {
    let pattern = Regex::new(&format!(
        r"(?is)DIALOGUE\s*{ordinal}\s*:(.*?)FIN\s*DIALOGUE\s*{ordinal}\b"
    ))
    .ok()?;

    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str())
}

fn split_speakers(block: &str, label_a: &Regex, label_b: &Regex) -> Option<DialogueTurn> {
    let a = label_a.find(block)?;
    let b = label_b.find_at(block, a.end())?;

    let speaker_a = block[a.end()..b.start()].trim();
    let speaker_b = block[b.end()..].trim();

    if speaker_a.is_empty() || speaker_b.is_empty() {
        return None;
    }

    Some(DialogueTurn::new(speaker_a, speaker_b))
}

/// `Personne A` becomes `(?i)\bPersonne\s*A\s*:`. The leading boundary keeps a
/// short label such as `B` from matching the tail of `Jacob:`.
fn label_regex(label: &str) -> Option<Regex> {
    let words = label
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>();

    let first = label.trim_start().chars().next()?;
    let boundary = if first.is_alphanumeric() || first == '_' {
        r"\b"
    } else {
        ""
    };

    Regex::new(&format!(r"(?i){boundary}{}\s*:", words.join(r"\s*"))).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_default(text: &str, expected_count: usize) -> Vec<DialogueTurn> {
        extract(text, expected_count, &SpeakerLabels::default())
    }

    const THREE_DIALOGUES: &str = r#"Aquí tienes los diálogos:

DIALOGUE 1:
Personne A: ¿Has visto el mercado nuevo? Tiene frutas de todo el país.
Personne B: Sí, fui ayer. Compré mangos y papayas.
FIN DIALOGUE 1

DIALOGUE 2:
Personne A: ¿Quieres ir al cine esta noche?
Personne B: Me encantaría, pero tengo que trabajar.
FIN DIALOGUE 2

DIALOGUE 3:
Personne A: ¿Cuánto cuesta el billete de tren?
Personne B: Unos veinte euros, creo.
FIN DIALOGUE 3
"#;

    #[test]
    fn test_well_formed_blocks() {
        let turns = extract_default(THREE_DIALOGUES, 3);
        assert_eq!(turns.len(), 3);
        assert!(turns.iter().all(|turn| !turn.placeholder));
        assert_eq!(
            turns[0].speaker_a,
            "¿Has visto el mercado nuevo? Tiene frutas de todo el país."
        );
        assert_eq!(turns[0].speaker_b, "Sí, fui ayer. Compré mangos y papayas.");
        assert_eq!(turns[2].speaker_a, "¿Cuánto cuesta el billete de tren?");
        assert_eq!(turns[2].speaker_b, "Unos veinte euros, creo.");
    }

    #[test]
    fn test_missing_block_only_affects_its_ordinal() {
        let text = THREE_DIALOGUES.replace("DIALOGUE 2:", "DIALOGO DOS:");
        let turns = extract_default(&text, 3);
        assert!(!turns[0].placeholder);
        assert_eq!(turns[1], DialogueTurn::placeholder());
        assert!(!turns[2].placeholder);
    }

    #[test]
    fn test_more_requested_than_present() {
        let turns = extract_default(THREE_DIALOGUES, 5);
        assert_eq!(turns.len(), 5);
        assert!(turns[..3].iter().all(|turn| !turn.placeholder));
        assert!(turns[3..].iter().all(|turn| turn.placeholder));
    }

    #[test]
    fn test_zero_requested() {
        assert!(extract_default(THREE_DIALOGUES, 0).is_empty());
    }

    #[test]
    fn test_out_of_order_blocks_are_found_by_ordinal() {
        let text = "DIALOGUE 2:\nPersonne A: dos a\nPersonne B: dos b\nFIN DIALOGUE 2\n\
                    DIALOGUE 1:\nPersonne A: uno a\nPersonne B: uno b\nFIN DIALOGUE 1";
        let turns = extract_default(text, 2);
        assert_eq!(turns[0], DialogueTurn::new("uno a", "uno b"));
        assert_eq!(turns[1], DialogueTurn::new("dos a", "dos b"));
    }

    #[test]
    fn test_empty_side_becomes_placeholder() {
        let text = "DIALOGUE 1:\nPersonne A:   \nPersonne B: Hola\nFIN DIALOGUE 1";
        assert_eq!(extract_default(text, 1), vec![DialogueTurn::placeholder()]);

        let text = "DIALOGUE 1:\nPersonne A: Hola\nPersonne B:\nFIN DIALOGUE 1";
        assert_eq!(extract_default(text, 1), vec![DialogueTurn::placeholder()]);
    }

    #[test]
    fn test_missing_second_label_becomes_placeholder() {
        let text = "DIALOGUE 1:\nPersonne A: Hola, ¿qué tal?\nFIN DIALOGUE 1";
        assert_eq!(extract_default(text, 1), vec![DialogueTurn::placeholder()]);
    }

    #[test]
    fn test_missing_end_marker_becomes_placeholder() {
        let text = "DIALOGUE 1:\nPersonne A: Hola\nPersonne B: Adiós";
        assert_eq!(extract_default(text, 1), vec![DialogueTurn::placeholder()]);
    }

    #[test]
    fn test_case_and_whitespace_tolerance() {
        let text = "dialogue1 :\n  personne   a :Hola amigo\npersonneB  :  Hola\n fin dialogue   1";
        assert_eq!(
            extract_default(text, 1),
            vec![DialogueTurn::new("Hola amigo", "Hola")]
        );
    }

    #[test]
    fn test_ordinal_one_does_not_close_on_ten() {
        let text = "DIALOGUE 1:\nPersonne A: a\nPersonne B: b\nFIN DIALOGUE 10";
        assert_eq!(extract_default(text, 1), vec![DialogueTurn::placeholder()]);
    }

    #[test]
    fn test_trailing_commentary_is_kept_in_side_b() {
        let text = "DIALOGUE 1:\nPersonne A: Hola\nPersonne B: Adiós\n(Nota: vocabulario básico)\nFIN DIALOGUE 1";
        let turns = extract_default(text, 1);
        assert_eq!(turns[0].speaker_b, "Adiós\n(Nota: vocabulario básico)");
    }

    #[test]
    fn test_multiline_side_a() {
        let text = "DIALOGUE 1:\nPersonne A: Primera frase.\nSegunda frase.\nPersonne B: Vale.\nFIN DIALOGUE 1";
        assert_eq!(
            extract_default(text, 1)[0].speaker_a,
            "Primera frase.\nSegunda frase."
        );
    }

    #[test]
    fn test_short_labels_do_not_match_inside_words() {
        let labels = SpeakerLabels {
            speaker_a: "A".to_owned(),
            speaker_b: "B".to_owned(),
        };
        let text = "DIALOGUE 1:\nA: Dile a Jacob: hola\nB: Vale\nFIN DIALOGUE 1";
        assert_eq!(
            extract(text, 1, &labels),
            vec![DialogueTurn::new("Dile a Jacob: hola", "Vale")]
        );
    }

    #[test]
    fn test_label_regex_escapes_metacharacters() {
        let regex = label_regex("Persona (1)").unwrap();
        assert!(regex.is_match("persona   (1) :"));
        assert!(!regex.is_match("xpersona (1):"));
        assert!(label_regex("   ").is_none());

        let regex = label_regex("(A)").unwrap();
        assert!(regex.is_match("x(A):"));
    }
}
