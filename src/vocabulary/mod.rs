mod word_entry;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::Error;

pub use self::word_entry::{AnswerKey, WordEntry};

/// Column layout of a vocabulary file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularySchema {
    /// Decided from the amount of header columns.
    #[default]
    Auto,
    /// `term,translation`
    Translation,
    /// `prompt,correct,wrong[,wrong_translation]`
    MultipleChoice,
}

/// Immutable, cheaply clonable list of word entries.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    entries: Arc<[WordEntry]>,
}

impl Vocabulary {
    pub fn new(entries: Vec<WordEntry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    pub fn parse(raw: &str, schema: VocabularySchema) -> Self {
        Vocabulary::new(parse(raw, schema))
    }

    pub fn load(path: impl AsRef<Path>, schema: VocabularySchema) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|error| {
            Error::log_and_create_internal(&format!(
                "Could not read the vocabulary file. File: '{}', Error: '{error}'.",
                path.display()
            ))
        })?;
        let vocabulary = Vocabulary::parse(&raw, schema);
        log::info!(
            "Vocabulary loaded. File: '{}', Entries: '{}'.",
            path.display(),
            vocabulary.len()
        );
        Ok(vocabulary)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WordEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }
}

/// Parses a comma separated word list. The first non blank line is a header and is
/// discarded. Blank lines and rows missing a required field are dropped.
pub fn parse(raw: &str, schema: VocabularySchema) -> Vec<WordEntry> {
    let mut lines = raw
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        return Vec::default();
    };
    let schema = match schema {
        VocabularySchema::Auto => detect_schema(header),
        schema => schema,
    };

    lines
        .filter_map(|(line_index, line)| {
            let entry = parse_row(line, schema);
            if entry.is_none() {
                log::debug!(
                    "Dropped malformed vocabulary row. Line: '{}', Schema: '{schema:?}', Row: '{line}'.",
                    line_index + 1
                );
            }
            entry
        })
        .collect()
}

fn detect_schema(header: &str) -> VocabularySchema {
    if header.split(',').count() >= 3 {
        VocabularySchema::MultipleChoice
    } else {
        VocabularySchema::Translation
    }
}

fn parse_row(line: &str, schema: VocabularySchema) -> Option<WordEntry> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let field = |index: usize| fields.get(index).copied().filter(|value| !value.is_empty());

    match schema {
        VocabularySchema::Translation | VocabularySchema::Auto => {
            Some(WordEntry::translation(field(0)?, field(1)?))
        }
        VocabularySchema::MultipleChoice => Some(WordEntry::multiple_choice(
            field(0)?,
            field(1)?,
            field(2)?,
            field(3),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse, AnswerKey, Vocabulary, VocabularySchema, WordEntry};

    #[test]
    fn parse_skips_header_and_trims_fields() {
        let entries = parse(
            "english,korean\n apple , 사과 \nbook,책\n",
            VocabularySchema::Translation,
        );

        assert_eq!(
            entries,
            vec![
                WordEntry::translation("apple", "사과"),
                WordEntry::translation("book", "책")
            ]
        );
    }

    #[test]
    fn parse_drops_blank_and_malformed_rows() {
        let entries = parse(
            "english,korean\r\n\r\napple,사과\r\nbanana\r\n,바나나\r\n   \r\ncat,고양이\r\n",
            VocabularySchema::Translation,
        );

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].prompt(), "apple");
        assert_eq!(entries[1].prompt(), "cat");
        assert!(entries.iter().all(|entry| match entry.answer() {
            AnswerKey::Translation(translation) => !translation.is_empty(),
            _ => false,
        }));
    }

    #[test]
    fn parse_header_only_is_empty() {
        assert!(parse("english,korean\n", VocabularySchema::Auto).is_empty());
        assert!(parse("", VocabularySchema::Auto).is_empty());
        assert!(parse("\n\n  \n", VocabularySchema::Auto).is_empty());
    }

    #[test]
    fn parse_leading_blank_lines_do_not_hide_the_header() {
        let entries = parse("\n\nenglish,korean\napple,사과", VocabularySchema::Auto);

        assert_eq!(entries, vec![WordEntry::translation("apple", "사과")]);
    }

    #[test]
    fn parse_multiple_choice_rows() {
        let entries = parse(
            "prompt,correct,wrong,wrong_translation\n\
             사과,apple,apply,적용하다\n\
             책,book,boot,\n\
             개,dog\n",
            VocabularySchema::MultipleChoice,
        );

        assert_eq!(
            entries,
            vec![
                WordEntry::multiple_choice("사과", "apple", "apply", Some("적용하다")),
                WordEntry::multiple_choice("책", "book", "boot", None),
            ]
        );
    }

    #[test]
    fn auto_schema_uses_header_column_count() {
        let translation = parse("a,b\nx,y", VocabularySchema::Auto);
        let choices = parse("a,b,c,d\nx,y,z,w", VocabularySchema::Auto);

        assert!(!translation[0].has_choices());
        assert!(choices[0].has_choices());
    }

    #[test]
    fn translation_schema_ignores_extra_columns() {
        let entries = parse("a,b\napple,사과,fruit", VocabularySchema::Translation);

        assert_eq!(entries, vec![WordEntry::translation("apple", "사과")]);
    }

    #[test]
    fn vocabulary_clones_share_entries() {
        let vocabulary = Vocabulary::parse("a,b\napple,사과", VocabularySchema::Auto);
        let clone = vocabulary.clone();

        assert_eq!(clone.len(), 1);
        assert!(std::ptr::eq(vocabulary.entries(), clone.entries()));
    }

    #[test]
    fn load_fails_when_file_does_not_exist() {
        assert!(Vocabulary::load("does/not/exist.csv", VocabularySchema::Auto).is_err());
    }
}
