//! Unicode normalization of corpus text.
//!
//! Corpus words are normalized before they become constructions, so that
//! canonically equivalent spellings share lexicon entries. Text already in
//! the requested form is passed through without copying.

use cogmorph_core::{MorphError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::{is_nfc, is_nfd, is_nfkc, is_nfkd, UnicodeNormalization};

/// Unicode form applied to every corpus field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationForm {
    #[default]
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
    /// Fields are taken byte for byte
    Off,
}

const FORMS: [(NormalizationForm, &str); 5] = [
    (NormalizationForm::Nfc, "nfc"),
    (NormalizationForm::Nfd, "nfd"),
    (NormalizationForm::Nfkc, "nfkc"),
    (NormalizationForm::Nfkd, "nfkd"),
    (NormalizationForm::Off, "none"),
];

impl fmt::Display for NormalizationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = FORMS
            .iter()
            .find(|(form, _)| form == self)
            .map_or("none", |(_, name)| *name);
        f.write_str(name)
    }
}

/// Accepts the form names case-insensitively; `off` is an alias of `none`.
impl FromStr for NormalizationForm {
    type Err = MorphError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted == "off" {
            return Ok(NormalizationForm::Off);
        }
        FORMS
            .iter()
            .find(|(_, name)| *name == wanted)
            .map(|(form, _)| *form)
            .ok_or_else(|| {
                MorphError::InvalidConfig(format!("unknown normalization form '{}'", s.trim()))
            })
    }
}

/// Applies one [`NormalizationForm`] to corpus fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    form: NormalizationForm,
}

impl Normalizer {
    pub fn new(form: NormalizationForm) -> Self {
        Self { form }
    }

    pub fn form(&self) -> NormalizationForm {
        self.form
    }

    /// The field in this normalizer's form; borrowed when nothing changes.
    pub fn normalize<'a>(&self, field: &'a str) -> Cow<'a, str> {
        let done = match self.form {
            NormalizationForm::Nfc => is_nfc(field),
            NormalizationForm::Nfd => is_nfd(field),
            NormalizationForm::Nfkc => is_nfkc(field),
            NormalizationForm::Nfkd => is_nfkd(field),
            NormalizationForm::Off => true,
        };
        if done {
            return Cow::Borrowed(field);
        }
        Cow::Owned(match self.form {
            NormalizationForm::Nfc => field.nfc().collect(),
            NormalizationForm::Nfd => field.nfd().collect(),
            NormalizationForm::Nfkc => field.nfkc().collect(),
            NormalizationForm::Nfkd => field.nfkd().collect(),
            NormalizationForm::Off => field.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nfc_composes_accents() {
        let out = Normalizer::default().normalize("marche\u{0301}");
        assert_eq!(out, "march\u{00e9}");
        assert!(matches!(out, Cow::Owned(_)));
    }

    #[test]
    fn test_normalized_text_is_borrowed() {
        let out = Normalizer::default().normalize("walking");
        assert!(matches!(out, Cow::Borrowed("walking")));
    }

    #[test]
    fn test_nfd_splits_accents() {
        let out = Normalizer::new(NormalizationForm::Nfd).normalize("\u{00e9}");
        assert_eq!(out, "e\u{0301}");
    }

    #[test]
    fn test_nfkc_folds_compatibility_forms() {
        let out = Normalizer::new(NormalizationForm::Nfkc).normalize("\u{FB01}n");
        assert_eq!(out, "fin");
    }

    #[test]
    fn test_off_keeps_bytes() {
        let out = Normalizer::new(NormalizationForm::Off).normalize("e\u{0301}");
        assert_eq!(out, "e\u{0301}");
    }

    #[test]
    fn test_form_names() {
        assert_eq!("NFKC".parse::<NormalizationForm>().unwrap(), NormalizationForm::Nfkc);
        assert_eq!("off".parse::<NormalizationForm>().unwrap(), NormalizationForm::Off);
        assert_eq!(NormalizationForm::Off.to_string(), "none");
        assert_eq!(NormalizationForm::default().to_string(), "nfc");
        assert!("nfx".parse::<NormalizationForm>().is_err());
    }
}
