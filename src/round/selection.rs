use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Uniformly random with replacement, the same word can come up twice in a row.
    #[default]
    WithReplacement,
    /// Every word once per pass, in a new random order for each pass.
    Shuffled,
}

#[derive(Debug, Clone)]
pub(crate) enum WordPicker {
    WithReplacement { len: usize },
    Shuffled { len: usize, deck: Vec<usize> },
}

impl WordPicker {
    pub fn new(policy: SelectionPolicy, len: usize) -> Self {
        match policy {
            SelectionPolicy::WithReplacement => WordPicker::WithReplacement { len },
            SelectionPolicy::Shuffled => WordPicker::Shuffled {
                len,
                deck: Vec::default(),
            },
        }
    }

    /// `None` only for an empty vocabulary.
    pub fn pick<R: Rng>(&mut self, rng: &mut R) -> Option<usize> {
        match self {
            WordPicker::WithReplacement { len } => {
                (*len > 0).then(|| rng.gen_range(0..*len))
            }
            WordPicker::Shuffled { len, deck } => {
                if deck.is_empty() {
                    if *len == 0 {
                        return None;
                    }
                    log::debug!("Every word has been used, reshuffling. Words: '{len}'.");
                    *deck = (0..*len).collect();
                    deck.shuffle(rng);
                }
                deck.pop()
            }
        }
    }
}
