use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalWeight {
    /// Settles the verdict on its own.
    Decisive,
    /// Counted towards a majority.
    Supporting,
}

/// Which verdict a present signal argues for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    LoggedIn,
    LoggedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSignal {
    pub name: String,
    pub present: bool,
    pub weight: SignalWeight,
    pub polarity: Polarity,
}

impl LoginSignal {
    pub fn new(
        name: impl Into<String>,
        present: bool,
        weight: SignalWeight,
        polarity: Polarity,
    ) -> Self {
        Self {
            name: name.into(),
            present,
            weight,
            polarity,
        }
    }

    pub fn decisive_positive(name: impl Into<String>, present: bool) -> Self {
        Self::new(name, present, SignalWeight::Decisive, Polarity::LoggedIn)
    }

    pub fn decisive_negative(name: impl Into<String>, present: bool) -> Self {
        Self::new(name, present, SignalWeight::Decisive, Polarity::LoggedOut)
    }

    pub fn supporting_positive(name: impl Into<String>, present: bool) -> Self {
        Self::new(name, present, SignalWeight::Supporting, Polarity::LoggedIn)
    }

    pub fn supporting_negative(name: impl Into<String>, present: bool) -> Self {
        Self::new(name, present, SignalWeight::Supporting, Polarity::LoggedOut)
    }

    pub fn is_decisive(&self) -> bool {
        self.weight == SignalWeight::Decisive
    }
}
