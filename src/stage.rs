//! Pipeline stages that can raise a load error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Processing stage in which a load error was detected.
pub enum Stage {
    /// Input reading and character decoding.
    Reader,
    /// Tokenization.
    Scanner,
    /// Event stream parsing.
    Parser,
    /// Node tree construction.
    Composer,
    /// Tag resolution.
    Resolver,
    /// Value construction.
    Constructor,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Reader,
        Stage::Scanner,
        Stage::Parser,
        Stage::Composer,
        Stage::Resolver,
        Stage::Constructor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Reader => "reader",
            Stage::Scanner => "scanner",
            Stage::Parser => "parser",
            Stage::Composer => "composer",
            Stage::Resolver => "resolver",
            Stage::Constructor => "constructor",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown stage '{s}'"))
    }
}
