//! Stimulus scripts.
//!
//! A script is written one character per event: a letter studies a
//! memorandum, a digit-like character runs a processing operation, `#`
//! starts recall. The canonical complex-span script for three memoranda
//! with two operations each reads `A12B12C12#`.
//!
//! Operations are numbered `0..=16`, written with the sixteen characters
//! that follow `'0'` in ASCII (`'1'..'9'`, then `':'` for 10 up to `'@'`
//! for 16).

use std::fmt;

use crate::config::{MAX_LABELLED_MEMORANDA, MAX_OPERATIONS_PER_ITEM};
use crate::error::{Result, TbrsError};
use crate::types::ItemId;

/// One event of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Study memorandum `index` (0 = `A`) at the next serial position.
    Memorandum(usize),
    /// A processing operation; the number is its rank after the memorandum.
    Operation(usize),
    /// Recall every studied position in order.
    Recall,
}

impl Symbol {
    /// Decode one script character.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A'..='Z' => Some(Self::Memorandum(c as usize - 'A' as usize)),
            '0'..='@' => Some(Self::Operation(c as usize - '0' as usize)),
            '#' => Some(Self::Recall),
            _ => None,
        }
    }

    /// Encode as a script character.
    #[must_use]
    pub fn to_char(self) -> char {
        match self {
            Self::Memorandum(i) if i < MAX_LABELLED_MEMORANDA => char::from(b'A' + i as u8),
            Self::Operation(n) if n <= MAX_OPERATIONS_PER_ITEM => char::from(b'0' + n as u8),
            Self::Memorandum(_) | Self::Operation(_) => '?',
            Self::Recall => '#',
        }
    }
}

/// An ordered stimulus script ending with exactly one recall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StimulusScript {
    symbols: Vec<Symbol>,
}

impl StimulusScript {
    /// The canonical script: `memoranda` letters, each followed by
    /// operations `1..=operations`, then recall.
    ///
    /// # Errors
    /// Returns `TbrsError::TooManyOperations` above 16 operations per item, or
    /// `TbrsError::Config` above 26 memoranda.
    pub fn build(memoranda: usize, operations: usize) -> Result<Self> {
        if operations > MAX_OPERATIONS_PER_ITEM {
            return Err(TbrsError::TooManyOperations {
                requested: operations,
                max: MAX_OPERATIONS_PER_ITEM,
            });
        }
        if memoranda > MAX_LABELLED_MEMORANDA {
            return Err(TbrsError::Config(format!(
                "at most {MAX_LABELLED_MEMORANDA} memoranda can be labelled (got {memoranda})"
            )));
        }
        let mut symbols = Vec::with_capacity(memoranda * (operations + 1) + 1);
        for i in 0..memoranda {
            symbols.push(Symbol::Memorandum(i));
            symbols.extend((1..=operations).map(Symbol::Operation));
        }
        symbols.push(Symbol::Recall);
        Ok(Self { symbols })
    }

    /// Parse the textual form.
    ///
    /// Whitespace is ignored. Everything after the first `#` is ignored; a
    /// script without `#` is recalled at its end.
    ///
    /// # Errors
    /// Returns `TbrsError::UnknownSymbol` for any other character.
    pub fn parse(text: &str) -> Result<Self> {
        let mut symbols = Vec::new();
        for (index, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let symbol = Symbol::from_char(c).ok_or(TbrsError::UnknownSymbol { symbol: c, index })?;
            symbols.push(symbol);
            if symbol == Symbol::Recall {
                break;
            }
        }
        if symbols.last() != Some(&Symbol::Recall) {
            symbols.push(Symbol::Recall);
        }
        Ok(Self { symbols })
    }

    /// The symbols in order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of serial positions the script studies.
    #[must_use]
    pub fn positions(&self) -> usize {
        self.symbols
            .iter()
            .filter(|s| matches!(s, Symbol::Memorandum(_)))
            .count()
    }

    /// Number of processing operations.
    #[must_use]
    pub fn operations(&self) -> usize {
        self.symbols
            .iter()
            .filter(|s| matches!(s, Symbol::Operation(_)))
            .count()
    }

    /// Memoranda in the order they are studied: the response expected at
    /// each serial position.
    #[must_use]
    pub fn studied_order(&self) -> Vec<ItemId> {
        self.symbols
            .iter()
            .filter_map(|s| match s {
                Symbol::Memorandum(i) => Some(ItemId::Memorandum(*i)),
                _ => None,
            })
            .collect()
    }

    /// Highest memorandum index the script names, if any.
    #[must_use]
    pub fn highest_memorandum(&self) -> Option<usize> {
        self.symbols
            .iter()
            .filter_map(|s| match s {
                Symbol::Memorandum(i) => Some(*i),
                _ => None,
            })
            .max()
    }
}

impl fmt::Display for StimulusScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{}", symbol.to_char())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_script() {
        let script = StimulusScript::build(3, 2).expect("build");
        assert_eq!(script.to_string(), "A12B12C12#");
        assert_eq!(script.positions(), 3);
        assert_eq!(script.operations(), 6);
        assert_eq!(StimulusScript::build(2, 0).expect("build").to_string(), "AB#");
    }

    #[test]
    fn extended_operation_range() {
        let script = StimulusScript::build(1, 16).expect("build");
        assert_eq!(script.to_string(), "A123456789:;<=>?@#");
        assert_eq!(StimulusScript::parse(&script.to_string()).expect("parse"), script);
    }

    #[test]
    fn studied_order_follows_the_letters() {
        let script = StimulusScript::parse("C1A2B#").expect("parse");
        assert_eq!(
            script.studied_order(),
            vec![ItemId::Memorandum(2), ItemId::Memorandum(0), ItemId::Memorandum(1)]
        );
        assert_eq!(
            StimulusScript::build(2, 1).expect("build").studied_order(),
            vec![ItemId::Memorandum(0), ItemId::Memorandum(1)]
        );
    }

    #[test]
    fn rejects_seventeen_operations() {
        assert!(matches!(
            StimulusScript::build(3, 17),
            Err(TbrsError::TooManyOperations { requested: 17, max: 16 })
        ));
    }

    #[test]
    fn parse_reports_unknown_symbols() {
        assert!(matches!(
            StimulusScript::parse("A1b#"),
            Err(TbrsError::UnknownSymbol { symbol: 'b', index: 2 })
        ));
    }

    #[test]
    fn parse_stops_at_recall_and_appends_missing_recall() {
        let script = StimulusScript::parse("A1 C#zzz").expect("parse");
        assert_eq!(
            script.symbols(),
            &[
                Symbol::Memorandum(0),
                Symbol::Operation(1),
                Symbol::Memorandum(2),
                Symbol::Recall
            ]
        );
        assert_eq!(script.highest_memorandum(), Some(2));
        assert_eq!(StimulusScript::parse("AB").expect("parse").to_string(), "AB#");
    }
}
