//! Block tree model for player-assembled scripts.
//!
//! A [`Program`] mirrors the editor's scripts area: an ordered run of
//! top-level blocks in which every `start` block opens an entry point.
//! Repeat blocks own their loop body, so nesting is expressed by ownership
//! rather than by sibling pointers. Trees are normalized while they are
//! built; once constructed they carry no failure modes.

/// Text format for scripts.
pub mod parser;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use parser::parse_program;

/// Convenience result alias for program construction.
pub type Result<T> = std::result::Result<T, ProgramError>;

/// Errors surfaced while building a program from text or JSON.
#[derive(Debug, Error)]
pub enum ProgramError {
    /// The script text is not well formed.
    #[error("invalid script syntax at line {line}: {message}")]
    Syntax {
        /// 1-based line of the offending token.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// A form named a block the engine does not know.
    #[error("unknown block `{0}`")]
    UnknownBlock(String),

    /// A move block named an unknown direction.
    #[error("unknown direction `{0}`")]
    UnknownDirection(String),

    /// A move block had no direction.
    #[error("move block requires a direction")]
    MissingDirection,

    /// A serialized program could not be decoded.
    #[error("invalid program JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Direction of a single actor step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards the top edge.
    Up,
    /// Towards the bottom edge.
    Down,
    /// Towards the left edge.
    Left,
    /// Towards the right edge.
    Right,
}

impl Direction {
    /// Lowercase name used in scripts and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(ProgramError::UnknownDirection(s.to_string())),
        }
    }
}

/// Number of iterations of a repeat block. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "CountRepr", into = "u32")]
pub struct RepeatCount(u32);

impl RepeatCount {
    /// Count used when the editor supplies nothing usable.
    pub const DEFAULT: u32 = 4;

    /// Normalize a raw integer; zero and negative values fall back to the default.
    pub fn new(raw: i64) -> Self {
        match u32::try_from(raw) {
            Ok(count) if count > 0 => RepeatCount(count),
            _ => RepeatCount(Self::DEFAULT),
        }
    }

    /// Normalize editor text by its leading integer, like the palette's
    /// `times` attribute. Anything unparsable becomes the default.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let digits_end = text
            .char_indices()
            .find(|&(i, ch)| !(ch.is_ascii_digit() || (i == 0 && (ch == '-' || ch == '+'))))
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        text[..digits_end]
            .parse::<i64>()
            .map(Self::new)
            .unwrap_or_default()
    }

    /// The iteration count.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for RepeatCount {
    fn default() -> Self {
        RepeatCount(Self::DEFAULT)
    }
}

impl From<RepeatCount> for u32 {
    fn from(count: RepeatCount) -> Self {
        count.0
    }
}

impl fmt::Display for RepeatCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Any shape an editor might hand us for a repeat count.
#[derive(Deserialize)]
#[serde(untagged)]
enum CountRepr {
    Integer(i64),
    Float(f64),
    Text(String),
    Null(()),
}

impl From<CountRepr> for RepeatCount {
    fn from(repr: CountRepr) -> Self {
        match repr {
            CountRepr::Integer(raw) => RepeatCount::new(raw),
            CountRepr::Float(raw) if raw.is_finite() => RepeatCount::new(raw.trunc() as i64),
            CountRepr::Text(text) => RepeatCount::parse(&text),
            CountRepr::Float(_) | CountRepr::Null(()) => RepeatCount::default(),
        }
    }
}

/// One block of a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockNode {
    /// Entry-point marker; its following sequence runs when the program starts.
    Start,
    /// Step the actor once.
    Move {
        /// Step direction.
        direction: Direction,
    },
    /// Try to eat the target.
    Eat,
    /// Run `body` `count` times.
    Repeat {
        /// Iteration count.
        #[serde(default)]
        count: RepeatCount,
        /// Loop body, in execution order.
        #[serde(default)]
        body: Vec<BlockNode>,
    },
}

impl BlockNode {
    /// Shorthand for a move block.
    pub fn step(direction: Direction) -> Self {
        BlockNode::Move { direction }
    }

    /// Shorthand for a repeat block with a raw count.
    pub fn repeat(count: i64, body: Vec<BlockNode>) -> Self {
        BlockNode::Repeat {
            count: RepeatCount::new(count),
            body,
        }
    }

    /// Ordered children; empty for everything but repeat blocks.
    pub fn children(&self) -> &[BlockNode] {
        match self {
            BlockNode::Repeat { body, .. } => body,
            _ => &[],
        }
    }

    /// Whether this block marks an entry point.
    pub fn is_start(&self) -> bool {
        matches!(self, BlockNode::Start)
    }

    /// Short name used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            BlockNode::Start => "start",
            BlockNode::Move { .. } => "move",
            BlockNode::Eat => "eat",
            BlockNode::Repeat { .. } => "repeat",
        }
    }

    /// Number of blocks in this subtree, including `self`.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(block) = pending.pop() {
            count += 1;
            pending.extend(block.children());
        }
        count
    }
}

/// A complete script as laid out in the scripts area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Display name, usually the source file stem.
    #[serde(default)]
    pub name: String,
    /// Top-level blocks in layout order.
    pub blocks: Vec<BlockNode>,
}

impl Program {
    /// Construct a program from its top-level blocks.
    pub fn new(name: impl Into<String>, blocks: Vec<BlockNode>) -> Self {
        Self {
            name: name.into(),
            blocks,
        }
    }

    /// Decode a program from its JSON form.
    ///
    /// serde_json caps nesting at 128 levels, which is about 64 nested
    /// repeats. Deeper documents fail with [`ProgramError::Json`]; the text
    /// format has no such cap.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode the program as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Sequences owned by each `start` block, in document order.
    ///
    /// `start` blocks are found at any depth, including inside repeat
    /// bodies. A sequence runs from the block after its `start` up to the
    /// next `start` in the same body, or to the end of that body. Blocks
    /// ahead of the first `start` of the top level belong to no entry point.
    pub fn entry_points(&self) -> EntryPoints<'_> {
        EntryPoints {
            pending: vec![(self.blocks.as_slice(), 0)],
        }
    }

    /// Whether at least one `start` block exists anywhere in the tree.
    pub fn has_entry_point(&self) -> bool {
        self.entry_points().next().is_some()
    }

    /// Total number of blocks in the tree.
    pub fn block_count(&self) -> usize {
        self.blocks.iter().map(BlockNode::size).sum()
    }
}

/// Depth-first iterator over the sequences following each `start` block.
#[derive(Debug, Clone)]
pub struct EntryPoints<'a> {
    // Sibling runs still to scan, with the index of the next block in each.
    pending: Vec<(&'a [BlockNode], usize)>,
}

impl<'a> Iterator for EntryPoints<'a> {
    type Item = &'a [BlockNode];

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((blocks, index)) = self.pending.pop() {
            let Some(block) = blocks.get(index) else {
                continue;
            };
            self.pending.push((blocks, index + 1));
            match block {
                BlockNode::Start => {
                    let start = index + 1;
                    let end = blocks[start..]
                        .iter()
                        .position(BlockNode::is_start)
                        .map(|offset| start + offset)
                        .unwrap_or(blocks.len());
                    return Some(&blocks[start..end]);
                }
                BlockNode::Repeat { body, .. } => self.pending.push((body, 0)),
                BlockNode::Move { .. } | BlockNode::Eat => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_count_normalizes_bad_values() {
        assert_eq!(RepeatCount::new(3).get(), 3);
        assert_eq!(RepeatCount::new(0).get(), 4);
        assert_eq!(RepeatCount::new(-2).get(), 4);
        assert_eq!(RepeatCount::parse("7").get(), 7);
        assert_eq!(RepeatCount::parse("10 times").get(), 10);
        assert_eq!(RepeatCount::parse("many").get(), 4);
        assert_eq!(RepeatCount::parse("").get(), 4);
    }

    #[test]
    fn repeat_count_deserializes_loose_input() {
        let json = r#"{"blocks": [
            {"kind": "repeat", "count": "3", "body": []},
            {"kind": "repeat", "count": null},
            {"kind": "repeat"},
            {"kind": "repeat", "count": 2.9}
        ]}"#;
        let program = Program::from_json(json).unwrap();
        let counts: Vec<u32> = program
            .blocks
            .iter()
            .map(|block| match block {
                BlockNode::Repeat { count, .. } => count.get(),
                _ => panic!("expected repeat"),
            })
            .collect();
        assert_eq!(counts, vec![3, 4, 4, 2]);
    }

    #[test]
    fn entry_points_split_at_each_start() {
        let program = Program::new(
            "two-scripts",
            vec![
                BlockNode::Eat,
                BlockNode::Start,
                BlockNode::step(Direction::Right),
                BlockNode::Start,
                BlockNode::step(Direction::Up),
                BlockNode::Eat,
            ],
        );

        let entries: Vec<&[BlockNode]> = program.entry_points().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], &[BlockNode::step(Direction::Right)][..]);
        assert_eq!(
            entries[1],
            &[BlockNode::step(Direction::Up), BlockNode::Eat][..]
        );
    }

    #[test]
    fn empty_and_adjacent_starts() {
        let program = Program::new("", vec![BlockNode::Start, BlockNode::Start]);
        let entries: Vec<&[BlockNode]> = program.entry_points().collect();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|sequence| sequence.is_empty()));

        assert_eq!(Program::default().entry_points().count(), 0);
        assert!(!Program::new("", vec![BlockNode::Eat]).has_entry_point());
    }

    #[test]
    fn entry_points_inside_repeat_bodies_follow_document_order() {
        let program = Program::new(
            "nested",
            vec![
                BlockNode::Start,
                BlockNode::step(Direction::Up),
                BlockNode::repeat(
                    2,
                    vec![
                        BlockNode::Eat,
                        BlockNode::Start,
                        BlockNode::step(Direction::Right),
                        BlockNode::repeat(3, vec![BlockNode::Start, BlockNode::Eat]),
                    ],
                ),
                BlockNode::step(Direction::Down),
            ],
        );

        let entries: Vec<&[BlockNode]> = program.entry_points().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].len(), 3);
        assert_eq!(entries[1][0], BlockNode::step(Direction::Right));
        assert_eq!(entries[1].len(), 2);
        assert_eq!(entries[2], &[BlockNode::Eat][..]);
    }

    #[test]
    fn nested_start_alone_is_an_entry_point() {
        let program = Program::new(
            "",
            vec![BlockNode::repeat(
                2,
                vec![BlockNode::Start, BlockNode::step(Direction::Right)],
            )],
        );
        assert!(program.has_entry_point());
        let entries: Vec<&[BlockNode]> = program.entry_points().collect();
        assert_eq!(entries, vec![&[BlockNode::step(Direction::Right)][..]]);
    }

    #[test]
    fn nested_repeats_round_trip_through_json() {
        let program = Program::new(
            "nested",
            vec![
                BlockNode::Start,
                BlockNode::repeat(
                    2,
                    vec![
                        BlockNode::repeat(3, vec![BlockNode::step(Direction::Left)]),
                        BlockNode::Eat,
                    ],
                ),
            ],
        );
        let json = program.to_json_pretty().unwrap();
        assert!(json.contains("\"kind\": \"repeat\""));
        assert_eq!(Program::from_json(&json).unwrap(), program);
        assert_eq!(program.block_count(), 5);
    }

    #[test]
    fn overly_deep_json_is_rejected() {
        let depth = 200;
        let json = format!(
            r#"{{"name":"deep","blocks":[{{"kind":"start"}},{}{{"kind":"eat"}}{}]}}"#,
            r#"{"kind":"repeat","count":1,"body":["#.repeat(depth),
            "]}".repeat(depth)
        );
        assert!(matches!(
            Program::from_json(&json),
            Err(ProgramError::Json(_))
        ));
    }

    #[test]
    fn direction_parsing_is_case_insensitive() {
        assert_eq!("UP".parse::<Direction>().unwrap(), Direction::Up);
        assert!(matches!(
            "north".parse::<Direction>(),
            Err(ProgramError::UnknownDirection(_))
        ));
    }
}
