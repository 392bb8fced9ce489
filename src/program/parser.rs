use std::fmt;

use super::{BlockNode, Direction, Program, ProgramError, RepeatCount, Result};

/// Parse script text into a [`Program`].
///
/// Scripts are a sequence of parenthesized forms, one per block:
///
/// ```text
/// ; walk right, then climb to the food
/// (start)
/// (repeat 8 (move right))
/// (move up) (move up)
/// (eat)
/// ```
///
/// Open forms are kept on an explicit stack and turned into blocks as they
/// close, so nesting depth is limited only by memory.
pub fn parse_program(name: impl Into<String>, source: &str) -> Result<Program> {
    let mut tokens = Tokens::new(source);
    let mut open: Vec<OpenForm> = Vec::new();
    let mut blocks = Vec::new();

    while let Some((token, line)) = tokens.next_token() {
        match token {
            Token::Open => open.push(OpenForm {
                line,
                items: Vec::new(),
            }),
            Token::Close => {
                let form = open.pop().ok_or_else(|| syntax(line, "unexpected `)`"))?;
                let block = form.into_block()?;
                match open.last_mut() {
                    Some(parent) => parent.items.push(Item::Block(block)),
                    None => blocks.push(block),
                }
            }
            Token::Atom(atom) => match open.last_mut() {
                Some(form) => form.items.push(Item::Atom(atom)),
                None => {
                    return Err(syntax(line, format!("expected a block form, found `{atom}`")));
                }
            },
        }
    }

    if let Some(form) = open.last() {
        return Err(syntax(form.line, "unterminated form"));
    }
    Ok(Program::new(name, blocks))
}

#[derive(Debug, Clone, PartialEq)]
enum Atom {
    Symbol(String),
    Integer(i64),
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Symbol(sym) => f.write_str(sym),
            Atom::Integer(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug)]
enum Token {
    Open,
    Close,
    Atom(Atom),
}

/// Contents of a form whose closing paren has not been seen yet. Nested
/// forms are already blocks by the time they land here.
#[derive(Debug)]
enum Item {
    Atom(Atom),
    Block(BlockNode),
}

#[derive(Debug)]
struct OpenForm {
    line: usize,
    items: Vec<Item>,
}

impl OpenForm {
    fn into_block(self) -> Result<BlockNode> {
        let line = self.line;
        let mut items = self.items.into_iter();
        let head = match items.next() {
            Some(Item::Atom(Atom::Symbol(head))) => head.to_ascii_lowercase(),
            Some(_) => return Err(syntax(line, "block form must start with a name")),
            None => return Err(syntax(line, "empty block form")),
        };

        match head.as_str() {
            "start" => {
                expect_no_args(&head, items, line)?;
                Ok(BlockNode::Start)
            }
            "eat" => {
                expect_no_args(&head, items, line)?;
                Ok(BlockNode::Eat)
            }
            "move" => {
                let direction = match items.next() {
                    Some(Item::Atom(Atom::Symbol(dir))) => dir.parse::<Direction>()?,
                    Some(Item::Atom(Atom::Integer(value))) => {
                        return Err(ProgramError::UnknownDirection(value.to_string()));
                    }
                    Some(Item::Block(_)) => {
                        return Err(syntax(line, "move direction must be a name"));
                    }
                    None => return Err(ProgramError::MissingDirection),
                };
                expect_no_args(&head, items, line)?;
                Ok(BlockNode::Move { direction })
            }
            "repeat" => {
                let mut items = items.peekable();
                let count = match items.peek() {
                    Some(Item::Atom(Atom::Integer(value))) => RepeatCount::new(*value),
                    Some(Item::Atom(Atom::Symbol(text))) => RepeatCount::parse(text),
                    _ => RepeatCount::default(),
                };
                if matches!(items.peek(), Some(Item::Atom(_))) {
                    items.next();
                }
                let body = items
                    .map(|item| match item {
                        Item::Block(block) => Ok(block),
                        Item::Atom(atom) => Err(syntax(
                            line,
                            format!("expected a block form, found `{atom}`"),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(BlockNode::Repeat { count, body })
            }
            _ => Err(ProgramError::UnknownBlock(head)),
        }
    }
}

fn expect_no_args(head: &str, mut rest: impl Iterator<Item = Item>, line: usize) -> Result<()> {
    match rest.next() {
        None => Ok(()),
        Some(_) => Err(syntax(line, format!("unexpected argument to `{head}`"))),
    }
}

fn syntax(line: usize, message: impl Into<String>) -> ProgramError {
    ProgramError::Syntax {
        line,
        message: message.into(),
    }
}

/// Splits script text into parens and atoms, tracking the current line.
struct Tokens<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) {
        if self.peek_byte() == Some(b'\n') {
            self.line += 1;
        }
        self.pos += 1;
    }

    /// Next token and the line it starts on; `None` at end of input.
    fn next_token(&mut self) -> Option<(Token, usize)> {
        loop {
            match self.peek_byte()? {
                b';' => {
                    while self.peek_byte().is_some_and(|b| b != b'\n') {
                        self.bump();
                    }
                }
                b if b.is_ascii_whitespace() => self.bump(),
                _ => break,
            }
        }

        let line = self.line;
        let token = match self.peek_byte()? {
            b'(' => {
                self.bump();
                Token::Open
            }
            b')' => {
                self.bump();
                Token::Close
            }
            _ => {
                let text = self.text;
                let start = self.pos;
                while self.peek_byte().is_some_and(is_atom_byte) {
                    self.bump();
                }
                let word = &text[start..self.pos];
                Token::Atom(match word.parse::<i64>() {
                    Ok(value) => Atom::Integer(value),
                    Err(_) => Atom::Symbol(word.to_string()),
                })
            }
        };
        Some((token, line))
    }
}

fn is_atom_byte(b: u8) -> bool {
    !(b.is_ascii_whitespace() || b == b'(' || b == b')' || b == b';')
}
