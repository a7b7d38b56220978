//! Regular expression syntax trees.
//!
//! The grammar is parsed by recursive descent:
//!
//! ```text
//! union  = concat ( '|' union )
//! concat = repeat ( concat )
//! repeat = charclass ( '?' | '*' | '+' | '{n}' | '{n,}' | '{n,m}' )*
//! charclass = '[' ( '^' )? classes ']' | simple
//! simple = '.' | '(' union ')' | '()' | char
//! ```
//!
//! Adjacent characters and literals merge into a single literal node, which
//! is what lets literal subpatterns translate to singleton automata.
//! Intersection and complement node kinds exist (negated classes parse into
//! them) but are fences: [`Regex::to_automaton`] rejects them.

use std::fmt;
use std::str::FromStr;

use crate::automaton::{Automaton, CodePoint};
use crate::error::Error;

/// A node of the regular-expression syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regex {
    /// `a|b`
    Union(Box<Regex>, Box<Regex>),
    /// Sequencing.
    Concat(Box<Regex>, Box<Regex>),
    /// Reserved; rejected by translation.
    Intersection(Box<Regex>, Box<Regex>),
    /// `a?`
    Optional(Box<Regex>),
    /// `a*`
    Repeat(Box<Regex>),
    /// `a{n,}`
    RepeatMin(Box<Regex>, u32),
    /// `a{n,m}`
    RepeatMinMax(Box<Regex>, u32, u32),
    /// Reserved; rejected by translation.
    Complement(Box<Regex>),
    /// A single character.
    Char(char),
    /// An inclusive character range.
    CharRange(char, char),
    /// `.`
    AnyChar,
    /// A literal string, possibly empty.
    Literal(String),
}

impl Regex {
    /// Translates the tree into an automaton, minimizing after each
    /// constructed subautomaton.
    pub fn to_automaton(&self) -> Result<Automaton, Error> {
        self.translate(true)
    }

    /// Translates without intermediate minimization: cheaper to build, but
    /// the result stays nondeterministic until the caller minimizes.
    pub fn to_automaton_unminimized(&self) -> Result<Automaton, Error> {
        self.translate(false)
    }

    fn translate(&self, minimize: bool) -> Result<Automaton, Error> {
        let mut a = match self {
            Regex::Union(..) => {
                let mut leaves = Vec::new();
                self.flatten_union(&mut leaves);
                let mut ops = Vec::with_capacity(leaves.len());
                for leaf in leaves {
                    ops.push(leaf.translate(minimize)?);
                }
                Automaton::union(ops)
            }
            Regex::Concat(..) => {
                let mut leaves = Vec::new();
                self.flatten_concat(&mut leaves);
                let mut ops = Vec::with_capacity(leaves.len());
                for leaf in leaves {
                    ops.push(leaf.translate(minimize)?);
                }
                Automaton::concatenate(ops)
            }
            Regex::Intersection(..) => return Err(Error::Unsupported("intersection")),
            Regex::Complement(..) => return Err(Error::Unsupported("complement")),
            Regex::Optional(e) => e.translate(minimize)?.optional(),
            Regex::Repeat(e) => e.translate(minimize)?.repeat(),
            Regex::RepeatMin(e, min) => e.translate(minimize)?.repeat_min(*min),
            Regex::RepeatMinMax(e, min, max) => e.translate(minimize)?.repeat_range(*min, *max),
            Regex::Char(c) => Automaton::make_char(*c),
            Regex::CharRange(lo, hi) => {
                Automaton::make_char_range(code_unit(*lo)?, code_unit(*hi)?)
            }
            Regex::AnyChar => Automaton::make_any_char(),
            Regex::Literal(s) => Automaton::make_string(s),
        };
        if minimize {
            a.minimize();
        }
        Ok(a)
    }

    /// Collects the leaves of a maximal same-kind union chain, so an n-ary
    /// union builds one broad splice instead of a deep nested chain.
    fn flatten_union<'a>(&'a self, out: &mut Vec<&'a Regex>) {
        match self {
            Regex::Union(a, b) => {
                a.flatten_union(out);
                b.flatten_union(out);
            }
            _ => out.push(self),
        }
    }

    fn flatten_concat<'a>(&'a self, out: &mut Vec<&'a Regex>) {
        match self {
            Regex::Concat(a, b) => {
                a.flatten_concat(out);
                b.flatten_concat(out);
            }
            _ => out.push(self),
        }
    }
}

/// Range endpoints must stay within the 16-bit alphabet.
fn code_unit(c: char) -> Result<CodePoint, Error> {
    if (c as u32) <= u32::from(crate::automaton::MAX_CODE_POINT) {
        Ok(c as CodePoint)
    } else {
        Err(Error::Unsupported(
            "character ranges beyond the basic multilingual plane",
        ))
    }
}

fn text_of(r: &Regex) -> Option<String> {
    match r {
        Regex::Char(c) => Some(c.to_string()),
        Regex::Literal(s) => Some(s.clone()),
        _ => None,
    }
}

/// Concatenation that merges adjacent characters and literals, including
/// across the edge of an existing concatenation node.
fn concat(a: Regex, b: Regex) -> Regex {
    if let (Some(x), Some(y)) = (text_of(&a), text_of(&b)) {
        return Regex::Literal(x + &y);
    }
    if let Regex::Concat(a1, a2) = &a {
        if let (Some(x), Some(y)) = (text_of(a2), text_of(&b)) {
            return Regex::Concat(a1.clone(), Box::new(Regex::Literal(x + &y)));
        }
    }
    if let Regex::Concat(b1, b2) = &b {
        if let (Some(x), Some(y)) = (text_of(&a), text_of(b1)) {
            return Regex::Concat(Box::new(Regex::Literal(x + &y)), b2.clone());
        }
    }
    Regex::Concat(Box::new(a), Box::new(b))
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regex::Union(a, b) => write!(f, "({}|{})", a, b),
            Regex::Concat(a, b) => write!(f, "{}{}", a, b),
            Regex::Intersection(a, b) => write!(f, "({}&{})", a, b),
            Regex::Optional(a) => write!(f, "({})?", a),
            Regex::Repeat(a) => write!(f, "({})*", a),
            Regex::RepeatMin(a, min) => write!(f, "({}){{{},}}", a, min),
            Regex::RepeatMinMax(a, min, max) => write!(f, "({}){{{},{}}}", a, min, max),
            Regex::Complement(a) => write!(f, "~({})", a),
            Regex::Char(c) => write!(f, "{}", c),
            Regex::CharRange(lo, hi) => write!(f, "[{}-{}]", lo, hi),
            Regex::AnyChar => write!(f, "."),
            Regex::Literal(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for Regex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Regex, Error> {
        Parser::new(s).parse()
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(s: &str) -> Parser {
        Parser {
            chars: s.chars().collect(),
            pos: 0,
        }
    }

    fn parse(&mut self) -> Result<Regex, Error> {
        if self.chars.is_empty() {
            return Ok(Regex::Literal(String::new()));
        }
        let n = self.parse_union()?;
        if self.pos < self.chars.len() {
            return Err(Error::parse(self.pos, "end of pattern expected"));
        }
        Ok(n)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.chars.get(self.pos) == Some(&c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn next(&mut self) -> Result<char, Error> {
        match self.chars.get(self.pos) {
            Some(&c) => {
                self.pos += 1;
                Ok(c)
            }
            None => Err(Error::parse(self.pos, "unexpected end of pattern")),
        }
    }

    fn more(&self) -> bool {
        self.pos < self.chars.len()
    }

    fn peek(&self, any_of: &str) -> bool {
        match self.chars.get(self.pos) {
            Some(&c) => any_of.contains(c),
            None => false,
        }
    }

    fn parse_union(&mut self) -> Result<Regex, Error> {
        // intersection '&' sits between union and concatenation in the
        // reserved grammar; it has no surface syntax here
        let n = self.parse_concat()?;
        if self.eat('|') {
            return Ok(Regex::Union(Box::new(n), Box::new(self.parse_union()?)));
        }
        Ok(n)
    }

    fn parse_concat(&mut self) -> Result<Regex, Error> {
        let n = self.parse_repeat()?;
        if self.more() && !self.peek(")|") {
            return Ok(concat(n, self.parse_concat()?));
        }
        Ok(n)
    }

    fn parse_repeat(&mut self) -> Result<Regex, Error> {
        let mut n = self.parse_char_class_exp()?;
        while self.peek("?*+{") {
            if self.eat('?') {
                n = Regex::Optional(Box::new(n));
            } else if self.eat('*') {
                n = Regex::Repeat(Box::new(n));
            } else if self.eat('+') {
                n = Regex::RepeatMin(Box::new(n), 1);
            } else if self.eat('{') {
                let min = self.parse_int()?;
                n = if self.eat(',') {
                    if self.peek("0123456789") {
                        let max = self.parse_int()?;
                        Regex::RepeatMinMax(Box::new(n), min, max)
                    } else {
                        Regex::RepeatMin(Box::new(n), min)
                    }
                } else {
                    Regex::RepeatMinMax(Box::new(n), min, min)
                };
                if !self.eat('}') {
                    return Err(Error::parse(self.pos, "expected '}'"));
                }
            }
        }
        Ok(n)
    }

    fn parse_int(&mut self) -> Result<u32, Error> {
        let start = self.pos;
        while self.peek("0123456789") {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(Error::parse(self.pos, "integer expected"));
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse::<u32>()
            .map_err(|_| Error::parse(start, "integer out of range"))
    }

    fn parse_char_class_exp(&mut self) -> Result<Regex, Error> {
        if self.eat('[') {
            let negate = self.eat('^');
            let mut n = self.parse_char_classes()?;
            if negate {
                n = Regex::Intersection(
                    Box::new(Regex::AnyChar),
                    Box::new(Regex::Complement(Box::new(n))),
                );
            }
            if !self.eat(']') {
                return Err(Error::parse(self.pos, "expected ']'"));
            }
            Ok(n)
        } else {
            self.parse_simple()
        }
    }

    fn parse_char_classes(&mut self) -> Result<Regex, Error> {
        let mut n = self.parse_char_class()?;
        while self.more() && !self.peek("]") {
            n = Regex::Union(Box::new(n), Box::new(self.parse_char_class()?));
        }
        Ok(n)
    }

    fn parse_char_class(&mut self) -> Result<Regex, Error> {
        let c = self.parse_char()?;
        if self.eat('-') {
            if self.peek("]") {
                // a trailing '-' is a literal
                Ok(Regex::Union(
                    Box::new(Regex::Char(c)),
                    Box::new(Regex::Char('-')),
                ))
            } else {
                Ok(Regex::CharRange(c, self.parse_char()?))
            }
        } else {
            Ok(Regex::Char(c))
        }
    }

    fn parse_char(&mut self) -> Result<char, Error> {
        self.eat('\\');
        self.next()
    }

    fn parse_simple(&mut self) -> Result<Regex, Error> {
        if self.eat('.') {
            Ok(Regex::AnyChar)
        } else if self.eat('(') {
            if self.eat(')') {
                return Ok(Regex::Literal(String::new()));
            }
            let n = self.parse_union()?;
            if !self.eat(')') {
                return Err(Error::parse(self.pos, "expected ')'"));
            }
            Ok(n)
        } else {
            Ok(Regex::Char(self.parse_char()?))
        }
    }
}
