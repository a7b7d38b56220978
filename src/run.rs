//! Table-driven execution of a compiled automaton.
//!
//! [`RunAutomaton`] flattens a determinized automaton into a row-major
//! transition table indexed by `state * classes + class`, where a class is
//! an interval between two consecutive start points. The table is immutable
//! once built and cheap to query; [`Matcher`] layers leftmost-longest
//! scanning on top of it.

use bit_set::BitSet;

use crate::automaton::{Automaton, CodePoint, MAX_CODE_POINT};
use crate::error::Error;

const NO_STATE: u32 = u32::MAX;

/// A deterministic automaton compiled to flat lookup tables.
#[derive(Debug, Clone)]
pub struct RunAutomaton {
    points: Vec<CodePoint>,
    initial: usize,
    size: usize,
    accept: BitSet,
    transitions: Vec<u32>,
    classmap: Option<Vec<u32>>,
}

impl RunAutomaton {
    /// Compiles `a`, determinizing it first. With `tableize`, character
    /// classes resolve through a direct-indexed table over the whole
    /// alphabet instead of a binary search: O(1) lookups for 128 KiB.
    pub fn new(a: &mut Automaton, tableize: bool) -> RunAutomaton {
        a.determinize();
        a.expand_singleton();
        let points = a.start_points();
        let states = a.reachable_states();
        let number = Automaton::number_states(&states);
        let size = states.len();
        let m = points.len();
        let mut accept = BitSet::with_capacity(size);
        let mut transitions = vec![NO_STATE; size * m];
        for (i, &sid) in states.iter().enumerate() {
            if a.state(sid).accept() {
                accept.insert(i);
            }
            for (c, &point) in points.iter().enumerate() {
                if let Some(q) = a.step(sid, point) {
                    transitions[i * m + c] = number[q as usize] as u32;
                }
            }
        }
        let initial = number[a.initial() as usize];
        let classmap = if tableize {
            let mut map = vec![0u32; usize::from(MAX_CODE_POINT) + 1];
            let mut class = 0;
            for (c, slot) in map.iter_mut().enumerate() {
                if class + 1 < points.len() && c == usize::from(points[class + 1]) {
                    class += 1;
                }
                *slot = class as u32;
            }
            Some(map)
        } else {
            None
        };
        RunAutomaton {
            points,
            initial,
            size,
            accept,
            transitions,
            classmap,
        }
    }

    /// Number of states in the compiled automaton.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn initial(&self) -> usize {
        self.initial
    }

    pub fn is_accept(&self, state: usize) -> bool {
        self.accept.contains(state)
    }

    /// The character class of `c`: the index of the interval of consecutive
    /// start points containing it.
    pub fn char_class(&self, c: CodePoint) -> usize {
        match &self.classmap {
            Some(map) => map[usize::from(c)] as usize,
            // points[0] is always MIN_CODE_POINT, so the result is >= 1
            None => self.points.partition_point(|&p| p <= c) - 1,
        }
    }

    /// The state reached from `state` on `c`, or `None` if there is none
    /// (equivalently: a dead state would be entered in the totalized
    /// automaton).
    pub fn step(&self, state: usize, c: CodePoint) -> Option<usize> {
        let dest = self.transitions[state * self.points.len() + self.char_class(c)];
        if dest == NO_STATE {
            None
        } else {
            Some(dest as usize)
        }
    }

    /// Whether the automaton accepts `s`. Linear in the input length.
    pub fn run(&self, s: &str) -> bool {
        let mut p = self.initial;
        for c in s.encode_utf16() {
            match self.step(p, c) {
                Some(q) => p = q,
                None => return false,
            }
        }
        self.is_accept(p)
    }

    /// A matcher scanning `input` for successive non-overlapping matches.
    pub fn matcher(&self, input: &str) -> Matcher<'_> {
        Matcher {
            automaton: self,
            chars: input.encode_utf16().collect(),
            scan: Scan::Fresh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Fresh,
    Matched { start: usize, end: usize },
    Exhausted,
}

/// Scans one input for successive leftmost-longest matches.
///
/// Offsets are in UTF-16 code units. The matcher carries scan position, so
/// use one matcher per input.
#[derive(Debug, Clone)]
pub struct Matcher<'a> {
    automaton: &'a RunAutomaton,
    chars: Vec<CodePoint>,
    scan: Scan,
}

impl<'a> Matcher<'a> {
    /// Advances to the next match and reports whether one was found.
    ///
    /// For each scan start the walk records the offset of the *last*
    /// acceptance seen, so the reported match is the longest one beginning
    /// there. Scanning resumes after the previous match, or one unit past
    /// its start if it was empty, which guarantees progress on nullable
    /// patterns.
    pub fn find(&mut self) -> bool {
        let mut begin = match self.scan {
            Scan::Exhausted => return false,
            Scan::Fresh => 0,
            Scan::Matched { start, end } => {
                let mut b = end;
                if b == start {
                    b += 1;
                    if b > self.chars.len() {
                        self.scan = Scan::Exhausted;
                        return false;
                    }
                }
                b
            }
        };
        let mut found = if self.automaton.is_accept(self.automaton.initial()) {
            Some((begin, begin))
        } else {
            None
        };
        while begin < self.chars.len() {
            let mut p = self.automaton.initial();
            for i in begin..self.chars.len() {
                match self.automaton.step(p, self.chars[i]) {
                    None => break,
                    Some(q) => {
                        if self.automaton.is_accept(q) {
                            found = Some((begin, i + 1));
                        }
                        p = q;
                    }
                }
            }
            if let Some((start, end)) = found {
                self.scan = Scan::Matched { start, end };
                return true;
            }
            begin += 1;
        }
        match found {
            Some((start, end)) => {
                self.scan = Scan::Matched { start, end };
                true
            }
            None => {
                self.scan = Scan::Exhausted;
                false
            }
        }
    }

    /// Start offset of the last match.
    pub fn start(&self) -> Result<usize, Error> {
        match self.scan {
            Scan::Matched { start, .. } => Ok(start),
            _ => Err(Error::NoMatch),
        }
    }

    /// End offset (exclusive) of the last match.
    pub fn end(&self) -> Result<usize, Error> {
        match self.scan {
            Scan::Matched { end, .. } => Ok(end),
            _ => Err(Error::NoMatch),
        }
    }

    /// The text of the last match.
    pub fn group(&self) -> Result<String, Error> {
        match self.scan {
            Scan::Matched { start, end } => Ok(String::from_utf16_lossy(&self.chars[start..end])),
            _ => Err(Error::NoMatch),
        }
    }

    /// Clears match state so the input can be scanned again.
    pub fn reset(&mut self) {
        self.scan = Scan::Fresh;
    }
}
