//! Finite automata over 16-bit code units.
//!
//! An [`Automaton`] owns its states in an arena (`Vec<State>`); states refer
//! to each other by index, so the graph may contain cycles and cloning the
//! automaton is a deep clone of the whole graph. Epsilon transitions are not
//! a separate edge kind: sequencing and branching are realized by *splicing*
//! (copying the target state's outgoing transitions, and its accept flag,
//! into the source state). The copy is taken at splice time, so later edits
//! to the target do not leak into the source.
//!
//! A common special case is the automaton accepting exactly one string; it
//! is kept as the `singleton` field without any materialized states until an
//! operation needs the explicit graph (see [`Automaton::expand_singleton`]).

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use bit_set::BitSet;
use vec_map::VecMap;

use crate::error::Error;

/// A 16-bit code unit. Inputs are decoded with [`str::encode_utf16`].
pub type CodePoint = u16;

/// Index of a state in its automaton's arena.
pub type StateId = u32;

/// Smallest code unit in the alphabet.
pub const MIN_CODE_POINT: CodePoint = 0;
/// Largest code unit in the alphabet.
pub const MAX_CODE_POINT: CodePoint = 0xffff;

/// An edge labeled with an inclusive code-unit interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub(crate) min: CodePoint,
    pub(crate) max: CodePoint,
    pub(crate) to: StateId,
}

impl Transition {
    /// Builds a transition, rejecting inverted intervals.
    pub fn new(min: CodePoint, max: CodePoint, to: StateId) -> Result<Transition, Error> {
        if min > max {
            return Err(Error::InvalidInterval { min, max });
        }
        Ok(Transition { min, max, to })
    }

    pub fn min(&self) -> CodePoint {
        self.min
    }

    pub fn max(&self) -> CodePoint {
        self.max
    }

    pub fn to(&self) -> StateId {
        self.to
    }
}

/// A node of the state graph: an accept flag plus outgoing transitions.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub(crate) accept: bool,
    pub(crate) trans: Vec<Transition>,
}

impl State {
    pub fn accept(&self) -> bool {
        self.accept
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.trans
    }
}

/// A finite automaton; nondeterministic in general, see `is_deterministic`.
#[derive(Debug, Clone)]
pub struct Automaton {
    pub(crate) states: Vec<State>,
    pub(crate) initial: StateId,
    pub(crate) deterministic: bool,
    pub(crate) singleton: Option<String>,
    pub(crate) hash_code: u64,
}

impl Automaton {
    fn new() -> Automaton {
        Automaton {
            states: vec![State::default()],
            initial: 0,
            deterministic: true,
            singleton: None,
            hash_code: 0,
        }
    }

    /// The automaton accepting no string at all.
    pub fn make_empty() -> Automaton {
        Automaton::new()
    }

    /// The automaton accepting exactly the empty string.
    pub fn make_empty_string() -> Automaton {
        let mut a = Automaton::new();
        a.singleton = Some(String::new());
        a
    }

    /// The automaton accepting exactly the one-character string `c`.
    pub fn make_char(c: char) -> Automaton {
        Automaton::make_string(&c.to_string())
    }

    /// The automaton accepting exactly the string `s`.
    pub fn make_string(s: &str) -> Automaton {
        let mut a = Automaton::new();
        a.singleton = Some(s.to_string());
        a
    }

    /// The automaton accepting any single code unit in `[lo, hi]`.
    /// `lo > hi` yields the empty language.
    pub fn make_char_range(lo: CodePoint, hi: CodePoint) -> Automaton {
        if lo == hi {
            if let Some(c) = char::from_u32(u32::from(lo)) {
                return Automaton::make_char(c);
            }
        }
        let mut a = Automaton::new();
        if lo <= hi {
            let to = a.new_state();
            a.states[to as usize].accept = true;
            a.add_transition(a.initial, Transition { min: lo, max: hi, to });
        }
        a
    }

    /// The automaton accepting any single code unit.
    pub fn make_any_char() -> Automaton {
        Automaton::make_char_range(MIN_CODE_POINT, MAX_CODE_POINT)
    }

    pub fn initial(&self) -> StateId {
        self.initial
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id as usize]
    }

    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    pub fn is_singleton(&self) -> bool {
        self.singleton.is_some()
    }

    /// The string this automaton is a singleton for, if it is one.
    pub fn singleton(&self) -> Option<&str> {
        self.singleton.as_deref()
    }

    /// True if the automaton accepts no string.
    pub fn is_empty(&self) -> bool {
        if self.is_singleton() {
            return false;
        }
        let initial = &self.states[self.initial as usize];
        !initial.accept && initial.trans.is_empty()
    }

    fn is_empty_string(&self) -> bool {
        self.singleton.as_deref() == Some("")
    }

    /// Number of reachable states (singletons count without expanding).
    pub fn state_count(&self) -> usize {
        match &self.singleton {
            Some(s) => s.encode_utf16().count() + 1,
            None => self.reachable_states().len(),
        }
    }

    /// Number of transitions of reachable states.
    pub fn transition_count(&self) -> usize {
        match &self.singleton {
            Some(s) => s.encode_utf16().count(),
            None => self
                .reachable_states()
                .iter()
                .map(|&s| self.states[s as usize].trans.len())
                .sum(),
        }
    }

    pub(crate) fn new_state(&mut self) -> StateId {
        self.states.push(State::default());
        self.states.len() as StateId - 1
    }

    /// Adds `t` to `from`. A transition whose `(min, max)` interval is
    /// already present on `from` is logged and dropped, whatever its
    /// destination; the automaton stays usable.
    pub(crate) fn add_transition(&mut self, from: StateId, t: Transition) {
        let state = &mut self.states[from as usize];
        if state
            .trans
            .iter()
            .any(|u| u.min == t.min && u.max == t.max)
        {
            log::warn!(
                "dropping transition with duplicate interval [{:#06x}, {:#06x}]",
                t.min,
                t.max
            );
            return;
        }
        state.trans.push(t);
    }

    /// Splices `to` into `from`: copies `to`'s current transitions and
    /// propagates its accept flag. This is the epsilon-transition encoding;
    /// the copy must happen before any further composition touches `to`.
    pub(crate) fn add_epsilon(&mut self, from: StateId, to: StateId) {
        if self.states[to as usize].accept {
            self.states[from as usize].accept = true;
        }
        let spliced = self.states[to as usize].trans.clone();
        for t in spliced {
            self.add_transition(from, t);
        }
    }

    /// Materializes a singleton automaton as a chain of states, one per
    /// UTF-16 code unit. No-op otherwise.
    pub fn expand_singleton(&mut self) {
        if let Some(s) = self.singleton.take() {
            let mut p = self.new_state();
            self.initial = p;
            for c in s.encode_utf16() {
                let q = self.new_state();
                self.add_transition(p, Transition { min: c, max: c, to: q });
                p = q;
            }
            self.states[p as usize].accept = true;
            self.deterministic = true;
        }
    }

    /// Reachable states in BFS order from the initial state.
    pub(crate) fn reachable_states(&self) -> Vec<StateId> {
        let mut seen = BitSet::new();
        let mut order = Vec::new();
        let mut worklist = VecDeque::new();
        seen.insert(self.initial as usize);
        worklist.push_back(self.initial);
        while let Some(s) = worklist.pop_front() {
            order.push(s);
            for t in &self.states[s as usize].trans {
                if seen.insert(t.to as usize) {
                    worklist.push_back(t.to);
                }
            }
        }
        order
    }

    pub(crate) fn accept_states(&self) -> Vec<StateId> {
        self.reachable_states()
            .into_iter()
            .filter(|&s| self.states[s as usize].accept)
            .collect()
    }

    /// Maps arena ids of `states` to dense indices `0..states.len()`.
    pub(crate) fn number_states(states: &[StateId]) -> VecMap<usize> {
        let mut numbers = VecMap::new();
        for (i, &s) in states.iter().enumerate() {
            numbers.insert(s as usize, i);
        }
        numbers
    }

    /// The sorted interval start points of all transitions: the coarsest
    /// alphabet refinement on which every state's reachable set is constant.
    pub fn start_points(&mut self) -> Vec<CodePoint> {
        self.expand_singleton();
        let mut points = BTreeSet::new();
        points.insert(MIN_CODE_POINT);
        for &s in &self.reachable_states() {
            for t in &self.states[s as usize].trans {
                points.insert(t.min);
                if t.max < MAX_CODE_POINT {
                    points.insert(t.max + 1);
                }
            }
        }
        points.into_iter().collect()
    }

    /// Destination of the unique transition of `s` containing `c`, if any.
    /// Meaningful on deterministic automata only.
    pub(crate) fn step(&self, s: StateId, c: CodePoint) -> Option<StateId> {
        self.states[s as usize]
            .trans
            .iter()
            .find(|t| t.min <= c && c <= t.max)
            .map(|t| t.to)
    }

    pub(crate) fn clear_hash(&mut self) {
        self.hash_code = 0;
    }

    pub(crate) fn recompute_hash(&mut self) {
        let h = self.state_count() as u64 * 3 + self.transition_count() as u64 * 2;
        self.hash_code = if h == 0 { 1 } else { h };
    }

    /// Appends another (already expanded) automaton's states to this arena,
    /// rebasing its internal transitions. Returns the id offset.
    fn append_states(&mut self, other: Automaton) -> StateId {
        debug_assert!(!other.is_singleton());
        let offset = self.states.len() as StateId;
        for mut s in other.states {
            for t in &mut s.trans {
                t.to += offset;
            }
            self.states.push(s);
        }
        offset
    }

    /// The automaton accepting the union of the operands' languages.
    ///
    /// A fresh start state is spliced into every operand's start state. To
    /// reuse an automaton as several operands, pass explicit clones; moving
    /// the operands in is what makes structural sharing impossible.
    pub fn union(operands: Vec<Automaton>) -> Automaton {
        let mut result = Automaton::new();
        for mut op in operands {
            op.expand_singleton();
            let init = op.initial;
            let off = result.append_states(op);
            let initial = result.initial;
            result.add_epsilon(initial, init + off);
        }
        result.deterministic = false;
        result.clear_hash();
        result
    }

    /// The automaton accepting the concatenation of the operands' languages,
    /// in order. All-singleton operands degenerate to one joined singleton.
    pub fn concatenate(operands: Vec<Automaton>) -> Automaton {
        if operands.iter().all(|a| a.is_singleton()) {
            let joined: String = operands
                .iter()
                .filter_map(|a| a.singleton.as_deref())
                .collect();
            return Automaton::make_string(&joined);
        }
        if operands.iter().any(|a| a.is_empty()) {
            return Automaton::make_empty();
        }
        let mut operands = operands.into_iter();
        let mut b = match operands.next() {
            Some(first) => first,
            None => return Automaton::make_empty_string(),
        };
        b.expand_singleton();
        let mut ac = b.accept_states();
        for mut a in operands {
            if a.is_empty_string() {
                continue;
            }
            a.expand_singleton();
            let a_initial = a.initial;
            let a_accepts = a.accept_states();
            let off = b.append_states(a);
            let mut ns: Vec<StateId> = a_accepts.iter().map(|&s| s + off).collect();
            for &s in &ac {
                b.states[s as usize].accept = false;
                b.add_epsilon(s, a_initial + off);
                // the splice target's start may itself accept
                if b.states[s as usize].accept {
                    ns.push(s);
                }
            }
            ac = ns;
        }
        b.deterministic = false;
        b.clear_hash();
        b
    }

    /// Kleene star: zero or more repetitions.
    pub fn repeat(mut self) -> Automaton {
        self.expand_singleton();
        let accepts = self.accept_states();
        let s = self.new_state();
        self.states[s as usize].accept = true;
        self.add_epsilon(s, self.initial);
        for p in accepts {
            self.add_epsilon(p, s);
        }
        self.initial = s;
        self.deterministic = false;
        self.clear_hash();
        self
    }

    /// At least `min` repetitions.
    pub fn repeat_min(self, min: u32) -> Automaton {
        if min == 0 {
            return self.repeat();
        }
        let mut ops: Vec<Automaton> = Vec::with_capacity(min as usize + 1);
        for _ in 1..min {
            ops.push(self.clone());
        }
        let star = self.clone().repeat();
        ops.push(self);
        ops.push(star);
        Automaton::concatenate(ops)
    }

    /// Between `min` and `max` repetitions; `min > max` is the empty
    /// language. The optional copies keep their accept states, so the
    /// automaton may stop after any count in range.
    pub fn repeat_range(self, min: u32, max: u32) -> Automaton {
        if min > max {
            return Automaton::make_empty();
        }
        let span = max - min;
        let mut a = self;
        a.expand_singleton();
        let mut b = match min {
            0 => Automaton::make_empty_string(),
            1 => a.clone(),
            _ => {
                let mut ops: Vec<Automaton> = Vec::with_capacity(min as usize);
                for _ in 0..min {
                    ops.push(a.clone());
                }
                Automaton::concatenate(ops)
            }
        };
        if span > 0 {
            let mut d = a.clone();
            for _ in 1..span {
                let mut c = a.clone();
                let c_accepts = c.accept_states();
                let d_initial = d.initial;
                let off = c.append_states(d);
                for p in c_accepts {
                    c.add_epsilon(p, d_initial + off);
                }
                d = c;
            }
            b.expand_singleton();
            let b_accepts = b.accept_states();
            let d_initial = d.initial;
            let off = b.append_states(d);
            for p in b_accepts {
                b.add_epsilon(p, d_initial + off);
            }
            b.deterministic = false;
            b.clear_hash();
        }
        b
    }

    /// Zero or one occurrence.
    pub fn optional(mut self) -> Automaton {
        self.expand_singleton();
        let s = self.new_state();
        self.add_epsilon(s, self.initial);
        self.states[s as usize].accept = true;
        self.initial = s;
        self.deterministic = false;
        self.clear_hash();
        self
    }

    /// Merges overlapping and adjacent intervals with the same destination.
    /// Idempotent; the merged set does not depend on insertion order.
    pub fn reduce(&mut self) {
        if self.is_singleton() {
            return;
        }
        for &sid in &self.reachable_states() {
            let mut trans = std::mem::take(&mut self.states[sid as usize].trans);
            trans.sort_by(|x, y| {
                x.to
                    .cmp(&y.to)
                    .then(x.min.cmp(&y.min))
                    .then(y.max.cmp(&x.max))
            });
            let mut merged: Vec<Transition> = Vec::with_capacity(trans.len());
            let mut cur: Option<Transition> = None;
            for t in trans {
                match cur {
                    Some(ref mut m)
                        if m.to == t.to && u32::from(t.min) <= u32::from(m.max) + 1 =>
                    {
                        if t.max > m.max {
                            m.max = t.max;
                        }
                    }
                    Some(m) => {
                        merged.push(m);
                        cur = Some(t);
                    }
                    None => {
                        cur = Some(t);
                    }
                }
            }
            if let Some(m) = cur {
                merged.push(m);
            }
            self.states[sid as usize].trans = merged;
        }
        self.clear_hash();
    }

    /// States from which an accept state is reachable, computed by backward
    /// BFS over a reverse adjacency index.
    fn live_states(&self, states: &[StateId]) -> BitSet {
        let mut preds: VecMap<Vec<StateId>> = VecMap::new();
        for &s in states {
            preds.insert(s as usize, Vec::new());
        }
        for &s in states {
            for t in &self.states[s as usize].trans {
                if let Some(v) = preds.get_mut(t.to as usize) {
                    v.push(s);
                }
            }
        }
        let mut live = BitSet::new();
        let mut worklist: Vec<StateId> = Vec::new();
        for &s in states {
            if self.states[s as usize].accept && live.insert(s as usize) {
                worklist.push(s);
            }
        }
        while let Some(s) = worklist.pop() {
            if let Some(ps) = preds.get(s as usize) {
                for &p in ps {
                    if live.insert(p as usize) {
                        worklist.push(p);
                    }
                }
            }
        }
        live
    }

    /// Drops every transition into a dead state, then reduces. A state is
    /// dead if no accept state is reachable from it.
    pub fn remove_dead_transitions(&mut self) {
        self.clear_hash();
        if self.is_singleton() {
            return;
        }
        let states = self.reachable_states();
        let live = self.live_states(&states);
        for &s in &states {
            let trans = std::mem::take(&mut self.states[s as usize].trans);
            self.states[s as usize].trans = trans
                .into_iter()
                .filter(|t| live.contains(t.to as usize))
                .collect();
        }
        self.reduce();
    }

    /// Whether the automaton accepts `input`. Singletons compare directly;
    /// otherwise the automaton must be deterministic.
    pub fn run(&self, input: &str) -> Result<bool, Error> {
        if let Some(s) = &self.singleton {
            return Ok(input == s);
        }
        if !self.deterministic {
            return Err(Error::Unsupported("running a nondeterministic automaton"));
        }
        let mut p = self.initial;
        for c in input.encode_utf16() {
            match self.step(p, c) {
                Some(q) => p = q,
                None => return Ok(false),
            }
        }
        Ok(self.states[p as usize].accept)
    }

    /// Whether this automaton's language is a subset of `other`'s, by a
    /// synchronized walk of state pairs. `other` is determinized and
    /// totalized in place; `self` may stay nondeterministic.
    pub fn subset_of(&mut self, other: &mut Automaton) -> bool {
        if let Some(s) = self.singleton.clone() {
            return match &other.singleton {
                Some(o) => s == *o,
                None => {
                    other.determinize();
                    other.run(&s).unwrap_or(false)
                }
            };
        }
        self.expand_singleton();
        other.expand_singleton();
        other.determinize();
        other.totalize();
        let mut visited: HashSet<(StateId, StateId)> = HashSet::new();
        let mut worklist = vec![(self.initial, other.initial)];
        visited.insert((self.initial, other.initial));
        while let Some((p, q)) = worklist.pop() {
            if self.states[p as usize].accept && !other.states[q as usize].accept {
                return false;
            }
            for t in &self.states[p as usize].trans {
                for u in &other.states[q as usize].trans {
                    if u.min <= t.max && t.min <= u.max {
                        let pair = (t.to, u.to);
                        if visited.insert(pair) {
                            worklist.push(pair);
                        }
                    }
                }
            }
        }
        true
    }

    /// Whether both automata accept the same language. Minimizes both, then
    /// compares the cached structural hashes (minimal automata of different
    /// size cannot agree) and finally walks for graph isomorphism, which is
    /// exact because the minimal deterministic automaton is canonical.
    pub fn same_language(&mut self, other: &mut Automaton) -> bool {
        if self.is_singleton() && other.is_singleton() {
            return self.singleton == other.singleton;
        }
        self.minimize();
        other.minimize();
        if self.hash_code != other.hash_code {
            return false;
        }
        self.expand_singleton();
        other.expand_singleton();
        self.isomorphic(other)
    }

    fn isomorphic(&self, other: &Automaton) -> bool {
        let mut mapping: VecMap<StateId> = VecMap::new();
        let mut worklist: VecDeque<StateId> = VecDeque::new();
        mapping.insert(self.initial as usize, other.initial);
        worklist.push_back(self.initial);
        while let Some(p) = worklist.pop_front() {
            let q = mapping[p as usize];
            let a = &self.states[p as usize];
            let b = &other.states[q as usize];
            if a.accept != b.accept || a.trans.len() != b.trans.len() {
                return false;
            }
            let mut at = a.trans.clone();
            let mut bt = b.trans.clone();
            at.sort_by_key(|t| (t.min, t.max));
            bt.sort_by_key(|t| (t.min, t.max));
            for (t, u) in at.iter().zip(&bt) {
                if t.min != u.min || t.max != u.max {
                    return false;
                }
                match mapping.insert(t.to as usize, u.to) {
                    Some(old) => {
                        if old != u.to {
                            return false;
                        }
                    }
                    None => worklist.push_back(t.to),
                }
            }
        }
        true
    }

    /// The automaton accepting the intersection of both languages, built as
    /// a synchronized product over overlapping intervals. Operands are
    /// determinized in place, which keeps per-state intervals disjoint and
    /// the product free of duplicate ranges.
    pub fn intersection(&mut self, other: &mut Automaton) -> Automaton {
        if let (Some(a), Some(b)) = (&self.singleton, &other.singleton) {
            return if a == b {
                Automaton::make_string(a)
            } else {
                Automaton::make_empty()
            };
        }
        if let Some(s) = self.singleton.clone() {
            other.determinize();
            return if other.run(&s).unwrap_or(false) {
                Automaton::make_string(&s)
            } else {
                Automaton::make_empty()
            };
        }
        if let Some(s) = other.singleton.clone() {
            self.determinize();
            return if self.run(&s).unwrap_or(false) {
                Automaton::make_string(&s)
            } else {
                Automaton::make_empty()
            };
        }
        self.determinize();
        other.determinize();
        let mut c = Automaton::new();
        let mut map: HashMap<(StateId, StateId), StateId> = HashMap::new();
        let mut worklist = VecDeque::new();
        map.insert((self.initial, other.initial), c.initial);
        worklist.push_back((self.initial, other.initial));
        while let Some((p1, p2)) = worklist.pop_front() {
            let r = map[&(p1, p2)];
            c.states[r as usize].accept =
                self.states[p1 as usize].accept && other.states[p2 as usize].accept;
            for t1 in &self.states[p1 as usize].trans {
                for t2 in &other.states[p2 as usize].trans {
                    if t2.min <= t1.max && t1.min <= t2.max {
                        let key = (t1.to, t2.to);
                        let dest = match map.get(&key) {
                            Some(&d) => d,
                            None => {
                                let d = c.new_state();
                                map.insert(key, d);
                                worklist.push_back(key);
                                d
                            }
                        };
                        c.add_transition(
                            r,
                            Transition {
                                min: t1.min.max(t2.min),
                                max: t1.max.min(t2.max),
                                to: dest,
                            },
                        );
                    }
                }
            }
        }
        c.deterministic = true;
        c.remove_dead_transitions();
        c
    }
}
