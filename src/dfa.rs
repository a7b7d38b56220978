//! Determinization and minimization.
//!
//! Subset construction tracks sets of simultaneously reachable states,
//! memoized by content ([`StateSet`]), over the automaton's interval start
//! points. Minimization is Hopcroft's partition refinement: a worklist of
//! (block, alphabet class) pairs, with per-pair active lists that support
//! O(1) removal when a state migrates to a freshly split block, always
//! re-examining the smaller side of a split.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::automaton::{Automaton, StateId, Transition, MAX_CODE_POINT, MIN_CODE_POINT};
use crate::state_list::{ListId, ListPool, NodeId};
use crate::state_set::StateSet;

impl Automaton {
    /// Converts the automaton to an equivalent deterministic one via subset
    /// construction. No-op on deterministic and singleton automata. Ends
    /// with dead-transition removal, since the construction can emit states
    /// from which no accept state is reachable.
    pub fn determinize(&mut self) {
        if self.deterministic || self.is_singleton() {
            return;
        }
        let initial = StateSet::singleton(self.initial);
        self.determinize_from(initial);
    }

    fn determinize_from(&mut self, initial: StateSet) {
        let points = self.start_points();
        let mut newstate: HashMap<StateSet, StateId> = HashMap::new();
        let mut worklist: VecDeque<StateSet> = VecDeque::new();
        let first = self.new_state();
        self.initial = first;
        newstate.insert(initial.clone(), first);
        worklist.push_back(initial);
        while let Some(set) = worklist.pop_front() {
            let r = newstate[&set];
            if set.iter().any(|&s| self.states[s as usize].accept) {
                self.states[r as usize].accept = true;
            }
            for (n, &point) in points.iter().enumerate() {
                let mut p = StateSet::new();
                for &s in set.iter() {
                    for t in &self.states[s as usize].trans {
                        if t.min <= point && point <= t.max {
                            p.add(t.to);
                        }
                    }
                }
                if p.is_empty() {
                    continue;
                }
                let dest = match newstate.get(&p) {
                    Some(&d) => d,
                    None => {
                        let d = self.new_state();
                        newstate.insert(p.clone(), d);
                        worklist.push_back(p);
                        d
                    }
                };
                let max = if n + 1 < points.len() {
                    points[n + 1] - 1
                } else {
                    MAX_CODE_POINT
                };
                self.add_transition(
                    r,
                    Transition {
                        min: point,
                        max,
                        to: dest,
                    },
                );
            }
        }
        self.deterministic = true;
        self.remove_dead_transitions();
    }

    /// Makes the transition function total: adds a non-accepting sink with a
    /// whole-alphabet self-loop and fills every gap in every state's
    /// intervals with an edge to it.
    pub fn totalize(&mut self) {
        self.expand_singleton();
        let sink = self.new_state();
        self.add_transition(
            sink,
            Transition {
                min: MIN_CODE_POINT,
                max: MAX_CODE_POINT,
                to: sink,
            },
        );
        for &s in &self.reachable_states() {
            let mut trans = self.states[s as usize].trans.clone();
            trans.sort_by_key(|t| (t.min, t.max));
            let mut maxi = u32::from(MIN_CODE_POINT);
            let mut fills: Vec<Transition> = Vec::new();
            for t in &trans {
                if u32::from(t.min) > maxi {
                    fills.push(Transition {
                        min: maxi as u16,
                        max: t.min - 1,
                        to: sink,
                    });
                }
                if u32::from(t.max) + 1 > maxi {
                    maxi = u32::from(t.max) + 1;
                }
            }
            if maxi <= u32::from(MAX_CODE_POINT) {
                fills.push(Transition {
                    min: maxi as u16,
                    max: MAX_CODE_POINT,
                    to: sink,
                });
            }
            for f in fills {
                self.add_transition(s, f);
            }
        }
        self.clear_hash();
    }

    /// Replaces the automaton with the unique minimal deterministic
    /// automaton for its language. Determinizes first; singletons are
    /// already minimal, as is the single-state total self-loop.
    pub fn minimize(&mut self) {
        if !self.is_singleton() {
            self.determinize();
            let initial = &self.states[self.initial as usize];
            let trivial = initial.trans.len() == 1 && {
                let t = initial.trans[0];
                t.to == self.initial && t.min == MIN_CODE_POINT && t.max == MAX_CODE_POINT
            };
            if !trivial {
                self.minimize_hopcroft();
            }
        }
        self.recompute_hash();
    }

    fn minimize_hopcroft(&mut self) {
        self.totalize();
        let states = self.reachable_states();
        let number = Automaton::number_states(&states);
        let sigma = self.start_points();
        let n = states.len();
        let m = sigma.len();

        // reverse[i][c]: dense indices of the predecessors of state i under
        // alphabet class c; the transition function is total here.
        let mut reverse: Vec<Vec<Vec<u32>>> = vec![vec![Vec::new(); m]; n];
        for (i, &sid) in states.iter().enumerate() {
            for (c, &point) in sigma.iter().enumerate() {
                if let Some(q) = self.step(sid, point) {
                    reverse[number[q as usize]][c].push(i as u32);
                }
            }
        }

        // initial partition: accepting states and the rest
        let mut block: Vec<usize> = vec![0; n];
        let mut pool = ListPool::new();
        let mut partition: Vec<ListId> = vec![pool.new_list(), pool.new_list()];
        let mut partition_node: Vec<NodeId> = Vec::with_capacity(n);
        for (i, &sid) in states.iter().enumerate() {
            let b = if self.states[sid as usize].accept { 0 } else { 1 };
            block[i] = b;
            partition_node.push(pool.push(partition[b], i as u32));
        }

        // active[b][c]: members of block b with predecessors under class c
        let mut active: Vec<Vec<ListId>> = (0..2)
            .map(|_| (0..m).map(|_| pool.new_list()).collect())
            .collect();
        let mut active_node: Vec<Vec<Option<NodeId>>> = vec![vec![None; m]; n];
        for b in 0..2 {
            let members: Vec<u32> = pool.iter(partition[b]).collect();
            for c in 0..m {
                for &i in &members {
                    if !reverse[i as usize][c].is_empty() {
                        active_node[i as usize][c] = Some(pool.push(active[b][c], i));
                    }
                }
            }
        }

        let mut pending: VecDeque<(usize, usize)> = VecDeque::new();
        let mut pending_set: HashSet<(usize, usize)> = HashSet::new();
        for c in 0..m {
            let b = if pool.len(active[0][c]) <= pool.len(active[1][c]) {
                0
            } else {
                1
            };
            pending.push_back((b, c));
            pending_set.insert((b, c));
        }

        let mut split_flag = vec![false; n];
        let mut refine: Vec<usize> = Vec::new();
        let mut refine_flag = vec![false; n + 2];
        let mut splitblock: Vec<Vec<u32>> = vec![Vec::new(); n + 2];

        while let Some((p, c)) = pending.pop_front() {
            pending_set.remove(&(p, c));
            // predecessors of block p under class c may now be
            // distinguishable from the rest of their block
            let actives: Vec<u32> = pool.iter(active[p][c]).collect();
            for i in actives {
                for &s in &reverse[i as usize][c] {
                    if !split_flag[s as usize] {
                        split_flag[s as usize] = true;
                        let j = block[s as usize];
                        splitblock[j].push(s);
                        if !refine_flag[j] {
                            refine_flag[j] = true;
                            refine.push(j);
                        }
                    }
                }
            }
            for &j in &refine {
                if splitblock[j].len() < pool.len(partition[j]) {
                    let new_block = partition.len();
                    partition.push(pool.new_list());
                    active.push((0..m).map(|_| pool.new_list()).collect());
                    for &s in &splitblock[j] {
                        let si = s as usize;
                        pool.remove(partition_node[si]);
                        partition_node[si] = pool.push(partition[new_block], s);
                        block[si] = new_block;
                        for c2 in 0..m {
                            if let Some(node) = active_node[si][c2] {
                                if pool.list_of(node) == active[j][c2] {
                                    pool.remove(node);
                                    active_node[si][c2] =
                                        Some(pool.push(active[new_block][c2], s));
                                }
                            }
                        }
                    }
                    // re-examine the smaller of the two active sets
                    for c2 in 0..m {
                        let aj = pool.len(active[j][c2]);
                        let ak = pool.len(active[new_block][c2]);
                        if !pending_set.contains(&(j, c2)) && 0 < aj && aj <= ak {
                            pending_set.insert((j, c2));
                            pending.push_back((j, c2));
                        } else {
                            pending_set.insert((new_block, c2));
                            pending.push_back((new_block, c2));
                        }
                    }
                }
                refine_flag[j] = false;
                for &s in &splitblock[j] {
                    split_flag[s as usize] = false;
                }
                splitblock[j].clear();
            }
            refine.clear();
        }

        // one new state per block, rebuilt from a representative member
        let old_initial = self.initial;
        let newstates: Vec<StateId> = (0..partition.len()).map(|_| self.new_state()).collect();
        for (b, &ls) in partition.iter().enumerate() {
            let members: Vec<u32> = pool.iter(ls).collect();
            let rep = match members.first() {
                Some(&i) => states[i as usize],
                None => continue,
            };
            if members.iter().any(|&i| states[i as usize] == old_initial) {
                self.initial = newstates[b];
            }
            self.states[newstates[b] as usize].accept = self.states[rep as usize].accept;
            let rep_trans = self.states[rep as usize].trans.clone();
            for t in rep_trans {
                let dest = newstates[block[number[t.to as usize]]];
                self.add_transition(
                    newstates[b],
                    Transition {
                        min: t.min,
                        max: t.max,
                        to: dest,
                    },
                );
            }
        }
        // prunes the totalization sink and anything else now dead
        self.remove_dead_transitions();
    }
}
