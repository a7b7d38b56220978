use crate::automaton::{Automaton, Transition, MAX_CODE_POINT, MIN_CODE_POINT};
use crate::error::Error;
use crate::regex::Regex;
use crate::run::RunAutomaton;
use crate::state_list::ListPool;

fn parse(pattern: &str) -> Regex {
    pattern.parse::<Regex>().unwrap()
}

fn automaton(pattern: &str) -> Automaton {
    parse(pattern).to_automaton().unwrap()
}

fn compiled(pattern: &str) -> RunAutomaton {
    RunAutomaton::new(&mut automaton(pattern), false)
}

fn cp(c: char) -> u16 {
    c as u16
}

/// One-or-more 'c', minimized: the shape several original tests build on.
fn minimized_c_plus() -> Automaton {
    let mut a = Automaton::make_char('c').repeat_min(1);
    a.minimize();
    a
}

#[test]
fn test_parse_print() {
    assert_eq!(parse(".{1}").to_string(), "(.){1,1}");
    assert_eq!(parse("abc+d").to_string(), "ab(c){1,}d");
    assert_eq!(parse("tâm[0-9]").to_string(), "tâm[0-9]");
    assert_eq!(parse("[tâm]").to_string(), "((t|â)|m)");
    assert_eq!(parse("[abc0-9]").to_string(), "(((a|b)|c)|[0-9])");
    assert_eq!(parse("ab|xy|zt").to_string(), "(ab|(xy|zt))");
}

#[test]
fn test_parse_errors() {
    assert!("(ab".parse::<Regex>().is_err());
    assert!("ab)".parse::<Regex>().is_err());
    assert!("[ab".parse::<Regex>().is_err());
    assert!("a{".parse::<Regex>().is_err());
    assert!("a{}".parse::<Regex>().is_err());
    assert!("a{1".parse::<Regex>().is_err());
}

#[test]
fn test_transition_validation() {
    assert_eq!(
        Transition::new(5, 3, 0),
        Err(Error::InvalidInterval { min: 5, max: 3 })
    );
    assert!(Transition::new(3, 5, 0).is_ok());
    assert!(Transition::new(7, 7, 0).is_ok());
}

#[test]
fn test_duplicate_interval_dropped() {
    let mut a = Automaton::make_empty();
    let f = a.new_state();
    a.states[f as usize].accept = true;
    a.add_transition(a.initial(), Transition::new(97, 99, f).unwrap());
    // same interval again: reported and ignored, whatever the destination
    a.add_transition(a.initial(), Transition::new(97, 99, a.initial()).unwrap());
    assert_eq!(a.state(a.initial()).transitions().len(), 1);
    assert_eq!(a.state(a.initial()).transitions()[0].to(), f);
}

#[test]
fn test_singleton_counts() {
    let mut a = Automaton::make_string("abc");
    assert!(a.is_singleton());
    assert_eq!(a.state_count(), 4);
    assert_eq!(a.transition_count(), 3);
    a.expand_singleton();
    assert!(!a.is_singleton());
    assert!(a.is_deterministic());
    assert_eq!(a.state_count(), 4);
    assert_eq!(a.transition_count(), 3);
}

#[test]
fn test_concatenate_singletons() {
    let a = Automaton::concatenate(vec![Automaton::make_char('b'), Automaton::make_char('c')]);
    assert_eq!(a.singleton(), Some("bc"));
}

#[test]
fn test_empty_language_and_empty_string() {
    let mut empty = Automaton::make_empty();
    assert!(empty.is_empty());
    assert_eq!(empty.run(""), Ok(false));
    assert_eq!(empty.run("a"), Ok(false));
    empty.minimize();
    assert!(empty.is_empty());

    let epsilon = Automaton::make_empty_string();
    assert!(!epsilon.is_empty());
    assert_eq!(epsilon.run(""), Ok(true));
    assert_eq!(epsilon.run("a"), Ok(false));
}

#[test]
fn test_repeat_min_structure() {
    let a = Automaton::make_char('c').repeat_min(1);
    assert!(!a.is_deterministic());
    assert_eq!(a.state_count(), 3);
    assert_eq!(a.transition_count(), 3);
    let s = a.state(a.initial());
    assert_eq!(s.transitions().len(), 1);
    assert_eq!(s.transitions()[0].min(), cp('c'));
    assert_eq!(s.transitions()[0].max(), cp('c'));
}

#[test]
fn test_repeat_min_minimized() {
    let a = minimized_c_plus();
    assert_eq!(a.state_count(), 2);
    assert_eq!(a.transition_count(), 2);
    let s = a.state(a.initial());
    assert!(!s.accept());
    assert_eq!(s.transitions().len(), 1);
    let t = s.transitions()[0];
    assert_eq!((t.min(), t.max()), (cp('c'), cp('c')));
    // the sole accepting state loops on 'c' to itself
    let f = a.state(t.to());
    assert!(f.accept());
    assert_eq!(f.transitions().len(), 1);
    assert_eq!(f.transitions()[0].to(), t.to());
}

#[test]
fn test_start_points() {
    let mut a = Automaton::make_char('c').repeat_min(1);
    assert_eq!(a.start_points(), vec![0, 99, 100]);
    let mut b = Automaton::concatenate(vec![Automaton::make_char('b'), minimized_c_plus()]);
    assert_eq!(b.start_points(), vec![0, 98, 99, 100]);
}

#[test]
fn test_concatenate_structure() {
    let a = Automaton::concatenate(vec![Automaton::make_char('b'), minimized_c_plus()]);
    assert_eq!(a.state_count(), 3);
    assert!(!a.is_deterministic());
    let s = a.state(a.initial());
    assert_eq!(s.transitions().len(), 1);
    let t = s.transitions()[0];
    assert_eq!((t.min(), t.max()), (cp('b'), cp('b')));
    let mid = a.state(t.to());
    assert!(!mid.accept());
    let u = mid.transitions()[0];
    assert_eq!((u.min(), u.max()), (cp('c'), cp('c')));
    let last = a.state(u.to());
    assert!(last.accept());
    assert_eq!(last.transitions()[0].to(), u.to());
}

#[test]
fn test_determinize_repeat_min() {
    let mut a = Automaton::make_char('c').repeat_min(1);
    a.determinize();
    assert!(a.is_deterministic());
    assert_eq!(a.state_count(), 3);
    let s = a.state(a.initial());
    assert_eq!(s.transitions().len(), 1);
    assert_eq!(s.transitions()[0].min(), cp('c'));
    assert_eq!(s.transitions()[0].max(), cp('c'));
}

#[test]
fn test_determinize_idempotent() {
    let mut a = parse("ab|xy|zt").to_automaton_unminimized().unwrap();
    a.determinize();
    let states = a.state_count();
    let trans = a.transition_count();
    a.determinize();
    assert_eq!(a.state_count(), states);
    assert_eq!(a.transition_count(), trans);
}

#[test]
fn test_totalize() {
    let mut a = Automaton::make_char('c').repeat_min(1);
    a.determinize();
    a.totalize();
    let s = a.state(a.initial());
    assert_eq!(s.transitions().len(), 3);
    let mut starts: Vec<u16> = s.transitions().iter().map(|t| t.min()).collect();
    starts.sort();
    assert_eq!(starts, vec![0, 99, 100]);
    for t in s.transitions() {
        let to = a.state(t.to());
        if t.min() == 99 {
            assert!(to.accept());
            assert_eq!(to.transitions().len(), 3);
        } else {
            // both gap edges lead to the total sink
            assert!(!to.accept());
            assert_eq!(to.transitions().len(), 1);
        }
    }

    let mut b = Automaton::concatenate(vec![Automaton::make_char('b'), minimized_c_plus()]);
    b.determinize();
    b.totalize();
    assert!(b.is_deterministic());
    assert_eq!(b.state_count(), 4);
}

#[test]
fn test_minimize_idempotent() {
    let mut a = parse("(ab|cd)*ef").to_automaton_unminimized().unwrap();
    let before = a.state_count();
    a.minimize();
    assert!(a.state_count() <= before);
    let counts = (a.state_count(), a.transition_count());
    a.minimize();
    assert_eq!((a.state_count(), a.transition_count()), counts);
}

#[test]
fn test_reduce_merges_intervals() {
    fn build(order: &[(u16, u16)]) -> Vec<(u16, u16)> {
        let mut a = Automaton::make_empty();
        let f = a.new_state();
        a.states[f as usize].accept = true;
        for &(lo, hi) in order {
            a.add_transition(a.initial(), Transition::new(lo, hi, f).unwrap());
        }
        a.reduce();
        a.reduce();
        a.state(a.initial())
            .transitions()
            .iter()
            .map(|t| (t.min(), t.max()))
            .collect()
    }
    let merged = build(&[(97, 99), (100, 102), (107, 109)]);
    assert_eq!(merged, vec![(97, 102), (107, 109)]);
    // result is independent of insertion order
    assert_eq!(build(&[(107, 109), (100, 102), (97, 99)]), merged);
    // overlapping intervals collapse too
    assert_eq!(build(&[(100, 102), (97, 105)]), vec![(97, 105)]);
}

#[test]
fn test_remove_dead_transitions() {
    // a -> accept, plus a branch into a state that accepts nothing
    let mut a = Automaton::make_empty();
    let good = a.new_state();
    let dead = a.new_state();
    a.states[good as usize].accept = true;
    a.add_transition(a.initial(), Transition::new(cp('a'), cp('a'), good).unwrap());
    a.add_transition(a.initial(), Transition::new(cp('b'), cp('b'), dead).unwrap());
    a.remove_dead_transitions();
    let s = a.state(a.initial());
    assert_eq!(s.transitions().len(), 1);
    assert_eq!(s.transitions()[0].to(), good);
}

#[test]
fn test_translate_literal_stays_singleton() {
    let a = automaton("abc");
    assert!(a.is_deterministic());
    assert_eq!(a.singleton(), Some("abc"));
    // the placeholder initial state is ignored while the singleton holds
    assert_eq!(a.state(a.initial()).transitions().len(), 0);
    assert!(!a.state(a.initial()).accept());
}

#[test]
fn test_translate_any_char() {
    let a = automaton(".");
    assert_eq!(a.singleton(), None);
    let s = a.state(a.initial());
    assert_eq!(s.transitions().len(), 1);
    assert_eq!(s.transitions()[0].min(), MIN_CODE_POINT);
    assert_eq!(s.transitions()[0].max(), MAX_CODE_POINT);
    assert!(a.state(s.transitions()[0].to()).accept());
}

#[test]
fn test_translate_char_range() {
    let a = automaton("[a-z]");
    assert!(a.is_deterministic());
    assert_eq!(a.state_count(), 2);
    let s = a.state(a.initial());
    assert_eq!(s.transitions().len(), 1);
    assert_eq!((s.transitions()[0].min(), s.transitions()[0].max()), (cp('a'), cp('z')));
    assert!(a.state(s.transitions()[0].to()).accept());
}

#[test]
fn test_translate_char_class() {
    let a = automaton("[atz]");
    assert!(a.is_deterministic());
    assert_eq!(a.state_count(), 2);
    let s = a.state(a.initial());
    assert_eq!(s.transitions().len(), 3);
    let to = s.transitions()[0].to();
    assert!(s.transitions().iter().all(|t| t.to() == to));
    assert!(a.state(to).accept());
}

#[test]
fn test_translate_abc_plus_d() {
    let a = automaton("abc+d");
    assert_eq!(a.state_count(), 5);
    assert_eq!(a.transition_count(), 5);
    // chain a -> b -> c
    let s0 = a.state(a.initial());
    assert_eq!(s0.transitions().len(), 1);
    assert_eq!(s0.transitions()[0].min(), cp('a'));
    let s1 = a.state(s0.transitions()[0].to());
    assert_eq!(s1.transitions().len(), 1);
    assert_eq!(s1.transitions()[0].min(), cp('b'));
    let s2 = a.state(s1.transitions()[0].to());
    assert_eq!(s2.transitions().len(), 1);
    assert_eq!(s2.transitions()[0].min(), cp('c'));
    // the post-c state branches: c loops back, d reaches the accept state
    let post = s2.transitions()[0].to();
    let s3 = a.state(post);
    assert_eq!(s3.transitions().len(), 2);
    let mut branches: Vec<(u16, bool, bool)> = s3
        .transitions()
        .iter()
        .map(|t| (t.min(), t.to() == post, a.state(t.to()).accept()))
        .collect();
    branches.sort();
    assert_eq!(branches, vec![(cp('c'), true, false), (cp('d'), false, true)]);
}

#[test]
fn test_translate_union() {
    let a = automaton("ab|xy|zt");
    assert!(a.is_deterministic());
    assert_eq!(a.state_count(), 5);
    let s = a.state(a.initial());
    assert_eq!(s.transitions().len(), 3);
    let mut mins: Vec<u16> = s.transitions().iter().map(|t| t.min()).collect();
    mins.sort();
    assert_eq!(mins, vec![cp('a'), cp('x'), cp('z')]);
}

#[test]
fn test_translate_rejects_reserved_kinds() {
    let negated = "[^a]".parse::<Regex>().unwrap();
    assert!(matches!(negated.to_automaton(), Err(Error::Unsupported(_))));
}

#[test]
fn test_nondeterministic_run_is_fenced() {
    let a = Automaton::make_char('a').repeat();
    assert!(!a.is_deterministic());
    assert!(matches!(a.run("a"), Err(Error::Unsupported(_))));
}

#[test]
fn test_run() {
    assert!(compiled("a[b-d]+x").run("acdbx"));
    assert!(compiled("a.+x").run("adx"));
    assert!(!compiled("ab|cd").run("ac"));
    assert!(compiled("abc+d").run("abccccd"));
    assert!(!compiled("abc+d").run("abd"));
}

#[test]
fn test_run_agrees_with_compiled() {
    let patterns = ["abc+d?", "a[b-d]+x", "(ab|cd)*", "x{2,4}y", "a?b", "tâm[0-9]"];
    let inputs = [
        "", "a", "b", "ab", "abc", "abcd", "abccccd", "acdbx", "abab", "cd", "xy", "xxy",
        "xxxxy", "xxxxxy", "tâm5", "tam5",
    ];
    for p in &patterns {
        let a = automaton(p);
        let search = RunAutomaton::new(&mut a.clone(), false);
        let tableized = RunAutomaton::new(&mut a.clone(), true);
        for s in &inputs {
            let direct = a.run(s).unwrap();
            assert_eq!(direct, search.run(s), "pattern {:?} input {:?}", p, s);
            assert_eq!(direct, tableized.run(s), "pattern {:?} input {:?}", p, s);
        }
    }
}

#[test]
fn test_repeat_range_bounds() {
    let a = Automaton::make_char('a').repeat_range(3, 2);
    assert!(a.is_empty());

    let r = automaton("x{2,4}y");
    for (input, expect) in &[
        ("xy", false),
        ("xxy", true),
        ("xxxy", true),
        ("xxxxy", true),
        ("xxxxxy", false),
    ] {
        assert_eq!(r.run(input), Ok(*expect), "{}", input);
    }
}

#[test]
fn test_shared_operand_clones() {
    let a = Automaton::make_char('a');
    let mut u = Automaton::union(vec![a.clone(), a]);
    let mut expected = Automaton::make_char('a');
    assert!(u.same_language(&mut expected));
}

#[test]
fn test_subset_of() {
    let mut ab = automaton("ab");
    let mut either = automaton("ab|cd");
    assert!(ab.subset_of(&mut either));
    assert!(!either.subset_of(&mut ab));

    let mut some = automaton("a[b-d]x");
    let mut wider = automaton("a.+x");
    assert!(some.subset_of(&mut wider));
    assert!(!wider.subset_of(&mut some));
}

#[test]
fn test_same_language() {
    let mut a = automaton("(a|b)*");
    let mut b = automaton("(a*b*)*");
    assert!(a.same_language(&mut b));
    let mut c = automaton("a(a|b)*");
    assert!(!a.same_language(&mut c));
    // singleton against a structural automaton with a larger language
    let mut s = Automaton::make_string("ab");
    let mut t = automaton("ab?b?");
    assert!(!s.same_language(&mut t));
    let mut t2 = automaton("a(b)");
    assert!(s.same_language(&mut t2));
    // singleton against an equivalent structural automaton
    let mut u = Automaton::union(vec![Automaton::make_string("ab"), Automaton::make_string("ab")]);
    assert!(s.same_language(&mut u));
}

#[test]
fn test_intersection() {
    let mut a = automaton("ab|cd");
    let mut b = automaton("ab|xy");
    let mut i = a.intersection(&mut b);
    assert_eq!(i.run("ab"), Ok(true));
    assert_eq!(i.run("cd"), Ok(false));
    assert_eq!(i.run("xy"), Ok(false));
    let mut expected = automaton("ab");
    assert!(i.same_language(&mut expected));

    // disjoint languages intersect to the empty language
    let mut x = automaton("a+");
    let mut y = automaton("b+");
    let mut none = x.intersection(&mut y);
    none.minimize();
    assert!(none.is_empty());
}

#[test]
fn test_matcher_scan() {
    let run = compiled("abc+d?");
    let mut m = run.matcher("abc abccccd abck abz abd abcd");
    let mut found = Vec::new();
    while m.find() {
        found.push(m.group().unwrap());
    }
    assert_eq!(found, vec!["abc", "abccccd", "abc", "abcd"]);
    assert!(!m.find());

    m.reset();
    assert!(m.find());
    assert_eq!(m.start().unwrap(), 0);
    assert_eq!(m.end().unwrap(), 3);
}

#[test]
fn test_matcher_leftmost_longest() {
    let run = compiled("ab+");
    let mut m = run.matcher("xabbbx ab");
    assert!(m.find());
    assert_eq!((m.start().unwrap(), m.end().unwrap()), (1, 5));
    assert!(m.find());
    assert_eq!((m.start().unwrap(), m.end().unwrap()), (7, 9));
    assert!(!m.find());
}

#[test]
fn test_matcher_empty_matches_progress() {
    let run = compiled("a*");
    let mut m = run.matcher("baa");
    assert!(m.find());
    assert_eq!((m.start().unwrap(), m.end().unwrap()), (0, 0));
    assert!(m.find());
    assert_eq!((m.start().unwrap(), m.end().unwrap()), (1, 3));
    assert!(m.find());
    assert_eq!((m.start().unwrap(), m.end().unwrap()), (3, 3));
    assert!(!m.find());
}

#[test]
fn test_matcher_state_misuse() {
    let run = compiled("x");
    let m = run.matcher("abc");
    assert_eq!(m.start(), Err(Error::NoMatch));
    assert_eq!(m.end(), Err(Error::NoMatch));
    assert_eq!(m.group(), Err(Error::NoMatch));
}

#[test]
fn test_char_class_lookup() {
    let mut a = automaton("[b-d]");
    let run = RunAutomaton::new(&mut a, false);
    let tableized = RunAutomaton::new(&mut a, true);
    for c in 0..=0x200u16 {
        assert_eq!(run.char_class(c), tableized.char_class(c), "unit {}", c);
    }
    assert!(run.char_class(cp('a')) < run.char_class(cp('b')));
    assert_eq!(run.char_class(cp('b')), run.char_class(cp('d')));
    assert!(run.char_class(cp('d')) < run.char_class(cp('e')));
}

#[test]
fn test_bmp_characters() {
    let a = automaton("tâm[0-9]");
    assert_eq!(a.run("tâm5"), Ok(true));
    assert_eq!(a.run("tam5"), Ok(false));
}

#[test]
fn test_list_pool() {
    let mut pool = ListPool::new();
    let l1 = pool.new_list();
    let l2 = pool.new_list();
    let a = pool.push(l1, 1);
    pool.push(l1, 2);
    let c = pool.push(l1, 3);
    pool.push(l2, 9);
    assert_eq!(pool.len(l1), 3);
    pool.remove(a);
    assert_eq!(pool.iter(l1).collect::<Vec<_>>(), vec![2, 3]);
    pool.remove(c);
    assert_eq!(pool.iter(l1).collect::<Vec<_>>(), vec![2]);
    // freed slots are reused
    let d = pool.push(l1, 4);
    assert_eq!(pool.iter(l1).collect::<Vec<_>>(), vec![2, 4]);
    assert_eq!(pool.list_of(d), l1);
    assert_eq!(pool.len(l2), 1);
    assert_eq!(pool.iter(l2).collect::<Vec<_>>(), vec![9]);
}
