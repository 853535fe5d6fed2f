use rstest::rstest;
use rstest_reuse::{apply, template};

use crate::fact::Fact;
use crate::justify::Deps;
use crate::propagate::Core;
use crate::term::poly::Poly;
use crate::{Context, Formula, Options, Rat, Status, Term, Theory};

fn ge(ctx: &mut Context, s: &Term, t: &Term) -> Formula {
    let d = ctx.sub(s, t);
    Formula::nonneg(d)
}

/// Canonicalisation is idempotent.
#[test]
fn can_is_idempotent() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let y = ctx.var("y");
    let zero = Context::num(0);
    let three = Context::num(3);

    let f = ge(&mut ctx, &x, &zero);
    ctx.process(f);
    let sum = ctx.add(&x, &y);
    ctx.process(Formula::eq(sum.clone(), three));

    let fx = ctx.apply("f", std::slice::from_ref(&x));
    for t in [x, y, sum, fx, Context::num(7)] {
        let once = ctx.can(&t);
        assert_eq!(ctx.can(&once), once, "can(can(t)) != can(t) for {t:?}");
    }
}

/// `find` inverts `inv` on aliased terms.
#[test]
fn find_inverts_inv() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let y = ctx.var("y");
    let one = Context::num(1);
    let t = ctx.add(&x, &one);

    // The disequality aliases both sides, so `t` gains a name.
    ctx.process(Formula::deq(y, t.clone()));

    let v = ctx.inv(&t).expect("aliased during the disequality");
    let found = ctx.find(Theory::A, v).expect("bound by the alias");
    assert_eq!(ctx.can(&found), ctx.can(&t));
}

/// An unsat core replays to Unsat and is minimal.
#[test]
fn cores_replay_and_are_minimal() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let five = Context::num(5);
    let two = Context::num(2);
    let lower = ge(&mut ctx, &x, &five);
    let upper = ge(&mut ctx, &two, &x);
    ctx.process(lower);
    let Status::Unsat(core) = ctx.process(upper) else {
        panic!("expected Unsat");
    };

    // Replay the full core in both orders.
    for flip in [false, true] {
        let mut replay = Context::new();
        let mut fmls = core.clone();
        if flip {
            fmls.reverse();
        }
        let mut last = Status::Unknown;
        for f in fmls {
            last = replay.process(f);
        }
        assert!(last.is_unsat());
    }

    // Dropping any single member leaves a satisfiable set.
    for skip in 0..core.len() {
        let mut replay = Context::new();
        for (i, f) in core.iter().enumerate() {
            if i == skip {
                continue;
            }
            assert!(replay.process(f.clone()).is_sat());
        }
    }
}

/// Refuted assertions entail their negations.
#[test]
fn unsat_implies_negation_consistent() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let zero = Context::num(0);
    let minus_two = Context::num(-2);
    let f = ge(&mut ctx, &x, &zero);
    ctx.process(f);

    let bad = Formula::eq(x.clone(), minus_two);
    let mark = ctx.save();
    assert!(ctx.process(bad.clone()).is_unsat());
    assert!(ctx.restore(mark));
    let neg = bad.negated().expect("equalities negate");
    assert!(ctx.process(neg).is_sat());
}

#[template]
#[rstest]
fn widths(#[values(1, 2, 5)] width: i64) {}

/// A committed `sup` bound refutes anything strictly above it, and
/// symmetrically for `inf`.
#[apply(widths)]
fn extremal_bounds_are_tight(width: i64) {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let zero = Context::num(0);
    let upper = Context::num(width);

    let f = ge(&mut ctx, &x, &zero);
    ctx.process(f);
    let f = ge(&mut ctx, &upper, &x);
    ctx.process(f);

    let q = ctx.sup(&x).expect("bounded above");
    assert_eq!(q, Rat::from(width));
    let r = ctx.inf(&x).expect("bounded below");
    assert_eq!(r, Rat::from(0));

    let mark = ctx.save();
    let above = ctx.sub(&x, &upper);
    assert!(ctx.process(Formula::pos(above)).is_unsat());
    assert!(ctx.restore(mark));
    let below = ctx.neg(&x);
    assert!(ctx.process(Formula::pos(below)).is_unsat());
}

/// Every tableau binding keeps a nonnegative constant part at external
/// observation points.
#[test]
fn tableau_stays_feasible() {
    let mut core = Core::new();
    let x = core.vars.external("x");
    let y = core.vars.external("y");
    let z = core.vars.external("z");

    let facts = [
        Fact::Nonneg(Poly::var(x), Deps::atom(0)),
        Fact::Nonneg(Poly::var(y), Deps::atom(1)),
        Fact::Nonneg(
            Poly::var(z).sub(&Poly::var(x)).add_constant(&Rat::from(3)),
            Deps::atom(2),
        ),
        Fact::Eq(
            Poly::var(x).add(&Poly::var(y)),
            Poly::constant(Rat::from(4)),
            Deps::atom(3),
        ),
        Fact::Nonneg(
            Poly::var(y).neg().add_constant(&Rat::from(2)),
            Deps::atom(4),
        ),
    ];
    for fact in facts {
        core.push(fact);
        core.propagate().expect("satisfiable prefix");
        for (_, rhs, _) in core.simplex.tableau().iter() {
            assert!(
                !rhs.const_part().is_negative(),
                "infeasible row {rhs:?}"
            );
        }
    }
}

/// Switching cores off leaves `Unsat` with an empty payload.
#[test]
fn cores_can_be_disabled() {
    let options = Options {
        unsat_cores: false,
        ..Options::default()
    };
    let mut ctx = Context::with_options(options);
    let x = ctx.var("x");
    let zero = Context::num(0);
    let f = ge(&mut ctx, &x, &zero);
    ctx.process(f);
    let minus_one = Context::num(-1);
    match ctx.process(Formula::eq(x, minus_one)) {
        Status::Unsat(core) => assert!(core.is_empty()),
        other => panic!("expected Unsat, got {other:?}"),
    }
}

/// A branch budget of zero turns `resolve` into a no-op `Unknown`.
#[test]
fn split_limit_caps_resolution() {
    let options = Options {
        split_limit: Some(0),
        ..Options::default()
    };
    let mut ctx = Context::with_options(options);
    let x = ctx.var("x");
    let branch = Formula::or(vec![
        Formula::eq(x.clone(), Context::num(1)),
        Formula::eq(x, Context::num(2)),
    ]);
    assert_eq!(ctx.process(branch), Status::Unknown);
    assert_eq!(ctx.resolve(), Status::Unknown);
}

/// `valid` is sound, and complete when `complete_tests` is set.
#[test]
fn validity_tests() {
    let options = Options {
        complete_tests: true,
        ..Options::default()
    };
    let mut ctx = Context::with_options(options);
    let x = ctx.var("x");
    let zero = Context::num(0);
    let one = Context::num(1);
    let f = ge(&mut ctx, &x, &zero);
    ctx.process(f);
    ctx.process(Formula::eq(x.clone(), one.clone()));

    let entailed = ge(&mut ctx, &x, &zero);
    assert!(ctx.valid(&entailed));
    let sharper = Formula::eq(x.clone(), one);
    assert!(ctx.valid(&sharper));
    let wrong = Formula::eq(x, zero);
    assert!(!ctx.valid(&wrong));
}
