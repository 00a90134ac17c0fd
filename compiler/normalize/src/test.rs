use crate::{normalize, whnf};
use term::{
    Arg, Clause, Coe, Cond, Conj, Cube, Formula, LocalVar, Match, MetaRef, PApp, PLam, Param,
    Partial, PartialElem, PartialTy, Pat, Restr, Side, Term,
};
use utility::{difference, smallvec};

#[track_caller]
fn assert_alpha_eq(actual: &Term, expected: &Term) {
    if !actual.alpha_eq(expected) {
        panic!(
            "the normalized term does not match the expected one:\n{}",
            difference(&expected.to_string(), &actual.to_string(), "\n"),
        );
    }
}

fn var(name: &str) -> LocalVar {
    LocalVar::new(name)
}

fn ref_(var: &LocalVar) -> Term {
    Term::Ref(var.clone())
}

fn lam(param: &LocalVar, body: Term) -> Term {
    Term::lam(Param::new(param.clone(), Term::Type), body)
}

fn app(fun: Term, arg: Term) -> Term {
    Term::app(fun, Arg::explicit(arg))
}

#[test]
fn beta() {
    let x = var("x");
    let y = var("y");
    let term = app(lam(&x, ref_(&x)), ref_(&y));

    assert_alpha_eq(&normalize(&term), &ref_(&y));
}

#[test]
fn nested_beta() {
    let x = var("x");
    let y = var("y");
    let a = var("a");
    let b = var("b");
    let term = app(app(lam(&x, lam(&y, ref_(&x))), ref_(&a)), ref_(&b));

    assert_alpha_eq(&normalize(&term), &ref_(&a));
}

#[test]
fn beta_respects_the_substitution() {
    // (λx. λy. x y) y does not capture the free y
    let x = var("x");
    let y = var("y");
    let term = app(
        lam(&x, lam(&y, app(ref_(&x), ref_(&y)))),
        ref_(&y),
    );

    let normalized = normalize(&term);
    let Term::Lam(lam) = &normalized else { panic!() };
    let Term::App(body) = &lam.body else { panic!() };
    assert_eq!(body.fun, ref_(&y));
    assert_eq!(body.arg.term, Term::Ref(lam.param.var.clone()));
}

#[test]
fn normalization_is_idempotent() {
    let x = var("x");
    let y = var("y");
    let i = var("i");

    let terms = [
        app(lam(&x, ref_(&x)), ref_(&y)),
        Term::Formula(Formula::inv(Term::Formula(Formula::inv(ref_(&i))).into())),
        Term::proj(Term::Tup(vec![ref_(&x), ref_(&y)]), 1),
        Coe {
            restr: Restr::top(),
            ty: lam(&i, Term::Type),
        }
        .into(),
    ];

    for term in terms {
        let once = normalize(&term);
        let twice = normalize(&once);
        assert_alpha_eq(&twice, &once);
        assert!(twice == once, "re-normalization changed the structure");
    }
}

#[test]
fn double_involution_cancels() {
    let i = var("i");
    let term = Term::Formula(Formula::inv(
        Term::Formula(Formula::inv(ref_(&i))).into(),
    ));

    assert_alpha_eq(&normalize(&term), &ref_(&i));
}

#[test]
fn conjunction_is_idempotent() {
    let i = var("i");
    let term = Term::Formula(Formula::and(ref_(&i), ref_(&i)));

    assert_alpha_eq(&normalize(&term), &ref_(&i));
}

#[test]
fn literal_endpoints_collapse() {
    let i = var("i");

    assert_alpha_eq(
        &normalize(&Term::Formula(Formula::and(Term::right(), ref_(&i)))),
        &ref_(&i),
    );
    assert_alpha_eq(
        &normalize(&Term::Formula(Formula::or(Term::right(), ref_(&i)))),
        &Term::right(),
    );
    assert_alpha_eq(
        &normalize(&Term::Formula(Formula::and(Term::left(), ref_(&i)))),
        &Term::left(),
    );
}

#[test]
fn excluded_middle_is_not_decided_on_variables() {
    let i = var("i");
    let term = Term::Formula(Formula::or(
        ref_(&i),
        Term::Formula(Formula::inv(ref_(&i))).into(),
    ));

    assert!(matches!(normalize(&term), Term::Formula(Formula::Conn(_))));
}

#[test]
fn absorption() {
    let i = var("i");
    let j = var("j");
    let term = Term::Formula(Formula::and(
        ref_(&i),
        Term::Formula(Formula::or(ref_(&i), ref_(&j))).into(),
    ));

    assert_alpha_eq(&normalize(&term), &ref_(&i));
}

#[test]
fn partial_type_unwraps_on_the_total_face() {
    let ty: Term = PartialTy {
        ty: Term::Type,
        restr: Restr::Vary(vec![Conj::single(Cond {
            inst: Term::right(),
            is_one: true,
        })]),
    }
    .into();

    assert_alpha_eq(&normalize(&ty), &Term::Type);
}

#[test]
fn partial_type_keeps_proper_restrictions() {
    let i = var("i");
    let ty: Term = PartialTy {
        ty: Term::Type,
        restr: Restr::single(Cond {
            inst: ref_(&i),
            is_one: true,
        }),
    }
    .into();

    assert!(matches!(normalize(&ty), Term::PartialTy(_)));
}

#[test]
fn solved_metas_are_inlined() {
    let meta = MetaRef::new("m");
    meta.solve(Term::Type);

    assert_alpha_eq(&normalize(&Term::MetaPat(meta)), &Term::Type);
}

#[test]
fn unsolved_metas_stay() {
    let meta = MetaRef::new("m");

    assert!(matches!(
        normalize(&Term::MetaPat(meta)),
        Term::MetaPat(_)
    ));
}

#[test]
fn projection() {
    let x = var("x");
    let y = var("y");
    let term = Term::proj(Term::Tup(vec![ref_(&x), ref_(&y)]), 2);

    assert_alpha_eq(&normalize(&term), &ref_(&y));
}

#[test]
fn stuck_projection_is_kept() {
    let p = var("p");
    let term = Term::proj(ref_(&p), 1);

    assert!(matches!(normalize(&term), Term::Proj(_)));
}

#[test]
fn first_matching_clause_wins() {
    let x = var("x");
    let y = var("y");
    let u = var("u");
    let term: Term = Match {
        scrutinees: vec![ref_(&u)],
        clauses: vec![
            Clause {
                pats: vec![Pat::Bind(x.clone())],
                body: ref_(&x),
            },
            Clause {
                pats: vec![Pat::Bind(y.clone())],
                body: Term::Type,
            },
        ],
    }
    .into();

    assert_alpha_eq(&normalize(&term), &ref_(&u));
}

#[test]
fn tuple_patterns_destructure() {
    let a = var("a");
    let b = var("b");
    let u = var("u");
    let v = var("v");
    let term: Term = Match {
        scrutinees: vec![Term::Tup(vec![ref_(&u), ref_(&v)])],
        clauses: vec![Clause {
            pats: vec![Pat::Tup(vec![Pat::Bind(a.clone()), Pat::Bind(b.clone())])],
            body: ref_(&b),
        }],
    }
    .into();

    assert_alpha_eq(&normalize(&term), &ref_(&v));
}

#[test]
fn stuck_scrutinees_block_matching() {
    let a = var("a");
    let b = var("b");
    let u = var("u");
    let term: Term = Match {
        scrutinees: vec![ref_(&u)],
        clauses: vec![Clause {
            pats: vec![Pat::Tup(vec![Pat::Bind(a.clone()), Pat::Bind(b.clone())])],
            body: ref_(&a),
        }],
    }
    .into();

    assert!(matches!(normalize(&term), Term::Match(_)));
}

fn cube(params: Vec<LocalVar>, ty: Term, partial: Partial) -> Cube {
    Cube {
        params: params.into(),
        ty,
        partial,
    }
}

#[test]
fn path_beta() {
    let i = var("i");
    let j = var("j");
    let u = var("u");
    let plam: Term = PLam {
        params: smallvec![i.clone()],
        body: ref_(&i),
    }
    .into();
    let term: Term = PApp {
        fun: plam,
        args: smallvec![Arg::explicit(ref_(&u))],
        cube: cube(
            vec![j.clone()],
            Term::Type,
            Partial::Split(Vec::new()),
        ),
    }
    .into();

    assert_alpha_eq(&normalize(&term), &ref_(&u));
}

#[test]
fn erased_path_application() {
    let i = var("i");
    let u = var("u");
    let term: Term = PApp {
        fun: Term::Erased(Box::new(Term::Type)),
        args: smallvec![Arg::explicit(ref_(&u))],
        cube: cube(
            vec![i.clone()],
            app(Term::Ref(var("B")), ref_(&i)),
            Partial::Split(Vec::new()),
        ),
    }
    .into();

    let Term::Erased(ty) = normalize(&term) else {
        panic!()
    };
    let Term::App(app) = &*ty else { panic!() };
    assert_eq!(app.arg.term, ref_(&u));
}

#[test]
fn total_partial_elements_project_out() {
    let i = var("i");
    let p = var("p");
    let u = var("u");
    let term: Term = PApp {
        fun: ref_(&p),
        args: smallvec![Arg::explicit(Term::right())],
        cube: cube(
            vec![i.clone()],
            Term::Type,
            Partial::Const(Box::new(ref_(&u))),
        ),
    }
    .into();

    assert_alpha_eq(&normalize(&term), &ref_(&u));
}

#[test]
fn split_partial_elements_stay_applied() {
    let i = var("i");
    let p = var("p");
    let u = var("u");
    let term: Term = PApp {
        fun: ref_(&p),
        args: smallvec![Arg::explicit(ref_(&i))],
        cube: cube(
            vec![i.clone()],
            Term::Type,
            Partial::Split(vec![Side {
                cond: Conj::single(Cond {
                    inst: ref_(&i),
                    is_one: true,
                }),
                term: ref_(&u),
            }]),
        ),
    }
    .into();

    assert!(matches!(normalize(&term), Term::PApp(_)));
}

#[test]
fn partial_elements_flatten() {
    let u = var("u");
    let inner: Term = PartialElem {
        partial: Partial::Const(Box::new(ref_(&u))),
        rhs_ty: Term::Type,
    }
    .into();
    let term: Term = PartialElem {
        partial: Partial::Const(Box::new(inner)),
        rhs_ty: Term::Type,
    }
    .into();

    let Term::Partial(elem) = normalize(&term) else {
        panic!()
    };
    assert!(matches!(&elem.partial, Partial::Const(term) if **term == ref_(&u)));
}

#[test]
fn coe_identity() {
    let i = var("i");
    let a = var("A");
    let term: Term = Coe {
        restr: Restr::top(),
        ty: lam(&i, Term::Type),
    }
    .into();

    assert_alpha_eq(
        &normalize(&term),
        &Term::lam(Param::new(a.clone(), Term::Type), ref_(&a)),
    );
}

#[test]
fn coe_along_a_universe_line() {
    let i = var("i");
    let j = var("j");
    let a = var("A");
    let term: Term = Coe {
        restr: Restr::single(Cond {
            inst: ref_(&j),
            is_one: true,
        }),
        ty: lam(&i, Term::Type),
    }
    .into();

    assert_alpha_eq(
        &normalize(&term),
        &Term::lam(Param::new(a.clone(), Term::Type), ref_(&a)),
    );
}

#[test]
fn coe_along_a_pi_line() {
    let i = var("i");
    let j = var("j");
    let x = var("x");
    let dom = var("D");
    let term: Term = Coe {
        restr: Restr::single(Cond {
            inst: ref_(&j),
            is_one: true,
        }),
        ty: lam(
            &i,
            Term::pi(Param::new(x.clone(), ref_(&dom)), Term::Type),
        ),
    }
    .into();

    // λ u0. λ v. coe _ _ (u0 (fill⁻ v 0))
    let Term::Lam(outer) = normalize(&term) else {
        panic!()
    };
    let Term::Lam(inner) = &outer.body else { panic!() };
    let Term::App(body) = &inner.body else { panic!() };
    assert!(matches!(&body.fun, Term::Coe(_)));
    let Term::App(argument) = &body.arg.term else {
        panic!()
    };
    assert_eq!(argument.fun, Term::Ref(outer.param.var.clone()));
}

#[test]
fn coe_along_a_sigma_line() {
    let i = var("i");
    let j = var("j");
    let x = var("x");
    let y = var("y");
    let term: Term = Coe {
        restr: Restr::single(Cond {
            inst: ref_(&j),
            is_one: true,
        }),
        ty: lam(
            &i,
            Term::Sigma(vec![
                Param::new(x.clone(), Term::Type),
                Param::new(y.clone(), ref_(&x)),
            ]),
        ),
    }
    .into();

    // λ u0. (coe _ _ u0.1, coe _ _ u0.2)
    let Term::Lam(outer) = normalize(&term) else {
        panic!()
    };
    let Term::Tup(items) = &outer.body else { panic!() };
    assert_eq!(items.len(), 2);
    for (index, item) in items.iter().enumerate() {
        let Term::App(app) = item else { panic!() };
        assert!(matches!(&app.fun, Term::Coe(_)));
        let Term::Proj(proj) = &app.arg.term else {
            panic!()
        };
        assert_eq!(proj.index, index + 1);
    }
}

#[test]
fn coe_along_a_path_line_is_stuck() {
    let i = var("i");
    let j = var("j");
    let path: Term = cube(vec![var("k")], Term::Type, Partial::Split(Vec::new())).into();
    let term: Term = Coe {
        restr: Restr::single(Cond {
            inst: ref_(&j),
            is_one: true,
        }),
        ty: lam(&i, path),
    }
    .into();

    assert!(matches!(normalize(&term), Term::Coe(_)));
}

#[test]
fn coe_along_a_neutral_line_is_stuck() {
    let j = var("j");
    let f = var("f");
    let term: Term = Coe {
        restr: Restr::single(Cond {
            inst: ref_(&j),
            is_one: true,
        }),
        ty: ref_(&f),
    }
    .into();

    assert!(matches!(normalize(&term), Term::Coe(_)));
}

#[test]
fn whnf_does_not_reduce_under_binders() {
    let x = var("x");
    let y = var("y");
    let redex = app(lam(&y, ref_(&y)), ref_(&x));
    let term = lam(&x, redex.clone());

    // the redex under the lambda is untouched
    let Term::Lam(lam) = whnf(&term) else { panic!() };
    assert!(matches!(&lam.body, Term::App(_)));

    // but a head redex reduces
    assert_alpha_eq(&whnf(&redex), &ref_(&x));
}

#[test]
fn whnf_chases_nested_head_redexes() {
    let x = var("x");
    let y = var("y");
    let a = var("a");
    let b = var("b");
    let term = app(app(lam(&x, lam(&y, ref_(&x))), ref_(&a)), ref_(&b));

    assert_alpha_eq(&whnf(&term), &ref_(&a));
}
