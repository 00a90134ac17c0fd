//! The coercion rules.
//!
//! `coe` transports a term along a line of types, acting as the identity on
//! the faces picked out by its restriction. Reduction peeks at the shape of
//! the codomain: Π and Σ lines reduce structurally, universe lines reduce
//! to the identity, path lines and neutral lines are irreducible.

use crate::normalize;
use term::{
    subst::Subst, Arg, Coe, Cond, Formula, LocalVar, Param, Restr, Term,
};

pub(crate) fn post(coe: Coe) -> Term {
    let restr = coe.restr.normalize();

    // the identity coercion
    if restr.is_top() {
        let x = LocalVar::new("x");
        return Term::lam(dom(x.clone(), &coe.ty), Term::Ref(x));
    }

    let coe = Coe { restr, ty: coe.ty };

    let i = LocalVar::new("i");
    let codomain = normalize(&Term::app(
        coe.ty.clone(),
        Arg::explicit(Term::Ref(i.clone())),
    ));

    match codomain {
        // path overloads of coe are not reducible here
        Term::Path(_) => coe.into(),
        Term::Pi(pi) => pi_rule(&coe, &pi, &i),
        Term::Sigma(params) => sigma_rule(&coe, &params, &i),
        Term::Type => {
            let a = LocalVar::new("A");
            Term::lam(Param::new(a.clone(), Term::Type), Term::Ref(a))
        }
        _ => coe.into(),
    }
}

/// The binder of a coercion result: its line of types taken at `0`.
fn dom(var: LocalVar, ty: &Term) -> Param {
    Param::new(var, apply1(ty.clone(), Term::left()))
}

/// Try β once without re-normalizing.
fn apply1(fun: Term, arg: Term) -> Term {
    match fun {
        Term::Lam(lam) => lam.body.subst(&Subst::one(lam.param.var, arg)),
        fun => Term::app(fun, Arg::explicit(arg)),
    }
}

/// Close the free occurrences of `var` in `body` under a fresh interval
/// binder, yielding a line of types.
fn close_line(var: &LocalVar, body: Term) -> Term {
    let fresh = var.fresh();
    Term::lam(
        Param::new(fresh.clone(), Term::Interval),
        body.subst(&Subst::one(var.clone(), Term::Ref(fresh))),
    )
}

/// Transport backward along `ty` from `1` down to `at`.
///
/// The line is reparameterized so that `k = 0` sits at `1` and `k = 1` at
/// `at`; the restriction is extended with `at = 1`, where the transport has
/// to be the identity.
fn fill_inv(ty: &Term, restr: &Restr, at: &Term) -> Term {
    let k = LocalVar::new("k");
    let reparameterized = Formula::or(
        Formula::inv(Term::Ref(k.clone())).into(),
        Formula::and(Term::Ref(k.clone()), at.clone()).into(),
    );

    Coe {
        restr: restr.clone().or(Cond {
            inst: at.clone(),
            is_one: true,
        }),
        ty: Term::lam(
            Param::new(k, Term::Interval),
            apply1(ty.clone(), reparameterized.into()),
        ),
    }
    .into()
}

/// Transport forward along `ty` from `0` up to `at`.
fn fill(ty: &Term, restr: &Restr, at: &Term) -> Term {
    let k = LocalVar::new("k");
    let reparameterized = Formula::and(Term::Ref(k.clone()), at.clone());

    Coe {
        restr: restr.clone().or(Cond {
            inst: at.clone(),
            is_one: false,
        }),
        ty: Term::lam(
            Param::new(k, Term::Interval),
            apply1(ty.clone(), reparameterized.into()),
        ),
    }
    .into()
}

/// The Π-coercion: a λ whose body coerces along the codomain, with the
/// argument coerced backward along the domain.
fn pi_rule(coe: &Coe, pi: &term::Pi, i: &LocalVar) -> Term {
    let u0 = LocalVar::new("u0");
    let v = LocalVar::new("v");

    let dom_line = close_line(i, pi.param.ty.clone());
    let backward = |at: Term| {
        Term::app(
            fill_inv(&dom_line, &coe.restr, &at),
            Arg::explicit(Term::Ref(v.clone())),
        )
    };

    let cod_line = close_line(
        i,
        pi.codomain.subst(&Subst::one(
            pi.param.var.clone(),
            backward(Term::Ref(i.clone())),
        )),
    );

    let v_ty = pi
        .param
        .ty
        .subst(&Subst::one(i.clone(), Term::right()));

    let body = Term::app(
        Coe {
            restr: coe.restr.clone(),
            ty: cod_line,
        }
        .into(),
        Arg::explicit(Term::app(
            Term::Ref(u0.clone()),
            Arg::explicit(backward(Term::left())),
        )),
    );

    Term::lam(
        dom(u0, &coe.ty),
        Term::lam(Param::new(v, v_ty), body),
    )
}

/// The Σ-coercion: a tuple of componentwise coercions, with the forward
/// fillers of earlier components threaded through the telescope.
fn sigma_rule(coe: &Coe, params: &[Param], i: &LocalVar) -> Term {
    let u0 = LocalVar::new("u0");
    let mut fillers = Subst::new();
    let mut items = Vec::new();

    for (index, param) in params.iter().enumerate() {
        let ty_line = close_line(i, param.ty.subst(&fillers));
        let component = Term::proj(Term::Ref(u0.clone()), index + 1);

        items.push(Term::app(
            Coe {
                restr: coe.restr.clone(),
                ty: ty_line.clone(),
            }
            .into(),
            Arg::explicit(component.clone()),
        ));

        fillers.bind(
            param.var.clone(),
            Term::app(
                fill(&ty_line, &coe.restr, &Term::Ref(i.clone())),
                Arg::explicit(component),
            ),
        );
    }

    Term::lam(dom(u0, &coe.ty), Term::Tup(items))
}
