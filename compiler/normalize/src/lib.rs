//! The normalization engine.
//!
//! All cubical reductions are treated as β-reductions: the engine is a
//! bottom-up rewrite where a generic traversal descends into subterms and a
//! post-rule dispatches on the shape of the rewritten node. After a β-step
//! the contractum is re-normalized, consuming one redex per re-entry, so the
//! engine terminates on all well-typed inputs.
//!
//! The engine is pure. It performs no I/O, emits no diagnostics and may be
//! run concurrently on disjoint terms.

use term::{
    subst::Subst, App, Arg, Clause, Coe, Cube, Lam, Match, PApp, PLam, Param, Partial,
    PartialElem, PartialTy, Pat, Pi, Proj, Term,
};

mod coe;
#[cfg(test)]
mod test;

/// The requested strength of normalization.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Normal,
    WeakHeadNormal,
}

pub fn normalize_with(form: Form, term: &Term) -> Term {
    match form {
        Form::Normal => normalize(term),
        Form::WeakHeadNormal => whnf(term),
    }
}

/// Fully normalize a term.
pub fn normalize(term: &Term) -> Term {
    post(descend(term))
}

/// The generic traversal: normalize every subterm, including under binders.
fn descend(term: &Term) -> Term {
    match term {
        Term::Ref(_) | Term::MetaPat(_) | Term::Interval | Term::Type => term.clone(),
        Term::Lam(lam) => Lam {
            param: descend_param(&lam.param),
            body: normalize(&lam.body),
        }
        .into(),
        Term::App(app) => App {
            fun: normalize(&app.fun),
            arg: descend_arg(&app.arg),
        }
        .into(),
        Term::Pi(pi) => Pi {
            param: descend_param(&pi.param),
            codomain: normalize(&pi.codomain),
        }
        .into(),
        Term::Sigma(params) => Term::Sigma(params.iter().map(descend_param).collect()),
        Term::Tup(items) => Term::Tup(items.iter().map(normalize).collect()),
        Term::Proj(proj) => Proj {
            tup: normalize(&proj.tup),
            index: proj.index,
        }
        .into(),
        Term::Match(match_) => Match {
            scrutinees: match_.scrutinees.iter().map(normalize).collect(),
            clauses: match_
                .clauses
                .iter()
                .map(|clause| Clause {
                    pats: clause.pats.clone(),
                    body: normalize(&clause.body),
                })
                .collect(),
        }
        .into(),
        Term::Path(cube) => descend_cube(cube).into(),
        Term::PLam(lam) => PLam {
            params: lam.params.clone(),
            body: normalize(&lam.body),
        }
        .into(),
        Term::PApp(app) => PApp {
            fun: normalize(&app.fun),
            args: app.args.iter().map(descend_arg).collect(),
            cube: descend_cube(&app.cube),
        }
        .into(),
        Term::Formula(formula) => Term::Formula(formula.map(&mut |term| normalize(term))),
        Term::Partial(elem) => PartialElem {
            partial: elem.partial.map(&mut |term| normalize(term)),
            rhs_ty: normalize(&elem.rhs_ty),
        }
        .into(),
        Term::PartialTy(ty) => PartialTy {
            ty: normalize(&ty.ty),
            restr: ty.restr.map(&mut |term| normalize(term)),
        }
        .into(),
        Term::Coe(coe) => Coe {
            restr: coe.restr.map(&mut |term| normalize(term)),
            ty: normalize(&coe.ty),
        }
        .into(),
        Term::Erased(ty) => Term::Erased(Box::new(normalize(ty))),
    }
}

fn descend_param(param: &Param) -> Param {
    Param {
        var: param.var.clone(),
        ty: normalize(&param.ty),
        explicit: param.explicit,
    }
}

fn descend_arg(arg: &Arg) -> Arg {
    Arg {
        term: normalize(&arg.term),
        explicit: arg.explicit,
    }
}

fn descend_cube(cube: &Cube) -> Cube {
    Cube {
        params: cube.params.clone(),
        ty: normalize(&cube.ty),
        partial: cube.partial.map(&mut |term| normalize(term)),
    }
}

/// The post-rule: one rewrite at the head of an already descended term.
fn post(term: Term) -> Term {
    match term {
        Term::Formula(formula) => formula.simplify(),
        Term::PartialTy(ty) => {
            let restr = ty.restr.normalize();
            if restr.is_top() {
                ty.ty
            } else {
                PartialTy { ty: ty.ty, restr }.into()
            }
        }
        Term::MetaPat(meta) => match meta.solution() {
            Some(solution) => solution,
            None => Term::MetaPat(meta),
        },
        Term::App(app) => match make(*app) {
            Made::Reduced(contractum) => normalize(&contractum),
            Made::Stuck(app) => app.into(),
        },
        Term::Proj(proj) => {
            if let Term::Tup(items) = &proj.tup {
                if (1..=items.len()).contains(&proj.index) {
                    return items[proj.index - 1].clone();
                }
            }
            (*proj).into()
        }
        Term::Match(match_) => match try_match(&match_) {
            Some(body) => normalize(&body),
            None => (*match_).into(),
        },
        Term::PApp(app) => post_papp(*app),
        Term::Partial(elem) => PartialElem {
            partial: elem.partial.flatten(),
            rhs_ty: elem.rhs_ty,
        }
        .into(),
        Term::Coe(coe) => coe::post(*coe),
        term => term,
    }
}

enum Made {
    Reduced(Term),
    Stuck(App),
}

/// Try β once.
fn make(app: App) -> Made {
    match app.fun {
        Term::Lam(lam) => Made::Reduced(
            lam.body
                .subst(&Subst::one(lam.param.var, app.arg.term)),
        ),
        fun => Made::Stuck(App { fun, arg: app.arg }),
    }
}

/// Select the first clause matched by every scrutinee.
///
/// A stuck scrutinee (one that is not a head constructor where the pattern
/// demands one) blocks the entire match.
fn try_match(match_: &Match) -> Option<Term> {
    'clauses: for clause in &match_.clauses {
        if clause.pats.len() != match_.scrutinees.len() {
            continue;
        }

        let mut subst = Subst::new();

        for (pat, scrutinee) in clause.pats.iter().zip(&match_.scrutinees) {
            match match_pat(pat, scrutinee, &mut subst) {
                PatMatch::Matched => {}
                PatMatch::Mismatch => continue 'clauses,
                PatMatch::Stuck => return None,
            }
        }

        return Some(clause.body.subst(&subst));
    }

    None
}

enum PatMatch {
    Matched,
    Mismatch,
    Stuck,
}

fn match_pat(pat: &Pat, scrutinee: &Term, subst: &mut Subst) -> PatMatch {
    match (pat, scrutinee) {
        (Pat::Bind(var), _) => {
            subst.bind(var.clone(), scrutinee.clone());
            PatMatch::Matched
        }
        (Pat::Tup(pats), Term::Tup(items)) => {
            if pats.len() != items.len() {
                return PatMatch::Mismatch;
            }
            for (pat, item) in pats.iter().zip(items) {
                match match_pat(pat, item, subst) {
                    PatMatch::Matched => {}
                    outcome => return outcome,
                }
            }
            PatMatch::Matched
        }
        (Pat::Tup(_), _) => PatMatch::Stuck,
    }
}

/// The three-case path-application rule.
fn post_papp(app: PApp) -> Term {
    let PApp { fun, args, cube } = app;

    match fun {
        Term::Erased(_) => {
            let subst = Subst::zip(&cube.params, args.into_iter().map(|arg| arg.term));
            Term::Erased(Box::new(cube.ty.subst(&subst)))
        }
        Term::PLam(lam) => {
            let subst = Subst::zip(&lam.params, args.into_iter().map(|arg| arg.term));
            normalize(&lam.body.subst(&subst))
        }
        fun => match cube.partial.clone().flatten() {
            Partial::Const(term) => *term,
            partial @ Partial::Split(_) => PApp {
                fun,
                args,
                cube: Cube {
                    params: cube.params,
                    ty: cube.ty,
                    partial,
                },
            }
            .into(),
        },
    }
}

/// Reduce only at the head.
pub fn whnf(term: &Term) -> Term {
    match term {
        Term::App(app) => {
            let fun = whnf(&app.fun);
            match fun {
                Term::Lam(lam) => whnf(
                    &lam.body
                        .subst(&Subst::one(lam.param.var, app.arg.term.clone())),
                ),
                fun => Term::app(fun, app.arg.clone()),
            }
        }
        Term::Proj(proj) => {
            let tup = whnf(&proj.tup);
            match tup {
                Term::Tup(items) if (1..=items.len()).contains(&proj.index) => {
                    whnf(&items[proj.index - 1])
                }
                tup => Term::proj(tup, proj.index),
            }
        }
        Term::MetaPat(meta) => match meta.solution() {
            Some(solution) => whnf(&solution),
            None => term.clone(),
        },
        Term::Match(match_) => match try_match(match_) {
            Some(body) => whnf(&body),
            None => term.clone(),
        },
        Term::PApp(app) => {
            let fun = whnf(&app.fun);
            let papp = PApp {
                fun,
                args: app.args.clone(),
                cube: app.cube.clone(),
            };
            match post_papp(papp) {
                Term::PApp(app) => (*app).into(),
                reduced => whnf(&reduced),
            }
        }
        Term::Formula(formula) => formula.clone().simplify(),
        _ => term.clone(),
    }
}
