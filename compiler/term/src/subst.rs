//! Capture-avoiding substitution.
//!
//! A substitution is a finite map from variables to terms. Applying one is
//! a full traversal which freshens every binder it passes under, so shared
//! subterms can be β-reduced repeatedly without their binders aliasing.

use crate::{
    App, Arg, Clause, Coe, Cube, Lam, LocalVar, Match, PApp, PLam, Param, PartialElem, PartialTy,
    Pat, Pi, Proj, Term,
};
use utility::{HashMap, SmallVec};

/// A finite mapping from variables to terms.
#[derive(Clone, Default)]
pub struct Subst {
    map: HashMap<LocalVar, Term>,
}

impl Subst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn one(var: LocalVar, term: Term) -> Self {
        let mut subst = Self::new();
        subst.bind(var, term);
        subst
    }

    /// Zip binders against arguments. Surplus on either side is ignored.
    pub fn zip(vars: &[LocalVar], terms: impl IntoIterator<Item = Term>) -> Self {
        let mut subst = Self::new();
        for (var, term) in vars.iter().zip(terms) {
            subst.bind(var.clone(), term);
        }
        subst
    }

    pub fn bind(&mut self, var: LocalVar, term: Term) {
        self.map.insert(var, term);
    }

    /// Sequential composition: applying the result is applying `self`,
    /// then `then`.
    #[must_use]
    pub fn compose(&self, then: &Subst) -> Subst {
        let mut composed = then.clone();
        for (var, term) in &self.map {
            composed.map.insert(var.clone(), term.subst(then));
        }
        composed
    }

    pub fn lookup(&self, var: &LocalVar) -> Option<&Term> {
        self.map.get(var)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Term {
    pub fn subst(&self, subst: &Subst) -> Term {
        if subst.is_empty() {
            return self.clone();
        }

        match self {
            Self::Ref(var) => subst.lookup(var).cloned().unwrap_or_else(|| self.clone()),
            Self::Lam(lam) => {
                let (param, subst) = freshen_param(&lam.param, subst);
                Lam {
                    param,
                    body: lam.body.subst(&subst),
                }
                .into()
            }
            Self::App(app) => App {
                fun: app.fun.subst(subst),
                arg: subst_arg(&app.arg, subst),
            }
            .into(),
            Self::Pi(pi) => {
                let (param, subst) = freshen_param(&pi.param, subst);
                Pi {
                    param,
                    codomain: pi.codomain.subst(&subst),
                }
                .into()
            }
            Self::Sigma(params) => {
                let mut subst = subst.clone();
                Self::Sigma(
                    params
                        .iter()
                        .map(|param| {
                            let (param, extended) = freshen_param(param, &subst);
                            subst = extended;
                            param
                        })
                        .collect(),
                )
            }
            Self::Tup(items) => {
                Self::Tup(items.iter().map(|item| item.subst(subst)).collect())
            }
            Self::Proj(proj) => Proj {
                tup: proj.tup.subst(subst),
                index: proj.index,
            }
            .into(),
            Self::Match(match_) => Match {
                scrutinees: match_
                    .scrutinees
                    .iter()
                    .map(|scrutinee| scrutinee.subst(subst))
                    .collect(),
                clauses: match_
                    .clauses
                    .iter()
                    .map(|clause| {
                        let mut subst = subst.clone();
                        let pats = clause
                            .pats
                            .iter()
                            .map(|pat| freshen_pat(pat, &mut subst))
                            .collect();
                        Clause {
                            pats,
                            body: clause.body.subst(&subst),
                        }
                    })
                    .collect(),
            }
            .into(),
            Self::MetaPat(_) | Self::Interval | Self::Type => self.clone(),
            Self::Path(cube) => subst_cube(cube, subst).into(),
            Self::PLam(lam) => {
                let mut subst = subst.clone();
                let params = freshen_vars(&lam.params, &mut subst);
                PLam {
                    params,
                    body: lam.body.subst(&subst),
                }
                .into()
            }
            Self::PApp(app) => PApp {
                fun: app.fun.subst(subst),
                args: app.args.iter().map(|arg| subst_arg(arg, subst)).collect(),
                cube: subst_cube(&app.cube, subst),
            }
            .into(),
            Self::Formula(formula) => Self::Formula(formula.map(&mut |term| term.subst(subst))),
            Self::Partial(elem) => PartialElem {
                partial: elem.partial.map(&mut |term| term.subst(subst)),
                rhs_ty: elem.rhs_ty.subst(subst),
            }
            .into(),
            Self::PartialTy(ty) => PartialTy {
                ty: ty.ty.subst(subst),
                restr: ty.restr.map(&mut |term| term.subst(subst)),
            }
            .into(),
            Self::Coe(coe) => Coe {
                restr: coe.restr.map(&mut |term| term.subst(subst)),
                ty: coe.ty.subst(subst),
            }
            .into(),
            Self::Erased(ty) => Self::Erased(Box::new(ty.subst(subst))),
        }
    }
}

fn subst_arg(arg: &Arg, subst: &Subst) -> Arg {
    Arg {
        term: arg.term.subst(subst),
        explicit: arg.explicit,
    }
}

fn subst_cube(cube: &Cube, subst: &Subst) -> Cube {
    let mut subst = subst.clone();
    let params = freshen_vars(&cube.params, &mut subst);
    Cube {
        params,
        ty: cube.ty.subst(&subst),
        partial: cube.partial.map(&mut |term| term.subst(&subst)),
    }
}

fn freshen_param(param: &Param, subst: &Subst) -> (Param, Subst) {
    let var = param.var.fresh();
    let ty = param.ty.subst(subst);

    let mut subst = subst.clone();
    subst.bind(param.var.clone(), Term::Ref(var.clone()));

    (
        Param {
            var,
            ty,
            explicit: param.explicit,
        },
        subst,
    )
}

fn freshen_vars(vars: &[LocalVar], subst: &mut Subst) -> SmallVec<LocalVar, 2> {
    vars.iter()
        .map(|var| {
            let fresh = var.fresh();
            subst.bind(var.clone(), Term::Ref(fresh.clone()));
            fresh
        })
        .collect()
}

fn freshen_pat(pat: &Pat, subst: &mut Subst) -> Pat {
    match pat {
        Pat::Bind(var) => {
            let fresh = var.fresh();
            subst.bind(var.clone(), Term::Ref(fresh.clone()));
            Pat::Bind(fresh)
        }
        Pat::Tup(pats) => Pat::Tup(pats.iter().map(|pat| freshen_pat(pat, subst)).collect()),
    }
}

#[cfg(test)]
mod test {
    use super::Subst;
    use crate::{Arg, LocalVar, Param, Term};

    #[test]
    fn replaces_free_references() {
        let x = LocalVar::new("x");
        let y = LocalVar::new("y");
        let term = Term::Ref(x.clone());

        let substituted = term.subst(&Subst::one(x, Term::Ref(y.clone())));
        assert_eq!(substituted, Term::Ref(y));
    }

    #[test]
    fn binders_are_freshened() {
        let x = LocalVar::new("x");
        let y = LocalVar::new("y");
        let identity = Term::lam(Param::new(x.clone(), Term::Type), Term::Ref(x.clone()));

        // substituting an unrelated variable must not leave the binder aliased
        let substituted = identity.subst(&Subst::one(y, Term::Type));
        let Term::Lam(lam) = &substituted else {
            panic!()
        };
        assert_ne!(lam.param.var, x);
        assert_eq!(lam.body, Term::Ref(lam.param.var.clone()));
        assert!(substituted.alpha_eq(&identity));
    }

    #[test]
    fn no_capture_through_nested_binders() {
        let x = LocalVar::new("x");
        let y = LocalVar::new("y");
        // λy. x, substituting x ↦ y from outside must not capture
        let term = Term::lam(Param::new(y.clone(), Term::Type), Term::Ref(x.clone()));

        let substituted = term.subst(&Subst::one(x, Term::Ref(y.clone())));
        let Term::Lam(lam) = &substituted else {
            panic!()
        };
        // the free y stays free: it references the outer y, not the binder
        assert_eq!(lam.body, Term::Ref(y.clone()));
        assert_ne!(lam.param.var, y);
    }

    #[test]
    fn composition_is_sequential_application() {
        let x = LocalVar::new("x");
        let y = LocalVar::new("y");
        let z = LocalVar::new("z");

        let first = Subst::one(x.clone(), Term::Ref(y.clone()));
        let second = Subst::one(y, Term::Ref(z.clone()));
        let composed = first.compose(&second);

        assert_eq!(Term::Ref(x).subst(&composed), Term::Ref(z));
    }

    #[test]
    fn application_arguments_are_substituted() {
        let x = LocalVar::new("x");
        let f = LocalVar::new("f");
        let term = Term::app(Term::Ref(f.clone()), Arg::explicit(Term::Ref(x.clone())));

        let substituted = term.subst(&Subst::one(x, Term::Type));
        let Term::App(app) = &substituted else {
            panic!()
        };
        assert_eq!(app.fun, Term::Ref(f));
        assert_eq!(app.arg.term, Term::Type);
    }
}
