//! The core term language of the type theory.
//!
//! Terms are immutable after construction and shared by structural
//! reference; the normalizer and the substitution engine always build new
//! terms. Binding is nominal with globally unique variable identities, so
//! α-equivalence is a relation, not an identification.

use std::sync::{Arc, Mutex};
use utility::{Atom, SmallVec};

pub use cubical::{Cond, Conj, Formula, Partial, Restr, Side};
pub use var::LocalVar;

pub mod cubical;
pub mod subst;
mod fmt;
mod var;

/// A term of the core language.
#[derive(Clone, PartialEq)]
pub enum Term {
    /// A bound-variable reference.
    Ref(LocalVar),
    Lam(Box<Lam>),
    App(Box<App>),
    Pi(Box<Pi>),
    /// An n-ary dependent tuple type.
    Sigma(Vec<Param>),
    /// A tuple introduction.
    Tup(Vec<Term>),
    Proj(Box<Proj>),
    Match(Box<Match>),
    /// A pattern meta whose payload may have been solved.
    MetaPat(MetaRef),
    /// A path type.
    Path(Box<Cube>),
    /// A path abstraction.
    PLam(Box<PLam>),
    /// A path application.
    PApp(Box<PApp>),
    /// An interval expression.
    Formula(Formula),
    /// A partial element together with the type of its total face.
    Partial(Box<PartialElem>),
    /// The type of partial elements under a face restriction.
    PartialTy(Box<PartialTy>),
    /// The coercion operator.
    Coe(Box<Coe>),
    /// The interval.
    Interval,
    /// The universe.
    Type,
    /// A proof-irrelevant placeholder of the given type.
    Erased(Box<Term>),
}

impl Term {
    pub fn lam(param: Param, body: Term) -> Self {
        Lam { param, body }.into()
    }

    pub fn app(fun: Term, arg: Arg) -> Self {
        App { fun, arg }.into()
    }

    pub fn pi(param: Param, codomain: Term) -> Self {
        Pi { param, codomain }.into()
    }

    pub fn proj(tup: Term, index: usize) -> Self {
        Proj { tup, index }.into()
    }

    /// The interval endpoint `0`.
    pub fn left() -> Self {
        Self::Formula(Formula::Lit(false))
    }

    /// The interval endpoint `1`.
    pub fn right() -> Self {
        Self::Formula(Formula::Lit(true))
    }

    /// The payload of a formula term.
    pub fn formula(&self) -> Option<&Formula> {
        utility::obtain!(self, Self::Formula(formula) => formula)
    }

    /// Structural equality up to renaming of bound variables.
    pub fn alpha_eq(&self, other: &Self) -> bool {
        alpha::equate(self, other, &mut utility::HashMap::default())
    }
}

/// A typed binder.
#[derive(Clone, PartialEq)]
pub struct Param {
    pub var: LocalVar,
    pub ty: Term,
    pub explicit: bool,
}

impl Param {
    pub fn new(var: LocalVar, ty: Term) -> Self {
        Self {
            var,
            ty,
            explicit: true,
        }
    }
}

/// An argument to an application.
#[derive(Clone, PartialEq)]
pub struct Arg {
    pub term: Term,
    pub explicit: bool,
}

impl Arg {
    pub fn explicit(term: Term) -> Self {
        Self {
            term,
            explicit: true,
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct Lam {
    pub param: Param,
    pub body: Term,
}

#[derive(Clone, PartialEq)]
pub struct App {
    pub fun: Term,
    pub arg: Arg,
}

#[derive(Clone, PartialEq)]
pub struct Pi {
    pub param: Param,
    pub codomain: Term,
}

#[derive(Clone, PartialEq)]
pub struct Proj {
    pub tup: Term,
    /// One-based.
    pub index: usize,
}

#[derive(Clone, PartialEq)]
pub struct Match {
    pub scrutinees: Vec<Term>,
    pub clauses: Vec<Clause>,
}

#[derive(Clone, PartialEq)]
pub struct Clause {
    pub pats: Vec<Pat>,
    pub body: Term,
}

/// A pattern. Order of clauses is significant; the first match wins.
#[derive(Clone, PartialEq)]
pub enum Pat {
    Bind(LocalVar),
    Tup(Vec<Pat>),
}

/// The data of a path: interval binders, the endpoint type and the partial
/// element giving the endpoints.
///
/// Paths are rarely more than binary; binder and argument lists stay inline
/// up to that size.
#[derive(Clone, PartialEq)]
pub struct Cube {
    pub params: SmallVec<LocalVar, 2>,
    pub ty: Term,
    pub partial: Partial,
}

#[derive(Clone, PartialEq)]
pub struct PLam {
    pub params: SmallVec<LocalVar, 2>,
    pub body: Term,
}

#[derive(Clone, PartialEq)]
pub struct PApp {
    pub fun: Term,
    pub args: SmallVec<Arg, 2>,
    pub cube: Cube,
}

#[derive(Clone, PartialEq)]
pub struct PartialElem {
    pub partial: Partial,
    /// The type the element has on its total face.
    pub rhs_ty: Term,
}

#[derive(Clone, PartialEq)]
pub struct PartialTy {
    pub ty: Term,
    pub restr: Restr,
}

#[derive(Clone, PartialEq)]
pub struct Coe {
    pub restr: Restr,
    /// A line of types: a term of interval-to-universe shape.
    pub ty: Term,
}

/// A shared reference to a pattern meta.
///
/// Identity is the allocation, not the name.
#[derive(Clone)]
pub struct MetaRef {
    name: Atom,
    cell: Arc<Mutex<Option<Term>>>,
}

impl MetaRef {
    pub fn new(name: impl Into<Atom>) -> Self {
        Self {
            name: name.into(),
            cell: Arc::new(Mutex::new(None)),
        }
    }

    pub fn name(&self) -> Atom {
        self.name
    }

    /// Record a solution. Later solutions of an already solved meta are ignored.
    pub fn solve(&self, solution: Term) {
        let mut cell = self.cell.lock().unwrap();
        if cell.is_none() {
            *cell = Some(solution);
        }
    }

    pub fn solution(&self) -> Option<Term> {
        self.cell.lock().unwrap().clone()
    }
}

impl PartialEq for MetaRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl From<Lam> for Term {
    fn from(lam: Lam) -> Self {
        Self::Lam(Box::new(lam))
    }
}

impl From<App> for Term {
    fn from(app: App) -> Self {
        Self::App(Box::new(app))
    }
}

impl From<Pi> for Term {
    fn from(pi: Pi) -> Self {
        Self::Pi(Box::new(pi))
    }
}

impl From<Proj> for Term {
    fn from(proj: Proj) -> Self {
        Self::Proj(Box::new(proj))
    }
}

impl From<Match> for Term {
    fn from(match_: Match) -> Self {
        Self::Match(Box::new(match_))
    }
}

impl From<Cube> for Term {
    fn from(cube: Cube) -> Self {
        Self::Path(Box::new(cube))
    }
}

impl From<PLam> for Term {
    fn from(lam: PLam) -> Self {
        Self::PLam(Box::new(lam))
    }
}

impl From<PApp> for Term {
    fn from(app: PApp) -> Self {
        Self::PApp(Box::new(app))
    }
}

impl From<Formula> for Term {
    fn from(formula: Formula) -> Self {
        Self::Formula(formula)
    }
}

impl From<PartialElem> for Term {
    fn from(partial: PartialElem) -> Self {
        Self::Partial(Box::new(partial))
    }
}

impl From<PartialTy> for Term {
    fn from(ty: PartialTy) -> Self {
        Self::PartialTy(Box::new(ty))
    }
}

impl From<Coe> for Term {
    fn from(coe: Coe) -> Self {
        Self::Coe(Box::new(coe))
    }
}

mod alpha {
    use super::{Formula, Partial, Pat, Restr, Term};
    use crate::LocalVar;
    use utility::HashMap;

    type Renaming = HashMap<LocalVar, LocalVar>;

    pub(super) fn equate(lhs: &Term, rhs: &Term, renaming: &mut Renaming) -> bool {
        use Term::*;

        match (lhs, rhs) {
            (Ref(lhs), Ref(rhs)) => renaming.get(lhs).unwrap_or(lhs) == rhs,
            (Lam(lhs), Lam(rhs)) => {
                equate(&lhs.param.ty, &rhs.param.ty, renaming) && {
                    renaming.insert(lhs.param.var.clone(), rhs.param.var.clone());
                    equate(&lhs.body, &rhs.body, renaming)
                }
            }
            (App(lhs), App(rhs)) => {
                equate(&lhs.fun, &rhs.fun, renaming) && equate(&lhs.arg.term, &rhs.arg.term, renaming)
            }
            (Pi(lhs), Pi(rhs)) => {
                equate(&lhs.param.ty, &rhs.param.ty, renaming) && {
                    renaming.insert(lhs.param.var.clone(), rhs.param.var.clone());
                    equate(&lhs.codomain, &rhs.codomain, renaming)
                }
            }
            (Sigma(lhs), Sigma(rhs)) => {
                lhs.len() == rhs.len()
                    && lhs.iter().zip(rhs).all(|(lhs, rhs)| {
                        equate(&lhs.ty, &rhs.ty, renaming) && {
                            renaming.insert(lhs.var.clone(), rhs.var.clone());
                            true
                        }
                    })
            }
            (Tup(lhs), Tup(rhs)) => {
                lhs.len() == rhs.len()
                    && lhs.iter().zip(rhs).all(|(lhs, rhs)| equate(lhs, rhs, renaming))
            }
            (Proj(lhs), Proj(rhs)) => {
                lhs.index == rhs.index && equate(&lhs.tup, &rhs.tup, renaming)
            }
            (Match(lhs), Match(rhs)) => {
                lhs.scrutinees.len() == rhs.scrutinees.len()
                    && lhs.clauses.len() == rhs.clauses.len()
                    && lhs
                        .scrutinees
                        .iter()
                        .zip(&rhs.scrutinees)
                        .all(|(lhs, rhs)| equate(lhs, rhs, renaming))
                    && lhs.clauses.iter().zip(&rhs.clauses).all(|(lhs, rhs)| {
                        lhs.pats.len() == rhs.pats.len()
                            && lhs
                                .pats
                                .iter()
                                .zip(&rhs.pats)
                                .all(|(lhs, rhs)| equate_pats(lhs, rhs, renaming))
                            && equate(&lhs.body, &rhs.body, renaming)
                    })
            }
            (MetaPat(lhs), MetaPat(rhs)) => lhs == rhs,
            (Path(lhs), Path(rhs)) => {
                lhs.params.len() == rhs.params.len() && {
                    for (lhs, rhs) in lhs.params.iter().zip(&rhs.params) {
                        renaming.insert(lhs.clone(), rhs.clone());
                    }
                    equate(&lhs.ty, &rhs.ty, renaming)
                        && equate_partials(&lhs.partial, &rhs.partial, renaming)
                }
            }
            (PLam(lhs), PLam(rhs)) => {
                lhs.params.len() == rhs.params.len() && {
                    for (lhs, rhs) in lhs.params.iter().zip(&rhs.params) {
                        renaming.insert(lhs.clone(), rhs.clone());
                    }
                    equate(&lhs.body, &rhs.body, renaming)
                }
            }
            (PApp(lhs), PApp(rhs)) => {
                equate(&lhs.fun, &rhs.fun, renaming)
                    && lhs.args.len() == rhs.args.len()
                    && lhs
                        .args
                        .iter()
                        .zip(&rhs.args)
                        .all(|(lhs, rhs)| equate(&lhs.term, &rhs.term, renaming))
            }
            (Term::Formula(lhs), Term::Formula(rhs)) => equate_formulas(lhs, rhs, renaming),
            (Term::Partial(lhs), Term::Partial(rhs)) => {
                equate_partials(&lhs.partial, &rhs.partial, renaming)
                    && equate(&lhs.rhs_ty, &rhs.rhs_ty, renaming)
            }
            (PartialTy(lhs), PartialTy(rhs)) => {
                equate(&lhs.ty, &rhs.ty, renaming)
                    && equate_restrs(&lhs.restr, &rhs.restr, renaming)
            }
            (Coe(lhs), Coe(rhs)) => {
                equate_restrs(&lhs.restr, &rhs.restr, renaming)
                    && equate(&lhs.ty, &rhs.ty, renaming)
            }
            (Interval, Interval) | (Type, Type) => true,
            (Erased(lhs), Erased(rhs)) => equate(lhs, rhs, renaming),
            _ => false,
        }
    }

    fn equate_pats(lhs: &Pat, rhs: &Pat, renaming: &mut Renaming) -> bool {
        match (lhs, rhs) {
            (Pat::Bind(lhs), Pat::Bind(rhs)) => {
                renaming.insert(lhs.clone(), rhs.clone());
                true
            }
            (Pat::Tup(lhs), Pat::Tup(rhs)) => {
                lhs.len() == rhs.len()
                    && lhs
                        .iter()
                        .zip(rhs)
                        .all(|(lhs, rhs)| equate_pats(lhs, rhs, renaming))
            }
            _ => false,
        }
    }

    fn equate_formulas(lhs: &Formula, rhs: &Formula, renaming: &mut Renaming) -> bool {
        match (lhs, rhs) {
            (Formula::Lit(lhs), Formula::Lit(rhs)) => lhs == rhs,
            (Formula::Inv(lhs), Formula::Inv(rhs)) => equate(lhs, rhs, renaming),
            (Formula::Conn(lhs), Formula::Conn(rhs)) => {
                lhs.is_and == rhs.is_and
                    && equate(&lhs.lhs, &rhs.lhs, renaming)
                    && equate(&lhs.rhs, &rhs.rhs, renaming)
            }
            _ => false,
        }
    }

    fn equate_restrs(lhs: &Restr, rhs: &Restr, renaming: &mut Renaming) -> bool {
        match (lhs, rhs) {
            (Restr::Const(lhs), Restr::Const(rhs)) => lhs == rhs,
            (Restr::Vary(lhs), Restr::Vary(rhs)) => {
                lhs.len() == rhs.len()
                    && lhs.iter().zip(rhs).all(|(lhs, rhs)| {
                        lhs.conds.len() == rhs.conds.len()
                            && lhs.conds.iter().zip(&rhs.conds).all(|(lhs, rhs)| {
                                lhs.is_one == rhs.is_one && equate(&lhs.inst, &rhs.inst, renaming)
                            })
                    })
            }
            _ => false,
        }
    }

    fn equate_partials(lhs: &Partial, rhs: &Partial, renaming: &mut Renaming) -> bool {
        match (lhs, rhs) {
            (Partial::Const(lhs), Partial::Const(rhs)) => equate(lhs, rhs, renaming),
            (Partial::Split(lhs), Partial::Split(rhs)) => {
                lhs.len() == rhs.len()
                    && lhs.iter().zip(rhs).all(|(lhs, rhs)| {
                        lhs.cond.conds.len() == rhs.cond.conds.len()
                            && lhs.cond.conds.iter().zip(&rhs.cond.conds).all(|(lhs, rhs)| {
                                lhs.is_one == rhs.is_one && equate(&lhs.inst, &rhs.inst, renaming)
                            })
                            && equate(&lhs.term, &rhs.term, renaming)
                    })
            }
            _ => false,
        }
    }
}
