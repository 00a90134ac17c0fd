//! Interval formulas, face restrictions and partial elements.

use crate::Term;

/// An interval expression: endpoints and the lattice connectives.
#[derive(Clone, PartialEq)]
pub enum Formula {
    /// `0` (`false`) or `1` (`true`).
    Lit(bool),
    /// The involution `¬`.
    Inv(Box<Term>),
    /// `∧` or `∨`.
    Conn(Box<Conn>),
}

#[derive(Clone, PartialEq)]
pub struct Conn {
    pub is_and: bool,
    pub lhs: Term,
    pub rhs: Term,
}

impl Formula {
    pub fn inv(operand: Term) -> Self {
        Self::Inv(Box::new(operand))
    }

    pub fn and(lhs: Term, rhs: Term) -> Self {
        Self::Conn(Box::new(Conn {
            is_and: true,
            lhs,
            rhs,
        }))
    }

    pub fn or(lhs: Term, rhs: Term) -> Self {
        Self::Conn(Box::new(Conn {
            is_and: false,
            lhs,
            rhs,
        }))
    }

    /// Simplify one connective layer by the lattice laws.
    ///
    /// Operands are expected to be simplified already; the result is
    /// canonical under that precondition. Complementation is only decided
    /// on literals, never on opaque interval terms.
    pub fn simplify(self) -> Term {
        match self {
            Self::Lit(_) => self.into(),
            Self::Inv(operand) => match *operand {
                Term::Formula(Self::Lit(literal)) => Self::Lit(!literal).into(),
                Term::Formula(Self::Inv(operand)) => *operand,
                operand => Self::inv(operand).into(),
            },
            Self::Conn(conn) => {
                let Conn { is_and, lhs, rhs } = *conn;

                match (lhs, rhs) {
                    // identity and absorbing elements
                    (Term::Formula(Self::Lit(literal)), other)
                    | (other, Term::Formula(Self::Lit(literal))) => {
                        if literal == is_and {
                            other
                        } else {
                            Self::Lit(literal).into()
                        }
                    }
                    // idempotence
                    (lhs, rhs) if lhs == rhs => lhs,
                    // absorption
                    (lhs, rhs) if absorbs(is_and, &lhs, &rhs) => lhs,
                    (lhs, rhs) if absorbs(is_and, &rhs, &lhs) => rhs,
                    (lhs, rhs) => Self::Conn(Box::new(Conn { is_and, lhs, rhs })).into(),
                }
            }
        }
    }

    pub fn map(&self, mapper: &mut impl FnMut(&Term) -> Term) -> Self {
        match self {
            Self::Lit(literal) => Self::Lit(*literal),
            Self::Inv(operand) => Self::inv(mapper(operand)),
            Self::Conn(conn) => Self::Conn(Box::new(Conn {
                is_and: conn.is_and,
                lhs: mapper(&conn.lhs),
                rhs: mapper(&conn.rhs),
            })),
        }
    }
}

/// `x ∧ (x ∨ y) = x` and dually.
fn absorbs(is_and: bool, keeper: &Term, other: &Term) -> bool {
    matches!(
        other,
        Term::Formula(Formula::Conn(inner))
            if inner.is_and != is_and && (inner.lhs == *keeper || inner.rhs == *keeper)
    )
}

/// An interval equation: `inst = 1` or `inst = 0`.
#[derive(Clone, PartialEq)]
pub struct Cond {
    pub inst: Term,
    pub is_one: bool,
}

/// A conjunction of interval equations. Empty means `⊤`.
#[derive(Clone, PartialEq, Default)]
pub struct Conj {
    pub conds: Vec<Cond>,
}

impl Conj {
    pub fn single(cond: Cond) -> Self {
        Self { conds: vec![cond] }
    }

    /// `⊤`, `⊥` or a reduced conjunction.
    pub(crate) fn normalize(&self) -> ConjOutcome {
        let mut conds: Vec<Cond> = Vec::new();

        for cond in &self.conds {
            if let Term::Formula(Formula::Lit(literal)) = &cond.inst {
                if *literal == cond.is_one {
                    continue;
                }
                return ConjOutcome::False;
            }

            if conds
                .iter()
                .any(|other| other.inst == cond.inst && other.is_one != cond.is_one)
            {
                return ConjOutcome::False;
            }
            if !conds.contains(cond) {
                conds.push(cond.clone());
            }
        }

        if conds.is_empty() {
            ConjOutcome::True
        } else {
            ConjOutcome::Conj(Self { conds })
        }
    }

    pub fn map(&self, mapper: &mut impl FnMut(&Term) -> Term) -> Self {
        Self {
            conds: self
                .conds
                .iter()
                .map(|cond| Cond {
                    inst: mapper(&cond.inst),
                    is_one: cond.is_one,
                })
                .collect(),
        }
    }
}

pub(crate) enum ConjOutcome {
    True,
    False,
    Conj(Conj),
}

/// A face restriction: a disjunction of conjunctions of interval equations.
#[derive(Clone, PartialEq)]
pub enum Restr {
    /// `Const(true)` is the total face `⊤`, `Const(false)` is `⊥`.
    Const(bool),
    Vary(Vec<Conj>),
}

impl Restr {
    pub fn top() -> Self {
        Self::Const(true)
    }

    pub fn bottom() -> Self {
        Self::Const(false)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Self::Const(true))
    }

    pub fn single(cond: Cond) -> Self {
        Self::Vary(vec![Conj::single(cond)])
    }

    /// `self ∨ cond`.
    pub fn or(self, cond: Cond) -> Self {
        match self {
            Self::Const(true) => Self::Const(true),
            Self::Const(false) => Self::single(cond),
            Self::Vary(mut conjs) => {
                conjs.push(Conj::single(cond));
                Self::Vary(conjs)
            }
        }
    }

    /// Simplify to `⊥`, `⊤` or a canonical disjunctive normal form.
    pub fn normalize(&self) -> Self {
        let conjs = match self {
            Self::Const(_) => return self.clone(),
            Self::Vary(conjs) => conjs,
        };

        let mut normalized: Vec<Conj> = Vec::new();

        for conj in conjs {
            match conj.normalize() {
                ConjOutcome::True => return Self::Const(true),
                ConjOutcome::False => {}
                ConjOutcome::Conj(conj) => {
                    if !normalized.contains(&conj) {
                        normalized.push(conj);
                    }
                }
            }
        }

        if normalized.is_empty() {
            Self::Const(false)
        } else {
            Self::Vary(normalized)
        }
    }

    pub fn map(&self, mapper: &mut impl FnMut(&Term) -> Term) -> Self {
        match self {
            Self::Const(literal) => Self::Const(*literal),
            Self::Vary(conjs) => Self::Vary(conjs.iter().map(|conj| conj.map(mapper)).collect()),
        }
    }
}

/// One clause of a partial element.
#[derive(Clone, PartialEq)]
pub struct Side {
    pub cond: Conj,
    pub term: Term,
}

/// A partial element: per-face clauses, or a total element.
#[derive(Clone, PartialEq)]
pub enum Partial {
    Split(Vec<Side>),
    Const(Box<Term>),
}

impl Partial {
    /// Merge nested partial elements and canonicalize.
    ///
    /// A clause whose body is itself a partial element is spliced in with
    /// conjoined faces; a single clause on the total face collapses to
    /// `Const`; clauses with unsatisfiable faces are dropped.
    pub fn flatten(self) -> Self {
        match self {
            Self::Const(term) => match *term {
                Term::Partial(elem) => elem.partial.flatten(),
                term => Self::Const(Box::new(term)),
            },
            Self::Split(sides) => {
                let mut flattened: Vec<Side> = Vec::new();

                for side in sides {
                    match side.term {
                        Term::Partial(elem) => match elem.partial.flatten() {
                            Self::Const(term) => flattened.push(Side {
                                cond: side.cond,
                                term: *term,
                            }),
                            Self::Split(inner) => {
                                for inner_side in inner {
                                    let mut cond = side.cond.clone();
                                    cond.conds.extend(inner_side.cond.conds);
                                    flattened.push(Side {
                                        cond,
                                        term: inner_side.term,
                                    });
                                }
                            }
                        },
                        term => flattened.push(Side {
                            cond: side.cond,
                            term,
                        }),
                    }
                }

                flattened.retain(|side| !matches!(side.cond.normalize(), ConjOutcome::False));

                if flattened.len() == 1
                    && matches!(flattened[0].cond.normalize(), ConjOutcome::True)
                {
                    let side = flattened.pop().unwrap();
                    Self::Const(Box::new(side.term))
                } else {
                    Self::Split(flattened)
                }
            }
        }
    }

    pub fn map(&self, mapper: &mut impl FnMut(&Term) -> Term) -> Self {
        match self {
            Self::Const(term) => Self::Const(Box::new(mapper(term))),
            Self::Split(sides) => Self::Split(
                sides
                    .iter()
                    .map(|side| Side {
                        cond: side.cond.map(mapper),
                        term: mapper(&side.term),
                    })
                    .collect(),
            ),
        }
    }
}
