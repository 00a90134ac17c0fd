//! Textual rendering of terms.
//!
//! A compact single-line notation used by diagnostics, the term query of
//! the language server and the tests. Pretty documents with layouting are
//! the business of an external renderer.

use crate::{Formula, Partial, Pat, Restr, Term};
use std::fmt;

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ref(var) => var.fmt(f),
            Self::Lam(lam) => write!(f, "λ {}. {}", lam.param.var, lam.body),
            Self::App(app) => {
                write!(f, "{} {}", Atomic(&app.fun), Atomic(&app.arg.term))
            }
            Self::Pi(pi) => write!(
                f,
                "Π ({} : {}) → {}",
                pi.param.var, pi.param.ty, pi.codomain
            ),
            Self::Sigma(params) => {
                write!(f, "Σ")?;
                for param in params {
                    write!(f, " ({} : {})", param.var, param.ty)?;
                }
                Ok(())
            }
            Self::Tup(items) => {
                write!(f, "(")?;
                for (index, item) in items.iter().enumerate() {
                    if index != 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt(f)?;
                }
                write!(f, ")")
            }
            Self::Proj(proj) => write!(f, "{}.{}", Atomic(&proj.tup), proj.index),
            Self::Match(match_) => {
                write!(f, "match")?;
                for scrutinee in &match_.scrutinees {
                    write!(f, " {}", Atomic(scrutinee))?;
                }
                write!(f, " {{")?;
                for clause in &match_.clauses {
                    write!(f, " |")?;
                    for pat in &clause.pats {
                        write!(f, " {pat}")?;
                    }
                    write!(f, " ⇒ {}", clause.body)?;
                }
                write!(f, " }}")
            }
            Self::MetaPat(meta) => match meta.solution() {
                Some(solution) => solution.fmt(f),
                None => write!(f, "?{}", meta.name()),
            },
            Self::Path(cube) => {
                write!(f, "[|")?;
                for param in &cube.params {
                    write!(f, " {param}")?;
                }
                write!(f, " |] {}", Atomic(&cube.ty))
            }
            Self::PLam(lam) => {
                write!(f, "λ^")?;
                for param in &lam.params {
                    write!(f, " {param}")?;
                }
                write!(f, ". {}", lam.body)
            }
            Self::PApp(app) => {
                write!(f, "{} @", Atomic(&app.fun))?;
                for arg in &app.args {
                    write!(f, " {}", Atomic(&arg.term))?;
                }
                Ok(())
            }
            Self::Formula(formula) => formula.fmt(f),
            Self::Partial(elem) => write!(f, "{{| {} |}}", elem.partial),
            Self::PartialTy(ty) => write!(f, "Partial {} {}", ty.restr, Atomic(&ty.ty)),
            Self::Coe(coe) => write!(f, "coe {} {}", coe.restr, Atomic(&coe.ty)),
            Self::Interval => write!(f, "I"),
            Self::Type => write!(f, "Type"),
            Self::Erased(ty) => write!(f, "⟨erased : {}⟩", ty),
        }
    }
}

/// Parenthesize non-atomic terms.
struct Atomic<'a>(&'a Term);

impl fmt::Display for Atomic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Term::Ref(_)
            | Term::Tup(_)
            | Term::MetaPat(_)
            | Term::Interval
            | Term::Type
            | Term::Formula(Formula::Lit(_)) => self.0.fmt(f),
            term => write!(f, "({term})"),
        }
    }
}

impl fmt::Display for Pat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind(var) => var.fmt(f),
            Self::Tup(pats) => {
                write!(f, "(")?;
                for (index, pat) in pats.iter().enumerate() {
                    if index != 0 {
                        write!(f, ", ")?;
                    }
                    pat.fmt(f)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lit(false) => write!(f, "0"),
            Self::Lit(true) => write!(f, "1"),
            Self::Inv(operand) => write!(f, "¬{}", Atomic(operand)),
            Self::Conn(conn) => write!(
                f,
                "{} {} {}",
                Atomic(&conn.lhs),
                if conn.is_and { "∧" } else { "∨" },
                Atomic(&conn.rhs)
            ),
        }
    }
}

impl fmt::Display for Restr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(false) => write!(f, "⊥"),
            Self::Const(true) => write!(f, "⊤"),
            Self::Vary(conjs) => {
                for (index, conj) in conjs.iter().enumerate() {
                    if index != 0 {
                        write!(f, " ∨ ")?;
                    }
                    for (index, cond) in conj.conds.iter().enumerate() {
                        if index != 0 {
                            write!(f, " ∧ ")?;
                        }
                        write!(
                            f,
                            "{} = {}",
                            Atomic(&cond.inst),
                            if cond.is_one { "1" } else { "0" }
                        )?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Partial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(term) => term.fmt(f),
            Self::Split(sides) => {
                for (index, side) in sides.iter().enumerate() {
                    if index != 0 {
                        write!(f, " | ")?;
                    }
                    for (index, cond) in side.cond.conds.iter().enumerate() {
                        if index != 0 {
                            write!(f, " ∧ ")?;
                        }
                        write!(
                            f,
                            "{} = {}",
                            Atomic(&cond.inst),
                            if cond.is_one { "1" } else { "0" }
                        )?;
                    }
                    write!(f, " ↦ {}", side.term)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
