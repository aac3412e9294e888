//! Structural checks on quantum procedure bodies.

use krypton_syntax::ast::{Block, Statement};

use crate::error::{TypeError, TypeResult};

/// Reject classical constructs at the top level of a quantum procedure body.
///
/// `if` and `let` are refused. Measurements and procedure calls pass.
pub fn check_quantum_procedure_block(body: &Block) -> TypeResult<()> {
    for stmt in &body.statements {
        match stmt {
            Statement::If { .. } => return Err(TypeError::QuantumBranching),
            Statement::Let { name, .. } => return Err(TypeError::QuantumVariable(name.clone())),
            Statement::Return(_) | Statement::Expr(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use krypton_syntax::ast::Expr;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Kind {
        Measure,
        Gate,
        Let,
        If,
    }

    fn statement(kind: Kind) -> Statement {
        match kind {
            Kind::Measure => Statement::Expr(Expr::Measure("q".into())),
            Kind::Gate => Statement::Expr(Expr::call("h", vec![Expr::ident("q")])),
            Kind::Let => Statement::Let {
                name: "x".into(),
                value: Expr::int(1),
            },
            Kind::If => Statement::If {
                condition: Expr::bool(true),
                then_block: Block::default(),
                else_block: None,
            },
        }
    }

    fn kind() -> impl Strategy<Value = Kind> {
        prop_oneof![
            Just(Kind::Measure),
            Just(Kind::Gate),
            Just(Kind::Let),
            Just(Kind::If),
        ]
    }

    #[test]
    fn test_measure_allowed() {
        let body = Block::new(vec![statement(Kind::Measure), statement(Kind::Gate)]);
        assert!(check_quantum_procedure_block(&body).is_ok());
    }

    #[test]
    fn test_if_rejected() {
        let body = Block::new(vec![statement(Kind::If)]);
        let err = check_quantum_procedure_block(&body).unwrap_err();
        assert!(err.to_string().contains("cannot contain classical branching"));
    }

    #[test]
    fn test_let_rejected() {
        let body = Block::new(vec![statement(Kind::Measure), statement(Kind::Let)]);
        let err = check_quantum_procedure_block(&body).unwrap_err();
        assert!(err.to_string().contains("cannot declare classical variables"));
    }

    proptest! {
        #[test]
        fn accepts_iff_no_if_or_let(kinds in prop::collection::vec(kind(), 0..12)) {
            let body = Block::new(kinds.iter().copied().map(statement).collect());
            let classical = kinds.iter().any(|k| matches!(k, Kind::Let | Kind::If));
            prop_assert_eq!(check_quantum_procedure_block(&body).is_ok(), !classical);
        }
    }
}
