use proptest::prelude::*;

use crate::{
    config::TreeConfig,
    parser::parse,
    prelude::*,
    printer::{canonical, print, Mode},
    reducer::{locate_next_redex, normalize, reduce_step, Status},
    registry::Registry,
    term::{Term, TermKind},
    tree_layout::layout_tree,
    tromp::{layout_circuit, StrokeKind},
};

const NAMES: [&str; 5] = ["a", "b", "x", "y", "z"];

#[derive(Clone, Debug)]
enum Shape {
    Variable(usize),
    Lambda(usize, Box<Shape>),
    Application(Box<Shape>, Box<Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = (0..NAMES.len()).prop_map(Shape::Variable);
    leaf.prop_recursive(6, 48, 2, |inner| {
        prop_oneof![
            (0..NAMES.len(), inner.clone())
                .prop_map(|(param, body)| Shape::Lambda(param, Box::new(body))),
            (inner.clone(), inner)
                .prop_map(|(func, arg)| Shape::Application(Box::new(func), Box::new(arg))),
        ]
    })
}

fn build(shape: &Shape) -> Term {
    match shape {
        Shape::Variable(name) => Term::variable(identifier(NAMES[*name])),
        Shape::Lambda(param, body) => Term::lambda(identifier(NAMES[*param]), build(body)),
        Shape::Application(func, arg) => Term::application(build(func), build(arg)),
    }
}

/// Binds every free variable of the generated term at the top.
fn closed(shape: &Shape) -> Term {
    let term = build(shape);
    let mut free = term.free_variables().into_iter().collect::<Vec<_>>();
    free.sort();
    free.into_iter()
        .rev()
        .fold(term, |body, name| Term::lambda(name, body))
}

fn size(term: &Term) -> usize {
    match term.kind() {
        TermKind::Variable(_) => 1,
        TermKind::Lambda { body, .. } => 1 + size(body),
        TermKind::Application { func, arg } => 1 + size(func) + size(arg),
    }
}

proptest! {
    #[test]
    fn printed_terms_parse_back(shape in shape()) {
        let term = closed(&shape);
        let reparsed = parse(&print(&term, Mode::AsWritten), &Registry::builtin()).unwrap();
        prop_assert_eq!(canonical(&reparsed), canonical(&term));
    }

    #[test]
    fn unchanged_step_is_identity(shape in shape()) {
        let term = closed(&shape);
        let step = reduce_step(&term).unwrap();
        prop_assert_eq!(step.changed, locate_next_redex(&term).is_some());
        if !step.changed {
            prop_assert_eq!(canonical(&step.term), canonical(&term));
        }
    }

    #[test]
    fn normal_forms_are_stable(shape in shape()) {
        let term = closed(&shape);
        let normalized = normalize(&term, 20);
        prop_assume!(normalized.is_ok());
        let normalized = normalized.unwrap();
        if normalized.status == Status::NormalForm {
            let step = reduce_step(&normalized.term).unwrap();
            prop_assert!(!step.changed);
            prop_assert_eq!(canonical(&step.term), canonical(&normalized.term));
        }
    }

    #[test]
    fn circuit_stays_on_grid(shape in shape()) {
        let term = closed(&shape);
        let layout = layout_circuit(&term, 8.0, locate_next_redex(&term));
        prop_assert!(layout.error.is_none());
        for stroke in &layout.strokes {
            for p in &stroke.points {
                prop_assert!(p.x <= layout.grid_width);
                prop_assert!(p.y <= layout.grid_height);
            }
        }
        let wires = layout.strokes.iter().filter(|s| s.kind == StrokeKind::Wire).count();
        prop_assert_eq!(wires, term.bound_occurrences());
        let bars = layout
            .strokes
            .iter()
            .filter(|s| s.kind == StrokeKind::Bar)
            .map(|s| (s.points[0], s.points[1]))
            .collect::<Vec<_>>();
        for (i, (a_start, a_end)) in bars.iter().enumerate() {
            for (b_start, b_end) in &bars[i + 1..] {
                if a_start.y == b_start.y {
                    prop_assert!(a_end.x < b_start.x || b_end.x < a_start.x);
                }
            }
        }
    }

    #[test]
    fn tree_has_a_box_per_node(shape in shape()) {
        let term = closed(&shape);
        let layout = layout_tree(&term, None, &TreeConfig::default());
        prop_assert!(layout.error.is_none());
        prop_assert_eq!(layout.nodes.len(), size(&term));
        prop_assert_eq!(layout.connectors.len(), size(&term) - 1);
    }
}
