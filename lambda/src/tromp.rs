//! Tromp diagrams on an integral grid.
//!
//! A lambda is a horizontal bar from the left edge of its body's block to
//! the body's last wire column, so a block's rightmost column stays empty
//! and neighbouring bars never touch. Each bound variable is a vertical
//! wire hanging from its binder's bar, and each
//! application an elbow joining the output ports of its two operands. The
//! output left dangling by the whole term gets a closing tail.
//!
//! Layout runs twice over the same recursive walk: once into [`Discard`] to
//! measure the grid, once into a [`Collector`] to keep the strokes.

use rpds::HashTrieMap;
use serde::Serialize;

use crate::{
    error::LayoutError,
    geometry::{view_box, GridPoint, Point},
    prelude::*,
    reducer::MAX_DEPTH,
    term::{Term, TermId, TermKind},
};

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Debug)]
#[serde(rename_all = "snake_case")]
pub enum ElbowShape {
    /// `─`, both ports already on the elbow's row.
    Flat,
    /// `└─`, only the function port drops.
    Left,
    /// `─┘`, only the argument port drops.
    Right,
    /// `└─┘`
    Both,
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Debug)]
#[serde(tag = "kind", content = "shape", rename_all = "snake_case")]
pub enum StrokeKind {
    Bar,
    Wire,
    Elbow(ElbowShape),
    Tail,
}

#[derive(Clone, Default, Debug)]
pub struct Style {
    pub tag: Option<Identifier>,
    /// On the active redex: its elbow, its lambda's bar, and the wires that
    /// lambda binds.
    pub primary: bool,
    /// Inside the argument about to be substituted.
    pub secondary: bool,
}

#[derive(Clone, Serialize, Debug)]
pub struct Stroke {
    pub key: usize,
    #[serde(flatten)]
    pub kind: StrokeKind,
    pub points: Vec<GridPoint>,
    pub path: Vec<Point>,
    pub tag: Option<Identifier>,
    pub primary: bool,
    pub secondary: bool,
}

pub trait StrokeSink {
    fn emit(&mut self, kind: StrokeKind, points: Vec<GridPoint>, style: &Style);
}

pub struct Discard;

impl StrokeSink for Discard {
    fn emit(&mut self, _: StrokeKind, _: Vec<GridPoint>, _: &Style) {}
}

pub struct Collector {
    scale: f64,
    next_key: usize,
    strokes: Vec<Stroke>,
}

impl Collector {
    pub fn new(scale: f64) -> Self {
        Collector {
            scale,
            next_key: 0,
            strokes: vec![],
        }
    }

    pub fn into_strokes(self) -> Vec<Stroke> {
        self.strokes
    }
}

impl StrokeSink for Collector {
    fn emit(&mut self, kind: StrokeKind, points: Vec<GridPoint>, style: &Style) {
        let path = points.iter().map(|p| p.scaled(self.scale)).collect();
        self.strokes.push(Stroke {
            key: self.next_key,
            kind,
            points,
            path,
            tag: style.tag.clone(),
            primary: style.primary,
            secondary: style.secondary,
        });
        self.next_key += 1;
    }
}

#[derive(Clone, Serialize, Debug)]
pub struct CircuitLayout {
    pub strokes: Vec<Stroke>,
    pub grid_width: u32,
    pub grid_height: u32,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub view_box: String,
    pub error: Option<LayoutError>,
}

/// Where a bound name's bar sits and how its wires are drawn.
#[derive(Clone, Debug)]
struct Binding {
    row: u32,
    tag: Option<Identifier>,
    primary: bool,
}

type Bindings = HashTrieMap<Identifier, Binding>;

#[derive(Clone, Default, Debug)]
struct Context {
    tag: Option<Identifier>,
    secondary: bool,
    /// Set for the lambda in function position of the active redex.
    redex_lambda: bool,
}

#[derive(Clone, Copy, Debug)]
struct Extent {
    width: u32,
    height: u32,
    /// Output point the enclosing application still has to connect.
    port: GridPoint,
}

struct Circuit<'s, S> {
    sink: &'s mut S,
    highlight: Option<TermId>,
}

impl<'s, S: StrokeSink> Circuit<'s, S> {
    fn draw(
        &mut self,
        term: &Term,
        row: u32,
        col: u32,
        bindings: &Bindings,
        context: &Context,
        depth: usize,
    ) -> Result<Extent, LayoutError> {
        if depth > MAX_DEPTH {
            return Err(LayoutError::DepthExceeded { limit: MAX_DEPTH });
        }
        let tag = term.tag().cloned().or_else(|| context.tag.clone());
        match term.kind() {
            TermKind::Variable(name) => {
                let binding = bindings.get(name).ok_or_else(|| LayoutError::FreeVariable {
                    name: name.to_string(),
                })?;
                let x = col + 1;
                let port = GridPoint::new(x, row + 1);
                let style = Style {
                    tag: binding.tag.clone(),
                    primary: binding.primary,
                    secondary: context.secondary,
                };
                self.sink
                    .emit(StrokeKind::Wire, vec![GridPoint::new(x, binding.row), port], &style);
                Ok(Extent {
                    width: 2,
                    height: 1,
                    port,
                })
            }
            TermKind::Lambda { param, body } => {
                let binding = Binding {
                    row,
                    tag: tag.clone(),
                    primary: context.redex_lambda,
                };
                let inner = Context {
                    tag: tag.clone(),
                    secondary: context.secondary,
                    redex_lambda: false,
                };
                let body = self.draw(
                    body,
                    row + 1,
                    col,
                    &bindings.insert(param.clone(), binding),
                    &inner,
                    depth + 1,
                )?;
                let style = Style {
                    tag,
                    primary: context.redex_lambda,
                    secondary: context.secondary,
                };
                // body blocks are at least two columns wide
                let last_wire = col + body.width - 1;
                self.sink.emit(
                    StrokeKind::Bar,
                    vec![GridPoint::new(col, row), GridPoint::new(last_wire, row)],
                    &style,
                );
                Ok(Extent {
                    width: body.width,
                    height: body.height + 1,
                    port: body.port,
                })
            }
            TermKind::Application { func, arg } => {
                let active = self.highlight == Some(term.id());
                let func_context = Context {
                    tag: tag.clone(),
                    secondary: context.secondary,
                    redex_lambda: active,
                };
                let f = self.draw(func, row, col, bindings, &func_context, depth + 1)?;
                let arg_context = Context {
                    tag: tag.clone(),
                    secondary: context.secondary || active,
                    redex_lambda: false,
                };
                let a = self.draw(arg, row, col + f.width, bindings, &arg_context, depth + 1)?;

                let y = row + f.height.max(a.height);
                let shape = match (f.port.y < y, a.port.y < y) {
                    (false, false) => ElbowShape::Flat,
                    (true, false) => ElbowShape::Left,
                    (false, true) => ElbowShape::Right,
                    (true, true) => ElbowShape::Both,
                };
                let mut points = vec![
                    f.port,
                    GridPoint::new(f.port.x, y),
                    GridPoint::new(a.port.x, y),
                    a.port,
                ];
                points.dedup();
                let style = Style {
                    tag,
                    primary: active,
                    secondary: context.secondary,
                };
                self.sink.emit(StrokeKind::Elbow(shape), points, &style);
                Ok(Extent {
                    width: f.width + a.width,
                    height: f.height.max(a.height) + 1,
                    port: GridPoint::new(f.port.x, y),
                })
            }
        }
    }
}

/// Draws `term` into `sink` and returns the grid size.
fn run<S: StrokeSink>(
    term: &Term,
    sink: &mut S,
    highlight: Option<TermId>,
) -> Result<(u32, u32), LayoutError> {
    let mut circuit = Circuit { sink, highlight };
    let extent = circuit.draw(term, 0, 0, &Bindings::new(), &Context::default(), 0)?;
    let height = extent.height + 1;
    let style = Style {
        tag: term.tag().cloned(),
        ..Style::default()
    };
    circuit.sink.emit(
        StrokeKind::Tail,
        vec![extent.port, GridPoint::new(extent.port.x, height)],
        &style,
    );
    Ok((extent.width, height))
}

fn try_layout(
    term: &Term,
    scale: f64,
    highlight: Option<TermId>,
) -> Result<CircuitLayout, LayoutError> {
    let (grid_width, grid_height) = run(term, &mut Discard, highlight)?;
    let mut collector = Collector::new(scale);
    run(term, &mut collector, highlight)?;
    let (pixel_width, pixel_height) = (f64::from(grid_width) * scale, f64::from(grid_height) * scale);
    Ok(CircuitLayout {
        strokes: collector.into_strokes(),
        grid_width,
        grid_height,
        pixel_width,
        pixel_height,
        view_box: view_box(pixel_width, pixel_height),
        error: None,
    })
}

/// Tromp diagram of a closed term at `scale` pixels per grid unit. A free
/// variable or an over-deep term comes back as `error` with no strokes.
pub fn layout_circuit(term: &Term, scale: f64, highlight: Option<TermId>) -> CircuitLayout {
    try_layout(term, scale, highlight).unwrap_or_else(|error| {
        tracing::warn!(%error, "circuit layout failed");
        CircuitLayout {
            strokes: vec![],
            grid_width: 0,
            grid_height: 0,
            pixel_width: 0.0,
            pixel_height: 0.0,
            view_box: view_box(0.0, 0.0),
            error: Some(error),
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{parser::parse, reducer::locate_next_redex, registry::Registry};

    fn term(s: &str) -> Term {
        parse(s, &Registry::builtin()).unwrap()
    }

    fn points(stroke: &Stroke) -> Vec<(u32, u32)> {
        stroke.points.iter().map(|p| (p.x, p.y)).collect()
    }

    fn assert_consistent(t: &Term) {
        let layout = layout_circuit(t, 4.0, locate_next_redex(t));
        assert!(layout.error.is_none(), "{:?}", layout.error);
        for stroke in &layout.strokes {
            for p in &stroke.points {
                assert!(p.x <= layout.grid_width && p.y <= layout.grid_height);
            }
        }
        let wires = layout
            .strokes
            .iter()
            .filter(|s| s.kind == StrokeKind::Wire)
            .count();
        assert_eq!(wires, t.bound_occurrences());
    }

    #[test]
    fn test_identity() {
        let layout = layout_circuit(&term("λx.x"), 8.0, None);
        assert_eq!((layout.grid_width, layout.grid_height), (2, 3));
        assert_eq!((layout.pixel_width, layout.pixel_height), (16.0, 24.0));
        assert_eq!(layout.view_box, "0 0 16 24");
        let summary = layout
            .strokes
            .iter()
            .map(|s| (s.kind, points(s)))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                (StrokeKind::Wire, vec![(1, 0), (1, 2)]),
                (StrokeKind::Bar, vec![(0, 0), (1, 0)]),
                (StrokeKind::Tail, vec![(1, 2), (1, 3)]),
            ]
        );
        assert_eq!(layout.strokes[2].path, vec![Point::new(8.0, 16.0), Point::new(8.0, 24.0)]);
        let keys = layout.strokes.iter().map(|s| s.key).collect::<Vec<_>>();
        assert_eq!(keys, vec![0, 1, 2]);
    }

    #[test]
    fn test_neighbouring_bars_stay_apart() {
        for s in [
            "λz.z (λx.x) (λy.y)",
            "(λx.x) (λy.y) (λw.w)",
            "_PLUS _2 _3",
            "λa.λb.(λx.x) (λy.b) a",
        ] {
            let layout = layout_circuit(&term(s), 1.0, None);
            let bars = layout
                .strokes
                .iter()
                .filter(|s| s.kind == StrokeKind::Bar)
                .map(|s| (s.points[0], s.points[1]))
                .collect::<Vec<_>>();
            for (i, (a_start, a_end)) in bars.iter().enumerate() {
                for (b_start, b_end) in &bars[i + 1..] {
                    if a_start.y != b_start.y {
                        continue;
                    }
                    let apart = a_end.x < b_start.x || b_end.x < a_start.x;
                    assert!(apart, "{s}: bars {a_start:?}-{a_end:?} and {b_start:?}-{b_end:?}");
                }
            }
        }
        let layout = layout_circuit(&term("λz.z (λx.x) (λy.y)"), 1.0, None);
        let bars = layout
            .strokes
            .iter()
            .filter(|s| s.kind == StrokeKind::Bar)
            .map(points)
            .collect::<Vec<_>>();
        assert_eq!(bars, vec![vec![(2, 1), (3, 1)], vec![(4, 1), (5, 1)], vec![(0, 0), (5, 0)]]);
    }

    #[test]
    fn test_elbow_shapes() {
        let shapes = |s: &str| {
            layout_circuit(&term(s), 1.0, None)
                .strokes
                .iter()
                .filter_map(|s| match s.kind {
                    StrokeKind::Elbow(shape) => Some((shape, points(s))),
                    _ => None,
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(shapes("λa.λb.a b"), vec![(ElbowShape::Flat, vec![(1, 3), (3, 3)])]);
        assert_eq!(
            shapes("λz.z (λa.a)"),
            vec![(ElbowShape::Left, vec![(1, 2), (1, 3), (3, 3)])]
        );
        assert_eq!(
            shapes("λz.(λa.a) z"),
            vec![(ElbowShape::Right, vec![(1, 3), (3, 3), (3, 2)])]
        );
        assert_eq!(
            shapes("λf.λx.f (f x)"),
            vec![
                (ElbowShape::Flat, vec![(3, 3), (5, 3)]),
                (ElbowShape::Both, vec![(1, 3), (1, 4), (3, 4), (3, 3)]),
            ]
        );
    }

    #[test]
    fn test_consistency() {
        for s in [
            "λx.x",
            "λx.λy.x",
            "_0",
            "_3",
            "_PLUS _2 _3",
            "_Y",
            "(λx.x x) (λx.x x)",
            "λa.λb.λc.(a c) (b c)",
            "λx.(λx.x) x",
        ] {
            assert_consistent(&term(s));
        }
    }

    #[test]
    fn test_free_variable_is_a_diagnostic() {
        let layout = layout_circuit(&term("λx.y"), 8.0, None);
        assert_eq!(
            layout.error,
            Some(LayoutError::FreeVariable { name: "y".into() })
        );
        assert!(layout.strokes.is_empty());
    }

    #[test]
    fn test_highlights() {
        let t = term("(λx.x x) (λy.y)");
        let layout = layout_circuit(&t, 8.0, locate_next_redex(&t));
        let flags = |kind: StrokeKind| {
            layout
                .strokes
                .iter()
                .filter(|s| s.kind == kind)
                .map(|s| (s.primary, s.secondary))
                .collect::<Vec<_>>()
        };
        // x x, then y
        assert_eq!(flags(StrokeKind::Wire), vec![(true, false), (true, false), (false, true)]);
        // λx, then λy
        assert_eq!(flags(StrokeKind::Bar), vec![(true, false), (false, true)]);
        let elbows = layout
            .strokes
            .iter()
            .filter(|s| matches!(s.kind, StrokeKind::Elbow(_)))
            .map(|s| (s.primary, s.secondary))
            .collect::<Vec<_>>();
        // inner `x x`, then the redex itself
        assert_eq!(elbows, vec![(false, false), (true, false)]);
    }

    #[test]
    fn test_tags_are_inherited() {
        let t = term("_SUCC _1");
        let layout = layout_circuit(&t, 8.0, None);
        let tags = layout
            .strokes
            .iter()
            .filter(|s| s.kind != StrokeKind::Tail)
            .map(|s| s.tag.as_ref().map(|t| t.to_string()))
            .collect::<std::collections::HashSet<_>>();
        assert!(tags.contains(&Some("SUCC".to_string())));
        assert!(tags.contains(&Some("_1".to_string())));
        // the joining elbow belongs to neither
        let last_elbow = layout
            .strokes
            .iter()
            .rev()
            .find(|s| matches!(s.kind, StrokeKind::Elbow(_)))
            .unwrap();
        assert_eq!(last_elbow.tag, None);
    }
}
