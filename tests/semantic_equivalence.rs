//! Numerical equivalence of fused and unfused graphs
//!
//! A small NCHW reference executor evaluates the graph before and after
//! rewriting. Zero-fill fusion involves no arithmetic reordering, so the
//! outputs must match bit for bit.
//!
//! MaxPool ignores its own padding while a Pad contributes real zeros, so
//! the MaxPool cases feed non-negative data and keep every window on at
//! least one real element.

use std::collections::HashMap;

use furiosa_rewriter::constant::{is_constant, materialize};
use furiosa_rewriter::prelude::*;
use ndarray::{Array4, Ix4};
use proptest::prelude::*;

// ============================================================================
// Reference executor
// ============================================================================

fn sample(x: &Array4<f32>, n: usize, c: usize, h: i64, w: i64) -> Option<f32> {
    let (_, _, height, width) = x.dim();
    if h < 0 || w < 0 || h >= height as i64 || w >= width as i64 {
        return None;
    }
    Some(x[[n, c, h as usize, w as usize]])
}

fn pad_constant(x: &Array4<f32>, pads: &[i64]) -> Array4<f32> {
    let (n, c, h, w) = x.dim();
    let dims = [n, c, h, w];
    let mut out_dims = [0usize; 4];
    for i in 0..4 {
        out_dims[i] = (dims[i] as i64 + pads[i] + pads[i + 4]) as usize;
    }
    Array4::from_shape_fn(out_dims, |(a, b, y, z)| {
        let src = [
            a as i64 - pads[0],
            b as i64 - pads[1],
            y as i64 - pads[2],
            z as i64 - pads[3],
        ];
        if src[0] < 0 || src[1] < 0 || src[0] >= n as i64 || src[1] >= c as i64 {
            return 0.0;
        }
        sample(x, src[0] as usize, src[1] as usize, src[2], src[3]).unwrap_or(0.0)
    })
}

struct Window {
    kernel: [usize; 2],
    strides: [usize; 2],
    /// top, left, bottom, right
    pads: [i64; 4],
}

impl Window {
    fn from_node(node: &Node, kernel: [usize; 2]) -> Self {
        let strides = node
            .attr_ints("strides")
            .unwrap()
            .map(|s| [s[0] as usize, s[1] as usize])
            .unwrap_or([1, 1]);
        let pads = node
            .attr_ints("pads")
            .unwrap()
            .filter(|p| !p.is_empty())
            .map(|p| [p[0], p[1], p[2], p[3]])
            .unwrap_or([0; 4]);
        Self {
            kernel,
            strides,
            pads,
        }
    }

    fn out_dims(&self, h: usize, w: usize) -> (usize, usize) {
        let oh = (h as i64 + self.pads[0] + self.pads[2] - self.kernel[0] as i64)
            / self.strides[0] as i64
            + 1;
        let ow = (w as i64 + self.pads[1] + self.pads[3] - self.kernel[1] as i64)
            / self.strides[1] as i64
            + 1;
        (oh as usize, ow as usize)
    }

    fn origin(&self, oy: usize, ox: usize) -> (i64, i64) {
        (
            (oy * self.strides[0]) as i64 - self.pads[0],
            (ox * self.strides[1]) as i64 - self.pads[1],
        )
    }
}

fn conv2d(x: &Array4<f32>, weight: &Array4<f32>, window: &Window) -> Array4<f32> {
    let (n, c, h, w) = x.dim();
    let (m, _, _, _) = weight.dim();
    let (oh, ow) = window.out_dims(h, w);

    Array4::from_shape_fn((n, m, oh, ow), |(b, f, oy, ox)| {
        let (y0, x0) = window.origin(oy, ox);
        let mut acc = 0.0f32;
        for ch in 0..c {
            for ky in 0..window.kernel[0] {
                for kx in 0..window.kernel[1] {
                    let v = sample(x, b, ch, y0 + ky as i64, x0 + kx as i64).unwrap_or(0.0);
                    acc += v * weight[[f, ch, ky, kx]];
                }
            }
        }
        acc
    })
}

fn max_pool2d(x: &Array4<f32>, window: &Window) -> Array4<f32> {
    let (n, c, h, w) = x.dim();
    let (oh, ow) = window.out_dims(h, w);

    Array4::from_shape_fn((n, c, oh, ow), |(b, ch, oy, ox)| {
        let (y0, x0) = window.origin(oy, ox);
        let mut best = f32::NEG_INFINITY;
        for ky in 0..window.kernel[0] {
            for kx in 0..window.kernel[1] {
                if let Some(v) = sample(x, b, ch, y0 + ky as i64, x0 + kx as i64) {
                    best = best.max(v);
                }
            }
        }
        best
    })
}

fn average_pool2d(x: &Array4<f32>, window: &Window, count_include_pad: bool) -> Array4<f32> {
    let (n, c, h, w) = x.dim();
    let (oh, ow) = window.out_dims(h, w);
    let padded_h = h as i64 + window.pads[2];
    let padded_w = w as i64 + window.pads[3];

    Array4::from_shape_fn((n, c, oh, ow), |(b, ch, oy, ox)| {
        let (y0, x0) = window.origin(oy, ox);
        let mut acc = 0.0f32;
        let mut count = 0usize;
        for ky in 0..window.kernel[0] {
            for kx in 0..window.kernel[1] {
                let (y, z) = (y0 + ky as i64, x0 + kx as i64);
                match sample(x, b, ch, y, z) {
                    Some(v) => {
                        acc += v;
                        count += 1;
                    }
                    None if count_include_pad && y < padded_h && z < padded_w => {
                        acc += 0.0;
                        count += 1;
                    }
                    None => {}
                }
            }
        }
        acc / count as f32
    })
}

fn constant_f32(graph: &Graph, id: TensorId) -> Array4<f32> {
    materialize(graph, id)
        .unwrap()
        .to_array_f32()
        .unwrap()
        .into_dimensionality::<Ix4>()
        .unwrap()
}

fn pad_amounts(graph: &Graph, node: &Node) -> Vec<i64> {
    if node.since_version() >= 11 {
        materialize(graph, node.input(1).unwrap())
            .unwrap()
            .to_i64_vec()
            .unwrap()
    } else {
        node.attr_ints("pads").unwrap().unwrap().to_vec()
    }
}

fn kernel_of(node: &Node) -> [usize; 2] {
    let k = node.attr_ints("kernel_shape").unwrap().unwrap();
    [k[0] as usize, k[1] as usize]
}

/// Evaluate `graph` on `x`, returning the first graph output
fn execute(graph: &Graph, x: &Array4<f32>) -> Array4<f32> {
    let mut env: HashMap<TensorId, Array4<f32>> = HashMap::new();
    env.insert(graph.tensor_id("X").unwrap(), x.clone());

    let fetch = |env: &HashMap<TensorId, Array4<f32>>, id: TensorId| -> Array4<f32> {
        match env.get(&id) {
            Some(v) => v.clone(),
            None if is_constant(graph, id) => constant_f32(graph, id),
            None => panic!("value {id} not computed"),
        }
    };

    for id in graph.topological_order() {
        let node = graph.node(id).unwrap();
        let input = fetch(&env, node.input(0).unwrap());

        let out = match node.op_type() {
            "Pad" => pad_constant(&input, &pad_amounts(graph, node)),
            "Cast" | "Identity" => input,
            "Relu" => input.mapv(|v| v.max(0.0)),
            "Conv" => {
                let weight = fetch(&env, node.input(1).unwrap());
                let (_, _, kh, kw) = weight.dim();
                conv2d(&input, &weight, &Window::from_node(node, [kh, kw]))
            }
            "MaxPool" => max_pool2d(&input, &Window::from_node(node, kernel_of(node))),
            "AveragePool" => {
                let include = node.attr_int("count_include_pad").unwrap().unwrap_or(0) == 1;
                average_pool2d(&input, &Window::from_node(node, kernel_of(node)), include)
            }
            other => panic!("reference executor does not support {other}"),
        };
        env.insert(node.outputs()[0], out);
    }

    env.remove(&graph.graph_outputs()[0]).unwrap()
}

// ============================================================================
// Fixtures
// ============================================================================

/// Deterministic values in [-1, 1)
fn input_data(shape: (usize, usize, usize, usize), seed: u64) -> Array4<f32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    Array4::from_shape_fn(shape, |_| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
    })
}

fn bits(x: &Array4<f32>) -> Vec<u32> {
    x.iter().map(|v| v.to_bits()).collect()
}

fn assert_equivalent(mut graph: Graph, x: &Array4<f32>) {
    let before = execute(&graph, x);

    let report = RuleDriver::new(TransformConfig::default().with_verify_invariants(true))
        .with_rule(PadFusion::new())
        .run(&mut graph)
        .unwrap();
    assert_eq!(report.changes.count_by_rule("PadFusion"), 1);
    assert!(graph.find_nodes_by_op("Pad").is_empty());

    let after = execute(&graph, x);
    assert_eq!(before.dim(), after.dim());
    assert_eq!(bits(&before), bits(&after));
}

fn weights(m: usize, c: usize, k: usize) -> Vec<f32> {
    input_data((m, c, k, k), 7).iter().copied().collect()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn conv_asymmetric_padding() {
    let mut b = GraphBuilder::new(13);
    b.input("X", &[1, 2, 6, 7]);
    b.initializer_f32("W", &[3, 2, 3, 3], &weights(3, 2, 3));
    b.initializer_i64("pads", &[8], &[0, 0, 1, 2, 0, 0, 2, 1]);
    b.node("Pad", &["X", "pads"], &["padded"]);
    b.node("Conv", &["padded", "W"], &["Y"])
        .attr("kernel_shape", vec![3i64, 3])
        .attr("pads", vec![1i64, 0, 0, 1]);
    b.output("Y");

    assert_equivalent(b.build().unwrap(), &input_data((1, 2, 6, 7), 1));
}

#[test]
fn conv_strided() {
    let mut b = GraphBuilder::new(11);
    b.input("X", &[2, 1, 9, 9]);
    b.initializer_f32("W", &[2, 1, 3, 3], &weights(2, 1, 3));
    b.initializer_i64("pads", &[8], &[0, 0, 1, 1, 0, 0, 1, 1]);
    b.node("Pad", &["X", "pads"], &["padded"]);
    b.node("Conv", &["padded", "W"], &["Y"])
        .attr("kernel_shape", vec![3i64, 3])
        .attr("strides", vec![2i64, 2]);
    b.output("Y");

    assert_equivalent(b.build().unwrap(), &input_data((2, 1, 9, 9), 2));
}

#[test]
fn average_pool_without_existing_pads() {
    let mut b = GraphBuilder::new(13);
    b.input("X", &[1, 3, 5, 5]);
    b.initializer_i64("pads", &[8], &[0, 0, 1, 1, 0, 0, 1, 1]);
    b.node("Pad", &["X", "pads"], &["padded"]);
    b.node("AveragePool", &["padded"], &["Y"])
        .attr("kernel_shape", vec![3i64, 3])
        .attr("count_include_pad", 0i64);
    b.output("Y");

    assert_equivalent(b.build().unwrap(), &input_data((1, 3, 5, 5), 3));
}

#[test]
fn average_pool_counting_existing_pads() {
    let mut b = GraphBuilder::new(13);
    b.input("X", &[1, 1, 6, 6]);
    b.initializer_i64("pads", &[8], &[0, 0, 0, 2, 0, 0, 1, 0]);
    b.node("Pad", &["X", "pads"], &["padded"]);
    b.node("AveragePool", &["padded"], &["Y"])
        .attr("kernel_shape", vec![2i64, 2])
        .attr("pads", vec![1i64, 1, 1, 1])
        .attr("count_include_pad", 1i64);
    b.output("Y");

    assert_equivalent(b.build().unwrap(), &input_data((1, 1, 6, 6), 4));
}

#[test]
fn max_pool_after_relu() {
    let mut b = GraphBuilder::new(13);
    b.input("X", &[1, 2, 6, 6]);
    b.initializer_i64("pads", &[8], &[0, 0, 1, 0, 0, 0, 1, 1]);
    b.node("Relu", &["X"], &["r"]);
    b.node("Pad", &["r", "pads"], &["padded"]);
    b.node("MaxPool", &["padded"], &["Y"])
        .attr("kernel_shape", vec![2i64, 2])
        .attr("strides", vec![2i64, 2]);
    b.output("Y");

    assert_equivalent(b.build().unwrap(), &input_data((1, 2, 6, 6), 5));
}

#[test]
fn cast_between_pad_and_max_pool() {
    let mut b = GraphBuilder::new(13);
    b.input("X", &[1, 1, 5, 5]);
    b.initializer_i64("pads", &[8], &[0, 0, 1, 1, 0, 0, 1, 1]);
    b.node("Relu", &["X"], &["r"]);
    b.node("Pad", &["r", "pads"], &["padded"]);
    b.node("Cast", &["padded"], &["cast_out"]).attr("to", 1i64);
    b.node("MaxPool", &["cast_out"], &["Y"])
        .attr("kernel_shape", vec![3i64, 3]);
    b.output("Y");

    assert_equivalent(b.build().unwrap(), &input_data((1, 1, 5, 5), 6));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn conv_equivalence_over_pad_amounts(
        pads in proptest::collection::vec(0i64..3, 4),
        conv_pads in proptest::collection::vec(0i64..2, 4),
        seed in any::<u64>(),
    ) {
        let mut b = GraphBuilder::new(13);
        b.input("X", &[1, 2, 5, 5]);
        b.initializer_f32("W", &[2, 2, 3, 3], &weights(2, 2, 3));
        b.initializer_i64(
            "pads",
            &[8],
            &[0, 0, pads[0], pads[1], 0, 0, pads[2], pads[3]],
        );
        b.node("Pad", &["X", "pads"], &["padded"]);
        b.node("Conv", &["padded", "W"], &["Y"])
            .attr("kernel_shape", vec![3i64, 3])
            .attr("pads", conv_pads);
        b.output("Y");

        assert_equivalent(b.build().unwrap(), &input_data((1, 2, 5, 5), seed));
    }
}
